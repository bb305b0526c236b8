// SPDX-License-Identifier: GPL-3.0-only

//! Simulated capture device
//!
//! Stands in for real camera hardware: while running, a [`FrameLoop`]
//! thread emits [`CameraFrame`]s into a bounded channel that the event loop
//! drains. Failures can be injected to exercise the controller's handling
//! of rejected commands.

use super::{CameraFrame, CaptureDevice, FrameLoop, LoopAction};
use crate::constants::channels;
use crate::errors::{DeviceError, DeviceResult};
use futures::channel::mpsc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Receiving end of a simulated camera's frames
pub type FrameReceiver = mpsc::Receiver<CameraFrame>;

/// Frame size reported by the simulated camera
const SIMULATED_RESOLUTION: (u32, u32) = (640, 480);

/// Camera whose running state is backed by a frame-producing thread
pub struct SimulatedCamera {
    frame_interval: Duration,
    sender: mpsc::Sender<CameraFrame>,
    frame_loop: Option<FrameLoop>,
    next_sequence: Arc<AtomicU64>,
    fail_next_start: Option<DeviceError>,
    fail_next_stop: Option<DeviceError>,
}

impl SimulatedCamera {
    /// Create a stopped camera and the receiver its frames arrive on
    pub fn new(frame_interval: Duration) -> (Self, FrameReceiver) {
        let (sender, receiver) = mpsc::channel(channels::FRAME_CHANNEL_CAPACITY);
        let camera = Self {
            frame_interval,
            sender,
            frame_loop: None,
            next_sequence: Arc::new(AtomicU64::new(0)),
            fail_next_start: None,
            fail_next_stop: None,
        };
        (camera, receiver)
    }

    /// Make the next `start()` fail with `error`
    pub fn fail_next_start(&mut self, error: DeviceError) {
        self.fail_next_start = Some(error);
    }

    /// Make the next `stop()` fail with `error`
    pub fn fail_next_stop(&mut self, error: DeviceError) {
        self.fail_next_stop = Some(error);
    }
}

impl CaptureDevice for SimulatedCamera {
    fn start(&mut self) -> DeviceResult<()> {
        if let Some(error) = self.fail_next_start.take() {
            return Err(error);
        }
        if self.frame_loop.is_some() {
            return Err(DeviceError::Busy);
        }

        let mut sender = self.sender.clone();
        let next_sequence = Arc::clone(&self.next_sequence);
        let (width, height) = SIMULATED_RESOLUTION;

        self.frame_loop = Some(FrameLoop::start(
            "simulated-camera",
            self.frame_interval,
            move || {
                let frame = CameraFrame {
                    sequence: next_sequence.fetch_add(1, Ordering::Relaxed),
                    captured_at: chrono::Local::now(),
                    width,
                    height,
                };

                match sender.try_send(frame) {
                    Ok(()) => LoopAction::Continue,
                    Err(e) if e.is_disconnected() => {
                        warn!("Frame receiver closed, stopping simulated camera");
                        LoopAction::Stop
                    }
                    Err(_) => {
                        debug!("Frame channel full, dropping frame");
                        LoopAction::Continue
                    }
                }
            },
        ));

        info!("Simulated camera started");
        Ok(())
    }

    fn stop(&mut self) -> DeviceResult<()> {
        if let Some(error) = self.fail_next_stop.take() {
            return Err(error);
        }

        // Called from the event loop, so the frame thread is not joined here.
        // A frame sent after this point reaches an idle controller and is dropped.
        if let Some(frame_loop) = self.frame_loop.take() {
            frame_loop.detach();
            info!("Simulated camera stopped");
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.frame_loop.is_some()
    }
}

/// Camera that only tracks its running flag
///
/// Used for virtual-time replays where no frames are wanted.
#[derive(Debug, Default)]
pub struct DryRunCamera {
    running: bool,
    commands: u32,
}

impl DryRunCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start and stop commands received so far
    pub fn commands(&self) -> u32 {
        self.commands
    }
}

impl CaptureDevice for DryRunCamera {
    fn start(&mut self) -> DeviceResult<()> {
        self.commands += 1;
        if self.running {
            return Err(DeviceError::Busy);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> DeviceResult<()> {
        self.commands += 1;
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_start_and_stop() {
        let (mut camera, _frames) = SimulatedCamera::new(Duration::from_millis(5));
        assert!(!camera.is_running());

        camera.start().unwrap();
        assert!(camera.is_running());

        camera.stop().unwrap();
        assert!(!camera.is_running());
    }

    #[test]
    fn test_double_start_is_busy() {
        let (mut camera, _frames) = SimulatedCamera::new(Duration::from_millis(5));
        camera.start().unwrap();
        assert_eq!(camera.start(), Err(DeviceError::Busy));
        camera.stop().unwrap();
    }

    #[test]
    fn test_stop_when_stopped_is_ok() {
        let (mut camera, _frames) = SimulatedCamera::new(Duration::from_millis(5));
        assert_eq!(camera.stop(), Ok(()));
    }

    #[test]
    fn test_injected_failures_are_one_shot() {
        let (mut camera, _frames) = SimulatedCamera::new(Duration::from_millis(5));

        camera.fail_next_start(DeviceError::Busy);
        assert_eq!(camera.start(), Err(DeviceError::Busy));
        assert!(!camera.is_running());
        camera.start().unwrap();

        camera.fail_next_stop(DeviceError::Disconnected);
        assert_eq!(camera.stop(), Err(DeviceError::Disconnected));
        assert!(camera.is_running());
        camera.stop().unwrap();
    }

    #[test]
    fn test_stop_ends_frame_production() {
        let (mut camera, mut frames) = SimulatedCamera::new(Duration::from_millis(2));
        camera.start().unwrap();
        std::thread::sleep(Duration::from_millis(10));
        camera.stop().unwrap();
        assert!(!camera.is_running());

        std::thread::sleep(Duration::from_millis(30));
        while frames.try_next().is_ok_and(|f| f.is_some()) {}
        std::thread::sleep(Duration::from_millis(30));

        assert!(frames.try_next().is_err());
    }

    #[tokio::test]
    async fn test_frames_arrive_while_running() {
        let (mut camera, mut frames) = SimulatedCamera::new(Duration::from_millis(5));
        camera.start().unwrap();

        let first = frames.next().await.unwrap();
        let second = frames.next().await.unwrap();
        assert_eq!(first.width, 640);
        assert!(second.sequence > first.sequence);

        camera.stop().unwrap();
    }
}
