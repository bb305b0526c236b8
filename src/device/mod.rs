// SPDX-License-Identifier: GPL-3.0-only

//! Capture device abstraction
//!
//! ```text
//! ┌──────────────────────┐  start / stop   ┌───────────────┐
//! │  CaptureController   │ ──────────────▶ │ CaptureDevice │
//! └──────────┬───────────┘                 └───────┬───────┘
//!            │ frame_produced                      │ CameraFrame
//!            ▼                                     ▼
//! ┌──────────────────────┐   on_device_frame  (event loop)
//! │      FrameSink       │ ◀──────────────────────┘
//! └──────────────────────┘
//! ```
//!
//! The controller only commands the device and forwards frames; decoding,
//! rotation fixes and writing images belong to the [`FrameSink`].

pub mod frame_loop;
pub mod simulated;

pub use frame_loop::{FrameLoop, LoopAction};
pub use simulated::{DryRunCamera, FrameReceiver, SimulatedCamera};

use crate::constants::{frames, timing};
use crate::errors::DeviceResult;
use chrono::{DateTime, Local};
use tracing::{debug, info};
use uuid::Uuid;

/// A camera that is either running (producing frames) or stopped
pub trait CaptureDevice {
    /// Begin producing frames. Returns immediately.
    fn start(&mut self) -> DeviceResult<()>;

    /// Stop producing frames. Returns immediately.
    fn stop(&mut self) -> DeviceResult<()>;

    /// Whether the device is currently running
    fn is_running(&self) -> bool;
}

/// A frame produced by a running device
///
/// Pixel data never passes through the controller, so only the metadata a
/// persistence layer needs is carried here.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    /// Per-device frame counter, starting at 0
    pub sequence: u64,
    /// Wall-clock capture time
    pub captured_at: DateTime<Local>,
    pub width: u32,
    pub height: u32,
}

impl CameraFrame {
    /// File name this frame would be saved under
    pub fn file_name(&self) -> String {
        format!(
            "{}_{:04}.{}",
            self.captured_at.format(frames::FILE_NAME_FORMAT),
            self.sequence,
            frames::FILE_EXTENSION
        )
    }
}

/// Image persistence collaborator
pub trait FrameSink {
    /// Called once per frame produced while a session is active
    fn frame_produced(&mut self, session: Uuid, frame: &CameraFrame);
}

impl FrameSink for Vec<(Uuid, CameraFrame)> {
    fn frame_produced(&mut self, session: Uuid, frame: &CameraFrame) {
        self.push((session, frame.clone()));
    }
}

/// Counts frames and logs the name each would be saved as
#[derive(Debug, Default)]
pub struct LoggingFrameSink {
    total: u64,
}

impl LoggingFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames seen since creation
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl FrameSink for LoggingFrameSink {
    fn frame_produced(&mut self, session: Uuid, frame: &CameraFrame) {
        self.total += 1;
        debug!(%session, file = %frame.file_name(), "Frame produced");

        if self.total % timing::FRAME_LOG_INTERVAL == 0 {
            info!(total = self.total, "Frames produced");
        }
    }
}
