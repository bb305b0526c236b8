// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle for periodic frame producers
//!
//! A [`FrameLoop`] runs a closure on its own thread once per period until
//! the closure returns [`LoopAction::Stop`] or the loop is stopped from
//! outside. Stopping wakes the thread immediately instead of waiting out the
//! rest of the period.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Returned by the loop body to keep going or finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// A periodic loop running on a dedicated thread
///
/// # Example
///
/// ```ignore
/// let mut frames = FrameLoop::start("camera", Duration::from_millis(200), move || {
///     match sender.try_send(next_frame()) {
///         Err(e) if e.is_disconnected() => LoopAction::Stop,
///         _ => LoopAction::Continue,
///     }
/// });
///
/// frames.stop();
/// ```
pub struct FrameLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl FrameLoop {
    /// Spawn the loop. `loop_fn` runs immediately, then once per `period`.
    pub fn start<F>(name: &str, period: Duration, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, period_ms = period.as_millis() as u64, "Starting frame loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Frame loop thread started");

            loop {
                if stop_signal_clone.load(Ordering::SeqCst) {
                    debug!(name = %name_clone, "Stop signal received");
                    break;
                }

                if loop_fn() == LoopAction::Stop {
                    debug!(name = %name_clone, "Loop requested stop");
                    break;
                }

                // Woken early by request_stop()
                thread::park_timeout(period);
            }

            info!(name = %name_clone, "Frame loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Whether the thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting for it
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting frame loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = &self.thread_handle {
            handle.thread().unpark();
        }
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Signal the loop to stop and let the thread finish on its own
    ///
    /// For callers that must not block, such as an async task. The thread
    /// may run the body once more if it was already inside it.
    pub fn detach(mut self) {
        self.request_stop();
        if self.thread_handle.take().is_some() {
            debug!(name = %self.name, "Frame loop detached");
        }
    }

    /// Wait for the thread to finish without sending the stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Frame loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Frame loop thread finished");
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "FrameLoop dropped, stopping loop");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Instant;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut frame_loop = FrameLoop::start("test-loop", Duration::from_millis(1), move || {
            let count = counter_clone.fetch_add(1, Ordering::SeqCst);
            if count >= 4 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        });

        frame_loop.join();

        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_stop_interrupts_long_period() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut frame_loop = FrameLoop::start("test-slow", Duration::from_secs(60), move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            LoopAction::Continue
        });

        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        frame_loop.stop();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!frame_loop.is_running());
    }

    #[test]
    fn test_detach_stops_without_joining() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let frame_loop = FrameLoop::start("test-detach", Duration::from_millis(1), move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            LoopAction::Continue
        });
        thread::sleep(Duration::from_millis(20));

        frame_loop.detach();
        thread::sleep(Duration::from_millis(50));
        let after_detach = counter.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));

        assert_eq!(counter.load(Ordering::SeqCst), after_detach);
    }

    #[test]
    fn test_is_running() {
        let frame_loop = FrameLoop::start("test-running", Duration::from_millis(100), || {
            LoopAction::Continue
        });

        assert!(frame_loop.is_running());

        // Drop stops it
        drop(frame_loop);
    }
}
