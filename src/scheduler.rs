// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-rate tick scheduler
//!
//! One tokio task owns the controller and is the only place its handlers
//! run. The task waits on three things at once: the tick interval, the
//! device's frame stream and the cancel signal, so a tick and a frame can
//! never be handled concurrently.
//!
//! Cancelling ends the current capture session through
//! [`CaptureController::force_stop`], disables the sensor and hands the
//! controller back to the caller.

use crate::controller::{CaptureController, Timestamp};
use crate::device::{CameraFrame, CaptureDevice, FrameSink};
use crate::events::EventSink;
use crate::sensor::SensorSource;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Clonable handle that stops a running scheduler
///
/// Safe to call from any thread, including signal handlers, and before the
/// loop has started waiting.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    notify: Arc<Notify>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // notify_one stores a permit if the loop is not waiting yet
        self.notify.notify_one();
    }
}

/// A running scheduler
pub struct SchedulerHandle<C> {
    cancel: CancelHandle,
    task: JoinHandle<C>,
}

impl<C> SchedulerHandle<C> {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Stop ticking and return the controller
    pub async fn cancel(self) -> Result<C, JoinError> {
        self.cancel.cancel();
        self.task.await
    }

    /// Wait until the scheduler is cancelled elsewhere
    pub async fn join(self) -> Result<C, JoinError> {
        self.task.await
    }
}

/// Runs a controller's tick handler at a fixed period
#[derive(Debug, Clone, Copy)]
pub struct TickScheduler {
    period: Duration,
}

impl TickScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking `controller` on the current tokio runtime
    ///
    /// The first tick happens immediately at `Timestamp::ZERO`. Frames from
    /// `frames` are delivered to [`CaptureController::on_device_frame`]
    /// between ticks; pass `futures::stream::pending()` for a device that
    /// never produces any.
    pub fn spawn<S, D, E, F, R>(
        &self,
        mut controller: CaptureController<S, D, E, F>,
        mut frames: R,
    ) -> SchedulerHandle<CaptureController<S, D, E, F>>
    where
        S: SensorSource + Send + 'static,
        D: CaptureDevice + Send + 'static,
        E: EventSink + Send + 'static,
        F: FrameSink + Send + 'static,
        R: Stream<Item = CameraFrame> + Unpin + Send + 'static,
    {
        let cancel = CancelHandle::default();
        let notify = Arc::clone(&cancel.notify);
        let period = self.period;

        let task = tokio::spawn(async move {
            info!(period_ms = period.as_millis() as u64, "Tick scheduler started");
            controller.sensor_mut().enable();

            let epoch = Instant::now();
            let mut interval = tokio::time::interval_at(epoch, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut frames_open = true;
            let mut ticks: u64 = 0;

            loop {
                tokio::select! {
                    biased;

                    _ = notify.notified() => {
                        debug!(ticks, "Tick scheduler cancelled");
                        break;
                    }
                    at = interval.tick() => {
                        ticks += 1;
                        controller.on_tick(Timestamp::from(at.duration_since(epoch)));
                    }
                    frame = frames.next(), if frames_open => match frame {
                        Some(frame) => controller.on_device_frame(&frame),
                        None => {
                            debug!("Frame stream closed");
                            frames_open = false;
                        }
                    },
                }
            }

            controller.force_stop();
            controller.sensor_mut().disable();
            info!(ticks, "Tick scheduler stopped");
            controller
        });

        SchedulerHandle { cancel, task }
    }
}
