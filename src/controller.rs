// SPDX-License-Identifier: GPL-3.0-only

//! Motion-triggered capture session controller
//!
//! Two states: `Idle` and `Capturing`. While idle, every tick reads the
//! latest orientation sample and starts the camera when motion is detected.
//! While capturing, motion is ignored and the only thing a tick checks is
//! whether the session deadline has passed.
//!
//! ```text
//!           motion && start ok
//!   ┌──────┐ ────────────────▶ ┌───────────┐
//!   │ Idle │                   │ Capturing │
//!   └──────┘ ◀──────────────── └───────────┘
//!        now >= deadline && stop ok
//!              (or force_stop)
//! ```
//!
//! The controller is the only thing that starts or stops the device, so its
//! state and the device's running flag move together. A command the device
//! rejects leaves the state where it was and is retried on the next tick.
//! A device that is already running when the controller takes it over is
//! stopped first, so the controller always begins in a consistent `Idle`.

use crate::config::ControllerSettings;
use crate::device::{CameraFrame, CaptureDevice, FrameSink, LoggingFrameSink};
use crate::events::{CaptureEvent, EventSink, TracingEventSink};
use crate::motion;
use crate::sensor::SensorSource;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::time::Duration;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Monotonic time since the scheduler started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for Timestamp {
    fn from(offset: Duration) -> Self {
        Self(offset)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}

/// Serialized as fractional seconds
impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.as_secs_f64())
    }
}

/// Externally visible controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Capturing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Capturing => write!(f, "capturing"),
        }
    }
}

/// A state change made by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle -> Capturing
    Started { session: Uuid, deadline: Timestamp },
    /// Capturing -> Idle
    Stopped { session: Uuid, frames: u64 },
}

/// Internal state; a deadline exists only while capturing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Capturing {
        session: Uuid,
        deadline: Timestamp,
        frames: u64,
    },
}

/// The capture session state machine
///
/// Generic over its collaborators so tests can drive it with fakes and a
/// hand-advanced clock.
pub struct CaptureController<S, D, E = TracingEventSink, F = LoggingFrameSink> {
    settings: ControllerSettings,
    sensor: S,
    device: D,
    events: E,
    frames: F,
    phase: Phase,
    last_tick: Timestamp,
    last_calibrated: Option<f64>,
    /// `motion_detected` already emitted for the current run of motion
    motion_reported: bool,
}

impl<S, D> CaptureController<S, D>
where
    S: SensorSource,
    D: CaptureDevice,
{
    /// Controller that logs events and frames through `tracing`
    pub fn new(settings: ControllerSettings, sensor: S, device: D) -> Self {
        Self::with_sinks(
            settings,
            sensor,
            device,
            TracingEventSink,
            LoggingFrameSink::new(),
        )
    }
}

impl<S, D, E, F> CaptureController<S, D, E, F>
where
    S: SensorSource,
    D: CaptureDevice,
    E: EventSink,
    F: FrameSink,
{
    /// Controller with explicit event and frame sinks
    ///
    /// A device that is already running is stopped here. If it refuses, the
    /// stop is retried on every idle tick before motion is looked at.
    pub fn with_sinks(
        settings: ControllerSettings,
        sensor: S,
        device: D,
        events: E,
        frames: F,
    ) -> Self {
        let mut controller = Self {
            settings,
            sensor,
            device,
            events,
            frames,
            phase: Phase::Idle,
            last_tick: Timestamp::ZERO,
            last_calibrated: None,
            motion_reported: false,
        };
        controller.release_device();
        controller
    }

    /// Evaluate one tick at time `now`
    ///
    /// Returns the transition made, if any. Device failures are logged and
    /// leave the state unchanged.
    pub fn on_tick(&mut self, now: Timestamp) -> Option<Transition> {
        self.last_tick = now;

        let phase = self.phase;
        match phase {
            Phase::Idle if !self.release_device() => None,
            Phase::Idle => self.evaluate_motion(now),
            Phase::Capturing { deadline, .. } if now >= deadline => {
                debug!(at = %now, "Session deadline reached");
                self.end_session(now)
            }
            Phase::Capturing { .. } => None,
        }
    }

    /// Hand a frame from the running device to the frame sink
    ///
    /// Frames still in flight after a session has ended are dropped.
    pub fn on_device_frame(&mut self, frame: &CameraFrame) {
        match &mut self.phase {
            Phase::Capturing {
                session, frames, ..
            } => {
                *frames += 1;
                self.frames.frame_produced(*session, frame);
            }
            Phase::Idle => {
                trace!(sequence = frame.sequence, "Dropping frame received while idle");
            }
        }
    }

    /// End the current session now, ignoring the deadline
    ///
    /// Does nothing, and sends no command, when already idle.
    pub fn force_stop(&mut self) -> Option<Transition> {
        match self.phase {
            Phase::Idle => None,
            Phase::Capturing { .. } => {
                debug!("Forcing capture stop");
                self.end_session(self.last_tick)
            }
        }
    }

    /// Stop a device found running while idle; true once it is stopped
    fn release_device(&mut self) -> bool {
        if !self.device.is_running() {
            return true;
        }

        warn!("Capture device running without a session, stopping it");
        match self.device.stop() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Capture device rejected stop");
                false
            }
        }
    }

    fn evaluate_motion(&mut self, now: Timestamp) -> Option<Transition> {
        let sample = self.sensor.current_sample();
        let Some(verdict) = motion::detect(&sample, self.settings.threshold()) else {
            trace!(at = %now, "Sensor unavailable, skipping tick");
            return None;
        };

        self.last_calibrated = Some(verdict.calibrated);
        if !verdict.motion {
            self.motion_reported = false;
            return None;
        }

        if self.motion_reported {
            debug!(at = %now, value = verdict.calibrated, "Motion persists, retrying start");
        } else {
            self.motion_reported = true;
            self.events.emit(&CaptureEvent::MotionDetected {
                value: verdict.calibrated,
                timestamp: now,
            });
        }

        if let Err(e) = self.device.start() {
            warn!(error = %e, at = %now, "Capture device rejected start");
            return None;
        }

        let session = Uuid::new_v4();
        let deadline = now + self.settings.session_duration();
        self.phase = Phase::Capturing {
            session,
            deadline,
            frames: 0,
        };
        self.events.emit(&CaptureEvent::CaptureStart {
            session,
            timestamp: now,
            deadline,
        });

        Some(Transition::Started { session, deadline })
    }

    fn end_session(&mut self, now: Timestamp) -> Option<Transition> {
        let Phase::Capturing {
            session, frames, ..
        } = self.phase
        else {
            return None;
        };

        if let Err(e) = self.device.stop() {
            warn!(error = %e, %session, at = %now, "Capture device rejected stop");
            return None;
        }

        self.phase = Phase::Idle;
        self.motion_reported = false;
        self.events.emit(&CaptureEvent::CaptureStop {
            session,
            timestamp: now,
            frames,
        });

        Some(Transition::Stopped { session, frames })
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Capturing { .. } => SessionState::Capturing,
        }
    }

    /// When the current session will end, if one is running
    pub fn deadline(&self) -> Option<Timestamp> {
        match self.phase {
            Phase::Idle => None,
            Phase::Capturing { deadline, .. } => Some(deadline),
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match self.phase {
            Phase::Idle => None,
            Phase::Capturing { session, .. } => Some(session),
        }
    }

    pub fn frames_in_session(&self) -> u64 {
        match self.phase {
            Phase::Idle => 0,
            Phase::Capturing { frames, .. } => frames,
        }
    }

    /// Calibrated value from the most recent tick that had a reading
    pub fn last_calibrated(&self) -> Option<f64> {
        self.last_calibrated
    }

    /// True when the state agrees with the device's running flag
    pub fn is_consistent(&self) -> bool {
        (self.state() == SessionState::Capturing) == self.device.is_running()
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn frame_sink(&self) -> &F {
        &self.frames
    }
}
