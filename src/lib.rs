// SPDX-License-Identifier: GPL-3.0-only

//! Motion Camera - motion-triggered capture for orientation-sensing devices
//!
//! A tick-driven controller watches the z axis of an orientation sensor and
//! runs the camera for a fixed window whenever the device is moved.
//!
//! # Architecture
//!
//! - [`sensor`]: orientation samples, the latest-sample cell and recorded traces
//! - [`motion`]: calibration and threshold detection
//! - [`controller`]: the `Idle` / `Capturing` session state machine
//! - [`scheduler`]: fixed-rate tick loop that owns the controller
//! - [`device`]: capture device and frame sink abstractions, simulated camera
//! - [`events`]: observability events and sinks
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```ignore
//! let sensor = LatestSample::new();
//! let (camera, frames) = SimulatedCamera::new(config.frame_interval());
//! let controller = CaptureController::new(config.validate()?, sensor.clone(), camera);
//!
//! let handle = TickScheduler::new(config.tick_interval()).spawn(controller, frames);
//! // feed readings with sensor.publish(...)
//! let controller = handle.cancel().await?;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod device;
pub mod errors;
pub mod events;
pub mod motion;
pub mod scheduler;
pub mod sensor;

// Re-export commonly used types
pub use config::{Config, ControllerSettings};
pub use constants::CaptureProfile;
pub use controller::{CaptureController, SessionState, Timestamp, Transition};
pub use device::{CameraFrame, CaptureDevice, FrameSink};
pub use events::{CaptureEvent, EventSink};
pub use motion::{MotionVerdict, detect};
pub use scheduler::{CancelHandle, SchedulerHandle, TickScheduler};
pub use sensor::{LatestSample, OrientationSample, SensorSource};
