// SPDX-License-Identifier: GPL-3.0-only

//! Orientation sensor abstraction
//!
//! The controller only ever asks for the most recent reading. A sensor
//! driver (hardware callback, trace feeder, test) publishes into a
//! [`LatestSample`] cell and the controller reads it once per tick.

pub mod trace;

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// One orientation reading
///
/// Axes that the sensor has not reported yet are `None`. A sample with no
/// axes at all is the "unavailable" sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl OrientationSample {
    /// The "no reading yet" sentinel
    pub const UNAVAILABLE: OrientationSample = OrientationSample {
        x: None,
        y: None,
        z: None,
    };

    /// A reading with all three axes present
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// A reading where only the z axis matters
    pub fn from_z(z: f64) -> Self {
        Self::new(0.0, 0.0, z)
    }

    /// True when the sample carries no z reading
    ///
    /// Covers the all-absent sentinel and partial readings that are missing
    /// the only axis motion detection looks at.
    pub fn is_unavailable(&self) -> bool {
        self.z.is_none()
    }

    /// The z axis, if this sample can be used for motion detection
    pub fn z_axis(&self) -> Option<f64> {
        self.z
    }
}

/// Source of orientation readings
pub trait SensorSource {
    /// Latest known reading, or [`OrientationSample::UNAVAILABLE`]. Never blocks.
    fn current_sample(&self) -> OrientationSample;

    /// Start delivering readings
    fn enable(&mut self) {}

    /// Stop delivering readings
    fn disable(&mut self) {}
}

/// Shared cell holding the most recent reading
///
/// Clones share the same cell: hand one clone to the sensor driver and
/// another to the controller.
#[derive(Debug, Clone, Default)]
pub struct LatestSample {
    inner: Arc<Mutex<OrientationSample>>,
}

impl LatestSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current reading
    pub fn publish(&self, sample: OrientationSample) {
        match self.inner.lock() {
            Ok(mut guard) => *guard = sample,
            Err(poisoned) => *poisoned.into_inner() = sample,
        }
    }

    /// Forget the current reading
    pub fn clear(&self) {
        self.publish(OrientationSample::UNAVAILABLE);
    }
}

impl SensorSource for LatestSample {
    fn current_sample(&self) -> OrientationSample {
        match self.inner.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn disable(&mut self) {
        self.clear();
    }
}
