// SPDX-License-Identifier: GPL-3.0-only

//! Motion detection on the calibrated z axis
//!
//! The raw z reading is rounded to two decimals first and the rounded value
//! is compared against the threshold. Rounding is half away from zero
//! (`f64::round` on `z * 100`), so `0.125` calibrates to `0.13` and `-0.125`
//! to `-0.13`. Because rounding comes first, a raw `0.049999` becomes `0.05`
//! and does not exceed a `0.05` threshold.

use crate::constants::CALIBRATION_DECIMALS;
use crate::sensor::OrientationSample;

/// Outcome of one detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionVerdict {
    /// Rounded z value the decision was made on
    pub calibrated: f64,
    /// `|calibrated| > threshold`
    pub motion: bool,
}

/// Round a raw z reading to the calibration precision
pub fn calibrate(z: f64) -> f64 {
    let scale = 10f64.powi(CALIBRATION_DECIMALS);
    (z * scale).round() / scale
}

/// Decide whether `sample` shows motion
///
/// Returns `None` for an unavailable sample; callers must skip the tick
/// rather than treat it as "no motion". `threshold_abs` must be
/// non-negative, which [`crate::config::ControllerSettings`] guarantees.
pub fn detect(sample: &OrientationSample, threshold_abs: f64) -> Option<MotionVerdict> {
    debug_assert!(threshold_abs >= 0.0);

    let calibrated = calibrate(sample.z_axis()?);
    Some(MotionVerdict {
        calibrated,
        motion: calibrated.abs() > threshold_abs,
    })
}
