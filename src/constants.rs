// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default motion threshold for the calibrated z-axis value
pub const DEFAULT_THRESHOLD: f64 = 0.05;

/// Number of decimal places the z-axis reading is rounded to before comparison
pub const CALIBRATION_DECIMALS: i32 = 2;

/// Capture session length presets
///
/// A session is the fixed window the camera stays running once motion has
/// been detected. Motion seen during the window does not extend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureProfile {
    /// Short burst of frames after each trigger (default)
    #[default]
    Quick,
    /// Long unattended capture window
    Extended,
}

impl CaptureProfile {
    /// All profiles, for help output and iteration
    pub const ALL: [CaptureProfile; 2] = [CaptureProfile::Quick, CaptureProfile::Extended];

    /// Display name for the profile
    pub fn display_name(&self) -> &'static str {
        match self {
            CaptureProfile::Quick => "Quick",
            CaptureProfile::Extended => "Extended",
        }
    }

    /// Session length for this profile
    pub fn session_duration(&self) -> Duration {
        match self {
            CaptureProfile::Quick => Duration::from_secs(10),
            CaptureProfile::Extended => Duration::from_secs(120),
        }
    }
}

impl std::str::FromStr for CaptureProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(CaptureProfile::Quick),
            "extended" => Ok(CaptureProfile::Extended),
            other => Err(format!(
                "unknown profile '{}' (expected 'quick' or 'extended')",
                other
            )),
        }
    }
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Controller tick period (10 Hz)
    pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

    /// Interval between frames produced by the simulated camera
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(200);

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// Channel sizes
pub mod channels {
    /// Frames buffered between the device thread and the event loop.
    /// Frames beyond this are dropped by the producer.
    pub const FRAME_CHANNEL_CAPACITY: usize = 8;
}

/// Saved frame naming
pub mod frames {
    /// chrono format string used for frame file names
    pub const FILE_NAME_FORMAT: &str = "img_%Y%m%d_%H%M%S";

    /// Extension of saved frames
    pub const FILE_EXTENSION: &str = "bmp";
}

/// Application information utilities
pub mod app_info {
    /// Application version from the build environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Directory name used under the user's config dir
    pub const CONFIG_DIR_NAME: &str = "motion-camera";

    /// Config file name inside [`CONFIG_DIR_NAME`]
    pub const CONFIG_FILE_NAME: &str = "config.json";
}
