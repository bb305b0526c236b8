// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{self, CaptureProfile, app_info, timing};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// User configuration
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute calibrated value above which motion is detected
    pub threshold: f64,
    /// Session length preset
    pub profile: CaptureProfile,
    /// Explicit session length in milliseconds, overrides `profile`
    pub session_duration_ms: Option<u64>,
    /// Controller tick period in milliseconds
    pub tick_interval_ms: u64,
    /// Simulated camera frame period in milliseconds
    pub frame_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: constants::DEFAULT_THRESHOLD,
            profile: CaptureProfile::default(),
            session_duration_ms: None,
            tick_interval_ms: timing::TICK_INTERVAL.as_millis() as u64,
            frame_interval_ms: timing::FRAME_INTERVAL.as_millis() as u64,
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/motion-camera/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(app_info::CONFIG_DIR_NAME)
                .join(app_info::CONFIG_FILE_NAME)
        })
    }

    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Load from an explicit path, or from the default location if a file
    /// exists there, or fall back to defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Effective session length
    pub fn session_duration(&self) -> Duration {
        self.session_duration_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.profile.session_duration())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Check the config and produce controller settings
    pub fn validate(&self) -> Result<ControllerSettings, ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidFrameInterval);
        }
        ControllerSettings::new(self.threshold, self.session_duration())
    }
}

/// Validated settings the capture controller runs with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    threshold: f64,
    session_duration: Duration,
}

impl ControllerSettings {
    /// Build settings, rejecting a negative or NaN threshold and a zero
    /// session duration.
    pub fn new(threshold: f64, session_duration: Duration) -> Result<Self, ConfigError> {
        if threshold.is_nan() || threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if session_duration.is_zero() {
            return Err(ConfigError::InvalidSessionDuration);
        }

        info!(
            threshold,
            session_ms = session_duration.as_millis() as u64,
            "Controller settings accepted"
        );

        Ok(Self {
            threshold,
            session_duration,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            threshold: constants::DEFAULT_THRESHOLD,
            session_duration: CaptureProfile::default().session_duration(),
        }
    }
}
