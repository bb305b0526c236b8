// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the motion camera

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for capture device commands
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Invalid or unreadable configuration
    Config(ConfigError),
    /// Capture device errors
    Device(DeviceError),
    /// Sensor trace errors
    Sensor(SensorError),
    /// Generic error with message
    Other(String),
}

/// Configuration errors
///
/// These are the only fatal errors; they surface before the controller runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Threshold is negative or not a number
    InvalidThreshold(f64),
    /// Session duration is zero
    InvalidSessionDuration,
    /// Tick interval is zero
    InvalidTickInterval,
    /// Frame interval is zero
    InvalidFrameInterval,
    /// Config file could not be read
    Io(String),
    /// Config file is not valid JSON for [`crate::config::Config`]
    Parse(String),
}

/// Capture device command errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Device is held by something else
    Busy,
    /// Device rejected the command
    CommandFailed(String),
    /// Device has gone away
    Disconnected,
}

/// Sensor trace errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// Trace file could not be read
    Io(String),
    /// A trace line is malformed
    InvalidEntry { line: usize, message: String },
    /// Trace timestamps go backwards
    OutOfOrder { line: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Device(e) => write!(f, "Device error: {}", e),
            AppError::Sensor(e) => write!(f, "Sensor error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidThreshold(value) => {
                write!(f, "Threshold must be a non-negative number, got {}", value)
            }
            ConfigError::InvalidSessionDuration => {
                write!(f, "Session duration must be greater than zero")
            }
            ConfigError::InvalidTickInterval => write!(f, "Tick interval must be greater than zero"),
            ConfigError::InvalidFrameInterval => {
                write!(f, "Frame interval must be greater than zero")
            }
            ConfigError::Io(msg) => write!(f, "Cannot read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Cannot parse config: {}", msg),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Busy => write!(f, "Capture device is busy"),
            DeviceError::CommandFailed(msg) => write!(f, "Command failed: {}", msg),
            DeviceError::Disconnected => write!(f, "Capture device disconnected"),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Io(msg) => write!(f, "Cannot read trace: {}", msg),
            SensorError::InvalidEntry { line, message } => {
                write!(f, "Invalid trace entry on line {}: {}", line, message)
            }
            SensorError::OutOfOrder { line } => {
                write!(f, "Trace timestamp on line {} is earlier than the previous one", line)
            }
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for DeviceError {}
impl std::error::Error for SensorError {}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<DeviceError> for AppError {
    fn from(err: DeviceError) -> Self {
        AppError::Device(err)
    }
}

impl From<SensorError> for AppError {
    fn from(err: SensorError) -> Self {
        AppError::Sensor(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
