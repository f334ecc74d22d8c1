use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons a calibration argument is rejected before any device I/O happens
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("expected exactly 3 comma-delimited values (x,y,duration), got {}", _0)]
    FieldCount(usize),
    #[error("{:?} is not an integer", _0)]
    NotAnInteger(String),
}

/// Errors from reading one of the YAML resources
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {}", _0)]
    IoError(#[from] io::Error),
    #[error("YAML error: {}", _0)]
    YamlError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("No serial port could be resolved on this operating system ({})", _0)]
    UnsupportedPlatform(String),
    #[error("Invalid calibration: {}", _0)]
    InvalidCalibration(#[from] CalibrationError),
    #[error("Error when opening serial port {}: {}", _0, _1)]
    SerialOpenError(String, serialport::Error),
    #[error("I/O error: {}", _0)]
    IoError(#[from] io::Error),
    #[error("Could not load {}: {}", _0.display(), _1)]
    ConfigError(PathBuf, ConfigError),
}
