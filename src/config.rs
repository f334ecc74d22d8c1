//! YAML resources read by the dome controller

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::Error;

/// Reads and deserializes the YAML file at `path`, returning `None` for an empty document
fn load_yaml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Option<T>, Error> {
    let path = path.as_ref();
    let read = || -> Result<Option<T>, ConfigError> {
        let contents = fs::read_to_string(path)?;

        if contents.trim().is_empty() {
            return Ok(None);
        }

        Ok(serde_yaml::from_str(&contents)?)
    };

    read().map_err(|err| Error::ConfigError(path.to_path_buf(), err))
}

/// Settings for the log output
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives in `RUST_LOG` syntax, e.g. `info` or `rtidome=debug`
    pub level: String,
    /// Whether to prefix log lines with a timestamp
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_owned(),
            timestamps: true,
        }
    }
}

impl LoggingConfig {
    /// Loads the logging settings from `path`, falling back to the defaults when the file does
    /// not exist.
    ///
    /// This runs before a logger is installed, so nothing is logged here.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LoggingConfig, Error> {
        match load_yaml(path.as_ref()) {
            Err(Error::ConfigError(_, ConfigError::IoError(err)))
                if err.kind() == io::ErrorKind::NotFound =>
            {
                Ok(LoggingConfig::default())
            }
            Ok(None) => Ok(LoggingConfig::default()),
            Ok(Some(config)) => Ok(config),
            Err(err) => Err(err),
        }
    }
}

/// The capture sequence parameters sent along with the `C` command.
///
/// None of the fields have defaults. A key missing from the resource stays `None` and is sent
/// to the controller as an empty field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Seconds to wait before lighting each LED
    pub delay_before: Option<i64>,
    /// Seconds to wait after lighting each LED
    pub delay_after: Option<i64>,
    pub start_row: Option<i64>,
    pub end_row: Option<i64>,
    pub start_column: Option<i64>,
    pub end_column: Option<i64>,
    /// The maximum number of LEDs to light during the sequence
    pub max_leds: Option<i64>,
}

impl CaptureConfig {
    /// Loads the capture setup from `path`. The file is expected to exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<CaptureConfig, Error> {
        debug!("Loading capture setup from {}", path.as_ref().display());

        let config: Option<CaptureConfig> = load_yaml(path)?;
        let config = config.unwrap_or_default();

        for name in config.missing_fields() {
            warn!("Capture setup has no value for {}", name);
        }

        Ok(config)
    }

    /// Returns the fields in the order they are sent to the controller
    pub fn fields(&self) -> [(&'static str, Option<i64>); 7] {
        [
            ("delay_before", self.delay_before),
            ("delay_after", self.delay_after),
            ("start_row", self.start_row),
            ("end_row", self.end_row),
            ("start_column", self.start_column),
            ("end_column", self.end_column),
            ("max_leds", self.max_leds),
        ]
    }

    /// Returns the names of the fields that have no value
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect()
    }
}
