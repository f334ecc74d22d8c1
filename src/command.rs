//! The ASCII commands understood by the dome controller.
//!
//! Every command is a single line of the form `<verb>,<parameters>`, written without a line
//! terminator. The controller never replies.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::config::CaptureConfig;
use crate::error::CalibrationError;
use crate::Error;

/// An interface for serializing a command to a writer in the form the controller expects.
pub trait DomeCommand {
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Returns the serialized command as a string
    fn payload(&self) -> Result<String, Error> {
        let mut buf: Vec<u8> = Vec::new();

        self.to_writer(&mut buf)?;

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Lights the focusing LED.
pub struct Light;

impl DomeCommand for Light {
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writer.write_all(b"L,0")?;

        Ok(())
    }
}

/// Activates the LED at `(x, y)` for `duration` seconds.
///
/// The command is parsed from the comma-delimited `x,y,duration` form. Every field has to be an
/// integer of any size, with an optional sign; ranges are not checked. The controller gets the
/// text exactly as it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calibration {
    raw: String,
    fields: [String; 3],
}

impl Calibration {
    pub fn x(&self) -> &str {
        &self.fields[0]
    }

    pub fn y(&self) -> &str {
        &self.fields[1]
    }

    /// How long the LED stays lit, in seconds
    pub fn duration(&self) -> &str {
        &self.fields[2]
    }

    /// The argument exactly as it was given
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Whether `field` is an optionally signed run of ASCII digits
fn is_integer(field: &str) -> bool {
    let digits = field.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(field);

    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for Calibration {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();

        if fields.len() != 3 {
            return Err(CalibrationError::FieldCount(fields.len()));
        }

        if let Some(field) = fields.iter().find(|field| !is_integer(field)) {
            return Err(CalibrationError::NotAnInteger((*field).to_owned()));
        }

        Ok(Calibration {
            raw: s.to_owned(),
            fields: [
                fields[0].to_owned(),
                fields[1].to_owned(),
                fields[2].to_owned(),
            ],
        })
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl DomeCommand for Calibration {
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        write!(writer, "T, {}", self.raw)?;

        Ok(())
    }
}

/// Starts a capture sequence with the given setup.
///
/// A field missing from the setup is sent as an empty value rather than a placeholder word.
pub struct Capture<'a>(pub &'a CaptureConfig);

impl DomeCommand for Capture<'_> {
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let params: Vec<String> = self
            .0
            .fields()
            .iter()
            .map(|(_, value)| value.map(|v| v.to_string()).unwrap_or_default())
            .collect();

        write!(writer, "C, {}", params.join(","))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_serialize_light_cmd() {
        assert_eq!(Light.payload().unwrap(), "L,0");
    }

    #[test]
    fn it_should_parse_calibration_coordinates() {
        let calibration: Calibration = "3,0,20".parse().unwrap();

        assert_eq!(calibration.x(), "3");
        assert_eq!(calibration.y(), "0");
        assert_eq!(calibration.duration(), "20");
        assert_eq!(calibration.payload().unwrap(), "T, 3,0,20");
    }

    #[test]
    fn it_should_echo_the_raw_calibration_string() {
        let calibration: Calibration = "3, 0 ,20".parse().unwrap();

        assert_eq!(calibration.y(), "0");
        assert_eq!(calibration.payload().unwrap(), "T, 3, 0 ,20");
    }

    #[test]
    fn it_should_not_range_check_calibration_values() {
        let calibration: Calibration = "-1,+2,0".parse().unwrap();

        assert_eq!(calibration.x(), "-1");
        assert_eq!(calibration.y(), "+2");
        assert_eq!(calibration.duration(), "0");
    }

    #[test]
    fn it_should_accept_integers_of_any_size() {
        let calibration: Calibration = "3,0,99999999999999999999".parse().unwrap();

        assert_eq!(calibration.duration(), "99999999999999999999");
        assert_eq!(
            calibration.payload().unwrap(),
            "T, 3,0,99999999999999999999"
        );
    }

    #[test]
    fn it_should_reject_the_wrong_number_of_calibration_fields() {
        assert_eq!(
            "3,0".parse::<Calibration>(),
            Err(CalibrationError::FieldCount(2))
        );
        assert_eq!(
            "3,0,20,1".parse::<Calibration>(),
            Err(CalibrationError::FieldCount(4))
        );
        assert_eq!(
            "".parse::<Calibration>(),
            Err(CalibrationError::FieldCount(1))
        );
    }

    #[test]
    fn it_should_reject_non_integer_calibration_fields() {
        assert_eq!(
            "3,a,20".parse::<Calibration>(),
            Err(CalibrationError::NotAnInteger("a".to_owned()))
        );
        assert_eq!(
            "3,0,2.5".parse::<Calibration>(),
            Err(CalibrationError::NotAnInteger("2.5".to_owned()))
        );
        assert_eq!(
            "3,,20".parse::<Calibration>(),
            Err(CalibrationError::NotAnInteger("".to_owned()))
        );
        assert_eq!(
            "3,-,20".parse::<Calibration>(),
            Err(CalibrationError::NotAnInteger("-".to_owned()))
        );
    }

    #[test]
    fn it_should_serialize_capture_cmd() {
        let config = CaptureConfig {
            delay_before: Some(1),
            delay_after: Some(1),
            start_row: Some(0),
            end_row: Some(5),
            start_column: Some(0),
            end_column: Some(5),
            max_leds: Some(25),
        };

        assert_eq!(Capture(&config).payload().unwrap(), "C, 1,1,0,5,0,5,25");
    }

    #[test]
    fn it_should_leave_missing_capture_fields_empty() {
        let config = CaptureConfig {
            delay_before: Some(2),
            max_leds: Some(40),
            ..CaptureConfig::default()
        };

        assert_eq!(Capture(&config).payload().unwrap(), "C, 2,,,,,,40");
    }
}
