pub mod command;
pub mod config;
mod error;
pub mod port;

use std::ffi::OsStr;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

pub use error::{CalibrationError, ConfigError, Error};

pub use command::{Calibration, Capture, DomeCommand, Light};
pub use config::{CaptureConfig, LoggingConfig};
use port::Platform;

use log::{debug, info, trace};
pub use serialport;
use serialport::prelude::*;

/// The baud rate the controller firmware listens at
pub const BAUD_RATE: u32 = 9600;

/// Read/write timeout for the serial connection
pub const SERIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait around a write.
///
/// Opening the port resets the controller, so it needs time to boot before it can receive a
/// command, and time to take the command in before the port is closed again.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SettleTiming {
    pub before: Duration,
    pub after: Duration,
}

impl Default for SettleTiming {
    fn default() -> Self {
        SettleTiming {
            before: Duration::from_secs(2),
            after: Duration::from_secs(2),
        }
    }
}

impl SettleTiming {
    /// No settle time at all, for ports that aren't attached to a controller
    pub fn none() -> Self {
        SettleTiming {
            before: Duration::from_secs(0),
            after: Duration::from_secs(0),
        }
    }
}

/// A connection to the dome controller.
pub struct Dome<P> {
    port: P,
    timing: SettleTiming,
}

impl<P> fmt::Debug for Dome<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dome").field("timing", &self.timing).finish()
    }
}

impl Dome<Box<dyn serialport::SerialPort>> {
    /// Opens the given `port` at 9600 baud, 8N1, with a 5 second timeout.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rtidome::{Dome, Light};
    ///
    /// let mut dome = Dome::open("/dev/ttyACM0")?;
    /// dome.send(&Light)?;
    ///
    /// # Ok::<(), rtidome::Error>(())
    /// ```
    pub fn open<S: AsRef<OsStr>>(port: S) -> Result<Self, Error> {
        let settings = SerialPortSettings {
            baud_rate: BAUD_RATE,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: SERIAL_TIMEOUT,
        };

        debug!("Opening serial port {:?}", port.as_ref());

        let serial_port = serialport::open_with_settings(port.as_ref(), &settings).map_err(
            |err| Error::SerialOpenError(port.as_ref().to_string_lossy().into_owned(), err),
        )?;

        Ok(Dome::with_port(serial_port, SettleTiming::default()))
    }
}

impl<P: Write> Dome<P> {
    /// Wraps an already open `port`
    pub fn with_port(port: P, timing: SettleTiming) -> Self {
        Dome { port, timing }
    }

    /// Consumes `self` and returns the inner port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Waits for the controller to settle, writes `command` and waits again.
    ///
    /// Nothing is read back; a successful return only means the bytes were handed to the port.
    pub fn send<C: DomeCommand>(&mut self, command: &C) -> Result<(), Error> {
        let mut buf: Vec<u8> = Vec::with_capacity(64);

        command.to_writer(&mut buf)?;

        trace!("Waiting {:?} for the controller to settle", self.timing.before);
        thread::sleep(self.timing.before);

        debug!("Sending {:?}", String::from_utf8_lossy(&buf));
        self.port.write_all(&buf)?;
        self.port.flush()?;

        thread::sleep(self.timing.after);

        Ok(())
    }
}

/// Lights the focusing LED
pub fn light_led<P: Write>(dome: &mut Dome<P>) -> Result<(), Error> {
    dome.send(&Light)?;

    info!("Lighting LED for 60 seconds to allow for camera focusing!");

    Ok(())
}

/// Turns on a single LED for the calibration's duration
pub fn calibrate_led<P: Write>(
    dome: &mut Dome<P>,
    calibration: &Calibration,
) -> Result<(), Error> {
    dome.send(calibration)?;

    info!(
        "Turning on an LED at address x: {}, y: {}, for {} seconds!",
        calibration.x(),
        calibration.y(),
        calibration.duration()
    );

    Ok(())
}

/// Starts the capture sequence described by `config`
pub fn start_capture<P: Write>(dome: &mut Dome<P>, config: &CaptureConfig) -> Result<(), Error> {
    dome.send(&Capture(config))?;

    info!(
        "Starting capture sequence in 5 seconds, to cancel simply press the reset button on the \
         Arduino. Capture can take 5-10 minutes to complete!"
    );

    Ok(())
}

/// The single operation requested for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Light,
    Calibrate(Calibration),
    Capture,
}

/// Runs `operation` against the controller at `serial_port`.
///
/// A `None` port fails with `Error::UnsupportedPlatform` before anything is opened. The capture
/// setup at `setup` is only read for `Operation::Capture`, and before the port is opened.
pub fn dispatch(
    operation: &Operation,
    serial_port: Option<&str>,
    setup: &Path,
) -> Result<(), Error> {
    let serial_port = serial_port
        .ok_or_else(|| Error::UnsupportedPlatform(Platform::current().to_string()))?;

    info!("Using serial device {:?}", serial_port);
    debug!("Selected operation: {:?}", operation);

    match operation {
        Operation::Light => light_led(&mut Dome::open(serial_port)?),
        Operation::Calibrate(calibration) => {
            calibrate_led(&mut Dome::open(serial_port)?, calibration)
        }
        Operation::Capture => {
            let config = CaptureConfig::load(setup)?;

            start_capture(&mut Dome::open(serial_port)?, &config)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn test_dome() -> Dome<Vec<u8>> {
        Dome::with_port(Vec::new(), SettleTiming::none())
    }

    /// A port that refuses every write, like a controller that was unplugged
    struct Disconnected;

    impl Write for Disconnected {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "device disconnected"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn it_should_write_the_light_payload() {
        let mut dome = test_dome();

        light_led(&mut dome).unwrap();

        assert_eq!(dome.into_port(), b"L,0");
    }

    #[test]
    fn it_should_write_the_calibration_payload() {
        let mut dome = test_dome();
        let calibration: Calibration = "3,0,20".parse().unwrap();

        calibrate_led(&mut dome, &calibration).unwrap();

        assert_eq!(dome.into_port(), b"T, 3,0,20");
    }

    #[test]
    fn it_should_write_the_capture_payload() {
        let mut dome = test_dome();
        let config = CaptureConfig {
            delay_before: Some(1),
            delay_after: Some(1),
            start_row: Some(0),
            end_row: Some(5),
            start_column: Some(0),
            end_column: Some(5),
            max_leds: Some(25),
        };

        start_capture(&mut dome, &config).unwrap();

        assert_eq!(dome.into_port(), b"C, 1,1,0,5,0,5,25");
    }

    #[test]
    fn it_should_propagate_write_failures() {
        let mut dome = Dome::with_port(Disconnected, SettleTiming::none());

        assert!(matches!(light_led(&mut dome), Err(Error::IoError(_))));
    }

    const MISSING_DEVICE: &str = "/dev/rti-dome-does-not-exist";

    #[test]
    fn it_should_not_dispatch_without_a_port() {
        let dir = tempfile::tempdir().unwrap();
        let operations = vec![
            Operation::Light,
            Operation::Calibrate("3,0,20".parse().unwrap()),
            Operation::Capture,
        ];

        for operation in &operations {
            let err = dispatch(operation, None, &dir.path().join("setup.yml")).unwrap_err();

            assert!(matches!(err, Error::UnsupportedPlatform(_)));
        }
    }

    #[test]
    fn it_should_not_read_the_setup_when_lighting() {
        let dir = tempfile::tempdir().unwrap();
        let err = dispatch(
            &Operation::Light,
            Some(MISSING_DEVICE),
            &dir.path().join("setup.yml"),
        )
        .unwrap_err();

        assert!(matches!(err, Error::SerialOpenError(..)));
    }

    #[test]
    fn it_should_read_the_setup_before_opening_the_port_for_capture() {
        let dir = tempfile::tempdir().unwrap();
        let err = dispatch(
            &Operation::Capture,
            Some(MISSING_DEVICE),
            &dir.path().join("setup.yml"),
        )
        .unwrap_err();

        assert!(matches!(err, Error::ConfigError(..)));
    }

    #[test]
    fn it_should_fail_to_open_a_missing_device() {
        let err = Dome::open(MISSING_DEVICE).unwrap_err();

        assert!(matches!(
            err,
            Error::SerialOpenError(ref path, _) if path == MISSING_DEVICE
        ));
    }
}
