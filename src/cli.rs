use std::path::PathBuf;

use rtidome::{Calibration, Operation};
use structopt::clap::ArgGroup;
use structopt::StructOpt;

/// Terminal application to make operating the RTI dome simpler
#[derive(StructOpt, Debug)]
#[structopt(name = "rti-dome", group = ArgGroup::with_name("operation").required(true))]
pub struct Opts {
    /// Set up the camera by turning on a light
    #[structopt(short = "l", long = "light", group = "operation")]
    pub light: bool,

    /// Enter the address of the LED and how long it should be activated for (in seconds),
    /// delimited by commas as x,y,time e.g. 3,0,20
    #[structopt(
        short = "c",
        long = "calibrate",
        value_name = "x,y,duration",
        group = "operation",
        allow_hyphen_values = true
    )]
    pub calibrate: Option<Calibration>,

    /// Start capture of the RTI dome once camera and LEDs are set up
    #[structopt(short = "s", long = "start", group = "operation")]
    pub start: bool,

    /// The serial device to connect to, instead of looking for one
    #[structopt(env = "SERIAL_PORT", short = "p", long = "port")]
    pub serial_port: Option<String>,

    /// The YAML file with logging settings
    #[structopt(long = "log-config", default_value = "logging.yml", parse(from_os_str))]
    pub log_config: PathBuf,

    /// The YAML file with the capture sequence setup
    #[structopt(long = "setup", default_value = "setup.yml", parse(from_os_str))]
    pub setup: PathBuf,
}

impl Opts {
    /// Returns the selected operation. The argument group guarantees exactly one is set.
    pub fn operation(&self) -> Operation {
        match &self.calibrate {
            Some(calibration) => Operation::Calibrate(calibration.clone()),
            None if self.light => Operation::Light,
            None => Operation::Capture,
        }
    }
}
