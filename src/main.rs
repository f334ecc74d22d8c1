use std::env;
use std::panic;
use std::process;

use anyhow::Context;
use log::error;
use structopt::StructOpt;

use rtidome::port::{self, Platform};
use rtidome::{LoggingConfig, Operation};

mod cli;

use cli::Opts;

/// Builds the logger described by `config` and installs it.
///
/// `RUST_LOG` takes precedence over the configured level when it is set.
fn init_logger(config: &LoggingConfig) -> Result<(), anyhow::Error> {
    let mut builder = if config.timestamps {
        pretty_env_logger::formatted_timed_builder()
    } else {
        pretty_env_logger::formatted_builder()
    };

    match env::var("RUST_LOG") {
        Ok(filters) => builder.parse_filters(&filters),
        Err(_) => builder.parse_filters(&config.level),
    };

    builder.try_init().context("Could not install the logger")?;

    // Log panics through the logger before the default hook prints them
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        error!("Unhandled fault: {}", info);
        default_hook(info);
    }));

    Ok(())
}

fn run(opts: &Opts) -> Result<(), anyhow::Error> {
    // --calibrate has already been validated by the argument parser at this point
    let serial_port = match &opts.serial_port {
        Some(path) => Some(path.clone()),
        None => port::resolve_port(&Platform::current()),
    };
    let operation = opts.operation();

    rtidome::dispatch(&operation, serial_port.as_deref(), &opts.setup).with_context(|| {
        match &operation {
            Operation::Light => "Could not light the focusing LED".to_owned(),
            Operation::Calibrate(calibration) => format!("Could not calibrate LED {}", calibration),
            Operation::Capture => "Could not start the capture sequence".to_owned(),
        }
    })?;

    Ok(())
}

fn main() {
    // Parse the command-line arguments
    let opts = Opts::from_args();

    let logging = match LoggingConfig::load(&opts.log_config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    if let Err(err) = init_logger(&logging) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }

    if let Err(err) = run(&opts) {
        error!("{:#}", err);
        process::exit(1);
    }
}
