//! Discovery of the serial device the dome controller is attached to

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, trace, warn};

/// The device name the controller's USB CDC ACM interface registers as on Linux
pub const LINUX_DEVICE_PATTERN: &str = "ttyACM";

/// Where the Linux kernel lists the tty devices it knows about
pub const SYS_CLASS_TTY: &str = "/sys/class/tty";

/// The device path the controller shows up as on macOS
pub const MACOS_DEVICE_PATH: &str = "/dev/cu.usbmodem1411";

/// The operating system family, as far as port discovery is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Other(String),
}

impl Platform {
    /// Returns the platform this binary was compiled for
    pub fn current() -> Platform {
        Platform::from_os(env::consts::OS)
    }

    /// Maps an `std::env::consts::OS` style identifier to a `Platform`
    pub fn from_os(os: &str) -> Platform {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            other => Platform::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => f.write_str("linux"),
            Platform::MacOs => f.write_str("macos"),
            Platform::Other(os) => f.write_str(os),
        }
    }
}

/// Resolves the serial device path for the given `platform`, or `None` if there is none.
///
/// On Linux the tty devices in `/sys/class/tty` are enumerated first. If that yields no `ttyACM`
/// device, the kernel ring buffer is scraped instead. That fallback depends on the host still
/// retaining the attach message in `dmesg`, so it can miss a device that has been plugged in for
/// a long time.
pub fn resolve_port(platform: &Platform) -> Option<String> {
    match platform {
        Platform::Linux => resolve_linux_port(Path::new(SYS_CLASS_TTY), scrape_dmesg),
        Platform::MacOs => Some(MACOS_DEVICE_PATH.to_owned()),
        Platform::Other(os) => {
            debug!("No serial port discovery for platform {:?}", os);
            None
        }
    }
}

/// Prefers an enumerated device under `sys_class_tty`, and only calls `fallback` without one
fn resolve_linux_port<F>(sys_class_tty: &Path, fallback: F) -> Option<String>
where
    F: FnOnce() -> Option<String>,
{
    enumerate_acm_port(sys_class_tty).or_else(fallback)
}

fn enumerate_acm_port(sys_class_tty: &Path) -> Option<String> {
    let entries = match fs::read_dir(sys_class_tty) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("Could not list {}: {}", sys_class_tty.display(), err);
            return None;
        }
    };
    let names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();

    trace!("Enumerated tty devices: {:?}", names);

    last_acm_port(names.iter().map(String::as_str)).map(|name| format!("/dev/{}", name))
}

/// Picks the ACM device with the highest index, i.e. the one attached last
fn last_acm_port<'a, I: IntoIterator<Item = &'a str>>(names: I) -> Option<&'a str> {
    names
        .into_iter()
        .filter_map(|name| {
            let index: u32 = name.strip_prefix(LINUX_DEVICE_PATTERN)?.parse().ok()?;

            Some((index, name))
        })
        .max_by_key(|(index, _)| *index)
        .map(|(_, name)| name)
}

fn scrape_dmesg() -> Option<String> {
    debug!("Falling back to scanning dmesg for a {} device", LINUX_DEVICE_PATTERN);

    let output = match Command::new("dmesg").output() {
        Ok(output) => output,
        Err(err) => {
            warn!("Could not run dmesg: {}", err);
            return None;
        }
    };

    if !output.status.success() {
        warn!("dmesg exited with {}", output.status);
    }

    port_from_dmesg(&String::from_utf8_lossy(&output.stdout))
}

/// Derives a device path from the last kernel log line that mentions a `ttyACM` device.
///
/// Attach messages look like `[  12.345678] cdc_acm 1-1:1.0: ttyACM0: USB ACM device`; the
/// device name is the third `:`-delimited field.
pub fn port_from_dmesg(log: &str) -> Option<String> {
    let line = log
        .lines()
        .filter(|line| line.contains(LINUX_DEVICE_PATTERN))
        .last()?;
    let device = line.split(':').nth(2)?.trim();

    if device.is_empty() {
        return None;
    }

    Some(format!("/dev/{}", device))
}
