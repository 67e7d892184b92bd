use clap::{Args, Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use uvc_thermal_usb::guid::{Guid, THERMAL_GUID};

#[derive(Parser, Debug)]
#[clap(about, version, author)]
pub struct Cli {
    /// Minimum log level to print out
    #[clap(long, value_enum, default_value = "info")]
    pub log_level: LevelFilter,

    /// Location of the configuration file on disk
    #[clap(long, default_value_os_t = default_config_location())]
    pub config: PathBuf,

    /// USB bus of the camera to use
    #[clap(long, requires = "address")]
    pub bus: Option<u8>,

    /// USB address of the camera to use
    #[clap(long, requires = "bus")]
    pub address: Option<u8>,

    /// Only use cameras with this Vendor ID (hex)
    #[clap(long, value_parser = parse_hex_u16)]
    pub vid: Option<u16>,

    /// Only use cameras with this Product ID (hex)
    #[clap(long, value_parser = parse_hex_u16)]
    pub pid: Option<u16>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List attached UVC cameras and their extension units
    List,

    /// Parse a raw configuration descriptor dump, no camera needed
    Parse {
        /// File holding the descriptor bytes
        file: PathBuf,

        /// GUID to mark as the target
        #[clap(long, default_value_t = THERMAL_GUID)]
        guid: Guid,
    },

    /// Enumerate extension units, find the thermal unit and try its selectors
    Report {
        /// GUID of the thermal extension unit
        #[clap(long, default_value_t = THERMAL_GUID)]
        guid: Guid,

        /// Scan the vendor range when no unit carries the GUID
        #[clap(long)]
        fallback: bool,
    },

    /// Read every unit and selector in range, printing the results as JSON
    Scan {
        #[clap(flatten)]
        range: RangeArgs,
    },

    /// Read the temperature at a single unit and selector, -1.0 if there's no valid reading
    Read {
        #[clap(long)]
        unit: u8,

        #[clap(long)]
        selector: u8,
    },

    /// Find the first plausible temperature, starting from the thermal unit if there is one
    Locate {
        /// GUID of the thermal extension unit
        #[clap(long, default_value_t = THERMAL_GUID)]
        guid: Guid,

        #[clap(flatten)]
        range: RangeArgs,
    },

    /// Check whether the camera looks like it has a thermal unit
    Present,

    /// Ask each unit ID for GET_INFO, printing the units that answer as JSON
    Probe {
        /// Unit IDs to ask, as first-last
        #[clap(long, value_parser = parse_range, default_value = "1-10")]
        units: RangeInclusive<u8>,
    },
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Unit IDs to probe, as first-last
    #[clap(long, value_parser = parse_range, default_value = "3-6")]
    pub units: RangeInclusive<u8>,

    /// Selectors to probe on each unit, as first-last
    #[clap(long, value_parser = parse_range, default_value = "1-10")]
    pub selectors: RangeInclusive<u8>,
}

fn default_config_location() -> PathBuf {
    match ProjectDirs::from("org", "ScopeCam", "UVC-Thermal") {
        Some(proj_dirs) => proj_dirs.config_dir().join("settings.json"),
        None => PathBuf::from("uvc-thermal.json"),
    }
}

pub(crate) fn parse_hex_u16(value: &str) -> Result<u16, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u16::from_str_radix(digits, 16).map_err(|e| format!("Invalid hex value '{}': {}", value, e))
}

pub(crate) fn parse_range(value: &str) -> Result<RangeInclusive<u8>, String> {
    let (start, end) = match value.split_once('-') {
        Some((start, end)) => (start, end),
        None => (value, value),
    };

    let start: u8 = start
        .trim()
        .parse()
        .map_err(|e| format!("Invalid range start '{}': {}", start, e))?;
    let end: u8 = end
        .trim()
        .parse()
        .map_err(|e| format!("Invalid range end '{}': {}", end, e))?;

    if start > end {
        return Err(format!("Range {} ends before it starts", value));
    }
    Ok(start..=end)
}

#[repr(usize)]
#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum LevelFilter {
    /// A level lower than all log levels.
    Off,
    /// Corresponds to the `Error` log level.
    Error,
    /// Corresponds to the `Warn` log level.
    Warn,
    /// Corresponds to the `Info` log level.
    Info,
    /// Corresponds to the `Debug` log level.
    Debug,
    /// Corresponds to the `Trace` log level.
    Trace,
}

impl From<LevelFilter> for log::LevelFilter {
    fn from(level: LevelFilter) -> Self {
        match level {
            LevelFilter::Off => log::LevelFilter::Off,
            LevelFilter::Error => log::LevelFilter::Error,
            LevelFilter::Warn => log::LevelFilter::Warn,
            LevelFilter::Info => log::LevelFilter::Info,
            LevelFilter::Debug => log::LevelFilter::Debug,
            LevelFilter::Trace => log::LevelFilter::Trace,
        }
    }
}
