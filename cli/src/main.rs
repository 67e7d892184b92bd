use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use serde::Serialize;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use std::path::Path;
use uvc_thermal_types::{ErrorPayload, ProbePayload, ScanPayload};
use uvc_thermal_usb::descriptor::parse_extension_units;
use uvc_thermal_usb::error::ConnectError;
use uvc_thermal_usb::guid::{Guid, THERMAL_GUID};
use uvc_thermal_usb::report::enumerate;
use uvc_thermal_usb::thermal::{ProbeRange, ThermalCommands};
use uvc_thermal_usb::{find_devices, from_device, CameraDevice, ControlTransport, UvcCamera};

use crate::cli::{Cli, Commands};
use crate::settings::Settings;

mod cli;
mod settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Logs go to stderr, stdout is kept for results (some of which are JSON).
    CombinedLogger::init(vec![TermLogger::new(
        args.log_level.into(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )])
    .context("Could not configure the logger")?;

    info!("UVC Thermal v{}", VERSION);
    let settings = Settings::read(&args.config)?;

    match &args.command {
        Commands::List => list_cameras(&settings),
        Commands::Parse { file, guid } => parse_file(file, guid),
        Commands::Report { guid, fallback } => {
            let mut camera = open_camera(&args, &settings)?;
            let descriptors = camera.configuration_descriptor()?;
            let fallback = (*fallback).then(ProbeRange::vendor);
            let report = enumerate(
                &mut camera,
                &descriptors,
                guid,
                fallback.as_ref(),
                &settings.decode_policy(),
            );
            println!("{}", report);
            Ok(())
        }
        Commands::Scan { range } => {
            let mut camera = match open_camera(&args, &settings) {
                Ok(camera) => camera,
                Err(error) => exit_with_error(error),
            };
            let range = ProbeRange::new(range.units.clone(), range.selectors.clone());
            print_json(&ScanPayload {
                scan_result: camera.scan(&range),
            })
        }
        Commands::Read { unit, selector } => {
            let mut camera = open_camera(&args, &settings)?;
            let celsius =
                camera.read_temperature_or_sentinel(*unit, *selector, &settings.decode_policy());
            println!("{:.1}", celsius);
            Ok(())
        }
        Commands::Locate { guid, range } => {
            let mut camera = open_camera(&args, &settings)?;
            let descriptors = camera.configuration_descriptor()?;
            let units = parse_extension_units(&descriptors);
            let fallback = ProbeRange::new(range.units.clone(), range.selectors.clone());

            match camera.locate_temperature(&units, guid, &fallback, &settings.decode_policy()) {
                Some(reading) => println!("{}", reading),
                None => {
                    warn!("No plausible temperature found");
                    println!("No valid temperature found");
                }
            }
            Ok(())
        }
        Commands::Present => {
            let mut camera = open_camera(&args, &settings)?;
            let present =
                camera.is_thermal_unit_present(&ProbeRange::presence(), &settings.presence_check());
            println!("{}", present);
            Ok(())
        }
        Commands::Probe { units } => {
            let mut camera = match open_camera(&args, &settings) {
                Ok(camera) => camera,
                Err(error) => exit_with_error(error),
            };
            print_json(&ProbePayload {
                extension_units: camera.probe_extension_units(units.clone()),
            })
        }
    }
}

fn print_json<T: Serialize>(payload: &T) -> Result<()> {
    println!("{}", serde_json::to_string(payload)?);
    Ok(())
}

// The JSON commands report failure in-band, so callers parsing stdout always get an object.
fn exit_with_error(error: anyhow::Error) -> ! {
    error!("{:#}", error);
    let payload = ErrorPayload {
        error: format!("{:#}", error),
    };
    if let Ok(json) = serde_json::to_string(&payload) {
        println!("{}", json);
    }
    std::process::exit(1);
}

fn select_camera(args: &Cli, settings: &Settings) -> Result<CameraDevice> {
    let vendor_id = args.vid.or(settings.vendor_id);
    let product_id = args.pid.or(settings.product_id);

    let camera = find_devices().into_iter().find(|device| {
        if let (Some(bus), Some(address)) = (args.bus, args.address) {
            if device.bus_number() != bus || device.address() != address {
                return false;
            }
        }
        vendor_id.map_or(true, |id| device.vendor_id() == id)
            && product_id.map_or(true, |id| device.product_id() == id)
    });

    camera.ok_or_else(|| ConnectError::DeviceNotFound.into())
}

fn open_camera(args: &Cli, settings: &Settings) -> Result<UvcCamera> {
    let device = select_camera(args, settings)?;
    info!(
        "Using camera {:04x}:{:04x} at {:03}:{:03}",
        device.vendor_id(),
        device.product_id(),
        device.bus_number(),
        device.address()
    );
    from_device(device, settings.connect_options())
}

fn list_cameras(settings: &Settings) -> Result<()> {
    let devices = find_devices();
    if devices.is_empty() {
        println!("No UVC cameras found");
        return Ok(());
    }

    for device in devices {
        println!(
            "Bus {:03} Device {:03}: ID {:04x}:{:04x}",
            device.bus_number(),
            device.address(),
            device.vendor_id(),
            device.product_id()
        );

        let mut camera = match from_device(device, settings.connect_options()) {
            Ok(camera) => camera,
            Err(error) => {
                println!("  Unable to open: {:#}", error);
                continue;
            }
        };

        if let Ok(usb_data) = camera.get_descriptor() {
            if !usb_data.product_name().is_empty() {
                println!(
                    "  {} {}",
                    usb_data.device_manufacturer(),
                    usb_data.product_name()
                );
            }
        }

        match camera.configuration_descriptor() {
            Ok(descriptors) => print_units(&descriptors, &THERMAL_GUID),
            Err(error) => println!("  Unable to read descriptors: {:#}", error),
        }
    }
    Ok(())
}

fn parse_file(file: &Path, guid: &Guid) -> Result<()> {
    let descriptors = std::fs::read(file)
        .with_context(|| format!("Could not read descriptors from {}", file.to_string_lossy()))?;
    print_units(&descriptors, guid);
    Ok(())
}

fn print_units(descriptors: &[u8], target: &Guid) {
    let units = parse_extension_units(descriptors);
    if units.is_empty() {
        println!("  No extension units");
    }

    for unit in units {
        let bitmap = match &unit.control_bitmap {
            Some(bitmap) => bitmap
                .iter()
                .map(|byte| format!("{:02x}", byte))
                .collect::<String>(),
            None => String::from("absent"),
        };
        println!(
            "  Unit {:>3}: {} Controls: {} Bitmap: {} Selectors: {}{}",
            unit.unit_id,
            unit.guid,
            unit.num_controls,
            bitmap,
            unit.supported_selectors_text(),
            if unit.is(target) { " (thermal)" } else { "" }
        );
    }
}
