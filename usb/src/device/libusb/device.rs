use crate::commands::{control_index, control_value, UvcRequest};
use crate::device::base::{CameraDevice, ConnectOptions, ControlTransport, UsbData};
use crate::error::{ConnectError, ControlError};
use crate::thermal::ThermalCommands;
use anyhow::{bail, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info, trace, warn};
use rusb::{
    ConfigDescriptor, Device, DeviceDescriptor, DeviceHandle, Direction, GlobalContext, Language,
    Recipient, RequestType,
};
use std::time::Duration;

const CLASS_VIDEO: u8 = 0x0e;
const SUBCLASS_VIDEO_CONTROL: u8 = 0x01;

const REQUEST_GET_DESCRIPTOR: u8 = 0x06;
const DESCRIPTOR_TYPE_CONFIGURATION: u8 = 0x02;
const CONFIGURATION_HEADER_LENGTH: usize = 9;

pub struct UvcCamera {
    handle: DeviceHandle<GlobalContext>,
    device: Device<GlobalContext>,
    descriptor: DeviceDescriptor,

    vc_interface: u8,
    claimed: bool,

    language: Option<Language>,
    timeout: Duration,
}

impl UvcCamera {
    fn find_device(device: &CameraDevice) -> Result<(Device<GlobalContext>, DeviceDescriptor)> {
        if let Ok(devices) = rusb::devices() {
            for usb_device in devices.iter() {
                if usb_device.bus_number() == device.bus_number
                    && usb_device.address() == device.address
                {
                    if let Ok(descriptor) = usb_device.device_descriptor() {
                        return Ok((usb_device, descriptor));
                    }
                }
            }
        }
        bail!(ConnectError::DeviceNotFound)
    }

    pub fn from_device(device: CameraDevice, options: ConnectOptions) -> Result<Self> {
        let (usb_device, descriptor) = UvcCamera::find_device(&device)?;
        let mut handle = usb_device.open().map_err(ConnectError::from)?;
        info!("Connected to possible UVC camera at {:?}", usb_device);

        // Not every camera has string descriptors, that's only a problem for diagnostics.
        let language = handle
            .read_languages(options.timeout)
            .ok()
            .and_then(|languages| languages.first().copied());

        // Class requests to the interface need it claimed, usbfs won't do it for us while
        // uvcvideo holds it.
        if options.detach_kernel_driver {
            handle.set_auto_detach_kernel_driver(true)?;
        }

        let claimed = match handle.claim_interface(device.vc_interface) {
            Ok(()) => {
                debug!("Claimed Video Control interface {}", device.vc_interface);
                true
            }
            Err(error) => {
                warn!(
                    "{} ({}), control reads will likely fail",
                    ConnectError::DeviceNotClaimed(device.vc_interface),
                    error
                );
                false
            }
        };

        Ok(Self {
            handle,
            device: usb_device,
            descriptor,
            vc_interface: device.vc_interface,
            claimed,
            language,
            timeout: options.timeout,
        })
    }

    // Maps bConfigurationValue back onto the index GET_DESCRIPTOR wants.
    fn active_configuration_index(&self) -> Result<u8> {
        let active = self.handle.active_configuration()?;
        for index in 0..self.descriptor.num_configurations() {
            if let Ok(config) = self.device.config_descriptor(index) {
                if config.number() == active {
                    return Ok(index);
                }
            }
        }
        bail!("Active configuration {} has no descriptor", active)
    }

    fn read_configuration(&self, index: u8, length: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; length];
        let response_length = self.handle.read_control(
            rusb::request_type(Direction::In, RequestType::Standard, Recipient::Device),
            REQUEST_GET_DESCRIPTOR,
            (u16::from(DESCRIPTOR_TYPE_CONFIGURATION) << 8) | u16::from(index),
            0,
            &mut buf,
            self.timeout,
        )?;
        buf.truncate(response_length);
        Ok(buf)
    }
}

impl ControlTransport for UvcCamera {
    fn perform_control(
        &mut self,
        unit_id: u8,
        selector: u8,
        request: UvcRequest,
        length: usize,
    ) -> Result<Vec<u8>, ControlError> {
        trace!("{} unit {}, selector {}, {} bytes", request, unit_id, selector, length);

        let mut buf = vec![0; length];
        let response_length = self.handle.read_control(
            rusb::request_type(Direction::In, RequestType::Class, Recipient::Interface),
            request.code(),
            control_value(selector),
            control_index(unit_id, self.vc_interface),
            &mut buf,
            self.timeout,
        )?;
        buf.truncate(response_length);
        Ok(buf)
    }

    fn configuration_descriptor(&mut self) -> Result<Vec<u8>> {
        let index = self.active_configuration_index()?;

        let header = self.read_configuration(index, CONFIGURATION_HEADER_LENGTH)?;
        if header.len() < CONFIGURATION_HEADER_LENGTH {
            bail!(
                "Invalid Configuration Header, Expected: {}, Received: {}",
                CONFIGURATION_HEADER_LENGTH,
                header.len()
            );
        }

        let total_length = usize::from(LittleEndian::read_u16(&header[2..4]));
        debug!("Configuration {} is {} bytes", index, total_length);

        // A short read here is handed on as is, the parser copes with truncation.
        self.read_configuration(index, total_length)
    }

    fn get_descriptor(&self) -> Result<UsbData> {
        let version = self.descriptor.device_version();
        let device_version = (version.0, version.1, version.2);

        let (device_manufacturer, product_name) = match self.language {
            Some(language) => (
                self.handle
                    .read_manufacturer_string(
                        language,
                        &self.descriptor,
                        Duration::from_millis(100),
                    )
                    .unwrap_or_default(),
                self.handle
                    .read_product_string(language, &self.descriptor, Duration::from_millis(100))
                    .unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };

        Ok(UsbData {
            vendor_id: self.descriptor.vendor_id(),
            product_id: self.descriptor.product_id(),
            device_version,
            device_manufacturer,
            product_name,
        })
    }
}

impl ThermalCommands for UvcCamera {}

impl Drop for UvcCamera {
    fn drop(&mut self) {
        // Releasing hands the interface back to the kernel driver when it was auto-detached.
        if self.claimed {
            if let Err(error) = self.handle.release_interface(self.vc_interface) {
                debug!("Unable to release interface {}: {}", self.vc_interface, error);
            }
        }
    }
}

fn video_control_interface(config: &ConfigDescriptor) -> Option<u8> {
    config
        .interfaces()
        .flat_map(|interface| interface.descriptors())
        .find(|descriptor| {
            descriptor.class_code() == CLASS_VIDEO
                && descriptor.sub_class_code() == SUBCLASS_VIDEO_CONTROL
        })
        .map(|descriptor| descriptor.interface_number())
}

pub fn find_devices() -> Vec<CameraDevice> {
    let mut found_devices: Vec<CameraDevice> = Vec::new();

    if let Ok(devices) = rusb::devices() {
        for device in devices.iter() {
            let Ok(descriptor) = device.device_descriptor() else {
                continue;
            };

            let config = match device.active_config_descriptor() {
                Ok(config) => config,
                Err(_) => match device.config_descriptor(0) {
                    Ok(config) => config,
                    Err(error) => {
                        debug!("No configuration for {:?}: {}", device, error);
                        continue;
                    }
                },
            };

            if let Some(vc_interface) = video_control_interface(&config) {
                debug!(
                    "Found UVC camera {:04x}:{:04x} at {:03}:{:03}",
                    descriptor.vendor_id(),
                    descriptor.product_id(),
                    device.bus_number(),
                    device.address()
                );
                found_devices.push(CameraDevice {
                    bus_number: device.bus_number(),
                    address: device.address(),
                    vendor_id: descriptor.vendor_id(),
                    product_id: descriptor.product_id(),
                    vc_interface,
                });
            }
        }
    }

    found_devices
}
