use crate::commands::UvcRequest;
use crate::error::ControlError;
use anyhow::Result;
use std::time::Duration;

// The one primitive everything else is built on. Implementations own whatever handle they talk
// through, callers only ever borrow them for a single request.
pub trait ControlTransport {
    fn get_control(
        &mut self,
        unit_id: u8,
        selector: u8,
        request: UvcRequest,
        length: usize,
    ) -> Result<Vec<u8>, ControlError> {
        // An empty buffer is a caller bug, don't bother the device with it.
        if length == 0 {
            return Err(ControlError::InvalidLength);
        }

        let response = self.perform_control(unit_id, selector, request, length)?;
        if response.len() < length {
            return Err(ControlError::ShortRead {
                expected: length,
                received: response.len(),
            });
        }
        Ok(response)
    }

    fn perform_control(
        &mut self,
        unit_id: u8,
        selector: u8,
        request: UvcRequest,
        length: usize,
    ) -> Result<Vec<u8>, ControlError>;

    /// The raw active configuration descriptor, every interface and class descriptor included.
    fn configuration_descriptor(&mut self) -> Result<Vec<u8>>;
    fn get_descriptor(&self) -> Result<UsbData>;
}

// We primarily need the bus number, and address for comparison..
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub(crate) bus_number: u8,
    pub(crate) address: u8,
    pub(crate) vendor_id: u16,
    pub(crate) product_id: u16,
    pub(crate) vc_interface: u8,
}

impl CameraDevice {
    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }
    pub fn address(&self) -> u8 {
        self.address
    }
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }
    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Interface number of the Video Control interface, the extension units hang off this.
    pub fn vc_interface(&self) -> u8 {
        self.vc_interface
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    pub timeout: Duration,

    /// Detach uvcvideo (or whatever holds the interface) before claiming it. This stops any
    /// running video stream. The interface is always claimed, without this the claim fails
    /// while a kernel driver is bound.
    pub detach_kernel_driver: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            detach_kernel_driver: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsbData {
    pub(crate) vendor_id: u16,
    pub(crate) product_id: u16,
    pub(crate) device_version: (u8, u8, u8),
    pub(crate) device_manufacturer: String,
    pub(crate) product_name: String,
}

impl UsbData {
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }
    pub fn product_id(&self) -> u16 {
        self.product_id
    }
    pub fn device_version(&self) -> (u8, u8, u8) {
        self.device_version
    }
    pub fn device_manufacturer(&self) -> String {
        self.device_manufacturer.clone()
    }
    pub fn product_name(&self) -> String {
        self.product_name.clone()
    }
}
