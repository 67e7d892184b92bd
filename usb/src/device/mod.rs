use crate::device::base::{CameraDevice, ConnectOptions};
use anyhow::Result;

pub mod base;
pub mod mock;

// libusb is used on every platform, under Windows the camera needs the WinUSB driver bound.
mod libusb;
pub use crate::device::libusb::device::UvcCamera;

pub fn find_devices() -> Vec<CameraDevice> {
    libusb::device::find_devices()
}

pub fn from_device(device: CameraDevice, options: ConnectOptions) -> Result<UvcCamera> {
    UvcCamera::from_device(device, options)
}
