pub use rusb;
pub use uvc_thermal_types as types;

pub mod commands;
pub mod decode;
pub mod descriptor;
pub mod error;
pub mod guid;
pub mod report;
pub mod thermal;

mod device;

pub use device::base::{CameraDevice, ConnectOptions, ControlTransport, UsbData};
pub use device::mock;
pub use device::{find_devices, from_device, UvcCamera};
