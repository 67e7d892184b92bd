#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("No UVC camera was found")]
    DeviceNotFound,

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),

    #[error(
        "Unable to Claim Interface {0}, set detach_kernel_driver to take it from the kernel driver"
    )]
    DeviceNotClaimed(u8),
}

#[derive(thiserror::Error, Debug)]
pub enum ControlError {
    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),

    #[error("Short response from control, Expected: {expected}, Received: {received}")]
    ShortRead { expected: usize, received: usize },

    #[error("Control reads need a non-empty buffer")]
    InvalidLength,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_failure_points_at_detach() {
        let message = ConnectError::DeviceNotClaimed(0).to_string();
        assert!(message.contains("Interface 0"));
        assert!(message.contains("detach_kernel_driver"));
    }
}
