//! In-memory camera for tests and offline runs.
//!
//! Always compiled, hidden from public docs.
#![doc(hidden)]

use crate::commands::UvcRequest;
use crate::device::base::{ControlTransport, UsbData};
use crate::error::ControlError;
use crate::thermal::ThermalCommands;
use anyhow::Result;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct MockCamera {
    /// Returned from `configuration_descriptor`.
    pub descriptors: Vec<u8>,

    /// Canned responses per (unit, selector, request). Anything else stalls.
    pub responses: HashMap<(u8, u8, UvcRequest), Vec<u8>>,

    /// Every control request that reached the "device", in order.
    pub calls: Vec<(u8, u8, UvcRequest)>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_descriptors(descriptors: Vec<u8>) -> Self {
        Self {
            descriptors,
            ..Self::default()
        }
    }

    pub fn set_response(&mut self, unit_id: u8, selector: u8, request: UvcRequest, data: &[u8]) {
        self.responses
            .insert((unit_id, selector, request), data.to_vec());
    }

    /// Registers a GET_CUR answer holding `raw` as a little-endian i16.
    pub fn set_reading(&mut self, unit_id: u8, selector: u8, raw: i16) {
        self.set_response(unit_id, selector, UvcRequest::GetCur, &raw.to_le_bytes());
    }

    pub fn reads(&self) -> usize {
        self.calls.len()
    }
}

impl ControlTransport for MockCamera {
    fn perform_control(
        &mut self,
        unit_id: u8,
        selector: u8,
        request: UvcRequest,
        length: usize,
    ) -> Result<Vec<u8>, ControlError> {
        self.calls.push((unit_id, selector, request));
        match self.responses.get(&(unit_id, selector, request)) {
            Some(data) => Ok(data.iter().copied().take(length).collect()),
            None => Err(ControlError::UsbError(rusb::Error::Pipe)),
        }
    }

    fn configuration_descriptor(&mut self) -> Result<Vec<u8>> {
        Ok(self.descriptors.clone())
    }

    fn get_descriptor(&self) -> Result<UsbData> {
        Ok(UsbData {
            vendor_id: 0x0bda,
            product_id: 0x5830,
            device_version: (1, 0, 0),
            device_manufacturer: String::from("Mock"),
            product_name: String::from("Mock Thermal Camera"),
        })
    }
}

impl ThermalCommands for MockCamera {}
