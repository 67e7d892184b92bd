//! The thermal read protocol.
//!
//! Every probe is one blocking GET_CUR on the device. A failed probe is normal (most unit and
//! selector pairs simply don't exist) so failures are logged and skipped, never propagated.
//! Probing is strictly sequential, control endpoints don't take concurrent requests.

use crate::commands::UvcRequest;
use crate::decode::{DecodePolicy, PresenceCheck};
use crate::descriptor::ExtensionUnit;
use crate::device::base::ControlTransport;
use crate::guid::Guid;
use log::{debug, info};
use std::ops::RangeInclusive;
use uvc_thermal_types::{
    ProbedUnit, ScanResult, SelectorRead, ThermalReading, UnitScan, NO_READING,
};

const READING_LENGTH: usize = 2;

/// Selector 1 is used for the GET_INFO unit probe.
pub const INFO_SELECTOR: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeRange {
    pub units: RangeInclusive<u8>,
    pub selectors: RangeInclusive<u8>,
}

impl ProbeRange {
    pub fn new(units: RangeInclusive<u8>, selectors: RangeInclusive<u8>) -> Self {
        Self { units, selectors }
    }

    /// Where this vendor tends to put the thermal control.
    pub fn vendor() -> Self {
        Self::new(3..=6, 1..=10)
    }

    pub fn wide() -> Self {
        Self::new(1..=10, 1..=16)
    }

    /// The presence check only looks at the first selector of each vendor unit.
    pub fn presence() -> Self {
        Self::new(3..=6, 1..=1)
    }

    /// Every selector of a single known unit.
    pub fn unit(unit_id: u8) -> Self {
        Self::new(unit_id..=unit_id, 1..=16)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.units
            .clone()
            .flat_map(move |unit_id| self.selectors.clone().map(move |selector| (unit_id, selector)))
    }
}

impl Default for ProbeRange {
    fn default() -> Self {
        Self::vendor()
    }
}

/// The first unit carrying `target`, compared on the raw bytes.
pub fn find_unit<'a>(units: &'a [ExtensionUnit], target: &Guid) -> Option<&'a ExtensionUnit> {
    units.iter().find(|unit| unit.is(target))
}

pub trait ThermalCommands: ControlTransport {
    fn read_control(&mut self, unit_id: u8, selector: u8) -> Option<[u8; 2]> {
        let data = match self.get_control(unit_id, selector, UvcRequest::GetCur, READING_LENGTH) {
            Ok(data) => data,
            Err(error) => {
                debug!("Unit {}, Selector {}: {}", unit_id, selector, error);
                return None;
            }
        };

        let Some(raw) = data
            .get(..READING_LENGTH)
            .and_then(|bytes| <[u8; READING_LENGTH]>::try_from(bytes).ok())
        else {
            debug!("Unit {}, Selector {}: only {} bytes", unit_id, selector, data.len());
            return None;
        };
        debug!(
            "Unit {}, Selector {}: {:02x}{:02x}",
            unit_id, selector, raw[0], raw[1]
        );
        Some(raw)
    }

    fn read_temperature(
        &mut self,
        unit_id: u8,
        selector: u8,
        policy: &DecodePolicy,
    ) -> Option<ThermalReading> {
        let raw = self.read_control(unit_id, selector)?;
        let (celsius, scale) = policy.decode(raw)?;

        let reading = ThermalReading {
            unit_id,
            selector,
            raw,
            celsius,
            scale,
        };
        info!("Read temperature: {}", reading);
        Some(reading)
    }

    /// As `read_temperature`, with `NO_READING` standing in for nothing.
    fn read_temperature_or_sentinel(
        &mut self,
        unit_id: u8,
        selector: u8,
        policy: &DecodePolicy,
    ) -> f32 {
        self.read_temperature(unit_id, selector, policy)
            .map(|reading| reading.celsius)
            .unwrap_or(NO_READING)
    }

    fn is_thermal_unit_present(&mut self, range: &ProbeRange, check: &PresenceCheck) -> bool {
        for (unit_id, selector) in range.pairs() {
            if let Some(raw) = self.read_control(unit_id, selector) {
                if check.accepts(raw) {
                    info!(
                        "Found plausible thermal data at unit {}: {} deciC",
                        unit_id,
                        i16::from_le_bytes(raw)
                    );
                    return true;
                }
            }
        }
        false
    }

    /// Walks the range in order and stops at the first plausible reading.
    fn find_temperature(
        &mut self,
        range: &ProbeRange,
        policy: &DecodePolicy,
    ) -> Option<ThermalReading> {
        range
            .pairs()
            .find_map(|(unit_id, selector)| self.read_temperature(unit_id, selector, policy))
    }

    /// Tries every selector of the unit carrying `target`, or the fallback range if no unit does.
    fn locate_temperature(
        &mut self,
        units: &[ExtensionUnit],
        target: &Guid,
        fallback: &ProbeRange,
        policy: &DecodePolicy,
    ) -> Option<ThermalReading> {
        match find_unit(units, target) {
            Some(unit) => {
                info!("Using matched extension unit {}", unit.unit_id);
                self.find_temperature(&ProbeRange::unit(unit.unit_id), policy)
            }
            None => {
                info!("No unit matches {}, scanning heuristically", target);
                self.find_temperature(fallback, policy)
            }
        }
    }

    /// Reads every pair in the range, reporting everything that answered. Nothing is decoded
    /// beyond the plain tenths interpretation, this is for discovery.
    fn scan(&mut self, range: &ProbeRange) -> ScanResult {
        let mut units = Vec::new();
        let mut total_reads = 0;

        for unit_id in range.units.clone() {
            let mut selectors = Vec::new();
            for selector in range.selectors.clone() {
                if let Some(raw) = self.read_control(unit_id, selector) {
                    let read = SelectorRead::from_raw(selector, raw);
                    info!(
                        "Unit {}, Selector {}: 0x{} = {} deciC = {:.1}°C",
                        unit_id, selector, read.hex, read.deci_c, read.celsius
                    );
                    selectors.push(read);
                    total_reads += 1;
                }
            }

            if !selectors.is_empty() {
                units.push(UnitScan { unit_id, selectors });
            }
        }

        info!("Thermal scan complete. Total successful reads: {}", total_reads);
        ScanResult {
            units,
            total_reads,
            status: String::from("success"),
        }
    }

    /// Asks each unit for GET_INFO on the first selector, anything that answers exists.
    fn probe_extension_units(&mut self, units: RangeInclusive<u8>) -> Vec<ProbedUnit> {
        let mut found = Vec::new();
        for unit_id in units {
            match self.get_control(unit_id, INFO_SELECTOR, UvcRequest::GetInfo, 1) {
                Ok(info) => match info.first() {
                    Some(&capabilities) => {
                        info!("Found extension unit at ID {}", unit_id);
                        found.push(ProbedUnit::new(unit_id, capabilities));
                    }
                    None => debug!("Unit {} answered GET_INFO with no data", unit_id),
                },
                Err(error) => debug!("No answer from unit {}: {}", unit_id, error),
            }
        }
        found
    }
}
