use crate::decode::DecodePolicy;
use crate::descriptor::{parse_extension_units, ExtensionUnit};
use crate::guid::Guid;
use crate::thermal::{find_unit, ProbeRange, ThermalCommands};
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use uvc_thermal_types::ThermalReading;

#[derive(Clone, Debug, PartialEq)]
pub enum ProbeOutcome {
    /// The target wasn't found and no fallback scan was asked for.
    NotAttempted,
    Found(ThermalReading),
    NotFound,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumerationReport {
    pub units: Vec<ExtensionUnit>,
    pub target: Guid,

    /// Unit ID of the unit carrying the target GUID.
    pub matched: Option<u8>,

    /// What was probed, either the matched unit's selectors or the fallback range.
    pub probed: Option<ProbeRange>,
    pub outcome: ProbeOutcome,
}

impl EnumerationReport {
    pub fn reading(&self) -> Option<&ThermalReading> {
        match &self.outcome {
            ProbeOutcome::Found(reading) => Some(reading),
            _ => None,
        }
    }
}

/// Parses `descriptors`, looks for `target`, and probes for a temperature. Without a match only
/// a `fallback` range gets probed, if there is one.
pub fn enumerate<T: ThermalCommands + ?Sized>(
    device: &mut T,
    descriptors: &[u8],
    target: &Guid,
    fallback: Option<&ProbeRange>,
    policy: &DecodePolicy,
) -> EnumerationReport {
    let units = parse_extension_units(descriptors);
    let matched = find_unit(&units, target).map(|unit| unit.unit_id);

    let probed = match matched {
        Some(unit_id) => Some(ProbeRange::unit(unit_id)),
        None => fallback.cloned(),
    };

    let outcome = match &probed {
        Some(range) => match device.find_temperature(range, policy) {
            Some(reading) => ProbeOutcome::Found(reading),
            None => ProbeOutcome::NotFound,
        },
        None => ProbeOutcome::NotAttempted,
    };

    EnumerationReport {
        units,
        target: *target,
        matched,
        probed,
        outcome,
    }
}

fn range_text(range: &RangeInclusive<u8>) -> String {
    format!("{}-{}", range.start(), range.end())
}

impl Display for EnumerationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Extension Unit Enumeration Report")?;
        writeln!(f, "==================================")?;
        writeln!(f)?;
        writeln!(f, "Found {} extension unit(s)", self.units.len())?;
        writeln!(f)?;

        for unit in &self.units {
            writeln!(f, "Unit ID: {}", unit.unit_id)?;
            writeln!(f, "GUID: {}", unit.guid)?;
            writeln!(f, "Controls: {}", unit.num_controls)?;
            writeln!(f, "Supported Selectors: {}", unit.supported_selectors_text())?;
            if unit.is(&self.target) {
                writeln!(f, "*** MATCH: This is the thermal unit! ***")?;
            }
            writeln!(f)?;
        }

        match self.matched {
            Some(unit_id) => {
                writeln!(f, "Thermal Unit Found!")?;
                writeln!(f, "==================")?;
                writeln!(f, "Unit ID: {}", unit_id)?;
            }
            None => {
                writeln!(f, "WARNING: Target GUID not found!")?;
                writeln!(f, "Target: {}", self.target)?;
                writeln!(f)?;

                if self.units.is_empty() {
                    writeln!(f, "No extension units found in descriptors.")?;
                    writeln!(f, "Possible reasons:")?;
                    writeln!(f, "1. Camera doesn't expose extension units")?;
                    writeln!(f, "2. Descriptors not properly parsed")?;
                    writeln!(f, "3. Need to access different descriptor set")?;
                }
            }
        }

        if let Some(range) = &self.probed {
            writeln!(
                f,
                "Testing units {}, selectors {}...",
                range_text(&range.units),
                range_text(&range.selectors)
            )?;
            writeln!(f)?;

            match &self.outcome {
                ProbeOutcome::Found(reading) => writeln!(
                    f,
                    "✓ Unit {}, Selector {}: {:.1}°C ({})",
                    reading.unit_id, reading.selector, reading.celsius, reading.scale
                )?,
                _ => writeln!(
                    f,
                    "No valid temperature found in units {}, selectors {}",
                    range_text(&range.units),
                    range_text(&range.selectors)
                )?,
            }
        }

        writeln!(f)?;
        write!(f, "=== Enumeration Complete ===")
    }
}
