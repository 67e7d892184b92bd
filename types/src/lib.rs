#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use strum::Display;

/// Returned by the single read operations when no plausible value was found. A real reading
/// can never decode to this, -1.0°C would be a raw value of -10, outside every accepted band.
pub const NO_READING: f32 = -1.0;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TemperatureScale {
    /// Tenths of a degree, 253 -> 25.3°C
    DeciCelsius,

    /// Hundredths of a degree, 2530 -> 25.3°C
    CentiCelsius,
}

impl TemperatureScale {
    pub fn divisor(&self) -> f32 {
        match self {
            TemperatureScale::DeciCelsius => 10.0,
            TemperatureScale::CentiCelsius => 100.0,
        }
    }
}

// Created per probe, handed straight back to the caller.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThermalReading {
    pub unit_id: u8,
    pub selector: u8,
    pub raw: [u8; 2],
    pub celsius: f32,
    pub scale: TemperatureScale,
}

impl ThermalReading {
    pub fn raw_value(&self) -> i16 {
        i16::from_le_bytes(self.raw)
    }
}

impl std::fmt::Display for ThermalReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.1}°C (unit {}, selector {}, raw {}, {})",
            self.celsius,
            self.unit_id,
            self.selector,
            self.raw_value(),
            self.scale
        )
    }
}

// JSON payloads. The field names and nesting here are consumed by existing tooling, so they
// have to stay as they are.

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanPayload {
    pub scan_result: ScanResult,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanResult {
    pub units: Vec<UnitScan>,
    pub total_reads: u32,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitScan {
    pub unit_id: u8,
    pub selectors: Vec<SelectorRead>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectorRead {
    pub selector: u8,
    pub hex: String,
    pub int16_le: i16,
    #[cfg_attr(feature = "serde", serde(rename = "deciC"))]
    pub deci_c: i16,
    pub celsius: f64,
}

impl SelectorRead {
    pub fn from_raw(selector: u8, raw: [u8; 2]) -> Self {
        let value = i16::from_le_bytes(raw);
        Self {
            selector,
            hex: format!("{:02x}{:02x}", raw[0], raw[1]),
            int16_le: value,
            deci_c: value,
            celsius: f64::from(value) / 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbePayload {
    pub extension_units: Vec<ProbedUnit>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbedUnit {
    pub unit_id: u8,
    pub info: String,
}

impl ProbedUnit {
    pub fn new(unit_id: u8, info: u8) -> Self {
        Self {
            unit_id,
            info: format!("0x{:02x}", info),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ErrorPayload {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_read_from_raw() {
        let read = SelectorRead::from_raw(2, [0xfd, 0x00]);
        assert_eq!(read.hex, "fd00");
        assert_eq!(read.int16_le, 253);
        assert_eq!(read.deci_c, 253);
        assert_eq!(read.celsius, 25.3);
    }

    #[test]
    fn selector_read_negative() {
        let read = SelectorRead::from_raw(1, [0xf6, 0xff]);
        assert_eq!(read.hex, "f6ff");
        assert_eq!(read.int16_le, -10);
        assert_eq!(read.celsius, -1.0);
    }

    #[test]
    fn probed_unit_info_is_hex() {
        assert_eq!(ProbedUnit::new(4, 0x03).info, "0x03");
        assert_eq!(ProbedUnit::new(4, 0xff).info, "0xff");
    }

    #[test]
    fn reading_display() {
        let reading = ThermalReading {
            unit_id: 4,
            selector: 2,
            raw: [0xfd, 0x00],
            celsius: 25.3,
            scale: TemperatureScale::DeciCelsius,
        };
        assert_eq!(reading.raw_value(), 253);
        assert_eq!(
            reading.to_string(),
            "25.3°C (unit 4, selector 2, raw 253, DeciCelsius)"
        );
    }
}
