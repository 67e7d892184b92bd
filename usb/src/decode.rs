//! Turning two control bytes into a temperature.
//!
//! The vendor never documented the format, the bands below are what has been seen on real
//! hardware. `DecodePolicy` produces displayed readings, `PresenceCheck` only answers whether a
//! thermal unit is there at all. They disagree on purpose and must not be swapped for each other.

use log::{debug, warn};
use uvc_thermal_types::TemperatureScale;

pub fn raw_value(data: [u8; 2]) -> i16 {
    i16::from_le_bytes(data)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodePolicy {
    /// Exclusive bounds for tenths of a degree.
    pub deci_min: i16,
    pub deci_max: i16,

    /// Exclusive bounds for hundredths of a degree.
    pub centi_min: i16,
    pub centi_max: i16,
}

impl Default for DecodePolicy {
    fn default() -> Self {
        Self {
            deci_min: 0,
            deci_max: 1000,
            centi_min: 2000,
            centi_max: 4000,
        }
    }
}

impl DecodePolicy {
    pub fn scale_for(&self, raw: i16) -> Option<TemperatureScale> {
        if raw > self.deci_min && raw < self.deci_max {
            Some(TemperatureScale::DeciCelsius)
        } else if raw > self.centi_min && raw < self.centi_max {
            Some(TemperatureScale::CentiCelsius)
        } else {
            None
        }
    }

    pub fn decode(&self, data: [u8; 2]) -> Option<(f32, TemperatureScale)> {
        let raw = raw_value(data);
        match self.scale_for(raw) {
            Some(scale) => {
                let celsius = f32::from(raw) / scale.divisor();
                debug!("Decoded {} as {:.1}°C ({})", raw, celsius, scale);
                Some((celsius, scale))
            }
            None => {
                warn!("Unexpected temperature value: {}", raw);
                None
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PresenceCheck {
    /// Inclusive bounds in tenths of a degree, -40°C to 120°C by default.
    pub min: i16,
    pub max: i16,
}

impl Default for PresenceCheck {
    fn default() -> Self {
        Self {
            min: -400,
            max: 1200,
        }
    }
}

impl PresenceCheck {
    pub fn accepts(&self, data: [u8; 2]) -> bool {
        (self.min..=self.max).contains(&raw_value(data))
    }
}
