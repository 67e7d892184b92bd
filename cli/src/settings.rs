use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use uvc_thermal_usb::decode::{DecodePolicy, PresenceCheck};
use uvc_thermal_usb::ConnectOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub decode: DecodeSettings,
    pub presence: PresenceSettings,

    /// Timeout for every control transfer
    pub timeout_ms: u64,
    pub detach_kernel_driver: bool,

    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            decode: DecodeSettings::default(),
            presence: PresenceSettings::default(),
            timeout_ms: 1000,
            detach_kernel_driver: false,
            vendor_id: None,
            product_id: None,
        }
    }
}

// The readings bands are guesswork until checked against more hardware, so they're kept out
// here where they can be changed without a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeSettings {
    pub deci_min: i16,
    pub deci_max: i16,
    pub centi_min: i16,
    pub centi_max: i16,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        let policy = DecodePolicy::default();
        Self {
            deci_min: policy.deci_min,
            deci_max: policy.deci_max,
            centi_min: policy.centi_min,
            centi_max: policy.centi_max,
        }
    }
}

impl From<DecodeSettings> for DecodePolicy {
    fn from(settings: DecodeSettings) -> Self {
        DecodePolicy {
            deci_min: settings.deci_min,
            deci_max: settings.deci_max,
            centi_min: settings.centi_min,
            centi_max: settings.centi_max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceSettings {
    pub min: i16,
    pub max: i16,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        let check = PresenceCheck::default();
        Self {
            min: check.min,
            max: check.max,
        }
    }
}

impl From<PresenceSettings> for PresenceCheck {
    fn from(settings: PresenceSettings) -> Self {
        PresenceCheck {
            min: settings.min,
            max: settings.max,
        }
    }
}

impl Settings {
    pub fn read(path: &Path) -> Result<Settings> {
        match File::open(path) {
            Ok(reader) => serde_json::from_reader(reader).context(format!(
                "Could not parse settings file at {}",
                path.to_string_lossy()
            )),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Settings::default()),
            Err(error) => Err(error).context(format!(
                "Could not open settings file for reading at {}",
                path.to_string_lossy()
            )),
        }
    }

    pub fn decode_policy(&self) -> DecodePolicy {
        self.decode.into()
    }

    pub fn presence_check(&self) -> PresenceCheck {
        self.presence.into()
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            detach_kernel_driver: self.detach_kernel_driver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let settings = Settings::read(Path::new("/nonexistent/uvc-thermal/settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.decode_policy(), DecodePolicy::default());
        assert_eq!(settings.presence_check(), PresenceCheck::default());
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"decode":{"centi_max":4500},"timeout_ms":250}"#).unwrap();
        assert_eq!(settings.decode.deci_max, 1000);
        assert_eq!(settings.decode.centi_max, 4500);
        assert_eq!(settings.presence, PresenceSettings::default());
        assert_eq!(
            settings.connect_options().timeout,
            Duration::from_millis(250)
        );
        assert!(!settings.connect_options().detach_kernel_driver);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("uvc-thermal-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = Settings::read(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
