//! Extension unit GUIDs.
//!
//! Descriptors carry the GUID in the Microsoft mixed-endian layout: the first three fields are
//! little-endian, the last eight bytes are stored in display order. The raw 16 bytes are the
//! identity, the string form is only for display and for matching against published constants.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Guid(pub [u8; 16]);

/// The thermal extension unit, `1229a78c-47b4-4094-b0ce-db07386fb938`
pub const THERMAL_GUID: Guid = Guid([
    0x8c, 0xa7, 0x29, 0x12, 0xb4, 0x47, 0x94, 0x40, 0xb0, 0xce, 0xdb, 0x07, 0x38, 0x6f, 0xb9, 0x38,
]);

impl Guid {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        Uuid::from_bytes_le(self.0)
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Guid(uuid.to_bytes_le())
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_uuid().hyphenated())
    }
}

impl std::fmt::Debug for Guid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_uuid().braced())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum GuidParseError {
    #[error("Invalid GUID: {0}")]
    Invalid(#[from] uuid::Error),
}

impl FromStr for Guid {
    type Err = GuidParseError;

    /// Accepts the canonical form, braced or not, in either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Uuid::parse_str(s.trim())?.into())
    }
}

pub fn guid_to_string(guid: &[u8; 16]) -> String {
    Guid(*guid).to_string()
}

pub fn guids_equal(a: &[u8; 16], b: &[u8; 16]) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    const THERMAL_STRING: &str = "1229a78c-47b4-4094-b0ce-db07386fb938";

    #[test]
    fn renders_mixed_endian() {
        assert_eq!(THERMAL_GUID.to_string(), THERMAL_STRING);
        assert_eq!(guid_to_string(THERMAL_GUID.as_bytes()), THERMAL_STRING);
    }

    #[test]
    fn renders_every_byte_lowercase() {
        let guid = Guid([
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f,
        ]);
        assert_eq!(guid.to_string(), "03020100-0504-0706-0809-0a0b0c0d0e0f");
        assert_eq!(format!("{:?}", guid), "{03020100-0504-0706-0809-0a0b0c0d0e0f}");
    }

    #[test]
    fn parses_canonical_forms() {
        assert_eq!(THERMAL_STRING.parse::<Guid>(), Ok(THERMAL_GUID));
        assert_eq!(
            "{1229A78C-47B4-4094-B0CE-DB07386FB938}".parse::<Guid>(),
            Ok(THERMAL_GUID)
        );
    }

    #[test]
    fn rejects_malformed() {
        assert!("".parse::<Guid>().is_err());
        assert!("1229a78c-47b4-4094-b0ce-db07386fb93".parse::<Guid>().is_err());
        assert!("1229a78c-47b4-4094-b0ce-db07386fb93g".parse::<Guid>().is_err());
        assert!("1229a78c-47b4-4094-b0cedb07-386fb938".parse::<Guid>().is_err());
    }

    #[test]
    fn uuid_round_trip_keeps_raw_bytes() {
        let uuid = THERMAL_GUID.to_uuid();
        assert_eq!(uuid.to_string(), THERMAL_STRING);
        assert_eq!(Guid::from(uuid), THERMAL_GUID);
    }

    #[test]
    fn equality_is_bytewise() {
        let a = *THERMAL_GUID.as_bytes();
        let mut b = a;
        assert!(guids_equal(&a, &a));
        assert!(guids_equal(&a, &b) && guids_equal(&b, &a));

        b[15] ^= 0x01;
        assert!(!guids_equal(&a, &b));
        assert!(!guids_equal(&b, &a));

        // Upper and lower case strings land on the same bytes.
        let upper: Guid = THERMAL_STRING.to_uppercase().parse().unwrap();
        assert!(guids_equal(upper.as_bytes(), &a));
    }
}
