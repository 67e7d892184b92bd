//! Walks a raw configuration descriptor blob and pulls out the Video Control extension units.
//!
//! The blob comes straight off the device and isn't trusted. Anything that doesn't add up ends
//! the walk, with whatever was found up to that point still returned.

use crate::guid::Guid;
use log::{debug, info};

pub const USB_DT_CS_INTERFACE: u8 = 0x24;
pub const UVC_VC_EXTENSION_UNIT: u8 = 0x06;

// bLength, bDescriptorType, bDescriptorSubtype, bUnitID, guidExtensionCode[16], bNumControls,
// and the bitmap size byte.
const EXTENSION_UNIT_MIN_LENGTH: usize = 24;
const BITMAP_OFFSET: usize = 22;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionUnit {
    pub unit_id: u8,
    pub guid: Guid,
    pub num_controls: u8,

    /// None when the descriptor was too short to hold the bitmap it declared.
    pub control_bitmap: Option<Vec<u8>>,
}

impl ExtensionUnit {
    pub fn guid_string(&self) -> String {
        self.guid.to_string()
    }

    pub fn is(&self, guid: &Guid) -> bool {
        self.guid == *guid
    }

    /// Whether the bitmap marks the 1-based selector as supported. Unknown if there's no bitmap.
    pub fn supports_selector(&self, selector: u8) -> Option<bool> {
        let bitmap = self.control_bitmap.as_ref()?;
        if selector == 0 {
            return Some(false);
        }
        let bit = usize::from(selector - 1);
        Some(
            bitmap
                .get(bit / 8)
                .is_some_and(|byte| byte & (1 << (bit % 8)) != 0),
        )
    }
}

impl ExtensionUnit {
    /// The 1-based selectors the bitmap marks as supported, None without a bitmap.
    pub fn supported_selectors(&self) -> Option<Vec<u8>> {
        let bits = self.control_bitmap.as_ref()?.len() * 8;
        let last = u8::try_from(bits).unwrap_or(u8::MAX);
        Some(
            (1..=last)
                .filter(|selector| self.supports_selector(*selector) == Some(true))
                .collect(),
        )
    }

    pub fn supported_selectors_text(&self) -> String {
        match self.supported_selectors() {
            Some(selectors) if selectors.is_empty() => String::from("none"),
            Some(selectors) => selectors
                .iter()
                .map(|selector| selector.to_string())
                .collect::<Vec<String>>()
                .join(","),
            None => String::from("unknown"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Descriptor<'a> {
    pub descriptor_type: u8,

    /// The full descriptor, header included.
    pub data: &'a [u8],
}

impl Descriptor<'_> {
    pub fn subtype(&self) -> Option<u8> {
        self.data.get(2).copied()
    }
}

/// Iterates `[length][type][payload..]` records until the chain stops making sense.
pub struct DescriptorIter<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> DescriptorIter<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }
}

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = Descriptor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = &self.buffer[self.position..];
        if remaining.len() < 2 {
            return None;
        }

        let length = usize::from(remaining[0]);
        if length == 0 || length > remaining.len() {
            debug!(
                "Descriptor chain ends at offset {}, length {} with {} bytes left",
                self.position,
                length,
                remaining.len()
            );

            // Park at the end so we don't keep re-reading a broken header.
            self.position = self.buffer.len();
            return None;
        }

        self.position += length;
        Some(Descriptor {
            descriptor_type: remaining[1],
            data: &remaining[..length],
        })
    }
}

pub fn descriptors(buffer: &[u8]) -> DescriptorIter<'_> {
    DescriptorIter::new(buffer)
}

pub fn parse_extension_units(buffer: &[u8]) -> Vec<ExtensionUnit> {
    debug!("Parsing {} bytes of USB descriptors", buffer.len());

    let units: Vec<ExtensionUnit> = descriptors(buffer)
        .filter_map(|descriptor| parse_extension_unit(&descriptor))
        .collect();

    info!("Found {} extension units total", units.len());
    units
}

fn parse_extension_unit(descriptor: &Descriptor<'_>) -> Option<ExtensionUnit> {
    if descriptor.descriptor_type != USB_DT_CS_INTERFACE
        || descriptor.subtype() != Some(UVC_VC_EXTENSION_UNIT)
    {
        return None;
    }

    let data = descriptor.data;
    if data.len() < EXTENSION_UNIT_MIN_LENGTH {
        return None;
    }

    let mut guid = [0; 16];
    guid.copy_from_slice(&data[4..20]);

    let bitmap_size = usize::from(data[21]);
    let control_bitmap = data
        .get(BITMAP_OFFSET..BITMAP_OFFSET + bitmap_size)
        .map(|bitmap| bitmap.to_vec());

    let unit = ExtensionUnit {
        unit_id: data[3],
        guid: Guid(guid),
        num_controls: data[20],
        control_bitmap,
    };

    info!(
        "Found Extension Unit {}, GUID: {}, Controls: {}, Bitmap: {:?}",
        unit.unit_id,
        unit.guid,
        unit.num_controls,
        unit.control_bitmap.as_ref().map(|bitmap| bitmap.len())
    );
    Some(unit)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::guid::THERMAL_GUID;

    pub(crate) const OTHER_GUID: [u8; 16] = [
        0x1e, 0x6b, 0x1b, 0x0f, 0x4b, 0x8a, 0x43, 0x4e, 0x9f, 0x26, 0x0d, 0x51, 0x3b, 0x1f, 0x7e,
        0x53,
    ];

    // An extension unit with two trailing bytes after the bitmap, as real units have.
    pub(crate) fn extension_unit(unit_id: u8, guid: [u8; 16], bitmap: &[u8]) -> Vec<u8> {
        let mut data = vec![0, USB_DT_CS_INTERFACE, UVC_VC_EXTENSION_UNIT, unit_id];
        data.extend_from_slice(&guid);
        data.push(bitmap.len() as u8 * 8);
        data.push(bitmap.len() as u8);
        data.extend_from_slice(bitmap);
        data.extend_from_slice(&[0x02, 0x00]);
        data[0] = data.len() as u8;
        data
    }

    // Configuration, interface, VC header, camera terminal, an XU, a processing unit, the
    // thermal XU and an MJPEG format descriptor (which shares the 0x06 subtype).
    pub(crate) fn camera_configuration() -> Vec<u8> {
        let mut buffer = vec![0x09, 0x02, 0x00, 0x00, 0x02, 0x01, 0x00, 0x80, 0xfa];
        buffer.extend_from_slice(&[0x09, 0x04, 0x00, 0x00, 0x01, 0x0e, 0x01, 0x00, 0x00]);
        buffer.extend_from_slice(&[
            0x0d, 0x24, 0x01, 0x00, 0x01, 0x4d, 0x00, 0x80, 0xc3, 0xc9, 0x01, 0x01, 0x01,
        ]);
        buffer.extend_from_slice(&[
            0x12, 0x24, 0x02, 0x01, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x03, 0x00, 0x00, 0x00,
        ]);
        buffer.extend(extension_unit(3, OTHER_GUID, &[0xff, 0x03]));
        buffer.extend_from_slice(&[
            0x0b, 0x24, 0x05, 0x02, 0x01, 0x00, 0x00, 0x02, 0x7f, 0x15, 0x00,
        ]);
        buffer.extend(extension_unit(4, *THERMAL_GUID.as_bytes(), &[0x0f, 0x00]));
        buffer.extend_from_slice(&[
            0x0b, 0x24, 0x06, 0x01, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        ]);
        let total = buffer.len() as u16;
        buffer[2..4].copy_from_slice(&total.to_le_bytes());
        buffer
    }

    #[test]
    fn finds_units_in_order() {
        let units = parse_extension_units(&camera_configuration());
        assert_eq!(units.len(), 2);

        assert_eq!(units[0].unit_id, 3);
        assert_eq!(units[0].guid, Guid(OTHER_GUID));
        assert_eq!(units[0].num_controls, 16);
        assert_eq!(units[0].control_bitmap, Some(vec![0xff, 0x03]));

        assert_eq!(units[1].unit_id, 4);
        assert!(units[1].is(&THERMAL_GUID));
        assert_eq!(
            units[1].guid_string(),
            "1229a78c-47b4-4094-b0ce-db07386fb938"
        );
    }

    #[test]
    fn empty_and_tiny_buffers() {
        assert!(parse_extension_units(&[]).is_empty());
        assert!(parse_extension_units(&[0x18]).is_empty());
        assert!(descriptors(&[0x18]).next().is_none());
    }

    #[test]
    fn zero_length_stops_the_walk() {
        let mut buffer = extension_unit(1, OTHER_GUID, &[0x01, 0x00]);
        buffer.extend_from_slice(&[0x00, 0x24]);
        buffer.extend(extension_unit(2, OTHER_GUID, &[0x01, 0x00]));

        let units = parse_extension_units(&buffer);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit_id, 1);
    }

    #[test]
    fn overrunning_length_stops_the_walk() {
        let mut buffer = extension_unit(1, OTHER_GUID, &[]);
        let mut broken = extension_unit(2, OTHER_GUID, &[]);
        broken[0] = 0xff;
        buffer.extend(broken);

        let units = parse_extension_units(&buffer);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit_id, 1);
    }

    #[test]
    fn truncation_yields_a_prefix() {
        let buffer = camera_configuration();
        let full = parse_extension_units(&buffer);

        for cut in 0..=buffer.len() {
            let partial = parse_extension_units(&buffer[..cut]);
            assert!(partial.len() <= full.len(), "cut at {}", cut);
            assert_eq!(partial[..], full[..partial.len()], "cut at {}", cut);
        }
    }

    #[test]
    fn bitmap_fits_exactly() {
        // Length 24 with a two byte bitmap ends exactly at 22 + 2.
        let mut unit = extension_unit(5, OTHER_GUID, &[0xaa, 0x55]);
        unit.truncate(24);
        unit[0] = 24;
        let units = parse_extension_units(&unit);
        assert_eq!(units[0].control_bitmap, Some(vec![0xaa, 0x55]));

        // Declaring three bytes in the same 24 byte descriptor leaves the bitmap absent.
        unit[21] = 3;
        let units = parse_extension_units(&unit);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].control_bitmap, None);
    }

    #[test]
    fn empty_bitmap_is_not_absent() {
        let units = parse_extension_units(&extension_unit(6, OTHER_GUID, &[]));
        assert_eq!(units[0].control_bitmap, Some(vec![]));
        assert_eq!(units[0].num_controls, 0);
        assert_eq!(units[0].supports_selector(1), Some(false));
    }

    #[test]
    fn skips_non_extension_descriptors() {
        // Right subtype and size, wrong descriptor type.
        let mut wrong_type = extension_unit(1, OTHER_GUID, &[0x01, 0x00]);
        wrong_type[1] = 0x25;

        // Right type and subtype, too short to be an extension unit.
        let mut short = extension_unit(2, OTHER_GUID, &[]);
        short.truncate(23);
        short[0] = 23;

        // A two byte class specific descriptor has no subtype at all.
        let stub = vec![0x02, USB_DT_CS_INTERFACE];

        let mut buffer = wrong_type;
        buffer.extend(short);
        buffer.extend(stub);
        buffer.extend(extension_unit(7, OTHER_GUID, &[]));

        let units = parse_extension_units(&buffer);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit_id, 7);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut buffer = extension_unit(4, *THERMAL_GUID.as_bytes(), &[]);
        buffer.extend(extension_unit(4, *THERMAL_GUID.as_bytes(), &[]));

        let units = parse_extension_units(&buffer);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0], units[1]);
    }

    #[test]
    fn selector_support_from_bitmap() {
        let units = parse_extension_units(&extension_unit(4, OTHER_GUID, &[0b0000_0101, 0x80]));
        let unit = &units[0];
        assert_eq!(unit.supports_selector(1), Some(true));
        assert_eq!(unit.supports_selector(2), Some(false));
        assert_eq!(unit.supports_selector(3), Some(true));
        assert_eq!(unit.supports_selector(16), Some(true));
        assert_eq!(unit.supports_selector(17), Some(false));

        let absent = ExtensionUnit {
            control_bitmap: None,
            ..unit.clone()
        };
        assert_eq!(absent.supports_selector(1), None);

        assert_eq!(unit.supported_selectors(), Some(vec![1, 3, 16]));
        assert_eq!(unit.supported_selectors_text(), "1,3,16");
        assert_eq!(absent.supported_selectors(), None);
        assert_eq!(absent.supported_selectors_text(), "unknown");
    }

    #[test]
    fn empty_bitmap_supports_nothing() {
        let units = parse_extension_units(&extension_unit(6, OTHER_GUID, &[]));
        assert_eq!(units[0].supported_selectors(), Some(vec![]));
        assert_eq!(units[0].supported_selectors_text(), "none");
    }

    #[test]
    fn iterator_reports_every_descriptor() {
        let buffer = camera_configuration();
        let types: Vec<u8> = descriptors(&buffer).map(|d| d.descriptor_type).collect();
        assert_eq!(types, vec![0x02, 0x04, 0x24, 0x24, 0x24, 0x24, 0x24, 0x24]);
    }
}
