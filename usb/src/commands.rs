use strum::Display;

// UVC 1.5, Table A-8: Video Class-Specific Request Codes, the two this crate issues.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum UvcRequest {
    GetCur,
    GetInfo,
}

impl UvcRequest {
    pub fn code(&self) -> u8 {
        match self {
            UvcRequest::GetCur => 0x81,
            UvcRequest::GetInfo => 0x86,
        }
    }
}

// The selector goes in the high byte of wValue, the unit in the high byte of wIndex with the
// Video Control interface number in the low byte.
pub fn control_value(selector: u8) -> u16 {
    u16::from(selector) << 8
}

pub fn control_index(unit_id: u8, interface: u8) -> u16 {
    (u16::from(unit_id) << 8) | u16::from(interface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_fields() {
        assert_eq!(UvcRequest::GetCur.code(), 0x81);
        assert_eq!(UvcRequest::GetInfo.code(), 0x86);
        assert_eq!(UvcRequest::GetCur.to_string(), "GetCur");
        assert_eq!(control_value(3), 0x0300);
        assert_eq!(control_index(4, 0), 0x0400);
        assert_eq!(control_index(4, 1), 0x0401);
    }
}
