//! SETUP packet decoding
//!
//! The USBD splits the eight SETUP bytes across eight registers.
//! [`Setup::read`] collects them; [`Setup::request`] maps the packet onto the
//! handful of requests a boot mouse answers.

use usb_device::{control, descriptor::descriptor_type};

use crate::ral;

/// `bmRequestType` values that the mouse distinguishes
pub mod request_type {
    /// Device to host, standard, device recipient
    pub const STANDARD_IN: u8 = 0x80;
    /// Host to device, standard, device recipient
    pub const STANDARD_OUT: u8 = 0x00;
    /// Device to host, standard, interface recipient
    ///
    /// The host fetches the HID report descriptor this way.
    pub const INTERFACE_IN: u8 = 0x81;
}

/// A decoded SETUP packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setup {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    /// How many bytes the host will accept in the DATA stage
    pub length: u16,
}

/// The descriptor named in a GET_DESCRIPTOR request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Device,
    Configuration,
    String,
    Interface,
    Endpoint,
    Other(u8),
}

impl From<u8> for DescriptorKind {
    fn from(kind: u8) -> Self {
        match kind {
            descriptor_type::DEVICE => DescriptorKind::Device,
            descriptor_type::CONFIGURATION => DescriptorKind::Configuration,
            descriptor_type::STRING => DescriptorKind::String,
            descriptor_type::INTERFACE => DescriptorKind::Interface,
            descriptor_type::ENDPOINT => DescriptorKind::Endpoint,
            other => DescriptorKind::Other(other),
        }
    }
}

/// What the host is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Standard GET_DESCRIPTOR
    GetDescriptor { kind: DescriptorKind, index: u8 },
    /// The hardware latches the address; the driver only observes it
    SetAddress { address: u8 },
    /// Any other standard host-to-device request, with no DATA stage
    HostToDevice { request: u8 },
    /// GET_DESCRIPTOR aimed at the interface: the HID report descriptor
    HidReportDescriptor,
    /// Anything else
    Unrecognized,
}

impl Setup {
    /// Decode the eight SETUP bytes, as they appear on the wire
    pub const fn parse(raw: [u8; 8]) -> Self {
        Setup {
            request_type: raw[0],
            request: raw[1],
            value: u16::from_le_bytes([raw[2], raw[3]]),
            index: u16::from_le_bytes([raw[4], raw[5]]),
            length: u16::from_le_bytes([raw[6], raw[7]]),
        }
    }

    /// Read the SETUP packet that the USBD captured
    pub(crate) fn read(usbd: &ral::usbd::Instance) -> Self {
        let byte = |value: u32| value as u8;
        Setup::parse([
            byte(ral::read_reg!(ral::usbd, usbd, BMREQUESTTYPE)),
            byte(ral::read_reg!(ral::usbd, usbd, BREQUEST)),
            byte(ral::read_reg!(ral::usbd, usbd, WVALUEL)),
            byte(ral::read_reg!(ral::usbd, usbd, WVALUEH)),
            byte(ral::read_reg!(ral::usbd, usbd, WINDEXL)),
            byte(ral::read_reg!(ral::usbd, usbd, WINDEXH)),
            byte(ral::read_reg!(ral::usbd, usbd, WLENGTHL)),
            byte(ral::read_reg!(ral::usbd, usbd, WLENGTHH)),
        ])
    }

    pub fn request(&self) -> Request {
        use request_type::*;
        let [value_low, value_high] = self.value.to_le_bytes();
        match (self.request_type, self.request) {
            (STANDARD_IN, control::Request::GET_DESCRIPTOR) => Request::GetDescriptor {
                kind: DescriptorKind::from(value_high),
                index: value_low,
            },
            (STANDARD_OUT, control::Request::SET_ADDRESS) => Request::SetAddress {
                address: value_low & 0x7F,
            },
            (STANDARD_OUT, request) => Request::HostToDevice { request },
            (INTERFACE_IN, control::Request::GET_DESCRIPTOR) => Request::HidReportDescriptor,
            _ => Request::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DescriptorKind, Request, Setup};

    #[test]
    fn parse_little_endian() {
        let setup = Setup::parse([0x80, 0x06, 0x00, 0x01, 0x34, 0x12, 0x40, 0x00]);
        assert_eq!(setup.request_type, 0x80);
        assert_eq!(setup.request, 0x06);
        assert_eq!(setup.value, 0x0100);
        assert_eq!(setup.index, 0x1234);
        assert_eq!(setup.length, 64);
    }

    #[test]
    fn get_device_descriptor() {
        let setup = Setup::parse([0x80, 0x06, 0x00, 0x01, 0, 0, 0x12, 0]);
        assert_eq!(
            setup.request(),
            Request::GetDescriptor {
                kind: DescriptorKind::Device,
                index: 0
            }
        );
    }

    #[test]
    fn get_string_descriptor_keeps_index() {
        let setup = Setup::parse([0x80, 0x06, 0x02, 0x03, 0x09, 0x04, 0xFF, 0]);
        assert_eq!(
            setup.request(),
            Request::GetDescriptor {
                kind: DescriptorKind::String,
                index: 2
            }
        );
    }

    #[test]
    fn descriptor_kinds() {
        assert_eq!(DescriptorKind::from(2), DescriptorKind::Configuration);
        assert_eq!(DescriptorKind::from(4), DescriptorKind::Interface);
        assert_eq!(DescriptorKind::from(5), DescriptorKind::Endpoint);
        assert_eq!(DescriptorKind::from(6), DescriptorKind::Other(6));
    }

    #[test]
    fn set_address() {
        let setup = Setup::parse([0x00, 0x05, 0x17, 0x00, 0, 0, 0, 0]);
        assert_eq!(setup.request(), Request::SetAddress { address: 0x17 });
    }

    #[test]
    fn set_configuration_is_host_to_device() {
        let setup = Setup::parse([0x00, 0x09, 0x01, 0x00, 0, 0, 0, 0]);
        assert_eq!(setup.request(), Request::HostToDevice { request: 0x09 });
    }

    #[test]
    fn hid_report_descriptor() {
        let setup = Setup::parse([0x81, 0x06, 0x00, 0x22, 0, 0, 0x74, 0]);
        assert_eq!(setup.request(), Request::HidReportDescriptor);
    }

    #[test]
    fn unrecognized() {
        // GET_STATUS, device to host
        let setup = Setup::parse([0x80, 0x00, 0, 0, 0, 0, 2, 0]);
        assert_eq!(setup.request(), Request::Unrecognized);
        // SET_IDLE, class request to the interface
        let setup = Setup::parse([0x21, 0x0A, 0, 0, 0, 0, 0, 0]);
        assert_eq!(setup.request(), Request::Unrecognized);
    }
}
