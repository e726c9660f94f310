//! USB descriptors for a boot-protocol HID mouse
//!
//! Each descriptor is a plain struct that serializes itself, little endian and
//! without padding, into a byte array of exactly its wire length. Lengths that
//! appear inside descriptors (`bLength`, `wTotalLength`, `wDescriptorLength`,
//! `wMaxPacketSize`) are computed from the records themselves.

use usb_device::{
    descriptor::descriptor_type,
    endpoint::EndpointAddress,
    UsbDirection,
};

use crate::{buffer::MAX_PACKET_SIZE, config::Config, mouse::Report};

/// USB 1.10, as binary-coded decimal
const USB_1_10: u16 = 0x0110;
/// HID 1.10, as binary-coded decimal
const HID_1_10: u16 = 0x0110;

/// Class-specific descriptor types
pub mod hid_descriptor_type {
    pub const HID: u8 = 0x21;
    pub const REPORT: u8 = 0x22;
}

const CLASS_HID: u8 = 0x03;
const SUBCLASS_BOOT: u8 = 0x01;
const PROTOCOL_MOUSE: u8 = 0x02;

/// `bmAttributes` of an interrupt endpoint
const TRANSFER_INTERRUPT: u8 = 0x03;

/// The endpoint that carries mouse reports
pub const REPORT_ENDPOINT: usize = 1;

/// Mouse report descriptor
///
/// Generic desktop mouse, five buttons (three in use) padded to a byte, then
/// relative X, Y and wheel as signed bytes. Matches [`Report`].
pub const HID_REPORT_DESCRIPTOR: [u8; 52] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x05, //     Usage Maximum (5)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x05, //     Report Count (5)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x03, //     Report Size (3)
    0x81, 0x01, //     Input (Constant)
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //         End Collection
    0xC0, //       End Collection
];

/// Serializes fields, in order, into a fixed-size array
struct Writer<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> Writer<N> {
    const fn new() -> Self {
        Writer {
            bytes: [0; N],
            len: 0,
        }
    }
    fn u8(mut self, value: u8) -> Self {
        self.bytes[self.len] = value;
        self.len += 1;
        self
    }
    fn u16(self, value: u16) -> Self {
        let [lo, hi] = value.to_le_bytes();
        self.u8(lo).u8(hi)
    }
    fn bytes(mut self, values: &[u8]) -> Self {
        self.bytes[self.len..self.len + values.len()].copy_from_slice(values);
        self.len += values.len();
        self
    }
    fn finish(self) -> [u8; N] {
        debug_assert_eq!(self.len, N, "descriptor length mismatch");
        self.bytes
    }
}

/// The device descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub usb_release: u16,
    pub max_packet_size0: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_release: u16,
    pub num_configurations: u8,
}

impl DeviceDescriptor {
    pub const LEN: usize = 18;

    /// Class, subclass and protocol are left to the interface. There are no
    /// string descriptors.
    pub const fn new(config: &Config) -> Self {
        DeviceDescriptor {
            usb_release: USB_1_10,
            max_packet_size0: MAX_PACKET_SIZE as u8,
            vendor_id: config.vendor_id,
            product_id: config.product_id,
            device_release: config.device_release,
            num_configurations: 1,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        Writer::new()
            .u8(Self::LEN as u8)
            .u8(descriptor_type::DEVICE)
            .u16(self.usb_release)
            .u8(0) // bDeviceClass
            .u8(0) // bDeviceSubClass
            .u8(0) // bDeviceProtocol
            .u8(self.max_packet_size0)
            .u16(self.vendor_id)
            .u16(self.product_id)
            .u16(self.device_release)
            .u8(0) // iManufacturer
            .u8(0) // iProduct
            .u8(0) // iSerialNumber
            .u8(self.num_configurations)
            .finish()
    }
}

/// The configuration descriptor header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationDescriptor {
    /// Length of the configuration and everything that follows it
    pub total_length: u16,
    pub num_interfaces: u8,
    pub configuration_value: u8,
    pub attributes: u8,
    /// In 2mA units
    pub max_power: u8,
}

impl ConfigurationDescriptor {
    pub const LEN: usize = 9;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        Writer::new()
            .u8(Self::LEN as u8)
            .u8(descriptor_type::CONFIGURATION)
            .u16(self.total_length)
            .u8(self.num_interfaces)
            .u8(self.configuration_value)
            .u8(0) // iConfiguration
            .u8(self.attributes)
            .u8(self.max_power)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub interface_number: u8,
    pub alternate_setting: u8,
    pub num_endpoints: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
}

impl InterfaceDescriptor {
    pub const LEN: usize = 9;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        Writer::new()
            .u8(Self::LEN as u8)
            .u8(descriptor_type::INTERFACE)
            .u8(self.interface_number)
            .u8(self.alternate_setting)
            .u8(self.num_endpoints)
            .u8(self.class)
            .u8(self.subclass)
            .u8(self.protocol)
            .u8(0) // iInterface
            .finish()
    }
}

/// The HID class descriptor, naming one report descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidDescriptor {
    pub hid_release: u16,
    pub country_code: u8,
    pub report_descriptor_length: u16,
}

impl HidDescriptor {
    pub const LEN: usize = 9;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        Writer::new()
            .u8(Self::LEN as u8)
            .u8(hid_descriptor_type::HID)
            .u16(self.hid_release)
            .u8(self.country_code)
            .u8(1) // bNumDescriptors
            .u8(hid_descriptor_type::REPORT)
            .u16(self.report_descriptor_length)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub address: EndpointAddress,
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
}

impl EndpointDescriptor {
    pub const LEN: usize = 7;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        Writer::new()
            .u8(Self::LEN as u8)
            .u8(descriptor_type::ENDPOINT)
            .u8(self.address.into())
            .u8(self.attributes)
            .u16(self.max_packet_size)
            .u8(self.interval)
            .finish()
    }
}

/// Everything returned for GET_DESCRIPTOR(CONFIGURATION)
///
/// One configuration, with one HID boot mouse interface, with one interrupt IN
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseConfiguration {
    pub configuration: ConfigurationDescriptor,
    pub interface: InterfaceDescriptor,
    pub hid: HidDescriptor,
    pub endpoint: EndpointDescriptor,
}

impl MouseConfiguration {
    pub const LEN: usize = ConfigurationDescriptor::LEN
        + InterfaceDescriptor::LEN
        + HidDescriptor::LEN
        + EndpointDescriptor::LEN;

    pub fn new(config: &Config) -> Self {
        MouseConfiguration {
            configuration: ConfigurationDescriptor {
                total_length: Self::LEN as u16,
                num_interfaces: 1,
                configuration_value: 1,
                attributes: 0b1100_0000,
                max_power: 0,
            },
            interface: InterfaceDescriptor {
                interface_number: 0,
                alternate_setting: 0,
                num_endpoints: 1,
                class: CLASS_HID,
                subclass: SUBCLASS_BOOT,
                protocol: PROTOCOL_MOUSE,
            },
            hid: HidDescriptor {
                hid_release: HID_1_10,
                country_code: 0,
                report_descriptor_length: HID_REPORT_DESCRIPTOR.len() as u16,
            },
            endpoint: EndpointDescriptor {
                address: EndpointAddress::from_parts(REPORT_ENDPOINT, UsbDirection::In),
                attributes: TRANSFER_INTERRUPT,
                max_packet_size: Report::SIZE as u16,
                interval: config.poll_interval_ms,
            },
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        Writer::new()
            .bytes(&self.configuration.to_bytes())
            .bytes(&self.interface.to_bytes())
            .bytes(&self.hid.to_bytes())
            .bytes(&self.endpoint.to_bytes())
            .finish()
    }
}
