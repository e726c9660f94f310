//! Endpoint 0 control transfers
//!
//! The mouse answers just enough of the standard requests to enumerate. The
//! USBD handles SET_ADDRESS on its own, and takes care of the SETUP stage.
//! Every request ends in a DATA stage followed by a STATUS stage, a lone
//! STATUS stage, or a panic for the descriptor requests the mouse never
//! expects.

use crate::{
    descriptor::{DeviceDescriptor, MouseConfiguration, HID_REPORT_DESCRIPTOR},
    driver::Driver,
    ral,
    setup::{DescriptorKind, Request, Setup},
    wait::Wait,
};

impl<W: Wait> Driver<W> {
    /// Handle one SETUP packet, through to its STATUS stage
    pub(crate) fn on_setup(&mut self, setup: Setup) -> Request {
        debug!(
            "SETUP bmRequestType={=u8:#x} bRequest={=u8} wValue={=u16:#x} wIndex={=u16} wLength={=u16}",
            setup.request_type,
            setup.request,
            setup.value,
            setup.index,
            setup.length
        );

        let request = setup.request();
        match request {
            Request::GetDescriptor { kind, index } => {
                self.get_descriptor(kind, index, setup.length);
            }
            Request::SetAddress { address: _address } => {
                info!(
                    "SET_ADDRESS {=u8} (USBADDR={=u32})",
                    _address,
                    ral::read_reg!(ral::usbd, self.usbd, USBADDR)
                );
                self.clear_usb_event();
            }
            Request::HostToDevice { request: _request } => {
                debug!("NO DATA STAGE FOR REQUEST {=u8}", _request);
                self.status();
            }
            Request::HidReportDescriptor => {
                debug!("HID REPORT DESCRIPTOR");
                self.send_control(&HID_REPORT_DESCRIPTOR, setup.length);
                self.state.set_ready(true);
                info!("HOST IS LISTENING");
            }
            Request::Unrecognized => {
                error!(
                    "UNRECOGNIZED bmRequestType={=u8:#x} bRequest={=u8}",
                    setup.request_type, setup.request
                );
                self.status();
            }
        }
        request
    }

    fn get_descriptor(&mut self, kind: DescriptorKind, _index: u8, length: u16) {
        match kind {
            DescriptorKind::Device => {
                let descriptor = DeviceDescriptor::new(&self.config).to_bytes();
                self.send_control(&descriptor, length);
            }
            DescriptorKind::Configuration => {
                let descriptor = MouseConfiguration::new(&self.config).to_bytes();
                self.send_control(&descriptor, length);
            }
            DescriptorKind::String => {
                // No string descriptors. The host moves on.
                debug!("NO STRING DESCRIPTOR {=u8}", _index);
                self.status();
            }
            DescriptorKind::Interface | DescriptorKind::Endpoint => {
                unimplemented!("interface and endpoint descriptors are only sent with the configuration")
            }
            DescriptorKind::Other(_kind) => {
                error!("UNKNOWN DESCRIPTOR TYPE {=u8}", _kind);
                self.status();
            }
        }
    }

    /// DATA stage, then STATUS stage, on endpoint 0
    fn send_control(&mut self, data: &[u8], length: u16) {
        // Endpoint 0 always has a buffer.
        if let Err(_err) = self.send(0, data, length as usize) {
            error!("EP0 TRANSFER FAILED");
        }
    }

    /// STATUS stage without a DATA stage
    fn status(&mut self) {
        ral::write_reg!(ral::usbd, self.usbd, TASKS_EP0STATUS, 1);
    }
}
