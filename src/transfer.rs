//! IN transfers through EasyDMA
//!
//! A transfer is split into packets of at most [`MAX_PACKET_SIZE`] bytes.
//! Each packet is staged in the endpoint's RAM buffer, then handed to the
//! USBD. The driver waits for the USBD to finish each packet before it stages
//! the next one.
//!
//! nRF52840 errata 199: the USBD cannot receive tasks while EasyDMA is
//! active. `DMAGUARD` is set for the whole transfer, and cleared once the
//! transfer is done.

use usb_device::UsbError;

use crate::{
    buffer::{Buffer, MAX_PACKET_SIZE},
    driver::Driver,
    ral,
    wait::{wait_until, Wait},
};

impl<W: Wait> Driver<W> {
    /// Send `data` on IN endpoint `endpoint`
    ///
    /// The driver sends the smaller of `data.len()` and `requested` bytes. On
    /// endpoint 0, the driver also starts the control transfer's STATUS stage.
    /// Returns the number of bytes the USBD reported as sent.
    ///
    /// Only endpoints 0 and 1 are supported. Any other endpoint returns
    /// [`UsbError::InvalidEndpoint`], and the registers are not touched.
    ///
    /// This waits on the hardware, with no timeout. If the USBD reports a short
    /// packet, the remainder is sent in the next packet.
    pub fn send(
        &mut self,
        endpoint: usize,
        data: &[u8],
        requested: usize,
    ) -> Result<usize, UsbError> {
        let state = self.state;
        let Some(buffer) = state.buffer(endpoint) else {
            warn!("EP{=usize} is not supported", endpoint);
            return Err(UsbError::InvalidEndpoint);
        };
        let total = data.len().min(requested);

        ral::write_reg!(ral::usbd, self.usbd, DMAGUARD, ral::usbd::DMAGUARD_ACTIVE);
        let sent = self.transfer(endpoint, buffer, &data[..total]);
        if endpoint == 0 {
            ral::write_reg!(ral::usbd, self.usbd, TASKS_EP0STATUS, 1);
        }
        ral::write_reg!(ral::usbd, self.usbd, DMAGUARD, 0);

        trace!("EP{=usize} SENT {=usize}", endpoint, sent);
        Ok(sent)
    }

    /// Send `data` one packet at a time
    fn transfer(&mut self, endpoint: usize, buffer: &Buffer, data: &[u8]) -> usize {
        let epin = ral::endpoint_in::register(&self.usbd, endpoint);
        let usbd = &self.usbd;

        let mut sent = 0;
        while sent < data.len() {
            let chunk = (data.len() - sent).min(MAX_PACKET_SIZE);
            buffer.volatile_write(&data[sent..sent + chunk]);

            ral::write_reg!(ral::endpoint_in, &epin, PTR, buffer.as_ptr() as u32);
            ral::write_reg!(ral::endpoint_in, &epin, MAXCNT, chunk as u32);
            ral::write_reg!(ral::endpoint_in, &epin, TASKS_STARTEPIN, 1);

            wait_until(&mut self.wait, || {
                ral::read_reg!(ral::endpoint_in, &epin, EVENTS_ENDEPIN) == 1
            });
            ral::write_reg!(ral::endpoint_in, &epin, EVENTS_ENDEPIN, 0);

            if endpoint == 0 {
                wait_until(&mut self.wait, || {
                    ral::read_reg!(ral::usbd, usbd, EVENTS_EP0DATADONE) == 1
                });
                ral::write_reg!(ral::usbd, usbd, EVENTS_EP0DATADONE, 0);
            } else {
                let mask = 1 << endpoint;
                wait_until(&mut self.wait, || {
                    ral::read_reg!(ral::usbd, usbd, EPDATASTATUS) & mask != 0
                });
                ral::write_reg!(ral::usbd, usbd, EPDATASTATUS, mask);
            }

            let amount = ral::read_reg!(ral::endpoint_in, &epin, AMOUNT) as usize;
            sent += amount.min(chunk);
        }
        sent
    }
}
