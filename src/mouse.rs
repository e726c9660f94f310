//! HID mouse reports

use bitflags::bitflags;
use usb_device::UsbError;

use crate::{
    command::Action,
    descriptor::REPORT_ENDPOINT,
    driver::Driver,
    wait::{wait_until, Wait},
};

bitflags! {
    /// Mouse buttons
    ///
    /// The report descriptor declares five buttons. The boot protocol only
    /// defines the first three.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
    }
}

/// One mouse input report
///
/// On the wire: buttons, X, Y, then wheel, one byte each. Movement is relative
/// and signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Report {
    pub buttons: Buttons,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
}

impl Report {
    pub const SIZE: usize = 4;

    pub const fn movement(x: i8, y: i8) -> Self {
        Report {
            buttons: Buttons::empty(),
            x,
            y,
            wheel: 0,
        }
    }

    pub const fn scroll(wheel: i8) -> Self {
        Report {
            buttons: Buttons::empty(),
            x: 0,
            y: 0,
            wheel,
        }
    }

    pub const fn buttons(buttons: Buttons) -> Self {
        Report {
            buttons,
            x: 0,
            y: 0,
            wheel: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        [
            self.buttons.bits(),
            self.x as u8,
            self.y as u8,
            self.wheel as u8,
        ]
    }
}

impl<W: Wait> Driver<W> {
    /// Wait until the host is listening for reports
    ///
    /// There's no timeout. If the host never fetches the report descriptor,
    /// this never returns.
    pub fn wait_ready(&mut self) {
        let state = self.state;
        wait_until(&mut self.wait, || state.is_ready());
    }

    /// Send one report on the report endpoint, if the host is listening
    ///
    /// Returns [`UsbError::WouldBlock`] without touching the USBD if the host
    /// isn't listening. Never waits for the host.
    pub fn try_send_report(&mut self, report: &Report) -> Result<(), UsbError> {
        if !self.is_ready() {
            return Err(UsbError::WouldBlock);
        }
        self.write_report(report)
    }

    /// Perform a mouse action, if the host is listening
    ///
    /// Readiness is checked once, before the first report. A click's press
    /// and release either both go out, or neither does. Returns
    /// [`UsbError::WouldBlock`] if nothing was sent.
    pub fn try_perform(&mut self, action: Action) -> Result<(), UsbError> {
        if !self.is_ready() {
            return Err(UsbError::WouldBlock);
        }
        match action {
            Action::Move { x, y } => self.write_report(&Report::movement(x, y)),
            Action::Scroll(wheel) => self.write_report(&Report::scroll(wheel)),
            Action::Click(buttons) => {
                self.write_report(&Report::buttons(buttons))?;
                self.write_report(&Report::default())
            }
        }
    }

    /// Send one report on the report endpoint, once the host is listening
    pub fn send_report(&mut self, report: &Report) -> Result<(), UsbError> {
        loop {
            self.wait_ready();
            match self.try_send_report(report) {
                Err(UsbError::WouldBlock) => continue,
                result => return result,
            }
        }
    }

    /// Perform a mouse action, once the host is listening
    pub fn perform(&mut self, action: Action) -> Result<(), UsbError> {
        loop {
            self.wait_ready();
            match self.try_perform(action) {
                Err(UsbError::WouldBlock) => continue,
                result => return result,
            }
        }
    }

    /// Move the pointer by `x` and `y`
    pub fn mouse_move(&mut self, x: i8, y: i8) -> Result<(), UsbError> {
        self.perform(Action::Move { x, y })
    }

    /// Turn the wheel; positive values scroll up
    pub fn mouse_scroll(&mut self, wheel: i8) -> Result<(), UsbError> {
        self.perform(Action::Scroll(wheel))
    }

    /// Press, then release, `buttons`
    ///
    /// Reports are stateless, so a click is two reports: one with the buttons
    /// down, and one with every button up.
    pub fn mouse_click(&mut self, buttons: Buttons) -> Result<(), UsbError> {
        self.perform(Action::Click(buttons))
    }

    fn write_report(&mut self, report: &Report) -> Result<(), UsbError> {
        self.send(REPORT_ENDPOINT, &report.to_bytes(), Report::SIZE)?;
        Ok(())
    }
}
