//! USB attach and detach
//!
//! When VBUS appears, the POWER peripheral signals USBDETECTED. The driver
//! then enables the USBD, starts the high-frequency clock, and waits for both
//! before it connects the D+ pull-up. Enabling the USBD requires the errata
//! 187 workaround on the nRF52840.

use crate::{driver::Driver, ral, wait::Wait};

/// Attach progress, from detached to enumerating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerState {
    /// No USB power, or the USB was removed
    #[default]
    Idle,
    /// The errata 187 workaround is armed
    ErrataApplied,
    /// The USBD is enabled, and the HFCLK is starting
    ClockStarting,
    /// USB power and the HFCLK are both ready
    ClockReady,
    /// The device is visible to the host
    PullupEnabled,
    /// The host sent its first SETUP packet
    Enumerating,
}

/// A POWER event serviced by
/// [`on_power_clock_interrupt()`](Driver::on_power_clock_interrupt)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    /// USB power appeared; the device is now connected
    Detected,
    /// USB power went away
    Removed,
}

impl<W: Wait> Driver<W> {
    /// Service one POWER / CLOCK event
    ///
    /// Call this from the POWER_CLOCK interrupt handler. Returns `None` if
    /// neither USB detect nor USB remove was pending.
    ///
    /// Handling an attach waits on the hardware, with no timeout.
    pub fn on_power_clock_interrupt(&mut self) -> Option<PowerEvent> {
        if ral::read_reg!(ral::power, self.power, EVENTS_USBDETECTED) == 1 {
            self.attach();
            Some(PowerEvent::Detected)
        } else if ral::read_reg!(ral::power, self.power, EVENTS_USBREMOVED) == 1 {
            self.detach();
            Some(PowerEvent::Removed)
        } else {
            None
        }
    }

    fn attach(&mut self) {
        info!("USB DETECTED");
        // The host must fetch the report descriptor again.
        self.state.set_ready(false);

        self.errata_187(ral::errata::USBD_ENABLING);
        self.power_state = PowerState::ErrataApplied;

        ral::write_reg!(ral::usbd, self.usbd, ENABLE, ENABLE: 1);
        ral::write_reg!(ral::power, self.power, TASKS_HFCLKSTART, 1);
        self.power_state = PowerState::ClockStarting;

        let usbd = &self.usbd;
        crate::wait::wait_until(&mut self.wait, || {
            ral::read_reg!(ral::usbd, usbd, EVENTS_USBEVENT) == 1
                || ral::read_reg!(ral::usbd, usbd, EVENTCAUSE, READY == 1)
        });
        ral::write_reg!(ral::usbd, self.usbd, EVENTS_USBEVENT, 0);
        ral::write_reg!(ral::usbd, self.usbd, EVENTCAUSE, READY: 1);
        debug!("USBD READY");

        self.errata_187(ral::errata::USBD_ENABLED);

        let power = &self.power;
        crate::wait::wait_until(&mut self.wait, || {
            ral::read_reg!(ral::power, power, EVENTS_USBPWRRDY) == 1
        });
        ral::write_reg!(ral::power, self.power, EVENTS_USBPWRRDY, 0);

        crate::wait::wait_until(&mut self.wait, || {
            ral::read_reg!(ral::power, power, EVENTS_HFCLKSTARTED) == 1
        });
        ral::write_reg!(ral::power, self.power, EVENTS_HFCLKSTARTED, 0);
        self.power_state = PowerState::ClockReady;
        debug!("HFCLK STARTED");

        ral::write_reg!(ral::usbd, self.usbd, USBPULLUP, CONNECT: 1);
        ral::modify_reg!(ral::usbd, self.usbd, EPINEN, IN1: 1);
        ral::write_reg!(ral::power, self.power, EVENTS_USBDETECTED, 0);
        self.state.set_ready(false);
        self.power_state = PowerState::PullupEnabled;
        info!("USBD CONNECTED");
    }

    /// Only the readiness changes. The registers are left as they are, since
    /// the device is expected to lose power.
    fn detach(&mut self) {
        self.state.set_ready(false);
        ral::write_reg!(ral::power, self.power, EVENTS_USBREMOVED, 0);
        self.power_state = PowerState::Idle;
        info!("USB REMOVED");
    }

    /// nRF52840 errata 187: the USBD cannot be enabled
    ///
    /// The three writes must happen in this order, exactly once each.
    fn errata_187(&mut self, payload: u32) {
        ral::write_reg!(ral::errata, self.errata, ACCESS, ral::errata::UNLOCK);
        ral::write_reg!(ral::errata, self.errata, REG114, payload);
        ral::write_reg!(ral::errata, self.errata, ACCESS, ral::errata::UNLOCK);
        trace!("ERRATA 187 {=u32}", payload);
    }
}
