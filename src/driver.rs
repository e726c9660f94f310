//! USB mouse driver
//!
//! The driver owns the USBD, POWER / CLOCK and errata register blocks. Its
//! behaviors are split across modules:
//!
//! - `power` brings up the USBD when VBUS appears.
//! - `control` answers the host's SETUP packets on endpoint 0.
//! - `transfer` moves IN data through EasyDMA.
//! - `mouse` encodes and sends HID reports.
//!
//! This module has the constructor and the USBD interrupt dispatch.

use crate::{
    config::Config,
    power::PowerState,
    ral,
    setup::{Request, Setup},
    state::DeviceState,
    wait::{Spin, Wait},
};

/// A USBD event serviced by [`on_usbd_interrupt()`](Driver::on_usbd_interrupt)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbdEvent {
    /// The host reset the bus
    Reset,
    /// The host sent a SETUP packet, and the driver handled the request
    Setup(Request),
    /// The USBD signaled a bus event, with this `EVENTCAUSE`
    UsbEvent { cause: u32 },
    /// Endpoint data status changed, with this `EPDATASTATUS`
    EpData { status: u32 },
}

/// A USB HID mouse driver
///
/// After you allocate a `Driver` with [`new()`](Driver::new), you must call
/// [`initialize()`](Driver::initialize) once. Then, call
/// [`on_power_clock_interrupt()`](Driver::on_power_clock_interrupt) and
/// [`on_usbd_interrupt()`](Driver::on_usbd_interrupt) from the respective
/// interrupt handlers.
///
/// `W` decides what happens while the driver waits on the hardware. See
/// [`Wait`] for more information.
pub struct Driver<W = Spin> {
    pub(crate) usbd: ral::usbd::Instance,
    pub(crate) power: ral::power::Instance,
    pub(crate) errata: ral::errata::Instance,
    pub(crate) state: &'static DeviceState,
    pub(crate) config: Config,
    pub(crate) power_state: PowerState,
    pub(crate) wait: W,
}

impl Driver<Spin> {
    /// Create a new `Driver` that spins while it waits on the hardware
    ///
    /// Creation does nothing except for assign static memory to the driver.
    ///
    /// # Panics
    ///
    /// Panics if `state` has already been assigned to another driver.
    pub fn new<P: crate::Peripherals>(
        peripherals: P,
        state: &'static DeviceState,
        config: Config,
    ) -> Self {
        Self::with_wait(peripherals, state, config, Spin)
    }
}

impl<W: Wait> Driver<W> {
    /// Create a new `Driver` that calls `wait` while it waits on the hardware
    ///
    /// # Panics
    ///
    /// Panics if `state` has already been assigned to another driver.
    pub fn with_wait<P: crate::Peripherals>(
        peripherals: P,
        state: &'static DeviceState,
        config: Config,
        wait: W,
    ) -> Self {
        let ral::Instances {
            usbd,
            power,
            errata,
        } = ral::instances(peripherals);
        assert!(state.take(), "Device state already assigned");
        Driver {
            usbd,
            power,
            errata,
            state,
            config,
            power_state: PowerState::Idle,
            wait,
        }
    }

    /// Enable the peripheral interrupts that drive the mouse
    ///
    /// POWER signals USB attach and detach. The USBD signals bus reset, bus
    /// events and SETUP packets. This does not touch the NVIC.
    pub fn initialize(&mut self) {
        ral::write_reg!(ral::power, self.power, INTENSET, USBDETECTED: 1, USBREMOVED: 1);
        ral::write_reg!(ral::usbd, self.usbd, INTENSET, USBRESET: 1, USBEVENT: 1, EP0SETUP: 1);
        debug!("INITIALIZED");
    }

    /// Returns `true` once the host is listening for mouse reports
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Where the driver is in the attach and enumeration sequence
    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Service one USBD event
    ///
    /// Call this from the USBD interrupt handler. When more than one event is
    /// pending, the driver handles them in priority order: bus reset, SETUP,
    /// bus event, then endpoint data. The rest stay pending and re-trigger
    /// the interrupt. Returns `None` if no event was pending.
    ///
    /// SETUP handling includes the DATA and STATUS stages, so this may wait on
    /// the hardware.
    pub fn on_usbd_interrupt(&mut self) -> Option<UsbdEvent> {
        let event = if ral::read_reg!(ral::usbd, self.usbd, EVENTS_USBRESET) == 1 {
            ral::write_reg!(ral::usbd, self.usbd, EVENTS_USBRESET, 0);
            debug!("USBRESET");
            Some(UsbdEvent::Reset)
        } else if ral::read_reg!(ral::usbd, self.usbd, EVENTS_EP0SETUP) == 1 {
            ral::write_reg!(ral::usbd, self.usbd, EVENTS_EP0SETUP, 0);
            if self.power_state == PowerState::PullupEnabled {
                self.power_state = PowerState::Enumerating;
            }
            let setup = Setup::read(&self.usbd);
            Some(UsbdEvent::Setup(self.on_setup(setup)))
        } else if ral::read_reg!(ral::usbd, self.usbd, EVENTS_USBEVENT) == 1 {
            ral::write_reg!(ral::usbd, self.usbd, EVENTS_USBEVENT, 0);
            let cause = ral::read_reg!(ral::usbd, self.usbd, EVENTCAUSE);
            debug!("USBEVENT EVENTCAUSE={=u32:#x}", cause);
            Some(UsbdEvent::UsbEvent { cause })
        } else if ral::read_reg!(ral::usbd, self.usbd, EVENTS_EPDATA) == 1 {
            ral::write_reg!(ral::usbd, self.usbd, EVENTS_EPDATA, 0);
            let status = ral::read_reg!(ral::usbd, self.usbd, EPDATASTATUS);
            debug!("EPDATA EPDATASTATUS={=u32:#x}", status);
            Some(UsbdEvent::EpData { status })
        } else {
            None
        };

        self.clear_usb_event();
        event
    }

    /// Acknowledge every pending bus event cause
    pub(crate) fn clear_usb_event(&mut self) {
        ral::modify_reg!(ral::usbd, self.usbd, EVENTCAUSE, |cause| cause);
        ral::write_reg!(ral::usbd, self.usbd, EVENTS_USBEVENT, 0);
    }
}
