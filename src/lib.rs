//! A USB HID mouse for the nRF52840
//!
//! `nrf-usbd-mouse` drives the nRF52840 USBD peripheral directly. The device
//! enumerates as a boot-protocol mouse with one interrupt IN endpoint, and
//! sends move, scroll and click reports to the host.
//!
//! The [`Driver`] does the work. It brings up the USBD when USB power appears,
//! answers the host's control requests, and sends reports once the host fetches
//! the HID report descriptor. [`UsbMouse`] shares a driver between the
//! interrupt handlers and your application.
//!
//! To interface the library, you must define a safe implementation of
//! [`Peripherals`], or use [`Nrf52840`]. See the peripherals documentation for
//! more information.
//!
//! # Waiting
//!
//! The driver busy-waits on the hardware: while it brings up the USBD, while a
//! packet is in flight, and while the host has yet to enumerate the mouse.
//! There are no timeouts. Supply a [`Wait`] implementation to decide what
//! happens between polls.
//!
//! # Logging
//!
//! Enable the `defmt-03` feature to log through `defmt`. Only enable logging
//! when you're certain that your logger isn't using USB!

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "defmt-03")]
extern crate defmt_03 as defmt;

#[macro_use]
mod log;

mod buffer;
mod command;
mod config;
mod control;
mod descriptor;
mod device;
mod driver;
mod mouse;
mod power;
mod ral;
mod setup;
mod state;
mod transfer;
mod vcell;
mod wait;

#[cfg(test)]
mod sim;

pub use buffer::MAX_PACKET_SIZE;
pub use command::{Action, Command, CommandBuffer};
pub use config::Config;
pub use descriptor::{
    ConfigurationDescriptor, DeviceDescriptor, EndpointDescriptor, HidDescriptor,
    InterfaceDescriptor, MouseConfiguration, HID_REPORT_DESCRIPTOR, REPORT_ENDPOINT,
};
pub use device::UsbMouse;
pub use driver::{Driver, UsbdEvent};
pub use mouse::{Buttons, Report};
pub use power::{PowerEvent, PowerState};
pub use setup::{DescriptorKind, Request, Setup};
pub use state::DeviceState;
pub use wait::{Spin, Wait};

/// A type that owns the USB register blocks
///
/// An implementation of `Peripherals` is expected to own
///
/// - the USBD registers
/// - the POWER and CLOCK registers, which share one block
/// - the undocumented register block used by errata workarounds
///
/// # Safety
///
/// `Peripherals` should only be implemented on a type that owns the various
/// register blocks required for USB operation. The pointers returned by the
/// methods are assumed to be valid, and will be cast to register definitions.
///
/// # Example
///
/// A safe implementation of `Peripherals` that works with the `nrf52840-pac`
/// crate. Assume that `pac` is shorthand for `nrf52840_pac`.
///
/// ```
/// # mod pac {
/// #   pub struct USBD; impl USBD { pub const PTR: *const () = 0x4002_7000 as _; }
/// #   pub struct POWER; impl POWER { pub const PTR: *const () = 0x4000_0000 as _; }
/// #   pub struct Peripherals { pub USBD: USBD, pub POWER: POWER }
/// #   impl Peripherals { pub fn take() -> Option<Self> { Some(Peripherals { USBD, POWER }) } }
/// # }
/// use nrf_usbd_mouse::Peripherals;
///
/// struct Usb {
///     _usbd: pac::USBD,
///     _power: pac::POWER,
/// }
///
/// unsafe impl Peripherals for Usb {
///     fn usbd(&self) -> *const () {
///         pac::USBD::PTR
///     }
///     fn power_clock(&self) -> *const () {
///         pac::POWER::PTR
///     }
///     fn errata(&self) -> *const () {
///         0x4006_EC00 as *const ()
///     }
/// }
///
/// let pac = pac::Peripherals::take().unwrap();
/// let usb = Usb {
///     _usbd: pac.USBD,
///     _power: pac.POWER,
/// };
/// assert_eq!(usb.usbd(), 0x4002_7000 as *const ());
/// ```
pub unsafe trait Peripherals {
    /// Returns the address of the USBD registers
    fn usbd(&self) -> *const ();
    /// Returns the address of the POWER registers, which are also the CLOCK
    /// registers
    fn power_clock(&self) -> *const ();
    /// Returns the address of the errata workaround registers
    fn errata(&self) -> *const ();
}

/// The nRF52840 USB peripherals, at their fixed addresses
pub struct Nrf52840 {
    _private: (),
}

impl Nrf52840 {
    pub const USBD: usize = 0x4002_7000;
    pub const POWER_CLOCK: usize = 0x4000_0000;
    pub const ERRATA: usize = 0x4006_EC00;

    /// # Safety
    ///
    /// Nothing else may use the USBD, POWER or CLOCK peripherals, and there may
    /// only be one `Nrf52840` at a time.
    pub const unsafe fn new() -> Self {
        Nrf52840 { _private: () }
    }
}

unsafe impl Peripherals for Nrf52840 {
    fn usbd(&self) -> *const () {
        Self::USBD as *const ()
    }
    fn power_clock(&self) -> *const () {
        Self::POWER_CLOCK as *const ()
    }
    fn errata(&self) -> *const () {
        Self::ERRATA as *const ()
    }
}

/// The interrupts that drive the mouse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
#[repr(u16)]
pub enum Interrupt {
    POWER_CLOCK = 0,
    USBD = 39,
}

// Safety: the numbers match the nRF52840 vector table.
unsafe impl cortex_m::interrupt::InterruptNumber for Interrupt {
    fn number(self) -> u16 {
        self as u16
    }
}

/// Unmask the POWER_CLOCK and USBD interrupts in the NVIC
///
/// # Safety
///
/// This may break mask-based critical sections. Make sure that the handlers
/// are in place before you call this.
pub unsafe fn unmask_interrupts() {
    cortex_m::peripheral::NVIC::unmask(Interrupt::POWER_CLOCK);
    cortex_m::peripheral::NVIC::unmask(Interrupt::USBD);
}
