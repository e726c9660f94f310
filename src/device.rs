//! Interrupt-safe mouse

use core::cell::RefCell;
use cortex_m::interrupt::{self, Mutex};
use usb_device::UsbError;

use crate::{
    command::Action,
    driver::{Driver, UsbdEvent},
    mouse::Buttons,
    power::PowerEvent,
    wait::{Spin, Wait},
};

/// A mouse shared between interrupt handlers and your application
///
/// `UsbMouse` wraps a [`Driver`] in a critical-section mutex. Allocate it in a
/// `static`, install the driver once, then call
/// [`on_power_clock()`](UsbMouse::on_power_clock) and
/// [`on_usbd()`](UsbMouse::on_usbd) from the POWER_CLOCK and USBD interrupt
/// handlers.
///
/// The mouse methods wait for the host with interrupts enabled, so that
/// enumeration can make progress. The reports are sent in a critical section
/// that never waits on the host. If the host went away in between, the mouse
/// waits again.
///
/// ```no_run
/// use nrf_usbd_mouse::{Buttons, Config, DeviceState, Driver, Nrf52840, UsbMouse};
///
/// static STATE: DeviceState = DeviceState::new();
/// static MOUSE: UsbMouse = UsbMouse::new();
///
/// // Safety: nothing else uses the USBD, POWER and CLOCK peripherals.
/// let peripherals = unsafe { Nrf52840::new() };
/// MOUSE.install(Driver::new(peripherals, &STATE, Config::new()));
/// // Safety: the handlers call MOUSE.on_power_clock() and MOUSE.on_usbd().
/// unsafe { nrf_usbd_mouse::unmask_interrupts() };
///
/// MOUSE.mouse_move(10, 0).unwrap();
/// MOUSE.mouse_click(Buttons::LEFT).unwrap();
/// ```
pub struct UsbMouse<W = Spin> {
    driver: Mutex<RefCell<Option<Driver<W>>>>,
}

impl<W> UsbMouse<W> {
    pub const fn new() -> Self {
        UsbMouse {
            driver: Mutex::new(RefCell::new(None)),
        }
    }
}

impl<W: Wait> UsbMouse<W> {
    /// Initialize `driver`, then hand it to the interrupt handlers
    ///
    /// # Panics
    ///
    /// Panics if a driver is already installed.
    pub fn install(&self, mut driver: Driver<W>) {
        driver.initialize();
        interrupt::free(|cs| {
            let mut slot = self.driver.borrow(cs).borrow_mut();
            assert!(slot.is_none(), "Mouse driver already installed");
            *slot = Some(driver);
        });
    }

    /// Interrupt-safe, mutable access to the driver
    ///
    /// Returns `None` if there's no driver yet.
    fn with_driver_mut<R>(&self, func: impl FnOnce(&mut Driver<W>) -> R) -> Option<R> {
        interrupt::free(|cs| {
            let mut driver = self.driver.borrow(cs).borrow_mut();
            driver.as_mut().map(func)
        })
    }

    /// Call from the POWER_CLOCK interrupt handler
    pub fn on_power_clock(&self) -> Option<PowerEvent> {
        self.with_driver_mut(|driver| driver.on_power_clock_interrupt())
            .flatten()
    }

    /// Call from the USBD interrupt handler
    pub fn on_usbd(&self) -> Option<UsbdEvent> {
        self.with_driver_mut(|driver| driver.on_usbd_interrupt())
            .flatten()
    }

    /// Returns `true` once the host is listening for mouse reports
    pub fn is_ready(&self) -> bool {
        self.with_driver_mut(|driver| driver.is_ready())
            .unwrap_or(false)
    }

    /// Wait until the host is listening
    ///
    /// Each poll takes a short critical section, so interrupts run between
    /// polls.
    pub fn wait_ready(&self) {
        loop {
            let ready = self.with_driver_mut(|driver| {
                let ready = driver.is_ready();
                if !ready {
                    driver.wait.relax();
                }
                ready
            });
            match ready {
                Some(true) => break,
                Some(false) => {}
                None => core::hint::spin_loop(),
            }
        }
    }

    /// Wait for the host, then perform `action` in a critical section
    ///
    /// If the host went away after the wait, nothing is sent and the mouse
    /// waits again.
    fn when_ready(&self, action: Action) -> Result<(), UsbError> {
        retry_when_ready(
            || self.wait_ready(),
            || {
                self.with_driver_mut(|driver| driver.try_perform(action))
                    .unwrap_or(Err(UsbError::InvalidState))
            },
        )
    }

    pub fn mouse_move(&self, x: i8, y: i8) -> Result<(), UsbError> {
        self.when_ready(Action::Move { x, y })
    }

    pub fn mouse_scroll(&self, wheel: i8) -> Result<(), UsbError> {
        self.when_ready(Action::Scroll(wheel))
    }

    /// Press, then release, `buttons`
    pub fn mouse_click(&self, buttons: Buttons) -> Result<(), UsbError> {
        self.when_ready(Action::Click(buttons))
    }

    pub fn perform(&self, action: Action) -> Result<(), UsbError> {
        self.when_ready(action)
    }
}

/// Call `wait`, then `attempt`, until `attempt` stops reporting
/// [`UsbError::WouldBlock`]
fn retry_when_ready(
    mut wait: impl FnMut(),
    mut attempt: impl FnMut() -> Result<(), UsbError>,
) -> Result<(), UsbError> {
    loop {
        wait();
        match attempt() {
            Err(UsbError::WouldBlock) => continue,
            result => return result,
        }
    }
}

impl<W> Default for UsbMouse<W> {
    fn default() -> Self {
        Self::new()
    }
}
