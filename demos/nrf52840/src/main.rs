//! Demonstrate the mouse on an nRF52840.
//!
//! Flash your board with this example, then connect its USB port to a host.
//! Once the host enumerates the mouse, the pointer walks a small square,
//! scrolls, and clicks. The walk is a scripted list of keys that feeds a
//! command buffer, the same way a serial console would.
//!
//! Logs go out over RTT.

#![no_std]
#![no_main]

use defmt_rtt as _;
use panic_probe as _;

use nrf52840_pac::{self as pac, interrupt};
use nrf_usbd_mouse::{CommandBuffer, Config, DeviceState, Driver, Nrf52840, UsbMouse};

/// Keys, as if typed on a console
const SCRIPT: &[u8] = b"d\nd\ns\ns\na\na\nw\nw\nt\ng\nq\ne\n";
/// About 100ms at 64MHz
const KEY_PERIOD_CYCLES: u32 = 6_400_000;

static STATE: DeviceState = DeviceState::new();
static MOUSE: UsbMouse = UsbMouse::new();

/// Owns the PAC peripherals that the driver touches
struct Usb {
    _usbd: pac::USBD,
    _power: pac::POWER,
    _clock: pac::CLOCK,
}

unsafe impl nrf_usbd_mouse::Peripherals for Usb {
    fn usbd(&self) -> *const () {
        pac::USBD::ptr() as *const ()
    }
    fn power_clock(&self) -> *const () {
        pac::POWER::ptr() as *const ()
    }
    fn errata(&self) -> *const () {
        Nrf52840::ERRATA as *const ()
    }
}

#[cortex_m_rt::entry]
fn main() -> ! {
    let pac = pac::Peripherals::take().unwrap();
    let usb = Usb {
        _usbd: pac.USBD,
        _power: pac.POWER,
        _clock: pac.CLOCK,
    };

    MOUSE.install(Driver::new(usb, &STATE, Config::new()));
    // Safety: both handlers are defined below.
    unsafe { nrf_usbd_mouse::unmask_interrupts() };

    defmt::info!("Waiting for the host");
    MOUSE.wait_ready();
    defmt::info!("Host is listening");

    let mut commands = CommandBuffer::new();
    let mut keys = SCRIPT.iter().copied().cycle();
    loop {
        if let Some(key) = keys.next() {
            commands.push(key);
        }
        if let Some(command) = commands.take() {
            defmt::debug!("Command '{=u8}'", command.key());
            if let Err(err) = MOUSE.perform(command.action()) {
                defmt::warn!("Mouse error: {}", err);
            }
        }
        cortex_m::asm::delay(KEY_PERIOD_CYCLES);
    }
}

#[interrupt]
fn POWER_CLOCK() {
    MOUSE.on_power_clock();
}

#[interrupt]
fn USBD() {
    MOUSE.on_usbd();
}
