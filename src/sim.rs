//! Simulated USB peripherals
//!
//! The register blocks are plain memory. The simulation advances whenever the
//! driver relaxes in a wait, the way the hardware would advance while the CPU
//! spins: started tasks produce their events, and IN packets are captured from
//! the endpoint buffers. Reads through [`Sim::events()`] advance it too.
//!
//! Write-one-to-clear registers keep whatever the driver wrote. The simulation
//! clears `EVENTCAUSE` when it arms a new attach.

use std::{cell::RefCell, rc::Rc};

use crate::{
    driver::{Driver, UsbdEvent},
    power::PowerEvent,
    setup::Request,
    state::DeviceState,
    vcell::VCell,
    wait::Wait,
    Config, Peripherals,
};

mod usbd {
    pub const TASKS_EP0STATUS: usize = 0x050;
    pub const EVENTS_EP0DATADONE: usize = 0x128;
    pub const EVENTS_USBEVENT: usize = 0x158;
    pub const EVENTS_EP0SETUP: usize = 0x15C;
    pub const EVENTCAUSE: usize = 0x400;
    pub const EVENTCAUSE_READY: u32 = 1 << 11;
    pub const EPDATASTATUS: usize = 0x46C;
    pub const BMREQUESTTYPE: usize = 0x480;
    pub const ENABLE: usize = 0x500;
    pub const DMAGUARD: usize = 0xC1C;
    pub const SIZE: usize = 0xC20;

    pub const fn tasks_startepin(endpoint: usize) -> usize {
        0x004 + 4 * endpoint
    }
    pub const fn events_endepin(endpoint: usize) -> usize {
        0x108 + 4 * endpoint
    }
    pub const fn epin(endpoint: usize) -> usize {
        0x600 + 0x14 * endpoint
    }
    pub const MAXCNT: usize = 0x4;
    pub const AMOUNT: usize = 0x8;
}

mod power {
    pub const TASKS_HFCLKSTART: usize = 0x000;
    pub const EVENTS_HFCLKSTARTED: usize = 0x100;
    pub const EVENTS_USBDETECTED: usize = 0x11C;
    pub const EVENTS_USBPWRRDY: usize = 0x124;
    pub const SIZE: usize = 0x43C;
}

mod errata {
    pub const REG114: usize = 0x114;
    pub const SIZE: usize = 0x118;
}

/// Something the host saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An IN packet, with the bytes the USBD took from the buffer
    Packet {
        endpoint: usize,
        data: Vec<u8>,
        /// The errata 199 guard was set while the packet moved
        guarded: bool,
    },
    /// A control transfer STATUS stage
    Status,
}

/// A register block's worth of memory, leaked for the test
#[derive(Clone, Copy)]
struct Block(&'static [VCell<u32>]);

impl Block {
    fn new(size: usize) -> Self {
        let words: Vec<VCell<u32>> = (0..size / 4).map(|_| VCell::new(0)).collect();
        Block(Box::leak(words.into_boxed_slice()))
    }
    fn read(&self, offset: usize) -> u32 {
        self.0[offset / 4].read()
    }
    fn write(&self, offset: usize, value: u32) {
        self.0[offset / 4].write(value)
    }
    fn ptr(&self) -> *const () {
        self.0.as_ptr().cast()
    }
}

pub struct SimPeripherals {
    usbd: *const (),
    power: *const (),
    errata: *const (),
}

unsafe impl Peripherals for SimPeripherals {
    fn usbd(&self) -> *const () {
        self.usbd
    }
    fn power_clock(&self) -> *const () {
        self.power
    }
    fn errata(&self) -> *const () {
        self.errata
    }
}

#[derive(Default)]
struct Model {
    events: Vec<Event>,
    relaxed: usize,
    /// An attach is armed; the USBD becomes ready once it's enabled
    enabling: bool,
    errata_while_enabling: Option<u32>,
    ready_while_enabling: Option<bool>,
    ready_at_first_packet: Option<bool>,
    amount_limit: Option<usize>,
    ready_at_relax: Option<usize>,
}

/// The simulated hardware, and the driver's [`Wait`]
///
/// Clones share the same hardware.
#[derive(Clone)]
pub struct Sim {
    usbd: Block,
    power: Block,
    errata: Block,
    state: &'static DeviceState,
    model: Rc<RefCell<Model>>,
}

impl Sim {
    pub fn new() -> Self {
        Sim {
            usbd: Block::new(usbd::SIZE),
            power: Block::new(power::SIZE),
            errata: Block::new(errata::SIZE),
            state: Box::leak(Box::new(DeviceState::new())),
            model: Rc::default(),
        }
    }

    pub fn peripherals(&self) -> SimPeripherals {
        SimPeripherals {
            usbd: self.usbd.ptr(),
            power: self.power.ptr(),
            errata: self.errata.ptr(),
        }
    }

    pub fn state(&self) -> &'static DeviceState {
        self.state
    }

    /// A driver on this hardware, with default configuration
    pub fn driver(&self) -> Driver<Sim> {
        Driver::with_wait(self.peripherals(), self.state, Config::new(), self.clone())
    }

    pub fn usbd(&self, offset: usize) -> u32 {
        self.usbd.read(offset)
    }
    pub fn set_usbd(&self, offset: usize, value: u32) {
        self.usbd.write(offset, value)
    }
    pub fn power(&self, offset: usize) -> u32 {
        self.power.read(offset)
    }
    pub fn set_power(&self, offset: usize, value: u32) {
        self.power.write(offset, value)
    }
    pub fn errata(&self, offset: usize) -> u32 {
        self.errata.read(offset)
    }

    /// USB power appears
    pub fn detect(&self) {
        let mut model = self.model.borrow_mut();
        model.enabling = true;
        model.errata_while_enabling = None;
        model.ready_while_enabling = None;
        self.usbd.write(usbd::EVENTCAUSE, 0);
        self.power.write(power::EVENTS_USBDETECTED, 1);
    }

    /// USB power appears, and the driver handles it
    pub fn attach<W: Wait>(&self, driver: &mut Driver<W>) {
        self.detect();
        assert_eq!(
            driver.on_power_clock_interrupt(),
            Some(PowerEvent::Detected)
        );
    }

    /// The host sends a SETUP packet
    pub fn setup(&self, raw: [u8; 8]) {
        for (idx, byte) in raw.iter().enumerate() {
            self.usbd.write(usbd::BMREQUESTTYPE + 4 * idx, *byte as u32);
        }
        self.usbd.write(usbd::EVENTS_EP0SETUP, 1);
    }

    /// The host sends a SETUP packet, and the driver handles it
    pub fn request<W: Wait>(&self, driver: &mut Driver<W>, raw: [u8; 8]) -> Request {
        self.setup(raw);
        match driver.on_usbd_interrupt() {
            Some(UsbdEvent::Setup(request)) => request,
            other => panic!("expected a SETUP, got {:?}", other),
        }
    }

    /// The host enumerates the mouse, ending with the report descriptor
    pub fn enumerate<W: Wait>(&self, driver: &mut Driver<W>) {
        self.request(driver, [0x80, 0x06, 0x00, 0x01, 0, 0, 0x40, 0]);
        self.request(driver, [0x00, 0x05, 0x07, 0x00, 0, 0, 0, 0]);
        self.request(driver, [0x80, 0x06, 0x00, 0x01, 0, 0, 0x12, 0]);
        self.request(driver, [0x80, 0x06, 0x00, 0x02, 0, 0, 0x09, 0]);
        self.request(driver, [0x80, 0x06, 0x00, 0x02, 0, 0, 0xFF, 0]);
        self.request(driver, [0x80, 0x06, 0x03, 0x03, 0x09, 0x04, 0xFF, 0]);
        self.request(driver, [0x00, 0x09, 0x01, 0x00, 0, 0, 0, 0]);
        self.request(driver, [0x21, 0x0A, 0x00, 0x00, 0, 0, 0, 0]);
        self.request(driver, [0x81, 0x06, 0x00, 0x22, 0, 0, 0x74, 0]);
    }

    /// Everything the host saw so far
    pub fn events(&self) -> Vec<Event> {
        self.tick();
        self.model.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.tick();
        self.model.borrow_mut().events.clear();
    }

    /// How many times the driver relaxed
    pub fn relaxed(&self) -> usize {
        self.model.borrow().relaxed
    }

    /// The host fetched the report descriptor, as far as the driver knows
    pub fn make_ready(&self) {
        self.state.set_ready(true);
    }

    /// Become ready after the driver relaxes `relaxes` more times
    pub fn ready_after(&self, relaxes: usize) {
        let mut model = self.model.borrow_mut();
        model.ready_at_relax = Some(model.relaxed + relaxes);
    }

    /// The USBD takes at most `amount` bytes of each packet
    pub fn limit_amount(&self, amount: usize) {
        self.model.borrow_mut().amount_limit = Some(amount);
    }

    /// `REG114` when the USBD became ready, during the last attach
    pub fn errata_while_enabling(&self) -> Option<u32> {
        self.model.borrow().errata_while_enabling
    }

    /// Readiness when the USBD became ready, during the last attach
    pub fn ready_while_enabling(&self) -> Option<bool> {
        self.model.borrow().ready_while_enabling
    }

    /// Readiness when the first packet moved
    pub fn ready_at_first_packet(&self) -> Option<bool> {
        self.model.borrow().ready_at_first_packet
    }

    /// The address the DMA engine should see for an endpoint's buffer
    pub fn buffer_address(&self, endpoint: usize) -> u32 {
        self.state
            .buffer(endpoint)
            .map(|buffer| buffer.as_ptr() as u32)
            .unwrap_or_default()
    }

    fn tick(&self) {
        let mut model = self.model.borrow_mut();

        if model.enabling && self.usbd.read(usbd::ENABLE) == 1 {
            model.enabling = false;
            model.errata_while_enabling = Some(self.errata.read(errata::REG114));
            model.ready_while_enabling = Some(self.state.is_ready());
            self.usbd.write(usbd::EVENTS_USBEVENT, 1);
            let cause = self.usbd.read(usbd::EVENTCAUSE);
            self.usbd
                .write(usbd::EVENTCAUSE, cause | usbd::EVENTCAUSE_READY);
            self.power.write(power::EVENTS_USBPWRRDY, 1);
        }

        if self.power.read(power::TASKS_HFCLKSTART) == 1 {
            self.power.write(power::TASKS_HFCLKSTART, 0);
            self.power.write(power::EVENTS_HFCLKSTARTED, 1);
        }

        for endpoint in 0..8 {
            if self.usbd.read(usbd::tasks_startepin(endpoint)) != 1 {
                continue;
            }
            self.usbd.write(usbd::tasks_startepin(endpoint), 0);

            let epin = usbd::epin(endpoint);
            let maxcnt = self.usbd.read(epin + usbd::MAXCNT) as usize;
            let amount = model.amount_limit.map_or(maxcnt, |limit| limit.min(maxcnt));
            let mut data = vec![0; amount];
            if let Some(buffer) = self.state.buffer(endpoint) {
                buffer.volatile_read(&mut data);
            }
            self.usbd.write(epin + usbd::AMOUNT, amount as u32);

            if model.ready_at_first_packet.is_none() {
                model.ready_at_first_packet = Some(self.state.is_ready());
            }
            model.events.push(Event::Packet {
                endpoint,
                data,
                guarded: self.usbd.read(usbd::DMAGUARD) == 0x82,
            });

            self.usbd.write(usbd::events_endepin(endpoint), 1);
            if endpoint == 0 {
                self.usbd.write(usbd::EVENTS_EP0DATADONE, 1);
            } else {
                let status = self.usbd.read(usbd::EPDATASTATUS);
                self.usbd.write(usbd::EPDATASTATUS, status | (1 << endpoint));
            }
        }

        if self.usbd.read(usbd::TASKS_EP0STATUS) == 1 {
            self.usbd.write(usbd::TASKS_EP0STATUS, 0);
            model.events.push(Event::Status);
        }
    }
}

impl Wait for Sim {
    fn relax(&mut self) {
        {
            let mut model = self.model.borrow_mut();
            model.relaxed += 1;
            if model.ready_at_relax == Some(model.relaxed) {
                model.ready_at_relax = None;
                self.state.set_ready(true);
            }
        }
        self.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::{usbd, Event, Sim};
    use crate::wait::Wait;

    #[test]
    fn started_task_produces_events() {
        let mut sim = Sim::new();
        sim.set_usbd(usbd::epin(1) + usbd::MAXCNT, 4);
        sim.set_usbd(usbd::tasks_startepin(1), 1);
        sim.relax();

        assert_eq!(sim.usbd(usbd::tasks_startepin(1)), 0);
        assert_eq!(sim.usbd(usbd::events_endepin(1)), 1);
        assert_eq!(sim.usbd(usbd::EPDATASTATUS), 1 << 1);
        assert_eq!(sim.usbd(usbd::epin(1) + usbd::AMOUNT), 4);
        assert_eq!(
            sim.events(),
            [Event::Packet {
                endpoint: 1,
                data: vec![0; 4],
                guarded: false
            }]
        );
    }

    #[test]
    fn ready_after_counts_relaxes() {
        let mut sim = Sim::new();
        sim.ready_after(2);
        sim.relax();
        assert!(!sim.state().is_ready());
        sim.relax();
        assert!(sim.state().is_ready());
        assert_eq!(sim.relaxed(), 2);
    }

    #[test]
    fn status_is_observed_without_a_relax() {
        let sim = Sim::new();
        sim.set_usbd(usbd::TASKS_EP0STATUS, 1);
        assert_eq!(sim.events(), [Event::Status]);
        assert_eq!(sim.usbd(usbd::TASKS_EP0STATUS), 0);
    }
}
