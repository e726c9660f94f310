//! Register access layer for the nRF52840 USB peripherals
//!
//! The register blocks follow the `ral-registers` conventions, so the usual
//! `read_reg!`, `write_reg!` and `modify_reg!` macros work on them. Only the
//! registers and fields that the driver touches are spelled out; everything
//! else is reserved padding. Offsets are checked at compile time.
//!
//! Endpoint-indexed registers are arrays in hardware. The RAL macros need a
//! named register, so [`endpoint_in`] remaps one IN endpoint's registers into
//! a small view.

#![allow(non_snake_case, non_upper_case_globals, dead_code)]

pub use ral_registers::{modify_reg, read_reg, write_reg, RORegister, RWRegister, WORegister};

use core::ops::Deref;

/// Declares RAL field modules: `NAME: offset, width;`
macro_rules! fields {
    ($($field:ident: $offset:expr, $width:expr;)*) => {
        $(
            pub mod $field {
                pub const offset: u32 = $offset;
                pub const mask: u32 = ((1 << $width) - 1) << offset;
                pub mod R {}
                pub mod W {}
                pub mod RW {}
            }
        )*
    };
}

/// A pointer to a register block
///
/// Dereferences to the register block. Construction is `unsafe`, since the
/// caller vouches for the address.
pub struct Instance<RB> {
    ptr: *const RB,
}

impl<RB> Instance<RB> {
    /// # Safety
    ///
    /// `ptr` must point to a register block (or to memory shaped like one) that
    /// lives as long as the instance. Only one `Instance` should exist for each
    /// block.
    pub const unsafe fn new(ptr: *const RB) -> Self {
        Instance { ptr }
    }
}

impl<RB> Deref for Instance<RB> {
    type Target = RB;
    fn deref(&self) -> &RB {
        // Safety: upheld by the caller of new().
        unsafe { &*self.ptr }
    }
}

// Safety: an Instance is a unique handle to its block. Moving it to another
// execution context is fine; sharing is managed by the owner.
unsafe impl<RB> Send for Instance<RB> {}

/// USB device controller
pub mod usbd {
    use super::{RORegister, RWRegister, WORegister};

    /// Number of (non-isochronous) endpoints in each direction
    pub const ENDPOINTS: usize = 8;

    /// One IN endpoint's EasyDMA channel
    #[repr(C)]
    pub struct EpIn {
        pub PTR: RWRegister<u32>,
        pub MAXCNT: RWRegister<u32>,
        pub AMOUNT: RORegister<u32>,
        _reserved: [u32; 2],
    }

    #[repr(C)]
    pub struct RegisterBlock {
        _reserved0: [u32; 1],
        pub TASKS_STARTEPIN: [WORegister<u32>; ENDPOINTS],
        pub TASKS_STARTISOIN: WORegister<u32>,
        pub TASKS_STARTEPOUT: [WORegister<u32>; ENDPOINTS],
        pub TASKS_STARTISOOUT: WORegister<u32>,
        pub TASKS_EP0RCVOUT: WORegister<u32>,
        pub TASKS_EP0STATUS: WORegister<u32>,
        pub TASKS_EP0STALL: WORegister<u32>,
        pub TASKS_DPDMDRIVE: WORegister<u32>,
        pub TASKS_DPDMNODRIVE: WORegister<u32>,
        _reserved1: [u32; 40],
        pub EVENTS_USBRESET: RWRegister<u32>,
        pub EVENTS_STARTED: RWRegister<u32>,
        pub EVENTS_ENDEPIN: [RWRegister<u32>; ENDPOINTS],
        pub EVENTS_EP0DATADONE: RWRegister<u32>,
        pub EVENTS_ENDISOIN: RWRegister<u32>,
        pub EVENTS_ENDEPOUT: [RWRegister<u32>; ENDPOINTS],
        pub EVENTS_ENDISOOUT: RWRegister<u32>,
        pub EVENTS_SOF: RWRegister<u32>,
        pub EVENTS_USBEVENT: RWRegister<u32>,
        pub EVENTS_EP0SETUP: RWRegister<u32>,
        pub EVENTS_EPDATA: RWRegister<u32>,
        _reserved2: [u32; 39],
        pub SHORTS: RWRegister<u32>,
        _reserved3: [u32; 63],
        pub INTEN: RWRegister<u32>,
        pub INTENSET: RWRegister<u32>,
        pub INTENCLR: RWRegister<u32>,
        _reserved4: [u32; 61],
        pub EVENTCAUSE: RWRegister<u32>,
        _reserved5: [u32; 7],
        pub HALTED_EPIN: [RORegister<u32>; ENDPOINTS],
        _reserved6: [u32; 1],
        pub HALTED_EPOUT: [RORegister<u32>; ENDPOINTS],
        _reserved7: [u32; 1],
        pub EPSTATUS: RWRegister<u32>,
        pub EPDATASTATUS: RWRegister<u32>,
        pub USBADDR: RORegister<u32>,
        _reserved8: [u32; 3],
        pub BMREQUESTTYPE: RORegister<u32>,
        pub BREQUEST: RORegister<u32>,
        pub WVALUEL: RORegister<u32>,
        pub WVALUEH: RORegister<u32>,
        pub WINDEXL: RORegister<u32>,
        pub WINDEXH: RORegister<u32>,
        pub WLENGTHL: RORegister<u32>,
        pub WLENGTHH: RORegister<u32>,
        pub SIZE_EPOUT: [RWRegister<u32>; ENDPOINTS],
        pub SIZE_ISOOUT: RORegister<u32>,
        _reserved9: [u32; 15],
        pub ENABLE: RWRegister<u32>,
        pub USBPULLUP: RWRegister<u32>,
        pub DPDMVALUE: RWRegister<u32>,
        pub DTOGGLE: RWRegister<u32>,
        pub EPINEN: RWRegister<u32>,
        pub EPOUTEN: RWRegister<u32>,
        pub EPSTALL: WORegister<u32>,
        pub ISOSPLIT: RWRegister<u32>,
        pub FRAMECNTR: RORegister<u32>,
        _reserved10: [u32; 2],
        pub LOWPOWER: RWRegister<u32>,
        pub ISOINCONFIG: RWRegister<u32>,
        _reserved11: [u32; 51],
        pub EPIN: [EpIn; ENDPOINTS],
        _reserved12: [u32; 351],
        /// Undocumented. Blocks task triggers while EasyDMA owns the bus
        /// (nRF52840 errata 199).
        pub DMAGUARD: RWRegister<u32>,
    }

    /// Value written to `DMAGUARD` for the duration of a transfer
    pub const DMAGUARD_ACTIVE: u32 = 0x82;

    pub type Instance = super::Instance<RegisterBlock>;

    pub mod INTENSET {
        fields! {
            USBRESET: 0, 1;
            STARTED: 1, 1;
            EP0DATADONE: 10, 1;
            SOF: 21, 1;
            USBEVENT: 22, 1;
            EP0SETUP: 23, 1;
            EPDATA: 24, 1;
        }
    }

    pub mod EVENTCAUSE {
        fields! {
            ISOOUTCRC: 0, 1;
            SUSPEND: 8, 1;
            RESUME: 9, 1;
            USBWUALLOWED: 10, 1;
            READY: 11, 1;
        }
    }

    pub mod EPDATASTATUS {
        fields! {
            EPIN1: 1, 1;
        }
    }

    pub mod EPINEN {
        fields! {
            IN0: 0, 1;
            IN1: 1, 1;
        }
    }

    pub mod ENABLE {
        fields! {
            ENABLE: 0, 1;
        }
    }

    pub mod USBPULLUP {
        fields! {
            CONNECT: 0, 1;
        }
    }

    pub mod USBADDR {
        fields! {
            ADDR: 0, 7;
        }
    }

    use core::mem::offset_of;
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, TASKS_EP0STATUS) == 0x050) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EVENTS_USBRESET) == 0x100) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EVENTS_EP0DATADONE) == 0x128) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EVENTS_USBEVENT) == 0x158) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EVENTS_EPDATA) == 0x160) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, SHORTS) == 0x200) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, INTENSET) == 0x304) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EVENTCAUSE) == 0x400) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EPDATASTATUS) == 0x46C) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, BMREQUESTTYPE) == 0x480) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, WLENGTHH) == 0x49C) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, ENABLE) == 0x500) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EPINEN) == 0x510) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, LOWPOWER) == 0x52C) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EPIN) == 0x600) as usize];
    const _: [(); 1] = [(); (core::mem::size_of::<EpIn>() == 0x14) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, DMAGUARD) == 0xC1C) as usize];
}

/// POWER and CLOCK
///
/// The two peripherals share a base address and an interrupt, so they're
/// described as one block.
pub mod power {
    use super::{RORegister, RWRegister, WORegister};

    #[repr(C)]
    pub struct RegisterBlock {
        pub TASKS_HFCLKSTART: WORegister<u32>,
        pub TASKS_HFCLKSTOP: WORegister<u32>,
        pub TASKS_LFCLKSTART: WORegister<u32>,
        pub TASKS_LFCLKSTOP: WORegister<u32>,
        pub TASKS_CAL: WORegister<u32>,
        pub TASKS_CTSTART: WORegister<u32>,
        pub TASKS_CTSTOP: WORegister<u32>,
        _reserved0: [u32; 57],
        pub EVENTS_HFCLKSTARTED: RWRegister<u32>,
        pub EVENTS_LFCLKSTARTED: RWRegister<u32>,
        _reserved1: [u32; 5],
        pub EVENTS_USBDETECTED: RWRegister<u32>,
        pub EVENTS_USBREMOVED: RWRegister<u32>,
        pub EVENTS_USBPWRRDY: RWRegister<u32>,
        _reserved2: [u32; 119],
        pub INTENSET: RWRegister<u32>,
        pub INTENCLR: RWRegister<u32>,
        _reserved3: [u32; 64],
        pub HFCLKSTAT: RORegister<u32>,
        _reserved4: [u32; 10],
        pub USBREGSTATUS: RORegister<u32>,
    }

    pub type Instance = super::Instance<RegisterBlock>;

    pub mod INTENSET {
        fields! {
            HFCLKSTARTED: 0, 1;
            LFCLKSTARTED: 1, 1;
            USBDETECTED: 7, 1;
            USBREMOVED: 8, 1;
            USBPWRRDY: 9, 1;
        }
    }

    pub mod USBREGSTATUS {
        fields! {
            VBUSDETECT: 0, 1;
            OUTPUTRDY: 1, 1;
        }
    }

    use core::mem::offset_of;
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EVENTS_HFCLKSTARTED) == 0x100) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EVENTS_USBDETECTED) == 0x11C) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, EVENTS_USBPWRRDY) == 0x124) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, INTENSET) == 0x304) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, HFCLKSTAT) == 0x40C) as usize];
    const _: [(); 1] = [(); (offset_of!(RegisterBlock, USBREGSTATUS) == 0x438) as usize];
}

/// Undocumented registers named by the nRF52840 errata sheet
pub mod errata {
    use super::RWRegister;

    #[repr(C)]
    pub struct RegisterBlock {
        /// Write [`UNLOCK`] around every access to the other registers
        pub ACCESS: RWRegister<u32>,
        _reserved0: [u32; 4],
        pub REG014: RWRegister<u32>,
        _reserved1: [u32; 63],
        /// Errata 187: USBD cannot be enabled
        pub REG114: RWRegister<u32>,
    }

    pub const UNLOCK: u32 = 0x0000_9375;

    /// `REG114` payload while the USBD is being enabled
    pub const USBD_ENABLING: u32 = 0x0000_0003;
    /// `REG114` payload once the USBD reports ready
    pub const USBD_ENABLED: u32 = 0x0000_0000;

    pub type Instance = super::Instance<RegisterBlock>;

    const _: [(); 1] = [(); (core::mem::offset_of!(RegisterBlock, REG114) == 0x114) as usize];
}

/// The RAL macros need a named register, but the IN endpoint registers are
/// arrays. [`register`](endpoint_in::register) collects one endpoint's registers
/// into an `EpInRegisters` view that the macros accept.
pub mod endpoint_in {
    use super::{usbd, RORegister, RWRegister, WORegister};

    pub struct EpInRegisters<'a> {
        pub PTR: &'a RWRegister<u32>,
        pub MAXCNT: &'a RWRegister<u32>,
        pub AMOUNT: &'a RORegister<u32>,
        pub TASKS_STARTEPIN: &'a WORegister<u32>,
        pub EVENTS_ENDEPIN: &'a RWRegister<u32>,
    }

    pub fn register(usbd: &usbd::RegisterBlock, endpoint: usize) -> EpInRegisters<'_> {
        assert!(
            endpoint < usbd::ENDPOINTS,
            "EPIN{} registers don't exist",
            endpoint
        );
        let epin = &usbd.EPIN[endpoint];
        EpInRegisters {
            PTR: &epin.PTR,
            MAXCNT: &epin.MAXCNT,
            AMOUNT: &epin.AMOUNT,
            TASKS_STARTEPIN: &usbd.TASKS_STARTEPIN[endpoint],
            EVENTS_ENDEPIN: &usbd.EVENTS_ENDEPIN[endpoint],
        }
    }
}

/// The peripheral instances used by the driver
pub struct Instances {
    pub usbd: usbd::Instance,
    pub power: power::Instance,
    pub errata: errata::Instance,
}

/// Convert the user's peripherals into register instances
pub fn instances<P: crate::Peripherals>(peripherals: P) -> Instances {
    // Safety: the Peripherals implementation guarantees that these addresses
    // describe the register blocks, and that it owns them.
    unsafe {
        Instances {
            usbd: usbd::Instance::new(peripherals.usbd().cast()),
            power: power::Instance::new(peripherals.power_clock().cast()),
            errata: errata::Instance::new(peripherals.errata().cast()),
        }
    }
}
