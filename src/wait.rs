//! Busy-wait strategies
//!
//! Every hardware wait in the driver is a poll of some event register. The
//! driver calls [`Wait::relax`] once per failed poll, and keeps polling. There
//! is no timeout: if the hardware never signals, the caller never returns.

/// A strategy for the time between two polls
///
/// Any `FnMut()` closure is a `Wait`, so you can feed a watchdog, or count
/// polls, while the driver spins.
///
/// ```
/// use nrf_usbd_mouse::Wait;
///
/// let mut polls = 0u32;
/// let mut wait = || polls += 1;
/// wait.relax();
/// wait.relax();
/// assert_eq!(polls, 2);
/// ```
pub trait Wait {
    /// Called after a poll found the hardware not ready
    fn relax(&mut self);
}

/// Spin, hinting to the core that it's in a busy-wait loop
///
/// The default strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct Spin;

impl Wait for Spin {
    fn relax(&mut self) {
        core::hint::spin_loop();
    }
}

impl<F: FnMut()> Wait for F {
    fn relax(&mut self) {
        self()
    }
}

/// Poll `ready` until it returns `true`, relaxing between polls
pub(crate) fn wait_until<W: Wait>(wait: &mut W, mut ready: impl FnMut() -> bool) {
    while !ready() {
        wait.relax();
    }
}
