use core::sync::atomic::{AtomicBool, Ordering};

use crate::buffer::Buffer;

/// Driver state shared between interrupt and thread context
///
/// Each driver needs a `DeviceState`. Allocate a `static` object and supply it
/// to the driver constructor. A state can only be bound to one driver;
/// otherwise, the driver constructor panics.
///
/// ```
/// use nrf_usbd_mouse::DeviceState;
///
/// static STATE: DeviceState = DeviceState::new();
/// assert!(!STATE.is_ready());
/// ```
pub struct DeviceState {
    /// Staging buffer for endpoint 0 IN
    control: Buffer,
    /// Staging buffer for endpoint 1 IN
    report: Buffer,
    /// Set once the host fetched the HID report descriptor
    ready: AtomicBool,
    taken: AtomicBool,
}

// Safety: the buffers are only touched by the driver that took the state,
// and the flags are atomics.
unsafe impl Sync for DeviceState {}

impl DeviceState {
    pub const fn new() -> Self {
        Self {
            control: Buffer::new(),
            report: Buffer::new(),
            ready: AtomicBool::new(false),
            taken: AtomicBool::new(false),
        }
    }

    /// Returns `true` once the host is listening for mouse reports
    ///
    /// This becomes `true` after the host fetches the HID report descriptor.
    /// It's `false` again after a detach, or after a new attach.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub(crate) fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Claim the state for one driver
    ///
    /// Returns `false` if it was already claimed.
    pub(crate) fn take(&self) -> bool {
        !self.taken.swap(true, Ordering::SeqCst)
    }

    /// The staging buffer for an IN endpoint, if the driver supports it
    pub(crate) fn buffer(&self, endpoint: usize) -> Option<&Buffer> {
        match endpoint {
            0 => Some(&self.control),
            1 => Some(&self.report),
            _ => None,
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}
