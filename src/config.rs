//! Device configuration

/// Values that identify the mouse to the host
///
/// The defaults match the identity that the descriptors have always carried.
/// Use struct update syntax to change a few fields:
///
/// ```
/// use nrf_usbd_mouse::Config;
///
/// const CONFIG: Config = Config {
///     product_id: 0x2002,
///     ..Config::new()
/// };
/// assert_eq!(CONFIG.vendor_id, 0x0F62);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// `idVendor` in the device descriptor
    pub vendor_id: u16,
    /// `idProduct` in the device descriptor
    pub product_id: u16,
    /// `bcdDevice` in the device descriptor
    pub device_release: u16,
    /// `bInterval` of the report endpoint, in milliseconds
    pub poll_interval_ms: u8,
}

impl Config {
    pub const fn new() -> Self {
        Config {
            vendor_id: 0x0F62,
            product_id: 0x1001,
            device_release: 0x0001,
            poll_interval_ms: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
