//! Endpoint DMA buffers
//!
//! EasyDMA can only read from RAM. Every payload, including the descriptors
//! that live in flash, is staged in one of these before a transfer.

#![allow(clippy::declare_interior_mutable_const)]

use crate::vcell::VCell;

/// Largest packet the driver moves on any endpoint
pub const MAX_PACKET_SIZE: usize = 64;

/// One packet's worth of DMA-visible memory
#[repr(C, align(4))]
pub struct Buffer([VCell<u8>; MAX_PACKET_SIZE]);

impl Buffer {
    pub const fn new() -> Self {
        const BYTE: VCell<u8> = VCell::new(0);
        Buffer([BYTE; MAX_PACKET_SIZE])
    }

    /// Copy `data` to the front of the buffer
    ///
    /// Returns how many bytes were copied, at most [`MAX_PACKET_SIZE`].
    pub fn volatile_write(&self, data: &[u8]) -> usize {
        let mut written = 0;
        for (cell, byte) in self.0.iter().zip(data) {
            cell.write(*byte);
            written += 1;
        }
        written
    }

    /// Copy the front of the buffer into `out`
    ///
    /// Returns how many bytes were copied.
    #[cfg(test)]
    pub fn volatile_read(&self, out: &mut [u8]) -> usize {
        let mut read = 0;
        for (byte, cell) in out.iter_mut().zip(self.0.iter()) {
            *byte = cell.read();
            read += 1;
        }
        read
    }

    /// The address handed to the DMA engine
    pub fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr().cast()
    }
}

#[cfg(test)]
mod test {
    use super::{Buffer, MAX_PACKET_SIZE};

    #[test]
    fn write_then_read() {
        let buffer = Buffer::new();
        assert_eq!(buffer.volatile_write(&[1, 2, 3]), 3);

        let mut out = [0xFF; 4];
        assert_eq!(buffer.volatile_read(&mut out), 4);
        assert_eq!(out, [1, 2, 3, 0]);
    }

    #[test]
    fn write_is_limited_to_one_packet() {
        let buffer = Buffer::new();
        let data = [0xA5; MAX_PACKET_SIZE + 10];
        assert_eq!(buffer.volatile_write(&data), MAX_PACKET_SIZE);
    }

    #[test]
    fn word_aligned() {
        let buffer = Buffer::new();
        assert_eq!(buffer.as_ptr() as usize % 4, 0);
    }
}
