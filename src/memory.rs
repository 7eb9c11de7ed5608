//! Byte-addressable story memory
//!
//! Reads are allowed anywhere inside the image. Writes are limited to dynamic
//! memory: everything from the static memory base upward belongs to the
//! story file and is rejected.

use crate::error::ZError;
use crate::header::HEADER_SIZE;

/// Offset of the static memory base word in the header.
const STATIC_BASE_OFFSET: usize = 0x0E;

/// Checksummed bytes start after the 64-byte header.
const CHECKSUM_START: usize = 0x40;

#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
    static_base: usize,
}

impl Memory {
    /// Wrap raw bytes with an explicit static memory base.
    pub fn new(bytes: Vec<u8>, static_base: usize) -> Memory {
        Memory { bytes, static_base }
    }

    /// Wrap a loaded story file, taking the static memory base from its header.
    pub fn from_story(bytes: Vec<u8>) -> Result<Memory, ZError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ZError::TruncatedFile {
                what: "header",
                needed: HEADER_SIZE,
                len: bytes.len(),
            });
        }
        let static_base = ((bytes[STATIC_BASE_OFFSET] as usize) << 8)
            | bytes[STATIC_BASE_OFFSET + 1] as usize;
        Ok(Memory::new(bytes, static_base))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn static_base(&self) -> usize {
        self.static_base
    }

    /// Size of the writable region.
    pub fn dynamic_len(&self) -> usize {
        self.static_base.min(self.bytes.len())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn read_byte(&self, addr: usize) -> Result<u8, ZError> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(ZError::OutOfBounds {
                addr,
                len: self.bytes.len(),
            })
    }

    /// Read a big-endian word: high byte at `addr`, low byte at `addr + 1`.
    pub fn read_word(&self, addr: usize) -> Result<u16, ZError> {
        let high = self.read_byte(addr)? as u16;
        let low = self.read_byte(addr + 1)? as u16;
        Ok((high << 8) | low)
    }

    pub fn write_byte(&mut self, addr: usize, value: u8) -> Result<(), ZError> {
        self.check_writable(addr)?;
        self.bytes[addr] = value;
        Ok(())
    }

    pub fn write_word(&mut self, addr: usize, value: u16) -> Result<(), ZError> {
        // Validate both bytes before touching either
        self.check_writable(addr)?;
        self.check_writable(addr + 1)?;
        self.bytes[addr] = (value >> 8) as u8;
        self.bytes[addr + 1] = (value & 0xFF) as u8;
        Ok(())
    }

    /// The six serial bytes taken as characters, unvalidated.
    pub fn read_serial(&self, addr: usize) -> Result<String, ZError> {
        let mut serial = String::with_capacity(6);
        for offset in 0..6 {
            serial.push(self.read_byte(addr + offset)? as char);
        }
        Ok(serial)
    }

    /// Sum of every byte from 0x40 up to `file_len`, modulo 0x10000.
    ///
    /// `file_len` is clamped to the image so a header that overstates the
    /// file length still yields a value.
    pub fn checksum(&self, file_len: usize) -> u16 {
        let end = file_len.min(self.bytes.len());
        if end <= CHECKSUM_START {
            return 0;
        }
        self.bytes[CHECKSUM_START..end]
            .iter()
            .fold(0u16, |sum, &b| sum.wrapping_add(b as u16))
    }

    fn check_writable(&self, addr: usize) -> Result<(), ZError> {
        if addr >= self.bytes.len() {
            return Err(ZError::OutOfBounds {
                addr,
                len: self.bytes.len(),
            });
        }
        if addr >= self.static_base {
            return Err(ZError::ReadOnlyViolation {
                addr,
                static_base: self.static_base,
            });
        }
        Ok(())
    }
}
