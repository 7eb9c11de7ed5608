//! In-memory story images for tests
//!
//! `StoryBuilder` lays out a small story with a fixed memory map:
//!
//! ```text
//! 0x0000  header
//! 0x0100  free dynamic memory (arrays)
//! 0x0200  global variables
//! 0x0400  object table
//! 0x0600  property tables
//! 0x0800  static memory base
//! 0x1000  code, initial pc
//! 0x2000  end of file
//! ```

use crate::error::ZError;
use crate::interpreter::Interpreter;
use crate::memory::Memory;
use crate::vm::{Game, VM};

pub struct StoryBuilder {
    version: u8,
    memory: Vec<u8>,
    next_property_table: usize,
}

impl StoryBuilder {
    pub const SIZE: usize = 0x2000;
    pub const ARRAYS: usize = 0x0100;
    pub const GLOBALS: usize = 0x0200;
    pub const OBJECTS: usize = 0x0400;
    pub const PROPERTIES: usize = 0x0600;
    pub const STATIC_BASE: usize = 0x0800;
    pub const CODE: usize = 0x1000;

    pub fn new(version: u8) -> Self {
        let mut builder = StoryBuilder {
            version,
            memory: vec![0u8; Self::SIZE],
            next_property_table: Self::PROPERTIES,
        };
        builder.memory[0x00] = version;
        builder.memory[0x12..0x18].copy_from_slice(b"000001");
        builder
            .word(0x02, 1)
            .word(0x04, Self::CODE as u16)
            .word(0x06, Self::CODE as u16)
            .word(0x08, Self::STATIC_BASE as u16)
            .word(0x0A, Self::OBJECTS as u16)
            .word(0x0C, Self::GLOBALS as u16)
            .word(0x0E, Self::STATIC_BASE as u16)
    }

    pub fn byte(mut self, addr: usize, value: u8) -> Self {
        self.memory[addr] = value;
        self
    }

    pub fn word(mut self, addr: usize, value: u16) -> Self {
        self.memory[addr..addr + 2].copy_from_slice(&value.to_be_bytes());
        self
    }

    pub fn bytes(mut self, addr: usize, bytes: &[u8]) -> Self {
        self.memory[addr..addr + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Place code at the initial program counter
    pub fn code(self, bytes: &[u8]) -> Self {
        self.bytes(Self::CODE, bytes)
    }

    pub fn initial_pc(self, addr: u16) -> Self {
        self.word(0x06, addr)
    }

    pub fn static_base(self, addr: u16) -> Self {
        self.word(0x0E, addr)
    }

    pub fn global(self, index: u8, value: u16) -> Self {
        self.word(Self::GLOBALS + index as usize * 2, value)
    }

    /// Write a routine header (local count, and default values in V1-4)
    /// followed by its body.
    pub fn routine(mut self, addr: usize, locals: &[u16], body: &[u8]) -> Self {
        self.memory[addr] = locals.len() as u8;
        let mut offset = addr + 1;
        if self.version <= 4 {
            for &value in locals {
                self.memory[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
                offset += 2;
            }
        }
        self.bytes(offset, body)
    }

    /// Give `number` an object entry and a property table. Properties are
    /// listed in the order they are stored (descending by convention).
    pub fn object(mut self, number: u16, properties: &[(u8, &[u8])]) -> Self {
        let (defaults, entry_size, ptr_offset) = if self.version <= 3 {
            (31, 9, 7)
        } else {
            (63, 14, 12)
        };
        let entry = Self::OBJECTS + defaults * 2 + (number as usize - 1) * entry_size;
        let table = self.next_property_table;

        let mut bytes = vec![0u8]; // no short name
        for &(property, data) in properties {
            if self.version <= 3 {
                bytes.push((((data.len() - 1) as u8) << 5) | property);
            } else if data.len() == 1 {
                bytes.push(property);
            } else if data.len() == 2 {
                bytes.push(0x40 | property);
            } else {
                bytes.push(0x80 | property);
                bytes.push(0x80 | data.len() as u8);
            }
            bytes.extend_from_slice(data);
        }
        bytes.push(0);

        self.next_property_table += bytes.len();
        self.word(entry + ptr_offset, table as u16).bytes(table, &bytes)
    }

    /// Finish the image: file length and checksum are filled in last.
    pub fn build(mut self) -> Vec<u8> {
        let scale = match self.version {
            1..=3 => 2,
            4..=5 => 4,
            _ => 8,
        };
        let length_words = (Self::SIZE / scale) as u16;
        self.memory[0x1A..0x1C].copy_from_slice(&length_words.to_be_bytes());
        let checksum = Memory::new(self.memory.clone(), 0).checksum(Self::SIZE);
        self.memory[0x1C..0x1E].copy_from_slice(&checksum.to_be_bytes());
        self.memory
    }

    pub fn game(self) -> Result<Game, ZError> {
        Game::from_memory(self.build())
    }

    pub fn interpreter(self) -> Result<Interpreter, ZError> {
        Ok(Interpreter::new(VM::new(self.game()?)))
    }
}
