//! Story images for the integration tests, built through the public API
//!
//! Same memory map as the crate's unit-test builder: globals at 0x0200,
//! static memory from 0x0800, code and initial pc at 0x1000.

#![allow(dead_code)]

use zcore::interpreter::Interpreter;
use zcore::memory::Memory;
use zcore::vm::{Game, VM};
use zcore::ZError;

pub struct StoryBuilder {
    version: u8,
    memory: Vec<u8>,
}

impl StoryBuilder {
    pub const SIZE: usize = 0x2000;
    pub const GLOBALS: usize = 0x0200;
    pub const STATIC_BASE: usize = 0x0800;
    pub const CODE: usize = 0x1000;

    pub fn new(version: u8) -> Self {
        let mut memory = vec![0u8; Self::SIZE];
        memory[0x00] = version;
        memory[0x12..0x18].copy_from_slice(b"000001");
        StoryBuilder { version, memory }
            .word(0x02, 1)
            .word(0x04, Self::CODE as u16)
            .word(0x06, Self::CODE as u16)
            .word(0x0C, Self::GLOBALS as u16)
            .word(0x0E, Self::STATIC_BASE as u16)
    }

    pub fn word(mut self, addr: usize, value: u16) -> Self {
        self.memory[addr..addr + 2].copy_from_slice(&value.to_be_bytes());
        self
    }

    pub fn code(mut self, bytes: &[u8]) -> Self {
        self.memory[Self::CODE..Self::CODE + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn global(self, index: u8, value: u16) -> Self {
        self.word(Self::GLOBALS + index as usize * 2, value)
    }

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
