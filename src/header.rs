use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use crate::error::ZError;
use crate::memory::Memory;

/// The 17 reserved header words a story file must contain.
pub const HEADER_SIZE: usize = 17 * 2;

pub struct Header {
    pub version: u8,
    pub flags: u8,
    pub release: u16,
    pub base_high_mem: u16,
    pub initial_pc: u16,
    pub dictionary: u16,
    pub object_table_addr: u16,
    pub global_variables: u16,
    pub base_static_mem: u16,
    pub flags2: u16,
    pub serial: String,
    pub abbrev_table: u16,
    /// File length as stored, in words.
    pub len_file_words: u16,
    pub checksum_file: u16,
}

impl Header {
    pub fn parse(memory: &Memory) -> Result<Header, ZError> {
        if memory.len() < HEADER_SIZE {
            return Err(ZError::TruncatedFile {
                what: "header",
                needed: HEADER_SIZE,
                len: memory.len(),
            });
        }

        Ok(Header {
            version: memory.read_byte(0x00)?,
            flags: memory.read_byte(0x01)?,
            release: memory.read_word(0x02)?,
            base_high_mem: memory.read_word(0x04)?,
            initial_pc: memory.read_word(0x06)?,
            dictionary: memory.read_word(0x08)?,
            object_table_addr: memory.read_word(0x0A)?,
            global_variables: memory.read_word(0x0C)?,
            base_static_mem: memory.read_word(0x0E)?,
            flags2: memory.read_word(0x10)?,
            serial: memory.read_serial(0x12)?,
            abbrev_table: memory.read_word(0x18)?,
            len_file_words: memory.read_word(0x1A)?,
            checksum_file: memory.read_word(0x1C)?,
        })
    }

    /// File length in bytes: the stored word count doubled.
    pub fn len_file(&self) -> usize {
        self.len_file_words as usize * 2
    }

    /// File length scaled the way later versions store it (x4 for V4-5,
    /// x8 for V6+). Used for the checksum and the header dump.
    pub fn file_size(&self) -> usize {
        let scale = match self.version {
            1..=3 => 2,
            4..=5 => 4,
            _ => 8,
        };
        self.len_file_words as usize * scale
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "
Z-code version:           {}
Interpreter flags:        {:#04x}
Release number:           {}
Size of resident memory:  {:#06x}
Start PC:                 {:#06x}
Dictionary address:       {:#06x}
Object table address:     {:#06x}
Global variables address: {:#06x}
Size of dynamic memory:   {:#06x}
Game flags:               {:#06x}
Serial number:            {}
Abbreviations address:    {:#06x}
File size:                {:#06x}
Checksum:                 {:#06x}
",
            self.version,
            self.flags,
            self.release,
            self.base_high_mem,
            self.initial_pc,
            self.dictionary,
            self.object_table_addr,
            self.global_variables,
            self.base_static_mem,
            self.flags2,
            self.serial,
            self.abbrev_table,
            self.file_size(),
            self.checksum_file,
        )
    }
}
