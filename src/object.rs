//! Property writes for `put_prop`
//!
//! The object tree is a collaborator of the core: the dispatcher only needs
//! something that can overwrite a property value. [`StandardPropertyTable`]
//! does that by walking the object table laid out by the standard; an
//! embedder with its own object model can supply another implementation.

use crate::error::ZError;
use crate::header::Header;
use crate::memory::Memory;
use log::debug;

pub trait PropertyTable: Send {
    /// Overwrite `property` of `object` with `value`.
    fn put_property(
        &self,
        memory: &mut Memory,
        object: u16,
        property: u8,
        value: u16,
    ) -> Result<(), ZError>;
}

/// Object table walker for every story version.
pub struct StandardPropertyTable {
    version: u8,
    object_table_addr: usize,
}

impl StandardPropertyTable {
    pub fn new(version: u8, object_table_addr: usize) -> Self {
        StandardPropertyTable {
            version,
            object_table_addr,
        }
    }

    pub fn for_header(header: &Header) -> Self {
        StandardPropertyTable::new(header.version, header.object_table_addr as usize)
    }

    fn max_objects(&self) -> u16 {
        if self.version <= 3 {
            255
        } else {
            65535
        }
    }

    fn default_props(&self) -> usize {
        if self.version <= 3 {
            31
        } else {
            63
        }
    }

    fn entry_size(&self) -> usize {
        if self.version <= 3 {
            9
        } else {
            14
        }
    }

    /// Address of the object's entry in the object tree
    pub fn object_addr(&self, object: u16) -> Result<usize, ZError> {
        if object == 0 || object > self.max_objects() {
            return Err(ZError::InvalidObject { object });
        }
        let tree_base = self.object_table_addr + self.default_props() * 2;
        Ok(tree_base + (object as usize - 1) * self.entry_size())
    }

    /// Parse the size byte(s) at `addr`: (property number, data size, header size)
    fn property_info(&self, memory: &Memory, addr: usize) -> Result<(u8, usize, usize), ZError> {
        let size_byte = memory.read_byte(addr)?;

        if self.version <= 3 {
            // Number in bits 0-4, size - 1 in bits 5-7
            let number = size_byte & 0x1F;
            let size = ((size_byte >> 5) & 0x07) as usize + 1;
            Ok((number, size, 1))
        } else {
            let number = size_byte & 0x3F;
            if size_byte & 0x80 != 0 {
                // Second byte holds the size; 0 means 64
                let size_val = (memory.read_byte(addr + 1)? & 0x3F) as usize;
                let size = if size_val == 0 { 64 } else { size_val };
                Ok((number, size, 2))
            } else if size_byte & 0x40 != 0 {
                Ok((number, 2, 1))
            } else {
                Ok((number, 1, 1))
            }
        }
    }

    /// Locate a property's data: (data address, data size)
    pub fn find_property(
        &self,
        memory: &Memory,
        object: u16,
        property: u8,
    ) -> Result<(usize, usize), ZError> {
        let obj_addr = self.object_addr(object)?;
        let prop_ptr_offset = if self.version <= 3 { 7 } else { 12 };
        let prop_table_addr = memory.read_word(obj_addr + prop_ptr_offset)? as usize;

        // Skip the short name: a length byte counted in words
        let name_len = memory.read_byte(prop_table_addr)? as usize;
        let mut prop_addr = prop_table_addr + 1 + name_len * 2;

        loop {
            if memory.read_byte(prop_addr)? == 0 {
                return Err(ZError::PropertyNotFound { object, property });
            }
            let (number, size, header_len) = self.property_info(memory, prop_addr)?;
            if number == property {
                return Ok((prop_addr + header_len, size));
            }
            prop_addr += header_len + size;
        }
    }
}

impl PropertyTable for StandardPropertyTable {
    fn put_property(
        &self,
        memory: &mut Memory,
        object: u16,
        property: u8,
        value: u16,
    ) -> Result<(), ZError> {
        let (data_addr, size) = self.find_property(memory, object, property)?;
        debug!(
            "put_prop: object {} property {} at {:#06x} (size {}) := {:#06x}",
            object, property, data_addr, size, value
        );
        match size {
            1 => memory.write_byte(data_addr, value as u8),
            2 => memory.write_word(data_addr, value),
            _ => Err(ZError::PropertyTooLarge {
                object,
                property,
                size,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StoryBuilder;
    use crate::vm::Game;

    fn game() -> Game {
        let story = StoryBuilder::new(3)
            .object(
                1,
                &[
                    (18, &[0x00, 0x10][..]),
                    (7, &[0x05][..]),
                    (3, &[1, 2, 3, 4][..]),
                ],
            )
            .object(2, &[(18, &[0xAB, 0xCD][..])])
            .build();
        Game::from_memory(story).unwrap()
    }

    #[test]
    fn test_put_property_word_and_byte() {
        let mut game = game();
        let table = StandardPropertyTable::for_header(&game.header);

        table.put_property(&mut game.memory, 1, 18, 0xBEEF).unwrap();
        table.put_property(&mut game.memory, 1, 7, 0x1234).unwrap();

        let (addr, size) = table.find_property(&game.memory, 1, 18).unwrap();
        assert_eq!(size, 2);
        assert_eq!(game.memory.read_word(addr).unwrap(), 0xBEEF);

        // Byte properties keep only the low byte
        let (addr, size) = table.find_property(&game.memory, 1, 7).unwrap();
        assert_eq!(size, 1);
        assert_eq!(game.memory.read_byte(addr).unwrap(), 0x34);

        // Object 2 is untouched
        let (addr, _) = table.find_property(&game.memory, 2, 18).unwrap();
        assert_eq!(game.memory.read_word(addr).unwrap(), 0xABCD);
    }

    #[test]
    fn test_put_property_errors() {
        let mut game = game();
        let table = StandardPropertyTable::for_header(&game.header);

        assert_eq!(
            table.put_property(&mut game.memory, 1, 9, 0),
            Err(ZError::PropertyNotFound {
                object: 1,
                property: 9
            })
        );
        assert_eq!(
            table.put_property(&mut game.memory, 1, 3, 0),
            Err(ZError::PropertyTooLarge {
                object: 1,
                property: 3,
                size: 4
            })
        );
        assert_eq!(
            table.put_property(&mut game.memory, 0, 18, 0),
            Err(ZError::InvalidObject { object: 0 })
        );
        assert_eq!(
            table.put_property(&mut game.memory, 256, 18, 0),
            Err(ZError::InvalidObject { object: 256 })
        );
    }
}
