//! Operand addressing modes and operand decoding
//!
//! Operands arrive as a sequence of type tags (from the opcode byte or from
//! a separate type byte) followed by the operand bytes themselves. Decoding
//! only turns bytes into tagged operands; variable operands are resolved
//! against the call stack later, at execution time.

use crate::error::ZError;
use crate::memory::Memory;
use std::fmt::{Display, Formatter};

/// At most four operands fit in a single type byte.
pub const MAX_OPERANDS: usize = 4;

/// Operand types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// Large constant (2 bytes)
    LargeConstant,
    /// Small constant (1 byte)
    SmallConstant,
    /// Variable number
    Variable,
    /// Omitted (not present)
    Omitted,
}

impl OperandType {
    /// Parse operand type from 2-bit value
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => OperandType::LargeConstant,
            0b01 => OperandType::SmallConstant,
            0b10 => OperandType::Variable,
            _ => OperandType::Omitted,
        }
    }

    /// Get the size in bytes for this operand type
    pub fn size(&self) -> usize {
        match self {
            OperandType::LargeConstant => 2,
            OperandType::SmallConstant => 1,
            OperandType::Variable => 1,
            OperandType::Omitted => 0,
        }
    }

    /// The four slots of a variable-form type byte, most significant pair first.
    pub fn from_type_byte(type_byte: u8) -> [OperandType; MAX_OPERANDS] {
        [
            OperandType::from_bits(type_byte >> 6),
            OperandType::from_bits(type_byte >> 4),
            OperandType::from_bits(type_byte >> 2),
            OperandType::from_bits(type_byte),
        ]
    }
}

/// Where a variable number points: 0 is the evaluation stack, 1-15 the
/// current routine's locals, 16-255 the global table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableRef {
    Stack,
    /// Zero-based local slot (variable number minus 1)
    Local(u8),
    /// Zero-based global index (variable number minus 16)
    Global(u8),
}

impl VariableRef {
    pub fn from_number(var: u8) -> Self {
        match var {
            0x00 => VariableRef::Stack,
            0x01..=0x0F => VariableRef::Local(var - 1),
            _ => VariableRef::Global(var - 0x10),
        }
    }

    pub fn number(&self) -> u8 {
        match *self {
            VariableRef::Stack => 0,
            VariableRef::Local(slot) => slot + 1,
            VariableRef::Global(index) => index + 0x10,
        }
    }
}

impl Display for VariableRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableRef::Stack => write!(f, "sp"),
            VariableRef::Local(slot) => write!(f, "L{:02x}", slot),
            VariableRef::Global(index) => write!(f, "G{:02x}", index),
        }
    }
}

/// A decoded operand, tagged with its addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    LargeConstant(u16),
    SmallConstant(u8),
    Variable(VariableRef),
}

impl Operand {
    pub fn operand_type(&self) -> OperandType {
        match self {
            Operand::LargeConstant(_) => OperandType::LargeConstant,
            Operand::SmallConstant(_) => OperandType::SmallConstant,
            Operand::Variable(_) => OperandType::Variable,
        }
    }

    /// The operand as encoded: the constant, or the variable number.
    pub fn raw(&self) -> u16 {
        match *self {
            Operand::LargeConstant(value) => value,
            Operand::SmallConstant(value) => value as u16,
            Operand::Variable(var) => var.number() as u16,
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::LargeConstant(value) => write!(f, "#{:04x}", value),
            Operand::SmallConstant(value) => write!(f, "#{:02x}", value),
            Operand::Variable(var) => write!(f, "{}", var),
        }
    }
}

/// Fixed-capacity operand storage; an instruction never has more than four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandList {
    items: [Operand; MAX_OPERANDS],
    len: usize,
}

impl OperandList {
    pub fn new() -> Self {
        OperandList {
            items: [Operand::SmallConstant(0); MAX_OPERANDS],
            len: 0,
        }
    }

    fn push(&mut self, operand: Operand) {
        debug_assert!(self.len < MAX_OPERANDS);
        self.items[self.len] = operand;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<&Operand> {
        self.as_slice().get(index)
    }

    pub fn as_slice(&self) -> &[Operand] {
        &self.items[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operand> {
        self.as_slice().iter()
    }
}

impl Default for OperandList {
    fn default() -> Self {
        OperandList::new()
    }
}

/// Read one byte of an instruction; running off the image means the story
/// file is truncated.
pub(crate) fn read_code_byte(
    memory: &Memory,
    addr: usize,
    what: &'static str,
) -> Result<u8, ZError> {
    memory.read_byte(addr).map_err(|_| ZError::TruncatedFile {
        what,
        needed: addr + 1,
        len: memory.len(),
    })
}

/// Consume operand bytes at `pc` in the order the tags are given, stopping
/// at the first `Omitted` tag. Returns the operands and the address of the
/// first byte after them.
pub fn decode_operands(
    memory: &Memory,
    pc: usize,
    types: &[OperandType],
) -> Result<(OperandList, usize), ZError> {
    let mut operands = OperandList::new();
    let mut offset = pc;

    for op_type in types.iter().take(MAX_OPERANDS) {
        match op_type {
            OperandType::LargeConstant => {
                let high = read_code_byte(memory, offset, "large constant")? as u16;
                let low = read_code_byte(memory, offset + 1, "large constant")? as u16;
                operands.push(Operand::LargeConstant((high << 8) | low));
            }
            OperandType::SmallConstant => {
                let value = read_code_byte(memory, offset, "small constant")?;
                operands.push(Operand::SmallConstant(value));
            }
            OperandType::Variable => {
                let var = read_code_byte(memory, offset, "variable operand")?;
                operands.push(Operand::Variable(VariableRef::from_number(var)));
            }
            OperandType::Omitted => break,
        }
        offset += op_type.size();
    }

    Ok((operands, offset))
}
