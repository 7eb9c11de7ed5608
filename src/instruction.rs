use crate::error::ZError;
use crate::memory::Memory;
use crate::opcode_tables;
use crate::operand::{
    decode_operands, read_code_byte, OperandList, OperandType, VariableRef, MAX_OPERANDS,
};
use log::debug;
use std::fmt::{Display, Error, Formatter};

/// Instruction forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionForm {
    /// Opcode bytes 0x00-0x7F
    Long,
    /// Opcode bytes 0x80-0xBF
    Short,
    /// Opcode bytes 0xC0-0xFF, followed by an operand type byte
    Variable,
}

/// Operand count categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandCount {
    /// 0 operands
    OP0,
    /// 1 operand
    OP1,
    /// 2 operands
    OP2,
    /// Variable number of operands (0-4)
    VAR,
}

impl Display for OperandCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let text = match self {
            OperandCount::OP0 => "0OP",
            OperandCount::OP1 => "1OP",
            OperandCount::OP2 => "2OP",
            OperandCount::VAR => "VAR",
        };
        write!(f, "{}", text)
    }
}

/// Branch information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchInfo {
    /// True if branch on true, false if branch on false
    pub on_true: bool,
    /// Branch offset (0-1 = return false/true, otherwise a jump)
    pub offset: i16,
}

/// Where a taken branch goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchTarget {
    ReturnFalse,
    ReturnTrue,
    Jump(u32),
}

impl BranchInfo {
    pub fn target(&self, next_pc: u32) -> BranchTarget {
        match self.offset {
            0 => BranchTarget::ReturnFalse,
            1 => BranchTarget::ReturnTrue,
            n => BranchTarget::Jump((next_pc as i64 + n as i64 - 2) as u32),
        }
    }
}

/// A decoded Z-Machine instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Address of the opcode byte
    pub address: u32,
    /// The raw opcode byte
    pub opcode: u8,
    /// Opcode number within its operand-count table
    pub number: u8,
    /// The instruction form
    pub form: InstructionForm,
    /// Operand count category
    pub operand_count: OperandCount,
    /// Decoded operands, in order
    pub operands: OperandList,
    /// Variable to store result (if applicable)
    pub store_var: Option<u8>,
    /// Branch information (if applicable)
    pub branch: Option<BranchInfo>,
    /// Address of the byte after everything decoded so far
    pub next_pc: u32,
}

impl Instruction {
    /// Decode the opcode and operands at `addr`.
    ///
    /// Store and branch bytes are opcode specific and are read afterwards
    /// with [`Instruction::read_store`] and [`Instruction::read_branch`].
    pub fn decode(memory: &Memory, addr: usize) -> Result<Self, ZError> {
        let opcode_byte = read_code_byte(memory, addr, "opcode")?;
        let mut offset = addr + 1;

        // Determine instruction form based on top 2 bits
        let form = match opcode_byte >> 6 {
            0b11 => InstructionForm::Variable,
            0b10 => InstructionForm::Short,
            _ => InstructionForm::Long,
        };

        let (number, operand_count) = match form {
            // Long form: 2OP, opcode in bottom 5 bits
            InstructionForm::Long => (opcode_byte & 0x1F, OperandCount::OP2),
            // Short form: opcode in bottom 4 bits, bits 5-4 = 11 means no operand
            InstructionForm::Short => {
                let op_count = if (opcode_byte >> 4) & 0x03 == 0x03 {
                    OperandCount::OP0
                } else {
                    OperandCount::OP1
                };
                (opcode_byte & 0x0F, op_count)
            }
            // Variable form: bit 5 clear means a 2OP opcode in variable form
            InstructionForm::Variable => {
                let op_count = if opcode_byte & 0x20 == 0 {
                    OperandCount::OP2
                } else {
                    OperandCount::VAR
                };
                (opcode_byte & 0x1F, op_count)
            }
        };

        let mut operand_types = [OperandType::Omitted; MAX_OPERANDS];
        match form {
            InstructionForm::Long => {
                // Bits 6 and 5: 0 = small constant, 1 = variable
                operand_types[0] = if opcode_byte & 0x40 != 0 {
                    OperandType::Variable
                } else {
                    OperandType::SmallConstant
                };
                operand_types[1] = if opcode_byte & 0x20 != 0 {
                    OperandType::Variable
                } else {
                    OperandType::SmallConstant
                };
            }
            InstructionForm::Short => {
                if operand_count == OperandCount::OP1 {
                    operand_types[0] = OperandType::from_bits(opcode_byte >> 4);
                }
            }
            InstructionForm::Variable => {
                let type_byte = read_code_byte(memory, offset, "operand type byte")?;
                offset += 1;
                operand_types = OperandType::from_type_byte(type_byte);
            }
        }

        let (operands, end) = decode_operands(memory, offset, &operand_types)?;

        debug!(
            "decoded {:05x}: opcode {:02x} {:?} {}:{:02x}, {} operands",
            addr,
            opcode_byte,
            form,
            operand_count,
            number,
            operands.len()
        );

        Ok(Instruction {
            address: addr as u32,
            opcode: opcode_byte,
            number,
            form,
            operand_count,
            operands,
            store_var: None,
            branch: None,
            next_pc: end as u32,
        })
    }

    /// Consume the store-target byte that follows the operands.
    pub fn read_store(&mut self, memory: &Memory) -> Result<(), ZError> {
        let var = read_code_byte(memory, self.next_pc as usize, "store variable")?;
        self.store_var = Some(var);
        self.next_pc += 1;
        Ok(())
    }

    /// Consume the one- or two-byte branch descriptor.
    pub fn read_branch(&mut self, memory: &Memory) -> Result<(), ZError> {
        let first_byte = read_code_byte(memory, self.next_pc as usize, "branch offset")?;
        self.next_pc += 1;

        let on_true = (first_byte & 0x80) != 0;
        let offset = if (first_byte & 0x40) != 0 {
            // Short form: unsigned 6-bit offset
            (first_byte & 0x3F) as i16
        } else {
            // Long form: 14-bit signed offset
            let second_byte = read_code_byte(memory, self.next_pc as usize, "branch offset")?;
            self.next_pc += 1;
            let val = (((first_byte & 0x3F) as i16) << 8) | (second_byte as i16);
            if val & 0x2000 != 0 {
                val | (0xC000u16 as i16)
            } else {
                val
            }
        };

        self.branch = Some(BranchInfo { on_true, offset });
        Ok(())
    }

    /// Total size of the instruction in bytes
    pub fn size(&self) -> usize {
        (self.next_pc - self.address) as usize
    }

    /// The store target as a variable reference
    pub fn store_target(&self) -> Option<VariableRef> {
        self.store_var.map(VariableRef::from_number)
    }

    /// Get a human-readable name for the instruction
    pub fn name(&self) -> &'static str {
        opcode_tables::get_instruction_name(self.number, self.operand_count)
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.name())?;

        for (i, op) in self.operands.iter().enumerate() {
            if i == 0 {
                write!(f, " ")?;
            } else {
                write!(f, ", ")?;
            }
            write!(f, "{}", op)?;
        }

        if let Some(target) = self.store_target() {
            write!(f, " -> {}", target)?;
        }

        if let Some(ref branch) = self.branch {
            write!(
                f,
                " [{}{}]",
                if branch.on_true { "TRUE" } else { "FALSE" },
                match branch.offset {
                    0 => " RFALSE".to_string(),
                    1 => " RTRUE".to_string(),
                    n => format!(" {:+}", n),
                }
            )?;
        }

        Ok(())
    }
}
