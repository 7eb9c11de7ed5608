/// Arithmetic and bitwise opcodes
///
/// Arithmetic is signed 16-bit and wraps on overflow; bitwise operations
/// work on the raw word.
use crate::error::ZError;
use crate::instruction::Instruction;
use crate::interpreter::{ExecutionResult, Interpreter};
use log::debug;

impl Interpreter {
    /// 2OP:0x08 - or (bitwise OR)
    pub(crate) fn op_or(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        debug!("or {} {}", operands[0], operands[1]);
        self.store_result(inst, operands[0] | operands[1])?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x09 - and (bitwise AND)
    pub(crate) fn op_and(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        debug!("and {} {}", operands[0], operands[1]);
        self.store_result(inst, operands[0] & operands[1])?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x14 - add (signed addition)
    pub(crate) fn op_add(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        debug!("add {} {}", operands[0] as i16, operands[1] as i16);
        let result = (operands[0] as i16).wrapping_add(operands[1] as i16) as u16;
        self.store_result(inst, result)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x15 - sub (signed subtraction)
    pub(crate) fn op_sub(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        debug!("sub {} {}", operands[0] as i16, operands[1] as i16);
        let result = (operands[0] as i16).wrapping_sub(operands[1] as i16) as u16;
        self.store_result(inst, result)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x16 - mul (signed multiplication)
    pub(crate) fn op_mul(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        debug!("mul {} {}", operands[0] as i16, operands[1] as i16);
        let result = (operands[0] as i16).wrapping_mul(operands[1] as i16) as u16;
        self.store_result(inst, result)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x17 - div (signed division, truncating toward zero)
    pub(crate) fn op_div(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        debug!("div {} {}", operands[0] as i16, operands[1] as i16);
        if operands[1] == 0 {
            return Err(ZError::DivisionByZero);
        }
        let result = (operands[0] as i16).wrapping_div(operands[1] as i16) as u16;
        self.store_result(inst, result)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x18 - mod (signed remainder, sign of the dividend)
    pub(crate) fn op_mod(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        debug!("mod {} {}", operands[0] as i16, operands[1] as i16);
        if operands[1] == 0 {
            return Err(ZError::DivisionByZero);
        }
        let result = (operands[0] as i16).wrapping_rem(operands[1] as i16) as u16;
        self.store_result(inst, result)?;
        Ok(ExecutionResult::Continue)
    }
}
