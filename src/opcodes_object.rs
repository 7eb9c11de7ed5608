/// Object opcodes
///
/// Only `put_prop` runs in this core. The object walk itself belongs to the
/// interpreter's [`PropertyTable`](crate::object::PropertyTable).
use crate::error::ZError;
use crate::instruction::Instruction;
use crate::interpreter::{ExecutionResult, Interpreter};
use log::debug;

impl Interpreter {
    /// VAR:0x03 - put_prop object property value
    pub(crate) fn op_put_prop(
        &mut self,
        _inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let object = operands[0];
        let property = operands[1] as u8;
        let value = operands[2];
        debug!("put_prop {} {} {}", object, property, value);
        self.put_property(object, property, value)?;
        Ok(ExecutionResult::Continue)
    }
}
