/// Memory and variable opcodes
///
/// - Variable operations (load, store, push, pull)
/// - Word operations (loadw, storew) at `array + 2*index`
/// - Byte operations (loadb, storeb) at `array + index`
///
/// `store`, `load` and `pull` name their variable by number. Variable 0 in
/// that position is the top of the stack, read or replaced in place.
use crate::error::ZError;
use crate::instruction::Instruction;
use crate::interpreter::{ExecutionResult, Interpreter};
use crate::operand::VariableRef;
use log::debug;

impl Interpreter {
    /// 2OP:0x0D - store (variable) value
    pub(crate) fn op_store(
        &mut self,
        _inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let target = VariableRef::from_number(operands[0] as u8);
        debug!("store: {} := {}", target, operands[1]);
        self.store_variable_indirect(target, operands[1])?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x0F - loadw array word-index -> (result)
    pub(crate) fn op_loadw(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let addr = operands[0] as usize + 2 * operands[1] as usize;
        let value = self.vm.read_word(addr)?;
        debug!("loadw: [{:04x}] = {:04x}", addr, value);
        self.store_result(inst, value)?;
        Ok(ExecutionResult::Continue)
    }

    /// 2OP:0x10 - loadb array byte-index -> (result)
    pub(crate) fn op_loadb(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let addr = operands[0] as usize + operands[1] as usize;
        let value = self.vm.read_byte(addr)? as u16;
        debug!("loadb: [{:04x}] = {:02x}", addr, value);
        self.store_result(inst, value)?;
        Ok(ExecutionResult::Continue)
    }

    /// 1OP:0x0E - load (variable) -> (result)
    pub(crate) fn op_load(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let source = VariableRef::from_number(operands[0] as u8);
        let value = self.vm.read_variable_indirect(source)?;
        debug!("load: {} = {}", source, value);
        self.store_result(inst, value)?;
        Ok(ExecutionResult::Continue)
    }

    /// VAR:0x01 - storew array word-index value
    pub(crate) fn op_storew(
        &mut self,
        _inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let addr = operands[0] as usize + 2 * operands[1] as usize;
        debug!("storew: [{:04x}] := {:04x}", addr, operands[2]);
        self.vm.write_word(addr, operands[2])?;
        Ok(ExecutionResult::Continue)
    }

    /// VAR:0x02 - storeb array byte-index value
    pub(crate) fn op_storeb(
        &mut self,
        _inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let addr = operands[0] as usize + operands[1] as usize;
        debug!("storeb: [{:04x}] := {:02x}", addr, operands[2] as u8);
        self.vm.write_byte(addr, operands[2] as u8)?;
        Ok(ExecutionResult::Continue)
    }

    /// VAR:0x08 - push value
    pub(crate) fn op_push(
        &mut self,
        _inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        debug!("push {}", operands[0]);
        self.vm.push(operands[0])?;
        Ok(ExecutionResult::Continue)
    }

    /// VAR:0x09 - pull (variable)
    pub(crate) fn op_pull(
        &mut self,
        _inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let target = VariableRef::from_number(operands[0] as u8);
        let value = self.vm.pop()?;
        debug!("pull: {} := {}", target, value);
        self.store_variable_indirect(target, value)?;
        Ok(ExecutionResult::Continue)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ZError;
    use crate::interpreter::RunOutcome;
    use crate::test_utils::StoryBuilder;
    use test_log::test;

    #[test]
    fn test_storew_then_loadw() {
        // storew 0x0100 3 42; loadw 0x0100 3 -> G01; quit
        let mut interp = StoryBuilder::new(3)
            .code(&[
                0xE1, 0x17, 0x01, 0x00, 0x03, 0x2A, // storew
                0xCF, 0x1F, 0x01, 0x00, 0x03, 0x11, // loadw -> G01
                0xBA,
            ])
            .interpreter()
            .unwrap();
        assert_eq!(interp.run(), Ok(RunOutcome::Quit { instructions: 3 }));
        assert_eq!(interp.vm.read_word(0x0106), Ok(42));
        assert_eq!(interp.vm.read_global(1), Ok(42));
    }

    #[test]
    fn test_storeb_then_loadb() {
        // storeb 0x0100 5 0x1FF; loadb 0x0100 5 -> G00
        let mut interp = StoryBuilder::new(3)
            .code(&[
                0xE2, 0x13, 0x01, 0x00, 0x05, 0x01, 0xFF, // storeb
                0xD0, 0x1F, 0x01, 0x00, 0x05, 0x10, // loadb -> G00
                0xBA,
            ])
            .interpreter()
            .unwrap();
        interp.run().unwrap();
        assert_eq!(interp.vm.read_byte(0x0105), Ok(0xFF));
        assert_eq!(interp.vm.read_global(0), Ok(0xFF));
    }

    #[test]
    fn test_storew_into_static_memory_is_rejected() {
        // storew 0x0800 0 1
        let mut interp = StoryBuilder::new(3)
            .code(&[0xE1, 0x17, 0x08, 0x00, 0x00, 0x01])
            .interpreter()
            .unwrap();
        let err = interp.run().unwrap_err();
        assert_eq!(
            err.source,
            ZError::ReadOnlyViolation {
                addr: 0x0800,
                static_base: 0x0800
            }
        );
        assert_eq!(err.pc, StoryBuilder::CODE as u32);
    }

    #[test]
    fn test_store_and_load_by_variable_number() {
        // store G05 77; load G05 -> sp; quit
        let mut interp = StoryBuilder::new(3)
            .code(&[0x0D, 0x15, 0x4D, 0x9E, 0x15, 0x00, 0xBA])
            .interpreter()
            .unwrap();
        interp.run().unwrap();
        assert_eq!(interp.vm.read_global(5), Ok(77));
        assert_eq!(interp.vm.call_stack.current().stack(), &[77]);
    }

    #[test]
    fn test_store_to_stack_replaces_top() {
        // push 1; push 2; store sp 9; quit
        let mut interp = StoryBuilder::new(3)
            .code(&[0xE8, 0x7F, 0x01, 0xE8, 0x7F, 0x02, 0x0D, 0x00, 0x09, 0xBA])
            .interpreter()
            .unwrap();
        interp.run().unwrap();
        assert_eq!(interp.vm.call_stack.current().stack(), &[1, 9]);
    }

    #[test]
    fn test_push_and_pull() {
        // push 300; pull G02; pull G03 (empty)
        let mut interp = StoryBuilder::new(3)
            .code(&[0xE8, 0x3F, 0x01, 0x2C, 0xE9, 0x7F, 0x12, 0xE9, 0x7F, 0x13])
            .interpreter()
            .unwrap();
        let err = interp.run().unwrap_err();
        assert_eq!(interp.vm.read_global(2), Ok(300));
        assert_eq!(err.source, ZError::StackUnderflow);
        assert_eq!(err.instructions, 2);
    }
}
