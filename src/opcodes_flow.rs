/// Control flow opcodes: comparisons that branch, jumps, calls and returns
use crate::error::ZError;
use crate::instruction::Instruction;
use crate::interpreter::{ExecutionResult, Interpreter};
use log::debug;

impl Interpreter {
    /// 2OP:0x01 - je a b [c d] ?(label): a equals any of the others
    pub(crate) fn op_je(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let condition = operands[1..].contains(&operands[0]);
        debug!("je {:?} -> {}", operands, condition);
        self.do_branch(inst, condition)
    }

    /// 2OP:0x02 - jl a b ?(label), signed
    pub(crate) fn op_jl(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let condition = (operands[0] as i16) < (operands[1] as i16);
        debug!("jl {} {} -> {}", operands[0] as i16, operands[1] as i16, condition);
        self.do_branch(inst, condition)
    }

    /// 2OP:0x03 - jg a b ?(label), signed
    pub(crate) fn op_jg(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let condition = (operands[0] as i16) > (operands[1] as i16);
        debug!("jg {} {} -> {}", operands[0] as i16, operands[1] as i16, condition);
        self.do_branch(inst, condition)
    }

    /// 1OP:0x00 - jz a ?(label)
    pub(crate) fn op_jz(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        self.do_branch(inst, operands[0] == 0)
    }

    /// 1OP:0x0B - ret value
    pub(crate) fn op_ret(
        &mut self,
        _inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        self.do_return(operands[0])
    }

    /// 1OP:0x0C - jump ?(label): signed offset, not a branch
    pub(crate) fn op_jump(
        &mut self,
        _inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let offset = operands[0] as i16;
        let new_pc = (self.vm.pc as i64 + offset as i64 - 2) as u32;
        debug!("jump {:+} to {:05x}", offset, new_pc);
        self.vm.pc = new_pc;
        Ok(ExecutionResult::Branched)
    }

    /// 0OP:0x00 - rtrue
    pub(crate) fn op_rtrue(
        &mut self,
        _inst: &Instruction,
        _operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        self.do_return(1)
    }

    /// 0OP:0x01 - rfalse
    pub(crate) fn op_rfalse(
        &mut self,
        _inst: &Instruction,
        _operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        self.do_return(0)
    }

    /// 0OP:0x08 - ret_popped
    pub(crate) fn op_ret_popped(
        &mut self,
        _inst: &Instruction,
        _operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        let value = self.vm.pop()?;
        self.do_return(value)
    }

    /// 0OP:0x0A - quit
    pub(crate) fn op_quit(
        &mut self,
        _inst: &Instruction,
        _operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        debug!("quit at {:05x}", self.vm.pc);
        Ok(ExecutionResult::Quit)
    }

    /// VAR:0x00 - call routine [args...] -> (result)
    pub(crate) fn op_call(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> Result<ExecutionResult, ZError> {
        self.do_call(operands[0], &operands[1..], inst.store_var)
    }
}
