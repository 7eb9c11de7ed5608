use crate::error::{RunError, ZError};
use crate::frame::CallFrame;
use crate::instruction::{BranchTarget, Instruction};
use crate::object::{PropertyTable, StandardPropertyTable};
use crate::opcode_tables::{self, OpcodeDescriptor};
use crate::operand::{Operand, VariableRef, MAX_OPERANDS};
use crate::trace::{ExecutionObserver, NullObserver, TraceEvent};
use crate::vm::VM;
use log::{debug, error, info};

/// Result of executing a single instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Continue execution normally
    Continue,
    /// Branch taken, PC already updated
    Branched,
    /// Routine called, PC updated
    Called,
    /// Routine returned
    Returned(u16),
    /// Game should quit
    Quit,
}

/// How a call to [`Interpreter::step`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Quit,
}

/// How a call to [`Interpreter::run`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The story executed `quit`
    Quit { instructions: u64 },
    /// The step budget ran out before the story halted
    StepLimitReached { instructions: u64 },
}

/// The main Z-Machine interpreter
pub struct Interpreter {
    /// The VM state
    pub vm: VM,
    observer: Box<dyn ExecutionObserver>,
    properties: Box<dyn PropertyTable>,
    /// Instructions completed since the interpreter was created
    instruction_count: u64,
}

impl Interpreter {
    /// Create a new interpreter
    pub fn new(vm: VM) -> Self {
        if let Err(problems) = opcode_tables::verify_dispatch_table(vm.version()) {
            for problem in &problems {
                error!("dispatch table: {}", problem);
            }
        }
        let properties = StandardPropertyTable::for_header(&vm.game.header);
        Interpreter {
            vm,
            observer: Box::new(NullObserver),
            properties: Box::new(properties),
            instruction_count: 0,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn set_observer(&mut self, observer: Box<dyn ExecutionObserver>) {
        self.observer = observer;
    }

    /// Replace the object model used by `put_prop`
    pub fn with_property_table(mut self, properties: Box<dyn PropertyTable>) -> Self {
        self.properties = properties;
        self
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Run until the story quits or an error stops it
    pub fn run(&mut self) -> Result<RunOutcome, RunError> {
        self.run_with_limit(None)
    }

    /// Run with an optional budget of instructions
    pub fn run_with_limit(&mut self, max_instructions: Option<u64>) -> Result<RunOutcome, RunError> {
        info!("Starting Z-Machine interpreter...");
        info!("Initial PC: {:05x}", self.vm.pc);

        let start = self.instruction_count;
        loop {
            let executed = self.instruction_count - start;
            if let Some(max) = max_instructions {
                if executed >= max {
                    info!("Reached step limit of {} instructions", max);
                    return Ok(RunOutcome::StepLimitReached {
                        instructions: executed,
                    });
                }
            }

            if self.step()? == StepOutcome::Quit {
                let instructions = self.instruction_count - start;
                info!("Story quit after {} instructions", instructions);
                return Ok(RunOutcome::Quit { instructions });
            }
        }
    }

    /// Fetch, decode and execute exactly one instruction.
    ///
    /// On error the PC is left on the failing instruction.
    pub fn step(&mut self) -> Result<StepOutcome, RunError> {
        let pc = self.vm.pc;
        match self.execute_next() {
            Ok(ExecutionResult::Quit) => Ok(StepOutcome::Quit),
            Ok(_) => Ok(StepOutcome::Continue),
            Err(source) => {
                let err = RunError {
                    pc,
                    frame_depth: self.vm.call_depth(),
                    instructions: self.instruction_count,
                    source,
                };
                error!("{}", err);
                self.vm.pc = pc;
                Err(err)
            }
        }
    }

    fn execute_next(&mut self) -> Result<ExecutionResult, ZError> {
        let (instruction, descriptor) = self.fetch()?;
        let result = self.execute_instruction(&instruction, descriptor)?;
        self.instruction_count += 1;
        Ok(result)
    }

    /// Decode the instruction at PC and complete its store/branch tail
    /// from the dispatch table.
    pub fn fetch(&self) -> Result<(Instruction, &'static OpcodeDescriptor), ZError> {
        let memory = &self.vm.game.memory;
        let mut instruction = Instruction::decode(memory, self.vm.pc as usize)?;

        let descriptor = opcode_tables::lookup(instruction.operand_count, instruction.number)
            .ok_or(ZError::UnimplementedOpcode {
                opcode: instruction.opcode,
                count: instruction.operand_count,
                number: instruction.number,
                pc: instruction.address,
            })?;

        if descriptor.store {
            instruction.read_store(memory)?;
        }
        if descriptor.branch {
            instruction.read_branch(memory)?;
        }
        Ok((instruction, descriptor))
    }

    /// Execute a decoded instruction
    fn execute_instruction(
        &mut self,
        inst: &Instruction,
        descriptor: &OpcodeDescriptor,
    ) -> Result<ExecutionResult, ZError> {
        if inst.operands.len() < descriptor.min_operands {
            return Err(ZError::MissingOperands {
                name: descriptor.name,
                expected: descriptor.min_operands,
                found: inst.operands.len(),
            });
        }

        // Update PC to next instruction; handlers that jump overwrite it
        self.vm.pc = inst.next_pc;

        let values = self.resolve_operands(inst)?;
        let operands = &values[..inst.operands.len()];

        debug!("{:05x}: {} = {:04x?}", inst.address, inst, operands);
        self.emit(TraceEvent::InstructionDecoded {
            address: inst.address,
            opcode: inst.opcode,
            form: inst.form,
            count: inst.operand_count,
            name: descriptor.name,
            operands: inst.operands,
            values: operands.to_vec(),
            store: inst.store_target(),
        });

        (descriptor.handler)(self, inst, operands)
    }

    /// Turn operands into values, in order. Variable operands read the
    /// stack destructively.
    fn resolve_operands(&mut self, inst: &Instruction) -> Result<[u16; MAX_OPERANDS], ZError> {
        let mut values = [0u16; MAX_OPERANDS];
        for (slot, operand) in values.iter_mut().zip(inst.operands.iter()) {
            *slot = match *operand {
                Operand::LargeConstant(v) => v,
                Operand::SmallConstant(v) => v as u16,
                Operand::Variable(var) => self.vm.read_variable(var)?,
            };
        }
        Ok(values)
    }

    fn emit(&mut self, event: TraceEvent) {
        self.observer.on_event(&event);
    }

    /// Hand a `put_prop` to the object model
    pub(crate) fn put_property(&mut self, object: u16, property: u8, value: u16) -> Result<(), ZError> {
        self.properties
            .put_property(&mut self.vm.game.memory, object, property, value)
    }

    /// Write `value` to a variable and report the store
    pub(crate) fn store_variable(&mut self, target: VariableRef, value: u16) -> Result<(), ZError> {
        self.vm.write_variable(target, value)?;
        self.emit(TraceEvent::StorePerformed { target, value });
        Ok(())
    }

    /// Write a variable named by an operand (`store`, `pull`)
    pub(crate) fn store_variable_indirect(
        &mut self,
        target: VariableRef,
        value: u16,
    ) -> Result<(), ZError> {
        self.vm.write_variable_indirect(target, value)?;
        self.emit(TraceEvent::StorePerformed { target, value });
        Ok(())
    }

    /// Store a result to the instruction's store target
    pub(crate) fn store_result(&mut self, inst: &Instruction, value: u16) -> Result<(), ZError> {
        match inst.store_target() {
            Some(target) => self.store_variable(target, value),
            None => Ok(()),
        }
    }

    /// Handle branching
    pub(crate) fn do_branch(
        &mut self,
        inst: &Instruction,
        condition: bool,
    ) -> Result<ExecutionResult, ZError> {
        let Some(branch) = inst.branch else {
            return Ok(ExecutionResult::Continue);
        };
        if condition != branch.on_true {
            return Ok(ExecutionResult::Continue);
        }

        match branch.target(inst.next_pc) {
            BranchTarget::ReturnFalse => self.do_return(0),
            BranchTarget::ReturnTrue => self.do_return(1),
            BranchTarget::Jump(new_pc) => {
                debug!("branch from {:05x} to {:05x}", inst.address, new_pc);
                self.vm.pc = new_pc;
                Ok(ExecutionResult::Branched)
            }
        }
    }

    /// Enter the routine at a packed address. The caller's return PC is the
    /// current PC.
    pub(crate) fn do_call(
        &mut self,
        packed_addr: u16,
        args: &[u16],
        return_store: Option<u8>,
    ) -> Result<ExecutionResult, ZError> {
        // Calling address 0 returns false without entering a routine
        if packed_addr == 0 {
            debug!("call to address 0, storing 0");
            if let Some(var) = return_store {
                self.store_variable(VariableRef::from_number(var), 0)?;
            }
            return Ok(ExecutionResult::Continue);
        }

        let addr = self.vm.unpack_routine_address(packed_addr);
        let num_locals = self.vm.read_byte(addr)?;
        let mut frame = CallFrame::new(addr as u32, self.vm.pc, return_store, num_locals)?;
        let mut code_start = addr + 1;

        // V1-4 routines carry initial values for their locals
        if self.vm.version() <= 4 {
            for i in 0..num_locals as usize {
                frame.locals[i] = self.vm.read_word(code_start)?;
                code_start += 2;
            }
        }

        for (local, &arg) in frame.locals.iter_mut().zip(args.iter()).take(num_locals as usize) {
            *local = arg;
        }

        debug!(
            "call {:05x} with args {:04x?}, {} locals, returning to {:05x}",
            addr, args, num_locals, self.vm.pc
        );

        let locals = frame.active_locals().to_vec();
        let return_pc = frame.return_pc;
        self.vm.call_stack.push(frame)?;
        self.vm.pc = code_start as u32;

        self.emit(TraceEvent::FramePushed {
            routine: addr as u32,
            return_pc,
            depth: self.vm.call_depth(),
            locals,
        });
        Ok(ExecutionResult::Called)
    }

    /// Return from the current routine
    pub(crate) fn do_return(&mut self, value: u16) -> Result<ExecutionResult, ZError> {
        let frame = self.vm.call_stack.pop()?;
        self.vm.pc = frame.return_pc;

        debug!(
            "return {:#06x} from {:05x} to {:05x}",
            value, frame.routine_addr, frame.return_pc
        );

        if let Some(var) = frame.return_store {
            self.store_variable(VariableRef::from_number(var), value)?;
        }

        self.emit(TraceEvent::FramePopped {
            depth: self.vm.call_depth(),
            value,
            return_pc: frame.return_pc,
        });
        Ok(ExecutionResult::Returned(value))
    }
}
