use crate::error::ZError;
use crate::frame::CallStack;
use crate::header::Header;
use crate::memory::Memory;
use crate::operand::VariableRef;
use log::debug;

/// Represents a loaded game with owned memory
pub struct Game {
    /// The story's memory image
    pub memory: Memory,
    /// The parsed header
    pub header: Header,
}

impl Game {
    /// Create a new game from memory bytes
    pub fn from_memory(bytes: Vec<u8>) -> Result<Self, ZError> {
        let memory = Memory::from_story(bytes)?;
        let header = Header::parse(&memory)?;

        debug!(
            "loaded V{} story: {} bytes, static base {:#06x}, start pc {:#06x}",
            header.version,
            memory.len(),
            header.base_static_mem,
            header.initial_pc
        );

        Ok(Game { memory, header })
    }
}

/// The Z-Machine virtual machine state
pub struct VM {
    /// The game being executed
    pub game: Game,
    /// Program counter - address of the next instruction
    pub pc: u32,
    /// Call stack for routine invocations
    pub call_stack: CallStack,
    globals_addr: usize,
}

impl VM {
    /// Create a new VM instance with the given game
    pub fn new(game: Game) -> Self {
        let initial_pc = game.header.initial_pc as u32;
        let globals_addr = game.header.global_variables as usize;

        VM {
            game,
            pc: initial_pc,
            call_stack: CallStack::new(),
            globals_addr,
        }
    }

    /// Reset the VM to initial state
    pub fn reset(&mut self) {
        self.pc = self.game.header.initial_pc as u32;
        self.call_stack = CallStack::new();
    }

    pub fn version(&self) -> u8 {
        self.game.header.version
    }

    pub fn read_byte(&self, addr: usize) -> Result<u8, ZError> {
        self.game.memory.read_byte(addr)
    }

    pub fn read_word(&self, addr: usize) -> Result<u16, ZError> {
        self.game.memory.read_word(addr)
    }

    pub fn write_byte(&mut self, addr: usize, value: u8) -> Result<(), ZError> {
        self.game.memory.write_byte(addr, value)
    }

    pub fn write_word(&mut self, addr: usize, value: u16) -> Result<(), ZError> {
        self.game.memory.write_word(addr, value)
    }

    /// Push a value onto the current routine's evaluation stack
    pub fn push(&mut self, value: u16) -> Result<(), ZError> {
        self.call_stack.current_mut().push(value)
    }

    /// Pop a value from the current routine's evaluation stack
    pub fn pop(&mut self) -> Result<u16, ZError> {
        self.call_stack.current_mut().pop().map_err(|e| {
            debug!(
                "stack underflow at pc {:05x}, call depth {}",
                self.pc,
                self.call_stack.depth()
            );
            e
        })
    }

    /// Peek at the top of the stack without removing it
    pub fn peek(&self) -> Result<u16, ZError> {
        self.call_stack.current().peek()
    }

    /// Read global `index` (variable number minus 16)
    pub fn read_global(&self, index: u8) -> Result<u16, ZError> {
        self.read_word(self.globals_addr + index as usize * 2)
    }

    /// Write global `index` (variable number minus 16)
    pub fn write_global(&mut self, index: u8, value: u16) -> Result<(), ZError> {
        self.write_word(self.globals_addr + index as usize * 2, value)
    }

    /// Read local `slot` (variable number minus 1) of the current routine
    pub fn read_local(&self, slot: u8) -> Result<u16, ZError> {
        let frame = self.call_stack.current();
        if slot >= frame.num_locals() {
            return Err(ZError::InvalidVariableReference {
                var: slot + 1,
                num_locals: frame.num_locals(),
            });
        }
        Ok(frame.locals[slot as usize])
    }

    /// Write local `slot` (variable number minus 1) of the current routine
    pub fn write_local(&mut self, slot: u8, value: u16) -> Result<(), ZError> {
        let frame = self.call_stack.current_mut();
        if slot >= frame.num_locals() {
            return Err(ZError::InvalidVariableReference {
                var: slot + 1,
                num_locals: frame.num_locals(),
            });
        }
        frame.locals[slot as usize] = value;
        Ok(())
    }

    /// Read a variable as an operand: the stack is popped
    pub fn read_variable(&mut self, var: VariableRef) -> Result<u16, ZError> {
        match var {
            VariableRef::Stack => self.pop(),
            VariableRef::Local(slot) => self.read_local(slot),
            VariableRef::Global(index) => self.read_global(index),
        }
    }

    /// Write a variable as a store target: the stack is pushed
    pub fn write_variable(&mut self, var: VariableRef, value: u16) -> Result<(), ZError> {
        match var {
            VariableRef::Stack => self.push(value),
            VariableRef::Local(slot) => self.write_local(slot, value),
            VariableRef::Global(index) => self.write_global(index, value),
        }
    }

    /// Read a variable named by another instruction's operand (`load`).
    /// The stack is read in place.
    pub fn read_variable_indirect(&self, var: VariableRef) -> Result<u16, ZError> {
        match var {
            VariableRef::Stack => self.peek(),
            VariableRef::Local(slot) => self.read_local(slot),
            VariableRef::Global(index) => self.read_global(index),
        }
    }

    /// Write a variable named by another instruction's operand (`store`,
    /// `pull`). The top of the stack is replaced in place.
    pub fn write_variable_indirect(&mut self, var: VariableRef, value: u16) -> Result<(), ZError> {
        match var {
            VariableRef::Stack => self.call_stack.current_mut().replace_top(value),
            VariableRef::Local(slot) => self.write_local(slot, value),
            VariableRef::Global(index) => self.write_global(index, value),
        }
    }

    /// Get the current call depth (the top-level frame counts as 1)
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }

    /// Unpack a routine address based on version
    pub fn unpack_routine_address(&self, packed: u16) -> usize {
        match self.game.header.version {
            1..=3 => (packed as usize) * 2,
            4..=7 => (packed as usize) * 4,
            _ => (packed as usize) * 8,
        }
    }
}
