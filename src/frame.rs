use crate::error::ZError;

/// Maximum depth of a single frame's evaluation stack
const STACK_SIZE: usize = 1024;

/// Maximum number of local variables per routine
pub const MAX_LOCALS: usize = 15;

/// Maximum call depth, counting the top-level frame
pub const MAX_FRAMES: usize = 1024;

/// Represents a call frame on the VM call stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Byte address of the routine header (0 for the top-level frame)
    pub routine_addr: u32,
    /// Return address (PC to return to)
    pub return_pc: u32,
    /// Where to store the return value (None = discard, Some(n) = variable n)
    pub return_store: Option<u8>,
    /// Number of local variables in this frame, at most [`MAX_LOCALS`]
    num_locals: u8,
    /// Local variable values
    pub locals: [u16; MAX_LOCALS],
    /// This routine's private evaluation stack
    stack: Vec<u16>,
}

impl CallFrame {
    pub fn new(
        routine_addr: u32,
        return_pc: u32,
        return_store: Option<u8>,
        num_locals: u8,
    ) -> Result<Self, ZError> {
        if num_locals as usize > MAX_LOCALS {
            return Err(ZError::InvalidRoutineHeader {
                addr: routine_addr as usize,
                num_locals,
            });
        }
        Ok(CallFrame {
            routine_addr,
            return_pc,
            return_store,
            num_locals,
            locals: [0; MAX_LOCALS],
            stack: Vec::new(),
        })
    }

    /// The implicit frame execution starts in: no locals, nothing to return to.
    pub fn top_level() -> Self {
        CallFrame {
            routine_addr: 0,
            return_pc: 0,
            return_store: None,
            num_locals: 0,
            locals: [0; MAX_LOCALS],
            stack: Vec::new(),
        }
    }

    pub fn num_locals(&self) -> u8 {
        self.num_locals
    }

    /// The declared locals, without the unused tail of the array.
    pub fn active_locals(&self) -> &[u16] {
        &self.locals[..self.num_locals as usize]
    }

    pub fn push(&mut self, value: u16) -> Result<(), ZError> {
        if self.stack.len() >= STACK_SIZE {
            return Err(ZError::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, ZError> {
        self.stack.pop().ok_or(ZError::StackUnderflow)
    }

    pub fn peek(&self) -> Result<u16, ZError> {
        self.stack.last().copied().ok_or(ZError::StackUnderflow)
    }

    /// Overwrite the top of the stack in place.
    pub fn replace_top(&mut self, value: u16) -> Result<(), ZError> {
        let top = self.stack.last_mut().ok_or(ZError::StackUnderflow)?;
        *top = value;
        Ok(())
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }
}

/// The ordered sequence of active routine invocations.
#[derive(Debug, Clone)]
pub struct CallStack {
    frames: Vec<CallFrame>,
}

impl CallStack {
    /// A call stack holding only the top-level frame.
    pub fn new() -> Self {
        CallStack {
            frames: vec![CallFrame::top_level()],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> &CallFrame {
        // The top-level frame is never popped, so there is always one
        &self.frames[self.frames.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut CallFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn push(&mut self, frame: CallFrame) -> Result<(), ZError> {
        if self.frames.len() >= MAX_FRAMES {
            return Err(ZError::CallDepthExceeded { limit: MAX_FRAMES });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Remove the innermost routine frame. The top-level frame stays.
    pub fn pop(&mut self) -> Result<CallFrame, ZError> {
        if self.frames.len() <= 1 {
            return Err(ZError::ReturnFromTopLevel);
        }
        self.frames.pop().ok_or(ZError::ReturnFromTopLevel)
    }

    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }
}

impl Default for CallStack {
    fn default() -> Self {
        CallStack::new()
    }
}
