//! Error types for the decode-and-dispatch core
//!
//! Every variant of [`ZError`] is fatal for the current execution: the
//! interpreter stops at the instruction boundary where it was raised and
//! hands a [`RunError`] back to the embedder.

use crate::instruction::OperandCount;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZError {
    /// The buffer ends before a header or an instruction is complete.
    #[error("truncated story file: {what} needs {needed} bytes, image has {len}")]
    TruncatedFile {
        what: &'static str,
        needed: usize,
        len: usize,
    },

    #[error("address {addr:#06x} out of bounds (image length {len:#06x})")]
    OutOfBounds { addr: usize, len: usize },

    #[error("write to {addr:#06x} at or above static memory base {static_base:#06x}")]
    ReadOnlyViolation { addr: usize, static_base: usize },

    /// A local variable beyond the routine's declared count.
    #[error("variable {var:#04x} refers to a local but the routine declares {num_locals} locals")]
    InvalidVariableReference { var: u8, num_locals: u8 },

    #[error("routine at {addr:#06x} declares {num_locals} locals (maximum is 15)")]
    InvalidRoutineHeader { addr: usize, num_locals: u8 },

    #[error("unimplemented opcode {opcode:#04x} ({count}:{number:#04x}) at {pc:#06x}")]
    UnimplementedOpcode {
        opcode: u8,
        count: OperandCount,
        number: u8,
        pc: u32,
    },

    #[error("{name} needs {expected} operands, instruction has {found}")]
    MissingOperands {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("evaluation stack underflow")]
    StackUnderflow,

    #[error("evaluation stack overflow")]
    StackOverflow,

    #[error("call depth exceeds {limit} frames")]
    CallDepthExceeded { limit: usize },

    #[error("return from the top-level routine")]
    ReturnFromTopLevel,

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid object number {object}")]
    InvalidObject { object: u16 },

    #[error("property {property} not found on object {object}")]
    PropertyNotFound { object: u16, property: u8 },

    #[error("property {property} on object {object} has size {size}, put_prop needs 1 or 2")]
    PropertyTooLarge {
        object: u16,
        property: u8,
        size: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// A fatal error together with the machine state at the point it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("execution stopped at pc {pc:#06x} (frame depth {frame_depth}, {instructions} instructions executed): {source}")]
pub struct RunError {
    pub pc: u32,
    pub frame_depth: usize,
    pub instructions: u64,
    #[source]
    pub source: ZError,
}
