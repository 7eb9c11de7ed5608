#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod error;
pub mod frame;
pub mod header;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod object;
pub mod opcode_tables;
pub mod operand;
pub mod trace;
pub mod vm;

mod opcodes_flow;
mod opcodes_math;
mod opcodes_memory;
mod opcodes_object;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod instruction_tests;

pub use error::{RunError, ZError};
pub use interpreter::{Interpreter, RunOutcome, StepOutcome};
pub use vm::{Game, VM};
