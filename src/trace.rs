//! Structured execution events
//!
//! The interpreter never prints. It reports what it does to an
//! [`ExecutionObserver`], and the embedder decides what to do with it.

use crate::instruction::{InstructionForm, OperandCount};
use crate::operand::{OperandList, VariableRef};
use log::{debug, info};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Emitted once operands are resolved, before the handler runs. The
    /// handler may still fail.
    InstructionDecoded {
        address: u32,
        opcode: u8,
        form: InstructionForm,
        count: OperandCount,
        name: &'static str,
        operands: OperandList,
        values: Vec<u16>,
        store: Option<VariableRef>,
    },
    StorePerformed {
        target: VariableRef,
        value: u16,
    },
    FramePushed {
        routine: u32,
        return_pc: u32,
        depth: usize,
        locals: Vec<u16>,
    },
    FramePopped {
        depth: usize,
        value: u16,
        return_pc: u32,
    },
}

pub trait ExecutionObserver: Send {
    fn on_event(&mut self, event: &TraceEvent);
}

/// Discards every event.
pub struct NullObserver;

impl ExecutionObserver for NullObserver {
    fn on_event(&mut self, _event: &TraceEvent) {}
}

/// Writes every event to the `log` facade.
pub struct LoggingObserver {
    event_count: usize,
}

impl LoggingObserver {
    pub fn new() -> Self {
        info!("=== EXECUTION TRACE STARTED ===");
        LoggingObserver { event_count: 0 }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        LoggingObserver::new()
    }
}

impl ExecutionObserver for LoggingObserver {
    fn on_event(&mut self, event: &TraceEvent) {
        self.event_count += 1;
        match event {
            TraceEvent::InstructionDecoded {
                address,
                opcode,
                count,
                name,
                operands,
                values,
                store,
                ..
            } => {
                let operand_text: Vec<String> = operands.iter().map(|op| op.to_string()).collect();
                let store_text = store.map(|s| format!(" -> {}", s)).unwrap_or_default();
                info!(
                    "[{:06}] {:05x}: {:02x} {}:{} {}{} = {:04x?}",
                    self.event_count,
                    address,
                    opcode,
                    count,
                    name,
                    operand_text.join(", "),
                    store_text,
                    values
                );
            }
            TraceEvent::StorePerformed { target, value } => {
                debug!("[{:06}]   {} := {:#06x}", self.event_count, target, value);
            }
            TraceEvent::FramePushed {
                routine,
                return_pc,
                depth,
                locals,
            } => {
                info!(
                    "[{:06}]   call {:05x} (depth {}, returns to {:05x}) locals {:04x?}",
                    self.event_count, routine, depth, return_pc, locals
                );
            }
            TraceEvent::FramePopped {
                depth,
                value,
                return_pc,
            } => {
                info!(
                    "[{:06}]   return {:#06x} to {:05x} (depth {})",
                    self.event_count, value, return_pc, depth
                );
            }
        }
    }
}

impl Drop for LoggingObserver {
    fn drop(&mut self) {
        info!(
            "=== EXECUTION TRACE ENDED ({} events) ===",
            self.event_count
        );
    }
}

/// Keeps every event. Clones share the same log, so a test can hand one
/// clone to the interpreter and read the events through another.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        RecordingObserver::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ExecutionObserver for RecordingObserver {
    fn on_event(&mut self, event: &TraceEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
