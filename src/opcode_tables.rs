//! Opcode metadata and the dispatch table
//!
//! The mnemonic and store/branch tables describe every opcode the Z-machine
//! standard declares. The dispatch table maps the opcodes this core
//! executes to a descriptor carrying the operand schema and the handler.
//! Anything not in the dispatch table is a lookup miss and stops execution.

use crate::error::ZError;
use crate::instruction::{Instruction, OperandCount};
use crate::interpreter::{ExecutionResult, Interpreter};
use indexmap::IndexMap;

/// Signature shared by every opcode handler. Operands arrive resolved.
pub type Handler = fn(&mut Interpreter, &Instruction, &[u16]) -> Result<ExecutionResult, ZError>;

/// Key into the dispatch table: the operand-count table and the opcode number in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpcodeKey {
    pub count: OperandCount,
    pub number: u8,
}

/// Everything the dispatcher needs to know about one executable opcode.
pub struct OpcodeDescriptor {
    pub name: &'static str,
    pub count: OperandCount,
    pub number: u8,
    /// Fewer operands than this is a malformed instruction
    pub min_operands: usize,
    /// A store-target byte follows the operands
    pub store: bool,
    /// Branch bytes follow the operands (and the store byte, if any)
    pub branch: bool,
    pub handler: Handler,
}

macro_rules! opcode {
    ($count:ident, $number:expr, $name:expr, $min:expr, store: $store:expr, branch: $branch:expr, $handler:path) => {
        OpcodeDescriptor {
            name: $name,
            count: OperandCount::$count,
            number: $number,
            min_operands: $min,
            store: $store,
            branch: $branch,
            handler: $handler,
        }
    };
}

fn build_dispatch_table() -> IndexMap<OpcodeKey, OpcodeDescriptor> {
    let descriptors = vec![
        // ---- 2OP ----
        opcode!(OP2, 0x01, "je", 2, store: false, branch: true, Interpreter::op_je),
        opcode!(OP2, 0x02, "jl", 2, store: false, branch: true, Interpreter::op_jl),
        opcode!(OP2, 0x03, "jg", 2, store: false, branch: true, Interpreter::op_jg),
        opcode!(OP2, 0x08, "or", 2, store: true, branch: false, Interpreter::op_or),
        opcode!(OP2, 0x09, "and", 2, store: true, branch: false, Interpreter::op_and),
        opcode!(OP2, 0x0D, "store", 2, store: false, branch: false, Interpreter::op_store),
        opcode!(OP2, 0x0F, "loadw", 2, store: true, branch: false, Interpreter::op_loadw),
        opcode!(OP2, 0x10, "loadb", 2, store: true, branch: false, Interpreter::op_loadb),
        opcode!(OP2, 0x14, "add", 2, store: true, branch: false, Interpreter::op_add),
        opcode!(OP2, 0x15, "sub", 2, store: true, branch: false, Interpreter::op_sub),
        opcode!(OP2, 0x16, "mul", 2, store: true, branch: false, Interpreter::op_mul),
        opcode!(OP2, 0x17, "div", 2, store: true, branch: false, Interpreter::op_div),
        opcode!(OP2, 0x18, "mod", 2, store: true, branch: false, Interpreter::op_mod),
        // ---- 1OP ----
        opcode!(OP1, 0x00, "jz", 1, store: false, branch: true, Interpreter::op_jz),
        opcode!(OP1, 0x0B, "ret", 1, store: false, branch: false, Interpreter::op_ret),
        opcode!(OP1, 0x0C, "jump", 1, store: false, branch: false, Interpreter::op_jump),
        opcode!(OP1, 0x0E, "load", 1, store: true, branch: false, Interpreter::op_load),
        // ---- 0OP ----
        opcode!(OP0, 0x00, "rtrue", 0, store: false, branch: false, Interpreter::op_rtrue),
        opcode!(OP0, 0x01, "rfalse", 0, store: false, branch: false, Interpreter::op_rfalse),
        opcode!(OP0, 0x08, "ret_popped", 0, store: false, branch: false, Interpreter::op_ret_popped),
        opcode!(OP0, 0x0A, "quit", 0, store: false, branch: false, Interpreter::op_quit),
        // ---- VAR ----
        opcode!(VAR, 0x00, "call", 1, store: true, branch: false, Interpreter::op_call),
        opcode!(VAR, 0x01, "storew", 3, store: false, branch: false, Interpreter::op_storew),
        opcode!(VAR, 0x02, "storeb", 3, store: false, branch: false, Interpreter::op_storeb),
        opcode!(VAR, 0x03, "put_prop", 3, store: false, branch: false, Interpreter::op_put_prop),
        opcode!(VAR, 0x08, "push", 1, store: false, branch: false, Interpreter::op_push),
        opcode!(VAR, 0x09, "pull", 1, store: false, branch: false, Interpreter::op_pull),
    ];

    descriptors
        .into_iter()
        .map(|d| {
            (
                OpcodeKey {
                    count: d.count,
                    number: d.number,
                },
                d,
            )
        })
        .collect()
}

lazy_static! {
    static ref DISPATCH_TABLE: IndexMap<OpcodeKey, OpcodeDescriptor> = build_dispatch_table();
}

/// Find the descriptor for an opcode, if this core executes it.
pub fn lookup(count: OperandCount, number: u8) -> Option<&'static OpcodeDescriptor> {
    DISPATCH_TABLE.get(&OpcodeKey { count, number })
}

/// Every executable opcode, in table order.
pub fn descriptors() -> impl Iterator<Item = &'static OpcodeDescriptor> {
    DISPATCH_TABLE.values()
}

/// Check the dispatch table against the standard's operand schema.
///
/// Returns one message per descriptor whose name, store flag or branch flag
/// disagrees with the mnemonic and store/branch tables below.
pub fn verify_dispatch_table(version: u8) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();
    for d in descriptors() {
        let name = get_instruction_name(d.number, d.count);
        if name != d.name {
            problems.push(format!(
                "{}:{:02x} is named {} but the standard calls it {}",
                d.count, d.number, d.name, name
            ));
        }
        if stores_result(d.count, d.number, version) != d.store {
            problems.push(format!("{} store flag disagrees with the standard", d.name));
        }
        if has_branch(d.count, d.number, version) != d.branch {
            problems.push(format!("{} branch flag disagrees with the standard", d.name));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// One row of the coverage report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageEntry {
    pub count: OperandCount,
    pub number: u8,
    pub name: &'static str,
    pub implemented: bool,
}

/// Every opcode the standard declares for `version`, with whether it has a handler.
pub fn coverage(version: u8) -> Vec<CoverageEntry> {
    let mut entries = Vec::new();
    for count in [
        OperandCount::OP2,
        OperandCount::OP1,
        OperandCount::OP0,
        OperandCount::VAR,
    ] {
        for number in 0..32u8 {
            if !is_declared(count, number, version) {
                continue;
            }
            entries.push(CoverageEntry {
                count,
                number,
                name: get_instruction_name(number, count),
                implemented: lookup(count, number).is_some(),
            });
        }
    }
    entries
}

/// Whether the standard defines this opcode in the given version.
pub fn is_declared(count: OperandCount, number: u8, version: u8) -> bool {
    match count {
        OperandCount::OP2 => match version {
            1..=3 => (0x01..=0x18).contains(&number),
            4 => (0x01..=0x19).contains(&number),
            _ => (0x01..=0x1C).contains(&number),
        },
        OperandCount::OP1 => number <= 0x0F,
        OperandCount::OP0 => match number {
            0x0C => version <= 3,
            0x0E | 0x0F => version >= 5,
            n => n <= 0x0D,
        },
        OperandCount::VAR => match version {
            1..=3 => number <= 0x0B || (0x13..=0x15).contains(&number),
            4 => number <= 0x17,
            _ => number <= 0x1F,
        },
    }
}

/// Get the name of an opcode from its operand-count table and number
pub fn get_instruction_name(number: u8, operand_count: OperandCount) -> &'static str {
    match operand_count {
        OperandCount::OP0 => get_0op_opcode_name(number),
        OperandCount::OP1 => get_1op_opcode_name(number),
        OperandCount::OP2 => get_2op_opcode_name(number),
        OperandCount::VAR => get_var_opcode_name(number),
    }
}

/// Get name for 2OP opcodes
fn get_2op_opcode_name(opcode: u8) -> &'static str {
    match opcode {
        0x01 => "je",
        0x02 => "jl",
        0x03 => "jg",
        0x04 => "dec_chk",
        0x05 => "inc_chk",
        0x06 => "jin",
        0x07 => "test",
        0x08 => "or",
        0x09 => "and",
        0x0A => "test_attr",
        0x0B => "set_attr",
        0x0C => "clear_attr",
        0x0D => "store",
        0x0E => "insert_obj",
        0x0F => "loadw",
        0x10 => "loadb",
        0x11 => "get_prop",
        0x12 => "get_prop_addr",
        0x13 => "get_next_prop",
        0x14 => "add",
        0x15 => "sub",
        0x16 => "mul",
        0x17 => "div",
        0x18 => "mod",
        0x19 => "call_2s",
        0x1A => "call_2n",
        0x1B => "set_colour",
        0x1C => "throw",
        _ => "unknown_2op",
    }
}

/// Get name for 1OP opcodes
fn get_1op_opcode_name(opcode: u8) -> &'static str {
    match opcode {
        0x00 => "jz",
        0x01 => "get_sibling",
        0x02 => "get_child",
        0x03 => "get_parent",
        0x04 => "get_prop_len",
        0x05 => "inc",
        0x06 => "dec",
        0x07 => "print_addr",
        0x08 => "call_1s",
        0x09 => "remove_obj",
        0x0A => "print_obj",
        0x0B => "ret",
        0x0C => "jump",
        0x0D => "print_paddr",
        0x0E => "load",
        0x0F => "not", // V1-4, call_1n in V5+
        _ => "unknown_1op",
    }
}

/// Get name for 0OP opcodes
fn get_0op_opcode_name(opcode: u8) -> &'static str {
    match opcode {
        0x00 => "rtrue",
        0x01 => "rfalse",
        0x02 => "print",
        0x03 => "print_ret",
        0x04 => "nop",
        0x05 => "save",
        0x06 => "restore",
        0x07 => "restart",
        0x08 => "ret_popped",
        0x09 => "pop", // V1-4, catch in V5+
        0x0A => "quit",
        0x0B => "new_line",
        0x0C => "show_status", // V3 only
        0x0D => "verify",
        0x0E => "extended", // V5+
        0x0F => "piracy",
        _ => "unknown_0op",
    }
}

/// Get name for VAR opcodes
fn get_var_opcode_name(opcode: u8) -> &'static str {
    match opcode {
        0x00 => "call", // call_vs in V4+
        0x01 => "storew",
        0x02 => "storeb",
        0x03 => "put_prop",
        0x04 => "sread", // V1-4, aread in V5+
        0x05 => "print_char",
        0x06 => "print_num",
        0x07 => "random",
        0x08 => "push",
        0x09 => "pull",
        0x0A => "split_window",
        0x0B => "set_window",
        0x0C => "call_vs2",
        0x0D => "erase_window",
        0x0E => "erase_line",
        0x0F => "set_cursor",
        0x10 => "get_cursor",
        0x11 => "set_text_style",
        0x12 => "buffer_mode",
        0x13 => "output_stream",
        0x14 => "input_stream",
        0x15 => "sound_effect",
        0x16 => "read_char",
        0x17 => "scan_table",
        0x18 => "not",
        0x19 => "call_vn",
        0x1A => "call_vn2",
        0x1B => "tokenise",
        0x1C => "encode_text",
        0x1D => "copy_table",
        0x1E => "print_table",
        0x1F => "check_arg_count",
        _ => "unknown_var",
    }
}

/// Check if an instruction stores a result
pub fn stores_result(operand_count: OperandCount, opcode: u8, version: u8) -> bool {
    match operand_count {
        OperandCount::OP2 => match opcode {
            0x08..=0x09 => true, // or, and
            0x0F..=0x13 => true, // loadw, loadb, get_prop, get_prop_addr, get_next_prop
            0x14..=0x18 => true, // add, sub, mul, div, mod
            0x19 => version >= 4, // call_2s
            _ => false,
        },
        OperandCount::OP1 => match opcode {
            0x01..=0x04 => true, // get_sibling, get_child, get_parent, get_prop_len
            0x08 => version >= 4, // call_1s
            0x0E => true,         // load
            0x0F => version <= 4, // not
            _ => false,
        },
        OperandCount::OP0 => match opcode {
            0x05 | 0x06 => version == 4, // save, restore
            0x09 => version >= 5,        // catch
            _ => false,
        },
        OperandCount::VAR => match opcode {
            0x00 | 0x07 => true,           // call, random
            0x04 => version >= 5,          // aread
            0x0C => version >= 4,          // call_vs2
            0x16 | 0x17 => version >= 4,   // read_char, scan_table
            0x18 => version >= 5,          // not
            _ => false,
        },
    }
}

/// Check if an instruction has a branch
pub fn has_branch(operand_count: OperandCount, opcode: u8, version: u8) -> bool {
    match operand_count {
        OperandCount::OP2 => matches!(opcode, 0x01..=0x07 | 0x0A),
        OperandCount::OP1 => matches!(opcode, 0x00..=0x02), // jz, get_sibling, get_child
        OperandCount::OP0 => match opcode {
            0x05 | 0x06 => version <= 3, // save, restore
            0x0D | 0x0F => true,         // verify, piracy
            _ => false,
        },
        OperandCount::VAR => match opcode {
            0x17 => version >= 4, // scan_table
            0x1F => version >= 5, // check_arg_count
            _ => false,
        },
    }
}
