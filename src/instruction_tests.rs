use crate::error::ZError;
use crate::instruction::{BranchTarget, Instruction, InstructionForm, OperandCount};
use crate::memory::Memory;
use crate::operand::{Operand, OperandType, VariableRef};
use test_log::test;

/// Place `code` at 0x40 in an otherwise empty image and decode it.
fn decode(code: &[u8]) -> Result<Instruction, ZError> {
    let mut bytes = vec![0u8; 0x40];
    bytes.extend_from_slice(code);
    let len = bytes.len();
    Instruction::decode(&Memory::new(bytes, len), 0x40)
}

fn memory_with(code: &[u8]) -> Memory {
    let mut bytes = vec![0u8; 0x40];
    bytes.extend_from_slice(code);
    let len = bytes.len();
    Memory::new(bytes, len)
}

#[test]
fn test_long_form_mode_bits() {
    let types = |opcode: u8| -> Vec<OperandType> {
        decode(&[opcode, 0x01, 0x02])
            .unwrap()
            .operands
            .iter()
            .map(|op| op.operand_type())
            .collect()
    };

    use OperandType::{SmallConstant as S, Variable as V};
    assert_eq!(types(0x14), vec![S, S]);
    assert_eq!(types(0x34), vec![S, V]);
    assert_eq!(types(0x54), vec![V, S]);
    assert_eq!(types(0x74), vec![V, V]);

    let inst = decode(&[0x54, 0x10, 0x05]).unwrap();
    assert_eq!(inst.form, InstructionForm::Long);
    assert_eq!(inst.operand_count, OperandCount::OP2);
    assert_eq!(inst.number, 0x14);
    assert_eq!(
        inst.operands.as_slice(),
        &[
            Operand::Variable(VariableRef::Global(0)),
            Operand::SmallConstant(5)
        ]
    );
    assert_eq!(inst.next_pc, 0x43);
}

#[test]
fn test_type_byte_stops_at_first_omitted() {
    // 00 01 11 00: large, small, then omitted; the trailing 00 is ignored
    let inst = decode(&[0xE0, 0b00_01_11_00, 0x12, 0x34, 0x56, 0xFF, 0xFF]).unwrap();
    assert_eq!(inst.form, InstructionForm::Variable);
    assert_eq!(inst.operand_count, OperandCount::VAR);
    assert_eq!(
        inst.operands.as_slice(),
        &[Operand::LargeConstant(0x1234), Operand::SmallConstant(0x56)]
    );
    assert_eq!(inst.next_pc, 0x45);
}

#[test]
fn test_variable_form_2op_range() {
    let inst = decode(&[0xC1, 0x5F, 0x01, 0x02]).unwrap();
    assert_eq!(inst.form, InstructionForm::Variable);
    assert_eq!(inst.operand_count, OperandCount::OP2);
    assert_eq!(inst.number, 0x01);
    assert_eq!(inst.name(), "je");

    let inst = decode(&[0xE3, 0xFF]).unwrap();
    assert_eq!(inst.operand_count, OperandCount::VAR);
    assert_eq!(inst.name(), "put_prop");
    assert!(inst.operands.is_empty());
}

#[test]
fn test_short_forms() {
    let inst = decode(&[0x8C, 0xFF, 0xFE]).unwrap();
    assert_eq!(inst.form, InstructionForm::Short);
    assert_eq!(inst.operand_count, OperandCount::OP1);
    assert_eq!(inst.operands.as_slice(), &[Operand::LargeConstant(0xFFFE)]);
    assert_eq!(inst.name(), "jump");

    let inst = decode(&[0x9E, 0x03]).unwrap();
    assert_eq!(inst.operands.as_slice(), &[Operand::SmallConstant(3)]);

    let inst = decode(&[0xAB, 0x01]).unwrap();
    assert_eq!(
        inst.operands.as_slice(),
        &[Operand::Variable(VariableRef::Local(0))]
    );
    assert_eq!(inst.name(), "ret");

    let inst = decode(&[0xBA]).unwrap();
    assert_eq!(inst.operand_count, OperandCount::OP0);
    assert_eq!(inst.number, 0x0A);
    assert!(inst.operands.is_empty());
    assert_eq!(inst.size(), 1);
}

#[test]
fn test_store_and_short_branch() {
    let memory = memory_with(&[0x01, 0x05, 0x05, 0xC5]);
    let mut inst = Instruction::decode(&memory, 0x40).unwrap();
    assert_eq!(inst.branch, None);
    inst.read_branch(&memory).unwrap();

    let branch = inst.branch.unwrap();
    assert!(branch.on_true);
    assert_eq!(branch.offset, 5);
    assert_eq!(inst.next_pc, 0x44);
    assert_eq!(branch.target(inst.next_pc), BranchTarget::Jump(0x47));

    let memory = memory_with(&[0x14, 0x01, 0x02, 0x00]);
    let mut inst = Instruction::decode(&memory, 0x40).unwrap();
    inst.read_store(&memory).unwrap();
    assert_eq!(inst.store_target(), Some(VariableRef::Stack));
    assert_eq!(inst.size(), 4);
}

#[test]
fn test_long_branch_is_signed_14_bit() {
    // 0x3F 0xFA = -6, branch on false
    let memory = memory_with(&[0xA0, 0x10, 0x3F, 0xFA]);
    let mut inst = Instruction::decode(&memory, 0x40).unwrap();
    inst.read_branch(&memory).unwrap();
    let branch = inst.branch.unwrap();
    assert!(!branch.on_true);
    assert_eq!(branch.offset, -6);
    assert_eq!(inst.next_pc, 0x44);
    assert_eq!(branch.target(inst.next_pc), BranchTarget::Jump(0x3C));

    // Offsets 0 and 1 are returns
    let memory = memory_with(&[0xA0, 0x10, 0xC0]);
    let mut inst = Instruction::decode(&memory, 0x40).unwrap();
    inst.read_branch(&memory).unwrap();
    assert_eq!(
        inst.branch.unwrap().target(inst.next_pc),
        BranchTarget::ReturnFalse
    );
}

#[test]
fn test_truncated_instruction() {
    assert!(matches!(
        decode(&[0xE0]),
        Err(ZError::TruncatedFile { .. })
    ));
    assert!(matches!(
        decode(&[0xE0, 0x3F, 0x12]),
        Err(ZError::TruncatedFile { .. })
    ));
}

#[test]
fn test_display() {
    let memory = memory_with(&[0x54, 0x10, 0x05, 0x00]);
    let mut inst = Instruction::decode(&memory, 0x40).unwrap();
    inst.read_store(&memory).unwrap();
    assert_eq!(inst.to_string(), "add G00, #05 -> sp");

    let memory = memory_with(&[0xA0, 0x02, 0x41]);
    let mut inst = Instruction::decode(&memory, 0x40).unwrap();
    inst.read_branch(&memory).unwrap();
    assert_eq!(inst.to_string(), "jz L01 [FALSE RTRUE]");
}
