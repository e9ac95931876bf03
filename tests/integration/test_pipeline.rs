//! Pipeline integration tests — loader → lifter → CFG → collapse → output.

use massilia::cfg::{collapse_jumps, compute_incoming, compute_jump_targets};
use massilia::decompiler::{decompile_bytecode, DecompilerConfig, OutputFormat};
use massilia::loader::{load_hex, Program};
use massilia::ssa::{compile_ssa, Expression, SsaProgram};
use massilia::utils::opcodes::OpCode;

fn analyzed(hex: &str) -> SsaProgram {
    let bytes = load_hex(hex).unwrap();
    let mut ssa = compile_ssa(&Program::disassemble(&bytes), true).unwrap();
    compute_jump_targets(&mut ssa);
    compute_incoming(&mut ssa);
    ssa
}

#[test]
fn test_push_push_add() {
    // One block, reads 0 / writes 1, a single ADD statement.
    let bytes = load_hex("6005600301").unwrap();
    let program = Program::disassemble(&bytes);
    assert_eq!(program.blocks.len(), 1);
    assert_eq!(program.blocks[0].reads, 0);
    assert_eq!(program.blocks[0].writes, 1);

    let ssa = compile_ssa(&program, true).unwrap();
    let (_, block) = ssa.blocks().next().unwrap();
    assert_eq!(block.statements.len(), 1);
    assert_eq!(block.statements[0].to_string(), "x1 = ADD(0x3, 0x5)");
    assert_eq!(block.outputs, vec![Expression::Var(block.statements[0].output.unwrap())]);
}

#[test]
fn test_jump_chain_collapses() {
    // PUSH1 4, JUMP; STOP; JUMPDEST, PUSH1 1.
    let mut ssa = analyzed("600456005b6001");
    let target = ssa.block_by_offset(4).unwrap();
    let entry = ssa.ids()[0];
    assert_eq!(ssa.get(entry).unwrap().next_block, Some(target));

    let before = ssa.len();
    collapse_jumps(&mut ssa);
    assert_eq!(ssa.len(), before - 1);
    let merged = ssa.get(entry).unwrap();
    assert!(merged.statements.iter().all(|s| s.op != OpCode::JUMP));
}

#[test]
fn test_conditional_jump_to_jumpdest() {
    // PUSH1 3, PUSH1 4, EQ, PUSH1 8, JUMPI; JUMPDEST.
    let ssa = analyzed("60036004146008575b");
    let entry = ssa.ids()[0];
    let target = ssa.block_by_offset(8).unwrap();
    assert_eq!(ssa.get(entry).unwrap().cond_blocks, vec![Some(target)]);
    assert!(ssa.get(target).unwrap().label.starts_with("block_"));
}

#[test]
fn test_jumpi_error_idiom() {
    // PUSH1 2, JUMPI with the condition from the caller's stack: the branch
    // target is the synthetic error block.
    let ssa = analyzed("6002575b");
    let entry = ssa.ids()[0];
    let block = ssa.get(entry).unwrap();
    assert_eq!(block.inputs.len(), 1);
    let error = block.cond_blocks[0].unwrap();
    assert_eq!(ssa.get(error).unwrap().label, "ErrorTag");
}

#[test]
fn test_full_text_output() {
    let result = decompile_bytecode("6005600301", &DecompilerConfig::default()).unwrap();
    assert!(result.text.contains("block_0: (reads 0, writes 1)"));
    assert!(result.text.contains("0x0000\tPUSH1\t0x5"));
    assert!(result.text.contains("x1 = ADD(0x3, 0x5);"));
    assert!(result.text.contains("pragma solidity ^0.4.2;"));
    assert!(result.text.contains("contract Decompiled {"));
}

#[test]
fn test_storage_contract_pipeline() {
    // A solc-compiled get/set storage contract survives the whole pipeline.
    let hex = "6080604052600436106049576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff16806360fe47b114604e5780636d4ce63c146075575b600080fd5b348015605957600080fd5b5060736004803603810190808035906020019092919050505060a0565b005b348015608057600080fd5b50608760aa565b6040518082815260200191505060405180910390f35b8060008190555050565b60008054905090565b";
    let result = decompile_bytecode(hex, &DecompilerConfig::default()).unwrap();
    assert!(result.text.contains("SSTORE"));
    assert!(result.text.contains("SLOAD"));
    assert!(result.ssa.len() > 1);
}

#[test]
fn test_collapse_keeps_storage_semantics() {
    let hex = "6080604052600436106049576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff16806360fe47b114604e5780636d4ce63c146075575b600080fd5b348015605957600080fd5b5060736004803603810190808035906020019092919050505060a0565b005b348015608057600080fd5b50608760aa565b6040518082815260200191505060405180910390f35b8060008190555050565b60008054905090565b";
    let mut ssa = analyzed(hex);
    let count = |ssa: &SsaProgram, op: OpCode| -> usize {
        ssa.blocks()
            .flat_map(|(_, b)| b.statements.iter())
            .filter(|s| s.op == op)
            .count()
    };
    let sstores = count(&ssa, OpCode::SSTORE);
    let sloads = count(&ssa, OpCode::SLOAD);
    collapse_jumps(&mut ssa);
    // Merging never loses computation statements.
    assert_eq!(count(&ssa, OpCode::SSTORE), sstores);
    assert_eq!(count(&ssa, OpCode::SLOAD), sloads);
}

#[test]
fn test_creation_mode_end_to_end() {
    let result = decompile_bytecode(
        "60006000f35b6001600101",
        &DecompilerConfig {
            creation: true,
            error_tag: true,
            format: OutputFormat::Text,
        },
    )
    .unwrap();
    assert!(result.text.contains("create:"));
    // The entry block is re-based to offset 0.
    assert!(result.text.contains("0x0000 enter:"));
}
