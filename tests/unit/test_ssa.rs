//! SSA lifter tests — statement structure and program-wide invariants.

use massilia::loader::{load_hex, Program};
use massilia::ssa::{compile_ssa, Expression, SsaProgram};
use std::collections::HashSet;

const STORAGE_RUNTIME: &str = "6080604052600436106049576000357c0100000000000000000000000000000000000000000000000000000000900463ffffffff16806360fe47b114604e5780636d4ce63c146075575b600080fd5b348015605957600080fd5b5060736004803603810190808035906020019092919050505060a0565b005b348015608057600080fd5b50608760aa565b6040518082815260200191505060405180910390f35b8060008190555050565b60008054905090565b";

fn lift_hex(hex: &str) -> SsaProgram {
    let bytes = load_hex(hex).unwrap();
    compile_ssa(&Program::disassemble(&bytes), true).unwrap()
}

#[test]
fn test_add_program() {
    // PUSH1 5, PUSH1 3, ADD: one block, one statement, one output.
    let ssa = lift_hex("6005600301");
    let (_, block) = ssa.blocks().next().unwrap();
    assert_eq!(block.statements.len(), 1);
    assert_eq!(block.statements[0].to_string(), "x1 = ADD(0x3, 0x5)");
    assert_eq!(block.outputs.len(), 1);
    assert!(block.inputs.is_empty());
}

#[test]
fn test_inputs_match_source_block_reads() {
    let bytes = load_hex(STORAGE_RUNTIME).unwrap();
    let program = Program::disassemble(&bytes);
    let ssa = compile_ssa(&program, false).unwrap();
    for (basic, (_, lifted)) in program.blocks.iter().zip(ssa.blocks()) {
        assert_eq!(basic.reads, lifted.inputs.len(), "{}", lifted.label);
        assert_eq!(basic.offset, lifted.offset);
    }
}

#[test]
fn test_statement_inputs_are_reachable_definitions() {
    // Every variable a statement consumes is a block input or an earlier
    // output of the same block.
    let ssa = lift_hex(STORAGE_RUNTIME);
    for (_, block) in ssa.blocks() {
        let mut defined: HashSet<u32> = block.inputs.iter().map(|v| v.id).collect();
        for statement in &block.statements {
            for input in &statement.inputs {
                if let Expression::Var(v) = input {
                    assert!(defined.contains(&v.id), "{} in {}", v, block.label);
                }
            }
            if let Some(out) = statement.output {
                defined.insert(out.id);
            }
        }
    }
}

#[test]
fn test_variable_labels_unique_per_lift() {
    let ssa = lift_hex(STORAGE_RUNTIME);
    let mut seen = HashSet::new();
    for (_, block) in ssa.blocks() {
        for var in &block.inputs {
            assert!(seen.insert(var.label()));
        }
        for statement in &block.statements {
            if let Some(out) = statement.output {
                assert!(seen.insert(out.label()));
            }
        }
    }
    assert!(!seen.is_empty());
}

#[test]
fn test_counter_resets_between_lifts() {
    // Two lifts of the same program number their variables identically.
    let a = lift_hex("6005600301");
    let b = lift_hex("6005600301");
    let stmt_a = &a.blocks().next().unwrap().1.statements[0];
    let stmt_b = &b.blocks().next().unwrap().1.statements[0];
    assert_eq!(stmt_a.to_string(), stmt_b.to_string());
}

#[test]
fn test_statement_input_count_matches_opcode() {
    let ssa = lift_hex(STORAGE_RUNTIME);
    for (_, block) in ssa.blocks() {
        for statement in &block.statements {
            assert_eq!(
                statement.inputs.len(),
                statement.op.stack_reads(),
                "{} in {}",
                statement.op,
                block.label
            );
            assert_eq!(statement.output.is_some(), statement.op.stack_writes() == 1);
        }
    }
}

#[test]
fn test_outputs_deepest_first() {
    // PUSH1 1, PUSH1 2, PUSH1 3 leaves [1, 2, 3] with 3 on top.
    let ssa = lift_hex("600160026003");
    let (_, block) = ssa.blocks().next().unwrap();
    assert_eq!(
        block.outputs,
        vec![
            Expression::Const(1u64.into()),
            Expression::Const(2u64.into()),
            Expression::Const(3u64.into()),
        ]
    );
}

#[test]
fn test_error_tag_appended_last() {
    let ssa = lift_hex("6005600301");
    let last = ssa.blocks().last().unwrap().1;
    assert_eq!(last.label, "ErrorTag");
    assert_eq!(last.offset, 2);
}
