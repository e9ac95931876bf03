//! Control-flow wiring and block collapsing over the SSA program.
//!
//! Jump targets are resolved only when the popped target address is a
//! constant; anything else stays a dangling edge that the printers render
//! raw. Collapsing splices a block into its unique predecessor, renaming the
//! spliced block's inputs to the predecessor's outputs.

use crate::ssa::{BlockId, Expression, SsaProgram, Statement, Variable};
use crate::utils::opcodes::OpCode;
use log::{debug, warn};

/// Re-resolve the jump edges of one block from its statements.
///
/// A constant JUMP sets `next_block` (clearing it when the target matches no
/// block); each JUMPI appends one entry to `cond_blocks` in textual order,
/// `None` when its target cannot be resolved.
pub fn update_jump_targets(ssa: &mut SsaProgram, id: BlockId) {
    let Some(block) = ssa.get(id) else { return };

    let mut next: Option<Option<BlockId>> = None;
    let mut conds: Vec<Option<BlockId>> = Vec::new();

    for statement in &block.statements {
        if statement.op != OpCode::JUMP && statement.op != OpCode::JUMPI {
            continue;
        }
        // The target address is popped first.
        let target = statement.inputs.first().and_then(Expression::as_offset);
        let resolved = target.and_then(|t| ssa.block_by_offset(t));

        if statement.op == OpCode::JUMPI {
            if resolved.is_none() {
                warn!("unresolved JUMPI target in {}", block.label);
            }
            conds.push(resolved);
        } else if let Some(t) = target {
            if resolved.is_none() {
                warn!("JUMP to 0x{t:x} matches no block");
            }
            next = Some(resolved);
        }
        // A JUMP through a computed value is left as a dangling edge.
    }

    let Some(block) = ssa.get_mut(id) else { return };
    if let Some(resolved) = next {
        block.next_block = resolved;
    }
    block.cond_blocks = conds;
}

/// Resolve jump edges for every block.
pub fn compute_jump_targets(ssa: &mut SsaProgram) {
    for id in ssa.ids() {
        update_jump_targets(ssa, id);
    }
}

/// Rebuild every block's predecessor set from the forward edges.
pub fn compute_incoming(ssa: &mut SsaProgram) {
    let ids = ssa.ids();
    for &id in &ids {
        if let Some(block) = ssa.get_mut(id) {
            block.incoming.clear();
        }
    }
    for &source in &ids {
        let targets: Vec<BlockId> = {
            let Some(block) = ssa.get(source) else { continue };
            block
                .next_block
                .into_iter()
                .chain(block.cond_blocks.iter().flatten().copied())
                .collect()
        };
        for target in targets {
            if let Some(block) = ssa.get_mut(target) {
                block.incoming.insert(source);
            }
        }
    }
}

/// Merge block `id` into its predecessor `pred`.
///
/// The caller guarantees `pred` is the unique predecessor and reaches `id`
/// through `next_block`. Alignment, renaming, splicing, and edge rewiring
/// happen in that order.
pub fn merge_blocks(ssa: &mut SsaProgram, pred: BlockId, id: BlockId) {
    let Some(mut child) = ssa.remove(id) else { return };
    {
        let Some(p) = ssa.get_mut(pred) else { return };
        debug!("merging {} into {}", child.label, p.label);

        // Alignment: index 0 is the deepest element on both sides. When the
        // child reaches deeper than the predecessor produces, the deficit is
        // passed through from the predecessor's own callers.
        let out = p.outputs.len();
        let inn = child.inputs.len();
        if inn > out {
            let extra: Vec<Variable> = child.inputs[..inn - out].to_vec();
            p.inputs.splice(0..0, extra.iter().copied());
            p.outputs
                .splice(0..0, extra.iter().copied().map(Expression::Var));
        }
        let shift = p.outputs.len() - child.inputs.len();

        // Renaming: each child input becomes the aligned predecessor output.
        for (i, var) in child.inputs.iter().enumerate() {
            let replacement = p.outputs[shift + i].clone();
            for statement in &mut child.statements {
                substitute(statement, var, &replacement);
            }
            for output in &mut child.outputs {
                if *output == Expression::Var(*var) {
                    *output = replacement.clone();
                }
            }
        }

        // The predecessor's outputs below the child's reach pass through
        // beneath everything the child leaves behind.
        let mut merged_outputs: Vec<Expression> = p.outputs[..shift].to_vec();
        merged_outputs.extend(child.outputs);

        // The jump that led into the child is now implicit.
        if p.statements.last().map(|s| s.op) == Some(OpCode::JUMP) {
            p.statements.pop();
        }
        p.statements.extend(
            child
                .statements
                .into_iter()
                .filter(|s| s.op != OpCode::JUMPDEST),
        );
        p.outputs = merged_outputs;
        p.next_block = child.next_block;
    }

    update_jump_targets(ssa, pred);
    compute_incoming(ssa);
}

/// Replace every occurrence of `from` in the statement with `to`.
///
/// Variables are matched by identity (their id); constants are never
/// substituted. An output matching `from` is reassigned to the destination
/// variable when the destination is one.
fn substitute(statement: &mut Statement, from: &Variable, to: &Expression) {
    for input in &mut statement.inputs {
        if let Expression::Var(v) = input {
            if v == from {
                *input = to.clone();
            }
        }
    }
    if statement.output.as_ref() == Some(from) {
        if let Expression::Var(v) = to {
            statement.output = Some(*v);
        }
    }
}

/// Collapse straight-line chains: repeatedly merge any block whose unique
/// predecessor reaches it by fall-through or unconditional jump. Terminates
/// because every merge removes a block.
pub fn collapse_jumps(ssa: &mut SsaProgram) {
    while let Some((pred, id)) = find_mergeable(ssa) {
        merge_blocks(ssa, pred, id);
    }
}

fn find_mergeable(ssa: &SsaProgram) -> Option<(BlockId, BlockId)> {
    for (id, block) in ssa.blocks() {
        if block.incoming.len() != 1 {
            continue;
        }
        let pred = *block.incoming.iter().next()?;
        if pred == id {
            continue;
        }
        // The child must be reached as the successor, not as the taken
        // branch of a conditional.
        if ssa.get(pred).and_then(|p| p.next_block) == Some(id) {
            return Some((pred, id));
        }
    }
    None
}
