//! ABI-dispatch recognition and compiler-boilerplate stripping.
//!
//! Solidity routes incoming calls through a dispatch block: the selector is
//! read from calldata, compared against each function's hash, and a JUMPI
//! sends matching calls to the function body. Each body carries a fixed
//! prologue (call-value guard, argument decoding) and epilogue (return-value
//! encoding) that this pass strips, leaving the body with its parameters as
//! inputs and its return values as outputs.

use crate::ssa::{BlockId, Expression, SsaProgram, StatementBlock, Variable};
use crate::utils::helpers::padded_hex;
use crate::utils::opcodes::OpCode;
use log::debug;
use primitive_types::U256;

/// Recognize the ABI dispatch in the second block and label every function
/// entry it references. A dispatch block that does not match the expected
/// shape leaves the program unchanged; a function body that does not match
/// the boilerplate shape stays unlabeled.
pub fn label_functions(ssa: &mut SsaProgram) {
    let ids = ssa.ids();
    let Some(&dispatch) = ids.get(1) else { return };
    let pairs = match ssa.get(dispatch).and_then(parse_dispatch) {
        Some(pairs) => pairs,
        None => {
            debug!("no ABI dispatch shape in second block");
            return;
        }
    };

    for (hash, target) in pairs {
        let Some(id) = ssa.block_by_offset(target) else {
            debug!("dispatch target 0x{target:x} matches no block");
            continue;
        };
        unboilerplate(ssa, id, hash);
    }
}

/// Parse the dispatch shape: three prologue statements, one
/// `x = EQ(hash, selector); JUMPI(x, target)` pair per function, two
/// epilogue statements. Returns the (hash, target) pairs, or `None` when the
/// block does not match.
fn parse_dispatch(block: &StatementBlock) -> Option<Vec<(U256, usize)>> {
    let stmts = &block.statements;
    if stmts.len() < 7 {
        return None;
    }
    let body = &stmts[3..stmts.len() - 2];
    if body.len() % 2 != 0 {
        return None;
    }

    let mut pairs = Vec::new();
    for pair in body.chunks(2) {
        let eq = &pair[0];
        let jumpi = &pair[1];
        if eq.op != OpCode::EQ || jumpi.op != OpCode::JUMPI {
            return None;
        }
        let hash = eq.inputs.iter().find_map(Expression::as_const)?;
        let cond = eq.output?;
        let target = jumpi.inputs.first().and_then(Expression::as_offset)?;
        // The branch must test exactly the selector comparison.
        match jumpi.inputs.get(1) {
            Some(Expression::Var(v)) if *v == cond => {}
            _ => return None,
        }
        pairs.push((hash, target));
    }
    Some(pairs)
}

/// Strip the compiler boilerplate from a function body and label it.
///
/// Header: JUMPDEST, the CALLVALUE guard and its JUMPI, then one
/// CALLDATALOAD/ADD pair per argument. Trailer: one MSTORE/ADD pair per
/// return value, the MLOAD that fetched the return pointer, and the final
/// MLOAD/SUB/RETURN triple. The shape is verified before anything mutates;
/// a mismatch leaves the block untouched.
fn unboilerplate(ssa: &mut SsaProgram, id: BlockId, hash: U256) {
    let Some(block) = ssa.get(id) else { return };
    let stmts = &block.statements;
    let n = stmts.len();

    if n < 6
        || stmts[0].op != OpCode::JUMPDEST
        || stmts[1].op != OpCode::CALLVALUE
        || stmts[2].op != OpCode::JUMPI
    {
        debug!("{}: no function prologue", block.label);
        return;
    }

    // Argument decoding: each parameter is loaded from calldata and the
    // read cursor advanced.
    let mut header = 3;
    let mut params: Vec<Variable> = Vec::new();
    while header + 1 < n
        && stmts[header].op == OpCode::CALLDATALOAD
        && stmts[header + 1].op == OpCode::ADD
    {
        match stmts[header].output {
            Some(var) => params.push(var),
            None => return,
        }
        header += 2;
    }

    if n < header + 3
        || stmts[n - 1].op != OpCode::RETURN
        || stmts[n - 2].op != OpCode::SUB
        || stmts[n - 3].op != OpCode::MLOAD
    {
        debug!("{}: no function epilogue", block.label);
        return;
    }

    // Return-value encoding: each value is stored through the write cursor,
    // scanning backwards from the RETURN.
    let mut trailer = 3;
    let mut returns: Vec<Expression> = Vec::new();
    while n > header + trailer + 1 && stmts[n - trailer - 1].op == OpCode::ADD {
        if n < header + trailer + 2 || stmts[n - trailer - 2].op != OpCode::MSTORE {
            debug!("{}: broken return encoding", block.label);
            return;
        }
        match stmts[n - trailer - 2].inputs.get(1) {
            Some(value) => returns.push(value.clone()),
            None => return,
        }
        trailer += 2;
    }
    // The statement before the first store fetched the return pointer.
    if n < header + trailer + 1 || stmts[n - trailer - 1].op != OpCode::MLOAD {
        debug!("{}: missing return pointer load", block.label);
        return;
    }
    trailer += 1;
    returns.reverse();

    let label = format!("func_{}", padded_hex(hash, 8));
    let Some(block) = ssa.get_mut(id) else { return };
    debug!("labelling {} as {label}", block.label);
    block.label = label;
    block.statements = block.statements[header..n - trailer].to_vec();
    block.inputs.extend(params);
    block.outputs = returns;
}
