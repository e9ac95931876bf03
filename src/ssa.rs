//! SSA form of a disassembled program.
//!
//! Each basic block is replayed against a symbolic stack seeded with fresh
//! input variables; opcodes that move data without computing (PUSH, DUP,
//! SWAP, POP) are absorbed into the stack, everything else becomes a
//! statement with explicit inputs and at most one output variable.

use crate::errors::LiftError;
use crate::loader::{BasicBlock, Program};
use crate::stack::Stack;
use crate::utils::opcodes::OpCode;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable index of a statement block within its program's arena.
pub type BlockId = usize;

/// Byte offset of the synthetic error block: the default jump target the
/// Solidity compiler emits for failed checks.
pub const ERROR_TAG_OFFSET: usize = 2;

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A single-assignment variable, identified by the counter value at its
/// allocation. The display label is derived from the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub id: u32,
}

impl Variable {
    pub fn label(&self) -> String {
        format!("x{}", self.id)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.id)
    }
}

// -- Serde helpers for U256 --------------------------------------------------

mod u256_serde {
    use primitive_types::U256;
    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize a U256 as a hex string (e.g. `"0x1a2b"`).
    pub fn serialize<S: Serializer>(val: &U256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{val:x}"))
    }

    /// Deserialize a U256 from a hex string (with or without `0x` prefix).
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        let hex_str = String::deserialize(d)?;
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(&hex_str);
        U256::from_str_radix(hex_str, 16).map_err(serde::de::Error::custom)
    }
}

/// A value on the abstract stack.
///
/// `Phi` is the merge placeholder for a later resolution pass; nothing in the
/// current pipeline synthesizes one, because every merge performed today has
/// a unique predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression {
    Const(#[serde(with = "u256_serde")] U256),
    Var(Variable),
    Phi,
}

impl Expression {
    pub fn as_const(&self) -> Option<U256> {
        match self {
            Expression::Const(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<Variable> {
        match self {
            Expression::Var(v) => Some(*v),
            _ => None,
        }
    }

    /// A constant small enough to be a byte offset into the program.
    pub fn as_offset(&self) -> Option<usize> {
        match self {
            Expression::Const(v) if *v <= U256::from(usize::MAX as u64) => {
                Some(v.low_u64() as usize)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Const(v) => write!(f, "0x{v:x}"),
            Expression::Var(v) => write!(f, "{v}"),
            Expression::Phi => write!(f, "phi"),
        }
    }
}

// ---------------------------------------------------------------------------
// Statements and blocks
// ---------------------------------------------------------------------------

/// One lifted operation. Inputs appear in pop order (first popped = first
/// input); the output is present iff the opcode writes exactly one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub op: OpCode,
    pub inputs: Vec<Expression>,
    pub output: Option<Variable>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(out) = &self.output {
            write!(f, "{out} = ")?;
        }
        write!(f, "{}(", self.op)?;
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{input}")?;
        }
        write!(f, ")")
    }
}

/// A lifted basic block.
///
/// `inputs` are the variables seeded for the stack the block was entered
/// with and `outputs` the expressions it leaves behind; in both lists index
/// 0 is the deepest stack element. `cond_blocks` holds one entry per JUMPI
/// in textual order (`None` for an unresolved target).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementBlock {
    pub offset: usize,
    pub label: String,
    pub statements: Vec<Statement>,
    pub inputs: Vec<Variable>,
    pub outputs: Vec<Expression>,
    #[serde(skip)]
    pub incoming: BTreeSet<BlockId>,
    pub next_block: Option<BlockId>,
    pub cond_blocks: Vec<Option<BlockId>>,
}

impl StatementBlock {
    fn new(offset: usize, label: String) -> Self {
        Self {
            offset,
            label,
            statements: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            incoming: BTreeSet::new(),
            next_block: None,
            cond_blocks: Vec::new(),
        }
    }

    /// Whether execution can continue into the textually following block.
    pub fn can_fall_through(&self) -> bool {
        match self.statements.last() {
            None => true,
            Some(s) => !matches!(
                s.op,
                OpCode::JUMP | OpCode::RETURN | OpCode::SELFDESTRUCT | OpCode::STOP
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Program arena
// ---------------------------------------------------------------------------

/// The SSA program: an arena of blocks addressed by stable `BlockId`s.
///
/// Edges between blocks are ids, never owned references, so removing a block
/// during collapsing is a slot vacate; iteration skips vacated slots and
/// preserves bytecode order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SsaProgram {
    slots: Vec<Option<StatementBlock>>,
}

impl SsaProgram {
    pub fn push(&mut self, block: StatementBlock) -> BlockId {
        self.slots.push(Some(block));
        self.slots.len() - 1
    }

    pub fn get(&self, id: BlockId) -> Option<&StatementBlock> {
        self.slots.get(id).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut StatementBlock> {
        self.slots.get_mut(id).and_then(|s| s.as_mut())
    }

    /// Vacate a slot, returning the block that occupied it.
    pub fn remove(&mut self, id: BlockId) -> Option<StatementBlock> {
        self.slots.get_mut(id).and_then(|s| s.take())
    }

    /// Ids of all live blocks, in bytecode order.
    pub fn ids(&self) -> Vec<BlockId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|_| id))
            .collect()
    }

    /// Iterate over live blocks in bytecode order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &StatementBlock)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|b| (id, b)))
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the live block starting at the given byte offset.
    pub fn block_by_offset(&self, offset: usize) -> Option<BlockId> {
        self.blocks()
            .find(|(_, b)| b.offset == offset)
            .map(|(id, _)| id)
    }

    /// The label of a block, if it is live.
    pub fn label_of(&self, id: BlockId) -> Option<&str> {
        self.get(id).map(|b| b.label.as_str())
    }
}

// ---------------------------------------------------------------------------
// Lifting
// ---------------------------------------------------------------------------

/// Allocator for single-assignment variable ids. One context lives for the
/// duration of a lift; it is never shared across lifts, so concurrent callers
/// each get their own numbering.
#[derive(Debug, Default)]
pub struct LiftContext {
    next_var: u32,
}

impl LiftContext {
    pub fn fresh(&mut self) -> Variable {
        self.next_var += 1;
        Variable { id: self.next_var }
    }
}

/// Lift one basic block to SSA.
pub fn compile_block(
    block: &BasicBlock,
    ctx: &mut LiftContext,
) -> Result<StatementBlock, LiftError> {
    let mut lifted = StatementBlock::new(block.offset, block.label.clone());
    let mut stack: Stack<Expression> = Stack::new();

    // Seed the stack with one fresh variable per item the block reads from
    // its caller; inputs[0] is the deepest.
    for _ in 0..block.reads {
        let var = ctx.fresh();
        lifted.inputs.push(var);
        stack.push(Expression::Var(var));
    }

    for inst in &block.instructions {
        let op = inst.op;

        if op.is_push() {
            stack.push(Expression::Const(inst.arg.unwrap_or_default()));
            continue;
        }
        if op.is_dup() {
            stack
                .try_dup(op.operand_suffix())
                .map_err(|source| LiftError::Stack { source, offset: inst.offset })?;
            continue;
        }
        if op.is_swap() {
            stack
                .try_swap(op.operand_suffix())
                .map_err(|source| LiftError::Stack { source, offset: inst.offset })?;
            continue;
        }
        if op == OpCode::POP {
            stack
                .try_pop()
                .map_err(|source| LiftError::Stack { source, offset: inst.offset })?;
            continue;
        }

        let mut statement = Statement {
            op,
            inputs: Vec::new(),
            output: None,
        };
        for _ in 0..op.stack_reads() {
            let input = stack
                .try_pop()
                .map_err(|source| LiftError::Stack { source, offset: inst.offset })?;
            statement.inputs.push(input);
        }
        match op.stack_writes() {
            0 => {}
            1 => {
                let var = ctx.fresh();
                stack.push(Expression::Var(var));
                statement.output = Some(var);
            }
            _ => {
                return Err(LiftError::MultiOutput {
                    op,
                    offset: inst.offset,
                })
            }
        }
        lifted.statements.push(statement);
    }

    lifted.outputs = stack.into_items();
    Ok(lifted)
}

/// Lift a whole program to SSA.
///
/// Fall-through edges to the textually following block are wired here; jump
/// edges are resolved later by the CFG analyzer. When `with_error_tag` is set
/// a synthetic empty block is appended at byte offset 2 so the compiler's
/// error-jump idiom resolves.
pub fn compile_ssa(program: &Program, with_error_tag: bool) -> Result<SsaProgram, LiftError> {
    let mut ctx = LiftContext::default();
    let mut ssa = SsaProgram::default();
    let mut prev: Option<BlockId> = None;

    for block in &program.blocks {
        let lifted = compile_block(block, &mut ctx)?;
        let id = ssa.push(lifted);
        if let Some(prev_id) = prev {
            let falls = ssa.get(prev_id).map(|b| b.can_fall_through()).unwrap_or(false);
            if falls {
                if let Some(prev_block) = ssa.get_mut(prev_id) {
                    prev_block.next_block = Some(id);
                }
            }
        }
        prev = Some(id);
    }

    if with_error_tag {
        ssa.push(StatementBlock::new(
            ERROR_TAG_OFFSET,
            "ErrorTag".to_string(),
        ));
    }

    Ok(ssa)
}
