//! Bytecode loading and basic-block disassembly.
//!
//! Parses EVM bytecode into basic blocks, recording each block's starting
//! byte offset and its stack-effect summary (maximum depth read from the
//! caller's stack, net items left behind).

use crate::errors::{DecodeError, MAX_BYTECODE_SIZE};
use crate::utils::opcodes::OpCode;
use primitive_types::U256;
use std::collections::HashMap;

/// A decoded instruction: byte offset, opcode, optional immediate.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub offset: usize,
    pub op: OpCode,
    pub arg: Option<U256>,
}

/// A maximal straight-line run of instructions.
///
/// `reads` is the deepest index read from the stack the block was entered
/// with; `writes` is the number of items it leaves for its successors.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub offset: usize,
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub reads: usize,
    pub writes: usize,
}

impl BasicBlock {
    fn new(index: usize, offset: usize) -> Self {
        Self {
            offset,
            label: format!("block_{index}"),
            instructions: Vec::new(),
            reads: 0,
            writes: 0,
        }
    }
}

/// The disassembled program: blocks in bytecode order plus a lookup from
/// JUMPDEST byte offset to the index of the block it opens.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub blocks: Vec<BasicBlock>,
    pub jump_dests: HashMap<usize, usize>,
}

/// Decode a hex string into bytes.
///
/// Accepts an optional `0x` prefix and arbitrary interior whitespace, and
/// rejects empty, odd-length, and non-hex input.
pub fn load_hex(source: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = source.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let cleaned: String = trimmed.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(DecodeError::EmptyBytecode);
    }

    let bytes = hex::decode(&cleaned).map_err(|_| {
        DecodeError::InvalidHex(if cleaned.len() > 40 {
            format!("{}...", &cleaned[..40])
        } else {
            cleaned.clone()
        })
    })?;

    if bytes.len() > MAX_BYTECODE_SIZE {
        return Err(DecodeError::BytecodeTooLarge(bytes.len(), MAX_BYTECODE_SIZE));
    }

    Ok(bytes)
}

impl Program {
    /// Disassemble bytecode into basic blocks.
    ///
    /// A new block starts immediately before every JUMPDEST (which belongs to
    /// the block it opens) and immediately after every control-flow opcode.
    /// PUSH immediates are big-endian; an immediate truncated by the end of
    /// the stream is zero-padded on the right.
    pub fn disassemble(bytecode: &[u8]) -> Program {
        let mut program = Program::default();
        let mut block = BasicBlock::new(0, 0);
        let mut cursor: i64 = 0;

        let mut i = 0usize;
        while i < bytecode.len() {
            let op = OpCode(bytecode[i]);
            let size = op.operand_size();

            let arg = if size > 0 {
                let mut val = U256::zero();
                for j in 1..=size {
                    val = val << 8;
                    if i + j < bytecode.len() {
                        val = val | U256::from(bytecode[i + j] as u64);
                    }
                }
                Some(val)
            } else {
                None
            };

            if op == OpCode::JUMPDEST {
                if !block.instructions.is_empty() {
                    program.blocks.push(block);
                    block = BasicBlock::new(program.blocks.len(), i);
                }
                cursor = 0;
                program.jump_dests.insert(i, program.blocks.len());
            }

            block.instructions.push(Instruction { offset: i, op, arg });

            // Stack summary: the deepest read observed, then the net effect.
            cursor -= op.stack_reads() as i64;
            if cursor < 0 && (-cursor) as usize > block.reads {
                block.reads = (-cursor) as usize;
            }
            cursor += op.stack_writes() as i64;
            block.writes = (cursor + block.reads as i64) as usize;

            if op.is_control_flow() {
                program.blocks.push(block);
                block = BasicBlock::new(program.blocks.len(), i + size + 1);
                cursor = 0;
            }

            i += size + 1;
        }

        if !block.instructions.is_empty() {
            program.blocks.push(block);
        }

        program
    }

    /// Treat the program as contract-creation code.
    ///
    /// The first block is the `solc` setup stub (MSTORE, CODECOPY, RETURN) and
    /// the second is the deployed contract's entry point; every block from the
    /// entry point onward is re-based so the contract's address space starts
    /// at 0.
    pub fn parse_creation(&mut self) {
        if self.blocks.len() < 2 {
            return;
        }
        self.blocks[0].label = "create".to_string();
        self.blocks[1].label = "enter".to_string();

        let enter = self.blocks[1].offset;
        for block in &mut self.blocks[1..] {
            block.offset -= enter;
        }
        self.jump_dests = self
            .jump_dests
            .iter()
            .map(|(&offset, &idx)| {
                if idx >= 1 {
                    (offset - enter, idx)
                } else {
                    (offset, idx)
                }
            })
            .collect();
    }
}
