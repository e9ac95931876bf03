//! Error types for the three places the pipeline can fail: decoding the hex
//! input, driving the symbolic stack, and lifting a block to SSA.
//!
//! These are `thiserror` enums so callers can match on the failure; the CLI
//! wraps them in `anyhow` at the boundary. Unresolved jumps and pattern
//! mismatches have no error type: they degrade output, never abort.

use crate::utils::opcodes::OpCode;
use thiserror::Error;

/// Errors from the bytecode loader.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid hex input: {0}")]
    InvalidHex(String),

    #[error("empty bytecode")]
    EmptyBytecode,

    #[error("bytecode too large ({0} bytes, max {1})")]
    BytecodeTooLarge(usize, usize),
}

/// Errors from the symbolic stack.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    #[error("stack underflow: needed {needed} items, have {have}")]
    Underflow { needed: usize, have: usize },

    #[error("dup{0} out of range (stack depth {1})")]
    DupOutOfRange(usize, usize),

    #[error("swap{0} out of range (stack depth {1})")]
    SwapOutOfRange(usize, usize),
}

/// Errors from the SSA lifter.
#[derive(Debug, Error)]
pub enum LiftError {
    #[error("{source} at byte offset 0x{offset:x}")]
    Stack {
        #[source]
        source: StackError,
        offset: usize,
    },

    #[error("opcode {op} writes more than one stack item at byte offset 0x{offset:x}")]
    MultiOutput { op: OpCode, offset: usize },
}

/// Input size cap: EIP-170 limits deployed contracts to 24 KB, so anything
/// larger is not a runtime image worth lifting.
pub const MAX_BYTECODE_SIZE: usize = 24_576;
