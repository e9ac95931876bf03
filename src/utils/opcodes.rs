//! EVM opcode definitions.
//!
//! Every opcode is a single byte; its stack effects, immediate size, and
//! surface-syntax convention are pure functions of that byte. Bytes outside
//! the known set are treated as opaque no-effect instructions and survive
//! disassembly verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single EVM opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpCode(pub u8);

/// How a statement built from an opcode is rendered as contract source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// A named constant: `msg.sender`, `block.timestamp`, …
    Nullary,
    /// Prefix operator: `!x`, `~x`.
    Unary,
    /// Infix operator: `a + b`.
    Binary,
    /// Free function call: `sha3(a, b)`.
    Function,
    /// Field access on the first operand: `a.balance`.
    Field,
    /// Member call on the first operand: `a.call(…)`.
    Member,
}

impl OpCode {
    pub const STOP: OpCode = OpCode(0x00);
    pub const ADD: OpCode = OpCode(0x01);
    pub const MUL: OpCode = OpCode(0x02);
    pub const SUB: OpCode = OpCode(0x03);
    pub const DIV: OpCode = OpCode(0x04);
    pub const SDIV: OpCode = OpCode(0x05);
    pub const MOD: OpCode = OpCode(0x06);
    pub const SMOD: OpCode = OpCode(0x07);
    pub const ADDMOD: OpCode = OpCode(0x08);
    pub const MULMOD: OpCode = OpCode(0x09);
    pub const EXP: OpCode = OpCode(0x0a);
    pub const LT: OpCode = OpCode(0x10);
    pub const GT: OpCode = OpCode(0x11);
    pub const SLT: OpCode = OpCode(0x12);
    pub const SGT: OpCode = OpCode(0x13);
    pub const EQ: OpCode = OpCode(0x14);
    pub const ISZERO: OpCode = OpCode(0x15);
    pub const AND: OpCode = OpCode(0x16);
    pub const OR: OpCode = OpCode(0x17);
    pub const XOR: OpCode = OpCode(0x18);
    pub const NOT: OpCode = OpCode(0x19);
    pub const SHA3: OpCode = OpCode(0x20);
    pub const ADDRESS: OpCode = OpCode(0x30);
    pub const BALANCE: OpCode = OpCode(0x31);
    pub const ORIGIN: OpCode = OpCode(0x32);
    pub const CALLER: OpCode = OpCode(0x33);
    pub const CALLVALUE: OpCode = OpCode(0x34);
    pub const CALLDATALOAD: OpCode = OpCode(0x35);
    pub const CALLDATASIZE: OpCode = OpCode(0x36);
    pub const CALLDATACOPY: OpCode = OpCode(0x37);
    pub const CODESIZE: OpCode = OpCode(0x38);
    pub const CODECOPY: OpCode = OpCode(0x39);
    pub const GASPRICE: OpCode = OpCode(0x3a);
    pub const EXTCODESIZE: OpCode = OpCode(0x3b);
    pub const EXTCODECOPY: OpCode = OpCode(0x3c);
    pub const BLOCKHASH: OpCode = OpCode(0x40);
    pub const COINBASE: OpCode = OpCode(0x41);
    pub const TIMESTAMP: OpCode = OpCode(0x42);
    pub const NUMBER: OpCode = OpCode(0x43);
    pub const DIFFICULTY: OpCode = OpCode(0x44);
    pub const GASLIMIT: OpCode = OpCode(0x45);
    pub const POP: OpCode = OpCode(0x50);
    pub const MLOAD: OpCode = OpCode(0x51);
    pub const MSTORE: OpCode = OpCode(0x52);
    pub const MSTORE8: OpCode = OpCode(0x53);
    pub const SLOAD: OpCode = OpCode(0x54);
    pub const SSTORE: OpCode = OpCode(0x55);
    pub const JUMP: OpCode = OpCode(0x56);
    pub const JUMPI: OpCode = OpCode(0x57);
    pub const PC: OpCode = OpCode(0x58);
    pub const MSIZE: OpCode = OpCode(0x59);
    pub const GAS: OpCode = OpCode(0x5a);
    pub const JUMPDEST: OpCode = OpCode(0x5b);
    pub const PUSH1: OpCode = OpCode(0x60);
    pub const PUSH32: OpCode = OpCode(0x7f);
    pub const DUP1: OpCode = OpCode(0x80);
    pub const SWAP1: OpCode = OpCode(0x90);
    pub const LOG0: OpCode = OpCode(0xa0);
    pub const CREATE: OpCode = OpCode(0xf0);
    pub const CALL: OpCode = OpCode(0xf1);
    pub const CALLCODE: OpCode = OpCode(0xf2);
    pub const RETURN: OpCode = OpCode(0xf3);
    pub const DELEGATECALL: OpCode = OpCode(0xf4);
    pub const SELFDESTRUCT: OpCode = OpCode(0xff);

    /// Number of immediate operand bytes following the opcode (PUSHn only).
    pub fn operand_size(self) -> usize {
        match self.0 {
            0x60..=0x7f => (self.0 - 0x5f) as usize,
            _ => 0,
        }
    }

    /// Number of stack items consumed.
    ///
    /// DUPn reads depth n and SWAPn depth n+1; the SSA lifter never consults
    /// these for the PUSH/DUP/SWAP/POP families, which it handles structurally.
    pub fn stack_reads(self) -> usize {
        match self.0 {
            0x01..=0x07 | 0x0a | 0x10..=0x14 | 0x16..=0x18 | 0x20 => 2,
            0x08 | 0x09 => 3,
            0x15 | 0x19 => 1,
            0x31 | 0x35 | 0x3b | 0x40 => 1,
            0x37 | 0x39 => 3,
            0x3c => 4,
            0x50 | 0x51 | 0x54 | 0x56 => 1,
            0x52 | 0x53 | 0x55 | 0x57 => 2,
            0x80..=0x8f => (self.0 - 0x7f) as usize,
            0x90..=0x9f => (self.0 - 0x8f + 1) as usize,
            0xa0..=0xa4 => (self.0 - 0xa0 + 2) as usize,
            0xf0 => 3,
            0xf1 | 0xf2 => 7,
            0xf3 => 2,
            0xf4 => 6,
            0xff => 1,
            _ => 0,
        }
    }

    /// Number of stack items produced.
    pub fn stack_writes(self) -> usize {
        match self.0 {
            0x01..=0x0a | 0x10..=0x19 | 0x20 => 1,
            0x30..=0x36 | 0x38 | 0x3a | 0x3b => 1,
            0x40..=0x45 => 1,
            0x51 | 0x54 | 0x58..=0x5a => 1,
            0x60..=0x7f => 1,
            0x80..=0x8f => (self.0 - 0x7f + 1) as usize,
            0x90..=0x9f => (self.0 - 0x8f + 1) as usize,
            0xf0..=0xf2 | 0xf4 => 1,
            _ => 0,
        }
    }

    /// True for opcodes that terminate a basic block.
    pub fn is_control_flow(self) -> bool {
        matches!(
            self,
            OpCode::JUMP | OpCode::JUMPI | OpCode::RETURN | OpCode::STOP | OpCode::SELFDESTRUCT
        )
    }

    pub fn is_push(self) -> bool {
        matches!(self.0, 0x60..=0x7f)
    }

    pub fn is_dup(self) -> bool {
        matches!(self.0, 0x80..=0x8f)
    }

    pub fn is_swap(self) -> bool {
        matches!(self.0, 0x90..=0x9f)
    }

    pub fn is_log(self) -> bool {
        matches!(self.0, 0xa0..=0xa4)
    }

    /// The numeric suffix of a PUSHn/DUPn/SWAPn opcode (DUP5 → 5), 0 otherwise.
    pub fn operand_suffix(self) -> usize {
        match self.0 {
            0x60..=0x7f => (self.0 - 0x5f) as usize,
            0x80..=0x8f => (self.0 - 0x7f) as usize,
            0x90..=0x9f => (self.0 - 0x8f) as usize,
            _ => 0,
        }
    }

    /// Whether the byte is part of the known opcode set.
    pub fn is_known(self) -> bool {
        matches!(
            self.0,
            0x00..=0x0a
                | 0x10..=0x19
                | 0x20
                | 0x30..=0x3c
                | 0x40..=0x45
                | 0x50..=0x5b
                | 0x60..=0xa4
                | 0xf0..=0xf4
                | 0xff
        )
    }

    /// The surface-syntax convention used when rendering contract source.
    pub fn convention(self) -> Convention {
        match self.0 {
            0x30 | 0x32..=0x34 | 0x36 | 0x38 | 0x3a | 0x41..=0x45 | 0x58..=0x5a => {
                Convention::Nullary
            }
            0x15 | 0x19 => Convention::Unary,
            0x01..=0x07 | 0x0a | 0x10..=0x14 | 0x16..=0x18 => Convention::Binary,
            0x31 | 0x3b => Convention::Field,
            0xf1 | 0xf2 | 0xf4 => Convention::Member,
            _ => Convention::Function,
        }
    }

    /// The name or operator symbol used by `convention()` rendering.
    pub fn surface_name(self) -> &'static str {
        match self.0 {
            0x00 => "stop",
            0x01 => "+",
            0x02 => "*",
            0x03 => "-",
            0x04 | 0x05 => "/",
            0x06 | 0x07 => "%",
            0x08 => "addmod",
            0x09 => "mulmod",
            0x0a => "**",
            0x10 | 0x12 => "<",
            0x11 | 0x13 => ">",
            0x14 => "==",
            0x15 => "!",
            0x16 => "&",
            0x17 => "|",
            0x18 => "^",
            0x19 => "~",
            0x20 => "sha3",
            0x30 => "this",
            0x31 => "balance",
            0x32 => "tx.origin",
            0x33 => "msg.sender",
            0x34 => "msg.value",
            0x35 => "calldataload",
            0x36 => "msg.data.length",
            0x37 => "calldatacopy",
            0x38 | 0x3b => "codesize",
            0x39 => "codecopy",
            0x3a => "tx.gasprice",
            0x3c => "extcodecopy",
            0x40 => "blockhash",
            0x41 => "block.coinbase",
            0x42 => "block.timestamp",
            0x43 => "block.number",
            0x44 => "block.difficulty",
            0x45 => "block.gaslimit",
            0x51 => "mload",
            0x52 => "mstore",
            0x53 => "mstore8",
            0x54 => "sload",
            0x55 => "sstore",
            0x58 => "pc",
            0x59 => "msize",
            0x5a => "msg.gas",
            0xa0 => "log0",
            0xa1 => "log1",
            0xa2 => "log2",
            0xa3 => "log3",
            0xa4 => "log4",
            0xf0 => "create",
            0xf1 => "call",
            0xf2 => "callcode",
            0xf3 => "return",
            0xf4 => "delegatecall",
            0xff => "selfdestruct",
            _ => "",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_push() {
            return write!(f, "PUSH{}", self.operand_suffix());
        }
        if self.is_dup() {
            return write!(f, "DUP{}", self.operand_suffix());
        }
        if self.is_swap() {
            return write!(f, "SWAP{}", self.operand_suffix());
        }
        if self.is_log() {
            return write!(f, "LOG{}", self.0 - 0xa0);
        }
        let name = match self.0 {
            0x00 => "STOP",
            0x01 => "ADD",
            0x02 => "MUL",
            0x03 => "SUB",
            0x04 => "DIV",
            0x05 => "SDIV",
            0x06 => "MOD",
            0x07 => "SMOD",
            0x08 => "ADDMOD",
            0x09 => "MULMOD",
            0x0a => "EXP",
            0x10 => "LT",
            0x11 => "GT",
            0x12 => "SLT",
            0x13 => "SGT",
            0x14 => "EQ",
            0x15 => "ISZERO",
            0x16 => "AND",
            0x17 => "OR",
            0x18 => "XOR",
            0x19 => "NOT",
            0x20 => "SHA3",
            0x30 => "ADDRESS",
            0x31 => "BALANCE",
            0x32 => "ORIGIN",
            0x33 => "CALLER",
            0x34 => "CALLVALUE",
            0x35 => "CALLDATALOAD",
            0x36 => "CALLDATASIZE",
            0x37 => "CALLDATACOPY",
            0x38 => "CODESIZE",
            0x39 => "CODECOPY",
            0x3a => "GASPRICE",
            0x3b => "EXTCODESIZE",
            0x3c => "EXTCODECOPY",
            0x40 => "BLOCKHASH",
            0x41 => "COINBASE",
            0x42 => "TIMESTAMP",
            0x43 => "NUMBER",
            0x44 => "DIFFICULTY",
            0x45 => "GASLIMIT",
            0x50 => "POP",
            0x51 => "MLOAD",
            0x52 => "MSTORE",
            0x53 => "MSTORE8",
            0x54 => "SLOAD",
            0x55 => "SSTORE",
            0x56 => "JUMP",
            0x57 => "JUMPI",
            0x58 => "PC",
            0x59 => "MSIZE",
            0x5a => "GAS",
            0x5b => "JUMPDEST",
            0xf0 => "CREATE",
            0xf1 => "CALL",
            0xf2 => "CALLCODE",
            0xf3 => "RETURN",
            0xf4 => "DELEGATECALL",
            0xff => "SELFDESTRUCT",
            byte => return write!(f, "UNKNOWN_0x{byte:02x}"),
        };
        f.write_str(name)
    }
}
