//! Decompilation orchestrator.
//!
//! Ties together loading, disassembly, SSA lifting, CFG analysis, block
//! collapsing, and function recognition to produce a full decompilation.

use crate::cfg;
use crate::contract::Contract;
use crate::function;
use crate::loader::{load_hex, Program};
use crate::prettify;
use crate::ssa::{self, SsaProgram};
use anyhow::{Context, Result};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Asm,
    Json,
}

/// Configuration for the decompiler.
#[derive(Debug, Clone)]
pub struct DecompilerConfig {
    /// Treat the input as contract-creation code: label the deploy stub and
    /// entry blocks and re-base the contract's address space to 0.
    pub creation: bool,
    /// Emit the synthetic error block at byte offset 2. The compiler's
    /// error-jump idiom assumes it; disable for bytecode from other sources.
    pub error_tag: bool,
    pub format: OutputFormat,
}

impl Default for DecompilerConfig {
    fn default() -> Self {
        Self {
            creation: false,
            error_tag: true,
            format: OutputFormat::Text,
        }
    }
}

/// Result of a decompilation run.
pub struct Decompilation {
    pub text: String,
    pub ssa: SsaProgram,
    pub contract: Contract,
}

/// Decompile raw bytecode (hex string).
pub fn decompile_bytecode(hex_code: &str, config: &DecompilerConfig) -> Result<Decompilation> {
    let bytecode = load_hex(hex_code).context("failed to load bytecode")?;

    let mut program = Program::disassemble(&bytecode);
    if config.creation {
        program.parse_creation();
    }
    let asm = prettify::render_disassembly(&program);

    if config.format == OutputFormat::Asm {
        return Ok(Decompilation {
            text: asm,
            ssa: SsaProgram::default(),
            contract: Contract::default(),
        });
    }

    let mut lifted = ssa::compile_ssa(&program, config.error_tag).context("ssa lifting failed")?;
    cfg::compute_jump_targets(&mut lifted);
    cfg::compute_incoming(&mut lifted);
    cfg::collapse_jumps(&mut lifted);
    function::label_functions(&mut lifted);

    let contract = Contract::from_ssa(&lifted);

    let text = match config.format {
        OutputFormat::Text => format!(
            "{asm}\n{}\n{}",
            prettify::render_ssa(&lifted),
            contract.render()
        ),
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "blocks": lifted.blocks().map(|(_, b)| b).collect::<Vec<_>>(),
            "contract": contract,
        }))
        .context("serialise to JSON")?,
        OutputFormat::Asm => unreachable!(),
    };

    Ok(Decompilation {
        text,
        ssa: lifted,
        contract,
    })
}
