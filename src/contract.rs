//! Contract-level view of the lifted program.
//!
//! Collects the blocks the recognizer labelled as functions and renders them
//! as reconstructed contract source.

use crate::prettify::render_statement_surface;
use crate::ssa::SsaProgram;
use crate::utils::opcodes::OpCode;
use serde::Serialize;

/// The Solidity version the reconstructed source claims.
pub const PRAGMA: &str = "pragma solidity ^0.4.2;";

/// One recognized public function.
#[derive(Debug, Clone, Serialize)]
pub struct ContractFunction {
    pub label: String,
    pub params: Vec<String>,
    pub returns: Vec<String>,
    pub body: Vec<String>,
}

/// A reconstructed contract: the recognized functions in bytecode order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Contract {
    pub functions: Vec<ContractFunction>,
}

impl Contract {
    /// Collect every `func_*` block from the program.
    pub fn from_ssa(ssa: &SsaProgram) -> Self {
        let mut functions = Vec::new();
        for (_, block) in ssa.blocks() {
            if !block.label.starts_with("func_") {
                continue;
            }
            functions.push(ContractFunction {
                label: block.label.clone(),
                params: block.inputs.iter().map(|v| v.label()).collect(),
                returns: block.outputs.iter().map(|e| e.to_string()).collect(),
                body: block
                    .statements
                    .iter()
                    .filter(|s| s.op != OpCode::JUMPDEST)
                    .map(render_statement_surface)
                    .collect(),
            });
        }
        Contract { functions }
    }

    /// Render the contract section.
    pub fn render(&self) -> String {
        let mut lines = vec![PRAGMA.to_string(), String::new()];
        lines.push("contract Decompiled {".to_string());
        for function in &self.functions {
            let returns = if function.returns.is_empty() {
                String::new()
            } else {
                format!(" return ({})", function.returns.join(", "))
            };
            lines.push(format!(
                "    function {}({}){} {{",
                function.label,
                function.params.join(", "),
                returns
            ));
            for statement in &function.body {
                lines.push(format!("        {statement}"));
            }
            lines.push("    }".to_string());
        }
        lines.push("}".to_string());
        lines.join("\n")
    }
}
