//! Human-readable output formatting.
//!
//! Three views of the lifted program: the assembler listing, the SSA block
//! dump, and the convention-driven surface syntax used for reconstructed
//! contract bodies.

use crate::loader::Program;
use crate::ssa::{SsaProgram, Statement, StatementBlock};
use crate::utils::opcodes::{Convention, OpCode};

/// Render the disassembly section: per block a `label: (reads R, writes W)`
/// header followed by one offset/mnemonic/argument line per instruction.
pub fn render_disassembly(program: &Program) -> String {
    let mut lines = Vec::new();
    for block in &program.blocks {
        lines.push(format!(
            "{}: (reads {}, writes {})",
            block.label, block.reads, block.writes
        ));
        let mut offset = block.offset;
        for inst in &block.instructions {
            match inst.arg {
                Some(arg) => lines.push(format!("0x{offset:04x}\t{}\t0x{arg:x}", inst.op)),
                None => lines.push(format!("0x{offset:04x}\t{}", inst.op)),
            }
            offset += inst.op.operand_size() + 1;
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Render the SSA section: every live block with its stack interface,
/// predecessors, statements, and successor.
pub fn render_ssa(ssa: &SsaProgram) -> String {
    let mut lines = Vec::new();
    for (_, block) in ssa.blocks() {
        lines.extend(render_ssa_block(ssa, block));
        lines.push(String::new());
    }
    lines.join("\n")
}

fn render_ssa_block(ssa: &SsaProgram, block: &StatementBlock) -> Vec<String> {
    let mut lines = Vec::new();

    let inputs: Vec<String> = block.inputs.iter().map(|v| v.label()).collect();
    let outputs: Vec<String> = block.outputs.iter().map(|e| e.to_string()).collect();
    lines.push(format!(
        "0x{:04x} {}: [{}] -> [{}]",
        block.offset,
        block.label,
        inputs.join(", "),
        outputs.join(", ")
    ));

    for &source in &block.incoming {
        if let Some(label) = ssa.label_of(source) {
            lines.push(format!("  from {label}"));
        }
    }

    let mut jumpi_index = 0usize;
    for statement in &block.statements {
        match statement.op {
            // The landing marker carries no information once blocks exist.
            OpCode::JUMPDEST => continue,
            OpCode::JUMP => {
                let resolved = block.next_block.and_then(|id| ssa.label_of(id));
                match resolved {
                    Some(label) => lines.push(format!("    JUMP({label});")),
                    None => lines.push(format!("    {statement};")),
                }
            }
            OpCode::JUMPI => {
                let target = block
                    .cond_blocks
                    .get(jumpi_index)
                    .copied()
                    .flatten()
                    .and_then(|id| ssa.label_of(id));
                jumpi_index += 1;
                match (target, statement.inputs.get(1)) {
                    (Some(label), Some(cond)) => {
                        lines.push(format!("    JUMPI {cond} {label};"))
                    }
                    _ => lines.push(format!("    {statement};")),
                }
            }
            _ => lines.push(format!("    {statement};")),
        }
    }

    if let Some(label) = block.next_block.and_then(|id| ssa.label_of(id)) {
        lines.push(format!("  to {label}"));
    }

    lines
}

/// Render one statement as contract surface syntax, driven by the opcode's
/// convention.
pub fn render_statement_surface(statement: &Statement) -> String {
    let name = statement.op.surface_name();
    let args: Vec<String> = statement.inputs.iter().map(|e| e.to_string()).collect();

    let rhs = match statement.op.convention() {
        Convention::Nullary => name.to_string(),
        Convention::Unary => match args.first() {
            Some(a) => format!("{name}{a}"),
            None => name.to_string(),
        },
        Convention::Binary => match (args.first(), args.get(1)) {
            (Some(a), Some(b)) => format!("{a} {name} {b}"),
            _ => format!("{name}({})", args.join(", ")),
        },
        Convention::Field => match args.first() {
            Some(a) => format!("{a}.{name}"),
            None => name.to_string(),
        },
        Convention::Member => match args.split_first() {
            Some((a, rest)) => format!("{a}.{name}({})", rest.join(", ")),
            None => format!("{name}()"),
        },
        Convention::Function => format!("{name}({})", args.join(", ")),
    };

    match &statement.output {
        Some(out) => format!("var {} = {rhs};", out.label()),
        None => format!("{rhs};"),
    }
}
