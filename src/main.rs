//! Massilia CLI — EVM bytecode decompiler.

use anyhow::Result;
use clap::Parser;
use massilia::decompiler::{decompile_bytecode, DecompilerConfig, OutputFormat};
use std::io::{IsTerminal, Read};

#[derive(Parser, Debug)]
#[command(
    name = "massilia",
    version,
    about = "EVM bytecode decompiler — disassembly, CFG recovery, and SSA lifting"
)]
struct Cli {
    /// Bytecode as a hex string (with or without 0x prefix).
    #[arg(value_name = "BYTECODE")]
    bytecode: Option<String>,

    /// Read bytecode from a file instead.
    #[arg(short = 'f', long)]
    file: Option<String>,

    /// Output format: text (default), asm, json.
    #[arg(short = 'o', long, default_value = "text")]
    format: String,

    /// Treat the input as contract-creation code.
    #[arg(long)]
    creation: bool,

    /// Skip the synthetic error block at offset 2.
    #[arg(long)]
    no_error_tag: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Determine the hex bytecode.
    let hex_code = if let Some(ref path) = cli.file {
        let mut buf = String::new();
        std::fs::File::open(path)?.read_to_string(&mut buf)?;
        buf.trim().to_string()
    } else if let Some(ref code) = cli.bytecode {
        code.trim().to_string()
    } else if std::io::stdin().is_terminal() {
        anyhow::bail!("no bytecode provided — pass it as an argument, via -f, or pipe to stdin");
    } else {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf.trim().to_string()
    };

    if hex_code.is_empty() {
        anyhow::bail!("empty bytecode");
    }

    let format = match cli.format.as_str() {
        "asm" => OutputFormat::Asm,
        "json" => OutputFormat::Json,
        _ => OutputFormat::Text,
    };

    let config = DecompilerConfig {
        creation: cli.creation,
        error_tag: !cli.no_error_tag,
        format,
    };

    let result = decompile_bytecode(&hex_code, &config)?;
    println!("{}", result.text);

    Ok(())
}
