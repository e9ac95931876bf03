//! Output formatting tests across the three sections.

use massilia::decompiler::{decompile_bytecode, DecompilerConfig, OutputFormat};
use massilia::loader::{load_hex, Program};
use massilia::prettify::render_disassembly;

fn decompile(hex: &str) -> String {
    decompile_bytecode(hex, &DecompilerConfig::default())
        .unwrap()
        .text
}

#[test]
fn test_disassembly_block_header_format() {
    let bytes = load_hex("6005600301").unwrap();
    let text = render_disassembly(&Program::disassemble(&bytes));
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("block_0: (reads 0, writes 1)"));
    assert_eq!(lines.next(), Some("0x0000\tPUSH1\t0x5"));
    assert_eq!(lines.next(), Some("0x0002\tPUSH1\t0x3"));
    assert_eq!(lines.next(), Some("0x0004\tADD"));
}

#[test]
fn test_sections_appear_in_order() {
    let text = decompile("6005600301");
    let asm = text.find("block_0: (reads").unwrap();
    let ssa = text.find("0x0000 block_0:").unwrap();
    let contract = text.find("pragma solidity ^0.4.2;").unwrap();
    assert!(asm < ssa && ssa < contract);
}

#[test]
fn test_unknown_opcode_listing() {
    // 0xef is not an opcode; it must survive the listing verbatim.
    let text = decompile("ef00");
    assert!(text.contains("UNKNOWN_0xef"));
}

#[test]
fn test_asm_format_stops_after_listing() {
    let result = decompile_bytecode(
        "6005600301",
        &DecompilerConfig {
            creation: false,
            error_tag: true,
            format: OutputFormat::Asm,
        },
    )
    .unwrap();
    assert!(result.text.contains("0x0004\tADD"));
    assert!(!result.text.contains("->"));
    assert!(!result.text.contains("pragma"));
}

#[test]
fn test_dup_swap_listing_keeps_suffix() {
    let text = decompile("6001600281915000");
    assert!(text.contains("\tDUP2"));
    assert!(text.contains("\tSWAP2"));
}
