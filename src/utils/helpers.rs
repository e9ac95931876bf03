//! General helper utilities.

use primitive_types::U256;

/// Pad a hex value to `len` hex characters.
pub fn padded_hex(value: U256, len: usize) -> String {
    let hex = format!("{value:x}");
    if hex.len() > len {
        "?".repeat(len)
    } else {
        format!("0x{hex:0>len$}")
    }
}
