//! Hex formatting helpers for diagnostics.

/// Format a byte offset as "decimal (0xhex)".
pub fn format_offset(offset: usize) -> String {
    format!("{} (0x{:x})", offset, offset)
}

/// Format bytes as a compact hex string (e.g., "4a2f00ff").
pub fn format_bytes(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}
