//! Hex address parsing and formatting utilities.

use anyhow::Result;

/// Parse a hex address string (with or without 0x prefix).
///
/// # Examples
///
/// ```
/// use raidscope::commands::hex_utils::parse_hex_address;
///
/// assert_eq!(parse_hex_address("0x1000").unwrap(), 0x1000);
/// assert_eq!(parse_hex_address("1000").unwrap(), 0x1000);
/// assert_eq!(parse_hex_address("0X1000").unwrap(), 0x1000);
/// ```
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
        .replace('_', "");
    u64::from_str_radix(&s, 16).map_err(|e| anyhow::anyhow!("Invalid hex address: {}", e))
}

/// Format an address as a hex string with 0x prefix.
///
/// # Examples
///
/// ```
/// use raidscope::commands::hex_utils::format_hex_address;
///
/// assert_eq!(format_hex_address(0x1000), "0x1000");
/// ```
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}
