//! Chain command implementation.
//!
//! Follows a pointer chain through the snapshot one hop at a time and shows
//! where it breaks.

use anyhow::Result;
use raidscope_core::ChainTrace;

use super::hex_utils::format_hex_address;
use super::source::SnapshotArgs;

/// Run the chain command
pub fn run(source: &SnapshotArgs, base: u64, offsets: &[u64], json: bool) -> Result<()> {
    let reader = source.reader()?;
    let trace = ChainTrace::trace(&reader, base, offsets);

    if json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
        return Ok(());
    }

    println!("Chain from {}:", format_hex_address(base));
    for hop in &trace.hops {
        let value = hop
            .value
            .map(format_hex_address)
            .unwrap_or_else(|| "<unreadable>".to_string());
        println!(
            "  [{}] +0x{:X} @ {} -> {}",
            hop.hop,
            hop.offset,
            format_hex_address(hop.address),
            value
        );
    }
    match (&trace.error, trace.target()) {
        (Some(error), _) => println!("Failed: {}", error),
        (None, Some(target)) => println!("Target: {}", format_hex_address(target)),
        (None, None) => println!("Empty chain"),
    }

    Ok(())
}
