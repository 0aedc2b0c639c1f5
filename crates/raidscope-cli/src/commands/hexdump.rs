//! Hexdump command implementation.
//!
//! Displays raw snapshot bytes in traditional hexdump format, useful for
//! checking structure layouts against an offsets table.
//!
//! # Output Format
//!
//! ```text
//! 0x000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|
//! ```

use anyhow::Result;
use raidscope_core::MemoryDump;

use super::source::SnapshotArgs;

/// Run the hexdump command
pub fn run(source: &SnapshotArgs, address: u64, size: usize, ascii: bool) -> Result<()> {
    let reader = source.reader()?;
    let dump = MemoryDump::read(&reader, address, size)?;

    println!("Hexdump at 0x{:X} ({} bytes):", address, size);
    println!();
    for line in dump.lines(ascii) {
        println!("{}", line);
    }

    Ok(())
}
