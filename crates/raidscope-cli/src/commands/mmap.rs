//! Memory map command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use raidscope_core::MemoryMap;

use super::hex_utils::format_hex_address;

/// Run the mmap command
///
/// Prints the parsed region table, or the region covering `address` and its
/// translated image offset.
pub fn run(path: &Path, address: Option<u64>) -> Result<()> {
    let map = MemoryMap::load(path)
        .with_context(|| format!("Failed to load memory map {}", path.display()))?;

    if let Some(address) = address {
        match map.region_for(address) {
            Some(region) => {
                println!(
                    "{} is in {} - {} (image offset 0x{:X})",
                    format_hex_address(address),
                    format_hex_address(region.start),
                    format_hex_address(region.end),
                    region.mapped + (address - region.start)
                );
            }
            None => println!("{} is not mapped", format_hex_address(address)),
        }
        return Ok(());
    }

    println!(
        "{} regions, {} bytes mapped",
        map.len(),
        map.total_size()
    );
    println!();
    println!("{:>5}  {:>18}  {:>18}  {:>12}", "#", "Start", "End", "Size");
    for (index, region) in map.regions().iter().enumerate() {
        println!(
            "{:>5}  {:>18}  {:>18}  {:>12}",
            index,
            format_hex_address(region.start),
            format_hex_address(region.end),
            region.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_with_map_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regions.txt");
        std::fs::write(&path, "0000  1000  -  1fff  ->  0\n0001  4000  -  4fff  ->  1000\n")
            .unwrap();

        assert!(run(&path, None).is_ok());
        assert!(run(&path, Some(0x4010)).is_ok());
        assert!(run(&path, Some(0x3000)).is_ok());
    }

    #[test]
    fn test_run_with_malformed_map() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regions.txt");
        std::fs::write(&path, "not a region\n").unwrap();

        assert!(run(&path, None).is_err());
        assert!(run(&dir.path().join("missing.txt"), None).is_err());
    }
}
