//! Snapshot transport arguments shared by every command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use raidscope_core::{MemoryReader, ShutdownSignal, SnapshotTransport};
use tracing::info;

use super::hex_utils::parse_hex_address;

#[derive(Debug, Clone, Args)]
pub struct SnapshotArgs {
    /// Captured memory image
    #[arg(long, env = "RAIDSCOPE_IMAGE")]
    pub image: PathBuf,

    /// Memory map describing where the image regions live
    #[arg(long, env = "RAIDSCOPE_MAP")]
    pub map: PathBuf,

    /// Module base address, as NAME=ADDR (repeatable)
    #[arg(long = "module", value_parser = parse_module)]
    pub modules: Vec<(String, u64)>,
}

impl SnapshotArgs {
    pub fn open(&self) -> Result<SnapshotTransport> {
        let mut transport = SnapshotTransport::open(&self.image, &self.map).with_context(|| {
            format!(
                "Failed to open snapshot {} with map {}",
                self.image.display(),
                self.map.display()
            )
        })?;
        info!(
            "Snapshot {} ({} regions, {} bytes mapped)",
            self.image.display(),
            transport.map().len(),
            transport.map().total_size()
        );
        for (name, base) in &self.modules {
            transport = transport.with_module(name.clone(), *base);
        }
        Ok(transport)
    }

    /// Open the snapshot behind a reader with its own shutdown signal.
    pub fn reader(&self) -> Result<MemoryReader> {
        self.reader_with(Arc::new(ShutdownSignal::new()))
    }

    pub fn reader_with(&self, shutdown: Arc<ShutdownSignal>) -> Result<MemoryReader> {
        Ok(MemoryReader::new(Arc::new(self.open()?), shutdown))
    }
}

/// Parse `NAME=ADDR` with a hex address.
pub fn parse_module(s: &str) -> Result<(String, u64)> {
    let (name, addr) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=ADDR, got {:?}", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("module name is empty"));
    }
    Ok((name.to_string(), parse_hex_address(addr.trim())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module() {
        assert_eq!(
            parse_module("UnityPlayer.dll=0x7FF600000000").unwrap(),
            ("UnityPlayer.dll".to_string(), 0x7FF6_0000_0000)
        );
        assert_eq!(
            parse_module("mono = 1000").unwrap(),
            ("mono".to_string(), 0x1000)
        );
    }

    #[test]
    fn test_parse_module_invalid() {
        assert!(parse_module("UnityPlayer.dll").is_err());
        assert!(parse_module("=0x1000").is_err());
        assert!(parse_module("a=zz").is_err());
    }
}
