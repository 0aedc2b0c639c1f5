//! Line-oriented memory region table.
//!
//! Each line reads `index  start  -  end  ->  mapped` with hex addresses and
//! an inclusive `end`. The same table format is consumed by DMA tooling and
//! by [`super::SnapshotTransport`], where `mapped` is the region's offset in
//! the captured image.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};

/// One contiguous region of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    /// Last byte of the region (inclusive)
    pub end: u64,
    pub mapped: u64,
}

impl MemoryRegion {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, addr: u64) -> bool {
        (self.start..=self.end).contains(&addr)
    }
}

/// Ordered list of regions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryMap {
    regions: Vec<MemoryRegion>,
}

impl MemoryMap {
    pub fn new(regions: Vec<MemoryRegion>) -> Self {
        let mut regions = regions;
        regions.sort_by_key(|r| r.start);
        Self { regions }
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Total number of bytes covered by the table.
    pub fn total_size(&self) -> u64 {
        self.regions.iter().map(MemoryRegion::len).sum()
    }

    /// Region containing `addr`.
    pub fn region_for(&self, addr: u64) -> Option<&MemoryRegion> {
        let idx = self.regions.partition_point(|r| r.start <= addr);
        let region = self.regions.get(idx.checked_sub(1)?)?;
        region.contains(addr).then_some(region)
    }

    /// Translate `addr` through the table into its mapped location.
    pub fn translate(&self, addr: u64) -> Option<u64> {
        let region = self.region_for(addr)?;
        region.mapped.checked_add(addr - region.start)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let map: Self = content.parse()?;
        debug!("Loaded {} memory regions from {}", map.len(), path.display());
        Ok(map)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

fn parse_hex(field: &str, line: usize) -> Result<u64> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(digits, 16).map_err(|e| Error::InvalidMemoryMap {
        line,
        message: format!("bad hex value '{}': {}", field, e),
    })
}

fn parse_line(text: &str, line: usize) -> Result<MemoryRegion> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    let [_index, start, "-", end, "->", mapped] = fields.as_slice() else {
        return Err(Error::InvalidMemoryMap {
            line,
            message: format!("expected 'index start - end -> mapped', got '{}'", text),
        });
    };
    let region = MemoryRegion {
        start: parse_hex(start, line)?,
        end: parse_hex(end, line)?,
        mapped: parse_hex(mapped, line)?,
    };
    if region.end < region.start {
        return Err(Error::InvalidMemoryMap {
            line,
            message: format!("end {:#x} before start {:#x}", region.end, region.start),
        });
    }
    Ok(region)
}

impl FromStr for MemoryMap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut regions = Vec::new();
        for (idx, text) in s.lines().enumerate() {
            let text = text.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            regions.push(parse_line(text, idx + 1)?);
        }
        let map = Self::new(regions);
        for pair in map.regions.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(Error::InvalidMemoryMap {
                    line: 0,
                    message: format!(
                        "regions at {:#x} and {:#x} overlap",
                        pair[0].start, pair[1].start
                    ),
                });
            }
        }
        Ok(map)
    }
}

impl fmt::Display for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.regions.iter().enumerate() {
            writeln!(f, "{:04}  {:x}  -  {:x}  ->  {:x}", i, r.start, r.end, r.mapped)?;
        }
        Ok(())
    }
}
