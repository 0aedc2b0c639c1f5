//! Transport backed by a captured memory image.
//!
//! The image is a flat file of region contents; a [`MemoryMap`] tells where
//! each virtual region lives inside it. Snapshots are read-only.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::layout::page;
use super::memmap::MemoryMap;
use super::transport::{PageRead, Transport};
use crate::error::{Error, Result};

pub struct SnapshotTransport {
    image: Vec<u8>,
    map: MemoryMap,
    modules: HashMap<String, u64>,
}

impl SnapshotTransport {
    pub fn new(image: Vec<u8>, map: MemoryMap) -> Self {
        let covered = map
            .regions()
            .iter()
            .filter(|r| r.mapped.saturating_add(r.len()) <= image.len() as u64)
            .count();
        if covered < map.len() {
            warn!(
                "{} of {} regions extend past the {}-byte image",
                map.len() - covered,
                map.len(),
                image.len()
            );
        }
        Self {
            image,
            map,
            modules: HashMap::new(),
        }
    }

    /// Load an image file and its region table.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(image_path: P, map_path: Q) -> Result<Self> {
        let image = fs::read(image_path.as_ref())?;
        let map = MemoryMap::load(map_path)?;
        debug!(
            "Opened snapshot {} ({} bytes, {} regions)",
            image_path.as_ref().display(),
            image.len(),
            map.len()
        );
        Ok(Self::new(image, map))
    }

    /// Register a module base address for [`Transport::module_base`].
    pub fn with_module(mut self, name: impl Into<String>, base: u64) -> Self {
        self.modules.insert(name.into(), base);
        self
    }

    pub fn map(&self) -> &MemoryMap {
        &self.map
    }

    /// Image bytes backing `addr..addr + len`, if they are all inside one region.
    fn slice(&self, addr: u64, len: usize) -> Option<&[u8]> {
        let region = self.map.region_for(addr)?;
        let last = addr.checked_add(len.checked_sub(1)? as u64)?;
        if last > region.end {
            return None;
        }
        let start = usize::try_from(self.map.translate(addr)?).ok()?;
        self.image.get(start..start.checked_add(len)?)
    }
}

impl Transport for SnapshotTransport {
    fn read_pages(&self, pages: &[u64]) -> HashMap<u64, PageRead> {
        pages
            .iter()
            .map(|&page_addr| {
                let read = match self.slice(page_addr, page::SIZE as usize) {
                    Some(bytes) => PageRead::ok(bytes.to_vec()),
                    None => PageRead::failed(),
                };
                (page_addr, read)
            })
            .collect()
    }

    fn read(&self, addr: u64, size: usize) -> Result<Vec<u8>> {
        if size == 0 {
            return Ok(Vec::new());
        }
        self.slice(addr, size)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::MemoryReadFailed {
                address: addr,
                message: format!("{} bytes not covered by snapshot", size),
            })
    }

    fn write(&self, _addr: u64, _bytes: &[u8]) -> bool {
        false
    }

    fn module_base(&self, module: &str) -> Option<u64> {
        self.modules.get(module).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRegion;
    use tempfile::tempdir;

    fn snapshot() -> SnapshotTransport {
        let mut image = vec![0u8; 0x2000];
        image[0x10..0x18].copy_from_slice(&0xDEAD_BEEFu64.to_le_bytes());
        image[0x1000] = 0x7F;
        let map = MemoryMap::new(vec![
            MemoryRegion {
                start: 0x40_0000,
                end: 0x40_0FFF,
                mapped: 0,
            },
            MemoryRegion {
                start: 0x80_0000,
                end: 0x80_0FFF,
                mapped: 0x1000,
            },
        ]);
        SnapshotTransport::new(image, map).with_module("main.dll", 0x40_0000)
    }

    #[test]
    fn test_read_translates_through_map() {
        let transport = snapshot();
        let bytes = transport.read(0x40_0010, 8).unwrap();
        assert_eq!(u64::from_le_bytes(bytes.try_into().unwrap()), 0xDEAD_BEEF);
        assert_eq!(transport.read(0x80_0000, 1).unwrap(), vec![0x7F]);
    }

    #[test]
    fn test_read_outside_regions_fails() {
        let transport = snapshot();
        assert!(transport.read(0x50_0000, 4).is_err());
        // Crosses the end of the first region
        assert!(transport.read(0x40_0FFC, 8).is_err());
    }

    #[test]
    fn test_read_pages_reports_each_page() {
        let transport = snapshot();
        let results = transport.read_pages(&[0x40_0000, 0x60_0000, 0x80_0000]);
        assert!(results[&0x40_0000u64].is_usable());
        assert!(!results[&0x60_0000u64].success);
        assert_eq!(results[&0x80_0000u64].bytes[0], 0x7F);
    }

    #[test]
    fn test_snapshot_is_read_only() {
        let transport = snapshot();
        assert!(!transport.write(0x40_0000, &[1, 2, 3]));
        assert_eq!(transport.read(0x40_0000, 1).unwrap(), vec![0]);
    }

    #[test]
    fn test_module_base() {
        let transport = snapshot();
        assert_eq!(transport.module_base("main.dll"), Some(0x40_0000));
        assert_eq!(transport.module_base("other.dll"), None);
    }

    #[test]
    fn test_open_from_files() {
        let dir = tempdir().unwrap();
        let image_path = dir.path().join("image.bin");
        let map_path = dir.path().join("mmap.txt");
        fs::write(&image_path, vec![0xAB; 0x1000]).unwrap();
        fs::write(&map_path, "0000  2000  -  2fff  ->  0\n").unwrap();

        let transport = SnapshotTransport::open(&image_path, &map_path).unwrap();
        assert_eq!(transport.read(0x2800, 2).unwrap(), vec![0xAB, 0xAB]);
        assert_eq!(transport.map().len(), 1);
    }
}
