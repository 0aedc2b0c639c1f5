//! Boundary to the external memory transport.
//!
//! The transport performs the actual remote I/O (DMA device, driver, or a
//! captured snapshot). Nothing in this crate assumes a call succeeds.

use std::collections::HashMap;

use super::layout::page;
use crate::error::Result;

/// Outcome of reading one page in a batched read
#[derive(Debug, Clone)]
pub struct PageRead {
    pub success: bool,
    pub bytes: Box<[u8]>,
}

impl PageRead {
    pub fn ok(bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            success: true,
            bytes: bytes.into(),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            bytes: Box::default(),
        }
    }

    /// A page is usable only when it succeeded and carries a full page of bytes.
    pub fn is_usable(&self) -> bool {
        self.success && self.bytes.len() == page::SIZE as usize
    }
}

/// Remote memory transport.
///
/// Implementations must be safe to call from the poll worker thread.
pub trait Transport: Send + Sync {
    /// Read each page in `pages` (page-aligned, deduplicated) in one batch.
    ///
    /// Every page reports success or failure independently. Pages missing
    /// from the returned map are treated as failed.
    fn read_pages(&self, pages: &[u64]) -> HashMap<u64, PageRead>;

    /// Read `size` bytes at `addr`; fails on a short read.
    fn read(&self, addr: u64, size: usize) -> Result<Vec<u8>>;

    /// Write `bytes` at `addr`, returning whether the write went through.
    fn write(&self, addr: u64, bytes: &[u8]) -> bool;

    /// Base address of a loaded module in the foreign process.
    fn module_base(&self, module: &str) -> Option<u64>;
}
