//! Scriptable in-memory transport for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::layout::page;
use super::page::{byte_offset, page_align};
use super::transport::{PageRead, Transport};
use crate::error::{Error, Result};
use crate::offset::StringOffsets;

const ALLOC_BASE: u64 = 0x1000_0000;

/// Builds a sparse foreign address space page by page
#[derive(Debug, Default)]
pub struct MockMemoryBuilder {
    pages: HashMap<u64, Vec<u8>>,
    failing: HashSet<u64>,
    modules: HashMap<String, u64>,
    next_alloc: u64,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self {
            next_alloc: ALLOC_BASE,
            ..Default::default()
        }
    }

    pub fn write_bytes(&mut self, addr: u64, bytes: &[u8]) -> &mut Self {
        write_into(&mut self.pages, addr, bytes);
        self
    }

    pub fn write_u64(&mut self, addr: u64, value: u64) -> &mut Self {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    pub fn write_i32(&mut self, addr: u64, value: i32) -> &mut Self {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    pub fn write_f32s(&mut self, addr: u64, values: &[f32]) -> &mut Self {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write_bytes(addr, &bytes)
    }

    pub fn write_bool(&mut self, addr: u64, value: bool) -> &mut Self {
        self.write_bytes(addr, &[value as u8])
    }

    /// Write a null-terminated string.
    pub fn write_cstring(&mut self, addr: u64, s: &str) -> &mut Self {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        self.write_bytes(addr, &bytes)
    }

    /// Write a length-prefixed UTF-16 string object.
    pub fn write_managed_string(&mut self, addr: u64, s: &str, layout: &StringOffsets) -> &mut Self {
        let units: Vec<u16> = s.encode_utf16().collect();
        let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        self.write_i32(addr + layout.length, units.len() as i32);
        self.write_bytes(addr + layout.value, &bytes)
    }

    /// Mark a page as failing in every batched and single read.
    pub fn fail_page(&mut self, page_addr: u64) -> &mut Self {
        self.failing.insert(page_align(page_addr));
        self
    }

    pub fn module(&mut self, name: &str, base: u64) -> &mut Self {
        self.modules.insert(name.to_string(), base);
        self
    }

    /// Reserve a zeroed, readable block and return its address.
    pub fn alloc(&mut self, size: usize) -> u64 {
        let addr = self.next_alloc;
        self.next_alloc = (addr + size.max(1) as u64 + 0xF) & !0xF;
        write_into(&mut self.pages, addr, &vec![0; size.max(1)]);
        addr
    }

    pub fn alloc_cstring(&mut self, s: &str) -> u64 {
        let addr = self.alloc(s.len() + 1);
        self.write_cstring(addr, s);
        addr
    }

    pub fn alloc_managed_string(&mut self, s: &str, layout: &StringOffsets) -> u64 {
        let units = s.encode_utf16().count();
        let addr = self.alloc((layout.value as usize) + units * 2 + 2);
        self.write_managed_string(addr, s, layout);
        addr
    }

    pub fn build(&self) -> Arc<MockTransport> {
        Arc::new(MockTransport {
            pages: Mutex::new(self.pages.clone()),
            failing: Mutex::new(self.failing.clone()),
            modules: self.modules.clone(),
            page_calls: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
        })
    }
}

fn write_into(pages: &mut HashMap<u64, Vec<u8>>, addr: u64, bytes: &[u8]) {
    let mut written = 0;
    while written < bytes.len() {
        let cur = addr + written as u64;
        let offset = byte_offset(cur) as usize;
        let page = pages
            .entry(page_align(cur))
            .or_insert_with(|| vec![0; page::SIZE as usize]);
        let n = (bytes.len() - written).min(page::SIZE as usize - offset);
        page[offset..offset + n].copy_from_slice(&bytes[written..written + n]);
        written += n;
    }
}

/// Transport over a [`MockMemoryBuilder`] image that records every call
#[derive(Debug)]
pub struct MockTransport {
    pages: Mutex<HashMap<u64, Vec<u8>>>,
    failing: Mutex<HashSet<u64>>,
    modules: HashMap<String, u64>,
    page_calls: Mutex<Vec<Vec<u64>>>,
    reads: Mutex<Vec<(u64, usize)>>,
}

impl MockTransport {
    /// Pages requested by each batched read, in call order.
    pub fn page_calls(&self) -> Vec<Vec<u64>> {
        self.page_calls.lock().clone()
    }

    /// `(addr, size)` of each single read, in call order.
    pub fn reads(&self) -> Vec<(u64, usize)> {
        self.reads.lock().clone()
    }

    /// Total number of transport round trips of any kind.
    pub fn call_count(&self) -> usize {
        self.page_calls.lock().len() + self.reads.lock().len()
    }

    pub fn was_read(&self, addr: u64) -> bool {
        self.reads.lock().iter().any(|(a, _)| *a == addr)
    }

    pub fn clear_log(&self) {
        self.page_calls.lock().clear();
        self.reads.lock().clear();
    }

    pub fn set_page_failing(&self, page_addr: u64, failing: bool) {
        let page_addr = page_align(page_addr);
        let mut set = self.failing.lock();
        if failing {
            set.insert(page_addr);
        } else {
            set.remove(&page_addr);
        }
    }

    pub fn poke_u64(&self, addr: u64, value: u64) {
        self.write(addr, &value.to_le_bytes());
    }

    pub fn poke_i32(&self, addr: u64, value: i32) {
        self.write(addr, &value.to_le_bytes());
    }

    pub fn poke_f32s(&self, addr: u64, values: &[f32]) {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write(addr, &bytes);
    }
}

impl Transport for MockTransport {
    fn read_pages(&self, pages: &[u64]) -> HashMap<u64, PageRead> {
        self.page_calls.lock().push(pages.to_vec());
        let memory = self.pages.lock();
        let failing = self.failing.lock();
        pages
            .iter()
            .map(|&page_addr| {
                let read = match memory.get(&page_addr) {
                    Some(bytes) if !failing.contains(&page_addr) => PageRead::ok(bytes.clone()),
                    _ => PageRead::failed(),
                };
                (page_addr, read)
            })
            .collect()
    }

    fn read(&self, addr: u64, size: usize) -> Result<Vec<u8>> {
        self.reads.lock().push((addr, size));
        let memory = self.pages.lock();
        let failing = self.failing.lock();
        let mut out = Vec::with_capacity(size);
        while out.len() < size {
            let cur = addr
                .checked_add(out.len() as u64)
                .ok_or_else(|| Error::MemoryReadFailed {
                    address: addr,
                    message: "address overflow".to_string(),
                })?;
            let page_addr = page_align(cur);
            let bytes = match memory.get(&page_addr) {
                Some(bytes) if !failing.contains(&page_addr) => bytes,
                _ => {
                    return Err(Error::MemoryReadFailed {
                        address: cur,
                        message: "page not readable".to_string(),
                    });
                }
            };
            let offset = byte_offset(cur) as usize;
            let n = (size - out.len()).min(page::SIZE as usize - offset);
            out.extend_from_slice(&bytes[offset..offset + n]);
        }
        Ok(out)
    }

    fn write(&self, addr: u64, bytes: &[u8]) -> bool {
        write_into(&mut self.pages.lock(), addr, bytes);
        true
    }

    fn module_base(&self, module: &str) -> Option<u64> {
        self.modules.get(module).copied()
    }
}
