//! Batched scatter-gather reads.
//!
//! Many small reads are collapsed into one transport call covering the
//! distinct pages they touch, then each request copies its bytes back out of
//! those pages. A request fails on its own without affecting the rest of the
//! batch.

use std::collections::BTreeSet;

use tracing::trace;

use super::layout::{limits, page};
use super::page::{byte_offset, page_align, pages_spanned, span_pages};
use super::transport::Transport;
use super::value::FromBytes;

/// One read in a scatter batch
#[derive(Debug, Clone)]
pub struct ScatterRequest {
    pub base_addr: u64,
    pub offset: u64,
    pub size: usize,
    failed: bool,
    result: Option<Vec<u8>>,
}

impl ScatterRequest {
    pub fn new(base_addr: u64, offset: u64, size: usize) -> Self {
        Self {
            base_addr,
            offset,
            size,
            failed: false,
            result: None,
        }
    }

    /// Absolute address of the first byte, or `None` on overflow.
    pub fn read_address(&self) -> Option<u64> {
        self.base_addr.checked_add(self.offset)
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Bytes read for this request; `None` if it failed or was never executed.
    pub fn result(&self) -> Option<&[u8]> {
        self.result.as_deref()
    }

    /// Decode the result as a plain value.
    pub fn value<T: FromBytes>(&self) -> Option<T> {
        T::from_le_slice(self.result()?)
    }

    fn is_valid(&self) -> bool {
        self.base_addr != 0
            && self.size != 0
            && self.size <= limits::MAX_READ_SIZE
            && self.read_address().is_some()
    }

    fn fail(&mut self) {
        self.failed = true;
        self.result = None;
    }

    fn complete(&mut self, bytes: Vec<u8>) {
        debug_assert!(self.result.is_none(), "scatter result set twice");
        self.result = Some(bytes);
    }
}

/// Handle to a request inside a [`ScatterBatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(usize);

/// An ordered set of reads executed together
#[derive(Debug, Default)]
pub struct ScatterBatch {
    requests: Vec<ScatterRequest>,
    executed: bool,
}

impl ScatterBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a read of `size` bytes at `base_addr + offset`.
    pub fn add(&mut self, base_addr: u64, offset: u64, size: usize) -> RequestId {
        self.requests
            .push(ScatterRequest::new(base_addr, offset, size));
        RequestId(self.requests.len() - 1)
    }

    /// Queue a read sized for `T`.
    pub fn add_value<T: FromBytes>(&mut self, base_addr: u64, offset: u64) -> RequestId {
        self.add(base_addr, offset, T::SIZE)
    }

    pub fn get(&self, id: RequestId) -> &ScatterRequest {
        &self.requests[id.0]
    }

    pub fn value<T: FromBytes>(&self, id: RequestId) -> Option<T> {
        self.get(id).value()
    }

    pub fn bytes(&self, id: RequestId) -> Option<&[u8]> {
        self.get(id).result()
    }

    pub fn requests(&self) -> &[ScatterRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Run every queued request through a single batched transport call.
    ///
    /// A batch is consumed once; executing it again is a no-op.
    pub fn execute(&mut self, transport: &dyn Transport) {
        if self.executed {
            return;
        }
        self.executed = true;

        // Pass 1: validate and collect every distinct page
        let mut pages = BTreeSet::new();
        for request in &mut self.requests {
            if !request.is_valid() {
                request.fail();
                continue;
            }
            let addr = request.base_addr + request.offset;
            pages.extend(pages_spanned(addr, request.size));
        }

        if pages.is_empty() {
            trace!("Scatter batch has no valid requests, skipping transport");
            return;
        }

        let pages: Vec<u64> = pages.into_iter().collect();
        trace!(
            "Scatter batch: {} requests over {} pages",
            self.requests.len(),
            pages.len()
        );
        let results = transport.read_pages(&pages);

        // Pass 2: copy each request's bytes out of the pages it spans
        for request in &mut self.requests {
            if request.failed {
                continue;
            }

            let addr = request.base_addr + request.offset;
            let size = request.size;
            let mut buffer = Vec::with_capacity(size);
            let mut page_offset = byte_offset(addr) as usize;
            let mut chunk = size.min(page::SIZE as usize - page_offset);
            let first_page = page_align(addr);
            let mut complete = true;

            for i in 0..span_pages(addr, size) {
                let page_addr = first_page.wrapping_add(i * page::SIZE);
                match results.get(&page_addr) {
                    Some(read) if read.is_usable() => {
                        buffer.extend_from_slice(&read.bytes[page_offset..page_offset + chunk]);
                    }
                    _ => {
                        complete = false;
                        break;
                    }
                }
                page_offset = 0;
                chunk = (size - buffer.len()).min(page::SIZE as usize);
            }

            if complete && buffer.len() == size {
                request.complete(buffer);
            } else {
                request.fail();
            }
        }
    }
}
