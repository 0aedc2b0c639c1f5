use serde::Serialize;

use crate::memory::ReadMemory;

/// One dereference in a traced chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainHop {
    pub hop: usize,
    pub offset: u64,
    /// Address that was dereferenced (`previous + offset`)
    pub address: u64,
    /// Pointer read there; `None` when the read failed
    pub value: Option<u64>,
}

/// Hop-by-hop record of a pointer chain resolution.
///
/// Unlike `ReadMemory::read_ptr_chain`, tracing keeps every hop resolved
/// before the failure, which is what you want when a table entry is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainTrace {
    pub base: u64,
    pub hops: Vec<ChainHop>,
    pub error: Option<String>,
}

impl ChainTrace {
    pub fn trace<R: ReadMemory + ?Sized>(reader: &R, base: u64, offsets: &[u64]) -> Self {
        let mut hops = Vec::with_capacity(offsets.len());
        let mut current = base;
        for (hop, &offset) in offsets.iter().enumerate() {
            let address = current.wrapping_add(offset);
            match reader.read_ptr(address) {
                Ok(value) => {
                    hops.push(ChainHop {
                        hop,
                        offset,
                        address,
                        value: Some(value),
                    });
                    current = value;
                }
                Err(e) => {
                    hops.push(ChainHop {
                        hop,
                        offset,
                        address,
                        value: None,
                    });
                    return Self {
                        base,
                        hops,
                        error: Some(e.to_string()),
                    };
                }
            }
        }
        Self {
            base,
            hops,
            error: None,
        }
    }

    /// Final pointer, if every hop resolved.
    pub fn target(&self) -> Option<u64> {
        if self.error.is_some() {
            return None;
        }
        self.hops.last().and_then(|hop| hop.value)
    }
}
