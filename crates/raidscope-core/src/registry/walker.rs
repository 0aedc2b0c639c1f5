use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::node::{ObjectNode, RegistryHeads};
use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::memory::layout::{limits, timing};
use crate::offset::Offsets;
use crate::shutdown::ShutdownSignal;

/// Tuning for a registry walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Re-poll interval while the last node is unpopulated
    pub poll_interval: Duration,
    /// Give up waiting for the last node after this long
    pub max_wait: Duration,
    /// Node ceiling for cyclic or corrupt lists
    pub max_nodes: usize,
    /// Byte bound for object names
    pub name_len: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(timing::REGISTRY_POLL_INTERVAL_MS),
            max_wait: Duration::from_millis(timing::REGISTRY_MAX_WAIT_MS),
            max_nodes: limits::MAX_REGISTRY_NODES,
            name_len: limits::OBJECT_NAME_SIZE,
        }
    }
}

/// Result of a walk; `object == 0` means not found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOutcome {
    pub object: u64,
    /// Number of nodes whose name was examined
    pub visited: usize,
}

impl WalkOutcome {
    pub fn is_found(&self) -> bool {
        self.object != 0
    }
}

/// Locates named objects in the active-object list
pub struct ObjectGraphWalker<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    offsets: &'a Offsets,
    shutdown: &'a ShutdownSignal,
    options: WalkOptions,
}

impl<'a, R: ReadMemory + ?Sized> ObjectGraphWalker<'a, R> {
    pub fn new(reader: &'a R, offsets: &'a Offsets, shutdown: &'a ShutdownSignal) -> Self {
        Self {
            reader,
            offsets,
            shutdown,
            options: WalkOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Find the first object whose name contains `name` (case-insensitive).
    ///
    /// Traversal runs from the head to the sentinel node, whose own name is
    /// checked last. Running out of nodes is not an error.
    pub fn find(&self, heads: RegistryHeads, name: &str) -> Result<WalkOutcome> {
        let layout = &self.offsets.node;
        let mut node = ObjectNode::read_slot(self.reader, heads.active_head, layout)?;
        let last = match self.wait_for_last_node(heads, node)? {
            Some(last) => last,
            None => {
                return Ok(WalkOutcome {
                    object: 0,
                    visited: 0,
                });
            }
        };

        let needle = name.to_lowercase();
        let mut visited = 0;

        while node.is_populated() && node.object != last.object {
            visited += 1;
            if visited > self.options.max_nodes {
                return Err(Error::corrupt(
                    heads.active_head,
                    format!("object list exceeds {} nodes", self.options.max_nodes),
                ));
            }
            if self.name_matches(node.object, &needle)? {
                return Ok(WalkOutcome {
                    object: node.object,
                    visited,
                });
            }
            if node.next == 0 {
                break;
            }
            node = ObjectNode::read(self.reader, node.next, layout)?;
        }

        if last.is_populated() {
            visited += 1;
            if self.name_matches(last.object, &needle)? {
                return Ok(WalkOutcome {
                    object: last.object,
                    visited,
                });
            }
        }

        debug!("Object '{}' not found after {} nodes", name, visited);
        Ok(WalkOutcome { object: 0, visited })
    }

    /// Read the sentinel node, waiting while the list head is populated but
    /// the sentinel is not yet. `None` means the wait expired.
    fn wait_for_last_node(
        &self,
        heads: RegistryHeads,
        head: ObjectNode,
    ) -> Result<Option<ObjectNode>> {
        let layout = &self.offsets.node;
        let mut last = ObjectNode::read_slot(self.reader, heads.last_node, layout)?;
        if !head.is_populated() || last.is_populated() {
            return Ok(Some(last));
        }

        info!("Waiting for the object list to finish populating...");
        let started = Instant::now();
        while !last.is_populated() {
            if started.elapsed() >= self.options.max_wait {
                warn!(
                    "Object list still unpopulated after {:?}, giving up",
                    self.options.max_wait
                );
                return Ok(None);
            }
            if self.shutdown.wait(self.options.poll_interval) {
                return Err(Error::TransportShutdown);
            }
            last = ObjectNode::read_slot(self.reader, heads.last_node, layout)?;
        }
        Ok(Some(last))
    }

    fn name_matches(&self, object: u64, needle: &str) -> Result<bool> {
        let name = self.object_name(object);
        match name {
            Ok(name) => Ok(name.to_lowercase().contains(needle)),
            Err(e) if e.is_not_present() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Name of a registry object.
    pub fn object_name(&self, object: u64) -> Result<String> {
        let name_ptr = self
            .reader
            .read_ptr(object.wrapping_add(self.offsets.object.name))?;
        self.reader.read_string(name_ptr, self.options.name_len)
    }
}
