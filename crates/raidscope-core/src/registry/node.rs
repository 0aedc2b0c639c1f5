use tracing::debug;

use crate::error::Result;
use crate::memory::ReadMemory;
use crate::offset::{NodeOffsets, Offsets};

/// One link of the active-object list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectNode {
    /// Object held by this node; zero marks an unpopulated slot
    pub object: u64,
    /// Address of the next node
    pub next: u64,
}

impl ObjectNode {
    /// Read the node stored at `addr` in a single read.
    pub fn read<R: ReadMemory + ?Sized>(reader: &R, addr: u64, layout: &NodeOffsets) -> Result<Self> {
        let bytes = reader.read_bytes(addr, layout.span())?;
        let field = |offset: u64| {
            let offset = offset as usize;
            bytes
                .get(offset..offset + 8)
                .and_then(|b| b.try_into().ok())
                .map(u64::from_le_bytes)
                .unwrap_or(0)
        };
        Ok(Self {
            object: field(layout.object),
            next: field(layout.next),
        })
    }

    /// Read the node a slot points at; a null slot yields an empty node.
    pub fn read_slot<R: ReadMemory + ?Sized>(
        reader: &R,
        slot: u64,
        layout: &NodeOffsets,
    ) -> Result<Self> {
        match reader.read_ptr_nullable(slot)? {
            0 => Ok(Self::default()),
            addr => Self::read(reader, addr, layout),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.object != 0
    }
}

/// Slots holding the first and last nodes of the active-object list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryHeads {
    pub active_head: u64,
    pub last_node: u64,
}

impl RegistryHeads {
    /// Locate the list slots through the object manager of the main module.
    pub fn locate<R: ReadMemory + ?Sized>(
        reader: &R,
        module_base: u64,
        offsets: &Offsets,
    ) -> Result<Self> {
        let manager = reader.read_ptr(module_base.wrapping_add(offsets.module.object_manager))?;
        let active = reader.read_ptr(manager.wrapping_add(offsets.object_manager.active_nodes))?;
        let last = reader.read_ptr(manager.wrapping_add(offsets.object_manager.last_active_node))?;
        debug!(
            "Object manager at 0x{:X} (active 0x{:X}, last 0x{:X})",
            manager, active, last
        );
        Ok(Self {
            active_head: active,
            last_node: last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryReader, MockMemoryBuilder};
    use crate::offset::test_offsets;
    use crate::shutdown::ShutdownSignal;
    use std::sync::Arc;

    #[test]
    fn test_read_node_fields() {
        let offsets = test_offsets();
        let transport = MockMemoryBuilder::new()
            .write_u64(0x2000 + offsets.node.next, 0x3000)
            .write_u64(0x2000 + offsets.node.object, 0x4000)
            .write_u64(0x1000, 0x2000)
            .write_u64(0x1008, 0)
            .build();
        let reader = MemoryReader::new(transport, Arc::new(ShutdownSignal::new()));

        let node = ObjectNode::read(&reader, 0x2000, &offsets.node).unwrap();
        assert_eq!(
            node,
            ObjectNode {
                object: 0x4000,
                next: 0x3000
            }
        );
        assert_eq!(
            ObjectNode::read_slot(&reader, 0x1000, &offsets.node).unwrap(),
            node
        );
        let empty = ObjectNode::read_slot(&reader, 0x1008, &offsets.node).unwrap();
        assert!(!empty.is_populated());
    }

    #[test]
    fn test_locate_heads() {
        let offsets = test_offsets();
        let base = 0x40_0000;
        let manager = 0x50_0000;
        let transport = MockMemoryBuilder::new()
            .write_u64(base + offsets.module.object_manager, manager)
            .write_u64(manager + offsets.object_manager.active_nodes, 0x60_0000)
            .write_u64(manager + offsets.object_manager.last_active_node, 0x60_0100)
            .build();
        let reader = MemoryReader::new(transport, Arc::new(ShutdownSignal::new()));

        let heads = RegistryHeads::locate(&reader, base, &offsets).unwrap();
        assert_eq!(heads.active_head, 0x60_0000);
        assert_eq!(heads.last_node, 0x60_0100);
    }
}
