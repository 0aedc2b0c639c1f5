//! Size limits and timing constants shared by the memory layer.
//!
//! Foreign structure offsets live in [`crate::offset::Offsets`]; this module
//! only holds values that do not change with the foreign binary's version.

/// Page geometry used for every batched read
pub mod page {
    /// Page size (4 KiB)
    pub const SIZE: u64 = 0x1000;
    /// log2(SIZE)
    pub const SHIFT: u32 = 12;
}

/// Upper bounds applied before a read is issued
pub mod limits {
    use super::page;

    /// Largest single read accepted (1500 pages, roughly 6 MB)
    pub const MAX_READ_SIZE: usize = (page::SIZE as usize) * 1500;

    /// Longest null-terminated or managed string accepted (one page)
    pub const MAX_STRING_SIZE: usize = page::SIZE as usize;

    /// Byte bound for object names read during a registry walk
    pub const OBJECT_NAME_SIZE: usize = 64;

    /// Registry walks give up after this many nodes (cyclic or corrupt list)
    pub const MAX_REGISTRY_NODES: usize = 100_000;

    /// Entity lists larger than this are treated as corrupt
    pub const MAX_ENTITY_COUNT: usize = 512;
}

/// Timing constants for polling and rate limiting
pub mod timing {
    /// Interval between worker ticks (ms)
    pub const POLL_INTERVAL_MS: u64 = 100;

    /// Delay between attach attempts while the process is not found (ms)
    pub const REATTACH_INTERVAL_MS: u64 = 5000;

    /// Re-poll interval while the registry's last node is unpopulated (ms)
    pub const REGISTRY_POLL_INTERVAL_MS: u64 = 1000;

    /// Longest time spent waiting for the registry's last node (ms)
    pub const REGISTRY_MAX_WAIT_MS: u64 = 30_000;

    /// Cooldown between transform re-acquisition attempts (ms)
    pub const TRANSFORM_REFRESH_COOLDOWN_MS: u64 = 250;
}
