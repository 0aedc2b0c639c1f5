//! Debug utilities for inspecting foreign memory
//!
//! This module provides tools for:
//! - Dumping raw memory as a hexdump (`MemoryDump`)
//! - Tracing pointer chains hop by hop (`ChainTrace`)

mod chain;
mod dump;

pub use chain::{ChainHop, ChainTrace};
pub use dump::MemoryDump;
