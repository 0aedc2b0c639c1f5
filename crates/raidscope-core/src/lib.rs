//! # raidscope-core
//!
//! Core library for the raidscope memory introspection engine.
//!
//! This crate provides:
//! - Batched scatter-gather reads and pointer-chain resolution over a
//!   pluggable memory transport
//! - Object registry traversal to locate the world root
//! - Entity reconstruction, classification and live-field refresh
//! - The session state machine and its background poll worker
//!
//! ## Feature Flags
//!
//! - `debug-tools`: Enables debug utilities for memory inspection (hexdumps,
//!   hop-by-hop chain traces). Intended for CLI tools and development.

pub mod config;
#[cfg(feature = "debug-tools")]
pub mod debug;
pub mod error;
pub mod game;
pub mod memory;
pub mod offset;
pub mod radar;
pub mod registry;
pub mod shutdown;

pub use config::Config;
pub use error::{Error, FailureKind, Result};
pub use game::{
    ClassificationTables, MapSource, NameTables, Player, PlayerClass, PlayerState, PlayerType,
    RegisteredPlayers, Session, SessionSettings, SessionStatus, SharedTables, Watchlist,
    WatchlistMonitor,
};
pub use memory::{
    MemoryMap, MemoryReader, MemoryRegion, ReadMemory, ScatterBatch, SnapshotTransport,
    Transport, Vec2, Vec3,
};
pub use offset::{Offsets, load_offsets, save_offsets};
pub use radar::{SessionView, Worker};
pub use registry::{ObjectGraphWalker, RegistryHeads, WalkOptions};
pub use shutdown::ShutdownSignal;

// Debug utilities (requires debug-tools feature)
#[cfg(feature = "debug-tools")]
pub use debug::{ChainHop, ChainTrace, MemoryDump};
