//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod chain;
pub mod hex_utils;
pub mod hexdump;
pub mod mmap;
pub mod run;
pub mod source;
pub mod walk;
