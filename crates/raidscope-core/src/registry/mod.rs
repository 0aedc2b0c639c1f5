//! Foreign object registry traversal.
//!
//! The managed runtime keeps every active object in a linked list owned by
//! its object manager. A walk starts at the list head and follows `next`
//! links until the sentinel (last) node, matching object names.

mod node;
mod walker;

pub use node::{ObjectNode, RegistryHeads};
pub use walker::{ObjectGraphWalker, WalkOptions, WalkOutcome};
