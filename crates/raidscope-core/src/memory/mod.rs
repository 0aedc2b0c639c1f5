pub mod layout;
mod memmap;
pub mod page;
mod reader;
mod scatter;
mod snapshot;
mod transport;
mod value;

#[cfg(test)]
pub mod mock;

pub use memmap::{MemoryMap, MemoryRegion};
pub use reader::{MemoryReader, ReadMemory};
pub use scatter::{RequestId, ScatterBatch, ScatterRequest};
pub use snapshot::SnapshotTransport;
pub use transport::{PageRead, Transport};
pub use value::{FromBytes, Vec2, Vec3};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockTransport};
