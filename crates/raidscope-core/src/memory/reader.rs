use std::sync::Arc;

use encoding_rs::UTF_16LE;
use tracing::trace;

use super::layout::limits;
use super::scatter::ScatterBatch;
use super::transport::Transport;
use super::value::FromBytes;
use crate::error::{Error, Result};
use crate::offset::StringOffsets;
use crate::shutdown::ShutdownSignal;

/// Read access to foreign memory.
///
/// Implementors provide raw byte reads and scatter execution; typed values,
/// pointers, chains and strings are built on top.
pub trait ReadMemory {
    /// Read exactly `size` bytes at `addr`.
    fn read_bytes(&self, addr: u64, size: usize) -> Result<Vec<u8>>;

    /// Execute a scatter batch in one transport round trip.
    fn scatter(&self, batch: &mut ScatterBatch) -> Result<()>;

    fn read_value<T: FromBytes>(&self, addr: u64) -> Result<T> {
        let bytes = self.read_bytes(addr, T::SIZE)?;
        T::from_le_slice(&bytes).ok_or_else(|| Error::MemoryReadFailed {
            address: addr,
            message: format!("expected {} bytes, got {}", T::SIZE, bytes.len()),
        })
    }

    fn read_u64(&self, addr: u64) -> Result<u64> {
        self.read_value(addr)
    }

    fn read_i32(&self, addr: u64) -> Result<i32> {
        self.read_value(addr)
    }

    fn read_bool(&self, addr: u64) -> Result<bool> {
        self.read_value(addr)
    }

    /// Dereference a pointer; a stored zero is [`Error::NullPointer`].
    fn read_ptr(&self, addr: u64) -> Result<u64> {
        match self.read_u64(addr)? {
            0 => Err(Error::NullPointer { address: addr }),
            ptr => Ok(ptr),
        }
    }

    /// Dereference a pointer, allowing zero.
    fn read_ptr_nullable(&self, addr: u64) -> Result<u64> {
        self.read_u64(addr)
    }

    /// Follow a pointer chain: `*(base + o0)`, then `*(prev + o1)`, and so on.
    ///
    /// Either every hop resolves or the call fails with the hop index and the
    /// address that could not be dereferenced. Shutdown is never wrapped.
    fn read_ptr_chain(&self, base: u64, offsets: &[u64]) -> Result<u64> {
        if offsets.is_empty() {
            return Err(Error::InvalidOffset("empty pointer chain".to_string()));
        }
        let mut addr = base;
        for (hop, offset) in offsets.iter().enumerate() {
            let target = addr.wrapping_add(*offset);
            addr = self.read_ptr(target).map_err(|e| {
                if e.is_shutdown() {
                    e
                } else {
                    Error::ChainResolution {
                        hop,
                        address: target,
                        source: Box::new(e),
                    }
                }
            })?;
        }
        Ok(addr)
    }

    /// Read a null-terminated string of at most `max_len` bytes.
    fn read_string(&self, addr: u64, max_len: usize) -> Result<String> {
        if max_len > limits::MAX_STRING_SIZE {
            return Err(Error::ReadOutOfBounds {
                address: addr,
                size: max_len,
            });
        }
        let bytes = self.read_bytes(addr, max_len)?;
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..len]).into_owned())
    }

    /// Read a length-prefixed UTF-16 string object.
    fn read_managed_string(&self, addr: u64, layout: &StringOffsets) -> Result<String> {
        let length = self.read_i32(addr.wrapping_add(layout.length))?;
        if length < 0 {
            return Err(Error::corrupt(addr, format!("negative string length {}", length)));
        }
        let size = length as usize * 2;
        if size > limits::MAX_STRING_SIZE {
            return Err(Error::ReadOutOfBounds { address: addr, size });
        }
        if size == 0 {
            return Ok(String::new());
        }
        let bytes = self.read_bytes(addr.wrapping_add(layout.value), size)?;
        let (decoded, _) = UTF_16LE.decode_without_bom_handling(&bytes);
        Ok(decoded.trim_end_matches('\0').to_string())
    }
}

/// Shutdown-aware reader over a [`Transport`]
#[derive(Clone)]
pub struct MemoryReader {
    transport: Arc<dyn Transport>,
    shutdown: Arc<ShutdownSignal>,
}

impl MemoryReader {
    pub fn new(transport: Arc<dyn Transport>, shutdown: Arc<ShutdownSignal>) -> Self {
        Self {
            transport,
            shutdown,
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn shutdown_signal(&self) -> &Arc<ShutdownSignal> {
        &self.shutdown
    }

    /// Fail fast once shutdown is raised, before any transport I/O.
    pub fn ensure_running(&self) -> Result<()> {
        if self.shutdown.is_shutdown() {
            Err(Error::TransportShutdown)
        } else {
            Ok(())
        }
    }

    /// Base address of a module in the foreign process.
    pub fn module_base(&self, module: &str) -> Result<u64> {
        self.ensure_running()?;
        match self.transport.module_base(module) {
            Some(base) if base != 0 => Ok(base),
            _ => Err(Error::ModuleNotFound(module.to_string())),
        }
    }
}

impl ReadMemory for MemoryReader {
    fn read_bytes(&self, addr: u64, size: usize) -> Result<Vec<u8>> {
        if size > limits::MAX_READ_SIZE {
            return Err(Error::ReadOutOfBounds { address: addr, size });
        }
        self.ensure_running()?;
        trace!("read {} bytes at {:#x}", size, addr);
        let bytes = self.transport.read(addr, size)?;
        if bytes.len() != size {
            return Err(Error::MemoryReadFailed {
                address: addr,
                message: format!("incomplete read: {} of {} bytes", bytes.len(), size),
            });
        }
        Ok(bytes)
    }

    fn scatter(&self, batch: &mut ScatterBatch) -> Result<()> {
        self.ensure_running()?;
        batch.execute(self.transport.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::memory::mock::{MockMemoryBuilder, MockTransport};
    use crate::offset::test_offsets;

    fn reader_for(transport: &Arc<MockTransport>) -> MemoryReader {
        MemoryReader::new(transport.clone(), Arc::new(ShutdownSignal::new()))
    }

    #[test]
    fn test_read_ptr_rejects_null() {
        let transport = MockMemoryBuilder::new()
            .write_u64(0x1000, 0)
            .write_u64(0x1008, 0x2000)
            .build();
        let reader = reader_for(&transport);

        assert!(matches!(
            reader.read_ptr(0x1000),
            Err(Error::NullPointer { address: 0x1000 })
        ));
        assert_eq!(reader.read_ptr_nullable(0x1000).unwrap(), 0);
        assert_eq!(reader.read_ptr(0x1008).unwrap(), 0x2000);
    }

    #[test]
    fn test_chain_resolves_every_hop() {
        let transport = MockMemoryBuilder::new()
            .write_u64(0x1010, 0x2000)
            .write_u64(0x2020, 0x3000)
            .write_u64(0x3030, 0x4000)
            .build();
        let reader = reader_for(&transport);

        assert_eq!(
            reader.read_ptr_chain(0x1000, &[0x10, 0x20, 0x30]).unwrap(),
            0x4000
        );
    }

    #[test]
    fn test_chain_stops_at_null_hop() {
        let transport = MockMemoryBuilder::new()
            .write_u64(0x1010, 0x2000)
            .write_u64(0x2020, 0)
            .write_u64(0x0030, 0x4000)
            .build();
        let reader = reader_for(&transport);

        let err = reader.read_ptr_chain(0x1000, &[0x10, 0x20, 0x30]).unwrap_err();
        match &err {
            Error::ChainResolution { hop, address, .. } => {
                assert_eq!(*hop, 1);
                assert_eq!(*address, 0x2020);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), FailureKind::NotPresent);
        // hop 2 would read 0x0 + 0x30
        assert!(!transport.was_read(0x30));
        assert_eq!(transport.reads().len(), 2);
    }

    #[test]
    fn test_chain_read_failure_is_transport_kind() {
        let transport = MockMemoryBuilder::new().write_u64(0x1010, 0x9000).build();
        let reader = reader_for(&transport);

        let err = reader.read_ptr_chain(0x1000, &[0x10, 0x8]).unwrap_err();
        assert!(matches!(err, Error::ChainResolution { hop: 1, .. }));
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        let transport = MockMemoryBuilder::new().build();
        let reader = reader_for(&transport);
        assert!(matches!(
            reader.read_ptr_chain(0x1000, &[]),
            Err(Error::InvalidOffset(_))
        ));
    }

    #[test]
    fn test_shutdown_fails_fast_without_transport() {
        let transport = MockMemoryBuilder::new().write_u64(0x1000, 0x2000).build();
        let shutdown = Arc::new(ShutdownSignal::new());
        let reader = MemoryReader::new(transport.clone(), shutdown.clone());

        shutdown.trigger();

        assert!(matches!(
            reader.read_u64(0x1000),
            Err(Error::TransportShutdown)
        ));
        assert!(matches!(
            reader.read_ptr_chain(0x1000, &[0x0, 0x8]),
            Err(Error::TransportShutdown)
        ));
        let mut batch = ScatterBatch::new();
        batch.add_value::<u64>(0x1000, 0);
        assert!(reader.scatter(&mut batch).unwrap_err().is_shutdown());
        assert!(matches!(
            reader.module_base("main.dll"),
            Err(Error::TransportShutdown)
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_oversized_read_is_rejected_before_io() {
        let transport = MockMemoryBuilder::new().build();
        let reader = reader_for(&transport);

        let err = reader
            .read_bytes(0x1000, limits::MAX_READ_SIZE + 1)
            .unwrap_err();
        assert!(matches!(err, Error::ReadOutOfBounds { .. }));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_read_string_stops_at_nul() {
        let transport = MockMemoryBuilder::new()
            .write_cstring(0x1000, "GameWorld")
            .build();
        let reader = reader_for(&transport);

        assert_eq!(reader.read_string(0x1000, 64).unwrap(), "GameWorld");
        assert!(matches!(
            reader.read_string(0x1000, limits::MAX_STRING_SIZE + 1),
            Err(Error::ReadOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_read_managed_string() {
        let layout = test_offsets().string;
        let transport = MockMemoryBuilder::new()
            .write_managed_string(0x1000, "Решала", &layout)
            .write_i32(0x2000 + layout.length, 0)
            .write_i32(0x3000 + layout.length, -4)
            .build();
        let reader = reader_for(&transport);

        assert_eq!(reader.read_managed_string(0x1000, &layout).unwrap(), "Решала");
        assert_eq!(reader.read_managed_string(0x2000, &layout).unwrap(), "");
        assert_eq!(
            reader.read_managed_string(0x3000, &layout).unwrap_err().kind(),
            FailureKind::Corrupt
        );
    }

    #[test]
    fn test_module_base_lookup() {
        let transport = MockMemoryBuilder::new()
            .module("UnityPlayer.dll", 0x7FF0_0000)
            .build();
        let reader = reader_for(&transport);

        assert_eq!(reader.module_base("UnityPlayer.dll").unwrap(), 0x7FF0_0000);
        assert!(matches!(
            reader.module_base("missing.dll"),
            Err(Error::ModuleNotFound(_))
        ));
    }
}
