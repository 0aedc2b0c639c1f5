use crate::error::{Error, Result};
use crate::memory::{ReadMemory, Vec3};
use crate::offset::TransformOffsets;

/// Resolved location of an entity's world position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transform {
    /// Transform object the position was resolved from
    pub internal: u64,
    /// Address of the `Vec3` world position
    pub position_addr: u64,
}

impl Transform {
    /// Resolve the position block of `internal` and verify it holds a sane
    /// position.
    pub fn acquire<R: ReadMemory + ?Sized>(
        reader: &R,
        internal: u64,
        layout: &TransformOffsets,
    ) -> Result<Self> {
        let data = reader.read_ptr(internal.wrapping_add(layout.hierarchy))?;
        let position_addr = data.wrapping_add(layout.position);
        let position: Vec3 = reader.read_value(position_addr)?;
        check_position(position_addr, position)?;
        Ok(Self {
            internal,
            position_addr,
        })
    }
}

/// Reject positions that cannot come from a live transform.
pub fn check_position(addr: u64, position: Vec3) -> Result<Vec3> {
    if position.is_finite() {
        Ok(position)
    } else {
        Err(Error::corrupt(addr, format!("non-finite position {:?}", position)))
    }
}
