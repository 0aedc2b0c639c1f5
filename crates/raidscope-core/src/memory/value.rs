//! Decoding of plain values from little-endian foreign memory.

use serde::{Deserialize, Serialize};

/// A value that can be decoded from a fixed number of little-endian bytes.
pub trait FromBytes: Sized {
    const SIZE: usize;

    /// Decode from the first `SIZE` bytes; `None` when the slice is too short.
    fn from_le_slice(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_from_bytes {
    ($($ty:ty),*) => {
        $(
            impl FromBytes for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn from_le_slice(bytes: &[u8]) -> Option<Self> {
                    let raw = bytes.get(..Self::SIZE)?.try_into().ok()?;
                    Some(<$ty>::from_le_bytes(raw))
                }
            }
        )*
    };
}

impl_from_bytes!(u8, u16, u32, u64, i32, i64, f32);

impl FromBytes for bool {
    const SIZE: usize = 1;

    fn from_le_slice(bytes: &[u8]) -> Option<Self> {
        bytes.first().map(|b| *b != 0)
    }
}

/// Two packed `f32`s (e.g. yaw/pitch)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Pack into a single `u64` so the pair can live in one atomic.
    pub fn to_bits(self) -> u64 {
        (u64::from(self.x.to_bits()) << 32) | u64::from(self.y.to_bits())
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            x: f32::from_bits((bits >> 32) as u32),
            y: f32::from_bits(bits as u32),
        }
    }
}

impl FromBytes for Vec2 {
    const SIZE: usize = 8;

    fn from_le_slice(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            x: f32::from_le_slice(bytes.get(0..4)?)?,
            y: f32::from_le_slice(bytes.get(4..8)?)?,
        })
    }
}

/// Three packed `f32`s (world position)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl FromBytes for Vec3 {
    const SIZE: usize = 12;

    fn from_le_slice(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            x: f32::from_le_slice(bytes.get(0..4)?)?,
            y: f32::from_le_slice(bytes.get(4..8)?)?,
            z: f32::from_le_slice(bytes.get(8..12)?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_decode_little_endian() {
        assert_eq!(u64::from_le_slice(&0xDEAD_BEEFu64.to_le_bytes()), Some(0xDEAD_BEEF));
        assert_eq!(i32::from_le_slice(&(-5i32).to_le_bytes()), Some(-5));
        assert_eq!(u32::from_le_slice(&[1, 2]), None);
    }

    #[test]
    fn test_bool_is_any_nonzero_byte() {
        assert_eq!(bool::from_le_slice(&[0]), Some(false));
        assert_eq!(bool::from_le_slice(&[2]), Some(true));
        assert_eq!(bool::from_le_slice(&[]), None);
    }

    #[test]
    fn test_vec3_decode() {
        let mut bytes = Vec::new();
        for v in [1.5f32, -2.0, 300.25] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(Vec3::from_le_slice(&bytes), Some(Vec3::new(1.5, -2.0, 300.25)));
        assert_eq!(Vec3::from_le_slice(&bytes[..8]), None);
    }

    #[test]
    fn test_vec2_bits_roundtrip() {
        let v = Vec2::new(271.5, -12.25);
        assert_eq!(Vec2::from_bits(v.to_bits()), v);
    }

    #[test]
    fn test_vec3_distance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(&b), 5.0);
    }
}
