use crate::error::{MeshError, Result};
use std::cmp::Ordering;

/// Rank of a participant in a process group (0-indexed).
pub type Rank = u32;

/// Message tag. Channels keep FIFO order per (source, destination, tag).
pub type Tag = u64;

/// Identity of the calling process within its group.
///
/// Passed explicitly into every collective; nothing in this crate queries
/// a process-wide communicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessContext {
    rank: Rank,
    size: u32,
}

impl ProcessContext {
    pub fn new(rank: Rank, size: u32) -> Result<Self> {
        if size == 0 || rank >= size {
            return Err(MeshError::InvalidEndpoint {
                rank: rank as i64,
                world_size: size,
            });
        }
        Ok(Self { rank, size })
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Check a caller-supplied endpoint rank against this group.
    pub fn endpoint(&self, raw: i64) -> Result<Rank> {
        checked_endpoint(raw, self.size)
    }

    /// Check a caller-supplied root rank against this group.
    pub fn root(&self, raw: i64) -> Result<Rank> {
        if (0..self.size as i64).contains(&raw) {
            Ok(raw as Rank)
        } else {
            Err(MeshError::InvalidRoot {
                root: raw,
                world_size: self.size,
            })
        }
    }
}

/// Convert a raw (possibly negative) rank into a [`Rank`] within `[0, world_size)`.
pub fn checked_endpoint(raw: i64, world_size: u32) -> Result<Rank> {
    if (0..world_size as i64).contains(&raw) {
        Ok(raw as Rank)
    } else {
        Err(MeshError::InvalidEndpoint {
            rank: raw,
            world_size,
        })
    }
}

/// Element types that can travel through a collective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    I8 = 0,
    I16 = 1,
    I32 = 2,
    I64 = 3,
    U8 = 4,
    U16 = 5,
    U32 = 6,
    U64 = 7,
    F32 = 8,
    F64 = 9,
}

impl DataType {
    /// Size of one element in bytes.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 => 8,
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-width, ordered element with a little-endian wire encoding.
///
/// Every collective in the crate is generic over this trait; the algorithm
/// is the same for every type, only the byte width changes.
pub trait Element: Copy + PartialOrd + Send + Sync + std::fmt::Debug + 'static {
    const DTYPE: DataType;
    const WIDTH: usize = Self::DTYPE.size_in_bytes();

    fn write_le(self, out: &mut Vec<u8>);

    /// Read one element from exactly `WIDTH` bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Total order used by sorting and merging. Floats use IEEE 754
    /// `totalOrder`, so NaN and signed zeros still sort deterministically.
    fn total_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! impl_element {
    (int: $($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DataType = DataType::$dtype;
                impl_element!(@le $ty);

                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }
            }
        )*
    };
    (float: $($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DataType = DataType::$dtype;
                impl_element!(@le $ty);

                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    <$ty>::total_cmp(self, other)
                }
            }
        )*
    };
    (@le $ty:ty) => {
        #[inline]
        fn write_le(self, out: &mut Vec<u8>) {
            out.extend_from_slice(&self.to_le_bytes());
        }

        #[inline]
        fn read_le(bytes: &[u8]) -> Self {
            let mut raw = [0u8; std::mem::size_of::<$ty>()];
            raw.copy_from_slice(bytes);
            <$ty>::from_le_bytes(raw)
        }
    };
}

impl_element!(int:
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
);

impl_element!(float:
    f32 => F32,
    f64 => F64,
);
