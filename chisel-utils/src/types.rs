//! Wrapper types making it harder to accidentally mix up the underlying ints.

use std::fmt::{self, Display};

/// A raw block state ordinal. A registry outside this toolkit maps it back to
/// a concrete block and its properties. Ordinal 0 means "untouched".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlockStateId(pub u16);

/// A biome id as encoded by the world storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BiomeId(pub u16);

/// A block position in absolute world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    /// East/west coordinate.
    pub x: i32,
    /// Vertical coordinate. Not bounded; sections are derived with `y >> 4`.
    pub y: i32,
    /// North/south coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The index of the 16-block-tall section containing this position.
    #[must_use]
    #[inline]
    pub const fn section_index(self) -> i32 {
        self.y >> 4
    }
}

/// A chunk column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    /// Chunk x coordinate (block x divided by 16).
    pub x: i32,
    /// Chunk z coordinate (block z divided by 16).
    pub z: i32,
}

impl ChunkPos {
    /// Creates a new chunk position.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The x coordinate of the 32x32-chunk region file containing this chunk.
    #[must_use]
    #[inline]
    pub const fn region_x(self) -> i32 {
        self.x >> 5
    }

    /// The z coordinate of the 32x32-chunk region file containing this chunk.
    #[must_use]
    #[inline]
    pub const fn region_z(self) -> i32 {
        self.z >> 5
    }
}

impl Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}
