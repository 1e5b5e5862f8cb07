//! Per-chunk-column delta storage.

pub mod blocks;
pub mod chunk_set;
pub mod section;

/// Number of voxels in one 16x16x16 section.
pub const SECTION_VOLUME: usize = 4096;

/// Number of 4x4x4 biome macro-cells in one section.
pub const BIOME_CELLS_PER_SECTION: usize = 64;

/// Entries in a per-column height map (16x16).
pub const HEIGHTMAP_SIZE: usize = 256;

/// Sentinel for a light voxel no edit has touched yet. One more than the
/// maximum light value, so it survives in the 8-bit storage.
pub const LIGHT_UNSET: u8 = 16;

/// Maximum light value.
pub const FULL_BRIGHT: u8 = 15;

/// Index of a voxel inside a section array.
#[must_use]
#[inline]
pub const fn block_index(x: i32, y: i32, z: i32) -> usize {
    (((y & 15) << 8) | ((z & 15) << 4) | (x & 15)) as usize
}

/// Index of a 4x4x4 macro-cell inside a biome array. `y` must already be
/// normalized against the buffer's minimum section index; `x` and `z` are
/// chunk-relative (0..16).
#[must_use]
#[inline]
pub const fn biome_index(x: i32, y: i32, z: i32) -> usize {
    (((y >> 2) << 4) | (((z & 15) >> 2) << 2) | ((x & 15) >> 2)) as usize
}

/// The height map variants tracked by the world storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeightMapKind {
    /// Highest non-air block.
    WorldSurface,
    /// Highest solid block below water.
    OceanFloor,
    /// Highest block that blocks motion or contains a fluid.
    MotionBlocking,
    /// Like `MotionBlocking`, ignoring leaves.
    MotionBlockingNoLeaves,
}
