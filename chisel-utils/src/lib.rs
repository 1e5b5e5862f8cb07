//! Shared primitives for the chisel toolkit.

pub mod types;

pub use types::{BiomeId, BlockPos, BlockStateId, ChunkPos};
