//! Out-of-band chunk mutation buffers for bulk world edits.
//!
//! Large edits never touch the live world directly. Each worker checks a
//! [`ChunkSet`] out of a [`Pool`], accumulates block, biome, light, tile
//! entity and entity deltas for one chunk column, and hands the buffer to the
//! commit pipeline. The buffer grows its vertical section range lazily as
//! writes touch new altitudes and is recycled (reset and reused) once the
//! edit is applied, so a million-block operation allocates almost nothing
//! per chunk after warm-up.

pub mod chunk;
pub mod config;
pub mod pool;

pub use chunk::chunk_set::ChunkSet;
pub use config::QueueConfig;
pub use pool::{Pool, Reusable};
