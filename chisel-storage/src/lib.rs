//! Readers for legacy world archives.
//!
//! Historical worlds are commonly shipped as ZIP backups containing
//! `<world>/region/r.X.Z.mca` (or the older `.mcr`) files. This crate only
//! locates the right entry and streams its raw bytes; decoding the region
//! binary format is the upstream reader's job.

pub mod error;
pub mod zipped;

pub use error::ChunkStoreError;
pub use zipped::ZippedRegionChunkStore;
