//! Error taxonomy for chunk stores.

use thiserror::Error;

/// Failures while resolving chunk data inside a legacy store.
///
/// `MissingWorld` and `MissingChunk` are recoverable; importers catch them
/// per chunk and skip or report. I/O and archive-format failures surface as
/// `Io` since callers only need to know the read failed.
#[derive(Debug, Error)]
pub enum ChunkStoreError {
    /// No entry in the archive belongs to the requested world.
    #[error("world {0:?} is not present in the archive")]
    MissingWorld(String),
    /// The world was found but the requested region entry is absent under
    /// both naming schemes.
    #[error("missing chunk data {name:?} for world {world:?}")]
    MissingChunk {
        /// The world the lookup ran against.
        world: String,
        /// The entry name that was tried (modern naming).
        name: String,
    },
    /// The archive could not be opened or an entry could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
