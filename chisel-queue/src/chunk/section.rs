//! Per-layer population state.

/// Population state of one 16x16x16 layer in a chunk column.
///
/// An `Empty` layer owns no backing array. `Full` layers were replaced
/// wholesale by [`set_blocks`](super::blocks::ChunkBlocks::set_blocks);
/// `Partial` layers were lazily allocated by individual writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Section {
    /// No data for this layer.
    #[default]
    Empty,
    /// The whole layer was replaced.
    Full,
    /// Individual voxels were written.
    Partial,
}

impl Section {
    /// Whether this layer owns a backing array.
    #[must_use]
    #[inline]
    pub const fn has_data(self) -> bool {
        !matches!(self, Self::Empty)
    }
}
