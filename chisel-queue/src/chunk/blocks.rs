//! Layered block-id storage for one chunk column.
//!
//! One optional 4096-entry array per 16x16x16 section, indexed by an offset
//! from a movable minimum section index. Sections are allocated lazily on
//! first write and the vertical range grows on demand in either direction;
//! see [`ChunkBlocks::check_layer`].

use chisel_utils::BlockStateId;

use super::SECTION_VOLUME;
use super::block_index;
use super::section::Section;

/// A whole section worth of block ordinals.
pub type SectionBlocks = Box<[BlockStateId; SECTION_VOLUME]>;

/// How [`ChunkBlocks::check_layer`] changed the vertical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerGrowth {
    /// The layer was already inside the range.
    Unchanged,
    /// The range grew by this many sections below the previous minimum.
    Below(usize),
    /// The range grew by this many sections above the previous maximum.
    Above(usize),
}

/// Block-id deltas for one chunk column.
///
/// Ordinal 0 doubles as the "untouched" default: reads of a voxel no write
/// has reached return `BlockStateId(0)` without allocating anything.
#[derive(Debug)]
pub struct ChunkBlocks {
    blocks: Vec<Option<SectionBlocks>>,
    sections: Vec<Section>,
    min_section_index: i32,
    max_section_index: i32,
}

impl ChunkBlocks {
    /// Creates a store spanning `min_section_index..=max_section_index`, all
    /// layers empty.
    ///
    /// # Panics
    /// Panics if `min_section_index > max_section_index`.
    #[must_use]
    pub fn new(min_section_index: i32, max_section_index: i32) -> Self {
        assert!(
            min_section_index <= max_section_index,
            "invalid section range {min_section_index}..={max_section_index}"
        );
        let count = (max_section_index - min_section_index + 1) as usize;
        let mut blocks = Vec::new();
        blocks.resize_with(count, || None);
        Self {
            blocks,
            sections: vec![Section::Empty; count],
            min_section_index,
            max_section_index,
        }
    }

    /// Lowest section index currently spanned (inclusive).
    #[must_use]
    pub const fn min_section_index(&self) -> i32 {
        self.min_section_index
    }

    /// Highest section index currently spanned (inclusive).
    #[must_use]
    pub const fn max_section_index(&self) -> i32 {
        self.max_section_index
    }

    /// Number of sections currently spanned.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Whether `layer` falls inside the current vertical range.
    #[must_use]
    pub const fn contains_layer(&self, layer: i32) -> bool {
        layer >= self.min_section_index && layer <= self.max_section_index
    }

    #[inline]
    fn layer_offset(&self, layer: i32) -> usize {
        debug_assert!(self.contains_layer(layer), "layer {layer} out of range");
        (layer - self.min_section_index) as usize
    }

    /// Reads one voxel. Out-of-range or empty layers yield the default
    /// ordinal; reads never allocate or grow.
    #[must_use]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockStateId {
        let layer = y >> 4;
        if !self.contains_layer(layer) {
            return BlockStateId::default();
        }
        match &self.blocks[(layer - self.min_section_index) as usize] {
            Some(data) => data[block_index(x, y, z)],
            None => BlockStateId::default(),
        }
    }

    /// Writes one voxel, lazily allocating the section array.
    ///
    /// The caller must have brought `y >> 4` into range with
    /// [`check_layer`](Self::check_layer) first; writing outside the range is
    /// a programmer error.
    pub fn set(&mut self, x: i32, y: i32, z: i32, value: BlockStateId) {
        self.load(y >> 4)[block_index(x, y, z)] = value;
    }

    /// Returns the section array for `layer`, allocating it (and marking the
    /// layer `Partial`) on first access.
    ///
    /// # Panics
    /// Panics if `layer` is outside the current range; expand with
    /// [`check_layer`](Self::check_layer) first.
    pub fn load(&mut self, layer: i32) -> &mut [BlockStateId; SECTION_VOLUME] {
        let i = self.layer_offset(layer);
        if self.sections[i] == Section::Empty {
            self.sections[i] = Section::Partial;
        }
        self.blocks[i].get_or_insert_with(|| Box::new([BlockStateId::default(); SECTION_VOLUME]))
    }

    /// Replaces a whole section. `Some` marks the layer `Full`, `None` drops
    /// the layer back to `Empty`.
    ///
    /// # Panics
    /// Panics if `layer` is outside the current range.
    pub fn set_blocks(&mut self, layer: i32, data: Option<SectionBlocks>) {
        let i = self.layer_offset(layer);
        self.sections[i] = if data.is_some() {
            Section::Full
        } else {
            Section::Empty
        };
        self.blocks[i] = data;
    }

    /// Whether `layer` has a backing array.
    #[must_use]
    pub fn has_section(&self, layer: i32) -> bool {
        self.contains_layer(layer)
            && self.sections[(layer - self.min_section_index) as usize].has_data()
    }

    /// Whether no layer in the range has a backing array.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|section| !section.has_data())
    }

    /// The population state of `layer`, `Empty` when out of range.
    #[must_use]
    pub fn section_state(&self, layer: i32) -> Section {
        if self.contains_layer(layer) {
            self.sections[(layer - self.min_section_index) as usize]
        } else {
            Section::Empty
        }
    }

    /// Drops every section array and collapses all layers to `Empty`.
    ///
    /// The enlarged vertical bounds are kept: growth is sticky for the
    /// lifetime of the instance so repeated large edits against a pooled
    /// buffer stop paying for expansion.
    pub fn reset(&mut self) {
        for slot in &mut self.blocks {
            *slot = None;
        }
        self.sections.fill(Section::Empty);
    }

    /// Expands the vertical range to include `layer`.
    ///
    /// In-range layers are a no-op. Otherwise the backing storage is rebuilt
    /// with the existing data shifted to its new offset before being swapped
    /// in, so a failed allocation can never leave a partially-moved store.
    /// The range only ever grows; it collapses back to the construction span
    /// on [`reset`](Self::reset) of the owning pool generation, never here.
    pub fn check_layer(&mut self, layer: i32) -> LayerGrowth {
        if self.contains_layer(layer) {
            return LayerGrowth::Unchanged;
        }
        if layer < self.min_section_index {
            let diff = (self.min_section_index - layer) as usize;
            let count = self.sections.len() + diff;

            let mut blocks = Vec::with_capacity(count);
            blocks.resize_with(diff, || None);
            blocks.append(&mut self.blocks);

            let mut sections = vec![Section::Empty; count];
            sections[diff..].copy_from_slice(&self.sections);

            self.blocks = blocks;
            self.sections = sections;
            self.min_section_index = layer;
            LayerGrowth::Below(diff)
        } else {
            let diff = (layer - self.max_section_index) as usize;
            let count = self.sections.len() + diff;
            self.blocks.resize_with(count, || None);
            self.sections.resize(count, Section::Empty);
            self.max_section_index = layer;
            LayerGrowth::Above(diff)
        }
    }
}

impl Default for ChunkBlocks {
    fn default() -> Self {
        // Matches the default world height before expansion kicks in.
        Self::new(0, 15)
    }
}
