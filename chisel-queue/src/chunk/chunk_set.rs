//! The per-chunk mutation buffer handed out by the pool.
//!
//! A `ChunkSet` collects every kind of delta an edit can make to one chunk
//! column: block ordinals, biomes, block and sky light, tile entities,
//! entity additions and removals, and height maps. All side channels are
//! allocated lazily on first write, never on read, and are re-based whenever
//! a write expands the vertical section range.

use rustc_hash::{FxHashMap, FxHashSet};
use simdnbt::owned::NbtCompound;
use uuid::Uuid;

use chisel_utils::{BiomeId, BlockPos, BlockStateId};

use crate::config::QueueConfig;
use crate::pool::{Pool, Reusable};

use super::blocks::{ChunkBlocks, LayerGrowth, SectionBlocks};
use super::section::Section;
use super::{
    BIOME_CELLS_PER_SECTION, FULL_BRIGHT, HEIGHTMAP_SIZE, HeightMapKind, LIGHT_UNSET,
    SECTION_VOLUME, biome_index, block_index,
};

/// A whole section worth of raw light values.
pub type SectionLight = Box<[u8; SECTION_VOLUME]>;

/// Accumulated deltas for one chunk column, to be applied by the commit
/// pipeline.
///
/// A checked-out buffer is owned exclusively by one edit worker; nothing in
/// here locks. Exclusivity across workers is the pool's job.
#[derive(Debug)]
pub struct ChunkSet {
    blocks: ChunkBlocks,
    /// One entry per 4x4x4 macro-cell across the current vertical range
    /// (64 per section). Allocated on the first biome write.
    biomes: Option<Vec<Option<BiomeId>>>,
    /// One optional array per section, kept aligned with `blocks`.
    light: Vec<Option<SectionLight>>,
    sky_light: Vec<Option<SectionLight>>,
    tiles: FxHashMap<BlockPos, NbtCompound>,
    entities: Vec<NbtCompound>,
    entity_removes: FxHashSet<Uuid>,
    height_maps: FxHashMap<HeightMapKind, Box<[i32; HEIGHTMAP_SIZE]>>,
    fast_mode: bool,
    bit_mask: i32,
}

impl ChunkSet {
    /// Creates a buffer spanning `min_section_index..=max_section_index`.
    #[must_use]
    pub fn new(min_section_index: i32, max_section_index: i32) -> Self {
        let blocks = ChunkBlocks::new(min_section_index, max_section_index);
        let count = blocks.section_count();
        let mut light = Vec::new();
        light.resize_with(count, || None);
        let mut sky_light = Vec::new();
        sky_light.resize_with(count, || None);
        Self {
            blocks,
            biomes: None,
            light,
            sky_light,
            tiles: FxHashMap::default(),
            entities: Vec::new(),
            entity_removes: FxHashSet::default(),
            height_maps: FxHashMap::default(),
            fast_mode: false,
            bit_mask: -1,
        }
    }

    /// Builds a recycling pool whose buffers span the configured default
    /// vertical range.
    #[must_use]
    pub fn pool(config: &QueueConfig) -> Pool<Self> {
        let (min, max) = (config.min_section_index, config.max_section_index);
        Pool::with_factory(config.pool_capacity, move || Self::new(min, max))
    }

    /// Expands the vertical range to include `layer`, re-basing the lazily
    /// allocated side channels so already-written biome and light data stays
    /// addressable at its absolute coordinates.
    fn check_layer(&mut self, layer: i32) {
        match self.blocks.check_layer(layer) {
            LayerGrowth::Unchanged => {}
            LayerGrowth::Below(diff) => {
                prepend_none(&mut self.light, diff);
                prepend_none(&mut self.sky_light, diff);
                if let Some(biomes) = &mut self.biomes {
                    prepend_none(biomes, diff * BIOME_CELLS_PER_SECTION);
                }
            }
            // Growth above leaves existing offsets untouched; only the tail
            // needs fresh slots.
            LayerGrowth::Above(_) => {
                let count = self.blocks.section_count();
                self.light.resize_with(count, || None);
                self.sky_light.resize_with(count, || None);
                if let Some(biomes) = &mut self.biomes {
                    biomes.resize(count * BIOME_CELLS_PER_SECTION, None);
                }
            }
        }
    }

    #[inline]
    fn layer_offset(&self, layer: i32) -> usize {
        (layer - self.blocks.min_section_index()) as usize
    }

    // ---- blocks ----

    /// Writes one block ordinal, growing the range as needed.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockStateId) -> bool {
        self.check_layer(y >> 4);
        self.blocks.set(x, y, z, block);
        true
    }

    /// Reads one block ordinal; default for untouched voxels.
    #[must_use]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockStateId {
        self.blocks.get(x, y, z)
    }

    /// Replaces a whole section, growing the range as needed.
    pub fn set_blocks(&mut self, layer: i32, data: Option<SectionBlocks>) {
        self.check_layer(layer);
        self.blocks.set_blocks(layer, data);
    }

    /// The section array for `layer`, allocated on first access. Grows the
    /// range as needed.
    pub fn load(&mut self, layer: i32) -> &mut [BlockStateId; SECTION_VOLUME] {
        self.check_layer(layer);
        self.blocks.load(layer)
    }

    /// Whether `layer` has block data.
    #[must_use]
    pub fn has_section(&self, layer: i32) -> bool {
        self.blocks.has_section(layer)
    }

    /// The population state of `layer`.
    #[must_use]
    pub fn section_state(&self, layer: i32) -> Section {
        self.blocks.section_state(layer)
    }

    /// Number of sections currently spanned.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.blocks.section_count()
    }

    /// Lowest section index currently spanned (inclusive).
    #[must_use]
    pub fn min_section_index(&self) -> i32 {
        self.blocks.min_section_index()
    }

    /// Highest section index currently spanned (inclusive).
    #[must_use]
    pub fn max_section_index(&self) -> i32 {
        self.blocks.max_section_index()
    }

    // ---- biomes ----

    /// Writes one biome macro-cell, growing the range as needed.
    pub fn set_biome(&mut self, x: i32, y: i32, z: i32, biome: BiomeId) -> bool {
        self.check_layer(y >> 4);
        let y = y - (self.blocks.min_section_index() << 4);
        let cells = self.blocks.section_count() * BIOME_CELLS_PER_SECTION;
        let biomes = self.biomes.get_or_insert_with(|| vec![None; cells]);
        biomes[biome_index(x, y, z)] = Some(biome);
        true
    }

    /// Reads one biome macro-cell; `None` for untouched cells or
    /// out-of-range coordinates. Never allocates.
    #[must_use]
    pub fn get_biome(&self, x: i32, y: i32, z: i32) -> Option<BiomeId> {
        if !self.blocks.contains_layer(y >> 4) {
            return None;
        }
        let biomes = self.biomes.as_ref()?;
        let y = y - (self.blocks.min_section_index() << 4);
        biomes[biome_index(x, y, z)]
    }

    /// The biome delta array, `None` until the first biome write.
    #[must_use]
    pub fn biomes(&self) -> Option<&[Option<BiomeId>]> {
        self.biomes.as_deref()
    }

    // ---- light ----

    /// Writes one block-light voxel. Allocates the section's light array
    /// filled with the "unset" sentinel on first touch.
    pub fn set_block_light(&mut self, x: i32, y: i32, z: i32, value: u8) {
        self.check_layer(y >> 4);
        let i = self.layer_offset(y >> 4);
        let data = self.light[i].get_or_insert_with(|| Box::new([LIGHT_UNSET; SECTION_VOLUME]));
        data[block_index(x, y, z)] = value;
    }

    /// Writes one sky-light voxel; see [`set_block_light`](Self::set_block_light).
    pub fn set_sky_light(&mut self, x: i32, y: i32, z: i32, value: u8) {
        self.check_layer(y >> 4);
        let i = self.layer_offset(y >> 4);
        let data = self.sky_light[i].get_or_insert_with(|| Box::new([LIGHT_UNSET; SECTION_VOLUME]));
        data[block_index(x, y, z)] = value;
    }

    /// Replaces a whole section's block-light array.
    pub fn set_light_layer(&mut self, layer: i32, data: SectionLight) {
        self.check_layer(layer);
        let i = self.layer_offset(layer);
        self.light[i] = Some(data);
    }

    /// Replaces a whole section's sky-light array.
    pub fn set_sky_light_layer(&mut self, layer: i32, data: SectionLight) {
        self.check_layer(layer);
        let i = self.layer_offset(layer);
        self.sky_light[i] = Some(data);
    }

    /// Zeroes a section's block light, and its sky light when `sky` is set.
    /// Sections without light data get an all-zero array, which the commit
    /// pipeline applies as "clear this section's lighting".
    pub fn remove_section_lighting(&mut self, layer: i32, sky: bool) {
        self.check_layer(layer);
        let i = self.layer_offset(layer);
        fill_or_insert(&mut self.light[i], 0);
        if sky {
            fill_or_insert(&mut self.sky_light[i], 0);
        }
    }

    /// Floods a section's block and sky light with the maximum value.
    pub fn set_full_bright(&mut self, layer: i32) {
        self.check_layer(layer);
        let i = self.layer_offset(layer);
        fill_or_insert(&mut self.light[i], FULL_BRIGHT);
        fill_or_insert(&mut self.sky_light[i], FULL_BRIGHT);
    }

    /// Per-section block-light deltas, aligned with the section range.
    #[must_use]
    pub fn light(&self) -> &[Option<SectionLight>] {
        &self.light
    }

    /// Per-section sky-light deltas, aligned with the section range.
    #[must_use]
    pub fn sky_light(&self) -> &[Option<SectionLight>] {
        &self.sky_light
    }

    // ---- tiles and entities ----

    /// Attaches tile-entity data to a block position, growing the range as
    /// needed.
    pub fn set_tile(&mut self, x: i32, y: i32, z: i32, tile: NbtCompound) -> bool {
        self.check_layer(y >> 4);
        self.tiles.insert(BlockPos::new(x, y, z), tile);
        true
    }

    /// The tile-entity data at a position, if any was set.
    #[must_use]
    pub fn tile(&self, x: i32, y: i32, z: i32) -> Option<&NbtCompound> {
        self.tiles.get(&BlockPos::new(x, y, z))
    }

    /// All tile-entity deltas, keyed by absolute block position.
    #[must_use]
    pub fn tiles(&self) -> &FxHashMap<BlockPos, NbtCompound> {
        &self.tiles
    }

    /// Queues an entity to be spawned when the buffer is committed.
    pub fn set_entity(&mut self, tag: NbtCompound) {
        self.entities.push(tag);
    }

    /// Queues an entity id for removal. Additions and removals are tracked
    /// independently; resolving an id present in both is the commit
    /// pipeline's concern.
    pub fn remove_entity(&mut self, uuid: Uuid) {
        self.entity_removes.insert(uuid);
    }

    /// Entities queued for spawning.
    #[must_use]
    pub fn entities(&self) -> &[NbtCompound] {
        &self.entities
    }

    /// Entity ids queued for removal.
    #[must_use]
    pub fn entity_removes(&self) -> &FxHashSet<Uuid> {
        &self.entity_removes
    }

    // ---- height maps ----

    /// Replaces one height map for the column.
    pub fn set_height_map(&mut self, kind: HeightMapKind, height_map: [i32; HEIGHTMAP_SIZE]) {
        self.height_maps.insert(kind, Box::new(height_map));
    }

    /// All height map replacements.
    #[must_use]
    pub fn height_maps(&self) -> &FxHashMap<HeightMapKind, Box<[i32; HEIGHTMAP_SIZE]>> {
        &self.height_maps
    }

    // ---- flags ----

    /// Tells the commit pipeline to skip physics and relighting.
    pub fn set_fast_mode(&mut self, fast_mode: bool) {
        self.fast_mode = fast_mode;
    }

    /// Whether physics and relighting should be skipped on commit.
    #[must_use]
    pub fn fast_mode(&self) -> bool {
        self.fast_mode
    }

    /// Restricts which sections the commit pipeline writes. -1 means
    /// unset/all sections.
    pub fn set_bit_mask(&mut self, bit_mask: i32) {
        self.bit_mask = bit_mask;
    }

    /// The section write mask, -1 when unset.
    #[must_use]
    pub fn bit_mask(&self) -> i32 {
        self.bit_mask
    }

    // ---- lifecycle ----

    /// Fast path for the commit pipeline: true iff applying this buffer
    /// would have no effect. Writing a default value still allocates, and an
    /// allocated channel counts as non-empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        if self.biomes.is_some()
            || self.light.iter().any(Option::is_some)
            || self.sky_light.iter().any(Option::is_some)
        {
            return false;
        }
        if !self.tiles.is_empty() || !self.entities.is_empty() || !self.entity_removes.is_empty() {
            return false;
        }
        self.blocks.is_empty()
    }

    /// Wipes every delta and flag back to the freshly-constructed state.
    /// Enlarged section bounds survive; the side channels are re-sized to
    /// match.
    pub fn reset(&mut self) {
        self.blocks.reset();
        self.biomes = None;
        let count = self.blocks.section_count();
        self.light.clear();
        self.light.resize_with(count, || None);
        self.sky_light.clear();
        self.sky_light.resize_with(count, || None);
        self.tiles.clear();
        self.entities.clear();
        self.entity_removes.clear();
        self.height_maps.clear();
        self.fast_mode = false;
        self.bit_mask = -1;
    }
}

impl Default for ChunkSet {
    fn default() -> Self {
        // Matches the default world height before expansion kicks in.
        Self::new(0, 15)
    }
}

impl Reusable for ChunkSet {
    fn reset(&mut self) {
        Self::reset(self);
    }
}

fn fill_or_insert(slot: &mut Option<SectionLight>, value: u8) {
    match slot {
        Some(data) => data.fill(value),
        None => *slot = Some(Box::new([value; SECTION_VOLUME])),
    }
}

/// Shifts `vec` towards the tail by `diff` empty slots, build-then-swap like
/// the block store's growth.
fn prepend_none<T>(vec: &mut Vec<Option<T>>, diff: usize) {
    let mut grown = Vec::with_capacity(vec.len() + diff);
    grown.resize_with(diff, || None);
    grown.append(vec);
    *vec = grown;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(key: &str, value: i32) -> NbtCompound {
        let mut tag = NbtCompound::new();
        tag.insert(key, value);
        tag
    }

    #[test]
    fn test_fresh_buffer_is_empty_and_reads_defaults() {
        let set = ChunkSet::default();
        assert!(set.is_empty());
        assert_eq!(set.section_count(), 16);
        assert_eq!(set.get_block(1, 2, 3), BlockStateId::default());
        assert_eq!(set.get_biome(1, 2, 3), None);
        assert_eq!(set.tile(1, 2, 3), None);
        assert!(set.biomes().is_none());
        assert!(set.light().iter().all(Option::is_none));
        assert!(!set.fast_mode());
        assert_eq!(set.bit_mask(), -1);
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let mut set = ChunkSet::default();
        assert!(set.set_block(4, 100, 8, BlockStateId(77)));
        assert_eq!(set.get_block(4, 100, 8), BlockStateId(77));

        assert!(set.set_biome(4, 100, 8, BiomeId(3)));
        assert_eq!(set.get_biome(4, 100, 8), Some(BiomeId(3)));
        // Same macro-cell, different voxel.
        assert_eq!(set.get_biome(5, 101, 9), Some(BiomeId(3)));
        // Different macro-cell.
        assert_eq!(set.get_biome(12, 100, 8), None);
    }

    #[test]
    fn test_default_valued_write_still_counts_as_allocated() {
        let mut set = ChunkSet::default();
        set.set_block(0, 0, 0, BlockStateId::default());
        assert!(!set.is_empty());
    }

    #[test]
    fn test_emptiness_flips_per_channel() {
        let mut set = ChunkSet::default();
        set.set_biome(0, 0, 0, BiomeId(1));
        assert!(!set.is_empty());

        let mut set = ChunkSet::default();
        set.set_block_light(0, 0, 0, 7);
        assert!(!set.is_empty());

        let mut set = ChunkSet::default();
        set.set_sky_light(0, 0, 0, 15);
        assert!(!set.is_empty());

        let mut set = ChunkSet::default();
        set.set_tile(0, 0, 0, compound("id", 1));
        assert!(!set.is_empty());

        let mut set = ChunkSet::default();
        set.set_entity(compound("id", 2));
        assert!(!set.is_empty());

        let mut set = ChunkSet::default();
        set.remove_entity(Uuid::new_v4());
        assert!(!set.is_empty());
    }

    #[test]
    fn test_block_write_grows_range_downwards() {
        let mut set = ChunkSet::default();
        set.set_block(0, -64, 0, BlockStateId(10));
        assert_eq!(set.min_section_index(), -4);
        assert_eq!(set.get_block(0, -64, 0), BlockStateId(10));
        assert!(set.has_section(-4));
    }

    #[test]
    fn test_biome_survives_growth_below_current_minimum() {
        // Write a biome, then grow the range downwards with a block write,
        // then re-read the biome at its absolute coordinates.
        let mut set = ChunkSet::default();
        set.set_biome(8, 40, 8, BiomeId(5));
        set.set_block(0, -120, 0, BlockStateId(1));

        assert_eq!(set.min_section_index(), -8);
        assert_eq!(set.get_biome(8, 40, 8), Some(BiomeId(5)));
        // The newly exposed cells below read as untouched.
        assert_eq!(set.get_biome(8, -120, 8), None);
    }

    #[test]
    fn test_light_survives_growth_in_both_directions() {
        let mut set = ChunkSet::default();
        set.set_block_light(3, 50, 3, 12);
        set.set_sky_light(3, 50, 3, 4);

        set.set_block(0, -40, 0, BlockStateId(1));
        set.set_block(0, 400, 0, BlockStateId(1));

        let i = (50 >> 4) - set.min_section_index();
        let light = set.light()[i as usize].as_ref().expect("light array");
        assert_eq!(light[block_index(3, 50, 3)], 12);
        assert_eq!(light[block_index(4, 50, 3)], LIGHT_UNSET);
        let sky = set.sky_light()[i as usize].as_ref().expect("sky array");
        assert_eq!(sky[block_index(3, 50, 3)], 4);
    }

    #[test]
    fn test_full_bright_fills_both_channels() {
        let mut set = ChunkSet::default();
        set.set_full_bright(2);

        let light = set.light()[2].as_ref().expect("light array");
        let sky = set.sky_light()[2].as_ref().expect("sky array");
        assert!(light.iter().all(|&v| v == FULL_BRIGHT));
        assert!(sky.iter().all(|&v| v == FULL_BRIGHT));
    }

    #[test]
    fn test_remove_section_lighting_zeroes_arrays() {
        let mut set = ChunkSet::default();
        set.set_block_light(0, 32, 0, 9);
        set.remove_section_lighting(2, true);

        let light = set.light()[2].as_ref().expect("light array");
        let sky = set.sky_light()[2].as_ref().expect("sky array");
        assert!(light.iter().all(|&v| v == 0));
        assert!(sky.iter().all(|&v| v == 0));

        // Without `sky`, only block light is touched.
        let mut set = ChunkSet::default();
        set.remove_section_lighting(5, false);
        assert!(set.light()[5].is_some());
        assert!(set.sky_light()[5].is_none());
    }

    #[test]
    fn test_light_layer_replacement() {
        let mut set = ChunkSet::default();
        set.set_light_layer(1, Box::new([3; SECTION_VOLUME]));
        set.set_sky_light_layer(18, Box::new([6; SECTION_VOLUME]));

        assert_eq!(set.max_section_index(), 18);
        assert_eq!(set.light()[1].as_ref().map(|d| d[0]), Some(3));
        let i = set.layer_offset(18);
        assert_eq!(set.sky_light()[i].as_ref().map(|d| d[0]), Some(6));
    }

    #[test]
    fn test_tiles_and_entities() {
        let mut set = ChunkSet::default();
        assert!(set.set_tile(1, 65, 2, compound("Items", 0)));
        assert_eq!(set.tile(1, 65, 2), Some(&compound("Items", 0)));
        assert_eq!(set.tiles().len(), 1);

        set.set_entity(compound("id", 9));
        let id = Uuid::new_v4();
        set.remove_entity(id);
        set.remove_entity(id);
        assert_eq!(set.entities().len(), 1);
        assert_eq!(set.entity_removes().len(), 1);
        assert!(set.entity_removes().contains(&id));
    }

    #[test]
    fn test_height_maps() {
        let mut set = ChunkSet::default();
        set.set_height_map(HeightMapKind::WorldSurface, [64; HEIGHTMAP_SIZE]);
        set.set_height_map(HeightMapKind::MotionBlocking, [62; HEIGHTMAP_SIZE]);
        assert_eq!(set.height_maps().len(), 2);
        assert_eq!(
            set.height_maps()[&HeightMapKind::WorldSurface][0],
            64
        );
    }

    #[test]
    fn test_reset_restores_fresh_state_with_sticky_bounds() {
        let mut set = ChunkSet::default();
        set.set_block(0, -64, 0, BlockStateId(1));
        set.set_biome(0, 0, 0, BiomeId(2));
        set.set_full_bright(0);
        set.set_tile(0, 0, 0, compound("id", 1));
        set.set_entity(compound("id", 2));
        set.remove_entity(Uuid::new_v4());
        set.set_height_map(HeightMapKind::OceanFloor, [0; HEIGHTMAP_SIZE]);
        set.set_fast_mode(true);
        set.set_bit_mask(0b1010);

        set.reset();

        assert!(set.is_empty());
        assert!(set.biomes().is_none());
        assert!(set.light().iter().all(Option::is_none));
        assert!(set.sky_light().iter().all(Option::is_none));
        assert!(set.tiles().is_empty());
        assert!(set.entities().is_empty());
        assert!(set.entity_removes().is_empty());
        assert!(set.height_maps().is_empty());
        assert!(!set.fast_mode());
        assert_eq!(set.bit_mask(), -1);
        // Bounds stay enlarged; the side channels track them.
        assert_eq!(set.min_section_index(), -4);
        assert_eq!(set.light().len(), set.section_count());
    }

    #[test]
    fn test_recycled_buffer_state_is_stable_across_checkouts() {
        let pool = ChunkSet::pool(&QueueConfig::default());

        let mut set = pool.poll();
        set.set_block(0, -64, 0, BlockStateId(1));
        set.set_biome(0, 0, 0, BiomeId(2));
        set.set_full_bright(0);
        set.set_fast_mode(true);
        pool.recycle(set);

        // First recycle already cleaned the buffer; a second recycle with no
        // intervening writes must leave every observable the same.
        let set = pool.poll();
        let snapshot = (
            set.is_empty(),
            set.min_section_index(),
            set.max_section_index(),
            set.fast_mode(),
            set.bit_mask(),
            set.light().len(),
            set.sky_light().len(),
        );
        pool.recycle(set);

        let set = pool.poll();
        assert!(set.is_empty());
        assert_eq!(
            (
                set.is_empty(),
                set.min_section_index(),
                set.max_section_index(),
                set.fast_mode(),
                set.bit_mask(),
                set.light().len(),
                set.sky_light().len(),
            ),
            snapshot
        );
    }

    #[test]
    fn test_load_allocates_and_marks_partial() {
        let mut set = ChunkSet::default();
        set.load(30)[0] = BlockStateId(2);
        assert_eq!(set.section_state(30), Section::Partial);
        assert_eq!(set.get_block(0, 30 * 16, 0), BlockStateId(2));
    }
}
