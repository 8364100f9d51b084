//! Parallel tile layers addressed by a shared grid offset.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use riverford_core::{
    BridgeSprite, BuildingId, GridError, GridOffset, TerrainFlags, TileCoord, TileFlags, WalkerId,
    GRID_CELLS, GRID_SIZE, MAX_MAP_DIMENSION,
};

/// Graphic id of the first plain grass variant; the random layer picks one of eight.
pub(crate) const BASE_GRASS_GRAPHIC: u16 = 0x0100;

/// Placement of the playable map inside the fixed-size backing grid.
///
/// The map is centred so that every side keeps a margin of outside-map cells,
/// which lets neighbour probes step past the map edge without leaving the
/// backing arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapBounds {
    width: u32,
    height: u32,
    start_offset: u32,
    border_size: u32,
}

impl MapBounds {
    /// Validates the dimensions and centres the map in the backing grid.
    pub const fn new(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 || width > MAX_MAP_DIMENSION || height > MAX_MAP_DIMENSION {
            return Err(GridError::InvalidDimensions { width, height });
        }

        Ok(Self {
            width,
            height,
            start_offset: (GRID_SIZE - height) / 2 * GRID_SIZE + (GRID_SIZE - width) / 2,
            border_size: GRID_SIZE - width,
        })
    }

    /// Number of tile columns in the playable map.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows in the playable map.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Offset of the map's top-left tile.
    #[must_use]
    pub const fn start_offset(&self) -> GridOffset {
        GridOffset::new(self.start_offset)
    }

    /// Number of backing cells skipped between the end of one map row and the next.
    #[must_use]
    pub const fn border_size(&self) -> u32 {
        self.border_size
    }

    /// Converts map coordinates into a grid offset.
    pub fn offset(&self, tile: TileCoord) -> Result<GridOffset, GridError> {
        if tile.x() >= self.width || tile.y() >= self.height {
            return Err(GridError::OutOfBounds {
                x: tile.x(),
                y: tile.y(),
            });
        }

        Ok(GridOffset::new(
            self.start_offset + tile.y() * GRID_SIZE + tile.x(),
        ))
    }

    /// Converts a grid offset back into map coordinates.
    #[must_use]
    pub fn tile_at(&self, offset: GridOffset) -> Option<TileCoord> {
        let relative = offset.get().checked_sub(self.start_offset)?;
        let x = relative % GRID_SIZE;
        let y = relative / GRID_SIZE;
        if x < self.width && y < self.height {
            Some(TileCoord::new(x, y))
        } else {
            None
        }
    }

    /// Reports whether the offset addresses a playable map tile.
    #[must_use]
    pub fn contains(&self, offset: GridOffset) -> bool {
        self.tile_at(offset).is_some()
    }

    /// Offsets of every map tile in row-major order.
    pub fn offsets(&self) -> impl Iterator<Item = GridOffset> {
        let start = self.start_offset;
        let width = self.width;
        (0..self.height).flat_map(move |y| {
            (0..width).map(move |x| GridOffset::new(start + y * GRID_SIZE + x))
        })
    }
}

/// Dense per-tile state. Every layer holds one entry per backing cell.
#[derive(Clone, Debug)]
pub(crate) struct TerrainGrid {
    bounds: MapBounds,
    terrain: Vec<TerrainFlags>,
    sprites: Vec<Option<BridgeSprite>>,
    buildings: Vec<Option<BuildingId>>,
    elevation: Vec<u8>,
    random: Vec<u8>,
    walkers: Vec<Option<WalkerId>>,
    flags: Vec<TileFlags>,
    graphics: Vec<u16>,
}

impl TerrainGrid {
    pub(crate) fn new(bounds: MapBounds, seed: u64) -> Self {
        let mut grid = Self {
            bounds,
            terrain: vec![TerrainFlags::empty(); GRID_CELLS],
            sprites: vec![None; GRID_CELLS],
            buildings: vec![None; GRID_CELLS],
            elevation: vec![0; GRID_CELLS],
            random: vec![0; GRID_CELLS],
            walkers: vec![None; GRID_CELLS],
            flags: vec![TileFlags::empty(); GRID_CELLS],
            graphics: vec![0; GRID_CELLS],
        };
        grid.reset(bounds, seed);
        grid
    }

    /// Clears every layer and reinitialises the grid for a freshly loaded map.
    pub(crate) fn reset(&mut self, bounds: MapBounds, seed: u64) {
        self.bounds = bounds;
        self.terrain.fill(TerrainFlags::empty());
        self.sprites.fill(None);
        self.buildings.fill(None);
        self.elevation.fill(0);
        self.walkers.fill(None);
        self.flags.fill(TileFlags::empty());
        self.graphics.fill(0);

        self.mark_outside_map();
        self.seed_random(seed);
        self.derive_graphics();
    }

    fn mark_outside_map(&mut self) {
        for (index, terrain) in self.terrain.iter_mut().enumerate() {
            let offset = GridOffset::new(index as u32);
            if !self.bounds.contains(offset) {
                *terrain = TerrainFlags::OUTSIDE_MAP;
            }
        }
    }

    fn seed_random(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for value in &mut self.random {
            *value = rng.gen();
        }
    }

    fn derive_graphics(&mut self) {
        for offset in self.bounds.offsets() {
            let index = offset.index();
            let random = self.random[index];
            self.graphics[index] = BASE_GRASS_GRAPHIC + u16::from(random & 7);
            if random & 1 != 0 {
                self.flags[index].insert(TileFlags::ALTERNATE_TERRAIN);
            }
        }
    }

    pub(crate) fn bounds(&self) -> &MapBounds {
        &self.bounds
    }

    /// Offset of the tile `dx` columns and `dy` rows away, if it exists in the backing grid.
    pub(crate) fn neighbor(&self, offset: GridOffset, dx: i32, dy: i32) -> Option<GridOffset> {
        offset.step(dy * GRID_SIZE as i32 + dx)
    }

    pub(crate) fn terrain(&self, offset: GridOffset) -> TerrainFlags {
        self.terrain
            .get(offset.index())
            .copied()
            .unwrap_or(TerrainFlags::OUTSIDE_MAP)
    }

    pub(crate) fn set_terrain(&mut self, offset: GridOffset, terrain: TerrainFlags) {
        if let Some(slot) = self.terrain.get_mut(offset.index()) {
            *slot = terrain;
        }
    }

    pub(crate) fn insert_terrain(&mut self, offset: GridOffset, terrain: TerrainFlags) {
        if let Some(slot) = self.terrain.get_mut(offset.index()) {
            slot.insert(terrain);
        }
    }

    pub(crate) fn remove_terrain(&mut self, offset: GridOffset, terrain: TerrainFlags) {
        if let Some(slot) = self.terrain.get_mut(offset.index()) {
            slot.remove(terrain);
        }
    }

    pub(crate) fn sprite(&self, offset: GridOffset) -> Option<BridgeSprite> {
        self.sprites.get(offset.index()).copied().flatten()
    }

    pub(crate) fn set_sprite(&mut self, offset: GridOffset, sprite: Option<BridgeSprite>) {
        if let Some(slot) = self.sprites.get_mut(offset.index()) {
            *slot = sprite;
        }
    }

    pub(crate) fn building(&self, offset: GridOffset) -> Option<BuildingId> {
        self.buildings.get(offset.index()).copied().flatten()
    }

    pub(crate) fn set_building(&mut self, offset: GridOffset, building: Option<BuildingId>) {
        if let Some(slot) = self.buildings.get_mut(offset.index()) {
            *slot = building;
        }
    }

    pub(crate) fn elevation(&self, offset: GridOffset) -> u8 {
        self.elevation.get(offset.index()).copied().unwrap_or(0)
    }

    pub(crate) fn set_elevation(&mut self, offset: GridOffset, elevation: u8) {
        if let Some(slot) = self.elevation.get_mut(offset.index()) {
            *slot = elevation;
        }
    }

    pub(crate) fn random(&self, offset: GridOffset) -> u8 {
        self.random.get(offset.index()).copied().unwrap_or(0)
    }

    pub(crate) fn graphic(&self, offset: GridOffset) -> u16 {
        self.graphics.get(offset.index()).copied().unwrap_or(0)
    }

    pub(crate) fn walker(&self, offset: GridOffset) -> Option<WalkerId> {
        self.walkers.get(offset.index()).copied().flatten()
    }

    pub(crate) fn set_walker(&mut self, offset: GridOffset, walker: Option<WalkerId>) {
        if let Some(slot) = self.walkers.get_mut(offset.index()) {
            *slot = walker;
        }
    }

    pub(crate) fn flags(&self, offset: GridOffset) -> TileFlags {
        self.flags
            .get(offset.index())
            .copied()
            .unwrap_or(TileFlags::empty())
    }

    pub(crate) fn insert_flags(&mut self, offset: GridOffset, flags: TileFlags) {
        if let Some(slot) = self.flags.get_mut(offset.index()) {
            slot.insert(flags);
        }
    }

    pub(crate) fn remove_flags(&mut self, offset: GridOffset, flags: TileFlags) {
        if let Some(slot) = self.flags.get_mut(offset.index()) {
            slot.remove(flags);
        }
    }

    /// Water tile carrying a bridge sprite.
    pub(crate) fn is_bridge(&self, offset: GridOffset) -> bool {
        self.terrain(offset).contains(TerrainFlags::WATER) && self.sprite(offset).is_some()
    }

    /// Counts the cardinal neighbours whose terrain intersects `mask`.
    pub(crate) fn count_adjacent_matching(&self, offset: GridOffset, mask: TerrainFlags) -> u8 {
        [(0, -1), (1, 0), (0, 1), (-1, 0)]
            .into_iter()
            .filter_map(|(dx, dy)| self.neighbor(offset, dx, dy))
            .filter(|neighbor| self.terrain(*neighbor).intersects(mask))
            .fold(0, |count, _| count + 1)
    }
}
