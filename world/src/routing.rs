//! Reachability layers rebuilt whenever terrain changes pathability.

use std::collections::VecDeque;

use riverford_core::{GridOffset, TerrainFlags, GRID_CELLS, GRID_SIZE};

use crate::grid::{MapBounds, TerrainGrid};

const CITIZEN_BLOCKERS: TerrainFlags = TerrainFlags::WATER
    .union(TerrainFlags::BUILDING)
    .union(TerrainFlags::TREE)
    .union(TerrainFlags::ROCK)
    .union(TerrainFlags::WALL)
    .union(TerrainFlags::AQUEDUCT)
    .union(TerrainFlags::ELEVATION)
    .union(TerrainFlags::GATEHOUSE)
    .union(TerrainFlags::OUTSIDE_MAP);

const NONCITIZEN_BLOCKERS: TerrainFlags = CITIZEN_BLOCKERS
    .difference(TerrainFlags::TREE)
    .difference(TerrainFlags::SHRUB)
    .difference(TerrainFlags::MEADOW);

/// Routing layers maintained by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoutingLayer {
    /// Walking routes available to citizens.
    LandCitizen,
    /// Walking routes available to animals, invaders and other non-citizens.
    LandNonCitizen,
    /// Sailing routes available to boats.
    Water,
}

/// Connected components of the passable tiles of a single layer.
///
/// Impassable tiles carry no network id so callers can distinguish blocked
/// tiles from reachable ones.
#[derive(Clone, Debug)]
pub(crate) struct NetworkLayer {
    networks: Vec<Option<u32>>,
    count: u32,
}

impl Default for NetworkLayer {
    fn default() -> Self {
        Self {
            networks: vec![None; GRID_CELLS],
            count: 0,
        }
    }
}

impl NetworkLayer {
    /// Relabels every passable map tile with its network using breadth-first search.
    pub(crate) fn rebuild_with<F>(&mut self, bounds: &MapBounds, mut is_passable: F)
    where
        F: FnMut(GridOffset) -> bool,
    {
        self.networks.fill(None);
        self.count = 0;

        let mut queue = VecDeque::new();
        for seed in bounds.offsets() {
            if self.networks[seed.index()].is_some() || !is_passable(seed) {
                continue;
            }

            let network = self.count;
            self.count += 1;
            self.networks[seed.index()] = Some(network);
            queue.push_back(seed);

            while let Some(offset) = queue.pop_front() {
                for neighbor in neighbors(bounds, offset) {
                    if self.networks[neighbor.index()].is_some() || !is_passable(neighbor) {
                        continue;
                    }

                    self.networks[neighbor.index()] = Some(network);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    /// Network containing the tile, if the tile is passable.
    #[must_use]
    pub(crate) fn network(&self, offset: GridOffset) -> Option<u32> {
        self.networks.get(offset.index()).copied().flatten()
    }

    /// Number of disjoint networks in the layer.
    #[must_use]
    pub(crate) fn count(&self) -> u32 {
        self.count
    }
}

/// Land and water routing recomputed over the whole grid.
#[derive(Clone, Debug, Default)]
pub(crate) struct Routing {
    land_citizen: NetworkLayer,
    land_noncitizen: NetworkLayer,
    water: NetworkLayer,
}

impl Routing {
    pub(crate) fn recompute_land_citizen(&mut self, grid: &TerrainGrid) {
        self.land_citizen.rebuild_with(grid.bounds(), |offset| {
            let terrain = grid.terrain(offset);
            terrain.contains(TerrainFlags::ROAD) || !terrain.intersects(CITIZEN_BLOCKERS)
        });
    }

    pub(crate) fn recompute_land_noncitizen(&mut self, grid: &TerrainGrid) {
        self.land_noncitizen.rebuild_with(grid.bounds(), |offset| {
            let terrain = grid.terrain(offset);
            terrain.contains(TerrainFlags::ROAD) || !terrain.intersects(NONCITIZEN_BLOCKERS)
        });
    }

    pub(crate) fn recompute_water(&mut self, grid: &TerrainGrid) {
        self.water.rebuild_with(grid.bounds(), |offset| {
            grid.terrain(offset).contains(TerrainFlags::WATER)
                && grid
                    .sprite(offset)
                    .map_or(true, |sprite| sprite.lets_ships_pass())
        });
    }

    pub(crate) fn recompute_all(&mut self, grid: &TerrainGrid) {
        self.recompute_land_citizen(grid);
        self.recompute_land_noncitizen(grid);
        self.recompute_water(grid);
    }

    pub(crate) fn layer(&self, layer: RoutingLayer) -> &NetworkLayer {
        match layer {
            RoutingLayer::LandCitizen => &self.land_citizen,
            RoutingLayer::LandNonCitizen => &self.land_noncitizen,
            RoutingLayer::Water => &self.water,
        }
    }
}

fn neighbors(bounds: &MapBounds, offset: GridOffset) -> impl Iterator<Item = GridOffset> + '_ {
    [-(GRID_SIZE as i32), 1, GRID_SIZE as i32, -1]
        .into_iter()
        .filter_map(move |delta| offset.step(delta))
        .filter(move |neighbor| bounds.contains(*neighbor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use riverford_core::TileCoord;

    #[test]
    fn rebuild_with_labels_separate_components() {
        let bounds = MapBounds::new(5, 3).expect("valid bounds");
        let wall = bounds.offset(TileCoord::new(2, 0)).expect("tile");
        let wall_column: Vec<GridOffset> = (0..3)
            .map(|y| bounds.offset(TileCoord::new(2, y)).expect("tile"))
            .collect();
        let mut layer = NetworkLayer::default();

        layer.rebuild_with(&bounds, |offset| !wall_column.contains(&offset));

        assert_eq!(layer.count(), 2);
        assert_eq!(layer.network(wall), None);
        let left = bounds.offset(TileCoord::new(0, 0)).expect("tile");
        let right = bounds.offset(TileCoord::new(4, 2)).expect("tile");
        assert_ne!(layer.network(left), layer.network(right));
    }

    #[test]
    fn rebuild_with_ignores_cells_outside_map() {
        let bounds = MapBounds::new(3, 3).expect("valid bounds");
        let mut layer = NetworkLayer::default();

        layer.rebuild_with(&bounds, |_| true);

        assert_eq!(layer.count(), 1);
        let corner = bounds.offset(TileCoord::new(0, 0)).expect("tile");
        let outside = corner.step(-1).expect("backing cell");
        assert_eq!(layer.network(outside), None);
    }

    #[test]
    fn water_layer_is_blocked_by_low_bridges() {
        let bounds = MapBounds::new(3, 3).expect("valid bounds");
        let mut grid = TerrainGrid::new(bounds, 1);
        for offset in bounds.offsets() {
            grid.set_terrain(offset, TerrainFlags::WATER);
        }
        for x in 0..3 {
            let offset = bounds.offset(TileCoord::new(x, 1)).expect("tile");
            grid.set_sprite(offset, riverford_core::BridgeSprite::from_index(6));
        }
        let mut routing = Routing::default();

        routing.recompute_water(&grid);

        assert_eq!(routing.layer(RoutingLayer::Water).count(), 2);
    }
}
