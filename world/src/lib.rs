#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Riverford.

mod bridges;
mod grid;
mod routing;

use riverford_core::{
    Command, Event, GridError, GridOffset, Orientation, TerrainFlags, TileCoord, ToolMode,
    WELCOME_BANNER,
};
use tracing::{debug, info, warn};

pub use grid::MapBounds;
pub use routing::RoutingLayer;

use grid::TerrainGrid;
use routing::Routing;

const DEFAULT_BOUNDS: MapBounds = match MapBounds::new(40, 40) {
    Ok(bounds) => bounds,
    Err(_) => panic!("default map size must be supported"),
};
const DEFAULT_SEED: u64 = 0x42f0_e1eb_d4a5_3c21;

/// Represents the authoritative Riverford world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: TerrainGrid,
    orientation: Orientation,
    tool_mode: ToolMode,
    routing: Routing,
}

impl World {
    /// Creates a new world holding an empty default-sized map.
    #[must_use]
    pub fn new() -> Self {
        let grid = TerrainGrid::new(DEFAULT_BOUNDS, DEFAULT_SEED);
        let mut routing = Routing::default();
        routing.recompute_all(&grid);
        Self {
            banner: WELCOME_BANNER,
            grid,
            orientation: Orientation::Deg0,
            tool_mode: ToolMode::Inspect,
            routing,
        }
    }

    fn recompute_routing(&mut self, out_events: &mut Vec<Event>) {
        self.routing.recompute_land_citizen(&self.grid);
        self.routing.recompute_land_noncitizen(&self.grid);
        self.routing.recompute_water(&self.grid);
        out_events.push(Event::RoutingRecomputed {
            citizen_networks: self.routing.layer(RoutingLayer::LandCitizen).count(),
            noncitizen_networks: self.routing.layer(RoutingLayer::LandNonCitizen).count(),
            water_networks: self.routing.layer(RoutingLayer::Water).count(),
        });
    }

    fn write_tile<F>(&mut self, tile: TileCoord, out_events: &mut Vec<Event>, write: F)
    where
        F: FnOnce(&mut TerrainGrid, GridOffset),
    {
        match self.grid.bounds().offset(tile) {
            Ok(offset) => {
                write(&mut self.grid, offset);
                out_events.push(Event::TileUpdated { offset });
            }
            Err(reason) => {
                debug!(?tile, %reason, "tile write rejected");
                out_events.push(Event::TileRejected { reason });
            }
        }
    }

    fn write_offset<F>(&mut self, offset: GridOffset, out_events: &mut Vec<Event>, write: F)
    where
        F: FnOnce(&mut TerrainGrid, GridOffset),
    {
        if self.grid.bounds().contains(offset) {
            write(&mut self.grid, offset);
            out_events.push(Event::TileUpdated { offset });
        } else {
            let reason = GridError::OffsetOutsideMap(offset);
            debug!(%reason, "tile write rejected");
            out_events.push(Event::TileRejected { reason });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMap {
            width,
            height,
            seed,
        } => match MapBounds::new(width, height) {
            Ok(bounds) => {
                world.grid.reset(bounds, seed);
                world.orientation = Orientation::Deg0;
                info!(width, height, seed, "map configured");
                out_events.push(Event::MapConfigured { width, height });
                world.recompute_routing(out_events);
            }
            Err(reason) => {
                warn!(%reason, "map configuration rejected");
                out_events.push(Event::MapConfigurationRejected { reason });
            }
        },
        Command::SetTerrain { tile, terrain } => {
            world.write_tile(tile, out_events, |grid, offset| {
                grid.set_terrain(offset, terrain);
                grid.set_sprite(offset, None);
            });
        }
        Command::SetElevation { tile, elevation } => {
            world.write_tile(tile, out_events, |grid, offset| {
                grid.set_elevation(offset, elevation);
            });
        }
        Command::PlaceBuilding { tile, building } => {
            world.write_tile(tile, out_events, |grid, offset| {
                grid.set_building(offset, Some(building));
                grid.insert_terrain(offset, TerrainFlags::BUILDING);
            });
        }
        Command::ClearBuilding { tile } => {
            world.write_tile(tile, out_events, |grid, offset| {
                grid.set_building(offset, None);
                grid.remove_terrain(offset, TerrainFlags::BUILDING);
            });
        }
        Command::PlaceWalker { offset, walker } => {
            world.write_offset(offset, out_events, |grid, offset| {
                grid.set_walker(offset, Some(walker));
            });
        }
        Command::ClearWalker { offset } => {
            world.write_offset(offset, out_events, |grid, offset| {
                grid.set_walker(offset, None);
            });
        }
        Command::SetToolMode { mode } => {
            world.tool_mode = mode;
            out_events.push(Event::ToolModeChanged { mode });
        }
        Command::CommitBridge { span } => {
            match bridges::commit(&mut world.grid, &span, world.orientation) {
                Ok(()) => {
                    info!(
                        kind = ?span.kind(),
                        origin = ?span.origin(),
                        length = span.length(),
                        "bridge committed"
                    );
                    out_events.push(Event::BridgeCommitted { span });
                    world.recompute_routing(out_events);
                }
                Err(reason) => {
                    debug!(origin = ?span.origin(), %reason, "bridge commit rejected");
                    out_events.push(Event::BridgeRejected {
                        origin: span.origin(),
                        kind: span.kind(),
                        reason,
                    });
                }
            }
        }
        Command::RemoveBridge { offset, mode } => {
            match bridges::remove(&mut world.grid, offset, mode) {
                Ok((start, tiles)) => {
                    info!(?start, tiles, ?mode, "bridge removed");
                    out_events.push(Event::BridgeRemoved { start, tiles, mode });
                }
                Err(reason) => {
                    debug!(?offset, %reason, "bridge removal rejected");
                    out_events.push(Event::BridgeRemovalRejected { offset, reason });
                }
            }
        }
        Command::RestoreBridge { offset } => match bridges::restore(&mut world.grid, offset) {
            Ok((start, tiles)) => {
                info!(?start, tiles, "bridge restored");
                out_events.push(Event::BridgeRestored { start, tiles });
            }
            Err(reason) => {
                debug!(?offset, %reason, "bridge restore rejected");
                out_events.push(Event::BridgeRemovalRejected { offset, reason });
            }
        },
        Command::RotateMap { rotation } => {
            world.orientation = world.orientation.rotated(rotation);
            let sprites_updated = bridges::rotate_sprites(&mut world.grid, rotation);
            info!(orientation = ?world.orientation, sprites_updated, "map rotated");
            out_events.push(Event::MapRotated {
                orientation: world.orientation,
                sprites_updated,
            });
        }
        Command::RecomputeRouting => world.recompute_routing(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use riverford_core::{
        BridgeKind, BridgeRejection, BridgeSpan, BridgeSprite, BuildingId, GridError,
        GridOffset, Orientation, TerrainFlags, TileCoord, TileFlags, ToolMode, WalkerId,
    };

    use super::{bridges, MapBounds, RoutingLayer, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Placement of the playable map inside the backing grid.
    #[must_use]
    pub fn bounds(world: &World) -> MapBounds {
        *world.grid.bounds()
    }

    /// Converts map coordinates into a grid offset.
    pub fn grid_offset(world: &World, tile: TileCoord) -> Result<GridOffset, GridError> {
        world.grid.bounds().offset(tile)
    }

    /// Current rotation of the map view.
    #[must_use]
    pub fn orientation(world: &World) -> Orientation {
        world.orientation
    }

    /// Active builder tool.
    #[must_use]
    pub fn tool_mode(world: &World) -> ToolMode {
        world.tool_mode
    }

    /// Terrain classification of the tile; cells outside the grid read as outside the map.
    #[must_use]
    pub fn terrain(world: &World, offset: GridOffset) -> TerrainFlags {
        world.grid.terrain(offset)
    }

    /// Bridge sprite drawn on the tile, if any.
    #[must_use]
    pub fn sprite(world: &World, offset: GridOffset) -> Option<BridgeSprite> {
        world.grid.sprite(offset)
    }

    /// Auxiliary flags stored for the tile.
    #[must_use]
    pub fn tile_flags(world: &World, offset: GridOffset) -> TileFlags {
        world.grid.flags(offset)
    }

    /// Walker standing on the tile, if any.
    #[must_use]
    pub fn walker(world: &World, offset: GridOffset) -> Option<WalkerId> {
        world.grid.walker(offset)
    }

    /// Building covering the tile, if any.
    #[must_use]
    pub fn building(world: &World, offset: GridOffset) -> Option<BuildingId> {
        world.grid.building(offset)
    }

    /// Elevation recorded for the tile.
    #[must_use]
    pub fn elevation(world: &World, offset: GridOffset) -> u8 {
        world.grid.elevation(offset)
    }

    /// Random byte assigned to the tile when the map was configured.
    #[must_use]
    pub fn random(world: &World, offset: GridOffset) -> u8 {
        world.grid.random(offset)
    }

    /// Terrain graphic chosen for the tile.
    #[must_use]
    pub fn graphic(world: &World, offset: GridOffset) -> u16 {
        world.grid.graphic(offset)
    }

    /// Counts cardinal neighbours whose terrain intersects `mask`.
    #[must_use]
    pub fn count_adjacent_matching(world: &World, offset: GridOffset, mask: TerrainFlags) -> u8 {
        world.grid.count_adjacent_matching(offset, mask)
    }

    /// Searches for a bridge crossing that starts at the shoreline tile `origin`.
    ///
    /// The returned span is handed back unchanged in `Command::CommitBridge`.
    /// A span can be returned for a ship bridge that is still too short to
    /// build; check [`BridgeSpan::meets_minimum_length`] before offering it.
    pub fn detect_bridge(
        world: &World,
        origin: TileCoord,
        kind: BridgeKind,
    ) -> Result<BridgeSpan, BridgeRejection> {
        bridges::detect(&world.grid, origin, kind)
    }

    /// Number of walkers standing on the bridge containing `offset`.
    ///
    /// Returns zero when the tile is not part of a bridge.
    #[must_use]
    pub fn count_units_on_bridge(world: &World, offset: GridOffset) -> u32 {
        bridges::count_walkers(&world.grid, offset)
    }

    /// Routing network containing the tile, if the tile is passable in the layer.
    #[must_use]
    pub fn network(world: &World, layer: RoutingLayer, offset: GridOffset) -> Option<u32> {
        world.routing.layer(layer).network(offset)
    }

    /// Number of disjoint networks in the routing layer.
    #[must_use]
    pub fn network_count(world: &World, layer: RoutingLayer) -> u32 {
        world.routing.layer(layer).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riverford_core::{BuildingId, WalkerId};

    fn configured(width: u32, height: u32) -> (World, Vec<Event>) {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureMap {
                width,
                height,
                seed: 11,
            },
            &mut events,
        );
        (world, events)
    }

    #[test]
    fn apply_configures_map() {
        let (world, events) = configured(24, 16);

        let bounds = query::bounds(&world);
        assert_eq!(bounds.width(), 24);
        assert_eq!(bounds.height(), 16);
        assert_eq!(
            events.first(),
            Some(&Event::MapConfigured {
                width: 24,
                height: 16
            })
        );
        assert!(matches!(
            events.last(),
            Some(Event::RoutingRecomputed {
                citizen_networks: 1,
                ..
            })
        ));
    }

    #[test]
    fn oversized_map_is_rejected() {
        let (world, events) = configured(161, 10);

        assert_eq!(
            events,
            vec![Event::MapConfigurationRejected {
                reason: GridError::InvalidDimensions {
                    width: 161,
                    height: 10
                }
            }]
        );
        assert_eq!(query::bounds(&world), DEFAULT_BOUNDS);
    }

    #[test]
    fn set_terrain_outside_map_is_rejected() {
        let (mut world, _) = configured(10, 10);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SetTerrain {
                tile: TileCoord::new(10, 0),
                terrain: TerrainFlags::WATER,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TileRejected {
                reason: GridError::OutOfBounds { x: 10, y: 0 }
            }]
        );
    }

    #[test]
    fn buildings_set_and_clear_building_flag() {
        let (mut world, _) = configured(10, 10);
        let mut events = Vec::new();
        let tile = TileCoord::new(3, 3);
        let offset = query::grid_offset(&world, tile).expect("tile inside map");

        apply(
            &mut world,
            Command::PlaceBuilding {
                tile,
                building: BuildingId::new(9),
            },
            &mut events,
        );
        assert_eq!(query::building(&world, offset), Some(BuildingId::new(9)));
        assert!(query::terrain(&world, offset).contains(TerrainFlags::BUILDING));

        apply(&mut world, Command::ClearBuilding { tile }, &mut events);
        assert_eq!(query::building(&world, offset), None);
        assert!(!query::terrain(&world, offset).contains(TerrainFlags::BUILDING));
    }

    #[test]
    fn walkers_outside_map_are_rejected() {
        let (mut world, _) = configured(10, 10);
        let mut events = Vec::new();
        let outside = GridOffset::new(0);

        apply(
            &mut world,
            Command::PlaceWalker {
                offset: outside,
                walker: WalkerId::new(1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TileRejected {
                reason: GridError::OffsetOutsideMap(outside)
            }]
        );
        assert_eq!(query::walker(&world, outside), None);
    }

    #[test]
    fn elevation_is_written_per_tile() {
        let (mut world, _) = configured(10, 10);
        let mut events = Vec::new();
        let tile = TileCoord::new(2, 8);

        apply(
            &mut world,
            Command::SetElevation { tile, elevation: 3 },
            &mut events,
        );

        let offset = query::grid_offset(&world, tile).expect("tile inside map");
        assert_eq!(query::elevation(&world, offset), 3);
        assert_eq!(events, vec![Event::TileUpdated { offset }]);
    }

    #[test]
    fn reconfiguring_resets_orientation_and_layers() {
        let (mut world, _) = configured(10, 10);
        let mut events = Vec::new();
        let tile = TileCoord::new(1, 1);
        apply(
            &mut world,
            Command::SetTerrain {
                tile,
                terrain: TerrainFlags::WATER,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::RotateMap {
                rotation: riverford_core::Rotation::Clockwise,
            },
            &mut events,
        );

        let (fresh, _) = configured(10, 10);
        apply(
            &mut world,
            Command::ConfigureMap {
                width: 10,
                height: 10,
                seed: 11,
            },
            &mut events,
        );

        let offset = query::grid_offset(&world, tile).expect("tile inside map");
        assert_eq!(query::terrain(&world, offset), TerrainFlags::empty());
        assert_eq!(query::orientation(&world), Orientation::Deg0);
        assert_eq!(query::random(&world, offset), query::random(&fresh, offset));
        assert_eq!(query::graphic(&world, offset), query::graphic(&fresh, offset));
    }
}
