#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Riverford engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod bridge;

pub use bridge::{
    BridgeDirection, BridgeKind, BridgeRejection, BridgeSpan, BridgeSprite, Orientation,
    RemovalMode, Rotation, SpanAxis,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Riverford.";

/// Side length of the square backing grid shared by every tile layer.
pub const GRID_SIZE: u32 = 162;

/// Total number of cells stored by each tile layer.
pub const GRID_CELLS: usize = (GRID_SIZE as usize) * (GRID_SIZE as usize);

/// Largest accepted map width or height.
///
/// Keeps at least one outside-map column on either side of the playable area so
/// single-tile steps that wrap a row always land outside the map.
pub const MAX_MAP_DIMENSION: u32 = GRID_SIZE - 2;

/// Maximum number of steps a bridge detection walk takes across water.
pub const MAX_BRIDGE_WALK: u32 = 40;

/// Selects which builder tool the player is currently holding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ToolMode {
    /// Cursor inspects tiles without constructing anything.
    #[default]
    Inspect,
    /// Cursor previews and constructs bridges.
    Construct,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Clears every grid layer and prepares a fresh map of the given size.
    ConfigureMap {
        /// Number of tile columns in the playable map.
        width: u32,
        /// Number of tile rows in the playable map.
        height: u32,
        /// Seed for the per-tile random layer.
        seed: u64,
    },
    /// Overwrites the terrain classification of a single map tile.
    SetTerrain {
        /// Tile whose terrain is replaced.
        tile: TileCoord,
        /// New terrain bitmask.
        terrain: TerrainFlags,
    },
    /// Writes the elevation layer of a single map tile.
    SetElevation {
        /// Tile whose elevation changes.
        tile: TileCoord,
        /// New elevation value.
        elevation: u8,
    },
    /// Records a building occupying a single map tile.
    PlaceBuilding {
        /// Tile covered by the building.
        tile: TileCoord,
        /// Identifier of the building.
        building: BuildingId,
    },
    /// Removes any building recorded on a map tile.
    ClearBuilding {
        /// Tile to clear.
        tile: TileCoord,
    },
    /// Records a walker standing on the tile at the provided offset.
    PlaceWalker {
        /// Offset of the occupied tile.
        offset: GridOffset,
        /// Identifier of the walker.
        walker: WalkerId,
    },
    /// Removes the walker standing on the tile at the provided offset.
    ClearWalker {
        /// Offset of the vacated tile.
        offset: GridOffset,
    },
    /// Switches the active builder tool.
    SetToolMode {
        /// Tool to activate.
        mode: ToolMode,
    },
    /// Commits a previously detected bridge span to the grid.
    CommitBridge {
        /// Span returned by bridge detection.
        span: BridgeSpan,
    },
    /// Removes the bridge containing the tile at the provided offset.
    RemoveBridge {
        /// Any tile belonging to the bridge.
        offset: GridOffset,
        /// Whether tiles are cleared or only marked for deletion.
        mode: RemovalMode,
    },
    /// Clears deletion marks from the bridge containing the provided offset.
    RestoreBridge {
        /// Any tile belonging to the bridge.
        offset: GridOffset,
    },
    /// Rotates the map view a quarter turn.
    RotateMap {
        /// Direction of the rotation.
        rotation: Rotation,
    },
    /// Recomputes every routing layer from the current terrain.
    RecomputeRouting,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a fresh map was configured.
    MapConfigured {
        /// Number of tile columns in the playable map.
        width: u32,
        /// Number of tile rows in the playable map.
        height: u32,
    },
    /// Reports that a map configuration request was rejected.
    MapConfigurationRejected {
        /// Reason the configuration failed.
        reason: GridError,
    },
    /// Confirms that a tile layer was written.
    TileUpdated {
        /// Offset of the updated tile.
        offset: GridOffset,
    },
    /// Reports that a tile write was rejected.
    TileRejected {
        /// Reason the write failed.
        reason: GridError,
    },
    /// Announces that the builder tool changed.
    ToolModeChanged {
        /// Tool that became active.
        mode: ToolMode,
    },
    /// Confirms that a bridge was written to the grid.
    BridgeCommitted {
        /// Span that now carries bridge sprites.
        span: BridgeSpan,
    },
    /// Reports that a bridge commit request was rejected.
    BridgeRejected {
        /// Tile the detection started from.
        origin: TileCoord,
        /// Kind of bridge requested.
        kind: BridgeKind,
        /// Specific reason the commit failed.
        reason: BridgeRejection,
    },
    /// Confirms that a bridge was removed or marked for removal.
    BridgeRemoved {
        /// Lower end of the recovered span.
        start: GridOffset,
        /// Number of tiles affected.
        tiles: u32,
        /// How the tiles were affected.
        mode: RemovalMode,
    },
    /// Reports that a bridge removal request did not target a bridge.
    BridgeRemovalRejected {
        /// Offset provided in the request.
        offset: GridOffset,
        /// Specific reason the removal failed.
        reason: BridgeRejection,
    },
    /// Confirms that deletion marks were cleared from a bridge.
    BridgeRestored {
        /// Lower end of the recovered span.
        start: GridOffset,
        /// Number of tiles affected.
        tiles: u32,
    },
    /// Announces that the map view rotated.
    MapRotated {
        /// Orientation after the rotation.
        orientation: Orientation,
        /// Number of bridge sprites remapped.
        sprites_updated: u32,
    },
    /// Announces that routing layers were rebuilt.
    RoutingRecomputed {
        /// Connected land networks reachable by citizens.
        citizen_networks: u32,
        /// Connected land networks reachable by non-citizens.
        noncitizen_networks: u32,
        /// Connected water networks.
        water_networks: u32,
    },
}

/// Location of a map tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    x: u32,
    y: u32,
}

impl TileCoord {
    /// Creates a new map tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Linear index into the backing grid shared by every tile layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridOffset(u32);

impl GridOffset {
    /// Wraps a raw linear index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw linear index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index usable with the backing layer vectors.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Moves the offset by `delta` cells, staying inside the backing grid.
    #[must_use]
    pub fn step(self, delta: i32) -> Option<GridOffset> {
        let moved = self.0.checked_add_signed(delta)?;
        if (moved as usize) < GRID_CELLS {
            Some(GridOffset(moved))
        } else {
            None
        }
    }
}

bitflags! {
    /// Terrain classification stored per tile.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TerrainFlags: u32 {
        /// Trees block construction and bridge walks.
        const TREE = 0x0001;
        /// Impassable rock.
        const ROCK = 0x0002;
        /// Open water.
        const WATER = 0x0004;
        /// Covered by a building footprint.
        const BUILDING = 0x0008;
        /// Low vegetation.
        const SHRUB = 0x0010;
        /// Decorative garden.
        const GARDEN = 0x0020;
        /// Paved road, including bridge decks.
        const ROAD = 0x0040;
        /// Aqueduct channel.
        const AQUEDUCT = 0x0100;
        /// Raised terrain.
        const ELEVATION = 0x0200;
        /// Ramp onto raised terrain.
        const ACCESS_RAMP = 0x0400;
        /// Fertile meadow.
        const MEADOW = 0x0800;
        /// Collapsed building remains.
        const RUBBLE = 0x1000;
        /// Defensive wall.
        const WALL = 0x4000;
        /// Gatehouse in a wall.
        const GATEHOUSE = 0x8000;
        /// Backing cell outside the playable map.
        const OUTSIDE_MAP = 0x1_0000;
    }
}

bitflags! {
    /// Auxiliary per-tile flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TileFlags: u8 {
        /// Bits encoding the size of a multi-tile footprint.
        const SIZE_MASK = 0x0f;
        /// Tile is part of a construction preview.
        const CONSTRUCTION = 0x10;
        /// Tile uses the alternate terrain graphic.
        const ALTERNATE_TERRAIN = 0x20;
        /// Tile is marked for deferred deletion.
        const DELETED = 0x40;
        /// Tile belongs to a plaza or earthquake fissure.
        const PLAZA_OR_EARTHQUAKE = 0x80;
    }
}

/// Identifier of a walker occupying a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalkerId(u32);

impl WalkerId {
    /// Creates a new walker identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a building covering a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new building identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Failures raised while addressing or configuring the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum GridError {
    /// The coordinate lies outside the configured map.
    #[error("tile ({x}, {y}) lies outside the map")]
    OutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },
    /// The offset does not address a tile inside the configured map.
    #[error("offset {0:?} does not address a map tile")]
    OffsetOutsideMap(GridOffset),
    /// A map dimension is zero or exceeds [`MAX_MAP_DIMENSION`].
    #[error("map size {width}x{height} is not supported")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::{GridError, GridOffset, TerrainFlags, TileCoord, GRID_CELLS};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = TileCoord::new(1, 1);
        let destination = TileCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn grid_offset_step_stays_inside_backing_grid() {
        let origin = GridOffset::new(0);
        assert_eq!(origin.step(-1), None);
        assert_eq!(origin.step(5), Some(GridOffset::new(5)));

        let last = GridOffset::new(GRID_CELLS as u32 - 1);
        assert_eq!(last.step(1), None);
        assert_eq!(last.step(-162), Some(GridOffset::new(GRID_CELLS as u32 - 163)));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn terrain_flags_round_trip_through_bincode() {
        assert_round_trip(&(TerrainFlags::WATER | TerrainFlags::ROAD));
    }

    #[test]
    fn grid_error_round_trips_through_bincode() {
        assert_round_trip(&GridError::OutOfBounds { x: 3, y: 9 });
    }
}
