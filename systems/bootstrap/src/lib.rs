#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a Riverford map from a scenario description.

use riverford_core::{Command, GridError, Rotation, TerrainFlags, TileCoord};
use riverford_world::{query, MapBounds, World};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Failures raised while reading a scenario description.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The document is not valid TOML or does not match the scenario layout.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    /// The map dimensions cannot be configured.
    #[error("invalid map: {0}")]
    Map(#[from] GridError),
    /// The number of terrain rows differs from the map height.
    #[error("expected {expected} terrain rows, found {found}")]
    RowCount {
        /// Map height declared in the scenario.
        expected: u32,
        /// Number of rows present.
        found: u32,
    },
    /// A terrain row is wider or narrower than the map.
    #[error("terrain row {row} has {found} tiles, expected {expected}")]
    RowWidth {
        /// Zero-based row index.
        row: u32,
        /// Map width declared in the scenario.
        expected: u32,
        /// Number of glyphs in the row.
        found: u32,
    },
    /// A terrain glyph is not part of the legend.
    #[error("unknown terrain glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Column of the glyph.
        x: u32,
        /// Row of the glyph.
        y: u32,
    },
    /// The starting orientation is not a quarter-turn count.
    #[error("orientation must be between 0 and 3 quarter turns, found {0}")]
    InvalidOrientation(u8),
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    map: MapSection,
    terrain: TerrainSection,
}

#[derive(Debug, Deserialize)]
struct MapSection {
    width: u32,
    height: u32,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    orientation: u8,
}

#[derive(Debug, Deserialize)]
struct TerrainSection {
    rows: Vec<String>,
}

/// Validated scenario: map size, random seed, starting rotation and painted terrain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    width: u32,
    height: u32,
    seed: u64,
    quarter_turns: u8,
    tiles: Vec<(TileCoord, TerrainFlags)>,
}

impl Scenario {
    /// Parses and validates a TOML scenario document.
    pub fn from_toml(contents: &str) -> Result<Self, ScenarioError> {
        let file: ScenarioFile = toml::from_str(contents)?;
        let MapSection {
            width,
            height,
            seed,
            orientation,
        } = file.map;

        let _ = MapBounds::new(width, height)?;
        if orientation > 3 {
            return Err(ScenarioError::InvalidOrientation(orientation));
        }

        let found = file.terrain.rows.len() as u32;
        if found != height {
            return Err(ScenarioError::RowCount {
                expected: height,
                found,
            });
        }

        let mut tiles = Vec::new();
        for (y, row) in (0..).zip(&file.terrain.rows) {
            let found = row.chars().count() as u32;
            if found != width {
                return Err(ScenarioError::RowWidth {
                    row: y,
                    expected: width,
                    found,
                });
            }

            for (x, glyph) in (0..).zip(row.chars()) {
                let terrain =
                    terrain_for(glyph).ok_or(ScenarioError::UnknownGlyph { glyph, x, y })?;
                if !terrain.is_empty() {
                    tiles.push((TileCoord::new(x, y), terrain));
                }
            }
        }

        debug!(width, height, painted = tiles.len(), "scenario parsed");
        Ok(Self {
            width,
            height,
            seed,
            quarter_turns: orientation,
            tiles,
        })
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Seed for the random tile layer.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Clockwise quarter turns applied to the view after loading.
    #[must_use]
    pub const fn quarter_turns(&self) -> u8 {
        self.quarter_turns
    }

    /// Tiles whose terrain differs from clear ground.
    #[must_use]
    pub fn painted_tiles(&self) -> &[(TileCoord, TerrainFlags)] {
        &self.tiles
    }
}

fn terrain_for(glyph: char) -> Option<TerrainFlags> {
    let terrain = match glyph {
        '.' => TerrainFlags::empty(),
        '~' => TerrainFlags::WATER,
        'T' => TerrainFlags::TREE,
        '^' => TerrainFlags::ROCK,
        '#' => TerrainFlags::BUILDING,
        '=' => TerrainFlags::ROAD,
        '"' => TerrainFlags::MEADOW,
        '*' => TerrainFlags::SHRUB,
        _ => return None,
    };
    Some(terrain)
}

/// Produces the command batch that loads a scenario and the data required to greet the player.
#[derive(Debug)]
pub struct Bootstrap {
    scenario: Scenario,
}

impl Bootstrap {
    /// Creates a bootstrap for an already validated scenario.
    #[must_use]
    pub const fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }

    /// Parses a TOML scenario and wraps it in a bootstrap.
    pub fn from_toml(contents: &str) -> Result<Self, ScenarioError> {
        Scenario::from_toml(contents).map(Self::new)
    }

    /// Scenario the bootstrap loads.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Commands that configure a fresh map, paint its terrain and rebuild routing.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        let scenario = &self.scenario;
        let mut commands = Vec::with_capacity(scenario.tiles.len() + 6);
        commands.push(Command::ConfigureMap {
            width: scenario.width,
            height: scenario.height,
            seed: scenario.seed,
        });
        commands.extend(
            scenario
                .tiles
                .iter()
                .map(|&(tile, terrain)| Command::SetTerrain { tile, terrain }),
        );
        commands.extend((0..scenario.quarter_turns).map(|_| Command::RotateMap {
            rotation: Rotation::Clockwise,
        }));
        commands.push(Command::RecomputeRouting);

        info!(
            width = scenario.width,
            height = scenario.height,
            commands = commands.len(),
            "scenario bootstrap prepared"
        );
        commands
    }

    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_covers_every_documented_glyph() {
        for glyph in ['.', '~', 'T', '^', '#', '=', '"', '*'] {
            assert!(terrain_for(glyph).is_some(), "glyph {glyph:?} should map");
        }
        assert_eq!(terrain_for('?'), None);
    }

    #[test]
    fn clear_tiles_are_not_painted() {
        let scenario = Scenario::from_toml(
            r#"
            [map]
            width = 3
            height = 1

            [terrain]
            rows = [".~."]
            "#,
        )
        .expect("scenario should parse");

        assert_eq!(
            scenario.painted_tiles(),
            &[(TileCoord::new(1, 0), TerrainFlags::WATER)]
        );
        assert_eq!(scenario.seed(), 0);
        assert_eq!(scenario.quarter_turns(), 0);
    }
}
