//! Scripted player actions accepted on the command line.

use std::str::FromStr;

use anyhow::{bail, Context};
use riverford_core::{BridgeKind, Rotation, TileCoord};

/// Single scripted step, written as `verb:x,y` or `rotate:cw|ccw`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// Preview and confirm a bridge from the shoreline tile.
    Build(BridgeKind, TileCoord),
    /// Remove the bridge under the tile, deferring while walkers are on it.
    Remove(TileCoord),
    /// Mark the bridge under the tile for deletion; it clears once no walkers remain.
    Mark(TileCoord),
    /// Clear deletion marks from the bridge under the tile.
    Restore(TileCoord),
    /// Report how many walkers stand on the bridge under the tile.
    Count(TileCoord),
    /// Place a walker on the tile.
    Walk(TileCoord),
    /// Remove the walker from the tile.
    Leave(TileCoord),
    /// Rotate the map view a quarter turn.
    Rotate(Rotation),
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (verb, argument) = value
            .split_once(':')
            .with_context(|| format!("action `{value}` is missing `:`"))?;

        if verb == "rotate" {
            let rotation = match argument {
                "cw" => Rotation::Clockwise,
                "ccw" => Rotation::CounterClockwise,
                other => bail!("unknown rotation `{other}`; expected `cw` or `ccw`"),
            };
            return Ok(Self::Rotate(rotation));
        }

        let tile = parse_tile(argument)
            .with_context(|| format!("invalid tile in action `{value}`"))?;
        let action = match verb {
            "build" => Self::Build(BridgeKind::Land, tile),
            "ship" => Self::Build(BridgeKind::Ship, tile),
            "remove" => Self::Remove(tile),
            "mark" => Self::Mark(tile),
            "restore" => Self::Restore(tile),
            "count" => Self::Count(tile),
            "walk" => Self::Walk(tile),
            "leave" => Self::Leave(tile),
            other => bail!("unknown action `{other}`"),
        };
        Ok(action)
    }
}

fn parse_tile(value: &str) -> anyhow::Result<TileCoord> {
    let (x, y) = value
        .split_once(',')
        .context("expected coordinates as `x,y`")?;
    let x = x.trim().parse().context("column is not a number")?;
    let y = y.trim().parse().context("row is not a number")?;
    Ok(TileCoord::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bridge_actions() {
        assert_eq!(
            "build:6,5".parse::<Action>().expect("valid action"),
            Action::Build(BridgeKind::Land, TileCoord::new(6, 5))
        );
        assert_eq!(
            "ship:4, 11".parse::<Action>().expect("valid action"),
            Action::Build(BridgeKind::Ship, TileCoord::new(4, 11))
        );
        assert_eq!(
            "rotate:ccw".parse::<Action>().expect("valid action"),
            Action::Rotate(Rotation::CounterClockwise)
        );
    }

    #[test]
    fn rejects_malformed_actions() {
        for input in ["build", "build:6", "build:a,b", "jump:1,1", "rotate:left"] {
            assert!(
                input.parse::<Action>().is_err(),
                "`{input}` should not parse"
            );
        }
    }
}
