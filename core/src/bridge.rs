//! Value types describing bridges, their sprites and the map orientation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GridOffset, TileCoord, GRID_SIZE};

/// Kinds of bridges that can span water.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeKind {
    /// Low bridge carrying road traffic; blocks boats.
    Land,
    /// Raised bridge tall enough for ships to pass beneath.
    Ship,
}

impl BridgeKind {
    /// Shortest span, in tiles, this kind of bridge may cover.
    #[must_use]
    pub const fn min_length(self) -> u32 {
        match self {
            Self::Land => 2,
            Self::Ship => 5,
        }
    }
}

/// Direction of travel along a bridge span.
///
/// Codes follow the eight-step compass used by the renderer, of which bridges
/// only use the four cardinal entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeDirection {
    /// Toward decreasing rows, code 0.
    Top,
    /// Toward increasing columns, code 2.
    Right,
    /// Toward increasing rows, code 4.
    Bottom,
    /// Toward decreasing columns, code 6.
    Left,
}

impl BridgeDirection {
    /// Compass code of the direction.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Top => 0,
            Self::Right => 2,
            Self::Bottom => 4,
            Self::Left => 6,
        }
    }

    /// Resolves a compass code, accepting any multiple of 8 offset.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code % 8 {
            0 => Some(Self::Top),
            2 => Some(Self::Right),
            4 => Some(Self::Bottom),
            6 => Some(Self::Left),
            _ => None,
        }
    }

    /// Expresses the direction relative to the rotated map view.
    #[must_use]
    pub const fn relative_to(self, orientation: Orientation) -> Self {
        match Self::from_code((self.code() + 8 - orientation.code()) % 8) {
            Some(direction) => direction,
            None => self,
        }
    }

    /// Direction pointing the other way along the same axis.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }

    /// Direction after the view rotates a quarter turn.
    #[must_use]
    pub const fn rotated(self, rotation: Rotation) -> Self {
        match (self, rotation) {
            (Self::Top, Rotation::Clockwise) => Self::Left,
            (Self::Right, Rotation::Clockwise) => Self::Top,
            (Self::Bottom, Rotation::Clockwise) => Self::Right,
            (Self::Left, Rotation::Clockwise) => Self::Bottom,
            (Self::Top, Rotation::CounterClockwise) => Self::Right,
            (Self::Right, Rotation::CounterClockwise) => Self::Bottom,
            (Self::Bottom, Rotation::CounterClockwise) => Self::Left,
            (Self::Left, Rotation::CounterClockwise) => Self::Top,
        }
    }

    /// Axis the direction travels along.
    #[must_use]
    pub const fn axis(self) -> SpanAxis {
        match self {
            Self::Top | Self::Bottom => SpanAxis::Vertical,
            Self::Right | Self::Left => SpanAxis::Horizontal,
        }
    }

    /// Offset delta of a single step in this direction.
    #[must_use]
    pub const fn grid_step(self) -> i32 {
        match self {
            Self::Top => -(GRID_SIZE as i32),
            Self::Right => 1,
            Self::Bottom => GRID_SIZE as i32,
            Self::Left => -1,
        }
    }
}

/// Axis a bridge section is drawn along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanAxis {
    /// Runs between the top and bottom of the view.
    Vertical,
    /// Runs between the left and right of the view.
    Horizontal,
}

impl SpanAxis {
    /// The perpendicular axis.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Vertical => Self::Horizontal,
            Self::Horizontal => Self::Vertical,
        }
    }
}

/// Quarter-turn rotation applied to the map view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    /// Rotates the view clockwise.
    Clockwise,
    /// Rotates the view counter-clockwise.
    CounterClockwise,
}

impl Rotation {
    /// Rotation that undoes this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

/// Rotation of the rendered map view in quarter turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Unrotated view, code 0.
    #[default]
    Deg0,
    /// Quarter turn, code 2.
    Deg90,
    /// Half turn, code 4.
    Deg180,
    /// Three quarter turns, code 6.
    Deg270,
}

impl Orientation {
    /// Compass code of the orientation.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 2,
            Self::Deg180 => 4,
            Self::Deg270 => 6,
        }
    }

    /// Orientation reached after rotating the view.
    #[must_use]
    pub const fn rotated(self, rotation: Rotation) -> Self {
        match (self, rotation) {
            (Self::Deg0, Rotation::Clockwise) => Self::Deg90,
            (Self::Deg90, Rotation::Clockwise) => Self::Deg180,
            (Self::Deg180, Rotation::Clockwise) => Self::Deg270,
            (Self::Deg270, Rotation::Clockwise) => Self::Deg0,
            (Self::Deg0, Rotation::CounterClockwise) => Self::Deg270,
            (Self::Deg90, Rotation::CounterClockwise) => Self::Deg0,
            (Self::Deg180, Rotation::CounterClockwise) => Self::Deg90,
            (Self::Deg270, Rotation::CounterClockwise) => Self::Deg180,
        }
    }
}

/// Visual variant drawn on a bridge tile.
///
/// Absence of a bridge is expressed as `Option::None` on the sprite layer, so
/// every value of this type is a real variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeSprite {
    /// Transition between the shore and the deck.
    Ramp {
        /// Bridge the ramp belongs to.
        kind: BridgeKind,
        /// Screen direction the ramp rises toward.
        facing: BridgeDirection,
    },
    /// Plain deck section.
    Span {
        /// Bridge the section belongs to.
        kind: BridgeKind,
        /// Screen axis the deck runs along.
        axis: SpanAxis,
    },
    /// Level platform following a ship bridge ramp.
    Platform,
    /// Mid-span support of a ship bridge.
    Pillar {
        /// Screen axis the deck runs along.
        axis: SpanAxis,
    },
}

impl BridgeSprite {
    /// Numeric sprite index used by the renderer, always in `1..=15`.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Ramp { kind, facing } => {
                let base = match kind {
                    BridgeKind::Land => 1,
                    BridgeKind::Ship => 7,
                };
                base + facing.code() / 2
            }
            Self::Span { kind, axis } => {
                let base = match kind {
                    BridgeKind::Land => 5,
                    BridgeKind::Ship => 11,
                };
                match axis {
                    SpanAxis::Vertical => base,
                    SpanAxis::Horizontal => base + 1,
                }
            }
            Self::Platform => 13,
            Self::Pillar {
                axis: SpanAxis::Vertical,
            } => 14,
            Self::Pillar {
                axis: SpanAxis::Horizontal,
            } => 15,
        }
    }

    /// Resolves a renderer sprite index; zero and values above 15 are not sprites.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        let sprite = match index {
            1..=4 => Self::Ramp {
                kind: BridgeKind::Land,
                facing: match BridgeDirection::from_code((index - 1) * 2) {
                    Some(facing) => facing,
                    None => return None,
                },
            },
            5 => Self::Span {
                kind: BridgeKind::Land,
                axis: SpanAxis::Vertical,
            },
            6 => Self::Span {
                kind: BridgeKind::Land,
                axis: SpanAxis::Horizontal,
            },
            7..=10 => Self::Ramp {
                kind: BridgeKind::Ship,
                facing: match BridgeDirection::from_code((index - 7) * 2) {
                    Some(facing) => facing,
                    None => return None,
                },
            },
            11 => Self::Span {
                kind: BridgeKind::Ship,
                axis: SpanAxis::Vertical,
            },
            12 => Self::Span {
                kind: BridgeKind::Ship,
                axis: SpanAxis::Horizontal,
            },
            13 => Self::Platform,
            14 => Self::Pillar {
                axis: SpanAxis::Vertical,
            },
            15 => Self::Pillar {
                axis: SpanAxis::Horizontal,
            },
            _ => return None,
        };
        Some(sprite)
    }

    /// Sprite shown after the view rotates a quarter turn.
    ///
    /// Ramps turn with the view, deck sections and pillars swap axis and the
    /// platform looks the same from every side.
    #[must_use]
    pub const fn rotated(self, rotation: Rotation) -> Self {
        match self {
            Self::Ramp { kind, facing } => Self::Ramp {
                kind,
                facing: facing.rotated(rotation),
            },
            Self::Span { kind, axis } => Self::Span {
                kind,
                axis: axis.flipped(),
            },
            Self::Platform => Self::Platform,
            Self::Pillar { axis } => Self::Pillar {
                axis: axis.flipped(),
            },
        }
    }

    /// Whether boats can sail underneath the tile.
    #[must_use]
    pub const fn lets_ships_pass(self) -> bool {
        matches!(
            self,
            Self::Span {
                kind: BridgeKind::Ship,
                ..
            }
        )
    }
}

/// Straight run of water tiles found by bridge detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeSpan {
    kind: BridgeKind,
    origin: TileCoord,
    start: GridOffset,
    end: GridOffset,
    length: u32,
    direction: BridgeDirection,
}

impl BridgeSpan {
    /// Creates a span description.
    #[must_use]
    pub const fn new(
        kind: BridgeKind,
        origin: TileCoord,
        start: GridOffset,
        end: GridOffset,
        length: u32,
        direction: BridgeDirection,
    ) -> Self {
        Self {
            kind,
            origin,
            start,
            end,
            length,
            direction,
        }
    }

    /// Kind of bridge the span was detected for.
    #[must_use]
    pub const fn kind(&self) -> BridgeKind {
        self.kind
    }

    /// Shoreline tile the detection started from.
    #[must_use]
    pub const fn origin(&self) -> TileCoord {
        self.origin
    }

    /// Offset of the first tile.
    #[must_use]
    pub const fn start(&self) -> GridOffset {
        self.start
    }

    /// Offset of the last tile.
    #[must_use]
    pub const fn end(&self) -> GridOffset {
        self.end
    }

    /// Number of tiles from start to end inclusive.
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Map direction of travel from start to end.
    #[must_use]
    pub const fn direction(&self) -> BridgeDirection {
        self.direction
    }

    /// Whether the span is long enough for its bridge kind.
    #[must_use]
    pub const fn meets_minimum_length(&self) -> bool {
        self.length >= self.kind.min_length()
    }

    /// Offsets covered by the span, from start to end.
    pub fn offsets(&self) -> impl Iterator<Item = GridOffset> {
        let start = self.start;
        let step = self.direction.grid_step();
        (0..self.length).map_while(move |index| {
            i32::try_from(index)
                .ok()
                .and_then(|index| start.step(step * index))
        })
    }
}

/// Reasons a bridge operation can be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum BridgeRejection {
    /// The tile lies outside the configured map.
    #[error("tile lies outside the map")]
    OutOfBounds,
    /// The starting tile is not water.
    #[error("bridges must start on water")]
    NoWater,
    /// A road or building already occupies the path.
    #[error("road or building in the way")]
    AlreadyOccupied,
    /// The start or end tile does not touch land on exactly one side.
    #[error("no shoreline to anchor the bridge")]
    NoShoreline,
    /// A tile inside the span touches land.
    #[error("the crossing touches land before reaching the far shore")]
    ShorelineInterrupted,
    /// A tree blocks the crossing.
    #[error("a tree blocks the crossing")]
    Obstructed,
    /// The walk gave up before finding the far shore.
    #[error("the far shore is too far away")]
    IncompleteWalk,
    /// The span is shorter than the bridge kind allows.
    #[error("the crossing is too short for this bridge")]
    TooShort,
    /// The terrain changed since the span was detected.
    #[error("the terrain changed since the bridge was planned")]
    Stale,
    /// The tile is not part of a bridge.
    #[error("no bridge on this tile")]
    NotABridge,
}

/// How a bridge removal affects its tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalMode {
    /// Clears sprites and road flags immediately.
    Clear,
    /// Only marks tiles for deferred deletion.
    MarkDeleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sprite_index_resolves_to_itself() {
        for index in 1..=15 {
            let sprite = BridgeSprite::from_index(index).expect("sprite index");
            assert_eq!(sprite.index(), index);
        }
        assert_eq!(BridgeSprite::from_index(0), None);
        assert_eq!(BridgeSprite::from_index(16), None);
    }

    #[test]
    fn clockwise_rotation_matches_sprite_table() {
        let expected: [u8; 15] = [4, 1, 2, 3, 6, 5, 10, 7, 8, 9, 12, 11, 13, 15, 14];
        for (index, want) in (1..=15).zip(expected) {
            let sprite = BridgeSprite::from_index(index).expect("sprite index");
            assert_eq!(
                sprite.rotated(Rotation::Clockwise).index(),
                want,
                "clockwise remap of sprite {index}"
            );
        }
    }

    #[test]
    fn counter_clockwise_rotation_matches_sprite_table() {
        let expected: [u8; 15] = [2, 3, 4, 1, 6, 5, 8, 9, 10, 7, 12, 11, 13, 15, 14];
        for (index, want) in (1..=15).zip(expected) {
            let sprite = BridgeSprite::from_index(index).expect("sprite index");
            assert_eq!(
                sprite.rotated(Rotation::CounterClockwise).index(),
                want,
                "counter-clockwise remap of sprite {index}"
            );
        }
    }

    #[test]
    fn relative_direction_wraps_modulo_eight() {
        assert_eq!(
            BridgeDirection::Top.relative_to(Orientation::Deg90),
            BridgeDirection::Left
        );
        assert_eq!(
            BridgeDirection::Right.relative_to(Orientation::Deg270),
            BridgeDirection::Bottom
        );
        assert_eq!(
            BridgeDirection::Bottom.relative_to(Orientation::Deg0),
            BridgeDirection::Bottom
        );
    }

    #[test]
    fn span_offsets_follow_direction() {
        let span = BridgeSpan::new(
            BridgeKind::Land,
            TileCoord::new(0, 0),
            GridOffset::new(1000),
            GridOffset::new(1000 - 2 * GRID_SIZE),
            3,
            BridgeDirection::Top,
        );
        let offsets: Vec<u32> = span.offsets().map(|offset| offset.get()).collect();
        assert_eq!(offsets, vec![1000, 1000 - GRID_SIZE, 1000 - 2 * GRID_SIZE]);
    }

    #[test]
    fn ship_bridges_need_five_tiles() {
        let span = |length| {
            BridgeSpan::new(
                BridgeKind::Ship,
                TileCoord::new(0, 0),
                GridOffset::new(500),
                GridOffset::new(500 + length - 1),
                length,
                BridgeDirection::Right,
            )
        };
        assert!(!span(4).meets_minimum_length());
        assert!(span(5).meets_minimum_length());
    }
}
