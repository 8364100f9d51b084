//! Bridge detection, construction, removal and occupancy queries.
//!
//! Bridges are straight runs of water tiles anchored on shoreline tiles at
//! both ends. Detection is a pure read of the grid and produces a
//! [`BridgeSpan`]; committing writes sprites and road flags for that span.
//! Removal and the occupancy query start from any tile of an existing bridge
//! and recover the span from the sprites around it.

use riverford_core::{
    BridgeDirection, BridgeKind, BridgeRejection, BridgeSpan, BridgeSprite, GridOffset,
    Orientation, RemovalMode, Rotation, TerrainFlags, TileCoord, TileFlags, GRID_SIZE,
    MAX_BRIDGE_WALK,
};

use crate::grid::TerrainGrid;

// Probe patterns are kept exactly as shipped: the Y count samples two rows up
// twice, the X count samples the up-left diagonal twice. Existing saves rely
// on the resulting axis choice for adjacent parallel bridges.
const Y_AXIS_PROBES: [(i32, i32); 4] = [(0, -1), (0, -2), (0, 1), (0, -2)];
const X_AXIS_PROBES: [(i32, i32); 4] = [(-1, 0), (-1, -1), (1, 0), (-1, -1)];

const OCCUPIED: TerrainFlags = TerrainFlags::ROAD.union(TerrainFlags::BUILDING);

/// Number of bridge tiles found by the vertical probes around `offset`.
pub(crate) fn y_axis_bridge_tiles(grid: &TerrainGrid, offset: GridOffset) -> u32 {
    count_bridge_probes(grid, offset, &Y_AXIS_PROBES)
}

/// Number of bridge tiles found by the horizontal probes around `offset`.
pub(crate) fn x_axis_bridge_tiles(grid: &TerrainGrid, offset: GridOffset) -> u32 {
    count_bridge_probes(grid, offset, &X_AXIS_PROBES)
}

fn count_bridge_probes(grid: &TerrainGrid, offset: GridOffset, probes: &[(i32, i32)]) -> u32 {
    probes
        .iter()
        .filter_map(|&(dx, dy)| grid.neighbor(offset, dx, dy))
        .filter(|probe| grid.is_bridge(*probe))
        .fold(0, |count, _| count + 1)
}

/// Offset delta used to walk along the bridge containing `offset`.
fn span_step(grid: &TerrainGrid, offset: GridOffset) -> i32 {
    if y_axis_bridge_tiles(grid, offset) < x_axis_bridge_tiles(grid, offset) {
        1
    } else {
        GRID_SIZE as i32
    }
}

/// Searches for a bridge span starting at the shoreline tile `origin`.
pub(crate) fn detect(
    grid: &TerrainGrid,
    origin: TileCoord,
    kind: BridgeKind,
) -> Result<BridgeSpan, BridgeRejection> {
    let start = grid
        .bounds()
        .offset(origin)
        .map_err(|_| BridgeRejection::OutOfBounds)?;

    let terrain = grid.terrain(start);
    if !terrain.contains(TerrainFlags::WATER) {
        return Err(BridgeRejection::NoWater);
    }
    if terrain.intersects(OCCUPIED) {
        return Err(BridgeRejection::AlreadyOccupied);
    }
    if grid.count_adjacent_matching(start, TerrainFlags::WATER) != 3 {
        return Err(BridgeRejection::NoShoreline);
    }

    let direction = walk_direction(grid, start).ok_or(BridgeRejection::NoShoreline)?;
    let step = direction.grid_step();

    let mut current = start;
    let mut length = 1;
    for _ in 0..MAX_BRIDGE_WALK {
        current = current.step(step).ok_or(BridgeRejection::IncompleteWalk)?;
        length += 1;

        let ahead = current
            .step(step)
            .map_or(TerrainFlags::OUTSIDE_MAP, |next| grid.terrain(next));
        if ahead.contains(TerrainFlags::TREE) {
            return Err(BridgeRejection::Obstructed);
        }
        if !ahead.contains(TerrainFlags::WATER) {
            if grid.count_adjacent_matching(current, TerrainFlags::WATER) != 3 {
                return Err(BridgeRejection::NoShoreline);
            }
            return Ok(BridgeSpan::new(
                kind, origin, start, current, length, direction,
            ));
        }
        if ahead.intersects(OCCUPIED) {
            return Err(BridgeRejection::AlreadyOccupied);
        }
        if grid.count_adjacent_matching(current, TerrainFlags::WATER) != 4 {
            return Err(BridgeRejection::ShorelineInterrupted);
        }
    }

    Err(BridgeRejection::IncompleteWalk)
}

/// Direction pointing away from the single land neighbour of a shoreline tile.
fn walk_direction(grid: &TerrainGrid, start: GridOffset) -> Option<BridgeDirection> {
    let is_land = |dx: i32, dy: i32| {
        grid.neighbor(start, dx, dy)
            .map_or(true, |neighbor| {
                !grid.terrain(neighbor).contains(TerrainFlags::WATER)
            })
    };

    if is_land(0, -1) {
        Some(BridgeDirection::Bottom)
    } else if is_land(1, 0) {
        Some(BridgeDirection::Left)
    } else if is_land(0, 1) {
        Some(BridgeDirection::Top)
    } else if is_land(-1, 0) {
        Some(BridgeDirection::Right)
    } else {
        None
    }
}

/// Writes bridge sprites and road flags for a detected span.
///
/// The span is re-detected first so a plan made before the terrain changed is
/// refused instead of drawing a bridge over land.
pub(crate) fn commit(
    grid: &mut TerrainGrid,
    span: &BridgeSpan,
    orientation: Orientation,
) -> Result<(), BridgeRejection> {
    if !span.meets_minimum_length() {
        return Err(BridgeRejection::TooShort);
    }
    let current = detect(grid, span.origin(), span.kind())?;
    if current != *span {
        return Err(BridgeRejection::Stale);
    }

    let facing = span.direction().relative_to(orientation);
    let pillar = match span.kind() {
        BridgeKind::Ship => Some(pillar_index(span.length())),
        BridgeKind::Land => None,
    };

    for (index, offset) in (0..).zip(span.offsets()) {
        grid.insert_terrain(offset, TerrainFlags::ROAD);
        let sprite = sprite_for(span.kind(), index, span.length(), facing, pillar);
        grid.set_sprite(offset, Some(sprite));
    }

    Ok(())
}

/// Tile index, counted from the start of a ship bridge, that carries the pillar.
pub(crate) const fn pillar_index(length: u32) -> u32 {
    match length {
        9 | 10 => 4,
        11 | 12 => 5,
        13 | 14 => 6,
        15 | 16 => 7,
        _ => 8,
    }
}

fn sprite_for(
    kind: BridgeKind,
    index: u32,
    length: u32,
    facing: BridgeDirection,
    pillar: Option<u32>,
) -> BridgeSprite {
    let last = length - 1;
    let axis = facing.axis();

    if kind == BridgeKind::Ship && (index == 1 || index + 2 == length) {
        return BridgeSprite::Platform;
    }
    if index == 0 {
        return BridgeSprite::Ramp { kind, facing };
    }
    if index == last {
        return BridgeSprite::Ramp {
            kind,
            facing: facing.opposite(),
        };
    }
    if pillar == Some(index) {
        return BridgeSprite::Pillar { axis };
    }
    BridgeSprite::Span { kind, axis }
}

/// Walks back from any bridge tile to the end with the lowest offset.
fn lower_end(grid: &TerrainGrid, offset: GridOffset) -> Option<(GridOffset, i32)> {
    if !grid.is_bridge(offset) {
        return None;
    }

    let step = span_step(grid, offset);
    let mut current = offset;
    while let Some(previous) = current.step(-step).filter(|previous| grid.is_bridge(*previous)) {
        current = previous;
    }
    Some((current, step))
}

/// Visits every tile of the bridge containing `offset`, lowest offset first.
///
/// Returns the lower end and the number of tiles visited.
fn for_each_span_tile<F>(
    grid: &mut TerrainGrid,
    offset: GridOffset,
    mut visit: F,
) -> Result<(GridOffset, u32), BridgeRejection>
where
    F: FnMut(&mut TerrainGrid, GridOffset),
{
    let (start, step) = lower_end(grid, offset).ok_or(BridgeRejection::NotABridge)?;

    let mut tiles = 0;
    let mut cursor = Some(start);
    while let Some(current) = cursor {
        let next = current.step(step).filter(|next| grid.is_bridge(*next));
        visit(grid, current);
        tiles += 1;
        cursor = next;
    }

    Ok((start, tiles))
}

/// Clears, or marks for deletion, the bridge containing `offset`.
///
/// Routing is left untouched; callers recompute it once the removal is final.
pub(crate) fn remove(
    grid: &mut TerrainGrid,
    offset: GridOffset,
    mode: RemovalMode,
) -> Result<(GridOffset, u32), BridgeRejection> {
    for_each_span_tile(grid, offset, |grid, tile| match mode {
        RemovalMode::MarkDeleted => grid.insert_flags(tile, TileFlags::DELETED),
        RemovalMode::Clear => {
            grid.set_sprite(tile, None);
            grid.remove_terrain(tile, TerrainFlags::ROAD);
            grid.remove_flags(tile, TileFlags::DELETED);
        }
    })
}

/// Clears deletion marks from the bridge containing `offset`.
pub(crate) fn restore(
    grid: &mut TerrainGrid,
    offset: GridOffset,
) -> Result<(GridOffset, u32), BridgeRejection> {
    for_each_span_tile(grid, offset, |grid, tile| {
        grid.remove_flags(tile, TileFlags::DELETED);
    })
}

/// Number of walkers standing on the bridge containing `offset`.
pub(crate) fn count_walkers(grid: &TerrainGrid, offset: GridOffset) -> u32 {
    let Some((start, step)) = lower_end(grid, offset) else {
        return 0;
    };

    // Tile flags never end the walk: marked and unmarked tiles of the span are
    // counted alike, and the walk stops only where the bridge sprites stop.
    let mut walkers = 0;
    let mut cursor = Some(start);
    while let Some(current) = cursor {
        if grid.walker(current).is_some() {
            walkers += 1;
        }
        cursor = current.step(step).filter(|next| grid.is_bridge(*next));
    }
    walkers
}

/// Remaps every bridge sprite after the view rotated; returns the number remapped.
pub(crate) fn rotate_sprites(grid: &mut TerrainGrid, rotation: Rotation) -> u32 {
    let offsets: Vec<GridOffset> = grid
        .bounds()
        .offsets()
        .filter(|offset| grid.is_bridge(*offset))
        .collect();

    for &offset in &offsets {
        let rotated = grid.sprite(offset).map(|sprite| sprite.rotated(rotation));
        grid.set_sprite(offset, rotated);
    }

    offsets.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MapBounds;

    fn grid_with_bridge_at(tiles: &[(u32, u32)]) -> (TerrainGrid, MapBounds) {
        let bounds = MapBounds::new(12, 12).expect("valid bounds");
        let mut grid = TerrainGrid::new(bounds, 3);
        for &(x, y) in tiles {
            let offset = bounds.offset(TileCoord::new(x, y)).expect("tile inside map");
            grid.set_terrain(offset, TerrainFlags::WATER | TerrainFlags::ROAD);
            grid.set_sprite(offset, BridgeSprite::from_index(5));
        }
        (grid, bounds)
    }

    #[test]
    fn y_axis_count_samples_two_rows_up_twice() {
        let (grid, bounds) = grid_with_bridge_at(&[(5, 3)]);
        let probe = bounds.offset(TileCoord::new(5, 5)).expect("tile inside map");
        assert_eq!(y_axis_bridge_tiles(&grid, probe), 2);

        let (grid, bounds) = grid_with_bridge_at(&[(5, 7)]);
        let probe = bounds.offset(TileCoord::new(5, 5)).expect("tile inside map");
        assert_eq!(y_axis_bridge_tiles(&grid, probe), 0);
    }

    #[test]
    fn x_axis_count_samples_upper_left_diagonal_twice() {
        let (grid, bounds) = grid_with_bridge_at(&[(4, 4)]);
        let probe = bounds.offset(TileCoord::new(5, 5)).expect("tile inside map");
        assert_eq!(x_axis_bridge_tiles(&grid, probe), 2);
        assert_eq!(y_axis_bridge_tiles(&grid, probe), 0);
    }

    #[test]
    fn horizontal_neighbours_select_unit_step() {
        let (grid, bounds) = grid_with_bridge_at(&[(4, 5), (5, 5), (6, 5)]);
        let probe = bounds.offset(TileCoord::new(5, 5)).expect("tile inside map");
        assert_eq!(span_step(&grid, probe), 1);
    }

    #[test]
    fn vertical_neighbours_select_row_step() {
        let (grid, bounds) = grid_with_bridge_at(&[(5, 4), (5, 5), (5, 6)]);
        let probe = bounds.offset(TileCoord::new(5, 5)).expect("tile inside map");
        assert_eq!(span_step(&grid, probe), GRID_SIZE as i32);
    }

    #[test]
    fn pillar_index_follows_span_length() {
        let expected = [
            (5, 8),
            (8, 8),
            (9, 4),
            (10, 4),
            (11, 5),
            (12, 5),
            (13, 6),
            (14, 6),
            (15, 7),
            (16, 7),
            (17, 8),
            (41, 8),
        ];
        for (length, index) in expected {
            assert_eq!(pillar_index(length), index, "pillar for length {length}");
        }
    }

    #[test]
    fn ship_sprites_place_platforms_beside_ramps() {
        let sprites: Vec<u8> = (0..9)
            .map(|index| {
                sprite_for(
                    BridgeKind::Ship,
                    index,
                    9,
                    BridgeDirection::Right,
                    Some(pillar_index(9)),
                )
                .index()
            })
            .collect();
        assert_eq!(sprites, vec![8, 13, 12, 12, 15, 12, 12, 13, 10]);
    }

    #[test]
    fn land_sprites_use_ramp_per_direction() {
        let starts: Vec<u8> = [
            BridgeDirection::Top,
            BridgeDirection::Right,
            BridgeDirection::Bottom,
            BridgeDirection::Left,
        ]
        .into_iter()
        .map(|facing| sprite_for(BridgeKind::Land, 0, 4, facing, None).index())
        .collect();
        assert_eq!(starts, vec![1, 2, 3, 4]);

        let ends: Vec<u8> = [
            BridgeDirection::Top,
            BridgeDirection::Right,
            BridgeDirection::Bottom,
            BridgeDirection::Left,
        ]
        .into_iter()
        .map(|facing| sprite_for(BridgeKind::Land, 3, 4, facing, None).index())
        .collect();
        assert_eq!(ends, vec![3, 4, 1, 2]);
    }
}
