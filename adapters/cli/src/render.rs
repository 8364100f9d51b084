//! Plain-text rendering of the playable map.

use riverford_core::{BridgeKind, BridgeSprite, SpanAxis, TerrainFlags, TileFlags};
use riverford_world::{query, World};

/// Renders the map one character per tile, one line per row.
///
/// Walkers are drawn above bridges, bridges above terrain. Bridges marked for
/// deletion are drawn as `x`.
pub(crate) fn render(world: &World) -> String {
    let bounds = query::bounds(world);
    let mut output = String::with_capacity(((bounds.width() + 1) * bounds.height()) as usize);

    for (index, offset) in (0..).zip(bounds.offsets()) {
        if index > 0 && index % bounds.width() == 0 {
            output.push('\n');
        }

        let glyph = if query::walker(world, offset).is_some() {
            '@'
        } else if let Some(sprite) = query::sprite(world, offset) {
            if query::tile_flags(world, offset).contains(TileFlags::DELETED) {
                'x'
            } else {
                sprite_glyph(sprite)
            }
        } else {
            terrain_glyph(query::terrain(world, offset))
        };
        output.push(glyph);
    }

    output.push('\n');
    output
}

fn sprite_glyph(sprite: BridgeSprite) -> char {
    match sprite {
        BridgeSprite::Ramp { .. } => 'o',
        BridgeSprite::Span {
            kind: BridgeKind::Ship,
            ..
        } => ':',
        BridgeSprite::Span {
            axis: SpanAxis::Horizontal,
            ..
        } => '-',
        BridgeSprite::Span {
            axis: SpanAxis::Vertical,
            ..
        } => '|',
        BridgeSprite::Platform => '+',
        BridgeSprite::Pillar { .. } => 'P',
    }
}

fn terrain_glyph(terrain: TerrainFlags) -> char {
    if terrain.contains(TerrainFlags::BUILDING) {
        '#'
    } else if terrain.contains(TerrainFlags::ROAD) {
        '='
    } else if terrain.contains(TerrainFlags::WATER) {
        '~'
    } else if terrain.contains(TerrainFlags::TREE) {
        'T'
    } else if terrain.contains(TerrainFlags::ROCK) {
        '^'
    } else if terrain.contains(TerrainFlags::SHRUB) {
        '*'
    } else if terrain.contains(TerrainFlags::MEADOW) {
        '"'
    } else {
        '.'
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riverford_core::{Command, TileCoord, WalkerId};
    use riverford_world::apply;

    fn river_world() -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureMap {
                width: 6,
                height: 3,
                seed: 1,
            },
            &mut events,
        );
        for y in 0..3 {
            for x in 1..=4 {
                apply(
                    &mut world,
                    Command::SetTerrain {
                        tile: TileCoord::new(x, y),
                        terrain: TerrainFlags::WATER,
                    },
                    &mut events,
                );
            }
        }
        world
    }

    #[test]
    fn renders_terrain_rows() {
        let world = river_world();

        assert_eq!(render(&world), ".~~~~.\n.~~~~.\n.~~~~.\n");
    }

    #[test]
    fn renders_bridges_and_walkers() {
        let mut world = river_world();
        let mut events = Vec::new();
        let span = query::detect_bridge(&world, TileCoord::new(1, 1), BridgeKind::Land)
            .expect("bridge detected");
        apply(&mut world, Command::CommitBridge { span }, &mut events);
        let offset = query::grid_offset(&world, TileCoord::new(2, 1)).expect("tile inside map");
        apply(
            &mut world,
            Command::PlaceWalker {
                offset,
                walker: WalkerId::new(1),
            },
            &mut events,
        );

        assert_eq!(render(&world), ".~~~~.\n.o@-o.\n.~~~~.\n");
    }
}
