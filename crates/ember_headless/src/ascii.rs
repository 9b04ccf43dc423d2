//! ASCII rendering of world state for terminal inspection.

use ember_core::grid::{Coord, Terrain};
use ember_core::units::UnitKind;
use ember_core::world::WorldState;

/// Terrain legend character.
const fn terrain_char(terrain: Terrain) -> char {
    match terrain {
        Terrain::Open => '.',
        Terrain::Habitat => 'h',
        Terrain::Forest => 'f',
        Terrain::Rock => 'r',
        Terrain::Water => '~',
    }
}

/// Unit legend character.
const fn unit_char(kind: UnitKind) -> char {
    match kind {
        UnitKind::Aerial => 'A',
        UnitKind::Wheeled => 'W',
        UnitKind::Legged => 'L',
        UnitKind::Tracked => 'T',
    }
}

/// Render the world as an ASCII map.
///
/// Units draw over fires, fires over terrain; a cell with several
/// occupants shows the last unit standing on it.
#[must_use]
pub fn render_world(state: &WorldState) -> String {
    let grid = &state.grid;
    let mut out = String::with_capacity(((grid.cols() + 1) * grid.rows()) as usize);

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let coord = Coord::new(row, col);
            let mut ch = grid
                .terrain(coord)
                .map_or(' ', terrain_char);
            if state.fire_at(coord).is_some() {
                ch = '*';
            }
            for unit in &state.units {
                if unit.position == coord {
                    ch = unit_char(unit.kind());
                }
            }
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::grid::Grid;
    use ember_core::units::Unit;

    #[test]
    fn test_render_overlays() {
        let mut grid = Grid::filled(2, 3, 10, Terrain::Open);
        grid.set_terrain(Coord::new(0, 2), Terrain::Water);
        let mut state = WorldState::new(grid);
        state.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(1, 0)));
        state.spawn_fire(Coord::new(0, 0), 100);

        let rendered = render_world(&state);
        assert_eq!(rendered, "*.~\nW..\n");
    }
}
