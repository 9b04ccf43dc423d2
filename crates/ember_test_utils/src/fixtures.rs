//! Fixtures for building test worlds without a description file.

use ember_core::grid::{Coord, Grid, Terrain};
use ember_core::render::RenderSink;
use ember_core::units::UnitId;
use ember_core::world::{FireId, WorldState};

/// Build a grid from character rows.
///
/// Legend: `.` Open, `H` Habitat, `F` Forest, `R` Rock, `W` Water.
///
/// # Panics
///
/// Panics on an unknown character or ragged rows, since fixtures are
/// test-author input.
#[must_use]
pub fn grid_from_rows(rows: &[&str], cell_size: u32) -> Grid {
    assert!(!rows.is_empty(), "fixture grid needs at least one row");
    let cols = rows[0].len();
    let mut cells = Vec::with_capacity(rows.len() * cols);
    for row in rows {
        assert_eq!(row.len(), cols, "fixture grid rows must be equal length");
        for ch in row.chars() {
            cells.push(match ch {
                '.' => Terrain::Open,
                'H' => Terrain::Habitat,
                'F' => Terrain::Forest,
                'R' => Terrain::Rock,
                'W' => Terrain::Water,
                other => panic!("unknown fixture terrain character '{other}'"),
            });
        }
    }
    Grid::new(rows.len() as u32, cols as u32, cell_size, cells)
}

/// A world over a character-map grid, with no units or fires yet.
#[must_use]
pub fn world_from_rows(rows: &[&str], cell_size: u32) -> WorldState {
    WorldState::new(grid_from_rows(rows, cell_size))
}

/// A world over an all-open grid.
#[must_use]
pub fn open_world(rows: u32, cols: u32, cell_size: u32) -> WorldState {
    WorldState::new(Grid::filled(rows, cols, cell_size, Terrain::Open))
}

/// Render sink that records every notification, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Cells reported for redraw.
    pub cells: Vec<Coord>,
    /// Units reported for redraw.
    pub units: Vec<UnitId>,
    /// Fires reported for redraw.
    pub fires: Vec<FireId>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of notifications received.
    #[must_use]
    pub fn total(&self) -> usize {
        self.cells.len() + self.units.len() + self.fires.len()
    }
}

impl RenderSink for RecordingSink {
    fn redraw_cell(&mut self, cell: Coord) {
        self.cells.push(cell);
    }

    fn redraw_unit(&mut self, unit: UnitId) {
        self.units.push(unit);
    }

    fn redraw_fire(&mut self, fire: FireId) {
        self.fires.push(fire);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_from_rows_legend() {
        let grid = grid_from_rows(&[".HF", "RW."], 10);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.terrain(Coord::new(0, 1)), Some(Terrain::Habitat));
        assert_eq!(grid.terrain(Coord::new(1, 1)), Some(Terrain::Water));
    }

    #[test]
    fn test_world_from_rows_collects_water() {
        let world = world_from_rows(&["W.", ".W"], 10);
        assert_eq!(world.water_cells, vec![Coord::new(0, 0), Coord::new(1, 1)]);
    }
}
