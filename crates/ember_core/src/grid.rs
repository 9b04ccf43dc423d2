//! Static terrain grid with cardinal-neighbor queries.
//!
//! The grid is immutable once the world is loaded: events and the
//! dispatcher only ever read from it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terrain kinds for grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// Open ground, passable by every unit kind.
    #[default]
    Open,
    /// Built-up area, passable by every unit kind.
    Habitat,
    /// Forest, impassable to wheeled units.
    Forest,
    /// Rocky ground, passable only to legged and aerial units.
    Rock,
    /// Water, passable only to aerial units; refill source for the rest.
    Water,
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "OPEN",
            Self::Habitat => "HABITAT",
            Self::Forest => "FOREST",
            Self::Rock => "ROCK",
            Self::Water => "WATER",
        };
        write!(f, "{name}")
    }
}

/// Cardinal movement directions.
///
/// The declaration order (North, South, East, West) is the order used by
/// every direction scan in the crate; searches that iterate neighbors
/// depend on it for reproducible results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward row 0.
    North,
    /// Toward the last row.
    South,
    /// Toward the last column.
    East,
    /// Toward column 0.
    West,
}

impl Direction {
    /// All four directions, in scan order.
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "NORTH",
            Self::South => "SOUTH",
            Self::East => "EAST",
            Self::West => "WEST",
        };
        write!(f, "{name}")
    }
}

/// Grid cell coordinates, `(row, col)`, 0-indexed.
///
/// Cell identity is coordinates alone: two coords naming the same
/// `(row, col)` are interchangeable everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Row index (0 at the top).
    pub row: u32,
    /// Column index (0 at the left).
    pub col: u32,
}

impl Coord {
    /// Create a coordinate pair.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Rectangular terrain grid.
///
/// Stores cells in row-major order plus the edge length of a cell in
/// meters (used to convert per-cell speeds into traversal times).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Number of rows.
    rows: u32,
    /// Number of columns.
    cols: u32,
    /// Cell edge length in meters.
    cell_size: u32,
    /// Cell terrain stored in row-major order.
    cells: Vec<Terrain>,
}

impl Grid {
    /// Create a grid from row-major cell data.
    ///
    /// # Panics
    ///
    /// Panics if `rows` or `cols` is zero, or if `cells` does not contain
    /// exactly `rows * cols` entries.
    #[must_use]
    pub fn new(rows: u32, cols: u32, cell_size: u32, cells: Vec<Terrain>) -> Self {
        assert!(rows > 0, "Grid rows must be positive");
        assert!(cols > 0, "Grid cols must be positive");
        assert_eq!(
            cells.len(),
            (rows as usize) * (cols as usize),
            "Grid cell data must be rectangular"
        );
        Self {
            rows,
            cols,
            cell_size,
            cells,
        }
    }

    /// Create a grid with every cell set to the same terrain.
    #[must_use]
    pub fn filled(rows: u32, cols: u32, cell_size: u32, terrain: Terrain) -> Self {
        let cell_count = (rows as usize) * (cols as usize);
        Self::new(rows, cols, cell_size, vec![terrain; cell_count])
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Cell edge length in meters.
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Convert coordinates to a row-major index.
    #[inline]
    fn index(&self, coord: Coord) -> usize {
        (coord.row as usize) * (self.cols as usize) + (coord.col as usize)
    }

    /// Check whether coordinates fall inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// Terrain at the given coordinates.
    /// Returns `None` if out of bounds.
    #[must_use]
    pub fn terrain(&self, coord: Coord) -> Option<Terrain> {
        if self.in_bounds(coord) {
            Some(self.cells[self.index(coord)])
        } else {
            None
        }
    }

    /// Overwrite terrain at the given coordinates.
    /// Returns `false` if out of bounds.
    ///
    /// Only world construction (loader, test fixtures) may call this;
    /// the grid is read-only once a simulation owns it.
    pub fn set_terrain(&mut self, coord: Coord, terrain: Terrain) -> bool {
        if self.in_bounds(coord) {
            let index = self.index(coord);
            self.cells[index] = terrain;
            true
        } else {
            false
        }
    }

    /// The adjacent cell in the given direction, or `None` at the edge.
    #[must_use]
    pub fn neighbor(&self, coord: Coord, direction: Direction) -> Option<Coord> {
        let Coord { row, col } = coord;
        let next = match direction {
            Direction::North => Coord::new(row.checked_sub(1)?, col),
            Direction::South => Coord::new(row + 1, col),
            Direction::East => Coord::new(row, col + 1),
            Direction::West => Coord::new(row, col.checked_sub(1)?),
        };
        if self.in_bounds(next) {
            Some(next)
        } else {
            None
        }
    }
}
