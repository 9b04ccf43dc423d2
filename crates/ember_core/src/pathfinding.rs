//! Grid pathfinding using the A* algorithm.
//!
//! Searches are always run on behalf of a specific unit: the unit's kind
//! decides which terrain the search may enter and what leaving a cell
//! costs. The result is a sequence of cardinal moves, never raw cells —
//! movement events only consume directions.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::grid::{Coord, Direction, Grid};
use crate::units::{Unit, UnitKind};

/// A node in the A* open set priority queue.
///
/// Stale duplicates are allowed: a cell may sit in the heap several times
/// with different f-scores, and only the closed-set check on pop prevents
/// re-expansion. A decrease-key structure would change nothing observable
/// here, so the heap stays plain.
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    /// Grid coordinates.
    coord: Coord,
    /// f = g + h for this entry at push time.
    f: f64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.f.total_cmp(&other.f) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so reverse the comparison for
        // min-heap behavior. Ties break arbitrarily.
        other.f.total_cmp(&self.f)
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Straight-line distance between two cells, in cell-count units.
///
/// Admissible for this cost model: every legal move costs at least 1.
#[inline]
fn euclidean(a: Coord, b: Coord) -> f64 {
    let dr = f64::from(a.row) - f64::from(b.row);
    let dc = f64::from(a.col) - f64::from(b.col);
    (dr * dr + dc * dc).sqrt()
}

/// Cost of leaving a cell, by unit kind and the departed cell's terrain.
///
/// The cost belongs to the cell being departed, matching the
/// cost-so-far accumulation, not to the destination cell.
#[must_use]
pub fn departure_cost(kind: UnitKind, grid: &Grid, from: Coord) -> u32 {
    use crate::grid::Terrain;
    match (kind, grid.terrain(from)) {
        (UnitKind::Legged, Some(Terrain::Rock)) => 3,
        (UnitKind::Tracked, Some(Terrain::Forest)) => 2,
        _ => 1,
    }
}

/// Find the cheapest path from the unit's position to `destination`.
///
/// Returns the path as cardinal moves, empty when the unit already
/// stands on the destination. Returns `None` when no path exists — a
/// normal result that callers handle by skipping the candidate.
///
/// If the unit's kind cannot stand on the destination terrain at all,
/// the search fails immediately without exploring anything.
#[must_use]
pub fn find_path(grid: &Grid, unit: &Unit, destination: Coord) -> Option<Vec<Direction>> {
    let kind = unit.kind();
    let dest_terrain = grid.terrain(destination)?;
    if !kind.accessible(dest_terrain) {
        return None;
    }

    let start = unit.position;
    let mut open_set: BinaryHeap<OpenNode> = BinaryHeap::new();
    let mut closed: HashSet<Coord> = HashSet::new();
    let mut came_from: HashMap<Coord, Coord> = HashMap::new();
    let mut g_score: HashMap<Coord, u32> = HashMap::new();

    g_score.insert(start, 0);
    open_set.push(OpenNode {
        coord: start,
        f: euclidean(start, destination),
    });

    while let Some(current) = open_set.pop() {
        let coord = current.coord;
        // A stale duplicate of an already-expanded cell; skip it.
        if closed.contains(&coord) {
            continue;
        }

        if coord == destination {
            return Some(reconstruct_moves(&came_from, start, destination));
        }

        closed.insert(coord);

        let current_g = g_score.get(&coord).copied().unwrap_or(u32::MAX);
        let step_cost = departure_cost(kind, grid, coord);

        for dir in Direction::ALL {
            let Some(next) = grid.neighbor(coord, dir) else {
                continue;
            };
            if closed.contains(&next) {
                continue;
            }
            let Some(terrain) = grid.terrain(next) else {
                continue;
            };
            if !kind.accessible(terrain) {
                continue;
            }

            let tentative_g = current_g + step_cost;
            let neighbor_g = g_score.get(&next).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(next, coord);
                g_score.insert(next, tentative_g);
                open_set.push(OpenNode {
                    coord: next,
                    f: f64::from(tentative_g) + euclidean(next, destination),
                });
            }
        }
    }

    // Open set exhausted: no path.
    None
}

/// Walk `came_from` back from the destination and convert consecutive
/// cell deltas into cardinal moves.
fn reconstruct_moves(
    came_from: &HashMap<Coord, Coord>,
    start: Coord,
    destination: Coord,
) -> Vec<Direction> {
    let mut cells = vec![destination];
    let mut current = destination;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                cells.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    cells.reverse();

    let mut moves = Vec::with_capacity(cells.len().saturating_sub(1));
    for pair in cells.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let step = if to.col == from.col + 1 {
            Direction::East
        } else if to.col + 1 == from.col {
            Direction::West
        } else if to.row == from.row + 1 {
            Direction::South
        } else {
            Direction::North
        };
        moves.push(step);
    }
    moves
}

/// Re-apply a move sequence from a starting cell.
///
/// Used by tests and by callers that need the cell a path ends on.
/// Returns `None` if any step leaves the grid.
#[must_use]
pub fn walk_path(grid: &Grid, from: Coord, path: &[Direction]) -> Option<Coord> {
    let mut cursor = from;
    for &step in path {
        cursor = grid.neighbor(cursor, step)?;
    }
    Some(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Terrain;
    use crate::units::UnitKind;

    fn unit_at(kind: UnitKind, row: u32, col: u32) -> Unit {
        Unit::new(kind, Coord::new(row, col))
    }

    #[test]
    fn test_straight_path() {
        let grid = Grid::filled(5, 5, 10, Terrain::Open);
        let unit = unit_at(UnitKind::Wheeled, 2, 0);

        let path = find_path(&grid, &unit, Coord::new(2, 4)).unwrap();
        assert_eq!(path.len(), 4);
        assert!(path.iter().all(|&d| d == Direction::East));
    }

    #[test]
    fn test_path_lands_on_destination() {
        let mut grid = Grid::filled(8, 8, 10, Terrain::Open);
        for row in 1..8 {
            grid.set_terrain(Coord::new(row, 4), Terrain::Rock);
        }
        let unit = unit_at(UnitKind::Wheeled, 7, 0);
        let goal = Coord::new(7, 7);

        let path = find_path(&grid, &unit, goal).unwrap();
        assert_eq!(walk_path(&grid, unit.position, &path), Some(goal));
    }

    #[test]
    fn test_same_cell_gives_empty_path() {
        let grid = Grid::filled(3, 3, 10, Terrain::Open);
        let unit = unit_at(UnitKind::Legged, 1, 1);

        let path = find_path(&grid, &unit, Coord::new(1, 1)).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_forbidden_destination_short_circuits() {
        let mut grid = Grid::filled(3, 3, 10, Terrain::Open);
        grid.set_terrain(Coord::new(0, 2), Terrain::Water);
        let unit = unit_at(UnitKind::Legged, 0, 0);

        assert!(find_path(&grid, &unit, Coord::new(0, 2)).is_none());
    }

    #[test]
    fn test_no_path_through_blocking_terrain() {
        let mut grid = Grid::filled(5, 5, 10, Terrain::Open);
        for row in 0..5 {
            grid.set_terrain(Coord::new(row, 2), Terrain::Water);
        }
        let unit = unit_at(UnitKind::Tracked, 2, 0);

        assert!(find_path(&grid, &unit, Coord::new(2, 4)).is_none());
    }

    #[test]
    fn test_aerial_crosses_everything() {
        let mut grid = Grid::filled(5, 5, 10, Terrain::Open);
        for row in 0..5 {
            grid.set_terrain(Coord::new(row, 2), Terrain::Water);
        }
        let unit = unit_at(UnitKind::Aerial, 2, 0);

        let path = find_path(&grid, &unit, Coord::new(2, 4)).unwrap();
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_wheeled_avoids_forest() {
        let mut grid = Grid::filled(3, 3, 10, Terrain::Open);
        grid.set_terrain(Coord::new(0, 1), Terrain::Forest);
        let unit = unit_at(UnitKind::Wheeled, 0, 0);

        let path = find_path(&grid, &unit, Coord::new(0, 2)).unwrap();
        // Forest at (0,1) forces a detour through row 1.
        assert_eq!(path.len(), 4);
        let mut cursor = unit.position;
        for &step in &path {
            cursor = grid.neighbor(cursor, step).unwrap();
            assert_ne!(grid.terrain(cursor), Some(Terrain::Forest));
        }
    }

    #[test]
    fn test_tracked_prefers_open_over_forest() {
        // Two-row corridor: top row forest, bottom row open. Leaving a
        // forest cell costs a tracked unit 2, so the open row wins.
        let mut grid = Grid::filled(2, 6, 10, Terrain::Open);
        for col in 1..5 {
            grid.set_terrain(Coord::new(0, col), Terrain::Forest);
        }
        let unit = unit_at(UnitKind::Tracked, 0, 0);

        let path = find_path(&grid, &unit, Coord::new(0, 5)).unwrap();
        assert_eq!(path.first(), Some(&Direction::South));
        assert_eq!(path.last(), Some(&Direction::North));
    }

    #[test]
    fn test_prefix_costs_non_decreasing() {
        let mut grid = Grid::filled(6, 6, 10, Terrain::Open);
        grid.set_terrain(Coord::new(2, 2), Terrain::Rock);
        grid.set_terrain(Coord::new(3, 2), Terrain::Rock);
        let unit = unit_at(UnitKind::Legged, 0, 0);

        let path = find_path(&grid, &unit, Coord::new(5, 5)).unwrap();
        let mut cursor = unit.position;
        let mut total = 0;
        for &step in &path {
            let cost = departure_cost(unit.kind(), &grid, cursor);
            assert!(cost >= 1);
            total += cost;
            cursor = grid.neighbor(cursor, step).unwrap();
        }
        assert!(total >= path.len() as u32);
    }

    #[test]
    fn test_determinism() {
        let mut grid = Grid::filled(12, 12, 10, Terrain::Open);
        for row in 3..9 {
            grid.set_terrain(Coord::new(row, 6), Terrain::Water);
        }
        let unit = unit_at(UnitKind::Wheeled, 5, 1);
        let goal = Coord::new(5, 10);

        let first = find_path(&grid, &unit, goal).unwrap();
        for _ in 0..3 {
            assert_eq!(find_path(&grid, &unit, goal).unwrap(), first);
        }
    }
}
