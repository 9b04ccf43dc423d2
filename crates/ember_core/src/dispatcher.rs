//! Fire-to-unit assignment policies.
//!
//! The scheduler invokes one of three interchangeable policies after
//! draining each tick's events. The policies differ in eligibility rules
//! and in how many assignments one invocation may make; those
//! differences are contract, not accident — see each function.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event::{Event, PostMove};
use crate::grid::{Direction, Terrain};
use crate::pathfinding::find_path;
use crate::scheduler::{EventQueue, Tick};
use crate::units::{UnitId, UnitKind};
use crate::world::WorldState;

/// Assignment strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchPolicy {
    /// First idle unit with any path takes each unscanned fire.
    Simple,
    /// Globally cheapest (unit, fire) estimate, one assignment per call.
    Advanced,
    /// Slowest-first assignment plus a reinforcement pass.
    Reflective,
}

impl fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simple => "simple",
            Self::Advanced => "advanced",
            Self::Reflective => "reflective",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DispatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Self::Simple),
            "advanced" => Ok(Self::Advanced),
            "reflective" => Ok(Self::Reflective),
            other => Err(format!(
                "unknown dispatch policy '{other}' (expected simple, advanced or reflective)"
            )),
        }
    }
}

/// Run one dispatcher invocation under the given policy.
pub fn dispatch(policy: DispatchPolicy, state: &mut WorldState, queue: &mut EventQueue, now: Tick) {
    match policy {
        DispatchPolicy::Simple => dispatch_simple(state, queue, now),
        DispatchPolicy::Advanced => dispatch_advanced(state, queue, now),
        DispatchPolicy::Reflective => dispatch_reflective(state, queue, now),
    }
}

/// Queue the unit's approach to its target and the intervention after it.
fn assign_move(state: &mut WorldState, queue: &mut EventQueue, now: Tick, unit: UnitId, path: Vec<Direction>) {
    state.units[unit].pending_path = path.into();
    queue.schedule(
        now + 1,
        Event::StartMove {
            unit,
            direction: None,
            after: Some(PostMove::Intervene),
        },
        state,
    );
}

/// Greedy policy: for each unassigned fire in list order, the first idle
/// unit with any path is assigned — with no regard for its remaining
/// water. One invocation may assign several fires.
pub fn dispatch_simple(state: &mut WorldState, queue: &mut EventQueue, now: Tick) {
    for f in 0..state.fires.len() {
        if state.fires[f].assigned {
            continue;
        }
        let fire_cell = state.fires[f].position;
        for u in 0..state.units.len() {
            if state.units[u].busy {
                continue;
            }
            let Some(path) = find_path(&state.grid, &state.units[u], fire_cell) else {
                continue;
            };
            tracing::debug!(unit = u, fire = %state.fires[f].id, "simple dispatch assignment");
            state.fires[f].assigned = true;
            assign_move(state, queue, now, u, path);
            break;
        }
    }
}

/// Travel-time policy: scans unassigned fires in order, tracking the
/// single cheapest (unit, path) candidate seen so far across the whole
/// scan — the best-so-far is not reset per fire — and returns as soon as
/// one assignment is made. At most one assignment per invocation; only
/// idle units with water qualify.
pub fn dispatch_advanced(state: &mut WorldState, queue: &mut EventQueue, now: Tick) {
    let mut best_time = u64::MAX;
    let mut best: Option<(UnitId, Vec<Direction>)> = None;

    for f in 0..state.fires.len() {
        if state.fires[f].assigned {
            continue;
        }
        let fire_cell = state.fires[f].position;
        for u in 0..state.units.len() {
            let unit = &state.units[u];
            if unit.busy || unit.volume == 0 {
                continue;
            }
            let Some(path) = find_path(&state.grid, unit, fire_cell) else {
                continue;
            };
            let time = unit.travel_time(&path, &state.grid);
            if time < best_time {
                best_time = time;
                best = Some((u, path));
            }
        }
        if let Some((u, path)) = best.take() {
            tracing::debug!(unit = u, fire = %state.fires[f].id, time = best_time, "advanced dispatch assignment");
            state.fires[f].assigned = true;
            assign_move(state, queue, now, u, path);
            return;
        }
    }
}

/// Slowest-first policy with a reinforcement pass.
///
/// First pass walks fires and speed-sorted idle units with water in
/// lockstep: the fire cursor advances past already-assigned fires, and
/// the first unit whose nearest-fire search yields a usable path is
/// assigned, ending the pass. The second pass sends any remaining idle
/// units with water toward fires that are already assigned, as
/// reinforcement, until units or eligible fires run out.
pub fn dispatch_reflective(state: &mut WorldState, queue: &mut EventQueue, now: Tick) {
    let mut order: Vec<UnitId> = (0..state.units.len()).collect();
    order.sort_by(|&a, &b| {
        state.units[a]
            .nominal_speed()
            .total_cmp(&state.units[b].nominal_speed())
    });

    let mut fire_cursor = 0;
    for &u in &order {
        if state.units[u].busy || state.units[u].volume == 0 {
            continue;
        }
        if fire_cursor >= state.fires.len() {
            break;
        }
        if state.fires[fire_cursor].assigned {
            fire_cursor += 1;
        } else {
            let path = nearest_fire(state, u);
            if !path.is_empty() {
                tracing::debug!(unit = u, "reflective dispatch assignment");
                assign_move(state, queue, now, u, path);
                break;
            }
        }
    }

    for &u in &order {
        if state.units[u].busy || state.units[u].volume == 0 {
            continue;
        }
        for f in 0..state.fires.len() {
            if state.fires[f].assigned {
                let path = nearest_fire(state, u);
                if !path.is_empty() {
                    tracing::debug!(unit = u, "reflective reinforcement assignment");
                    assign_move(state, queue, now, u, path);
                    break;
                }
            }
        }
    }
}

/// Path to the nearest fire, searching every fire — assigned or not.
///
/// Marks the winning fire assigned as a side effect, even when the
/// returned path is empty and the caller ends up assigning nobody; with
/// no usable path at all the first listed fire is the default winner.
/// Returns an empty path when nothing usable was found.
pub fn nearest_fire(state: &mut WorldState, unit: UnitId) -> Vec<Direction> {
    let Some(u) = state.units.get(unit) else {
        return Vec::new();
    };
    let Some(first) = state.fires.first() else {
        return Vec::new();
    };

    let mut winner = first.id;
    let mut best_len = usize::MAX;
    let mut best_path = Vec::new();
    for fire in &state.fires {
        if let Some(path) = find_path(&state.grid, u, fire.position) {
            if path.len() < best_len {
                best_len = path.len();
                best_path = path;
                winner = fire.id;
            }
        }
    }

    if let Some(f) = state.fire_mut(winner) {
        f.assigned = true;
    }
    best_path
}

/// Route to the nearest reachable water source.
///
/// Aerial units fly straight to a water cell; ground units path to the
/// non-water cardinal neighbors of each water cell, tracking the
/// shortest neighbor path seen across the entire water-cell scan (the
/// tracker is deliberately not reset between cells). Returns an empty
/// path when no source is reachable — including for a ground unit that
/// already stands beside water and needs no route at all.
pub fn nearest_water(state: &WorldState, unit: UnitId) -> Vec<Direction> {
    let Some(u) = state.units.get(unit) else {
        return Vec::new();
    };
    let grid = &state.grid;

    let mut best_len = usize::MAX;
    let mut shore_best_len = usize::MAX;
    let mut best = Vec::new();

    for &water in &state.water_cells {
        let candidate: Vec<Direction> = if u.kind() == UnitKind::Aerial {
            find_path(grid, u, water).unwrap_or_default()
        } else {
            let mut cell_best = Vec::new();
            for dir in Direction::ALL {
                let Some(shore) = grid.neighbor(water, dir) else {
                    continue;
                };
                if grid.terrain(shore) == Some(Terrain::Water) {
                    continue;
                }
                if let Some(path) = find_path(grid, u, shore) {
                    if !path.is_empty() && path.len() < shore_best_len {
                        shore_best_len = path.len();
                        cell_best = path;
                    }
                }
            }
            cell_best
        };
        if !candidate.is_empty() && candidate.len() < best_len {
            best_len = candidate.len();
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Coord, Grid};
    use crate::units::Unit;

    fn open_world(rows: u32, cols: u32) -> WorldState {
        WorldState::new(Grid::filled(rows, cols, 100, Terrain::Open))
    }

    #[test]
    fn test_simple_assigns_every_scannable_fire() {
        let mut world = open_world(4, 4);
        let a = world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 0)));
        let b = world.add_unit(Unit::new(UnitKind::Tracked, Coord::new(3, 3)));
        world.spawn_fire(Coord::new(0, 3), 200);
        world.spawn_fire(Coord::new(3, 0), 200);
        let mut queue = EventQueue::new();

        dispatch_simple(&mut world, &mut queue, 0);

        assert!(world.fires.iter().all(|f| f.assigned));
        assert!(world.units[a].busy);
        assert!(world.units[b].busy);
        assert_eq!(queue.events_at(1).unwrap().len(), 2);
    }

    #[test]
    fn test_simple_ignores_empty_tanks() {
        let mut world = open_world(3, 3);
        let u = world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 0)));
        world.units[u].volume = 0;
        world.spawn_fire(Coord::new(2, 2), 200);
        let mut queue = EventQueue::new();

        dispatch_simple(&mut world, &mut queue, 0);

        // Water plays no role in the simple policy.
        assert!(world.fires[0].assigned);
        assert!(world.units[u].busy);
    }

    #[test]
    fn test_simple_skips_unreachable_fires() {
        let mut world = open_world(3, 3);
        world.grid.set_terrain(Coord::new(2, 2), Terrain::Rock);
        world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 0)));
        world.spawn_fire(Coord::new(2, 2), 200);
        let mut queue = EventQueue::new();

        dispatch_simple(&mut world, &mut queue, 0);

        assert!(!world.fires[0].assigned);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_advanced_assigns_at_most_once() {
        let mut world = open_world(5, 5);
        world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 0)));
        world.add_unit(Unit::new(UnitKind::Tracked, Coord::new(4, 4)));
        world.spawn_fire(Coord::new(0, 4), 200);
        world.spawn_fire(Coord::new(4, 0), 200);
        let mut queue = EventQueue::new();

        dispatch_advanced(&mut world, &mut queue, 0);

        let assigned = world.fires.iter().filter(|f| f.assigned).count();
        assert_eq!(assigned, 1);
        assert_eq!(queue.events_at(1).unwrap().len(), 1);
    }

    #[test]
    fn test_advanced_picks_fastest_arrival() {
        let mut world = open_world(1, 8);
        let near = world.add_unit(Unit::new(UnitKind::Legged, Coord::new(0, 5)));
        let far = world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 0)));
        world.spawn_fire(Coord::new(0, 7), 200);
        let mut queue = EventQueue::new();

        dispatch_advanced(&mut world, &mut queue, 0);

        // Legged: 2 cells at speed 108 vs wheeled: 7 cells at 288.
        // 200/108 beats 700/288.
        assert!(world.units[near].busy);
        assert!(!world.units[far].busy);
    }

    #[test]
    fn test_advanced_requires_water() {
        let mut world = open_world(3, 3);
        let u = world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 0)));
        world.units[u].volume = 0;
        world.spawn_fire(Coord::new(2, 2), 200);
        let mut queue = EventQueue::new();

        dispatch_advanced(&mut world, &mut queue, 0);

        assert!(!world.fires[0].assigned);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reflective_sends_slowest_first() {
        let mut world = open_world(4, 4);
        let fast = world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 0)));
        let slow = world.add_unit(Unit::new(UnitKind::Legged, Coord::new(0, 1)));
        world.spawn_fire(Coord::new(3, 3), 200);
        let mut queue = EventQueue::new();

        dispatch_reflective(&mut world, &mut queue, 0);

        assert!(world.units[slow].busy);
        // The fast unit reinforces the now-assigned fire in pass two.
        assert!(world.units[fast].busy);
        assert!(world.fires[0].assigned);
        assert_eq!(queue.events_at(1).unwrap().len(), 2);
    }

    #[test]
    fn test_nearest_fire_marks_winner_assigned() {
        let mut world = open_world(1, 9);
        let u = world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 4)));
        world.spawn_fire(Coord::new(0, 0), 200);
        world.spawn_fire(Coord::new(0, 6), 200);

        let path = nearest_fire(&mut world, u);

        assert_eq!(path.len(), 2);
        assert!(!world.fires[0].assigned);
        assert!(world.fires[1].assigned);
    }

    #[test]
    fn test_nearest_fire_defaults_to_first_when_unreachable() {
        let mut world = open_world(1, 5);
        world.grid.set_terrain(Coord::new(0, 1), Terrain::Rock);
        let u = world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 0)));
        world.spawn_fire(Coord::new(0, 3), 200);
        world.spawn_fire(Coord::new(0, 4), 200);

        let path = nearest_fire(&mut world, u);

        // No path anywhere, but the first fire still ends up marked.
        assert!(path.is_empty());
        assert!(world.fires[0].assigned);
        assert!(!world.fires[1].assigned);
    }

    #[test]
    fn test_nearest_water_ground_unit_targets_shore() {
        let mut world = {
            let mut grid = Grid::filled(3, 5, 100, Terrain::Open);
            grid.set_terrain(Coord::new(1, 4), Terrain::Water);
            grid.set_terrain(Coord::new(1, 0), Terrain::Water);
            WorldState::new(grid)
        };
        let u = world.add_unit(Unit::new(UnitKind::Tracked, Coord::new(1, 2)));

        let route = nearest_water(&world, u);

        // Either shore is 1 step away; the first water cell scanned wins.
        assert_eq!(route.len(), 1);
    }

    #[test]
    fn test_nearest_water_aerial_lands_on_water() {
        let mut world = {
            let mut grid = Grid::filled(3, 3, 100, Terrain::Open);
            grid.set_terrain(Coord::new(0, 2), Terrain::Water);
            WorldState::new(grid)
        };
        let u = world.add_unit(Unit::new(UnitKind::Aerial, Coord::new(2, 0)));

        let route = nearest_water(&world, u);
        let landing =
            crate::pathfinding::walk_path(&world.grid, world.units[u].position, &route).unwrap();
        assert_eq!(landing, Coord::new(0, 2));
    }

    #[test]
    fn test_nearest_water_beside_shore_yields_empty_route() {
        let mut world = {
            let mut grid = Grid::filled(1, 3, 100, Terrain::Open);
            grid.set_terrain(Coord::new(0, 0), Terrain::Water);
            WorldState::new(grid)
        };
        let u = world.add_unit(Unit::new(UnitKind::Wheeled, Coord::new(0, 1)));

        // Standing on the only shore cell: no route is produced.
        assert!(nearest_water(&world, u).is_empty());
    }

    #[test]
    fn test_nearest_water_none_reachable() {
        let mut world = open_world(3, 3);
        let u = world.add_unit(Unit::new(UnitKind::Tracked, Coord::new(1, 1)));
        assert!(nearest_water(&world, u).is_empty());
    }
}
