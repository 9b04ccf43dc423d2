//! The shared simulation state: grid, units, active fires, water cells.
//!
//! Exactly one [`WorldState`] exists per run. It is threaded explicitly
//! through event execution and the dispatcher rather than living in a
//! process-wide static, and is replaced wholesale on reset.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::grid::{Coord, Grid};
use crate::units::{Unit, UnitId};

/// Identifier for a fire, unique for the lifetime of a run.
///
/// Fires are removed from the active set when extinguished, so positions
/// in the fire list are unstable; events hold this id instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FireId(u32);

impl FireId {
    /// Create a fire id from its raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fire#{}", self.0)
    }
}

/// An active fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fire {
    /// Stable identifier.
    pub id: FireId,
    /// Cell the fire burns on. Several fires may share a cell (spread
    /// does not check for an existing fire before spawning one).
    pub position: Coord,
    /// Remaining water demand in liters; greater than zero while the
    /// fire is in the active set.
    pub remaining: u32,
    /// True while some unit's in-flight event chain targets this fire.
    pub assigned: bool,
}

impl Fire {
    /// Create an unassigned fire.
    #[must_use]
    pub const fn new(id: FireId, position: Coord, remaining: u32) -> Self {
        Self {
            id,
            position,
            remaining,
            assigned: false,
        }
    }
}

/// The single mutable aggregate shared by events and the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Static terrain.
    pub grid: Grid,
    /// All units, indexed by [`UnitId`]. Never shrinks.
    pub units: Vec<Unit>,
    /// Active fires, in creation order.
    pub fires: Vec<Fire>,
    /// Every water cell of the grid, in load order.
    pub water_cells: Vec<Coord>,
    /// Next fire id to assign.
    next_fire_id: u32,
}

impl WorldState {
    /// Create a world with no units or fires yet.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        let water_cells = collect_water_cells(&grid);
        Self {
            grid,
            units: Vec::new(),
            fires: Vec::new(),
            water_cells,
            next_fire_id: 0,
        }
    }

    /// Add a unit, returning its id.
    pub fn add_unit(&mut self, unit: Unit) -> UnitId {
        self.units.push(unit);
        self.units.len() - 1
    }

    /// Spawn a fire, returning its id.
    pub fn spawn_fire(&mut self, position: Coord, remaining: u32) -> FireId {
        let id = FireId::new(self.next_fire_id);
        self.next_fire_id += 1;
        self.fires.push(Fire::new(id, position, remaining));
        id
    }

    /// Look up a unit.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidState`] for an unknown id.
    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.units
            .get(id)
            .ok_or_else(|| SimError::InvalidState(format!("unknown unit id {id}")))
    }

    /// Look up a unit mutably.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidState`] for an unknown id.
    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units
            .get_mut(id)
            .ok_or_else(|| SimError::InvalidState(format!("unknown unit id {id}")))
    }

    /// The active fire with the given id, if it still burns.
    #[must_use]
    pub fn fire(&self, id: FireId) -> Option<&Fire> {
        self.fires.iter().find(|f| f.id == id)
    }

    /// Mutable access to an active fire.
    #[must_use]
    pub fn fire_mut(&mut self, id: FireId) -> Option<&mut Fire> {
        self.fires.iter_mut().find(|f| f.id == id)
    }

    /// First active fire burning on the given cell, if any.
    #[must_use]
    pub fn fire_at(&self, cell: Coord) -> Option<FireId> {
        self.fires.iter().find(|f| f.position == cell).map(|f| f.id)
    }

    /// Remove a fire from the active set.
    pub fn remove_fire(&mut self, id: FireId) -> Option<Fire> {
        let index = self.fires.iter().position(|f| f.id == id)?;
        Some(self.fires.remove(index))
    }

    /// Whether any fire is still burning.
    #[must_use]
    pub fn has_active_fires(&self) -> bool {
        !self.fires.is_empty()
    }

    /// Serialize the whole state for snapshot comparison.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidState`] if serialization fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SimError::InvalidState(format!("Failed to serialize world: {e}")))
    }

    /// Restore a state from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidState`] if deserialization fails.
    pub fn from_snapshot(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| SimError::InvalidState(format!("Failed to deserialize world: {e}")))
    }

    /// Hash of the current state, for determinism checks.
    ///
    /// Two identical worlds produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        // Hash the canonical serialized form; f64 speeds keep Hash off
        // the struct itself.
        if let Ok(bytes) = self.snapshot() {
            bytes.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Scan the grid for water cells, in row-major order.
fn collect_water_cells(grid: &Grid) -> Vec<Coord> {
    let mut cells = Vec::new();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let coord = Coord::new(row, col);
            if grid.terrain(coord) == Some(crate::grid::Terrain::Water) {
                cells.push(coord);
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Terrain;
    use crate::units::UnitKind;

    fn small_world() -> WorldState {
        let mut grid = Grid::filled(3, 3, 10, Terrain::Open);
        grid.set_terrain(Coord::new(2, 2), Terrain::Water);
        WorldState::new(grid)
    }

    #[test]
    fn test_water_cells_collected() {
        let world = small_world();
        assert_eq!(world.water_cells, vec![Coord::new(2, 2)]);
    }

    #[test]
    fn test_fire_ids_are_unique() {
        let mut world = small_world();
        let a = world.spawn_fire(Coord::new(0, 0), 100);
        let b = world.spawn_fire(Coord::new(0, 0), 100);
        assert_ne!(a, b);
        // Duplicate fires on one cell are allowed; lookup finds the first.
        assert_eq!(world.fire_at(Coord::new(0, 0)), Some(a));
    }

    #[test]
    fn test_remove_fire() {
        let mut world = small_world();
        let id = world.spawn_fire(Coord::new(1, 1), 500);
        assert!(world.has_active_fires());

        let removed = world.remove_fire(id).unwrap();
        assert_eq!(removed.remaining, 500);
        assert!(!world.has_active_fires());
        assert!(world.fire(id).is_none());
    }

    #[test]
    fn test_unknown_unit_is_invalid_state() {
        let world = small_world();
        assert!(world.unit(3).is_err());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut world = small_world();
        world.add_unit(Unit::new(UnitKind::Tracked, Coord::new(0, 1)));
        world.spawn_fire(Coord::new(1, 0), 1500);

        let bytes = world.snapshot().unwrap();
        let restored = WorldState::from_snapshot(&bytes).unwrap();
        assert_eq!(world, restored);
        assert_eq!(world.state_hash(), restored.state_hash());
    }
}
