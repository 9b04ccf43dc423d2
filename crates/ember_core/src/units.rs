//! Firefighting unit kinds and per-unit mutable state.
//!
//! Unit identity is a closed tagged variant rather than a trait object:
//! the capability rules (terrain access, terrain speed, water amounts)
//! form a small fixed table that should stay exhaustively checkable.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::grid::{Coord, Direction, Grid, Terrain};
use crate::world::Fire;

/// Index of a unit in the world's unit list. Stable for a whole run;
/// units are never removed.
pub type UnitId = usize;

/// Reduced fixed speed of legged units on rock.
const LEGGED_ROCK_SPEED: f64 = 10.0;

/// The four unit kinds.
///
/// Each kind fixes tank capacity, refill and intervention durations, a
/// default nominal speed, a terrain accessibility predicate and the water
/// amounts moved per intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Flying unit: goes anywhere, drops its whole tank at once, refills
    /// only while hovering over water.
    Aerial,
    /// Fast road unit restricted to open and built-up terrain.
    Wheeled,
    /// Walker that handles rock (slowly) and carries a token tank.
    Legged,
    /// Tracked vehicle, slowed by forest, blocked by rock and water.
    Tracked,
}

impl UnitKind {
    /// Default nominal speed for units loaded without an explicit speed.
    #[must_use]
    pub const fn default_speed(self) -> f64 {
        match self {
            Self::Aerial => 360.0,
            Self::Wheeled => 288.0,
            Self::Legged => 108.0,
            Self::Tracked => 216.0,
        }
    }

    /// Tank capacity in liters.
    #[must_use]
    pub const fn tank_capacity(self) -> u32 {
        match self {
            Self::Aerial => 10_000,
            Self::Wheeled => 5_000,
            Self::Legged => 1,
            Self::Tracked => 2_000,
        }
    }

    /// Tank capacity when the unit was configured with a custom speed.
    ///
    /// Aerial units configured this way carry the smaller 5000 L tank;
    /// every other kind keeps its default capacity.
    #[must_use]
    pub const fn custom_speed_capacity(self) -> u32 {
        match self {
            Self::Aerial => 5_000,
            _ => self.tank_capacity(),
        }
    }

    /// Time to refill the tank, in ticks.
    #[must_use]
    pub const fn refill_duration(self) -> u64 {
        match self {
            Self::Aerial => 30 * 60,
            Self::Wheeled => 10 * 60,
            Self::Legged => 1,
            Self::Tracked => 5 * 60,
        }
    }

    /// Time of one intervention pass on a fire, in ticks.
    #[must_use]
    pub const fn intervention_duration(self) -> u64 {
        match self {
            Self::Aerial => 30,
            Self::Wheeled => 5,
            Self::Legged => 1,
            Self::Tracked => 8,
        }
    }

    /// Maximum configurable speed, if this kind caps it.
    #[must_use]
    pub const fn max_custom_speed(self) -> Option<f64> {
        match self {
            Self::Aerial => Some(150.0),
            Self::Tracked => Some(80.0),
            Self::Wheeled | Self::Legged => None,
        }
    }

    /// Whether this kind may stand on (and move through) the terrain.
    ///
    /// The same table gates both pathfinder neighbor expansion and the
    /// destination short-circuit check.
    #[must_use]
    pub const fn accessible(self, terrain: Terrain) -> bool {
        match terrain {
            Terrain::Open | Terrain::Habitat => true,
            Terrain::Forest => !matches!(self, Self::Wheeled),
            Terrain::Rock => matches!(self, Self::Legged | Self::Aerial),
            Terrain::Water => matches!(self, Self::Aerial),
        }
    }

    /// Liters removed from a fire's demand by one intervention.
    /// `None` means the entire current tank volume (aerial drop).
    #[must_use]
    pub const fn intervention_amount(self) -> Option<u32> {
        match self {
            Self::Aerial => None,
            Self::Wheeled | Self::Tracked => Some(100),
            Self::Legged => Some(10),
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Aerial => "AERIAL",
            Self::Wheeled => "WHEELED",
            Self::Legged => "LEGGED",
            Self::Tracked => "TRACKED",
        };
        write!(f, "{name}")
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "AERIAL" => Ok(Self::Aerial),
            "WHEELED" => Ok(Self::Wheeled),
            "LEGGED" => Ok(Self::Legged),
            "TRACKED" => Ok(Self::Tracked),
            other => Err(format!("unknown unit kind '{other}'")),
        }
    }
}

/// One firefighting unit.
///
/// Position and water volume are mutated only by event execution; the
/// busy flag is true from the moment a start event claiming the unit is
/// enqueued until the matching end event runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// The unit's kind, fixing its capability table.
    kind: UnitKind,
    /// Current cell.
    pub position: Coord,
    /// Nominal speed.
    speed: f64,
    /// Tank capacity in liters.
    capacity: u32,
    /// Current water volume, `0 ..= capacity`.
    pub volume: u32,
    /// True while an event chain is in flight for this unit.
    pub busy: bool,
    /// Cardinal moves queued for the next path-following move chain.
    pub pending_path: VecDeque<Direction>,
}

impl Unit {
    /// Create a unit with its kind's default speed and a full tank.
    #[must_use]
    pub fn new(kind: UnitKind, position: Coord) -> Self {
        let capacity = kind.tank_capacity();
        Self {
            kind,
            position,
            speed: kind.default_speed(),
            capacity,
            volume: capacity,
            busy: false,
            pending_path: VecDeque::new(),
        }
    }

    /// Create a unit with an explicit nominal speed.
    ///
    /// Legged units ignore the requested speed entirely and come out
    /// identical to [`Unit::new`]. Aerial and tracked units reject speeds
    /// above their caps; aerial units configured this way carry the
    /// smaller tank.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidState`] if the speed exceeds the kind's cap.
    pub fn with_speed(kind: UnitKind, position: Coord, speed: f64) -> Result<Self> {
        if kind == UnitKind::Legged {
            return Ok(Self::new(kind, position));
        }
        if let Some(cap) = kind.max_custom_speed() {
            if speed > cap {
                return Err(SimError::InvalidState(format!(
                    "{kind} speed must not exceed {cap}"
                )));
            }
        }
        let capacity = kind.custom_speed_capacity();
        Ok(Self {
            kind,
            position,
            speed,
            capacity,
            volume: capacity,
            busy: false,
            pending_path: VecDeque::new(),
        })
    }

    /// The unit's kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Nominal speed, independent of terrain.
    #[must_use]
    pub const fn nominal_speed(&self) -> f64 {
        self.speed
    }

    /// Tank capacity in liters.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Effective speed on the given terrain.
    #[must_use]
    pub fn speed_on(&self, terrain: Terrain) -> f64 {
        match (self.kind, terrain) {
            (UnitKind::Legged, Terrain::Rock) => LEGGED_ROCK_SPEED,
            (UnitKind::Tracked, Terrain::Forest) => self.speed / 2.0,
            _ => self.speed,
        }
    }

    /// Seconds needed to traverse one cell starting from `from`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapabilityViolation`] if the unit cannot move on
    /// that terrain (zero effective speed), or [`SimError::InvalidState`]
    /// if `from` is outside the grid.
    pub fn traverse_secs(&self, grid: &Grid, from: Coord) -> Result<f64> {
        let terrain = grid
            .terrain(from)
            .ok_or_else(|| SimError::InvalidState(format!("cell {from} outside the grid")))?;
        let speed = self.speed_on(terrain);
        if speed == 0.0 {
            return Err(SimError::CapabilityViolation(format!(
                "{} unit cannot move on {terrain}",
                self.kind
            )));
        }
        Ok(f64::from(grid.cell_size()) / speed)
    }

    /// Dispatcher-only travel time estimate for a whole path, in seconds.
    ///
    /// Averages the per-departure-cell speeds along the path and divides
    /// the total distance by that mean. This is an approximation distinct
    /// from the per-step timing used to schedule movement events; the two
    /// are intentionally not unified.
    #[must_use]
    pub fn travel_time(&self, path: &[Direction], grid: &Grid) -> u64 {
        if path.is_empty() {
            return 0;
        }
        let distance = f64::from(grid.cell_size()) * path.len() as f64;
        if self.kind == UnitKind::Aerial {
            return (distance / self.speed) as u64;
        }
        let mut speed_sum = 0.0;
        let mut cursor = self.position;
        for &step in path {
            if let Some(terrain) = grid.terrain(cursor) {
                speed_sum += self.speed_on(terrain);
            }
            match grid.neighbor(cursor, step) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        let mean_speed = speed_sum / path.len() as f64;
        (distance / mean_speed) as u64
    }

    /// Whether any cardinal neighbor of `at` is water.
    fn beside_water(&self, grid: &Grid, at: Coord) -> bool {
        Direction::ALL.iter().any(|&dir| {
            grid.neighbor(at, dir)
                .and_then(|n| grid.terrain(n))
                .is_some_and(|t| t == Terrain::Water)
        })
    }

    /// Refill the tank to capacity.
    ///
    /// Aerial units must be positioned on a water cell; ground kinds must
    /// be cardinally adjacent to one.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapabilityViolation`] when the unit is not
    /// positioned to refill.
    pub fn refill(&mut self, grid: &Grid) -> Result<()> {
        let allowed = match self.kind {
            UnitKind::Aerial => grid.terrain(self.position) == Some(Terrain::Water),
            _ => self.beside_water(grid, self.position),
        };
        if !allowed {
            return Err(SimError::CapabilityViolation(format!(
                "{} unit at {} is not positioned to refill",
                self.kind, self.position
            )));
        }
        self.volume = self.capacity;
        Ok(())
    }

    /// Apply one intervention pass to a fire, consuming water.
    pub fn intervene(&mut self, fire: &mut Fire) {
        match self.kind.intervention_amount() {
            // Aerial drop: the whole current volume at once.
            None => fire.remaining = fire.remaining.saturating_sub(self.volume),
            Some(amount) => fire.remaining = fire.remaining.saturating_sub(amount),
        }
        self.spend_intervention_water();
    }

    /// Consume the water one intervention pass costs, without a fire.
    ///
    /// Split out of [`Unit::intervene`] so an intervention that lands
    /// after its fire was extinguished still drains the tank the same way.
    pub fn spend_intervention_water(&mut self) {
        match self.kind.intervention_amount() {
            None => self.volume = 0,
            Some(amount) => self.volume = self.volume.saturating_sub(amount),
        }
    }
}
