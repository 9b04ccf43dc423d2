//! Error types for the simulation core.

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for all simulation errors.
///
/// "No path found" is deliberately not represented here: an exhausted
/// pathfinder search is an ordinary `None` result that callers skip over,
/// never a failure of the run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed world description.
    #[error("Malformed world description at line {line}: {message}")]
    WorldParse {
        /// 1-based line in the description where parsing failed.
        line: usize,
        /// Error message.
        message: String,
    },

    /// A unit was asked to do something its kind cannot do.
    #[error("Capability violation: {0}")]
    CapabilityViolation(String),

    /// A movement chain computed a neighbor outside the grid.
    #[error("Unit {unit} left the grid")]
    UnitLeftGrid {
        /// Index of the unit whose path walked off the map.
        unit: usize,
    },

    /// An intervention was aimed at a cell with no burning fire.
    #[error("No fire burning at ({row}, {col})")]
    NoFireAt {
        /// Row of the targeted cell.
        row: u32,
        /// Column of the targeted cell.
        col: u32,
    },

    /// Invalid simulation state.
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),
}
