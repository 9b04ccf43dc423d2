//! Scenario loading and configuration.
//!
//! A scenario bundles a world description file with the run parameters
//! to use on it, so CI jobs and repeatable experiments are one RON file
//! instead of a command line.
//!
//! ```ron
//! Scenario(
//!     name: "campus",
//!     map: "maps/campus.map",
//!     policy: Some("reflective"),
//!     spread_period: Some(100),
//!     seed: Some(7),
//!     max_ticks: Some(500000),
//! )
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ember_core::prelude::DispatchPolicy;

use crate::runner::RunParams;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Invalid field value.
    #[error("Invalid scenario field: {0}")]
    InvalidField(String),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name, for logs and reports.
    pub name: String,
    /// World description file, relative to the scenario file.
    pub map: PathBuf,
    /// Dispatch policy name; omit to run without a dispatcher.
    #[serde(default)]
    pub policy: Option<String>,
    /// Fire-spread period in ticks; omit to disable spread.
    #[serde(default)]
    pub spread_period: Option<u64>,
    /// RNG seed; defaults to the crate-wide default seed.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Tick limit; defaults to the runner default.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] for a missing file or malformed RON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] for malformed RON.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The map path resolved against the scenario file's directory.
    #[must_use]
    pub fn resolve_map(&self, scenario_path: &Path) -> PathBuf {
        match scenario_path.parent() {
            Some(dir) => dir.join(&self.map),
            None => self.map.clone(),
        }
    }

    /// Convert into runner parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::InvalidField`] for an unknown policy name.
    pub fn run_params(&self) -> Result<RunParams, ScenarioError> {
        let defaults = RunParams::default();
        let policy = match &self.policy {
            Some(name) => Some(
                DispatchPolicy::from_str(name).map_err(ScenarioError::InvalidField)?,
            ),
            None => None,
        };
        Ok(RunParams {
            policy,
            spread_period: self.spread_period,
            seed: self.seed.unwrap_or(ember_core::rng::DEFAULT_SEED),
            max_ticks: self.max_ticks.unwrap_or(defaults.max_ticks),
        })
    }
}
