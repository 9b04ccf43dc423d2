//! Drive a simulation to completion and summarize the run.

use serde::{Deserialize, Serialize};

use ember_core::error::Result;
use ember_core::grid::Coord;
use ember_core::prelude::{DispatchPolicy, RunOutcome, SimConfig, Simulation};
use ember_core::render::RenderSink;
use ember_core::units::UnitId;
use ember_core::world::FireId;

/// Parameters for one headless run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    /// Dispatch policy; `None` runs whatever events were seeded by hand.
    pub policy: Option<DispatchPolicy>,
    /// Fire-spread period in ticks; `None` disables spread.
    pub spread_period: Option<u64>,
    /// RNG seed.
    pub seed: u64,
    /// Hard tick limit.
    pub max_ticks: u64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            policy: Some(DispatchPolicy::Simple),
            spread_period: None,
            seed: ember_core::rng::DEFAULT_SEED,
            max_ticks: 1_000_000,
        }
    }
}

impl RunParams {
    /// The [`SimConfig`] these parameters describe.
    #[must_use]
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            policy: self.policy,
            spread_period: self.spread_period,
            seed: self.seed,
        }
    }
}

/// Render sink that counts redraw notifications.
///
/// Stands in for a real renderer so headless runs still exercise the
/// notification path.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingSink {
    /// Number of cell redraws received.
    pub cells: usize,
    /// Number of unit redraws received.
    pub units: usize,
    /// Number of fire redraws received.
    pub fires: usize,
}

impl CountingSink {
    /// Total notifications received.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.cells + self.units + self.fires
    }
}

impl RenderSink for CountingSink {
    fn redraw_cell(&mut self, _cell: Coord) {
        self.cells += 1;
    }

    fn redraw_unit(&mut self, _unit: UnitId) {
        self.units += 1;
    }

    fn redraw_fire(&mut self, _fire: FireId) {
        self.fires += 1;
    }
}

/// Final state of one unit, for the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    /// Unit kind name.
    pub kind: String,
    /// Final cell as `(row, col)`.
    pub position: (u32, u32),
    /// Remaining tank volume in liters.
    pub volume: u32,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Tick the run stopped on.
    pub ticks: u64,
    /// Fires still burning at the end.
    pub fires_remaining: usize,
    /// Redraw notifications emitted over the whole run.
    pub redraw_notifications: usize,
    /// Per-unit final state.
    pub units: Vec<UnitReport>,
}

/// Run a world description to completion.
///
/// Returns the report together with the finished simulation so callers
/// can inspect or render the final state.
///
/// # Errors
///
/// Propagates world-parse failures and fatal event failures; a fatal
/// event failure must be reported distinctly from a completed run.
pub fn execute(description: &str, params: &RunParams) -> Result<(RunReport, Simulation)> {
    let mut sim = Simulation::new(description, params.sim_config())?;
    let mut sink = CountingSink::default();

    let outcome = sim.run_to_completion(&mut sink, params.max_ticks)?;
    tracing::info!(?outcome, redraws = sink.total(), "run finished");

    let state = sim.state();
    let report = RunReport {
        outcome,
        ticks: sim.tick(),
        fires_remaining: state.fires.len(),
        redraw_notifications: sink.total(),
        units: state
            .units
            .iter()
            .map(|u| UnitReport {
                kind: u.kind().to_string(),
                position: (u.position.row, u.position.col),
                volume: u.volume,
            })
            .collect(),
    };
    Ok((report, sim))
}
