//! Determinism testing utilities.
//!
//! The simulation must be fully reproducible: the same world
//! description, configuration and seed must produce the same final
//! state, every run. Sources of non-determinism to watch for:
//!
//! - **HashMap iteration order**: the event queue buckets live in a
//!   `HashMap`, but only one bucket is ever drained per tick and within
//!   a bucket execution is FIFO, so ordering never leaks.
//! - **System randomness**: fire spread must draw from the seeded RNG
//!   only.
//! - **Floating point**: speeds and heuristics use `f64`, which is fine
//!   within one platform; cross-platform lockstep is not a goal here.

use ember_core::error::Result;
use ember_core::render::NullSink;
use ember_core::scheduler::{RunOutcome, SimConfig, Simulation, Tick};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical final states.
    pub is_deterministic: bool,
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Outcome of each run.
    pub outcomes: Vec<RunOutcome>,
}

impl DeterminismResult {
    /// All unique hashes (should be exactly 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }
}

/// Run the same simulation `runs` times and compare final states.
///
/// # Errors
///
/// Propagates load or event failures from any run.
pub fn check_runs(
    description: &str,
    config: SimConfig,
    runs: usize,
    max_ticks: Tick,
) -> Result<DeterminismResult> {
    let mut hashes = Vec::with_capacity(runs);
    let mut outcomes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut sim = Simulation::new(description, config)?;
        let mut sink = NullSink;
        outcomes.push(sim.run_to_completion(&mut sink, max_ticks)?);
        hashes.push(sim.state().state_hash());
    }

    let is_deterministic = hashes.windows(2).all(|pair| pair[0] == pair[1])
        && outcomes.windows(2).all(|pair| pair[0] == pair[1]);
    Ok(DeterminismResult {
        is_deterministic,
        hashes,
        outcomes,
    })
}
