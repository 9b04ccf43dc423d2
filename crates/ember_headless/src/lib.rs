//! Headless simulation runner for CI verification and scenario testing.
//!
//! Runs the firefighting simulation without any graphics:
//!
//! - **Scenario runs**: load a world description, pick a dispatch
//!   policy, run to completion, report the outcome as JSON or text
//! - **Determinism checks**: run the same seed several times and compare
//!   final state hashes
//! - **ASCII maps**: terminal rendering of the final world state
//!
//! ```bash
//! # Run a map with the simple dispatcher
//! cargo run -p ember_headless -- run --map maps/campus.map --policy simple
//!
//! # Run a packaged scenario
//! cargo run -p ember_headless -- scenario scenarios/campus.ron --ascii
//!
//! # Verify determinism
//! cargo run -p ember_headless -- verify --map maps/campus.map --runs 5
//! ```

pub mod ascii;
pub mod runner;
pub mod scenario;

pub use ascii::render_world;
pub use runner::{execute, CountingSink, RunParams, RunReport};
pub use scenario::Scenario;
