//! Headless firefighting simulation runner.
//!
//! Runs the simulation without graphics for CI checks, scenario
//! experiments and determinism verification. Reports go to stdout
//! (text or JSON), logs to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ember_core::prelude::DispatchPolicy;
use ember_headless::runner::{execute, RunParams, RunReport};
use ember_headless::{render_world, Scenario};

#[derive(Parser)]
#[command(name = "ember_headless")]
#[command(about = "Headless firefighting simulation runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation on a map file
    Run {
        /// World description file
        #[arg(short, long)]
        map: PathBuf,

        /// Dispatch policy: simple, advanced, reflective or none
        #[arg(short, long, default_value = "simple")]
        policy: String,

        /// Fire-spread period in ticks (omit to disable spread)
        #[arg(long)]
        spread: Option<u64>,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Tick limit
        #[arg(long, default_value = "1000000")]
        max_ticks: u64,

        /// Print the final world as an ASCII map
        #[arg(long)]
        ascii: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a scenario file (RON)
    Scenario {
        /// Scenario file
        path: PathBuf,

        /// Print the final world as an ASCII map
        #[arg(long)]
        ascii: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// World description file
        #[arg(short, long)]
        map: PathBuf,

        /// Dispatch policy: simple, advanced, reflective or none
        #[arg(short, long, default_value = "simple")]
        policy: String,

        /// Fire-spread period in ticks
        #[arg(long)]
        spread: Option<u64>,

        /// Seed to verify
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick limit per run
        #[arg(long, default_value = "1000000")]
        max_ticks: u64,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse a policy name; "none" disables the dispatcher.
fn parse_policy(name: &str) -> Result<Option<DispatchPolicy>, String> {
    if name == "none" {
        return Ok(None);
    }
    DispatchPolicy::from_str(name).map(Some)
}

fn print_report(report: &RunReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("outcome:           {:?}", report.outcome);
        println!("ticks:             {}", report.ticks);
        println!("fires remaining:   {}", report.fires_remaining);
        println!("redraws notified:  {}", report.redraw_notifications);
        for (i, unit) in report.units.iter().enumerate() {
            println!(
                "unit {i}: {} at ({}, {}), {} L",
                unit.kind, unit.position.0, unit.position.1, unit.volume
            );
        }
    }
    Ok(())
}

fn run_map(
    map: &Path,
    params: &RunParams,
    ascii: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let description = std::fs::read_to_string(map)?;
    let (report, sim) = execute(&description, params)
        .map_err(|e| format!("simulation failed: {e}"))?;
    print_report(&report, json)?;
    if ascii {
        println!("{}", render_world(sim.state()));
    }
    Ok(())
}

fn verify(
    map: &Path,
    params: &RunParams,
    runs: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if runs == 0 {
        return Err("verify needs at least one run".into());
    }
    let description = std::fs::read_to_string(map)?;
    let mut hashes = Vec::new();
    for i in 0..runs {
        let (_, sim) = execute(&description, params)
            .map_err(|e| format!("simulation failed on run {i}: {e}"))?;
        hashes.push(sim.state().state_hash());
    }
    let identical = hashes.windows(2).all(|pair| pair[0] == pair[1]);
    if identical {
        println!("deterministic: {} runs, state hash {:#018x}", runs, hashes[0]);
        Ok(())
    } else {
        Err(format!("determinism check FAILED: hashes {hashes:?}").into())
    }
}

fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            map,
            policy,
            spread,
            seed,
            max_ticks,
            ascii,
            json,
        } => {
            let params = RunParams {
                policy: parse_policy(&policy)?,
                spread_period: spread,
                seed,
                max_ticks,
            };
            run_map(&map, &params, ascii, json)
        }
        Commands::Scenario { path, ascii, json } => {
            let scenario = Scenario::load(&path)?;
            tracing::info!(name = %scenario.name, "running scenario");
            let params = scenario.run_params()?;
            let map = scenario.resolve_map(&path);
            run_map(&map, &params, ascii, json)
        }
        Commands::Verify {
            map,
            policy,
            spread,
            seed,
            runs,
            max_ticks,
        } => {
            let params = RunParams {
                policy: parse_policy(&policy)?,
                spread_period: spread,
                seed,
                max_ticks,
            };
            verify(&map, &params, runs)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
