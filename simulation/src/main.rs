//! Life Simulation CLI
//!
//! Loads `<LIFE_INPUT_DIR>/<W>x<H>.pgm`, runs the configured number of
//! generations and writes snapshots to `LIFE_OUTPUT_DIR`. While running,
//! type a command and press enter:
//!
//! - `s` -- save a snapshot of the current grid
//! - `p` -- pause (save a snapshot); `p` again to continue
//! - `q` -- quit early, saving the grid at the current turn

use std::io::BufRead;
use std::path::Path;
use std::thread;

use anyhow::Context;
use serde::Serialize;
use simulation::{Cell, Controller, EndReason, LogObserver, PgmIo, RunParams, SimulationRunner};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Printed to stdout as JSON when the run ends
#[derive(Serialize)]
struct RunSummary<'a> {
    width: usize,
    height: usize,
    workers: usize,
    target_turns: u64,
    turns_completed: u64,
    end_reason: EndReason,
    alive_count: usize,
    alive_cells: &'a [Cell],
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for the summary
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("Life simulation starting...");

    let params = load_params()?;
    let input_dir = std::env::var("LIFE_INPUT_DIR").unwrap_or_else(|_| "images".to_owned());
    let output_dir = std::env::var("LIFE_OUTPUT_DIR").unwrap_or_else(|_| "out".to_owned());

    let io = PgmIo::new(&input_dir, &output_dir).context("failed to start image writer")?;
    let runner = SimulationRunner::start(params.clone(), io, LogObserver)
        .context("failed to start simulation")?;

    spawn_keyboard(runner.controller().clone()).context("failed to start keyboard listener")?;

    let outcome = runner.join().context("simulation failed")?;

    let summary = RunSummary {
        width: params.width,
        height: params.height,
        workers: params.workers,
        target_turns: params.turns,
        turns_completed: outcome.turns_completed,
        end_reason: outcome.end_reason,
        alive_count: outcome.alive_cells.len(),
        alive_cells: &outcome.alive_cells,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// `LIFE_CONFIG` JSON file if set, then `LIFE_*` overrides
fn load_params() -> anyhow::Result<RunParams> {
    let params = match std::env::var("LIFE_CONFIG") {
        Ok(path) => RunParams::from_json_file(Path::new(&path))?.with_env_overrides()?,
        Err(_) => RunParams::from_env()?,
    };
    params.validate().context("invalid run parameters")?;

    info!(
        width = params.width,
        height = params.height,
        workers = params.workers,
        turns = params.turns,
        report = %String::from(params.report),
        "Configuration loaded"
    );
    Ok(params)
}

/// Map stdin lines to control signals. The thread is detached; it ends with
/// the process or when stdin closes.
fn spawn_keyboard(controller: Controller) -> std::io::Result<()> {
    thread::Builder::new().name("keyboard".to_string()).spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "s" => controller.report(),
                "p" => controller.pause(),
                "q" => {
                    controller.quit();
                    break;
                }
                "" => {}
                other => warn!(command = other, "Unknown command (expected s, p or q)"),
            }
        }
    })?;
    Ok(())
}
