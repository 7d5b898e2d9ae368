//! # KILN Swarm
//!
//! Headless run of the swarm scene. No window, no GPU.
//!
//! ```bash
//! swarm --config crates/kiln/swarm.toml --frames 1200 --seed 7
//! RUST_LOG=kiln=debug swarm
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kiln::{swarm, SimulationConfig};
use tracing_subscriber::EnvFilter;

/// Headless swarm simulation
#[derive(Parser, Debug)]
#[command(name = "swarm")]
#[command(about = "Run the pooled and batched swarm scene without a GPU")]
struct Args {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames to simulate, overriding the config
    #[arg(long)]
    frames: Option<u64>,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::load(path),
        None => Ok(SimulationConfig::default()),
    };
    let mut config = match config {
        Ok(config) => config,
        Err(error) => {
            eprintln!("swarm: {error}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(frames) = args.frames {
        config.frames = frames;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (mut frame_loop, report) = swarm::build(&config, args.seed);
    frame_loop.run(config.frames);
    frame_loop.stats().log_summary();

    let report = *report.borrow();
    tracing::info!(
        spawned = report.spawned,
        expired = report.expired,
        peak_alive = report.peak_alive,
        joined = report.joined,
        left = report.left,
        uploads = report.batch.uploads,
        bytes_uploaded = report.batch.bytes_uploaded,
        "swarm finished"
    );
    ExitCode::SUCCESS
}
