//! Headless driver for the orbis terrain streamer.
//!
//! Orbits a camera around a procedurally relieved planet for a fixed number
//! of ticks with simulated render collaborators, logging streaming status.
//! Run with `cargo run -p orbis-sim -- --ticks 1200 --tiles-per-side 8`.

mod collaborators;
mod sim;

use std::path::PathBuf;

use clap::Parser;
use orbis_config::{CliArgs, Config};
use orbis_streaming::{FlatHeight, HeightSource};
use tracing::{error, info, warn};

use crate::sim::{OrbitCamera, SimSettings};

/// Headless terrain streaming simulation.
#[derive(Parser, Debug)]
#[command(name = "orbis-sim", about = "Headless cube-sphere terrain streaming")]
struct SimArgs {
    #[command(flatten)]
    streaming: CliArgs,

    /// Number of fixed simulation steps.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Seconds per step.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// Orbit angular speed in radians per second.
    #[arg(long, default_value_t = 0.3)]
    orbit_speed: f32,

    /// Orbit distance in planet radii.
    #[arg(long, default_value_t = 2.5)]
    orbit_distance: f32,

    /// Maximum live render resources (simulates allocator exhaustion).
    #[arg(long)]
    alloc_cap: Option<usize>,

    /// Seed for the procedural relief.
    #[arg(long, default_value_t = 42)]
    seed: u32,

    /// Use a flat planet instead of procedural relief.
    #[arg(long)]
    flat: bool,

    /// Directory for the JSON log file (debug builds).
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() {
    let args = SimArgs::parse();

    let mut config = Config::default();
    config.apply_cli_overrides(&args.streaming);

    orbis_log::init_logging(args.log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    let height: Box<dyn HeightSource> = if args.flat {
        Box::new(FlatHeight)
    } else {
        match collaborators::simplex_heights(args.seed, 256, 6.0) {
            Some(grid) => Box::new(grid),
            None => {
                warn!("failed to build height grid, falling back to a flat planet");
                Box::new(FlatHeight)
            }
        }
    };

    let settings = SimSettings {
        ticks: args.ticks,
        dt: args.dt,
        camera: OrbitCamera {
            distance: args.orbit_distance,
            speed: args.orbit_speed,
            yaw_amplitude_deg: 10.0,
            fov_y_deg: 60.0,
        },
        alloc_cap: args.alloc_cap,
        report_every: 20,
    };

    info!(
        ticks = settings.ticks,
        dt = settings.dt,
        tiles_per_side = config.planet.tiles_per_side,
        "starting simulation"
    );
    match sim::run(config, Some(height), &settings) {
        Ok(summary) => info!(
            passes = summary.passes,
            created = summary.created,
            failed = summary.failed,
            pooled = summary.pooled,
            peak_cache = summary.peak_cache,
            "done"
        ),
        Err(err) => {
            error!(error = %err, "terrain streaming failed");
            std::process::exit(1);
        }
    }
}
