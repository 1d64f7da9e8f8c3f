//! Command-line argument parsing for the terrain streamer.

use clap::Args;

use crate::Config;

/// Streaming overrides accepted on the command line.
///
/// Flatten into a binary's own parser with `#[command(flatten)]`. Values
/// given here override the configuration the host built.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    /// Tiles per cube-face edge.
    #[arg(long)]
    pub tiles_per_side: Option<u16>,

    /// Tile creations per update pass.
    #[arg(long)]
    pub max_creates: Option<u32>,

    /// Cache capacity before inactive tiles are pooled.
    #[arg(long)]
    pub max_cached_tiles: Option<usize>,

    /// Sphere radius.
    #[arg(long)]
    pub radius: Option<f32>,

    /// Height exaggeration.
    #[arg(long)]
    pub height_scale: Option<f32>,

    /// Create tiles in culling order instead of by priority.
    #[arg(long)]
    pub no_priority: bool,

    /// Recompute tile bounds on every pass.
    #[arg(long)]
    pub no_precompute: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Config {
    /// Apply CLI overrides to a config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(n) = args.tiles_per_side {
            self.planet.tiles_per_side = n;
        }
        if let Some(max) = args.max_creates {
            self.streaming.max_creates_per_frame = max;
        }
        if let Some(cap) = args.max_cached_tiles {
            self.streaming.max_cached_tiles = cap;
        }
        if let Some(r) = args.radius {
            self.planet.sphere_radius = r;
        }
        if let Some(hs) = args.height_scale {
            self.planet.height_scale = hs;
        }
        if args.no_priority {
            log::info!("priority ordering disabled from the command line");
            self.priority.enabled = false;
        }
        if args.no_precompute {
            self.culling.precompute = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
