//! Configuration for the orbis terrain streamer.
//!
//! Plain settings structs with defaults, consistency validation, and CLI
//! overrides via clap. Every section derives serde with `#[serde(default)]`
//! so a host application can embed it in whatever settings file it owns.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, CullingConfig, DebugConfig, MIN_POSITION_EPSILON, MIN_UPDATE_INTERVAL, PlanetConfig,
    PriorityConfig, StreamingConfig,
};
pub use error::ConfigError;
