//! Configuration structs with sensible defaults and validation.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shortest gap between two gated update passes, in seconds. Smaller
/// configured intervals are raised to this value.
pub const MIN_UPDATE_INTERVAL: f64 = 0.01;

/// Smallest absolute camera movement that counts as a change, in world units.
pub const MIN_POSITION_EPSILON: f32 = 0.01;

/// Top-level streaming configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Planet shape and tile geometry.
    pub planet: PlanetConfig,
    /// Creation budget and cache sizing.
    pub streaming: StreamingConfig,
    /// Visibility evaluation and change detection.
    pub culling: CullingConfig,
    /// Creation ordering.
    pub priority: PriorityConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Planet shape and per-tile mesh settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    /// Radius of the undisplaced sphere, in terrain-local units.
    pub sphere_radius: f32,
    /// Vertices per tile edge.
    pub mesh_resolution: u32,
    /// Tiles per cube-face edge (`N`).
    pub tiles_per_side: u16,
    /// Vertical exaggeration of sampled heights.
    pub height_scale: f32,
    /// Uniform scale applied to the whole planet.
    pub uniform_scale: f32,
    /// Displace vertices on the GPU instead of baking heights into the mesh.
    pub use_gpu_deformation: bool,
}

/// Creation budget and cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Tile creations allowed per update pass, direct and deferred combined.
    pub max_creates_per_frame: u32,
    /// Never evict: every generated tile stays cached.
    pub cache_all_generated: bool,
    /// Cache entries retained before inactive tiles are pooled.
    pub max_cached_tiles: usize,
}

/// Visibility evaluation and camera change detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CullingConfig {
    /// Cache per-tile bounds between passes.
    pub precompute: bool,
    /// Run passes only when the camera changed (rate-limited). When false
    /// every tick runs a pass.
    pub on_demand: bool,
    /// Minimum seconds between passes while the camera moves.
    pub min_interval: f64,
    /// Minimum seconds between passes while the camera is idle.
    pub idle_interval: f64,
    /// Position epsilon as a fraction of the sphere radius.
    pub pos_eps_relative: f32,
    /// Rotation epsilon in degrees.
    pub ang_eps_deg: f32,
    /// Field-of-view epsilon in degrees.
    pub fov_eps_deg: f32,
}

/// Creation ordering weights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PriorityConfig {
    /// Order creations by score; otherwise culling order is used.
    pub enabled: bool,
    /// Weight of the face-facing score.
    pub face_weight: f32,
    /// Weight of the centre-of-face score.
    pub intra_face_weight: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            sphere_radius: 1.0,
            mesh_resolution: 32,
            tiles_per_side: 4,
            height_scale: 1.0,
            uniform_scale: 1.0,
            use_gpu_deformation: true,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            max_creates_per_frame: 2,
            cache_all_generated: false,
            max_cached_tiles: 512,
        }
    }
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            precompute: true,
            on_demand: true,
            min_interval: 0.05,
            idle_interval: 0.5,
            pos_eps_relative: 0.001,
            ang_eps_deg: 0.25,
            fov_eps_deg: 0.2,
        }
    }
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            face_weight: 0.85,
            intra_face_weight: 0.15,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl CullingConfig {
    /// `min_interval` raised to [`MIN_UPDATE_INTERVAL`].
    pub fn effective_min_interval(&self) -> f64 {
        self.min_interval.max(MIN_UPDATE_INTERVAL)
    }

    /// `idle_interval` raised to [`MIN_UPDATE_INTERVAL`].
    pub fn effective_idle_interval(&self) -> f64 {
        self.idle_interval.max(MIN_UPDATE_INTERVAL)
    }

    /// Absolute position epsilon for a sphere of `sphere_radius`.
    pub fn position_epsilon(&self, sphere_radius: f32) -> f32 {
        (sphere_radius * self.pos_eps_relative).max(MIN_POSITION_EPSILON)
    }
}

impl PlanetConfig {
    /// Largest elevation a height sample can add or remove.
    pub fn elevation_range(&self) -> f32 {
        self.height_scale * self.uniform_scale
    }
}

// --- Validation ---

impl Config {
    /// Check the configuration for values the streamer cannot run with.
    ///
    /// Intervals below [`MIN_UPDATE_INTERVAL`] are accepted and floored at
    /// use; a notice is logged for them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let planet = &self.planet;
        if planet.tiles_per_side == 0 {
            return Err(ConfigError::TilesPerSide(planet.tiles_per_side));
        }
        if planet.mesh_resolution < 2 {
            return Err(ConfigError::MeshResolution(planet.mesh_resolution));
        }
        if !planet.sphere_radius.is_finite() || planet.sphere_radius <= 0.0 {
            return Err(ConfigError::SphereRadius(planet.sphere_radius));
        }
        check_scale("height_scale", planet.height_scale)?;
        check_scale("uniform_scale", planet.uniform_scale)?;
        if planet.uniform_scale == 0.0 {
            return Err(ConfigError::Scale {
                name: "uniform_scale",
                value: planet.uniform_scale,
            });
        }

        if self.streaming.max_cached_tiles == 0 {
            return Err(ConfigError::MaxCachedTiles(self.streaming.max_cached_tiles));
        }
        if self.streaming.max_creates_per_frame == 0 {
            return Err(ConfigError::MaxCreatesPerFrame(0));
        }

        let culling = &self.culling;
        check_interval("min_interval", culling.min_interval)?;
        check_interval("idle_interval", culling.idle_interval)?;
        if culling.idle_interval < culling.min_interval {
            return Err(ConfigError::IntervalOrder {
                min: culling.min_interval,
                idle: culling.idle_interval,
            });
        }
        if culling.min_interval < MIN_UPDATE_INTERVAL {
            log::warn!(
                "min_interval {} is below {MIN_UPDATE_INTERVAL}s and will be floored",
                culling.min_interval
            );
        }
        check_epsilon("pos_eps_relative", culling.pos_eps_relative)?;
        check_epsilon("ang_eps_deg", culling.ang_eps_deg)?;
        check_epsilon("fov_eps_deg", culling.fov_eps_deg)?;

        check_weight("face_weight", self.priority.face_weight)?;
        check_weight("intra_face_weight", self.priority.intra_face_weight)?;

        Ok(())
    }
}

fn check_scale(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Scale { name, value })
    }
}

fn check_interval(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Interval { name, value })
    }
}

fn check_epsilon(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Epsilon { name, value })
    }
}

fn check_weight(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Weight { name, value })
    }
}
