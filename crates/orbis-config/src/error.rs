//! Configuration error types.

/// A configuration value rejected by [`Config::validate`](crate::Config::validate).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The cube face must be split into at least one tile per side.
    #[error("tiles_per_side must be at least 1 (got {0})")]
    TilesPerSide(u16),

    /// The cache needs room for at least one tile.
    #[error("max_cached_tiles must be at least 1 (got {0})")]
    MaxCachedTiles(usize),

    /// At least one tile must be creatable per tick.
    #[error("max_creates_per_frame must be at least 1 (got {0})")]
    MaxCreatesPerFrame(u32),

    /// A tile mesh needs at least two vertices per edge.
    #[error("mesh_resolution must be at least 2 (got {0})")]
    MeshResolution(u32),

    /// Radius must be finite and positive.
    #[error("sphere_radius must be finite and positive (got {0})")]
    SphereRadius(f32),

    /// A scale factor is negative or non-finite.
    #[error("{name} must be finite and non-negative (got {value})")]
    Scale {
        /// Field name.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// An update interval is negative or non-finite.
    #[error("{name} must be finite and non-negative (got {value})")]
    Interval {
        /// Field name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// The idle interval is shorter than the moving interval.
    #[error("idle_interval ({idle}) must not be shorter than min_interval ({min})")]
    IntervalOrder {
        /// Interval while the camera moves.
        min: f64,
        /// Interval while the camera is idle.
        idle: f64,
    },

    /// A change-detection epsilon is negative or non-finite.
    #[error("{name} must be finite and non-negative (got {value})")]
    Epsilon {
        /// Field name.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// A priority weight lies outside `[0, 1]`.
    #[error("{name} must lie in [0, 1] (got {value})")]
    Weight {
        /// Field name.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },
}
