//! Error types for tile streaming.

use orbis_config::ConfigError;
use orbis_cubesphere::{FaceAxesError, TileKey};
use thiserror::Error;

/// Failure reported by a [`RenderResourceProvider`](crate::RenderResourceProvider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// No resource can be allocated right now.
    #[error("render resources exhausted")]
    Exhausted,
    /// The rendering backend refused the allocation.
    #[error("render backend error: {0}")]
    Backend(String),
}

/// Failure reported by a [`GeometryBuilder`](crate::GeometryBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The supplied resource cannot hold this geometry; a freshly
    /// allocated one is required.
    #[error("resource cannot be reused for this geometry")]
    IncompatibleResource,
    /// Building failed for another reason.
    #[error("geometry build failed: {0}")]
    Failed(String),
}

/// Transient failure to produce a tile. The key stays uncached and is
/// picked up again by a later visibility pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    /// Neither the pool nor the provider could supply a resource.
    #[error("no render resource for tile {key}")]
    ResourceExhausted {
        /// Tile being created.
        key: TileKey,
        /// Provider failure.
        #[source]
        source: ResourceError,
    },
    /// The geometry builder failed.
    #[error("failed to build geometry for tile {key}")]
    Geometry {
        /// Tile being created.
        key: TileKey,
        /// Builder failure.
        #[source]
        source: GeometryError,
    },
}

/// Errors surfaced by the [`DynamicTerrainManager`](crate::DynamicTerrainManager).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamingError {
    /// The configuration was rejected at construction or by a setter.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A producer's face frames disagree with the canonical derivation.
    #[error(transparent)]
    FaceAxes(#[from] FaceAxesError),
    /// A tile was created for a key that is already cached. Cache
    /// bookkeeping can no longer be trusted and the manager halts.
    #[error("duplicate tile insertion for {0}")]
    DuplicateTile(TileKey),
    /// The manager stopped after an earlier invariant violation.
    #[error("terrain manager halted after an invariant violation")]
    Halted,
}
