//! Budgeted streaming of cube-sphere terrain tiles.
//!
//! [`DynamicTerrainManager`] runs the per-tick loop: a
//! [`CameraChangeDetector`] gates the pass, a
//! [`CullingProvider`](orbis_culling::CullingProvider) yields visible keys,
//! keys are ordered by [`prioritize`], cached tiles are activated, new ones
//! are built by the [`TileFactory`] within the creation budget and the rest
//! are deferred to the [`UpdateScheduler`]. Tiles not seen by the pass go
//! inactive and the [`TileCache`] pools the least recently used of them.

mod cache;
mod change_detector;
mod error;
mod factory;
mod height;
mod manager;
mod priority;
mod scheduler;

#[cfg(test)]
mod test_support;

pub use cache::{CacheEvent, CachedTile, TileCache, TileResource};
pub use change_detector::CameraChangeDetector;
pub use error::{FactoryError, GeometryError, ResourceError, StreamingError};
pub use factory::{
    FactoryStats, GeometryBuilder, GeometryRequest, GeometryStats, IndexFormat,
    RenderResourceProvider, TileCreateConfig, TileFactory,
};
pub use height::{FlatHeight, HeightGrid, HeightSource};
pub use manager::{DynamicTerrainManager, TickReport};
pub use priority::{ScoredKey, face_score, intra_face_score, prioritize, tile_score};
pub use scheduler::UpdateScheduler;
