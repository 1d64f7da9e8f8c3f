//! Frustum culling for cube-sphere tiles: camera snapshots, plane
//! extraction, conservative tile bounds and the visible-key provider.

mod bounds;
mod camera;
mod frustum;
mod provider;
mod visible_set;

pub use bounds::{FOOTPRINT_SCALE, PrecomputedTile, precompute_tile, tile_center, tile_half_extent};
pub use camera::CameraSnapshot;
pub use frustum::{Aabb, Frustum};
pub use provider::{CullingProvider, FrustumCullingProvider};
pub use visible_set::VisibleSet;
