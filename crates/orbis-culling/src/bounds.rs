//! Conservative per-tile bounding volumes.

use glam::Vec3;
use orbis_cubesphere::{FaceAxes, TileKey};

use crate::Aabb;

/// Over-scale of the tile footprint relative to its nominal size, covering
/// curvature and neighbour displacement at coarse tile densities.
pub const FOOTPRINT_SCALE: f32 = 1.5;

/// Precomputed data for one tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrecomputedTile {
    /// Tile identity.
    pub key: TileKey,
    /// Tile centre projected onto the undisplaced sphere.
    pub center: Vec3,
    /// Cube-shaped bounds around `center`.
    pub bounds: Aabb,
}

/// Half side length of a tile's bounding cube:
/// `radius * 1.5 / tiles_per_side + max_elevation / 2`.
///
/// This over-approximates the tile so that no visible tile is culled;
/// false positives are accepted.
pub fn tile_half_extent(sphere_radius: f32, tiles_per_side: u16, max_elevation: f32) -> f32 {
    let tile_size = 1.0 / f32::from(tiles_per_side.max(1));
    sphere_radius * FOOTPRINT_SCALE * tile_size + max_elevation * 0.5
}

/// Centre of `key` on a sphere of `sphere_radius`, using the face frame
/// `axes`.
pub fn tile_center(axes: &FaceAxes, key: TileKey, tiles_per_side: u16, sphere_radius: f32) -> Vec3 {
    let (sx, sy) = key.face_center(tiles_per_side);
    axes.sphere_point(sx, sy, sphere_radius)
}

/// Centre and bounds for one tile.
pub fn precompute_tile(
    axes: &FaceAxes,
    key: TileKey,
    tiles_per_side: u16,
    sphere_radius: f32,
    half_extent: f32,
) -> PrecomputedTile {
    let center = tile_center(axes, key, tiles_per_side, sphere_radius);
    PrecomputedTile {
        key,
        center,
        bounds: Aabb::from_center_half_extent(center, half_extent),
    }
}
