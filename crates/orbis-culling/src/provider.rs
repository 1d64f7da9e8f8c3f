//! Visible-tile enumeration against a camera frustum.

use orbis_cubesphere::{FaceAxes, TileKey, all_keys};
use tracing::info;

use crate::bounds::{PrecomputedTile, precompute_tile, tile_half_extent};
use crate::{Aabb, Frustum};

/// Produces the set of tiles visible from a frustum.
///
/// Implementations own whatever per-tile data they need and must derive
/// tile positions from the shared [`FaceAxes`] frames; [`face_axes`]
/// exposes the frames they actually use so start-up validation can compare
/// them against the canonical derivation.
///
/// [`face_axes`]: CullingProvider::face_axes
pub trait CullingProvider {
    /// Whether per-tile bounds are cached between queries.
    fn precompute_enabled(&self) -> bool;

    /// Tile density the provider currently enumerates.
    fn tiles_per_side(&self) -> u16;

    /// Recompute cached tile data. Must be called whenever the sphere
    /// radius, tile density or elevation range changes.
    fn rebuild_precompute(&mut self, sphere_radius: f32, max_elevation: f32, tiles_per_side: u16);

    /// Keys whose bounds intersect `frustum`. Finite, unordered, lazily
    /// produced.
    fn visible_keys<'a>(&'a self, frustum: &'a Frustum) -> impl Iterator<Item = TileKey> + 'a;

    /// Frame this provider uses for `face`.
    fn face_axes(&self, face: u8) -> FaceAxes;
}

/// Frustum culling over the full `6 * N * N` tile grid.
///
/// With precompute enabled, tile centres and bounds are computed once per
/// [`rebuild_precompute`](CullingProvider::rebuild_precompute) and each
/// query is a table scan. Without it, the identical bounds are recomputed
/// per query.
#[derive(Debug, Clone)]
pub struct FrustumCullingProvider {
    precompute: bool,
    tiles_per_side: u16,
    sphere_radius: f32,
    max_elevation: f32,
    half_extent: f32,
    axes: [FaceAxes; 6],
    tiles: Vec<PrecomputedTile>,
}

impl FrustumCullingProvider {
    /// Create a provider and build its tables immediately.
    ///
    /// # Panics
    ///
    /// Panics if `tiles_per_side` is zero.
    pub fn new(tiles_per_side: u16, precompute: bool, sphere_radius: f32, max_elevation: f32) -> Self {
        assert!(tiles_per_side > 0, "tiles_per_side must be at least 1");
        let mut provider = Self {
            precompute,
            tiles_per_side,
            sphere_radius,
            max_elevation,
            half_extent: 0.0,
            axes: FaceAxes::all(),
            tiles: Vec::new(),
        };
        provider.rebuild_precompute(sphere_radius, max_elevation, tiles_per_side);
        provider
    }

    /// Sphere radius of the last rebuild.
    pub fn sphere_radius(&self) -> f32 {
        self.sphere_radius
    }

    /// Elevation range of the last rebuild.
    pub fn max_elevation(&self) -> f32 {
        self.max_elevation
    }

    /// Precomputed tiles (empty when precompute is disabled).
    pub fn precomputed(&self) -> &[PrecomputedTile] {
        &self.tiles
    }

    /// Bounds of `key`, from the table when available.
    pub fn tile_bounds(&self, key: TileKey) -> Aabb {
        if let Some(tile) = self.tiles.get(key.linear_index(self.tiles_per_side)) {
            return tile.bounds;
        }
        self.compute_tile(key).bounds
    }

    fn compute_tile(&self, key: TileKey) -> PrecomputedTile {
        precompute_tile(
            &self.axes[usize::from(key.face)],
            key,
            self.tiles_per_side,
            self.sphere_radius,
            self.half_extent,
        )
    }
}

impl CullingProvider for FrustumCullingProvider {
    fn precompute_enabled(&self) -> bool {
        self.precompute
    }

    fn tiles_per_side(&self) -> u16 {
        self.tiles_per_side
    }

    fn rebuild_precompute(&mut self, sphere_radius: f32, max_elevation: f32, tiles_per_side: u16) {
        self.sphere_radius = sphere_radius;
        self.max_elevation = max_elevation;
        self.tiles_per_side = tiles_per_side.max(1);
        self.half_extent = tile_half_extent(sphere_radius, self.tiles_per_side, max_elevation);

        self.tiles.clear();
        if !self.precompute {
            return;
        }

        let n = self.tiles_per_side;
        self.tiles.reserve(FaceAxes::FACE_COUNT * usize::from(n) * usize::from(n));
        for key in all_keys(n) {
            let tile = self.compute_tile(key);
            self.tiles.push(tile);
        }

        info!(
            tiles = self.tiles.len(),
            radius = sphere_radius,
            max_elevation,
            half_extent = self.half_extent,
            "rebuilt culling precompute"
        );
    }

    fn visible_keys<'a>(&'a self, frustum: &'a Frustum) -> impl Iterator<Item = TileKey> + 'a {
        all_keys(self.tiles_per_side).filter(move |key| frustum.intersects_aabb(&self.tile_bounds(*key)))
    }

    fn face_axes(&self, face: u8) -> FaceAxes {
        self.axes[usize::from(face).min(FaceAxes::FACE_COUNT - 1)]
    }
}
