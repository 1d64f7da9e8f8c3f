//! Creation ordering for visible tiles.
//!
//! Cached tiles always sort first (`+inf`). Uncached tiles score
//! `face_score * face_weight + intra_score * intra_face_weight`, both terms
//! in `[0, 1]`.

use glam::Vec3;
use orbis_config::PriorityConfig;
use orbis_cubesphere::{FaceAxes, TileKey};

/// A visible key with its creation priority.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredKey {
    pub key: TileKey,
    pub score: f32,
}

/// Alignment of the camera's forward direction with the face normal:
/// `clamp01((dot(forward, up) + 1) / 2)`.
pub fn face_score(forward: Vec3, face: u8) -> f32 {
    let up = FaceAxes::FACE_UP[usize::from(face).min(FaceAxes::FACE_COUNT - 1)];
    ((forward.normalize_or_zero().dot(up) + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Closeness of the tile's cell centre to the face centre, `1` at the
/// centre falling to `0` at the corner.
pub fn intra_face_score(key: TileKey, tiles_per_side: u16) -> f32 {
    let mid = f32::from(tiles_per_side) * 0.5;
    let cx = f32::from(key.x) + 0.5;
    let cy = f32::from(key.y) + 0.5;
    let dist = ((cx - mid).powi(2) + (cy - mid).powi(2)).sqrt();
    let max_dist = (std::f32::consts::SQRT_2 * mid.max(0.5)).max(1e-3);
    1.0 - (dist / max_dist).clamp(0.0, 1.0)
}

/// Score of an uncached tile.
pub fn tile_score(key: TileKey, tiles_per_side: u16, forward: Vec3, weights: &PriorityConfig) -> f32 {
    face_score(forward, key.face) * weights.face_weight
        + intra_face_score(key, tiles_per_side) * weights.intra_face_weight
}

/// Score `keys` and sort them by descending score.
///
/// The sort is stable, so equal scores keep their input order.
pub fn prioritize(
    keys: impl IntoIterator<Item = TileKey>,
    tiles_per_side: u16,
    forward: Vec3,
    weights: &PriorityConfig,
    is_cached: impl Fn(&TileKey) -> bool,
) -> Vec<ScoredKey> {
    let mut scored: Vec<ScoredKey> = keys
        .into_iter()
        .map(|key| {
            let score = if is_cached(&key) {
                f32::INFINITY
            } else {
                tile_score(key, tiles_per_side, forward, weights)
            };
            ScoredKey { key, score }
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}
