//! Identity of one streaming tile on the cube-sphere.

use thiserror::Error;

use crate::FaceAxes;

/// Errors produced when validating a [`TileKey`] against a tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileKeyError {
    /// The face index is not in `0..6`.
    #[error("face index {0} out of range (0..6)")]
    FaceOutOfRange(u8),
    /// A grid coordinate is not in `0..tiles_per_side`.
    #[error("tile coordinate ({x}, {y}) out of range for {tiles_per_side} tiles per side")]
    CoordOutOfRange {
        /// Horizontal coordinate that was supplied.
        x: u16,
        /// Vertical coordinate that was supplied.
        y: u16,
        /// Grid density the key was checked against.
        tiles_per_side: u16,
    },
    /// The grid has no tiles at all.
    #[error("tiles_per_side must be at least 1")]
    EmptyGrid,
}

/// Uniquely identifies one grid cell on one cube face.
///
/// - `face`: index into [`FaceAxes::FACE_UP`] (`0..6`).
/// - `x`, `y`: cell coordinates in `0..N`, where `N` is the number of tiles
///   per face side.
///
/// Keys are plain values: they are created whenever a cell is referenced and
/// never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Cube face index.
    pub face: u8,
    /// Horizontal grid coordinate (along the face's `axis_a`).
    pub x: u16,
    /// Vertical grid coordinate (along the face's `axis_b`).
    pub y: u16,
}

impl TileKey {
    /// Construct a key without range checks.
    #[must_use]
    pub const fn new(face: u8, x: u16, y: u16) -> Self {
        Self { face, x, y }
    }

    /// Construct a key, validating it against a grid of `tiles_per_side`.
    pub fn checked(face: u8, x: u16, y: u16, tiles_per_side: u16) -> Result<Self, TileKeyError> {
        if tiles_per_side == 0 {
            return Err(TileKeyError::EmptyGrid);
        }
        if usize::from(face) >= FaceAxes::FACE_COUNT {
            return Err(TileKeyError::FaceOutOfRange(face));
        }
        if x >= tiles_per_side || y >= tiles_per_side {
            return Err(TileKeyError::CoordOutOfRange {
                x,
                y,
                tiles_per_side,
            });
        }
        Ok(Self { face, x, y })
    }

    /// Dense index of this key in a `6 * N * N` table ordered by face, then
    /// row, then column.
    #[must_use]
    pub fn linear_index(&self, tiles_per_side: u16) -> usize {
        let n = usize::from(tiles_per_side);
        usize::from(self.face) * n * n + usize::from(self.y) * n + usize::from(self.x)
    }

    /// Centre of this cell in face-local signed coordinates, both in `[-1, 1]`.
    #[must_use]
    pub fn face_center(&self, tiles_per_side: u16) -> (f32, f32) {
        let inv = 1.0 / f32::from(tiles_per_side);
        let fx = (f32::from(self.x) + 0.5) * inv;
        let fy = (f32::from(self.y) + 0.5) * inv;
        (fx * 2.0 - 1.0, fy * 2.0 - 1.0)
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F{}_X{}_Y{}", self.face, self.x, self.y)
    }
}

/// Every key of a grid with `tiles_per_side` cells per face side, in
/// [`TileKey::linear_index`] order.
pub fn all_keys(tiles_per_side: u16) -> impl Iterator<Item = TileKey> {
    (0..FaceAxes::FACE_COUNT as u8).flat_map(move |face| {
        (0..tiles_per_side)
            .flat_map(move |y| (0..tiles_per_side).map(move |x| TileKey::new(face, x, y)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_key_equality_uses_all_fields() {
        let a = TileKey::new(2, 1, 3);
        assert_eq!(a, TileKey::new(2, 1, 3));
        assert_ne!(a, TileKey::new(3, 1, 3));
        assert_ne!(a, TileKey::new(2, 2, 3));
        assert_ne!(a, TileKey::new(2, 1, 4));
    }

    #[test]
    fn test_hashing_consistency() {
        let mut set = HashSet::new();
        let key = TileKey::new(5, 7, 9);
        set.insert(key);
        set.insert(key);
        assert_eq!(set.len(), 1);

        let mut map = HashMap::new();
        map.insert(key, "tile");
        assert_eq!(map.get(&TileKey::new(5, 7, 9)), Some(&"tile"));
    }

    #[test]
    fn test_checked_rejects_bad_face() {
        assert_eq!(
            TileKey::checked(6, 0, 0, 4),
            Err(TileKeyError::FaceOutOfRange(6))
        );
    }

    #[test]
    fn test_checked_rejects_out_of_range_coords() {
        assert!(matches!(
            TileKey::checked(0, 4, 0, 4),
            Err(TileKeyError::CoordOutOfRange { x: 4, .. })
        ));
        assert!(matches!(
            TileKey::checked(0, 0, 9, 4),
            Err(TileKeyError::CoordOutOfRange { y: 9, .. })
        ));
        assert_eq!(TileKey::checked(0, 0, 0, 0), Err(TileKeyError::EmptyGrid));
    }

    #[test]
    fn test_checked_accepts_last_cell() {
        let key = TileKey::checked(5, 3, 3, 4).expect("last cell is valid");
        assert_eq!(key, TileKey::new(5, 3, 3));
    }

    #[test]
    fn test_all_keys_covers_grid_in_linear_order() {
        let keys: Vec<TileKey> = all_keys(3).collect();
        assert_eq!(keys.len(), 6 * 3 * 3);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(key.linear_index(3), i, "key {key} out of order");
        }
        let unique: HashSet<_> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_face_center_single_tile_is_face_middle() {
        let (sx, sy) = TileKey::new(0, 0, 0).face_center(1);
        assert!(sx.abs() < 1e-6 && sy.abs() < 1e-6);
    }

    #[test]
    fn test_face_center_corners_are_symmetric() {
        let (lx, ly) = TileKey::new(0, 0, 0).face_center(4);
        let (hx, hy) = TileKey::new(0, 3, 3).face_center(4);
        assert!((lx + hx).abs() < 1e-6);
        assert!((ly + hy).abs() < 1e-6);
        assert!((lx - -0.75).abs() < 1e-6);
    }

    #[test]
    fn test_display() {
        assert_eq!(TileKey::new(3, 10, 2).to_string(), "F3_X10_Y2");
    }
}
