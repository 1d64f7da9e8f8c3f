//! Per-face orientation frames shared by every producer of tile positions.
//!
//! Geometry building, culling precompute and priority scoring all derive
//! tile positions from the same `(up, axis_a, axis_b)` triple. If any of
//! them disagreed on the frame, a tile would be culled in one place and
//! built somewhere else, so the derivation lives here and is validated once
//! at start-up.

use glam::Vec3;
use thiserror::Error;

/// Minimum dot product between an expected and a produced face normal.
pub const FACE_DOT_TOLERANCE: f32 = 0.999;

/// Maximum absolute dot product between two axes of one frame.
pub const ORTHOGONALITY_TOLERANCE: f32 = 1e-3;

/// Invariant violations found while validating face frames.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FaceAxesError {
    /// A producer's face normal does not match the canonical one.
    #[error("face #{face} normal mismatch: expected {expected}, got {got} (dot={dot:.6})")]
    NormalMismatch {
        /// Face index.
        face: u8,
        /// Canonical normal.
        expected: Vec3,
        /// Normal reported by the producer.
        got: Vec3,
        /// Dot product of the two normalized vectors.
        dot: f32,
    },
    /// The frame's axes are not mutually orthogonal.
    #[error("face #{face} axes not orthogonal: |up.a|={up_a:e}, |up.b|={up_b:e}, |a.b|={a_b:e}")]
    NotOrthogonal {
        /// Face index.
        face: u8,
        /// `|up · axis_a|`
        up_a: f32,
        /// `|up · axis_b|`
        up_b: f32,
        /// `|axis_a · axis_b|`
        a_b: f32,
    },
}

/// Orientation frame of one cube face.
///
/// `axis_a = (up.y, up.z, up.x)` and `axis_b = up × axis_a`. Tile `(x, y)`
/// spans `axis_a` horizontally and `axis_b` vertically.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceAxes {
    /// Outward face normal.
    pub up: Vec3,
    /// First in-plane axis.
    pub axis_a: Vec3,
    /// Second in-plane axis.
    pub axis_b: Vec3,
}

impl FaceAxes {
    /// Number of cube faces.
    pub const FACE_COUNT: usize = 6;

    /// Canonical face normals, in face-index order: +Y, −Y, −X, +X, +Z, −Z.
    pub const FACE_UP: [Vec3; 6] = [
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::NEG_X,
        Vec3::X,
        Vec3::Z,
        Vec3::NEG_Z,
    ];

    /// Derive the frame for an arbitrary outward normal.
    #[must_use]
    pub fn from_up(up: Vec3) -> Self {
        let axis_a = Vec3::new(up.y, up.z, up.x);
        let axis_b = up.cross(axis_a);
        Self { up, axis_a, axis_b }
    }

    /// Frame of the given face.
    ///
    /// # Panics
    ///
    /// Panics if `face >= 6`.
    #[must_use]
    pub fn for_face(face: u8) -> Self {
        let index = usize::from(face);
        assert!(
            index < Self::FACE_COUNT,
            "face index {face} out of range (0..6)"
        );
        Self::from_up(Self::FACE_UP[index])
    }

    /// Frames of all six faces in face-index order.
    #[must_use]
    pub fn all() -> [FaceAxes; 6] {
        Self::FACE_UP.map(Self::from_up)
    }

    /// Point on the unit cube for signed face-local coordinates `(sx, sy)`
    /// in `[-1, 1]`.
    #[must_use]
    pub fn cube_point(&self, sx: f32, sy: f32) -> Vec3 {
        self.up + self.axis_a * sx + self.axis_b * sy
    }

    /// Point on a sphere of `radius` for signed face-local coordinates.
    #[must_use]
    pub fn sphere_point(&self, sx: f32, sy: f32, radius: f32) -> Vec3 {
        self.cube_point(sx, sy).normalize() * radius
    }

    /// Check that this frame's axes are mutually orthogonal.
    pub fn check_orthogonal(&self, face: u8) -> Result<(), FaceAxesError> {
        let up_a = self.up.dot(self.axis_a).abs();
        let up_b = self.up.dot(self.axis_b).abs();
        let a_b = self.axis_a.dot(self.axis_b).abs();
        if up_a > ORTHOGONALITY_TOLERANCE
            || up_b > ORTHOGONALITY_TOLERANCE
            || a_b > ORTHOGONALITY_TOLERANCE
        {
            return Err(FaceAxesError::NotOrthogonal {
                face,
                up_a,
                up_b,
                a_b,
            });
        }
        Ok(())
    }
}

/// Validate a producer's face frames against the canonical derivation.
///
/// `produced` is called once per face and must return the frame that
/// producer uses for that face. Fails on the first face whose normal
/// disagrees with [`FaceAxes::FACE_UP`] or whose axes are not orthogonal.
pub fn validate_face_axes(mut produced: impl FnMut(u8) -> FaceAxes) -> Result<(), FaceAxesError> {
    for (index, expected) in FaceAxes::FACE_UP.iter().enumerate() {
        let face = index as u8;
        let axes = produced(face);

        let expected = expected.normalize();
        let got = axes.up.normalize_or_zero();
        let dot = expected.dot(got);
        if dot < FACE_DOT_TOLERANCE {
            return Err(FaceAxesError::NormalMismatch {
                face,
                expected,
                got,
                dot,
            });
        }

        axes.check_orthogonal(face)?;
    }
    Ok(())
}
