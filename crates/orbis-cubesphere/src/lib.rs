//! Cube-sphere tile identity and the per-face axis frames every tile producer shares.

mod face_axes;
mod tile_key;

pub use face_axes::{
    FACE_DOT_TOLERANCE, FaceAxes, FaceAxesError, ORTHOGONALITY_TOLERANCE, validate_face_axes,
};
pub use tile_key::{TileKey, TileKeyError, all_keys};
