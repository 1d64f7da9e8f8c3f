//! Box-vs-frustum visibility in terrain-local f32 space.

use glam::{Mat4, Vec3, Vec4};

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Vec3,
    /// Maximum corner of the bounding box.
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Cube of side `2 * half_extent` centred on `center`.
    pub fn from_center_half_extent(center: Vec3, half_extent: f32) -> Self {
        let h = Vec3::splat(half_extent);
        Self {
            min: center - h,
            max: center + h,
        }
    }

    /// Returns the center point of the AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the half-extents (half-size along each axis).
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Whether `point` lies inside or on the box.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// A view frustum defined by six inward-pointing planes.
///
/// Each `Vec4(a, b, c, d)` holds a unit inward normal `(a, b, c)` and the
/// offset `d`, so a point `p` is inside the half-space when
/// `dot(n, p) + d >= 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix with a `[0, 1]`
    /// clip depth range (glam's `perspective_rh` / `perspective_lh`).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[NEAR] = rows[2];
        planes[FAR] = rows[3] - rows[2];

        Self::from_planes(planes)
    }

    /// Build a frustum from six arbitrary planes, normalizing each one.
    pub fn from_planes(mut planes: [Vec4; 6]) -> Self {
        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }
        Self { planes }
    }

    /// The six normalized planes: left, right, bottom, top, near, far.
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Test whether an AABB intersects all six half-spaces.
    ///
    /// Uses the positive-vertex method: for each plane, the corner furthest
    /// along the plane normal is tested. Conservative near frustum corners
    /// (it may keep a box that is actually outside), never drops a box that
    /// is inside.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let p = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(p) + plane.w >= 0.0
        })
    }

    /// Test whether a point lies inside all six half-spaces.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_camera_vp() -> Mat4 {
        let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 1000.0);
        proj * view
    }

    #[test]
    fn test_object_in_front_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -5.0), Vec3::new(1.0, 1.0, -3.0));
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_object_behind_camera_not_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(1.0, 1.0, 10.0));
        assert!(!frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_object_partially_in_frustum_is_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        let aabb = Aabb::new(Vec3::new(-100.0, -1.0, -10.0), Vec3::new(1.0, 1.0, -5.0));
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_box_around_camera_is_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        let aabb = Aabb::from_center_half_extent(Vec3::ZERO, 50.0);
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_all_six_planes_tested() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());

        let behind = Aabb::new(Vec3::splat(10.0), Vec3::splat(20.0));
        assert!(!frustum.intersects_aabb(&behind));

        let left = Aabb::new(Vec3::new(-1000.0, 0.0, -5.0), Vec3::new(-999.0, 1.0, -4.0));
        assert!(!frustum.intersects_aabb(&left));

        let right = Aabb::new(Vec3::new(999.0, 0.0, -5.0), Vec3::new(1000.0, 1.0, -4.0));
        assert!(!frustum.intersects_aabb(&right));

        let above = Aabb::new(Vec3::new(0.0, 999.0, -5.0), Vec3::new(1.0, 1000.0, -4.0));
        assert!(!frustum.intersects_aabb(&above));

        let below = Aabb::new(Vec3::new(0.0, -1000.0, -5.0), Vec3::new(1.0, -999.0, -4.0));
        assert!(!frustum.intersects_aabb(&below));

        let beyond_far = Aabb::new(Vec3::new(0.0, 0.0, -2000.0), Vec3::new(1.0, 1.0, -1500.0));
        assert!(!frustum.intersects_aabb(&beyond_far));
    }

    #[test]
    fn test_near_plane_clips_points() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -0.05)));
        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -0.5)));
    }

    #[test]
    fn test_planes_are_normalized() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        for plane in frustum.planes() {
            let normal_len = plane.truncate().length();
            assert!(
                (normal_len - 1.0).abs() < 1e-4,
                "plane normal not normalized: {normal_len}"
            );
        }
    }

    #[test]
    fn test_aabb_center_extents_and_contains() {
        let aabb = Aabb::new(Vec3::new(-2.0, -3.0, -4.0), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(aabb.center(), Vec3::ZERO);
        assert_eq!(aabb.extents(), Vec3::new(2.0, 3.0, 4.0));
        assert!(aabb.contains(Vec3::new(2.0, 0.0, 0.0)));
        assert!(!aabb.contains(Vec3::new(2.1, 0.0, 0.0)));
    }
}
