//! Camera snapshot consumed once per gated tick.

use glam::{Mat4, Quat, Vec3};

use crate::Frustum;

/// Position, orientation and projection of the viewer, expressed in the
/// terrain's local frame (planet centre at the origin).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSnapshot {
    /// Eye position.
    pub position: Vec3,
    /// Orientation; the camera looks down its local −Z axis.
    pub rotation: Quat,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    /// Viewport width / height.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl CameraSnapshot {
    /// Camera at `position` looking at `target` with the given up hint.
    pub fn looking_at(position: Vec3, target: Vec3, up: Vec3, fov_y_deg: f32) -> Self {
        let view = Mat4::look_at_rh(position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        Self {
            position,
            rotation,
            fov_y_deg,
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 1000.0,
        }
    }

    /// Override the clip range.
    #[must_use]
    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Override the aspect ratio.
    #[must_use]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        (self.rotation * Vec3::NEG_Z).normalize()
    }

    /// World-to-view matrix.
    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), self.rotation * Vec3::Y)
    }

    /// Perspective projection with a `[0, 1]` depth range.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    /// Combined view-projection matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Frustum planes for this snapshot.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Aabb;

    #[test]
    fn test_looking_at_forward_points_at_target() {
        let cam = CameraSnapshot::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 60.0);
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-5);

        let cam = CameraSnapshot::looking_at(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Z, 60.0);
        assert!((cam.forward() - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_frustum_sees_target_not_behind() {
        let cam = CameraSnapshot::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 60.0);
        let frustum = cam.frustum();
        assert!(frustum.intersects_aabb(&Aabb::from_center_half_extent(Vec3::ZERO, 0.5)));
        assert!(!frustum.intersects_aabb(&Aabb::from_center_half_extent(
            Vec3::new(0.0, 0.0, 10.0),
            0.5
        )));
    }

    #[test]
    fn test_builders_override_projection() {
        let cam = CameraSnapshot::looking_at(Vec3::Z, Vec3::ZERO, Vec3::Y, 45.0)
            .with_clip(0.5, 50.0)
            .with_aspect(1.0);
        assert_eq!(cam.near, 0.5);
        assert_eq!(cam.far, 50.0);
        assert_eq!(cam.aspect, 1.0);
    }
}
