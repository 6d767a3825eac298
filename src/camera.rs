//! Camera the cloud is viewed through.

use glam::{Mat4, Vec3};

/// Orbit-parameterised perspective camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Default framing: eye at `(4.5, 4, 11)` looking at the origin, 35° fov.
    pub fn new() -> Self {
        Self::looking_at(Vec3::new(4.5, 4.0, 11.0), Vec3::ZERO)
    }

    /// Camera at `eye` looking at `target`.
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(f32::EPSILON);
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            target,
            fov_y_degrees: 35.0,
            near: 0.1,
            far: 100.0,
        }
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Distance of `point` in front of the camera along the view axis.
    pub fn view_depth(&self, point: Vec3) -> f32 {
        -self.view_matrix().transform_point3(point).z
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looking_at_round_trips_eye() {
        let camera = Camera::new();
        assert!((camera.position() - Vec3::new(4.5, 4.0, 11.0)).length() < 1e-4);
    }

    #[test]
    fn test_origin_depth_is_distance() {
        let camera = Camera::new();
        let expected = Vec3::new(4.5, 4.0, 11.0).length();
        assert!((camera.view_depth(Vec3::ZERO) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_origin_projects_to_centre() {
        let camera = Camera::new();
        let clip = camera.view_proj(4.0 / 3.0) * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..1.0).contains(&ndc.z));
    }
}
