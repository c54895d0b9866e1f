use glam::{Mat3, Mat4, Quat, Vec3};

/// Smallest and largest zoom factor [`Camera::zoom`] will settle on.
pub const MIN_SCALE: f32 = 0.05;
pub const MAX_SCALE: f32 = 20.0;

/// A perspective camera driven by relative move/rotate commands.
///
/// The camera's world transform is `T(position) * R(orientation)`; the view
/// matrix is its inverse. `scale` is a zoom factor: it widens the field of
/// view, and callers multiply movement deltas by it so panning speed tracks
/// the zoom level.
///
/// Nothing derived is cached. [`view_matrix`](Self::view_matrix) and
/// [`projection_matrix`](Self::projection_matrix) are cheap and recomputed
/// every frame.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    scale: f32,
    pub fov_y: f32, // radians
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            orientation: Quat::IDENTITY,
            scale: 1.0,
            fov_y: std::f32::consts::FRAC_PI_3,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    /// Turns the camera so its forward axis (-Z) points at the target.
    pub fn looking_at(mut self, target: Vec3) -> Self {
        let forward = (target - self.position).normalize_or_zero();
        if forward != Vec3::ZERO {
            self.orientation = Quat::from_rotation_arc(Vec3::NEG_Z, forward);
        }
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov_y = fov_degrees.to_radians();
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Translates the camera in world space.
    pub fn move_by(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Accumulates a rotation about the camera's local axes.
    ///
    /// The order is fixed: pitch about X, then yaw about Y, then roll about
    /// Z, each applied on the right of the current orientation.
    pub fn rotate(&mut self, d_pitch: f32, d_yaw: f32, d_roll: f32) {
        let delta = Quat::from_rotation_x(d_pitch)
            * Quat::from_rotation_y(d_yaw)
            * Quat::from_rotation_z(d_roll);
        self.orientation = (self.orientation * delta).normalize();
    }

    /// Multiplies the zoom factor, keeping it within `[MIN_SCALE, MAX_SCALE]`.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        }
    }

    /// World → view: `R⁻¹ * T(-position)`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.orientation.conjugate()) * Mat4::from_translation(-self.position)
    }

    /// Rotation part of the view matrix, for directions such as normals.
    pub fn view_rotation(&self) -> Mat3 {
        Mat3::from_quat(self.orientation.conjugate())
    }

    /// Vertical field of view after zoom.
    pub fn effective_fov(&self) -> f32 {
        let half = ((self.fov_y * 0.5).tan() * self.scale).atan();
        (half * 2.0).min(std::f32::consts::PI - 1e-3)
    }

    /// Right-handed perspective projection with depth mapped to `[0, 1]`.
    ///
    /// The perspective divide is not part of the matrix; the pipeline does
    /// it after multiplying.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.effective_fov(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn view_maps_camera_position_to_origin() {
        let mut camera = Camera::new().at(1.0, -2.0, 3.0);
        camera.move_by(Vec3::new(0.5, 0.25, -4.0) * camera.scale());
        camera.rotate(0.3, -1.1, 0.7);
        camera.move_by(Vec3::new(-2.0, 0.0, 1.0));
        camera.rotate(0.0, 0.4, 0.0);

        let origin = camera.view_matrix().transform_point3(camera.position);
        assert_abs_diff_eq!(origin.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(origin.y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(origin.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn rotation_order_is_pitch_yaw_roll() {
        let mut camera = Camera::new();
        camera.rotate(0.2, 0.5, 0.9);
        let expected =
            Quat::from_rotation_x(0.2) * Quat::from_rotation_y(0.5) * Quat::from_rotation_z(0.9);
        assert!(camera.orientation.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn point_ahead_lands_in_front_of_near_plane() {
        let camera = Camera::new().at(0.0, 0.0, 5.0).with_clip(1.0, 10.0);
        let clip = camera.view_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert_abs_diff_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
        assert_abs_diff_eq!(clip.w, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn depth_increases_with_distance() {
        let camera = Camera::new().at(0.0, 0.0, 0.0);
        let depth = |z: f32| {
            let c = camera.view_projection() * glam::Vec4::new(0.0, 0.0, z, 1.0);
            c.z / c.w
        };
        assert!(depth(-1.0) < depth(-2.0));
        assert!(depth(-2.0) < depth(-50.0));
    }

    #[test]
    fn zoom_keeps_scale_positive() {
        let mut camera = Camera::new();
        for _ in 0..100 {
            camera.zoom(0.5);
        }
        assert_eq!(camera.scale(), MIN_SCALE);
        camera.zoom(0.0);
        camera.zoom(-3.0);
        assert_eq!(camera.scale(), MIN_SCALE);
        camera.zoom(f32::INFINITY);
        assert!(camera.scale() > 0.0);
    }

    #[test]
    fn looking_at_turns_forward() {
        let camera = Camera::new().at(0.0, 0.0, 0.0).looking_at(Vec3::new(3.0, 0.0, 0.0));
        let f = camera.forward();
        assert_abs_diff_eq!(f.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(f.z, 0.0, epsilon = 1e-5);
    }
}
