use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

/// Smallest near plane distance accepted from edits.
pub const MIN_NEAR: f32 = 0.1;
/// Minimum gap kept between the near and far planes.
pub const NEAR_FAR_GAP: f32 = 0.5;
/// Field-of-view limits in degrees.
pub const MIN_FOVY: f32 = 1.0;
pub const MAX_FOVY: f32 = 100.0;
/// Distance moved along Z per wheel notch when dollying.
pub const DOLLY_STEP: f32 = 0.1;
/// Smallest eye-to-target depth the eye-only dolly leaves.
pub const MIN_EYE_GAP: f32 = DOLLY_STEP * 0.5;
/// Orbit rotation per pixel of pointer drag.
pub const ORBIT_DEGREES_PER_PIXEL: f32 = 0.5;

/// What a wheel notch does to the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WheelMode {
    /// Change the vertical field of view.
    #[default]
    Fov,
    /// Move eye and target together along Z.
    DollyRig,
    /// Move the eye toward or away from the target along Z.
    DollyEye,
}

/// A look-at camera with a perspective projection.
///
/// Matrices are derived on demand from the stored fields and are never cached,
/// so an edit is visible in the very next frame.
///
/// # Example
/// ```
/// use lightbox::{Camera, WheelMode};
///
/// let mut camera = Camera::new();
/// camera.wheel(1.0, WheelMode::Fov);
/// assert_eq!(camera.fovy, 46.0);
///
/// camera.set_near(19.8);
/// assert!(camera.far - camera.near >= 0.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub at: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            at: Vec3::ZERO,
            up: Vec3::Y,
            fovy: 45.0,
            near: 1.5,
            far: 20.0,
            aspect: 1.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// World-to-camera transform.
    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.eye, self.at, self.up)
    }

    /// Camera-to-clip transform.
    pub fn projection_matrix(&self) -> Mat4 {
        perspective(self.fovy, self.aspect, self.near, self.far)
    }

    /// Distance between eye and target.
    pub fn distance(&self) -> f32 {
        self.eye.distance(self.at)
    }

    /// Applies one wheel event. Only the sign of `notches` matters.
    pub fn wheel(&mut self, notches: f32, mode: WheelMode) {
        if notches == 0.0 {
            return;
        }
        let delta = notches.signum();
        match mode {
            WheelMode::Fov => {
                let at_limit = (self.fovy <= MIN_FOVY && delta < 0.0)
                    || (self.fovy >= MAX_FOVY && delta > 0.0);
                if !at_limit {
                    self.fovy = (self.fovy + delta).clamp(MIN_FOVY, MAX_FOVY);
                }
            }
            WheelMode::DollyRig => {
                self.eye.z += delta * DOLLY_STEP;
                self.at.z += delta * DOLLY_STEP;
            }
            WheelMode::DollyEye => {
                let z = self.eye.z + delta * DOLLY_STEP;
                if z - self.at.z >= MIN_EYE_GAP {
                    self.eye.z = z;
                }
            }
        }
    }

    /// Orbits eye and up about `at` by a screen-space drag of `delta` pixels.
    ///
    /// The rotation axis is the drag direction turned by 90° in view space and
    /// carried back to world space with the inverse view matrix.
    pub fn orbit(&mut self, delta: Vec2) {
        let pixels = delta.length();
        if pixels <= f32::EPSILON {
            return;
        }

        // Screen Y grows downward, view-space Y upward.
        let view_axis = Vec3::new(delta.y, delta.x, 0.0);
        let world_axis = self.view_matrix().inverse().transform_vector3(view_axis);
        let Some(axis) = world_axis.try_normalize() else {
            return;
        };

        let angle = -(pixels * ORBIT_DEGREES_PER_PIXEL).to_radians();
        let rotation = Quat::from_axis_angle(axis, angle);
        self.eye = self.at + rotation * (self.eye - self.at);
        self.up = (rotation * self.up).normalize_or(Vec3::Y);
    }

    /// Sets the field of view, clamped to the wheel limits.
    pub fn set_fovy(&mut self, degrees: f32) {
        self.fovy = degrees.clamp(MIN_FOVY, MAX_FOVY);
    }

    /// Sets the near plane; pulls the far plane out if the gap would close.
    pub fn set_near(&mut self, near: f32) {
        self.near = near.max(MIN_NEAR);
        if self.near > self.far - NEAR_FAR_GAP {
            self.far = self.near + NEAR_FAR_GAP;
        }
    }

    /// Sets the far plane; pushes the near plane in if the gap would close.
    pub fn set_far(&mut self, far: f32) {
        self.far = far.max(MIN_NEAR + NEAR_FAR_GAP);
        if self.far < self.near + NEAR_FAR_GAP {
            self.near = self.far - NEAR_FAR_GAP;
        }
    }

    pub fn set_eye(&mut self, eye: Vec3) {
        self.eye = eye;
    }

    pub fn set_at(&mut self, at: Vec3) {
        self.at = at;
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
    }

    /// Recomputes the aspect ratio for a new surface size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }
}

/// Right-handed view transform looking from `eye` toward `at`.
///
/// `eye` must differ from `at` and `up` must not be parallel to `at - eye`;
/// the result is meaningless otherwise.
pub fn look_at(eye: Vec3, at: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, at, up)
}

/// Right-handed perspective projection with a `[0, 1]` depth range.
///
/// Requires `0 < near < far` and `fovy_degrees` in `(0, 180)`.
pub fn perspective(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fovy_degrees.to_radians(), aspect, near, far)
}

/// Inverse-transpose of the upper 3×3 of `model_view`, widened back to a Mat4.
pub fn normal_matrix(model_view: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(model_view).inverse().transpose())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fovy_never_leaves_its_range() {
        let mut camera = Camera::new();
        for _ in 0..200 {
            camera.wheel(1.0, WheelMode::Fov);
            assert!((MIN_FOVY..=MAX_FOVY).contains(&camera.fovy));
        }
        assert_eq!(camera.fovy, MAX_FOVY);

        for _ in 0..200 {
            camera.wheel(-3.0, WheelMode::Fov);
            assert!((MIN_FOVY..=MAX_FOVY).contains(&camera.fovy));
        }
        assert_eq!(camera.fovy, MIN_FOVY);
    }

    #[test]
    fn fovy_steps_one_degree_per_notch() {
        let mut camera = Camera::new();
        camera.wheel(-120.0, WheelMode::Fov);
        assert_eq!(camera.fovy, 44.0);
    }

    #[test]
    fn rig_dolly_preserves_separation() {
        let mut camera = Camera::new();
        let before = camera.eye - camera.at;
        for _ in 0..7 {
            camera.wheel(-1.0, WheelMode::DollyRig);
        }
        assert!((camera.eye - camera.at).abs_diff_eq(before, 1e-5));
        assert!((camera.at.z + 0.7).abs() < 1e-5);
    }

    #[test]
    fn eye_dolly_never_crosses_target() {
        let mut camera = Camera::new();
        for _ in 0..200 {
            camera.wheel(-1.0, WheelMode::DollyEye);
            assert!(camera.eye.z - camera.at.z >= MIN_EYE_GAP);
        }
        assert!(camera.view_matrix().is_finite());
        camera.wheel(1.0, WheelMode::DollyEye);
        assert!(camera.eye.z > camera.at.z);
    }

    #[test]
    fn eye_dolly_stops_short_of_target() {
        let mut camera = Camera::new();
        camera.set_eye(Vec3::new(0.0, 0.0, 0.1));
        camera.wheel(-1.0, WheelMode::DollyEye);
        assert_eq!(camera.eye, Vec3::new(0.0, 0.0, 0.1));
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn near_far_gap_holds_for_all_edits() {
        let mut camera = Camera::new();
        for value in [0.0, 0.1, 5.0, 19.8, 25.0, 0.3, 100.0, -4.0] {
            camera.set_near(value);
            assert!(camera.far - camera.near >= NEAR_FAR_GAP - 1e-5);
            camera.set_far(value);
            assert!(camera.far - camera.near >= NEAR_FAR_GAP - 1e-5);
            assert!(camera.near >= MIN_NEAR - 1e-6);
        }
    }

    #[test]
    fn raising_near_pulls_far() {
        let mut camera = Camera::new();
        camera.set_near(19.8);
        assert_eq!(camera.near, 19.8);
        assert!((camera.far - 20.3).abs() < 1e-5);
    }

    #[test]
    fn lowering_far_pushes_near() {
        let mut camera = Camera::new();
        camera.set_far(1.0);
        assert_eq!(camera.far, 1.0);
        assert!((camera.near - 0.5).abs() < 1e-6);
    }

    #[test]
    fn orbit_keeps_target_and_distance() {
        let mut camera = Camera::new();
        let distance = camera.distance();
        camera.orbit(Vec2::new(40.0, -15.0));
        camera.orbit(Vec2::new(-3.0, 22.0));
        assert_eq!(camera.at, Vec3::ZERO);
        assert!((camera.distance() - distance).abs() < 1e-4);
        assert!((camera.up.length() - 1.0).abs() < 1e-4);
        assert!(camera.up.dot((camera.at - camera.eye).normalize()).abs() < 1e-4);
    }

    #[test]
    fn horizontal_drag_orbits_about_vertical_axis() {
        let mut camera = Camera::new();
        camera.orbit(Vec2::new(180.0, 0.0));
        // 90 degrees about +Y carried the eye from +Z onto the X axis.
        assert!(camera.eye.y.abs() < 1e-4);
        assert!(camera.eye.z.abs() < 1e-4);
        assert!((camera.eye.x.abs() - 5.0).abs() < 1e-4);
        assert!(camera.up.abs_diff_eq(Vec3::Y, 1e-4));
    }

    #[test]
    fn zero_drag_is_a_no_op() {
        let mut camera = Camera::new();
        camera.orbit(Vec2::ZERO);
        assert_eq!(camera, Camera::new());
    }

    #[test]
    fn resize_only_touches_aspect() {
        let mut camera = Camera::new();
        camera.resize(1920, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
        camera.resize(800, 0);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(Camera { aspect: 1.0, ..camera }, Camera::new());
    }

    #[test]
    fn default_projection_matches_perspective_formula() {
        let camera = Camera::new().with_aspect(16.0 / 9.0);
        let projection = camera.projection_matrix();

        let f = 1.0 / (45.0_f32.to_radians() / 2.0).tan();
        let (near, far) = (1.5, 20.0);
        #[rustfmt::skip]
        let expected = Mat4::from_cols_array(&[
            f / (16.0 / 9.0), 0.0, 0.0, 0.0,
            0.0, f, 0.0, 0.0,
            0.0, 0.0, far / (near - far), -1.0,
            0.0, 0.0, near * far / (near - far), 0.0,
        ]);
        assert!(projection.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn default_view_looks_down_negative_z() {
        let view = Camera::new().view_matrix();
        let origin = view.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-6));
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model_view = Mat4::from_scale(Vec3::new(3.0, 0.1, 3.0));
        let normals = normal_matrix(model_view);
        let n = normals.transform_vector3(Vec3::Y).normalize();
        assert!(n.abs_diff_eq(Vec3::Y, 1e-6));
        assert_eq!(normals.w_axis, glam::Vec4::W);
    }
}
