//! Damped orbit camera

use glam::{Mat4, Vec3};

/// Share of the pending rotation applied per 60 Hz frame
pub const DAMPING_FACTOR: f32 = 0.05;
pub const MIN_DISTANCE: f32 = 1.0;
pub const MAX_DISTANCE: f32 = 20.0;
/// Elevation limit either side of the horizon
pub const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_3;

/// Camera orbiting a target point. Rotation input is queued and bled in over
/// subsequent frames by [`OrbitCamera::update`]; zoom and pan apply at once.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Point the camera looks at
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle in radians
    pub yaw: f32,
    /// Vertical angle in radians
    pub pitch: f32,
    /// Field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Width / height
    pub aspect: f32,
    pending_yaw: f32,
    pending_pitch: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 5.0,
            yaw: 0.0,
            pitch: 0.0,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            aspect: 16.0 / 9.0,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera position derived from the orbit parameters
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Queue a rotation. It takes effect gradually through `update`.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.pending_yaw += delta_yaw;
        self.pending_pitch += delta_pitch;
    }

    /// Rotate immediately, bypassing damping.
    pub fn set_orbit(&mut self, yaw: f32, pitch: f32, distance: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.distance = distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
    }

    /// Scale the distance by `factor` (< 1 moves closer).
    pub fn zoom_by(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
    }

    /// Move the target within the view plane. Offsets are in screen-height
    /// units so a drag feels the same at any distance.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let scale = self.distance * (self.fov.to_radians() / 2.0).tan();
        self.target += self.right_vector() * (dx * scale) + self.up_vector() * (dy * scale);
    }

    /// Advance damping by `dt` seconds. Returns true while rotation is still
    /// settling.
    pub fn update(&mut self, dt: f32) -> bool {
        let share = 1.0 - (1.0 - DAMPING_FACTOR).powf(dt.max(0.0) * 60.0);
        let step_yaw = self.pending_yaw * share;
        let step_pitch = self.pending_pitch * share;
        self.pending_yaw -= step_yaw;
        self.pending_pitch -= step_pitch;

        self.yaw += step_yaw;
        self.pitch = (self.pitch + step_pitch).clamp(-MAX_PITCH, MAX_PITCH);

        if self.pending_yaw.abs() < 1e-5 {
            self.pending_yaw = 0.0;
        }
        if self.pending_pitch.abs() < 1e-5 {
            self.pending_pitch = 0.0;
        }
        self.pending_yaw != 0.0 || self.pending_pitch != 0.0
    }

    /// Back to the initial view, keeping the aspect ratio.
    pub fn reset(&mut self) {
        *self = Self {
            aspect: self.aspect,
            ..Self::default()
        };
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Perspective with wgpu's zero-to-one depth range
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect.max(1e-4), self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// For unprojecting screen positions
    pub fn inverse_view_projection_matrix(&self) -> Mat4 {
        self.view_projection_matrix().inverse()
    }

    pub fn forward_vector(&self) -> Vec3 {
        (self.target - self.position()).normalize_or_zero()
    }

    pub fn right_vector(&self) -> Vec3 {
        self.forward_vector().cross(Vec3::Y).normalize_or_zero()
    }

    pub fn up_vector(&self) -> Vec3 {
        self.right_vector().cross(self.forward_vector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position() {
        let camera = OrbitCamera::new();
        assert!((camera.position() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
        assert!((camera.forward_vector() - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_rotation_is_damped() {
        let mut camera = OrbitCamera::new();
        camera.rotate(1.0, 0.0);

        camera.update(1.0 / 60.0);
        assert!((camera.yaw - DAMPING_FACTOR).abs() < 1e-4);

        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        assert!((camera.yaw - 1.0).abs() < 1e-3);
        assert!(!camera.update(1.0 / 60.0));
    }

    #[test]
    fn test_damping_is_frame_rate_independent() {
        let mut a = OrbitCamera::new();
        let mut b = OrbitCamera::new();
        a.rotate(1.0, 0.0);
        b.rotate(1.0, 0.0);

        a.update(2.0 / 60.0);
        b.update(1.0 / 60.0);
        b.update(1.0 / 60.0);
        assert!((a.yaw - b.yaw).abs() < 1e-5);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut camera = OrbitCamera::new();
        camera.rotate(0.0, 10.0);
        for _ in 0..1000 {
            camera.update(1.0 / 60.0);
        }
        assert!((camera.pitch - MAX_PITCH).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut camera = OrbitCamera::new();
        camera.zoom_by(0.01);
        assert_eq!(camera.distance, MIN_DISTANCE);
        camera.zoom_by(1000.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
        camera.zoom_by(0.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_pan_moves_target_sideways() {
        let mut camera = OrbitCamera::new();
        camera.pan(1.0, 0.0);
        assert!(camera.target.x > 0.0);
        assert!(camera.target.y.abs() < 1e-5);
        assert!(camera.target.z.abs() < 1e-5);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut camera = OrbitCamera::new();
        camera.aspect = 2.0;
        camera.rotate(1.0, 0.5);
        camera.update(0.5);
        camera.zoom_by(2.0);
        camera.pan(0.3, 0.3);

        camera.reset();
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(camera.distance, 5.0);
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.aspect, 2.0);
        assert!(!camera.update(1.0 / 60.0));
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = OrbitCamera::new();
        let clip = camera.view_projection_matrix().project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
        assert!(clip.z > 0.0 && clip.z < 1.0);

        let back = camera.inverse_view_projection_matrix().project_point3(clip);
        assert!(back.length() < 1e-3);
    }
}
