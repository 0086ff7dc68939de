use glam::{Mat4, Vec3};
use std::f32::consts::PI;

/// Perspective camera orbiting a fixed target.
///
/// The orbit is stored in spherical form: `polar` is measured from +Y and
/// `azimuth` around +Y starting at +Z. Panning is not supported; the target
/// only moves when set explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub polar: f32,
    pub azimuth: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// Distance factor per wheel notch.
    pub zoom_step: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_at(Vec3::new(0.0, 2.0, 4.0), Vec3::new(0.0, 1.0, 0.0))
    }
}

impl OrbitCamera {
    /// Camera at `position` orbiting `target`, with the scene's default limits.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let mut cam = Self {
            target,
            distance: 1.0,
            polar: PI / 2.0,
            azimuth: 0.0,
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 100.0,
            min_distance: 0.75,
            max_distance: 10.0,
            min_polar: 0.0,
            max_polar: PI / 1.75,
            rotate_speed: 0.005,
            zoom_step: 0.95,
        };
        cam.set_position(position);
        cam
    }

    /// Move the eye to `position`, keeping the target and applying limits.
    pub fn set_position(&mut self, position: Vec3) {
        let offset = position - self.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        self.distance = distance;
        self.polar = (offset.y / distance).clamp(-1.0, 1.0).acos();
        self.azimuth = offset.x.atan2(offset.z);
        self.clamp();
    }

    pub fn position(&self) -> Vec3 {
        let s = self.polar.sin();
        self.target
            + self.distance * Vec3::new(s * self.azimuth.sin(), self.polar.cos(), s * self.azimuth.cos())
    }

    /// Orbit by a mouse drag in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.azimuth -= dx * self.rotate_speed;
        self.polar -= dy * self.rotate_speed;
        self.clamp();
    }

    /// Dolly by wheel notches; positive moves closer.
    pub fn zoom(&mut self, notches: f32) {
        self.distance *= self.zoom_step.powf(notches);
        self.clamp();
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    fn clamp(&mut self) {
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
        // Keep off the exact pole so look_at never sees a degenerate up vector.
        self.polar = self.polar.clamp(self.min_polar.max(1e-4), self.max_polar);
    }
}
