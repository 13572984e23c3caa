//! Orbit camera for viewing the cloud.

use glam::{Mat4, Vec3};

/// Spherical-coordinate orbit camera around a fixed target.
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.3,
            distance: 25.0,
            target: Vec3::ZERO,
        }
    }

    /// Rotate by a mouse-drag delta in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(-1.5, 1.5);
    }

    /// Zoom by a scroll amount in lines.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance - scroll * 1.5).clamp(5.0, 100.0);
    }

    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Combined view-projection matrix for the given aspect ratio.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(75.0_f32.to_radians(), aspect, 0.1, 1000.0);
        proj * self.view_matrix()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_respects_distance() {
        let cam = OrbitCamera::new();
        assert!((cam.position().length() - cam.distance).abs() < 1e-4);
    }

    #[test]
    fn test_pitch_clamps() {
        let mut cam = OrbitCamera::new();
        cam.orbit(0.0, 1e6);
        assert!(cam.pitch <= 1.5);
        cam.orbit(0.0, -1e6);
        assert!(cam.pitch >= -1.5);
    }

    #[test]
    fn test_zoom_clamps() {
        let mut cam = OrbitCamera::new();
        cam.zoom(1e6);
        assert!(cam.distance >= 5.0);
        cam.zoom(-1e6);
        assert!(cam.distance <= 100.0);
    }
}
