// src/viewer/camera.rs
// Orbit camera for the interactive viewer: rotate around the mesh center
// with mouse drag, zoom with the wheel. World is Z-up (east, north, up).

use glam::{Mat4, Vec3};
use std::f32::consts::PI;

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,   // radians around +Z
    pub pitch: f32, // radians above the horizon
    min_distance: f32,
    max_distance: f32,
}

impl OrbitCamera {
    /// Frame a mesh given its half-extents, looking from the southwest at
    /// an isometric-feeling angle.
    pub fn framing(half_extents: (f32, f32, f32)) -> Self {
        let (hx, hy, hz) = half_extents;
        let radius = (hx * hx + hy * hy + hz * hz).sqrt().max(1.0);
        let distance = radius * 2.2;
        Self {
            target: Vec3::ZERO,
            distance,
            yaw: -PI / 4.0,
            pitch: 0.6,
            min_distance: radius * 0.05,
            max_distance: radius * 20.0,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.cos();
        let y = self.distance * self.pitch.cos() * self.yaw.sin();
        let z = self.distance * self.pitch.sin();
        self.target + Vec3::new(x, y, z)
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-PI / 2.0 + 0.01, PI / 2.0 - 0.01);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance =
            (self.distance * (1.0 - delta * 0.1)).clamp(self.min_distance, self.max_distance);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Z)
    }
}

/// Mouse-driven controller wrapping the orbit state.
pub struct CameraController {
    pub orbit: OrbitCamera,
    pub mouse_pressed: bool,
    pub last_mouse_pos: Option<(f32, f32)>,
    mouse_sensitivity: f32,
}

impl CameraController {
    pub fn new(orbit: OrbitCamera) -> Self {
        Self {
            orbit,
            mouse_pressed: false,
            last_mouse_pos: None,
            mouse_sensitivity: 0.005,
        }
    }

    pub fn handle_mouse_move(&mut self, x: f32, y: f32) {
        if let Some((last_x, last_y)) = self.last_mouse_pos {
            if self.mouse_pressed {
                let delta_yaw = -(x - last_x) * self.mouse_sensitivity;
                let delta_pitch = (y - last_y) * self.mouse_sensitivity;
                self.orbit.rotate(delta_yaw, delta_pitch);
            }
        }
        self.last_mouse_pos = Some((x, y));
    }

    pub fn handle_mouse_scroll(&mut self, delta: f32) {
        self.orbit.zoom(delta);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.orbit.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_looks_at_origin_from_above_horizon() {
        let cam = OrbitCamera::framing((100.0, 100.0, 20.0));
        assert!(cam.eye().z > 0.0);
        assert!(cam.distance > 100.0);
    }

    #[test]
    fn pitch_stays_clamped() {
        let mut cam = OrbitCamera::framing((1.0, 1.0, 1.0));
        cam.rotate(0.0, 10.0);
        assert!(cam.pitch < PI / 2.0);
        cam.rotate(0.0, -20.0);
        assert!(cam.pitch > -PI / 2.0);
    }

    #[test]
    fn zoom_stays_clamped() {
        let mut cam = OrbitCamera::framing((1.0, 1.0, 1.0));
        let initial = cam.distance;
        for _ in 0..200 {
            cam.zoom(1.0);
        }
        assert!(cam.distance > 0.0 && cam.distance < initial);
        for _ in 0..500 {
            cam.zoom(-1.0);
        }
        assert!(cam.distance <= cam.max_distance);
    }
}
