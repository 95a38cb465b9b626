//! First-person player: eye position and look angles
//!
//! Follows pointer-lock control conventions: yaw about +Y, pitch about the
//! camera's X axis, looking down -Z at zero yaw. Movement helpers translate
//! along the horizontal projection of the view, so looking up or down never
//! changes walking speed.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use std::f32::consts::FRAC_PI_2;

/// The player's eye (the camera the level is viewed through)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec3,
    /// Rotation about +Y (radians)
    pub yaw: f32,
    /// Rotation about the camera X axis, clamped to [-π/2, π/2]
    pub pitch: f32,
}

impl Player {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Apply relative mouse movement (pixels) to the look angles
    pub fn look(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw -= dx * sensitivity;
        self.pitch = (self.pitch - dy * sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Horizontal forward axis
    pub fn forward_xz(&self) -> Vec3 {
        let (sin, cos) = self.yaw.sin_cos();
        Vec3::new(-sin, 0.0, -cos)
    }

    /// Horizontal right axis
    pub fn right_xz(&self) -> Vec3 {
        let (sin, cos) = self.yaw.sin_cos();
        Vec3::new(cos, 0.0, -sin)
    }

    /// Full view direction including pitch
    pub fn view_direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.forward_xz() * distance;
    }

    pub fn move_right(&mut self, distance: f32) {
        self.position += self.right_xz() * distance;
    }

    /// World-to-eye transform
    pub fn view_matrix(&self) -> Mat4 {
        let eye_to_world = Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(self.yaw)
            * Mat4::from_rotation_x(self.pitch);
        eye_to_world.inverse()
    }
}
