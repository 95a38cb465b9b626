//! Perspective camera attached to the player's eye

use glam::Mat4;

use crate::consts::*;
use crate::sim::player::Player;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y_degrees: CAMERA_FOV_DEGREES,
            aspect: CAMERA_ASPECT,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
        }
    }
}

impl Camera {
    /// Match the aspect ratio to the drawing buffer (ignores a zero height)
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Right-handed projection with wgpu's [0, 1] depth range
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self, player: &Player) -> Mat4 {
        self.projection() * player.view_matrix()
    }
}
