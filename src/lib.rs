//! Plummet - first-person platform hopping across two floating levels
//!
//! Core modules:
//! - `sim`: Deterministic simulation (levels, placement, ground contact, session)
//! - `levels`: Data-driven level presets
//! - `assets`: Model fetching and triangle mesh extraction
//! - `renderer`: WebGPU rendering pipeline
//! - `settings`: Player preferences

pub mod assets;
pub mod levels;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use levels::{LevelConfig, LevelLighting};
pub use settings::Settings;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (60 Hz, one tick per frame on a 60 Hz display)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Player starts here when a level is built
    pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, 3.0, 0.0);
    /// Player is put back here after falling out of the world
    pub const RESET_POSITION: Vec3 = Vec3::new(0.0, 5.0, 0.0);
    /// Falling below this height triggers a reset
    pub const FALL_FLOOR: f32 = -100.0;

    /// Distance moved per tick per held direction key
    pub const MOVE_STEP: f32 = 0.1;
    /// Length of the downward ground-contact ray
    pub const GROUND_RAY_LENGTH: f32 = 3.0;

    /// Decorative objects requested per level
    pub const OBJECT_COUNT: usize = 30;
    /// Half-width of the square the objects are scattered over
    pub const SCATTER_HALF_WIDTH: f32 = 16.0;
    /// Lowest scatter height
    pub const SCATTER_MIN_Y: f32 = 5.0;
    /// Vertical extent of the scatter band
    pub const SCATTER_HEIGHT_RANGE: f32 = 40.0;
    /// Two centres closer than this on x AND z ...
    pub const OVERLAP_HORIZONTAL: f32 = 10.0;
    /// ... AND closer than this on y count as overlapping
    pub const OVERLAP_VERTICAL: f32 = 2.0;
    /// Candidates drawn for one object before it is dropped
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 10_000;

    /// Uniform scale of scattered objects
    pub const OBJECT_SCALE: f32 = 3.0;
    /// Uniform scale of the base platform
    pub const BASE_SCALE: f32 = 15.0;

    /// Camera defaults
    pub const CAMERA_FOV_DEGREES: f32 = 70.0;
    pub const CAMERA_ASPECT: f32 = 2.0;
    pub const CAMERA_NEAR: f32 = 0.1;
    pub const CAMERA_FAR: f32 = 100.0;
}

/// Round half toward positive infinity (browser `Math.round` semantics)
#[inline]
pub fn round_half_up(value: f32) -> f32 {
    (value + 0.5).floor()
}

/// Rotate a point about the Y axis
#[inline]
pub fn rotate_y(point: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(point.x * cos + point.z * sin, point.y, -point.x * sin + point.z * cos)
}

/// Seed from a `?seed=N` style query string, if present and numeric
pub fn seed_from_query(query: &str) -> Option<u64> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "seed")
        .and_then(|(_, value)| value.parse().ok())
}
