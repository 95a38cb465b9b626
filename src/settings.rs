//! Player preferences
//!
//! Read once at start-up from a JSON entry in LocalStorage; the game never
//! writes it. Values are passed through [`Settings::sanitized`] so a
//! hand-edited entry cannot break the controls.

use serde::{Deserialize, Serialize};

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Radians of look rotation per pixel of mouse motion
    pub mouse_sensitivity: f32,
    /// Pushing the mouse forward looks down
    pub invert_y: bool,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Show FPS counter next to the readout
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.002,
            invert_y: false,
            fov_degrees: crate::consts::CAMERA_FOV_DEGREES,
            show_fps: false,
        }
    }
}

impl Settings {
    pub const MIN_SENSITIVITY: f32 = 0.0001;
    pub const MAX_SENSITIVITY: f32 = 0.02;
    pub const MIN_FOV: f32 = 30.0;
    pub const MAX_FOV: f32 = 120.0;

    /// Clamp every value into its usable range (non-finite values reset to default)
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mouse_sensitivity = if self.mouse_sensitivity.is_finite() {
            self.mouse_sensitivity
                .clamp(Self::MIN_SENSITIVITY, Self::MAX_SENSITIVITY)
        } else {
            defaults.mouse_sensitivity
        };
        let fov_degrees = if self.fov_degrees.is_finite() {
            self.fov_degrees.clamp(Self::MIN_FOV, Self::MAX_FOV)
        } else {
            defaults.fov_degrees
        };
        Self {
            mouse_sensitivity,
            fov_degrees,
            ..self
        }
    }

    /// Vertical look delta in pixels after applying `invert_y`
    #[inline]
    pub fn look_dy(&self, dy: f32) -> f32 {
        if self.invert_y { -dy } else { dy }
    }

    /// Parse a stored JSON blob (missing fields fall back to defaults)
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str::<Self>(json).ok().map(Self::sanitized)
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "plummet_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(settings) = Self::from_json(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
                log::warn!("Ignoring unreadable settings in LocalStorage");
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.mouse_sensitivity, 0.002);
        assert_eq!(settings.fov_degrees, 70.0);
        assert!(!settings.invert_y);
    }

    #[test]
    fn test_sanitized_clamps() {
        let wild = Settings {
            mouse_sensitivity: 5.0,
            invert_y: true,
            fov_degrees: 2.0,
            show_fps: true,
        }
        .sanitized();
        assert_eq!(wild.mouse_sensitivity, Settings::MAX_SENSITIVITY);
        assert_eq!(wild.fov_degrees, Settings::MIN_FOV);
        assert!(wild.invert_y);
        assert!(wild.show_fps);
    }

    #[test]
    fn test_sanitized_replaces_nan() {
        let broken = Settings {
            mouse_sensitivity: f32::NAN,
            fov_degrees: f32::INFINITY,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(broken, Settings::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "invert_y": true }"#).unwrap();
        assert!(settings.invert_y);
        assert_eq!(settings.mouse_sensitivity, 0.002);
        assert!(Settings::from_json("not json").is_none());
    }

    #[test]
    fn test_invert_y() {
        let mut settings = Settings::default();
        assert_eq!(settings.look_dy(4.0), 4.0);
        settings.invert_y = true;
        assert_eq!(settings.look_dy(4.0), -4.0);
    }
}
