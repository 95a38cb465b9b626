//! Data-driven level presets
//!
//! Everything that differs between the two levels: physics feel, readout
//! wording, which models to load and how the scene is lit.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::level::{AmbientLight, Color, Fog, HemisphereLight};

/// Lighting and atmosphere for one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLighting {
    pub ambient: AmbientLight,
    pub hemisphere: HemisphereLight,
    pub fog: Fog,
    /// Point light positions (each also gets a bulb sphere)
    pub point_lights: Vec<Vec3>,
    pub point_color: Color,
    pub point_intensity: f32,
    pub bulb_radius: f32,
}

/// Static description of a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// 360° environment image
    pub background: String,
    /// Gravity (units per tick squared)
    pub fall_speed: f32,
    /// Jump impulse (units per tick)
    pub jump_speed: f32,
    /// Readout label
    pub measurement: String,
    /// Readout suffix
    pub unit: String,
    /// Eye height shown as zero
    pub height_offset: f32,
    /// Scattered decoration model
    pub object_model: String,
    /// Platform model
    pub base_model: String,
    pub lighting: LevelLighting,
}

impl LevelConfig {
    /// High altitude: cargo planes over a helipad in hazy sky
    pub fn level_one() -> Self {
        Self {
            background: "./assets/images/level_one_environment_map.png".to_string(),
            fall_speed: 0.05,
            jump_speed: 1.0,
            measurement: "Altitude: ".to_string(),
            unit: ",000 feet".to_string(),
            height_offset: 3.0,
            object_model: "./assets/models/A400m.glb".to_string(),
            base_model: "./assets/models/helipad.glb".to_string(),
            lighting: LevelLighting {
                ambient: AmbientLight {
                    color: Color(0x404040),
                    intensity: 1.0,
                },
                hemisphere: HemisphereLight {
                    sky: Color(0xaaccff),
                    ground: Color(0x729cbc),
                    intensity: 1.0,
                },
                fog: Fog {
                    color: Color(0xdddddd),
                    near: 0.0,
                    far: 50.0,
                },
                // Helipad corner beacons
                point_lights: vec![
                    Vec3::new(16.0, 0.2, -16.0),
                    Vec3::new(16.0, 0.2, 16.0),
                    Vec3::new(-16.0, 0.2, 16.0),
                    Vec3::new(-16.0, 0.2, -16.0),
                ],
                point_color: Color(0x00ff00),
                point_intensity: 10.0,
                bulb_radius: 0.4,
            },
        }
    }

    /// Underwater: submarines over a sand bank, slower gravity
    pub fn level_two() -> Self {
        Self {
            background: "./assets/images/level_two_environment_map.png".to_string(),
            fall_speed: 0.025,
            jump_speed: 0.75,
            measurement: "Depth: ".to_string(),
            unit: " metres".to_string(),
            height_offset: 50.0,
            object_model: "./assets/models/submarine.glb".to_string(),
            base_model: "./assets/models/sand.glb".to_string(),
            lighting: LevelLighting {
                ambient: AmbientLight {
                    color: Color(0x000040),
                    intensity: 1.0,
                },
                hemisphere: HemisphereLight {
                    sky: Color(0x00ffff),
                    ground: Color(0x0000ff),
                    intensity: 1.0,
                },
                fog: Fog {
                    color: Color(0x0000cc),
                    near: 0.0,
                    far: 50.0,
                },
                point_lights: vec![Vec3::new(-0.2, 3.6, -7.8), Vec3::new(2.25, 3.5, -6.55)],
                point_color: Color(0xffff00),
                point_intensity: 15.0,
                bulb_radius: 0.2,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underwater_is_floatier() {
        let sky = LevelConfig::level_one();
        let sea = LevelConfig::level_two();
        assert!(sea.fall_speed < sky.fall_speed);
        assert!(sea.jump_speed < sky.jump_speed);
    }

    #[test]
    fn test_custom_level_from_json() {
        let json = r#"{
            "background": "cave.png",
            "fall_speed": 0.1,
            "jump_speed": 1.5,
            "measurement": "Height: ",
            "unit": " m",
            "height_offset": 0.0,
            "object_model": "rock.glb",
            "base_model": "ledge.glb",
            "lighting": {
                "ambient": { "color": 4210752, "intensity": 0.5 },
                "hemisphere": { "sky": 16777215, "ground": 0, "intensity": 1.0 },
                "fog": { "color": 0, "near": 1.0, "far": 30.0 },
                "point_lights": [[0.0, 2.0, 0.0]],
                "point_color": 16711680,
                "point_intensity": 4.0,
                "bulb_radius": 0.3
            }
        }"#;
        let config: LevelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.lighting.point_color, Color(0xff0000));
        assert_eq!(config.lighting.point_lights, vec![Vec3::new(0.0, 2.0, 0.0)]);
        assert_eq!(config.jump_speed, 1.5);
    }
}
