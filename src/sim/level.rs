//! Level state and lifecycle
//!
//! A level is plain data: the player, the placed scene objects with a
//! parallel list of placement centres, movement intent, and the two fields
//! (`fall`, `can_jump`) that make up the ground-contact state machine.
//! Behaviour lives in free functions (`tick`, `key_down`, ...) and in the
//! few lifecycle methods below.

use std::sync::Arc;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Collider};
use super::mesh::ModelMesh;
use super::placement::{Placement, ScatterRegion, place_object};
use super::player::Player;
use crate::consts::*;
use crate::levels::LevelConfig;
use crate::round_half_up;

/// Which of the two levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelId {
    One,
    Two,
}

impl LevelId {
    pub const ALL: [LevelId; 2] = [LevelId::One, LevelId::Two];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            LevelId::One => 0,
            LevelId::Two => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelId::One => "level one",
            LevelId::Two => "level two",
        }
    }
}

/// What a scene object is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// The platform the player starts on
    Base,
    /// A scattered model
    Decoration,
}

/// A placed model in a level's scene
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub kind: ObjectKind,
    /// Model the object was built from
    pub model: String,
    pub placement: Placement,
    /// Model-space triangles, shared by every copy of the model
    pub mesh: Arc<ModelMesh>,
    /// The same triangles in world space
    pub collider: Collider,
}

impl SceneObject {
    pub fn new(kind: ObjectKind, model: &str, mesh: Arc<ModelMesh>, placement: Placement) -> Self {
        let world: Vec<Vec3> = mesh.positions.iter().map(|&p| placement.apply(p)).collect();
        let collider = Collider::new(&world, &mesh.triangles);
        Self {
            kind,
            model: model.to_string(),
            placement,
            mesh,
            collider,
        }
    }

    /// World-space bounds
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.collider.bounds
    }
}

/// Held movement keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFlags {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// RGB colour from a 0xRRGGBB literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn to_rgb(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b]
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Sky colour from above blending to ground colour from below
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HemisphereLight {
    pub sky: Color,
    pub ground: Color,
    pub intensity: f32,
}

/// A point light with a visible bulb sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    pub bulb_radius: f32,
}

/// Linear distance fog
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

/// Everything that lights a level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneLights {
    pub ambient: Vec<AmbientLight>,
    pub hemisphere: Vec<HemisphereLight>,
    pub points: Vec<PointLight>,
    pub fog: Option<Fog>,
}

/// One playable level
#[derive(Debug, Clone)]
pub struct Level {
    pub id: LevelId,
    /// Environment map identifier
    pub background: String,
    /// Subtracted from `fall` every tick
    pub fall_speed: f32,
    /// `fall` is set to this on jump
    pub jump_speed: f32,
    /// Readout label, e.g. "Altitude: "
    pub measurement: String,
    /// Readout suffix, e.g. ",000 feet"
    pub unit: String,
    /// Subtracted from the eye height before display
    pub height_offset: f32,
    /// Model scattered over the platform
    pub object_model: String,
    /// Model used for the platform
    pub base_model: String,

    pub player: Player,
    /// Scene objects (base and decorations) in load order
    pub objects: Vec<SceneObject>,
    /// `object_centers[i]` is where `objects[i]` was placed
    pub object_centers: Vec<Vec3>,
    /// Index of the platform in `objects` once it has loaded
    pub base: Option<usize>,

    pub movement: MovementFlags,
    pub can_jump: bool,
    /// Vertical velocity (units per tick, positive is up)
    pub fall: f32,
    /// Last height readout (set while standing on something)
    pub readout: Option<String>,

    pub lights: SceneLights,
}

impl Level {
    /// Build an empty level from a preset and apply its lighting
    pub fn new(id: LevelId, config: &LevelConfig) -> Self {
        let mut level = Self {
            id,
            background: config.background.clone(),
            fall_speed: config.fall_speed,
            jump_speed: config.jump_speed,
            measurement: config.measurement.clone(),
            unit: config.unit.clone(),
            height_offset: config.height_offset,
            object_model: config.object_model.clone(),
            base_model: config.base_model.clone(),
            player: Player::new(SPAWN_POSITION),
            objects: Vec::new(),
            object_centers: Vec::new(),
            base: None,
            movement: MovementFlags::default(),
            can_jump: true,
            fall: 0.0,
            readout: None,
            lights: SceneLights::default(),
        };

        let lighting = &config.lighting;
        level.add_ambient_light(lighting.ambient.color, lighting.ambient.intensity);
        level.add_hemisphere_light(
            lighting.hemisphere.sky,
            lighting.hemisphere.ground,
            lighting.hemisphere.intensity,
        );
        level.set_fog(lighting.fog);
        level.add_point_lights(
            &lighting.point_lights,
            lighting.point_color,
            lighting.point_intensity,
            lighting.bulb_radius,
        );
        level
    }

    /// Put the player back above the platform. Nothing else is touched.
    pub fn reset(&mut self) {
        self.player.position = RESET_POSITION;
    }

    pub fn add_ambient_light(&mut self, color: Color, intensity: f32) {
        self.lights.ambient.push(AmbientLight { color, intensity });
    }

    pub fn add_hemisphere_light(&mut self, sky: Color, ground: Color, intensity: f32) {
        self.lights.hemisphere.push(HemisphereLight {
            sky,
            ground,
            intensity,
        });
    }

    /// One point light (and bulb of radius `size`) per location
    pub fn add_point_lights(
        &mut self,
        locations: &[Vec3],
        color: Color,
        intensity: f32,
        size: f32,
    ) {
        self.lights
            .points
            .extend(locations.iter().map(|&position| PointLight {
                position,
                color,
                intensity,
                bulb_radius: size,
            }));
    }

    pub fn set_fog(&mut self, fog: Fog) {
        self.lights.fog = Some(fog);
    }

    /// Add the loaded platform at the origin. Returns its object index.
    pub fn add_base(&mut self, model: &str, mesh: Arc<ModelMesh>) -> usize {
        let object = SceneObject::new(ObjectKind::Base, model, mesh, Placement::base());
        let size = object.bounds().size();
        let index = self.push_object(object);
        self.base = Some(index);
        log::info!(
            "{}: base '{}' loaded, {:.1} x {:.1}",
            self.id.as_str(),
            model,
            size.x,
            size.z
        );
        index
    }

    /// Scatter one loaded decorative model. Returns its object index, or
    /// `None` if no clear spot was found within the attempt budget.
    pub fn add_object<R: Rng>(
        &mut self,
        rng: &mut R,
        region: &ScatterRegion,
        model: &str,
        mesh: Arc<ModelMesh>,
    ) -> Option<usize> {
        let centers = &self.object_centers;
        let Some(placement) = place_object(rng, region, centers, MAX_PLACEMENT_ATTEMPTS) else {
            log::warn!(
                "{}: no clear spot for '{}' after {} attempts, skipping",
                self.id.as_str(),
                model,
                MAX_PLACEMENT_ATTEMPTS
            );
            return None;
        };

        log::debug!(
            "{}: placed '{}' at {:?} (rot {:.2})",
            self.id.as_str(),
            model,
            placement.position,
            placement.rotation_y
        );
        Some(self.push_object(SceneObject::new(
            ObjectKind::Decoration,
            model,
            mesh,
            placement,
        )))
    }

    fn push_object(&mut self, object: SceneObject) -> usize {
        self.object_centers.push(object.placement.position);
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Whether the platform has arrived (controls can only be locked then)
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// World-space triangles of every scene object
    pub fn colliders(&self) -> impl Iterator<Item = &Collider> {
        self.objects.iter().map(|o| &o.collider)
    }

    /// Height display text for the current eye position
    pub fn height_readout(&self) -> String {
        let height = round_half_up(self.player.position.y - self.height_offset) as i64;
        format!("{}{}{}", self.measurement, height, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::LevelConfig;
    use crate::sim::mesh::DEFAULT_COLOR;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn unit_box() -> Arc<ModelMesh> {
        let aabb = Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5));
        Arc::new(ModelMesh::cuboid(&aabb, DEFAULT_COLOR))
    }

    #[test]
    fn test_new_level_state() {
        let level = Level::new(LevelId::One, &LevelConfig::level_one());
        assert_eq!(level.player.position, Vec3::new(0.0, 3.0, 0.0));
        assert!(level.can_jump);
        assert_eq!(level.fall, 0.0);
        assert!(level.objects.is_empty());
        assert!(!level.has_base());
        assert_eq!(level.lights.ambient.len(), 1);
        assert_eq!(level.lights.hemisphere.len(), 1);
        assert_eq!(level.lights.points.len(), 4);
        assert!(level.lights.fog.is_some());
    }

    #[test]
    fn test_reset_only_moves_player() {
        let mut level = Level::new(LevelId::Two, &LevelConfig::level_two());
        level.player.position = Vec3::new(4.0, -150.0, 2.0);
        level.player.yaw = 1.0;
        level.fall = -3.0;
        level.can_jump = false;
        level.movement.forward = true;

        level.reset();

        assert_eq!(level.player.position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(level.player.yaw, 1.0);
        assert_eq!(level.fall, -3.0);
        assert!(!level.can_jump);
        assert!(level.movement.forward);
    }

    #[test]
    fn test_base_is_recorded_with_centre() {
        let mut level = Level::new(LevelId::One, &LevelConfig::level_one());
        let index = level.add_base("helipad.glb", unit_box());
        assert_eq!(level.base, Some(index));
        assert_eq!(level.object_centers, vec![Vec3::ZERO]);
        assert_eq!(level.objects[index].placement.scale, BASE_SCALE);
        // Scaled 15x
        assert!((level.objects[index].bounds().size() - Vec3::splat(15.0)).length() < 1e-4);
    }

    #[test]
    fn test_centres_track_objects() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut level = Level::new(LevelId::One, &LevelConfig::level_one());
        level.add_base("helipad.glb", unit_box());
        let plane = unit_box();
        for _ in 0..OBJECT_COUNT {
            level.add_object(&mut rng, &ScatterRegion::default(), "a400m.glb", plane.clone());
        }
        assert_eq!(level.objects.len(), level.object_centers.len());
        for (object, center) in level.objects.iter().zip(&level.object_centers) {
            assert_eq!(object.placement.position, *center);
        }
        // Copies share one mesh
        assert!(Arc::ptr_eq(&level.objects[1].mesh, &level.objects[2].mesh));
    }

    #[test]
    fn test_collider_follows_placement() {
        let mut rng = Pcg32::seed_from_u64(8);
        let mut level = Level::new(LevelId::One, &LevelConfig::level_one());
        let index = level
            .add_object(&mut rng, &ScatterRegion::default(), "a400m.glb", unit_box())
            .unwrap();
        let object = &level.objects[index];
        let center = (object.bounds().min + object.bounds().max) * 0.5;
        assert!((center - object.placement.position).length() < 1e-4);
        // A unit cube scaled 3x is between 3 and 3√2 wide however it turns
        let size = object.bounds().size();
        assert!((size.y - 3.0).abs() < 1e-4);
        assert!(size.x >= 3.0 - 1e-4 && size.x <= 3.0 * 2f32.sqrt() + 1e-4);
    }

    #[test]
    fn test_height_readout_format() {
        let mut level = Level::new(LevelId::One, &LevelConfig::level_one());
        level.measurement = "Altitude: ".to_string();
        level.unit = ",000 feet".to_string();
        level.height_offset = 3.0;
        level.player.position.y = 10.0;
        assert_eq!(level.height_readout(), "Altitude: 7,000 feet");
    }

    #[test]
    fn test_height_readout_below_datum() {
        let mut level = Level::new(LevelId::Two, &LevelConfig::level_two());
        level.player.position.y = 2.6;
        assert_eq!(level.height_readout(), "Depth: -47 metres");
    }

    #[test]
    fn test_color_to_rgb() {
        assert_eq!(Color(0xff0000).to_rgb(), [1.0, 0.0, 0.0]);
        assert_eq!(Color(0x0000ff).to_rgb(), [0.0, 0.0, 1.0]);
    }
}
