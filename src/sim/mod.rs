//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (all speeds are per tick)
//! - Seeded RNG only (object scatter)
//! - Asset loads applied from a queue, in arrival order, between ticks
//! - No rendering or platform dependencies

pub mod collision;
pub mod input;
pub mod level;
pub mod mesh;
pub mod placement;
pub mod player;
pub mod session;
pub mod tick;

pub use collision::{Aabb, Collider, Ray, intersects_any};
pub use input::{Key, key_down, key_up};
pub use level::{
    AmbientLight, Color, Fog, HemisphereLight, Level, LevelId, MovementFlags, ObjectKind,
    PointLight, SceneLights, SceneObject,
};
pub use mesh::ModelMesh;
pub use placement::{Placement, ScatterRegion, overlaps, place_object};
pub use player::Player;
pub use session::{AssetEvent, AssetRequest, Session};
pub use tick::{TickReport, tick};
