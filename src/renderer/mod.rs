//! WebGPU rendering module
//!
//! Draws the current level's loaded model meshes, lit by its ambient,
//! hemisphere and point lights, plus unlit bulb spheres for the point
//! lights, with linear fog.

pub mod camera;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use camera::Camera;
pub use pipeline::RenderState;
pub use vertex::Vertex;
