//! Mesh generation for the scene
//!
//! Everything is emitted as a plain triangle list in world space. The
//! renderer rebuilds it only when the level or its object count changes.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

use super::pipeline::linear;
use super::vertex::Vertex;
use crate::sim::level::{Level, SceneObject};

/// Segments around each bulb sphere
const BULB_SEGMENTS: u32 = 12;

/// UV sphere with `segments` slices and `segments / 2` stacks. Unlit when
/// `emissive` is set.
pub fn sphere(
    center: Vec3,
    radius: f32,
    color: [f32; 4],
    segments: u32,
    emissive: bool,
) -> Vec<Vertex> {
    let segments = segments.max(3);
    let stacks = (segments / 2).max(2);
    let mut out = Vec::with_capacity((segments * stacks * 6) as usize);

    let point = |slice: u32, stack: u32| {
        let theta = TAU * slice as f32 / segments as f32;
        let phi = PI * stack as f32 / stacks as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();
        Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta)
    };

    let mut push = |dir: Vec3| {
        let normal = if emissive { [0.0; 3] } else { dir.to_array() };
        out.push(Vertex::new((center + dir * radius).to_array(), normal, color));
    };

    for stack in 0..stacks {
        for slice in 0..segments {
            let p00 = point(slice, stack);
            let p10 = point(slice + 1, stack);
            let p01 = point(slice, stack + 1);
            let p11 = point(slice + 1, stack + 1);
            for dir in [p00, p11, p01, p00, p10, p11] {
                push(dir);
            }
        }
    }

    out
}

/// One placed object's triangles in world space
pub fn object_mesh(object: &SceneObject) -> Vec<Vertex> {
    let mesh = &object.mesh;
    let placement = &object.placement;
    let mut out = Vec::with_capacity(mesh.triangles.len() * 3);
    for tri in &mesh.triangles {
        for &i in tri {
            let i = i as usize;
            out.push(Vertex::new(
                placement.apply(mesh.positions[i]).to_array(),
                placement.apply_normal(mesh.normals[i]).to_array(),
                mesh.colors[i],
            ));
        }
    }
    out
}

/// Triangles for a whole level: object meshes then light bulbs
pub fn level_mesh(level: &Level) -> Vec<Vertex> {
    let triangles: usize = level.objects.iter().map(|o| o.mesh.triangles.len()).sum();
    let mut vertices = Vec::with_capacity(triangles * 3);

    for object in &level.objects {
        vertices.extend(object_mesh(object));
    }

    for light in &level.lights.points {
        vertices.extend(sphere(
            light.position,
            light.bulb_radius,
            linear(light.color, 1.0),
            BULB_SEGMENTS,
            true,
        ));
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::LevelConfig;
    use crate::sim::collision::Aabb;
    use crate::sim::level::{Color, LevelId, ObjectKind};
    use crate::sim::mesh::{DEFAULT_COLOR, ModelMesh};
    use crate::sim::placement::Placement;
    use std::sync::Arc;

    #[test]
    fn test_sphere_vertices_on_surface() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let mesh = sphere(center, 0.4, [1.0; 4], 8, false);
        assert_eq!(mesh.len(), 8 * 4 * 6);
        for v in &mesh {
            let d = Vec3::from_array(v.position).distance(center);
            assert!((d - 0.4).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sphere_triangles_face_outward() {
        let mesh = sphere(Vec3::ZERO, 1.0, [1.0; 4], 12, false);
        for tri in mesh.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|v| Vec3::from_array(v.position));
            let cross = (b - a).cross(c - a);
            // Pole triangles collapse to a line
            if cross.length() < 1e-6 {
                continue;
            }
            assert!(cross.dot(a + b + c) > 0.0);
        }
    }

    #[test]
    fn test_bulbs_are_unlit() {
        let mesh = sphere(Vec3::ZERO, 1.0, [1.0; 4], 6, true);
        assert!(mesh.iter().all(|v| v.normal == [0.0; 3]));
    }

    #[test]
    fn test_level_mesh_includes_bulbs() {
        let mut level = Level::new(LevelId::One, &LevelConfig::level_one());
        let bulbs_only = level_mesh(&level).len();
        assert_eq!(bulbs_only, 4 * (BULB_SEGMENTS * BULB_SEGMENTS / 2 * 6) as usize);

        let pad = Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5));
        level.add_base("helipad.glb", Arc::new(ModelMesh::cuboid(&pad, DEFAULT_COLOR)));
        assert_eq!(level_mesh(&level).len(), bulbs_only + 36);
    }

    #[test]
    fn test_bulbs_use_linear_color() {
        let mut level = Level::new(LevelId::One, &LevelConfig::level_one());
        level.lights.points.truncate(1);
        level.lights.points[0].color = Color(0x808080);
        let mesh = level_mesh(&level);
        let expected = linear(Color(0x808080), 1.0);
        assert!(mesh.iter().all(|v| v.color == expected));
        // Mid grey is well below half intensity once linear
        assert!(expected[0] < 0.25);
    }

    #[test]
    fn test_object_mesh_is_placed() {
        let unit = Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5));
        let mesh = Arc::new(ModelMesh::cuboid(&unit, [0.2, 0.4, 0.6, 1.0]));
        let placement = Placement {
            position: Vec3::new(4.0, 10.0, -2.0),
            rotation_y: 0.7,
            scale: 3.0,
        };
        let object = SceneObject::new(ObjectKind::Decoration, "a400m.glb", mesh, placement);
        let vertices = object_mesh(&object);
        assert_eq!(vertices.len(), 36);

        for tri in vertices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|v| Vec3::from_array(v.position));
            // Still wound counter-clockwise around the turned normal
            let winding = (b - a).cross(c - a).normalize();
            assert!(winding.dot(Vec3::from_array(tri[0].normal)) > 0.99);
            // Within the scaled cube's reach of its centre
            assert!(a.distance(placement.position) <= 1.5 * 3f32.sqrt() + 1e-4);
        }
        assert!(vertices.iter().all(|v| v.color == [0.2, 0.4, 0.6, 1.0]));
    }
}
