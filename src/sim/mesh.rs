//! Model-space triangle meshes
//!
//! A loaded model is flattened into one indexed triangle list with per-vertex
//! normals and colours. Placed copies share the mesh; the level transforms it
//! into world space once, when the copy is placed.

use glam::Vec3;

use super::collision::Aabb;

/// Colour of untextured geometry with no material (glTF's default)
pub const DEFAULT_COLOR: [f32; 4] = [1.0; 4];

#[derive(Debug, Clone, PartialEq)]
pub struct ModelMesh {
    pub positions: Vec<Vec3>,
    /// Unit normals, one per position
    pub normals: Vec<Vec3>,
    /// Linear RGBA, one per position
    pub colors: Vec<[f32; 4]>,
    /// Counter-clockwise from outside
    pub triangles: Vec<[u32; 3]>,
    pub bounds: Aabb,
}

impl ModelMesh {
    /// Triangles that reference missing vertices are dropped. Returns None
    /// when no triangle is left.
    pub fn new(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        colors: Vec<[f32; 4]>,
        triangles: Vec<[u32; 3]>,
    ) -> Option<Self> {
        let count = positions.len();
        if normals.len() != count || colors.len() != count {
            return None;
        }

        let triangles: Vec<[u32; 3]> = triangles
            .into_iter()
            .filter(|tri| tri.iter().all(|&i| (i as usize) < count))
            .collect();
        if triangles.is_empty() {
            return None;
        }

        let bounds = Aabb::from_points(positions.iter().copied())?;
        Some(Self {
            positions,
            normals,
            colors,
            triangles,
            bounds,
        })
    }

    /// A solid box, four vertices and two triangles per face
    pub fn cuboid(aabb: &Aabb, color: [f32; 4]) -> Self {
        let (a, b) = (aabb.min, aabb.max);
        let faces = [
            (
                Vec3::X,
                [
                    Vec3::new(b.x, a.y, b.z),
                    Vec3::new(b.x, a.y, a.z),
                    Vec3::new(b.x, b.y, a.z),
                    Vec3::new(b.x, b.y, b.z),
                ],
            ),
            (
                Vec3::NEG_X,
                [
                    Vec3::new(a.x, a.y, a.z),
                    Vec3::new(a.x, a.y, b.z),
                    Vec3::new(a.x, b.y, b.z),
                    Vec3::new(a.x, b.y, a.z),
                ],
            ),
            (
                Vec3::Y,
                [
                    Vec3::new(a.x, b.y, b.z),
                    Vec3::new(b.x, b.y, b.z),
                    Vec3::new(b.x, b.y, a.z),
                    Vec3::new(a.x, b.y, a.z),
                ],
            ),
            (
                Vec3::NEG_Y,
                [
                    Vec3::new(a.x, a.y, a.z),
                    Vec3::new(b.x, a.y, a.z),
                    Vec3::new(b.x, a.y, b.z),
                    Vec3::new(a.x, a.y, b.z),
                ],
            ),
            (
                Vec3::Z,
                [
                    Vec3::new(a.x, a.y, b.z),
                    Vec3::new(b.x, a.y, b.z),
                    Vec3::new(b.x, b.y, b.z),
                    Vec3::new(a.x, b.y, b.z),
                ],
            ),
            (
                Vec3::NEG_Z,
                [
                    Vec3::new(b.x, a.y, a.z),
                    Vec3::new(a.x, a.y, a.z),
                    Vec3::new(a.x, b.y, a.z),
                    Vec3::new(b.x, b.y, a.z),
                ],
            ),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut triangles = Vec::with_capacity(12);
        for (normal, corners) in faces {
            let base = positions.len() as u32;
            positions.extend(corners);
            normals.extend([normal; 4]);
            triangles.push([base, base + 1, base + 2]);
            triangles.push([base, base + 2, base + 3]);
        }

        Self {
            colors: vec![color; positions.len()],
            positions,
            normals,
            triangles,
            bounds: *aabb,
        }
    }
}

/// Area-weighted vertex normals for meshes that ship without them
pub fn smooth_normals(positions: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in triangles {
        let [a, b, c] = tri.map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        for i in [a, b, c] {
            normals[i] += face;
        }
    }
    normals.into_iter().map(|n| n.normalize_or(Vec3::Y)).collect()
}
