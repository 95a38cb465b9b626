//! Ray casting against level geometry
//!
//! Every scene object collides through its world-space triangles. The
//! object's bounding box is only a broad-phase reject; a ray that enters
//! the box but passes between the triangles does not count. The ground
//! sensor is a short ray pointing straight down from the player's eye.

use glam::Vec3;
use parry3d::math::{Point, Vector};
use parry3d::query::RayCast;
use parry3d::shape::TriMesh;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box of the given half extents around a centre point
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box containing all points (None for an empty iterator)
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// A ray limited to the distance interval [near, far]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3, near: f32, far: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or(Vec3::NEG_Y),
            near,
            far,
        }
    }

    /// Straight down from `origin`, reaching `far` units
    pub fn downward(origin: Vec3, far: f32) -> Self {
        Self::new(origin, Vec3::NEG_Y, 0.0, far)
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test. Returns the entry distance within [near, far], or `near`
    /// when the ray starts inside the box.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let mut t_min = self.near;
        let mut t_max = self.far;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let dir = self.direction[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

            if dir.abs() < f32::EPSILON {
                // Parallel to this slab: must already be inside it
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

/// World-space triangles of one placed object
#[derive(Debug, Clone)]
pub struct Collider {
    pub bounds: Aabb,
    /// None when the triangles could not be indexed; such a collider is
    /// never hit
    mesh: Option<TriMesh>,
}

impl Collider {
    pub fn new(vertices: &[Vec3], triangles: &[[u32; 3]]) -> Self {
        let bounds = Aabb::from_points(vertices.iter().copied())
            .unwrap_or(Aabb::new(Vec3::ZERO, Vec3::ZERO));
        let points = vertices.iter().map(|v| Point::new(v.x, v.y, v.z)).collect();

        let mesh = match TriMesh::new(points, triangles.to_vec()) {
            Ok(mesh) => Some(mesh),
            Err(err) => {
                log::warn!("Collider has no usable triangles: {:?}", err);
                None
            }
        };

        Self { bounds, mesh }
    }

    /// Distance to the nearest triangle along the ray, within [near, far]
    pub fn cast(&self, ray: &Ray) -> Option<f32> {
        ray.intersect_aabb(&self.bounds)?;
        let mesh = self.mesh.as_ref()?;

        let (o, d) = (ray.origin, ray.direction);
        let local = parry3d::query::Ray::new(Point::new(o.x, o.y, o.z), Vector::new(d.x, d.y, d.z));
        mesh.cast_local_ray(&local, ray.far, true).filter(|&t| t >= ray.near)
    }
}

/// True if the ray touches any collider
pub fn intersects_any<'a>(ray: &Ray, colliders: impl IntoIterator<Item = &'a Collider>) -> bool {
    colliders.into_iter().any(|c| c.cast(ray).is_some())
}
