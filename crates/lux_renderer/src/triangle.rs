//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.
//! Shading normals and texture coordinates are interpolated from the
//! vertices with the barycentric coordinates of the hit.

use std::sync::Arc;

use crate::hittable::{HitRecord, Hittable};
use crate::material::Material;
use lux_core::Vertex;
use lux_math::{Aabb, Interval, Ray, Vec3};

/// Determinant below which a ray is treated as parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A triangle primitive.
pub struct Triangle {
    v0: Vertex,
    v1: Vertex,
    v2: Vertex,
    /// Cached edges from v0
    edge1: Vec3,
    edge2: Vec3,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex, material: Arc<dyn Material>) -> Self {
        let (p0, p1, p2) = (v0.position, v1.position, v2.position);

        // from_points pads axes thinner than Aabb::MIN_THICKNESS
        let bbox = Aabb::from_points(p0.min(p1).min(p2), p0.max(p1).max(p2));

        Self {
            v0,
            v1,
            v2,
            edge1: p1 - p0,
            edge2: p2 - p0,
            material,
            bbox,
        }
    }

    /// Unit geometric normal, following the winding v0 -> v1 -> v2.
    pub fn geometric_normal(&self) -> Vec3 {
        self.edge1.cross(self.edge2).normalize_or_zero()
    }

    /// Shading normal at barycentric (u, v).
    fn shading_normal(&self, u: f32, v: f32) -> Vec3 {
        let w = 1.0 - u - v;
        let n = self.v0.normal * w + self.v1.normal * u + self.v2.normal * v;
        if n.length_squared() > 1e-12 {
            n.normalize()
        } else {
            self.geometric_normal()
        }
    }
}

impl Hittable for Triangle {
    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let h = ray.direction().cross(self.edge2);
        let det = self.edge1.dot(h);

        // Ray is parallel to triangle
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / det;
        let s = ray.origin() - self.v0.position;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        if !ray_t.contains(t) {
            return None;
        }

        let w = 1.0 - u - v;
        let uv = self.v0.uv * w + self.v1.uv * u + self.v2.uv * v;

        Some(HitRecord::new(
            ray,
            t,
            self.shading_normal(u, v),
            (uv.x, uv.y),
            self.material.as_ref(),
        ))
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use lux_math::Vec2;

    fn gray() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Vec3::splat(0.5)))
    }

    /// Triangle in the XY plane at z=-1, normals toward +Z.
    fn facing_triangle() -> Triangle {
        Triangle::new(
            Vertex::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::Z, Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(1.0, -1.0, -1.0), Vec3::Z, Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(0.0, 1.0, -1.0), Vec3::Z, Vec2::new(0.5, 1.0)),
            gray(),
        )
    }

    #[test]
    fn test_triangle_hit() {
        let tri = facing_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 1.0).abs() < 0.001);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = facing_triangle();

        // Ray pointing away
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());

        // Outside the edges
        let ray = Ray::new(Vec3::new(2.0, 0.0, 0.0), Vec3::NEG_Z);
        assert!(tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let tri = facing_triangle();
        let ray = Ray::new(Vec3::new(-5.0, 0.0, -1.0), Vec3::X);
        assert!(tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_hit_outside_interval() {
        let tri = facing_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(tri.hit(&ray, Interval::new(0.001, 0.5)).is_none());
    }

    #[test]
    fn test_back_face_normal_flipped() {
        let tri = facing_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);

        let rec = tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!(!rec.front_face);
        assert_eq!(rec.normal, Vec3::NEG_Z);
    }

    #[test]
    fn test_uv_interpolation() {
        let tri = facing_triangle();

        // Aim exactly at v1
        let ray = Ray::new(Vec3::new(1.0, -1.0, 0.0), Vec3::NEG_Z);
        let rec = tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.u - 1.0).abs() < 1e-4);
        assert!(rec.v.abs() < 1e-4);
    }

    #[test]
    fn test_surface_point_round_trip() {
        let tri = facing_triangle();
        let target = Vec3::new(0.2, -0.3, -1.0);
        let origin = Vec3::new(3.0, 4.0, 5.0);

        let rec = tri
            .hit(&Ray::new(origin, target - origin), Interval::new(0.001, f32::INFINITY))
            .unwrap();
        assert!((rec.p - target).length() < 1e-4);
    }

    #[test]
    fn test_degenerate_normals_use_geometric_normal() {
        let tri = Triangle::new(
            Vertex::new(Vec3::new(0.0, 0.0, 0.0), Vec3::ZERO, Vec2::ZERO),
            Vertex::new(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec2::ZERO),
            Vertex::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec2::ZERO),
            gray(),
        );
        let ray = Ray::new(Vec3::new(0.2, 1.0, 0.2), Vec3::NEG_Y);

        let rec = tri.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.normal - Vec3::Y).length() < 1e-5);
        assert!(rec.front_face);
    }

    #[test]
    fn test_flat_triangle_bbox_padded() {
        let bbox = facing_triangle().bounding_box();
        assert!(bbox.z.size() >= Aabb::MIN_THICKNESS);
        assert!(bbox.x.contains(-1.0) && bbox.x.contains(1.0));
    }
}
