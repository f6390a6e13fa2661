//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over shared primitives. Each node splits its objects at
//! the median along the longest axis of the node's box, ordering them by
//! the minimum of their own box on that axis.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::hittable::{HitRecord, Hittable};
use lux_math::{Aabb, Interval, Ray};

/// One of the two slots of a BVH node.
pub enum BvhChild {
    /// Internal node, owned by its parent
    Node(Box<BvhNode>),
    /// Shared primitive
    Leaf(Arc<dyn Hittable>),
}

impl BvhChild {
    fn depth(&self) -> usize {
        match self {
            BvhChild::Node(node) => node.depth(),
            BvhChild::Leaf(_) => 0,
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            BvhChild::Node(node) => node.leaf_count(),
            BvhChild::Leaf(_) => 1,
        }
    }
}

impl Hittable for BvhChild {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        match self {
            BvhChild::Node(node) => node.hit(ray, ray_t),
            BvhChild::Leaf(object) => object.hit(ray, ray_t),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhChild::Node(node) => node.bbox,
            BvhChild::Leaf(object) => object.bounding_box(),
        }
    }
}

/// BVH node with exactly two children.
///
/// A node built over a single object stores it in both slots.
pub struct BvhNode {
    left: BvhChild,
    right: BvhChild,
    bbox: Aabb,
}

impl BvhNode {
    /// Build a BVH over `objects`. Returns `None` when there is nothing to
    /// bound.
    pub fn new(mut objects: Vec<Arc<dyn Hittable>>) -> Option<Self> {
        if objects.is_empty() {
            return None;
        }
        Some(Self::build(&mut objects))
    }

    /// Recursive construction over a non-empty span.
    fn build(objects: &mut [Arc<dyn Hittable>]) -> Self {
        let bbox = objects
            .iter()
            .fold(Aabb::EMPTY, |acc, o| Aabb::surrounding(&acc, &o.bounding_box()));
        let axis = bbox.longest_axis();

        let (left, right) = match objects.len() {
            1 => (
                BvhChild::Leaf(objects[0].clone()),
                BvhChild::Leaf(objects[0].clone()),
            ),
            2 => (
                BvhChild::Leaf(objects[0].clone()),
                BvhChild::Leaf(objects[1].clone()),
            ),
            len => {
                objects.sort_by(|a, b| box_compare(a.as_ref(), b.as_ref(), axis));

                let (lo, hi) = objects.split_at_mut(len / 2);
                (
                    BvhChild::Node(Box::new(Self::build(lo))),
                    BvhChild::Node(Box::new(Self::build(hi))),
                )
            }
        };

        Self { left, right, bbox }
    }

    pub fn left(&self) -> &BvhChild {
        &self.left
    }

    pub fn right(&self) -> &BvhChild {
        &self.right
    }

    /// Number of node levels, counting this one.
    pub fn depth(&self) -> usize {
        1 + self.left.depth().max(self.right.depth())
    }

    /// Number of distinct primitives under this node.
    pub fn leaf_count(&self) -> usize {
        match (&self.left, &self.right) {
            (BvhChild::Leaf(a), BvhChild::Leaf(b)) if Arc::ptr_eq(a, b) => 1,
            (left, right) => left.leaf_count() + right.leaf_count(),
        }
    }
}

/// Order two objects by the lower bound of their boxes on `axis`.
fn box_compare(a: &dyn Hittable, b: &dyn Hittable, axis: usize) -> Ordering {
    let a_min = a.bounding_box().axis_interval(axis).min;
    let b_min = b.bounding_box().axis_interval(axis).min;
    a_min.total_cmp(&b_min)
}

impl Hittable for BvhNode {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        if !self.bbox.hit(ray, ray_t) {
            return None;
        }

        let hit_left = self.left.hit(ray, ray_t);

        // Only check right up to closest hit
        let right_max = hit_left.as_ref().map_or(ray_t.max, |rec| rec.t);
        let hit_right = self.right.hit(ray, Interval::new(ray_t.min, right_max));

        hit_right.or(hit_left)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
