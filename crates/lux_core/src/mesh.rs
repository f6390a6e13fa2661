//! Triangle mesh data consumed by the renderer.
//!
//! Meshes are plain vertex/index buffers with one shared material
//! description. They can be populated from OBJ files or built by hand for
//! procedural scenes; the renderer turns each triangle into a hittable.

use lux_math::{Aabb, Vec2, Vec3};
use thiserror::Error;

use crate::material::MaterialDesc;

/// Errors for malformed mesh data.
#[derive(Error, Debug, PartialEq)]
pub enum MeshError {
    #[error("Index count {0} is not a multiple of 3; every face must be a triangle")]
    NotTriangulated(usize),

    #[error("Face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// A single mesh vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// A vertex with only a position (normal +Y, UV at the origin).
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Vec3::Y, Vec2::ZERO)
    }

    /// Same vertex with a different normal.
    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// A triangle mesh: vertices, triangle indices and one material.
///
/// Construction validates that every face is a triangle and that every index
/// refers to an existing vertex, so `triangles()` never fails.
#[derive(Clone, Debug)]
pub struct MeshData {
    /// Mesh name (from the OBJ object/group)
    pub name: String,

    vertices: Vec<Vertex>,

    /// Triangle indices (every 3 indices form a triangle)
    indices: Vec<u32>,

    /// Material shared by every triangle
    pub material: MaterialDesc,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl MeshData {
    /// Create a new mesh, validating the index buffer.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        material: MaterialDesc,
    ) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangulated(indices.len()));
        }
        if let Some(i) = indices
            .iter()
            .position(|&index| index as usize >= vertices.len())
        {
            return Err(MeshError::IndexOutOfRange {
                face: i / 3,
                index: indices[i],
                vertex_count: vertices.len(),
            });
        }

        let bounds = Self::compute_bounds(&vertices);
        Ok(Self {
            name: name.into(),
            vertices,
            indices,
            material,
            bounds,
        })
    }

    /// Compute axis-aligned bounding box from positions.
    fn compute_bounds(vertices: &[Vertex]) -> Aabb {
        if vertices.is_empty() {
            return Aabb::EMPTY;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in vertices {
            min = min.min(v.position);
            max = max.max(v.position);
        }

        Aabb::from_points(min, max)
    }

    /// Replace all vertex normals with smooth normals averaged from the
    /// adjacent faces (counter-clockwise winding).
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            let p0 = self.vertices[i0].position;
            let p1 = self.vertices[i1].position;
            let p2 = self.vertices[i2].position;

            let face_normal = (p1 - p0).cross(p2 - p0);
            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            // Default up normal for degenerate cases
            vertex.normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over the triangles as vertex triplets.
    pub fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|face| {
            [
                self.vertices[face[0] as usize],
                self.vertices[face[1] as usize],
                self.vertices[face[2] as usize],
            ]
        })
    }
}

/// A model: the list of meshes read from one asset file.
#[derive(Clone, Debug, Default)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
}

impl ModelData {
    /// Total triangle count across all meshes.
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_vertices() -> Vec<Vertex> {
        vec![
            Vertex::at(Vec3::new(0.0, 0.0, 0.0)),
            Vertex::at(Vec3::new(1.0, 0.0, 0.0)),
            Vertex::at(Vec3::new(0.0, 1.0, 0.0)),
            Vertex::at(Vec3::new(1.0, 1.0, 0.0)),
        ]
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = MeshData::new("quad", quad_vertices(), vec![0, 1, 2, 1, 3, 2], MaterialDesc::default())
            .unwrap();

        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!((mesh.bounds.x.max - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_mesh_rejects_non_triangles() {
        let err = MeshData::new("bad", quad_vertices(), vec![0, 1, 2, 3], MaterialDesc::default())
            .unwrap_err();
        assert_eq!(err, MeshError::NotTriangulated(4));
    }

    #[test]
    fn test_mesh_rejects_bad_index() {
        let err = MeshData::new("bad", quad_vertices(), vec![0, 1, 2, 1, 9, 2], MaterialDesc::default())
            .unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                face: 1,
                index: 9,
                vertex_count: 4
            }
        );
    }

    #[test]
    fn test_compute_normals() {
        // CCW winding viewed from +Z produces normal pointing +Z
        let mut mesh =
            MeshData::new("tri", quad_vertices(), vec![0, 1, 2], MaterialDesc::default()).unwrap();
        mesh.compute_normals();

        for vertex in &mesh.vertices()[..3] {
            assert!((vertex.normal.z - 1.0).abs() < 0.001);
        }
        // Unreferenced vertex falls back to +Y
        assert_eq!(mesh.vertices()[3].normal, Vec3::Y);
    }

    #[test]
    fn test_triangles_iterator() {
        let vertices = quad_vertices();
        let mesh = MeshData::new("quad", vertices.clone(), vec![0, 1, 2, 1, 3, 2], MaterialDesc::default())
            .unwrap();
        let triangles: Vec<_> = mesh.triangles().collect();

        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1][0], vertices[1]);
        assert_eq!(triangles[1][1], vertices[3]);
        assert_eq!(triangles[1][2], vertices[2]);
    }

    #[test]
    fn test_model_triangle_count() {
        let mesh = MeshData::new("quad", quad_vertices(), vec![0, 1, 2, 1, 3, 2], MaterialDesc::default())
            .unwrap();
        let model = ModelData {
            meshes: vec![mesh.clone(), mesh],
        };
        assert_eq!(model.triangle_count(), 4);
    }
}
