//! Core mesh data structure.
//!
//! This module provides [`Mesh`], a flat face-vertex triangle mesh with a
//! per-vertex UV buffer. The pipeline stages read vertex positions and
//! triangles and write texture coordinates into the UV buffer in place.
//!
//! # Construction
//!
//! ```
//! use peel::mesh::Mesh;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh = Mesh::new(vertices, faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 3);
//! assert_eq!(mesh.num_faces(), 1);
//! ```

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{Result, UnwrapError};

/// A triangle mesh in face-vertex form.
///
/// Positions and UVs are stored as 32-bit floats; geometric queries promote
/// to 64-bit. Face orientation is assumed consistent (outward normals).
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions.
    vertices: Vec<Point3<f32>>,
    /// Triangles as vertex index triples.
    faces: Vec<[usize; 3]>,
    /// Per-vertex texture coordinates, written by the unwrap pipeline.
    uvs: Vec<Point2<f32>>,
}

impl Mesh {
    /// Create a mesh from vertex positions and triangle faces.
    ///
    /// The UV buffer is initialized to the origin for every vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the face list is empty, a face references an
    /// out-of-range vertex, or a face repeats a vertex index.
    pub fn new(vertices: Vec<Point3<f32>>, faces: Vec<[usize; 3]>) -> Result<Self> {
        if faces.is_empty() {
            return Err(UnwrapError::EmptyMesh);
        }

        for (fi, face) in faces.iter().enumerate() {
            for &vi in face {
                if vi >= vertices.len() {
                    return Err(UnwrapError::InvalidVertexIndex { face: fi, vertex: vi });
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(UnwrapError::DegenerateFace { face: fi });
            }
        }

        let uvs = vec![Point2::origin(); vertices.len()];
        Ok(Self { vertices, faces, uvs })
    }

    /// Create a mesh that already carries texture coordinates.
    ///
    /// Used by loaders for files with UV data. The UV list must have one
    /// entry per vertex.
    pub fn with_uvs(
        vertices: Vec<Point3<f32>>,
        faces: Vec<[usize; 3]>,
        uvs: Vec<Point2<f32>>,
    ) -> Result<Self> {
        let n = vertices.len();
        let mut mesh = Self::new(vertices, faces)?;
        if uvs.len() == n {
            mesh.uvs = uvs;
        }
        Ok(mesh)
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangle faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex position.
    #[inline]
    pub fn position(&self, v: usize) -> Point3<f32> {
        self.vertices[v]
    }

    /// Get a vertex position at solver precision.
    #[inline]
    pub fn position_f64(&self, v: usize) -> Point3<f64> {
        self.vertices[v].cast()
    }

    /// Get the vertex indices of a face.
    #[inline]
    pub fn face(&self, f: usize) -> [usize; 3] {
        self.faces[f]
    }

    /// All vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// All triangle faces.
    #[inline]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Get the UV coordinates of a vertex.
    #[inline]
    pub fn uv(&self, v: usize) -> Point2<f32> {
        self.uvs[v]
    }

    /// Set the UV coordinates of a vertex.
    #[inline]
    pub fn set_uv(&mut self, v: usize, uv: Point2<f32>) {
        self.uvs[v] = uv;
    }

    /// The full UV buffer.
    #[inline]
    pub fn uvs(&self) -> &[Point2<f32>] {
        &self.uvs
    }

    /// Mutable access to the UV buffer.
    #[inline]
    pub fn uvs_mut(&mut self) -> &mut [Point2<f32>] {
        &mut self.uvs
    }

    /// Compute the unit normal of a face.
    ///
    /// Degenerate faces (near-zero area) yield the zero vector.
    pub fn face_normal(&self, f: usize) -> Vector3<f64> {
        let [a, b, c] = self.faces[f];
        let pa = self.position_f64(a);
        let e0 = self.position_f64(b) - pa;
        let e1 = self.position_f64(c) - pa;
        let n = e0.cross(&e1);
        let len = n.norm();
        if len > 0.0 {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: usize) -> f64 {
        let [a, b, c] = self.faces[f];
        let pa = self.position_f64(a);
        let e0 = self.position_f64(b) - pa;
        let e1 = self.position_f64(c) - pa;
        0.5 * e0.cross(&e1).norm()
    }

    /// Compute the axis-aligned bounding box of the vertex positions.
    ///
    /// Returns `None` for a mesh with no vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.vertices {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        Mesh::new(vertices, vec![[0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_construction() {
        let mesh = single_triangle();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.uvs().len(), 3);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let result = Mesh::new(vec![Point3::origin()], vec![]);
        assert!(matches!(result, Err(UnwrapError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::origin()];
        let result = Mesh::new(vertices, vec![[0, 1, 2]]);
        assert!(matches!(
            result,
            Err(UnwrapError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face_rejected() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let result = Mesh::new(vertices, vec![[0, 0, 2]]);
        assert!(matches!(result, Err(UnwrapError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_face_normal_and_area() {
        let mesh = single_triangle();
        let n = mesh.face_normal(0);
        assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        assert!((mesh.face_area(0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_normal_is_zero() {
        // Collinear vertices: zero area, zero normal
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh = Mesh::new(vertices, vec![[0, 1, 2]]).unwrap();
        assert_eq!(mesh.face_normal(0), Vector3::zeros());
    }

    #[test]
    fn test_uv_write() {
        let mut mesh = single_triangle();
        mesh.set_uv(1, Point2::new(0.5, 0.25));
        assert_eq!(mesh.uv(1), Point2::new(0.5, 0.25));
    }

    #[test]
    fn test_bounding_box() {
        let mesh = single_triangle();
        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 0.0));
    }
}
