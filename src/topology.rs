//! Edge topology construction and validation.
//!
//! This module builds the undirected edge list of a triangle mesh together
//! with the faces incident to each edge. Every later pipeline stage (seam
//! detection, island segmentation) consumes this structure.
//!
//! Edges are stored in canonical form `(v0, v1)` with `v0 < v1`, in
//! lexicographic order, so repeated runs over the same mesh produce
//! identical edge indices.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::error::{Result, UnwrapError};
use crate::mesh::Mesh;

/// Undirected edge topology of a triangle mesh.
///
/// Built once by [`build_topology`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct TopologyInfo {
    /// Unique undirected edges as `(v0, v1)` with `v0 < v1`.
    edges: Vec<(usize, usize)>,
    /// Faces incident to each edge. The first face is always present;
    /// the second is `None` for boundary edges.
    edge_faces: Vec<(usize, Option<usize>)>,
}

impl TopologyInfo {
    /// Number of unique undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get an edge's vertex pair.
    #[inline]
    pub fn edge(&self, e: usize) -> (usize, usize) {
        self.edges[e]
    }

    /// Get the faces incident to an edge.
    #[inline]
    pub fn edge_faces(&self, e: usize) -> (usize, Option<usize>) {
        self.edge_faces[e]
    }

    /// All edges.
    #[inline]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Whether an edge lies on the mesh boundary (single incident face).
    #[inline]
    pub fn is_boundary_edge(&self, e: usize) -> bool {
        self.edge_faces[e].1.is_none()
    }

    /// Euler characteristic χ = V − E + F.
    pub fn euler_characteristic(&self, mesh: &Mesh) -> i64 {
        mesh.num_vertices() as i64 - self.num_edges() as i64 + mesh.num_faces() as i64
    }

    /// Build a vertex → incident edge adjacency table.
    ///
    /// Used by the angular-defect pass in seam detection.
    pub fn vertex_edges(&self, num_vertices: usize) -> Vec<Vec<usize>> {
        let mut incident = vec![Vec::new(); num_vertices];
        for (ei, &(v0, v1)) in self.edges.iter().enumerate() {
            incident[v0].push(ei);
            incident[v1].push(ei);
        }
        incident
    }
}

/// Build the edge topology of a mesh.
///
/// Each triangle contributes its three canonical undirected edges. An edge
/// shared by more than two faces is non-manifold: a warning is logged and
/// the first two incident faces are kept.
///
/// # Errors
///
/// Returns [`UnwrapError::EmptyMesh`] if the mesh has no faces.
pub fn build_topology(mesh: &Mesh) -> Result<TopologyInfo> {
    if mesh.num_faces() == 0 {
        return Err(UnwrapError::EmptyMesh);
    }

    // BTreeMap keeps edges in lexicographic (v0, v1) order, which fixes
    // the edge indexing across runs.
    let mut edge_map: BTreeMap<(usize, usize), (usize, Option<usize>)> = BTreeMap::new();

    for fi in 0..mesh.num_faces() {
        let [a, b, c] = mesh.face(fi);
        for (u, v) in [(a, b), (a, c), (b, c)] {
            let key = if u < v { (u, v) } else { (v, u) };
            match edge_map.get_mut(&key) {
                None => {
                    edge_map.insert(key, (fi, None));
                }
                Some(entry) => {
                    if entry.1.is_none() {
                        entry.1 = Some(fi);
                    } else {
                        warn!("non-manifold edge ({}, {})", key.0, key.1);
                    }
                }
            }
        }
    }

    let mut edges = Vec::with_capacity(edge_map.len());
    let mut edge_faces = Vec::with_capacity(edge_map.len());
    for (key, faces) in edge_map {
        edges.push(key);
        edge_faces.push(faces);
    }

    Ok(TopologyInfo { edges, edge_faces })
}

/// Validate the topology and report the Euler characteristic.
///
/// χ = 2 is expected for a closed genus-0 surface. Other values are logged
/// as warnings (open meshes and meshes with handles legitimately differ)
/// but do not fail validation.
pub fn validate_topology(mesh: &Mesh, topo: &TopologyInfo) -> bool {
    let v = mesh.num_vertices();
    let e = topo.num_edges();
    let f = mesh.num_faces();
    let euler = topo.euler_characteristic(mesh);

    info!("topology: V={}, E={}, F={}, Euler characteristic={}", v, e, f, euler);
    if euler != 2 {
        warn!(
            "non-standard Euler characteristic {} (expected 2 for a closed genus-0 mesh; \
             open meshes and meshes with handles differ)",
            euler
        );
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn tetrahedron() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        Mesh::new(vertices, faces).unwrap()
    }

    fn strip() -> Mesh {
        // Two triangles sharing one edge
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        Mesh::new(vertices, faces).unwrap()
    }

    #[test]
    fn test_single_triangle_edges() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::new(vertices, vec![[0, 1, 2]]).unwrap();
        let topo = build_topology(&mesh).unwrap();

        assert_eq!(topo.num_edges(), 3);
        for e in 0..3 {
            assert!(topo.is_boundary_edge(e));
            assert_eq!(topo.edge_faces(e).0, 0);
        }
    }

    #[test]
    fn test_edge_uniqueness() {
        let mesh = tetrahedron();
        let topo = build_topology(&mesh).unwrap();

        // Each of the triangle's three unordered vertex pairs appears
        // exactly once, and the triangle is listed on that edge.
        for fi in 0..mesh.num_faces() {
            let [a, b, c] = mesh.face(fi);
            for (u, v) in [(a, b), (b, c), (a, c)] {
                let key = if u < v { (u, v) } else { (v, u) };
                let hits: Vec<usize> = (0..topo.num_edges())
                    .filter(|&e| topo.edge(e) == key)
                    .collect();
                assert_eq!(hits.len(), 1, "edge {:?} should appear once", key);
                let (f0, f1) = topo.edge_faces(hits[0]);
                assert!(f0 == fi || f1 == Some(fi), "face {} missing on edge {:?}", fi, key);
            }
        }
    }

    #[test]
    fn test_tetrahedron_closed() {
        let mesh = tetrahedron();
        let topo = build_topology(&mesh).unwrap();

        assert_eq!(topo.num_edges(), 6);
        for e in 0..topo.num_edges() {
            assert!(!topo.is_boundary_edge(e), "closed mesh has no boundary edges");
        }
        assert_eq!(topo.euler_characteristic(&mesh), 2);
        assert!(validate_topology(&mesh, &topo));
    }

    #[test]
    fn test_strip_euler() {
        let mesh = strip();
        let topo = build_topology(&mesh).unwrap();

        // V=4, E=5 (4 boundary + 1 shared), F=2, chi=1
        assert_eq!(topo.num_edges(), 5);
        assert_eq!(topo.euler_characteristic(&mesh), 1);

        let boundary = (0..topo.num_edges())
            .filter(|&e| topo.is_boundary_edge(e))
            .count();
        assert_eq!(boundary, 4);
    }

    #[test]
    fn test_lexicographic_order() {
        let mesh = tetrahedron();
        let topo = build_topology(&mesh).unwrap();

        for w in topo.edges().windows(2) {
            assert!(w[0] < w[1], "edges must be in lexicographic order");
        }
        for &(v0, v1) in topo.edges() {
            assert!(v0 < v1, "edges must be canonical (v0 < v1)");
        }
    }

    #[test]
    fn test_non_manifold_keeps_first_two() {
        // Three triangles sharing the edge (0, 1)
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]];
        let mesh = Mesh::new(vertices, faces).unwrap();
        let topo = build_topology(&mesh).unwrap();

        let shared = (0..topo.num_edges())
            .find(|&e| topo.edge(e) == (0, 1))
            .unwrap();
        let (f0, f1) = topo.edge_faces(shared);
        assert_eq!(f0, 0);
        assert_eq!(f1, Some(1));
    }

    #[test]
    fn test_vertex_edges() {
        let mesh = strip();
        let topo = build_topology(&mesh).unwrap();
        let incident = topo.vertex_edges(mesh.num_vertices());

        // Vertex 0 touches edges (0,1), (0,2), (0,3)
        assert_eq!(incident[0].len(), 3);
        // Vertex 1 touches edges (0,1), (1,2)
        assert_eq!(incident[1].len(), 2);
    }
}
