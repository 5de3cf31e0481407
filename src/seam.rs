//! Seam detection.
//!
//! Seams are mesh edges across which the UV parameterization is allowed to
//! tear. Two signals select them:
//!
//! - **Dihedral angle**: a manifold edge whose adjacent face normals differ
//!   by more than the threshold marks a ridge or crease.
//! - **Angular defect**: an interior vertex whose incident triangle angles
//!   sum to well under 2π concentrates curvature like a cone tip; any flat
//!   parameterization around it must tear, so all of its incident edges
//!   become seam candidates.
//!
//! A BFS spanning tree of the dual graph is computed alongside as a
//! structural diagnostic (its cotree is the candidate set for future
//! seam-refinement work) but does not gate the seam set.
//!
//! Boundary edges never appear in the result: the parameterization is
//! already free to tear there.

use std::collections::{BTreeSet, VecDeque};
use std::f64::consts::PI;

use log::{debug, info};
use nalgebra::Point3;

use crate::mesh::Mesh;
use crate::topology::TopologyInfo;

/// Ignore edges flatter than this (degrees); tiny dihedral angles are
/// tessellation noise, not creases.
const FLAT_ANGLE_DEG: f64 = 5.0;

/// Normal dot products below this indicate flipped face orientation rather
/// than a genuine 180° crease.
const FLIPPED_NORMAL_DOT: f64 = -0.99;

/// Detect seam edges.
///
/// Returns the sorted indices of edges (into `topo`) selected as seams:
/// the union of dihedral-angle seams and angular-defect seams, with
/// boundary edges excluded. `angle_threshold_deg` drives both signals.
pub fn detect_seams(mesh: &Mesh, topo: &TopologyInfo, angle_threshold_deg: f64) -> Vec<usize> {
    let adjacency = dual_adjacency(mesh, topo);
    let cotree = dual_spanning_cotree(mesh, topo, &adjacency);
    debug!("dual spanning tree leaves {} cotree edges", cotree.len());

    let mut seams: BTreeSet<usize> = BTreeSet::new();

    // Dihedral-angle seams across manifold edges.
    for e in 0..topo.num_edges() {
        let (f0, f1) = topo.edge_faces(e);
        let Some(f1) = f1 else { continue };

        let n0 = mesh.face_normal(f0);
        let n1 = mesh.face_normal(f1);
        let dot = n0.dot(&n1).clamp(-1.0, 1.0);
        let angle = dot.acos().to_degrees();

        if angle < FLAT_ANGLE_DEG || dot < FLIPPED_NORMAL_DOT {
            continue;
        }
        if angle > angle_threshold_deg {
            seams.insert(e);
        }
    }

    // Angular-defect seams around cone-like interior vertices. Boundary
    // vertices are skipped: their angle sums are short of 2π by
    // construction, not by curvature.
    let defect_threshold = angle_threshold_deg * PI / 180.0;
    let defects = angular_defects(mesh);
    let interior = interior_vertices(mesh, topo);
    let incident = topo.vertex_edges(mesh.num_vertices());

    for v in 0..mesh.num_vertices() {
        if !interior[v] || defects[v] <= defect_threshold {
            continue;
        }
        for &e in &incident[v] {
            if !topo.is_boundary_edge(e) {
                seams.insert(e);
            }
        }
    }

    info!("detected {} seam edges", seams.len());
    seams.into_iter().collect()
}

/// Dual-graph adjacency: for each face, the (neighbor face, shared edge)
/// pairs across manifold edges.
fn dual_adjacency(mesh: &Mesh, topo: &TopologyInfo) -> Vec<Vec<(usize, usize)>> {
    let mut adjacency = vec![Vec::new(); mesh.num_faces()];
    for e in 0..topo.num_edges() {
        let (f0, f1) = topo.edge_faces(e);
        if let Some(f1) = f1 {
            adjacency[f0].push((f1, e));
            adjacency[f1].push((f0, e));
        }
    }
    adjacency
}

/// BFS spanning tree of the dual graph from face 0; returns the cotree
/// (manifold edges not selected by the tree).
fn dual_spanning_cotree(
    mesh: &Mesh,
    topo: &TopologyInfo,
    adjacency: &[Vec<(usize, usize)>],
) -> Vec<usize> {
    let mut tree_edges: BTreeSet<usize> = BTreeSet::new();
    let mut visited = vec![false; mesh.num_faces()];

    if mesh.num_faces() > 0 {
        let mut queue = VecDeque::new();
        queue.push_back(0);
        visited[0] = true;

        while let Some(f) = queue.pop_front() {
            for &(nf, e) in &adjacency[f] {
                if !visited[nf] {
                    visited[nf] = true;
                    tree_edges.insert(e);
                    queue.push_back(nf);
                }
            }
        }
    }

    (0..topo.num_edges())
        .filter(|&e| topo.edge_faces(e).1.is_some() && !tree_edges.contains(&e))
        .collect()
}

/// Interior angle at vertex `a` of triangle (a, b, c).
fn triangle_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let na = ab.norm();
    let nc = ac.norm();
    if na < 1e-12 || nc < 1e-12 {
        return 0.0;
    }
    (ab.dot(&ac) / (na * nc)).clamp(-1.0, 1.0).acos()
}

/// Angular defect 2π − Σ incident triangle angles, for every vertex.
fn angular_defects(mesh: &Mesh) -> Vec<f64> {
    let mut angle_sums = vec![0.0; mesh.num_vertices()];

    for f in 0..mesh.num_faces() {
        let [a, b, c] = mesh.face(f);
        let pa = mesh.position_f64(a);
        let pb = mesh.position_f64(b);
        let pc = mesh.position_f64(c);

        angle_sums[a] += triangle_angle(&pa, &pb, &pc);
        angle_sums[b] += triangle_angle(&pb, &pa, &pc);
        angle_sums[c] += triangle_angle(&pc, &pa, &pb);
    }

    angle_sums.iter().map(|&sum| 2.0 * PI - sum).collect()
}

/// Mark vertices not touched by any boundary edge.
fn interior_vertices(mesh: &Mesh, topo: &TopologyInfo) -> Vec<bool> {
    let mut interior = vec![true; mesh.num_vertices()];
    for e in 0..topo.num_edges() {
        if topo.is_boundary_edge(e) {
            let (v0, v1) = topo.edge(e);
            interior[v0] = false;
            interior[v1] = false;
        }
    }
    interior
}
