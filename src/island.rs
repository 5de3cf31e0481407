//! Island segmentation.
//!
//! After seam detection the mesh decomposes into *islands*: maximal sets of
//! faces connected through shared non-seam manifold edges. Each island is
//! parameterized independently by the LSCM stage and placed into the unit
//! square by the packer.

use std::collections::VecDeque;

use log::info;

use crate::mesh::Mesh;
use crate::topology::TopologyInfo;

/// Assignment of every face to an island.
#[derive(Debug, Clone)]
pub struct IslandMap {
    /// Island id for each face, in `[0, num_islands)`.
    face_island: Vec<usize>,
    /// Number of islands.
    num_islands: usize,
}

impl IslandMap {
    /// Island id of a face.
    #[inline]
    pub fn island_of(&self, face: usize) -> usize {
        self.face_island[face]
    }

    /// Number of islands.
    #[inline]
    pub fn num_islands(&self) -> usize {
        self.num_islands
    }

    /// Per-face island ids.
    #[inline]
    pub fn face_islands(&self) -> &[usize] {
        &self.face_island
    }

    /// Faces belonging to an island, in ascending face order.
    pub fn faces_of(&self, island: usize) -> Vec<usize> {
        self.face_island
            .iter()
            .enumerate()
            .filter_map(|(f, &id)| (id == island).then_some(f))
            .collect()
    }
}

/// Label the connected components of the dual graph.
///
/// Dual edges exist where the underlying mesh edge is manifold and not in
/// `seams`. Components are labelled by BFS seeded in increasing face order,
/// so island ids are deterministic for a given mesh and seam set.
pub fn segment_islands(mesh: &Mesh, topo: &TopologyInfo, seams: &[usize]) -> IslandMap {
    let num_faces = mesh.num_faces();

    let mut is_seam = vec![false; topo.num_edges()];
    for &e in seams {
        is_seam[e] = true;
    }

    // Dual adjacency across non-seam manifold edges.
    let mut adjacency = vec![Vec::new(); num_faces];
    for e in 0..topo.num_edges() {
        if is_seam[e] {
            continue;
        }
        let (f0, f1) = topo.edge_faces(e);
        if let Some(f1) = f1 {
            adjacency[f0].push(f1);
            adjacency[f1].push(f0);
        }
    }

    let mut face_island = vec![usize::MAX; num_faces];
    let mut num_islands = 0;

    for seed in 0..num_faces {
        if face_island[seed] != usize::MAX {
            continue;
        }

        let id = num_islands;
        num_islands += 1;

        let mut queue = VecDeque::new();
        queue.push_back(seed);
        face_island[seed] = id;

        while let Some(f) = queue.pop_front() {
            for &nf in &adjacency[f] {
                if face_island[nf] == usize::MAX {
                    face_island[nf] = id;
                    queue.push_back(nf);
                }
            }
        }
    }

    info!("segmented {} faces into {} islands", num_faces, num_islands);
    IslandMap { face_island, num_islands }
}
