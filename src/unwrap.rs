//! The UV unwrapping pipeline.
//!
//! Runs the full sequence over a mesh: edge topology, seam detection,
//! island segmentation, per-island LSCM, island packing, and quality
//! metrics. Stages run strictly in order; each stage consumes only the
//! outputs of earlier stages and the mesh itself.
//!
//! # Example
//!
//! ```
//! use peel::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh = Mesh::new(vertices, vec![[0, 1, 2]]).unwrap();
//!
//! let result = unwrap(&mut mesh, &UnwrapOptions::default()).unwrap();
//! assert_eq!(result.islands.num_islands(), 1);
//! ```

use log::{error, info};

use crate::error::Result;
use crate::island::{segment_islands, IslandMap};
use crate::lscm::{lscm_parameterize, IslandParam};
use crate::mesh::Mesh;
use crate::metrics::{compute_quality_metrics, QualityMetrics};
use crate::pack::pack_uv_islands;
use crate::seam::detect_seams;
use crate::topology::{build_topology, validate_topology};

/// Options controlling the unwrap pipeline.
#[derive(Debug, Clone)]
pub struct UnwrapOptions {
    /// Seam detection threshold in degrees, applied to both the dihedral
    /// angle and the angular defect.
    pub angle_threshold: f64,

    /// Spacing around and between packed islands, in UV units.
    pub margin: f32,

    /// Whether to pack islands into a shared unit square. When disabled,
    /// each island's UVs individually span [0,1]².
    pub pack: bool,

    /// Solve islands on the rayon thread pool. UV writeback stays
    /// sequential in island order either way, so results are identical.
    pub parallel: bool,
}

impl Default for UnwrapOptions {
    fn default() -> Self {
        Self {
            angle_threshold: 30.0,
            margin: 0.02,
            pack: true,
            parallel: false,
        }
    }
}

impl UnwrapOptions {
    /// Set the seam angle threshold (degrees).
    pub fn with_angle_threshold(mut self, degrees: f64) -> Self {
        self.angle_threshold = degrees;
        self
    }

    /// Set the packing margin.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Enable or disable island packing.
    pub fn with_pack(mut self, pack: bool) -> Self {
        self.pack = pack;
        self
    }

    /// Enable or disable parallel island solves.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Outputs of the unwrap pipeline, alongside the UVs written into the mesh.
#[derive(Debug, Clone)]
pub struct UnwrapResult {
    /// Face → island assignment.
    pub islands: IslandMap,
    /// Edge indices selected as seams.
    pub seams: Vec<usize>,
    /// Islands whose LSCM solve failed; their UV slots were left as they
    /// were.
    pub failed_islands: Vec<usize>,
    /// Quality statistics of the final UVs.
    pub metrics: QualityMetrics,
}

/// Run the full unwrap pipeline on a mesh.
///
/// On success the mesh's UV buffer holds the packed parameterization.
/// Individual island failures do not abort the pipeline: the affected
/// islands keep their previous UVs and are listed in
/// [`UnwrapResult::failed_islands`].
///
/// # Errors
///
/// Returns an error only for unusable input (an empty mesh).
pub fn unwrap(mesh: &mut Mesh, options: &UnwrapOptions) -> Result<UnwrapResult> {
    let topo = build_topology(mesh)?;
    validate_topology(mesh, &topo);

    let seams = detect_seams(mesh, &topo, options.angle_threshold);
    let islands = segment_islands(mesh, &topo, &seams);

    let island_faces: Vec<Vec<usize>> = (0..islands.num_islands())
        .map(|k| islands.faces_of(k))
        .collect();

    // Solves are pure reads of the mesh, so they can fan out; writeback
    // below is sequential in ascending island order, which keeps shared
    // seam vertices deterministic (last writer wins).
    let solved: Vec<Result<IslandParam>> = if options.parallel {
        use rayon::prelude::*;
        island_faces
            .par_iter()
            .map(|faces| lscm_parameterize(mesh, faces))
            .collect()
    } else {
        island_faces
            .iter()
            .map(|faces| lscm_parameterize(mesh, faces))
            .collect()
    };

    let mut failed_islands = Vec::new();
    for (k, outcome) in solved.into_iter().enumerate() {
        match outcome {
            Ok(param) => {
                for (vertex, uv) in param.iter() {
                    mesh.set_uv(vertex, uv);
                }
            }
            Err(e) => {
                error!("island {} rejected: {}", k, e);
                failed_islands.push(k);
            }
        }
    }

    if options.pack {
        pack_uv_islands(mesh, &islands, options.margin);
    }

    let metrics = compute_quality_metrics(mesh, &islands);
    info!(
        "unwrap complete: {} islands ({} failed), {} seams",
        islands.num_islands(),
        failed_islands.len(),
        seams.len()
    );

    Ok(UnwrapResult {
        islands,
        seams,
        failed_islands,
        metrics,
    })
}
