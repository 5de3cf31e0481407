//! # Peel
//!
//! Automatic UV unwrapping for triangle meshes.
//!
//! Peel computes a texture parameterization in four stages: it builds the
//! mesh's edge topology, detects seam edges from dihedral angles and
//! vertex angular defects, segments the faces into islands across the
//! seams, flattens each island with a Least Squares Conformal Map, and
//! shelf-packs the islands into the unit square.
//!
//! ## Features
//!
//! - **Seam detection**: dihedral-angle creases plus angular-defect cone
//!   tips, with a tunable threshold
//! - **LSCM flattening**: per-island conformal parameterization solved by
//!   a direct sparse LU factorization
//! - **Island packing**: height-sorted shelf packing with a configurable
//!   margin
//! - **Quality metrics**: stretch, coverage, and angle-distortion
//!   statistics for the result
//!
//! ## Quick Start
//!
//! ```no_run
//! use peel::prelude::*;
//!
//! // Load a mesh
//! let mut mesh = peel::io::load("model.obj").unwrap();
//!
//! // Unwrap it
//! let result = unwrap(&mut mesh, &UnwrapOptions::default()).unwrap();
//! println!("islands: {}", result.islands.num_islands());
//! println!("avg stretch: {:.3}", result.metrics.avg_stretch);
//!
//! // Save the mesh with its new UVs
//! peel::io::save(&mesh, "unwrapped.obj").unwrap();
//! ```
//!
//! ## Pipeline Stages
//!
//! The stages are exposed individually for callers that need finer
//! control:
//!
//! ```
//! use peel::mesh::Mesh;
//! use peel::topology::build_topology;
//! use peel::seam::detect_seams;
//! use peel::island::segment_islands;
//! use peel::lscm::lscm_parameterize;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh = Mesh::new(vertices, vec![[0, 1, 2]]).unwrap();
//!
//! let topo = build_topology(&mesh).unwrap();
//! let seams = detect_seams(&mesh, &topo, 30.0);
//! let islands = segment_islands(&mesh, &topo, &seams);
//! let param = lscm_parameterize(&mesh, &islands.faces_of(0)).unwrap();
//! assert_eq!(param.len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod io;
pub mod island;
pub mod lscm;
pub mod mesh;
pub mod metrics;
pub mod pack;
pub mod seam;
pub mod sparse;
pub mod topology;
pub mod unwrap;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use peel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Result, UnwrapError};
    pub use crate::island::IslandMap;
    pub use crate::lscm::IslandParam;
    pub use crate::mesh::Mesh;
    pub use crate::metrics::QualityMetrics;
    pub use crate::unwrap::{unwrap, UnwrapOptions, UnwrapResult};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
