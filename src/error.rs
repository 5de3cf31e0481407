//! Error types for peel.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`UnwrapError`].
pub type Result<T> = std::result::Result<T, UnwrapError>;

/// Errors that can occur during UV unwrapping.
#[derive(Error, Debug)]
pub enum UnwrapError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices (degenerate triangle).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// An island has too few vertices to parameterize.
    #[error("island has only {vertices} vertices (at least 3 required)")]
    IslandTooSmall {
        /// Number of distinct vertices in the island.
        vertices: usize,
    },

    /// Every triangle in an island has near-zero area.
    #[error("island is degenerate: all {faces} triangles have near-zero area")]
    DegenerateIsland {
        /// Number of faces in the island.
        faces: usize,
    },

    /// The sparse linear solver failed.
    #[error("sparse solver failed: {detail}")]
    SolverFailed {
        /// Description of the failure.
        detail: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}
