//! Mesh file I/O.
//!
//! The pipeline's data model is a flat face-vertex mesh with per-vertex
//! UVs, which maps directly onto Wavefront OBJ (`v`/`vt`/`f` records),
//! the one common text format that round-trips texture coordinates
//! without auxiliary files.
//!
//! ```no_run
//! use peel::io;
//!
//! let mesh = io::obj::load("model.obj").unwrap();
//! io::obj::save(&mesh, "unwrapped.obj").unwrap();
//! ```

pub mod obj;

pub use obj::{load, save};
