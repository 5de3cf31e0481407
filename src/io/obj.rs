//! Wavefront OBJ loading and saving.
//!
//! Reads `v`, `vt`, and `f` records; polygonal faces are fan-triangulated.
//! Texture coordinates are stored per vertex: when a face corner carries a
//! `vt` reference, that UV is assigned to the corner's vertex (the last
//! reference wins). Saving emits one `vt` per vertex and `v/vt` face
//! corners so the unwrapped UVs survive a round trip.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point2, Point3};

use crate::error::{Result, UnwrapError};
use crate::mesh::Mesh;

/// Load a mesh from an OBJ file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut positions: Vec<Point3<f32>> = Vec::new();
    let mut texcoords: Vec<Point2<f32>> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();
    // vertex → assigned texcoord index, filled while reading faces
    let mut vertex_uv: Vec<Option<usize>> = Vec::new();

    let bad_line = |lineno: usize, what: &str| UnwrapError::LoadError {
        path: path.to_path_buf(),
        message: format!("line {}: {}", lineno, what),
    };

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = lineno + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coord = |t: Option<&str>| -> Result<f32> {
                    t.and_then(|s| s.parse().ok())
                        .ok_or_else(|| bad_line(lineno, "malformed vertex"))
                };
                let x = coord(tokens.next())?;
                let y = coord(tokens.next())?;
                let z = coord(tokens.next())?;
                positions.push(Point3::new(x, y, z));
                vertex_uv.push(None);
            }
            Some("vt") => {
                let mut coord = |t: Option<&str>| -> Result<f32> {
                    t.and_then(|s| s.parse().ok())
                        .ok_or_else(|| bad_line(lineno, "malformed texture coordinate"))
                };
                let u = coord(tokens.next())?;
                let v = coord(tokens.next())?;
                texcoords.push(Point2::new(u, v));
            }
            Some("f") => {
                let mut corners: Vec<(usize, Option<usize>)> = Vec::new();
                for token in tokens {
                    let mut parts = token.split('/');
                    let v = parts
                        .next()
                        .and_then(|s| parse_index(s, positions.len()))
                        .ok_or_else(|| bad_line(lineno, "malformed face index"))?;
                    let vt = match parts.next() {
                        Some("") | None => None,
                        Some(s) => Some(
                            parse_index(s, texcoords.len())
                                .ok_or_else(|| bad_line(lineno, "malformed face index"))?,
                        ),
                    };
                    corners.push((v, vt));
                }
                if corners.len() < 3 {
                    return Err(bad_line(lineno, "face with fewer than 3 corners"));
                }
                for (v, vt) in &corners {
                    if let Some(vt) = vt {
                        vertex_uv[*v] = Some(*vt);
                    }
                }
                for i in 1..corners.len() - 1 {
                    faces.push([corners[0].0, corners[i].0, corners[i + 1].0]);
                }
            }
            _ => {} // comments, normals, groups, materials
        }
    }

    let uvs: Vec<Point2<f32>> = vertex_uv
        .iter()
        .map(|slot| slot.map(|vt| texcoords[vt]).unwrap_or_else(Point2::origin))
        .collect();

    Mesh::with_uvs(positions, faces, uvs).map_err(|e| UnwrapError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Resolve a 1-based (or negative, relative) OBJ index.
fn parse_index(token: &str, len: usize) -> Option<usize> {
    let idx: i64 = token.parse().ok()?;
    let resolved = if idx > 0 {
        idx as usize - 1
    } else if idx < 0 {
        len.checked_sub(idx.unsigned_abs() as usize)?
    } else {
        return None;
    };
    (resolved < len).then_some(resolved)
}

/// Save a mesh (with its UVs) to an OBJ file.
pub fn save<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for p in mesh.vertices() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for uv in mesh.uvs() {
        writeln!(writer, "vt {} {}", uv.x, uv.y)?;
    }
    for face in mesh.faces() {
        writeln!(
            writer,
            "f {}/{} {}/{} {}/{}",
            face[0] + 1,
            face[0] + 1,
            face[1] + 1,
            face[1] + 1,
            face[2] + 1,
            face[2] + 1
        )?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> std::path::PathBuf {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("peel-obj-test-{}-{}.obj", std::process::id(), n));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_triangle() {
        let path = write_temp(
            "# triangle\n\
             v 0 0 0\n\
             v 1 0 0\n\
             v 0 1 0\n\
             f 1 2 3\n",
        );
        let mesh = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.face(0), [0, 1, 2]);
    }

    #[test]
    fn test_load_with_uvs() {
        let path = write_temp(
            "v 0 0 0\n\
             v 1 0 0\n\
             v 0 1 0\n\
             vt 0 0\n\
             vt 1 0\n\
             vt 0 1\n\
             f 1/1 2/2 3/3\n",
        );
        let mesh = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.uv(1), Point2::new(1.0, 0.0));
        assert_eq!(mesh.uv(2), Point2::new(0.0, 1.0));
    }

    #[test]
    fn test_load_quad_fan() {
        let path = write_temp(
            "v 0 0 0\n\
             v 1 0 0\n\
             v 1 1 0\n\
             v 0 1 0\n\
             f 1 2 3 4\n",
        );
        let mesh = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.face(0), [0, 1, 2]);
        assert_eq!(mesh.face(1), [0, 2, 3]);
    }

    #[test]
    fn test_load_negative_indices() {
        let path = write_temp(
            "v 0 0 0\n\
             v 1 0 0\n\
             v 0 1 0\n\
             f -3 -2 -1\n",
        );
        let mesh = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.face(0), [0, 1, 2]);
    }

    #[test]
    fn test_load_bad_index() {
        let path = write_temp("v 0 0 0\nf 1 2 3\n");
        let result = load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(UnwrapError::LoadError { .. })));
    }

    #[test]
    fn test_roundtrip() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = Mesh::new(vertices, vec![[0, 1, 2]]).unwrap();
        mesh.set_uv(0, Point2::new(0.25, 0.75));

        let path = std::env::temp_dir().join(format!("peel-obj-roundtrip-{}.obj", std::process::id()));
        save(&mesh, &path).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.num_vertices(), 3);
        assert_eq!(loaded.num_faces(), 1);
        assert_eq!(loaded.uv(0), Point2::new(0.25, 0.75));
    }
}
