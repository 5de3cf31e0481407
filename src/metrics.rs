//! Parameterization quality metrics.
//!
//! Aggregate measurements of how much the computed UV map distorts the
//! surface: per-triangle stretch from the singular values of the UV→3D
//! Jacobian, the fraction of texture space covered by island bounding
//! rectangles, and the worst interior-angle deviation. All metrics are
//! diagnostics; none of them feed back into the pipeline.

use log::info;
use nalgebra::{Matrix2, Matrix3x2, Point2, Point3};

use crate::island::IslandMap;
use crate::mesh::Mesh;

/// Aggregate quality statistics for an unwrapped mesh.
#[derive(Debug, Clone, Copy)]
pub struct QualityMetrics {
    /// Mean per-triangle stretch (σmax/σmin of the UV→3D Jacobian; 1 is
    /// perfectly conformal).
    pub avg_stretch: f64,
    /// Worst per-triangle stretch.
    pub max_stretch: f64,
    /// Fraction of [0,1]² occupied by island bounding rectangles.
    pub coverage: f64,
    /// Largest |3D angle − UV angle| over all triangle corners, radians.
    pub angle_distortion: f64,
}

/// Compute stretch, coverage, and angle-distortion statistics.
pub fn compute_quality_metrics(mesh: &Mesh, islands: &IslandMap) -> QualityMetrics {
    let (avg_stretch, max_stretch) = compute_stretch(mesh);
    let coverage = compute_coverage(mesh, islands);
    let angle_distortion = compute_angle_distortion(mesh);

    let metrics = QualityMetrics {
        avg_stretch,
        max_stretch,
        coverage,
        angle_distortion,
    };
    info!(
        "quality: avg stretch {:.3}, max stretch {:.3}, coverage {:.1}%, angle distortion {:.3}",
        metrics.avg_stretch,
        metrics.max_stretch,
        metrics.coverage * 100.0,
        metrics.angle_distortion
    );
    metrics
}

/// Per-triangle stretch from the UV→3D Jacobian.
///
/// For each triangle, J maps UV displacements to 3D displacements; the
/// ratio of its singular values measures anisotropy. Triangles that are
/// degenerate in either domain contribute the neutral value 1.
fn compute_stretch(mesh: &Mesh) -> (f64, f64) {
    let mut sum = 0.0;
    let mut max = 0.0f64;
    let mut count = 0usize;

    for f in 0..mesh.num_faces() {
        let [a, b, c] = mesh.face(f);
        let stretch = triangle_stretch(
            mesh.position_f64(a),
            mesh.position_f64(b),
            mesh.position_f64(c),
            mesh.uv(a).cast(),
            mesh.uv(b).cast(),
            mesh.uv(c).cast(),
        );
        sum += stretch;
        max = max.max(stretch);
        count += 1;
    }

    if count == 0 {
        (1.0, 1.0)
    } else {
        (sum / count as f64, max)
    }
}

fn triangle_stretch(
    p0: Point3<f64>,
    p1: Point3<f64>,
    p2: Point3<f64>,
    uv0: Point2<f64>,
    uv1: Point2<f64>,
    uv2: Point2<f64>,
) -> f64 {
    let m = Matrix2::new(
        uv1.x - uv0.x,
        uv2.x - uv0.x,
        uv1.y - uv0.y,
        uv2.y - uv0.y,
    );
    if m.determinant().abs() < 1e-12 {
        return 1.0;
    }
    let Some(m_inv) = m.try_inverse() else {
        return 1.0;
    };

    let p = Matrix3x2::from_columns(&[(p1 - p0), (p2 - p0)]);
    let j = p * m_inv;

    // Singular values from the eigenvalues of JᵀJ (closed form for the
    // symmetric 2x2 case).
    let jtj = j.transpose() * j;
    let (a, b, d) = (jtj[(0, 0)], jtj[(0, 1)], jtj[(1, 1)]);
    let mean = 0.5 * (a + d);
    let delta = (0.25 * (a - d) * (a - d) + b * b).sqrt();
    let s_max = (mean + delta).max(0.0).sqrt();
    let s_min = (mean - delta).max(0.0).sqrt();

    if s_min > 1e-12 {
        s_max / s_min
    } else {
        1.0
    }
}

/// Fraction of the unit square covered by island bounding rectangles.
fn compute_coverage(mesh: &Mesh, islands: &IslandMap) -> f64 {
    let k = islands.num_islands();
    if k == 0 {
        return 0.0;
    }

    let mut min_u = vec![f32::MAX; k];
    let mut max_u = vec![f32::MIN; k];
    let mut min_v = vec![f32::MAX; k];
    let mut max_v = vec![f32::MIN; k];

    for f in 0..mesh.num_faces() {
        let id = islands.island_of(f);
        for v in mesh.face(f) {
            let uv = mesh.uv(v);
            min_u[id] = min_u[id].min(uv.x);
            max_u[id] = max_u[id].max(uv.x);
            min_v[id] = min_v[id].min(uv.y);
            max_v[id] = max_v[id].max(uv.y);
        }
    }

    let mut area = 0.0f64;
    for i in 0..k {
        if min_u[i] > max_u[i] {
            continue; // island with no faces
        }
        let w = (max_u[i].clamp(0.0, 1.0) - min_u[i].clamp(0.0, 1.0)).max(0.0) as f64;
        let h = (max_v[i].clamp(0.0, 1.0) - min_v[i].clamp(0.0, 1.0)).max(0.0) as f64;
        area += w * h;
    }
    area.min(1.0)
}

/// Largest deviation between 3D and UV interior angles.
fn compute_angle_distortion(mesh: &Mesh) -> f64 {
    let mut max_err = 0.0f64;

    for f in 0..mesh.num_faces() {
        let [a, b, c] = mesh.face(f);
        let p = [mesh.position_f64(a), mesh.position_f64(b), mesh.position_f64(c)];
        let t: [Point2<f64>; 3] = [mesh.uv(a).cast(), mesh.uv(b).cast(), mesh.uv(c).cast()];

        for i in 0..3 {
            let (j, k) = ((i + 1) % 3, (i + 2) % 3);
            let a3 = angle(
                (p[j] - p[i]).as_slice(),
                (p[k] - p[i]).as_slice(),
            );
            let a2 = angle(
                (t[j] - t[i]).as_slice(),
                (t[k] - t[i]).as_slice(),
            );
            max_err = max_err.max((a3 - a2).abs());
        }
    }

    max_err
}

fn angle(u: &[f64], v: &[f64]) -> f64 {
    let nu: f64 = u.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nv: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if nu < 1e-12 || nv < 1e-12 {
        return 0.0;
    }
    let dot: f64 = u.iter().zip(v).map(|(a, b)| a * b).sum();
    (dot / (nu * nv)).clamp(-1.0, 1.0).acos()
}
