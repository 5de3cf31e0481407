//! Least Squares Conformal Maps (LSCM) parameterization.
//!
//! For one island (a subset of mesh faces) this module assembles the
//! discrete conformal-energy operator, pins two vertices to fix the
//! remaining gauge freedom (translation, rotation, isotropic scale),
//! solves the sparse system by direct LU, and normalizes the resulting
//! UVs into the unit square.
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info};
use nalgebra::{Complex, DVector, Point2};

use crate::error::{Result, UnwrapError};
use crate::mesh::Mesh;
use crate::sparse::{CscMatrix, SparseLu};

/// Triangles with twice-area below this are skipped during assembly.
const DEGENERATE_AREA2: f64 = 1e-12;

/// UV ranges below this are treated as unit during normalization.
const MIN_UV_RANGE: f32 = 1e-6;

/// Parameterization of a single island.
///
/// UVs are indexed by the island's local vertex numbering;
/// `local_to_global` maps each local index back to the mesh vertex it
/// came from so callers can scatter the UVs into the shared buffer.
#[derive(Debug, Clone)]
pub struct IslandParam {
    /// Local vertex index → global mesh vertex index.
    local_to_global: Vec<usize>,
    /// Per-local-vertex UVs, normalized to the unit square.
    uvs: Vec<Point2<f32>>,
}

impl IslandParam {
    /// Number of local vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.uvs.len()
    }

    /// Whether the island has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uvs.is_empty()
    }

    /// The local → global vertex mapping.
    #[inline]
    pub fn local_to_global(&self) -> &[usize] {
        &self.local_to_global
    }

    /// The normalized UVs, one per local vertex.
    #[inline]
    pub fn uvs(&self) -> &[Point2<f32>] {
        &self.uvs
    }

    /// Iterate over `(global vertex, uv)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Point2<f32>)> + '_ {
        self.local_to_global
            .iter()
            .zip(&self.uvs)
            .map(|(&g, &uv)| (g, uv))
    }
}

/// Compute the LSCM parameterization of a face subset.
///
/// Returns UVs for the island's distinct vertices, normalized to the unit
/// square, together with the local-to-global vertex mapping.
///
/// # Errors
///
/// - [`UnwrapError::IslandTooSmall`] for fewer than 3 distinct vertices
/// - [`UnwrapError::DegenerateIsland`] when every triangle has near-zero area
/// - [`UnwrapError::SolverFailed`] when the LU factorization fails
pub fn lscm_parameterize(mesh: &Mesh, faces: &[usize]) -> Result<IslandParam> {
    let (local_to_global, uvs_f64, _pins) = solve_island(mesh, faces)?;

    let mut uvs: Vec<Point2<f32>> = uvs_f64
        .iter()
        .map(|uv| Point2::new(uv.x as f32, uv.y as f32))
        .collect();
    normalize_uvs_to_unit_square(&mut uvs);

    Ok(IslandParam { local_to_global, uvs })
}

/// Assemble, pin, and solve the LSCM system for a face subset.
///
/// Returns the local-to-global mapping, the raw (unnormalized) UVs at
/// solver precision, and the two pinned local vertex indices.
fn solve_island(
    mesh: &Mesh,
    faces: &[usize],
) -> Result<(Vec<usize>, Vec<Point2<f64>>, (usize, usize))> {
    // Local numbering in first-encounter order over the face list.
    let mut global_to_local: HashMap<usize, usize> = HashMap::new();
    let mut local_to_global: Vec<usize> = Vec::with_capacity(faces.len() * 3);

    for &f in faces {
        for v in mesh.face(f) {
            global_to_local.entry(v).or_insert_with(|| {
                local_to_global.push(v);
                local_to_global.len() - 1
            });
        }
    }

    let n = local_to_global.len();
    if n < 3 {
        return Err(UnwrapError::IslandTooSmall { vertices: n });
    }
    debug!("LSCM: island of {} faces, {} vertices", faces.len(), n);

    // Conformal-energy operator: for each triangle, project into its own
    // plane, form per-vertex complex coefficients, and accumulate the
    // pairwise products as 2x2 blocks over the (u, v) unknowns. Unknowns
    // are laid out u_0..u_{n-1}, v_0..v_{n-1}.
    let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(faces.len() * 36);
    let mut skipped = 0usize;

    for &f in faces {
        let [ga, gb, gc] = mesh.face(f);
        let pa = mesh.position_f64(ga);
        let pb = mesh.position_f64(gb);
        let pc = mesh.position_f64(gc);

        let e0 = pb - pa;
        let e1 = pc - pa;
        let normal = e0.cross(&e1);
        let area2 = normal.norm();
        if area2 < DEGENERATE_AREA2 {
            skipped += 1;
            continue;
        }

        // Orthonormal frame in the triangle's plane.
        let ex = e0 / e0.norm();
        let ey_raw = normal.cross(&ex);
        let ey = ey_raw / ey_raw.norm();

        // 2D projections relative to vertex a; as complex numbers.
        let cb = Complex::new(e0.dot(&ex), e0.dot(&ey));
        let cc = Complex::new(e1.dot(&ex), e1.dot(&ey));

        // Conformal-energy coefficient of each vertex is its opposite
        // edge in the projected triangle. The assembled quadratic form
        // vanishes exactly on similarity flattenings of the triangle,
        // orientation reversed (the pairwise product conjugates the
        // second factor), so islands come out mirror-imaged.
        let coeffs = [cc - cb, -cc, cb];
        let locals = [
            global_to_local[&ga],
            global_to_local[&gb],
            global_to_local[&gc],
        ];

        let weight = 1.0 / (0.5 * area2);

        for (i, &ci) in coeffs.iter().enumerate() {
            for (j, &cj) in coeffs.iter().enumerate() {
                let prod = ci * weight * cj.conj();
                let (ui, vi) = (locals[i], n + locals[i]);
                let (uj, vj) = (locals[j], n + locals[j]);
                triplets.push((ui, uj, prod.re));
                triplets.push((ui, vj, -prod.im));
                triplets.push((vi, uj, prod.im));
                triplets.push((vi, vj, prod.re));
            }
        }
    }

    if skipped == faces.len() {
        return Err(UnwrapError::DegenerateIsland { faces: faces.len() });
    }

    let (pin0, pin1) = select_pins(mesh, faces, &global_to_local, &local_to_global, n);

    // Dirichlet conditions by row/column elimination: pinned rows become
    // identity rows with the target on the right-hand side, and pinned
    // columns are folded into the right-hand side of the free rows so the
    // eliminated unknowns keep their influence. Pin targets are (0,0)
    // and (1,0), so only the u column of pin1 carries a contribution.
    let pinned = [pin0, n + pin0, pin1, n + pin1];
    let is_pinned = |idx: usize| pinned.contains(&idx);

    let mut rhs = DVector::zeros(2 * n);
    rhs[pin1] = 1.0;

    let mut kept = Vec::with_capacity(triplets.len());
    for (r, c, v) in triplets {
        if is_pinned(r) {
            continue;
        }
        if is_pinned(c) {
            if c == pin1 {
                rhs[r] -= v;
            }
            continue;
        }
        kept.push((r, c, v));
    }
    for &r in &pinned {
        kept.push((r, r, 1.0));
    }
    let triplets = kept;

    let matrix = CscMatrix::from_triplets(2 * n, 2 * n, triplets);
    let lu = SparseLu::factor(&matrix)?;
    let solution = lu.solve(&rhs);

    let uvs: Vec<Point2<f64>> = (0..n)
        .map(|i| Point2::new(solution[i], solution[n + i]))
        .collect();

    info!("LSCM: solved island ({} vertices, {} skipped triangles)", n, skipped);
    Ok((local_to_global, uvs, (pin0, pin1)))
}

/// Choose the two pinned local vertices.
///
/// Preferred: the first boundary vertex and the boundary vertex farthest
/// from it in 3D (squared distance, first winner kept on ties). Islands
/// without a usable boundary fall back to local vertices 0 and n/2.
fn select_pins(
    mesh: &Mesh,
    faces: &[usize],
    global_to_local: &HashMap<usize, usize>,
    local_to_global: &[usize],
    n: usize,
) -> (usize, usize) {
    let boundary = find_boundary_vertices(mesh, faces);
    let b_local: Vec<usize> = boundary
        .iter()
        .filter_map(|g| global_to_local.get(g).copied())
        .collect();

    if b_local.len() < 2 {
        return (0, n / 2);
    }

    let pin0 = b_local[0];
    let p0 = mesh.position_f64(local_to_global[pin0]);

    let mut pin1 = pin0;
    let mut max_dist = -1.0;
    for &l in &b_local {
        let d = (mesh.position_f64(local_to_global[l]) - p0).norm_squared();
        if d > max_dist {
            max_dist = d;
            pin1 = l;
        }
    }

    (pin0, pin1)
}

/// Find the boundary vertices of a face subset.
///
/// An edge used by exactly one triangle of the subset is a boundary edge;
/// its endpoints are boundary vertices. Returns global vertex indices in
/// ascending order. The boundary is recomputed from the face list, not
/// taken from the full mesh, because an island's cut edges are boundary
/// for the island even when interior to the mesh.
pub fn find_boundary_vertices(mesh: &Mesh, faces: &[usize]) -> Vec<usize> {
    let mut edge_count: BTreeMap<(usize, usize), usize> = BTreeMap::new();

    for &f in faces {
        let [a, b, c] = mesh.face(f);
        for (u, v) in [(a, b), (b, c), (c, a)] {
            let key = if u < v { (u, v) } else { (v, u) };
            *edge_count.entry(key).or_insert(0) += 1;
        }
    }

    let mut boundary: BTreeSet<usize> = BTreeSet::new();
    for ((v0, v1), count) in edge_count {
        if count == 1 {
            boundary.insert(v0);
            boundary.insert(v1);
        }
    }

    boundary.into_iter().collect()
}

/// Rescale UVs so each axis spans [0, 1].
///
/// Axes are rescaled independently; an axis with near-zero extent is
/// translated to 0 and left unscaled. Calling this twice gives the same
/// result as calling it once.
pub fn normalize_uvs_to_unit_square(uvs: &mut [Point2<f32>]) {
    if uvs.is_empty() {
        return;
    }

    let mut min_u = f32::MAX;
    let mut max_u = f32::MIN;
    let mut min_v = f32::MAX;
    let mut max_v = f32::MIN;

    for uv in uvs.iter() {
        min_u = min_u.min(uv.x);
        max_u = max_u.max(uv.x);
        min_v = min_v.min(uv.y);
        max_v = max_v.max(uv.y);
    }

    let mut u_range = max_u - min_u;
    let mut v_range = max_v - min_v;
    if u_range < MIN_UV_RANGE {
        u_range = 1.0;
    }
    if v_range < MIN_UV_RANGE {
        v_range = 1.0;
    }

    for uv in uvs.iter_mut() {
        uv.x = (uv.x - min_u) / u_range;
        uv.y = (uv.y - min_v) / v_range;
    }
}
