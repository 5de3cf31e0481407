//! UV island packing.
//!
//! Each island's LSCM output occupies the unit square on its own. This
//! module shelf-packs the islands' bounding rectangles into a shared
//! [0,1]² texture space: islands are sorted by height and placed
//! left-to-right on horizontal shelves, wrapping to a new shelf when the
//! current one overflows, then the whole layout is uniformly rescaled to
//! fit the unit square.

use std::collections::BTreeSet;

use log::{info, warn};
use nalgebra::Point2;

use crate::island::IslandMap;
use crate::mesh::Mesh;

/// Minimum island extent; avoids zero-sized footprints.
const MIN_EXTENT: f32 = 1e-6;

/// Bounding box and placement of one island during packing.
#[derive(Debug, Clone)]
struct Island {
    min_u: f32,
    min_v: f32,
    width: f32,
    height: f32,
    target_x: f32,
    target_y: f32,
    vertex_indices: Vec<usize>,
}

/// Pack the per-island UVs into the unit square.
///
/// `margin` is the spacing kept around the border and between islands, in
/// UV units; values outside [0, 0.5) are clamped. A single island is left
/// untouched (its UVs are already normalized to [0,1]²).
pub fn pack_uv_islands(mesh: &mut Mesh, islands: &IslandMap, margin: f32) {
    if islands.num_islands() <= 1 {
        return;
    }

    let margin = if (0.0..0.5).contains(&margin) {
        margin
    } else {
        let clamped = margin.clamp(0.0, 0.49);
        warn!("island margin {} out of [0, 0.5), clamped to {}", margin, clamped);
        clamped
    };

    info!("packing {} islands (margin {})", islands.num_islands(), margin);

    // Collect per-island vertex sets and bounding boxes from the current
    // UV buffer.
    let mut vertex_sets = vec![BTreeSet::new(); islands.num_islands()];
    for f in 0..mesh.num_faces() {
        let set = &mut vertex_sets[islands.island_of(f)];
        for v in mesh.face(f) {
            set.insert(v);
        }
    }

    let mut items: Vec<Island> = Vec::with_capacity(islands.num_islands());
    for set in vertex_sets {
        let mut min_u = f32::MAX;
        let mut max_u = f32::MIN;
        let mut min_v = f32::MAX;
        let mut max_v = f32::MIN;
        for &v in &set {
            let uv = mesh.uv(v);
            min_u = min_u.min(uv.x);
            max_u = max_u.max(uv.x);
            min_v = min_v.min(uv.y);
            max_v = max_v.max(uv.y);
        }
        if set.is_empty() {
            min_u = 0.0;
            max_u = 0.0;
            min_v = 0.0;
            max_v = 0.0;
        }

        items.push(Island {
            min_u,
            min_v,
            width: (max_u - min_u).max(MIN_EXTENT),
            height: (max_v - min_v).max(MIN_EXTENT),
            target_x: 0.0,
            target_y: 0.0,
            vertex_indices: set.into_iter().collect(),
        });
    }

    // Tallest first; ties broken by width. total_cmp keeps the order
    // well-defined for equal extents.
    items.sort_by(|a, b| {
        b.height
            .total_cmp(&a.height)
            .then(b.width.total_cmp(&a.width))
    });

    // Shelf walk within the unit square.
    let mut cursor_x = margin;
    let mut cursor_y = margin;
    let mut shelf_h = 0.0f32;

    for item in &mut items {
        let footprint_w = item.width + margin;
        let footprint_h = item.height + margin;

        if cursor_x + footprint_w > 1.0 - margin && cursor_x > margin {
            cursor_x = margin;
            cursor_y += shelf_h + margin;
            shelf_h = 0.0;
        }

        item.target_x = cursor_x;
        item.target_y = cursor_y;

        cursor_x += footprint_w;
        shelf_h = shelf_h.max(footprint_h);
    }

    // Move each island from its own bbox origin to its shelf position.
    // Reads go through a snapshot so a seam vertex shared between islands
    // is repositioned from its original UV by every island that owns it,
    // the later (pack-order) island winning.
    let snapshot: Vec<Point2<f32>> = mesh.uvs().to_vec();
    for item in &items {
        for &v in &item.vertex_indices {
            let uv = snapshot[v];
            mesh.set_uv(
                v,
                Point2::new(
                    item.target_x + (uv.x - item.min_u),
                    item.target_y + (uv.y - item.min_v),
                ),
            );
        }
    }

    // Uniform rescale of the whole layout into [0,1]² with the minimum at
    // the origin. A single scale factor preserves island aspect ratios.
    let mut min_u = f32::MAX;
    let mut max_u = f32::MIN;
    let mut min_v = f32::MAX;
    let mut max_v = f32::MIN;
    for uv in mesh.uvs() {
        min_u = min_u.min(uv.x);
        max_u = max_u.max(uv.x);
        min_v = min_v.min(uv.y);
        max_v = max_v.max(uv.y);
    }

    let packed_w = (max_u - min_u).max(MIN_EXTENT);
    let packed_h = (max_v - min_v).max(MIN_EXTENT);
    let scale = 1.0 / packed_w.max(packed_h);

    for uv in mesh.uvs_mut() {
        uv.x = (uv.x - min_u) * scale;
        uv.y = (uv.y - min_v) * scale;
    }

    info!(
        "packing complete (packed_w={:.4}, packed_h={:.4}, scale={:.4})",
        packed_w, packed_h, scale
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::island::segment_islands;
    use crate::topology::build_topology;
    use nalgebra::Point3;

    /// Two disconnected triangles, each with UVs spanning the unit square.
    fn two_triangle_islands() -> (Mesh, IslandMap) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(5.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [3, 4, 5]];
        let mut mesh = Mesh::new(vertices, faces).unwrap();

        for &(v, u, w) in &[
            (0usize, 0.0f32, 0.0f32),
            (1, 1.0, 0.0),
            (2, 0.0, 1.0),
            (3, 0.0, 0.0),
            (4, 1.0, 0.0),
            (5, 0.0, 1.0),
        ] {
            mesh.set_uv(v, Point2::new(u, w));
        }

        let topo = build_topology(&mesh).unwrap();
        let islands = segment_islands(&mesh, &topo, &[]);
        assert_eq!(islands.num_islands(), 2);
        (mesh, islands)
    }

    #[test]
    fn test_containment() {
        let (mut mesh, islands) = two_triangle_islands();
        pack_uv_islands(&mut mesh, &islands, 0.02);

        for uv in mesh.uvs() {
            assert!(
                (-1e-6..=1.0 + 1e-6).contains(&uv.x),
                "u out of range: {}",
                uv.x
            );
            assert!(
                (-1e-6..=1.0 + 1e-6).contains(&uv.y),
                "v out of range: {}",
                uv.y
            );
        }
    }

    #[test]
    fn test_islands_separated() {
        let (mut mesh, islands) = two_triangle_islands();
        pack_uv_islands(&mut mesh, &islands, 0.02);

        // Bounding boxes of the two islands must not overlap.
        let bbox = |verts: &[usize]| {
            let mut min = Point2::new(f32::MAX, f32::MAX);
            let mut max = Point2::new(f32::MIN, f32::MIN);
            for &v in verts {
                let uv = mesh.uv(v);
                min.x = min.x.min(uv.x);
                min.y = min.y.min(uv.y);
                max.x = max.x.max(uv.x);
                max.y = max.y.max(uv.y);
            }
            (min, max)
        };
        let (min0, max0) = bbox(&[0, 1, 2]);
        let (min1, max1) = bbox(&[3, 4, 5]);

        let disjoint = max0.x < min1.x + 1e-6
            || max1.x < min0.x + 1e-6
            || max0.y < min1.y + 1e-6
            || max1.y < min0.y + 1e-6;
        assert!(disjoint, "island rectangles overlap");
    }

    #[test]
    fn test_single_island_untouched() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = Mesh::new(vertices, vec![[0, 1, 2]]).unwrap();
        mesh.set_uv(0, Point2::new(0.1, 0.2));
        mesh.set_uv(1, Point2::new(0.9, 0.2));
        mesh.set_uv(2, Point2::new(0.1, 0.8));
        let before: Vec<_> = mesh.uvs().to_vec();

        let topo = build_topology(&mesh).unwrap();
        let islands = segment_islands(&mesh, &topo, &[]);
        pack_uv_islands(&mut mesh, &islands, 0.02);

        assert_eq!(mesh.uvs(), &before[..]);
    }

    #[test]
    fn test_zero_margin() {
        let (mut mesh, islands) = two_triangle_islands();
        pack_uv_islands(&mut mesh, &islands, 0.0);

        for uv in mesh.uvs() {
            assert!((-1e-6..=1.0 + 1e-6).contains(&uv.x));
            assert!((-1e-6..=1.0 + 1e-6).contains(&uv.y));
        }
    }

    #[test]
    fn test_margin_clamped() {
        let (mut mesh, islands) = two_triangle_islands();
        // Out-of-range margin must not panic or push UVs outside.
        pack_uv_islands(&mut mesh, &islands, 0.75);
        for uv in mesh.uvs() {
            assert!((-1e-6..=1.0 + 1e-6).contains(&uv.x));
            assert!((-1e-6..=1.0 + 1e-6).contains(&uv.y));
        }
    }

    #[test]
    fn test_deterministic() {
        let (mesh0, islands) = two_triangle_islands();
        let mut a = mesh0.clone();
        let mut b = mesh0;
        pack_uv_islands(&mut a, &islands, 0.02);
        pack_uv_islands(&mut b, &islands, 0.02);
        assert_eq!(a.uvs(), b.uvs());
    }
}
