//! Self-intersection test over a static configuration.

use na::{DMatrix, Vector2, Vector3};

use crate::broad_phase::{detect_edge_edge_candidates, detect_edge_face_candidates, BroadPhaseMethod};
use crate::mesh::CollisionMesh;
use crate::types::Float;
use crate::util::{lift_vertex, world_bbox_diagonal_length};

fn orientation(a: &Vector2<Float>, b: &Vector2<Float>, c: &Vector2<Float>) -> Float {
    (b - a).perp(&(c - a))
}

fn on_segment(a: &Vector2<Float>, b: &Vector2<Float>, p: &Vector2<Float>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether the closed segments (p0, p1) and (q0, q1) intersect, endpoints
/// and collinear overlap included.
pub fn segments_intersect_2d(
    p0: &Vector2<Float>,
    p1: &Vector2<Float>,
    q0: &Vector2<Float>,
    q1: &Vector2<Float>,
) -> bool {
    let d1 = orientation(q0, q1, p0);
    let d2 = orientation(q0, q1, p1);
    let d3 = orientation(p0, p1, q0);
    let d4 = orientation(p0, p1, q1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q0, q1, p0))
        || (d2 == 0.0 && on_segment(q0, q1, p1))
        || (d3 == 0.0 && on_segment(p0, p1, q0))
        || (d4 == 0.0 && on_segment(p0, p1, q1))
}

/// Whether the closed segment (e0, e1) crosses the triangle (t0, t1, t2).
/// Segments lying in the triangle's plane are not reported.
/// ref: Möller & Trumbore, Fast, Minimum Storage Ray/Triangle Intersection
pub fn segment_intersects_triangle(
    e0: &Vector3<Float>,
    e1: &Vector3<Float>,
    t0: &Vector3<Float>,
    t1: &Vector3<Float>,
    t2: &Vector3<Float>,
) -> bool {
    let dir = e1 - e0;
    let edge1 = t1 - t0;
    let edge2 = t2 - t0;

    let h = dir.cross(&edge2);
    let det = edge1.dot(&h);
    if det == 0.0 {
        return false;
    }

    let inv_det = 1.0 / det;
    let s = e0 - t0;
    let u = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(&edge1);
    let v = inv_det * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = inv_det * edge2.dot(&q);
    (0.0..=1.0).contains(&t)
}

/// Whether the configuration V contains a self-intersection: crossing
/// edges in 2D, an edge piercing a face in 3D. Incident primitives are
/// never tested against each other.
pub fn has_intersections(
    mesh: &CollisionMesh,
    V: &DMatrix<Float>,
    method: BroadPhaseMethod,
) -> bool {
    assert_eq!(V.nrows(), mesh.num_vertices());

    let conservative_inflation_radius = 1e-2 * world_bbox_diagonal_length(V);

    if V.ncols() == 2 {
        let vertex = |i: usize| na::vector![V[(i, 0)], V[(i, 1)]];
        detect_edge_edge_candidates(mesh, V, conservative_inflation_radius, method)
            .iter()
            .any(|&(a, b)| {
                let [a0, a1] = mesh.edges[a];
                let [b0, b1] = mesh.edges[b];
                segments_intersect_2d(&vertex(a0), &vertex(a1), &vertex(b0), &vertex(b1))
            })
    } else {
        detect_edge_face_candidates(mesh, V, conservative_inflation_radius, method)
            .iter()
            .any(|c| {
                let [e0, e1] = mesh.edges[c.edge];
                let [t0, t1, t2] = mesh.faces[c.face];
                segment_intersects_triangle(
                    &lift_vertex(V, e0),
                    &lift_vertex(V, e1),
                    &lift_vertex(V, t0),
                    &lift_vertex(V, t1),
                    &lift_vertex(V, t2),
                )
            })
    }
}

#[cfg(test)]
mod intersection_tests {
    use na::{dmatrix, vector};

    use super::{has_intersections, segment_intersects_triangle, segments_intersect_2d};
    use crate::broad_phase::BroadPhaseMethod;
    use crate::mesh::CollisionMesh;

    #[test]
    fn crossing_segments() {
        let p0 = vector![0.0, 0.0];
        let p1 = vector![1.0, 1.0];
        let q0 = vector![0.0, 1.0];
        let q1 = vector![1.0, 0.0];
        assert!(segments_intersect_2d(&p0, &p1, &q0, &q1));
    }

    #[test]
    fn disjoint_segments() {
        let p0 = vector![0.0, 0.0];
        let p1 = vector![1.0, 0.0];
        let q0 = vector![0.0, 1.0];
        let q1 = vector![1.0, 1.0];
        assert!(!segments_intersect_2d(&p0, &p1, &q0, &q1));
    }

    #[test]
    fn collinear_overlapping_segments() {
        let p0 = vector![0.0, 0.0];
        let p1 = vector![2.0, 0.0];
        let q0 = vector![1.0, 0.0];
        let q1 = vector![3.0, 0.0];
        assert!(segments_intersect_2d(&p0, &p1, &q0, &q1));
    }

    #[test]
    fn segment_through_triangle() {
        let t0 = vector![0.0, 0.0, 0.0];
        let t1 = vector![1.0, 0.0, 0.0];
        let t2 = vector![0.0, 1.0, 0.0];
        let e0 = vector![0.2, 0.2, -0.5];
        let e1 = vector![0.2, 0.2, 0.5];
        assert!(segment_intersects_triangle(&e0, &e1, &t0, &t1, &t2));

        let e0 = vector![2.0, 2.0, -0.5];
        let e1 = vector![2.0, 2.0, 0.5];
        assert!(!segment_intersects_triangle(&e0, &e1, &t0, &t1, &t2));

        // stops short of the plane
        let e0 = vector![0.2, 0.2, 0.5];
        let e1 = vector![0.2, 0.2, 1.5];
        assert!(!segment_intersects_triangle(&e0, &e1, &t0, &t1, &t2));
    }

    #[test]
    fn crossing_edges_2d_mesh() {
        let mesh = CollisionMesh::new(4, vec![[0, 1], [2, 3]], vec![]);
        let V = dmatrix![
            0.0, 0.0;
            1.0, 1.0;
            0.0, 1.0;
            1.0, 0.0;
        ];
        assert!(has_intersections(&mesh, &V, BroadPhaseMethod::HashGrid));
    }

    #[test]
    fn clean_2d_mesh() {
        let mesh = CollisionMesh::new(4, vec![[0, 1], [2, 3]], vec![]);
        let V = dmatrix![
            0.0, 0.0;
            1.0, 0.0;
            0.0, 1.0;
            1.0, 1.0;
        ];
        assert!(!has_intersections(&mesh, &V, BroadPhaseMethod::HashGrid));
    }

    #[test]
    fn edge_piercing_face_3d_mesh() {
        let mesh = CollisionMesh::new(5, vec![[3, 4]], vec![[0, 1, 2]]);
        let V = dmatrix![
            0.0, 0.0, 0.0;
            1.0, 0.0, 0.0;
            0.0, 1.0, 0.0;
            0.2, 0.2, -0.5;
            0.2, 0.2, 0.5;
        ];
        assert!(has_intersections(&mesh, &V, BroadPhaseMethod::BruteForce));

        let mut V_clean = V.clone();
        V_clean[(3, 2)] = 1.0;
        V_clean[(4, 2)] = 2.0;
        assert!(!has_intersections(&mesh, &V_clean, BroadPhaseMethod::BruteForce));
    }

    #[test]
    fn empty_topology_has_no_intersections() {
        let mesh = CollisionMesh::new(3, vec![], vec![]);
        let V = dmatrix![
            0.0, 0.0, 0.0;
            1.0, 0.0, 0.0;
            0.0, 1.0, 0.0;
        ];
        assert!(!has_intersections(&mesh, &V, BroadPhaseMethod::HashGrid));
    }
}
