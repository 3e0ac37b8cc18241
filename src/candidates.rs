//! Primitive-pair candidates produced by the broad phase.

use na::DMatrix;

use crate::ccd::{
    edge_edge_ccd, point_edge_ccd, point_point_ccd, point_triangle_ccd,
    DEFAULT_CONSERVATIVE_RESCALING,
};
use crate::types::Float;
use crate::util::lift_vertex;

/// A primitive pair to be tested by the narrow phase. Candidates are
/// ephemeral: produced by a broad phase, consumed once, never mutated.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Candidate {
    VertexVertex(usize, usize),
    EdgeVertex { edge: usize, vertex: usize },
    EdgeEdge(usize, usize),
    FaceVertex { face: usize, vertex: usize },
}

/// Edge-face pair used only by the intersection narrow phase.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EdgeFaceCandidate {
    pub edge: usize,
    pub face: usize,
}

impl Candidate {
    /// Time of impact of this pair along the linear trajectory from V0 to
    /// V1, or None when the pair stays separated up to tmax.
    #[allow(clippy::too_many_arguments)]
    pub fn ccd(
        &self,
        V0: &DMatrix<Float>,
        V1: &DMatrix<Float>,
        edges: &[[usize; 2]],
        faces: &[[usize; 3]],
        tmax: Float,
        tolerance: Float,
        max_iterations: usize,
    ) -> Option<Float> {
        match *self {
            Candidate::VertexVertex(v0, v1) => point_point_ccd(
                &lift_vertex(V0, v0),
                &lift_vertex(V0, v1),
                &lift_vertex(V1, v0),
                &lift_vertex(V1, v1),
                tmax,
                tolerance,
                max_iterations,
                DEFAULT_CONSERVATIVE_RESCALING,
            ),
            Candidate::EdgeVertex { edge, vertex } => {
                let [e0, e1] = edges[edge];
                point_edge_ccd(
                    &lift_vertex(V0, vertex),
                    &lift_vertex(V0, e0),
                    &lift_vertex(V0, e1),
                    &lift_vertex(V1, vertex),
                    &lift_vertex(V1, e0),
                    &lift_vertex(V1, e1),
                    tmax,
                    tolerance,
                    max_iterations,
                    DEFAULT_CONSERVATIVE_RESCALING,
                )
            }
            Candidate::EdgeEdge(a, b) => {
                let [ea0, ea1] = edges[a];
                let [eb0, eb1] = edges[b];
                edge_edge_ccd(
                    &lift_vertex(V0, ea0),
                    &lift_vertex(V0, ea1),
                    &lift_vertex(V0, eb0),
                    &lift_vertex(V0, eb1),
                    &lift_vertex(V1, ea0),
                    &lift_vertex(V1, ea1),
                    &lift_vertex(V1, eb0),
                    &lift_vertex(V1, eb1),
                    tmax,
                    tolerance,
                    max_iterations,
                    DEFAULT_CONSERVATIVE_RESCALING,
                )
            }
            Candidate::FaceVertex { face, vertex } => {
                let [t0, t1, t2] = faces[face];
                point_triangle_ccd(
                    &lift_vertex(V0, vertex),
                    &lift_vertex(V0, t0),
                    &lift_vertex(V0, t1),
                    &lift_vertex(V0, t2),
                    &lift_vertex(V1, vertex),
                    &lift_vertex(V1, t0),
                    &lift_vertex(V1, t1),
                    &lift_vertex(V1, t2),
                    tmax,
                    tolerance,
                    max_iterations,
                    DEFAULT_CONSERVATIVE_RESCALING,
                )
            }
        }
    }
}

#[cfg(test)]
mod candidate_tests {
    use na::dmatrix;

    use super::Candidate;
    use crate::assert_close;
    use crate::ccd::{DEFAULT_CCD_MAX_ITERATIONS, DEFAULT_CCD_TOLERANCE};

    #[test]
    fn face_vertex_dispatch() {
        let V0 = dmatrix![
            0.2, 0.2, 1.0;
            0.0, 0.0, 0.0;
            1.0, 0.0, 0.0;
            0.0, 1.0, 0.0;
        ];
        let mut V1 = V0.clone();
        V1[(0, 2)] = -1.0;

        let faces = vec![[1, 2, 3]];
        let candidate = Candidate::FaceVertex { face: 0, vertex: 0 };
        let toi = candidate
            .ccd(
                &V0,
                &V1,
                &[],
                &faces,
                1.0,
                DEFAULT_CCD_TOLERANCE,
                DEFAULT_CCD_MAX_ITERATIONS,
            )
            .unwrap();
        assert_close!(toi, 0.4, 1e-3);
    }

    #[test]
    fn edge_vertex_dispatch_2d() {
        let V0 = dmatrix![
            0.5, 1.0;
            0.0, 0.0;
            1.0, 0.0;
        ];
        let mut V1 = V0.clone();
        V1[(0, 1)] = -1.0;

        let edges = vec![[1, 2]];
        let candidate = Candidate::EdgeVertex { edge: 0, vertex: 0 };
        let toi = candidate
            .ccd(
                &V0,
                &V1,
                &edges,
                &[],
                1.0,
                DEFAULT_CCD_TOLERANCE,
                DEFAULT_CCD_MAX_ITERATIONS,
            )
            .unwrap();
        assert_close!(toi, 0.4, 1e-3);
    }
}
