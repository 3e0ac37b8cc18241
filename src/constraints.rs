//! Barrier constraints: active primitive pairs with quadrature weights.

use na::{DMatrix, DVector, Vector3};

use crate::barrier::{barrier, barrier_first_derivative, barrier_second_derivative};
use crate::distance::{
    edge_edge_closest_parameters, point_edge_closest_parameter, point_triangle_closest_coords,
    witness_gradient, witness_hessian,
};
use crate::types::Float;
use crate::util::{lift_vertex, project_to_psd};

/// A vertex-vertex pair under barrier potential.
#[derive(Clone, PartialEq, Debug)]
pub struct VertexVertexConstraint {
    pub vertex0: usize,
    pub vertex1: usize,
    pub weight: Float,
    pub weight_gradient: Vec<(usize, Float)>,
}

/// An edge-vertex pair under barrier potential.
#[derive(Clone, PartialEq, Debug)]
pub struct EdgeVertexConstraint {
    pub edge: usize,
    pub vertex: usize,
    pub weight: Float,
    pub weight_gradient: Vec<(usize, Float)>,
}

/// An edge-edge pair under barrier potential.
#[derive(Clone, PartialEq, Debug)]
pub struct EdgeEdgeConstraint {
    pub edge0: usize,
    pub edge1: usize,
    pub weight: Float,
    pub weight_gradient: Vec<(usize, Float)>,
}

/// A face-vertex pair under barrier potential.
#[derive(Clone, PartialEq, Debug)]
pub struct FaceVertexConstraint {
    pub face: usize,
    pub vertex: usize,
    pub weight: Float,
    pub weight_gradient: Vec<(usize, Float)>,
}

/// An active primitive pair with its quadrature weight and the sparse
/// gradient of that weight with respect to the vertex positions.
///
/// The weight is premultiplied into the potential and its derivatives; the
/// weight gradient only enters the shape derivative.
#[derive(Clone, PartialEq, Debug)]
pub enum CollisionConstraint {
    VertexVertex(VertexVertexConstraint),
    EdgeVertex(EdgeVertexConstraint),
    EdgeEdge(EdgeEdgeConstraint),
    FaceVertex(FaceVertexConstraint),
}

impl VertexVertexConstraint {
    pub fn new(vertex0: usize, vertex1: usize) -> Self {
        VertexVertexConstraint {
            vertex0,
            vertex1,
            weight: 1.0,
            weight_gradient: vec![],
        }
    }
}

impl EdgeVertexConstraint {
    pub fn new(edge: usize, vertex: usize) -> Self {
        EdgeVertexConstraint {
            edge,
            vertex,
            weight: 1.0,
            weight_gradient: vec![],
        }
    }
}

impl EdgeEdgeConstraint {
    pub fn new(edge0: usize, edge1: usize) -> Self {
        EdgeEdgeConstraint {
            edge0,
            edge1,
            weight: 1.0,
            weight_gradient: vec![],
        }
    }
}

impl FaceVertexConstraint {
    pub fn new(face: usize, vertex: usize) -> Self {
        FaceVertexConstraint {
            face,
            vertex,
            weight: 1.0,
            weight_gradient: vec![],
        }
    }
}

impl CollisionConstraint {
    /// Ordered vertices of the pair (the lone point first for mixed pairs);
    /// length 2, 3 or 4 depending on the variant.
    pub fn vertex_indices(&self, edges: &[[usize; 2]], faces: &[[usize; 3]]) -> Vec<usize> {
        match *self {
            CollisionConstraint::VertexVertex(ref c) => vec![c.vertex0, c.vertex1],
            CollisionConstraint::EdgeVertex(ref c) => {
                let [e0, e1] = edges[c.edge];
                vec![c.vertex, e0, e1]
            }
            CollisionConstraint::EdgeEdge(ref c) => {
                let [ea0, ea1] = edges[c.edge0];
                let [eb0, eb1] = edges[c.edge1];
                vec![ea0, ea1, eb0, eb1]
            }
            CollisionConstraint::FaceVertex(ref c) => {
                let [t0, t1, t2] = faces[c.face];
                vec![c.vertex, t0, t1, t2]
            }
        }
    }

    pub fn weight(&self) -> Float {
        match self {
            CollisionConstraint::VertexVertex(c) => c.weight,
            CollisionConstraint::EdgeVertex(c) => c.weight,
            CollisionConstraint::EdgeEdge(c) => c.weight,
            CollisionConstraint::FaceVertex(c) => c.weight,
        }
    }

    pub fn weight_gradient(&self) -> &[(usize, Float)] {
        match self {
            CollisionConstraint::VertexVertex(c) => &c.weight_gradient,
            CollisionConstraint::EdgeVertex(c) => &c.weight_gradient,
            CollisionConstraint::EdgeEdge(c) => &c.weight_gradient,
            CollisionConstraint::FaceVertex(c) => &c.weight_gradient,
        }
    }

    /// Signed witness coefficients of the pair's vertices (in
    /// `vertex_indices` order) and the witness difference a - b. The
    /// squared distance is |a - b|².
    fn witness(
        &self,
        V: &DMatrix<Float>,
        edges: &[[usize; 2]],
        faces: &[[usize; 3]],
    ) -> (Vec<Float>, Vector3<Float>) {
        match *self {
            CollisionConstraint::VertexVertex(ref c) => {
                let p0 = lift_vertex(V, c.vertex0);
                let p1 = lift_vertex(V, c.vertex1);
                (vec![1.0, -1.0], p0 - p1)
            }
            CollisionConstraint::EdgeVertex(ref c) => {
                let [e0, e1] = edges[c.edge];
                let p = lift_vertex(V, c.vertex);
                let e0 = lift_vertex(V, e0);
                let e1 = lift_vertex(V, e1);
                let t = point_edge_closest_parameter(&p, &e0, &e1);
                (vec![1.0, -(1.0 - t), -t], p - ((1.0 - t) * e0 + t * e1))
            }
            CollisionConstraint::EdgeEdge(ref c) => {
                let [ea0, ea1] = edges[c.edge0];
                let [eb0, eb1] = edges[c.edge1];
                let ea0 = lift_vertex(V, ea0);
                let ea1 = lift_vertex(V, ea1);
                let eb0 = lift_vertex(V, eb0);
                let eb1 = lift_vertex(V, eb1);
                let (s, t) = edge_edge_closest_parameters(&ea0, &ea1, &eb0, &eb1);
                let a = (1.0 - s) * ea0 + s * ea1;
                let b = (1.0 - t) * eb0 + t * eb1;
                (vec![1.0 - s, s, -(1.0 - t), -t], a - b)
            }
            CollisionConstraint::FaceVertex(ref c) => {
                let [t0, t1, t2] = faces[c.face];
                let p = lift_vertex(V, c.vertex);
                let t0 = lift_vertex(V, t0);
                let t1 = lift_vertex(V, t1);
                let t2 = lift_vertex(V, t2);
                let w = point_triangle_closest_coords(&p, &t0, &t1, &t2);
                (
                    vec![1.0, -w[0], -w[1], -w[2]],
                    p - (w[0] * t0 + w[1] * t1 + w[2] * t2),
                )
            }
        }
    }

    /// Squared distance of the pair at configuration V.
    pub fn compute_distance(
        &self,
        V: &DMatrix<Float>,
        edges: &[[usize; 2]],
        faces: &[[usize; 3]],
    ) -> Float {
        let (_, diff) = self.witness(V, edges, faces);
        diff.norm_squared()
    }

    /// Barrier potential of the pair, quadrature weight included.
    pub fn compute_potential(
        &self,
        V: &DMatrix<Float>,
        edges: &[[usize; 2]],
        faces: &[[usize; 3]],
        dhat: Float,
    ) -> Float {
        let d_sq = self.compute_distance(V, edges, faces);
        self.weight() * barrier(d_sq, dhat * dhat)
    }

    /// Local gradient of the potential; length is the vertex count of the
    /// pair times the dimension of V.
    pub fn compute_potential_gradient(
        &self,
        V: &DMatrix<Float>,
        edges: &[[usize; 2]],
        faces: &[[usize; 3]],
        dhat: Float,
    ) -> DVector<Float> {
        let dim = V.ncols();
        let (coeffs, diff) = self.witness(V, edges, faces);
        let db = barrier_first_derivative(diff.norm_squared(), dhat * dhat);
        self.weight() * db * witness_gradient(&coeffs, &diff, dim)
    }

    /// Local Hessian of the potential, optionally projected to the
    /// positive-semidefinite cone.
    pub fn compute_potential_hessian(
        &self,
        V: &DMatrix<Float>,
        edges: &[[usize; 2]],
        faces: &[[usize; 3]],
        dhat: Float,
        project_hessian_to_psd: bool,
    ) -> DMatrix<Float> {
        let dim = V.ncols();
        let (coeffs, diff) = self.witness(V, edges, faces);
        let d_sq = diff.norm_squared();
        let dhat_sq = dhat * dhat;

        let grad_d = witness_gradient(&coeffs, &diff, dim);
        let hess_d = witness_hessian(&coeffs, dim);

        let hess = self.weight()
            * (barrier_second_derivative(d_sq, dhat_sq) * (&grad_d * grad_d.transpose())
                + barrier_first_derivative(d_sq, dhat_sq) * hess_d);

        if project_hessian_to_psd {
            project_to_psd(&hess)
        } else {
            hess
        }
    }
}

#[cfg(test)]
mod constraint_tests {
    use na::dmatrix;

    use super::{CollisionConstraint, EdgeEdgeConstraint, FaceVertexConstraint};
    use crate::barrier::barrier;
    use crate::{assert_close, assert_vec_close};

    #[test]
    fn face_vertex_distance_and_potential() {
        let V = dmatrix![
            0.2, 0.2, 0.5;
            0.0, 0.0, 0.0;
            1.0, 0.0, 0.0;
            0.0, 1.0, 0.0;
        ];
        let faces = vec![[1, 2, 3]];
        let constraint = CollisionConstraint::FaceVertex(FaceVertexConstraint::new(0, 0));

        let d_sq = constraint.compute_distance(&V, &[], &faces);
        assert_close!(d_sq, 0.25, 1e-14);

        let dhat = 1.0;
        let phi = constraint.compute_potential(&V, &[], &faces, dhat);
        assert_close!(phi, barrier(0.25, 1.0), 1e-14);
    }

    #[test]
    fn vertex_indices_order() {
        let edges = vec![[3, 4], [5, 6]];
        let faces = vec![[7, 8, 9]];

        let c = CollisionConstraint::EdgeEdge(EdgeEdgeConstraint::new(0, 1));
        assert_eq!(c.vertex_indices(&edges, &faces), vec![3, 4, 5, 6]);

        let c = CollisionConstraint::FaceVertex(FaceVertexConstraint::new(0, 2));
        assert_eq!(c.vertex_indices(&edges, &faces), vec![2, 7, 8, 9]);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let V = dmatrix![
            0.21, 0.23, 0.4;
            0.0, 0.0, 0.0;
            1.0, 0.0, 0.0;
            0.0, 1.0, 0.0;
        ];
        let faces = vec![[1, 2, 3]];
        let constraint = CollisionConstraint::FaceVertex(FaceVertexConstraint::new(0, 0));
        let dhat = 1.0;

        let grad = constraint.compute_potential_gradient(&V, &[], &faces, dhat);
        assert_eq!(grad.len(), 12);

        let h = 1e-6;
        let fd = na::DVector::from_fn(12, |row, _| {
            let (k, j) = (row / 3, row % 3);
            let mut Vp = V.clone();
            let mut Vm = V.clone();
            Vp[(k, j)] += h;
            Vm[(k, j)] -= h;
            (constraint.compute_potential(&Vp, &[], &faces, dhat)
                - constraint.compute_potential(&Vm, &[], &faces, dhat))
                / (2.0 * h)
        });
        assert_vec_close!(grad, fd, 1e-6);
    }

    #[test]
    fn hessian_is_symmetric() {
        let V = dmatrix![
            0.2, 0.2, 0.3;
            0.0, 0.0, 0.0;
            1.0, 0.0, 0.0;
            0.0, 1.0, 0.0;
        ];
        let faces = vec![[1, 2, 3]];
        let constraint = CollisionConstraint::FaceVertex(FaceVertexConstraint::new(0, 0));

        let hess = constraint.compute_potential_hessian(&V, &[], &faces, 1.0, false);
        assert_eq!(hess.nrows(), 12);
        assert_close!((&hess - hess.transpose()).norm(), 0.0, 1e-10);
    }

    #[test]
    fn projected_hessian_is_psd() {
        let V = dmatrix![
            0.2, 0.2, 0.9;
            0.0, 0.0, 0.0;
            1.0, 0.0, 0.0;
            0.0, 1.0, 0.0;
        ];
        let faces = vec![[1, 2, 3]];
        let constraint = CollisionConstraint::FaceVertex(FaceVertexConstraint::new(0, 0));

        let hess = constraint.compute_potential_hessian(&V, &[], &faces, 1.0, true);
        let eigen = hess.symmetric_eigen();
        assert!(eigen.eigenvalues.iter().all(|&l| l >= -1e-10));
    }
}
