//! Squared-distance primitives with witness points.
//!
//! Every pair type classifies which feature pair realises the minimum,
//! then expresses the squared distance as |a - b|² of the witness points
//! a = Σ αᵢ xᵢ and b = Σ βⱼ yⱼ with clamped barycentric coefficients.
//! The same coefficients drive the local derivatives, so the distance and
//! derivative paths cannot disagree.

use na::{DMatrix, DVector, Vector3};

use crate::types::Float;

pub mod edge_edge;
pub mod point_edge;
pub mod point_point;
pub mod point_triangle;

pub use edge_edge::{edge_edge_closest_parameters, edge_edge_distance, EdgeEdgeDistanceType};
pub use point_edge::{point_edge_closest_parameter, point_edge_distance, PointEdgeDistanceType};
pub use point_point::point_point_distance;
pub use point_triangle::{
    point_triangle_closest_coords, point_triangle_distance, PointTriangleDistanceType,
};

/// Local gradient of the squared distance in witness form.
///
/// `coeffs` are the signed barycentric coefficients c = [α…, -β…] of the
/// pair's vertices and `diff = a - b` the witness difference, so the block
/// of vertex k is 2 cₖ (a - b). Exact at the clamped minimiser.
pub fn witness_gradient(coeffs: &[Float], diff: &Vector3<Float>, dim: usize) -> DVector<Float> {
    let mut grad = DVector::zeros(coeffs.len() * dim);
    for (k, &c) in coeffs.iter().enumerate() {
        for j in 0..dim {
            grad[k * dim + j] = 2.0 * c * diff[j];
        }
    }
    grad
}

/// Local Hessian of the squared distance in witness form: 2 (c cᵀ) ⊗ I.
///
/// This is the symmetric closest-point form (the coefficients are held at
/// the minimiser), which is what the projected barrier assembly consumes.
pub fn witness_hessian(coeffs: &[Float], dim: usize) -> DMatrix<Float> {
    let n = coeffs.len() * dim;
    let mut hess = DMatrix::zeros(n, n);
    for (k, &ck) in coeffs.iter().enumerate() {
        for (l, &cl) in coeffs.iter().enumerate() {
            for j in 0..dim {
                hess[(k * dim + j, l * dim + j)] = 2.0 * ck * cl;
            }
        }
    }
    hess
}
