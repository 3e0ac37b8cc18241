//! Scatter of per-pair vectors and matrices into global dof space.
//!
//! Global dofs are vertex-major: vertex i, component j lives at row
//! i * dim + j. Local row k * dim + j belongs to the k-th vertex of the
//! pair's ordered vertex list.

use na::{DMatrix, DVector};

use crate::types::Float;

/// Add a local gradient into a dense global gradient.
pub fn local_gradient_to_global_gradient(
    local: &DVector<Float>,
    vertex_indices: &[usize],
    dim: usize,
    grad: &mut DVector<Float>,
) {
    assert_eq!(local.len(), vertex_indices.len() * dim);
    for (k, &vi) in vertex_indices.iter().enumerate() {
        for j in 0..dim {
            grad[vi * dim + j] += local[k * dim + j];
        }
    }
}

/// Sparse form of the gradient scatter: (global row, value) pairs.
pub fn local_gradient_to_global_triplets(
    local: &DVector<Float>,
    vertex_indices: &[usize],
    dim: usize,
) -> Vec<(usize, Float)> {
    assert_eq!(local.len(), vertex_indices.len() * dim);
    let mut triplets = Vec::with_capacity(local.len());
    for (k, &vi) in vertex_indices.iter().enumerate() {
        for j in 0..dim {
            triplets.push((vi * dim + j, local[k * dim + j]));
        }
    }
    triplets
}

/// Append the triplets of a local Hessian scattered to global rows and
/// columns; rows and columns use the same vertex mapping.
pub fn local_hessian_to_global_triplets(
    local: &DMatrix<Float>,
    vertex_indices: &[usize],
    dim: usize,
    triplets: &mut Vec<(usize, usize, Float)>,
) {
    assert_eq!(local.nrows(), vertex_indices.len() * dim);
    assert_eq!(local.ncols(), vertex_indices.len() * dim);
    for (k, &vi) in vertex_indices.iter().enumerate() {
        for (l, &vj) in vertex_indices.iter().enumerate() {
            for i in 0..dim {
                for j in 0..dim {
                    triplets.push((vi * dim + i, vj * dim + j, local[(k * dim + i, l * dim + j)]));
                }
            }
        }
    }
}
