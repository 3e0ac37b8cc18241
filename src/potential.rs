//! Parallel assembly of the barrier potential and its derivatives over a
//! constraint set.
//!
//! Every reduction uses per-task accumulators merged serially at the end;
//! nothing is written to a shared container inside the parallel loop.

use na::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CscMatrix};
use rayon::prelude::*;

use crate::constraints::CollisionConstraint;
use crate::local_to_global::{
    local_gradient_to_global_gradient, local_gradient_to_global_triplets,
    local_hessian_to_global_triplets,
};
use crate::mesh::CollisionMesh;
use crate::types::Float;

/// Sum of the barrier potentials of all constraints. Quadrature weights
/// are premultiplied by each constraint.
pub fn compute_barrier_potential(
    mesh: &CollisionMesh,
    V: &DMatrix<Float>,
    constraint_set: &[CollisionConstraint],
    dhat: Float,
) -> Float {
    assert_eq!(V.nrows(), mesh.num_vertices());

    if constraint_set.is_empty() {
        return 0.0;
    }

    constraint_set
        .par_iter()
        .fold(
            || 0.0,
            |potential, constraint| {
                potential + constraint.compute_potential(V, &mesh.edges, &mesh.faces, dhat)
            },
        )
        .sum()
}

/// Gradient of the barrier potential; a dense vector of length n·d.
pub fn compute_barrier_potential_gradient(
    mesh: &CollisionMesh,
    V: &DMatrix<Float>,
    constraint_set: &[CollisionConstraint],
    dhat: Float,
) -> DVector<Float> {
    assert_eq!(V.nrows(), mesh.num_vertices());

    let dim = V.ncols();
    let ndof = V.nrows() * dim;
    if constraint_set.is_empty() {
        return DVector::zeros(ndof);
    }

    constraint_set
        .par_iter()
        .fold(
            || DVector::zeros(ndof),
            |mut local_grad, constraint| {
                local_gradient_to_global_gradient(
                    &constraint.compute_potential_gradient(V, &mesh.edges, &mesh.faces, dhat),
                    &constraint.vertex_indices(&mesh.edges, &mesh.faces),
                    dim,
                    &mut local_grad,
                );
                local_grad
            },
        )
        .reduce(|| DVector::zeros(ndof), |a, b| a + b)
}

fn assemble(ndof: usize, triplets: Vec<(usize, usize, Float)>) -> CscMatrix<Float> {
    let mut coo = CooMatrix::new(ndof, ndof);
    for (row, col, value) in triplets {
        coo.push(row, col, value);
    }
    CscMatrix::from(&coo)
}

fn hessian_triplets(
    mesh: &CollisionMesh,
    V: &DMatrix<Float>,
    constraint_set: &[CollisionConstraint],
    dhat: Float,
    project_hessian_to_psd: bool,
) -> Vec<(usize, usize, Float)> {
    let dim = V.ncols();
    constraint_set
        .par_iter()
        .fold(Vec::new, |mut local_triplets, constraint| {
            local_hessian_to_global_triplets(
                &constraint.compute_potential_hessian(
                    V,
                    &mesh.edges,
                    &mesh.faces,
                    dhat,
                    project_hessian_to_psd,
                ),
                &constraint.vertex_indices(&mesh.edges, &mesh.faces),
                dim,
                &mut local_triplets,
            );
            local_triplets
        })
        .reduce(Vec::new, |mut a, mut b| {
            a.append(&mut b);
            a
        })
}

/// Hessian of the barrier potential as a sparse n·d × n·d matrix,
/// assembled once from per-task triplet buffers.
pub fn compute_barrier_potential_hessian(
    mesh: &CollisionMesh,
    V: &DMatrix<Float>,
    constraint_set: &[CollisionConstraint],
    dhat: Float,
    project_hessian_to_psd: bool,
) -> CscMatrix<Float> {
    assert_eq!(V.nrows(), mesh.num_vertices());

    let ndof = V.nrows() * V.ncols();
    if constraint_set.is_empty() {
        return CscMatrix::from(&CooMatrix::<Float>::new(ndof, ndof));
    }

    assemble(
        ndof,
        hessian_triplets(mesh, V, constraint_set, dhat, project_hessian_to_psd),
    )
}

/// Shape derivative of the barrier: the unprojected Hessian plus the
/// rank updates (Sᵀ∇φᵢ / wᵢ)(∂wᵢ/∂V)ᵀ of each constraint.
pub fn compute_barrier_shape_derivative(
    mesh: &CollisionMesh,
    V: &DMatrix<Float>,
    constraint_set: &[CollisionConstraint],
    dhat: Float,
) -> CscMatrix<Float> {
    assert_eq!(V.nrows(), mesh.num_vertices());

    let dim = V.ncols();
    let ndof = V.nrows() * dim;
    if constraint_set.is_empty() {
        return CscMatrix::from(&CooMatrix::<Float>::new(ndof, ndof));
    }

    let mut triplets = hessian_triplets(mesh, V, constraint_set, dhat, false);

    for constraint in constraint_set {
        let weight = constraint.weight();
        assert!(weight != 0.0, "constraint weight must be non-zero");

        let local_grad =
            constraint.compute_potential_gradient(V, &mesh.edges, &mesh.faces, dhat) / weight;
        let barrier_grad = local_gradient_to_global_triplets(
            &local_grad,
            &constraint.vertex_indices(&mesh.edges, &mesh.faces),
            dim,
        );

        for &(row, g) in &barrier_grad {
            for &(col, dw) in constraint.weight_gradient() {
                debug_assert!(col < ndof);
                triplets.push((row, col, g * dw));
            }
        }
    }

    assemble(ndof, triplets)
}

/// Minimum over the constraint set of the pairwise distance at V, or +∞
/// for an empty set. The returned scalar is the *squared* distance.
pub fn compute_minimum_distance(
    mesh: &CollisionMesh,
    V: &DMatrix<Float>,
    constraint_set: &[CollisionConstraint],
) -> Float {
    assert_eq!(V.nrows(), mesh.num_vertices());

    if constraint_set.is_empty() {
        return Float::INFINITY;
    }

    constraint_set
        .par_iter()
        .fold(
            || Float::INFINITY,
            |min_dist, constraint| {
                min_dist.min(constraint.compute_distance(V, &mesh.edges, &mesh.faces))
            },
        )
        .reduce(|| Float::INFINITY, Float::min)
}
