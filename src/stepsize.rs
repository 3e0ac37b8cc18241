//! Collision-free step-size search: the earliest time of impact over all
//! broad-phase candidates.

use std::sync::Mutex;

use na::DMatrix;
use rayon::prelude::*;

use crate::broad_phase::{construct_collision_candidates, BroadPhaseMethod};
use crate::candidates::Candidate;
use crate::mesh::CollisionMesh;
use crate::types::Float;

/// Whether the whole step from V0 to V1 keeps every candidate pair
/// separated.
pub fn is_step_collision_free(
    mesh: &CollisionMesh,
    V0: &DMatrix<Float>,
    V1: &DMatrix<Float>,
    method: BroadPhaseMethod,
    tolerance: Float,
    max_iterations: usize,
) -> bool {
    assert_eq!(V0.nrows(), mesh.num_vertices());
    assert_eq!(V1.nrows(), mesh.num_vertices());

    let candidates = construct_collision_candidates(mesh, V0, V1, 0.0, method);
    is_step_collision_free_with_candidates(&candidates, mesh, V0, V1, tolerance, max_iterations)
}

/// Narrow phase of `is_step_collision_free` over an existing candidate
/// list; stops at the first impact.
pub fn is_step_collision_free_with_candidates(
    candidates: &[Candidate],
    mesh: &CollisionMesh,
    V0: &DMatrix<Float>,
    V1: &DMatrix<Float>,
    tolerance: Float,
    max_iterations: usize,
) -> bool {
    assert_eq!(V0.nrows(), mesh.num_vertices());
    assert_eq!(V1.nrows(), mesh.num_vertices());

    candidates.iter().all(|candidate| {
        candidate
            .ccd(
                V0,
                V1,
                &mesh.edges,
                &mesh.faces,
                1.0,
                tolerance,
                max_iterations,
            )
            .is_none()
    })
}

/// Largest fraction α ∈ [0, 1] of the step from V0 to V1 that keeps every
/// candidate pair separated.
pub fn compute_collision_free_stepsize(
    mesh: &CollisionMesh,
    V0: &DMatrix<Float>,
    V1: &DMatrix<Float>,
    method: BroadPhaseMethod,
    tolerance: Float,
    max_iterations: usize,
) -> Float {
    assert_eq!(V0.nrows(), mesh.num_vertices());
    assert_eq!(V1.nrows(), mesh.num_vertices());

    let candidates = construct_collision_candidates(mesh, V0, V1, 0.0, method);
    compute_collision_free_stepsize_with_candidates(
        &candidates,
        mesh,
        V0,
        V1,
        tolerance,
        max_iterations,
    )
}

/// Parallel earliest-TOI reduction over an existing candidate list.
///
/// The running minimum is shared under a mutex and read as `tmax` before
/// each kernel call, so candidates examined later are pruned by the
/// earliest impact found so far. A stale read only costs work; the result
/// does not depend on scan order.
pub fn compute_collision_free_stepsize_with_candidates(
    candidates: &[Candidate],
    mesh: &CollisionMesh,
    V0: &DMatrix<Float>,
    V1: &DMatrix<Float>,
    tolerance: Float,
    max_iterations: usize,
) -> Float {
    assert_eq!(V0.nrows(), mesh.num_vertices());
    assert_eq!(V1.nrows(), mesh.num_vertices());

    if candidates.is_empty() {
        return 1.0; // no possible collisions, so the full step is safe
    }

    let earliest_toi = Mutex::new(1.0);

    candidates.par_iter().for_each(|candidate| {
        let tmax = *earliest_toi.lock().unwrap();
        if let Some(toi) = candidate.ccd(
            V0,
            V1,
            &mesh.edges,
            &mesh.faces,
            tmax,
            tolerance,
            max_iterations,
        ) {
            let mut earliest_toi = earliest_toi.lock().unwrap();
            if toi < *earliest_toi {
                *earliest_toi = toi;
            }
        }
    });

    let earliest_toi = earliest_toi.into_inner().unwrap();
    assert!((0.0..=1.0).contains(&earliest_toi));
    earliest_toi
}
