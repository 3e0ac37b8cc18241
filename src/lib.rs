#![allow(non_snake_case)]

pub extern crate nalgebra as na;

pub mod barrier;
pub mod broad_phase;
pub mod candidates;
pub mod ccd;
pub mod constraints;
pub mod distance;
pub mod intersection;
pub mod local_to_global;
pub mod mesh;
pub mod potential;
pub mod stepsize;
pub mod types;
pub mod util;

pub use broad_phase::{
    construct_collision_candidates, detect_edge_edge_candidates, detect_edge_face_candidates,
    BroadPhaseMethod,
};
pub use candidates::{Candidate, EdgeFaceCandidate};
pub use ccd::{
    edge_edge_ccd, point_edge_ccd, point_point_ccd, point_triangle_ccd,
    DEFAULT_CCD_MAX_ITERATIONS, DEFAULT_CCD_TOLERANCE, DEFAULT_CONSERVATIVE_RESCALING,
};
pub use constraints::{
    CollisionConstraint, EdgeEdgeConstraint, EdgeVertexConstraint, FaceVertexConstraint,
    VertexVertexConstraint,
};
pub use intersection::has_intersections;
pub use mesh::CollisionMesh;
pub use potential::{
    compute_barrier_potential, compute_barrier_potential_gradient,
    compute_barrier_potential_hessian, compute_barrier_shape_derivative,
    compute_minimum_distance,
};
pub use stepsize::{
    compute_collision_free_stepsize, compute_collision_free_stepsize_with_candidates,
    is_step_collision_free, is_step_collision_free_with_candidates,
};
