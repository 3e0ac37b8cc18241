//! Swept-AABB broad phase producing primitive-pair candidates.
//!
//! Each primitive gets an axis-aligned box covering both endpoints of the
//! step (inflated by the caller's radius); overlapping boxes become
//! candidates for the narrow phase. Pairs sharing a vertex are never
//! emitted.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use na::{DMatrix, Vector3};

use crate::candidates::{Candidate, EdgeFaceCandidate};
use crate::mesh::CollisionMesh;
use crate::types::Float;
use crate::util::lift_vertex;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BroadPhaseMethod {
    BruteForce,
    HashGrid,
    SpatialHash,
    Bvh,
    SweepAndPrune,
    SweepAndTiniestQueueGpu,
}

#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vector3<Float>,
    pub max: Vector3<Float>,
}

impl Aabb {
    fn from_point(p: &Vector3<Float>) -> Self {
        Aabb { min: *p, max: *p }
    }

    fn include(&mut self, p: &Vector3<Float>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    fn inflate(&mut self, radius: Float) {
        let r = Vector3::repeat(radius);
        self.min -= r;
        self.max += r;
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    fn max_extent(&self) -> Float {
        (self.max - self.min).max()
    }
}

/// One box per vertex, covering its positions at both ends of the step.
fn vertex_aabbs(V0: &DMatrix<Float>, V1: &DMatrix<Float>, inflation_radius: Float) -> Vec<Aabb> {
    (0..V0.nrows())
        .map(|i| {
            let mut aabb = Aabb::from_point(&lift_vertex(V0, i));
            aabb.include(&lift_vertex(V1, i));
            aabb.inflate(inflation_radius);
            aabb
        })
        .collect()
}

fn edge_aabbs(edges: &[[usize; 2]], vertex_boxes: &[Aabb]) -> Vec<Aabb> {
    edges
        .iter()
        .map(|e| vertex_boxes[e[0]].merge(&vertex_boxes[e[1]]))
        .collect()
}

fn face_aabbs(faces: &[[usize; 3]], vertex_boxes: &[Aabb]) -> Vec<Aabb> {
    faces
        .iter()
        .map(|f| {
            vertex_boxes[f[0]]
                .merge(&vertex_boxes[f[1]])
                .merge(&vertex_boxes[f[2]])
        })
        .collect()
}

/// Uniform grid; each box is inserted into every cell it covers.
struct HashGrid {
    inv_cell_size: Float,
    cells: HashMap<(i64, i64, i64), Vec<usize>>,
}

impl HashGrid {
    fn build(aabbs: &[Aabb], cell_size: Float) -> Self {
        let mut grid = HashGrid {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
        };
        for (i, aabb) in aabbs.iter().enumerate() {
            grid.for_each_cell(aabb, |key, cells| cells.entry(key).or_default().push(i));
        }
        grid
    }

    fn for_each_cell(
        &mut self,
        aabb: &Aabb,
        mut f: impl FnMut((i64, i64, i64), &mut HashMap<(i64, i64, i64), Vec<usize>>),
    ) {
        let lo = aabb.min * self.inv_cell_size;
        let hi = aabb.max * self.inv_cell_size;
        for x in (lo.x.floor() as i64)..=(hi.x.floor() as i64) {
            for y in (lo.y.floor() as i64)..=(hi.y.floor() as i64) {
                for z in (lo.z.floor() as i64)..=(hi.z.floor() as i64) {
                    f((x, y, z), &mut self.cells);
                }
            }
        }
    }

    fn query(&self, aabb: &Aabb, result: &mut HashSet<usize>) {
        let lo = aabb.min * self.inv_cell_size;
        let hi = aabb.max * self.inv_cell_size;
        for x in (lo.x.floor() as i64)..=(hi.x.floor() as i64) {
            for y in (lo.y.floor() as i64)..=(hi.y.floor() as i64) {
                for z in (lo.z.floor() as i64)..=(hi.z.floor() as i64) {
                    if let Some(ids) = self.cells.get(&(x, y, z)) {
                        result.extend(ids.iter().copied());
                    }
                }
            }
        }
    }
}

fn mean_cell_size(aabbs: &[Aabb]) -> Float {
    if aabbs.is_empty() {
        return 1.0;
    }
    let mean: Float =
        aabbs.iter().map(Aabb::max_extent).sum::<Float>() / aabbs.len() as Float;
    if mean > 0.0 {
        mean
    } else {
        1.0
    }
}

/// Resolve methods without a dedicated implementation to the hash grid.
fn resolve_method(method: BroadPhaseMethod) -> BroadPhaseMethod {
    match method {
        BroadPhaseMethod::Bvh
        | BroadPhaseMethod::SweepAndPrune
        | BroadPhaseMethod::SweepAndTiniestQueueGpu => {
            tracing::warn!(
                "broad-phase method {:?} is not built in; falling back to the hash grid",
                method
            );
            BroadPhaseMethod::HashGrid
        }
        m => m,
    }
}

/// Overlapping pairs (i, j) with i < j within one box set.
fn same_set_pairs(aabbs: &[Aabb], method: BroadPhaseMethod) -> Vec<(usize, usize)> {
    match resolve_method(method) {
        BroadPhaseMethod::BruteForce => (0..aabbs.len())
            .tuple_combinations::<(_, _)>()
            .filter(|&(i, j)| aabbs[i].intersects(&aabbs[j]))
            .collect(),
        _ => {
            let grid = HashGrid::build(aabbs, mean_cell_size(aabbs));
            let mut pairs = vec![];
            let mut nearby = HashSet::new();
            for (i, aabb) in aabbs.iter().enumerate() {
                nearby.clear();
                grid.query(aabb, &mut nearby);
                for &j in &nearby {
                    if i < j && aabb.intersects(&aabbs[j]) {
                        pairs.push((i, j));
                    }
                }
            }
            pairs
        }
    }
}

/// Overlapping pairs (i, j) between two box sets.
fn cross_set_pairs(a: &[Aabb], b: &[Aabb], method: BroadPhaseMethod) -> Vec<(usize, usize)> {
    match resolve_method(method) {
        BroadPhaseMethod::BruteForce => (0..a.len())
            .cartesian_product(0..b.len())
            .filter(|&(i, j)| a[i].intersects(&b[j]))
            .collect(),
        _ => {
            let grid = HashGrid::build(b, mean_cell_size(b));
            let mut pairs = vec![];
            let mut nearby = HashSet::new();
            for (i, aabb) in a.iter().enumerate() {
                nearby.clear();
                grid.query(aabb, &mut nearby);
                for &j in &nearby {
                    if aabb.intersects(&b[j]) {
                        pairs.push((i, j));
                    }
                }
            }
            pairs
        }
    }
}

/// Candidates for the trajectory from V0 to V1: edge-vertex pairs in 2D,
/// edge-edge and face-vertex pairs in 3D. Pairs sharing a vertex are
/// skipped.
pub fn construct_collision_candidates(
    mesh: &CollisionMesh,
    V0: &DMatrix<Float>,
    V1: &DMatrix<Float>,
    inflation_radius: Float,
    method: BroadPhaseMethod,
) -> Vec<Candidate> {
    assert_eq!(V0.nrows(), mesh.num_vertices());
    assert_eq!(V1.nrows(), mesh.num_vertices());
    assert_eq!(V0.ncols(), V1.ncols());
    let dim = V0.ncols();
    assert!(dim == 2 || dim == 3);

    let vertex_boxes = vertex_aabbs(V0, V1, inflation_radius);
    let edge_boxes = edge_aabbs(&mesh.edges, &vertex_boxes);

    let mut candidates = vec![];
    if dim == 2 {
        for (e, v) in cross_set_pairs(&edge_boxes, &vertex_boxes, method) {
            if !mesh.edges[e].contains(&v) {
                candidates.push(Candidate::EdgeVertex { edge: e, vertex: v });
            }
        }
    } else {
        for (a, b) in same_set_pairs(&edge_boxes, method) {
            let share_vertex = mesh.edges[a]
                .iter()
                .any(|va| mesh.edges[b].contains(va));
            if !share_vertex {
                candidates.push(Candidate::EdgeEdge(a, b));
            }
        }

        let face_boxes = face_aabbs(&mesh.faces, &vertex_boxes);
        for (f, v) in cross_set_pairs(&face_boxes, &vertex_boxes, method) {
            if !mesh.faces[f].contains(&v) {
                candidates.push(Candidate::FaceVertex { face: f, vertex: v });
            }
        }
    }
    candidates
}

/// Overlapping edge pairs of a static configuration (for the 2D
/// intersection test).
pub fn detect_edge_edge_candidates(
    mesh: &CollisionMesh,
    V: &DMatrix<Float>,
    inflation_radius: Float,
    method: BroadPhaseMethod,
) -> Vec<(usize, usize)> {
    assert_eq!(V.nrows(), mesh.num_vertices());
    let vertex_boxes = vertex_aabbs(V, V, inflation_radius);
    let edge_boxes = edge_aabbs(&mesh.edges, &vertex_boxes);

    same_set_pairs(&edge_boxes, method)
        .into_iter()
        .filter(|&(a, b)| {
            !mesh.edges[a]
                .iter()
                .any(|va| mesh.edges[b].contains(va))
        })
        .collect()
}

/// Overlapping edge-face pairs of a static configuration (for the 3D
/// intersection test).
pub fn detect_edge_face_candidates(
    mesh: &CollisionMesh,
    V: &DMatrix<Float>,
    inflation_radius: Float,
    method: BroadPhaseMethod,
) -> Vec<EdgeFaceCandidate> {
    assert_eq!(V.nrows(), mesh.num_vertices());
    let vertex_boxes = vertex_aabbs(V, V, inflation_radius);
    let edge_boxes = edge_aabbs(&mesh.edges, &vertex_boxes);
    let face_boxes = face_aabbs(&mesh.faces, &vertex_boxes);

    cross_set_pairs(&edge_boxes, &face_boxes, method)
        .into_iter()
        .filter(|&(e, f)| {
            !mesh.edges[e]
                .iter()
                .any(|ve| mesh.faces[f].contains(ve))
        })
        .map(|(e, f)| EdgeFaceCandidate { edge: e, face: f })
        .collect()
}

#[cfg(test)]
mod broad_phase_tests {
    use na::dmatrix;

    use super::{construct_collision_candidates, BroadPhaseMethod};
    use crate::candidates::Candidate;
    use crate::mesh::CollisionMesh;

    /// Two triangles approaching each other head-on.
    fn two_triangle_setup() -> (CollisionMesh, na::DMatrix<f64>, na::DMatrix<f64>) {
        let mesh = CollisionMesh::new(
            6,
            vec![[0, 1], [1, 2], [2, 0], [3, 4], [4, 5], [5, 3]],
            vec![[0, 1, 2], [3, 4, 5]],
        );
        let V0 = dmatrix![
            0.0, 0.0, 0.0;
            1.0, 0.0, 0.0;
            0.0, 1.0, 0.0;
            0.1, 0.1, 1.0;
            1.1, 0.1, 1.0;
            0.1, 1.1, 1.0;
        ];
        let mut V1 = V0.clone();
        for i in 3..6 {
            V1[(i, 2)] = -1.0;
        }
        (mesh, V0, V1)
    }

    #[test]
    fn brute_force_and_hash_grid_agree() {
        let (mesh, V0, V1) = two_triangle_setup();

        let mut brute =
            construct_collision_candidates(&mesh, &V0, &V1, 0.0, BroadPhaseMethod::BruteForce);
        let mut grid =
            construct_collision_candidates(&mesh, &V0, &V1, 0.0, BroadPhaseMethod::HashGrid);

        let key = |c: &Candidate| format!("{:?}", c);
        brute.sort_by_key(key);
        grid.sort_by_key(key);
        assert_eq!(brute, grid);
        assert!(!brute.is_empty());
    }

    #[test]
    fn incident_pairs_are_skipped() {
        let (mesh, V0, V1) = two_triangle_setup();
        let candidates =
            construct_collision_candidates(&mesh, &V0, &V1, 0.0, BroadPhaseMethod::BruteForce);
        for c in &candidates {
            match *c {
                Candidate::EdgeEdge(a, b) => {
                    assert!(mesh.edges[a].iter().all(|v| !mesh.edges[b].contains(v)));
                }
                Candidate::FaceVertex { face, vertex } => {
                    assert!(!mesh.faces[face].contains(&vertex));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn edge_endpoints_are_not_candidates_of_their_edge() {
        let mesh = CollisionMesh::new(2, vec![[0, 1]], vec![]);
        let V = dmatrix![
            0.0, 0.0;
            1.0, 0.0;
        ];
        let candidates =
            construct_collision_candidates(&mesh, &V, &V, 0.0, BroadPhaseMethod::BruteForce);
        assert!(candidates.is_empty());
    }
}
