//! Surface-mesh topology consumed by the collision routines.

/// Topology of a collision surface: edge and face tables over vertex rows.
///
/// Positions are not stored here; every query takes a position matrix V
/// (one row per vertex, 2 or 3 columns) alongside the mesh, so the same
/// topology serves both endpoints of a time step.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CollisionMesh {
    num_vertices: usize,
    pub edges: Vec<[usize; 2]>,
    pub faces: Vec<[usize; 3]>,
}

impl CollisionMesh {
    pub fn new(num_vertices: usize, edges: Vec<[usize; 2]>, faces: Vec<[usize; 3]>) -> Self {
        for e in &edges {
            assert!(e[0] < num_vertices && e[1] < num_vertices);
            assert!(e[0] != e[1], "degenerate edge ({}, {})", e[0], e[1]);
        }
        for f in &faces {
            assert!(f.iter().all(|&i| i < num_vertices));
            assert!(
                f[0] != f[1] && f[1] != f[2] && f[0] != f[2],
                "degenerate face ({}, {}, {})",
                f[0],
                f[1],
                f[2]
            );
        }
        CollisionMesh {
            num_vertices,
            edges,
            faces,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }
}
