use na::{vector, DMatrix, Vector3};

use crate::types::Float;

/// Row i of the position matrix V, lifted to 3D (z = 0 when V has two columns)
pub fn lift_vertex(V: &DMatrix<Float>, i: usize) -> Vector3<Float> {
    let z = if V.ncols() == 3 { V[(i, 2)] } else { 0.0 };
    vector![V[(i, 0)], V[(i, 1)], z]
}

/// Length of the diagonal of the axis-aligned bounding box of the vertices
pub fn world_bbox_diagonal_length(V: &DMatrix<Float>) -> Float {
    if V.nrows() == 0 {
        return 0.0;
    }
    let mut diag_sq = 0.0;
    for j in 0..V.ncols() {
        let col = V.column(j);
        let min = col.min();
        let max = col.max();
        diag_sq += (max - min) * (max - min);
    }
    diag_sq.sqrt()
}

/// Project a symmetric matrix to the positive-semidefinite cone by clamping
/// its negative eigenvalues to zero
pub fn project_to_psd(m: &DMatrix<Float>) -> DMatrix<Float> {
    let mut eigen = m.clone().symmetric_eigen();
    if eigen.eigenvalues.iter().all(|&l| l >= 0.0) {
        return m.clone();
    }
    for l in eigen.eigenvalues.iter_mut() {
        if *l < 0.0 {
            *l = 0.0;
        }
    }
    eigen.recompose()
}

#[macro_export]
macro_rules! assert_close {
    ($a:expr, $b:expr, $tol:expr) => {{
        let (a, b) = ($a, $b);
        assert!((a - b).abs() < $tol, "{} != {}", a, b);
    }};
}

#[macro_export]
macro_rules! assert_vec_close {
    ($a:expr, $b:expr, $tol:expr) => {{
        let (a, b) = (&$a, &$b);
        for (a, b) in a.iter().zip(b.iter()) {
            assert!((a - b).abs() < $tol, "{} != {}", a, b);
        }
    }};
}

#[cfg(test)]
mod util_tests {
    use na::{dmatrix, DMatrix};

    use super::{project_to_psd, world_bbox_diagonal_length};
    use crate::assert_close;

    #[test]
    fn bbox_diagonal() {
        let V = dmatrix![
            0.0, 0.0, 0.0;
            1.0, 2.0, 2.0;
        ];
        assert_close!(world_bbox_diagonal_length(&V), 3.0, 1e-12);
    }

    #[test]
    fn psd_projection_clamps_negative_eigenvalues() {
        let m = dmatrix![
            1.0, 2.0;
            2.0, 1.0; // eigenvalues 3 and -1
        ];
        let p = project_to_psd(&m);
        let eigen = p.symmetric_eigen();
        assert!(eigen.eigenvalues.iter().all(|&l| l >= -1e-12));

        // already-PSD input is returned unchanged
        let id = DMatrix::<f64>::identity(3, 3);
        assert_eq!(project_to_psd(&id), id);
    }
}
