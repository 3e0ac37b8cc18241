//! Continuous collision detection with the conservative-rescaling strategy
//! used by Incremental Potential Contact.

use na::{vector, SVector, Vector3};

use crate::distance::{
    edge_edge_distance, point_edge_distance, point_point_distance, point_triangle_distance,
};
use crate::types::Float;

pub mod tight_inclusion;

use tight_inclusion::{edge_edge_inclusion_ccd, vertex_face_inclusion_ccd};

pub const DEFAULT_CCD_TOLERANCE: Float = 1e-6;
pub const DEFAULT_CCD_MAX_ITERATIONS: usize = 1_000_000;
pub const DEFAULT_CONSERVATIVE_RESCALING: Float = 0.8;

/// Impacts earlier than this trigger the zero-TOI retry.
const SMALL_TOI: Float = 1e-6;

/// Wraps a kernel call with the two guarantees the barrier requires:
/// the reported TOI keeps a fraction `conservative_rescaling` of the
/// initial gap, and a near-zero TOI is retried from zero separation so the
/// step never stalls inside the inflation band.
pub fn ccd_strategy<F>(
    ccd: F,
    initial_distance: Float,
    conservative_rescaling: Float,
) -> Option<Float>
where
    F: Fn(Float, bool) -> Option<Float>,
{
    assert!(conservative_rescaling > 0.0 && conservative_rescaling <= 1.0);

    if initial_distance == 0.0 {
        tracing::warn!("Initial distance is 0, returning toi=0!");
        return Some(0.0);
    }

    let min_distance = (1.0 - conservative_rescaling) * initial_distance;
    assert!(min_distance < initial_distance);

    match ccd(min_distance, false) {
        Some(toi) if toi < SMALL_TOI => ccd(0.0, true).map(|toi| {
            // reintroduce the conservative margin dropped by the retry
            let toi = toi * conservative_rescaling;
            debug_assert!(toi != 0.0);
            toi
        }),
        result => result,
    }
}

fn to_3d<const D: usize>(v: &SVector<Float, D>) -> Vector3<Float> {
    assert!(D == 2 || D == 3);
    let z = if D == 3 { v[2] } else { 0.0 };
    vector![v[0], v[1], z]
}

/// Time of impact between two moving points, or None when the step keeps
/// them separated.
#[allow(clippy::too_many_arguments)]
pub fn point_point_ccd(
    p0_t0: &Vector3<Float>,
    p1_t0: &Vector3<Float>,
    p0_t1: &Vector3<Float>,
    p1_t1: &Vector3<Float>,
    tmax: Float,
    tolerance: Float,
    max_iterations: usize,
    conservative_rescaling: Float,
) -> Option<Float> {
    assert!((0.0..=1.0).contains(&tmax));

    let ccd = |min_distance: Float, no_zero_toi: bool| {
        // degenerate edge-edge with both endpoints collapsed
        edge_edge_inclusion_ccd(
            p0_t0,
            p0_t0,
            p1_t0,
            p1_t0,
            p0_t1,
            p0_t1,
            p1_t1,
            p1_t1,
            min_distance,
            tolerance,
            tmax,
            max_iterations,
            no_zero_toi,
        )
    };

    let initial_distance = point_point_distance(p0_t0, p1_t0).sqrt();
    ccd_strategy(ccd, initial_distance, conservative_rescaling)
}

/// Time of impact between a moving point and a moving edge. Accepts 2D or
/// 3D endpoints; 2D inputs are lifted to z = 0 and dispatched to the
/// degenerate edge-edge kernel.
#[allow(clippy::too_many_arguments)]
pub fn point_edge_ccd<const D: usize>(
    p_t0: &SVector<Float, D>,
    e0_t0: &SVector<Float, D>,
    e1_t0: &SVector<Float, D>,
    p_t1: &SVector<Float, D>,
    e0_t1: &SVector<Float, D>,
    e1_t1: &SVector<Float, D>,
    tmax: Float,
    tolerance: Float,
    max_iterations: usize,
    conservative_rescaling: Float,
) -> Option<Float> {
    assert!((0.0..=1.0).contains(&tmax));

    let p_t0 = to_3d(p_t0);
    let e0_t0 = to_3d(e0_t0);
    let e1_t0 = to_3d(e1_t0);
    let p_t1 = to_3d(p_t1);
    let e0_t1 = to_3d(e0_t1);
    let e1_t1 = to_3d(e1_t1);

    let ccd = |min_distance: Float, no_zero_toi: bool| {
        edge_edge_inclusion_ccd(
            &p_t0,
            &p_t0,
            &e0_t0,
            &e1_t0,
            &p_t1,
            &p_t1,
            &e0_t1,
            &e1_t1,
            min_distance,
            tolerance,
            tmax,
            max_iterations,
            no_zero_toi,
        )
    };

    let initial_distance = point_edge_distance(&p_t0, &e0_t0, &e1_t0).sqrt();
    ccd_strategy(ccd, initial_distance, conservative_rescaling)
}

/// Time of impact between two moving edges.
#[allow(clippy::too_many_arguments)]
pub fn edge_edge_ccd(
    ea0_t0: &Vector3<Float>,
    ea1_t0: &Vector3<Float>,
    eb0_t0: &Vector3<Float>,
    eb1_t0: &Vector3<Float>,
    ea0_t1: &Vector3<Float>,
    ea1_t1: &Vector3<Float>,
    eb0_t1: &Vector3<Float>,
    eb1_t1: &Vector3<Float>,
    tmax: Float,
    tolerance: Float,
    max_iterations: usize,
    conservative_rescaling: Float,
) -> Option<Float> {
    assert!((0.0..=1.0).contains(&tmax));

    let ccd = |min_distance: Float, no_zero_toi: bool| {
        edge_edge_inclusion_ccd(
            ea0_t0,
            ea1_t0,
            eb0_t0,
            eb1_t0,
            ea0_t1,
            ea1_t1,
            eb0_t1,
            eb1_t1,
            min_distance,
            tolerance,
            tmax,
            max_iterations,
            no_zero_toi,
        )
    };

    let initial_distance = edge_edge_distance(ea0_t0, ea1_t0, eb0_t0, eb1_t0).sqrt();
    ccd_strategy(ccd, initial_distance, conservative_rescaling)
}

/// Time of impact between a moving point and a moving triangle.
#[allow(clippy::too_many_arguments)]
pub fn point_triangle_ccd(
    p_t0: &Vector3<Float>,
    t0_t0: &Vector3<Float>,
    t1_t0: &Vector3<Float>,
    t2_t0: &Vector3<Float>,
    p_t1: &Vector3<Float>,
    t0_t1: &Vector3<Float>,
    t1_t1: &Vector3<Float>,
    t2_t1: &Vector3<Float>,
    tmax: Float,
    tolerance: Float,
    max_iterations: usize,
    conservative_rescaling: Float,
) -> Option<Float> {
    assert!((0.0..=1.0).contains(&tmax));

    let ccd = |min_distance: Float, no_zero_toi: bool| {
        vertex_face_inclusion_ccd(
            p_t0,
            t0_t0,
            t1_t0,
            t2_t0,
            p_t1,
            t0_t1,
            t1_t1,
            t2_t1,
            min_distance,
            tolerance,
            tmax,
            max_iterations,
            no_zero_toi,
        )
    };

    let initial_distance = point_triangle_distance(p_t0, t0_t0, t1_t0, t2_t0).sqrt();
    ccd_strategy(ccd, initial_distance, conservative_rescaling)
}

#[cfg(test)]
mod ccd_tests {
    use na::vector;

    use super::{
        ccd_strategy, edge_edge_ccd, point_edge_ccd, point_point_ccd, point_triangle_ccd,
        DEFAULT_CCD_MAX_ITERATIONS, DEFAULT_CCD_TOLERANCE, DEFAULT_CONSERVATIVE_RESCALING,
    };
    use crate::assert_close;

    #[test]
    fn vertex_vertex_head_on() {
        let p0_t0 = vector![0.0, 0.0, 0.0];
        let p1_t0 = vector![1.0, 0.0, 0.0];
        let p0_t1 = vector![1.0, 0.0, 0.0];
        let p1_t1 = vector![0.0, 0.0, 0.0];

        let toi = point_point_ccd(
            &p0_t0,
            &p1_t0,
            &p0_t1,
            &p1_t1,
            1.0,
            DEFAULT_CCD_TOLERANCE,
            DEFAULT_CCD_MAX_ITERATIONS,
            DEFAULT_CONSERVATIVE_RESCALING,
        )
        .unwrap();
        // separation reaches (1 - r) d0 = 0.2 at t = 0.4
        assert_close!(toi, 0.4, 1e-3);
    }

    #[test]
    fn vertex_vertex_grazing() {
        let p0 = vector![0.0, 0.0, 0.0];
        let p1_t0 = vector![1.0, 1.0, 0.0];
        let p1_t1 = vector![1.0, -1.0, 0.0];

        let result = point_point_ccd(
            &p0,
            &p1_t0,
            &p0,
            &p1_t1,
            1.0,
            DEFAULT_CCD_TOLERANCE,
            DEFAULT_CCD_MAX_ITERATIONS,
            DEFAULT_CONSERVATIVE_RESCALING,
        );
        assert_eq!(result, None);
    }

    #[test]
    fn point_triangle_perpendicular_fall() {
        let t0 = vector![0.0, 0.0, 0.0];
        let t1 = vector![1.0, 0.0, 0.0];
        let t2 = vector![0.0, 1.0, 0.0];
        let p_t0 = vector![0.2, 0.2, 1.0];
        let p_t1 = vector![0.2, 0.2, -1.0];

        let toi = point_triangle_ccd(
            &p_t0,
            &t0,
            &t1,
            &t2,
            &p_t1,
            &t0,
            &t1,
            &t2,
            1.0,
            DEFAULT_CCD_TOLERANCE,
            DEFAULT_CCD_MAX_ITERATIONS,
            DEFAULT_CONSERVATIVE_RESCALING,
        )
        .unwrap();
        assert_close!(toi, 0.4, 1e-3);
    }

    #[test]
    fn edge_edge_crossing() {
        let ea0 = vector![-1.0, 0.0, 0.0];
        let ea1 = vector![1.0, 0.0, 0.0];
        let eb0_t0 = vector![0.0, -1.0, 0.5];
        let eb1_t0 = vector![0.0, 1.0, 0.5];
        let eb0_t1 = vector![0.0, -1.0, -0.5];
        let eb1_t1 = vector![0.0, 1.0, -0.5];

        let toi = edge_edge_ccd(
            &ea0,
            &ea1,
            &eb0_t0,
            &eb1_t0,
            &ea0,
            &ea1,
            &eb0_t1,
            &eb1_t1,
            1.0,
            DEFAULT_CCD_TOLERANCE,
            DEFAULT_CCD_MAX_ITERATIONS,
            DEFAULT_CONSERVATIVE_RESCALING,
        )
        .unwrap();
        assert_close!(toi, 0.4, 1e-3);
    }

    #[test]
    fn point_edge_2d() {
        let p_t0 = vector![0.5, 1.0];
        let p_t1 = vector![0.5, -1.0];
        let e0 = vector![0.0, 0.0];
        let e1 = vector![1.0, 0.0];

        let toi = point_edge_ccd(
            &p_t0,
            &e0,
            &e1,
            &p_t1,
            &e0,
            &e1,
            1.0,
            DEFAULT_CCD_TOLERANCE,
            DEFAULT_CCD_MAX_ITERATIONS,
            DEFAULT_CONSERVATIVE_RESCALING,
        )
        .unwrap();
        assert_close!(toi, 0.4, 1e-3);
    }

    #[test]
    fn zero_initial_distance_is_degenerate() {
        let p = vector![0.0, 0.0, 0.0];
        let q = vector![1.0, 0.0, 0.0];
        let toi = point_point_ccd(
            &p,
            &p,
            &q,
            &q,
            1.0,
            DEFAULT_CCD_TOLERANCE,
            DEFAULT_CCD_MAX_ITERATIONS,
            DEFAULT_CONSERVATIVE_RESCALING,
        );
        assert_eq!(toi, Some(0.0));
    }

    #[test]
    fn impact_after_tmax_is_ignored() {
        let p0_t0 = vector![0.0, 0.0, 0.0];
        let p1_t0 = vector![1.0, 0.0, 0.0];
        let p0_t1 = vector![1.0, 0.0, 0.0];
        let p1_t1 = vector![0.0, 0.0, 0.0];

        let result = point_point_ccd(
            &p0_t0,
            &p1_t0,
            &p0_t1,
            &p1_t1,
            0.25,
            DEFAULT_CCD_TOLERANCE,
            DEFAULT_CCD_MAX_ITERATIONS,
            DEFAULT_CONSERVATIVE_RESCALING,
        );
        assert_eq!(result, None);
    }

    #[test]
    fn strategy_retries_small_toi() {
        // first call reports a tiny TOI; the retry result is rescaled
        let calls = std::cell::Cell::new(0);
        let toi = ccd_strategy(
            |min_distance, no_zero_toi| {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    assert!(min_distance > 0.0);
                    assert!(!no_zero_toi);
                    Some(1e-9)
                } else {
                    assert_eq!(min_distance, 0.0);
                    assert!(no_zero_toi);
                    Some(0.5)
                }
            },
            1.0,
            0.8,
        )
        .unwrap();
        assert_eq!(calls.get(), 2);
        assert_close!(toi, 0.4, 1e-12);
    }

    #[test]
    fn strategy_returns_retry_outcome() {
        // a retry that reports no impact clears the original impact flag
        let calls = std::cell::Cell::new(0);
        let result = ccd_strategy(
            |_, _| {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    Some(1e-9)
                } else {
                    None
                }
            },
            1.0,
            0.8,
        );
        assert_eq!(calls.get(), 2);
        assert_eq!(result, None);
    }
}
