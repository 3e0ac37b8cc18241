//! Conservative interval kernel for continuous collision detection
//! ref: A Large Scale Benchmark and an Inclusion-Based Algorithm for
//! Continuous Collision Detection, Wang et al., 2021

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use na::Vector3;
use ordered_float::OrderedFloat;

use crate::types::Float;

/// Inflation applied to the corner-evaluated gap range; must cover the
/// rounding error of the lerp chains in the gap function.
const CORNER_ERROR_SCALE: Float = 16.0;

#[derive(Clone, Copy, Debug)]
struct Domain {
    t: (Float, Float),
    u: (Float, Float),
    v: (Float, Float),
}

impl Domain {
    fn width(&self, dim: usize) -> Float {
        let (lo, hi) = match dim {
            0 => self.t,
            1 => self.u,
            _ => self.v,
        };
        hi - lo
    }

    fn split(&self, dim: usize) -> (Domain, Domain) {
        let mut lower = *self;
        let mut upper = *self;
        match dim {
            0 => {
                let mid = 0.5 * (self.t.0 + self.t.1);
                lower.t.1 = mid;
                upper.t.0 = mid;
            }
            1 => {
                let mid = 0.5 * (self.u.0 + self.u.1);
                lower.u.1 = mid;
                upper.u.0 = mid;
            }
            _ => {
                let mid = 0.5 * (self.v.0 + self.v.1);
                lower.v.1 = mid;
                upper.v.0 = mid;
            }
        }
        (lower, upper)
    }
}

struct QueueEntry {
    key: (OrderedFloat<Float>, u64),
    domain: Domain,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for QueueEntry {}
impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Earliest time at which the gap function may enter the box
/// [-min_distance, min_distance]³ on t ∈ [0, tmax], or None.
///
/// The gap is multilinear in (t, u, v), so its exact range over an
/// axis-aligned domain is spanned by the eight corner values; the range is
/// inflated by a conservative rounding bound before the inclusion test.
/// Domains are processed in increasing-t order, so the first domain that
/// can neither be excluded nor refined below `tolerance` yields a lower
/// bound that is at most the true time of impact.
///
/// With `no_zero_toi` the search never reports 0: domains touching t = 0
/// are refined until a positive lower bound emerges or they are exhausted.
fn inclusion_root_finder<F>(
    gap: F,
    simplex_domain: bool,
    min_distance: Float,
    tolerance: Float,
    tmax: Float,
    max_iterations: usize,
    no_zero_toi: bool,
) -> Option<Float>
where
    F: Fn(Float, Float, Float) -> Vector3<Float>,
{
    let mut queue: BinaryHeap<Reverse<QueueEntry>> = BinaryHeap::new();
    let mut order = 0u64;
    queue.push(Reverse(QueueEntry {
        key: (OrderedFloat(0.0), order),
        domain: Domain {
            t: (0.0, tmax),
            u: (0.0, 1.0),
            v: (0.0, 1.0),
        },
    }));

    let mut iterations = 0;
    while let Some(Reverse(entry)) = queue.pop() {
        iterations += 1;
        let d = entry.domain;

        let corners = [
            gap(d.t.0, d.u.0, d.v.0),
            gap(d.t.0, d.u.0, d.v.1),
            gap(d.t.0, d.u.1, d.v.0),
            gap(d.t.0, d.u.1, d.v.1),
            gap(d.t.1, d.u.0, d.v.0),
            gap(d.t.1, d.u.0, d.v.1),
            gap(d.t.1, d.u.1, d.v.0),
            gap(d.t.1, d.u.1, d.v.1),
        ];

        let mut outside = false;
        let mut width: Float = 0.0;
        for i in 0..3 {
            let mut lo = Float::INFINITY;
            let mut hi = Float::NEG_INFINITY;
            let mut max_abs: Float = 0.0;
            for corner in &corners {
                lo = lo.min(corner[i]);
                hi = hi.max(corner[i]);
                max_abs = max_abs.max(corner[i].abs());
            }
            let err = CORNER_ERROR_SCALE * Float::EPSILON * max_abs;
            if lo - err > min_distance || hi + err < -min_distance {
                outside = true;
                break;
            }
            width = width.max(hi - lo + 2.0 * err);
        }
        if outside {
            continue;
        }

        if iterations >= max_iterations {
            tracing::warn!(
                "CCD did not converge in {} iterations (gap width {:e}); returning the current conservative bound",
                max_iterations,
                width
            );
            if d.t.0 == 0.0 && no_zero_toi {
                return None;
            }
            return Some(d.t.0);
        }

        if width <= tolerance && (d.t.0 > 0.0 || !no_zero_toi) {
            return Some(d.t.0);
        }

        // Refine along the dimension with the largest induced gap variation;
        // pairs of corner indices differing only in that dimension.
        const PAIRS: [[(usize, usize); 4]; 3] = [
            [(0, 4), (1, 5), (2, 6), (3, 7)], // t
            [(0, 2), (1, 3), (4, 6), (5, 7)], // u
            [(0, 1), (2, 3), (4, 5), (6, 7)], // v
        ];
        let mut split_dim = None;
        let mut best_variation = -1.0;
        for dim in 0..3 {
            if d.width(dim) <= Float::EPSILON {
                continue;
            }
            let mut variation: Float = 0.0;
            for &(a, b) in &PAIRS[dim] {
                variation = variation.max((corners[a] - corners[b]).amax());
            }
            if variation > best_variation {
                best_variation = variation;
                split_dim = Some(dim);
            }
        }
        let Some(split_dim) = split_dim else {
            // domain at floating-point granularity; nothing left to refine
            continue;
        };

        let (lower, upper) = d.split(split_dim);
        for child in [lower, upper] {
            if simplex_domain && child.u.0 + child.v.0 > 1.0 {
                continue;
            }
            order += 1;
            queue.push(Reverse(QueueEntry {
                key: (OrderedFloat(child.t.0), order),
                domain: child,
            }));
        }
    }

    None
}

/// Conservative time of impact between two moving edges (ea0, ea1) and
/// (eb0, eb1), each linearly interpolated from t=0 to t=1.
#[allow(clippy::too_many_arguments)]
pub fn edge_edge_inclusion_ccd(
    ea0_t0: &Vector3<Float>,
    ea1_t0: &Vector3<Float>,
    eb0_t0: &Vector3<Float>,
    eb1_t0: &Vector3<Float>,
    ea0_t1: &Vector3<Float>,
    ea1_t1: &Vector3<Float>,
    eb0_t1: &Vector3<Float>,
    eb1_t1: &Vector3<Float>,
    min_distance: Float,
    tolerance: Float,
    tmax: Float,
    max_iterations: usize,
    no_zero_toi: bool,
) -> Option<Float> {
    let (ea0_t0, ea1_t0, eb0_t0, eb1_t0) = (*ea0_t0, *ea1_t0, *eb0_t0, *eb1_t0);
    let (ea0_t1, ea1_t1, eb0_t1, eb1_t1) = (*ea0_t1, *ea1_t1, *eb0_t1, *eb1_t1);
    let gap = move |t: Float, u: Float, v: Float| {
        let pa = ea0_t0.lerp(&ea0_t1, t).lerp(&ea1_t0.lerp(&ea1_t1, t), u);
        let pb = eb0_t0.lerp(&eb0_t1, t).lerp(&eb1_t0.lerp(&eb1_t1, t), v);
        pa - pb
    };
    inclusion_root_finder(
        gap,
        false,
        min_distance,
        tolerance,
        tmax,
        max_iterations,
        no_zero_toi,
    )
}

/// Conservative time of impact between a moving point and a moving triangle.
#[allow(clippy::too_many_arguments)]
pub fn vertex_face_inclusion_ccd(
    p_t0: &Vector3<Float>,
    t0_t0: &Vector3<Float>,
    t1_t0: &Vector3<Float>,
    t2_t0: &Vector3<Float>,
    p_t1: &Vector3<Float>,
    t0_t1: &Vector3<Float>,
    t1_t1: &Vector3<Float>,
    t2_t1: &Vector3<Float>,
    min_distance: Float,
    tolerance: Float,
    tmax: Float,
    max_iterations: usize,
    no_zero_toi: bool,
) -> Option<Float> {
    let (p_t0, t0_t0, t1_t0, t2_t0) = (*p_t0, *t0_t0, *t1_t0, *t2_t0);
    let (p_t1, t0_t1, t1_t1, t2_t1) = (*p_t1, *t0_t1, *t1_t1, *t2_t1);
    let gap = move |t: Float, u: Float, v: Float| {
        let p = p_t0.lerp(&p_t1, t);
        let t0 = t0_t0.lerp(&t0_t1, t);
        let t1 = t1_t0.lerp(&t1_t1, t);
        let t2 = t2_t0.lerp(&t2_t1, t);
        p - (t0 + u * (t1 - t0) + v * (t2 - t0))
    };
    inclusion_root_finder(
        gap,
        true,
        min_distance,
        tolerance,
        tmax,
        max_iterations,
        no_zero_toi,
    )
}
