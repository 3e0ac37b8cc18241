use na::Vector3;

use crate::types::Float;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EdgeEdgeDistanceType {
    /// The edges are closest at vertex 0 of edge A and 0 of edge B.
    EA0_EB0,
    /// The edges are closest at vertex 0 of edge A and 1 of edge B.
    EA0_EB1,
    /// The edges are closest at vertex 1 of edge A and 0 of edge B.
    EA1_EB0,
    /// The edges are closest at vertex 1 of edge A and 1 of edge B.
    EA1_EB1,
    /// The edges are closest at the interior of edge A and vertex 0 of edge B.
    EA_EB0,
    /// The edges are closest at the interior of edge A and vertex 1 of edge B.
    EA_EB1,
    /// The edges are closest at vertex 0 of edge A and the interior of edge B.
    EA0_EB,
    /// The edges are closest at vertex 1 of edge A and the interior of edge B.
    EA1_EB,
    /// The edges are closest at an interior point of edge A and B.
    EA_EB,
}

/// Parameters (s, t) ∈ [0, 1]² of the closest points (1-s) ea0 + s ea1 and
/// (1-t) eb0 + t eb1 between two line segments.
/// Parallel edges fall back to an endpoint projection (the minimiser is not
/// unique; any one of them realises the distance).
/// ref: Real-Time Collision Detection, Ericson, 5.1.9
pub fn edge_edge_closest_parameters(
    ea0: &Vector3<Float>,
    ea1: &Vector3<Float>,
    eb0: &Vector3<Float>,
    eb1: &Vector3<Float>,
) -> (Float, Float) {
    let d1 = ea1 - ea0;
    let d2 = eb1 - eb0;
    let r = ea0 - eb0;

    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    // Degenerate segments should not happen in practice, but we handle them
    if a == 0.0 && e == 0.0 {
        return (0.0, 0.0);
    }
    if a == 0.0 {
        return (0.0, (f / e).clamp(0.0, 1.0));
    }
    let c = d1.dot(&r);
    if e == 0.0 {
        return ((-c / a).clamp(0.0, 1.0), 0.0);
    }

    let b = d1.dot(&d2);
    let denom = a * e - b * b;

    // denom == 0 ⟺ parallel edges; pick s = 0 and project
    let mut s = if denom != 0.0 {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let t = (b * s + f) / e;
    if t < 0.0 {
        s = (-c / a).clamp(0.0, 1.0);
        (s, 0.0)
    } else if t > 1.0 {
        s = ((b - c) / a).clamp(0.0, 1.0);
        (s, 1.0)
    } else {
        (s, t)
    }
}

pub fn edge_edge_distance_type(
    ea0: &Vector3<Float>,
    ea1: &Vector3<Float>,
    eb0: &Vector3<Float>,
    eb1: &Vector3<Float>,
) -> EdgeEdgeDistanceType {
    let (s, t) = edge_edge_closest_parameters(ea0, ea1, eb0, eb1);
    match ((s == 0.0, s == 1.0), (t == 0.0, t == 1.0)) {
        ((true, _), (true, _)) => EdgeEdgeDistanceType::EA0_EB0,
        ((true, _), (_, true)) => EdgeEdgeDistanceType::EA0_EB1,
        ((_, true), (true, _)) => EdgeEdgeDistanceType::EA1_EB0,
        ((_, true), (_, true)) => EdgeEdgeDistanceType::EA1_EB1,
        ((true, _), _) => EdgeEdgeDistanceType::EA0_EB,
        ((_, true), _) => EdgeEdgeDistanceType::EA1_EB,
        (_, (true, _)) => EdgeEdgeDistanceType::EA_EB0,
        (_, (_, true)) => EdgeEdgeDistanceType::EA_EB1,
        _ => EdgeEdgeDistanceType::EA_EB,
    }
}

/// Squared distance between two line segments (ea0, ea1) and (eb0, eb1)
pub fn edge_edge_distance(
    ea0: &Vector3<Float>,
    ea1: &Vector3<Float>,
    eb0: &Vector3<Float>,
    eb1: &Vector3<Float>,
) -> Float {
    let (s, t) = edge_edge_closest_parameters(ea0, ea1, eb0, eb1);
    let pa = (1.0 - s) * ea0 + s * ea1;
    let pb = (1.0 - t) * eb0 + t * eb1;
    (pa - pb).norm_squared()
}
