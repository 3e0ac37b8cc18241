use na::Vector3;

use crate::types::Float;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PointEdgeDistanceType {
    /// The point is closest to the first endpoint of the edge.
    P_E0,
    /// The point is closest to the second endpoint of the edge.
    P_E1,
    /// The point is closest to the interior of the edge.
    P_E,
}

/// Parameter t ∈ [0, 1] of the point on the edge closest to p
pub fn point_edge_closest_parameter(
    p: &Vector3<Float>,
    e0: &Vector3<Float>,
    e1: &Vector3<Float>,
) -> Float {
    let e = e1 - e0;
    let len_sq = e.norm_squared();
    if len_sq == 0.0 {
        return 0.0;
    }
    ((p - e0).dot(&e) / len_sq).clamp(0.0, 1.0)
}

pub fn point_edge_distance_type(
    p: &Vector3<Float>,
    e0: &Vector3<Float>,
    e1: &Vector3<Float>,
) -> PointEdgeDistanceType {
    let t = point_edge_closest_parameter(p, e0, e1);
    if t == 0.0 {
        PointEdgeDistanceType::P_E0
    } else if t == 1.0 {
        PointEdgeDistanceType::P_E1
    } else {
        PointEdgeDistanceType::P_E
    }
}

/// Squared distance between a point and a line segment (e0, e1)
pub fn point_edge_distance(
    p: &Vector3<Float>,
    e0: &Vector3<Float>,
    e1: &Vector3<Float>,
) -> Float {
    let t = point_edge_closest_parameter(p, e0, e1);
    (p - ((1.0 - t) * e0 + t * e1)).norm_squared()
}
