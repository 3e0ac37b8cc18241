use na::Vector3;

use crate::types::Float;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PointTriangleDistanceType {
    /// The point is closest to triangle vertex zero.
    P_T0,
    /// The point is closest to triangle vertex one.
    P_T1,
    /// The point is closest to triangle vertex two.
    P_T2,
    /// The point is closest to triangle edge zero (vertex zero to one).
    P_E0,
    /// The point is closest to triangle edge one (vertex one to two).
    P_E1,
    /// The point is closest to triangle edge two (vertex two to zero).
    P_E2,
    /// The point is closest to the interior of the triangle.
    P_T,
}

/// Barycentric coordinates of the point of the triangle (t0, t1, t2)
/// closest to p, clamped to the closest feature.
/// ref: Real-Time Collision Detection, Ericson, 5.1.5
pub fn point_triangle_closest_coords(
    p: &Vector3<Float>,
    t0: &Vector3<Float>,
    t1: &Vector3<Float>,
    t2: &Vector3<Float>,
) -> [Float; 3] {
    let ab = t1 - t0;
    let ac = t2 - t0;

    let ap = p - t0;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return [1.0, 0.0, 0.0]; // vertex region t0
    }

    let bp = p - t1;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return [0.0, 1.0, 0.0]; // vertex region t1
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return [1.0 - v, v, 0.0]; // edge region t0-t1
    }

    let cp = p - t2;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return [0.0, 0.0, 1.0]; // vertex region t2
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return [1.0 - w, 0.0, w]; // edge region t2-t0
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return [0.0, 1.0 - w, w]; // edge region t1-t2
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    [1.0 - v - w, v, w] // face interior
}

/// Determine the closest pair between a point and a triangle
pub fn point_triangle_distance_type(
    p: &Vector3<Float>,
    t0: &Vector3<Float>,
    t1: &Vector3<Float>,
    t2: &Vector3<Float>,
) -> PointTriangleDistanceType {
    let w = point_triangle_closest_coords(p, t0, t1, t2);
    match (w[0] == 0.0, w[1] == 0.0, w[2] == 0.0) {
        (false, true, true) => PointTriangleDistanceType::P_T0,
        (true, false, true) => PointTriangleDistanceType::P_T1,
        (true, true, false) => PointTriangleDistanceType::P_T2,
        (false, false, true) => PointTriangleDistanceType::P_E0,
        (true, false, false) => PointTriangleDistanceType::P_E1,
        (false, true, false) => PointTriangleDistanceType::P_E2,
        _ => PointTriangleDistanceType::P_T,
    }
}

/// Squared distance between a point and a triangle
pub fn point_triangle_distance(
    p: &Vector3<Float>,
    t0: &Vector3<Float>,
    t1: &Vector3<Float>,
    t2: &Vector3<Float>,
) -> Float {
    let w = point_triangle_closest_coords(p, t0, t1, t2);
    (p - (w[0] * t0 + w[1] * t1 + w[2] * t2)).norm_squared()
}
