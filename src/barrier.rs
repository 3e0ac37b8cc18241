//! Log-barrier of Incremental Potential Contact
//! ref: Incremental Potential Contact, Li et al., 2020

use crate::types::Float;

/// Barrier energy b(d) = -(d - d̂)² ln(d / d̂) for 0 < d < d̂, 0 past the
/// activation distance. d is a squared distance and dhat a squared
/// activation distance; the formula is the same either way.
pub fn barrier(d: Float, dhat: Float) -> Float {
    assert!(d > 0.0, "barrier evaluated at non-positive distance {}", d);
    if d >= dhat {
        return 0.0;
    }
    let t = d - dhat;
    -t * t * (d / dhat).ln()
}

/// db/dd
pub fn barrier_first_derivative(d: Float, dhat: Float) -> Float {
    assert!(d > 0.0);
    if d >= dhat {
        return 0.0;
    }
    let t = d - dhat;
    -(2.0 * t * (d / dhat).ln() + t * t / d)
}

/// d²b/dd²
pub fn barrier_second_derivative(d: Float, dhat: Float) -> Float {
    assert!(d > 0.0);
    if d >= dhat {
        return 0.0;
    }
    let t = d - dhat;
    -(2.0 * (d / dhat).ln() + 4.0 * t / d - t * t / (d * d))
}
