//! # Geometry Module
//!
//! Distance-to-boundary math for concentric spherical shells.
//!
//! A packet at radius r with direction cosine μ moves on a straight chord.
//! The intersection distances with the bounding spheres of its current
//! shell follow from the law of cosines:
//!
//! ```text
//! r_boundary² = r² + d² + 2 r d μ
//! ```
//!
//! solved for the positive root d.

use crate::constants::MISS_DISTANCE;

/// Distance to the outer boundary of the current shell (cm)
///
/// Always a real positive root whenever r ≤ r_outer: the discriminant
/// `r_outer² + (μ² − 1) r²` is then non-negative for any μ ∈ [−1, 1].
#[inline]
pub fn distance_to_outer(r: f64, mu: f64, r_outer: f64) -> f64 {
    (r_outer * r_outer + (mu * mu - 1.0) * r * r).sqrt() - r * mu
}

/// Distance to the inner boundary of the current shell (cm)
///
/// Returns [`MISS_DISTANCE`] when the chord misses the inner sphere:
/// either the packet points outward (μ ≥ 0) or the perpendicular
/// distance of the chord exceeds r_inner.
#[inline]
pub fn distance_to_inner(r: f64, mu: f64, r_inner: f64) -> f64 {
    if mu >= 0.0 {
        return MISS_DISTANCE;
    }
    let check = r_inner * r_inner + r * r * (mu * mu - 1.0);
    if check < 0.0 {
        MISS_DISTANCE
    } else {
        -r * mu - check.sqrt()
    }
}
