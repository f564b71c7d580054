//! # Physical Constants
//!
//! All constants in CGS units for radiative transfer in supernova ejecta.

// ============================================================================
// FUNDAMENTAL CONSTANTS (CGS)
// ============================================================================

/// Speed of light (cm/s)
pub const C_LIGHT: f64 = 2.99792458e10;

/// Inverse speed of light (s/cm)
pub const INVERSE_C_LIGHT: f64 = 1.0 / C_LIGHT;

/// Thomson scattering cross-section (cm²)
pub const SIGMA_THOMSON: f64 = 6.652486e-25;

/// Inverse Thomson cross-section (cm⁻²)
pub const INVERSE_SIGMA_THOMSON: f64 = 1.0 / SIGMA_THOMSON;

// ============================================================================
// KERNEL PARAMETERS
// ============================================================================

/// Sentinel distance for "no intersection" (cm)
///
/// Larger than any physical path length in an ejecta model (a shell at
/// 0.1c after a year is ~1e17 cm) while staying far from f64 overflow in
/// the distance comparisons.
pub const MISS_DISTANCE: f64 = 1e99;

/// Relative frequency separation below which two adjacent lines are
/// treated as coincident and the second is processed at zero distance
pub const CLOSE_LINE_THRESHOLD: f64 = 1e-7;

/// Relative tolerance for the line-distance contract `ν·D ≥ ν_line`
/// before a violation is reported as a numeric anomaly
pub const LINE_DISTANCE_TOLERANCE: f64 = 1e-7;

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Days to seconds
pub const DAY_TO_SECONDS: f64 = 86_400.0;

/// km/s to cm/s
pub const KM_PER_S_TO_CM_PER_S: f64 = 1.0e5;
