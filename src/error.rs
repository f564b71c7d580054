//! Error types for snapshot validation and packet transport.

use thiserror::Error;

/// Result type for transport operations
pub type KernelResult<T> = Result<T, TransportError>;

/// Contract violations detected in the input snapshot before transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("shell radii not strictly increasing at shell {0}")]
    NonMonotonicShells(usize),

    #[error("outer radius of shell {0} does not match inner radius of shell {1}")]
    DisjointShells(usize, usize),

    #[error("non-positive electron density {value:e} in shell {shell}")]
    NonPositiveDensity { shell: usize, value: f64 },

    #[error("stale inverse electron density in shell {0}")]
    StaleInverseDensity(usize),

    #[error("line list frequencies not strictly decreasing at index {0}")]
    NonMonotonicLineList(usize),

    #[error("negative Sobolev optical depth at shell {shell}, line {line}")]
    NegativeTauSobolev { shell: usize, line: usize },

    #[error("macro block for level {level} sums to {sum} in shell {shell}, expected 1")]
    UnnormalizedMacroBlock { level: usize, shell: usize, sum: f64 },

    #[error("macro block references not monotonic at level {0}")]
    BadMacroBlockRefs(usize),

    #[error("array length mismatch: {0}")]
    LengthMismatch(&'static str),

    #[error("non-positive time since explosion: {0:e} s")]
    NonPositiveTimeExplosion(f64),
}

/// Failures during packet transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("invalid model snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("numeric anomaly in packet {packet}: {detail}")]
    NumericAnomaly { packet: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = SnapshotError::NonPositiveDensity {
            shell: 3,
            value: -1.0e5,
        };
        let text = err.to_string();
        assert!(text.contains("shell 3"));

        let wrapped: TransportError = err.into();
        assert!(wrapped.to_string().contains("invalid model snapshot"));
    }

    #[test]
    fn test_anomaly_message() {
        let err = TransportError::NumericAnomaly {
            packet: 17,
            detail: "negative line distance".into(),
        };
        assert!(err.to_string().contains("packet 17"));
    }
}
