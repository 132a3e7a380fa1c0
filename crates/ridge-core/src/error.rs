//! Error types for ridge-core.

use thiserror::Error;

/// Result type for ridge-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building terms or minimizing them.
///
/// Every variant is reported to the caller. Nothing here is retried
/// internally: re-running with unchanged inputs cannot fix any of them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A per-coordinate sequence does not match the term's arity.
    #[error("length mismatch for {field}: expected {expected}, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A coordinate has `lower > upper`.
    #[error("inverted bounds at coordinate {index}: lower {lower} > upper {upper}")]
    InvertedBounds { index: usize, lower: f64, upper: f64 },

    /// NaN or infinite input.
    #[error("non-finite value in {field} at coordinate {index}")]
    NonFiniteInput { field: &'static str, index: usize },

    /// Step size must be finite and strictly positive.
    #[error("invalid step size {0}: must be finite and > 0")]
    InvalidStepSize(f64),

    /// Potential weights must be finite and non-negative.
    #[error("invalid weight {0}: must be finite and >= 0")]
    NegativeWeight(f64),

    /// The penalty slope of a projection must be finite and non-negative.
    #[error("invalid penalty slope {0}: must be finite and >= 0")]
    InvalidSlope(f64),

    /// A term refers to a consensus slot that does not exist.
    #[error("consensus index {index} out of range (consensus has {len} values)")]
    ConsensusIndexOutOfRange { index: usize, len: usize },

    /// No point in the box satisfies the hyperplane equality.
    #[error(
        "hyperplane infeasible: constant {constant} outside reachable range [{reachable_min}, {reachable_max}]"
    )]
    Infeasible {
        constant: f64,
        reachable_min: f64,
        reachable_max: f64,
    },

    /// The multiplier search produced a point that misses the hyperplane.
    #[error("projection did not converge: residual {residual} exceeds tolerance {tolerance}")]
    NotConverged { residual: f64, tolerance: f64 },
}

/// Reject NaN and infinities in a slice, naming the offending field.
pub(crate) fn ensure_finite(field: &'static str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(Error::NonFiniteInput { field, index }),
        None => Ok(()),
    }
}

/// Check that `actual` matches the expected arity.
pub(crate) fn ensure_len(field: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            field,
            expected,
            actual,
        })
    }
}

/// Check `lower[i] <= upper[i]` for every coordinate.
pub(crate) fn ensure_ordered(lower: &[f64], upper: &[f64]) -> Result<()> {
    for (index, (&lo, &hi)) in lower.iter().zip(upper).enumerate() {
        if lo > hi {
            return Err(Error::InvertedBounds {
                index,
                lower: lo,
                upper: hi,
            });
        }
    }
    Ok(())
}
