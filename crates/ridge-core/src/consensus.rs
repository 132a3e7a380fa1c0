//! Read-only view of the shared consensus state for one round.

use crate::error::{ensure_finite, Error, Result};
use crate::projection::ProjectionMethod;

/// The consensus vector and step size as seen by every term during a round.
///
/// Terms only ever borrow this. The driver builds a fresh snapshot after each
/// aggregation step, so no term can observe a half-updated vector.
#[derive(Debug, Clone, Copy)]
pub struct Consensus<'a> {
    values: &'a [f64],
    step_size: f64,
    projection: ProjectionMethod,
}

impl<'a> Consensus<'a> {
    /// Wrap `values` with a step size, which must be finite and positive.
    /// Every value must be finite.
    pub fn new(values: &'a [f64], step_size: f64) -> Result<Self> {
        if !(step_size.is_finite() && step_size > 0.0) {
            return Err(Error::InvalidStepSize(step_size));
        }
        ensure_finite("consensus", values)?;
        Ok(Self {
            values,
            step_size,
            projection: ProjectionMethod::default(),
        })
    }

    /// Use `method` for any hyperplane projection in this round.
    pub fn with_projection(mut self, method: ProjectionMethod) -> Self {
        self.projection = method;
        self
    }

    /// ADMM step size ρ.
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn projection(&self) -> ProjectionMethod {
        self.projection
    }

    /// Consensus value at a global index.
    pub fn value(&self, index: usize) -> Result<f64> {
        self.values
            .get(index)
            .copied()
            .ok_or(Error::ConsensusIndexOutOfRange {
                index,
                len: self.values.len(),
            })
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
