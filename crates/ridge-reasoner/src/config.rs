//! Reasoner configuration.

use ridge_core::ProjectionMethod;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tuning knobs for the ADMM loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// ADMM step size ρ
    pub step_size: f64,
    /// Hard cap on rounds
    pub max_iterations: usize,
    /// Absolute stopping tolerance
    pub epsilon_abs: f64,
    /// Relative stopping tolerance
    pub epsilon_rel: f64,
    /// Evaluate residuals every this many rounds
    pub check_every: usize,
    /// Minimize terms on the rayon pool
    pub parallel: bool,
    /// Multiplier search used by hyperplane projections
    pub projection: ProjectionMethod,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            step_size: 1.0,
            max_iterations: 25_000,
            epsilon_abs: 1e-5,
            epsilon_rel: 1e-3,
            check_every: 1,
            parallel: true,
            projection: ProjectionMethod::Breakpoint,
        }
    }
}

impl ReasonerConfig {
    /// Reject settings the loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "step_size must be finite and > 0, got {}",
                self.step_size
            )));
        }
        if !(self.epsilon_abs.is_finite() && self.epsilon_abs > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "epsilon_abs must be finite and > 0, got {}",
                self.epsilon_abs
            )));
        }
        if !(self.epsilon_rel.is_finite() && self.epsilon_rel >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "epsilon_rel must be finite and >= 0, got {}",
                self.epsilon_rel
            )));
        }
        if self.check_every == 0 {
            return Err(Error::InvalidConfig("check_every must be >= 1".into()));
        }
        if let ProjectionMethod::Bisection { tolerance, .. } = self.projection {
            if !(tolerance.is_finite() && tolerance > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "bisection tolerance must be finite and > 0, got {}",
                    tolerance
                )));
            }
        }
        Ok(())
    }
}
