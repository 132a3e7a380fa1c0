//! Shared per-term state and the `Term` capability.
//!
//! A term is one potential of the objective. It owns a local copy `x` of the
//! variables it touches and the scaled duals `y` for those copies. Everything
//! else (bounds, hyperplane, index map) is fixed at construction.
//!
//! Each round the driver calls [`Term::minimize`], which overwrites `x` with
//!
//! ```text
//! argmin  φ(x) + (ρ/2) ‖x - (z - y/ρ)‖²   subject to  l <= x <= u
//! ```
//!
//! where `φ` is the term's potential and `z` the consensus values at the
//! term's indices.

use crate::consensus::Consensus;
use crate::error::{ensure_finite, ensure_len, ensure_ordered, Result};
use crate::projection::{clip, HyperplaneProjector};

/// Which branch of the case analysis produced the local values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Branch {
    /// The box projection of the target leaves the loss at zero.
    LossInactive,
    /// The loss is in its smooth active regime at the solution.
    LossActive,
    /// The solution sits on the hyperplane `c·x = b`.
    Hyperplane,
}

/// A potential that can be minimized against a consensus snapshot.
pub trait Term: Send + Sync {
    /// Shared state.
    fn state(&self) -> &TermState;

    /// Shared state, mutably. Only the driver should touch duals through this.
    fn state_mut(&mut self) -> &mut TermState;

    /// Recompute the local values in place. Reads only the consensus values
    /// at this term's indices and never writes the snapshot.
    fn minimize(&mut self, consensus: &Consensus<'_>) -> Result<Branch>;

    /// Value of the potential at `x` (proximal part excluded).
    fn potential(&self, x: &[f64]) -> f64;

    fn local_values(&self) -> &[f64] {
        self.state().local_values()
    }

    fn arity(&self) -> usize {
        self.state().arity()
    }
}

/// Fields common to every term.
#[derive(Debug, Clone, PartialEq)]
pub struct TermState {
    local_values: Vec<f64>,
    dual_values: Vec<f64>,
    lower_bounds: Vec<f64>,
    upper_bounds: Vec<f64>,
    coefficients: Vec<f64>,
    constant: f64,
    consensus_indices: Vec<usize>,
}

impl TermState {
    /// Build a term's state. Local values start at the box projection of zero,
    /// duals at zero.
    pub fn new(
        consensus_indices: Vec<usize>,
        lower_bounds: Vec<f64>,
        upper_bounds: Vec<f64>,
        coefficients: Vec<f64>,
        constant: f64,
    ) -> Result<Self> {
        let arity = consensus_indices.len();
        ensure_len("lower_bounds", arity, lower_bounds.len())?;
        ensure_len("upper_bounds", arity, upper_bounds.len())?;
        ensure_len("coefficients", arity, coefficients.len())?;
        ensure_finite("lower_bounds", &lower_bounds)?;
        ensure_finite("upper_bounds", &upper_bounds)?;
        ensure_finite("coefficients", &coefficients)?;
        ensure_finite("constant", &[constant])?;
        ensure_ordered(&lower_bounds, &upper_bounds)?;

        let local_values = lower_bounds
            .iter()
            .zip(&upper_bounds)
            .map(|(&lo, &hi)| clip(0.0, lo, hi))
            .collect();

        Ok(Self {
            local_values,
            dual_values: vec![0.0; arity],
            lower_bounds,
            upper_bounds,
            coefficients,
            constant,
            consensus_indices,
        })
    }

    pub fn arity(&self) -> usize {
        self.consensus_indices.len()
    }

    pub fn local_values(&self) -> &[f64] {
        &self.local_values
    }

    pub fn dual_values(&self) -> &[f64] {
        &self.dual_values
    }

    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower_bounds
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn consensus_indices(&self) -> &[usize] {
        &self.consensus_indices
    }

    /// Overwrite the duals, e.g. to warm start from a previous run.
    pub fn set_dual_values(&mut self, duals: &[f64]) -> Result<()> {
        ensure_len("dual_values", self.arity(), duals.len())?;
        ensure_finite("dual_values", duals)?;
        self.dual_values.copy_from_slice(duals);
        Ok(())
    }

    /// `c·x - b`.
    pub fn hyperplane_value(&self, x: &[f64]) -> f64 {
        self.dot(x) - self.constant
    }

    /// Copy the consensus into the local values (box-projected) and zero the duals.
    pub fn initialize_from(&mut self, consensus: &Consensus<'_>) -> Result<()> {
        for i in 0..self.arity() {
            let z = consensus.value(self.consensus_indices[i])?;
            self.local_values[i] = clip(z, self.lower_bounds[i], self.upper_bounds[i]);
        }
        self.dual_values.iter_mut().for_each(|y| *y = 0.0);
        Ok(())
    }

    /// Dual ascent step `y_i += ρ (x_i - z_i)` against the new consensus.
    pub fn update_duals(&mut self, consensus: &Consensus<'_>) -> Result<()> {
        let step = consensus.step_size();
        for i in 0..self.arity() {
            let z = consensus.value(self.consensus_indices[i])?;
            self.dual_values[i] += step * (self.local_values[i] - z);
        }
        Ok(())
    }

    /// `Σ (x_i - z_i)²` over this term's copies.
    pub fn primal_residual_sq(&self, consensus: &Consensus<'_>) -> Result<f64> {
        let mut total = 0.0;
        for (i, &x) in self.local_values.iter().enumerate() {
            let diff = x - consensus.value(self.consensus_indices[i])?;
            total += diff * diff;
        }
        Ok(total)
    }

    /// Proximal targets `v_i = z_i - y_i/ρ`.
    pub fn proximal_targets(&self, consensus: &Consensus<'_>) -> Result<Vec<f64>> {
        let step = consensus.step_size();
        self.consensus_indices
            .iter()
            .zip(&self.dual_values)
            .map(|(&index, &y)| -> Result<f64> { Ok(consensus.value(index)? - y / step) })
            .collect()
    }

    /// Box projection of `v_i - gradient·c_i/ρ`, with its hyperplane total `c·a`.
    ///
    /// `gradient = 0` gives the plain projection; a linear potential with
    /// weight `w` shifts every target by `w·c_i/ρ`.
    pub fn shifted_projection(
        &self,
        targets: &[f64],
        step_size: f64,
        gradient: f64,
    ) -> (Vec<f64>, f64) {
        let mut total = 0.0;
        let bounds = self.lower_bounds.iter().zip(&self.upper_bounds);
        let candidate = targets
            .iter()
            .zip(&self.coefficients)
            .zip(bounds)
            .map(|((&v, &c), (&lo, &hi))| {
                let a = clip(v - gradient * c / step_size, lo, hi);
                total += c * a;
                a
            })
            .collect();
        (candidate, total)
    }

    /// Solve `Σ c_i x_i(λ) - κλ = b` for this term's hyperplane and box.
    pub fn project_onto_hyperplane(
        &self,
        targets: &[f64],
        consensus: &Consensus<'_>,
        kappa: f64,
    ) -> Result<Vec<f64>> {
        HyperplaneProjector::new_unchecked(
            &self.coefficients,
            &self.lower_bounds,
            &self.upper_bounds,
            self.constant,
            consensus.step_size(),
        )
        .with_method(consensus.projection())
        .solve(targets, kappa)
    }

    /// Replace the local values with the result of a minimization.
    pub(crate) fn set_local_values(&mut self, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.arity());
        self.local_values = values;
    }

    fn dot(&self, x: &[f64]) -> f64 {
        self.coefficients.iter().zip(x).map(|(c, v)| c * v).sum()
    }
}
