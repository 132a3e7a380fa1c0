//! Linear potential `w · (c·x - b)`.

use crate::consensus::Consensus;
use crate::error::{Error, Result};
use crate::term::{Branch, Term, TermState};

/// `weight · (coefficients·x - constant)`, unbounded below.
///
/// The gradient is constant, so the proximal step is a single shifted box
/// projection and the loss is always in its active regime.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearLossTerm {
    state: TermState,
    weight: f64,
}

impl LinearLossTerm {
    pub fn new(state: TermState, weight: f64) -> Result<Self> {
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(Error::NegativeWeight(weight));
        }
        Ok(Self { state, weight })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl Term for LinearLossTerm {
    fn state(&self) -> &TermState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TermState {
        &mut self.state
    }

    fn minimize(&mut self, consensus: &Consensus<'_>) -> Result<Branch> {
        let targets = self.state.proximal_targets(consensus)?;
        let (candidate, _) =
            self.state
                .shifted_projection(&targets, consensus.step_size(), self.weight);
        self.state.set_local_values(candidate);
        Ok(Branch::LossActive)
    }

    fn potential(&self, x: &[f64]) -> f64 {
        self.weight * self.state.hyperplane_value(x)
    }
}
