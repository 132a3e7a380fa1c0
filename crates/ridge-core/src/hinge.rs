//! Weighted hinge-loss potential `w · max(0, c·x - b)`.
//!
//! The potential is linear on one side of the hyperplane and zero on the
//! other, so the proximal subproblem splits into three cases, tried in order:
//!
//! 1. Loss off: project the target onto the box. Done if `c·a <= b`.
//! 2. Loss on: shift the target by `w·c/ρ`, project. Done if `c·a >= b`.
//! 3. Otherwise the optimum lies on the kink, so project the unshifted
//!    target onto `{c·x = b} ∩ box`.
//!
//! For a convex instance exactly one case fires. Ties `c·a = b` are taken by
//! the first two cases, so the projector only runs when the two candidates
//! strictly straddle the hyperplane, which also guarantees it is feasible.

use tracing::trace;

use crate::consensus::Consensus;
use crate::error::{Error, Result};
use crate::term::{Branch, Term, TermState};

/// `weight · max(0, coefficients·x - constant)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HingeLossTerm {
    state: TermState,
    weight: f64,
}

impl HingeLossTerm {
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

impl Term for HingeLossTerm {
    fn state(&self) -> &TermState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TermState {
        &mut self.state
    }

    fn minimize(&mut self, consensus: &Consensus<'_>) -> Result<Branch> {
        let step = consensus.step_size();
        let constant = self.state.constant();
        let targets = self.state.proximal_targets(consensus)?;

        let (candidate, total) = self.state.shifted_projection(&targets, step, 0.0);
        if total <= constant {
            self.state.set_local_values(candidate);
            return Ok(Branch::LossInactive);
        }

        let (candidate, total) = self.state.shifted_projection(&targets, step, self.weight);
        if total >= constant {
            self.state.set_local_values(candidate);
            return Ok(Branch::LossActive);
        }

        trace!(arity = self.state.arity(), "hinge optimum on the hyperplane");
        let point = self.state.project_onto_hyperplane(&targets, consensus, 0.0)?;
        self.state.set_local_values(point);
        Ok(Branch::Hyperplane)
    }

    fn potential(&self, x: &[f64]) -> f64 {
        self.weight * self.state.hyperplane_value(x).max(0.0)
    }
}
