//! Squared hinge potential `w · max(0, c·x - b)²`.
//!
//! When the loss is active, stationarity gives
//! `x_i = clip(v_i - λ c_i/ρ, l_i, u_i)` with `λ = 2w (c·x - b)`, so λ is the
//! root of `Σ c_i x_i(λ) - λ/(2w) = b`. That is the hyperplane multiplier
//! equation with slope `κ = 1/(2w)`, solved by the same breakpoint search.

use crate::consensus::Consensus;
use crate::error::{Error, Result};
use crate::term::{Branch, Term, TermState};

/// `weight · max(0, coefficients·x - constant)²`.
#[derive(Debug, Clone, PartialEq)]
pub struct SquaredHingeLossTerm {
    state: TermState,
    weight: f64,
}

impl SquaredHingeLossTerm {
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

impl Term for SquaredHingeLossTerm {
    fn state(&self) -> &TermState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TermState {
        &mut self.state
    }

    fn minimize(&mut self, consensus: &Consensus<'_>) -> Result<Branch> {
        let targets = self.state.proximal_targets(consensus)?;
        let (candidate, total) = self
            .state
            .shifted_projection(&targets, consensus.step_size(), 0.0);
        if total <= self.state.constant() || self.weight == 0.0 {
            self.state.set_local_values(candidate);
            return Ok(Branch::LossInactive);
        }

        let kappa = 1.0 / (2.0 * self.weight);
        let point = self
            .state
            .project_onto_hyperplane(&targets, consensus, kappa)?;
        self.state.set_local_values(point);
        Ok(Branch::LossActive)
    }

    fn potential(&self, x: &[f64]) -> f64 {
        let excess = self.state.hyperplane_value(x).max(0.0);
        self.weight * excess * excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn single(weight: f64) -> SquaredHingeLossTerm {
        let state = TermState::new(vec![0], vec![0.0], vec![1.0], vec![1.0], 0.5).unwrap();
        SquaredHingeLossTerm::new(state, weight).unwrap()
    }

    #[test]
    fn inactive_below_the_hyperplane() {
        let mut term = single(1.0);
        let z = [0.2];
        let consensus = Consensus::new(&z, 1.0).unwrap();
        assert_eq!(term.minimize(&consensus).unwrap(), Branch::LossInactive);
        assert_eq!(term.local_values(), &[0.2]);
    }

    #[test]
    fn active_balances_loss_and_proximal_pull() {
        // d/dx [(x - 0.5)² + ½(x - 0.9)²] = 0  →  x = 1.9 / 3
        let mut term = single(1.0);
        let z = [0.9];
        let consensus = Consensus::new(&z, 1.0).unwrap();
        assert_eq!(term.minimize(&consensus).unwrap(), Branch::LossActive);
        assert!((term.local_values()[0] - 1.9 / 3.0).abs() < EPS);
    }

    #[test]
    fn heavy_weight_approaches_the_hyperplane() {
        let mut term = single(1e6);
        let z = [0.9];
        let consensus = Consensus::new(&z, 1.0).unwrap();
        term.minimize(&consensus).unwrap();
        let x = term.local_values()[0];
        assert!(x > 0.5 && x - 0.5 < 1e-6);
    }

    #[test]
    fn zero_weight_is_box_projection() {
        let mut term = single(0.0);
        let z = [3.0];
        let consensus = Consensus::new(&z, 1.0).unwrap();
        assert_eq!(term.minimize(&consensus).unwrap(), Branch::LossInactive);
        assert_eq!(term.local_values(), &[1.0]);
    }

    #[test]
    fn respects_box_when_active() {
        // Two coordinates, one pinned at its upper bound by a strong target.
        let state = TermState::new(
            vec![0, 1],
            vec![0.0, 0.0],
            vec![1.0, 0.2],
            vec![1.0, 1.0],
            0.5,
        )
        .unwrap();
        let mut term = SquaredHingeLossTerm::new(state, 1.0).unwrap();
        let z = [0.9, 5.0];
        let consensus = Consensus::new(&z, 1.0).unwrap();
        assert_eq!(term.minimize(&consensus).unwrap(), Branch::LossActive);
        let x = term.local_values();
        assert!((x[1] - 0.2).abs() < EPS);
        // With x1 fixed at 0.2: minimize (x0 - 0.3)² + ½(x0 - 0.9)²
        assert!((x[0] - 1.5 / 3.0).abs() < EPS);
    }

    #[test]
    fn potential_is_squared() {
        let term = single(2.0);
        assert_eq!(term.potential(&[0.0]), 0.0);
        assert!((term.potential(&[1.0]) - 0.5).abs() < EPS);
    }
}
