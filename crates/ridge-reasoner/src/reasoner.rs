//! The consensus ADMM loop.
//!
//! Each round:
//!
//! 1. every term minimizes against a read-only snapshot of `z`,
//! 2. `z_j ← clip(mean over copies of (x + y/ρ))`,
//! 3. every term takes a dual step `y ← y + ρ (x - z)`,
//! 4. residuals are compared against the stopping thresholds.
//!
//! Step 1 is the only parallel phase. Terms share nothing but the snapshot,
//! so parallel and serial rounds produce bit-identical results.

use rayon::prelude::*;
use ridge_core::{clip, Branch, Consensus, GroundTerm, Term};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::ReasonerConfig;
use crate::error::{Error, Result};

/// Index of a consensus variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableId(pub usize);

impl VariableId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Domain and starting point of a consensus variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variable {
    pub lower: f64,
    pub upper: f64,
    pub initial: f64,
}

impl Default for Variable {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
            initial: 0.0,
        }
    }
}

/// How many terms took each branch in a round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCounts {
    pub loss_inactive: usize,
    pub loss_active: usize,
    pub hyperplane: usize,
}

impl BranchCounts {
    pub fn total(&self) -> usize {
        self.loss_inactive + self.loss_active + self.hyperplane
    }

    fn merge(self, other: Self) -> Self {
        Self {
            loss_inactive: self.loss_inactive + other.loss_inactive,
            loss_active: self.loss_active + other.loss_active,
            hyperplane: self.hyperplane + other.hyperplane,
        }
    }
}

impl From<Branch> for BranchCounts {
    fn from(branch: Branch) -> Self {
        let mut counts = Self::default();
        match branch {
            Branch::LossInactive => counts.loss_inactive = 1,
            Branch::LossActive => counts.loss_active = 1,
            Branch::Hyperplane => counts.hyperplane = 1,
        }
        counts
    }
}

/// Result of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    /// Consensus value per variable
    pub values: Vec<f64>,
    /// Rounds executed
    pub iterations: usize,
    /// Whether both residuals fell below their thresholds
    pub converged: bool,
    /// Last evaluated ‖x - z‖
    pub primal_residual: f64,
    /// Last evaluated ρ‖z - z_prev‖
    pub dual_residual: f64,
    /// Sum of potentials at `values`
    pub objective: f64,
    /// Branches taken in the final round
    pub branches: BranchCounts,
}

#[derive(Debug, Clone, Copy)]
struct Residuals {
    primal: f64,
    dual: f64,
    primal_threshold: f64,
    dual_threshold: f64,
}

impl Residuals {
    fn converged(&self) -> bool {
        self.primal <= self.primal_threshold && self.dual <= self.dual_threshold
    }
}

/// Owns the consensus variables and terms, and runs ADMM over them.
#[derive(Debug)]
pub struct Reasoner {
    config: ReasonerConfig,
    variables: Vec<Variable>,
    terms: Vec<GroundTerm>,
}

impl Reasoner {
    /// Create an empty reasoner after validating `config`.
    pub fn new(config: ReasonerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            variables: Vec::new(),
            terms: Vec::new(),
        })
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn terms(&self) -> &[GroundTerm] {
        &self.terms
    }

    /// Register a consensus variable.
    pub fn add_variable(&mut self, variable: Variable) -> Result<VariableId> {
        let index = self.variables.len();
        let invalid = |reason: String| Error::InvalidVariable { index, reason };

        if !(variable.lower.is_finite() && variable.upper.is_finite()) {
            return Err(invalid("bounds must be finite".into()));
        }
        if variable.lower > variable.upper {
            return Err(invalid(format!(
                "lower {} > upper {}",
                variable.lower, variable.upper
            )));
        }
        if !variable.initial.is_finite() {
            return Err(invalid("initial value must be finite".into()));
        }

        self.variables.push(variable);
        Ok(VariableId(index))
    }

    /// Register a term. Its consensus indices must name existing variables.
    pub fn add_term(&mut self, term: impl Into<GroundTerm>) -> Result<usize> {
        let term = term.into();
        let count = self.variables.len();
        if let Some(&index) = term
            .state()
            .consensus_indices()
            .iter()
            .find(|&&index| index >= count)
        {
            return Err(Error::UnknownVariable { index, count });
        }

        self.terms.push(term);
        Ok(self.terms.len() - 1)
    }

    /// Run ADMM until the residuals converge or the round cap is hit.
    pub fn optimize(&mut self) -> Result<Solution> {
        let step = self.config.step_size;
        let copies = self.copy_counts();
        let total_copies: usize = copies.iter().sum();
        let sqrt_n = (total_copies as f64).sqrt();

        let mut z: Vec<f64> = self
            .variables
            .iter()
            .map(|v| clip(v.initial, v.lower, v.upper))
            .collect();

        let start = Consensus::new(&z, step)?;
        for term in &mut self.terms {
            term.state_mut().initialize_from(&start)?;
        }

        info!(
            variables = z.len(),
            terms = self.terms.len(),
            copies = total_copies,
            step_size = step,
            parallel = self.config.parallel,
            "starting ADMM"
        );

        let mut iterations = 0;
        let mut converged = false;
        let mut primal_residual = f64::INFINITY;
        let mut dual_residual = f64::INFINITY;
        let mut branches = BranchCounts::default();

        while iterations < self.config.max_iterations {
            iterations += 1;

            let snapshot = Consensus::new(&z, step)?.with_projection(self.config.projection);
            branches = self.minimize_all(&snapshot)?;
            trace!(iteration = iterations, ?branches, "terms minimized");

            let next = self.aggregate(&copies, &z);
            let next_snapshot = Consensus::new(&next, step)?;
            for term in &mut self.terms {
                term.state_mut().update_duals(&next_snapshot)?;
            }

            let check = iterations % self.config.check_every == 0
                || iterations == self.config.max_iterations;
            if check {
                let residuals = self.residuals(&z, &next_snapshot, sqrt_n)?;
                primal_residual = residuals.primal;
                dual_residual = residuals.dual;
                debug!(
                    iteration = iterations,
                    primal = residuals.primal,
                    primal_threshold = residuals.primal_threshold,
                    dual = residuals.dual,
                    dual_threshold = residuals.dual_threshold,
                    "residuals"
                );
                converged = residuals.converged();
            }

            z = next;
            if converged {
                break;
            }
        }

        let objective = self.objective(&z)?;
        if converged {
            info!(iterations, objective, "ADMM converged");
        } else {
            warn!(
                iterations,
                primal_residual, dual_residual, "ADMM stopped at the iteration cap"
            );
        }

        Ok(Solution {
            values: z,
            iterations,
            converged,
            primal_residual,
            dual_residual,
            objective,
            branches,
        })
    }

    /// Sum of potentials with every term evaluated at `values`.
    pub fn objective(&self, values: &[f64]) -> Result<f64> {
        let mut total = 0.0;
        for term in &self.terms {
            let x = term
                .state()
                .consensus_indices()
                .iter()
                .map(|&index| {
                    values.get(index).copied().ok_or(Error::UnknownVariable {
                        index,
                        count: values.len(),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            total += term.potential(&x);
        }
        Ok(total)
    }

    fn minimize_all(&mut self, snapshot: &Consensus<'_>) -> Result<BranchCounts> {
        let minimize = |(index, term): (usize, &mut GroundTerm)| {
            term.minimize(snapshot)
                .map(BranchCounts::from)
                .map_err(|source| Error::Term {
                    term: index,
                    source,
                })
        };

        if self.config.parallel {
            self.terms
                .par_iter_mut()
                .enumerate()
                .map(minimize)
                .try_reduce(BranchCounts::default, |a, b| Ok(a.merge(b)))
        } else {
            self.terms
                .iter_mut()
                .enumerate()
                .map(minimize)
                .try_fold(BranchCounts::default(), |a, b: Result<BranchCounts>| {
                    Ok(a.merge(b?))
                })
        }
    }

    /// Number of term copies of each variable.
    fn copy_counts(&self) -> Vec<usize> {
        let mut copies = vec![0; self.variables.len()];
        for term in &self.terms {
            for &index in term.state().consensus_indices() {
                copies[index] += 1;
            }
        }
        copies
    }

    /// New consensus: clipped mean of `x + y/ρ` over copies. Variables no
    /// term touches keep their previous value.
    fn aggregate(&self, copies: &[usize], previous: &[f64]) -> Vec<f64> {
        let step = self.config.step_size;
        let mut sums = vec![0.0; previous.len()];
        for term in &self.terms {
            let state = term.state();
            let copies = state
                .consensus_indices()
                .iter()
                .zip(state.local_values())
                .zip(state.dual_values());
            for ((&index, &x), &y) in copies {
                sums[index] += x + y / step;
            }
        }

        sums.iter()
            .zip(copies)
            .zip(&self.variables)
            .zip(previous)
            .map(|(((&sum, &count), variable), &prev)| {
                if count == 0 {
                    prev
                } else {
                    clip(sum / count as f64, variable.lower, variable.upper)
                }
            })
            .collect()
    }

    fn residuals(
        &self,
        previous: &[f64],
        next: &Consensus<'_>,
        sqrt_n: f64,
    ) -> Result<Residuals> {
        let mut primal_sq = 0.0;
        let mut dual_sq = 0.0;
        let mut x_sq = 0.0;
        let mut z_sq = 0.0;
        let mut y_sq = 0.0;

        for term in &self.terms {
            let state = term.state();
            primal_sq += state.primal_residual_sq(next)?;
            for (i, &index) in state.consensus_indices().iter().enumerate() {
                let z = next.value(index)?;
                let dz = z - previous[index];
                dual_sq += dz * dz;
                z_sq += z * z;
                x_sq += state.local_values()[i].powi(2);
                y_sq += state.dual_values()[i].powi(2);
            }
        }

        let eps_abs = self.config.epsilon_abs * sqrt_n;
        let eps_rel = self.config.epsilon_rel;
        Ok(Residuals {
            primal: primal_sq.sqrt(),
            dual: self.config.step_size * dual_sq.sqrt(),
            primal_threshold: eps_abs + eps_rel * x_sq.sqrt().max(z_sq.sqrt()),
            dual_threshold: eps_abs + eps_rel * y_sq.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridge_core::{HingeLossTerm, TermState};

    fn hinge(index: usize, coefficient: f64, constant: f64, weight: f64) -> HingeLossTerm {
        let state =
            TermState::new(vec![index], vec![0.0], vec![1.0], vec![coefficient], constant)
                .unwrap();
        HingeLossTerm::new(state, weight).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ReasonerConfig {
            step_size: -1.0,
            ..Default::default()
        };
        assert!(matches!(Reasoner::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_invalid_variables() {
        let mut reasoner = Reasoner::new(ReasonerConfig::default()).unwrap();
        for variable in [
            Variable { lower: 1.0, upper: 0.0, initial: 0.5 },
            Variable { lower: f64::NEG_INFINITY, upper: 0.0, initial: 0.0 },
            Variable { lower: 0.0, upper: 1.0, initial: f64::NAN },
        ] {
            assert!(matches!(
                reasoner.add_variable(variable),
                Err(Error::InvalidVariable { index: 0, .. })
            ));
        }
        assert_eq!(reasoner.add_variable(Variable::default()).unwrap(), VariableId(0));
    }

    #[test]
    fn rejects_terms_on_unknown_variables() {
        let mut reasoner = Reasoner::new(ReasonerConfig::default()).unwrap();
        reasoner.add_variable(Variable::default()).unwrap();
        assert!(matches!(
            reasoner.add_term(hinge(1, 1.0, 0.5, 1.0)),
            Err(Error::UnknownVariable { index: 1, count: 1 })
        ));
        assert_eq!(reasoner.add_term(hinge(0, 1.0, 0.5, 1.0)).unwrap(), 0);
    }

    #[test]
    fn empty_model_converges_immediately() {
        let mut reasoner = Reasoner::new(ReasonerConfig::default()).unwrap();
        reasoner
            .add_variable(Variable { lower: 0.0, upper: 1.0, initial: 0.3 })
            .unwrap();
        let solution = reasoner.optimize().unwrap();
        assert!(solution.converged);
        assert_eq!(solution.iterations, 1);
        assert_eq!(solution.values, vec![0.3]);
        assert_eq!(solution.objective, 0.0);
    }

    #[test]
    fn aggregate_averages_copies() {
        let mut reasoner = Reasoner::new(ReasonerConfig::default()).unwrap();
        reasoner.add_variable(Variable::default()).unwrap();
        reasoner.add_variable(Variable::default()).unwrap();
        reasoner.add_term(hinge(0, 1.0, 10.0, 1.0)).unwrap();
        reasoner.add_term(hinge(0, 1.0, 10.0, 1.0)).unwrap();

        let z = [0.2, 0.9];
        let consensus = Consensus::new(&z, 1.0).unwrap();
        for term in &mut reasoner.terms {
            term.state_mut().initialize_from(&consensus).unwrap();
        }
        reasoner.terms[0].state_mut().set_dual_values(&[0.4]).unwrap();

        let copies = reasoner.copy_counts();
        assert_eq!(copies, vec![2, 0]);
        let next = reasoner.aggregate(&copies, &z);
        // ((0.2 + 0.4) + 0.2) / 2, untouched variable keeps its value
        assert!((next[0] - 0.4).abs() < 1e-12);
        assert_eq!(next[1], 0.9);
    }

    #[test]
    fn branch_counts_merge() {
        let counts = BranchCounts::from(Branch::Hyperplane)
            .merge(BranchCounts::from(Branch::LossActive))
            .merge(BranchCounts::from(Branch::Hyperplane));
        assert_eq!(counts.hyperplane, 2);
        assert_eq!(counts.loss_active, 1);
        assert_eq!(counts.total(), 3);
    }
}
