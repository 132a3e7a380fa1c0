//! Ridge Reasoner
//!
//! Consensus ADMM over a set of ridge potentials.
//!
//! The reasoner owns the shared consensus vector `z`, one entry per
//! [`Variable`], and a list of [`GroundTerm`]s that each keep local copies of
//! the variables they touch. Every round it lets each term minimize against a
//! read-only snapshot of `z`, averages the copies back into `z`, and nudges
//! each term's duals toward agreement. It stops once the primal residual
//! `‖x - z‖` and dual residual `ρ‖Δz‖` fall below
//!
//! ```text
//! ε_pri  = ε_abs·√n + ε_rel·max(‖x‖, ‖z‖)
//! ε_dual = ε_abs·√n + ε_rel·‖y‖
//! ```
//!
//! where `n` is the total number of local copies.
//!
//! # Example
//!
//! ```
//! use ridge_core::{HingeLossTerm, TermState};
//! use ridge_reasoner::{Reasoner, ReasonerConfig, Variable};
//!
//! let mut reasoner = Reasoner::new(ReasonerConfig::default()).unwrap();
//! let x = reasoner.add_variable(Variable { lower: 0.0, upper: 1.0, initial: 0.9 }).unwrap();
//!
//! // Penalize x above 0.25.
//! let state = TermState::new(vec![x.index()], vec![0.0], vec![1.0], vec![1.0], 0.25).unwrap();
//! reasoner.add_term(HingeLossTerm::new(state, 1.0).unwrap()).unwrap();
//!
//! let solution = reasoner.optimize().unwrap();
//! assert!(solution.values[0] <= 0.25 + 1e-3);
//! ```
//!
//! [`GroundTerm`]: ridge_core::GroundTerm

mod config;
mod error;
mod reasoner;

pub use config::ReasonerConfig;
pub use error::{Error, Result};
pub use reasoner::{BranchCounts, Reasoner, Solution, Variable, VariableId};

// Re-export the kernel so callers need only one dependency
pub use ridge_core;
