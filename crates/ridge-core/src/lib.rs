//! Ridge Core
//!
//! Per-term minimization kernels for consensus ADMM over hinge-loss potentials.
//!
//! # Model
//!
//! The objective is a sum of convex potentials, each touching a few variables
//! through a hyperplane `c·x - b` and box bounds. ADMM gives every potential
//! its own copy of those variables. Each round, every copy is pulled toward
//! the shared consensus `z` while minimizing its own potential:
//!
//! ```text
//! x ← argmin  φ(x) + (ρ/2) ‖x - z + y/ρ‖²   s.t.  l <= x <= u
//! ```
//!
//! This crate is that inner step. It is pure computation: no I/O and no
//! shared mutable state. Terms read the consensus through a borrowed
//! [`Consensus`] snapshot, so a round can run them on any number of threads.
//!
//! # Potentials
//!
//! - [`HingeLossTerm`]: `w · max(0, c·x - b)`, solved by case analysis that
//!   falls back to [`HyperplaneProjector`] on the kink.
//! - [`SquaredHingeLossTerm`]: `w · max(0, c·x - b)²`.
//! - [`LinearLossTerm`]: `w · (c·x - b)`.
//!
//! [`GroundTerm`] holds any of them behind one type.

mod consensus;
mod error;
mod ground;
mod hinge;
mod linear;
mod projection;
mod squared_hinge;
mod term;

pub use consensus::Consensus;
pub use error::{Error, Result};
pub use ground::{GroundTerm, PotentialKind};
pub use hinge::HingeLossTerm;
pub use linear::LinearLossTerm;
pub use projection::{clip, HyperplaneProjector, ProjectionMethod, RELATIVE_TOLERANCE};
pub use squared_hinge::SquaredHingeLossTerm;
pub use term::{Branch, Term, TermState};
