//! Closed set of potential kinds the driver can hold side by side.

use crate::consensus::Consensus;
use crate::error::Result;
use crate::hinge::HingeLossTerm;
use crate::linear::LinearLossTerm;
use crate::squared_hinge::SquaredHingeLossTerm;
use crate::term::{Branch, Term, TermState};

/// Discriminant of a [`GroundTerm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PotentialKind {
    Hinge,
    SquaredHinge,
    Linear,
}

/// A ground potential of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum GroundTerm {
    Hinge(HingeLossTerm),
    SquaredHinge(SquaredHingeLossTerm),
    Linear(LinearLossTerm),
}

impl GroundTerm {
    /// Build a term of `kind` from its state and weight.
    pub fn new(kind: PotentialKind, state: TermState, weight: f64) -> Result<Self> {
        Ok(match kind {
            PotentialKind::Hinge => Self::Hinge(HingeLossTerm::new(state, weight)?),
            PotentialKind::SquaredHinge => {
                Self::SquaredHinge(SquaredHingeLossTerm::new(state, weight)?)
            }
            PotentialKind::Linear => Self::Linear(LinearLossTerm::new(state, weight)?),
        })
    }

    pub fn kind(&self) -> PotentialKind {
        match self {
            Self::Hinge(_) => PotentialKind::Hinge,
            Self::SquaredHinge(_) => PotentialKind::SquaredHinge,
            Self::Linear(_) => PotentialKind::Linear,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Self::Hinge(t) => t.weight(),
            Self::SquaredHinge(t) => t.weight(),
            Self::Linear(t) => t.weight(),
        }
    }
}

impl Term for GroundTerm {
    fn state(&self) -> &TermState {
        match self {
            Self::Hinge(t) => t.state(),
            Self::SquaredHinge(t) => t.state(),
            Self::Linear(t) => t.state(),
        }
    }

    fn state_mut(&mut self) -> &mut TermState {
        match self {
            Self::Hinge(t) => t.state_mut(),
            Self::SquaredHinge(t) => t.state_mut(),
            Self::Linear(t) => t.state_mut(),
        }
    }

    fn minimize(&mut self, consensus: &Consensus<'_>) -> Result<Branch> {
        match self {
            Self::Hinge(t) => t.minimize(consensus),
            Self::SquaredHinge(t) => t.minimize(consensus),
            Self::Linear(t) => t.minimize(consensus),
        }
    }

    fn potential(&self, x: &[f64]) -> f64 {
        match self {
            Self::Hinge(t) => t.potential(x),
            Self::SquaredHinge(t) => t.potential(x),
            Self::Linear(t) => t.potential(x),
        }
    }
}

impl From<HingeLossTerm> for GroundTerm {
    fn from(term: HingeLossTerm) -> Self {
        Self::Hinge(term)
    }
}

impl From<SquaredHingeLossTerm> for GroundTerm {
    fn from(term: SquaredHingeLossTerm) -> Self {
        Self::SquaredHinge(term)
    }
}

impl From<LinearLossTerm> for GroundTerm {
    fn from(term: LinearLossTerm) -> Self {
        Self::Linear(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn state() -> TermState {
        TermState::new(vec![0], vec![0.0], vec![1.0], vec![1.0], 0.5).unwrap()
    }

    #[test]
    fn dispatches_by_kind() {
        let z = [0.8];
        let consensus = Consensus::new(&z, 1.0).unwrap();

        let mut hinge = GroundTerm::new(PotentialKind::Hinge, state(), 2.0).unwrap();
        assert_eq!(hinge.kind(), PotentialKind::Hinge);
        assert_eq!(hinge.minimize(&consensus).unwrap(), Branch::Hyperplane);

        let mut linear = GroundTerm::new(PotentialKind::Linear, state(), 2.0).unwrap();
        assert_eq!(linear.minimize(&consensus).unwrap(), Branch::LossActive);
        assert_eq!(linear.local_values(), &[0.0]);

        let mut squared = GroundTerm::new(PotentialKind::SquaredHinge, state(), 2.0).unwrap();
        assert_eq!(squared.minimize(&consensus).unwrap(), Branch::LossActive);
        assert_eq!(squared.weight(), 2.0);
    }

    #[test]
    fn weight_validated_for_every_kind() {
        for kind in [
            PotentialKind::Hinge,
            PotentialKind::SquaredHinge,
            PotentialKind::Linear,
        ] {
            assert_eq!(
                GroundTerm::new(kind, state(), -0.5),
                Err(Error::NegativeWeight(-0.5))
            );
        }
    }

    #[test]
    fn non_finite_consensus_never_reaches_any_kind() {
        for kind in [
            PotentialKind::Hinge,
            PotentialKind::SquaredHinge,
            PotentialKind::Linear,
        ] {
            for weight in [0.0, 2.0] {
                let mut term = GroundTerm::new(kind, state(), weight).unwrap();
                let z = [f64::NAN];
                let result = Consensus::new(&z, 1.0).and_then(|c| term.minimize(&c));
                assert_eq!(
                    result,
                    Err(Error::NonFiniteInput {
                        field: "consensus",
                        index: 0
                    }),
                    "{:?} with weight {}",
                    kind,
                    weight
                );
                assert_eq!(term.local_values(), &[0.0]);
            }
        }
    }

    #[test]
    fn conversions_preserve_state() {
        let term: GroundTerm = HingeLossTerm::new(state(), 1.0).unwrap().into();
        assert_eq!(term.arity(), 1);
        assert_eq!(term.state().constant(), 0.5);
    }
}
