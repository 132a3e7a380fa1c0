//! Property tests for whole ADMM runs on random small models.

use proptest::prelude::*;
use proptest::sample::subsequence;
use ridge_reasoner::ridge_core::{GroundTerm, PotentialKind, TermState};
use ridge_reasoner::{Reasoner, ReasonerConfig, Variable};

#[derive(Debug, Clone)]
struct TermSpec {
    kind: PotentialKind,
    indices: Vec<usize>,
    coefficients: Vec<f64>,
    constant: f64,
    weight: f64,
}

#[derive(Debug, Clone)]
struct ModelSpec {
    initial: Vec<f64>,
    terms: Vec<TermSpec>,
}

impl ModelSpec {
    fn reasoner(&self, parallel: bool) -> Reasoner {
        let config = ReasonerConfig {
            max_iterations: 300,
            parallel,
            ..Default::default()
        };
        let mut reasoner = Reasoner::new(config).unwrap();
        for &initial in &self.initial {
            reasoner
                .add_variable(Variable {
                    lower: 0.0,
                    upper: 1.0,
                    initial,
                })
                .unwrap();
        }
        for spec in &self.terms {
            let n = spec.indices.len();
            let state = TermState::new(
                spec.indices.clone(),
                vec![0.0; n],
                vec![1.0; n],
                spec.coefficients.clone(),
                spec.constant,
            )
            .unwrap();
            reasoner
                .add_term(GroundTerm::new(spec.kind, state, spec.weight).unwrap())
                .unwrap();
        }
        reasoner
    }
}

fn arb_kind() -> impl Strategy<Value = PotentialKind> {
    prop_oneof![
        Just(PotentialKind::Hinge),
        Just(PotentialKind::SquaredHinge),
        Just(PotentialKind::Linear),
    ]
}

fn arb_coefficient() -> impl Strategy<Value = f64> {
    (-2.0f64..2.0).prop_map(|c| if c.abs() < 1e-3 { 0.0 } else { c })
}

fn arb_term(variables: usize) -> impl Strategy<Value = TermSpec> {
    let all: Vec<usize> = (0..variables).collect();
    (
        arb_kind(),
        subsequence(all, 1..=variables.min(3)),
        -1.0f64..2.0,
        0.0f64..3.0,
    )
        .prop_flat_map(|(kind, indices, constant, weight)| {
            let n = indices.len();
            prop::collection::vec(arb_coefficient(), n).prop_map(move |coefficients| TermSpec {
                kind,
                indices: indices.clone(),
                coefficients,
                constant,
                weight,
            })
        })
}

fn arb_model() -> impl Strategy<Value = ModelSpec> {
    (1usize..5).prop_flat_map(|variables| {
        (
            prop::collection::vec(-0.5f64..1.5, variables),
            prop::collection::vec(arb_term(variables), 0..6),
        )
            .prop_map(|(initial, terms)| ModelSpec { initial, terms })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Consensus values never leave the variable domains.
    #[test]
    fn values_stay_in_domain(model in arb_model()) {
        let solution = model.reasoner(true).optimize().unwrap();
        prop_assert_eq!(solution.values.len(), model.initial.len());
        for (j, value) in solution.values.iter().enumerate() {
            prop_assert!((0.0..=1.0).contains(value), "variable {} = {}", j, value);
        }
        prop_assert!(solution.objective.is_finite());
        prop_assert!(solution.iterations <= 300);
    }

    /// Rayon and serial rounds produce the same run.
    #[test]
    fn parallel_matches_serial(model in arb_model()) {
        let parallel = model.reasoner(true).optimize().unwrap();
        let serial = model.reasoner(false).optimize().unwrap();
        prop_assert_eq!(parallel, serial);
    }
}
