//! JSON model files.
//!
//! ```json
//! {
//!   "variables": [{ "name": "smokes_bob", "lower": 0, "upper": 1, "initial": 0.5 }],
//!   "terms": [{ "kind": "hinge", "weight": 2.0, "coefficients": [1.0],
//!               "constant": 0.5, "variables": [0] }]
//! }
//! ```
//!
//! A term's box bounds are taken from the variables it references.

use std::fs;
use std::path::Path;

use anyhow::Context;
use ridge_reasoner::ridge_core::{GroundTerm, PotentialKind, TermState};
use ridge_reasoner::{Error, Reasoner, ReasonerConfig, Solution, Variable};
use serde::{Deserialize, Serialize};

/// A consensus variable with an optional display name.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub domain: Variable,
}

/// One ground potential.
#[derive(Debug, Clone, Deserialize)]
pub struct TermSpec {
    pub kind: PotentialKind,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub constant: f64,
    pub variables: Vec<usize>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
    #[serde(default)]
    pub terms: Vec<TermSpec>,
}

impl Model {
    /// Read and parse a model file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading model {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing model {}", path.display()))
    }

    /// Build a reasoner holding every variable and term of the model.
    pub fn build(&self, config: ReasonerConfig) -> ridge_reasoner::Result<Reasoner> {
        let mut reasoner = Reasoner::new(config)?;
        for spec in &self.variables {
            reasoner.add_variable(spec.domain)?;
        }

        for spec in &self.terms {
            let mut lower = Vec::with_capacity(spec.variables.len());
            let mut upper = Vec::with_capacity(spec.variables.len());
            for &index in &spec.variables {
                let variable = self.variables.get(index).ok_or(Error::UnknownVariable {
                    index,
                    count: self.variables.len(),
                })?;
                lower.push(variable.domain.lower);
                upper.push(variable.domain.upper);
            }

            let state = TermState::new(
                spec.variables.clone(),
                lower,
                upper,
                spec.coefficients.clone(),
                spec.constant,
            )?;
            reasoner.add_term(GroundTerm::new(spec.kind, state, spec.weight)?)?;
        }

        Ok(reasoner)
    }

    /// Display name of variable `index`.
    pub fn variable_name(&self, index: usize) -> String {
        self.variables
            .get(index)
            .and_then(|v| v.name.clone())
            .unwrap_or_else(|| format!("x{}", index))
    }
}

/// A named value in the printed report.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub name: String,
    pub value: f64,
}

/// What `ridge solve` prints.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub assignments: Vec<Assignment>,
    #[serde(flatten)]
    pub solution: &'a Solution,
}

impl<'a> Report<'a> {
    pub fn new(model: &Model, solution: &'a Solution) -> Self {
        let assignments = solution
            .values
            .iter()
            .enumerate()
            .map(|(index, &value)| Assignment {
                name: model.variable_name(index),
                value,
            })
            .collect();
        Self {
            assignments,
            solution,
        }
    }
}
