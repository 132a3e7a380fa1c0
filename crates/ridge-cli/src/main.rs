//! Ridge binary
//!
//! Loads a JSON model of hinge-loss potentials, runs consensus ADMM over it
//! and prints the assignment as JSON.

mod model;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ridge_reasoner::ReasonerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::model::{Model, Report};

/// MAP inference over hinge-loss potentials with consensus ADMM.
#[derive(Debug, Parser)]
#[command(name = "ridge", version)]
#[command(about = "Consensus ADMM solver for hinge-loss potentials")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve a model and print the assignment.
    Solve(SolveArgs),
    /// Parse and validate a model without solving it.
    Check {
        /// Model file (JSON).
        model: PathBuf,
    },
}

#[derive(Debug, Args)]
struct SolveArgs {
    /// Model file (JSON).
    model: PathBuf,
    /// Reasoner configuration file (JSON). Missing keys use defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the ADMM step size.
    #[arg(long)]
    step_size: Option<f64>,
    /// Override the iteration cap.
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Minimize terms on the calling thread only.
    #[arg(long)]
    serial: bool,
}

impl SolveArgs {
    fn reasoner_config(&self) -> anyhow::Result<ReasonerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => ReasonerConfig::default(),
        };

        if let Some(step_size) = self.step_size {
            config.step_size = step_size;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if self.serial {
            config.parallel = false;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ridge=info,ridge_reasoner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Solve(args) => {
            let config = args.reasoner_config()?;
            let model = Model::load(&args.model)?;
            let mut reasoner = model.build(config)?;

            tracing::info!(
                model = %args.model.display(),
                variables = model.variables.len(),
                terms = model.terms.len(),
                "solving"
            );
            let solution = reasoner.optimize()?;

            let report = Report::new(&model, &solution);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Check { model: path } => {
            let model = Model::load(&path)?;
            model.build(ReasonerConfig::default())?;
            println!(
                "{}: {} variables, {} terms",
                path.display(),
                model.variables.len(),
                model.terms.len()
            );
        }
    }

    Ok(())
}
