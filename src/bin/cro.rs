//! CRO CLI - Command-line interface for the CRO engine
//!
//! Commands:
//! - score: Score a lead submission from a JSON file
//! - extract: Extract attribution from a URL and optional referrer
//! - validate: Validate an experiment catalog file
//! - simulate: Empirical variant distribution for an experiment

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use cro_engine::{
    AttributionExtractor, ExperimentCatalog, ExperimentStatus, LeadScorer, LeadScoreInputs,
    ENGINE_VERSION, PRODUCER_NAME,
};

/// CRO - Conversion-rate-optimization engine for marketing sites
#[derive(Parser)]
#[command(name = "cro")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score leads, extract attribution, and inspect experiments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a lead submission
    Score {
        /// Lead JSON file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output the full score report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract attribution from a navigation context
    Extract {
        /// Entry URL
        #[arg(long)]
        url: String,

        /// Document referrer
        #[arg(long)]
        referrer: Option<String>,
    },

    /// Validate an experiment catalog
    Validate {
        /// Catalog JSON file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Simulate variant distribution over generated sessions
    Simulate {
        /// Catalog JSON file path
        #[arg(short, long)]
        input: PathBuf,

        /// Experiment id to simulate
        #[arg(long)]
        experiment: String,

        /// Number of sessions to simulate
        #[arg(long, default_value = "10000")]
        sessions: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score { input, json } => cmd_score(&input, json),
        Commands::Extract { url, referrer } => cmd_extract(&url, referrer.as_deref()),
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Simulate {
            input,
            experiment,
            sessions,
        } => cmd_simulate(&input, &experiment, sessions),
    }
}

fn read_input(path: &PathBuf) -> Result<String, std::io::Error> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(path)
    }
}

fn cmd_score(input: &PathBuf, json: bool) -> ExitCode {
    let raw = match read_input(input) {
        Ok(raw) => raw,
        Err(error) => {
            eprintln!("error: failed to read {}: {error}", input.display());
            return ExitCode::FAILURE;
        }
    };

    let inputs: LeadScoreInputs = match serde_json::from_str(&raw) {
        Ok(inputs) => inputs,
        Err(error) => {
            eprintln!("error: invalid lead JSON: {error}");
            return ExitCode::FAILURE;
        }
    };

    let score = LeadScorer::score(&inputs);
    if json {
        println!(
            "{}",
            serde_json::json!({
                "producer": PRODUCER_NAME,
                "email": inputs.email,
                "score": score,
            })
        );
    } else {
        println!("{score}");
    }
    ExitCode::SUCCESS
}

fn cmd_extract(url: &str, referrer: Option<&str>) -> ExitCode {
    let attribution = AttributionExtractor::extract(url, referrer);
    match serde_json::to_string_pretty(&attribution) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(input: &PathBuf) -> ExitCode {
    let raw = match read_input(input) {
        Ok(raw) => raw,
        Err(error) => {
            eprintln!("error: failed to read {}: {error}", input.display());
            return ExitCode::FAILURE;
        }
    };

    match ExperimentCatalog::from_json(&raw) {
        Ok(catalog) => {
            let running = catalog
                .experiments()
                .filter(|e| e.status == ExperimentStatus::Running)
                .count();
            println!(
                "ok: {} experiments ({} running)",
                catalog.len(),
                running
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("invalid catalog: {error}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_simulate(input: &PathBuf, experiment_id: &str, sessions: usize) -> ExitCode {
    let raw = match read_input(input) {
        Ok(raw) => raw,
        Err(error) => {
            eprintln!("error: failed to read {}: {error}", input.display());
            return ExitCode::FAILURE;
        }
    };

    let catalog = match ExperimentCatalog::from_json(&raw) {
        Ok(catalog) => catalog,
        Err(error) => {
            eprintln!("invalid catalog: {error}");
            return ExitCode::FAILURE;
        }
    };

    let Some(experiment) = catalog.get(experiment_id) else {
        eprintln!("error: no experiment with id {experiment_id:?}");
        return ExitCode::FAILURE;
    };

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut unassigned = 0usize;
    for _ in 0..sessions {
        let mut store = cro_engine::MemorySessionStore::new();
        let context = cro_engine::targeting::TargetingContext::default();
        match cro_engine::ExperimentAssigner::assign(&mut store, experiment, &context) {
            Some(variant) => *counts.entry(variant).or_default() += 1,
            None => unassigned += 1,
        }
    }

    for (variant, count) in &counts {
        let share = *count as f64 / sessions as f64 * 100.0;
        println!("{variant}: {count} ({share:.1}%)");
    }
    if unassigned > 0 {
        println!("unassigned: {unassigned}");
    }
    ExitCode::SUCCESS
}
