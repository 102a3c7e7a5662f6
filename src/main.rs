use std::path::PathBuf;
use std::sync::Arc;

use airshed::ModelConfig;
use airshed::io::{Scenario, write_results};
use airshed::output::{LogLinearResponse, VariableRegistry};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Steady-state air pollution model
#[derive(Parser)]
#[command(name = "airshed")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Steady-state finite-volume air pollution model", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, airshed=trace)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and write the results as JSON
    Run {
        /// Scenario file
        scenario: PathBuf,
        /// Results file (overrides the scenario's `output`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List output variables with their units
    Variables {
        /// Scenario whose population names to use
        scenario: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { scenario, output } => run(scenario, output),
        Commands::Variables { scenario } => variables(scenario),
    }
}

fn run(path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let scenario = Scenario::from_json_file(&path)?;
    let mut domain = scenario.build_domain()?;
    let emissions = scenario.build_emissions()?;
    let model = scenario.build_model();

    let results = model
        .run_with_output(&mut domain, &emissions, scenario.output_all_layers)
        .context("Run failed")?;

    let out = output
        .or(scenario.output)
        .unwrap_or_else(|| path.with_extension("results.json"));
    write_results(&out, &results)?;
    info!(
        iterations = results.summary.iterations,
        termination = ?results.summary.termination,
        path = %out.display(),
        "results written"
    );
    Ok(())
}

fn variables(path: Option<PathBuf>) -> Result<()> {
    let config = match path {
        Some(p) => Scenario::from_json_file(&p)?.model,
        None => ModelConfig::new(),
    };
    let registry =
        VariableRegistry::new(&config.population_names, Arc::new(LogLinearResponse::new()));
    for v in registry.iter() {
        let namespace = format!("{:?}", v.namespace);
        println!("{:<20} {:<14} {:<20} {}", v.name, namespace, v.units, v.description);
    }
    Ok(())
}
