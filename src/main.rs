use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use dvsim::{Simulation, SimulationConfig};

#[derive(Parser)]
#[command(name = "dvsim", about = "Distance-vector routing simulation")]
struct Cli {
    /// Link file, one `<node> (<neighbor>,<cost>) ...` line per node
    links: PathBuf,

    /// JSON simulation config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads, overrides the config file
    #[arg(long)]
    workers: Option<usize>,

    /// Round cap, overrides the config file
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Print the final network as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if cli.max_rounds.is_some() {
        config.max_rounds = cli.max_rounds;
    }

    info!("Simulating {} with {} workers", cli.links.display(), config.workers);

    let report = Simulation::from_file(&cli.links, config)
        .with_context(|| format!("reading links from {}", cli.links.display()))?
        .run_on_pool()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}
