mod error;
mod scenario;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use engine::EngineConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use error::{CliError, Result};
use scenario::Scenario;

#[derive(Parser)]
#[command(
    name = "seekback",
    about = "Replays a simulated page session through the seek-history engine",
    version
)]
struct Cli {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Engine config file (JSON); overrides the scenario's embedded config
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "scenario failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let scenario = Scenario::load(&cli.scenario)?;
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => scenario.config.clone().unwrap_or_default(),
    };
    info!(
        scenario = %cli.scenario.display(),
        steps = scenario.steps.len(),
        "running scenario"
    );

    let events = scenario::run(&scenario, config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for event in &events {
        let line = serde_json::to_string(event).map_err(CliError::Encode)?;
        writeln!(out, "{line}").map_err(CliError::Output)?;
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(EngineConfig::from_json_str(&text)?)
}

/// Logs go to stderr so stdout carries only event lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
