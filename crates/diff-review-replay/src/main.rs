use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use diff_review_config::EngineConfig;
use diff_review_state::{DiffViewEngine, EngineHandle};

mod fixtures;
mod logger;
mod replay;

#[derive(Parser, Debug)]
#[command(name = "diff-review-replay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON array of commands to replay
    script: Option<PathBuf>,

    /// Directory of recorded responses to load before the script runs
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Engine config file (default: .diff-review.toml lookup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail when a command is skipped because its target is missing
    #[arg(long)]
    strict: bool,

    /// Write the final state snapshot here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = logger::init()?;
    log::info!("Starting diff-review-replay, logging to {:?}", log_file);

    let config = match &args.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load(),
    };
    let engine = EngineHandle::spawn(DiffViewEngine::with_config(&config));

    if let Some(dir) = &args.fixtures {
        replay::load_fixtures(&engine, dir).await?;
    }
    if let Some(script) = &args.script {
        let commands = replay::read_script(script)?;
        replay::replay(&engine, commands, args.strict).await?;
    }

    let snapshot = engine.query(|state| state.snapshot()).await?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot to {:?}", path))?,
        None => println!("{}", json),
    }

    log::info!("Exiting diff-review-replay");
    Ok(())
}
