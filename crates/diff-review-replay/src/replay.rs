//! Replaying recorded commands and fixture loads against a running engine.

use std::path::Path;

use anyhow::{bail, Context, Result};
use diff_review_state::{Command, DiffLoader, DiffSource, EngineHandle, Outcome};

use crate::fixtures::FixtureSource;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub applied: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Parse a JSON array of commands.
pub fn read_script(path: &Path) -> Result<Vec<Command>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse script {:?}", path))
}

/// Dispatch every command in order.
///
/// A rejected command aborts the replay. Skipped commands are counted, or
/// abort the replay when `strict` is set.
pub async fn replay(
    engine: &EngineHandle,
    commands: Vec<Command>,
    strict: bool,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for (index, command) in commands.into_iter().enumerate() {
        let name = command.name();
        match engine.dispatch(command).await? {
            Ok(Outcome::Applied) => stats.applied += 1,
            Ok(Outcome::Unchanged) => stats.unchanged += 1,
            Ok(Outcome::Skipped(miss)) => {
                if strict {
                    bail!("Command #{} ({}) was skipped: {}", index, name, miss);
                }
                stats.skipped += 1;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Command #{} ({}) was rejected", index, name)))
            }
        }
    }

    log::info!(
        "Replayed commands: {} applied, {} unchanged, {} skipped",
        stats.applied,
        stats.unchanged,
        stats.skipped
    );
    Ok(stats)
}

/// Run the metadata, batch and discussion loads from a fixture directory.
pub async fn load_fixtures(engine: &EngineHandle, dir: &Path) -> Result<()> {
    let source = FixtureSource::new(dir);
    if !source.is_available() {
        bail!("Fixture directory {:?} does not exist", dir);
    }

    let loader = DiffLoader::new(source, engine.clone());
    loader.load_metadata().await?;
    loader.load_batches().await?;
    loader.load_discussions().await?;
    Ok(())
}
