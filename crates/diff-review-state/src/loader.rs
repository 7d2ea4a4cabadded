//! Load workflows feeding a [`DiffSource`] into the engine.
//!
//! Every state change goes through [`EngineHandle::dispatch`], so a loader can
//! run alongside other loaders and user commands. Failures are recorded in the
//! state (loading flags, full-file error) and returned; nothing is retried.

use thiserror::Error;

use crate::actor::{EngineClosed, EngineHandle};
use crate::command::Command;
use crate::error::{ConsistencyError, LookupMiss, Outcome};
use crate::model::{ContextLinesPayload, ContextRequest, ExpandDirection, FileTree, LineNumbers};
use crate::state::BatchLoadingState;
use crate::traits::{DiffSource, SourceError};

/// Errors that can occur while loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to fetch {what}: {source}")]
    Source {
        what: &'static str,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    EngineClosed(#[from] EngineClosed),
}

impl LoadError {
    fn fetch_failed(what: &'static str) -> impl FnOnce(SourceError) -> LoadError {
        move |source| LoadError::Source { what, source }
    }
}

pub struct DiffLoader<S: DiffSource> {
    source: S,
    engine: EngineHandle,
}

impl<S: DiffSource> DiffLoader<S> {
    pub fn new(source: S, engine: EngineHandle) -> Self {
        Self { source, engine }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load metadata and the file list, then build the file tree.
    pub async fn load_metadata(&self) -> Result<usize, LoadError> {
        self.send(Command::SetLoading(true)).await?;

        let metadata = match self.source.fetch_metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Loading diff metadata failed: {}", e);
                self.send(Command::SetLoading(false)).await?;
                return Err(LoadError::fetch_failed("diff metadata")(e));
            }
        };
        let listed = metadata.diff_files.len();

        let result = self.send(Command::SetDiffMetadata(metadata)).await;
        self.send(Command::SetLoading(false)).await?;
        result?;

        self.refresh_tree().await?;
        log::info!("Loaded diff metadata listing {} file(s)", listed);
        Ok(listed)
    }

    /// Fetch every page of files, following the pagination of each batch.
    ///
    /// Returns the number of files known once the last page has merged. A
    /// load already in flight makes this a no-op.
    pub async fn load_batches(&self) -> Result<usize, LoadError> {
        let (pending, per_page) = self
            .engine
            .query(|state| (state.is_batch_load_pending(), state.batch_page_size()))
            .await?;
        if pending {
            log::debug!("Batch load already in progress, skipping");
            return Ok(0);
        }

        self.send(Command::SetBatchLoading(BatchLoadingState::Loading))
            .await?;
        self.send(Command::SetRetrievingBatches(true)).await?;

        if let Err(e) = self.fetch_pages(per_page).await {
            log::error!("Batch load failed: {}", e);
            self.send(Command::SetBatchLoading(BatchLoadingState::Error))
                .await?;
            self.send(Command::SetRetrievingBatches(false)).await?;
            return Err(e);
        }

        self.send(Command::SetBatchLoading(BatchLoadingState::Loaded))
            .await?;
        self.send(Command::SetRetrievingBatches(false)).await?;
        self.refresh_tree().await?;

        let total = self.engine.query(|state| state.files().len()).await?;
        log::info!("Batch load finished with {} file(s)", total);
        Ok(total)
    }

    async fn fetch_pages(&self, per_page: u32) -> Result<(), LoadError> {
        let mut page = 1;
        loop {
            let batch = self
                .source
                .fetch_batch(page, per_page)
                .await
                .map_err(LoadError::fetch_failed("diff batch"))?;
            let next_page = batch.next_page();
            log::debug!(
                "Fetched page {} with {} file(s)",
                page,
                batch.diff_files.len()
            );

            self.send(Command::MergeDiffBatch(batch)).await?;

            match next_page {
                Some(next) if next > page => page = next,
                Some(next) => {
                    log::warn!("Ignoring non-advancing next page {} after {}", next, page);
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    /// Load every discussion and attach it to its file.
    pub async fn load_discussions(&self) -> Result<usize, LoadError> {
        let discussions = self
            .source
            .fetch_discussions()
            .await
            .map_err(LoadError::fetch_failed("discussions"))?;
        let count = discussions.len();

        for discussion in discussions {
            self.send(Command::SetLineDiscussionsForFile(discussion))
                .await?;
        }
        log::info!("Attached {} discussion(s)", count);
        Ok(count)
    }

    /// Fetch and splice context for the placeholder starting at `line_numbers`.
    ///
    /// `count` bounds upward and downward expansion; full expansion fetches
    /// the whole region when it is bounded.
    pub async fn expand_context(
        &self,
        file_hash: &str,
        line_numbers: LineNumbers,
        direction: ExpandDirection,
        count: u32,
    ) -> Result<Outcome, LoadError> {
        let hash = file_hash.to_string();
        let (file_path, hidden, projection) = self
            .engine
            .query(move |state| {
                (
                    state.file_by_hash(&hash).map(|f| f.file_path.clone()),
                    state.hidden_region(&hash, line_numbers),
                    state.context_target(),
                )
            })
            .await?;
        let Some(file_path) = file_path else {
            return Ok(LookupMiss::FileHash(file_hash.to_string()).into());
        };
        let Some(hidden) = hidden else {
            log::debug!("No placeholder at {:?} in file {}", line_numbers, file_hash);
            return Ok(LookupMiss::Placeholder {
                file_hash: file_hash.to_string(),
                projection,
                line_numbers,
            }
            .into());
        };

        let count = match (direction, hidden.len()) {
            (ExpandDirection::All, Some(len)) => len,
            (_, Some(len)) => count.min(len),
            (_, None) => count,
        };
        let request = ContextRequest {
            file_hash: file_hash.to_string(),
            file_path,
            hidden,
            direction,
            count,
        };
        let lines = self
            .source
            .fetch_context_lines(&request)
            .await
            .map_err(LoadError::fetch_failed("context lines"))?;

        // A full page from an open-ended region means more may follow.
        let next_line_numbers = (hidden.len().is_none()
            && direction == ExpandDirection::Down
            && lines.len() as u32 == count)
            .then(|| LineNumbers::new(hidden.old_start + count, hidden.new_start + count));

        self.send(Command::AddContextLines(ContextLinesPayload {
            file_hash: file_hash.to_string(),
            line_numbers,
            lines,
            direction,
            next_line_numbers,
        }))
        .await
    }

    /// Replace both projections of a file with its full content.
    pub async fn load_full_file(&self, file_path: &str) -> Result<Outcome, LoadError> {
        let outcome = self
            .send(Command::RequestFullDiff {
                file_path: file_path.to_string(),
            })
            .await?;
        if let Outcome::Skipped(miss) = outcome {
            return Ok(Outcome::Skipped(miss));
        }

        let result = self.write_full_file(file_path).await;
        let finish = match &result {
            Ok(_) => Command::ReceiveFullDiffSuccess {
                file_path: file_path.to_string(),
            },
            Err(e) => {
                log::warn!("Loading full file {} failed: {}", file_path, e);
                Command::ReceiveFullDiffError {
                    file_path: file_path.to_string(),
                }
            }
        };
        self.send(finish).await?;
        result
    }

    async fn write_full_file(&self, file_path: &str) -> Result<Outcome, LoadError> {
        let full = self
            .source
            .fetch_full_file(file_path)
            .await
            .map_err(LoadError::fetch_failed("full file"))?;
        let current = self.engine.query(|state| state.current_projection()).await?;
        let (current, hidden) = full.into_rows(current);

        self.send(Command::SetCurrentViewDiffFileLines {
            file_path: file_path.to_string(),
            lines: current,
        })
        .await?;
        self.send(Command::SetHiddenViewDiffFileLines {
            file_path: file_path.to_string(),
            lines: hidden,
        })
        .await?;
        log::info!("Loaded full file {}", file_path);
        Ok(Outcome::Applied)
    }

    async fn refresh_tree(&self) -> Result<(), LoadError> {
        let tree = self
            .engine
            .query(|state| FileTree::from_files(state.files()))
            .await?;
        self.send(Command::SetTreeData(tree)).await?;
        Ok(())
    }

    async fn send(&self, command: Command) -> Result<Outcome, LoadError> {
        Ok(self.engine.dispatch(command).await??)
    }
}
