//! [`DiffSource`] backed by a directory of recorded responses.
//!
//! Layout:
//!
//! ```text
//! fixtures/
//!   metadata.json          DiffMetadata
//!   batches/1.json         DiffBatch, one file per page
//!   discussions.json       [DiscussionPayload] (optional)
//!   files/<file_path>      raw file content, used for context expansion
//!   full/<file_path>.json  FullFileLines
//! ```

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use diff_review_state::model::ContextRequest;
use diff_review_state::{
    ContextLine, DiffBatch, DiffMetadata, DiffSource, DiscussionPayload, ExpandDirection,
    FullFileLines, SourceError,
};
use serde::de::DeserializeOwned;

pub struct FixtureSource {
    root: PathBuf,
}

impl FixtureSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read(&self, relative: impl AsRef<Path>) -> Result<String, SourceError> {
        let path = self.root.join(relative);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
                _ => SourceError::Unavailable(format!("{}: {}", path.display(), e)),
            })
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        relative: impl AsRef<Path>,
    ) -> Result<T, SourceError> {
        let relative = relative.as_ref();
        let content = self.read(relative).await?;
        serde_json::from_str(&content)
            .map_err(|e| SourceError::InvalidPayload(format!("{}: {}", relative.display(), e)))
    }
}

#[async_trait]
impl DiffSource for FixtureSource {
    async fn fetch_metadata(&self) -> Result<DiffMetadata, SourceError> {
        self.read_json("metadata.json").await
    }

    async fn fetch_batch(&self, page: u32, per_page: u32) -> Result<DiffBatch, SourceError> {
        log::debug!("Reading recorded page {} (per_page {} ignored)", page, per_page);
        self.read_json(format!("batches/{}.json", page)).await
    }

    async fn fetch_discussions(&self) -> Result<Vec<DiscussionPayload>, SourceError> {
        match self.read_json("discussions.json").await {
            Err(SourceError::NotFound(_)) => Ok(Vec::new()),
            result => result,
        }
    }

    async fn fetch_context_lines(
        &self,
        request: &ContextRequest,
    ) -> Result<Vec<ContextLine>, SourceError> {
        let content = self
            .read(Path::new("files").join(&request.file_path))
            .await?;
        Ok(context_window(&content, request))
    }

    async fn fetch_full_file(&self, file_path: &str) -> Result<FullFileLines, SourceError> {
        self.read_json(format!("full/{}.json", file_path)).await
    }

    fn is_available(&self) -> bool {
        self.root.is_dir()
    }
}

/// Cut the requested old-side lines (1-indexed) out of the file content.
fn context_window(content: &str, request: &ContextRequest) -> Vec<ContextLine> {
    let lines: Vec<&str> = content.lines().collect();
    let hidden = request.hidden;

    let first = match (request.direction, hidden.old_end) {
        (ExpandDirection::Up, Some(old_end)) => (old_end + 1)
            .saturating_sub(request.count)
            .max(hidden.old_start),
        _ => hidden.old_start,
    };
    let last = hidden
        .old_end
        .map_or(lines.len(), |end| (end as usize).min(lines.len()));
    let start = (first as usize).saturating_sub(1);

    lines
        .get(start..last.max(start))
        .unwrap_or_default()
        .iter()
        .take(request.count as usize)
        .map(|text| ContextLine::new(*text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use diff_review_state::HiddenRange;
    use pretty_assertions::assert_eq;

    const CONTENT: &str = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8";

    fn request(hidden: HiddenRange, direction: ExpandDirection, count: u32) -> ContextRequest {
        ContextRequest {
            file_hash: "f".to_string(),
            file_path: "f.rs".to_string(),
            hidden,
            direction,
            count,
        }
    }

    fn texts(lines: Vec<ContextLine>) -> Vec<String> {
        lines.into_iter().map(|l| l.text).collect()
    }

    #[test]
    fn test_context_window_down() {
        let lines = context_window(
            CONTENT,
            &request(HiddenRange::closed(2, 2, 6), ExpandDirection::Down, 3),
        );
        assert_eq!(texts(lines), vec!["l2", "l3", "l4"]);
    }

    #[test]
    fn test_context_window_up() {
        let lines = context_window(
            CONTENT,
            &request(HiddenRange::closed(2, 2, 6), ExpandDirection::Up, 2),
        );
        assert_eq!(texts(lines), vec!["l5", "l6"]);
    }

    #[test]
    fn test_context_window_open_region_stops_at_end_of_file() {
        let lines = context_window(
            CONTENT,
            &request(HiddenRange::open(7, 7), ExpandDirection::Down, 20),
        );
        assert_eq!(texts(lines), vec!["l7", "l8"]);
    }
}
