//! Trait for fetching diff data.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    ContextLine, ContextRequest, DiffBatch, DiffMetadata, DiscussionPayload, FullFileLines,
};

/// Errors that can occur when fetching diff data.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested file or page was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A network error occurred.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The response could not be decoded.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The source is not available.
    #[error("Diff source unavailable: {0}")]
    Unavailable(String),
}

/// Provides the payloads the load workflows merge into the state.
///
/// Implementations own transport and retries; the loader calls each method
/// once per request and records failures in the state.
///
/// # Example
///
/// ```ignore
/// struct ApiDiffSource {
///     client: ApiClient,
///     merge_request: u64,
/// }
///
/// #[async_trait]
/// impl DiffSource for ApiDiffSource {
///     async fn fetch_batch(&self, page: u32, per_page: u32) -> Result<DiffBatch, SourceError> {
///         self.client
///             .diffs_batch(self.merge_request, page, per_page)
///             .await
///             .map_err(|e| SourceError::NetworkError(e.to_string()))
///     }
///
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Fetch diff-wide metadata, including the file list without lines.
    async fn fetch_metadata(&self) -> Result<DiffMetadata, SourceError>;

    /// Fetch one page of files with their lines.
    ///
    /// # Arguments
    /// * `page` - 1-indexed page number
    /// * `per_page` - Number of files per page
    async fn fetch_batch(&self, page: u32, per_page: u32) -> Result<DiffBatch, SourceError>;

    /// Fetch every discussion of the diff with its recorded positions.
    async fn fetch_discussions(&self) -> Result<Vec<DiscussionPayload>, SourceError>;

    /// Fetch up to `request.count` unchanged lines of a hidden region.
    ///
    /// Lines are returned in file order, starting at the region start for
    /// downward and full expansion and ending at the region end for upward
    /// expansion.
    async fn fetch_context_lines(
        &self,
        request: &ContextRequest,
    ) -> Result<Vec<ContextLine>, SourceError>;

    /// Fetch the whole file, rendered in both projections.
    async fn fetch_full_file(&self, file_path: &str) -> Result<FullFileLines, SourceError>;

    /// Check if the source is available (e.g., has valid credentials).
    fn is_available(&self) -> bool;
}

/// A source that never delivers, for read-only or offline use.
pub struct NoOpDiffSource;

#[async_trait]
impl DiffSource for NoOpDiffSource {
    async fn fetch_metadata(&self) -> Result<DiffMetadata, SourceError> {
        Err(SourceError::Unavailable("Diff loading is disabled".to_string()))
    }

    async fn fetch_batch(&self, _page: u32, _per_page: u32) -> Result<DiffBatch, SourceError> {
        Err(SourceError::Unavailable("Diff loading is disabled".to_string()))
    }

    async fn fetch_discussions(&self) -> Result<Vec<DiscussionPayload>, SourceError> {
        Err(SourceError::Unavailable(
            "Discussion loading is disabled".to_string(),
        ))
    }

    async fn fetch_context_lines(
        &self,
        _request: &ContextRequest,
    ) -> Result<Vec<ContextLine>, SourceError> {
        Err(SourceError::Unavailable(
            "Context expansion is disabled".to_string(),
        ))
    }

    async fn fetch_full_file(&self, _file_path: &str) -> Result<FullFileLines, SourceError> {
        Err(SourceError::Unavailable(
            "Full file loading is disabled".to_string(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }
}
