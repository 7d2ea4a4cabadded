//! Outcomes and errors of applying a command.

use thiserror::Error;

use crate::model::{LineCode, LineNumbers, Projection};

/// A lookup that found nothing to act on.
///
/// Misses are expected under out-of-order delivery and leave the state as it
/// was; they are reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupMiss {
    #[error("No file with hash {0}")]
    FileHash(String),

    #[error("No file with path {0}")]
    FilePath(String),

    #[error("No line {line_code} in file {file_hash}")]
    Line { file_hash: String, line_code: LineCode },

    #[error(
        "No placeholder at {}:{} in the {projection} lines of file {file_hash}",
        .line_numbers.old_line,
        .line_numbers.new_line
    )]
    Placeholder {
        file_hash: String,
        projection: Projection,
        line_numbers: LineNumbers,
    },

    #[error("No directory {0} in the file tree")]
    TreeEntry(String),

    #[error("No comment form open for file {0}")]
    CommentForm(String),
}

/// A payload that would break a structural invariant of the store.
///
/// The command carrying it is rejected as a whole and the state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("File hash {file_hash} is used by {existing_path} and {incoming_path}")]
    FileCollision {
        file_hash: String,
        existing_path: String,
        incoming_path: String,
    },

    #[error(
        "Projections of file {file_hash} disagree (unified only: {unified_only:?}, side-by-side only: {side_by_side_only:?})"
    )]
    ProjectionMismatch {
        file_hash: String,
        unified_only: Vec<LineCode>,
        side_by_side_only: Vec<LineCode>,
    },

    #[error("Expected {expected} rows, got {found} rows")]
    ProjectionKind {
        expected: Projection,
        found: Projection,
    },

    #[error("Line code {line_code} already present in file {file_hash}")]
    DuplicateLineCode { file_hash: String, line_code: LineCode },

    #[error("Cannot expand upward into the open-ended region of file {file_hash}")]
    UnboundedRegion { file_hash: String },

    #[error("Fetched {fetched} context lines for a region of {hidden} lines in file {file_hash}")]
    ContextOverflow {
        file_hash: String,
        fetched: usize,
        hidden: u32,
    },
}

/// What applying a command did to the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The state changed.
    Applied,
    /// The command was valid but the state already matched it.
    Unchanged,
    /// A lookup missed; nothing changed.
    Skipped(LookupMiss),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    /// `Applied` when `changed`, else `Unchanged`.
    pub fn changed(changed: bool) -> Self {
        if changed {
            Outcome::Applied
        } else {
            Outcome::Unchanged
        }
    }
}

impl From<LookupMiss> for Outcome {
    fn from(miss: LookupMiss) -> Self {
        Outcome::Skipped(miss)
    }
}

/// Result of applying one command.
pub type ApplyResult = Result<Outcome, ConsistencyError>;
