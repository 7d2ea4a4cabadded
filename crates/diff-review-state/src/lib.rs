//! # diff-review-state
//!
//! State engine for a code review diff view. It owns the files of a diff, the
//! two projections of their lines (unified and side-by-side), the review
//! discussions anchored to those lines, and the transient navigation state
//! around them.
//!
//! ## Command-Based Architecture
//!
//! Every mutation is a [`Command`] applied by [`reducer::apply`]. A command
//! either applies, leaves the state as it was, or is skipped because its
//! target is gone; a payload that would break an invariant is rejected with
//! a [`ConsistencyError`] before anything changes.
//!
//! [`DiffViewEngine`] runs commands through a middleware chain, and
//! [`EngineHandle`] moves the engine onto its own task so that concurrent
//! load workflows ([`DiffLoader`]) are serialized.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diff_review_state::{Command, DiffViewEngine, DiffBatch, DiffFilePayload};
//!
//! let mut engine = DiffViewEngine::with_config(&config);
//! engine.dispatch(Command::MergeDiffBatch(DiffBatch::new(files)))?;
//!
//! for file in engine.state().files() {
//!     println!("{}: {} lines", file.file_path, file.unified_lines().count());
//! }
//! ```

pub mod actor;
pub mod command;
pub mod engine;
pub mod engine_store;
pub mod error;
pub mod loader;
pub mod middleware;
pub mod model;
pub mod reducer;
pub mod state;
pub mod store;
pub mod traits;

// Re-export commonly used types
pub use actor::{EngineClosed, EngineHandle};
pub use command::Command;
pub use engine::{CollapseTrigger, ContextExpander, ViewType};
pub use engine_store::DiffViewEngine;
pub use error::{ApplyResult, ConsistencyError, LookupMiss, Outcome};
pub use loader::{DiffLoader, LoadError};
pub use middleware::{LoggingMiddleware, Middleware};
pub use model::{
    ContextLine, ContextLinesPayload, DiffBatch, DiffFile, DiffFilePayload, DiffMetadata,
    Discussion, DiscussionPayload, ExpandDirection, FileTree, FullFileLines, HiddenRange, Line,
    LineKind, LineNumbers, LinePairPayload, LinePayload, Note, Projection, ProjectionRow,
    ProjectionRows, ViewerState,
};
pub use state::{BaseConfig, BatchLoadingState, CommentForm, DiffState, StateSnapshot};
pub use store::DiffFileStore;
pub use traits::{DiffSource, NoOpDiffSource, SourceError};
