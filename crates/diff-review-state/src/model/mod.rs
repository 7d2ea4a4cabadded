//! Data models for the diff view.

mod arena;
mod discussion;
mod file;
mod file_tree;
mod line;
mod payload;

pub use arena::LineArena;
pub use discussion::{
    DiffPosition, Discussion, DiscussionArena, DiscussionId, DiscussionRecord, Note,
};
pub use file::{DiffFile, Projection, ViewerState};
pub use file_tree::{FileTree, FlatTreeEntry, TreeEntry, TreeEntryKind};
pub use line::{
    line_code, match_line_code, HiddenRange, Line, LineCode, LineId, LineKind, LineNumbers,
    LinePair,
};
pub use payload::{
    ContextLine, ContextLinesPayload, ContextRequest, CoverageData, DiffBatch, DiffFilePayload,
    DiffMetadata, DiscussionPayload, ExpandDirection, FullFileLines, LinePairPayload, LinePayload,
    MergeRequestDiff, Pagination, ProjectionRow, ProjectionRows,
};
