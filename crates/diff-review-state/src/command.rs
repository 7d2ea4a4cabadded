//! Commands that change the diff view state.
//!
//! Every mutation of [`crate::DiffState`] is expressed as one [`Command`] and
//! applied by [`crate::reducer::apply`]. Commands serialize as
//! `{"type": "...", "payload": ...}` so recorded sessions can be replayed.

use serde::{Deserialize, Serialize};

use crate::engine::{CollapseTrigger, ViewType};
use crate::model::{
    ContextLinesPayload, CoverageData, DiffBatch, DiffFilePayload, DiffMetadata,
    DiscussionPayload, FileTree, LineCode, MergeRequestDiff, ProjectionRow, ProjectionRows,
    ViewerState,
};
use crate::state::{BaseConfig, BatchLoadingState, CommentForm};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    // === Configuration and loading ===
    SetBaseConfig(BaseConfig),
    SetLoading(bool),
    SetBatchLoading(BatchLoadingState),
    SetRetrievingBatches(bool),
    /// Store diff-wide metadata and merge the files it lists.
    SetDiffMetadata(DiffMetadata),
    /// Replace every file.
    SetDiffFiles(Vec<DiffFilePayload>),
    /// Append the files of a batch not seen yet.
    MergeDiffBatch(DiffBatch),
    SetCoverageData(CoverageData),
    SetMergeRequestDiffs(Vec<MergeRequestDiff>),
    /// Store the whitespace preference; the files are dropped for a reload.
    SetShowWhitespace(bool),
    SetDiffViewType(ViewType),

    // === Lines and discussions ===
    /// Replace the placeholder of a hidden region with fetched context.
    AddContextLines(ContextLinesPayload),
    /// Patch a single collapsed file with its freshly fetched lines.
    AddCollapsedDiffs {
        file_hash: String,
        batch: DiffBatch,
    },
    SetLineDiscussionsForFile(DiscussionPayload),
    RemoveLineDiscussionsForFile {
        file_hash: String,
        line_code: LineCode,
    },
    ToggleLineDiscussions {
        file_hash: String,
        line_code: LineCode,
        expanded: bool,
    },
    ToggleLineHasForm {
        file_hash: String,
        line_code: LineCode,
        has_form: bool,
    },

    // === Navigation and transient state ===
    ViewDiffFile {
        file_hash: String,
    },
    SetTreeData(FileTree),
    ToggleFolderOpen {
        path: String,
    },
    ToggleShowTreeList,
    SetRenderTreeList(bool),
    ToggleFileFinderVisible(bool),
    SetHighlightedRow {
        #[serde(default)]
        line_code: Option<LineCode>,
    },
    OpenCommentForm(CommentForm),
    UpdateCommentForm(CommentForm),
    CloseCommentForm {
        file_hash: String,
    },
    DismissSuggestPopover,

    // === Collapse and full file ===
    RenderFile {
        file_hash: String,
    },
    SetFileCollapsed {
        file_path: String,
        collapsed: bool,
        trigger: CollapseTrigger,
    },
    SetDiffFileViewer {
        file_path: String,
        viewer: ViewerState,
    },
    RequestFullDiff {
        file_path: String,
    },
    ReceiveFullDiffSuccess {
        file_path: String,
    },
    ReceiveFullDiffError {
        file_path: String,
    },

    // === Projections ===
    SetCurrentViewDiffFileLines {
        file_path: String,
        lines: ProjectionRows,
    },
    SetHiddenViewDiffFileLines {
        file_path: String,
        lines: ProjectionRows,
    },
    AddCurrentViewDiffFileLine {
        file_path: String,
        line: ProjectionRow,
    },
    ToggleDiffFileRenderingMore {
        file_path: String,
    },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}
