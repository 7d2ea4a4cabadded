//! Serializable view of the state, used for replay output.

use serde::Serialize;

use super::{BatchLoadingState, CommentForm, DiffState, DiffSize};
use crate::engine::ViewType;
use crate::model::{DiffFile, DiscussionId, FlatTreeEntry, HiddenRange, Line, LineKind, ViewerState};

#[derive(Debug, Clone, Serialize)]
pub struct LineSnapshot {
    pub line_code: String,
    pub kind: LineKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line: Option<u32>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<HiddenRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discussions: Vec<DiscussionId>,
    pub discussions_expanded: bool,
    pub has_form: bool,
}

impl From<&Line> for LineSnapshot {
    fn from(line: &Line) -> Self {
        Self {
            line_code: line.line_code.clone(),
            kind: line.kind,
            old_line: line.old_line,
            new_line: line.new_line,
            text: line.text.clone(),
            hidden: line.hidden,
            discussions: line.discussions.clone(),
            discussions_expanded: line.discussions_expanded,
            has_form: line.has_form,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PairSnapshot {
    pub left: Option<LineSnapshot>,
    pub right: Option<LineSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSnapshot {
    pub file_hash: String,
    pub file_path: String,
    pub collapsed: bool,
    pub viewer: ViewerState,
    pub unified: Vec<LineSnapshot>,
    pub side_by_side: Vec<PairSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discussions: Vec<DiscussionId>,
}

impl From<&DiffFile> for FileSnapshot {
    fn from(file: &DiffFile) -> Self {
        Self {
            file_hash: file.file_hash.clone(),
            file_path: file.file_path.clone(),
            collapsed: file.viewer.is_collapsed(),
            viewer: file.viewer.clone(),
            unified: file.unified_lines().map(LineSnapshot::from).collect(),
            side_by_side: file
                .side_by_side_lines()
                .map(|(left, right)| PairSnapshot {
                    left: left.map(LineSnapshot::from),
                    right: right.map(LineSnapshot::from),
                })
                .collect(),
            discussions: file.discussions.clone(),
        }
    }
}

/// Everything a renderer or a load workflow can ask the state.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub view_type: ViewType,
    pub show_whitespace: bool,
    pub is_loading: bool,
    pub batch_loading: BatchLoadingState,
    pub retrieving_batches: bool,
    pub latest_diff: bool,
    pub diff_size: DiffSize,
    pub current_diff_file_id: Option<String>,
    pub viewed_files: Vec<String>,
    pub highlighted_row: Option<String>,
    pub show_tree_list: bool,
    pub render_tree_list: bool,
    pub file_finder_visible: bool,
    pub tree: Vec<FlatTreeEntry>,
    pub comment_forms: Vec<CommentForm>,
    pub files: Vec<FileSnapshot>,
    /// Discussions held by the store, attached or parked.
    pub discussions: Vec<DiscussionId>,
}

impl StateSnapshot {
    pub fn capture(state: &DiffState) -> Self {
        let navigation = state.navigation();
        Self {
            view_type: state.view_type(),
            show_whitespace: state.show_whitespace(),
            is_loading: state.is_loading(),
            batch_loading: state.batch_loading(),
            retrieving_batches: state.retrieving_batches(),
            latest_diff: state.latest_diff(),
            diff_size: state.diff_size().clone(),
            current_diff_file_id: navigation.current_diff_file_id.clone(),
            viewed_files: navigation.viewed_files.iter().cloned().collect(),
            highlighted_row: navigation.highlighted_row.clone(),
            show_tree_list: navigation.show_tree_list,
            render_tree_list: navigation.render_tree_list,
            file_finder_visible: navigation.file_finder_visible,
            tree: state.tree_entries(),
            comment_forms: state.comment_forms().to_vec(),
            files: state.files().iter().map(FileSnapshot::from).collect(),
            discussions: state
                .store()
                .discussions()
                .iter()
                .map(|record| record.discussion.id.clone())
                .collect(),
        }
    }
}
