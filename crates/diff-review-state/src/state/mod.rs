//! Root state of the diff view and its read-only query surface.

mod comment_forms;
mod navigation;
mod snapshot;

pub use comment_forms::{CommentForm, CommentForms};
pub use navigation::NavigationState;
pub use snapshot::{FileSnapshot, LineSnapshot, PairSnapshot, StateSnapshot};

use diff_review_config::{EngineConfig, ViewTypePreference};
use serde::{Deserialize, Serialize};

use crate::engine::{ContextExpander, ViewType};
use crate::model::{
    CoverageData, DiffFile, Discussion, FileTree, FlatTreeEntry, HiddenRange, LineNumbers,
    MergeRequestDiff, Projection,
};
use crate::store::DiffFileStore;

/// Progress of the paginated batch load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchLoadingState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Error,
}

/// Endpoints and flags provided by the embedding page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub endpoint_metadata: Option<String>,
    #[serde(default)]
    pub endpoint_batch: Option<String>,
    #[serde(default)]
    pub endpoint_coverage: Option<String>,
    #[serde(default)]
    pub project_path: Option<String>,
    #[serde(default)]
    pub dismiss_endpoint: Option<String>,
    #[serde(default)]
    pub show_suggest_popover: bool,
    #[serde(default)]
    pub view_diffs_file_by_file: bool,
}

/// Size information delivered with the metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSize {
    pub real_size: Option<String>,
    pub size: Option<u32>,
}

/// Complete state of the diff view.
#[derive(Debug, Clone)]
pub struct DiffState {
    pub(crate) store: DiffFileStore,
    pub(crate) navigation: NavigationState,
    pub(crate) comment_forms: CommentForms,
    pub(crate) expander: ContextExpander,
    pub(crate) base_config: BaseConfig,
    pub(crate) view_type: ViewType,
    pub(crate) show_whitespace: bool,
    pub(crate) is_loading: bool,
    pub(crate) batch_loading: BatchLoadingState,
    pub(crate) retrieving_batches: bool,
    pub(crate) coverage: Option<CoverageData>,
    pub(crate) merge_request_diffs: Vec<MergeRequestDiff>,
    pub(crate) diff_size: DiffSize,
    pub(crate) batch_page_size: u32,
    pub(crate) unified_diff_lines: bool,
}

impl DiffState {
    pub fn new(config: &EngineConfig) -> Self {
        let view_type = match config.default_view_type {
            ViewTypePreference::Inline => ViewType::Inline,
            ViewTypePreference::SideBySide => ViewType::SideBySide,
        };

        Self {
            store: DiffFileStore::new(),
            navigation: NavigationState::new(config.render_tree_list),
            comment_forms: CommentForms::default(),
            expander: ContextExpander::new(config.unified_diff_lines),
            base_config: BaseConfig::default(),
            view_type,
            show_whitespace: config.show_whitespace,
            is_loading: false,
            batch_loading: BatchLoadingState::default(),
            retrieving_batches: false,
            coverage: None,
            merge_request_diffs: Vec::new(),
            diff_size: DiffSize::default(),
            batch_page_size: config.batch_page_size.max(1),
            unified_diff_lines: config.unified_diff_lines,
        }
    }

    // === Files ===

    pub fn store(&self) -> &DiffFileStore {
        &self.store
    }

    pub fn files(&self) -> &[DiffFile] {
        self.store.files()
    }

    pub fn file_by_hash(&self, file_hash: &str) -> Option<&DiffFile> {
        self.store.file_by_hash(file_hash)
    }

    pub fn file_by_path(&self, file_path: &str) -> Option<&DiffFile> {
        self.store.file_by_path(file_path)
    }

    pub fn is_file_loaded(&self, file_hash: &str) -> bool {
        self.store.is_file_loaded(file_hash)
    }

    pub fn discussion(&self, id: &str) -> Option<&Discussion> {
        self.store.discussion(id)
    }

    pub fn latest_diff(&self) -> bool {
        self.store.latest_diff()
    }

    /// Coverage hits of a new-side line, once coverage has loaded.
    pub fn coverage_for(&self, file_path: &str, new_line: u32) -> Option<u32> {
        self.coverage
            .as_ref()?
            .files
            .get(file_path)?
            .get(&new_line)
            .copied()
    }

    pub fn is_coverage_loaded(&self) -> bool {
        self.coverage.is_some()
    }

    pub fn merge_request_diffs(&self) -> &[MergeRequestDiff] {
        &self.merge_request_diffs
    }

    pub fn diff_size(&self) -> &DiffSize {
        &self.diff_size
    }

    // === View ===

    pub fn view_type(&self) -> ViewType {
        self.view_type
    }

    /// Projection currently rendered.
    pub fn current_projection(&self) -> Projection {
        self.view_type.projection()
    }

    /// Projection kept in sync in the background.
    pub fn hidden_projection(&self) -> Projection {
        self.view_type.hidden_projection()
    }

    /// Projection context expansion lands in.
    pub fn context_target(&self) -> Projection {
        self.expander.target(self.view_type)
    }

    /// Hidden region of the placeholder starting at `start`, in the projection
    /// context expansion lands in.
    pub fn hidden_region(&self, file_hash: &str, start: LineNumbers) -> Option<HiddenRange> {
        let file = self.store.file_by_hash(file_hash)?;
        let placeholder = match self.context_target() {
            Projection::Unified => file.unified_lines().find(|l| l.is_placeholder_at(start)),
            Projection::SideBySide => file
                .side_by_side_lines()
                .flat_map(|(left, right)| [left, right])
                .flatten()
                .find(|l| l.is_placeholder_at(start)),
        };
        placeholder.and_then(|line| line.hidden)
    }

    pub fn show_whitespace(&self) -> bool {
        self.show_whitespace
    }

    pub fn unified_diff_lines(&self) -> bool {
        self.unified_diff_lines
    }

    pub fn base_config(&self) -> &BaseConfig {
        &self.base_config
    }

    pub fn show_suggest_popover(&self) -> bool {
        self.base_config.show_suggest_popover
    }

    // === Loading ===

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn batch_loading(&self) -> BatchLoadingState {
        self.batch_loading
    }

    pub fn retrieving_batches(&self) -> bool {
        self.retrieving_batches
    }

    /// Whether a batch load is already running.
    pub fn is_batch_load_pending(&self) -> bool {
        self.retrieving_batches || self.batch_loading == BatchLoadingState::Loading
    }

    pub fn batch_page_size(&self) -> u32 {
        self.batch_page_size
    }

    // === Navigation ===

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn current_file(&self) -> Option<&DiffFile> {
        self.navigation
            .current_diff_file_id
            .as_deref()
            .and_then(|hash| self.store.file_by_hash(hash))
    }

    pub fn tree(&self) -> &FileTree {
        &self.navigation.tree
    }

    /// Tree entries for navigation, respecting opened directories.
    pub fn tree_entries(&self) -> Vec<FlatTreeEntry> {
        self.navigation.tree.flatten()
    }

    pub fn comment_forms(&self) -> &[CommentForm] {
        self.comment_forms.all()
    }

    pub fn comment_form(&self, file_hash: &str) -> Option<&CommentForm> {
        self.comment_forms.get(file_hash)
    }

    /// Serializable copy of the query surface.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(self)
    }
}

impl Default for DiffState {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_new_from_config() {
        let config = EngineConfig {
            default_view_type: ViewTypePreference::SideBySide,
            render_tree_list: false,
            ..EngineConfig::default()
        };
        let state = DiffState::new(&config);

        assert_eq!(state.view_type(), ViewType::SideBySide);
        assert_eq!(state.current_projection(), Projection::SideBySide);
        assert_eq!(state.hidden_projection(), Projection::Unified);
        assert!(!state.navigation().render_tree_list);
        assert_eq!(state.batch_page_size(), 20);
        assert!(!state.is_batch_load_pending());
    }

    #[test]
    fn test_hidden_region_follows_context_target() {
        use crate::model::{DiffFilePayload, LinePairPayload, LinePayload};

        let mut payload = DiffFilePayload::new("f", "f.rs");
        payload.unified_lines = vec![LinePayload::placeholder(HiddenRange::closed(1, 1, 9))];
        payload.side_by_side_lines = vec![LinePairPayload::both(LinePayload::placeholder(
            HiddenRange::closed(1, 1, 9),
        ))];
        let mut state = DiffState::default();
        state.store.replace_all(vec![payload]).unwrap();

        assert_eq!(state.context_target(), Projection::Unified);
        assert_eq!(
            state.hidden_region("f", LineNumbers::new(1, 1)),
            Some(HiddenRange::closed(1, 1, 9))
        );
        assert_eq!(state.hidden_region("f", LineNumbers::new(2, 2)), None);

        state.view_type = ViewType::SideBySide;
        assert_eq!(state.context_target(), Projection::SideBySide);
        assert_eq!(
            state.hidden_region("f", LineNumbers::new(1, 1)),
            Some(HiddenRange::closed(1, 1, 9))
        );
    }

    #[test]
    fn test_coverage_lookup() {
        let mut state = DiffState::default();
        assert_eq!(state.coverage_for("a.rs", 1), None);

        let mut lines = HashMap::new();
        lines.insert(3, 7);
        let mut files = HashMap::new();
        files.insert("a.rs".to_string(), lines);
        state.coverage = Some(CoverageData { files });

        assert!(state.is_coverage_loaded());
        assert_eq!(state.coverage_for("a.rs", 3), Some(7));
        assert_eq!(state.coverage_for("a.rs", 4), None);
    }
}
