//! Payloads delivered by the load workflows.
//!
//! These are the shapes the engine consumes, intentionally separate from the
//! arena-backed domain types so the wire side stays plain data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    line_code, match_line_code, DiffPosition, Discussion, DiscussionRecord, HiddenRange, Line,
    LineCode, LineKind, LineNumbers, Projection, ViewerState,
};

/// A line as delivered, before it is stored in a projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePayload {
    #[serde(default)]
    pub line_code: Option<LineCode>,
    pub kind: LineKind,
    #[serde(default)]
    pub old_line: Option<u32>,
    #[serde(default)]
    pub new_line: Option<u32>,
    #[serde(default)]
    pub text: String,
    /// Required for `match` lines.
    #[serde(default)]
    pub hidden: Option<HiddenRange>,
}

impl LinePayload {
    pub fn unchanged(old_line: u32, new_line: u32, text: impl Into<String>) -> Self {
        Self {
            line_code: None,
            kind: LineKind::Unchanged,
            old_line: Some(old_line),
            new_line: Some(new_line),
            text: text.into(),
            hidden: None,
        }
    }

    pub fn added(new_line: u32, text: impl Into<String>) -> Self {
        Self {
            line_code: None,
            kind: LineKind::Added,
            old_line: None,
            new_line: Some(new_line),
            text: text.into(),
            hidden: None,
        }
    }

    pub fn removed(old_line: u32, text: impl Into<String>) -> Self {
        Self {
            line_code: None,
            kind: LineKind::Removed,
            old_line: Some(old_line),
            new_line: None,
            text: text.into(),
            hidden: None,
        }
    }

    pub fn placeholder(hidden: HiddenRange) -> Self {
        Self {
            line_code: None,
            kind: LineKind::Match,
            old_line: None,
            new_line: None,
            text: String::new(),
            hidden: Some(hidden),
        }
    }

    /// Use a server-assigned line code.
    pub fn with_code(mut self, line_code: impl Into<LineCode>) -> Self {
        self.line_code = Some(line_code.into());
        self
    }

    /// The code this line will carry once stored in `file_hash`.
    pub fn resolved_code(&self, file_hash: &str) -> LineCode {
        if let Some(code) = &self.line_code {
            return code.clone();
        }
        match (self.kind, self.hidden) {
            (LineKind::Match, Some(hidden)) => {
                match_line_code(file_hash, hidden.old_start, hidden.new_start)
            }
            (LineKind::Match, None) => format!(
                "{}_match",
                line_code(file_hash, self.old_line, self.new_line)
            ),
            _ => line_code(file_hash, self.old_line, self.new_line),
        }
    }

    /// Convert into a stored line of `file_hash`, with no discussions attached.
    pub fn into_line(self, file_hash: &str) -> Line {
        let code = self.resolved_code(file_hash);
        match (self.kind, self.hidden) {
            (LineKind::Match, Some(hidden)) => {
                let mut line = Line::placeholder(file_hash, hidden);
                line.line_code = code;
                if !self.text.is_empty() {
                    line.text = self.text;
                }
                line
            }
            _ => Line::new(code, self.kind, self.old_line, self.new_line, self.text),
        }
    }
}

/// One side-by-side row as delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePairPayload {
    #[serde(default)]
    pub left: Option<LinePayload>,
    #[serde(default)]
    pub right: Option<LinePayload>,
}

impl LinePairPayload {
    pub fn new(left: Option<LinePayload>, right: Option<LinePayload>) -> Self {
        Self { left, right }
    }

    /// The same line shown on both sides (unchanged context or placeholder).
    pub fn both(line: LinePayload) -> Self {
        Self {
            left: Some(line.clone()),
            right: Some(line),
        }
    }
}

/// A single file as delivered by a metadata, batch or collapsed-file load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFilePayload {
    pub file_hash: String,
    pub file_path: String,
    #[serde(default)]
    pub old_path: Option<String>,
    #[serde(default)]
    pub new_path: Option<String>,
    #[serde(default)]
    pub new_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
    #[serde(default)]
    pub renamed_file: bool,
    #[serde(default)]
    pub unified_lines: Vec<LinePayload>,
    #[serde(default)]
    pub side_by_side_lines: Vec<LinePairPayload>,
    #[serde(default)]
    pub viewer: ViewerState,
}

impl DiffFilePayload {
    /// A file with no lines loaded yet.
    pub fn new(file_hash: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            file_hash: file_hash.into(),
            file_path: file_path.into(),
            old_path: None,
            new_path: None,
            new_file: false,
            deleted_file: false,
            renamed_file: false,
            unified_lines: Vec::new(),
            side_by_side_lines: Vec::new(),
            viewer: ViewerState::default(),
        }
    }
}

/// Page information attached to a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// An incremental delivery of files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffBatch {
    #[serde(default)]
    pub diff_files: Vec<DiffFilePayload>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl DiffBatch {
    pub fn new(diff_files: Vec<DiffFilePayload>) -> Self {
        Self {
            diff_files,
            pagination: None,
        }
    }

    pub fn next_page(&self) -> Option<u32> {
        self.pagination.and_then(|p| p.next_page)
    }
}

/// One version of the reviewed change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequestDiff {
    #[serde(default)]
    pub version_index: Option<u32>,
    #[serde(default)]
    pub base_sha: Option<String>,
    #[serde(default)]
    pub start_sha: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
    #[serde(default)]
    pub latest: bool,
}

/// Diff-wide metadata, delivered ahead of the file batches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffMetadata {
    #[serde(default)]
    pub diff_files: Vec<DiffFilePayload>,
    #[serde(default)]
    pub merge_request_diffs: Vec<MergeRequestDiff>,
    /// Whether the loaded diff is the latest version of the change.
    #[serde(default)]
    pub latest_diff: bool,
    #[serde(default)]
    pub real_size: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
}

/// Direction in which a placeholder is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandDirection {
    /// Reveal lines from the bottom of the hidden region upward.
    Up,
    /// Reveal lines from the top of the hidden region downward.
    Down,
    /// Reveal the whole region (expand to the top or bottom of the file).
    All,
}

/// A raw, unpositioned context line fetched for an expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    #[serde(default)]
    pub line_code: Option<LineCode>,
    #[serde(default)]
    pub text: String,
}

impl ContextLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            line_code: None,
            text: text.into(),
        }
    }
}

/// Freshly fetched lines replacing a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLinesPayload {
    pub file_hash: String,
    /// Start of the placeholder's hidden region.
    pub line_numbers: LineNumbers,
    pub lines: Vec<ContextLine>,
    pub direction: ExpandDirection,
    /// Start of the remaining region when an open-ended region has more lines.
    #[serde(default)]
    pub next_line_numbers: Option<LineNumbers>,
}

/// Parameters of a context fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRequest {
    pub file_hash: String,
    pub file_path: String,
    pub hidden: HiddenRange,
    pub direction: ExpandDirection,
    /// Maximum number of lines to fetch.
    pub count: u32,
}

/// A discussion together with the positions it was loaded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionPayload {
    pub discussion: Discussion,
    #[serde(default)]
    pub diff_position_by_line_code: HashMap<LineCode, DiffPosition>,
    #[serde(default)]
    pub note_hash: Option<String>,
}

impl From<DiscussionPayload> for DiscussionRecord {
    fn from(payload: DiscussionPayload) -> Self {
        Self {
            discussion: payload.discussion,
            positions: payload.diff_position_by_line_code,
            note_hash: payload.note_hash,
        }
    }
}

/// Full line set for one projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "projection", content = "lines", rename_all = "snake_case")]
pub enum ProjectionRows {
    Unified(Vec<LinePayload>),
    SideBySide(Vec<LinePairPayload>),
}

impl ProjectionRows {
    pub fn projection(&self) -> Projection {
        match self {
            ProjectionRows::Unified(_) => Projection::Unified,
            ProjectionRows::SideBySide(_) => Projection::SideBySide,
        }
    }
}

/// A single row appended to one projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "projection", content = "line", rename_all = "snake_case")]
pub enum ProjectionRow {
    Unified(LinePayload),
    SideBySide(LinePairPayload),
}

impl ProjectionRow {
    pub fn projection(&self) -> Projection {
        match self {
            ProjectionRow::Unified(_) => Projection::Unified,
            ProjectionRow::SideBySide(_) => Projection::SideBySide,
        }
    }
}

/// A whole file rendered in both projections, for the full-file view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullFileLines {
    #[serde(default)]
    pub unified_lines: Vec<LinePayload>,
    #[serde(default)]
    pub side_by_side_lines: Vec<LinePairPayload>,
}

impl FullFileLines {
    /// Split into `(current, hidden)` rows for the projection being shown.
    pub fn into_rows(self, current: Projection) -> (ProjectionRows, ProjectionRows) {
        let unified = ProjectionRows::Unified(self.unified_lines);
        let side_by_side = ProjectionRows::SideBySide(self.side_by_side_lines);
        match current {
            Projection::Unified => (unified, side_by_side),
            Projection::SideBySide => (side_by_side, unified),
        }
    }
}

/// Line coverage hits per file path and new-side line number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageData {
    #[serde(default)]
    pub files: HashMap<String, HashMap<u32, u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_code_prefers_server_code() {
        let line = LinePayload::added(4, "x").with_code("srv");
        assert_eq!(line.resolved_code("f"), "srv");
        assert_eq!(LinePayload::added(4, "x").resolved_code("f"), "f_0_4");
        assert_eq!(
            LinePayload::placeholder(HiddenRange::closed(5, 6, 9)).resolved_code("f"),
            "f_5_6_match"
        );
    }

    #[test]
    fn test_into_line_placeholder() {
        let line = LinePayload::placeholder(HiddenRange::open(30, 31)).into_line("f");
        assert!(line.is_match());
        assert_eq!(line.hidden, Some(HiddenRange::open(30, 31)));
        assert!(line.discussions.is_empty());
    }

    #[test]
    fn test_batch_deserialize() {
        let json = r#"{
            "diff_files": [{
                "file_hash": "abc",
                "file_path": "src/lib.rs",
                "unified_lines": [
                    {"kind": "unchanged", "old_line": 1, "new_line": 1, "text": "fn a() {}"},
                    {"kind": "match", "hidden": {"old_start": 2, "new_start": 2}}
                ]
            }],
            "pagination": {"next_page": 2}
        }"#;
        let batch: DiffBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.next_page(), Some(2));
        let file = &batch.diff_files[0];
        assert_eq!(file.unified_lines.len(), 2);
        assert!(file.side_by_side_lines.is_empty());
        assert_eq!(file.unified_lines[1].hidden, Some(HiddenRange::open(2, 2)));
    }

    #[test]
    fn test_full_file_rows_follow_current_projection() {
        let full = FullFileLines {
            unified_lines: vec![LinePayload::added(1, "a")],
            side_by_side_lines: vec![LinePairPayload::new(None, Some(LinePayload::added(1, "a")))],
        };

        let (current, hidden) = full.into_rows(Projection::SideBySide);
        assert_eq!(current.projection(), Projection::SideBySide);
        assert_eq!(hidden.projection(), Projection::Unified);
    }

    #[test]
    fn test_rows_projection() {
        assert_eq!(
            ProjectionRows::Unified(Vec::new()).projection(),
            Projection::Unified
        );
        assert_eq!(
            ProjectionRow::SideBySide(LinePairPayload::default()).projection(),
            Projection::SideBySide
        );
    }
}
