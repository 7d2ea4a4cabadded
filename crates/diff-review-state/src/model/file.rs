//! A single file of the diff and its two projections.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DiffFilePayload, DiscussionId, Line, LineArena, LineId, LinePair};
use crate::error::ConsistencyError;

/// One of the two parallel renderings of a file's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// One column, removed and added lines interleaved.
    Unified,
    /// Old and new file next to each other, one [`LinePair`] per row.
    SideBySide,
}

impl Projection {
    pub fn other(self) -> Self {
        match self {
            Projection::Unified => Projection::SideBySide,
            Projection::SideBySide => Projection::Unified,
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Unified => write!(f, "unified"),
            Projection::SideBySide => write!(f, "side-by-side"),
        }
    }
}

fn default_viewer_name() -> String {
    "text".to_string()
}

/// Collapse and loading state of a file's viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerState {
    /// Kind of viewer used for the file (text, image, ...).
    #[serde(default = "default_viewer_name")]
    pub name: String,
    /// Reviewer intent; `None` when the reviewer never toggled the file.
    #[serde(default)]
    pub manually_collapsed: Option<bool>,
    #[serde(default)]
    pub automatically_collapsed: bool,
    #[serde(default)]
    pub is_showing_full_file: bool,
    #[serde(default)]
    pub is_loading_full_file: bool,
    /// Heavy rendering has been released for this file.
    #[serde(default)]
    pub render_ready: bool,
    #[serde(default)]
    pub rendering_more_lines: bool,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            name: default_viewer_name(),
            manually_collapsed: None,
            automatically_collapsed: false,
            is_showing_full_file: false,
            is_loading_full_file: false,
            render_ready: false,
            rendering_more_lines: false,
        }
    }
}

impl ViewerState {
    /// Effective collapse state: manual intent when present, else the heuristic.
    pub fn is_collapsed(&self) -> bool {
        self.manually_collapsed
            .unwrap_or(self.automatically_collapsed)
    }
}

/// A file of the diff as held by the store.
#[derive(Debug, Clone)]
pub struct DiffFile {
    pub file_hash: String,
    pub file_path: String,
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub new_file: bool,
    pub deleted_file: bool,
    pub renamed_file: bool,
    lines: LineArena,
    unified: Vec<LineId>,
    side_by_side: Vec<LinePair>,
    /// Fallback discussion list for files without loaded lines.
    pub discussions: Vec<DiscussionId>,
    pub viewer: ViewerState,
}

impl DiffFile {
    /// Create a file with no lines loaded.
    pub fn new(file_hash: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            file_hash: file_hash.into(),
            file_path: file_path.into(),
            old_path: None,
            new_path: None,
            new_file: false,
            deleted_file: false,
            renamed_file: false,
            lines: LineArena::new(),
            unified: Vec::new(),
            side_by_side: Vec::new(),
            discussions: Vec::new(),
            viewer: ViewerState::default(),
        }
    }

    /// Build a file from its payload, checking that both projections agree.
    pub fn from_payload(payload: DiffFilePayload) -> Result<Self, ConsistencyError> {
        let mut file = Self::new(payload.file_hash, payload.file_path);
        file.old_path = payload.old_path;
        file.new_path = payload.new_path;
        file.new_file = payload.new_file;
        file.deleted_file = payload.deleted_file;
        file.renamed_file = payload.renamed_file;
        file.viewer = payload.viewer;

        let hash = file.file_hash.clone();
        file.set_unified(
            payload
                .unified_lines
                .into_iter()
                .map(|line| line.into_line(&hash))
                .collect(),
        );
        file.set_side_by_side(
            payload
                .side_by_side_lines
                .into_iter()
                .map(|pair| {
                    (
                        pair.left.map(|line| line.into_line(&hash)),
                        pair.right.map(|line| line.into_line(&hash)),
                    )
                })
                .collect(),
        );

        file.validate()?;
        Ok(file)
    }

    /// Take over the projections and fallback discussions of a freshly fetched copy.
    pub fn replace_content(&mut self, fresh: DiffFile) {
        self.lines = fresh.lines;
        self.unified = fresh.unified;
        self.side_by_side = fresh.side_by_side;
        self.discussions = fresh.discussions;
    }

    // === Projection queries ===

    pub fn has_unified(&self) -> bool {
        !self.unified.is_empty()
    }

    pub fn has_side_by_side(&self) -> bool {
        !self.side_by_side.is_empty()
    }

    /// Whether either projection holds lines.
    pub fn has_lines(&self) -> bool {
        self.has_unified() || self.has_side_by_side()
    }

    pub fn has_projection(&self, projection: Projection) -> bool {
        match projection {
            Projection::Unified => self.has_unified(),
            Projection::SideBySide => self.has_side_by_side(),
        }
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id)
    }

    pub fn line_mut(&mut self, id: LineId) -> Option<&mut Line> {
        self.lines.get_mut(id)
    }

    pub fn unified_ids(&self) -> &[LineId] {
        &self.unified
    }

    pub fn side_by_side_pairs(&self) -> &[LinePair] {
        &self.side_by_side
    }

    /// Lines of the unified projection in display order.
    pub fn unified_lines(&self) -> impl Iterator<Item = &Line> {
        self.unified.iter().filter_map(|id| self.lines.get(*id))
    }

    /// Rows of the side-by-side projection in display order.
    pub fn side_by_side_lines(&self) -> impl Iterator<Item = (Option<&Line>, Option<&Line>)> {
        self.side_by_side.iter().map(|pair| {
            (
                pair.left.and_then(|id| self.lines.get(id)),
                pair.right.and_then(|id| self.lines.get(id)),
            )
        })
    }

    /// Every slot in either projection whose line carries `line_code`.
    pub fn slots_with_code(&self, line_code: &str) -> Vec<LineId> {
        self.unified
            .iter()
            .copied()
            .chain(self.side_by_side.iter().flat_map(LinePair::ids))
            .filter(|id| {
                self.lines
                    .get(*id)
                    .is_some_and(|line| line.line_code == line_code)
            })
            .collect()
    }

    /// Whether any line or the fallback list refers to `discussion_id`.
    pub fn references_discussion(&self, discussion_id: &str) -> bool {
        self.discussions.iter().any(|id| id == discussion_id)
            || self
                .unified
                .iter()
                .copied()
                .chain(self.side_by_side.iter().flat_map(LinePair::ids))
                .filter_map(|id| self.lines.get(id))
                .any(|line| line.discussions.iter().any(|id| id == discussion_id))
    }

    /// Codes of the real (non-placeholder) lines of a projection.
    pub fn real_codes(&self, projection: Projection) -> BTreeSet<&str> {
        let ids: Vec<LineId> = match projection {
            Projection::Unified => self.unified.clone(),
            Projection::SideBySide => self.side_by_side.iter().flat_map(LinePair::ids).collect(),
        };
        ids.into_iter()
            .filter_map(|id| self.lines.get(id))
            .filter(|line| !line.is_match())
            .map(|line| line.line_code.as_str())
            .collect()
    }

    // === Projection writes ===

    /// Replace the unified projection.
    pub fn set_unified(&mut self, lines: Vec<Line>) {
        for id in std::mem::take(&mut self.unified) {
            self.lines.remove(id);
        }
        self.unified = lines
            .into_iter()
            .map(|line| self.lines.insert(line))
            .collect();
    }

    /// Replace the side-by-side projection.
    pub fn set_side_by_side(&mut self, rows: Vec<(Option<Line>, Option<Line>)>) {
        for pair in std::mem::take(&mut self.side_by_side) {
            for id in pair.ids() {
                self.lines.remove(id);
            }
        }
        self.side_by_side = rows
            .into_iter()
            .map(|(left, right)| self.alloc_pair(left, right))
            .collect();
    }

    pub fn push_unified(&mut self, line: Line) {
        let id = self.lines.insert(line);
        self.unified.push(id);
    }

    pub fn push_side_by_side(&mut self, left: Option<Line>, right: Option<Line>) {
        let pair = self.alloc_pair(left, right);
        self.side_by_side.push(pair);
    }

    /// Replace the unified slot at `index` with `lines`.
    pub(crate) fn splice_unified(&mut self, index: usize, lines: Vec<Line>) {
        let ids: Vec<LineId> = lines.into_iter().map(|line| self.lines.insert(line)).collect();
        for removed in self.unified.splice(index..=index, ids) {
            self.lines.remove(removed);
        }
    }

    /// Replace the side-by-side row at `index` with one row per line, shown on both sides.
    pub(crate) fn splice_side_by_side(&mut self, index: usize, lines: Vec<Line>) {
        let pairs: Vec<LinePair> = lines
            .into_iter()
            .map(|line| self.alloc_pair(Some(line.clone()), Some(line)))
            .collect();
        for removed in self.side_by_side.splice(index..=index, pairs) {
            for id in removed.ids() {
                self.lines.remove(id);
            }
        }
    }

    fn alloc_pair(&mut self, left: Option<Line>, right: Option<Line>) -> LinePair {
        LinePair {
            left: left.map(|line| self.lines.insert(line)),
            right: right.map(|line| self.lines.insert(line)),
        }
    }

    /// Check the projection invariants.
    ///
    /// Codes are unique within the unified projection and across side-by-side
    /// rows (left and right of one row may share a code), and when both
    /// projections are loaded they hold the same real lines.
    pub fn validate(&self) -> Result<(), ConsistencyError> {
        let mut seen = HashSet::new();
        for line in self.unified_lines() {
            if !seen.insert(line.line_code.as_str()) {
                return Err(ConsistencyError::DuplicateLineCode {
                    file_hash: self.file_hash.clone(),
                    line_code: line.line_code.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for (left, right) in self.side_by_side_lines() {
            let mut row: Vec<&str> = left
                .into_iter()
                .chain(right)
                .map(|line| line.line_code.as_str())
                .collect();
            row.dedup();
            for code in row {
                if !seen.insert(code) {
                    return Err(ConsistencyError::DuplicateLineCode {
                        file_hash: self.file_hash.clone(),
                        line_code: code.to_string(),
                    });
                }
            }
        }

        if self.has_unified() && self.has_side_by_side() {
            let unified = self.real_codes(Projection::Unified);
            let side_by_side = self.real_codes(Projection::SideBySide);
            if unified != side_by_side {
                return Err(ConsistencyError::ProjectionMismatch {
                    file_hash: self.file_hash.clone(),
                    unified_only: unified
                        .difference(&side_by_side)
                        .map(|code| code.to_string())
                        .collect(),
                    side_by_side_only: side_by_side
                        .difference(&unified)
                        .map(|code| code.to_string())
                        .collect(),
                });
            }
        }

        Ok(())
    }
}
