//! Line-level data structures shared by both projections.

use serde::{Deserialize, Serialize};

use super::DiscussionId;

/// Identifier of a line within its file, either server-assigned or synthesized.
pub type LineCode = String;

/// Line type in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Added line (+).
    Added,
    /// Removed line (-).
    Removed,
    /// Unchanged context line.
    Unchanged,
    /// Placeholder for an omitted, not yet fetched run of context.
    Match,
}

impl LineKind {
    /// Get the prefix character for this line type.
    pub fn prefix(&self) -> char {
        match self {
            LineKind::Added => '+',
            LineKind::Removed => '-',
            LineKind::Unchanged => ' ',
            LineKind::Match => '~',
        }
    }
}

/// An old/new position pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineNumbers {
    pub old_line: u32,
    pub new_line: u32,
}

impl LineNumbers {
    pub fn new(old_line: u32, new_line: u32) -> Self {
        Self { old_line, new_line }
    }
}

/// The omitted region a `match` placeholder stands in for.
///
/// `old_end` is inclusive; `None` means the region runs to the end of the file.
/// Context lines are unchanged, so the new-side positions follow the old-side
/// ones at a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenRange {
    pub old_start: u32,
    pub new_start: u32,
    #[serde(default)]
    pub old_end: Option<u32>,
}

impl HiddenRange {
    /// Create a closed range covering `old_start..=old_end`.
    pub fn closed(old_start: u32, new_start: u32, old_end: u32) -> Self {
        Self {
            old_start,
            new_start,
            old_end: Some(old_end),
        }
    }

    /// Create a range running to the end of the file.
    pub fn open(old_start: u32, new_start: u32) -> Self {
        Self {
            old_start,
            new_start,
            old_end: None,
        }
    }

    /// First hidden position.
    pub fn start(&self) -> LineNumbers {
        LineNumbers::new(self.old_start, self.new_start)
    }

    /// Number of hidden lines, if the region is bounded.
    pub fn len(&self) -> Option<u32> {
        self.old_end
            .map(|end| (end + 1).saturating_sub(self.old_start))
    }

    /// Whether the region is bounded and empty.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// New-side position matching an old-side position inside this region.
    pub fn new_line_for(&self, old_line: u32) -> u32 {
        // Unchanged context keeps a constant old/new offset.
        (i64::from(self.new_start) + i64::from(old_line) - i64::from(self.old_start)) as u32
    }
}

/// A single line in one projection slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub line_code: LineCode,
    pub kind: LineKind,
    /// Line number in the old file (removed and unchanged lines).
    pub old_line: Option<u32>,
    /// Line number in the new file (added and unchanged lines).
    pub new_line: Option<u32>,
    pub text: String,
    /// Omitted region, set only on `match` lines.
    pub hidden: Option<HiddenRange>,
    /// Discussions attached to this exact line, in attachment order.
    pub discussions: Vec<DiscussionId>,
    pub discussions_expanded: bool,
    pub has_form: bool,
}

impl Line {
    /// Create a real (non-placeholder) line.
    pub fn new(
        line_code: impl Into<LineCode>,
        kind: LineKind,
        old_line: Option<u32>,
        new_line: Option<u32>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            line_code: line_code.into(),
            kind,
            old_line,
            new_line,
            text: text.into(),
            hidden: None,
            discussions: Vec::new(),
            discussions_expanded: false,
            has_form: false,
        }
    }

    /// Create a placeholder for a hidden region of `file_hash`.
    pub fn placeholder(file_hash: &str, hidden: HiddenRange) -> Self {
        let text = match hidden.len() {
            Some(count) => format!("... {} hidden lines ...", count),
            None => "... hidden lines ...".to_string(),
        };
        Self {
            line_code: match_line_code(file_hash, hidden.old_start, hidden.new_start),
            kind: LineKind::Match,
            old_line: None,
            new_line: None,
            text,
            hidden: Some(hidden),
            discussions: Vec::new(),
            discussions_expanded: false,
            has_form: false,
        }
    }

    pub fn is_match(&self) -> bool {
        self.kind == LineKind::Match
    }

    /// Whether this placeholder's hidden region starts at `start`.
    pub fn is_placeholder_at(&self, start: LineNumbers) -> bool {
        self.hidden.is_some_and(|h| h.start() == start)
    }

    /// Sort key following old-to-new position order.
    pub fn position(&self) -> (u32, u32) {
        match self.hidden {
            Some(h) => (h.old_start, h.new_start),
            None => (self.old_line.unwrap_or(0), self.new_line.unwrap_or(0)),
        }
    }
}

/// Synthesize a code for a real line lacking a server-assigned one.
pub fn line_code(file_hash: &str, old_line: Option<u32>, new_line: Option<u32>) -> LineCode {
    format!(
        "{}_{}_{}",
        file_hash,
        old_line.unwrap_or(0),
        new_line.unwrap_or(0)
    )
}

/// Synthesize the code of a placeholder line.
pub fn match_line_code(file_hash: &str, old_pos: u32, new_pos: u32) -> LineCode {
    format!("{}_{}_{}_match", file_hash, old_pos, new_pos)
}

/// Index of a line in its file's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub(crate) u64);

/// One row of the side-by-side projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinePair {
    pub left: Option<LineId>,
    pub right: Option<LineId>,
}

impl LinePair {
    pub fn ids(&self) -> impl Iterator<Item = LineId> {
        self.left.into_iter().chain(self.right)
    }
}
