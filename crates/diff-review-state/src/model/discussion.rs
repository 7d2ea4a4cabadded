//! Discussion threads anchored to diff lines.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::LineCode;

/// Unique identifier of a discussion thread.
pub type DiscussionId = String;

/// A single note in a discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
}

impl Note {
    pub fn new(id: u64, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
            author: None,
        }
    }

    /// Anchor used to link directly to this note.
    pub fn anchor(&self) -> String {
        format!("note_{}", self.id)
    }
}

/// Where a discussion (or a line) sits in a specific diff version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffPosition {
    #[serde(default)]
    pub base_sha: Option<String>,
    #[serde(default)]
    pub start_sha: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
    #[serde(default)]
    pub old_path: Option<String>,
    #[serde(default)]
    pub new_path: Option<String>,
    #[serde(default)]
    pub position_type: Option<String>,
    #[serde(default)]
    pub old_line: Option<u32>,
    #[serde(default)]
    pub new_line: Option<u32>,
}

/// A threaded set of notes anchored to one or more line codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: DiscussionId,
    /// Hash of the file this discussion belongs to.
    pub file_hash: String,
    /// Primary anchor.
    #[serde(default)]
    pub line_code: Option<LineCode>,
    /// Historical aliases of the primary anchor.
    #[serde(default)]
    pub line_codes: Vec<LineCode>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub position: Option<DiffPosition>,
    #[serde(default)]
    pub original_position: Option<DiffPosition>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Discussion {
    /// Create an active, unresolved discussion anchored to `line_code`.
    pub fn new(
        id: impl Into<DiscussionId>,
        file_hash: impl Into<String>,
        line_code: impl Into<LineCode>,
    ) -> Self {
        Self {
            id: id.into(),
            file_hash: file_hash.into(),
            line_code: Some(line_code.into()),
            line_codes: Vec::new(),
            resolved: false,
            active: true,
            position: None,
            original_position: None,
            notes: Vec::new(),
        }
    }

    /// Primary anchor followed by all aliases.
    pub fn anchor_codes(&self) -> impl Iterator<Item = &str> {
        self.line_code
            .iter()
            .chain(self.line_codes.iter())
            .map(String::as_str)
    }

    pub fn is_anchored_to(&self, line_code: &str) -> bool {
        self.anchor_codes().any(|code| code == line_code)
    }

    /// An empty thread, e.g. a cancelled draft.
    pub fn is_abandoned(&self) -> bool {
        self.notes.is_empty()
    }

    /// Whether one of the notes is the target of `note_hash`.
    pub fn targets_note(&self, note_hash: &str) -> bool {
        self.notes.iter().any(|note| note.anchor() == note_hash)
    }

    /// Position compatibility between this discussion and a line of the loaded diff.
    ///
    /// `line_position` is the position the line occupies in the loaded diff
    /// version. When both recorded positions are known the line must sit at one
    /// of them; otherwise only an active discussion on the latest version can
    /// match, and only by its primary anchor.
    pub fn is_applicable_to(
        &self,
        line_code: &str,
        line_position: Option<&DiffPosition>,
        latest_diff: bool,
    ) -> bool {
        let Some(line_position) = line_position else {
            return false;
        };

        if let (Some(position), Some(original)) = (&self.position, &self.original_position) {
            return position == line_position || original == line_position;
        }

        latest_diff && self.active && self.line_code.as_deref() == Some(line_code)
    }
}

/// A discussion as held by the store, with the context it was attached with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionRecord {
    pub discussion: Discussion,
    /// Position of each line code in the diff version the discussion was loaded against.
    pub positions: HashMap<LineCode, DiffPosition>,
    /// Note anchor to force-expand, if the reviewer linked to one.
    pub note_hash: Option<String>,
}

impl DiscussionRecord {
    /// Whether the discussion applies to the line with `line_code`.
    pub fn applies_to(&self, line_code: &str, latest_diff: bool) -> bool {
        self.discussion.is_anchored_to(line_code)
            && self.discussion.is_applicable_to(
                line_code,
                self.positions.get(line_code),
                latest_diff,
            )
    }
}

/// Store-wide discussion storage, iterated in first-attach order.
#[derive(Debug, Clone, Default)]
pub struct DiscussionArena {
    records: HashMap<DiscussionId, DiscussionRecord>,
    order: Vec<DiscussionId>,
}

impl DiscussionArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, keeping the position of a replaced one.
    pub fn upsert(&mut self, record: DiscussionRecord) {
        let id = record.discussion.id.clone();
        if self.records.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&DiscussionRecord> {
        self.records.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<DiscussionRecord> {
        let record = self.records.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(record)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Ids of the discussions belonging to `file_hash`.
    pub fn ids_for_file(&self, file_hash: &str) -> Vec<DiscussionId> {
        self.iter()
            .filter(|record| record.discussion.file_hash == file_hash)
            .map(|record| record.discussion.id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscussionRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, file_hash: &str) -> DiscussionRecord {
        DiscussionRecord {
            discussion: Discussion::new(id, file_hash, format!("{}_1_1", file_hash)),
            positions: HashMap::new(),
            note_hash: None,
        }
    }

    #[test]
    fn test_arena_keeps_first_attach_order() {
        let mut arena = DiscussionArena::new();
        arena.upsert(record("b", "f"));
        arena.upsert(record("a", "f"));
        arena.upsert(record("c", "g"));

        let mut updated = record("b", "f");
        updated.discussion.resolved = true;
        arena.upsert(updated);

        assert_eq!(arena.ids_for_file("f"), vec!["b".to_string(), "a".to_string()]);
        assert!(arena.get("b").is_some_and(|r| r.discussion.resolved));

        arena.remove("b");
        assert_eq!(arena.ids_for_file("f"), vec!["a".to_string()]);
        assert_eq!(arena.len(), 2);
    }

    fn position(head: &str, new_line: u32) -> DiffPosition {
        DiffPosition {
            head_sha: Some(head.to_string()),
            new_line: Some(new_line),
            ..DiffPosition::default()
        }
    }

    #[test]
    fn test_anchor_codes() {
        let mut discussion = Discussion::new("d1", "f", "f_1_1");
        discussion.line_codes = vec!["f_1_2".to_string()];
        let anchors: Vec<_> = discussion.anchor_codes().collect();
        assert_eq!(anchors, vec!["f_1_1", "f_1_2"]);
        assert!(discussion.is_anchored_to("f_1_2"));
        assert!(!discussion.is_anchored_to("f_9_9"));
    }

    #[test]
    fn test_targets_note() {
        let mut discussion = Discussion::new("d1", "f", "f_1_1");
        discussion.notes.push(Note::new(42, "hello"));
        assert!(discussion.targets_note("note_42"));
        assert!(!discussion.targets_note("note_4"));
    }

    #[test]
    fn test_applicable_without_line_position() {
        let discussion = Discussion::new("d1", "f", "f_1_1");
        assert!(!discussion.is_applicable_to("f_1_1", None, true));
    }

    #[test]
    fn test_applicable_by_recorded_positions() {
        let mut discussion = Discussion::new("d1", "f", "f_1_1");
        discussion.position = Some(position("head2", 5));
        discussion.original_position = Some(position("head1", 3));

        assert!(discussion.is_applicable_to("f_1_1", Some(&position("head2", 5)), false));
        assert!(discussion.is_applicable_to("f_1_1", Some(&position("head1", 3)), false));
        // Stale version of the file
        assert!(!discussion.is_applicable_to("f_1_1", Some(&position("head3", 5)), true));
    }

    #[test]
    fn test_applicable_on_latest_diff_only() {
        let mut discussion = Discussion::new("d1", "f", "f_1_1");
        let line_position = position("head", 1);

        assert!(discussion.is_applicable_to("f_1_1", Some(&line_position), true));
        assert!(!discussion.is_applicable_to("f_1_1", Some(&line_position), false));
        // Aliases never match without recorded positions
        assert!(!discussion.is_applicable_to("f_1_2", Some(&line_position), true));

        discussion.active = false;
        assert!(!discussion.is_applicable_to("f_1_1", Some(&line_position), true));
    }
}
