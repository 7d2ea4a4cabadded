//! Binding discussion threads to the lines of both projections.

use std::collections::BTreeSet;

use crate::error::{ApplyResult, LookupMiss, Outcome};
use crate::model::{
    DiffFile, DiscussionArena, DiscussionId, DiscussionPayload, DiscussionRecord, LineId,
};
use crate::store::DiffFileStore;

/// Store a discussion and attach it to the lines of its file.
///
/// A discussion whose file is not loaded yet is parked in the arena and
/// attached once the file arrives.
pub fn attach(store: &mut DiffFileStore, payload: DiscussionPayload) -> ApplyResult {
    let record = DiscussionRecord::from(payload);
    let file_hash = record.discussion.file_hash.clone();
    let discussion_id = record.discussion.id.clone();

    let (file, arena, latest_diff) = store.file_with_discussions(&file_hash);
    arena.upsert(record);

    match file {
        Some(file) => {
            attach_record(file, &discussion_id, arena, latest_diff, Refresh::Holders);
        }
        None => {
            log::debug!(
                "Parked discussion {} until file {} is loaded",
                discussion_id,
                file_hash
            );
        }
    }
    Ok(Outcome::Applied)
}

/// Drop the abandoned (zero-note) discussions of a line and of the file's
/// fallback list.
pub fn detach(store: &mut DiffFileStore, file_hash: &str, line_code: &str) -> ApplyResult {
    let (file, arena, _) = store.file_with_discussions(file_hash);
    let Some(file) = file else {
        return Ok(LookupMiss::FileHash(file_hash.to_string()).into());
    };

    let slots = file.slots_with_code(line_code);
    let line_missing = slots.is_empty() && file.has_lines();

    let is_abandoned =
        |id: &DiscussionId| arena.get(id).is_some_and(|r| r.discussion.is_abandoned());

    let mut removed: BTreeSet<DiscussionId> = BTreeSet::new();
    for slot in &slots {
        if let Some(line) = file.line_mut(*slot) {
            line.discussions.retain(|id| {
                let abandoned = is_abandoned(id);
                if abandoned {
                    removed.insert(id.clone());
                }
                !abandoned
            });
        }
    }
    file.discussions.retain(|id| {
        let abandoned = is_abandoned(id);
        if abandoned {
            removed.insert(id.clone());
        }
        !abandoned
    });

    if removed.is_empty() {
        if line_missing {
            return Ok(LookupMiss::Line {
                file_hash: file_hash.to_string(),
                line_code: line_code.to_string(),
            }
            .into());
        }
        return Ok(Outcome::Unchanged);
    }

    for slot in slots {
        recompute_expanded(file, slot, arena);
    }
    for id in &removed {
        if !file.references_discussion(id) {
            log::debug!("Dropping abandoned discussion {}", id);
            arena.remove(id);
        }
    }
    Ok(Outcome::Applied)
}

/// Explicitly expand or collapse the discussions of a line.
pub fn toggle_expanded(
    store: &mut DiffFileStore,
    file_hash: &str,
    line_code: &str,
    expanded: bool,
) -> ApplyResult {
    set_line_flag(store, file_hash, line_code, expanded, |line| {
        &mut line.discussions_expanded
    })
}

/// Open or close the inline comment form of a line.
pub fn toggle_has_form(
    store: &mut DiffFileStore,
    file_hash: &str,
    line_code: &str,
    has_form: bool,
) -> ApplyResult {
    set_line_flag(store, file_hash, line_code, has_form, |line| &mut line.has_form)
}

fn set_line_flag(
    store: &mut DiffFileStore,
    file_hash: &str,
    line_code: &str,
    value: bool,
    flag: impl Fn(&mut crate::model::Line) -> &mut bool,
) -> ApplyResult {
    let Some(file) = store.file_by_hash_mut(file_hash) else {
        return Ok(LookupMiss::FileHash(file_hash.to_string()).into());
    };

    let slots = file.slots_with_code(line_code);
    if slots.is_empty() {
        return Ok(LookupMiss::Line {
            file_hash: file_hash.to_string(),
            line_code: line_code.to_string(),
        }
        .into());
    }

    let mut changed = false;
    for slot in slots {
        if let Some(line) = file.line_mut(slot) {
            let current = flag(line);
            changed |= *current != value;
            *current = value;
        }
    }
    Ok(Outcome::changed(changed))
}

/// Lines whose expansion flag is derived again after binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refresh {
    /// Every line holding the discussion.
    Holders,
    /// Only lines that gained or lost the discussion.
    Changed,
}

/// Rebuild the discussion bindings of a file from the arena.
///
/// Lines keeping the same discussions keep their expansion flag, so an
/// explicit toggle survives unrelated line writes.
pub(crate) fn reconcile_file(file: &mut DiffFile, arena: &DiscussionArena, latest_diff: bool) {
    file.discussions.clear();
    for id in arena.ids_for_file(&file.file_hash) {
        attach_record(file, &id, arena, latest_diff, Refresh::Changed);
    }
}

/// Attach one stored discussion to every applicable line of the file.
fn attach_record(
    file: &mut DiffFile,
    id: &str,
    arena: &DiscussionArena,
    latest_diff: bool,
    refresh: Refresh,
) {
    let Some(record) = arena.get(id) else {
        return;
    };

    let mut touched: Vec<LineId> = Vec::new();
    let mut bind_slot = |file: &mut DiffFile, slot: LineId, applies: bool| {
        let changed = bind(file, slot, id, applies);
        if changed || (applies && refresh == Refresh::Holders) {
            touched.push(slot);
        }
    };

    let unified = file.unified_ids().to_vec();
    for slot in unified {
        let applies = line_applies(file, slot, record, latest_diff);
        bind_slot(file, slot, applies);
    }

    let pairs = file.side_by_side_pairs().to_vec();
    for pair in pairs {
        let mut left_applies = false;
        if let Some(left) = pair.left {
            left_applies = line_applies(file, left, record, latest_diff);
            bind_slot(file, left, left_applies);
        }
        if let Some(right) = pair.right {
            let applies = !left_applies && line_applies(file, right, record, latest_diff);
            bind_slot(file, right, applies);
        }
    }

    for slot in touched {
        recompute_expanded(file, slot, arena);
    }

    if !file.has_unified() || !file.has_side_by_side() {
        file.discussions.retain(|existing| existing != id);
        file.discussions.push(id.to_string());
    }
}

fn line_applies(file: &DiffFile, slot: LineId, record: &DiscussionRecord, latest_diff: bool) -> bool {
    let Some(line) = file.line(slot) else {
        return false;
    };
    if line.is_match() || !record.discussion.is_anchored_to(&line.line_code) {
        return false;
    }
    let applies = record.applies_to(&line.line_code, latest_diff);
    if !applies {
        log::debug!(
            "Discussion {} is stale for line {} of file {}",
            record.discussion.id,
            line.line_code,
            file.file_hash
        );
    }
    applies
}

/// Add `id` to a line when it applies, remove it otherwise.
///
/// Returns whether the line's discussion set changed.
fn bind(file: &mut DiffFile, slot: LineId, id: &str, applies: bool) -> bool {
    let Some(line) = file.line_mut(slot) else {
        return false;
    };
    let held = line.discussions.iter().any(|existing| existing == id);
    match (held, applies) {
        (false, true) => line.discussions.push(id.to_string()),
        (true, false) => line.discussions.retain(|existing| existing != id),
        _ => return false,
    }
    true
}

fn recompute_expanded(file: &mut DiffFile, slot: LineId, arena: &DiscussionArena) {
    let Some(line) = file.line_mut(slot) else {
        return;
    };
    line.discussions_expanded = line
        .discussions
        .iter()
        .filter_map(|id| arena.get(id))
        .any(|record| {
            !record.discussion.resolved
                || record
                    .note_hash
                    .as_deref()
                    .is_some_and(|hash| record.discussion.targets_note(hash))
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DiffFilePayload, DiffPosition, Discussion, LinePairPayload, LinePayload, Note,
    };
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn position(new_line: u32) -> DiffPosition {
        DiffPosition {
            head_sha: Some("head".to_string()),
            new_line: Some(new_line),
            ..DiffPosition::default()
        }
    }

    fn loaded_store() -> DiffFileStore {
        let mut payload = DiffFilePayload::new("f", "f.rs");
        payload.unified_lines = vec![
            LinePayload::unchanged(1, 1, "a"),
            LinePayload::removed(2, "b"),
            LinePayload::added(2, "c"),
        ];
        payload.side_by_side_lines = vec![
            LinePairPayload::both(LinePayload::unchanged(1, 1, "a")),
            LinePairPayload::new(
                Some(LinePayload::removed(2, "b")),
                Some(LinePayload::added(2, "c")),
            ),
        ];
        let mut store = DiffFileStore::new();
        store.set_latest_diff(true);
        store.merge_batch(vec![payload]).unwrap();
        store
    }

    fn discussion_payload(id: &str, line_code: &str, notes: usize) -> DiscussionPayload {
        let mut discussion = Discussion::new(id, "f", line_code);
        discussion.notes = (0..notes as u64).map(|n| Note::new(n + 1, "note")).collect();
        let mut positions = HashMap::new();
        positions.insert(line_code.to_string(), position(1));
        DiscussionPayload {
            discussion,
            diff_position_by_line_code: positions,
            note_hash: None,
        }
    }

    fn unified_discussions(store: &DiffFileStore, code: &str) -> Vec<String> {
        store
            .file_by_hash("f")
            .unwrap()
            .unified_lines()
            .find(|l| l.line_code == code)
            .map(|l| l.discussions.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_attach_unified_and_left_only() {
        let mut store = loaded_store();
        attach(&mut store, discussion_payload("d1", "f_1_1", 1)).unwrap();

        assert_eq!(unified_discussions(&store, "f_1_1"), vec!["d1".to_string()]);
        let file = store.file_by_hash("f").unwrap();
        let (left, right) = file.side_by_side_lines().next().unwrap();
        assert_eq!(left.unwrap().discussions, vec!["d1".to_string()]);
        assert!(right.unwrap().discussions.is_empty());
        assert!(left.unwrap().discussions_expanded);
        assert!(file.discussions.is_empty());
    }

    #[test]
    fn test_reattach_does_not_duplicate() {
        let mut store = loaded_store();
        attach(&mut store, discussion_payload("d1", "f_1_1", 1)).unwrap();
        attach(&mut store, discussion_payload("d1", "f_1_1", 2)).unwrap();

        assert_eq!(unified_discussions(&store, "f_1_1"), vec!["d1".to_string()]);
        assert_eq!(store.discussion("d1").unwrap().notes.len(), 2);
    }

    #[test]
    fn test_resolved_discussion_collapses_unless_targeted() {
        let mut store = loaded_store();
        let mut payload = discussion_payload("d1", "f_1_1", 1);
        payload.discussion.resolved = true;
        attach(&mut store, payload.clone()).unwrap();

        let expanded = |store: &DiffFileStore| {
            store
                .file_by_hash("f")
                .unwrap()
                .unified_lines()
                .next()
                .unwrap()
                .discussions_expanded
        };
        assert!(!expanded(&store));

        payload.note_hash = Some("note_1".to_string());
        attach(&mut store, payload).unwrap();
        assert!(expanded(&store));
    }

    #[test]
    fn test_stale_position_is_filtered() {
        let mut store = loaded_store();
        let mut payload = discussion_payload("d1", "f_1_1", 1);
        payload.discussion.position = Some(position(7));
        payload.discussion.original_position = Some(position(8));
        attach(&mut store, payload).unwrap();

        assert!(unified_discussions(&store, "f_1_1").is_empty());
        assert!(store.discussion("d1").is_some());
    }

    #[test]
    fn test_attach_before_file_is_parked() {
        let mut store = DiffFileStore::new();
        store.set_latest_diff(true);
        attach(&mut store, discussion_payload("d1", "f_1_1", 1)).unwrap();
        assert!(store.discussion("d1").is_some());

        let mut payload = DiffFilePayload::new("f", "f.rs");
        payload.unified_lines = vec![LinePayload::unchanged(1, 1, "a")];
        payload.side_by_side_lines = vec![LinePairPayload::both(LinePayload::unchanged(1, 1, "a"))];
        store.merge_batch(vec![payload]).unwrap();

        assert_eq!(unified_discussions(&store, "f_1_1"), vec!["d1".to_string()]);
    }

    #[test]
    fn test_attach_to_unloaded_file_uses_fallback() {
        let mut store = DiffFileStore::new();
        store
            .merge_batch(vec![DiffFilePayload::new("f", "f.rs")])
            .unwrap();
        attach(&mut store, discussion_payload("d1", "f_1_1", 1)).unwrap();
        attach(&mut store, discussion_payload("d1", "f_1_1", 1)).unwrap();

        assert_eq!(
            store.file_by_hash("f").unwrap().discussions,
            vec!["d1".to_string()]
        );
    }

    #[test]
    fn test_detach_only_abandoned() {
        let mut store = loaded_store();
        attach(&mut store, discussion_payload("empty", "f_1_1", 0)).unwrap();
        attach(&mut store, discussion_payload("kept", "f_1_1", 1)).unwrap();

        let outcome = detach(&mut store, "f", "f_1_1").unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(unified_discussions(&store, "f_1_1"), vec!["kept".to_string()]);
        assert!(store.discussion("empty").is_none());

        assert_eq!(detach(&mut store, "f", "f_1_1").unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn test_detach_misses() {
        let mut store = loaded_store();
        assert_eq!(
            detach(&mut store, "nope", "x").unwrap(),
            Outcome::Skipped(LookupMiss::FileHash("nope".to_string()))
        );
        assert!(matches!(
            detach(&mut store, "f", "f_9_9").unwrap(),
            Outcome::Skipped(LookupMiss::Line { .. })
        ));
    }

    #[test]
    fn test_detach_clears_fallback_when_line_is_absent() {
        let mut payload = DiffFilePayload::new("f", "f.rs");
        payload.unified_lines = vec![LinePayload::unchanged(1, 1, "a")];
        let mut store = DiffFileStore::new();
        store.merge_batch(vec![payload]).unwrap();
        attach(&mut store, discussion_payload("draft", "f_5_5", 0)).unwrap();
        assert_eq!(
            store.file_by_hash("f").unwrap().discussions,
            vec!["draft".to_string()]
        );

        assert_eq!(detach(&mut store, "f", "f_5_5").unwrap(), Outcome::Applied);
        assert!(store.file_by_hash("f").unwrap().discussions.is_empty());
        assert!(store.discussion("draft").is_none());

        assert!(matches!(
            detach(&mut store, "f", "f_5_5").unwrap(),
            Outcome::Skipped(LookupMiss::Line { .. })
        ));
    }

    #[test]
    fn test_reconcile_keeps_explicit_collapse() {
        let mut store = loaded_store();
        attach(&mut store, discussion_payload("d1", "f_1_1", 1)).unwrap();
        toggle_expanded(&mut store, "f", "f_1_1", false).unwrap();

        store.reconcile("f");

        let line = store.file_by_hash("f").unwrap().unified_lines().next().unwrap();
        assert_eq!(line.discussions, vec!["d1".to_string()]);
        assert!(!line.discussions_expanded);

        // Attaching again derives the flag from the thread.
        attach(&mut store, discussion_payload("d1", "f_1_1", 2)).unwrap();
        let line = store.file_by_hash("f").unwrap().unified_lines().next().unwrap();
        assert!(line.discussions_expanded);
    }

    #[test]
    fn test_toggle_expanded_idempotent() {
        let mut store = loaded_store();
        assert_eq!(
            toggle_expanded(&mut store, "f", "f_1_1", true).unwrap(),
            Outcome::Applied
        );
        assert_eq!(
            toggle_expanded(&mut store, "f", "f_1_1", true).unwrap(),
            Outcome::Unchanged
        );
        let file = store.file_by_hash("f").unwrap();
        assert_eq!(
            file.slots_with_code("f_1_1")
                .into_iter()
                .filter(|id| file.line(*id).unwrap().discussions_expanded)
                .count(),
            3
        );
    }

    #[test]
    fn test_toggle_has_form() {
        let mut store = loaded_store();
        assert_eq!(
            toggle_has_form(&mut store, "f", "f_0_2", true).unwrap(),
            Outcome::Applied
        );
        let file = store.file_by_hash("f").unwrap();
        assert!(file.unified_lines().any(|l| l.line_code == "f_0_2" && l.has_form));
    }
}
