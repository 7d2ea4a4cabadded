//! Ordered collection of the files of a diff.
//!
//! The store is the single owner of every [`DiffFile`] and of the discussion
//! arena. Files are keyed by `file_hash` and keep first-seen order; lookups by
//! hash and by path resolve to the same entity.

use crate::engine::discussions;
use crate::error::{ApplyResult, ConsistencyError, LookupMiss, Outcome};
use crate::model::{DiffBatch, DiffFile, DiffFilePayload, Discussion, DiscussionArena};

#[derive(Debug, Clone, Default)]
pub struct DiffFileStore {
    files: Vec<DiffFile>,
    discussions: DiscussionArena,
    /// Whether the loaded diff is the latest version of the change.
    latest_diff: bool,
}

impl DiffFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Queries ===

    pub fn files(&self) -> &[DiffFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_by_hash(&self, file_hash: &str) -> Option<&DiffFile> {
        self.files.iter().find(|f| f.file_hash == file_hash)
    }

    pub fn file_by_path(&self, file_path: &str) -> Option<&DiffFile> {
        self.files.iter().find(|f| f.file_path == file_path)
    }

    pub fn file_by_hash_mut(&mut self, file_hash: &str) -> Option<&mut DiffFile> {
        self.files.iter_mut().find(|f| f.file_hash == file_hash)
    }

    pub fn file_by_path_mut(&mut self, file_path: &str) -> Option<&mut DiffFile> {
        self.files.iter_mut().find(|f| f.file_path == file_path)
    }

    /// Resolve a path to the stable hash of its file.
    pub fn hash_for_path(&self, file_path: &str) -> Result<String, LookupMiss> {
        self.file_by_path(file_path)
            .map(|f| f.file_hash.clone())
            .ok_or_else(|| LookupMiss::FilePath(file_path.to_string()))
    }

    /// Whether the file is known and has lines in at least one projection.
    pub fn is_file_loaded(&self, file_hash: &str) -> bool {
        self.file_by_hash(file_hash).is_some_and(DiffFile::has_lines)
    }

    pub fn discussions(&self) -> &DiscussionArena {
        &self.discussions
    }

    pub fn discussion(&self, id: &str) -> Option<&Discussion> {
        self.discussions.get(id).map(|record| &record.discussion)
    }

    pub fn latest_diff(&self) -> bool {
        self.latest_diff
    }

    pub fn set_latest_diff(&mut self, latest_diff: bool) {
        self.latest_diff = latest_diff;
    }

    // === Mutations ===

    /// Replace every file. The discussion arena survives and is reconciled
    /// onto the new files.
    pub fn replace_all(
        &mut self,
        payloads: Vec<DiffFilePayload>,
    ) -> Result<usize, ConsistencyError> {
        let incoming = prepare(&[], payloads)?.appended;
        let count = incoming.len();
        self.files = incoming;
        self.reconcile_all();
        log::debug!("Replaced diff files with {} file(s)", count);
        Ok(count)
    }

    /// Append the files not seen yet, in arrival order.
    ///
    /// A known file that has no lines yet (listed by the metadata) is filled
    /// in place. Loaded files are left untouched, so delivering the same batch
    /// twice is a no-op. A hash reused for a different path rejects the whole
    /// batch.
    ///
    /// Returns the number of files appended or filled.
    pub fn merge_batch(
        &mut self,
        payloads: Vec<DiffFilePayload>,
    ) -> Result<usize, ConsistencyError> {
        let Prepared { appended, filled } = prepare(&self.files, payloads)?;
        let changed = appended.len() + filled.len();

        for (index, fresh) in filled {
            self.files[index].replace_content(fresh);
            self.reconcile_at(index);
        }

        let start = self.files.len();
        self.files.extend(appended);
        for index in start..self.files.len() {
            self.reconcile_at(index);
        }

        log::debug!("Merged batch: {} file(s) changed, {} total", changed, self.files.len());
        Ok(changed)
    }

    /// Replace the projections of one file with a freshly fetched copy.
    pub fn patch_file(&mut self, file_hash: &str, batch: DiffBatch) -> ApplyResult {
        let Some(index) = self.files.iter().position(|f| f.file_hash == file_hash) else {
            return Ok(LookupMiss::FileHash(file_hash.to_string()).into());
        };
        let Some(payload) = batch
            .diff_files
            .into_iter()
            .find(|payload| payload.file_hash == file_hash)
        else {
            return Ok(LookupMiss::FileHash(file_hash.to_string()).into());
        };

        let fresh = DiffFile::from_payload(payload)?;
        self.files[index].replace_content(fresh);
        self.reconcile_at(index);
        Ok(Outcome::Applied)
    }

    /// Drop every file, keeping the discussion arena.
    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Re-attach every known discussion of a file.
    pub fn reconcile(&mut self, file_hash: &str) {
        if let Some(index) = self.files.iter().position(|f| f.file_hash == file_hash) {
            self.reconcile_at(index);
        }
    }

    /// Re-attach the discussions of every file, e.g. after the diff version changed.
    pub fn reconcile_all(&mut self) {
        for index in 0..self.files.len() {
            self.reconcile_at(index);
        }
    }

    fn reconcile_at(&mut self, index: usize) {
        let latest_diff = self.latest_diff;
        discussions::reconcile_file(&mut self.files[index], &self.discussions, latest_diff);
    }

    /// Split borrow of one file and the discussion arena.
    pub(crate) fn file_with_discussions(
        &mut self,
        file_hash: &str,
    ) -> (Option<&mut DiffFile>, &mut DiscussionArena, bool) {
        let file = self.files.iter_mut().find(|f| f.file_hash == file_hash);
        (file, &mut self.discussions, self.latest_diff)
    }
}

struct Prepared {
    appended: Vec<DiffFile>,
    /// Known files without lines, by store index, with their fresh content.
    filled: Vec<(usize, DiffFile)>,
}

fn ensure_same_path(known: &DiffFile, payload: &DiffFilePayload) -> Result<(), ConsistencyError> {
    if known.file_path == payload.file_path {
        return Ok(());
    }
    Err(ConsistencyError::FileCollision {
        file_hash: payload.file_hash.clone(),
        existing_path: known.file_path.clone(),
        incoming_path: payload.file_path.clone(),
    })
}

fn has_lines(payload: &DiffFilePayload) -> bool {
    !payload.unified_lines.is_empty() || !payload.side_by_side_lines.is_empty()
}

/// Convert the payloads into files, validating before anything is stored.
fn prepare(
    existing: &[DiffFile],
    payloads: Vec<DiffFilePayload>,
) -> Result<Prepared, ConsistencyError> {
    let mut appended: Vec<DiffFile> = Vec::new();
    let mut filled: Vec<(usize, DiffFile)> = Vec::new();

    for payload in payloads {
        if let Some(index) = existing.iter().position(|f| f.file_hash == payload.file_hash) {
            let known = &existing[index];
            ensure_same_path(known, &payload)?;

            let pending = !known.has_lines() && filled.iter().all(|(i, _)| *i != index);
            if pending && has_lines(&payload) {
                filled.push((index, DiffFile::from_payload(payload)?));
            } else {
                log::debug!("Skipping already known file {}", payload.file_hash);
            }
            continue;
        }

        if let Some(known) = appended.iter().find(|f| f.file_hash == payload.file_hash) {
            ensure_same_path(known, &payload)?;
            log::debug!("Skipping duplicate file {} in batch", payload.file_hash);
            continue;
        }

        appended.push(DiffFile::from_payload(payload)?);
    }

    Ok(Prepared { appended, filled })
}
