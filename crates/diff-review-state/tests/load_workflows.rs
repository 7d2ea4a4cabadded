//! Load workflows against a scripted diff source.
//!
//! Exercises: metadata + paginated batches + discussions through the engine
//! actor, batch failure bookkeeping, context fetches and full-file loads.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use diff_review_state::model::{ContextRequest, DiffPosition, Pagination};
use diff_review_state::{
    BatchLoadingState, ContextLine, DiffBatch, DiffFilePayload, DiffLoader, DiffMetadata,
    DiffSource, DiffViewEngine, Discussion, DiscussionPayload, EngineHandle, ExpandDirection,
    FullFileLines, HiddenRange, LineNumbers, LinePairPayload, LinePayload, LoadError, Note,
    Outcome, SourceError,
};
use pretty_assertions::assert_eq;

fn loaded_file(hash: &str, path: &str) -> DiffFilePayload {
    let mut payload = DiffFilePayload::new(hash, path);
    payload.unified_lines = vec![
        LinePayload::unchanged(1, 1, "fn main() {"),
        LinePayload::placeholder(HiddenRange::closed(2, 2, 30)),
        LinePayload::unchanged(31, 31, "}"),
    ];
    payload.side_by_side_lines = vec![
        LinePairPayload::both(LinePayload::unchanged(1, 1, "fn main() {")),
        LinePairPayload::both(LinePayload::placeholder(HiddenRange::closed(2, 2, 30))),
        LinePairPayload::both(LinePayload::unchanged(31, 31, "}")),
    ];
    payload
}

fn page(files: Vec<DiffFilePayload>, next_page: Option<u32>) -> DiffBatch {
    DiffBatch {
        diff_files: files,
        pagination: Some(Pagination {
            next_page,
            total_pages: Some(2),
        }),
    }
}

#[derive(Default)]
struct ScriptedSource {
    batches: HashMap<u32, DiffBatch>,
    discussions: Vec<DiscussionPayload>,
    full_file: Option<FullFileLines>,
    requested_pages: Mutex<Vec<u32>>,
    context_requests: Mutex<Vec<ContextRequest>>,
}

impl ScriptedSource {
    fn two_pages() -> Self {
        let mut batches = HashMap::new();
        batches.insert(1, page(vec![loaded_file("a", "src/a.rs")], Some(2)));
        batches.insert(2, page(vec![loaded_file("b", "src/b.rs")], None));

        let mut discussion = Discussion::new("d1", "b", "b_1_1");
        discussion.notes.push(Note::new(1, "why?"));
        let mut positions = HashMap::new();
        positions.insert("b_1_1".to_string(), DiffPosition::default());

        Self {
            batches,
            discussions: vec![DiscussionPayload {
                discussion,
                diff_position_by_line_code: positions,
                note_hash: None,
            }],
            ..Self::default()
        }
    }
}

#[async_trait]
impl DiffSource for ScriptedSource {
    async fn fetch_metadata(&self) -> Result<DiffMetadata, SourceError> {
        Ok(DiffMetadata {
            diff_files: vec![
                DiffFilePayload::new("a", "src/a.rs"),
                DiffFilePayload::new("b", "src/b.rs"),
            ],
            latest_diff: true,
            ..DiffMetadata::default()
        })
    }

    async fn fetch_batch(&self, page: u32, _per_page: u32) -> Result<DiffBatch, SourceError> {
        self.requested_pages.lock().unwrap().push(page);
        self.batches
            .get(&page)
            .cloned()
            .ok_or_else(|| SourceError::NetworkError(format!("page {} timed out", page)))
    }

    async fn fetch_discussions(&self) -> Result<Vec<DiscussionPayload>, SourceError> {
        Ok(self.discussions.clone())
    }

    async fn fetch_context_lines(
        &self,
        request: &ContextRequest,
    ) -> Result<Vec<ContextLine>, SourceError> {
        self.context_requests.lock().unwrap().push(request.clone());
        let first = request.hidden.old_start;
        Ok((first..first + request.count)
            .map(|n| ContextLine::new(format!("line {}", n)))
            .collect())
    }

    async fn fetch_full_file(&self, file_path: &str) -> Result<FullFileLines, SourceError> {
        self.full_file
            .clone()
            .ok_or_else(|| SourceError::NotFound(file_path.to_string()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

async fn full_load(source: ScriptedSource) -> DiffLoader<ScriptedSource> {
    let engine = EngineHandle::spawn(DiffViewEngine::default());
    let loader = DiffLoader::new(source, engine);
    loader.load_metadata().await.unwrap();
    loader.load_batches().await.unwrap();
    loader.load_discussions().await.unwrap();
    loader
}

#[tokio::test]
async fn metadata_batches_and_discussions() {
    let loader = full_load(ScriptedSource::two_pages()).await;

    let (order, loaded, batch_loading, retrieving, tree_paths) = loader
        .engine()
        .query(|state| {
            (
                state
                    .files()
                    .iter()
                    .map(|f| f.file_hash.clone())
                    .collect::<Vec<_>>(),
                state.files().iter().all(|f| f.has_lines()),
                state.batch_loading(),
                state.retrieving_batches(),
                state
                    .tree_entries()
                    .into_iter()
                    .map(|e| e.path)
                    .collect::<Vec<_>>(),
            )
        })
        .await
        .unwrap();

    assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
    assert!(loaded);
    assert_eq!(batch_loading, BatchLoadingState::Loaded);
    assert!(!retrieving);
    assert_eq!(
        tree_paths,
        vec!["src".to_string(), "src/a.rs".to_string(), "src/b.rs".to_string()]
    );

    let discussions = loader
        .engine()
        .query(|state| {
            state
                .file_by_hash("b")
                .and_then(|f| f.unified_lines().next())
                .map(|line| line.discussions.clone())
        })
        .await
        .unwrap();
    assert_eq!(discussions, Some(vec!["d1".to_string()]));
    assert_eq!(*loader.source().requested_pages.lock().unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn failed_page_records_error_state() {
    let mut source = ScriptedSource::two_pages();
    source.batches.remove(&2);
    let engine = EngineHandle::spawn(DiffViewEngine::default());
    let loader = DiffLoader::new(source, engine);

    let err = loader.load_batches().await.unwrap_err();
    assert!(matches!(err, LoadError::Source { what: "diff batch", .. }));

    let (files, batch_loading, retrieving) = loader
        .engine()
        .query(|state| {
            (
                state.files().len(),
                state.batch_loading(),
                state.retrieving_batches(),
            )
        })
        .await
        .unwrap();
    assert_eq!(files, 1);
    assert_eq!(batch_loading, BatchLoadingState::Error);
    assert!(!retrieving);
}

#[tokio::test]
async fn expand_context_fetches_and_splices() {
    let loader = full_load(ScriptedSource::two_pages()).await;

    let outcome = loader
        .expand_context("a", LineNumbers::new(2, 2), ExpandDirection::Down, 20)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Applied);

    let request = loader.source().context_requests.lock().unwrap()[0].clone();
    assert_eq!(request.file_path, "src/a.rs");
    assert_eq!(request.count, 20);

    let remainder = loader
        .engine()
        .query(|state| {
            state
                .file_by_hash("a")
                .and_then(|f| f.unified_lines().find(|l| l.is_match()))
                .and_then(|l| l.hidden)
        })
        .await
        .unwrap();
    assert_eq!(remainder, Some(HiddenRange::closed(22, 22, 30)));

    let missing = loader
        .expand_context("a", LineNumbers::new(2, 2), ExpandDirection::Down, 20)
        .await
        .unwrap();
    assert!(matches!(missing, Outcome::Skipped(_)));
}

#[tokio::test]
async fn full_file_load_failure_stops_loading() {
    let loader = full_load(ScriptedSource::two_pages()).await;

    let err = loader.load_full_file("src/a.rs").await.unwrap_err();
    assert!(matches!(err, LoadError::Source { what: "full file", .. }));

    let viewer = loader
        .engine()
        .query(|state| state.file_by_path("src/a.rs").map(|f| f.viewer.clone()))
        .await
        .unwrap()
        .unwrap();
    assert!(!viewer.is_loading_full_file);
    assert!(!viewer.is_showing_full_file);
}

#[tokio::test]
async fn full_file_load_replaces_both_projections() {
    let mut source = ScriptedSource::two_pages();
    let lines: Vec<LinePayload> = (1..=3)
        .map(|n| LinePayload::unchanged(n, n, format!("line {}", n)))
        .collect();
    source.full_file = Some(FullFileLines {
        unified_lines: lines.clone(),
        side_by_side_lines: lines.into_iter().map(LinePairPayload::both).collect(),
    });
    let loader = full_load(source).await;

    let outcome = loader.load_full_file("src/b.rs").await.unwrap();
    assert_eq!(outcome, Outcome::Applied);

    let (unified, side_by_side, showing, discussions) = loader
        .engine()
        .query(|state| {
            let file = state.file_by_path("src/b.rs").unwrap();
            (
                file.unified_lines().count(),
                file.side_by_side_lines().count(),
                file.viewer.is_showing_full_file,
                file.unified_lines().next().map(|l| l.discussions.clone()),
            )
        })
        .await
        .unwrap();
    assert_eq!(unified, 3);
    assert_eq!(side_by_side, 3);
    assert!(showing);
    // Discussions follow the lines they are anchored to.
    assert_eq!(discussions, Some(vec!["d1".to_string()]));
}
