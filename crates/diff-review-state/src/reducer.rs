//! Applying commands to the state.
//!
//! Every arm validates before it mutates, so a command either fully applies
//! or leaves the state as it was.

use crate::command::Command;
use crate::engine::{collapse, discussions, projector};
use crate::error::{ApplyResult, LookupMiss, Outcome};
use crate::model::{DiffFile, Projection, ProjectionRows};
use crate::state::{DiffSize, DiffState};

pub fn apply(state: &mut DiffState, command: Command) -> ApplyResult {
    match command {
        // === Configuration and loading ===
        Command::SetBaseConfig(base_config) => {
            let changed = state.base_config != base_config;
            state.base_config = base_config;
            Ok(Outcome::changed(changed))
        }
        Command::SetLoading(is_loading) => Ok(Outcome::changed(
            std::mem::replace(&mut state.is_loading, is_loading) != is_loading,
        )),
        Command::SetBatchLoading(batch_loading) => Ok(Outcome::changed(
            std::mem::replace(&mut state.batch_loading, batch_loading) != batch_loading,
        )),
        Command::SetRetrievingBatches(retrieving) => Ok(Outcome::changed(
            std::mem::replace(&mut state.retrieving_batches, retrieving) != retrieving,
        )),
        Command::SetDiffMetadata(metadata) => {
            let previous_latest = state.store.latest_diff();
            let version_changed = previous_latest != metadata.latest_diff;
            state.store.set_latest_diff(metadata.latest_diff);
            if let Err(err) = state.store.merge_batch(metadata.diff_files) {
                state.store.set_latest_diff(previous_latest);
                return Err(err);
            }
            if version_changed {
                state.store.reconcile_all();
            }
            state.merge_request_diffs = metadata.merge_request_diffs;
            state.diff_size = DiffSize {
                real_size: metadata.real_size,
                size: metadata.size,
            };
            Ok(Outcome::Applied)
        }
        Command::SetDiffFiles(files) => {
            state.store.replace_all(files)?;
            Ok(Outcome::Applied)
        }
        Command::MergeDiffBatch(batch) => {
            let changed = state.store.merge_batch(batch.diff_files)?;
            Ok(Outcome::changed(changed > 0))
        }
        Command::SetCoverageData(coverage) => {
            state.coverage = Some(coverage);
            Ok(Outcome::Applied)
        }
        Command::SetMergeRequestDiffs(diffs) => {
            let changed = state.merge_request_diffs != diffs;
            state.merge_request_diffs = diffs;
            Ok(Outcome::changed(changed))
        }
        Command::SetShowWhitespace(show_whitespace) => {
            state.show_whitespace = show_whitespace;
            state.store.clear();
            Ok(Outcome::Applied)
        }
        Command::SetDiffViewType(view_type) => Ok(Outcome::changed(
            std::mem::replace(&mut state.view_type, view_type) != view_type,
        )),

        // === Lines and discussions ===
        Command::AddContextLines(payload) => {
            let expander = state.expander;
            let view_type = state.view_type;
            let file_hash = payload.file_hash.clone();
            let Some(file) = state.store.file_by_hash_mut(&file_hash) else {
                return Ok(LookupMiss::FileHash(file_hash).into());
            };
            let outcome = expander.expand(file, view_type, payload)?;
            if outcome.is_applied() {
                state.store.reconcile(&file_hash);
            }
            Ok(outcome)
        }
        Command::AddCollapsedDiffs { file_hash, batch } => {
            state.store.patch_file(&file_hash, batch)
        }
        Command::SetLineDiscussionsForFile(payload) => {
            discussions::attach(&mut state.store, payload)
        }
        Command::RemoveLineDiscussionsForFile {
            file_hash,
            line_code,
        } => discussions::detach(&mut state.store, &file_hash, &line_code),
        Command::ToggleLineDiscussions {
            file_hash,
            line_code,
            expanded,
        } => discussions::toggle_expanded(&mut state.store, &file_hash, &line_code, expanded),
        Command::ToggleLineHasForm {
            file_hash,
            line_code,
            has_form,
        } => discussions::toggle_has_form(&mut state.store, &file_hash, &line_code, has_form),

        // === Navigation and transient state ===
        Command::ViewDiffFile { file_hash } => {
            Ok(Outcome::changed(state.navigation.view_file(&file_hash)))
        }
        Command::SetTreeData(tree) => {
            state.navigation.set_tree(tree);
            Ok(Outcome::Applied)
        }
        Command::ToggleFolderOpen { path } => match state.navigation.toggle_folder(&path) {
            Ok(_) => Ok(Outcome::Applied),
            Err(miss) => Ok(miss.into()),
        },
        Command::ToggleShowTreeList => {
            state.navigation.toggle_show_tree_list();
            Ok(Outcome::Applied)
        }
        Command::SetRenderTreeList(render_tree_list) => Ok(Outcome::changed(
            state.navigation.set_render_tree_list(render_tree_list),
        )),
        Command::ToggleFileFinderVisible(visible) => Ok(Outcome::changed(
            state.navigation.set_file_finder_visible(visible),
        )),
        Command::SetHighlightedRow { line_code } => Ok(Outcome::changed(
            state.navigation.set_highlighted_row(line_code),
        )),
        Command::OpenCommentForm(form) => {
            state.comment_forms.open(form);
            Ok(Outcome::Applied)
        }
        Command::UpdateCommentForm(form) => match state.comment_forms.update(form) {
            Ok(changed) => Ok(Outcome::changed(changed)),
            Err(miss) => Ok(miss.into()),
        },
        Command::CloseCommentForm { file_hash } => {
            Ok(Outcome::changed(state.comment_forms.close(&file_hash)))
        }
        Command::DismissSuggestPopover => Ok(Outcome::changed(std::mem::replace(
            &mut state.base_config.show_suggest_popover,
            false,
        ))),

        // === Collapse and full file ===
        Command::RenderFile { file_hash } => match state.store.file_by_hash_mut(&file_hash) {
            Some(file) => Ok(collapse::render_file(&mut file.viewer)),
            None => Ok(LookupMiss::FileHash(file_hash).into()),
        },
        Command::SetFileCollapsed {
            file_path,
            collapsed,
            trigger,
        } => with_file_at(state, &file_path, |file| {
            Ok(collapse::set_collapsed(&mut file.viewer, collapsed, trigger))
        }),
        Command::SetDiffFileViewer { file_path, viewer } => {
            with_file_at(state, &file_path, |file| {
                let changed = file.viewer != viewer;
                file.viewer = viewer;
                Ok(Outcome::changed(changed))
            })
        }
        Command::RequestFullDiff { file_path } => with_file_at(state, &file_path, |file| {
            Ok(collapse::request_full_file(&mut file.viewer))
        }),
        Command::ReceiveFullDiffSuccess { file_path } => {
            with_file_at(state, &file_path, |file| {
                Ok(collapse::receive_full_file_success(&mut file.viewer))
            })
        }
        Command::ReceiveFullDiffError { file_path } => with_file_at(state, &file_path, |file| {
            Ok(collapse::receive_full_file_error(&mut file.viewer))
        }),

        // === Projections ===
        Command::SetCurrentViewDiffFileLines { file_path, lines } => {
            let target = state.current_projection();
            write_lines(state, &file_path, target, lines)
        }
        Command::SetHiddenViewDiffFileLines { file_path, lines } => {
            let target = state.hidden_projection();
            write_lines(state, &file_path, target, lines)
        }
        Command::AddCurrentViewDiffFileLine { file_path, line } => {
            let target = state.current_projection();
            let outcome = with_file_at(state, &file_path, |file| {
                projector::append_line(file, target, line)?;
                Ok(Outcome::Applied)
            })?;
            if outcome.is_applied() {
                reconcile_path(state, &file_path);
            }
            Ok(outcome)
        }
        Command::ToggleDiffFileRenderingMore { file_path } => {
            with_file_at(state, &file_path, |file| {
                projector::toggle_rendering_more(file);
                Ok(Outcome::Applied)
            })
        }
    }
}

/// Run `f` on the file at `file_path`, or report the miss.
fn with_file_at(
    state: &mut DiffState,
    file_path: &str,
    f: impl FnOnce(&mut DiffFile) -> ApplyResult,
) -> ApplyResult {
    match state.store.file_by_path_mut(file_path) {
        Some(file) => f(file),
        None => Ok(LookupMiss::FilePath(file_path.to_string()).into()),
    }
}

fn write_lines(
    state: &mut DiffState,
    file_path: &str,
    target: Projection,
    lines: ProjectionRows,
) -> ApplyResult {
    let outcome = with_file_at(state, file_path, |file| {
        projector::set_lines(file, target, lines)?;
        Ok(Outcome::Applied)
    })?;
    if outcome.is_applied() {
        reconcile_path(state, file_path);
    }
    Ok(outcome)
}

fn reconcile_path(state: &mut DiffState, file_path: &str) {
    if let Ok(file_hash) = state.store.hash_for_path(file_path) {
        state.store.reconcile(&file_hash);
    }
}
