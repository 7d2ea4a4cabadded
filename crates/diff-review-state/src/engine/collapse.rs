//! Collapse and full-file lifecycle of a file's viewer.

use serde::{Deserialize, Serialize};

use crate::error::Outcome;
use crate::model::ViewerState;

/// What caused a collapse change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseTrigger {
    /// The reviewer toggled the file.
    Manual,
    /// A heuristic (generated or very large file).
    Automatic,
}

/// Apply a collapse change.
///
/// Manual intent overrides the heuristic: an automatic change is ignored while
/// the reviewer's choice is recorded. A file left expanded is released for
/// rendering.
pub fn set_collapsed(viewer: &mut ViewerState, collapsed: bool, trigger: CollapseTrigger) -> Outcome {
    let before = viewer.clone();

    match trigger {
        CollapseTrigger::Manual => {
            viewer.manually_collapsed = Some(collapsed);
            viewer.automatically_collapsed = false;
        }
        CollapseTrigger::Automatic => {
            if viewer.manually_collapsed.is_some() {
                log::debug!("Ignoring automatic collapse, reviewer choice is recorded");
                return Outcome::Unchanged;
            }
            viewer.automatically_collapsed = collapsed;
        }
    }

    if !viewer.is_collapsed() {
        viewer.render_ready = true;
    }
    Outcome::changed(*viewer != before)
}

/// Mark the file as released for heavy rendering.
pub fn render_file(viewer: &mut ViewerState) -> Outcome {
    Outcome::changed(!std::mem::replace(&mut viewer.render_ready, true))
}

pub fn request_full_file(viewer: &mut ViewerState) -> Outcome {
    Outcome::changed(!std::mem::replace(&mut viewer.is_loading_full_file, true))
}

pub fn receive_full_file_success(viewer: &mut ViewerState) -> Outcome {
    let before = viewer.clone();
    viewer.is_loading_full_file = false;
    viewer.is_showing_full_file = true;
    Outcome::changed(*viewer != before)
}

/// A failed load only stops the loading state; the caller decides on a retry.
pub fn receive_full_file_error(viewer: &mut ViewerState) -> Outcome {
    Outcome::changed(std::mem::replace(&mut viewer.is_loading_full_file, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_expand_clears_automatic() {
        let mut viewer = ViewerState {
            automatically_collapsed: true,
            ..ViewerState::default()
        };

        let outcome = set_collapsed(&mut viewer, false, CollapseTrigger::Manual);
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(viewer.manually_collapsed, Some(false));
        assert!(!viewer.automatically_collapsed);
        assert!(viewer.render_ready);
    }

    #[test]
    fn test_automatic_ignored_after_manual() {
        let mut viewer = ViewerState::default();
        set_collapsed(&mut viewer, false, CollapseTrigger::Manual);

        let outcome = set_collapsed(&mut viewer, true, CollapseTrigger::Automatic);
        assert_eq!(outcome, Outcome::Unchanged);
        assert!(!viewer.is_collapsed());
        assert!(!viewer.automatically_collapsed);
    }

    #[test]
    fn test_automatic_collapse() {
        let mut viewer = ViewerState::default();
        set_collapsed(&mut viewer, true, CollapseTrigger::Automatic);
        assert!(viewer.is_collapsed());
        assert!(!viewer.render_ready);
    }

    #[test]
    fn test_full_file_lifecycle() {
        let mut viewer = ViewerState::default();
        assert_eq!(request_full_file(&mut viewer), Outcome::Applied);
        assert!(viewer.is_loading_full_file);

        assert_eq!(receive_full_file_error(&mut viewer), Outcome::Applied);
        assert!(!viewer.is_loading_full_file);
        assert!(!viewer.is_showing_full_file);
        assert_eq!(receive_full_file_error(&mut viewer), Outcome::Unchanged);

        request_full_file(&mut viewer);
        assert_eq!(receive_full_file_success(&mut viewer), Outcome::Applied);
        assert!(!viewer.is_loading_full_file);
        assert!(viewer.is_showing_full_file);
    }

    #[test]
    fn test_render_file() {
        let mut viewer = ViewerState::default();
        assert_eq!(render_file(&mut viewer), Outcome::Applied);
        assert_eq!(render_file(&mut viewer), Outcome::Unchanged);
    }
}
