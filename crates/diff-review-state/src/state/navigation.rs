//! Navigation state: current file, viewed files and the file tree.

use std::collections::BTreeSet;

use crate::error::LookupMiss;
use crate::model::{FileTree, LineCode};

/// Navigation state of the diff view.
#[derive(Debug, Clone)]
pub struct NavigationState {
    /// Hash of the file the reviewer is looking at.
    pub current_diff_file_id: Option<String>,
    /// Hashes of the files the reviewer has opened at least once.
    pub viewed_files: BTreeSet<String>,
    pub tree: FileTree,
    /// Whether tree data has been received or generated.
    pub is_tree_loaded: bool,
    /// Whether the file tree pane is visible.
    pub show_tree_list: bool,
    /// Whether the file list is rendered as a tree (false: flat list).
    pub render_tree_list: bool,
    pub file_finder_visible: bool,
    /// Line highlighted through a permalink.
    pub highlighted_row: Option<LineCode>,
}

impl NavigationState {
    pub fn new(render_tree_list: bool) -> Self {
        Self {
            current_diff_file_id: None,
            viewed_files: BTreeSet::new(),
            tree: FileTree::default(),
            is_tree_loaded: false,
            show_tree_list: true,
            render_tree_list,
            file_finder_visible: false,
            highlighted_row: None,
        }
    }

    /// Point at a file and remember it as viewed.
    pub fn view_file(&mut self, file_hash: &str) -> bool {
        let moved = self.current_diff_file_id.as_deref() != Some(file_hash);
        let first_view = self.viewed_files.insert(file_hash.to_string());
        self.current_diff_file_id = Some(file_hash.to_string());
        moved || first_view
    }

    pub fn set_tree(&mut self, tree: FileTree) {
        self.tree = tree;
        self.is_tree_loaded = true;
    }

    /// Open or close a directory of the tree.
    pub fn toggle_folder(&mut self, path: &str) -> Result<bool, LookupMiss> {
        self.tree
            .toggle_folder(path)
            .ok_or_else(|| LookupMiss::TreeEntry(path.to_string()))
    }

    /// Toggle file tree visibility.
    pub fn toggle_show_tree_list(&mut self) {
        self.show_tree_list = !self.show_tree_list;
    }

    pub fn set_render_tree_list(&mut self, render_tree_list: bool) -> bool {
        std::mem::replace(&mut self.render_tree_list, render_tree_list) != render_tree_list
    }

    pub fn set_file_finder_visible(&mut self, visible: bool) -> bool {
        std::mem::replace(&mut self.file_finder_visible, visible) != visible
    }

    pub fn set_highlighted_row(&mut self, line_code: Option<LineCode>) -> bool {
        if self.highlighted_row == line_code {
            return false;
        }
        self.highlighted_row = line_code;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiffFile;

    #[test]
    fn test_view_file() {
        let mut nav = NavigationState::new(true);
        assert!(nav.view_file("a"));
        assert!(!nav.view_file("a"));
        assert!(nav.view_file("b"));
        assert_eq!(nav.current_diff_file_id.as_deref(), Some("b"));
        assert_eq!(nav.viewed_files.len(), 2);
    }

    #[test]
    fn test_toggle_folder() {
        let mut nav = NavigationState::new(true);
        nav.set_tree(FileTree::from_files(&[DiffFile::new("a", "src/a.rs")]));
        assert!(nav.is_tree_loaded);

        assert_eq!(nav.toggle_folder("src"), Ok(false));
        assert_eq!(
            nav.toggle_folder("docs"),
            Err(LookupMiss::TreeEntry("docs".to_string()))
        );
    }

    #[test]
    fn test_flags() {
        let mut nav = NavigationState::new(false);
        nav.toggle_show_tree_list();
        assert!(!nav.show_tree_list);

        assert!(nav.set_render_tree_list(true));
        assert!(!nav.set_render_tree_list(true));

        assert!(nav.set_file_finder_visible(true));
        assert!(nav.set_highlighted_row(Some("a_1_1".to_string())));
        assert!(!nav.set_highlighted_row(Some("a_1_1".to_string())));
    }
}
