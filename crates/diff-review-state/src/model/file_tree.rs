//! File tree model for navigating the files of a diff.

use serde::{Deserialize, Serialize};

use super::DiffFile;

/// Whether a tree entry is a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeEntryKind {
    Tree,
    Blob,
}

/// Node in the file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Full path from the repository root.
    pub path: String,
    /// Display name (file or directory name).
    pub name: String,
    pub kind: TreeEntryKind,
    /// Whether this directory is expanded.
    #[serde(default)]
    pub opened: bool,
    /// Hash of the diff file (for blobs).
    #[serde(default)]
    pub file_hash: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeEntry>,
}

impl TreeEntry {
    /// Create a new, expanded directory entry.
    pub fn tree(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind: TreeEntryKind::Tree,
            opened: true,
            file_hash: None,
            children: Vec::new(),
        }
    }

    /// Create a new file entry.
    pub fn blob(
        path: impl Into<String>,
        name: impl Into<String>,
        file_hash: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind: TreeEntryKind::Blob,
            opened: false,
            file_hash: Some(file_hash.into()),
            children: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == TreeEntryKind::Tree
    }

    /// Insert a file below this entry, creating intermediate directories.
    fn insert_path(&mut self, parts: &[&str], file: &DiffFile) {
        let Some((first, rest)) = parts.split_first() else {
            return;
        };

        if rest.is_empty() {
            self.children
                .push(TreeEntry::blob(&file.file_path, *first, &file.file_hash));
            return;
        }

        let dir_path = if self.path.is_empty() {
            first.to_string()
        } else {
            format!("{}/{}", self.path, first)
        };

        match self
            .children
            .iter_mut()
            .find(|c| c.is_directory() && c.name == *first)
        {
            Some(dir) => dir.insert_path(rest, file),
            None => {
                let mut dir = TreeEntry::tree(dir_path, *first);
                dir.insert_path(rest, file);
                self.children.push(dir);
            }
        }
    }

    /// Sort children recursively (directories first, then alphabetically).
    fn sort_recursive(&mut self) {
        self.children.sort_by(|a, b| match (a.is_directory(), b.is_directory()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.cmp(&b.name),
        });

        for child in &mut self.children {
            child.sort_recursive();
        }
    }

    fn find_mut(&mut self, path: &str) -> Option<&mut TreeEntry> {
        if self.path == path {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(path))
    }

    fn find(&self, path: &str) -> Option<&TreeEntry> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    fn flatten_recursive(&self, depth: usize, result: &mut Vec<FlatTreeEntry>) {
        result.push(FlatTreeEntry {
            depth,
            name: self.name.clone(),
            path: self.path.clone(),
            is_dir: self.is_directory(),
            is_expanded: self.opened,
            file_hash: self.file_hash.clone(),
        });

        if self.opened {
            for child in &self.children {
                child.flatten_recursive(depth + 1, result);
            }
        }
    }

    fn collect<'a>(&'a self, result: &mut Vec<&'a TreeEntry>) {
        result.push(self);
        for child in &self.children {
            child.collect(result);
        }
    }
}

/// The navigation tree over all files of the diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTree {
    /// Top-level entries in display order.
    #[serde(default)]
    pub roots: Vec<TreeEntry>,
}

impl FileTree {
    /// Build a tree from the store's files.
    pub fn from_files(files: &[DiffFile]) -> Self {
        let mut root = TreeEntry::tree("", "");

        for file in files {
            let parts: Vec<&str> = file.file_path.split('/').collect();
            root.insert_path(&parts, file);
        }

        root.sort_recursive();
        Self {
            roots: root.children,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Every entry, depth first.
    pub fn entries(&self) -> Vec<&TreeEntry> {
        let mut result = Vec::new();
        for root in &self.roots {
            root.collect(&mut result);
        }
        result
    }

    pub fn entry(&self, path: &str) -> Option<&TreeEntry> {
        self.roots.iter().find_map(|root| root.find(path))
    }

    /// Flip `opened` on the directory at `path`.
    ///
    /// Returns the new state, or `None` when no directory has that path.
    pub fn toggle_folder(&mut self, path: &str) -> Option<bool> {
        let entry = self
            .roots
            .iter_mut()
            .find_map(|root| root.find_mut(path))
            .filter(|entry| entry.is_directory())?;
        entry.opened = !entry.opened;
        Some(entry.opened)
    }

    /// Flatten the tree into a list for navigation (respecting opened state).
    pub fn flatten(&self) -> Vec<FlatTreeEntry> {
        let mut result = Vec::new();
        for root in &self.roots {
            root.flatten_recursive(0, &mut result);
        }
        result
    }

    /// File hashes in tree order, including those inside collapsed directories.
    pub fn file_hashes(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| entry.file_hash.clone())
            .collect()
    }
}

/// A flattened tree entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatTreeEntry {
    /// Nesting depth (0 = top level).
    pub depth: usize,
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub is_expanded: bool,
    pub file_hash: Option<String>,
}
