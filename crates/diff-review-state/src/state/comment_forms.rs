//! Per-file comment drafts.

use serde::{Deserialize, Serialize};

use crate::error::LookupMiss;
use crate::model::LineCode;

/// A draft comment on a file, keyed by `file_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentForm {
    pub file_hash: String,
    #[serde(default)]
    pub line_code: Option<LineCode>,
    #[serde(default)]
    pub note: String,
}

impl CommentForm {
    pub fn new(file_hash: impl Into<String>) -> Self {
        Self {
            file_hash: file_hash.into(),
            line_code: None,
            note: String::new(),
        }
    }
}

/// Open comment forms, at most one per file.
#[derive(Debug, Clone, Default)]
pub struct CommentForms {
    forms: Vec<CommentForm>,
}

impl CommentForms {
    /// Open a form, replacing an open form of the same file.
    pub fn open(&mut self, form: CommentForm) {
        match self.forms.iter_mut().find(|f| f.file_hash == form.file_hash) {
            Some(existing) => *existing = form,
            None => self.forms.push(form),
        }
    }

    /// Replace the draft of a file that already has a form open.
    pub fn update(&mut self, form: CommentForm) -> Result<bool, LookupMiss> {
        let existing = self
            .forms
            .iter_mut()
            .find(|f| f.file_hash == form.file_hash)
            .ok_or_else(|| LookupMiss::CommentForm(form.file_hash.clone()))?;
        let changed = *existing != form;
        *existing = form;
        Ok(changed)
    }

    /// Close the form of a file; returns whether one was open.
    pub fn close(&mut self, file_hash: &str) -> bool {
        let before = self.forms.len();
        self.forms.retain(|f| f.file_hash != file_hash);
        self.forms.len() != before
    }

    pub fn get(&self, file_hash: &str) -> Option<&CommentForm> {
        self.forms.iter().find(|f| f.file_hash == file_hash)
    }

    pub fn all(&self) -> &[CommentForm] {
        &self.forms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_replaces_same_file() {
        let mut forms = CommentForms::default();
        forms.open(CommentForm::new("a"));
        forms.open(CommentForm {
            note: "draft".to_string(),
            ..CommentForm::new("a")
        });
        forms.open(CommentForm::new("b"));

        assert_eq!(forms.all().len(), 2);
        assert_eq!(forms.get("a").unwrap().note, "draft");
    }

    #[test]
    fn test_update_requires_open_form() {
        let mut forms = CommentForms::default();
        assert_eq!(
            forms.update(CommentForm::new("a")),
            Err(LookupMiss::CommentForm("a".to_string()))
        );

        forms.open(CommentForm::new("a"));
        let edited = CommentForm {
            note: "text".to_string(),
            ..CommentForm::new("a")
        };
        assert_eq!(forms.update(edited.clone()), Ok(true));
        assert_eq!(forms.update(edited), Ok(false));
    }

    #[test]
    fn test_close() {
        let mut forms = CommentForms::default();
        forms.open(CommentForm::new("a"));
        assert!(forms.close("a"));
        assert!(!forms.close("a"));
        assert!(forms.all().is_empty());
    }
}
