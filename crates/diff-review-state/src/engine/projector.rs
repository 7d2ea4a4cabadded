//! Routing of projection writes by view type.
//!
//! The current projection is the one the reviewer sees; the hidden one is
//! kept in sync in the background.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConsistencyError;
use crate::model::{DiffFile, Line, LinePairPayload, Projection, ProjectionRow, ProjectionRows};

/// How the diff is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    #[default]
    Inline,
    SideBySide,
}

impl ViewType {
    /// Projection rendered in this view type.
    pub fn projection(self) -> Projection {
        match self {
            ViewType::Inline => Projection::Unified,
            ViewType::SideBySide => Projection::SideBySide,
        }
    }

    /// Projection kept in sync but not rendered.
    pub fn hidden_projection(self) -> Projection {
        self.projection().other()
    }
}

/// Replace all lines of the `target` projection.
pub fn set_lines(
    file: &mut DiffFile,
    target: Projection,
    rows: ProjectionRows,
) -> Result<(), ConsistencyError> {
    check_kind(target, rows.projection())?;
    let file_hash = file.file_hash.clone();

    match rows {
        ProjectionRows::Unified(lines) => {
            let lines: Vec<Line> = lines.into_iter().map(|l| l.into_line(&file_hash)).collect();
            ensure_unique(&file_hash, lines.iter().map(|l| vec![l.line_code.as_str()]))?;
            file.set_unified(lines);
        }
        ProjectionRows::SideBySide(pairs) => {
            let rows = pair_lines(&file_hash, pairs);
            ensure_unique(&file_hash, rows.iter().map(row_codes))?;
            file.set_side_by_side(rows);
        }
    }
    Ok(())
}

/// Append one row to the `target` projection.
pub fn append_line(
    file: &mut DiffFile,
    target: Projection,
    row: ProjectionRow,
) -> Result<(), ConsistencyError> {
    check_kind(target, row.projection())?;
    let file_hash = file.file_hash.clone();
    let existing: HashSet<String> = match target {
        Projection::Unified => file.unified_lines().map(|l| l.line_code.clone()).collect(),
        Projection::SideBySide => file
            .side_by_side_lines()
            .flat_map(|(left, right)| left.into_iter().chain(right))
            .map(|l| l.line_code.clone())
            .collect(),
    };

    match row {
        ProjectionRow::Unified(line) => {
            let line = line.into_line(&file_hash);
            reject_known(&file_hash, &existing, &line)?;
            file.push_unified(line);
        }
        ProjectionRow::SideBySide(pair) => {
            let left = pair.left.map(|l| l.into_line(&file_hash));
            let right = pair.right.map(|l| l.into_line(&file_hash));
            for line in left.iter().chain(right.iter()) {
                reject_known(&file_hash, &existing, line)?;
            }
            file.push_side_by_side(left, right);
        }
    }
    Ok(())
}

/// Flip the "rendering more lines" flag of a file.
pub fn toggle_rendering_more(file: &mut DiffFile) {
    file.viewer.rendering_more_lines = !file.viewer.rendering_more_lines;
}

fn check_kind(expected: Projection, found: Projection) -> Result<(), ConsistencyError> {
    if expected != found {
        return Err(ConsistencyError::ProjectionKind { expected, found });
    }
    Ok(())
}

fn pair_lines(file_hash: &str, pairs: Vec<LinePairPayload>) -> Vec<(Option<Line>, Option<Line>)> {
    pairs
        .into_iter()
        .map(|pair| {
            (
                pair.left.map(|l| l.into_line(file_hash)),
                pair.right.map(|l| l.into_line(file_hash)),
            )
        })
        .collect()
}

fn row_codes(row: &(Option<Line>, Option<Line>)) -> Vec<&str> {
    let mut codes: Vec<&str> = row
        .0
        .iter()
        .chain(row.1.iter())
        .map(|l| l.line_code.as_str())
        .collect();
    codes.dedup();
    codes
}

/// Codes must be unique across rows; both sides of one row may share a code.
fn ensure_unique<'a>(
    file_hash: &str,
    rows: impl Iterator<Item = Vec<&'a str>>,
) -> Result<(), ConsistencyError> {
    let mut seen = HashSet::new();
    for code in rows.flatten() {
        if !seen.insert(code) {
            return Err(ConsistencyError::DuplicateLineCode {
                file_hash: file_hash.to_string(),
                line_code: code.to_string(),
            });
        }
    }
    Ok(())
}

fn reject_known(
    file_hash: &str,
    existing: &HashSet<String>,
    line: &Line,
) -> Result<(), ConsistencyError> {
    if existing.contains(&line.line_code) {
        return Err(ConsistencyError::DuplicateLineCode {
            file_hash: file_hash.to_string(),
            line_code: line.line_code.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinePayload;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_view_type_projections() {
        assert_eq!(ViewType::Inline.projection(), Projection::Unified);
        assert_eq!(ViewType::Inline.hidden_projection(), Projection::SideBySide);
        assert_eq!(ViewType::SideBySide.projection(), Projection::SideBySide);
        assert_eq!(ViewType::SideBySide.hidden_projection(), Projection::Unified);
    }

    #[test]
    fn test_set_lines_wrong_kind() {
        let mut file = DiffFile::new("f", "f.rs");
        let err = set_lines(
            &mut file,
            Projection::SideBySide,
            ProjectionRows::Unified(vec![LinePayload::added(1, "a")]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConsistencyError::ProjectionKind {
                expected: Projection::SideBySide,
                found: Projection::Unified,
            }
        );
        assert!(!file.has_lines());
    }

    #[test]
    fn test_set_lines_rejects_duplicates() {
        let mut file = DiffFile::new("f", "f.rs");
        let result = set_lines(
            &mut file,
            Projection::Unified,
            ProjectionRows::Unified(vec![LinePayload::added(1, "a"), LinePayload::added(1, "b")]),
        );
        assert!(matches!(result, Err(ConsistencyError::DuplicateLineCode { .. })));
        assert!(!file.has_lines());
    }

    #[test]
    fn test_set_side_by_side_allows_shared_row_code() {
        let mut file = DiffFile::new("f", "f.rs");
        set_lines(
            &mut file,
            Projection::SideBySide,
            ProjectionRows::SideBySide(vec![LinePairPayload::both(LinePayload::unchanged(
                1, 1, "a",
            ))]),
        )
        .unwrap();
        assert_eq!(file.side_by_side_pairs().len(), 1);
    }

    #[test]
    fn test_append_line() {
        let mut file = DiffFile::new("f", "f.rs");
        append_line(
            &mut file,
            Projection::Unified,
            ProjectionRow::Unified(LinePayload::added(1, "a")),
        )
        .unwrap();
        let again = append_line(
            &mut file,
            Projection::Unified,
            ProjectionRow::Unified(LinePayload::added(1, "a")),
        );
        assert!(again.is_err());
        assert_eq!(file.unified_lines().count(), 1);
    }

    #[test]
    fn test_toggle_rendering_more() {
        let mut file = DiffFile::new("f", "f.rs");
        toggle_rendering_more(&mut file);
        assert!(file.viewer.rendering_more_lines);
        toggle_rendering_more(&mut file);
        assert!(!file.viewer.rendering_more_lines);
    }
}
