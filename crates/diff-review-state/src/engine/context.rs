//! Replacing `match` placeholders with fetched context lines.

use std::collections::HashSet;

use super::ViewType;
use crate::error::{ApplyResult, ConsistencyError, LookupMiss, Outcome};
use crate::model::{
    line_code, ContextLinesPayload, DiffFile, ExpandDirection, HiddenRange, Line, LineKind,
    Projection,
};

/// Expands hidden regions in the projection selected at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextExpander {
    unified_lines_only: bool,
}

impl ContextExpander {
    /// `unified_lines_only` pins every expansion to the unified projection.
    pub fn new(unified_lines_only: bool) -> Self {
        Self { unified_lines_only }
    }

    /// Projection an expansion lands in for the given view type.
    pub fn target(&self, view_type: ViewType) -> Projection {
        if self.unified_lines_only {
            Projection::Unified
        } else {
            view_type.projection()
        }
    }

    /// Splice fetched lines in place of the placeholder at `payload.line_numbers`.
    ///
    /// Only the target projection changes; the other one stays as it was until
    /// it is refreshed on its own.
    pub fn expand(
        &self,
        file: &mut DiffFile,
        view_type: ViewType,
        payload: ContextLinesPayload,
    ) -> ApplyResult {
        let projection = self.target(view_type);

        let Some((index, hidden)) = locate_placeholder(file, projection, &payload) else {
            return Ok(LookupMiss::Placeholder {
                file_hash: file.file_hash.clone(),
                projection,
                line_numbers: payload.line_numbers,
            }
            .into());
        };

        let run = build_run(&file.file_hash, hidden, &payload)?;
        ensure_fresh_codes(file, projection, index, &run)?;

        log::debug!(
            "Expanding {} line(s) {:?} at {}:{} in file {}",
            payload.lines.len(),
            payload.direction,
            payload.line_numbers.old_line,
            payload.line_numbers.new_line,
            file.file_hash
        );

        match projection {
            Projection::Unified => file.splice_unified(index, run),
            Projection::SideBySide => file.splice_side_by_side(index, run),
        }
        Ok(Outcome::Applied)
    }
}

/// Find the slot of the placeholder starting at the payload's line numbers.
fn locate_placeholder(
    file: &DiffFile,
    projection: Projection,
    payload: &ContextLinesPayload,
) -> Option<(usize, HiddenRange)> {
    let start = payload.line_numbers;
    match projection {
        Projection::Unified => file.unified_lines().enumerate().find_map(|(index, line)| {
            line.is_placeholder_at(start)
                .then_some(line.hidden)
                .flatten()
                .map(|hidden| (index, hidden))
        }),
        Projection::SideBySide => {
            file.side_by_side_lines()
                .enumerate()
                .find_map(|(index, (left, right))| {
                    left.into_iter()
                        .chain(right)
                        .find(|line| line.is_placeholder_at(start))
                        .and_then(|line| line.hidden)
                        .map(|hidden| (index, hidden))
                })
        }
    }
}

/// Position the fetched lines and add the remainder placeholder, if any.
fn build_run(
    file_hash: &str,
    hidden: HiddenRange,
    payload: &ContextLinesPayload,
) -> Result<Vec<Line>, ConsistencyError> {
    let fetched = payload.lines.len();
    let count = u32::try_from(fetched).unwrap_or(u32::MAX);

    if let Some(len) = hidden.len() {
        if count > len {
            return Err(ConsistencyError::ContextOverflow {
                file_hash: file_hash.to_string(),
                fetched,
                hidden: len,
            });
        }
    }

    let (first_old, remainder) = match payload.direction {
        ExpandDirection::Down => {
            let remainder = match hidden.old_end {
                Some(old_end) => {
                    let next = hidden.old_start + count;
                    (next <= old_end)
                        .then(|| HiddenRange::closed(next, hidden.new_line_for(next), old_end))
                }
                None => payload
                    .next_line_numbers
                    .map(|next| HiddenRange::open(next.old_line, next.new_line)),
            };
            (hidden.old_start, remainder)
        }
        ExpandDirection::Up => {
            let Some(old_end) = hidden.old_end else {
                return Err(ConsistencyError::UnboundedRegion {
                    file_hash: file_hash.to_string(),
                });
            };
            let first = old_end + 1 - count;
            let remainder = (first > hidden.old_start)
                .then(|| HiddenRange::closed(hidden.old_start, hidden.new_start, first - 1));
            (first, remainder)
        }
        ExpandDirection::All => (hidden.old_start, None),
    };

    let mut lines: Vec<Line> = payload
        .lines
        .iter()
        .zip(first_old..)
        .map(|(context, old_line)| {
            let new_line = hidden.new_line_for(old_line);
            let code = context
                .line_code
                .clone()
                .unwrap_or_else(|| line_code(file_hash, Some(old_line), Some(new_line)));
            Line::new(
                code,
                LineKind::Unchanged,
                Some(old_line),
                Some(new_line),
                context.text.clone(),
            )
        })
        .collect();

    if let Some(remainder) = remainder {
        let placeholder = Line::placeholder(file_hash, remainder);
        match payload.direction {
            ExpandDirection::Up => lines.insert(0, placeholder),
            _ => lines.push(placeholder),
        }
    }

    Ok(lines)
}

/// New codes must not collide with each other or with the rest of the projection.
fn ensure_fresh_codes(
    file: &DiffFile,
    projection: Projection,
    placeholder_index: usize,
    run: &[Line],
) -> Result<(), ConsistencyError> {
    let mut existing: HashSet<&str> = match projection {
        Projection::Unified => file
            .unified_lines()
            .enumerate()
            .filter(|(index, _)| *index != placeholder_index)
            .map(|(_, line)| line.line_code.as_str())
            .collect(),
        Projection::SideBySide => file
            .side_by_side_lines()
            .enumerate()
            .filter(|(index, _)| *index != placeholder_index)
            .flat_map(|(_, (left, right))| left.into_iter().chain(right))
            .map(|line| line.line_code.as_str())
            .collect(),
    };

    for line in run {
        if !existing.insert(line.line_code.as_str()) {
            return Err(ConsistencyError::DuplicateLineCode {
                file_hash: file.file_hash.clone(),
                line_code: line.line_code.clone(),
            });
        }
    }
    Ok(())
}
