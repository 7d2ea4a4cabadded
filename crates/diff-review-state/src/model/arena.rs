//! Per-file line storage addressed by [`LineId`].

use std::collections::HashMap;

use super::{Line, LineId};

/// Owns every line of one file; projections refer to lines by id.
#[derive(Debug, Clone, Default)]
pub struct LineArena {
    slots: HashMap<LineId, Line>,
    next_id: u64,
}

impl LineArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a line and return its id.
    pub fn insert(&mut self, line: Line) -> LineId {
        let id = LineId(self.next_id);
        self.next_id += 1;
        self.slots.insert(id, line);
        id
    }

    pub fn get(&self, id: LineId) -> Option<&Line> {
        self.slots.get(&id)
    }

    pub fn get_mut(&mut self, id: LineId) -> Option<&mut Line> {
        self.slots.get_mut(&id)
    }

    /// Drop a line that no projection refers to anymore.
    pub fn remove(&mut self, id: LineId) -> Option<Line> {
        self.slots.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineKind;

    #[test]
    fn test_ids_are_never_reused() {
        let mut arena = LineArena::new();
        let a = arena.insert(Line::new("f_1_1", LineKind::Unchanged, Some(1), Some(1), "a"));
        arena.remove(a);
        let b = arena.insert(Line::new("f_1_1", LineKind::Unchanged, Some(1), Some(1), "a"));
        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.len(), 1);
    }
}
