use std::collections::HashMap;

use crate::data::row_store::{Row, RowId};

/// Maps a persisted row id to its position in the row store.
/// Rows without an id (not yet saved) are not indexed.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    positions: HashMap<RowId, usize>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the whole map from scratch
    pub fn rebuild(&mut self, rows: &[Row]) {
        self.positions.clear();
        self.reindex_from(0, rows);
    }

    /// Re-record positions for `rows[start..]`, used after removals shift
    /// everything past the first removed index
    pub fn reindex_from(&mut self, start: usize, rows: &[Row]) {
        for (offset, row) in rows.iter().enumerate().skip(start) {
            if let Some(id) = row.id() {
                self.positions.insert(id, offset);
            }
        }
    }

    pub fn insert(&mut self, id: RowId, position: usize) {
        self.positions.insert(id, position);
    }

    pub fn remove(&mut self, id: &RowId) {
        self.positions.remove(id);
    }

    pub fn get(&self, id: &RowId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
