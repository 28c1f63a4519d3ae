//! Sort state and the frozen display order
//!
//! Sorting is applied once, when requested, and the resulting id order is
//! frozen. Later edits never move rows until the sort is requested again or
//! cleared.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::data::cell_value::compare_optional_values;
use crate::data::field_path::FieldPath;
use crate::data::row_store::{RowId, RowStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    #[serde(rename = "columnId")]
    pub column: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(column: &str, direction: SortDirection) -> Self {
        Self {
            column: column.to_string(),
            direction,
        }
    }
}

/// Row ids in the order they were displayed when the sort was captured
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrozenOrder {
    ids: Vec<RowId>,
    positions: HashMap<RowId, usize>,
}

impl FrozenOrder {
    pub fn from_ids(ids: Vec<RowId>) -> Self {
        let positions = ids
            .iter()
            .enumerate()
            .map(|(position, id)| (id.clone(), position))
            .collect();
        Self { ids, positions }
    }

    pub fn position(&self, id: &RowId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn ids(&self) -> &[RowId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SortController {
    keys: Vec<SortKey>,
    frozen: Option<FrozenOrder>,
    capture_pending: bool,
}

impl SortController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by a single column and capture the resulting order now
    pub fn set_sort(
        &mut self,
        column: &str,
        direction: SortDirection,
        store: &RowStore,
    ) {
        self.keys = vec![SortKey::new(column, direction)];
        self.capture(store);
    }

    /// Add (or replace) a secondary sort key and recapture
    pub fn add_sort(&mut self, column: &str, direction: SortDirection, store: &RowStore) {
        self.keys.retain(|key| key.column != column);
        self.keys.push(SortKey::new(column, direction));
        self.capture(store);
    }

    /// Restore keys (e.g. from preferences). The order is captured on the
    /// next load.
    pub fn restore_keys(&mut self, keys: Vec<SortKey>) {
        self.capture_pending = !keys.is_empty();
        self.keys = keys;
        self.frozen = None;
    }

    /// Drop both the sort keys and the frozen order
    pub fn clear_sort(&mut self) {
        debug!("SortController: clearing sort");
        self.keys.clear();
        self.frozen = None;
        self.capture_pending = false;
    }

    pub fn is_active(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn frozen(&self) -> Option<&FrozenOrder> {
        self.frozen.as_ref()
    }

    /// Ask for a recapture once fresh rows arrive
    pub fn request_capture(&mut self) {
        if self.is_active() {
            self.capture_pending = true;
        }
    }

    pub fn capture_pending(&self) -> bool {
        self.capture_pending
    }

    /// Sort every persisted row by the current keys and freeze the id order.
    /// Rows without an id are never part of the frozen order.
    pub fn capture(&mut self, store: &RowStore) {
        self.capture_pending = false;
        if self.keys.is_empty() {
            self.frozen = None;
            return;
        }

        let paths: Vec<(FieldPath, SortDirection)> = self
            .keys
            .iter()
            .map(|key| (FieldPath::parse(&key.column), key.direction))
            .collect();

        let mut order: Vec<usize> = (0..store.len())
            .filter(|&index| store.rows()[index].id().is_some())
            .collect();
        let rows = store.rows();
        // Stable sort keeps store order for ties
        order.sort_by(|&a, &b| {
            for (path, direction) in &paths {
                let cmp = direction.apply(compare_optional_values(
                    rows[a].get(path),
                    rows[b].get(path),
                ));
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            Ordering::Equal
        });

        let ids = order.into_iter().filter_map(|index| rows[index].id()).collect();
        let frozen = FrozenOrder::from_ids(ids);
        debug!(
            "SortController: captured frozen order of {} rows by {:?}",
            frozen.len(),
            self.keys
        );
        self.frozen = Some(frozen);
    }
}
