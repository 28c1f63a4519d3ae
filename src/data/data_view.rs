use std::collections::HashMap;

use crate::data::column::Column;
use crate::data::filter::FilterSet;
use crate::data::row_store::RowStore;
use crate::data::sort::FrozenOrder;

/// The display order of a row store after filters and the frozen sort order
/// are applied. Translates between data indices (store positions) and visual
/// indices (display positions) without touching the rows themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataView {
    /// Data indices in display order
    visible_rows: Vec<usize>,

    /// Data index -> visual index
    visual_positions: HashMap<usize, usize>,

    /// Unsaved rows shown although they fail the active filters
    unmatched_unsaved: usize,
}

impl DataView {
    /// A view showing every row in store order
    pub fn new(store: &RowStore) -> Self {
        Self::from_rows((0..store.len()).collect())
    }

    /// A view over explicit data indices, already in display order
    pub fn from_rows(visible_rows: Vec<usize>) -> Self {
        let visual_positions = visible_rows
            .iter()
            .enumerate()
            .map(|(visual, &data)| (data, visual))
            .collect();
        Self {
            visible_rows,
            visual_positions,
            unmatched_unsaved: 0,
        }
    }

    /// Resolve the display order.
    ///
    /// Rows must pass `filters`. Unsaved rows are shown either way so they
    /// never vanish while being filled in, but those failing the filters are
    /// left out of `matching_count`. With a frozen order, rows it knows come
    /// first in frozen order, then every other row in store order. Without
    /// one the store order is kept.
    pub fn resolve(
        store: &RowStore,
        columns: &[Column],
        visible_columns: &[usize],
        filters: &FilterSet,
        frozen: Option<&FrozenOrder>,
    ) -> Self {
        let filtering = filters.is_active();
        let mut unmatched_unsaved = 0;
        let passing = store.rows().iter().enumerate().filter(|(_, row)| {
            if !filtering || filters.matches(row, columns, visible_columns) {
                return true;
            }
            if row.id().is_none() {
                unmatched_unsaved += 1;
                return true;
            }
            false
        });

        let Some(frozen) = frozen else {
            let mut view = Self::from_rows(passing.map(|(index, _)| index).collect());
            view.unmatched_unsaved = unmatched_unsaved;
            return view;
        };

        let mut pinned: Vec<(usize, usize)> = Vec::new();
        let mut trailing: Vec<usize> = Vec::new();
        for (index, row) in passing {
            match row.id().and_then(|id| frozen.position(&id)) {
                Some(position) => pinned.push((position, index)),
                None => trailing.push(index),
            }
        }
        pinned.sort_unstable_by_key(|&(position, _)| position);

        let mut rows: Vec<usize> = pinned.into_iter().map(|(_, index)| index).collect();
        rows.extend(trailing);
        let mut view = Self::from_rows(rows);
        view.unmatched_unsaved = unmatched_unsaved;
        view
    }

    /// Get the number of visible rows
    pub fn row_count(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_rows.is_empty()
    }

    /// Visible rows that satisfy every active filter
    pub fn matching_count(&self) -> usize {
        self.visible_rows.len() - self.unmatched_unsaved
    }

    /// Data index shown at `visual`
    pub fn visual_to_data(&self, visual: usize) -> Option<usize> {
        self.visible_rows.get(visual).copied()
    }

    /// Display position of the row at data index `data`, if it is visible
    pub fn data_to_visual(&self, data: usize) -> Option<usize> {
        self.visual_positions.get(&data).copied()
    }

    pub fn contains(&self, data: usize) -> bool {
        self.visual_positions.contains_key(&data)
    }

    /// Get visible row indices in display order
    pub fn visible_row_indices(&self) -> &[usize] {
        &self.visible_rows
    }

    /// Data indices of one page window, clamped to the view
    pub fn window(&self, offset: usize, limit: Option<usize>) -> &[usize] {
        let start = offset.min(self.visible_rows.len());
        let end = match limit {
            Some(limit) => start.saturating_add(limit).min(self.visible_rows.len()),
            None => self.visible_rows.len(),
        };
        &self.visible_rows[start..end]
    }
}
