//! Fill-down and fill-right over the current selection
//!
//! The source of each group is its first cell in visual order. Targets whose
//! dropdown would not offer the source value for that row are skipped and
//! counted, never written.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::data::column::Column;
use crate::data::row_store::RowStore;
use crate::error::{GridError, GridResult};
use crate::state::selection::{CellCoord, GridLayout, Selection};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillReport {
    /// Target cells the source value was written to
    pub applied: usize,
    /// Target cells holding the source value afterwards
    pub written_cells: Vec<CellCoord>,
    /// Target cells left untouched because the value is not valid there
    pub skipped: usize,
    pub skipped_cells: Vec<CellCoord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillAxis {
    Down,
    Right,
}

/// Copy the topmost selected value of each column to the cells below it
pub fn fill_down(
    selection: &Selection,
    store: &mut RowStore,
    columns: &[Column],
    layout: &GridLayout<'_>,
) -> GridResult<FillReport> {
    fill(selection, store, columns, layout, FillAxis::Down)
}

/// Copy the leftmost selected value of each row to the cells right of it
pub fn fill_right(
    selection: &Selection,
    store: &mut RowStore,
    columns: &[Column],
    layout: &GridLayout<'_>,
) -> GridResult<FillReport> {
    fill(selection, store, columns, layout, FillAxis::Right)
}

fn fill(
    selection: &Selection,
    store: &mut RowStore,
    columns: &[Column],
    layout: &GridLayout<'_>,
    axis: FillAxis,
) -> GridResult<FillReport> {
    if selection.len() < 2 {
        return Err(GridError::SelectionTooSmall {
            needed: 2,
            found: selection.len(),
        });
    }

    // Groups keyed by visual column (down) or visual row (right); cells arrive
    // sorted by visual (row, col) so the first of each group is the source
    let mut groups: BTreeMap<usize, Vec<CellCoord>> = BTreeMap::new();
    for ((row, col), cell) in selection.visual_cells(layout) {
        let key = match axis {
            FillAxis::Down => col,
            FillAxis::Right => row,
        };
        groups.entry(key).or_default().push(cell);
    }

    let mut report = FillReport::default();
    for cells in groups.values() {
        let Some((source, targets)) = cells.split_first() else {
            continue;
        };
        let Some(value) = source_value(store, columns, source) else {
            continue;
        };
        for target in targets {
            apply(store, columns, *target, &value, &mut report);
        }
    }

    debug!(
        "Fill: {:?} applied {} cells, skipped {}",
        axis, report.applied, report.skipped
    );
    Ok(report)
}

fn source_value(store: &RowStore, columns: &[Column], cell: &CellCoord) -> Option<Value> {
    let column = columns.get(cell.col)?;
    Some(store.get(cell.row)?.value(&column.path).clone())
}

fn apply(
    store: &mut RowStore,
    columns: &[Column],
    target: CellCoord,
    value: &Value,
    report: &mut FillReport,
) {
    let Some(column) = columns.get(target.col) else {
        return;
    };
    let Some(row) = store.get(target.row) else {
        return;
    };
    if column.path.is_id() || !column.accepts(row, value) {
        report.skipped += 1;
        report.skipped_cells.push(target);
        return;
    }
    if row.value(&column.path) != value {
        store.update(target.row, &column.path, value.clone());
    }
    report.applied += 1;
    report.written_cells.push(target);
}
