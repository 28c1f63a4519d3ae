//! Cell selection, the current cell and keyboard navigation
//!
//! Coordinates are always stored as data indices so a selection stays on
//! the same cells when the display order changes. Ranges and navigation are
//! computed in visual space through a `GridLayout`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;
use tracing::trace;

use crate::data::data_view::DataView;

/// A cell addressed by row-store index and column index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A set of cells that follows row removals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellSet {
    cells: BTreeSet<CellCoord>,
}

impl CellSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cell: CellCoord) -> bool {
        self.cells.insert(cell)
    }

    pub fn remove(&mut self, cell: &CellCoord) -> bool {
        self.cells.remove(cell)
    }

    pub fn contains(&self, cell: &CellCoord) -> bool {
        self.cells.contains(cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellCoord> {
        self.cells.iter()
    }

    /// Drop cells whose row no longer exists
    pub fn prune(&mut self, row_count: usize) {
        self.cells.retain(|cell| cell.row < row_count);
    }

    /// Drop cells on `removed` rows (ascending) and shift the rest up
    pub fn remove_rows(&mut self, removed: &[usize]) {
        if removed.is_empty() {
            return;
        }
        self.cells = self
            .cells
            .iter()
            .filter_map(|cell| shift_row(cell.row, removed).map(|row| CellCoord::new(row, cell.col)))
            .collect();
    }
}

impl FromIterator<CellCoord> for CellSet {
    fn from_iter<I: IntoIterator<Item = CellCoord>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// New index of `row` after `removed` (ascending) rows are taken out
fn shift_row(row: usize, removed: &[usize]) -> Option<usize> {
    if removed.binary_search(&row).is_ok() {
        return None;
    }
    Some(row - removed.partition_point(|&r| r < row))
}

/// What the visible grid looks like right now: the resolved row order and
/// the visible column order
#[derive(Debug, Clone, Copy)]
pub struct GridLayout<'a> {
    pub view: &'a DataView,
    pub columns: &'a [usize],
}

impl<'a> GridLayout<'a> {
    pub fn new(view: &'a DataView, columns: &'a [usize]) -> Self {
        Self { view, columns }
    }

    pub fn row_count(&self) -> usize {
        self.view.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Visual (row, column) position of a data cell, if it is on screen
    pub fn visual_position(&self, cell: &CellCoord) -> Option<(usize, usize)> {
        let row = self.view.data_to_visual(cell.row)?;
        let col = self.columns.iter().position(|&c| c == cell.col)?;
        Some((row, col))
    }

    /// Data cell at a visual (row, column) position
    pub fn data_cell(&self, visual_row: usize, visual_col: usize) -> Option<CellCoord> {
        let row = self.view.visual_to_data(visual_row)?;
        let col = *self.columns.get(visual_col)?;
        Some(CellCoord::new(row, col))
    }
}

/// Inclusive rectangle in visual coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualRect {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl VisualRect {
    pub fn spanning(a: (usize, usize), b: (usize, usize)) -> Self {
        Self {
            top: a.0.min(b.0),
            bottom: a.0.max(b.0),
            left: a.1.min(b.1),
            right: a.1.max(b.1),
        }
    }

    pub fn height(&self) -> usize {
        self.bottom - self.top + 1
    }

    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Where keyboard input should go next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusIntent {
    #[default]
    Grid,
    Editor(CellCoord),
    Dropdown(CellCoord),
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    cells: CellSet,
    anchor: Option<CellCoord>,
    focus: Option<CellCoord>,
    current: Option<CellCoord>,
    focus_intent: FocusIntent,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &CellSet {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_multi(&self) -> bool {
        self.cells.len() > 1
    }

    pub fn contains(&self, cell: &CellCoord) -> bool {
        self.cells.contains(cell)
    }

    pub fn current(&self) -> Option<CellCoord> {
        self.current
    }

    pub fn anchor(&self) -> Option<CellCoord> {
        self.anchor
    }

    pub fn focus(&self) -> Option<CellCoord> {
        self.focus
    }

    pub fn focus_intent(&self) -> FocusIntent {
        self.focus_intent
    }

    /// Plain click: select exactly one cell
    pub fn select_single(&mut self, cell: CellCoord) {
        trace!("Selection: select {:?}", cell);
        self.cells.clear();
        self.cells.insert(cell);
        self.anchor = Some(cell);
        self.focus = Some(cell);
        self.current = Some(cell);
        self.focus_intent = FocusIntent::Grid;
    }

    /// Ctrl-click: add or remove one cell, keeping the rest
    pub fn toggle_cell(&mut self, cell: CellCoord) {
        if !self.cells.remove(&cell) {
            self.cells.insert(cell);
            self.anchor = Some(cell);
        }
        self.focus = Some(cell);
        self.current = Some(cell);
    }

    /// Shift-click: select the visual rectangle between `anchor` and `focus`.
    /// Falls back to a single selection when either end is not visible.
    pub fn extend_range(&mut self, anchor: CellCoord, focus: CellCoord, layout: &GridLayout<'_>) {
        let (Some(from), Some(to)) = (layout.visual_position(&anchor), layout.visual_position(&focus))
        else {
            self.select_single(focus);
            return;
        };

        let rect = VisualRect::spanning(from, to);
        self.cells = (rect.top..=rect.bottom)
            .flat_map(|row| (rect.left..=rect.right).map(move |col| (row, col)))
            .filter_map(|(row, col)| layout.data_cell(row, col))
            .collect();
        self.anchor = Some(anchor);
        self.focus = Some(focus);
        self.current = Some(focus);
    }

    /// Extend from the existing anchor (or the current cell) to `cell`
    pub fn extend_to(&mut self, cell: CellCoord, layout: &GridLayout<'_>) {
        match self.anchor.or(self.current) {
            Some(anchor) => self.extend_range(anchor, cell, layout),
            None => self.select_single(cell),
        }
    }

    /// Select every visible cell
    pub fn select_all(&mut self, layout: &GridLayout<'_>) {
        let last_row = layout.row_count().checked_sub(1);
        let last_col = layout.column_count().checked_sub(1);
        let (Some(last_row), Some(last_col)) = (last_row, last_col) else {
            self.clear();
            return;
        };
        let first = layout.data_cell(0, 0);
        let last = layout.data_cell(last_row, last_col);
        if let (Some(first), Some(last)) = (first, last) {
            let current = self.current;
            self.extend_range(first, last, layout);
            self.current = current.or(Some(first));
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.anchor = None;
        self.focus = None;
        self.current = None;
        self.focus_intent = FocusIntent::Grid;
    }

    /// Arrow-key navigation. Moves the current cell one step in visual space,
    /// clamped to `rows` (the visible window) and the visible columns.
    /// With `extend` the selection grows from the anchor instead of
    /// collapsing to the new cell.
    pub fn move_current(
        &mut self,
        direction: Direction,
        extend: bool,
        layout: &GridLayout<'_>,
        rows: Range<usize>,
    ) -> Option<CellCoord> {
        let rows = rows.start..rows.end.min(layout.row_count());
        if rows.is_empty() || layout.column_count() == 0 {
            return None;
        }
        let last_row = rows.end - 1;
        let last_col = layout.column_count() - 1;

        let origin = if extend { self.focus.or(self.current) } else { self.current };
        let (row, col) = origin
            .and_then(|cell| layout.visual_position(&cell))
            .unwrap_or((rows.start, 0));
        let row = row.clamp(rows.start, last_row);

        let (row, col) = match direction {
            Direction::Up => (row.saturating_sub(1).max(rows.start), col),
            Direction::Down => ((row + 1).min(last_row), col),
            Direction::Left => (row, col.saturating_sub(1)),
            Direction::Right => (row, (col + 1).min(last_col)),
        };
        let target = layout.data_cell(row, col)?;

        if extend {
            let anchor = self.anchor.or(self.current).unwrap_or(target);
            let current = self.current;
            self.extend_range(anchor, target, layout);
            self.current = current.or(Some(target));
        } else {
            self.select_single(target);
        }
        Some(target)
    }

    /// Selected cells paired with their visual position, top-left to
    /// bottom-right. Cells that are not visible are left out.
    pub fn visual_cells(&self, layout: &GridLayout<'_>) -> Vec<((usize, usize), CellCoord)> {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .filter_map(|cell| layout.visual_position(cell).map(|position| (position, *cell)))
            .collect();
        cells.sort_unstable_by_key(|(position, _)| *position);
        cells
    }

    /// Bounding rectangle of the visible selected cells
    pub fn visual_bounds(&self, layout: &GridLayout<'_>) -> Option<VisualRect> {
        let cells = self.visual_cells(layout);
        let ((first_row, _), _) = cells.first()?;
        let mut rect = VisualRect {
            top: *first_row,
            bottom: *first_row,
            left: usize::MAX,
            right: 0,
        };
        for ((row, col), _) in &cells {
            rect.top = rect.top.min(*row);
            rect.bottom = rect.bottom.max(*row);
            rect.left = rect.left.min(*col);
            rect.right = rect.right.max(*col);
        }
        Some(rect)
    }

    /// Keep coordinates valid after rows were removed from the store
    pub fn on_rows_removed(&mut self, removed: &[usize]) {
        self.cells.remove_rows(removed);
        let shift = |cell: Option<CellCoord>| {
            cell.and_then(|c| shift_row(c.row, removed).map(|row| CellCoord::new(row, c.col)))
        };
        self.anchor = shift(self.anchor);
        self.focus = shift(self.focus);
        self.current = shift(self.current);
        if let FocusIntent::Editor(cell) | FocusIntent::Dropdown(cell) = self.focus_intent {
            if shift_row(cell.row, removed).is_none() {
                self.focus_intent = FocusIntent::Grid;
            }
        }
    }

    /// Drop coordinates beyond `row_count` (after a wholesale reload)
    pub fn prune(&mut self, row_count: usize) {
        self.cells.prune(row_count);
        let keep = |cell: Option<CellCoord>| cell.filter(|c| c.row < row_count);
        self.anchor = keep(self.anchor);
        self.focus = keep(self.focus);
        self.current = keep(self.current);
        if self.current.is_none() {
            self.focus_intent = FocusIntent::Grid;
        }
    }

    /// Hand keyboard focus to the inline editor of the current cell
    pub fn begin_edit(&mut self) -> Option<CellCoord> {
        let cell = self.current?;
        self.focus_intent = FocusIntent::Editor(cell);
        Some(cell)
    }

    /// Hand keyboard focus to the dropdown of the current cell
    pub fn open_dropdown(&mut self) -> Option<CellCoord> {
        let cell = self.current?;
        self.focus_intent = FocusIntent::Dropdown(cell);
        Some(cell)
    }

    /// Return keyboard focus to grid navigation
    pub fn return_to_grid(&mut self) {
        self.focus_intent = FocusIntent::Grid;
    }
}
