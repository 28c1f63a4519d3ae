//! Spreadsheet-compatible copy and paste
//!
//! Copied text is tab-separated with `\n` between rows, booleans as
//! `TRUE`/`FALSE` and empty strings for null. Pasting never drops data: rows
//! are appended when the block runs past the end, and values that a dropdown
//! would not offer are still written but reported back as warnings.

use anyhow::Result;
use arboard::Clipboard;
use tracing::{debug, warn};

use crate::data::cell_value::{clipboard_text, coerce_pasted, display_text};
use crate::data::column::{validation_targets, Column};
use crate::data::row_store::RowStore;
use crate::state::selection::{CellCoord, GridLayout, Selection, VisualRect};

/// A pasted value that is not among the options its dropdown allows
#[derive(Debug, Clone, PartialEq)]
pub struct PasteWarning {
    pub cell: CellCoord,
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasteReport {
    pub cells_written: usize,
    pub rows_added: usize,
    pub written_cells: Vec<CellCoord>,
    pub invalid_cells: Vec<CellCoord>,
    pub warnings: Vec<PasteWarning>,
}

impl PasteReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// One-line summary for a status bar, if anything was flagged
    pub fn warning_summary(&self) -> Option<String> {
        let first = self.warnings.first()?;
        let summary = if self.warnings.len() == 1 {
            format!("'{}' is not a valid option for {}", first.value, first.column)
        } else {
            format!(
                "{} pasted values are not valid options (first: '{}' in {})",
                self.warnings.len(),
                first.value,
                first.column
            )
        };
        Some(summary)
    }
}

/// Serialize the selection's bounding box. Cells inside the box that are not
/// selected come out empty.
pub fn copy_selection(
    selection: &Selection,
    store: &RowStore,
    columns: &[Column],
    layout: &GridLayout<'_>,
) -> Option<String> {
    let rect = selection.visual_bounds(layout)?;
    let mut lines = Vec::with_capacity(rect.height());
    for visual_row in rect.top..=rect.bottom {
        let cells: Vec<String> = (rect.left..=rect.right)
            .map(|visual_col| {
                layout
                    .data_cell(visual_row, visual_col)
                    .filter(|cell| selection.contains(cell))
                    .and_then(|cell| {
                        let row = store.get(cell.row)?;
                        let column = columns.get(cell.col)?;
                        Some(clipboard_text(row.value(&column.path)))
                    })
                    .unwrap_or_default()
            })
            .collect();
        lines.push(cells.join("\t"));
    }
    debug!(
        "Clipboard: copied {}x{} block",
        rect.height(),
        rect.width()
    );
    Some(lines.join("\n"))
}

/// Split clipboard text into rows of cells. A single trailing line break
/// (as spreadsheets add) is ignored.
pub fn parse_clipboard(text: &str) -> Vec<Vec<String>> {
    let normalized = text.replace("\r\n", "\n");
    let body = normalized.strip_suffix('\n').unwrap_or(&normalized);
    if body.is_empty() {
        return Vec::new();
    }
    body.split('\n')
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

/// Paste `text` into the grid.
///
/// With several cells selected the block is tiled over the selection's
/// bounds; otherwise it lands at the current cell with its own size. Rows
/// past the end of the view are appended to the store. Columns past the last
/// visible column are dropped.
pub fn paste(
    text: &str,
    selection: &Selection,
    store: &mut RowStore,
    columns: &[Column],
    layout: &GridLayout<'_>,
) -> PasteReport {
    let mut report = PasteReport::default();
    let data = parse_clipboard(text);
    let height = data.len();
    let width = data.iter().map(Vec::len).max().unwrap_or(0);
    if height == 0 || width == 0 || layout.column_count() == 0 {
        return report;
    }

    let Some(rect) = target_rect(selection, layout, height, width) else {
        debug!("Clipboard: paste ignored, no visible target cell");
        return report;
    };

    // Resolve target rows before appending so the view stays valid
    let mut target_rows = Vec::with_capacity(rect.height());
    for visual_row in rect.top..=rect.bottom {
        match layout.view.visual_to_data(visual_row) {
            Some(data_row) => target_rows.push(data_row),
            None => {
                target_rows.push(store.add_row());
                report.rows_added += 1;
            }
        }
    }

    let mut written: Vec<CellCoord> = Vec::new();
    for (i, &data_row) in target_rows.iter().enumerate() {
        let source_row = &data[i % height];
        for j in 0..rect.width() {
            let Some(&col) = layout.columns.get(rect.left + j) else {
                break;
            };
            let Some(column) = columns.get(col) else {
                continue;
            };
            if column.path.is_id() {
                continue;
            }
            let incoming = source_row.get(j % width).map(String::as_str).unwrap_or("");
            let current_is_null = store
                .get(data_row)
                .map(|row| row.value(&column.path).is_null())
                .unwrap_or(true);
            if incoming.is_empty() && current_is_null {
                // Empty text over an empty cell is a no-op, so copy/paste
                // round-trips null cells exactly
                continue;
            }
            let value = coerce_pasted(incoming, column.kind);
            if store.update(data_row, &column.path, value) {
                report.cells_written += 1;
                written.push(CellCoord::new(data_row, col));
            }
        }
    }

    // Validate after every write so options depending on sibling fields see
    // the pasted values too
    for cell in validation_targets(columns, &written) {
        let Some(column) = columns.get(cell.col).filter(|column| column.is_dropdown()) else {
            continue;
        };
        let Some(row) = store.get(cell.row) else {
            continue;
        };
        let value = row.value(&column.path);
        if !column.accepts(row, value) {
            report.invalid_cells.push(cell);
            report.warnings.push(PasteWarning {
                cell,
                column: column.title.clone(),
                value: display_text(value),
            });
        }
    }
    report.written_cells = written;

    if report.has_warnings() {
        warn!(
            "Clipboard: {} pasted values failed dropdown validation",
            report.warnings.len()
        );
    }
    debug!(
        "Clipboard: pasted {} cells, added {} rows",
        report.cells_written, report.rows_added
    );
    report
}

fn target_rect(
    selection: &Selection,
    layout: &GridLayout<'_>,
    height: usize,
    width: usize,
) -> Option<VisualRect> {
    if selection.is_multi() {
        return selection.visual_bounds(layout);
    }
    let current = selection.current()?;
    let (top, left) = layout.visual_position(&current)?;
    let right = (left + width - 1).min(layout.column_count() - 1);
    Some(VisualRect {
        top,
        bottom: top + height - 1,
        left,
        right,
    })
}

/// Thin wrapper over the system clipboard
pub struct SystemClipboard {
    inner: Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: Clipboard::new()?,
        })
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.inner.set_text(text)?;
        Ok(())
    }

    pub fn get_text(&mut self) -> Result<String> {
        Ok(self.inner.get_text()?)
    }
}
