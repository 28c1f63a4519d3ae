//! The grid controller: one entity's rows plus all interaction state
//!
//! The controller owns the row store, the resolved view, filters, sort,
//! selection, paging and the load/save lifecycle. Every operation runs
//! synchronously except `reload` and `save`, which await the persistence
//! adapter. Loads carry a generation token; only the newest load's result
//! is applied.

use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{debug, info, warn};

use crate::clipboard::{self, PasteReport};
use crate::data::cell_value::is_empty_value;
use crate::data::column::{column_index, validation_targets, Column};
use crate::data::data_view::DataView;
use crate::data::field_path::FieldPath;
use crate::data::filter::{ColumnFilter, FilterSet};
use crate::data::row_store::{PendingChanges, Row, RowStore};
use crate::data::sort::{SortController, SortDirection, SortKey};
use crate::datasource_trait::{ListResponse, PersistenceAdapter};
use crate::error::{AdapterError, EntityError, GridError, GridResult, SaveFailure};
use crate::fill::{self, FillReport};
use crate::preferences::GridPreferences;
use crate::state::dispatcher::CellContent;
use crate::state::pagination::{DataMode, ListRequest, PageSize, Pagination, ReloadNeed};
use crate::state::selection::{CellCoord, CellSet, Direction, GridLayout, Selection};
use crate::state::status::GridStatus;

/// A load in flight: the request to send and the generation it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub generation: u64,
    pub request: ListRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { rows: usize },
    /// A newer load was started after this one; its result was discarded
    Stale,
}

/// What a successful save sent upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SaveSummary {
    fn of(changes: &PendingChanges) -> Self {
        Self {
            created: changes.created.len(),
            updated: changes.updated.len(),
            deleted: changes.deleted.len(),
        }
    }
}

pub struct GridController {
    table_name: String,
    columns: Vec<Column>,
    /// Indices into `columns`, in display order
    visible_columns: Vec<usize>,
    store: RowStore,
    view: DataView,
    filters: FilterSet,
    sort: SortController,
    selection: Selection,
    pagination: Pagination,
    status: GridStatus,
    load_generation: u64,
    /// Cells holding a value their dropdown does not currently offer
    invalid_cells: CellSet,
}

impl GridController {
    pub fn new(table_name: &str, columns: Vec<Column>) -> Self {
        let visible_columns = columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.default_visible)
            .map(|(index, _)| index)
            .collect();
        Self {
            table_name: table_name.to_string(),
            columns,
            visible_columns,
            store: RowStore::new(),
            view: DataView::default(),
            filters: FilterSet::new(),
            sort: SortController::new(),
            selection: Selection::new(),
            pagination: Pagination::new(PageSize::default()),
            status: GridStatus::Idle,
            load_generation: 0,
            invalid_cells: CellSet::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.pagination = Pagination::new(page_size);
        self
    }

    /// Rows added by the user start as copies of `template`
    pub fn with_template(mut self, template: Row) -> Self {
        self.store.set_template(template);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn visible_columns(&self) -> &[usize] {
        &self.visible_columns
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn view(&self) -> &DataView {
        &self.view
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        self.sort.keys()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn status(&self) -> &GridStatus {
        &self.status
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn invalid_cells(&self) -> &CellSet {
        &self.invalid_cells
    }

    pub fn mode(&self) -> DataMode {
        self.pagination.mode()
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current_page()
    }

    pub fn page_size(&self) -> PageSize {
        self.pagination.page_size()
    }

    pub fn layout(&self) -> GridLayout<'_> {
        GridLayout::new(&self.view, &self.visible_columns)
    }

    fn column_or_err(&self, key: &str) -> GridResult<usize> {
        column_index(&self.columns, key).ok_or_else(|| GridError::UnknownColumn(key.to_string()))
    }

    fn ensure_idle(&self, operation: &'static str) -> GridResult<()> {
        if self.status.is_saving() {
            return Err(GridError::Busy { operation });
        }
        Ok(())
    }

    fn mark_mutated(&mut self) {
        self.status = self.status.after_mutation();
    }

    /// Re-run filters and the frozen order against the store
    fn refresh_view(&mut self) {
        self.view = DataView::resolve(
            &self.store,
            &self.columns,
            &self.visible_columns,
            &self.filters,
            self.sort.frozen(),
        );
        self.pagination
            .set_local_changes(self.store.unsaved_count(), self.store.deleted_ids().len());
        self.pagination.clamp_page(self.view.row_count());
    }

    /// Flag or clear every dropdown value that `written` may have affected
    fn revalidate(&mut self, written: &[CellCoord]) {
        for cell in validation_targets(&self.columns, written) {
            let valid = match (self.columns.get(cell.col), self.store.get(cell.row)) {
                (Some(column), Some(row)) => column.accepts(row, row.value(&column.path)),
                _ => true,
            };
            if valid {
                self.invalid_cells.remove(&cell);
            } else {
                self.invalid_cells.insert(cell);
            }
        }
    }

    // Loading

    /// Start a load. Any load started earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        self.status = GridStatus::Loading;
        let request = self.pagination.request(&self.filters);
        debug!(
            "GridController[{}]: load #{} {:?}",
            self.table_name, self.load_generation, request
        );
        LoadTicket {
            generation: self.load_generation,
            request,
        }
    }

    /// Apply the result of a load started with `begin_load`
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<ListResponse, AdapterError>,
    ) -> GridResult<LoadOutcome> {
        if ticket.generation != self.load_generation {
            debug!(
                "GridController[{}]: discarding stale load #{} (latest #{})",
                self.table_name, ticket.generation, self.load_generation
            );
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(response) => {
                if self.store.is_dirty() {
                    warn!(
                        "GridController[{}]: reload discards unsaved changes",
                        self.table_name
                    );
                }
                let rows: Vec<Row> = response.items.into_iter().filter_map(Row::from_value).collect();
                let count = rows.len();
                self.store.load(rows);
                self.pagination.on_loaded(&ticket.request, response.total_count);
                if self.sort.capture_pending() {
                    self.sort.capture(&self.store);
                }
                self.invalid_cells.clear();
                self.selection.prune(self.store.len());
                self.status = GridStatus::Loaded;
                self.refresh_view();
                info!(
                    "GridController[{}]: loaded {} rows ({} total)",
                    self.table_name,
                    count,
                    self.total_count()
                );
                Ok(LoadOutcome::Applied { rows: count })
            }
            Err(e) => {
                let message = e.to_string();
                warn!("GridController[{}]: load failed: {}", self.table_name, message);
                self.store.clear_rows();
                self.invalid_cells.clear();
                self.selection.clear();
                self.status = GridStatus::LoadError(message.clone());
                self.refresh_view();
                Err(GridError::LoadFailure { message })
            }
        }
    }

    /// Fetch the rows the current mode and page need
    pub async fn reload(&mut self, adapter: &dyn PersistenceAdapter) -> GridResult<LoadOutcome> {
        let ticket = self.begin_load();
        let result = adapter.list(&ticket.request).await;
        self.complete_load(ticket, result)
    }

    /// Load rows directly, as if a full-dataset list had returned them
    pub fn load_rows(&mut self, items: Vec<Value>) {
        let total = items.len();
        let ticket = self.begin_load();
        // Infallible: the result is always Ok and the ticket is current
        let _ = self.complete_load(ticket, Ok(ListResponse::new(items, total)));
    }

    /// Drop every unsaved change and fetch fresh rows
    pub async fn discard_changes(
        &mut self,
        adapter: &dyn PersistenceAdapter,
    ) -> GridResult<LoadOutcome> {
        self.ensure_idle("discard changes")?;
        info!("GridController[{}]: discarding changes", self.table_name);
        self.store.mark_clean();
        self.reload(adapter).await
    }

    // Saving

    /// Validate and snapshot the pending changes, entering `Saving`
    pub fn begin_save(&mut self) -> GridResult<PendingChanges> {
        if self.status.is_busy() {
            return Err(GridError::Busy { operation: "save" });
        }
        let changes = self.store.pending_changes();
        if changes.is_empty() {
            return Err(GridError::NothingToSave);
        }

        let errors = self.required_field_errors(&changes);
        if !errors.is_empty() {
            let failure = SaveFailure::new(format!(
                "{} required field(s) are empty",
                errors.len()
            ))
            .with_errors(errors);
            self.status = GridStatus::SaveError(failure.clone());
            return Err(failure.into());
        }

        self.status = GridStatus::Saving;
        Ok(changes)
    }

    fn required_field_errors(&self, changes: &PendingChanges) -> Vec<EntityError> {
        let rows = changes
            .created
            .iter()
            .map(|(_, row)| row)
            .chain(changes.updated.iter().map(|(_, row)| row));
        let mut errors = Vec::new();
        for row in rows {
            for column in self.columns.iter().filter(|column| column.required) {
                if is_empty_value(row.value(&column.path)) {
                    errors.push(EntityError::new(
                        row.id(),
                        Some(&column.key()),
                        format!("{} is required", column.title),
                    ));
                }
            }
        }
        errors
    }

    /// Finish a save. Success clears dirty state; failure keeps every edit.
    pub fn complete_save(&mut self, result: Result<(), SaveFailure>) -> GridResult<()> {
        match result {
            Ok(()) => {
                self.store.mark_clean();
                self.invalid_cells.clear();
                self.status = GridStatus::Loaded;
                Ok(())
            }
            Err(failure) => {
                warn!(
                    "GridController[{}]: save failed: {} ({} entity errors)",
                    self.table_name,
                    failure.message,
                    failure.errors.len()
                );
                self.status = GridStatus::SaveError(failure.clone());
                Err(failure.into())
            }
        }
    }

    /// Save all pending changes, then reload to resynchronize with the
    /// server. Uses the adapter's bulk save when it has one.
    pub async fn save(&mut self, adapter: &dyn PersistenceAdapter) -> GridResult<SaveSummary> {
        let changes = self.begin_save()?;
        let summary = SaveSummary::of(&changes);
        info!(
            "GridController[{}]: saving {} created, {} updated, {} deleted",
            self.table_name, summary.created, summary.updated, summary.deleted
        );

        let result = if adapter.supports_bulk_save() {
            self.save_bulk(adapter, &changes).await
        } else {
            self.save_per_row(adapter, &changes).await
        };
        self.complete_save(result)?;
        self.reload(adapter).await?;
        Ok(summary)
    }

    async fn save_bulk(
        &mut self,
        adapter: &dyn PersistenceAdapter,
        changes: &PendingChanges,
    ) -> Result<(), SaveFailure> {
        match adapter.bulk_save(&changes.changed_rows(), &changes.deleted).await {
            Ok(result) if result.success => Ok(()),
            Ok(result) => {
                let message = if result.message.is_empty() {
                    "Save was rejected by the server".to_string()
                } else {
                    result.message
                };
                Err(SaveFailure::new(message).with_errors(result.errors))
            }
            Err(e) => Err(SaveFailure::new(e.to_string())),
        }
    }

    /// Deletes, then creates, then updates. Each success is committed to the
    /// store so a retry only resends what failed.
    async fn save_per_row(
        &mut self,
        adapter: &dyn PersistenceAdapter,
        changes: &PendingChanges,
    ) -> Result<(), SaveFailure> {
        let mut errors = Vec::new();

        for id in &changes.deleted {
            match adapter.delete(id).await {
                Ok(()) => self.store.commit_deleted(id),
                Err(e) => errors.push(EntityError::new(Some(id.clone()), None, e.to_string())),
            }
        }

        for (index, row) in &changes.created {
            match adapter.create(row).await {
                Ok(saved) => match saved.id() {
                    Some(id) => self.store.commit_created(*index, id),
                    None => errors.push(EntityError::new(
                        None,
                        None,
                        "Server did not assign an id to the new row",
                    )),
                },
                Err(e) => errors.push(EntityError::new(None, None, e.to_string())),
            }
        }

        for (id, row) in &changes.updated {
            match adapter.update(id, row).await {
                Ok(_) => self.store.commit_updated(id),
                Err(e) => errors.push(EntityError::new(Some(id.clone()), None, e.to_string())),
            }
        }

        if errors.is_empty() {
            return Ok(());
        }
        let total = changes.created.len() + changes.updated.len() + changes.deleted.len();
        Err(SaveFailure::new(format!("{} of {} changes failed to save", errors.len(), total))
            .with_errors(errors))
    }

    // Row mutations. Edits never re-run filters or the sort; rows stay put
    // until the query changes.

    /// Write one cell. Dropdown values outside the row's valid options are
    /// written and flagged, including dropdowns on the same row whose options
    /// depend on the written field.
    pub fn set_cell(&mut self, row: usize, col: usize, value: Value) -> GridResult<bool> {
        self.ensure_idle("edit")?;
        let path = self
            .columns
            .get(col)
            .map(|column| column.path.clone())
            .ok_or_else(|| GridError::UnknownColumn(col.to_string()))?;
        if !self.store.update(row, &path, value) {
            return Ok(false);
        }
        self.revalidate(&[CellCoord::new(row, col)]);
        self.mark_mutated();
        Ok(true)
    }

    pub fn set_cell_by_key(&mut self, row: usize, key: &str, value: Value) -> GridResult<bool> {
        let col = self.column_or_err(key)?;
        self.set_cell(row, col, value)
    }

    /// Write a UI-only field without marking anything dirty
    pub fn set_silent(&mut self, row: usize, field: &str, value: Value) -> bool {
        self.store.update_silent(row, &FieldPath::parse(field), value)
    }

    /// Append a template row and make it the current cell
    pub fn add_row(&mut self) -> GridResult<usize> {
        self.ensure_idle("add a row")?;
        let index = self.store.add_row();
        self.after_row_added(index);
        Ok(index)
    }

    /// Append a copy of `source` with a null id
    pub fn add_row_from(&mut self, source: &Row) -> GridResult<usize> {
        self.ensure_idle("add a row")?;
        let index = self.store.add_row_from(source);
        self.after_row_added(index);
        Ok(index)
    }

    fn after_row_added(&mut self, index: usize) {
        self.mark_mutated();
        self.refresh_view();
        if let Some(&col) = self.visible_columns.first() {
            self.selection.select_single(CellCoord::new(index, col));
        }
        debug!("GridController[{}]: added row {}", self.table_name, index);
    }

    /// Remove every row that has a selected cell. Returns the number removed.
    pub fn delete_selection(&mut self) -> GridResult<usize> {
        self.ensure_idle("delete rows")?;
        let rows: Vec<usize> = self.selection.cells().iter().map(|cell| cell.row).collect();
        let removed = self.store.delete_rows(&rows);
        if removed.is_empty() {
            return Ok(0);
        }
        self.selection.on_rows_removed(&removed);
        self.invalid_cells.remove_rows(&removed);
        self.mark_mutated();
        self.refresh_view();
        Ok(removed.len())
    }

    // Clipboard and fill

    pub fn copy_selection(&self) -> Option<String> {
        clipboard::copy_selection(&self.selection, &self.store, &self.columns, &self.layout())
    }

    pub fn paste(&mut self, text: &str) -> GridResult<PasteReport> {
        self.ensure_idle("paste")?;
        let layout = GridLayout::new(&self.view, &self.visible_columns);
        let report = clipboard::paste(text, &self.selection, &mut self.store, &self.columns, &layout);
        self.revalidate(&report.written_cells);
        if report.cells_written > 0 || report.rows_added > 0 {
            self.mark_mutated();
        }
        if report.rows_added > 0 {
            self.refresh_view();
        }
        Ok(report)
    }

    pub fn fill_down(&mut self) -> GridResult<FillReport> {
        self.ensure_idle("fill")?;
        let layout = GridLayout::new(&self.view, &self.visible_columns);
        let report = fill::fill_down(&self.selection, &mut self.store, &self.columns, &layout)?;
        self.after_fill(&report);
        Ok(report)
    }

    pub fn fill_right(&mut self) -> GridResult<FillReport> {
        self.ensure_idle("fill")?;
        let layout = GridLayout::new(&self.view, &self.visible_columns);
        let report = fill::fill_right(&self.selection, &mut self.store, &self.columns, &layout)?;
        self.after_fill(&report);
        Ok(report)
    }

    fn after_fill(&mut self, report: &FillReport) {
        self.revalidate(&report.written_cells);
        if report.applied > 0 && self.store.is_dirty() {
            self.mark_mutated();
        }
    }

    // Selection. Visual coordinates index the resolved view.

    pub fn cell_at(&self, visual_row: usize, visual_col: usize) -> Option<CellCoord> {
        self.layout().data_cell(visual_row, visual_col)
    }

    pub fn select_visual(&mut self, visual_row: usize, visual_col: usize) -> Option<CellCoord> {
        let cell = self.cell_at(visual_row, visual_col)?;
        self.selection.select_single(cell);
        Some(cell)
    }

    pub fn toggle_visual(&mut self, visual_row: usize, visual_col: usize) -> Option<CellCoord> {
        let cell = self.cell_at(visual_row, visual_col)?;
        self.selection.toggle_cell(cell);
        Some(cell)
    }

    pub fn extend_to_visual(&mut self, visual_row: usize, visual_col: usize) -> Option<CellCoord> {
        let cell = self.cell_at(visual_row, visual_col)?;
        let layout = GridLayout::new(&self.view, &self.visible_columns);
        self.selection.extend_to(cell, &layout);
        Some(cell)
    }

    pub fn select_all(&mut self) {
        let layout = GridLayout::new(&self.view, &self.visible_columns);
        self.selection.select_all(&layout);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Arrow-key navigation within the current page
    pub fn move_cursor(&mut self, direction: Direction, extend: bool) -> Option<CellCoord> {
        let rows = self.page_range();
        let layout = GridLayout::new(&self.view, &self.visible_columns);
        self.selection.move_current(direction, extend, &layout, rows)
    }

    pub fn begin_edit(&mut self) -> Option<CellCoord> {
        self.selection.begin_edit()
    }

    pub fn open_dropdown(&mut self) -> Option<CellCoord> {
        let cell = self.selection.current()?;
        if !self.columns.get(cell.col).is_some_and(Column::is_dropdown) {
            return self.selection.begin_edit();
        }
        self.selection.open_dropdown()
    }

    pub fn return_to_grid(&mut self) {
        self.selection.return_to_grid();
    }

    /// Display text and actions of one cell. Custom columns defer to their
    /// renderer; flagged dropdown values come back marked invalid.
    pub fn render_cell(&self, cell: CellCoord) -> Option<CellContent> {
        let column = self.columns.get(cell.col)?;
        let row = self.store.get(cell.row)?;
        let mut content = column.render(row);
        content.invalid = self.invalid_cells.contains(&cell);
        Some(content)
    }

    pub fn render_visual(&self, visual_row: usize, visual_col: usize) -> Option<CellContent> {
        self.render_cell(self.cell_at(visual_row, visual_col)?)
    }

    /// Options the dropdown at `cell` offers right now
    pub fn dropdown_options(&self, cell: CellCoord) -> Option<Vec<String>> {
        let column = self.columns.get(cell.col)?;
        column.valid_options(self.store.get(cell.row)?)
    }

    // Filtering and sorting

    fn on_query_changed(&mut self) -> ReloadNeed {
        let need = self
            .pagination
            .on_query_changed(&self.filters, self.sort.is_active());
        if need.is_needed() {
            // The captured order only covers the rows loaded so far
            self.sort.request_capture();
        }
        self.refresh_view();
        need
    }

    pub fn set_filter(&mut self, key: &str, filter: ColumnFilter) -> GridResult<ReloadNeed> {
        self.column_or_err(key)?;
        debug!("GridController[{}]: filter {} = {:?}", self.table_name, key, filter);
        self.filters.set(key, filter);
        Ok(self.on_query_changed())
    }

    pub fn remove_filter(&mut self, key: &str) -> ReloadNeed {
        if self.filters.remove(key).is_none() {
            return ReloadNeed::None;
        }
        self.on_query_changed()
    }

    pub fn set_global_filter(&mut self, text: &str) -> ReloadNeed {
        let before = self.filters.global.clone();
        self.filters.set_global(text);
        if self.filters.global == before {
            return ReloadNeed::None;
        }
        self.on_query_changed()
    }

    pub fn clear_filters(&mut self) -> ReloadNeed {
        if self.filters == FilterSet::default() {
            return ReloadNeed::None;
        }
        self.filters.clear();
        self.on_query_changed()
    }

    /// Sort by one column and freeze the resulting order
    pub fn set_sort(&mut self, key: &str, direction: SortDirection) -> GridResult<ReloadNeed> {
        self.column_or_err(key)?;
        self.sort.set_sort(key, direction, &self.store);
        Ok(self.on_query_changed())
    }

    /// Add a secondary sort key and refreeze
    pub fn add_sort(&mut self, key: &str, direction: SortDirection) -> GridResult<ReloadNeed> {
        self.column_or_err(key)?;
        self.sort.add_sort(key, direction, &self.store);
        Ok(self.on_query_changed())
    }

    pub fn clear_sort(&mut self) -> ReloadNeed {
        if !self.sort.is_active() {
            return ReloadNeed::None;
        }
        self.sort.clear_sort();
        self.on_query_changed()
    }

    // Paging

    pub fn go_to_page(&mut self, page: usize) -> ReloadNeed {
        self.pagination.go_to_page(page, self.view.row_count())
    }

    pub fn set_page_size(&mut self, page_size: PageSize) -> ReloadNeed {
        self.pagination.set_page_size(page_size)
    }

    /// Visual row range of the current page
    pub fn page_range(&self) -> Range<usize> {
        let (offset, limit) = self.pagination.window();
        let start = offset.min(self.view.row_count());
        let end = match limit {
            Some(limit) => (start + limit).min(self.view.row_count()),
            None => self.view.row_count(),
        };
        start..end
    }

    /// Data indices of the rows on the current page, in display order
    pub fn page_rows(&self) -> &[usize] {
        let (offset, limit) = self.pagination.window();
        self.view.window(offset, limit)
    }

    /// Items matching the active query across the whole dataset. Unsaved
    /// rows kept on screen despite failing a filter are not counted; pending
    /// adds and deletes are counted in server mode.
    pub fn total_count(&self) -> usize {
        self.pagination.total_count(self.view.matching_count())
    }

    /// Pages needed to show every visible row, unsaved ones included
    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages(self.view.row_count())
    }

    // Columns and preferences

    pub fn set_column_visible(&mut self, key: &str, visible: bool) -> GridResult<()> {
        let index = self.column_or_err(key)?;
        let shown = self.visible_columns.contains(&index);
        if shown == visible {
            return Ok(());
        }
        if visible {
            self.visible_columns.push(index);
            self.visible_columns.sort_unstable();
        } else {
            self.visible_columns.retain(|&c| c != index);
        }
        // The global search only covers visible columns
        if self.filters.has_global() {
            self.refresh_view();
        }
        Ok(())
    }

    pub fn set_column_width(&mut self, key: &str, width: u16) -> GridResult<()> {
        let index = self.column_or_err(key)?;
        self.columns[index].width = width;
        Ok(())
    }

    /// Snapshot of everything a user can customize
    pub fn preferences(&self) -> GridPreferences {
        let column_widths: BTreeMap<String, u16> = self
            .columns
            .iter()
            .map(|column| (column.key(), column.width))
            .collect();
        let visible_columns = self
            .visible_columns
            .iter()
            .filter_map(|&index| self.columns.get(index))
            .map(Column::key)
            .collect();
        GridPreferences {
            column_widths: Some(column_widths),
            visible_columns: Some(visible_columns),
            filters: Some(self.filters.clone()),
            page_size: Some(self.pagination.page_size()),
            current_page: Some(self.pagination.current_page()),
            sort: Some(self.sort.keys().to_vec()),
        }
    }

    /// Restore stored preferences before the first load. Keys of columns
    /// this grid does not have are ignored.
    pub fn apply_preferences(&mut self, preferences: &GridPreferences) {
        if let Some(widths) = &preferences.column_widths {
            for (key, width) in widths {
                if let Some(index) = column_index(&self.columns, key) {
                    self.columns[index].width = *width;
                }
            }
        }
        if let Some(visible) = &preferences.visible_columns {
            let mut indices: Vec<usize> = visible
                .iter()
                .filter_map(|key| column_index(&self.columns, key))
                .collect();
            indices.sort_unstable();
            indices.dedup();
            self.visible_columns = indices;
        }
        if let Some(filters) = &preferences.filters {
            self.filters = filters.clone();
        }
        if let Some(page_size) = preferences.page_size {
            self.pagination.set_page_size(page_size);
        }
        if let Some(sort) = &preferences.sort {
            self.sort.restore_keys(sort.clone());
        }

        self.pagination
            .on_query_changed(&self.filters, self.sort.is_active());
        if let Some(page) = preferences.current_page {
            self.pagination.restore_page(page);
        }
        self.refresh_view();
        debug!(
            "GridController[{}]: applied preferences, mode {:?}",
            self.table_name,
            self.pagination.mode()
        );
    }
}
