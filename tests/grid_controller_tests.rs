#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex, MutexGuard};

    use san_grid::data::filter::{ColumnFilter, FilterOperator};
    use san_grid::data::sort::SortDirection;
    use san_grid::datasource_trait::{BulkSaveResult, ListResponse, PersistenceAdapter};
    use san_grid::error::{AdapterError, GridError};
    use san_grid::state::grid::LoadOutcome;
    use san_grid::state::dispatcher::{
        ActionDescriptor, ActionHandler, CellContent, CommandOutcome,
    };
    use san_grid::state::pagination::{DataMode, ListRequest, PageSize};
    use san_grid::state::selection::CellCoord;
    use san_grid::state::status::GridStatus;
    use san_grid::{Column, CommandDispatcher, GridController, GridResult, Row, RowId};

    #[derive(Default)]
    struct MockState {
        rows: Vec<Value>,
        next_id: i64,
        fail_updates: bool,
        reject_bulk: bool,
        requests: Vec<ListRequest>,
        calls: Vec<String>,
        bulk_rows: usize,
        bulk_deleted: Vec<RowId>,
    }

    /// In-memory entity endpoint. Server-mode pages are sliced; filters are
    /// left to the grid, which always fetches the full dataset when any are set.
    #[derive(Clone, Default)]
    struct MockAdapter {
        state: Arc<Mutex<MockState>>,
        bulk: bool,
    }

    impl MockAdapter {
        fn with_rows(rows: Vec<Value>) -> Self {
            let next_id = rows.len() as i64 + 1;
            let adapter = Self::default();
            {
                let mut state = adapter.state();
                state.rows = rows;
                state.next_id = next_id;
            }
            adapter
        }

        fn bulk(mut self) -> Self {
            self.bulk = true;
            self
        }

        fn state(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap()
        }

        fn field(&self, id: i64, field: &str) -> Value {
            self.state()
                .rows
                .iter()
                .find(|row| row["id"] == json!(id))
                .map(|row| row[field].clone())
                .unwrap_or(Value::Null)
        }
    }

    #[async_trait]
    impl PersistenceAdapter for MockAdapter {
        async fn list(&self, request: &ListRequest) -> Result<ListResponse, AdapterError> {
            let mut state = self.state();
            state.requests.push(request.clone());
            let total = state.rows.len();
            let items = match request.page_size.limit() {
                Some(size) => state
                    .rows
                    .iter()
                    .skip((request.page.max(1) - 1) * size)
                    .take(size)
                    .cloned()
                    .collect(),
                None => state.rows.clone(),
            };
            Ok(ListResponse::new(items, total))
        }

        async fn create(&self, row: &Row) -> Result<Row, AdapterError> {
            let mut state = self.state();
            state.calls.push("create".to_string());
            if row.fields().get("name") == Some(&json!("bad")) {
                return Err(AdapterError::Status {
                    status: 400,
                    body: "name is reserved".to_string(),
                });
            }
            let mut saved = row.clone();
            let id = RowId::Int(state.next_id);
            state.next_id += 1;
            saved.set_id(Some(&id));
            state.rows.push(saved.clone().into_value());
            Ok(saved)
        }

        async fn update(&self, id: &RowId, row: &Row) -> Result<Row, AdapterError> {
            let mut state = self.state();
            state.calls.push(format!("update {id}"));
            if state.fail_updates {
                return Err(AdapterError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            let target = id.to_value();
            if let Some(existing) = state.rows.iter_mut().find(|r| r["id"] == target) {
                *existing = row.clone().into_value();
            }
            Ok(row.clone())
        }

        async fn delete(&self, id: &RowId) -> Result<(), AdapterError> {
            let mut state = self.state();
            state.calls.push(format!("delete {id}"));
            let target = id.to_value();
            state.rows.retain(|r| r["id"] != target);
            Ok(())
        }

        fn supports_bulk_save(&self) -> bool {
            self.bulk
        }

        async fn bulk_save(
            &self,
            rows: &[Row],
            deleted: &[RowId],
        ) -> Result<BulkSaveResult, AdapterError> {
            let mut state = self.state();
            state.bulk_rows = rows.len();
            state.bulk_deleted = deleted.to_vec();
            if state.reject_bulk {
                return Ok(BulkSaveResult {
                    success: false,
                    message: "Zone member belongs to another fabric".to_string(),
                    errors: Vec::new(),
                });
            }
            Ok(BulkSaveResult {
                success: true,
                ..BulkSaveResult::default()
            })
        }

        fn entity_name(&self) -> &str {
            "aliases"
        }
    }

    fn fabric_column() -> Column {
        // Host B is only ever zoned on F1
        Column::dropdown("fabric", "Fabric", ["F1", "F2"]).with_option_filter(Arc::new(
            |row: &Row, options: &[String]| {
                if row.fields().get("name") == Some(&json!("B")) {
                    options.iter().filter(|o| *o == "F1").cloned().collect()
                } else {
                    options.to_vec()
                }
            },
        ))
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::numeric("id", "ID"),
            Column::text("name", "Name"),
            fabric_column(),
        ]
    }

    fn hosts(count: usize) -> Vec<Value> {
        (1..=count)
            .map(|i| {
                json!({
                    "id": i,
                    "name": format!("host-{i}"),
                    "fabric": if i % 2 == 0 { "F1" } else { "F2" },
                })
            })
            .collect()
    }

    fn abc() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "C", "fabric": "F1"}),
            json!({"id": 2, "name": "A", "fabric": "F1"}),
            json!({"id": 3, "name": "B", "fabric": "F2"}),
        ]
    }

    fn names(grid: &GridController) -> Vec<Value> {
        grid.page_rows()
            .iter()
            .map(|&index| {
                grid.store().rows()[index]
                    .fields()
                    .get("name")
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_newer_load_wins() {
        let adapter = MockAdapter::with_rows(hosts(3));
        let mut grid = GridController::new("aliases", columns());

        let first = grid.begin_load();
        let second = grid.begin_load();
        let stale = adapter.list(&first.request).await;
        let fresh = adapter.list(&second.request).await;

        assert_eq!(grid.complete_load(first, stale).unwrap(), LoadOutcome::Stale);
        assert!(grid.store().is_empty());
        assert_eq!(
            grid.complete_load(second, fresh).unwrap(),
            LoadOutcome::Applied { rows: 3 }
        );
        assert_eq!(grid.status(), &GridStatus::Loaded);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_edits_for_retry() {
        let adapter = MockAdapter::with_rows(abc());
        let mut grid = GridController::new("aliases", columns());
        grid.reload(&adapter).await.unwrap();

        grid.set_cell_by_key(0, "name", json!("C-renamed")).unwrap();
        adapter.state().fail_updates = true;

        let err = grid.save(&adapter).await.unwrap_err();
        assert!(matches!(err, GridError::SaveFailure(_)));
        assert!(grid.is_dirty());
        assert!(matches!(grid.status(), GridStatus::SaveError(_)));
        assert_eq!(grid.store().rows()[0].fields()["name"], json!("C-renamed"));
        assert_eq!(adapter.field(1, "name"), json!("C"));

        adapter.state().fail_updates = false;
        let summary = grid.save(&adapter).await.unwrap();
        assert_eq!(summary.updated, 1);
        assert!(!grid.is_dirty());
        assert_eq!(grid.status(), &GridStatus::Loaded);
        assert_eq!(adapter.field(1, "name"), json!("C-renamed"));
    }

    #[tokio::test]
    async fn test_per_row_save_commits_what_succeeded() {
        let adapter = MockAdapter::with_rows(abc());
        let mut grid = GridController::new("aliases", columns());
        grid.reload(&adapter).await.unwrap();

        grid.select_visual(2, 1);
        assert_eq!(grid.delete_selection().unwrap(), 1);
        let added = grid.add_row().unwrap();
        grid.set_cell_by_key(added, "name", json!("bad")).unwrap();
        grid.set_cell_by_key(0, "name", json!("C2")).unwrap();

        let err = grid.save(&adapter).await.unwrap_err();
        let GridError::SaveFailure(failure) = err else {
            panic!("expected a save failure");
        };
        assert_eq!(failure.errors.len(), 1);
        assert_eq!(
            adapter.state().calls,
            vec!["delete 3", "create", "update 1"]
        );

        // Only the rejected create is still pending
        let pending = grid.store().pending_changes();
        assert!(pending.deleted.is_empty());
        assert!(pending.updated.is_empty());
        assert_eq!(pending.created.len(), 1);
        assert!(grid.is_dirty());
    }

    #[tokio::test]
    async fn test_bulk_save_sends_changed_rows_and_deletions() {
        let adapter = MockAdapter::with_rows(abc()).bulk();
        let mut grid = GridController::new("aliases", columns());
        grid.reload(&adapter).await.unwrap();

        grid.set_cell_by_key(1, "fabric", json!("F2")).unwrap();
        grid.add_row().unwrap();
        grid.select_visual(0, 0);
        grid.delete_selection().unwrap();

        let summary = grid.save(&adapter).await.unwrap();
        assert_eq!((summary.created, summary.updated, summary.deleted), (1, 1, 1));
        {
            let state = adapter.state();
            assert_eq!(state.bulk_rows, 2);
            assert_eq!(state.bulk_deleted, vec![RowId::Int(1)]);
            assert!(state.calls.is_empty());
        }
        assert!(!grid.is_dirty());
    }

    #[tokio::test]
    async fn test_rejected_bulk_save_keeps_snapshot() {
        let adapter = MockAdapter::with_rows(abc()).bulk();
        adapter.state().reject_bulk = true;
        let mut grid = GridController::new("aliases", columns());
        grid.reload(&adapter).await.unwrap();

        grid.set_cell_by_key(0, "name", json!("X")).unwrap();
        let err = grid.save(&adapter).await.unwrap_err();
        assert!(err.to_string().contains("another fabric"));
        assert!(grid.is_dirty());
        assert_eq!(grid.store().rows()[0].fields()["name"], json!("X"));
    }

    #[tokio::test]
    async fn test_sorted_rows_stay_put_while_editing() {
        let adapter = MockAdapter::with_rows(abc());
        let mut grid = GridController::new("aliases", columns());
        grid.reload(&adapter).await.unwrap();

        assert!(grid.set_sort("name", SortDirection::Asc).unwrap().is_needed());
        grid.reload(&adapter).await.unwrap();
        assert_eq!(grid.mode(), DataMode::Client);
        assert_eq!(names(&grid), vec![json!("A"), json!("B"), json!("C")]);

        // Renaming the first row does not move it
        let first = grid.page_rows()[0];
        grid.set_cell_by_key(first, "name", json!("Z")).unwrap();
        assert_eq!(names(&grid), vec![json!("Z"), json!("B"), json!("C")]);

        // New rows go last until the sort is applied again
        grid.add_row().unwrap();
        assert_eq!(grid.page_rows().len(), 4);
        assert_eq!(grid.page_rows()[3], 3);

        assert!(!grid.set_sort("name", SortDirection::Asc).unwrap().is_needed());
        assert_eq!(
            names(&grid),
            vec![json!("B"), json!("C"), json!("Z"), Value::Null]
        );
    }

    #[tokio::test]
    async fn test_copy_then_paste_reproduces_block() {
        let adapter = MockAdapter::with_rows(abc());
        let mut grid = GridController::new("aliases", columns());
        grid.reload(&adapter).await.unwrap();

        grid.select_visual(0, 1);
        grid.extend_to_visual(1, 2);
        let text = grid.copy_selection().unwrap();
        assert_eq!(text, "C\tF1\nA\tF1");

        grid.select_visual(2, 1);
        let report = grid.paste(&text).unwrap();
        assert_eq!(report.rows_added, 1);
        assert_eq!(report.cells_written, 4);

        let rows = grid.store().rows();
        assert_eq!(rows[2].fields()["name"], json!("C"));
        assert_eq!(rows[2].fields()["fabric"], json!("F1"));
        assert_eq!(rows[3].fields()["name"], json!("A"));
        assert_eq!(rows[3].id(), None);
    }

    #[tokio::test]
    async fn test_paste_at_last_row_extends_store() {
        let adapter = MockAdapter::with_rows(hosts(2));
        let mut grid = GridController::new("aliases", columns());
        grid.reload(&adapter).await.unwrap();

        grid.select_visual(1, 1);
        let report = grid.paste("a\nb\nc\nd\ne").unwrap();
        assert!(grid.store().len() >= 6);
        assert_eq!(report.rows_added, 4);
        assert_eq!(grid.store().rows()[0].fields()["name"], json!("host-1"));
        assert_eq!(grid.store().rows()[5].fields()["name"], json!("e"));
        assert_eq!(grid.status(), &GridStatus::Dirty);
    }

    #[tokio::test]
    async fn test_invalid_dropdown_paste_is_written_and_reported() {
        let adapter = MockAdapter::with_rows(abc());
        let mut grid = GridController::new("aliases", columns());
        grid.reload(&adapter).await.unwrap();

        // Row 3 is host B, which only allows F1
        grid.select_visual(2, 2);
        let report = grid.paste("F2").unwrap();
        assert_eq!(grid.store().rows()[2].fields()["fabric"], json!("F2"));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(grid.invalid_cells().len(), 1);
        assert!(report.warning_summary().unwrap().contains("Fabric"));
    }

    #[tokio::test]
    async fn test_total_count_matches_predicates_in_both_modes() {
        let adapter = MockAdapter::with_rows(hosts(120));
        let mut grid = GridController::new("aliases", columns()).with_page_size(PageSize::Count(25));

        grid.reload(&adapter).await.unwrap();
        assert_eq!(grid.mode(), DataMode::Server);
        assert_eq!(grid.page_rows().len(), 25);
        assert_eq!(grid.total_count(), 120);
        assert_eq!(grid.total_pages(), 5);

        assert!(grid.go_to_page(5).is_needed());
        grid.reload(&adapter).await.unwrap();
        assert_eq!(adapter.state().requests.last().unwrap().page, 5);
        assert_eq!(grid.page_rows().len(), 20);

        let need = grid
            .set_filter("fabric", ColumnFilter::new(FilterOperator::Equals, "f2"))
            .unwrap();
        assert!(need.is_needed());
        assert_eq!(grid.current_page(), 1);
        grid.reload(&adapter).await.unwrap();
        assert_eq!(
            adapter.state().requests.last().unwrap(),
            &ListRequest::full_dataset()
        );
        assert_eq!(grid.mode(), DataMode::Client);
        assert_eq!(grid.total_count(), 60);
        assert_eq!(grid.total_pages(), 3);

        assert!(!grid.go_to_page(3).is_needed());
        assert_eq!(grid.page_rows().len(), 10);

        assert!(!grid.set_global_filter("host-1").is_needed());
        let expected = hosts(120)
            .iter()
            .filter(|row| row["fabric"] == json!("F2"))
            .filter(|row| row["name"].as_str().unwrap_or("").contains("host-1"))
            .count();
        assert_eq!(grid.total_count(), expected);

        assert!(!grid.set_page_size(PageSize::All).is_needed());
        assert_eq!(grid.total_pages(), 1);
        assert_eq!(grid.page_rows().len(), expected);
    }

    #[tokio::test]
    async fn test_clearing_query_returns_to_server_paging() {
        let adapter = MockAdapter::with_rows(hosts(40));
        let mut grid = GridController::new("aliases", columns()).with_page_size(PageSize::Count(10));
        grid.reload(&adapter).await.unwrap();

        grid.set_global_filter("host-3");
        grid.reload(&adapter).await.unwrap();
        assert_eq!(grid.total_count(), 11);

        assert!(grid.clear_filters().is_needed());
        grid.reload(&adapter).await.unwrap();
        assert_eq!(grid.mode(), DataMode::Server);
        assert_eq!(grid.total_count(), 40);
        assert_eq!(grid.page_rows().len(), 10);
    }

    #[test]
    fn test_fill_down_respects_row_constraints() {
        let mut grid = GridController::new("aliases", columns());
        grid.load_rows(vec![
            json!({"id": 1, "name": "A", "fabric": "F1"}),
            json!({"id": 2, "name": "B", "fabric": "F1"}),
        ]);
        grid.select_visual(0, 2);
        grid.extend_to_visual(1, 2);

        // Same value: nothing to change
        let report = grid.fill_down().unwrap();
        assert_eq!(report.skipped, 0);
        assert_eq!(grid.store().rows()[1].fields()["fabric"], json!("F1"));
        assert!(!grid.is_dirty());

        // F2 is not an option for host B
        grid.set_cell_by_key(0, "fabric", json!("F2")).unwrap();
        let report = grid.fill_down().unwrap();
        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(grid.store().rows()[1].fields()["fabric"], json!("F1"));
    }

    #[test]
    fn test_fill_down_writes_valid_targets() {
        let mut grid = GridController::new("aliases", columns());
        grid.load_rows(vec![
            json!({"id": 1, "name": "A", "fabric": "F2"}),
            json!({"id": 2, "name": "B", "fabric": "F1"}),
            json!({"id": 3, "name": "C", "fabric": "F1"}),
            json!({"id": 4, "name": "D", "fabric": ""}),
        ]);
        grid.select_visual(0, 2);
        grid.extend_to_visual(3, 2);

        // N = 4 cells, M = 1 invalid target: N - 1 - M cells change
        let report = grid.fill_down().unwrap();
        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped, 1);
        let fabrics: Vec<Value> = grid
            .store()
            .rows()
            .iter()
            .map(|row| row.fields()["fabric"].clone())
            .collect();
        assert_eq!(fabrics, vec![json!("F2"), json!("F1"), json!("F2"), json!("F2")]);
        assert!(grid.is_dirty());
    }

    #[test]
    fn test_fill_needs_two_cells() {
        let mut grid = GridController::new("aliases", columns());
        grid.load_rows(abc());
        grid.select_visual(0, 1);
        assert!(matches!(
            grid.fill_right(),
            Err(GridError::SelectionTooSmall { needed: 2, found: 1 })
        ));
    }

    #[test]
    fn test_valid_paste_clears_invalid_flag() {
        let mut grid = GridController::new("aliases", columns());
        grid.load_rows(abc());
        let fabric = CellCoord::new(1, 2);

        grid.set_cell_by_key(1, "fabric", json!("F9")).unwrap();
        assert!(grid.invalid_cells().contains(&fabric));

        grid.select_visual(1, 2);
        let report = grid.paste("F1").unwrap();
        assert!(!report.has_warnings());
        assert_eq!(grid.store().rows()[1].fields()["fabric"], json!("F1"));
        assert!(grid.invalid_cells().is_empty());
    }

    #[test]
    fn test_fill_clears_invalid_flag_on_written_targets() {
        let mut grid = GridController::new("aliases", columns());
        grid.load_rows(vec![
            json!({"id": 1, "name": "A", "fabric": "F1"}),
            json!({"id": 2, "name": "C", "fabric": "F2"}),
        ]);
        grid.set_cell_by_key(1, "fabric", json!("F9")).unwrap();
        assert_eq!(grid.invalid_cells().len(), 1);

        grid.select_visual(0, 2);
        grid.extend_to_visual(1, 2);
        let report = grid.fill_down().unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(report.written_cells, vec![CellCoord::new(1, 2)]);
        assert_eq!(grid.store().rows()[1].fields()["fabric"], json!("F1"));
        assert!(grid.invalid_cells().is_empty());
    }

    #[test]
    fn test_sibling_edit_flags_dependent_dropdown() {
        let mut grid = GridController::new("aliases", columns());
        grid.load_rows(vec![json!({"id": 1, "name": "A", "fabric": "F2"})]);
        let fabric = CellCoord::new(0, 2);

        // Host B only allows F1, so the untouched F2 becomes invalid
        grid.set_cell_by_key(0, "name", json!("B")).unwrap();
        assert!(grid.invalid_cells().contains(&fabric));
        assert!(grid.render_cell(fabric).unwrap().invalid);

        grid.set_cell_by_key(0, "name", json!("A")).unwrap();
        assert!(grid.invalid_cells().is_empty());

        // Pasting the name is checked the same way
        grid.select_visual(0, 1);
        let report = grid.paste("B").unwrap();
        assert_eq!(report.invalid_cells, vec![fabric]);
        assert_eq!(report.warnings[0].value, "F2");
        assert!(grid.invalid_cells().contains(&fabric));
    }

    #[tokio::test]
    async fn test_unsaved_row_outside_filter_is_shown_but_not_counted() {
        let adapter = MockAdapter::with_rows(hosts(2));
        let mut grid = GridController::new("aliases", columns());
        grid.set_filter("fabric", ColumnFilter::new(FilterOperator::Equals, "F2"))
            .unwrap();
        grid.reload(&adapter).await.unwrap();
        assert_eq!(grid.total_count(), 1);

        let added = grid.add_row().unwrap();
        assert_eq!(grid.page_rows(), &[0, added]);
        assert_eq!(grid.total_count(), 1);
        assert_eq!(grid.total_pages(), 1);
    }

    #[tokio::test]
    async fn test_server_total_tracks_pending_adds_and_deletes() {
        let adapter = MockAdapter::with_rows(hosts(30));
        let mut grid = GridController::new("aliases", columns()).with_page_size(PageSize::Count(10));
        grid.reload(&adapter).await.unwrap();
        assert_eq!(grid.mode(), DataMode::Server);
        assert_eq!(grid.total_count(), 30);

        grid.add_row().unwrap();
        assert_eq!(grid.total_count(), 31);
        assert_eq!(grid.total_pages(), 4);

        grid.select_visual(0, 1);
        grid.toggle_visual(1, 1);
        assert_eq!(grid.delete_selection().unwrap(), 2);
        assert_eq!(grid.total_count(), 29);
        assert_eq!(grid.total_pages(), 3);

        grid.reload(&adapter).await.unwrap();
        assert_eq!(grid.total_count(), 30);
    }

    /// Duplicates the row its action was rendered for
    struct DuplicateRow {
        rows: Arc<Mutex<Vec<Option<usize>>>>,
    }

    impl ActionHandler for DuplicateRow {
        fn handle(
            &mut self,
            grid: &mut GridController,
            row: Option<usize>,
        ) -> GridResult<CommandOutcome> {
            self.rows.lock().unwrap().push(row);
            let Some(source) = row.and_then(|index| grid.store().get(index)).cloned() else {
                return Ok(CommandOutcome::Done);
            };
            Ok(CommandOutcome::RowAdded(grid.add_row_from(&source)?))
        }

        fn name(&self) -> &str {
            "duplicate"
        }
    }

    #[test]
    fn test_custom_cell_action_reaches_handler() {
        let actions = Column::custom(
            "actions",
            "Actions",
            Arc::new(|row: &Row| {
                CellContent::text("Duplicate".to_string())
                    .with_action(ActionDescriptor::custom("Duplicate", "duplicate", row))
            }),
        );
        let mut grid = GridController::new(
            "aliases",
            vec![Column::numeric("id", "ID"), Column::text("name", "Name"), actions],
        );
        grid.load_rows(abc());

        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(Box::new(DuplicateRow {
            rows: calls.clone(),
        }));

        let content = grid.render_visual(1, 2).unwrap();
        assert_eq!(content.text, "Duplicate");
        assert_eq!(content.actions.len(), 1);
        assert_eq!(grid.render_visual(1, 1).unwrap().text, "A");

        let command = content.actions[0].command.clone();
        let outcome = dispatcher.dispatch(&mut grid, command).unwrap();
        assert_eq!(outcome, CommandOutcome::RowAdded(3));
        assert_eq!(*calls.lock().unwrap(), vec![Some(1)]);
        assert_eq!(grid.store().rows()[3].fields()["name"], json!("A"));
        assert_eq!(grid.store().rows()[3].id(), None);
    }

    #[test]
    fn test_copy_and_paste_back_leaves_store_unchanged() {
        let mut grid = GridController::new(
            "aliases",
            vec![
                Column::numeric("id", "ID"),
                Column::text("name", "Name"),
                fabric_column(),
                Column::checkbox("active", "Active"),
                Column::numeric("port", "Port"),
            ],
        );
        grid.load_rows(vec![
            json!({"id": 1, "name": "esx-01", "fabric": "F1", "active": true, "port": 4}),
            json!({"id": 2, "name": "esx-02", "fabric": "F2", "active": false, "port": null}),
            json!({"id": 3, "name": "B", "fabric": "F1", "active": true, "port": 12}),
        ]);
        let before: Vec<Row> = grid.store().rows().to_vec();

        grid.select_all();
        let text = grid.copy_selection().unwrap();
        assert_eq!(
            text,
            "1\tesx-01\tF1\tTRUE\t4\n2\tesx-02\tF2\tFALSE\t\n3\tB\tF1\tTRUE\t12"
        );

        grid.select_visual(0, 0);
        let report = grid.paste(&text).unwrap();
        assert_eq!(report.rows_added, 0);
        assert!(!report.has_warnings());
        assert_eq!(grid.store().rows(), before.as_slice());
        grid.select_all();
        assert_eq!(grid.copy_selection().unwrap(), text);
    }
}
