//! Command dispatcher for grid interactions
//!
//! Every user interaction is expressed as a `GridCommand`. Custom cells do
//! not call into the grid themselves: their renderer returns typed action
//! descriptors, and the dispatcher routes those to registered handlers.

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::clipboard::PasteReport;
use crate::data::filter::ColumnFilter;
use crate::data::row_store::{Row, RowId};
use crate::data::sort::SortDirection;
use crate::error::{GridError, GridResult};
use crate::fill::FillReport;
use crate::state::grid::GridController;
use crate::state::pagination::{PageSize, ReloadNeed};
use crate::state::selection::{CellCoord, Direction};

/// Rendered content of one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellContent {
    pub text: String,
    pub actions: Vec<ActionDescriptor>,
    /// The value is not among the options its dropdown currently allows
    pub invalid: bool,
}

impl CellContent {
    pub fn text(text: String) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }
}

/// A clickable element inside a cell, resolved by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    pub label: String,
    pub command: GridCommand,
}

impl ActionDescriptor {
    pub fn new(label: &str, command: GridCommand) -> Self {
        Self {
            label: label.to_string(),
            command,
        }
    }

    /// Descriptor for a named custom action on `row`
    pub fn custom(label: &str, action: &str, row: &Row) -> Self {
        Self::new(
            label,
            GridCommand::Custom {
                action: action.to_string(),
                row_id: row.id(),
            },
        )
    }
}

/// Everything a user can do to a grid. Cell coordinates are visual
/// positions in the resolved view; they are translated to data indices
/// before anything is mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum GridCommand {
    SelectCell { row: usize, col: usize },
    ToggleCell { row: usize, col: usize },
    ExtendTo { row: usize, col: usize },
    SelectAll,
    ClearSelection,
    Move { direction: Direction, extend: bool },
    BeginEdit,
    OpenDropdown,
    ReturnToGrid,
    /// Write to the current cell
    SetCurrent(Value),
    /// Write a UI-only field of a row without marking it dirty
    SetSilent { row: usize, field: String, value: Value },
    Copy,
    Paste(String),
    FillDown,
    FillRight,
    AddRow,
    DeleteSelection,
    SetFilter { column: String, filter: ColumnFilter },
    RemoveFilter(String),
    ClearFilters,
    SetGlobalFilter(String),
    SetSort { column: String, direction: SortDirection },
    ClearSort,
    GoToPage(usize),
    SetPageSize(PageSize),
    Custom { action: String, row_id: Option<RowId> },
}

impl GridCommand {
    fn name(&self) -> &'static str {
        match self {
            GridCommand::SelectCell { .. } => "select_cell",
            GridCommand::ToggleCell { .. } => "toggle_cell",
            GridCommand::ExtendTo { .. } => "extend_to",
            GridCommand::SelectAll => "select_all",
            GridCommand::ClearSelection => "clear_selection",
            GridCommand::Move { .. } => "move",
            GridCommand::BeginEdit => "begin_edit",
            GridCommand::OpenDropdown => "open_dropdown",
            GridCommand::ReturnToGrid => "return_to_grid",
            GridCommand::SetCurrent(_) => "set_current",
            GridCommand::SetSilent { .. } => "set_silent",
            GridCommand::Copy => "copy",
            GridCommand::Paste(_) => "paste",
            GridCommand::FillDown => "fill_down",
            GridCommand::FillRight => "fill_right",
            GridCommand::AddRow => "add_row",
            GridCommand::DeleteSelection => "delete_selection",
            GridCommand::SetFilter { .. } => "set_filter",
            GridCommand::RemoveFilter(_) => "remove_filter",
            GridCommand::ClearFilters => "clear_filters",
            GridCommand::SetGlobalFilter(_) => "set_global_filter",
            GridCommand::SetSort { .. } => "set_sort",
            GridCommand::ClearSort => "clear_sort",
            GridCommand::GoToPage(_) => "go_to_page",
            GridCommand::SetPageSize(_) => "set_page_size",
            GridCommand::Custom { .. } => "custom",
        }
    }
}

/// Result of one dispatched command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Done,
    /// The rows must be fetched again before the view is accurate
    ReloadRequired,
    Selected(Option<CellCoord>),
    Copied(String),
    Pasted(PasteReport),
    Filled(FillReport),
    RowAdded(usize),
    RowsDeleted(usize),
}

impl From<ReloadNeed> for CommandOutcome {
    fn from(need: ReloadNeed) -> Self {
        if need.is_needed() {
            CommandOutcome::ReloadRequired
        } else {
            CommandOutcome::Done
        }
    }
}

/// Handler for a named custom cell action (e.g. "open details")
pub trait ActionHandler {
    fn handle(&mut self, grid: &mut GridController, row: Option<usize>) -> GridResult<CommandOutcome>;

    /// Action name this handler is registered under
    fn name(&self) -> &str;
}

pub struct CommandDispatcher {
    handlers: HashMap<String, Box<dyn ActionHandler>>,

    /// Recent commands for debugging
    history: Vec<GridCommand>,

    max_history: usize,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            history: Vec::new(),
            max_history: 100,
        }
    }

    pub fn register(&mut self, handler: Box<dyn ActionHandler>) {
        info!("CommandDispatcher: registering handler '{}'", handler.name());
        self.handlers.insert(handler.name().to_string(), handler);
    }

    pub fn history(&self) -> &[GridCommand] {
        &self.history
    }

    pub fn dispatch(
        &mut self,
        grid: &mut GridController,
        command: GridCommand,
    ) -> GridResult<CommandOutcome> {
        debug!("CommandDispatcher: dispatching {}", command.name());
        self.history.push(command.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        let outcome = match command {
            GridCommand::SelectCell { row, col } => {
                CommandOutcome::Selected(grid.select_visual(row, col))
            }
            GridCommand::ToggleCell { row, col } => {
                CommandOutcome::Selected(grid.toggle_visual(row, col))
            }
            GridCommand::ExtendTo { row, col } => {
                CommandOutcome::Selected(grid.extend_to_visual(row, col))
            }
            GridCommand::SelectAll => {
                grid.select_all();
                CommandOutcome::Done
            }
            GridCommand::ClearSelection => {
                grid.clear_selection();
                CommandOutcome::Done
            }
            GridCommand::Move { direction, extend } => {
                CommandOutcome::Selected(grid.move_cursor(direction, extend))
            }
            GridCommand::BeginEdit => CommandOutcome::Selected(grid.begin_edit()),
            GridCommand::OpenDropdown => CommandOutcome::Selected(grid.open_dropdown()),
            GridCommand::ReturnToGrid => {
                grid.return_to_grid();
                CommandOutcome::Done
            }
            GridCommand::SetCurrent(value) => match grid.selection().current() {
                Some(cell) => {
                    grid.set_cell(cell.row, cell.col, value)?;
                    CommandOutcome::Done
                }
                None => CommandOutcome::Done,
            },
            GridCommand::SetSilent { row, field, value } => {
                grid.set_silent(row, &field, value);
                CommandOutcome::Done
            }
            GridCommand::Copy => match grid.copy_selection() {
                Some(text) => CommandOutcome::Copied(text),
                None => CommandOutcome::Done,
            },
            GridCommand::Paste(text) => CommandOutcome::Pasted(grid.paste(&text)?),
            GridCommand::FillDown => CommandOutcome::Filled(grid.fill_down()?),
            GridCommand::FillRight => CommandOutcome::Filled(grid.fill_right()?),
            GridCommand::AddRow => CommandOutcome::RowAdded(grid.add_row()?),
            GridCommand::DeleteSelection => CommandOutcome::RowsDeleted(grid.delete_selection()?),
            GridCommand::SetFilter { column, filter } => grid.set_filter(&column, filter)?.into(),
            GridCommand::RemoveFilter(column) => grid.remove_filter(&column).into(),
            GridCommand::ClearFilters => grid.clear_filters().into(),
            GridCommand::SetGlobalFilter(text) => grid.set_global_filter(&text).into(),
            GridCommand::SetSort { column, direction } => grid.set_sort(&column, direction)?.into(),
            GridCommand::ClearSort => grid.clear_sort().into(),
            GridCommand::GoToPage(page) => grid.go_to_page(page).into(),
            GridCommand::SetPageSize(size) => grid.set_page_size(size).into(),
            GridCommand::Custom { action, row_id } => {
                let Some(handler) = self.handlers.get_mut(&action) else {
                    warn!("CommandDispatcher: no handler for action '{}'", action);
                    return Err(GridError::UnknownAction(action));
                };
                // A row deleted since rendering resolves to None
                let row = row_id.as_ref().and_then(|id| grid.store().index_of(id));
                handler.handle(grid, row)?
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::column::Column;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Duplicate {
        calls: usize,
    }

    impl ActionHandler for Duplicate {
        fn handle(
            &mut self,
            grid: &mut GridController,
            row: Option<usize>,
        ) -> GridResult<CommandOutcome> {
            self.calls += 1;
            let Some(source) = row.and_then(|index| grid.store().get(index)).cloned() else {
                return Ok(CommandOutcome::Done);
            };
            Ok(CommandOutcome::RowAdded(grid.add_row_from(&source)?))
        }

        fn name(&self) -> &str {
            "duplicate"
        }
    }

    fn grid() -> GridController {
        let mut grid = GridController::new(
            "aliases",
            vec![Column::numeric("id", "ID"), Column::text("name", "Name")],
        );
        grid.load_rows(vec![json!({"id": 7, "name": "a"}), json!({"id": 8, "name": "b"})]);
        grid
    }

    #[test]
    fn test_visual_click_then_copy() {
        let mut grid = grid();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher
            .dispatch(&mut grid, GridCommand::SelectCell { row: 0, col: 1 })
            .unwrap();
        dispatcher
            .dispatch(&mut grid, GridCommand::ExtendTo { row: 1, col: 1 })
            .unwrap();
        let outcome = dispatcher.dispatch(&mut grid, GridCommand::Copy).unwrap();
        assert_eq!(outcome, CommandOutcome::Copied("a\nb".to_string()));
        assert_eq!(dispatcher.history().len(), 3);
    }

    #[test]
    fn test_custom_action_resolves_row_by_id() {
        let mut grid = grid();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(Box::new(Duplicate { calls: 0 }));

        let row = grid.store().get(1).cloned().unwrap();
        let action = ActionDescriptor::custom("Duplicate", "duplicate", &row);
        let outcome = dispatcher.dispatch(&mut grid, action.command).unwrap();
        assert_eq!(outcome, CommandOutcome::RowAdded(2));
        assert_eq!(grid.store().get(2).unwrap().fields()["name"], json!("b"));
        assert_eq!(grid.store().get(2).unwrap().id(), None);
    }

    #[test]
    fn test_unknown_action_is_an_error() {
        let mut grid = grid();
        let mut dispatcher = CommandDispatcher::new();
        let err = dispatcher
            .dispatch(
                &mut grid,
                GridCommand::Custom {
                    action: "explode".to_string(),
                    row_id: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, GridError::UnknownAction(name) if name == "explode"));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut grid = grid();
        let mut dispatcher = CommandDispatcher::new();
        for _ in 0..150 {
            dispatcher.dispatch(&mut grid, GridCommand::SelectAll).unwrap();
        }
        assert_eq!(dispatcher.history().len(), 100);
    }
}
