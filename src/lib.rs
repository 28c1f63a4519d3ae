//! Spreadsheet-style data grid engine for the SAN inventory console
//!
//! A `GridController` binds one entity's rows to selection, clipboard, fill,
//! filtering, frozen sorting and dual-mode paging. Rows come from a
//! `PersistenceAdapter`; user preferences go through a `PreferencesStore`.

pub mod api_client;
pub mod clipboard;
pub mod config;
pub mod data;
pub mod datasource_trait;
pub mod debouncer;
pub mod error;
pub mod fill;
pub mod logging;
pub mod preferences;
pub mod state;
pub mod utils;

pub use data::column::{Column, ColumnKind, ColumnSpec};
pub use data::row_store::{Row, RowId, RowStore};
pub use datasource_trait::{BulkSaveResult, ListResponse, PersistenceAdapter};
pub use error::{AdapterError, GridError, GridResult, SaveFailure};
pub use state::dispatcher::{CommandDispatcher, GridCommand};
pub use state::grid::GridController;
