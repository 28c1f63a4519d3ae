//! Error types for the grid engine and its I/O boundaries

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::row_store::RowId;

/// Failures raised by a persistence adapter (network, HTTP status, decoding)
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(String),
}

/// A per-entity error reported by the server or by local validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityError {
    #[serde(default)]
    pub row: Option<RowId>,
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

impl EntityError {
    pub fn new(row: Option<RowId>, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Structured save failure. The dirty snapshot is kept when this is returned.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SaveFailure {
    pub message: String,
    pub errors: Vec<EntityError>,
}

impl SaveFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<EntityError>) -> Self {
        self.errors = errors;
        self
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Failed to load rows: {message}")]
    LoadFailure { message: String },

    #[error("Failed to save changes: {0}")]
    SaveFailure(#[from] SaveFailure),

    #[error("Cannot {operation} while a load or save is in progress")]
    Busy { operation: &'static str },

    #[error("There are no pending changes to save")]
    NothingToSave,

    #[error("Operation needs at least {needed} selected cells, found {found}")]
    SelectionTooSmall { needed: usize, found: usize },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("No handler registered for action '{0}'")]
    UnknownAction(String),
}

pub type GridResult<T> = std::result::Result<T, GridError>;

/// Preference persistence errors. These are logged and never surfaced to the user.
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Preferences I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preferences request failed: {0}")]
    Remote(#[from] AdapterError),
}
