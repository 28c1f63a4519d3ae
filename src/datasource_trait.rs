use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::row_store::{Row, RowId};
use crate::error::{AdapterError, EntityError};
use crate::state::pagination::ListRequest;

/// One page (or the whole dataset) as returned by a list call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(alias = "results", default)]
    pub items: Vec<Value>,
    #[serde(rename = "totalCount", alias = "count", alias = "total_count", default)]
    pub total_count: usize,
}

impl ListResponse {
    pub fn new(items: Vec<Value>, total_count: usize) -> Self {
        Self { items, total_count }
    }
}

/// Outcome of a transactional multi-row save
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkSaveResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<EntityError>,
}

/// Remote source of one entity's rows.
/// The grid calls it but never implements it; HTTP, fixtures and test mocks
/// all sit behind this trait.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Fetch one page, or everything when the page size is `All`
    async fn list(&self, request: &ListRequest) -> Result<ListResponse, AdapterError>;

    /// Persist a new row; the returned row carries the assigned id
    async fn create(&self, row: &Row) -> Result<Row, AdapterError>;

    async fn update(&self, id: &RowId, row: &Row) -> Result<Row, AdapterError>;

    async fn delete(&self, id: &RowId) -> Result<(), AdapterError>;

    /// Whether `bulk_save` should be used instead of per-row calls
    fn supports_bulk_save(&self) -> bool {
        false
    }

    /// Save changed rows and deletions in one transaction
    async fn bulk_save(
        &self,
        _rows: &[Row],
        _deleted: &[RowId],
    ) -> Result<BulkSaveResult, AdapterError> {
        Err(AdapterError::Rejected(
            "bulk save is not supported by this adapter".to_string(),
        ))
    }

    /// Entity name used in logs
    fn entity_name(&self) -> &str;
}
