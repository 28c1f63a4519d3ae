use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::data::row_store::{Row, RowId};
use crate::datasource_trait::{BulkSaveResult, ListResponse, PersistenceAdapter};
use crate::error::AdapterError;
use crate::state::pagination::{ListRequest, PageSize};

/// Body of a bulk save request
#[derive(Debug, Serialize)]
struct BulkSaveRequest<'a> {
    rows: &'a [Row],
    #[serde(rename = "deletedIds")]
    deleted_ids: &'a [RowId],
}

/// REST adapter for one entity of the inventory API.
///
/// Endpoints, relative to `{base_url}/{entity}/`:
/// `GET ?page=&page_size=&search=&filters=`, `POST`, `PUT {id}/`,
/// `DELETE {id}/` and, when enabled, `POST bulk/`.
#[derive(Clone)]
pub struct HttpPersistenceAdapter {
    base_url: String,
    entity: String,
    bulk: bool,
    client: reqwest::Client,
}

impl HttpPersistenceAdapter {
    pub fn new(base_url: &str, entity: &str, timeout: Duration) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            entity: entity.trim_matches('/').to_string(),
            bulk: false,
            client,
        })
    }

    /// Route saves through the transactional bulk endpoint
    pub fn with_bulk_save(mut self, bulk: bool) -> Self {
        self.bulk = bulk;
        self
    }

    pub fn collection_url(&self) -> String {
        format!("{}/{}/", self.base_url, self.entity)
    }

    pub fn item_url(&self, id: &RowId) -> String {
        format!("{}{}/", self.collection_url(), id)
    }

    /// Query parameters for a list request
    pub fn list_query(request: &ListRequest) -> Result<Vec<(&'static str, String)>, AdapterError> {
        let mut query = vec![
            ("page", request.page.max(1).to_string()),
            (
                "page_size",
                match request.page_size {
                    PageSize::Count(count) => count.to_string(),
                    PageSize::All => "All".to_string(),
                },
            ),
        ];
        if let Some(search) = &request.search {
            query.push(("search", search.clone()));
        }
        if !request.filters.columns.is_empty() {
            query.push(("filters", serde_json::to_string(&request.filters.columns)?));
        }
        Ok(query)
    }

    /// Accepts `{items, totalCount}`, `{results, count}` or a bare array
    pub fn parse_list_response(body: &str) -> Result<ListResponse, AdapterError> {
        let value: Value = serde_json::from_str(body)?;
        match value {
            Value::Array(items) => {
                let total = items.len();
                Ok(ListResponse::new(items, total))
            }
            other => Ok(serde_json::from_value(other)?),
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<String, AdapterError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn parse_row(body: &str) -> Result<Row, AdapterError> {
        let value: Value = serde_json::from_str(body)?;
        Row::from_value(value)
            .ok_or_else(|| AdapterError::Rejected("Expected a JSON object for the saved row".to_string()))
    }
}

#[async_trait]
impl PersistenceAdapter for HttpPersistenceAdapter {
    async fn list(&self, request: &ListRequest) -> Result<ListResponse, AdapterError> {
        let query = Self::list_query(request)?;
        debug!("HttpPersistenceAdapter: GET {} {:?}", self.collection_url(), query);
        let response = self
            .client
            .get(self.collection_url())
            .query(&query)
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        Self::parse_list_response(&body)
    }

    async fn create(&self, row: &Row) -> Result<Row, AdapterError> {
        debug!("HttpPersistenceAdapter: POST {}", self.collection_url());
        let response = self
            .client
            .post(self.collection_url())
            .json(row)
            .send()
            .await?;
        Self::parse_row(&Self::read_body(response).await?)
    }

    async fn update(&self, id: &RowId, row: &Row) -> Result<Row, AdapterError> {
        debug!("HttpPersistenceAdapter: PUT {}", self.item_url(id));
        let response = self.client.put(self.item_url(id)).json(row).send().await?;
        Self::parse_row(&Self::read_body(response).await?)
    }

    async fn delete(&self, id: &RowId) -> Result<(), AdapterError> {
        debug!("HttpPersistenceAdapter: DELETE {}", self.item_url(id));
        let response = self.client.delete(self.item_url(id)).send().await?;
        Self::read_body(response).await?;
        Ok(())
    }

    fn supports_bulk_save(&self) -> bool {
        self.bulk
    }

    async fn bulk_save(&self, rows: &[Row], deleted: &[RowId]) -> Result<BulkSaveResult, AdapterError> {
        let url = format!("{}bulk/", self.collection_url());
        info!(
            "HttpPersistenceAdapter: bulk save of {} rows, {} deletions to {}",
            rows.len(),
            deleted.len(),
            url
        );
        let body = BulkSaveRequest {
            rows,
            deleted_ids: deleted,
        };
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        // Validation failures come back as 4xx with a structured body
        match serde_json::from_str::<BulkSaveResult>(&text) {
            Ok(result) => Ok(result),
            Err(_) if !status.is_success() => Err(AdapterError::Status {
                status: status.as_u16(),
                body: text,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn entity_name(&self) -> &str {
        &self.entity
    }
}
