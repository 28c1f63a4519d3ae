//! Per-user grid preferences and their debounced persistence
//!
//! Preferences are best-effort: read and write failures are logged and
//! never reach the user. A write is always merged into what is already
//! stored, so two grids saving different fields do not clobber each other.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::data::filter::FilterSet;
use crate::data::sort::SortKey;
use crate::debouncer::Debouncer;
use crate::error::{AdapterError, PreferencesError};
use crate::state::pagination::PageSize;

/// Identifies one stored preference record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreferenceKey {
    pub customer_id: String,
    pub table_name: String,
    pub user_id: String,
}

impl PreferenceKey {
    pub fn new(customer_id: &str, table_name: &str, user_id: &str) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            table_name: table_name.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// File name safe on every platform
    fn file_name(&self) -> String {
        let clean = |part: &str| -> String {
            part.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                .collect()
        };
        format!(
            "{}__{}__{}.json",
            clean(&self.customer_id),
            clean(&self.table_name),
            clean(&self.user_id)
        )
    }
}

/// Everything a user can customize about one grid. Absent fields leave the
/// grid's defaults (or the previously stored value) alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_widths: Option<BTreeMap<String, u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortKey>>,
}

impl GridPreferences {
    pub fn is_empty(&self) -> bool {
        *self == GridPreferences::default()
    }

    /// Overlay `newer` onto `self`. Column widths merge per column; every
    /// other field present in `newer` replaces the stored one.
    pub fn merge(&mut self, newer: GridPreferences) {
        if let Some(widths) = newer.column_widths {
            self.column_widths
                .get_or_insert_with(BTreeMap::new)
                .extend(widths);
        }
        if newer.visible_columns.is_some() {
            self.visible_columns = newer.visible_columns;
        }
        if newer.filters.is_some() {
            self.filters = newer.filters;
        }
        if newer.page_size.is_some() {
            self.page_size = newer.page_size;
        }
        if newer.current_page.is_some() {
            self.current_page = newer.current_page;
        }
        if newer.sort.is_some() {
            self.sort = newer.sort;
        }
    }
}

#[async_trait]
pub trait PreferencesStore: Send + Sync {
    async fn get(&self, key: &PreferenceKey) -> Result<Option<GridPreferences>, PreferencesError>;

    /// Merge `preferences` into the stored record
    async fn put(
        &self,
        key: &PreferenceKey,
        preferences: &GridPreferences,
    ) -> Result<(), PreferencesError>;
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FilePreferencesStore {
    dir: PathBuf,
}

impl FilePreferencesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &PreferenceKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn read(&self, key: &PreferenceKey) -> Result<Option<GridPreferences>, PreferencesError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl PreferencesStore for FilePreferencesStore {
    async fn get(&self, key: &PreferenceKey) -> Result<Option<GridPreferences>, PreferencesError> {
        self.read(key)
    }

    async fn put(
        &self,
        key: &PreferenceKey,
        preferences: &GridPreferences,
    ) -> Result<(), PreferencesError> {
        let mut stored = self.read(key)?.unwrap_or_default();
        stored.merge(preferences.clone());
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        fs::write(&path, serde_json::to_string_pretty(&stored)?)?;
        debug!("FilePreferencesStore: wrote {}", path.display());
        Ok(())
    }
}

/// Preferences kept by the console's settings endpoint
#[derive(Debug, Clone)]
pub struct RemotePreferencesStore {
    base_url: String,
    client: reqwest::Client,
}

impl RemotePreferencesStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PreferencesError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AdapterError::from)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url(&self, key: &PreferenceKey) -> String {
        format!(
            "{}/preferences/{}/{}/{}/",
            self.base_url, key.customer_id, key.table_name, key.user_id
        )
    }
}

#[async_trait]
impl PreferencesStore for RemotePreferencesStore {
    async fn get(&self, key: &PreferenceKey) -> Result<Option<GridPreferences>, PreferencesError> {
        let response = self
            .client
            .get(self.url(key))
            .send()
            .await
            .map_err(AdapterError::from)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        let body = response.text().await.map_err(AdapterError::from)?;
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn put(
        &self,
        key: &PreferenceKey,
        preferences: &GridPreferences,
    ) -> Result<(), PreferencesError> {
        let mut stored = self.get(key).await?.unwrap_or_default();
        stored.merge(preferences.clone());
        let response = self
            .client
            .put(self.url(key))
            .json(&stored)
            .send()
            .await
            .map_err(AdapterError::from)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(())
    }
}

type PendingWrite = (PreferenceKey, GridPreferences);

/// Batches preference changes into one write per key after a quiet period.
/// Dropping it cancels the pending write; `shutdown` flushes first.
pub struct PreferenceAutosave {
    sender: Option<mpsc::UnboundedSender<PendingWrite>>,
    handle: Option<JoinHandle<()>>,
}

impl PreferenceAutosave {
    /// Start the autosave task on the current tokio runtime
    pub fn spawn(store: Arc<dyn PreferencesStore>, delay_ms: u64) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_autosave(store, receiver, Debouncer::new(delay_ms)));
        info!("PreferenceAutosave: started with {}ms debounce", delay_ms);
        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// Queue the latest preferences for `key`, replacing any queued payload
    pub fn schedule(&self, key: PreferenceKey, preferences: GridPreferences) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send((key, preferences)).is_err() {
            warn!("PreferenceAutosave: task has stopped, dropping preference update");
        }
    }

    /// Write whatever is pending now and stop the task
    pub async fn shutdown(mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("PreferenceAutosave: task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PreferenceAutosave {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("PreferenceAutosave: cancelling pending writes");
            handle.abort();
        }
    }
}

async fn run_autosave(
    store: Arc<dyn PreferencesStore>,
    mut receiver: mpsc::UnboundedReceiver<PendingWrite>,
    mut debouncer: Debouncer,
) {
    let mut pending: HashMap<PreferenceKey, GridPreferences> = HashMap::new();
    loop {
        let wait = debouncer.time_remaining();
        tokio::select! {
            message = receiver.recv() => match message {
                Some((key, preferences)) => {
                    pending.insert(key, preferences);
                    debouncer.trigger();
                }
                None => {
                    flush(store.as_ref(), &mut pending).await;
                    break;
                }
            },
            _ = tokio::time::sleep(wait.unwrap_or_default()), if wait.is_some() => {
                if debouncer.should_execute() {
                    flush(store.as_ref(), &mut pending).await;
                }
            }
        }
    }
    debug!("PreferenceAutosave: task finished");
}

async fn flush(store: &dyn PreferencesStore, pending: &mut HashMap<PreferenceKey, GridPreferences>) {
    for (key, preferences) in pending.drain() {
        match store.put(&key, &preferences).await {
            Ok(()) => debug!("PreferenceAutosave: saved preferences for {}", key.table_name),
            Err(e) => warn!(
                "PreferenceAutosave: failed to save preferences for {}: {}",
                key.table_name, e
            ),
        }
    }
}
