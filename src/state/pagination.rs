//! Paging across the two data modes
//!
//! Server mode asks the persistence adapter for one page at a time. As soon
//! as a filter, the global search or a sort is active the grid switches to
//! client mode: the full unfiltered dataset is fetched once and paging,
//! counting and filtering happen in memory.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::data::filter::FilterSet;

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Rows per page, or everything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    Count(usize),
    All,
}

impl PageSize {
    pub fn limit(self) -> Option<usize> {
        match self {
            PageSize::Count(count) => Some(count.max(1)),
            PageSize::All => None,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Count(DEFAULT_PAGE_SIZE)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Count(count) => write!(f, "{count}"),
            PageSize::All => write!(f, "all"),
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(PageSize::All);
        }
        match s.parse::<usize>() {
            Ok(0) => Err("page size must be positive".to_string()),
            Ok(count) => Ok(PageSize::Count(count)),
            Err(_) => Err(format!("invalid page size '{s}'")),
        }
    }
}

impl Serialize for PageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageSize::Count(count) => serializer.serialize_u64(*count as u64),
            PageSize::All => serializer.serialize_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(usize),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Count(0) => Err(serde::de::Error::custom("page size must be positive")),
            Raw::Count(count) => Ok(PageSize::Count(count)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataMode {
    #[default]
    Server,
    Client,
}

impl DataMode {
    /// Client mode whenever anything would make per-page results wrong
    pub fn required_for(filters: &FilterSet, sort_active: bool) -> Self {
        if filters.is_active() || sort_active {
            DataMode::Client
        } else {
            DataMode::Server
        }
    }
}

/// Parameters of one list request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListRequest {
    /// 1-based page number
    pub page: usize,
    pub page_size: PageSize,
    pub search: Option<String>,
    pub filters: FilterSet,
}

impl ListRequest {
    /// The request that materializes the whole unfiltered dataset
    pub fn full_dataset() -> Self {
        Self {
            page: 1,
            page_size: PageSize::All,
            search: None,
            filters: FilterSet::default(),
        }
    }
}

/// Whether a state change requires fetching rows again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadNeed {
    None,
    Reload,
}

impl ReloadNeed {
    pub fn is_needed(self) -> bool {
        self == ReloadNeed::Reload
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pagination {
    current_page: usize,
    page_size: PageSize,
    mode: DataMode,
    server_total: usize,
    /// Unsaved local rows and pending deletions not yet reflected in
    /// `server_total`
    local_added: usize,
    local_removed: usize,
    /// True once the store holds the complete dataset for client mode
    materialized: bool,
}

impl Pagination {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            current_page: 1,
            page_size,
            ..Self::default()
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page.max(1)
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    /// Request for the rows this grid needs next
    pub fn request(&self, filters: &FilterSet) -> ListRequest {
        match self.mode {
            DataMode::Client => ListRequest::full_dataset(),
            DataMode::Server => ListRequest {
                page: self.current_page(),
                page_size: self.page_size,
                search: filters.global.clone(),
                filters: FilterSet {
                    columns: filters.active_columns(),
                    global: None,
                },
            },
        }
    }

    /// Record the outcome of a successful load
    pub fn on_loaded(&mut self, request: &ListRequest, total_count: usize) {
        self.server_total = total_count;
        self.materialized = self.mode == DataMode::Client
            && request.page_size == PageSize::All
            && request.filters.columns.is_empty()
            && request.search.is_none();
    }

    /// Record rows added or deleted locally since the last load
    pub fn set_local_changes(&mut self, added: usize, removed: usize) {
        self.local_added = added;
        self.local_removed = removed;
    }

    /// Filters, search or sort changed. Resets to page 1 and switches mode if
    /// needed. In server mode any change needs a reload; in client mode only
    /// the first switch does.
    pub fn on_query_changed(&mut self, filters: &FilterSet, sort_active: bool) -> ReloadNeed {
        self.current_page = 1;
        let required = DataMode::required_for(filters, sort_active);
        if required != self.mode {
            debug!("Pagination: switching mode {:?} -> {:?}", self.mode, required);
            self.mode = required;
            self.materialized = false;
            return ReloadNeed::Reload;
        }
        match self.mode {
            DataMode::Server => ReloadNeed::Reload,
            DataMode::Client if !self.materialized => ReloadNeed::Reload,
            DataMode::Client => ReloadNeed::None,
        }
    }

    pub fn go_to_page(&mut self, page: usize, visible_rows: usize) -> ReloadNeed {
        let page = page.clamp(1, self.total_pages(visible_rows));
        if page == self.current_page() {
            return ReloadNeed::None;
        }
        self.current_page = page;
        match self.mode {
            DataMode::Server => ReloadNeed::Reload,
            DataMode::Client => ReloadNeed::None,
        }
    }

    pub fn set_page_size(&mut self, page_size: PageSize) -> ReloadNeed {
        if page_size == self.page_size {
            return ReloadNeed::None;
        }
        self.page_size = page_size;
        self.current_page = 1;
        match self.mode {
            DataMode::Server => ReloadNeed::Reload,
            DataMode::Client => ReloadNeed::None,
        }
    }

    /// Restore a page number without validation (from preferences)
    pub fn restore_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Total matching items: the server's count adjusted by pending local
    /// adds and deletes in server mode, `matching_rows` in client mode
    pub fn total_count(&self, matching_rows: usize) -> usize {
        match self.mode {
            DataMode::Server => {
                (self.server_total + self.local_added).saturating_sub(self.local_removed)
            }
            DataMode::Client => matching_rows,
        }
    }

    pub fn total_pages(&self, visible_rows: usize) -> usize {
        let total = self.total_count(visible_rows);
        match self.page_size.limit() {
            Some(size) => total.div_ceil(size).max(1),
            None => 1,
        }
    }

    /// Keep the current page inside the page range after the row set shrank
    pub fn clamp_page(&mut self, visible_rows: usize) {
        if self.mode == DataMode::Client {
            self.current_page = self.current_page().min(self.total_pages(visible_rows));
        }
    }

    /// Visual offset and length of the current page within the resolved view.
    /// In server mode the view already is the page.
    pub fn window(&self) -> (usize, Option<usize>) {
        match (self.mode, self.page_size.limit()) {
            (DataMode::Client, Some(size)) => ((self.current_page() - 1) * size, Some(size)),
            _ => (0, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{ColumnFilter, FilterOperator};

    fn active_filters() -> FilterSet {
        let mut filters = FilterSet::new();
        filters.set("name", ColumnFilter::new(FilterOperator::Contains, "a"));
        filters
    }

    #[test]
    fn test_server_mode_requests_single_pages() {
        let mut pagination = Pagination::new(PageSize::Count(25));
        assert_eq!(pagination.mode(), DataMode::Server);
        pagination.on_loaded(&pagination.request(&FilterSet::new()), 120);
        assert_eq!(pagination.total_pages(25), 5);

        assert_eq!(pagination.go_to_page(3, 25), ReloadNeed::Reload);
        let request = pagination.request(&FilterSet::new());
        assert_eq!(request.page, 3);
        assert_eq!(request.page_size, PageSize::Count(25));
        assert_eq!(pagination.window(), (0, None));
    }

    #[test]
    fn test_server_total_counts_local_changes() {
        let mut pagination = Pagination::new(PageSize::Count(10));
        pagination.on_loaded(&pagination.request(&FilterSet::new()), 20);
        pagination.set_local_changes(1, 0);
        assert_eq!(pagination.total_count(0), 21);
        assert_eq!(pagination.total_pages(0), 3);

        pagination.set_local_changes(1, 3);
        assert_eq!(pagination.total_count(0), 18);
        assert_eq!(pagination.total_pages(0), 2);
    }

    #[test]
    fn test_filter_switches_to_client_mode_once() {
        let mut pagination = Pagination::new(PageSize::Count(10));
        pagination.go_to_page(2, 0);
        let filters = active_filters();

        assert_eq!(pagination.on_query_changed(&filters, false), ReloadNeed::Reload);
        assert_eq!(pagination.mode(), DataMode::Client);
        assert_eq!(pagination.current_page(), 1);
        let request = pagination.request(&filters);
        assert_eq!(request, ListRequest::full_dataset());

        pagination.on_loaded(&request, 300);
        assert!(pagination.is_materialized());
        assert_eq!(pagination.on_query_changed(&filters, true), ReloadNeed::None);
        assert_eq!(pagination.total_count(42), 42);
        assert_eq!(pagination.total_pages(42), 5);

        assert_eq!(pagination.go_to_page(5, 42), ReloadNeed::None);
        assert_eq!(pagination.window(), (40, Some(10)));
        pagination.clamp_page(15);
        assert_eq!(pagination.current_page(), 2);
    }

    #[test]
    fn test_clearing_filters_returns_to_server_mode() {
        let mut pagination = Pagination::new(PageSize::Count(10));
        pagination.on_query_changed(&active_filters(), false);
        assert_eq!(pagination.on_query_changed(&FilterSet::new(), false), ReloadNeed::Reload);
        assert_eq!(pagination.mode(), DataMode::Server);
        assert!(!pagination.is_materialized());
    }

    #[test]
    fn test_page_size_all() {
        let mut pagination = Pagination::new(PageSize::All);
        assert_eq!(pagination.total_pages(1000), 1);
        assert_eq!(pagination.set_page_size(PageSize::Count(100)), ReloadNeed::Reload);
        assert_eq!(pagination.set_page_size(PageSize::Count(100)), ReloadNeed::None);
        assert_eq!("all".parse::<PageSize>(), Ok(PageSize::All));
        assert!("0".parse::<PageSize>().is_err());
        assert_eq!(serde_json::to_string(&PageSize::All).unwrap(), "\"all\"");
        assert_eq!(serde_json::from_str::<PageSize>("25").unwrap(), PageSize::Count(25));
    }
}
