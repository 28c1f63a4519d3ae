//! Per-column and global row predicates
//!
//! A row passes when every active column filter and the global filter pass.
//! All string comparisons are case-insensitive.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::data::cell_value::display_text;
use crate::data::column::Column;
use crate::data::row_store::{Row, RowStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    #[default]
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Equals,
    NotEquals,
    IsEmpty,
    IsNotEmpty,
    Items,
}

impl FilterOperator {
    /// Operators that ignore the filter value
    pub fn is_unary(self) -> bool {
        matches!(self, FilterOperator::IsEmpty | FilterOperator::IsNotEmpty)
    }

    pub fn parse(name: &str) -> Option<Self> {
        let op = match name.to_ascii_lowercase().as_str() {
            "contains" => FilterOperator::Contains,
            "not_contains" => FilterOperator::NotContains,
            "starts_with" => FilterOperator::StartsWith,
            "ends_with" => FilterOperator::EndsWith,
            "equals" | "eq" => FilterOperator::Equals,
            "not_equals" | "ne" => FilterOperator::NotEquals,
            "is_empty" => FilterOperator::IsEmpty,
            "is_not_empty" => FilterOperator::IsNotEmpty,
            "items" | "in" => FilterOperator::Items,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    #[serde(rename = "type")]
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
    #[serde(default, rename = "selectedItems")]
    pub selected_items: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ColumnFilter {
    pub fn new(operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            operator,
            value: value.into(),
            selected_items: Vec::new(),
            active: true,
        }
    }

    /// Allow-list filter over exact (case-insensitive) values
    pub fn items<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self {
            operator: FilterOperator::Items,
            value: String::new(),
            selected_items: items.into_iter().map(Into::into).collect(),
            active: true,
        }
    }

    /// A filter only constrains rows when it is switched on and has
    /// something to compare against
    pub fn is_active(&self) -> bool {
        if !self.active {
            return false;
        }
        match self.operator {
            FilterOperator::IsEmpty | FilterOperator::IsNotEmpty => true,
            FilterOperator::Items => !self.selected_items.is_empty(),
            _ => !self.value.is_empty(),
        }
    }

    /// Evaluate against an already stringified cell
    pub fn matches_text(&self, cell: &str) -> bool {
        let cell = cell.to_lowercase();
        let needle = self.value.to_lowercase();
        match self.operator {
            FilterOperator::Contains => cell.contains(&needle),
            FilterOperator::NotContains => !cell.contains(&needle),
            FilterOperator::StartsWith => cell.starts_with(&needle),
            FilterOperator::EndsWith => cell.ends_with(&needle),
            FilterOperator::Equals => cell == needle,
            FilterOperator::NotEquals => cell != needle,
            FilterOperator::IsEmpty => cell.trim().is_empty(),
            FilterOperator::IsNotEmpty => !cell.trim().is_empty(),
            FilterOperator::Items => self
                .selected_items
                .iter()
                .any(|item| item.to_lowercase() == cell),
        }
    }
}

/// All filter state of one grid: column filters keyed by column key plus
/// the global free-text search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column_key: &str, filter: ColumnFilter) {
        self.columns.insert(column_key.to_string(), filter);
    }

    pub fn remove(&mut self, column_key: &str) -> Option<ColumnFilter> {
        self.columns.remove(column_key)
    }

    pub fn set_global(&mut self, text: &str) {
        let trimmed = text.trim();
        self.global = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.global = None;
    }

    pub fn has_active_column_filters(&self) -> bool {
        self.columns.values().any(ColumnFilter::is_active)
    }

    pub fn has_global(&self) -> bool {
        self.global.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.has_active_column_filters() || self.has_global()
    }

    /// Only the active column filters, for forwarding upstream
    pub fn active_columns(&self) -> BTreeMap<String, ColumnFilter> {
        self.columns
            .iter()
            .filter(|(_, filter)| filter.is_active())
            .map(|(key, filter)| (key.clone(), filter.clone()))
            .collect()
    }

    /// Evaluate the row against every active predicate.
    /// The global search only looks at `visible` columns.
    pub fn matches(&self, row: &Row, columns: &[Column], visible: &[usize]) -> bool {
        for (key, filter) in &self.columns {
            if !filter.is_active() {
                continue;
            }
            let Some(column) = columns.iter().find(|column| column.key() == *key) else {
                // Stale preference for a column this grid no longer has
                continue;
            };
            let cell = display_text(row.value(&column.path));
            if !filter.matches_text(&cell) {
                return false;
            }
        }

        if let Some(needle) = &self.global {
            let needle = needle.to_lowercase();
            let found = visible
                .iter()
                .filter_map(|&index| columns.get(index))
                .any(|column| {
                    display_text(row.value(&column.path))
                        .to_lowercase()
                        .contains(&needle)
                });
            if !found {
                return false;
            }
        }
        true
    }
}

/// Distinct stringified values of a column, for the `items` picker
pub fn distinct_values(store: &RowStore, column: &Column) -> Vec<String> {
    store
        .rows()
        .iter()
        .map(|row| display_text(row.value(&column.path)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<Column> {
        vec![
            Column::text("name", "Name"),
            Column::text("fabric", "Fabric"),
            Column::text("notes", "Notes"),
        ]
    }

    fn row(value: serde_json::Value) -> Row {
        Row::from_value(value).unwrap()
    }

    #[test]
    fn test_operators_are_case_insensitive() {
        let cases = [
            (FilterOperator::Contains, "LIAS", "alias_01", true),
            (FilterOperator::NotContains, "lias", "ALIAS_01", false),
            (FilterOperator::StartsWith, "AL", "alias_01", true),
            (FilterOperator::EndsWith, "_01", "ALIAS_01", true),
            (FilterOperator::Equals, "alias_01", "ALIAS_01", true),
            (FilterOperator::NotEquals, "alias_01", "alias_02", true),
            (FilterOperator::IsEmpty, "", "  ", true),
            (FilterOperator::IsNotEmpty, "", "x", true),
        ];
        for (operator, value, cell, expected) in cases {
            let filter = ColumnFilter::new(operator, value);
            assert_eq!(filter.matches_text(cell), expected, "{operator:?} {value} {cell}");
        }
    }

    #[test]
    fn test_items_filter() {
        let filter = ColumnFilter::items(["F1", "f3"]);
        assert!(filter.matches_text("f1"));
        assert!(filter.matches_text("F3"));
        assert!(!filter.matches_text("F2"));
        assert!(!ColumnFilter::items(Vec::<String>::new()).is_active());
    }

    #[test]
    fn test_inactive_filters_are_ignored() {
        let mut filter = ColumnFilter::new(FilterOperator::Equals, "nope");
        filter.active = false;
        let mut set = FilterSet::new();
        set.set("name", filter);
        set.set("fabric", ColumnFilter::new(FilterOperator::Contains, ""));
        assert!(!set.is_active());
        assert!(set.matches(&row(json!({"name": "a"})), &columns(), &[0, 1, 2]));
    }

    #[test]
    fn test_all_filters_must_pass() {
        let mut set = FilterSet::new();
        set.set("fabric", ColumnFilter::new(FilterOperator::Equals, "f1"));
        set.set_global("host");
        let visible = [0, 1];

        assert!(set.matches(&row(json!({"name": "host-a", "fabric": "F1"})), &columns(), &visible));
        assert!(!set.matches(&row(json!({"name": "host-a", "fabric": "F2"})), &columns(), &visible));
        assert!(!set.matches(&row(json!({"name": "array", "fabric": "F1"})), &columns(), &visible));
        // Global search skips hidden columns
        assert!(!set.matches(
            &row(json!({"name": "array", "fabric": "F1", "notes": "host"})),
            &columns(),
            &visible
        ));
    }

    #[test]
    fn test_filter_set_serializes_like_preferences() {
        let mut set = FilterSet::new();
        set.set("fabric", ColumnFilter::items(["F1"]));
        let encoded = serde_json::to_value(&set).unwrap();
        assert_eq!(encoded["columns"]["fabric"]["type"], json!("items"));
        assert_eq!(encoded["columns"]["fabric"]["selectedItems"], json!(["F1"]));
        let decoded: FilterSet = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, set);
    }

    #[test]
    fn test_distinct_values() {
        let mut store = RowStore::new();
        store.load(vec![
            row(json!({"id": 1, "fabric": "F2"})),
            row(json!({"id": 2, "fabric": "F1"})),
            row(json!({"id": 3, "fabric": "F2"})),
        ]);
        let column = Column::text("fabric", "Fabric");
        assert_eq!(distinct_values(&store, &column), vec!["F1", "F2"]);
    }
}
