//! Column model: accessor, editor type, dropdown options and visibility

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::data::cell_value::{display_text, is_empty_value};
use crate::data::field_path::FieldPath;
use crate::data::row_store::Row;
use crate::state::dispatcher::CellContent;
use crate::state::selection::CellCoord;

pub const DEFAULT_COLUMN_WIDTH: u16 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Text,
    Dropdown,
    Checkbox,
    Numeric,
    Custom,
}

/// Narrows a dropdown's option list for one row, e.g. only the zones that
/// belong to the row's fabric
pub type OptionFilter = Arc<dyn Fn(&Row, &[String]) -> Vec<String> + Send + Sync>;

/// Produces the display text and action descriptors of a custom cell
pub type CellRenderer = Arc<dyn Fn(&Row) -> CellContent + Send + Sync>;

#[derive(Clone)]
pub struct Column {
    pub path: FieldPath,
    pub title: String,
    pub kind: ColumnKind,
    pub required: bool,
    pub default_visible: bool,
    pub width: u16,
    pub dropdown_options: Option<Vec<String>>,
    option_filter: Option<OptionFilter>,
    renderer: Option<CellRenderer>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("path", &self.path.to_string())
            .field("title", &self.title)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("default_visible", &self.default_visible)
            .field("width", &self.width)
            .field("dropdown_options", &self.dropdown_options)
            .field("option_filter", &self.option_filter.is_some())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl Column {
    pub fn new(accessor: &str, title: &str, kind: ColumnKind) -> Self {
        Self {
            path: FieldPath::parse(accessor),
            title: title.to_string(),
            kind,
            required: false,
            default_visible: true,
            width: DEFAULT_COLUMN_WIDTH,
            dropdown_options: None,
            option_filter: None,
            renderer: None,
        }
    }

    pub fn text(accessor: &str, title: &str) -> Self {
        Self::new(accessor, title, ColumnKind::Text)
    }

    pub fn numeric(accessor: &str, title: &str) -> Self {
        Self::new(accessor, title, ColumnKind::Numeric)
    }

    pub fn checkbox(accessor: &str, title: &str) -> Self {
        Self::new(accessor, title, ColumnKind::Checkbox)
    }

    pub fn dropdown<S: Into<String>>(
        accessor: &str,
        title: &str,
        options: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut column = Self::new(accessor, title, ColumnKind::Dropdown);
        column.dropdown_options = Some(options.into_iter().map(Into::into).collect());
        column
    }

    pub fn custom(accessor: &str, title: &str, renderer: CellRenderer) -> Self {
        let mut column = Self::new(accessor, title, ColumnKind::Custom);
        column.renderer = Some(renderer);
        column
    }

    pub fn with_option_filter(mut self, filter: OptionFilter) -> Self {
        self.option_filter = Some(filter);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.default_visible = false;
        self
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    /// Stable key used in filters and preferences
    pub fn key(&self) -> String {
        self.path.to_string()
    }

    pub fn is_dropdown(&self) -> bool {
        self.kind == ColumnKind::Dropdown
    }

    /// True when the valid option set depends on other fields of the row
    pub fn has_row_constraint(&self) -> bool {
        self.is_dropdown() && self.option_filter.is_some()
    }

    /// The options currently valid for `row`; `None` when the column is not
    /// option-constrained
    pub fn valid_options(&self, row: &Row) -> Option<Vec<String>> {
        if !self.is_dropdown() {
            return None;
        }
        let base = self.dropdown_options.as_deref().unwrap_or(&[]);
        match &self.option_filter {
            Some(filter) => Some(filter(row, base)),
            None => self.dropdown_options.clone(),
        }
    }

    /// Whether `value` may be stored in this column for `row`.
    /// Empty values are always accepted.
    pub fn accepts(&self, row: &Row, value: &Value) -> bool {
        if is_empty_value(value) {
            return true;
        }
        match self.valid_options(row) {
            Some(options) => {
                let text = display_text(value);
                options.iter().any(|option| *option == text)
            }
            None => true,
        }
    }

    /// Render the cell for `row`. Custom columns defer to their renderer.
    pub fn render(&self, row: &Row) -> CellContent {
        match &self.renderer {
            Some(renderer) => renderer(row),
            None => CellContent::text(display_text(row.value(&self.path))),
        }
    }
}

/// Column definition as shipped by a page (JSON/TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub accessor: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: ColumnKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub width: Option<u16>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

fn default_visible() -> bool {
    true
}

impl From<ColumnSpec> for Column {
    fn from(spec: ColumnSpec) -> Self {
        let title = spec.title.unwrap_or_else(|| spec.accessor.clone());
        let mut column = Column::new(&spec.accessor, &title, spec.kind);
        column.required = spec.required;
        column.default_visible = spec.visible;
        column.width = spec.width.unwrap_or(DEFAULT_COLUMN_WIDTH);
        column.dropdown_options = spec.options;
        column
    }
}

/// Derive text columns from the keys of the first row.
/// Nested objects are flattened one level (`parent.child`).
pub fn infer_columns(rows: &[Row]) -> Vec<Column> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    let mut columns = Vec::new();
    for (key, value) in first.fields() {
        match value {
            Value::Object(nested) if !nested.is_empty() => {
                for child in nested.keys() {
                    let accessor = format!("{key}.{child}");
                    columns.push(Column::text(&accessor, &accessor));
                }
            }
            Value::Bool(_) => columns.push(Column::checkbox(key, key)),
            Value::Number(_) => columns.push(Column::numeric(key, key)),
            _ => columns.push(Column::text(key, key)),
        }
    }
    columns
}

/// Cells whose dropdown value must be re-checked after `written` changed:
/// the written cells themselves plus every row-constrained dropdown on the
/// same rows, since its options may depend on a field that was just written
pub fn validation_targets(columns: &[Column], written: &[CellCoord]) -> BTreeSet<CellCoord> {
    let mut targets: BTreeSet<CellCoord> = written.iter().copied().collect();
    let rows: BTreeSet<usize> = written.iter().map(|cell| cell.row).collect();
    for (col, column) in columns.iter().enumerate() {
        if column.has_row_constraint() {
            targets.extend(rows.iter().map(|&row| CellCoord::new(row, col)));
        }
    }
    targets
}

/// Index of the column whose key matches `key`
pub fn column_index(columns: &[Column], key: &str) -> Option<usize> {
    columns.iter().position(|column| column.key() == key)
}
