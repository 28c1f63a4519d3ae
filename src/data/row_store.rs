//! In-memory snapshot of an entity's rows plus pending deletions and dirty state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace};

use crate::data::field_path::FieldPath;
use crate::data::identity_index::IdentityIndex;

/// Server-assigned row identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl RowId {
    /// Read an id out of a JSON value. Null, blank and non-scalar values
    /// are not ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RowId::Int),
            Value::String(s) if !s.trim().is_empty() => Some(RowId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RowId::Int(i) => Value::Number((*i).into()),
            RowId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(i) => write!(f, "{i}"),
            RowId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        RowId::Int(id)
    }
}

/// One entity record: a JSON object whose `id` is null until persisted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: Map<String, Value>,
}

impl Row {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a row from a JSON object; other JSON values are rejected
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<RowId> {
        self.fields.get("id").and_then(RowId::from_value)
    }

    pub fn set_id(&mut self, id: Option<&RowId>) {
        let value = id.map(RowId::to_value).unwrap_or(Value::Null);
        self.fields.insert("id".to_string(), value);
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.fields)
    }

    /// Value at `path`, with missing fields reading as null
    pub fn value(&self, path: &FieldPath) -> &Value {
        static NULL: Value = Value::Null;
        self.get(path).unwrap_or(&NULL)
    }

    pub fn set(&mut self, path: &FieldPath, value: Value) -> Option<Value> {
        path.set(&mut self.fields, value)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Unsaved work, split by the kind of upstream call it needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingChanges {
    /// Rows without an id, with their current store index
    pub created: Vec<(usize, Row)>,
    pub updated: Vec<(RowId, Row)>,
    pub deleted: Vec<RowId>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Created and updated rows in one list, as sent to a bulk save
    pub fn changed_rows(&self) -> Vec<Row> {
        self.created
            .iter()
            .map(|(_, row)| row.clone())
            .chain(self.updated.iter().map(|(_, row)| row.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowStore {
    rows: Vec<Row>,
    index: IdentityIndex,
    deleted_ids: Vec<RowId>,
    modified: HashSet<RowId>,
    dirty: bool,
    template: Row,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose new rows start as copies of `template`
    pub fn with_template(template: Row) -> Self {
        Self {
            template,
            ..Self::default()
        }
    }

    pub fn set_template(&mut self, template: Row) {
        self.template = template;
    }

    /// Replace the snapshot wholesale and mark it clean
    pub fn load(&mut self, rows: Vec<Row>) {
        debug!("RowStore: loading {} rows", rows.len());
        self.rows = rows;
        self.index.rebuild(&self.rows);
        self.deleted_ids.clear();
        self.modified.clear();
        self.dirty = false;
    }

    /// Drop all rows but leave dirty state and pending deletions untouched
    pub fn clear_rows(&mut self) {
        self.rows.clear();
        self.index.rebuild(&self.rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn index_of(&self, id: &RowId) -> Option<usize> {
        self.index.get(id)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn deleted_ids(&self) -> &[RowId] {
        &self.deleted_ids
    }

    /// Rows added locally that the server has not assigned an id yet
    pub fn unsaved_count(&self) -> usize {
        self.rows.iter().filter(|row| row.id().is_none()).count()
    }

    /// Mutate one field and mark the store dirty.
    /// Out-of-range indices are ignored and return false.
    pub fn update(&mut self, index: usize, path: &FieldPath, value: Value) -> bool {
        if !self.write(index, path, value) {
            return false;
        }
        if let Some(id) = self.rows[index].id() {
            self.modified.insert(id);
        }
        self.dirty = true;
        true
    }

    /// Mutate a UI-only field (e.g. a selection checkbox) without touching
    /// dirty state
    pub fn update_silent(&mut self, index: usize, path: &FieldPath, value: Value) -> bool {
        self.write(index, path, value)
    }

    fn write(&mut self, index: usize, path: &FieldPath, value: Value) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            trace!("RowStore: ignoring write to missing row {}", index);
            return false;
        };
        let old_id = row.id();
        row.set(path, value);
        if path.is_id() {
            if let Some(old) = old_id {
                self.index.remove(&old);
            }
            if let Some(new) = self.rows[index].id() {
                self.index.insert(new, index);
            }
        }
        true
    }

    /// Append a deep copy of the store's template with a null id
    pub fn add_row(&mut self) -> usize {
        let template = self.template.clone();
        self.add_row_from(&template)
    }

    /// Append a deep copy of `template` with a null id
    pub fn add_row_from(&mut self, template: &Row) -> usize {
        let mut row = template.clone();
        row.set_id(None);
        self.rows.push(row);
        self.dirty = true;
        self.rows.len() - 1
    }


    /// Remove rows by index. Persisted ids move to the pending-deletion list.
    /// Returns the removed indices in ascending order.
    pub fn delete_rows(&mut self, indices: &[usize]) -> Vec<usize> {
        let mut targets: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&index| index < self.rows.len())
            .collect();
        targets.sort_unstable();
        targets.dedup();

        let Some(&first) = targets.first() else {
            return targets;
        };

        for &index in targets.iter().rev() {
            let row = self.rows.remove(index);
            if let Some(id) = row.id() {
                self.index.remove(&id);
                self.modified.remove(&id);
                if !self.deleted_ids.contains(&id) {
                    self.deleted_ids.push(id);
                }
            }
        }
        self.index.reindex_from(first, &self.rows);
        self.dirty = true;
        debug!(
            "RowStore: deleted {} rows, {} pending deletions",
            targets.len(),
            self.deleted_ids.len()
        );
        targets
    }

    /// Everything that still needs to go upstream
    pub fn pending_changes(&self) -> PendingChanges {
        let mut changes = PendingChanges {
            deleted: self.deleted_ids.clone(),
            ..PendingChanges::default()
        };
        for (index, row) in self.rows.iter().enumerate() {
            match row.id() {
                None => changes.created.push((index, row.clone())),
                Some(id) if self.modified.contains(&id) => {
                    changes.updated.push((id, row.clone()))
                }
                Some(_) => {}
            }
        }
        changes
    }

    /// Record the server id assigned to the unsaved row at `index`
    pub fn commit_created(&mut self, index: usize, id: RowId) {
        if let Some(row) = self.rows.get_mut(index) {
            if row.id().is_none() {
                row.set_id(Some(&id));
                self.index.insert(id, index);
            }
        }
        self.refresh_dirty();
    }

    pub fn commit_updated(&mut self, id: &RowId) {
        self.modified.remove(id);
        self.refresh_dirty();
    }

    pub fn commit_deleted(&mut self, id: &RowId) {
        self.deleted_ids.retain(|pending| pending != id);
        self.refresh_dirty();
    }

    /// Forget all pending work after an upstream commit
    pub fn mark_clean(&mut self) {
        self.deleted_ids.clear();
        self.modified.clear();
        self.dirty = false;
    }

    fn refresh_dirty(&mut self) {
        self.dirty = !self.pending_changes().is_empty();
    }
}
