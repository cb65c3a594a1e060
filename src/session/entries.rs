//! Conversion between row mappings and the column/row table the service speaks

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use crate::envelope::as_rows;
use crate::error::{Error, Result};

/// One active list row: column name to value, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    fields: Vec<(String, String)>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing the value in place if the column already exists
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.fields.iter().any(|(c, _)| c == column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Entry {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entry = Entry::new();
        for (column, value) in iter {
            entry.insert(column, value);
        }
        entry
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

struct EntryVisitor;

impl<'de> Visitor<'de> for EntryVisitor {
    type Value = Entry;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of column names to scalar values")
    }

    // Walks the document order directly so key order survives.
    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Entry, A::Error> {
        let mut entry = Entry::new();
        while let Some((column, value)) = access.next_entry::<String, Value>()? {
            entry.insert(column, scalar_to_string(&value));
        }
        Ok(entry)
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(EntryVisitor)
    }
}

/// Treatment of keys that appear in later batch entries but not in the first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnPolicy {
    /// Extra keys are ignored
    #[default]
    Lenient,
    /// Extra keys are rejected with [`Error::UnexpectedColumn`]
    Strict,
}

/// Encode entries as `{"columns": [...], "entryList": [{"entry": [...]}, ...]}`.
///
/// Columns come from the first entry; every row is read by those names.
pub fn encode_entries(entries: &[Entry], policy: ColumnPolicy) -> Result<Value> {
    let columns: Vec<String> = entries
        .first()
        .map(|first| first.columns().map(str::to_string).collect())
        .unwrap_or_default();

    let mut rows = Vec::with_capacity(entries.len());
    for (row, entry) in entries.iter().enumerate() {
        let mut values = Vec::with_capacity(columns.len());
        for column in &columns {
            let value = entry.get(column).ok_or_else(|| Error::MissingColumn {
                row,
                column: column.clone(),
            })?;
            values.push(Value::String(value.to_string()));
        }

        if policy == ColumnPolicy::Strict {
            if let Some(extra) = entry.columns().find(|c| !columns.iter().any(|k| k == c)) {
                return Err(Error::UnexpectedColumn {
                    row,
                    column: extra.to_string(),
                });
            }
        }

        rows.push(json!({ "entry": values }));
    }

    Ok(json!({ "columns": columns, "entryList": rows }))
}

/// Decode the `act.return` of a getEntries call into its columns and rows
pub fn decode_entries(table: &Value) -> Result<(Vec<String>, Vec<Entry>)> {
    let columns = table
        .get("columns")
        .ok_or_else(|| Error::MalformedResponse("getEntries result has no 'columns'".to_string()))?;
    let columns: Vec<String> = as_rows(Some(columns)).iter().map(scalar_to_string).collect();

    let mut entries = Vec::new();
    for (index, row) in as_rows(table.get("entryList")).iter().enumerate() {
        let values = as_rows(row.get("entry"));
        if values.len() < columns.len() {
            return Err(Error::MalformedResponse(format!(
                "row {} has {} values for {} columns",
                index,
                values.len(),
                columns.len()
            )));
        }

        let entry: Entry = columns
            .iter()
            .zip(values)
            .map(|(column, value)| (column.clone(), scalar_to_string(value)))
            .collect();
        entries.push(entry);
    }

    Ok((columns, entries))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
