//! Row and table payloads exchanged with the host.
//!
//! The host stores tables in columnar form (one value vector per column,
//! all aligned with the `id` column); widget callbacks receive row-oriented
//! records. [`TableRecords::to_records`] is the reshape between the two.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Host row identifier.
pub type RowId = i64;

/// Row cursor sent by the host: a saved row, or the unsaved new-row slot.
///
/// On the wire a saved row is its numeric id and the new-row slot is the
/// string `"new"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    Id(RowId),
    New,
}

impl Serialize for RowRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowRef::Id(id) => serializer.serialize_i64(*id),
            RowRef::New => serializer.serialize_str("new"),
        }
    }
}

impl<'de> Deserialize<'de> for RowRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowRefVisitor;

        impl<'de> Visitor<'de> for RowRefVisitor {
            type Value = RowRef;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a row id or the string \"new\"")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RowRef, E> {
                Ok(RowRef::Id(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RowRef, E> {
                Ok(RowRef::Id(v as RowId))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RowRef, E> {
                if v == "new" {
                    Ok(RowRef::New)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(RowRefVisitor)
    }
}

/// One row in widget-facing, row-oriented form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RowId,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Columnar table payload as fetched from the host.
///
/// The `id` column is mandatory; a payload without it does not parse. Data
/// columns may be ragged in malformed payloads, in which case missing cells
/// read as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecords {
    pub id: Vec<RowId>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Vec<Value>>,
}

impl TableRecords {
    pub fn empty() -> Self {
        Self {
            id: Vec::new(),
            columns: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Reshape into one [`Record`] per row, sharing the id column.
    pub fn to_records(&self) -> Vec<Record> {
        self.id
            .iter()
            .enumerate()
            .map(|(row, &id)| {
                let fields = self
                    .columns
                    .iter()
                    .map(|(name, values)| {
                        let value = values.get(row).cloned().unwrap_or(Value::Null);
                        (name.clone(), value)
                    })
                    .collect();
                Record { id, fields }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_ref_wire_forms() {
        assert_eq!(serde_json::to_value(RowRef::Id(17)).unwrap(), json!(17));
        assert_eq!(serde_json::to_value(RowRef::New).unwrap(), json!("new"));

        let id: RowRef = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(id, RowRef::Id(3));
        let new: RowRef = serde_json::from_value(json!("new")).unwrap();
        assert_eq!(new, RowRef::New);
        assert!(serde_json::from_value::<RowRef>(json!("old")).is_err());
    }

    #[test]
    fn test_record_flattens_fields() {
        let record = Record::new(5).with_field("title", json!("hello"));
        let wire = serde_json::to_value(&record).unwrap();
        assert_eq!(wire, json!({"id": 5, "title": "hello"}));

        let parsed: Record = serde_json::from_value(wire).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_columnar_to_rows() {
        let table: TableRecords = serde_json::from_value(json!({
            "id": [1, 2],
            "A": ["x", "y"],
            "B": [10, 20],
        }))
        .unwrap();

        let rows = table.to_records();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].get("A"), Some(&json!("x")));
        assert_eq!(rows[1].get("B"), Some(&json!(20)));
    }

    #[test]
    fn test_ragged_columns_read_as_null() {
        let table: TableRecords = serde_json::from_value(json!({
            "id": [1, 2],
            "A": ["only-first"],
        }))
        .unwrap();

        let rows = table.to_records();
        assert_eq!(rows[1].get("A"), Some(&Value::Null));
    }

    #[test]
    fn test_missing_id_column_rejected() {
        let result: Result<TableRecords, _> =
            serde_json::from_value(json!({"A": ["x"]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = TableRecords::empty();
        assert!(table.is_empty());
        assert!(table.to_records().is_empty());
    }
}
