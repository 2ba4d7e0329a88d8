//! Pure projection of host records into a widget's logical column names.
//!
//! Given a record (or table of records), the widget's column declaration
//! and the current mapping, produce the shape the widget asked for.
//! Partial results are never produced: if any required logical column is
//! unmapped, the whole projection is unavailable, so a widget can never
//! mistake an absent field for a legitimately empty one. Inputs are never
//! mutated.

use serde_json::Value;
use std::collections::BTreeMap;
use types::{ColumnDeclaration, ColumnMapping, MappedColumns, Record};

/// Per-row reshape, assembled once per projection and applied to one
/// record or to every row of a table.
struct RowTransform<'a> {
    ops: Vec<(&'a str, &'a MappedColumns)>,
}

/// `None` when a required logical column has no mapping.
fn build_transform<'a>(
    declaration: &'a ColumnDeclaration,
    mapping: &'a ColumnMapping,
) -> Option<RowTransform<'a>> {
    let mut ops = Vec::new();
    for spec in declaration.first_occurrences() {
        match mapping.get(spec.name()) {
            Some(target) => ops.push((spec.name(), target)),
            // Optional and unmapped: the column simply does not appear.
            None if declaration.is_optional(spec.name()) => {}
            None => return None,
        }
    }
    Some(RowTransform { ops })
}

impl RowTransform<'_> {
    fn apply(&self, record: &Record) -> Record {
        let mut fields = BTreeMap::new();
        for (logical, target) in &self.ops {
            let value = match target {
                MappedColumns::Column(host) => {
                    record.get(host).cloned().unwrap_or(Value::Null)
                }
                MappedColumns::Series(hosts) => Value::Array(
                    hosts
                        .iter()
                        .map(|host| record.get(host).cloned().unwrap_or(Value::Null))
                        .collect(),
                ),
            };
            fields.insert((*logical).to_string(), value);
        }
        Record {
            id: record.id,
            fields,
        }
    }
}

/// Project one record.
///
/// No declaration: the widget opted out, the record passes through
/// unchanged. Declaration without a mapping: `None`, meaning "not yet
/// available" rather than an empty result.
pub fn project_record(
    record: &Record,
    declaration: Option<&ColumnDeclaration>,
    mapping: Option<&ColumnMapping>,
) -> Option<Record> {
    let Some(declaration) = declaration else {
        return Some(record.clone());
    };
    let mapping = mapping?;
    let transform = build_transform(declaration, mapping)?;
    Some(transform.apply(record))
}

/// Project every row of a table. An empty table passes through unchanged;
/// with no rows there is no mapping decision to observe.
pub fn project_table(
    rows: &[Record],
    declaration: Option<&ColumnDeclaration>,
    mapping: Option<&ColumnMapping>,
) -> Option<Vec<Record>> {
    let Some(declaration) = declaration else {
        return Some(rows.to_vec());
    };
    let mapping = mapping?;
    if rows.is_empty() {
        return Some(Vec::new());
    }
    let transform = build_transform(declaration, mapping)?;
    Some(rows.iter().map(|row| transform.apply(row)).collect())
}
