//! Row binding: assemble result rows into values, records and record graphs.
//!
//! Rows come from any [`Rows`] source. The target is described by a
//! [`Kind`]; with a [`ResultMap`] the target must be a record (or a list of
//! records) and rows are assembled into nested graphs:
//!
//! - associations are materialized as nested records on every row;
//! - collection elements are scanned into a fresh record per row and then
//!   appended to the parent that owns the row's primary key. Rows whose
//!   parent key was already seen merge into the existing parent, so a
//!   one-to-many join yields one parent per key in first-seen order.
//!
//! Merging scans the parents assembled so far for an equal key, which is
//! quadratic in the number of distinct parents.

use std::{str::FromStr, sync::Arc};

use log::trace;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use thiserror::Error;

use crate::{
    record::{Kind, Record, RecordType},
    result_map::{RecordPlan, ResultMap},
    value::{BoxError, Value},
};

#[derive(Debug, Error)]
pub enum BindError {
    #[error("no rows in result set")]
    NoRows,

    #[error("more than one row without a declared collection")]
    TooManyRows,

    /// Driver-owned byte buffers are invalidated by the next row
    #[error("raw byte destinations cannot be scanned into; use bytes")]
    RawBytes,

    #[error("{record}.{member} is declared as a collection but has kind {kind}")]
    CollectionNotList {
        record: String,
        member: String,
        kind: String,
    },

    #[error("{record}.{member} is declared as an association but has kind {kind}")]
    AssociationNotRecord {
        record: String,
        member: String,
        kind: String,
    },

    #[error("record {record} has no member {member}")]
    UnknownMember { record: String, member: String },

    /// Rows could not be told apart, so collections would merge into the
    /// wrong parent
    #[error("id column {column} of {record} is not in the result set")]
    MissingIdColumn { record: String, column: String },

    #[error("result map requires a record target, got {0}")]
    NotRecord(String),

    #[error("expected exactly one column for {target}, got {got}")]
    ColumnCount { target: String, got: usize },

    #[error("row has {got} values for {expected} columns")]
    RowWidth { expected: usize, got: usize },

    #[error("column {column}: cannot convert {from} to {to}")]
    Convert {
        column: String,
        from: &'static str,
        to: String,
    },

    #[error("reading rows failed: {0}")]
    Rows(#[source] BoxError),
}

/// Source of result rows.
pub trait Rows {
    fn columns(&self) -> &[String];

    /// The next row, or `None` when exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>, BoxError>;
}

/// Rows held in memory.
#[derive(Debug, Clone)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl MemoryRows {
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        MemoryRows {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: rows.into_iter(),
        }
    }
}

impl Rows for MemoryRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>, BoxError> {
        Ok(self.rows.next())
    }
}

/// Bind every row of `rows` into `dest` according to `target`.
///
/// `dest` is only written when binding succeeds; on error it keeps its
/// previous value.
///
/// | target | rows |
/// |---|---|
/// | `List(elem)` | any number, each bound as `elem` |
/// | `Record` with a map | at least one; extra rows only merge collections |
/// | anything else | exactly one |
pub fn bind<R: Rows + ?Sized>(
    rows: &mut R,
    target: &Kind,
    result_map: Option<&ResultMap>,
    dest: &mut Value,
) -> Result<(), BindError> {
    if target.contains_raw_bytes() {
        return Err(BindError::RawBytes);
    }
    let columns = rows.columns().to_vec();

    let value = match (target, result_map) {
        (Kind::List(element), map) => Value::List(bind_all(rows, element, map, &columns)?),
        (Kind::Record(ty), Some(map)) => Value::Record(bind_mapped_one(rows, ty, map, &columns)?),
        (other, Some(_)) => return Err(BindError::NotRecord(other.name())),
        (other, None) => {
            let row = next_row(rows, columns.len())?.ok_or(BindError::NoRows)?;
            let value = FlatPlan::new(other, &columns)?.bind_row(&row)?;
            if next_row(rows, columns.len())?.is_some() {
                return Err(BindError::TooManyRows);
            }
            value
        }
    };

    *dest = value;
    Ok(())
}

/// Bind exactly one record (or one merged record graph with a map).
pub fn bind_one<R: Rows + ?Sized>(
    rows: &mut R,
    ty: &Arc<RecordType>,
    result_map: Option<&ResultMap>,
) -> Result<Record, BindError> {
    let mut dest = Value::Null;
    bind(rows, &Kind::Record(Arc::clone(ty)), result_map, &mut dest)?;
    match dest {
        Value::Record(record) => Ok(record),
        other => Err(BindError::NotRecord(other.kind_name().to_string())),
    }
}

/// Bind all rows as a list of `element`.
pub fn bind_list<R: Rows + ?Sized>(
    rows: &mut R,
    element: &Kind,
    result_map: Option<&ResultMap>,
) -> Result<Vec<Value>, BindError> {
    let mut dest = Value::Null;
    bind(rows, &Kind::List(Box::new(element.clone())), result_map, &mut dest)?;
    match dest {
        Value::List(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

fn next_row<R: Rows + ?Sized>(rows: &mut R, width: usize) -> Result<Option<Vec<Value>>, BindError> {
    let row = rows.next_row().map_err(BindError::Rows)?;
    if let Some(values) = &row
        && values.len() != width
    {
        return Err(BindError::RowWidth {
            expected: width,
            got: values.len(),
        });
    }
    Ok(row)
}

fn bind_all<R: Rows + ?Sized>(
    rows: &mut R,
    element: &Kind,
    result_map: Option<&ResultMap>,
    columns: &[String],
) -> Result<Vec<Value>, BindError> {
    let mut items = Vec::new();

    match result_map {
        Some(map) => {
            let Kind::Record(ty) = element else {
                return Err(BindError::NotRecord(element.name()));
            };
            let plan = map.plan(ty, columns)?;
            while let Some(row) = next_row(rows, columns.len())? {
                let scanned = scan(&plan, &row)?;
                merge_into(&mut items, scanned, &plan)?;
            }
        }
        None => {
            let plan = FlatPlan::new(element, columns)?;
            while let Some(row) = next_row(rows, columns.len())? {
                items.push(plan.bind_row(&row)?);
            }
        }
    }

    trace!("bound {} items", items.len());
    Ok(items)
}

fn bind_mapped_one<R: Rows + ?Sized>(
    rows: &mut R,
    ty: &Arc<RecordType>,
    map: &ResultMap,
    columns: &[String],
) -> Result<Record, BindError> {
    let plan = map.plan(ty, columns)?;

    let first = next_row(rows, columns.len())?.ok_or(BindError::NoRows)?;
    let Scanned {
        mut record,
        collections,
        ..
    } = scan(&plan, &first)?;
    attach_children(&mut record, collections, &plan)?;

    while let Some(row) = next_row(rows, columns.len())? {
        if plan.collections.is_empty() {
            return Err(BindError::TooManyRows);
        }
        let scanned = scan(&plan, &row)?;
        if let Some(id) = plan.id
            && record.value(id) != scanned.record.value(id)
        {
            return Err(BindError::TooManyRows);
        }
        attach_children(&mut record, scanned.collections, &plan)?;
    }

    Ok(record)
}

/// One row scanned through a plan, collection elements held apart.
struct Scanned {
    record: Record,
    collections: Vec<Option<Scanned>>,
    all_null: bool,
}

fn scan(plan: &RecordPlan, row: &[Value]) -> Result<Scanned, BindError> {
    let mut record = Record::new(&plan.ty);
    let mut all_null = true;

    for slot in &plan.slots {
        let raw = &row[slot.column];
        all_null &= raw.is_null();
        let value = coerce(&slot.kind, raw.clone(), plan.ty.fields()[slot.field].name())?;
        if let Some(member) = record.value_mut(slot.field) {
            *member = value;
        }
    }

    for nested in &plan.associations {
        let Scanned {
            record: mut child,
            collections,
            all_null: child_null,
        } = scan(&nested.plan, row)?;
        all_null &= child_null;
        attach_children(&mut child, collections, &nested.plan)?;
        if let Some(member) = record.value_mut(nested.field) {
            *member = Value::Record(child);
        }
    }

    let mut collections = Vec::with_capacity(plan.collections.len());
    for nested in &plan.collections {
        let element = scan(&nested.plan, row)?;
        // LEFT JOIN rows without a child carry only NULLs for it
        collections.push((!element.all_null).then_some(element));
    }

    Ok(Scanned {
        record,
        collections,
        all_null,
    })
}

/// Append a scanned row to `items`, merging into an existing record with
/// the same primary key when the plan declares one.
fn merge_into(
    items: &mut Vec<Value>,
    scanned: Scanned,
    plan: &RecordPlan,
) -> Result<(), BindError> {
    let Scanned {
        mut record,
        collections,
        ..
    } = scanned;

    if let Some(id) = plan.id {
        let key = record.value(id);
        let existing = items.iter_mut().find_map(|item| match item {
            Value::Record(parent) if parent.value(id) == key => Some(parent),
            _ => None,
        });
        if let Some(parent) = existing {
            return attach_children(parent, collections, plan);
        }
    }

    attach_children(&mut record, collections, plan)?;
    items.push(Value::Record(record));
    Ok(())
}

fn attach_children(
    parent: &mut Record,
    collections: Vec<Option<Scanned>>,
    plan: &RecordPlan,
) -> Result<(), BindError> {
    for (nested, element) in plan.collections.iter().zip(collections) {
        let record_name = plan.ty.name().to_string();
        let member_name = plan.ty.fields()[nested.field].name().to_string();
        let Some(member) = parent.value_mut(nested.field) else {
            continue;
        };
        if member.is_null() {
            *member = Value::List(Vec::new());
        }
        match member {
            Value::List(items) => {
                if let Some(element) = element {
                    merge_into(items, element, &nested.plan)?;
                }
            }
            other => {
                return Err(BindError::CollectionNotList {
                    record: record_name,
                    member: member_name,
                    kind: other.kind_name().to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Column slots for binding without a result map.
enum FlatPlan {
    Record {
        ty: Arc<RecordType>,
        slots: Vec<Option<usize>>,
    },
    Map(Vec<String>),
    Scalar(Kind, String),
}

impl FlatPlan {
    fn new(target: &Kind, columns: &[String]) -> Result<Self, BindError> {
        match target {
            // Column tag first, then member name; anything else is discarded
            Kind::Record(ty) => Ok(FlatPlan::Record {
                ty: Arc::clone(ty),
                slots: columns
                    .iter()
                    .map(|c| ty.column_index(c).or_else(|| ty.field_index(c)))
                    .collect(),
            }),
            Kind::Map | Kind::Any => Ok(FlatPlan::Map(columns.to_vec())),
            Kind::List(_) => Err(BindError::ColumnCount {
                target: target.name(),
                got: columns.len(),
            }),
            scalar => match columns {
                [column] => Ok(FlatPlan::Scalar(scalar.clone(), column.clone())),
                _ => Err(BindError::ColumnCount {
                    target: scalar.name(),
                    got: columns.len(),
                }),
            },
        }
    }

    fn bind_row(&self, row: &[Value]) -> Result<Value, BindError> {
        match self {
            FlatPlan::Record { ty, slots } => {
                let mut record = Record::new(ty);
                for (value, slot) in row.iter().zip(slots) {
                    let Some(field) = *slot else { continue };
                    let kind = ty.fields()[field].kind();
                    let value = coerce(kind, value.clone(), ty.fields()[field].name())?;
                    if let Some(member) = record.value_mut(field) {
                        *member = value;
                    }
                }
                Ok(Value::Record(record))
            }
            FlatPlan::Map(columns) => Ok(columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect()),
            FlatPlan::Scalar(kind, column) => coerce(kind, row[0].clone(), column),
        }
    }
}

/// Convert a driver value to the declared kind of its destination.
///
/// SQL NULL stays [`Value::Null`] whatever the kind.
pub fn coerce(kind: &Kind, value: Value, column: &str) -> Result<Value, BindError> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let fail = |value: &Value| BindError::Convert {
        column: column.to_string(),
        from: value.kind_name(),
        to: kind.name(),
    };

    let converted = match (kind, &value) {
        (Kind::Any, _) => Some(value.clone()),
        (Kind::Bool, Value::Bool(_)) => Some(value.clone()),
        (Kind::Bool, Value::Int(n)) => Some(Value::Bool(*n != 0)),
        (Kind::Bool, Value::Uint(n)) => Some(Value::Bool(*n != 0)),
        (Kind::Bool, Value::String(s)) => match s.as_str() {
            "1" | "t" | "true" | "TRUE" => Some(Value::Bool(true)),
            "0" | "f" | "false" | "FALSE" => Some(Value::Bool(false)),
            _ => None,
        },

        (Kind::Int, Value::Int(_)) => Some(value.clone()),
        (Kind::Int, Value::Uint(n)) => i64::try_from(*n).ok().map(Value::Int),
        (Kind::Int, Value::Bool(b)) => Some(Value::Int(*b as i64)),
        (Kind::Int, Value::Decimal(d)) if d.fract().is_zero() => d.to_i64().map(Value::Int),
        (Kind::Int, Value::String(s)) => s.trim().parse().ok().map(Value::Int),

        (Kind::Uint, Value::Uint(_)) => Some(value.clone()),
        (Kind::Uint, Value::Int(n)) => u64::try_from(*n).ok().map(Value::Uint),
        (Kind::Uint, Value::Bool(b)) => Some(Value::Uint(*b as u64)),
        (Kind::Uint, Value::Decimal(d)) if d.fract().is_zero() => d.to_u64().map(Value::Uint),
        (Kind::Uint, Value::String(s)) => s.trim().parse().ok().map(Value::Uint),

        (Kind::Float, Value::Float(_)) => Some(value.clone()),
        (Kind::Float, Value::Int(n)) => Some(Value::Float(*n as f64)),
        (Kind::Float, Value::Uint(n)) => Some(Value::Float(*n as f64)),
        (Kind::Float, Value::Decimal(d)) => d.to_f64().map(Value::Float),
        (Kind::Float, Value::String(s)) => s.trim().parse().ok().map(Value::Float),

        (Kind::Decimal, Value::Decimal(_)) => Some(value.clone()),
        (Kind::Decimal, Value::Int(n)) => Some(Value::Decimal(Decimal::from(*n))),
        (Kind::Decimal, Value::Uint(n)) => Some(Value::Decimal(Decimal::from(*n))),
        (Kind::Decimal, Value::Float(n)) => Decimal::from_f64_retain(*n).map(Value::Decimal),
        (Kind::Decimal, Value::String(s)) => Decimal::from_str(s.trim()).ok().map(Value::Decimal),

        (Kind::String, Value::String(_)) => Some(value.clone()),
        (Kind::String, Value::Bytes(b)) => String::from_utf8(b.clone()).ok().map(Value::String),
        (
            Kind::String,
            Value::Bool(_) | Value::Int(_) | Value::Uint(_) | Value::Float(_) | Value::Decimal(_),
        ) => Some(Value::String(value.to_string())),

        (Kind::Bytes, Value::Bytes(_)) => Some(value.clone()),
        (Kind::Bytes, Value::String(s)) => Some(Value::Bytes(s.clone().into_bytes())),

        (Kind::List(_), Value::List(_)) | (Kind::Map, Value::Map(_)) => Some(value.clone()),
        (Kind::Record(ty), Value::Record(record))
            if Arc::ptr_eq(ty, record.record_type()) =>
        {
            Some(value.clone())
        }
        _ => None,
    };

    converted.ok_or_else(|| fail(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric_strings() {
        assert_eq!(coerce(&Kind::Int, "42".into(), "n").unwrap(), Value::Int(42));
        assert_eq!(
            coerce(&Kind::Decimal, "10.50".into(), "price").unwrap(),
            Value::Decimal(Decimal::new(1050, 2))
        );
    }

    #[test]
    fn test_coerce_keeps_null() {
        assert_eq!(coerce(&Kind::Int, Value::Null, "n").unwrap(), Value::Null);
    }

    #[test]
    fn test_coerce_rejects_lossy_conversion() {
        let err = coerce(&Kind::Uint, Value::Int(-1), "n").unwrap_err();
        assert!(matches!(err, BindError::Convert { .. }));
    }
}
