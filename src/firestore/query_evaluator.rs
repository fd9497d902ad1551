//! Query execution over the in-memory store

use std::borrow::Cow;
use std::cmp::Ordering;

use tracing::trace;

use super::field_path::FieldPath;
use super::field_value::{FilterOperator, MapValue, Value};
use super::path::ResourcePath;
use super::query::{Cursor, Direction, QueryFilter, QueryTarget};
use super::store::Store;
use crate::error::FirestoreError;

/// One document of a query result
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryHit {
    pub(crate) path: ResourcePath,
    pub(crate) data: MapValue,
}

struct Candidate<'a> {
    path: ResourcePath,
    data: &'a MapValue,
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    StartAt,
    StartAfter,
    EndBefore,
    EndAt,
}

type OrderBy<'a> = (&'a FieldPath, Direction);

/// Evaluates `filters` against the documents of `target`
pub(crate) fn execute(
    store: &Store,
    target: &QueryTarget,
    filters: &[QueryFilter],
) -> Result<Vec<QueryHit>, FirestoreError> {
    let mut ordered: Vec<&QueryFilter> = filters.iter().collect();
    ordered.sort_by_key(|filter| filter.rank());

    let orders: Vec<OrderBy<'_>> = filters
        .iter()
        .filter_map(|filter| match filter {
            QueryFilter::OrderBy { field, direction } => Some((field, *direction)),
            _ => None,
        })
        .collect();

    let mut docs = candidates(store, target);
    trace!(candidates = docs.len(), "Evaluating query");

    let mut sorted = false;
    let mut projection: Option<&[FieldPath]> = None;
    for filter in ordered {
        match filter {
            QueryFilter::Where { field, op, value } => {
                docs.retain(|doc| matches_filter(doc, field, *op, value));
            }
            QueryFilter::OrderBy { .. } if !sorted => {
                sort_documents(&mut docs, &orders);
                sorted = true;
            }
            QueryFilter::OrderBy { .. } => {}
            QueryFilter::StartAt(cursor) => apply_cursor(&mut docs, cursor, Boundary::StartAt, &orders),
            QueryFilter::StartAfter(cursor) => {
                apply_cursor(&mut docs, cursor, Boundary::StartAfter, &orders)
            }
            QueryFilter::EndBefore(cursor) => {
                apply_cursor(&mut docs, cursor, Boundary::EndBefore, &orders)
            }
            QueryFilter::EndAt(cursor) => apply_cursor(&mut docs, cursor, Boundary::EndAt, &orders),
            QueryFilter::Limit(limit) => docs.truncate(*limit),
            QueryFilter::LimitToLast(limit) => {
                if orders.is_empty() {
                    return Err(FirestoreError::invalid_argument(
                        "limitToLast() queries require specifying at least one orderBy() clause",
                    ));
                }
                let skip = docs.len().saturating_sub(*limit);
                docs.drain(..skip);
            }
            QueryFilter::Select(fields) => projection = Some(fields),
        }
    }

    Ok(docs
        .into_iter()
        .map(|doc| QueryHit {
            data: match projection {
                Some(fields) => project(doc.data, fields),
                None => doc.data.clone(),
            },
            path: doc.path,
        })
        .collect())
}

fn candidates<'a>(store: &'a Store, target: &QueryTarget) -> Vec<Candidate<'a>> {
    let with_data = |path: ResourcePath, data: Option<&'a MapValue>| {
        data.map(|data| Candidate { path, data })
    };
    match target {
        QueryTarget::Collection(path) => store
            .collection(path)
            .map(|collection| {
                collection
                    .existing_documents()
                    .filter_map(|doc| with_data(path.appended(&doc.id), doc.data.as_ref()))
                    .collect()
            })
            .unwrap_or_default(),
        QueryTarget::CollectionGroup(id) => store
            .collection_group_documents(id)
            .into_iter()
            .filter_map(|(path, doc)| with_data(path, doc.data.as_ref()))
            .collect(),
    }
}

/// Value of `field` for a document; the document-id path yields the id
fn field_value<'a>(path: &ResourcePath, data: &'a MapValue, field: &FieldPath) -> Option<Cow<'a, Value>> {
    if field.is_document_id() {
        return Some(Cow::Owned(Value::String(path.last_segment().to_string())));
    }
    data.get_path(field).map(Cow::Borrowed)
}

fn matches_filter(doc: &Candidate<'_>, field: &FieldPath, op: FilterOperator, operand: &Value) -> bool {
    let Some(value) = field_value(&doc.path, doc.data, field) else {
        return false;
    };
    let value = value.as_ref();

    match op {
        FilterOperator::Equal => values_equal(value, operand),
        FilterOperator::NotEqual => !values_equal(value, operand),
        FilterOperator::LessThan => comparable(value, operand) && compare_values(value, operand).is_lt(),
        FilterOperator::LessThanOrEqual => comparable(value, operand) && compare_values(value, operand).is_le(),
        FilterOperator::GreaterThan => comparable(value, operand) && compare_values(value, operand).is_gt(),
        FilterOperator::GreaterThanOrEqual => comparable(value, operand) && compare_values(value, operand).is_ge(),
        FilterOperator::ArrayContains => value
            .as_array()
            .is_some_and(|items| items.contains(operand)),
        FilterOperator::ArrayContainsAny => match (value.as_array(), operand.as_array()) {
            (Some(items), Some(wanted)) => wanted.iter().any(|w| items.contains(w)),
            _ => false,
        },
        FilterOperator::In => operand
            .as_array()
            .is_some_and(|list| list.iter().any(|candidate| values_equal(value, candidate))),
        FilterOperator::NotIn => operand
            .as_array()
            .is_some_and(|list| !list.iter().any(|candidate| values_equal(value, candidate))),
    }
}

/// Inequality filters only match values of the operand's type
fn comparable(value: &Value, operand: &Value) -> bool {
    type_rank(value) == type_rank(operand)
}

/// Deep equality where `NaN` matches `NaN`
fn values_equal(value: &Value, operand: &Value) -> bool {
    if operand.is_nan() {
        return value.is_nan();
    }
    value == operand
}

/// Total order used by inequality filters, sorting and cursors
///
/// Values of different types order by type: null, booleans, numbers,
/// timestamps, strings, geo points, arrays, then maps. Within a type, numbers
/// compare numerically (NaN first) and timestamp-like values by instant.
pub(crate) fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::Integer(a), Value::Double(b)) => compare_integer_double(*a, *b),
        (Value::Double(a), Value::Integer(b)) => compare_integer_double(*b, *a).reverse(),
        (Value::Double(a), Value::Double(b)) => compare_doubles(*a, *b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::GeoPoint(a), Value::GeoPoint(b)) => compare_doubles(a.latitude, b.latitude)
            .then_with(|| compare_doubles(a.longitude, b.longitude)),
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b)
            .map(|(x, y)| compare_values(x, y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Map(a), Value::Map(b)) => a
            .iter()
            .zip(b.iter())
            .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| compare_values(va, vb)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        _ => match (left.as_timestamp(), right.as_timestamp()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => type_rank(left).cmp(&type_rank(right)),
        },
    }
}

/// Position of a value's type in the cross-type order
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Boolean(_) => 1,
        Value::Integer(_) | Value::Double(_) => 2,
        Value::Timestamp(_) | Value::DateTime(_) => 3,
        Value::String(_) => 4,
        Value::GeoPoint(_) => 5,
        Value::Array(_) => 6,
        Value::Map(_) => 7,
        Value::Sentinel(_) | Value::Undefined => 8,
    }
}

fn compare_doubles(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| b.is_nan().cmp(&a.is_nan()))
}

/// Exact comparison of an integer with a double, without rounding the integer
fn compare_integer_double(integer: i64, double: f64) -> Ordering {
    if double.is_nan() {
        return Ordering::Greater;
    }
    // 2^63 as f64; every double at or beyond it lies outside i64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if double >= LIMIT {
        return Ordering::Less;
    }
    if double < -LIMIT {
        return Ordering::Greater;
    }
    let whole = double.trunc();
    integer
        .cmp(&(whole as i64))
        .then_with(|| 0.0_f64.partial_cmp(&(double - whole)).unwrap_or(Ordering::Equal))
}

/// Stable sort by every `order_by`, dropping documents missing any of them
fn sort_documents(docs: &mut Vec<Candidate<'_>>, orders: &[OrderBy<'_>]) {
    docs.retain(|doc| {
        orders
            .iter()
            .all(|(field, _)| field_value(&doc.path, doc.data, field).is_some())
    });
    docs.sort_by(|a, b| {
        for (field, direction) in orders {
            let ordering = match (
                field_value(&a.path, a.data, field),
                field_value(&b.path, b.data, field),
            ) {
                (Some(left), Some(right)) => compare_values(&left, &right),
                _ => Ordering::Equal,
            };
            let ordering = apply_direction(ordering, *direction);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn apply_direction(ordering: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}

fn apply_cursor(docs: &mut Vec<Candidate<'_>>, cursor: &Cursor, boundary: Boundary, orders: &[OrderBy<'_>]) {
    match cursor {
        Cursor::Document { path, data } => {
            if let Some(index) = docs.iter().position(|doc| &doc.path == path) {
                match boundary {
                    Boundary::StartAt => {
                        docs.drain(..index);
                    }
                    Boundary::StartAfter => {
                        docs.drain(..=index);
                    }
                    Boundary::EndBefore => docs.truncate(index),
                    Boundary::EndAt => docs.truncate(index + 1),
                }
                return;
            }

            // Not part of the current results: position it by its ordered values
            let values: Vec<Value> = orders
                .iter()
                .map_while(|(field, _)| field_value(path, data, field).map(Cow::into_owned))
                .collect();
            if values.is_empty() {
                trace!(path = %path, "Cursor document has no ordered values; ignoring");
                return;
            }
            retain_by_values(docs, &values, boundary, orders);
        }
        Cursor::Values(values) => retain_by_values(docs, values, boundary, orders),
    }
}

fn retain_by_values(docs: &mut Vec<Candidate<'_>>, values: &[Value], boundary: Boundary, orders: &[OrderBy<'_>]) {
    docs.retain(|doc| {
        let ordering = compare_to_cursor(doc, values, orders);
        match boundary {
            Boundary::StartAt => ordering != Ordering::Less,
            Boundary::StartAfter => ordering == Ordering::Greater,
            Boundary::EndBefore => ordering == Ordering::Less,
            Boundary::EndAt => ordering != Ordering::Greater,
        }
    });
}

/// Position of `doc` relative to a cursor over the leading order-by fields
fn compare_to_cursor(doc: &Candidate<'_>, values: &[Value], orders: &[OrderBy<'_>]) -> Ordering {
    for (value, (field, direction)) in values.iter().zip(orders) {
        let ordering = match field_value(&doc.path, doc.data, field) {
            Some(current) => compare_values(&current, value),
            None => Ordering::Less,
        };
        let ordering = apply_direction(ordering, *direction);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Copy of `data` holding only `fields`, nested along their paths
fn project(data: &MapValue, fields: &[FieldPath]) -> MapValue {
    let mut projected = MapValue::new();
    for field in fields {
        if let Some(value) = data.get_path(field) {
            projected.set_path(field, value.clone());
        }
    }
    projected
}
