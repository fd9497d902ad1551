//! Firestore field value types
//!
//! Document data is a recursive tagged value: scalars, arrays and maps of
//! values. Write-time sentinels (`FieldValue`) live inside the same tree and
//! are resolved against the stored document by the mutation engine.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::field_path::FieldPath;
use super::geo_point::GeoPoint;
use super::timestamp::Timestamp;
use crate::error::FirestoreError;

/// A single document field value
///
/// Equality is deep and numeric-aware: `Integer(1) == Double(1.0)`, and a
/// `DateTime` equals the `Timestamp` of the same instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// Explicit null
    Null,
    /// Boolean
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Double(f64),
    /// Timestamp (the stored form of every date-like value)
    Timestamp(Timestamp),
    /// Plain date-like input, normalized to [`Value::Timestamp`] before storage
    DateTime(DateTime<Utc>),
    /// UTF-8 string
    String(String),
    /// Geographic point
    GeoPoint(GeoPoint),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Nested map
    Map(MapValue),
    /// Write-time sentinel, never stored
    Sentinel(FieldValue),
    /// The "undefined" marker; rejected by every write and filter
    Undefined,
}

impl Value {
    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::Timestamp(_) | Value::DateTime(_) => "timestamp",
            Value::String(_) => "string",
            Value::GeoPoint(_) => "geopoint",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Sentinel(_) => "sentinel",
            Value::Undefined => "undefined",
        }
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this is an integer or double
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Double(_))
    }

    /// Whether this is a double holding NaN
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Double(d) if d.is_nan())
    }

    /// Boolean content
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer content
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric content, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// String content
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Array content
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Map content
    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Timestamp content; date-like values are converted
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::DateTime(dt) => Some(Timestamp::from_datetime(*dt)),
            _ => None,
        }
    }

    /// Sentinel content
    pub fn as_sentinel(&self) -> Option<&FieldValue> {
        match self {
            Value::Sentinel(sentinel) => Some(sentinel),
            _ => None,
        }
    }

    /// Replaces every date-like value in the tree by its [`Timestamp`]
    pub(crate) fn normalized(self) -> Value {
        match self {
            Value::DateTime(dt) => Value::Timestamp(Timestamp::from_datetime(dt)),
            Value::Array(values) => {
                Value::Array(values.into_iter().map(Value::normalized).collect())
            }
            Value::Map(map) => Value::Map(map.normalized()),
            Value::Sentinel(FieldValue::ArrayUnion(items)) => Value::Sentinel(
                FieldValue::ArrayUnion(items.into_iter().map(Value::normalized).collect()),
            ),
            Value::Sentinel(FieldValue::ArrayRemove(items)) => Value::Sentinel(
                FieldValue::ArrayRemove(items.into_iter().map(Value::normalized).collect()),
            ),
            other => other,
        }
    }

    /// JSON rendering; timestamps and geo points use their tagged object form
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value as Json};

        match self {
            Value::Null | Value::Undefined => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Integer(i) => Json::from(*i),
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Timestamp(_) | Value::DateTime(_) => {
                let ts = self.as_timestamp().unwrap_or_default();
                json!({ "_seconds": ts.seconds, "_nanoseconds": ts.nanoseconds })
            }
            Value::String(s) => Json::String(s.clone()),
            Value::GeoPoint(gp) => json!({ "_latitude": gp.latitude, "_longitude": gp.longitude }),
            Value::Array(values) => Json::Array(values.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(map.to_json_object()),
            Value::Sentinel(sentinel) => Json::String(sentinel.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Integer(a), Value::Double(b)) | (Value::Double(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::GeoPoint(a), Value::GeoPoint(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Sentinel(a), Value::Sentinel(b)) => a == b,
            _ => match (self.as_timestamp(), other.as_timestamp()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(values) => Value::Array(values.into_iter().map(Value::from).collect()),
            Json::Object(object) => tagged_scalar(&object)
                .unwrap_or_else(|| Value::Map(MapValue::from(object))),
        }
    }
}

/// Recognizes the `{_seconds, _nanoseconds}` and `{_latitude, _longitude}` objects
fn tagged_scalar(object: &serde_json::Map<String, serde_json::Value>) -> Option<Value> {
    if object.len() != 2 {
        return None;
    }
    if let (Some(seconds), Some(nanos)) = (object.get("_seconds"), object.get("_nanoseconds")) {
        let nanos = i32::try_from(nanos.as_i64()?).ok()?;
        return Timestamp::new(seconds.as_i64()?, nanos).ok().map(Value::Timestamp);
    }
    if let (Some(lat), Some(lng)) = (object.get("_latitude"), object.get("_longitude")) {
        return GeoPoint::new(lat.as_f64()?, lng.as_f64()?).ok().map(Value::GeoPoint);
    }
    None
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<GeoPoint> for Value {
    fn from(value: GeoPoint) -> Self {
        Value::GeoPoint(value)
    }
}

impl From<MapValue> for Value {
    fn from(value: MapValue) -> Self {
        Value::Map(value)
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        Value::Sentinel(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Map of field values
///
/// Keys are kept sorted, matching the backend's canonical field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "serde_json::Map<String, serde_json::Value>",
    into = "serde_json::Map<String, serde_json::Value>"
)]
pub struct MapValue {
    /// Field name to value
    pub fields: BTreeMap<String, Value>,
}

impl MapValue {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Insert a top-level field, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Top-level field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a top-level field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the map has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over top-level fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Nested lookup along a field path
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        let (last, parents) = path.segments().split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.fields.get(segment)?.as_map()?;
        }
        current.fields.get(last)
    }

    /// Nested assignment along a field path
    ///
    /// Missing intermediate maps are created; an intermediate non-map value is
    /// replaced by a fresh map.
    pub fn set_path(&mut self, path: &FieldPath, value: Value) {
        self.set_segments(path.segments(), value);
    }

    fn set_segments(&mut self, segments: &[String], value: Value) {
        match segments {
            [] => {}
            [last] => {
                self.fields.insert(last.clone(), value);
            }
            [first, rest @ ..] => self.with_child_map(first, |child| child.set_segments(rest, value)),
        }
    }

    /// Nested removal along a field path
    pub fn remove_path(&mut self, path: &FieldPath) -> Option<Value> {
        let (last, parents) = path.segments().split_last()?;
        let mut current = self;
        for segment in parents {
            current = match current.fields.get_mut(segment) {
                Some(Value::Map(child)) => child,
                _ => return None,
            };
        }
        current.fields.remove(last)
    }

    /// Runs `f` on the map stored at `key`
    ///
    /// A missing or non-map value at `key` is replaced by an empty map first.
    pub(crate) fn with_child_map<R>(&mut self, key: &str, f: impl FnOnce(&mut MapValue) -> R) -> R {
        let slot = self
            .fields
            .entry(key.to_string())
            .or_insert_with(|| Value::Map(MapValue::new()));
        match slot {
            Value::Map(child) => f(child),
            other => {
                let mut child = MapValue::new();
                let result = f(&mut child);
                *other = Value::Map(child);
                result
            }
        }
    }

    pub(crate) fn normalized(self) -> MapValue {
        self.fields
            .into_iter()
            .map(|(key, value)| (key, value.normalized()))
            .collect()
    }

    /// JSON object rendering of the map
    pub fn to_json_object(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }
}

impl From<BTreeMap<String, Value>> for MapValue {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for MapValue {
    fn from(object: serde_json::Map<String, serde_json::Value>) -> Self {
        object
            .into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect()
    }
}

impl From<MapValue> for serde_json::Map<String, serde_json::Value> {
    fn from(map: MapValue) -> Self {
        map.to_json_object()
    }
}

impl TryFrom<serde_json::Value> for MapValue {
    type Error = FirestoreError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Object(object) => Ok(MapValue::from(object)),
            other => Err(FirestoreError::invalid_argument(format!(
                "document data must be a JSON object, got {}",
                other
            ))),
        }
    }
}

/// Types accepted as document data by writes
///
/// Implemented for [`MapValue`] and for JSON objects; any other JSON value is
/// rejected with `InvalidArgument`.
pub trait IntoMapValue {
    /// Convert into document data
    fn into_map_value(self) -> Result<MapValue, FirestoreError>;
}

impl IntoMapValue for MapValue {
    fn into_map_value(self) -> Result<MapValue, FirestoreError> {
        Ok(self)
    }
}

impl IntoMapValue for serde_json::Value {
    fn into_map_value(self) -> Result<MapValue, FirestoreError> {
        MapValue::try_from(self)
    }
}

impl IntoMapValue for serde_json::Map<String, serde_json::Value> {
    fn into_map_value(self) -> Result<MapValue, FirestoreError> {
        Ok(MapValue::from(self))
    }
}

impl IntoMapValue for BTreeMap<String, Value> {
    fn into_map_value(self) -> Result<MapValue, FirestoreError> {
        Ok(MapValue::from(self))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MapValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl fmt::Display for MapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::Value::Object(self.to_json_object()))
    }
}

/// Numeric operand of an increment sentinel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer operand; integer fields stay integers
    Integer(i64),
    /// Floating-point operand; the result is always a double
    Double(f64),
}

impl Number {
    /// Adds this operand to an existing field value (0 when absent or non-numeric)
    pub(crate) fn add_to(self, existing: Option<&Value>) -> Value {
        match (existing, self) {
            (Some(Value::Integer(base)), Number::Integer(n)) => Value::Integer(base.saturating_add(n)),
            (Some(Value::Integer(base)), Number::Double(n)) => Value::Double(*base as f64 + n),
            (Some(Value::Double(base)), Number::Integer(n)) => Value::Double(base + n as f64),
            (Some(Value::Double(base)), Number::Double(n)) => Value::Double(base + n),
            (_, Number::Integer(n)) => Value::Integer(n),
            (_, Number::Double(n)) => Value::Double(n),
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(i64::from(value))
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Double(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{}", n),
            Number::Double(n) => write!(f, "{}", n),
        }
    }
}

/// Write-time sentinels ("field value" operators)
///
/// Resolved against the field's current stored value when the write is
/// applied; never stored themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Current server time
    ServerTimestamp,
    /// Remove the field
    Delete,
    /// Add to the existing numeric value (0 when absent or non-numeric)
    Increment(Number),
    /// Append each item not already present (deep equality)
    ArrayUnion(Vec<Value>),
    /// Remove every element deep-equal to one of the items
    ArrayRemove(Vec<Value>),
}

impl FieldValue {
    /// Sentinel resolving to the server time of the write
    pub fn server_timestamp() -> Value {
        Value::Sentinel(FieldValue::ServerTimestamp)
    }

    /// Sentinel removing the field
    pub fn delete() -> Value {
        Value::Sentinel(FieldValue::Delete)
    }

    /// Sentinel incrementing the field by `amount`
    pub fn increment(amount: impl Into<Number>) -> Value {
        Value::Sentinel(FieldValue::Increment(amount.into()))
    }

    /// Sentinel adding `items` to an array field
    pub fn array_union<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Sentinel(FieldValue::ArrayUnion(
            items.into_iter().map(Into::into).collect(),
        ))
    }

    /// Sentinel removing `items` from an array field
    pub fn array_remove<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Sentinel(FieldValue::ArrayRemove(
            items.into_iter().map(Into::into).collect(),
        ))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |items: &[Value]| {
            items
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            FieldValue::ServerTimestamp => write!(f, "FieldValue.serverTimestamp()"),
            FieldValue::Delete => write!(f, "FieldValue.delete()"),
            FieldValue::Increment(n) => write!(f, "FieldValue.increment({})", n),
            FieldValue::ArrayUnion(items) => write!(f, "FieldValue.arrayUnion({})", render(items)),
            FieldValue::ArrayRemove(items) => write!(f, "FieldValue.arrayRemove({})", render(items)),
        }
    }
}

/// Filter operators for `where` clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// field < value
    LessThan,
    /// field <= value
    LessThanOrEqual,
    /// field == value
    Equal,
    /// field != value
    NotEqual,
    /// field >= value
    GreaterThanOrEqual,
    /// field > value
    GreaterThan,
    /// array field contains value
    ArrayContains,
    /// array field contains any value from list
    ArrayContainsAny,
    /// field value is in list
    In,
    /// field value is not in list
    NotIn,
}

impl FilterOperator {
    /// Operator spelling used by the client libraries
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
            FilterOperator::Equal => "==",
            FilterOperator::NotEqual => "!=",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::GreaterThan => ">",
            FilterOperator::ArrayContains => "array-contains",
            FilterOperator::ArrayContainsAny => "array-contains-any",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not-in",
        }
    }

    /// Operators whose operand is a list of values
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            FilterOperator::ArrayContainsAny | FilterOperator::In | FilterOperator::NotIn
        )
    }

    /// Operators that accept `null`/`NaN` operands
    pub fn accepts_null(&self) -> bool {
        matches!(self, FilterOperator::Equal | FilterOperator::NotEqual)
    }
}

impl FromStr for FilterOperator {
    type Err = FirestoreError;

    fn from_str(op: &str) -> Result<Self, Self::Err> {
        Ok(match op {
            "<" => FilterOperator::LessThan,
            "<=" => FilterOperator::LessThanOrEqual,
            "==" => FilterOperator::Equal,
            "!=" => FilterOperator::NotEqual,
            ">=" => FilterOperator::GreaterThanOrEqual,
            ">" => FilterOperator::GreaterThan,
            "array-contains" => FilterOperator::ArrayContains,
            "array-contains-any" => FilterOperator::ArrayContainsAny,
            "in" => FilterOperator::In,
            "not-in" => FilterOperator::NotIn,
            other => {
                return Err(FirestoreError::invalid_argument(format!(
                    "Invalid query operator '{}'",
                    other
                )))
            }
        })
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
