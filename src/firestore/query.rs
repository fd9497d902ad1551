//! Firestore Query trait and implementation
//!
//! Queries are immutable: each builder method returns a new query carrying an
//! extended filter list, so `get()` can be called on any intermediate value.
//! Filters are recorded in call order and re-sorted into a fixed execution
//! order (`where`, `order_by`, start cursors, end cursors, limits, `select`)
//! before evaluation.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use super::aggregate_query::{AggregateField, AggregateQuery};
use super::document_reference::DocumentReference;
use super::document_snapshot::DocumentSnapshot;
use super::field_path::{FieldPath, IntoFieldPath};
use super::field_value::{FilterOperator, MapValue, Value};
use super::firestore::FirestoreInner;
use super::path::{validate_id, ResourcePath};
use super::query_evaluator::{self, QueryHit};
use super::query_snapshot::QuerySnapshot;
use crate::error::{FirebaseError, FirestoreError};

/// Sort direction for query ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Smallest values first
    #[default]
    Ascending,
    /// Largest values first
    Descending,
}

impl FromStr for Direction {
    type Err = FirestoreError;

    fn from_str(direction: &str) -> Result<Self, Self::Err> {
        match direction {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            other => Err(FirestoreError::invalid_argument(format!(
                "Invalid direction '{}'; expected 'asc' or 'desc'",
                other
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ascending => f.write_str("asc"),
            Direction::Descending => f.write_str("desc"),
        }
    }
}

/// Boundary of a cursor filter
#[derive(Debug, Clone, PartialEq)]
pub enum Cursor {
    /// Positional values matched against the `order_by` fields
    Values(Vec<Value>),
    /// A document, matched by identity in the current ordering
    Document {
        /// Path of the document
        path: ResourcePath,
        /// Its data when the cursor was taken
        data: MapValue,
    },
}

/// A single query directive
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    /// Keep documents whose `field` satisfies `op value`
    Where {
        /// Filtered field
        field: FieldPath,
        /// Comparison operator
        op: FilterOperator,
        /// Operand (a list for `in`, `not-in` and `array-contains-any`)
        value: Value,
    },
    /// Sort by `field`
    OrderBy {
        /// Sort key
        field: FieldPath,
        /// Sort direction
        direction: Direction,
    },
    /// Start at the cursor (inclusive)
    StartAt(Cursor),
    /// Start after the cursor (exclusive)
    StartAfter(Cursor),
    /// End before the cursor (exclusive)
    EndBefore(Cursor),
    /// End at the cursor (inclusive)
    EndAt(Cursor),
    /// Keep the first `n` results
    Limit(usize),
    /// Keep the last `n` results
    LimitToLast(usize),
    /// Project results down to the listed fields
    Select(Vec<FieldPath>),
}

impl QueryFilter {
    /// Position in the execution order
    pub(crate) fn rank(&self) -> u8 {
        match self {
            QueryFilter::Where { .. } => 0,
            QueryFilter::OrderBy { .. } => 1,
            QueryFilter::StartAt(_) => 2,
            QueryFilter::StartAfter(_) => 3,
            QueryFilter::EndBefore(_) => 4,
            QueryFilter::EndAt(_) => 5,
            QueryFilter::Limit(_) | QueryFilter::LimitToLast(_) => 6,
            QueryFilter::Select(_) => 7,
        }
    }

    fn is_start_cursor(&self) -> bool {
        matches!(self, QueryFilter::StartAt(_) | QueryFilter::StartAfter(_))
    }

    fn is_end_cursor(&self) -> bool {
        matches!(self, QueryFilter::EndAt(_) | QueryFilter::EndBefore(_))
    }

    fn is_limit(&self) -> bool {
        matches!(self, QueryFilter::Limit(_) | QueryFilter::LimitToLast(_))
    }
}

/// Documents a query runs over
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QueryTarget {
    /// The documents of one collection
    Collection(ResourcePath),
    /// Every collection with this id, anywhere in the tree
    CollectionGroup(String),
}

impl fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTarget::Collection(path) => write!(f, "{}", path),
            QueryTarget::CollectionGroup(id) => write!(f, "collectionGroup({})", id),
        }
    }
}

/// Internal query state that all query types share
#[derive(Clone)]
pub(crate) struct QueryState {
    pub(crate) target: QueryTarget,
    pub(crate) firestore: Arc<FirestoreInner>,
    pub(crate) filters: Vec<QueryFilter>,
}

impl QueryState {
    pub(crate) fn new(target: QueryTarget, firestore: Arc<FirestoreInner>) -> Self {
        Self {
            target,
            firestore,
            filters: Vec::new(),
        }
    }

    fn with_filter(&self, filter: QueryFilter) -> Self {
        let mut state = self.clone();
        state.filters.push(filter);
        state
    }

    /// Appends `filter`, dropping earlier filters occupying the same slot
    fn replacing(&self, filter: QueryFilter, same_slot: fn(&QueryFilter) -> bool) -> Self {
        let mut state = self.clone();
        state.filters.retain(|existing| !same_slot(existing));
        state.filters.push(filter);
        state
    }

    fn order_by_count(&self) -> usize {
        self.filters
            .iter()
            .filter(|filter| matches!(filter, QueryFilter::OrderBy { .. }))
            .count()
    }

    /// Runs the query against the current store contents
    pub(crate) async fn run(&self) -> Result<Vec<QueryHit>, FirestoreError> {
        let store = self.firestore.store.read().await;
        let hits = query_evaluator::execute(&store, &self.target, &self.filters)?;
        debug!(query = %self.target, filters = self.filters.len(), results = hits.len(), "Executed query");
        Ok(hits)
    }

    pub(crate) async fn snapshot(&self) -> Result<QuerySnapshot, FirebaseError> {
        let hits = self.run().await?;
        let documents = hits
            .into_iter()
            .map(|hit| {
                let reference = DocumentReference::new(hit.path, Arc::clone(&self.firestore));
                DocumentSnapshot::new(reference, Some(hit.data))
            })
            .collect();
        Ok(QuerySnapshot::new(documents))
    }
}

/// Base query trait for building and executing queries
///
/// Implemented by [`CollectionReference`](super::CollectionReference) and
/// [`CollectionGroup`]. Every builder method leaves `self` untouched and
/// returns a new query.
///
/// # Example
/// ```
/// use firestore_mock::firestore::{Direction, Firestore, Query};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
/// let db = Firestore::from_json(&json!({
///     "animals": [
///         { "id": "monkey", "data": { "legCount": 2 } },
///         { "id": "spider", "data": { "legCount": 8 } }
///     ]
/// }).to_string())?;
///
/// let snapshot = db
///     .collection("animals")?
///     .where_greater_than("legCount", 4)?
///     .order_by("legCount", Direction::Descending)?
///     .get()
///     .await?;
/// assert_eq!(snapshot.size(), 1);
/// # Ok(())
/// # }
/// ```
pub trait Query: Clone + Sized {
    /// Get the internal query state (internal use only, not part of public API)
    #[doc(hidden)]
    #[allow(private_interfaces)]
    fn query_state(&self) -> &QueryState;

    /// Create a new instance with modified state (internal use only, not part of public API)
    #[doc(hidden)]
    #[allow(private_interfaces)]
    fn with_state(&self, state: QueryState) -> Self;

    /// The recorded filters, in call order
    fn filters(&self) -> &[QueryFilter] {
        &self.query_state().filters
    }

    /// Execute the query and return results
    fn get(&self) -> impl Future<Output = Result<QuerySnapshot, FirebaseError>> + Send {
        let state = self.query_state().clone();
        async move { state.snapshot().await }
    }

    /// Filter documents where `field op value` holds
    ///
    /// Documents missing `field` never match. `null` and `NaN` operands are
    /// only allowed with `==` and `!=`; `in`, `not-in` and
    /// `array-contains-any` need a non-empty array operand.
    fn filter(
        &self,
        field: impl IntoFieldPath,
        op: FilterOperator,
        value: impl Into<Value>,
    ) -> Result<Self, FirebaseError> {
        let field = field.into_field_path()?;
        let value = value.into().normalized();
        validate_operand(&field, op, &value)?;
        Ok(self.with_state(
            self.query_state()
                .with_filter(QueryFilter::Where { field, op, value }),
        ))
    }

    /// Filter documents where field equals value
    fn where_equal_to(&self, field: impl IntoFieldPath, value: impl Into<Value>) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::Equal, value)
    }

    /// Filter documents where field does not equal value
    fn where_not_equal_to(&self, field: impl IntoFieldPath, value: impl Into<Value>) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::NotEqual, value)
    }

    /// Filter documents where field is less than value
    fn where_less_than(&self, field: impl IntoFieldPath, value: impl Into<Value>) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::LessThan, value)
    }

    /// Filter documents where field is less than or equal to value
    fn where_less_than_or_equal_to(
        &self,
        field: impl IntoFieldPath,
        value: impl Into<Value>,
    ) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::LessThanOrEqual, value)
    }

    /// Filter documents where field is greater than value
    fn where_greater_than(&self, field: impl IntoFieldPath, value: impl Into<Value>) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::GreaterThan, value)
    }

    /// Filter documents where field is greater than or equal to value
    fn where_greater_than_or_equal_to(
        &self,
        field: impl IntoFieldPath,
        value: impl Into<Value>,
    ) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::GreaterThanOrEqual, value)
    }

    /// Filter documents where array field contains value
    fn where_array_contains(&self, field: impl IntoFieldPath, value: impl Into<Value>) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::ArrayContains, value)
    }

    /// Filter documents where array field contains any of the values
    fn where_array_contains_any(&self, field: impl IntoFieldPath, values: Vec<Value>) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::ArrayContainsAny, Value::Array(values))
    }

    /// Filter documents where field equals any of the values
    fn where_in(&self, field: impl IntoFieldPath, values: Vec<Value>) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::In, Value::Array(values))
    }

    /// Filter documents where field does not equal any of the values
    fn where_not_in(&self, field: impl IntoFieldPath, values: Vec<Value>) -> Result<Self, FirebaseError> {
        self.filter(field, FilterOperator::NotIn, Value::Array(values))
    }

    /// Order query results by field
    ///
    /// Later `order_by` calls break ties left by earlier ones. Documents
    /// missing any ordered field are left out of the results.
    fn order_by(&self, field: impl IntoFieldPath, direction: Direction) -> Result<Self, FirebaseError> {
        let field = field.into_field_path()?;
        Ok(self.with_state(
            self.query_state()
                .with_filter(QueryFilter::OrderBy { field, direction }),
        ))
    }

    /// Limit query results to first n documents
    fn limit(&self, limit: usize) -> Self {
        self.with_state(
            self.query_state()
                .replacing(QueryFilter::Limit(limit), QueryFilter::is_limit),
        )
    }

    /// Limit query results to last n documents
    ///
    /// The query must have at least one `order_by`; otherwise `get()` fails.
    fn limit_to_last(&self, limit: usize) -> Self {
        self.with_state(
            self.query_state()
                .replacing(QueryFilter::LimitToLast(limit), QueryFilter::is_limit),
        )
    }

    /// Start query results at field values (inclusive)
    fn start_at<I, V>(&self, values: I) -> Result<Self, FirebaseError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let cursor = value_cursor(self.query_state(), "startAt", values)?;
        Ok(self.with_cursor(QueryFilter::StartAt(cursor)))
    }

    /// Start query results after field values (exclusive)
    fn start_after<I, V>(&self, values: I) -> Result<Self, FirebaseError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let cursor = value_cursor(self.query_state(), "startAfter", values)?;
        Ok(self.with_cursor(QueryFilter::StartAfter(cursor)))
    }

    /// End query results before field values (exclusive)
    fn end_before<I, V>(&self, values: I) -> Result<Self, FirebaseError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let cursor = value_cursor(self.query_state(), "endBefore", values)?;
        Ok(self.with_cursor(QueryFilter::EndBefore(cursor)))
    }

    /// End query results at field values (inclusive)
    fn end_at<I, V>(&self, values: I) -> Result<Self, FirebaseError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let cursor = value_cursor(self.query_state(), "endAt", values)?;
        Ok(self.with_cursor(QueryFilter::EndAt(cursor)))
    }

    /// Start query results at a document (inclusive)
    fn start_at_document(&self, snapshot: &DocumentSnapshot) -> Result<Self, FirebaseError> {
        let cursor = document_cursor("startAt", snapshot)?;
        Ok(self.with_cursor(QueryFilter::StartAt(cursor)))
    }

    /// Start query results after a document (exclusive)
    fn start_after_document(&self, snapshot: &DocumentSnapshot) -> Result<Self, FirebaseError> {
        let cursor = document_cursor("startAfter", snapshot)?;
        Ok(self.with_cursor(QueryFilter::StartAfter(cursor)))
    }

    /// End query results before a document (exclusive)
    fn end_before_document(&self, snapshot: &DocumentSnapshot) -> Result<Self, FirebaseError> {
        let cursor = document_cursor("endBefore", snapshot)?;
        Ok(self.with_cursor(QueryFilter::EndBefore(cursor)))
    }

    /// End query results at a document (inclusive)
    fn end_at_document(&self, snapshot: &DocumentSnapshot) -> Result<Self, FirebaseError> {
        let cursor = document_cursor("endAt", snapshot)?;
        Ok(self.with_cursor(QueryFilter::EndAt(cursor)))
    }

    #[doc(hidden)]
    fn with_cursor(&self, filter: QueryFilter) -> Self {
        let same_slot = if filter.is_start_cursor() {
            QueryFilter::is_start_cursor
        } else {
            QueryFilter::is_end_cursor
        };
        self.with_state(self.query_state().replacing(filter, same_slot))
    }

    /// Project results down to the given field paths
    ///
    /// Nesting is kept only along the selected paths; stored documents are
    /// not modified.
    fn select<I, P>(&self, fields: I) -> Result<Self, FirebaseError>
    where
        I: IntoIterator<Item = P>,
        P: IntoFieldPath,
    {
        let fields = fields
            .into_iter()
            .map(IntoFieldPath::into_field_path)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_state(self.query_state().replacing(
            QueryFilter::Select(fields),
            |filter| matches!(filter, QueryFilter::Select(_)),
        )))
    }

    /// Create a count aggregation query
    fn count(&self) -> AggregateQuery {
        AggregateQuery::new(self.query_state().clone(), vec![AggregateField::count()])
    }

    /// Create an aggregation query with multiple aggregations
    ///
    /// # Example
    /// ```
    /// use firestore_mock::firestore::{AggregateField, Firestore, Query};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
    /// let db = Firestore::from_json(&json!({
    ///     "products": [
    ///         { "id": "a", "data": { "price": 10 } },
    ///         { "id": "b", "data": { "price": 20 } }
    ///     ]
    /// }).to_string())?;
    ///
    /// let result = db
    ///     .collection("products")?
    ///     .aggregate(vec![
    ///         AggregateField::count(),
    ///         AggregateField::sum("price")?.with_alias("total"),
    ///         AggregateField::average("price")?,
    ///     ])
    ///     .get()
    ///     .await?;
    /// assert_eq!(result.count(), Some(2));
    /// assert_eq!(result.get_int("total"), Some(30));
    /// assert_eq!(result.get_double("average_price"), Some(15.0));
    /// # Ok(())
    /// # }
    /// ```
    fn aggregate(&self, aggregations: Vec<AggregateField>) -> AggregateQuery {
        AggregateQuery::new(self.query_state().clone(), aggregations)
    }
}

fn validate_operand(field: &FieldPath, op: FilterOperator, value: &Value) -> Result<(), FirestoreError> {
    validate_query_value(value)?;

    if (value.is_null() || value.is_nan()) && !op.accepts_null() {
        return Err(FirestoreError::invalid_argument(format!(
            "Invalid query on '{}'. Null and NaN only support '==' and '!=' comparisons, got '{}'",
            field, op
        )));
    }

    if op.takes_list() {
        match value.as_array() {
            Some(items) if !items.is_empty() => {}
            _ => {
                return Err(FirestoreError::invalid_argument(format!(
                    "Invalid query on '{}'. A non-empty array is required for '{}' filters",
                    field, op
                )))
            }
        }
    }
    Ok(())
}

/// Rejects undefined values and sentinels anywhere in a query operand
fn validate_query_value(value: &Value) -> Result<(), FirestoreError> {
    match value {
        Value::Undefined => Err(FirestoreError::invalid_argument(
            "Cannot use \"undefined\" as a query value",
        )),
        Value::Sentinel(sentinel) => Err(FirestoreError::invalid_argument(format!(
            "{} can only be used in writes, not in queries",
            sentinel
        ))),
        Value::Array(items) => items.iter().try_for_each(validate_query_value),
        Value::Map(map) => map.iter().try_for_each(|(_, nested)| validate_query_value(nested)),
        _ => Ok(()),
    }
}

fn value_cursor<I, V>(state: &QueryState, method: &str, values: I) -> Result<Cursor, FirebaseError>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let values: Vec<Value> = values
        .into_iter()
        .map(|value| value.into().normalized())
        .collect();
    if values.is_empty() {
        return Err(FirestoreError::invalid_argument(format!(
            "Function {}() requires at least one cursor value",
            method
        ))
        .into());
    }
    values.iter().try_for_each(validate_query_value)?;

    let order_count = state.order_by_count();
    if values.len() > order_count {
        return Err(FirestoreError::invalid_argument(format!(
            "Too many arguments provided to {}(). The number of arguments must be less than \
             or equal to the number of orderBy() clauses ({})",
            method, order_count
        ))
        .into());
    }
    Ok(Cursor::Values(values))
}

fn document_cursor(method: &str, snapshot: &DocumentSnapshot) -> Result<Cursor, FirebaseError> {
    let Some(data) = snapshot.data() else {
        return Err(FirestoreError::invalid_argument(format!(
            "Can't use a DocumentSnapshot that doesn't exist for {}() ({})",
            method,
            snapshot.reference().path()
        ))
        .into());
    };
    Ok(Cursor::Document {
        path: snapshot.reference().resource_path().clone(),
        data,
    })
}

/// Query over every collection with the same id, at any depth
///
/// # Example
/// ```
/// use firestore_mock::firestore::{Firestore, Query};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
/// let db = Firestore::from_json(&json!({
///     "posts": [ { "id": "top", "data": {} } ],
///     "users": [ { "id": "alice", "data": {},
///                  "subcollections": { "posts": [ { "id": "p1", "data": {} } ] } } ]
/// }).to_string())?;
///
/// let all_posts = db.collection_group("posts")?.get().await?;
/// assert_eq!(all_posts.size(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CollectionGroup {
    state: QueryState,
}

impl CollectionGroup {
    pub(crate) fn new(collection_id: &str, firestore: Arc<FirestoreInner>) -> Result<Self, FirestoreError> {
        validate_id(collection_id)?;
        Ok(Self {
            state: QueryState::new(QueryTarget::CollectionGroup(collection_id.to_string()), firestore),
        })
    }

    /// The collection id this group matches
    pub fn collection_id(&self) -> &str {
        match &self.state.target {
            QueryTarget::CollectionGroup(id) => id,
            QueryTarget::Collection(path) => path.last_segment(),
        }
    }
}

impl Query for CollectionGroup {
    fn query_state(&self) -> &QueryState {
        &self.state
    }

    fn with_state(&self, state: QueryState) -> Self {
        Self { state }
    }
}

impl fmt::Debug for CollectionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionGroup")
            .field("collection_id", &self.collection_id())
            .field("filters", &self.state.filters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::{CollectionReference, Firestore};

    fn animals() -> CollectionReference {
        Firestore::new().collection("animals").unwrap()
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("asc".parse::<Direction>().unwrap(), Direction::Ascending);
        assert_eq!("desc".parse::<Direction>().unwrap(), Direction::Descending);
        assert!("up".parse::<Direction>().is_err());
        assert_eq!(Direction::default(), Direction::Ascending);
    }

    #[test]
    fn test_builder_is_immutable() {
        let base = animals();
        let filtered = base.where_equal_to("legCount", 2).unwrap();
        assert!(base.filters().is_empty());
        assert_eq!(filtered.filters().len(), 1);
    }

    #[test]
    fn test_null_only_with_equality() {
        let base = animals();
        assert!(base.where_equal_to("a", Value::Null).is_ok());
        assert!(base.where_not_equal_to("a", f64::NAN).is_ok());
        let err = base.where_greater_than("a", Value::Null).unwrap_err();
        assert_eq!(err.code(), "invalid-argument");
        assert!(base.where_less_than("a", f64::NAN).is_err());
    }

    #[test]
    fn test_list_operators_need_non_empty_arrays() {
        let base = animals();
        assert!(base.where_in("a", vec![]).is_err());
        assert!(base.where_not_in("a", vec![Value::from(1)]).is_ok());
        assert!(base.filter("a", FilterOperator::In, 1).is_err());
        assert!(base.where_array_contains_any("a", vec![Value::from("x")]).is_ok());
    }

    #[test]
    fn test_undefined_and_sentinels_rejected() {
        let base = animals();
        assert!(base.where_equal_to("a", Value::Undefined).is_err());
        assert!(base
            .where_equal_to("a", crate::firestore::FieldValue::server_timestamp())
            .is_err());
        assert!(base.where_in("a", vec![Value::Undefined]).is_err());
    }

    #[test]
    fn test_cursor_arity() {
        let base = animals();
        assert!(base.start_at([1]).is_err());

        let ordered = base.order_by("legCount", Direction::Ascending).unwrap();
        assert!(ordered.start_at([1]).is_ok());
        assert!(ordered.start_at([1, 2]).is_err());
        assert!(ordered.end_before(Vec::<Value>::new()).is_err());
    }

    #[test]
    fn test_cursors_and_limits_replace_previous() {
        let query = animals()
            .order_by("n", Direction::Ascending)
            .unwrap()
            .start_at([1])
            .unwrap()
            .start_after([2])
            .unwrap()
            .limit(5)
            .limit_to_last(2);

        let filters = query.filters();
        assert_eq!(filters.len(), 3);
        assert!(matches!(filters[1], QueryFilter::StartAfter(_)));
        assert!(matches!(filters[2], QueryFilter::LimitToLast(2)));
    }

    #[test]
    fn test_invalid_field_path() {
        assert!(animals().where_equal_to("a..b", 1).is_err());
        assert!(animals().order_by("", Direction::Ascending).is_err());
    }

    #[test]
    fn test_collection_group_id_validation() {
        let db = Firestore::new();
        assert!(db.collection_group("posts").is_ok());
        assert!(db.collection_group("users/posts").is_err());
    }
}
