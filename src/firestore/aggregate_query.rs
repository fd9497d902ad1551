//! Aggregation queries (count, sum, average)

use std::collections::HashMap;

use tracing::debug;

use super::field_path::{FieldPath, IntoFieldPath};
use super::field_value::{MapValue, Value};
use super::query::QueryState;
use crate::error::FirebaseError;

/// Type of aggregation operation
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationType {
    /// Count the number of documents
    Count,
    /// Sum a numeric field across documents
    Sum(FieldPath),
    /// Average a numeric field across documents
    Average(FieldPath),
}

/// One aggregation to compute over a query
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateField {
    /// Alias for the aggregation result (optional)
    pub alias: Option<String>,
    /// Type of aggregation
    pub aggregation_type: AggregationType,
}

impl AggregateField {
    /// Create a count aggregation
    pub fn count() -> Self {
        Self {
            alias: None,
            aggregation_type: AggregationType::Count,
        }
    }

    /// Create a count aggregation with alias
    pub fn count_with_alias(alias: impl Into<String>) -> Self {
        Self::count().with_alias(alias)
    }

    /// Create a sum aggregation on a field
    ///
    /// Non-numeric values are skipped; the result is an integer when every
    /// summed value is an integer.
    pub fn sum(field: impl IntoFieldPath) -> Result<Self, FirebaseError> {
        Ok(Self {
            alias: None,
            aggregation_type: AggregationType::Sum(field.into_field_path()?),
        })
    }

    /// Create an average aggregation on a field
    pub fn average(field: impl IntoFieldPath) -> Result<Self, FirebaseError> {
        Ok(Self {
            alias: None,
            aggregation_type: AggregationType::Average(field.into_field_path()?),
        })
    }

    /// Set an alias for this aggregation field
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Key the result is stored under
    pub fn result_alias(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.aggregation_type {
            AggregationType::Count => "count".to_string(),
            AggregationType::Sum(field) => format!("sum_{}", field),
            AggregationType::Average(field) => format!("average_{}", field),
        }
    }

    fn evaluate<'a>(&self, documents: impl Iterator<Item = &'a MapValue>) -> Value {
        match &self.aggregation_type {
            AggregationType::Count => Value::Integer(documents.count() as i64),
            AggregationType::Sum(field) => {
                let (total, _) = numeric_total(documents, field);
                total
            }
            AggregationType::Average(field) => match numeric_total(documents, field) {
                (_, 0) => Value::Null,
                (total, count) => total
                    .as_f64()
                    .map(|sum| Value::Double(sum / count as f64))
                    .unwrap_or(Value::Null),
            },
        }
    }
}

/// Sum of the numeric values at `field` and how many there were
fn numeric_total<'a>(documents: impl Iterator<Item = &'a MapValue>, field: &FieldPath) -> (Value, usize) {
    let mut integer_sum: Option<i64> = Some(0);
    let mut double_sum = 0.0;
    let mut count = 0;

    for value in documents.filter_map(|data| data.get_path(field)) {
        match value {
            Value::Integer(n) => {
                integer_sum = integer_sum.and_then(|sum| sum.checked_add(*n));
                double_sum += *n as f64;
            }
            Value::Double(d) => {
                integer_sum = None;
                double_sum += d;
            }
            _ => continue,
        }
        count += 1;
    }

    let total = match integer_sum {
        Some(sum) => Value::Integer(sum),
        None => Value::Double(double_sum),
    };
    (total, count)
}

/// Aggregation query for performing aggregate operations on collections
#[derive(Clone)]
pub struct AggregateQuery {
    /// Base query state
    pub(crate) query_state: QueryState,
    /// Aggregations to perform
    pub(crate) aggregations: Vec<AggregateField>,
}

impl AggregateQuery {
    /// Create a new aggregation query
    pub(crate) fn new(query_state: QueryState, aggregations: Vec<AggregateField>) -> Self {
        Self {
            query_state,
            aggregations,
        }
    }

    /// Requested aggregations
    pub fn aggregations(&self) -> &[AggregateField] {
        &self.aggregations
    }

    /// Execute the aggregation query and return results
    ///
    /// # Example
    /// ```
    /// use firestore_mock::firestore::{Firestore, Query};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
    /// let db = Firestore::from_json(&json!({
    ///     "users": [ { "id": "a", "data": {} }, { "id": "b", "data": {} } ]
    /// }).to_string())?;
    ///
    /// let result = db.collection("users")?.count().get().await?;
    /// assert_eq!(result.count(), Some(2));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get(&self) -> Result<AggregateQuerySnapshot, FirebaseError> {
        let hits = self.query_state.run().await?;

        let results: HashMap<String, Value> = self
            .aggregations
            .iter()
            .map(|field| {
                let value = field.evaluate(hits.iter().map(|hit| &hit.data));
                (field.result_alias(), value)
            })
            .collect();

        debug!(
            query = %self.query_state.target,
            documents = hits.len(),
            aggregations = results.len(),
            "Executed aggregation query"
        );
        Ok(AggregateQuerySnapshot { results })
    }
}

impl std::fmt::Debug for AggregateQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateQuery")
            .field("query", &self.query_state.target.to_string())
            .field("aggregations", &self.aggregations)
            .finish()
    }
}

/// Snapshot of aggregation query results
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuerySnapshot {
    /// Aggregation results keyed by alias
    results: HashMap<String, Value>,
}

impl AggregateQuerySnapshot {
    /// Get count result (convenience method for count aggregations)
    pub fn count(&self) -> Option<i64> {
        self.get_int("count")
    }

    /// Get a specific aggregation result by alias
    pub fn get(&self, alias: &str) -> Option<&Value> {
        self.results.get(alias)
    }

    /// Get integer value from aggregation result
    pub fn get_int(&self, alias: &str) -> Option<i64> {
        match self.get(alias)? {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get double value from aggregation result
    pub fn get_double(&self, alias: &str) -> Option<f64> {
        self.get(alias).and_then(Value::as_f64)
    }

    /// Get all aggregation results
    pub fn results(&self) -> &HashMap<String, Value> {
        &self.results
    }
}
