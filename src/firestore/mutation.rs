//! Mutation engine
//!
//! Implements `create`, `set` (overwrite, merge, merge fields), `update` and
//! `delete` against the [`Store`], resolving [`FieldValue`] sentinels against
//! the value currently stored at each field.

use tracing::debug;

use super::field_path::{FieldPath, IntoFieldPath};
use super::field_value::{FieldValue, MapValue, Value};
use super::path::ResourcePath;
use super::store::Store;
use super::timestamp::Timestamp;
use super::write_batch::WriteOperation;
use crate::error::FirestoreError;

/// Options controlling how `set` combines new data with a stored document
///
/// The default overwrites the whole document. At most one of `merge` and
/// `merge_fields` may be used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOptions {
    /// Recursively merge the new data into the stored document
    pub merge: bool,

    /// Only replace the listed field paths
    pub merge_fields: Option<Vec<FieldPath>>,
}

impl SetOptions {
    /// `{merge: true}`
    pub fn merge() -> Self {
        Self {
            merge: true,
            merge_fields: None,
        }
    }

    /// `{mergeFields: [...]}`
    pub fn merge_fields<I, P>(fields: I) -> Result<Self, FirestoreError>
    where
        I: IntoIterator<Item = P>,
        P: IntoFieldPath,
    {
        let fields = fields
            .into_iter()
            .map(IntoFieldPath::into_field_path)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            merge: false,
            merge_fields: Some(fields),
        })
    }

    fn validate(&self) -> Result<(), FirestoreError> {
        if self.merge && self.merge_fields.is_some() {
            return Err(FirestoreError::invalid_argument(
                "SetOptions cannot specify both 'merge' and 'mergeFields'",
            ));
        }
        Ok(())
    }
}

/// Applies a queued write
pub(crate) fn apply_write(
    store: &mut Store,
    operation: WriteOperation,
    server_time: Timestamp,
) -> Result<(), FirestoreError> {
    match operation {
        WriteOperation::Create { path, data } => create(store, &path, data, server_time),
        WriteOperation::Set { path, data, options } => {
            set(store, &path, data, &options, server_time)
        }
        WriteOperation::Update { path, data } => update(store, &path, data, server_time),
        WriteOperation::UpdateFields { path, fields } => {
            update_fields(store, &path, fields, server_time)
        }
        WriteOperation::Delete { path } => {
            delete(store, &path);
            Ok(())
        }
    }
}

/// Stores `data` at `path`, failing when the document already exists
pub(crate) fn create(
    store: &mut Store,
    path: &ResourcePath,
    data: MapValue,
    server_time: Timestamp,
) -> Result<(), FirestoreError> {
    validate_data(&data)?;
    if store.document(path).is_some() {
        return Err(FirestoreError::AlreadyExists(path.to_string()));
    }

    let mut document = MapValue::new();
    apply_tree(&mut document, None, data.normalized(), server_time);
    debug!(path = %path, "Created document");
    store.create_path(path, Some(document))
}

/// Writes `data` at `path` according to `options`
pub(crate) fn set(
    store: &mut Store,
    path: &ResourcePath,
    data: MapValue,
    options: &SetOptions,
    server_time: Timestamp,
) -> Result<(), FirestoreError> {
    options.validate()?;
    validate_data(&data)?;
    let data = data.normalized();
    let existing = store.document(path).cloned();

    let document = match &options.merge_fields {
        Some(fields) => {
            let mut target = existing.clone().unwrap_or_default();
            for field in fields {
                let value = data.get_path(field).cloned().ok_or_else(|| {
                    FirestoreError::invalid_argument(format!(
                        "Field '{}' is specified in your field mask but missing from your input data",
                        field
                    ))
                })?;
                apply_field(&mut target, existing.as_ref(), field, value, server_time);
            }
            debug!(path = %path, fields = fields.len(), "Merged document fields");
            target
        }
        None if options.merge => {
            let mut target = existing.clone().unwrap_or_default();
            apply_tree(&mut target, existing.as_ref(), data, server_time);
            debug!(path = %path, "Merged document");
            target
        }
        None => {
            let mut target = MapValue::new();
            apply_tree(&mut target, existing.as_ref(), data, server_time);
            debug!(path = %path, replaced = existing.is_some(), "Overwrote document");
            target
        }
    };

    store.create_path(path, Some(document))
}

/// Merges `data` (keys are dotted field paths) into the existing document
pub(crate) fn update(
    store: &mut Store,
    path: &ResourcePath,
    data: MapValue,
    server_time: Timestamp,
) -> Result<(), FirestoreError> {
    validate_data(&data)?;
    let existing = existing_for_update(store, path)?;

    let mut expanded = MapValue::new();
    for (key, value) in data.fields {
        let field = FieldPath::from_dot_separated(&key)?;
        expanded.set_path(&field, value);
    }

    let mut target = existing.clone();
    apply_tree(&mut target, Some(&existing), expanded.normalized(), server_time);
    debug!(path = %path, "Updated document");
    store.create_path(path, Some(target))
}

/// Replaces each field path independently, like one `mergeFields` per pair
pub(crate) fn update_fields(
    store: &mut Store,
    path: &ResourcePath,
    fields: Vec<(FieldPath, Value)>,
    server_time: Timestamp,
) -> Result<(), FirestoreError> {
    for (field, value) in &fields {
        validate_value(&field.canonical_string(), value, false)?;
    }
    let existing = existing_for_update(store, path)?;

    let mut target = existing.clone();
    let count = fields.len();
    for (field, value) in fields {
        apply_field(&mut target, Some(&existing), &field, value.normalized(), server_time);
    }
    debug!(path = %path, fields = count, "Updated document fields");
    store.create_path(path, Some(target))
}

/// Removes the document at `path`; returns whether it existed
pub(crate) fn delete(store: &mut Store, path: &ResourcePath) -> bool {
    match path.parent() {
        Some(collection) => store.delete_document(&collection, path.last_segment()),
        None => false,
    }
}

fn existing_for_update(store: &Store, path: &ResourcePath) -> Result<MapValue, FirestoreError> {
    store
        .document(path)
        .cloned()
        .ok_or_else(|| FirestoreError::NotFound(path.to_string()))
}

/// Walks `data`, writing into `target` and resolving sentinels against `base`
///
/// Nested maps are merged key by key; any non-map value already at such a key
/// is replaced by a fresh map first. When every key written into such a fresh
/// map was a delete, the key is left as it was.
fn apply_tree(target: &mut MapValue, base: Option<&MapValue>, data: MapValue, server_time: Timestamp) {
    for (key, value) in data.fields {
        let existing = base.and_then(|base| base.get(&key));
        match value {
            Value::Sentinel(sentinel) => match resolve_sentinel(sentinel, existing, server_time) {
                Some(resolved) => {
                    target.insert(key, resolved);
                }
                None => {
                    target.remove(&key);
                }
            },
            Value::Map(child) => {
                let child_base = existing.and_then(Value::as_map);
                let fresh = !child.is_empty() && !matches!(target.get(&key), Some(Value::Map(_)));
                let previous = if fresh { target.remove(&key) } else { None };
                let emptied = target.with_child_map(&key, |slot| {
                    apply_tree(slot, child_base, child, server_time);
                    slot.is_empty()
                });
                if fresh && emptied {
                    match previous {
                        Some(value) => {
                            target.insert(key, value);
                        }
                        None => {
                            target.remove(&key);
                        }
                    }
                }
            }
            plain => {
                target.insert(key, plain);
            }
        }
    }
}

/// Replaces the value at `field` in `target`
fn apply_field(
    target: &mut MapValue,
    base: Option<&MapValue>,
    field: &FieldPath,
    value: Value,
    server_time: Timestamp,
) {
    let existing = base.and_then(|base| base.get_path(field));
    match value {
        Value::Sentinel(sentinel) => match resolve_sentinel(sentinel, existing, server_time) {
            Some(resolved) => target.set_path(field, resolved),
            None => {
                target.remove_path(field);
            }
        },
        Value::Map(child) => {
            let mut replacement = MapValue::new();
            apply_tree(&mut replacement, existing.and_then(Value::as_map), child, server_time);
            target.set_path(field, Value::Map(replacement));
        }
        plain => target.set_path(field, plain),
    }
}

/// Computes the stored value of a sentinel; `None` removes the field
fn resolve_sentinel(
    sentinel: FieldValue,
    existing: Option<&Value>,
    server_time: Timestamp,
) -> Option<Value> {
    match sentinel {
        FieldValue::ServerTimestamp => Some(Value::Timestamp(server_time)),
        FieldValue::Delete => None,
        FieldValue::Increment(amount) => Some(amount.add_to(existing)),
        FieldValue::ArrayUnion(items) => {
            let mut values = existing_array(existing);
            for item in items {
                if !values.contains(&item) {
                    values.push(item);
                }
            }
            Some(Value::Array(values))
        }
        FieldValue::ArrayRemove(items) => {
            let mut values = existing_array(existing);
            values.retain(|value| !items.contains(value));
            Some(Value::Array(values))
        }
    }
}

fn existing_array(existing: Option<&Value>) -> Vec<Value> {
    existing
        .and_then(Value::as_array)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

/// Rejects write data holding undefined values, empty keys or misplaced sentinels
pub(crate) fn validate_data(data: &MapValue) -> Result<(), FirestoreError> {
    for (key, value) in data.iter() {
        if key.is_empty() {
            return Err(FirestoreError::invalid_argument("Field names must not be empty"));
        }
        validate_value(key, value, false)?;
    }
    Ok(())
}

fn validate_value(field: &str, value: &Value, in_array: bool) -> Result<(), FirestoreError> {
    match value {
        Value::Undefined => Err(FirestoreError::invalid_argument(format!(
            "Cannot use \"undefined\" as a Firestore value (found in field '{}')",
            field
        ))),
        Value::Sentinel(sentinel) => {
            if in_array {
                return Err(FirestoreError::invalid_argument(format!(
                    "{} is not supported inside arrays (found in field '{}')",
                    sentinel, field
                )));
            }
            match sentinel {
                FieldValue::ArrayUnion(items) | FieldValue::ArrayRemove(items) => items
                    .iter()
                    .try_for_each(|item| validate_value(field, item, true)),
                _ => Ok(()),
            }
        }
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| validate_value(field, item, true)),
        Value::Map(map) => {
            for (key, nested) in map.iter() {
                if key.is_empty() {
                    return Err(FirestoreError::invalid_argument(format!(
                        "Field names must not be empty (found in field '{}')",
                        field
                    )));
                }
                validate_value(&format!("{}.{}", field, key), nested, in_array)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> ResourcePath {
        ResourcePath::document(p).unwrap()
    }

    fn data(value: serde_json::Value) -> MapValue {
        MapValue::try_from(value).unwrap()
    }

    fn now() -> Timestamp {
        Timestamp::new(1_700_000_000, 0).unwrap()
    }

    fn seeded(doc: &str, value: serde_json::Value) -> Store {
        let mut store = Store::new();
        store.create_path(&path(doc), Some(data(value))).unwrap();
        store
    }

    #[test]
    fn test_create_rejects_existing() {
        let mut store = seeded("users/alice", json!({"a": 1}));
        let err = create(&mut store, &path("users/alice"), MapValue::new(), now()).unwrap_err();
        assert!(matches!(err, FirestoreError::AlreadyExists(_)));

        create(&mut store, &path("users/bob"), data(json!({"b": 2})), now()).unwrap();
        assert_eq!(store.document(&path("users/bob")), Some(&data(json!({"b": 2}))));
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = seeded("d/1", json!({"a": 1, "b": {"c": 2}}));
        set(&mut store, &path("d/1"), data(json!({"b": {"d": 3}})), &SetOptions::default(), now())
            .unwrap();
        assert_eq!(store.document(&path("d/1")), Some(&data(json!({"b": {"d": 3}}))));
    }

    #[test]
    fn test_set_merge_is_deep() {
        let mut store = seeded("d/1", json!({"a": 1, "b": {"c": 2}, "s": "x"}));
        let update = data(json!({"b": {"d": 3}, "s": {"nested": true}}));
        set(&mut store, &path("d/1"), update.clone(), &SetOptions::merge(), now()).unwrap();
        let expected = data(json!({"a": 1, "b": {"c": 2, "d": 3}, "s": {"nested": true}}));
        assert_eq!(store.document(&path("d/1")), Some(&expected));

        // Idempotent without sentinels
        set(&mut store, &path("d/1"), update, &SetOptions::merge(), now()).unwrap();
        assert_eq!(store.document(&path("d/1")), Some(&expected));
    }

    #[test]
    fn test_set_merge_fields() {
        let mut store = seeded("d/1", json!({"a": 1, "b": {"c": 2, "x": 0}, "keep": true}));
        let options = SetOptions::merge_fields(["a", "b.c"]).unwrap();
        set(
            &mut store,
            &path("d/1"),
            data(json!({"a": 10, "b": {"c": 20, "x": 99}, "keep": false})),
            &options,
            now(),
        )
        .unwrap();
        assert_eq!(
            store.document(&path("d/1")),
            Some(&data(json!({"a": 10, "b": {"c": 20, "x": 0}, "keep": true})))
        );
    }

    #[test]
    fn test_set_merge_fields_missing_from_data() {
        let mut store = Store::new();
        let options = SetOptions::merge_fields(["missing"]).unwrap();
        let err = set(&mut store, &path("d/1"), data(json!({"a": 1})), &options, now()).unwrap_err();
        assert!(matches!(err, FirestoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_set_conflicting_options() {
        let mut store = Store::new();
        let options = SetOptions {
            merge: true,
            merge_fields: Some(vec![FieldPath::from_dot_separated("a").unwrap()]),
        };
        let err = set(&mut store, &path("d/1"), data(json!({"a": 1})), &options, now()).unwrap_err();
        assert!(matches!(err, FirestoreError::InvalidArgument(_)));
        assert!(store.document(&path("d/1")).is_none());
    }

    #[test]
    fn test_undefined_rejected() {
        let mut store = Store::new();
        let nested = MapValue::new().with("inner", MapValue::new().with("x", Value::Undefined));
        let err = set(&mut store, &path("d/1"), nested, &SetOptions::default(), now()).unwrap_err();
        assert!(err.to_string().contains("inner.x"));
    }

    #[test]
    fn test_sentinel_inside_array_rejected() {
        let mut store = Store::new();
        let value = MapValue::new().with("arr", vec![FieldValue::server_timestamp()]);
        assert!(set(&mut store, &path("d/1"), value, &SetOptions::default(), now()).is_err());
    }

    #[test]
    fn test_sentinels_resolve_against_stored_values() {
        let mut store = seeded("d/1", json!({"n": 5, "tags": ["a", "b"], "gone": 1, "deep": {"m": 1.5}}));
        let write = MapValue::new()
            .with("n", FieldValue::increment(2))
            .with("tags", FieldValue::array_union(["b", "c"]))
            .with("gone", FieldValue::delete())
            .with("at", FieldValue::server_timestamp())
            .with("deep", MapValue::new().with("m", FieldValue::increment(1)));
        set(&mut store, &path("d/1"), write, &SetOptions::merge(), now()).unwrap();

        let doc = store.document(&path("d/1")).unwrap();
        assert_eq!(doc.get("n"), Some(&Value::Integer(7)));
        assert_eq!(doc.get("tags"), Some(&Value::from(vec!["a", "b", "c"])));
        assert!(doc.get("gone").is_none());
        assert_eq!(doc.get("at"), Some(&Value::Timestamp(now())));
        assert_eq!(
            doc.get_path(&FieldPath::from_dot_separated("deep.m").unwrap()),
            Some(&Value::Double(2.5))
        );
    }

    #[test]
    fn test_increment_across_overwrites() {
        let mut store = seeded("d/1", json!({"n": 10}));
        for amount in [3, 4] {
            let write = MapValue::new().with("n", FieldValue::increment(amount));
            set(&mut store, &path("d/1"), write, &SetOptions::default(), now()).unwrap();
        }
        assert_eq!(store.document(&path("d/1")).unwrap().get("n"), Some(&Value::Integer(17)));
    }

    #[test]
    fn test_array_remove() {
        let mut store = seeded("d/1", json!({"arr": [1, 2, 3, 2, {"k": 1}]}));
        let write = MapValue::new().with(
            "arr",
            FieldValue::array_remove([Value::Integer(2), Value::from(json!({"k": 1}))]),
        );
        set(&mut store, &path("d/1"), write, &SetOptions::merge(), now()).unwrap();
        assert_eq!(store.document(&path("d/1")).unwrap().get("arr"), Some(&Value::from(vec![1, 3])));
    }

    #[test]
    fn test_update_requires_document() {
        let mut store = Store::new();
        let err = update(&mut store, &path("d/1"), data(json!({"a": 1})), now()).unwrap_err();
        assert!(matches!(err, FirestoreError::NotFound(_)));
    }

    #[test]
    fn test_update_expands_dotted_keys() {
        let mut store = seeded("d/1", json!({"address": {"city": "SF", "zip": "94000"}, "name": "x"}));
        update(&mut store, &path("d/1"), data(json!({"address.city": "LA"})), now()).unwrap();
        assert_eq!(
            store.document(&path("d/1")),
            Some(&data(json!({"address": {"city": "LA", "zip": "94000"}, "name": "x"})))
        );
    }

    #[test]
    fn test_update_fields_pairs_are_independent() {
        let mut store = seeded("d/1", json!({"a": {"x": 1, "y": 2}, "b": 1}));
        let fields = vec![
            (FieldPath::from_dot_separated("a").unwrap(), Value::from(json!({"z": 3}))),
            (FieldPath::from_dot_separated("b").unwrap(), FieldValue::increment(1)),
        ];
        update_fields(&mut store, &path("d/1"), fields, now()).unwrap();
        assert_eq!(store.document(&path("d/1")), Some(&data(json!({"a": {"z": 3}, "b": 2}))));
    }

    #[test]
    fn test_update_delete_under_missing_parent() {
        let mut store = seeded("d/1", json!({"x": 1, "n": 5}));
        let write = MapValue::new()
            .with("q.r", FieldValue::delete())
            .with("n.m", FieldValue::delete());
        update(&mut store, &path("d/1"), write, now()).unwrap();
        assert_eq!(store.document(&path("d/1")), Some(&data(json!({"x": 1, "n": 5}))));

        let fields = vec![
            (FieldPath::from_dot_separated("q.r").unwrap(), FieldValue::delete()),
            (FieldPath::from_dot_separated("n.m").unwrap(), FieldValue::delete()),
        ];
        update_fields(&mut store, &path("d/1"), fields, now()).unwrap();
        assert_eq!(store.document(&path("d/1")), Some(&data(json!({"x": 1, "n": 5}))));
    }

    #[test]
    fn test_update_delete_keeps_existing_parent() {
        let mut store = seeded("d/1", json!({"q": {"r": 1}}));
        update(&mut store, &path("d/1"), MapValue::new().with("q.r", FieldValue::delete()), now()).unwrap();
        assert_eq!(store.document(&path("d/1")), Some(&data(json!({"q": {}}))));
    }

    #[test]
    fn test_dates_normalized_to_timestamps() {
        let mut store = Store::new();
        let dt = chrono::DateTime::from_timestamp(1_000, 0).unwrap();
        let write = MapValue::new().with("when", dt);
        create(&mut store, &path("d/1"), write, now()).unwrap();
        assert!(matches!(
            store.document(&path("d/1")).unwrap().get("when"),
            Some(Value::Timestamp(_))
        ));
    }

    #[test]
    fn test_apply_delete() {
        let mut store = seeded("d/1", json!({}));
        apply_write(&mut store, WriteOperation::Delete { path: path("d/1") }, now()).unwrap();
        assert!(store.document(&path("d/1")).is_none());
        assert!(!delete(&mut store, &path("d/1")));
    }
}
