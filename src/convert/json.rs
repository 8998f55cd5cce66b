//! JSON ingestion.
//!
//! Builds a typed [`PropsBag`] from the JSON shape the source system
//! stores:
//!
//! - bag-level administrative keys are recognized and routed to the
//!   admin channel (the updater handle is a function value and is
//!   dropped)
//! - the reserved record keys `request` / `allObjects` / `actions` land
//!   in their fixed slots, every other key becomes an extra field
//! - an entity field whose value carries a truthy `_ref` member parses
//!   as an unresolved reference
//!
//! This is the only fallible surface of the crate; comparison itself
//! never errors.

use compact_str::CompactString;
use serde_json::Value;

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::{
    Entity, EntityCollection, EntityRef, FieldValue, PropsBag, RequestMetadata, ResourceRecord,
};

/// Bag-level keys that never name a resource record.
pub const ADMIN_KEYS: [&str; 3] = ["_initializeDataKey", "updateEntity", "_declarations"];

/// Record-level keys with fixed slots; everything else is an extra field.
pub const RESERVED_RECORD_KEYS: [&str; 3] = ["actions", "request", "allObjects"];

/// Marker member identifying an unresolved reference value.
const REF_MARKER: &str = "_ref";

// =============================================================================
// Public API
// =============================================================================

/// Build a [`PropsBag`] from its JSON representation.
///
/// # Example
///
/// ```ignore
/// let bag = from_json(&serde_json::json!({
///     "posts": {
///         "request": { "status": "success", "fetchedAt": 100 },
///         "allObjects": { "post": { "1": { "id": "1", "title": "A" } } },
///     },
///     "_declarations": [{ "dataKey": "posts" }],
/// }))?;
/// ```
pub fn from_json(value: &Value) -> SnapshotResult<PropsBag> {
    let Value::Object(map) = value else {
        return Err(SnapshotError::expected_object("props bag", json_kind(value)));
    };

    let mut bag = PropsBag::new();
    for (key, entry) in map {
        match key.as_str() {
            "_initializeDataKey" => bag.admin.init_marker = Some(entry.clone()),
            "_declarations" => bag.admin.declarations = Some(entry.clone()),
            // A function value on the wire; nothing to keep.
            "updateEntity" => {}
            name => {
                bag.insert_resource(name, record_from_json(entry)?);
            }
        }
    }
    Ok(bag)
}

// =============================================================================
// Record / request / entities
// =============================================================================

fn record_from_json(value: &Value) -> SnapshotResult<ResourceRecord> {
    let map = match value {
        Value::Object(map) => map,
        // A null record degrades to an empty one; its absent fields then
        // compare unequal against anything present.
        Value::Null => return Ok(ResourceRecord::new()),
        other => {
            return Err(SnapshotError::expected_object(
                "resource record",
                json_kind(other),
            ));
        }
    };

    let mut record = ResourceRecord::new();
    for (key, entry) in map {
        match key.as_str() {
            "request" => record.request = Some(request_from_json(entry)?),
            "allObjects" => record.all_objects = Some(entities_from_json(entry)?),
            "actions" => record.actions = Some(entry.clone()),
            name => {
                record.extra.insert(name.into(), entry.clone());
            }
        }
    }
    Ok(record)
}

fn request_from_json(value: &Value) -> SnapshotResult<RequestMetadata> {
    let Value::Object(map) = value else {
        return Err(SnapshotError::expected_object(
            "request metadata",
            json_kind(value),
        ));
    };

    let mut request = RequestMetadata::default();
    for (key, entry) in map {
        match key.as_str() {
            "status" => {
                if let Value::String(status) = entry {
                    request.status = status.parse()?;
                } else {
                    return Err(SnapshotError::UnknownStatus(entry.to_string()));
                }
            }
            "fetchedAt" => {
                request.fetched_at = match entry {
                    Value::Null => None,
                    Value::Number(n) => Some(
                        n.as_i64()
                            .ok_or_else(|| SnapshotError::InvalidTimestamp(n.to_string()))?,
                    ),
                    other => return Err(SnapshotError::InvalidTimestamp(other.to_string())),
                };
            }
            name => {
                request.rest.insert(name.into(), entry.clone());
            }
        }
    }
    Ok(request)
}

fn entities_from_json(value: &Value) -> SnapshotResult<EntityCollection> {
    let map = match value {
        Value::Object(map) => map,
        // Absent-as-null means "no entities".
        Value::Null => return Ok(EntityCollection::new()),
        other => {
            return Err(SnapshotError::expected_object(
                "entity collection",
                json_kind(other),
            ));
        }
    };

    let mut collection = EntityCollection::new();
    for (entity_type, by_id) in map {
        let Value::Object(by_id) = by_id else {
            return Err(SnapshotError::expected_object(
                "entities by id",
                json_kind(by_id),
            ));
        };
        for (id, entity) in by_id {
            collection.insert(entity_type.as_str(), id.as_str(), entity_from_json(entity)?);
        }
    }
    Ok(collection)
}

fn entity_from_json(value: &Value) -> SnapshotResult<Entity> {
    let Value::Object(map) = value else {
        return Err(SnapshotError::expected_object("entity", json_kind(value)));
    };

    let mut entity = Entity::new();
    for (field, entry) in map {
        entity
            .fields
            .insert(field.as_str().into(), field_value_from_json(entry));
    }
    Ok(entity)
}

/// Parse one entity field value, detecting the reference marker.
fn field_value_from_json(value: &Value) -> FieldValue {
    if let Value::Object(map) = value
        && map.get(REF_MARKER).is_some_and(is_truthy)
    {
        let entity_type = map.get("type").and_then(Value::as_str).map(CompactString::from);
        let id = map.get("id").and_then(Value::as_str).map(CompactString::from);
        return FieldValue::Reference(EntityRef { entity_type, id });
    }
    FieldValue::Inline(value.clone())
}

// =============================================================================
// Helpers
// =============================================================================

/// Truthiness of the marker member, following the source system's rules.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Human-readable kind of a JSON value, for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::RequestStatus;
    use serde_json::json;

    #[test]
    fn test_admin_keys_routed_out_of_resources() {
        let bag = from_json(&json!({
            "posts": {},
            "_initializeDataKey": "posts",
            "updateEntity": {},
            "_declarations": [{ "dataKey": "posts" }],
        }))
        .unwrap();

        assert_eq!(bag.len(), 1);
        assert!(bag.resource("posts").is_some());
        for key in ADMIN_KEYS {
            assert!(bag.resource(key).is_none());
        }
        assert_eq!(bag.admin.init_marker, Some(json!("posts")));
        assert_eq!(bag.admin.declarations, Some(json!([{ "dataKey": "posts" }])));
    }

    #[test]
    fn test_reserved_keys_routed_others_extra() {
        let bag = from_json(&json!({
            "posts": {
                "request": { "status": "success", "fetchedAt": 100 },
                "allObjects": { "post": { "1": { "id": "1" } } },
                "actions": { "generation": 7 },
                "selectedId": "1",
            },
        }))
        .unwrap();

        let record = bag.resource("posts").unwrap();
        let request = record.request.as_ref().unwrap();
        assert_eq!(request.status, RequestStatus::Success);
        assert_eq!(request.fetched_at, Some(100));
        assert_eq!(record.all_objects.as_ref().unwrap().len(), 1);
        assert_eq!(record.actions, Some(json!({"generation": 7})));
        assert_eq!(record.extra_field("selectedId"), Some(&json!("1")));
        for key in RESERVED_RECORD_KEYS {
            assert!(record.extra_field(key).is_none());
        }
    }

    #[test]
    fn test_request_rest_and_null_fetched_at() {
        let bag = from_json(&json!({
            "posts": {
                "request": { "status": "pending", "fetchedAt": null, "isLoading": true },
            },
        }))
        .unwrap();

        let request = bag.resource("posts").unwrap().request.as_ref().unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.fetched_at, None);
        assert_eq!(request.rest.get("isLoading"), Some(&json!(true)));
    }

    #[test]
    fn test_ref_marker_detection() {
        let bag = from_json(&json!({
            "posts": {
                "allObjects": {
                    "post": {
                        "1": {
                            "title": "A",
                            "author": { "_ref": true, "type": "user", "id": "9" },
                            // Falsy marker: plain data, not a reference.
                            "cover": { "_ref": false, "url": "x" },
                        },
                    },
                },
            },
        }))
        .unwrap();

        let record = bag.resource("posts").unwrap();
        let entity = record.all_objects.as_ref().unwrap().get("post", "1").unwrap();

        assert!(entity.field("author").unwrap().is_reference());
        assert_eq!(
            entity.field("author"),
            Some(&FieldValue::Reference(EntityRef::to("user", "9")))
        );
        assert!(!entity.field("cover").unwrap().is_reference());
        assert!(!entity.field("title").unwrap().is_reference());
    }

    #[test]
    fn test_null_record_degrades_to_empty() {
        let bag = from_json(&json!({ "posts": null })).unwrap();
        let record = bag.resource("posts").unwrap();
        assert!(record.request.is_none());
        assert!(record.all_objects.is_none());
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_malformed_shapes_error() {
        assert!(matches!(
            from_json(&json!([])),
            Err(SnapshotError::ExpectedObject { context: "props bag", .. })
        ));
        assert!(matches!(
            from_json(&json!({ "posts": { "request": "nope" } })),
            Err(SnapshotError::ExpectedObject { context: "request metadata", .. })
        ));
        assert!(matches!(
            from_json(&json!({ "posts": { "request": { "status": "done" } } })),
            Err(SnapshotError::UnknownStatus(_))
        ));
        assert!(matches!(
            from_json(&json!({ "posts": { "request": { "fetchedAt": "late" } } })),
            Err(SnapshotError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            from_json(&json!({ "posts": { "allObjects": { "post": { "1": 3 } } } })),
            Err(SnapshotError::ExpectedObject { context: "entity", .. })
        ));
    }

    #[test]
    fn test_truthiness_rules() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("ref")));
        assert!(is_truthy(&json!({})));
    }
}
