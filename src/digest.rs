//! Canonical snapshot digests for memoizing comparisons.
//!
//! Computes a deterministic 64-bit digest over exactly the surface the
//! equality oracle compares. Everything the oracle ignores is excluded:
//! the administrative channel, `actions`, request bookkeeping outside
//! `status`/`fetched_at`, reference targets, and map insertion order
//! (the walk follows the canonical lexicographic order of the model).
//!
//! Two bags that are equivalent under the deep strategy produce the same
//! digest, so a caller can keep one `u64` per dependency instead of a
//! full previous snapshot. The converse guarantee is the usual hashing
//! one: distinct digests mean non-equivalent, equal digests mean
//! almost-certainly equivalent.

use std::fmt;

use crate::snapshot::{FieldValue, PropsBag, Value, flatten_entities};

// =============================================================================
// StableHasher - Builder Pattern
// =============================================================================

/// A deterministic hasher using blake3.
///
/// Unlike `std::hash::Hasher`, this produces the same output across
/// process restarts for the same input.
pub struct StableHasher {
    inner: blake3::Hasher,
}

impl StableHasher {
    /// Create a new StableHasher
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Update with raw bytes
    #[inline]
    pub fn update(mut self, data: &[u8]) -> Self {
        self.inner.update(data);
        self
    }

    /// Update with a string, length-prefixed to keep field boundaries
    /// unambiguous
    #[inline]
    pub fn update_str(self, s: &str) -> Self {
        self.update_usize(s.len()).update(s.as_bytes())
    }

    /// Update with a u64 value (little-endian)
    #[inline]
    pub fn update_u64(self, v: u64) -> Self {
        self.update(&v.to_le_bytes())
    }

    /// Update with an i64 value (little-endian)
    #[inline]
    pub fn update_i64(self, v: i64) -> Self {
        self.update(&v.to_le_bytes())
    }

    /// Update with a usize value (little-endian)
    #[inline]
    pub fn update_usize(self, v: usize) -> Self {
        self.update(&v.to_le_bytes())
    }

    /// Finish and return the hash as u64
    ///
    /// Takes the first 8 bytes of blake3 output as little-endian u64.
    #[inline]
    pub fn finish(self) -> u64 {
        let hash = self.inner.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SnapshotDigest
// =============================================================================

/// Canonical digest of a props bag's compared surface.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[must_use]
pub struct SnapshotDigest(u64);

impl SnapshotDigest {
    /// Create a digest from a raw u64 value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw u64 representation
    #[inline]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SnapshotDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotDigest({:016x})", self.0)
    }
}

impl fmt::Display for SnapshotDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Compute the canonical digest of a props bag.
pub fn digest(bag: &PropsBag) -> SnapshotDigest {
    let mut hasher = StableHasher::new()
        .update_str("__bag__")
        .update_usize(bag.resources.len());

    for (name, record) in &bag.resources {
        hasher = hasher.update_str("__resource__").update_str(name);

        hasher = hasher.update_usize(record.extra.len());
        for (field, value) in &record.extra {
            hasher = hash_value(hasher.update_str(field), value);
        }

        // Only the two sub-fields the oracle looks at.
        match &record.request {
            Some(request) => {
                hasher = hasher.update_str(request.status.as_str());
                hasher = match request.fetched_at {
                    Some(ts) => hasher.update_str("__at__").update_i64(ts),
                    None => hasher.update_str("__never__"),
                };
            }
            None => hasher = hasher.update_str("__no_request__"),
        }

        // Flattened entity sequence. Type and id labels are not hashed:
        // the oracle compares entities positionally, so relabeling that
        // preserves the canonical order is not an observable change.
        let flat = flatten_entities(record.all_objects.as_ref());
        hasher = hasher.update_str("__entities__").update_usize(flat.len());
        for entry in &flat {
            hasher = hasher.update_usize(entry.entity.field_count());
            for (field, value) in &entry.entity.fields {
                hasher = hasher.update_str(field);
                hasher = match value {
                    // Presence only; the target is not the oracle's concern.
                    FieldValue::Reference(_) => hasher.update_str("__ref__"),
                    FieldValue::Inline(value) => hash_value(hasher, value),
                };
            }
        }
    }

    SnapshotDigest::from_raw(hasher.finish())
}

/// Hash one opaque value, kind-tagged and length-prefixed so distinct
/// shapes cannot collide structurally.
fn hash_value(hasher: StableHasher, value: &Value) -> StableHasher {
    match value {
        Value::Null => hasher.update_str("n"),
        Value::Bool(false) => hasher.update_str("f"),
        Value::Bool(true) => hasher.update_str("t"),
        Value::Number(number) => hasher.update_str("#").update_str(&number.to_string()),
        Value::String(s) => hasher.update_str("s").update_str(s),
        Value::Array(items) => {
            let mut hasher = hasher.update_str("a").update_usize(items.len());
            for item in items {
                hasher = hash_value(hasher, item);
            }
            hasher
        }
        Value::Object(map) => {
            let mut hasher = hasher.update_str("o").update_usize(map.len());
            for (key, item) in map {
                hasher = hash_value(hasher.update_str(key), item);
            }
            hasher
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{
        Entity, EntityCollection, EntityRef, RequestMetadata, RequestStatus, ResourceRecord,
    };
    use serde_json::json;

    fn sample_bag(title: &str) -> PropsBag {
        PropsBag::new().with_resource(
            "posts",
            ResourceRecord::new()
                .with_request(RequestMetadata::new(RequestStatus::Success).with_fetched_at(100))
                .with_entities(EntityCollection::new().with_entity(
                    "post",
                    "1",
                    Entity::new()
                        .with_field("id", json!("1"))
                        .with_field("title", json!(title)),
                )),
        )
    }

    #[test]
    fn test_digest_deterministic() {
        assert_eq!(digest(&sample_bag("A")), digest(&sample_bag("A")));
    }

    #[test]
    fn test_data_change_flips_digest() {
        assert_ne!(digest(&sample_bag("A")), digest(&sample_bag("B")));
    }

    #[test]
    fn test_ignored_churn_preserves_digest() {
        let base = digest(&sample_bag("A"));

        // Admin channel and actions.
        let mut noisy = sample_bag("A");
        noisy.admin.init_marker = Some(json!("posts"));
        noisy.admin.declarations = Some(json!(["posts"]));
        noisy.resources.get_mut("posts").unwrap().actions = Some(json!({"generation": 3}));
        assert_eq!(digest(&noisy), base);

        // Request bookkeeping outside status/fetchedAt.
        let mut noisy = sample_bag("A");
        if let Some(request) = &mut noisy.resources.get_mut("posts").unwrap().request {
            request.rest.insert("isLoading".into(), json!(true));
        }
        assert_eq!(digest(&noisy), base);
    }

    #[test]
    fn test_reference_target_preserves_digest() {
        let make = |target_id: &str| {
            PropsBag::new().with_resource(
                "posts",
                ResourceRecord::new().with_entities(EntityCollection::new().with_entity(
                    "post",
                    "1",
                    Entity::new().with_reference("author", EntityRef::to("user", target_id)),
                )),
            )
        };
        assert_eq!(digest(&make("1")), digest(&make("2")));
    }

    #[test]
    fn test_insertion_order_invariant() {
        let mut forward = EntityCollection::new();
        forward.insert("post", "1", Entity::new().with_field("id", json!("1")));
        forward.insert("post", "2", Entity::new().with_field("id", json!("2")));

        let mut reversed = EntityCollection::new();
        reversed.insert("post", "2", Entity::new().with_field("id", json!("2")));
        reversed.insert("post", "1", Entity::new().with_field("id", json!("1")));

        let a = PropsBag::new().with_resource("posts", ResourceRecord::new().with_entities(forward));
        let b =
            PropsBag::new().with_resource("posts", ResourceRecord::new().with_entities(reversed));
        assert_eq!(digest(&a), digest(&b));
    }

    #[test]
    fn test_request_state_flips_digest() {
        let base = digest(&sample_bag("A"));
        let mut changed = sample_bag("A");
        if let Some(request) = &mut changed.resources.get_mut("posts").unwrap().request {
            request.fetched_at = Some(101);
        }
        assert_ne!(digest(&changed), base);
    }

    #[test]
    fn test_digest_display() {
        let d = SnapshotDigest::from_raw(0x1234);
        assert_eq!(format!("{d}"), "#1234");
        assert_eq!(format!("{d:?}"), "SnapshotDigest(0000000000001234)");
    }
}
