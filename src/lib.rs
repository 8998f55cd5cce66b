//! snapshot-eq - Selective structural equality for normalized resource snapshots
//!
//! Decides whether two successive snapshots of a normalized resource-state
//! tree are equivalent enough that a dependent consumer (a UI re-render, a
//! cache invalidation, a recomputation trigger) can skip its work.
//!
//! ## Core Concepts
//!
//! **Four-stage comparison**: a resource key-set gate, per-resource extra
//! fields under a pluggable deep/shallow strategy, exact request-metadata
//! equality, and canonical positional entity comparison - strictly
//! top-down, short-circuiting on the first mismatch.
//!
//! **Reference transparency**: an entity field holding an unresolved
//! reference compares equal unconditionally; resolving it is the store's
//! concern, not the oracle's.
//!
//! **Fail to false**: comparison never errors. Absent or malformed data
//! compares unequal, biasing toward recomputation over a wrong skip.
//!
//! ## Modules
//! - `snapshot`: typed model (`PropsBag`, `ResourceRecord`, entities)
//! - `algo`: the equality oracle and the value-equality strategies
//! - `convert`: ingestion from the source system's JSON shape
//! - `digest`: canonical content digests for memoizing comparisons
//! - `error`: ingestion error types
//!
//! ## Usage
//!
//! ```ignore
//! use snapshot_eq::prelude::*;
//!
//! let prev = from_json(&prev_state)?;
//! let next = from_json(&next_state)?;
//!
//! if !is_equivalent(&prev, &next) {
//!     rerender();
//! }
//!
//! // Or, with the cheaper strategy and a structured verdict:
//! let report = compare_with_config(&prev, &next, CompareConfig::shallow());
//! if let Some(mismatch) = report.first_mismatch() {
//!     eprintln!("recomputing: {mismatch}");
//! }
//! ```

// =============================================================================
// Core modules
// =============================================================================

/// Typed snapshot model: PropsBag, ResourceRecord, entities
pub mod snapshot;

/// Algorithms: comparison oracle, equality strategies
pub mod algo;

/// Source format converters to typed snapshots
pub mod convert;

/// Error types
pub mod error;

/// Prelude for common imports
pub mod prelude;

/// Canonical snapshot digests
#[cfg(feature = "digest")]
pub mod digest;

// =============================================================================
// Re-exports
// =============================================================================

// Snapshot model
pub use snapshot::{
    AdminChannel, Entity, EntityCollection, EntityRef, FieldValue, PropsBag, RequestMetadata,
    RequestStatus, ResourceRecord, Value,
};

// Comparison
pub use algo::{
    CompareConfig, CompareStats, EquivalenceReport, Mismatch, Strategy, compare,
    compare_with_config, is_equivalent,
};

// Ingestion
pub use convert::from_json;

// Error types
pub use error::{SnapshotError, SnapshotResult};

// Digests
#[cfg(feature = "digest")]
pub use digest::{SnapshotDigest, digest};

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use serde_json::json;

    fn feed_state(title: &str) -> serde_json::Value {
        json!({
            "posts": {
                "request": { "status": "success", "fetchedAt": 100, "isLoading": false },
                "allObjects": {
                    "post": { "1": { "id": "1", "title": title } },
                },
                "actions": { "generation": 1 },
                "selectedId": "1",
            },
            "_initializeDataKey": "posts",
            "_declarations": [{ "dataKey": "posts" }],
        })
    }

    #[test]
    fn test_end_to_end_change_detected() {
        let prev = from_json(&feed_state("A")).unwrap();
        let next = from_json(&feed_state("B")).unwrap();

        assert!(is_equivalent(&prev, &prev));
        assert!(!is_equivalent(&prev, &next));

        let report = compare(&prev, &next);
        assert!(matches!(
            report.first_mismatch(),
            Some(Mismatch::EntityFieldValue { field, .. }) if field == "title"
        ));
    }

    #[test]
    fn test_end_to_end_reference_masks_change() {
        let prev = from_json(&feed_state("A")).unwrap();

        let mut masked = feed_state("ignored");
        masked["posts"]["allObjects"]["post"]["1"]["title"] = json!({ "_ref": true });
        let next = from_json(&masked).unwrap();

        assert!(is_equivalent(&prev, &next));
    }

    #[test]
    fn test_end_to_end_ignored_churn() {
        let prev = from_json(&feed_state("A")).unwrap();

        let mut churned = feed_state("A");
        churned["posts"]["actions"] = json!({ "generation": 99 });
        churned["posts"]["request"]["isLoading"] = json!(true);
        churned["_declarations"] = json!([{ "dataKey": "posts" }, { "dataKey": "users" }]);
        let next = from_json(&churned).unwrap();

        assert!(is_equivalent(&prev, &next));
    }

    #[cfg(feature = "digest")]
    #[test]
    fn test_end_to_end_digest_agrees_with_oracle() {
        let a = from_json(&feed_state("A")).unwrap();
        let b = from_json(&feed_state("B")).unwrap();

        assert_ne!(digest(&a), digest(&b));
        assert_eq!(digest(&a), digest(&from_json(&feed_state("A")).unwrap()));
    }
}
