//! Prelude module for common imports.
//!
//! ```ignore
//! use snapshot_eq::prelude::*;
//! ```

// Snapshot model
pub use crate::snapshot::{
    AdminChannel, Entity, EntityCollection, EntityRef, FieldValue, FlatEntities, FlatEntity,
    PropsBag, RequestMetadata, RequestStatus, ResourceRecord, Value, flatten_entities,
};

// Comparison
pub use crate::algo::{
    CompareConfig, CompareStats, EquivalenceReport, Mismatch, Strategy, compare,
    compare_with_config, deep_equal, is_equivalent, shallow_equal, values_equal,
};

// Ingestion
pub use crate::convert::{ADMIN_KEYS, RESERVED_RECORD_KEYS, from_json};

// Error
pub use crate::error::{SnapshotError, SnapshotResult};

// Digests
#[cfg(feature = "digest")]
pub use crate::digest::{SnapshotDigest, StableHasher, digest};
