//! Typed snapshot model.
//!
//! This module provides the `PropsBag`, `ResourceRecord`, `RequestMetadata`,
//! `EntityCollection`, and `Entity` types that the equality oracle compares.
//!
//! # Key Features
//!
//! - Ordered maps (`BTreeMap`) everywhere, so the canonical lexicographic
//!   order is a property of the model, not of the comparison
//! - The administrative channel and the `actions` payload are structurally
//!   separate from the compared surface
//! - Entity field values are a sum type: materialized data or an
//!   unresolved reference

mod entity;
mod props;
mod record;

pub use entity::{Entity, EntityCollection, EntityRef, FieldValue, FlatEntities, FlatEntity, flatten_entities};
pub use props::{AdminChannel, PropsBag};
pub use record::{RequestMetadata, RequestStatus, ResourceRecord};

/// Opaque structured data carried by snapshots (objects, arrays, scalars).
pub use serde_json::Value;
