//! Entity collection, entity, and field value types.
//!
//! An entity collection is the two-level (type → id → entity) mapping a
//! normalizing store keeps per resource. Entities are flat field mappings;
//! each field either holds materialized data or an unresolved reference to
//! another entity.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;

// =============================================================================
// EntityCollection
// =============================================================================

/// Two-level mapping: entity type name → entity id → [`Entity`].
///
/// Both levels are ordered maps, so iterating the collection *is* the
/// canonical flattening order: types lexicographic, ids lexicographic
/// within each type, independent of insertion order.
#[derive(Debug, Clone, Default, Serialize)]
#[must_use]
pub struct EntityCollection {
    /// Entities keyed by type, then by id
    pub types: BTreeMap<CompactString, BTreeMap<CompactString, Entity>>,
}

impl EntityCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity under `(entity_type, id)`, replacing any previous one.
    pub fn insert(
        &mut self,
        entity_type: impl Into<CompactString>,
        id: impl Into<CompactString>,
        entity: Entity,
    ) {
        self.types
            .entry(entity_type.into())
            .or_default()
            .insert(id.into(), entity);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with_entity(
        mut self,
        entity_type: impl Into<CompactString>,
        id: impl Into<CompactString>,
        entity: Entity,
    ) -> Self {
        self.insert(entity_type, id, entity);
        self
    }

    /// Look up an entity by type and id.
    pub fn get(&self, entity_type: &str, id: &str) -> Option<&Entity> {
        self.types.get(entity_type)?.get(id)
    }

    /// Total number of entities across all types.
    pub fn len(&self) -> usize {
        self.types.values().map(BTreeMap::len).sum()
    }

    /// Check whether the collection holds no entities.
    pub fn is_empty(&self) -> bool {
        self.types.values().all(BTreeMap::is_empty)
    }

    /// Flatten into the canonical entity sequence.
    pub fn flatten(&self) -> FlatEntities<'_> {
        let mut flat = FlatEntities::new();
        for (entity_type, by_id) in &self.types {
            for (id, entity) in by_id {
                flat.push(FlatEntity {
                    entity_type,
                    id,
                    entity,
                });
            }
        }
        flat
    }
}

/// One entry of the canonical flattened sequence.
#[derive(Debug, Clone, Copy)]
pub struct FlatEntity<'a> {
    /// Entity type name
    pub entity_type: &'a str,
    /// Entity id
    pub id: &'a str,
    /// The entity itself
    pub entity: &'a Entity,
}

/// Canonical flattened entity sequence. Small collections stay inline.
pub type FlatEntities<'a> = SmallVec<[FlatEntity<'a>; 8]>;

/// Flatten an optional collection; absent means "no entities".
pub fn flatten_entities(collection: Option<&EntityCollection>) -> FlatEntities<'_> {
    collection.map(EntityCollection::flatten).unwrap_or_default()
}

// =============================================================================
// Entity
// =============================================================================

/// Flat field mapping representing one normalized data object.
#[derive(Debug, Clone, Default, Serialize)]
#[must_use]
pub struct Entity {
    /// Field name → value, ordered by name
    pub fields: BTreeMap<CompactString, FieldValue>,
}

impl Entity {
    /// Create an entity with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a materialized field value.
    pub fn insert(&mut self, name: impl Into<CompactString>, value: Value) {
        self.fields.insert(name.into(), FieldValue::Inline(value));
    }

    /// Builder-style insert of a materialized field value.
    pub fn with_field(mut self, name: impl Into<CompactString>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder-style insert of an unresolved reference field.
    pub fn with_reference(mut self, name: impl Into<CompactString>, reference: EntityRef) -> Self {
        self.fields
            .insert(name.into(), FieldValue::Reference(reference));
        self
    }

    /// Look up a field by name.
    #[inline]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Number of fields on this entity.
    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

// =============================================================================
// FieldValue
// =============================================================================

/// Value of one entity field - either materialized data or an unresolved
/// pointer to another entity.
///
/// A `Reference` is the escape hatch of the comparison policy: its
/// presence and key are checked, but its value compares equal
/// unconditionally, because resolving it is not the oracle's concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Materialized data, compared structurally
    Inline(Value),
    /// Unresolved/lazy pointer, always treated as equal
    Reference(EntityRef),
}

impl FieldValue {
    /// Check if this is an unresolved reference.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// Get the materialized value, if this field holds one.
    #[inline]
    pub fn as_inline(&self) -> Option<&Value> {
        match self {
            Self::Inline(value) => Some(value),
            Self::Reference(_) => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Inline(value)
    }
}

// =============================================================================
// EntityRef
// =============================================================================

/// Unresolved pointer to another entity.
///
/// Serializes in the marker convention of the dynamic source system:
/// an object carrying a truthy `_ref` plus whatever target coordinates
/// the producer recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityRef {
    /// Target entity type, if recorded
    pub entity_type: Option<CompactString>,
    /// Target entity id, if recorded
    pub id: Option<CompactString>,
}

impl EntityRef {
    /// Create a reference with no recorded target coordinates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reference to `(entity_type, id)`.
    pub fn to(entity_type: impl Into<CompactString>, id: impl Into<CompactString>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            id: Some(id.into()),
        }
    }
}

impl Serialize for EntityRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.entity_type.is_some()) + usize::from(self.id.is_some());
        let mut map = serializer.serialize_map(Some(1 + extra))?;
        map.serialize_entry("_ref", &true)?;
        if let Some(entity_type) = &self.entity_type {
            map.serialize_entry("type", entity_type)?;
        }
        if let Some(id) = &self.id {
            map.serialize_entry("id", id)?;
        }
        map.end()
    }
}
