//! Snapshot equivalence oracle.
//!
//! Decides whether two successive props-bag snapshots are equivalent
//! enough that dependent work (a re-render, a cache refresh, a derived
//! recomputation) can be skipped. This is a pure comparison over two
//! immutable inputs; no state survives a call.
//!
//! # Algorithm
//!
//! Four stages, strictly top-down, short-circuiting on the first mismatch:
//!
//! 1. Resource key-set gate: admin-excluded name sets must match in
//!    cardinality
//! 2. Extra fields: per-resource auxiliary fields under the configured
//!    deep/shallow strategy
//! 3. Request metadata: exact equality on `status` and `fetched_at`
//! 4. Entity collections: canonical flatten, then positional
//!    entity-by-entity, field-by-field comparison; unresolved reference
//!    fields compare equal unconditionally
//!
//! # Failure Policy
//!
//! Comparison never errors. Absent records and fields degrade to "absent"
//! and compare unequal, so malformed input means "recompute", never a
//! crash and never a silently skipped update.

use compact_str::{CompactString, ToCompactString};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::snapshot::{
    Entity, FieldValue, PropsBag, RequestStatus, ResourceRecord, flatten_entities,
};

use super::strategy::{Strategy, deep_equal, values_equal};

// =============================================================================
// Public Types
// =============================================================================

/// Configuration for a comparison run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareConfig {
    /// Strategy applied to extra fields. Entity fields always use the
    /// deep strategy.
    pub strategy: Strategy,
    /// Emit a `tracing` debug event for every recorded mismatch. The
    /// verdict is unaffected; this is an observability side channel.
    pub log_mismatches: bool,
}

impl CompareConfig {
    /// Config with the deep extra-field strategy (same as `Default`).
    pub fn deep() -> Self {
        Self::default()
    }

    /// Config with the shallow extra-field strategy.
    pub fn shallow() -> Self {
        Self {
            strategy: Strategy::Shallow,
            ..Self::default()
        }
    }

    /// Enable the diagnostic side channel.
    pub fn with_mismatch_logging(mut self) -> Self {
        self.log_mismatches = true;
        self
    }
}

/// Counters from one comparison run.
#[derive(Debug, Default, Clone, Copy, Serialize)]
#[must_use]
pub struct CompareStats {
    /// Number of resource records visited
    pub resources_compared: usize,
    /// Number of extra fields compared
    pub extra_fields_compared: usize,
    /// Number of entities compared positionally
    pub entities_compared: usize,
    /// Number of entity fields compared
    pub entity_fields_compared: usize,
    /// Number of entity fields skipped as unresolved references
    pub references_skipped: usize,
}

/// Result of comparing two snapshots: a verdict plus the reason it was
/// reached and counters describing the work done.
///
/// The comparison short-circuits, so `mismatches` holds at most the first
/// difference found; an empty list is the equivalence verdict.
#[derive(Debug, Serialize)]
#[must_use]
pub struct EquivalenceReport {
    /// Mismatches found before short-circuiting (at most one)
    pub mismatches: Vec<Mismatch>,
    /// Counters for the comparison run
    pub stats: CompareStats,
}

impl EquivalenceReport {
    /// Whether the two snapshots are equivalent.
    #[inline]
    pub fn is_equivalent(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// First (and only, given short-circuiting) mismatch, if any.
    pub fn first_mismatch(&self) -> Option<&Mismatch> {
        self.mismatches.first()
    }
}

// =============================================================================
// Mismatch
// =============================================================================

/// A single reason two snapshots were judged non-equivalent, naming the
/// sub-check that failed and the offending values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Mismatch {
    /// The admin-excluded resource name sets differ in size
    ResourceCount { prev: usize, next: usize },

    /// A resource named in the next snapshot has no counterpart in the
    /// previous one; all of its fields are considered different
    MissingResource { name: CompactString },

    /// Extra-field name sets of a record differ in size
    ExtraFieldCount {
        resource: CompactString,
        prev: usize,
        next: usize,
    },

    /// An extra field compared unequal under the configured strategy
    ExtraFieldValue {
        resource: CompactString,
        field: CompactString,
        prev: Option<serde_json::Value>,
        next: serde_json::Value,
    },

    /// `status` or `fetched_at` changed between the two requests
    RequestState {
        resource: CompactString,
        prev_status: Option<RequestStatus>,
        next_status: Option<RequestStatus>,
        prev_fetched_at: Option<i64>,
        next_fetched_at: Option<i64>,
    },

    /// Flattened entity sequences differ in length
    EntityCount {
        resource: CompactString,
        prev: usize,
        next: usize,
    },

    /// Field name sets of a positionally paired entity differ in size
    EntityFieldCount {
        resource: CompactString,
        entity_type: CompactString,
        id: CompactString,
        prev: usize,
        next: usize,
    },

    /// An entity field compared unequal
    EntityFieldValue {
        resource: CompactString,
        entity_type: CompactString,
        id: CompactString,
        field: CompactString,
        prev: Option<FieldValue>,
        next: FieldValue,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceCount { prev, next } => {
                write!(f, "resource count changed: {prev} -> {next}")
            }
            Self::MissingResource { name } => {
                write!(f, "resource `{name}` missing from previous snapshot")
            }
            Self::ExtraFieldCount {
                resource,
                prev,
                next,
            } => write!(
                f,
                "extra field count changed on `{resource}`: {prev} -> {next}"
            ),
            Self::ExtraFieldValue {
                resource, field, ..
            } => write!(f, "extra field `{field}` changed on `{resource}`"),
            Self::RequestState { resource, .. } => {
                write!(f, "request state changed on `{resource}`")
            }
            Self::EntityCount {
                resource,
                prev,
                next,
            } => write!(f, "entity count changed on `{resource}`: {prev} -> {next}"),
            Self::EntityFieldCount {
                resource,
                entity_type,
                id,
                prev,
                next,
            } => write!(
                f,
                "field count changed on `{resource}` entity {entity_type}/{id}: {prev} -> {next}"
            ),
            Self::EntityFieldValue {
                resource,
                entity_type,
                id,
                field,
                ..
            } => write!(
                f,
                "field `{field}` changed on `{resource}` entity {entity_type}/{id}"
            ),
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Decide whether `next` is equivalent to `prev`, with the default
/// (deep) configuration.
///
/// `true` means dependent work can be skipped; `false` means something
/// observable changed.
pub fn is_equivalent(prev: &PropsBag, next: &PropsBag) -> bool {
    compare(prev, next).is_equivalent()
}

/// Compare two snapshots with the default configuration, returning the
/// structured report.
pub fn compare(prev: &PropsBag, next: &PropsBag) -> EquivalenceReport {
    compare_with_config(prev, next, CompareConfig::default())
}

/// Compare two snapshots with an explicit configuration.
///
/// # Example
///
/// ```ignore
/// let report = compare_with_config(&prev, &next, CompareConfig::shallow());
/// if !report.is_equivalent() {
///     rerender();
/// }
/// ```
pub fn compare_with_config(
    prev: &PropsBag,
    next: &PropsBag,
    config: CompareConfig,
) -> EquivalenceReport {
    let mut ctx = CompareContext::new(config);
    ctx.compare_bags(prev, next);
    ctx.into_report()
}

// =============================================================================
// Internal Context
// =============================================================================

struct CompareContext {
    config: CompareConfig,
    mismatches: Vec<Mismatch>,
    stats: CompareStats,
}

impl CompareContext {
    fn new(config: CompareConfig) -> Self {
        Self {
            config,
            mismatches: Vec::new(),
            stats: CompareStats::default(),
        }
    }

    fn into_report(self) -> EquivalenceReport {
        EquivalenceReport {
            mismatches: self.mismatches,
            stats: self.stats,
        }
    }

    /// Short-circuit marker: a recorded mismatch ends the comparison.
    fn failed(&self) -> bool {
        !self.mismatches.is_empty()
    }

    fn record(&mut self, mismatch: Mismatch) {
        if self.config.log_mismatches {
            debug!(%mismatch, "snapshots differ");
        }
        self.mismatches.push(mismatch);
    }

    /// Stage 1: key-set gate, then per-resource stages over the next
    /// bag's names.
    fn compare_bags(&mut self, prev: &PropsBag, next: &PropsBag) {
        if prev.resources.len() != next.resources.len() {
            self.record(Mismatch::ResourceCount {
                prev: prev.resources.len(),
                next: next.resources.len(),
            });
            return;
        }

        for (name, next_record) in &next.resources {
            self.stats.resources_compared += 1;

            // Same cardinality does not guarantee the same names: a
            // renamed resource shows up here as a missing previous record
            // and counts as "all of its fields differ".
            let Some(prev_record) = prev.resources.get(name) else {
                self.record(Mismatch::MissingResource { name: name.clone() });
                return;
            };

            self.compare_record(name, prev_record, next_record);
            if self.failed() {
                return;
            }
        }
    }

    /// Stages 2-4 for one named resource, in order, short-circuiting.
    fn compare_record(&mut self, name: &CompactString, prev: &ResourceRecord, next: &ResourceRecord) {
        self.compare_extra_fields(name, prev, next);
        if self.failed() {
            return;
        }

        self.compare_request(name, prev, next);
        if self.failed() {
            return;
        }

        self.compare_entity_collections(name, prev, next);
    }

    /// Stage 2: auxiliary fields outside the three reserved slots,
    /// compared under the configured strategy.
    fn compare_extra_fields(
        &mut self,
        name: &CompactString,
        prev: &ResourceRecord,
        next: &ResourceRecord,
    ) {
        if prev.extra.len() != next.extra.len() {
            self.record(Mismatch::ExtraFieldCount {
                resource: name.clone(),
                prev: prev.extra.len(),
                next: next.extra.len(),
            });
            return;
        }

        for (field, next_value) in &next.extra {
            self.stats.extra_fields_compared += 1;

            let prev_value = prev.extra.get(field);
            let equal = prev_value
                .is_some_and(|prev_value| values_equal(self.config.strategy, prev_value, next_value));
            if !equal {
                self.record(Mismatch::ExtraFieldValue {
                    resource: name.clone(),
                    field: field.clone(),
                    prev: prev_value.cloned(),
                    next: next_value.clone(),
                });
                return;
            }
        }
    }

    /// Stage 3: exact equality on `status` and `fetched_at`; an absent
    /// request yields absent sub-fields, and every other request field is
    /// ignored.
    fn compare_request(&mut self, name: &CompactString, prev: &ResourceRecord, next: &ResourceRecord) {
        let prev_status = prev.request.as_ref().map(|r| r.status);
        let next_status = next.request.as_ref().map(|r| r.status);
        let prev_fetched_at = prev.request.as_ref().and_then(|r| r.fetched_at);
        let next_fetched_at = next.request.as_ref().and_then(|r| r.fetched_at);

        if prev_status != next_status || prev_fetched_at != next_fetched_at {
            self.record(Mismatch::RequestState {
                resource: name.clone(),
                prev_status,
                next_status,
                prev_fetched_at,
                next_fetched_at,
            });
        }
    }

    /// Stage 4: canonical flatten, length gate, positional entity pairs.
    fn compare_entity_collections(
        &mut self,
        name: &CompactString,
        prev: &ResourceRecord,
        next: &ResourceRecord,
    ) {
        let prev_flat = flatten_entities(prev.all_objects.as_ref());
        let next_flat = flatten_entities(next.all_objects.as_ref());

        if prev_flat.len() != next_flat.len() {
            self.record(Mismatch::EntityCount {
                resource: name.clone(),
                prev: prev_flat.len(),
                next: next_flat.len(),
            });
            return;
        }

        for (prev_entry, next_entry) in prev_flat.iter().zip(&next_flat) {
            self.stats.entities_compared += 1;
            self.compare_entities(name, next_entry.entity_type, next_entry.id, prev_entry.entity, next_entry.entity);
            if self.failed() {
                return;
            }
        }
    }

    /// Field-by-field comparison of one positional entity pair. Entity
    /// fields always use the deep strategy; an unresolved reference in
    /// the next entity is equal unconditionally.
    fn compare_entities(
        &mut self,
        name: &CompactString,
        entity_type: &str,
        id: &str,
        prev: &Entity,
        next: &Entity,
    ) {
        if prev.field_count() != next.field_count() {
            self.record(Mismatch::EntityFieldCount {
                resource: name.clone(),
                entity_type: entity_type.to_compact_string(),
                id: id.to_compact_string(),
                prev: prev.field_count(),
                next: next.field_count(),
            });
            return;
        }

        for (field, next_value) in &next.fields {
            self.stats.entity_fields_compared += 1;

            if next_value.is_reference() {
                // The slot position already matched; whether the target
                // resolves equal is not the oracle's concern.
                self.stats.references_skipped += 1;
                continue;
            }

            let prev_value = prev.fields.get(field);
            let equal = match (prev_value, next_value) {
                (Some(FieldValue::Inline(prev_value)), FieldValue::Inline(next_value)) => {
                    deep_equal(prev_value, next_value)
                }
                // Absent on the previous side, or previously an
                // unresolved reference where the next side is now inline.
                _ => false,
            };
            if !equal {
                self.record(Mismatch::EntityFieldValue {
                    resource: name.clone(),
                    entity_type: entity_type.to_compact_string(),
                    id: id.to_compact_string(),
                    field: field.clone(),
                    prev: prev_value.cloned(),
                    next: next_value.clone(),
                });
                return;
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
