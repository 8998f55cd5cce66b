//! Props bag - the top-level snapshot handed to the equality oracle.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::Serialize;
use serde_json::Value;

use super::record::ResourceRecord;

// =============================================================================
// PropsBag
// =============================================================================

/// Top-level mapping from resource name to [`ResourceRecord`].
///
/// A bag also carries an administrative channel (initialization marker,
/// declarations list) that travels with the snapshot but is never part of
/// the semantic comparison. Keeping it in a separate field makes the
/// exclusion structural: the resource key set is `resources.keys()`, no
/// filtering required at comparison time.
#[derive(Debug, Clone, Default, Serialize)]
#[must_use]
pub struct PropsBag {
    /// Named resource records, ordered by name
    pub resources: BTreeMap<CompactString, ResourceRecord>,
    /// Administrative payload, excluded from comparison
    pub admin: AdminChannel,
}

impl PropsBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource record under `name`, replacing any previous one.
    pub fn insert_resource(&mut self, name: impl Into<CompactString>, record: ResourceRecord) {
        self.resources.insert(name.into(), record);
    }

    /// Builder-style variant of [`insert_resource`](Self::insert_resource).
    pub fn with_resource(mut self, name: impl Into<CompactString>, record: ResourceRecord) -> Self {
        self.insert_resource(name, record);
        self
    }

    /// Look up a resource record by name.
    #[inline]
    pub fn resource(&self, name: &str) -> Option<&ResourceRecord> {
        self.resources.get(name)
    }

    /// Number of resource records (administrative keys are not counted,
    /// they live outside the map).
    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check whether the bag holds no resource records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate resource names in lexicographic order.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(CompactString::as_str)
    }
}

// =============================================================================
// AdminChannel
// =============================================================================

/// Administrative payload carried alongside the resource records.
///
/// In the dynamic source system these were reserved keys on the same
/// mapping (`_initializeDataKey`, `updateEntity`, `_declarations`); here
/// they are a separate struct. The updater handle is a function value with
/// no data representation, so only the marker and the declarations survive
/// ingestion. Nothing in this struct ever influences a comparison verdict.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminChannel {
    /// Raw initialization marker, if the producer set one
    pub init_marker: Option<Value>,
    /// Raw declarations list, if the producer set one
    pub declarations: Option<Value>,
}

impl AdminChannel {
    /// Check whether any administrative payload is present.
    pub fn is_empty(&self) -> bool {
        self.init_marker.is_none() && self.declarations.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bag_insert_and_lookup() {
        let bag = PropsBag::new()
            .with_resource("posts", ResourceRecord::new())
            .with_resource("users", ResourceRecord::new());

        assert_eq!(bag.len(), 2);
        assert!(bag.resource("posts").is_some());
        assert!(bag.resource("comments").is_none());
    }

    #[test]
    fn test_resource_names_ordered() {
        let bag = PropsBag::new()
            .with_resource("zebra", ResourceRecord::new())
            .with_resource("alpha", ResourceRecord::new())
            .with_resource("mango", ResourceRecord::new());

        let names: Vec<_> = bag.resource_names().collect();
        assert_eq!(names, vec!["alpha", "mango", "zebra"]);
    }

    #[test]
    fn test_admin_channel_outside_resource_map() {
        let mut bag = PropsBag::new().with_resource("posts", ResourceRecord::new());
        bag.admin.init_marker = Some(json!("posts"));
        bag.admin.declarations = Some(json!([{ "dataKey": "posts" }]));

        // Administrative payload never shows up in the key set.
        assert_eq!(bag.len(), 1);
        assert!(!bag.admin.is_empty());
    }
}
