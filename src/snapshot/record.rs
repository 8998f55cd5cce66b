//! Resource record and request metadata types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;
use serde::Serialize;
use serde_json::Value;

use crate::error::SnapshotError;

use super::entity::EntityCollection;

// =============================================================================
// ResourceRecord
// =============================================================================

/// Current known state of one named resource.
///
/// The three well-known slots (`request`, `all_objects`, `actions`) are
/// fixed fields. Everything else the producer attaches travels in `extra`:
/// in the dynamic source these were non-enumerable properties layered onto
/// the record, discovered outside the ordinary key listing, so they get an
/// explicit auxiliary mapping here rather than a flag on each entry.
#[derive(Debug, Clone, Default, Serialize)]
#[must_use]
pub struct ResourceRecord {
    /// Fetch-status sub-structure, if a request was ever issued
    pub request: Option<RequestMetadata>,
    /// Normalized entity data; absent means "no entities", not an error
    pub all_objects: Option<EntityCollection>,
    /// Opaque action-dispatcher payload. Its identity churns independently
    /// of data changes, so it is excluded from comparison entirely.
    pub actions: Option<Value>,
    /// Auxiliary derived data, compared with the configured field strategy
    pub extra: BTreeMap<CompactString, Value>,
}

impl ResourceRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for the request metadata.
    pub fn with_request(mut self, request: RequestMetadata) -> Self {
        self.request = Some(request);
        self
    }

    /// Builder-style setter for the entity collection.
    pub fn with_entities(mut self, entities: EntityCollection) -> Self {
        self.all_objects = Some(entities);
        self
    }

    /// Builder-style insert of one extra field.
    pub fn with_extra(mut self, name: impl Into<CompactString>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Look up an extra field by name.
    #[inline]
    pub fn extra_field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

// =============================================================================
// RequestMetadata
// =============================================================================

/// Fetch-status sub-structure of a resource record.
///
/// Equality considers `status` and `fetched_at` exactly; everything else a
/// producer stores on the request (loading flags, error payloads, retry
/// bookkeeping) goes into `rest` and is invisible to the oracle.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct RequestMetadata {
    /// Lifecycle phase of the fetch
    pub status: RequestStatus,
    /// Millisecond timestamp of the last completed fetch, if any
    pub fetched_at: Option<i64>,
    /// Other request bookkeeping, ignored by comparison
    pub rest: BTreeMap<CompactString, Value>,
}

impl RequestMetadata {
    /// Create metadata with the given status and no timestamp.
    pub fn new(status: RequestStatus) -> Self {
        Self {
            status,
            fetched_at: None,
            rest: BTreeMap::new(),
        }
    }

    /// Builder-style setter for the fetch timestamp.
    pub fn with_fetched_at(mut self, fetched_at: i64) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }

    /// Builder-style insert into the ignored `rest` mapping.
    pub fn with_rest(mut self, name: impl Into<CompactString>, value: Value) -> Self {
        self.rest.insert(name.into(), value);
        self
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(RequestStatus::NotRequested)
    }
}

// =============================================================================
// RequestStatus
// =============================================================================

/// Lifecycle phase of a resource fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    /// No fetch has been issued for this resource yet
    #[default]
    NotRequested,
    /// A fetch is in flight
    Pending,
    /// The last fetch completed successfully
    Success,
    /// The last fetch failed
    Error,
}

impl RequestStatus {
    /// Wire representation of this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotRequested => "not-requested",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-requested" => Ok(Self::NotRequested),
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(SnapshotError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_round_trip() {
        for status in [
            RequestStatus::NotRequested,
            RequestStatus::Pending,
            RequestStatus::Success,
            RequestStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_unknown() {
        let err = "done".parse::<RequestStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown request status `done`");
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let s = serde_json::to_string(&RequestStatus::NotRequested).unwrap();
        assert_eq!(s, "\"not-requested\"");
    }

    #[test]
    fn test_record_builder() {
        let record = ResourceRecord::new()
            .with_request(RequestMetadata::new(RequestStatus::Success).with_fetched_at(100))
            .with_extra("selectedId", json!("42"));

        assert_eq!(record.request.as_ref().unwrap().fetched_at, Some(100));
        assert_eq!(record.extra_field("selectedId"), Some(&json!("42")));
        assert_eq!(record.extra_field("missing"), None);
    }
}
