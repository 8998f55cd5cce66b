//! Error types for snapshot-eq.
//!
//! Only the JSON ingestion layer is fallible. Comparison itself never
//! errors: malformed or absent data degrades to "absent" and compares
//! unequal, biasing toward recomputation instead of a crash.

use thiserror::Error;

/// Errors that can occur while building typed snapshots from JSON.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A JSON value had the wrong shape for the slot it was found in
    #[error("expected a JSON object for {context}, found {found}")]
    ExpectedObject {
        /// Which part of the snapshot was being read
        context: &'static str,
        /// Kind of JSON value actually found
        found: &'static str,
    },

    /// A request carried a status string outside the known set
    #[error("unknown request status `{0}`")]
    UnknownStatus(String),

    /// `fetchedAt` was present but not an integer millisecond timestamp
    #[error("fetchedAt must be an integer timestamp or null, found `{0}`")]
    InvalidTimestamp(String),
}

/// Result type alias for snapshot ingestion.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

impl SnapshotError {
    /// Create an `ExpectedObject` error for the given slot and value kind.
    pub fn expected_object(context: &'static str, found: &'static str) -> Self {
        Self::ExpectedObject { context, found }
    }
}
