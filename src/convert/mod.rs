//! Source format converters to typed snapshots.
//!
//! Producers of the source system hand over JSON-shaped state; the
//! converter here turns a `serde_json::Value` into a [`PropsBag`] the
//! oracle can compare. The typed model is the contract: a converter only
//! needs to produce a valid `PropsBag`, the comparison pipeline handles
//! the rest.
//!
//! [`PropsBag`]: crate::snapshot::PropsBag

pub mod json;

pub use self::json::{ADMIN_KEYS, RESERVED_RECORD_KEYS, from_json};
