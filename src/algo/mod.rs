//! Algorithm implementations for snapshot comparison.
//!
//! - `compare`: the four-stage equality oracle over two props bags
//! - `strategy`: pluggable deep/shallow value-equality strategies

mod compare;
mod strategy;

pub use compare::{
    CompareConfig, CompareStats, EquivalenceReport, Mismatch, compare, compare_with_config,
    is_equivalent,
};
pub use strategy::{Strategy, deep_equal, shallow_equal, values_equal};
