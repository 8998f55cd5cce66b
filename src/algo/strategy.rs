//! Value-equality strategies.
//!
//! Two interchangeable strategies over opaque structured data:
//!
//! - **Deep**: full structural recursion. Objects are equal iff they have
//!   the same key set and recursively equal values, arrays iff same length
//!   and pairwise equal elements, primitives by value.
//! - **Shallow**: primitives by value; containers are equal iff they
//!   produce the same single-level string rendering. Nested containers
//!   collapse to opaque tokens, so a mutation strictly below the first
//!   level is invisible. Accuracy traded for speed.
//!
//! Both strategies satisfy the same contract and are selected through
//! [`Strategy`] without changing the calling protocol.

use std::fmt::Write;

use serde_json::Value;

// =============================================================================
// Strategy
// =============================================================================

/// Which value-equality strategy the extra-field comparator applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Full structural recursion (the accurate default)
    #[default]
    Deep,
    /// One-level string rendering for containers (cheaper, misses deep
    /// mutations)
    Shallow,
}

/// Compare two values under the given strategy.
#[inline]
pub fn values_equal(strategy: Strategy, prev: &Value, next: &Value) -> bool {
    match strategy {
        Strategy::Deep => deep_equal(prev, next),
        Strategy::Shallow => shallow_equal(prev, next),
    }
}

// =============================================================================
// Deep strategy
// =============================================================================

/// Structural recursive equality across arbitrarily nested values.
pub fn deep_equal(prev: &Value, next: &Value) -> bool {
    match (prev, next) {
        (Value::Object(prev), Value::Object(next)) => {
            prev.len() == next.len()
                && next
                    .iter()
                    .all(|(key, nv)| prev.get(key).is_some_and(|pv| deep_equal(pv, nv)))
        }
        (Value::Array(prev), Value::Array(next)) => {
            prev.len() == next.len()
                && prev.iter().zip(next).all(|(pv, nv)| deep_equal(pv, nv))
        }
        // Primitives by value; mismatched kinds are never equal.
        _ => prev == next,
    }
}

// =============================================================================
// Shallow strategy
// =============================================================================

/// One-level equality: primitives by value, containers by their
/// single-level string rendering.
///
/// Identical allocations are equal without rendering anything.
pub fn shallow_equal(prev: &Value, next: &Value) -> bool {
    if std::ptr::eq(prev, next) {
        return true;
    }
    match (prev, next) {
        (Value::Object(_) | Value::Array(_), Value::Object(_) | Value::Array(_)) => {
            shallow_repr(prev) == shallow_repr(next)
        }
        _ => prev == next,
    }
}

/// Render a container one level deep. First-level scalars keep their
/// value; first-level containers collapse to `[array]` / `[object]`.
fn shallow_repr(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_token(&mut out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(key);
                out.push(':');
                push_token(&mut out, item);
            }
            out.push('}');
        }
        scalar => push_token(&mut out, scalar),
    }
    out
}

fn push_token(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::String(s) => out.push_str(s),
        Value::Array(_) => out.push_str("[array]"),
        Value::Object(_) => out.push_str("[object]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_scalars() {
        assert!(deep_equal(&json!(1), &json!(1)));
        assert!(deep_equal(&json!("a"), &json!("a")));
        assert!(deep_equal(&json!(null), &json!(null)));
        assert!(!deep_equal(&json!(1), &json!(2)));
        assert!(!deep_equal(&json!(1), &json!("1")));
        assert!(!deep_equal(&json!(null), &json!(false)));
    }

    #[test]
    fn test_deep_nested() {
        let a = json!({"user": {"name": "ada", "tags": ["x", "y"]}});
        let b = json!({"user": {"name": "ada", "tags": ["x", "y"]}});
        let c = json!({"user": {"name": "ada", "tags": ["x", "z"]}});
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &c));
    }

    #[test]
    fn test_deep_key_set_matters() {
        // Same size, different key set.
        assert!(!deep_equal(&json!({"a": 1}), &json!({"b": 1})));
        // Different sizes.
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_deep_array_length_and_order() {
        assert!(!deep_equal(&json!([1, 2]), &json!([1, 2, 3])));
        assert!(!deep_equal(&json!([1, 2]), &json!([2, 1])));
    }

    #[test]
    fn test_shallow_scalars_by_value() {
        assert!(shallow_equal(&json!(3), &json!(3)));
        assert!(!shallow_equal(&json!(3), &json!(4)));
        // A scalar never equals a container, whatever it renders to.
        assert!(!shallow_equal(&json!("[array]"), &json!([])));
    }

    #[test]
    fn test_shallow_first_level_change_detected() {
        assert!(!shallow_equal(&json!({"a": 1}), &json!({"a": 2})));
        assert!(!shallow_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!shallow_equal(&json!({"a": 1}), &json!({"b": 1})));
    }

    #[test]
    fn test_shallow_misses_deep_mutation() {
        // Two levels down; the first-level rendering collapses the nested
        // object to the same token on both sides.
        let prev = json!({"meta": {"count": 1}});
        let next = json!({"meta": {"count": 2}});
        assert!(shallow_equal(&prev, &next));
        assert!(!deep_equal(&prev, &next));
    }

    #[test]
    fn test_strategy_dispatch() {
        let prev = json!({"meta": {"count": 1}});
        let next = json!({"meta": {"count": 2}});
        assert!(!values_equal(Strategy::Deep, &prev, &next));
        assert!(values_equal(Strategy::Shallow, &prev, &next));
    }
}
