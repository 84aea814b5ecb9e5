//! Helpers for working with loosely-typed YAML values.
//!
//! Documents are kept as `serde_yaml::Value` so that unknown keys survive a
//! round trip. These helpers answer the few questions the pipelines need to
//! ask of such values without committing to a full schema.

use serde_yaml::Value;

// ============================================================================
// Truthiness
// ============================================================================

/// Returns `true` if the value would count as "set" in a hand-written config.
///
/// `null`, `false`, zero, empty strings, empty sequences and empty mappings
/// are all treated as unset.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

// ============================================================================
// Named Entries
// ============================================================================

/// Returns the `name` field of a proxy or proxy-group entry.
pub fn entry_name(entry: &Value) -> Option<&str> {
    entry.get("name").and_then(Value::as_str)
}

/// Returns the items of a sequence value, or an empty slice for anything else.
pub fn as_slice(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Sequence(seq)) => seq.as_slice(),
        _ => &[],
    }
}

/// Collects the string items of a sequence value, skipping non-strings.
pub fn string_items(value: Option<&Value>) -> Vec<String> {
    as_slice(value)
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_is_truthy_scalars() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&yaml("false")));
        assert!(is_truthy(&yaml("true")));
        assert!(!is_truthy(&yaml("0")));
        assert!(is_truthy(&yaml("7890")));
        assert!(!is_truthy(&yaml("''")));
        assert!(is_truthy(&yaml("abc")));
    }

    #[test]
    fn test_is_truthy_collections() {
        assert!(!is_truthy(&yaml("[]")));
        assert!(is_truthy(&yaml("[a]")));
        assert!(!is_truthy(&yaml("{}")));
        assert!(is_truthy(&yaml("{a: 1}")));
    }

    #[test]
    fn test_entry_name() {
        let entry = yaml("{name: node-1, type: vmess}");
        assert_eq!(entry_name(&entry), Some("node-1"));
        assert_eq!(entry_name(&yaml("{type: vmess}")), None);
        assert_eq!(entry_name(&yaml("{name: 42}")), None);
    }

    #[test]
    fn test_as_slice_non_sequence() {
        assert!(as_slice(None).is_empty());
        assert!(as_slice(Some(&yaml("{a: 1}"))).is_empty());
        assert_eq!(as_slice(Some(&yaml("[1, 2]"))).len(), 2);
    }

    #[test]
    fn test_string_items_skips_non_strings() {
        let value = yaml("[DIRECT, 1, REJECT]");
        assert_eq!(string_items(Some(&value)), vec!["DIRECT", "REJECT"]);
    }
}
