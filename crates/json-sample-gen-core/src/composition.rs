//! `allOf` structural merge.
//!
//! Folds already-dereferenced `allOf` branches into one flat schema map.
//! Properties union (shared keys merge recursively), `required` unions,
//! bounds tighten, `enum` intersects, `type` narrows. Conditional keywords
//! are dropped since the generator does not evaluate them.

use serde_json::{Map, Value};

/// Fold N schema maps into one, in order. Later maps win on last-wins keys.
pub fn merge_all(schemas: Vec<Map<String, Value>>, path: &str) -> Map<String, Value> {
    let mut iter = schemas.into_iter();
    let mut acc = iter.next().unwrap_or_default();
    for overlay in iter {
        acc = merge_two(acc, overlay, path);
    }
    for keyword in ["if", "then", "else", "not"] {
        if acc.remove(keyword).is_some() {
            tracing::debug!(path, keyword, "dropping conditional keyword from allOf merge");
        }
    }
    acc
}

/// Merge two schema maps. `overlay` takes precedence on last-wins keys.
fn merge_two(
    base: Map<String, Value>,
    overlay: Map<String, Value>,
    path: &str,
) -> Map<String, Value> {
    let mut result = base;

    for (k, v) in overlay {
        match k.as_str() {
            "properties" => merge_properties(&mut result, v, path),
            "required" => merge_required(&mut result, v),
            "type" => intersect_type(&mut result, v, path),
            "enum" => intersect_enum(&mut result, v),
            "minimum" | "exclusiveMinimum" | "minLength" | "minItems" | "minProperties" => {
                tighten(&mut result, &k, v, |existing, new| new > existing)
            }
            "maximum" | "exclusiveMaximum" | "maxLength" | "maxItems" | "maxProperties" => {
                tighten(&mut result, &k, v, |existing, new| new < existing)
            }
            "const" => {
                if let Some(existing) = result.get("const") {
                    if *existing != v {
                        tracing::warn!(path, "allOf const conflict, later branch wins");
                    }
                }
                result.insert(k, v);
            }
            "allOf" => {
                // Branches arrive flattened; a leftover allOf would be re-merged.
            }
            _ => {
                result.insert(k, v);
            }
        }
    }

    result
}

/// Union `properties`; keys present on both sides merge recursively.
fn merge_properties(result: &mut Map<String, Value>, overlay_val: Value, path: &str) {
    let Value::Object(overlay_props) = overlay_val else {
        return;
    };
    let base_props = result
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(base_map) = base_props.as_object_mut() else {
        return;
    };
    for (prop_key, prop_val) in overlay_props {
        match (base_map.remove(&prop_key), prop_val) {
            (Some(Value::Object(existing)), Value::Object(incoming))
                if !existing.contains_key("$ref") && !incoming.contains_key("$ref") =>
            {
                let merged = merge_two(existing, incoming, path);
                base_map.insert(prop_key, Value::Object(merged));
            }
            (_, incoming) => {
                base_map.insert(prop_key, incoming);
            }
        }
    }
}

/// Union `required` arrays, deduplicated, first occurrence order.
fn merge_required(result: &mut Map<String, Value>, overlay_val: Value) {
    let Value::Array(incoming) = overlay_val else {
        return;
    };
    let Value::Array(names) = result
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()))
    else {
        return;
    };
    for name in incoming.into_iter().filter(Value::is_string) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
}

/// `number` ∩ `integer` = `integer`; otherwise the later type wins.
fn intersect_type(result: &mut Map<String, Value>, overlay_val: Value, path: &str) {
    let Some(existing) = result.get("type") else {
        result.insert("type".to_string(), overlay_val);
        return;
    };
    match (existing.as_str(), overlay_val.as_str()) {
        (Some(b), Some(o)) if b == o => {}
        (Some("number"), Some("integer")) | (Some("integer"), Some("number")) => {
            result.insert("type".to_string(), Value::String("integer".to_string()));
        }
        (b, o) => {
            tracing::warn!(path, base = ?b, overlay = ?o, "allOf type conflict, later branch wins");
            result.insert("type".to_string(), overlay_val);
        }
    }
}

/// Keep only `enum` values present in both.
fn intersect_enum(result: &mut Map<String, Value>, overlay_val: Value) {
    let Value::Array(incoming) = overlay_val else {
        return;
    };
    if let Some(Value::Array(current)) = result.get_mut("enum") {
        current.retain(|v| incoming.contains(v));
        return;
    }
    result.insert("enum".to_string(), Value::Array(incoming));
}

/// Replace a numeric bound when `stricter(existing, new)` holds.
fn tighten(
    result: &mut Map<String, Value>,
    key: &str,
    overlay_val: Value,
    stricter: impl Fn(f64, f64) -> bool,
) {
    if let Some(existing) = result.get(key) {
        if let (Some(base_f), Some(overlay_f)) = (existing.as_f64(), overlay_val.as_f64()) {
            if stricter(base_f, overlay_f) {
                result.insert(key.to_string(), overlay_val);
            }
            return;
        }
    }
    result.insert(key.to_string(), overlay_val);
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_properties_and_required_union() {
        let merged = merge_all(
            vec![
                map(json!({"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]})),
                map(json!({"type": "object", "properties": {"age": {"type": "integer"}}, "required": ["age", "name"]})),
            ],
            "#",
        );
        assert_eq!(
            Value::Object(merged),
            json!({
                "type": "object",
                "properties": {"name": {"type": "string"}, "age": {"type": "integer"}},
                "required": ["name", "age"]
            })
        );
    }

    #[test]
    fn test_shared_property_merges_recursively() {
        let merged = merge_all(
            vec![
                map(json!({"properties": {"n": {"type": "number", "minimum": 0}}})),
                map(json!({"properties": {"n": {"type": "integer", "minimum": 5, "maximum": 9}}})),
            ],
            "#",
        );
        assert_eq!(
            merged["properties"]["n"],
            json!({"type": "integer", "minimum": 5, "maximum": 9})
        );
    }

    #[test]
    fn test_bounds_tighten_and_enum_intersects() {
        let merged = merge_all(
            vec![
                map(json!({"maximum": 10, "minItems": 2, "enum": [1, 2, 3]})),
                map(json!({"maximum": 20, "minItems": 1, "enum": [2, 3, 4]})),
            ],
            "#",
        );
        assert_eq!(merged["maximum"], json!(10));
        assert_eq!(merged["minItems"], json!(2));
        assert_eq!(merged["enum"], json!([2, 3]));
    }

    #[test]
    fn test_required_dedups_and_skips_non_strings() {
        let merged = merge_all(
            vec![
                map(json!({"required": ["a"]})),
                map(json!({"required": ["b", 7, "a", "b"]})),
                map(json!({"required": "c"})),
            ],
            "#",
        );
        assert_eq!(merged["required"], json!(["a", "b"]));
    }

    #[test]
    fn test_enum_intersection_keeps_base_order() {
        let merged = merge_all(
            vec![
                map(json!({"properties": {}})),
                map(json!({"enum": ["z", "y", "x"]})),
                map(json!({"enum": ["x", "z"]})),
            ],
            "#",
        );
        assert_eq!(merged["enum"], json!(["z", "x"]));
    }

    #[test]
    fn test_conditionals_dropped() {
        let merged = merge_all(
            vec![
                map(json!({"type": "object", "if": {"required": ["a"]}})),
                map(json!({"then": {"required": ["b"]}, "not": {"type": "null"}})),
            ],
            "#",
        );
        assert_eq!(Value::Object(merged), json!({"type": "object"}));
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_all(Vec::new(), "#").is_empty());
    }
}
