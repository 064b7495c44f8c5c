//! Path-addressable construction of nested JSON documents.
//!
//! Writes walk a [`PathExpression`], creating objects for intermediate keys
//! and arrays (padded with empty objects) for intermediate indices. Any
//! intermediate value of the wrong shape is replaced by the container the
//! path requires, so a scenario may set `a` to a scalar and later write
//! `a.b` without failing.

use serde_json::{Map, Value};

use crate::error::GenerateError;
use crate::path::{PathExpression, PathStep};

/// Set `value` at `path` inside `target`, overwriting whatever is there.
///
/// Returns a reference to the written value.
///
/// ```
/// use json_sample_gen_core::set_value_at_path;
/// use serde_json::json;
///
/// let mut doc = json!({});
/// set_value_at_path("items[2].count", &mut doc, json!(7)).unwrap();
/// assert_eq!(doc, json!({"items": [{}, {}, {"count": 7}]}));
/// ```
pub fn set_value_at_path<'v>(
    path: &str,
    target: &'v mut Value,
    value: Value,
) -> Result<&'v mut Value, GenerateError> {
    let expr = PathExpression::parse(path)?;
    if expr.is_root() {
        return Err(GenerateError::malformed_path(
            path,
            "cannot set a value at an empty path",
        ));
    }
    Ok(set_at(&expr, target, value))
}

/// Look up the value at `path` inside `target`.
pub fn get_value_at_path<'v>(
    path: &str,
    target: &'v Value,
) -> Result<Option<&'v Value>, GenerateError> {
    let expr = PathExpression::parse(path)?;
    Ok(get_at(&expr, target))
}

/// Write through a parsed path. The root expression replaces `target` wholesale.
///
/// Arrays are padded up to each index, so indices should stay within
/// [`MAX_PATH_INDEX`](crate::MAX_PATH_INDEX) as parsed paths do.
pub fn set_at<'v>(path: &PathExpression, target: &'v mut Value, value: Value) -> &'v mut Value {
    let slot = slot_for(target, path.steps());
    *slot = value;
    slot
}

/// Read through a parsed path without creating anything.
pub fn get_at<'v>(path: &PathExpression, target: &'v Value) -> Option<&'v Value> {
    let mut current = target;
    for step in path.steps() {
        if !step_is_chained(step) {
            current = current.as_object()?.get(&step.key)?;
        }
        if let Some(index) = step.index {
            current = current.as_array()?.get(index)?;
        }
    }
    Some(current)
}

fn step_is_chained(step: &PathStep) -> bool {
    step.key.is_empty() && step.index.is_some()
}

fn slot_for<'v>(root: &'v mut Value, steps: &[PathStep]) -> &'v mut Value {
    let mut current = root;
    for step in steps {
        if !step_is_chained(step) {
            current = ensure_object(current)
                .entry(step.key.clone())
                .or_insert(Value::Null);
        }
        if let Some(index) = step.index {
            let array = ensure_array(current);
            if array.len() <= index {
                array.resize_with(index.saturating_add(1), || Value::Object(Map::new()));
            }
            current = &mut array[index];
        }
    }
    current
}

fn ensure_object(slot: &mut Value) -> &mut Map<String, Value> {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just coerced to an object"),
    }
}

fn ensure_array(slot: &mut Value) -> &mut Vec<Value> {
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => items,
        _ => unreachable!("slot was just coerced to an array"),
    }
}

/// Stateful builder accumulating a document one path at a time.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    root: Value,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    /// Start from an empty object.
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Start from an existing document.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Parse `path` and write `value` there. Returns the written value.
    pub fn set_value_at_path(
        &mut self,
        path: &str,
        value: Value,
    ) -> Result<&mut Value, GenerateError> {
        set_value_at_path(path, &mut self.root, value)
    }

    pub fn set(&mut self, path: &PathExpression, value: Value) -> &mut Value {
        set_at(path, &mut self.root, value)
    }

    pub fn get(&self, path: &PathExpression) -> Option<&Value> {
        get_at(path, &self.root)
    }

    pub fn get_result(&self) -> &Value {
        &self.root
    }

    pub fn into_result(self) -> Value {
        self.root
    }
}

// ===========================================================================
// Tests
// ===========================================================================
