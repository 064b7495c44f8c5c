//! JSON Pointer utilities and `$anchor` scanning.
//!
//! 1. **Escaping** (RFC 6901) for schema keys containing `/` or `~`
//! 2. **Lookup** of a pointer fragment inside a document
//! 3. **Anchors**: a map from `$anchor` names to the pointer of the node
//!    declaring them

use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::Value;

/// Escape a single path segment per RFC 6901 (`~` as `~0`, `/` as `~1`).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains(&['~', '/'][..]) {
        return Cow::Borrowed(segment);
    }
    let mut escaped = String::with_capacity(segment.len() + 4);
    for c in segment.chars() {
        match c {
            '~' => escaped.push_str("~0"),
            '/' => escaped.push_str("~1"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Inverse of [`escape_pointer_segment`]. A `~` not followed by `0` or `1`
/// is kept as is.
pub fn unescape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains('~') {
        return Cow::Borrowed(segment);
    }
    let mut decoded = String::with_capacity(segment.len());
    let mut chars = segment.chars().peekable();
    while let Some(c) = chars.next() {
        let replacement = match (c, chars.peek()) {
            ('~', Some('0')) => '~',
            ('~', Some('1')) => '/',
            _ => {
                decoded.push(c);
                continue;
            }
        };
        chars.next();
        decoded.push(replacement);
    }
    Cow::Owned(decoded)
}

/// Append escaped segments to a parent pointer.
///
/// ```
/// use json_sample_gen_core::pointer::build_path;
/// assert_eq!(build_path("#/definitions", &["a/b"]), "#/definitions/a~1b");
/// ```
pub fn build_path(parent: &str, segments: &[&str]) -> String {
    segments.iter().fold(parent.to_string(), |mut pointer, segment| {
        pointer.push('/');
        pointer.push_str(&escape_pointer_segment(segment));
        pointer
    })
}

/// Decoded segments of a pointer, with or without the leading `#`.
///
/// ```
/// use json_sample_gen_core::pointer::split_path;
/// assert_eq!(split_path("#/properties/a~1b"), vec!["properties", "a/b"]);
/// assert_eq!(split_path("#"), Vec::<String>::new());
/// ```
pub fn split_path(path: &str) -> Vec<String> {
    let fragment = path.strip_prefix('#').unwrap_or(path);
    let body = match fragment.strip_prefix('/') {
        Some(body) => body,
        None if fragment.is_empty() => return Vec::new(),
        None => fragment,
    };
    body.split('/')
        .map(|s| unescape_pointer_segment(s).into_owned())
        .collect()
}

/// Resolve a pointer fragment (`""`, `"/definitions/Person"`) inside `document`.
pub fn lookup<'d>(document: &'d Value, fragment: &str) -> Option<&'d Value> {
    let mut current = document;
    for segment in split_path(fragment) {
        current = match current {
            Value::Object(obj) => obj.get(&segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Split a `$ref` into its document part and its fragment.
///
/// `"other.json#/a"` → `("other.json", Some("/a"))`, `"#"` → `("", Some(""))`,
/// `"other.json"` → `("other.json", None)`.
pub fn split_ref(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('#') {
        Some((doc, fragment)) => (doc, Some(fragment)),
        None => (reference, None),
    }
}

/// True when a fragment is a JSON Pointer rather than an anchor name.
pub fn is_pointer_fragment(fragment: &str) -> bool {
    fragment.is_empty() || fragment.starts_with('/')
}

/// Map every `$anchor` declared in `document` to the pointer of its node.
///
/// First declaration wins when an anchor name repeats.
pub fn build_anchor_map(document: &Value) -> HashMap<String, String> {
    let mut map = HashMap::new();
    scan_anchors(document, "", &mut map);
    map
}

fn scan_anchors(node: &Value, pointer: &str, map: &mut HashMap<String, String>) {
    match node {
        Value::Object(obj) => {
            if let Some(anchor) = obj.get("$anchor").and_then(Value::as_str) {
                map.entry(anchor.to_string())
                    .or_insert_with(|| pointer.to_string());
            }
            for (key, child) in obj {
                // `const`/`enum`/`default` hold data, not schemas.
                if matches!(key.as_str(), "const" | "enum" | "default" | "examples") {
                    continue;
                }
                scan_anchors(child, &build_path(pointer, &[key]), map);
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                scan_anchors(item, &build_path(pointer, &[&i.to_string()]), map);
            }
        }
        _ => {}
    }
}

// ===========================================================================
// Tests
// ===========================================================================
