//! Property-based tests for output paths and the document builder.
//!
//! Properties under test:
//! 1. parse/display roundtrip: `parse(display(p)) == p` for canonical paths
//! 2. set/get roundtrip: `get(set(p, {}, v), p) == v`
//! 3. array gap filling: every element before the written index exists
//! 4. pointer escape roundtrip: `unescape(escape(s)) == s`

use json_sample_gen_core::pointer::{escape_pointer_segment, unescape_pointer_segment};
use json_sample_gen_core::{get_value_at_path, set_value_at_path, PathExpression, PathStep};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Keys may hold anything except the structural `.`, `[` and `]`.
fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("@type".to_string()),
        Just("$id".to_string()),
        Just("x-internal".to_string()),
        "[a-zA-Z_@$-][a-zA-Z0-9_@$-]{0,10}",
    ]
}

fn arb_step() -> impl Strategy<Value = PathStep> {
    (arb_key(), proptest::option::of(0usize..6)).prop_map(|(key, index)| PathStep { key, index })
}

fn arb_path() -> impl Strategy<Value = PathExpression> {
    proptest::collection::vec(arb_step(), 1..6).prop_map(PathExpression::from_steps)
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[[:print:]]{0,12}".prop_map(Value::from),
        Just(json!({"nested": [1, 2]})),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, ..Default::default() })]

    /// Property: display then parse gives back the same expression.
    #[test]
    fn parse_display_roundtrip(path in arb_path()) {
        let rendered = path.to_string();
        let reparsed = PathExpression::parse(&rendered).unwrap();
        prop_assert_eq!(reparsed, path);
    }

    /// Property: a value written at a path is read back unchanged.
    #[test]
    fn set_get_roundtrip(path in arb_path(), value in arb_leaf()) {
        let rendered = path.to_string();
        let mut doc = json!({});
        set_value_at_path(&rendered, &mut doc, value.clone()).unwrap();
        let read = get_value_at_path(&rendered, &doc).unwrap();
        prop_assert_eq!(read, Some(&value));
    }

    /// Property: writing index `i` leaves `i` placeholder elements before it.
    #[test]
    fn gap_filling_pads_with_objects(key in arb_key(), index in 0usize..8) {
        let mut doc = json!({});
        set_value_at_path(&format!("{key}[{index}]"), &mut doc, json!(1)).unwrap();
        let items = doc[&key].as_array().unwrap();
        prop_assert_eq!(items.len(), index + 1);
        let placeholder = json!({});
        prop_assert!(items[..index].iter().all(|v| *v == placeholder));
    }

    /// Property: `unescape(escape(s)) == s` for arbitrary strings.
    #[test]
    fn escape_unescape_roundtrip(s in "[[:print:]]{0,30}") {
        let escaped = escape_pointer_segment(&s);
        let unescaped = unescape_pointer_segment(&escaped);
        prop_assert_eq!(unescaped.as_ref(), s.as_str());
    }
}
