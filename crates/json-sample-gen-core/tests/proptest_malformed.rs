//! Property-based negative tests for malformed JSON Schemas.
//!
//! Validates that `generate()` **never panics**: it returns either `Ok`
//! (the bad keyword is ignored) or a `GenerateError` with a stable code and
//! a non-empty message, when given valid JSON that is invalid as a schema.
//!
//! Many malformed keywords are tolerated: a non-numeric `minimum` falls back
//! to the default range, a string `minItems` is ignored. The invariant under
//! test is **no panics**, not necessarily `Err`.

use json_sample_gen_core::{ErrorCode, GenerateError, SampleGenerator, Schema};
use proptest::prelude::*;
use serde_json::{json, Value};

fn generate(schema: Value) -> Result<Value, GenerateError> {
    SampleGenerator::new(Schema::new(schema)).generate(None)
}

fn code(schema: Value) -> ErrorCode {
    generate(schema).unwrap_err().error_code()
}

// ===========================================================================
// 1. Deterministic negative tests: known malformed schemas
// ===========================================================================

/// `required` must be an array, not a string.
#[test]
fn malformed_required_as_string() {
    let result = generate(json!({
        "type": "object",
        "properties": { "name": { "type": "string" } },
        "required": "not_an_array"
    }));
    assert!(result.unwrap()["name"].is_string());
}

/// `oneOf` must be a non-empty array.
#[test]
fn malformed_oneof_as_string() {
    assert_eq!(code(json!({ "oneOf": "not_an_array" })), ErrorCode::UnsupportedSchema);
    assert_eq!(code(json!({ "anyOf": [] })), ErrorCode::UnsupportedSchema);
}

/// `allOf` must be an array of schema objects.
#[test]
fn malformed_allof_as_object() {
    assert_eq!(code(json!({ "allOf": { "a": 1 } })), ErrorCode::UnsupportedSchema);
    assert_eq!(code(json!({ "allOf": [42] })), ErrorCode::UnsupportedSchema);
}

/// `properties` as a string means an object with no properties.
#[test]
fn malformed_properties_as_string() {
    assert_eq!(
        generate(json!({ "type": "object", "properties": "oops" })).unwrap(),
        json!({})
    );
}

/// `type` must be a string or an array of strings.
#[test]
fn malformed_type_as_number() {
    assert_eq!(code(json!({ "type": 42 })), ErrorCode::UnsupportedSchema);
}

/// `items` as a number is ignored, leaving an untyped empty array.
#[test]
fn malformed_items_as_number() {
    assert_eq!(generate(json!({ "type": "array", "items": 42 })).unwrap(), json!([]));
}

/// `enum` must be a non-empty array.
#[test]
fn malformed_enum_as_string() {
    assert_eq!(code(json!({ "enum": "red" })), ErrorCode::UnsupportedSchema);
    assert_eq!(code(json!({ "enum": [] })), ErrorCode::UnsupportedSchema);
}

/// A non-string `$ref` is not a reference at all.
#[test]
fn malformed_ref_as_number() {
    assert_eq!(code(json!({ "$ref": 42 })), ErrorCode::UnsupportedSchema);
}

/// A property nested under valid structure is still checked.
#[test]
fn malformed_nested_property() {
    let err = generate(json!({
        "type": "object",
        "properties": {
            "outer": {
                "type": "object",
                "properties": { "inner": { "type": "banana" } }
            }
        }
    }))
    .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::UnsupportedSchema);
    assert_eq!(
        err.path(),
        Some("file:///schema.json#/properties/outer/properties/inner")
    );
}

/// `$ref` pointing to a non-existent definition.
#[test]
fn malformed_unresolvable_ref() {
    assert_eq!(
        code(json!({ "$ref": "#/definitions/DoesNotExist" })),
        ErrorCode::UnresolvableRef
    );
    assert_eq!(code(json!({ "$ref": "#no-such-anchor" })), ErrorCode::UnresolvableRef);
}

/// Negative and non-numeric array bounds are ignored.
#[test]
fn malformed_array_bounds() {
    let doc = generate(json!({
        "type": "array",
        "items": { "type": "integer" },
        "minItems": -1,
        "maxItems": "two"
    }))
    .unwrap();
    assert_eq!(doc.as_array().unwrap().len(), 1);
}

/// Non-numeric numeric bounds fall back to the default range.
#[test]
fn malformed_numeric_bounds() {
    let doc = generate(json!({ "type": "integer", "minimum": "zero", "maximum": null })).unwrap();
    assert!((-100..=100).contains(&doc.as_i64().unwrap()));
}

/// A numeric span too wide to sample falls back to its lower bound.
#[test]
fn edge_case_unsampleable_number_range() {
    let doc = generate(json!({ "type": "number", "minimum": -1e308, "maximum": 1e308 })).unwrap();
    assert_eq!(doc, json!(-1e308));
}

/// Boolean schemas carry no discriminator.
#[test]
fn edge_case_boolean_schemas() {
    assert_eq!(code(json!(true)), ErrorCode::UnsupportedSchema);
    assert_eq!(code(json!(false)), ErrorCode::UnsupportedSchema);
}

/// Non-object roots.
#[test]
fn malformed_non_object_roots() {
    for root in [Value::Null, json!([]), json!("string"), json!(42)] {
        assert_eq!(code(root), ErrorCode::UnsupportedSchema);
    }
}

/// Deeply nested valid structure with a bad leaf.
#[test]
fn malformed_deeply_nested() {
    let mut schema = json!({ "type": "nope" });
    for _ in 0..20 {
        schema = json!({ "type": "object", "properties": { "x": schema } });
    }
    assert_eq!(code(schema), ErrorCode::UnsupportedSchema);
}

/// Nesting past the hard limit is reported, not overflowed.
#[test]
fn edge_case_nesting_beyond_limit() {
    let mut schema = json!({ "type": "string" });
    for _ in 0..200 {
        schema = json!({ "type": "object", "properties": { "x": schema } });
    }
    assert_eq!(code(schema), ErrorCode::RecursionDepthExceeded);
}

// ===========================================================================
// 2. Property-based negative tests: proptest strategies
// ===========================================================================

/// Strategy: a JSON Schema keyword with the WRONG value type.
fn arb_malformed_keyword() -> impl Strategy<Value = (&'static str, Value)> {
    prop_oneof![
        Just(("type", json!(42))),
        Just(("type", json!(["banana"]))),
        Just(("properties", json!("not_an_object"))),
        Just(("properties", json!({ "a": 1 }))),
        Just(("required", json!("name"))),
        Just(("items", json!(true))),
        Just(("items", json!([1, 2]))),
        Just(("prefixItems", json!({}))),
        Just(("enum", json!({}))),
        Just(("const", json!({ "nested": [] }))),
        Just(("oneOf", json!([]))),
        Just(("anyOf", json!([null]))),
        Just(("allOf", json!("x"))),
        Just(("allOf", json!([{ "$ref": "#" }]))),
        Just(("$ref", json!("#/nowhere"))),
        Just(("$ref", json!(7))),
        Just(("minimum", json!("low"))),
        Just(("exclusiveMaximum", json!([]))),
        Just(("minLength", json!(-3))),
        Just(("maxLength", json!(2))),
        Just(("format", json!(false))),
        Just(("minItems", json!(3))),
        Just(("maxItems", json!(-1))),
        Just(("additionalItems", json!("x"))),
        Just(("$anchor", json!(5))),
    ]
}

/// Strategy: a malformed schema with 1-3 wrong keywords.
fn arb_malformed_schema() -> impl Strategy<Value = Value> {
    proptest::collection::vec(arb_malformed_keyword(), 1..=3).prop_map(|keywords| {
        let mut schema = serde_json::Map::new();
        for (key, value) in keywords {
            schema.insert(key.to_string(), value);
        }
        Value::Object(schema)
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, ..Default::default() })]

    /// Property: generation never panics on malformed schemas.
    #[test]
    fn generate_never_panics_on_malformed(schema in arb_malformed_schema()) {
        let _ = generate(schema);
    }

    /// Property: nested under a valid property, a malformed schema still never panics.
    #[test]
    fn generate_never_panics_nested(schema in arb_malformed_schema()) {
        let _ = generate(json!({ "type": "object", "properties": { "field": schema } }));
    }

    /// Property: every error has a message and a structured JSON form.
    #[test]
    fn generate_errors_have_messages(schema in arb_malformed_schema()) {
        if let Err(err) = generate(schema) {
            prop_assert!(!err.to_string().is_empty());
            let structured = err.to_json();
            prop_assert!(structured["code"].is_string());
        }
    }
}
