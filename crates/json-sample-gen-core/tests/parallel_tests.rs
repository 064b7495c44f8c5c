//! One generator shared across threads, each thread with its own scenario.

use std::thread;

use json_sample_gen_core::{GenerateOptions, OneOfSelector, SampleGenerator, Scenario, Schema};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn schema() -> Schema {
    Schema::with_base_uri(
        json!({
            "definitions": {
                "Item": {
                    "type": "object",
                    "properties": {"sku": {"type": "string"}, "qty": {"type": "integer", "minimum": 1}}
                }
            },
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "label": {"type": "string"},
                "kind": {"oneOf": [{"const": "a"}, {"const": "b"}, {"const": "c"}]},
                "items": {"type": "array", "items": {"$ref": "#/definitions/Item"}}
            }
        }),
        "file://dummy.json",
    )
    .unwrap()
}

fn scenarios() -> Vec<Scenario> {
    (0..10usize)
        .map(|i| {
            Scenario::new(format!("scenario-{i}"))
                .with_override("id", json!(i))
                .with_computed("label", |ctx| Ok(json!(ctx.scenario_name.clone())))
                .with_override(format!("items[{}].sku", i % 3), json!(format!("sku-{i}")))
                .with_oneof_selector("kind", OneOfSelector::index(i % 3))
        })
        .collect()
}

#[test]
fn test_parallel_generation_matches_sequential() {
    let generator = SampleGenerator::new(schema()).with_options(GenerateOptions {
        seed: Some(99),
        ..Default::default()
    });
    let scenarios = scenarios();

    let sequential: Vec<Value> = scenarios
        .iter()
        .map(|s| generator.generate(Some(s)).unwrap())
        .collect();

    let parallel: Vec<Value> = thread::scope(|scope| {
        let handles: Vec<_> = scenarios
            .iter()
            .map(|s| {
                let generator = &generator;
                scope.spawn(move || generator.generate(Some(s)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, parallel);
}

#[test]
fn test_parallel_results_are_isolated() {
    let generator = SampleGenerator::new(schema());
    let scenarios = scenarios();

    let results: Vec<Value> = thread::scope(|scope| {
        let handles: Vec<_> = scenarios
            .iter()
            .map(|s| {
                let generator = &generator;
                scope.spawn(move || generator.generate(Some(s)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, doc) in results.iter().enumerate() {
        assert_eq!(doc["id"], json!(i));
        assert_eq!(doc["label"], json!(format!("scenario-{i}")));
        assert_eq!(doc["kind"], json!(["a", "b", "c"][i % 3]));
        let items = doc["items"].as_array().unwrap();
        assert_eq!(items.len(), i % 3 + 1);
        assert_eq!(items[i % 3]["sku"], json!(format!("sku-{i}")));
    }
}
