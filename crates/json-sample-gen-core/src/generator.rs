//! Sample generation engine.
//!
//! [`SampleGenerator`] resolves its schema once per call, seeds the result
//! with the scenario's default data, then walks the resolved tree writing
//! one value per location through a [`DocumentBuilder`].
//!
//! Per location the value comes from, in order of precedence:
//! 1. a scenario override for that exact path (literal or computed)
//! 2. data already seeded there by `default_data`
//! 3. the schema: const, enum choice, oneOf branch, or the value provider
//!
//! Every call owns its builder, RNG and deferred-ref cache; the generator
//! itself is never mutated, so `&SampleGenerator` can be shared across threads.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use serde_json::{Map, Value};

use crate::builder::DocumentBuilder;
use crate::config::GenerateOptions;
use crate::context::GenerationContext;
use crate::error::GenerateError;
use crate::path::PathExpression;
use crate::provider::{DefaultValueProvider, ValueProvider};
use crate::resolver::{NodeKind, ResolvedNode, SchemaResolver};
use crate::scenario::{ParsedKeys, Scenario, Selection};
use crate::schema::Schema;

/// Generates sample documents for one schema.
pub struct SampleGenerator {
    schema: Schema,
    scenario: Scenario,
    options: GenerateOptions,
    provider: Arc<dyn ValueProvider>,
}

impl SampleGenerator {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            scenario: Scenario::default(),
            options: GenerateOptions::default(),
            provider: Arc::new(DefaultValueProvider),
        }
    }

    /// Scenario used when `generate` is called without one.
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_provider(mut self, provider: impl ValueProvider + 'static) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Resolve the schema without generating anything.
    pub fn resolve(&self) -> Result<ResolvedNode, GenerateError> {
        SchemaResolver::new(&self.schema)
            .with_max_depth(self.options.max_depth)
            .resolve()
    }

    /// Generate one document, with `scenario` or the configured default.
    pub fn generate(&self, scenario: Option<&Scenario>) -> Result<Value, GenerateError> {
        let mut rng = self.new_rng();
        let root = self.resolve()?;
        self.generate_from(&root, scenario.unwrap_or(&self.scenario), &mut rng)
    }

    /// Generate `count` documents from one resolution and one RNG stream.
    pub fn generate_many(
        &self,
        count: usize,
        scenario: Option<&Scenario>,
    ) -> Result<Vec<Value>, GenerateError> {
        let mut rng = self.new_rng();
        let root = self.resolve()?;
        let scenario = scenario.unwrap_or(&self.scenario);
        (0..count)
            .map(|_| self.generate_from(&root, scenario, &mut rng))
            .collect()
    }

    fn new_rng(&self) -> StdRng {
        match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn generate_from(
        &self,
        root: &ResolvedNode,
        scenario: &Scenario,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerateError> {
        tracing::debug!(scenario = scenario.name(), schema = self.schema.base_uri(), "generating sample");
        let mut run = Run {
            resolver: SchemaResolver::new(&self.schema).with_max_depth(self.options.max_depth),
            scenario,
            keys: scenario.parsed_keys()?,
            options: &self.options,
            provider: self.provider.as_ref(),
            rng,
            builder: DocumentBuilder::from_value(scenario.default_data().clone()),
            deferred: HashMap::new(),
            active: HashMap::new(),
        };
        run.visit(root, &PathExpression::root(), 0)?;
        Ok(run.builder.into_result())
    }
}

/// State of one generation call.
struct Run<'g, 'r> {
    resolver: SchemaResolver<'g>,
    scenario: &'g Scenario,
    keys: Arc<ParsedKeys>,
    options: &'g GenerateOptions,
    provider: &'g dyn ValueProvider,
    rng: &'r mut dyn RngCore,
    builder: DocumentBuilder,
    /// Deferred targets resolved so far in this call.
    deferred: HashMap<String, Rc<ResolvedNode>>,
    /// Expansions of each deferred target on the active descent path.
    active: HashMap<String, usize>,
}

/// What is already written at a location before the schema fills it.
enum Existing {
    /// Nothing, or an empty-object placeholder from array padding.
    Vacant,
    Object,
    Array(usize),
    /// Any other seeded value; it wins over generation.
    Seeded,
}

impl Run<'_, '_> {
    fn visit(
        &mut self,
        node: &ResolvedNode,
        path: &PathExpression,
        depth: usize,
    ) -> Result<(), GenerateError> {
        if depth > self.options.max_depth {
            return Err(GenerateError::RecursionDepthExceeded {
                path: path.to_string(),
                max_depth: self.options.max_depth,
            });
        }
        tracing::trace!(path = %path, schema = %node.schema_path, kind = node.kind.label(), "visit");

        if let Some(over) = self.keys.overrides.get(path) {
            let value = over.evaluate(&self.context(path, node))?;
            self.builder.set(path, value);
            return Ok(());
        }

        match &node.kind {
            NodeKind::Const(value) => {
                if matches!(self.existing(path), Existing::Vacant) {
                    self.builder.set(path, value.clone());
                }
            }
            NodeKind::Enum(values) => {
                if matches!(self.existing(path), Existing::Vacant) {
                    let value = values.choose(&mut *self.rng).cloned().unwrap_or(Value::Null);
                    self.builder.set(path, value);
                }
            }
            NodeKind::Scalar(kind) => {
                if matches!(self.existing(path), Existing::Vacant) {
                    let empty = Map::new();
                    let schema = node.schema.as_object().unwrap_or(&empty);
                    let value = self.provider.provide(schema, *kind, &mut *self.rng)?;
                    self.builder.set(path, value);
                }
            }
            NodeKind::OneOf(candidates) => {
                let chosen = self.choose_branch(node, candidates, path)?;
                self.visit(&candidates[chosen], path, depth + 1)?;
            }
            NodeKind::Object { properties, .. } => {
                match self.existing(path) {
                    Existing::Object => {}
                    Existing::Vacant => {
                        self.builder.set(path, Value::Object(Map::new()));
                    }
                    Existing::Array(_) | Existing::Seeded => return Ok(()),
                }
                for (key, child) in properties {
                    self.visit(child, &path.child(key), depth + 1)?;
                }
            }
            NodeKind::Array {
                prefix,
                items,
                min_items,
                max_items,
            } => {
                let seeded_len = match self.existing(path) {
                    Existing::Array(len) => len,
                    Existing::Vacant => {
                        self.builder.set(path, Value::Array(Vec::new()));
                        0
                    }
                    Existing::Object | Existing::Seeded => return Ok(()),
                };
                let count = self.array_len(path, prefix.len(), items.is_some(), *min_items, *max_items, seeded_len);
                for i in 0..count {
                    let element = path.index(i);
                    match prefix.get(i).or(items.as_deref()) {
                        Some(child) => self.visit(child, &element, depth + 1)?,
                        None => self.apply_override(node, &element)?,
                    }
                }
            }
            NodeKind::Deferred { target } => {
                let expansions = self.active.get(target).copied().unwrap_or(0);
                if expansions >= self.options.recursion_depth {
                    tracing::debug!(path = %path, target = %target, "recursion cutoff");
                    if matches!(self.existing(path), Existing::Vacant) {
                        self.builder.set(path, Value::Null);
                    }
                    return Ok(());
                }
                let expanded = self.expand(target)?;
                *self.active.entry(target.clone()).or_default() += 1;
                let result = self.visit(&expanded, path, depth + 1);
                if let Some(count) = self.active.get_mut(target) {
                    *count -= 1;
                }
                result?;
            }
        }
        Ok(())
    }

    fn context(&self, path: &PathExpression, node: &ResolvedNode) -> GenerationContext {
        GenerationContext::new(
            path.to_string(),
            Some(node.schema_path.clone()),
            self.scenario.name(),
        )
    }

    fn existing(&self, path: &PathExpression) -> Existing {
        match self.builder.get(path) {
            None => Existing::Vacant,
            Some(Value::Object(map)) if map.is_empty() => Existing::Vacant,
            Some(Value::Object(_)) => Existing::Object,
            Some(Value::Array(items)) => Existing::Array(items.len()),
            Some(_) => Existing::Seeded,
        }
    }

    /// Element count: `minItems` (or the configured default) clamped by
    /// `maxItems`, then widened to cover seeded elements and every index an
    /// override addresses.
    fn array_len(
        &self,
        path: &PathExpression,
        prefix_len: usize,
        has_items: bool,
        min_items: Option<usize>,
        max_items: Option<usize>,
        seeded_len: usize,
    ) -> usize {
        let mut count = min_items.unwrap_or(self.options.default_array_len);
        if let Some(max) = max_items {
            count = count.min(max);
        }
        if !has_items {
            count = count.min(prefix_len);
        }
        count = count.max(seeded_len);
        if let Some(highest) = self.keys.array_demands.get(path) {
            count = count.max(highest.saturating_add(1));
        }
        count
    }

    /// Write the override for a location the schema does not describe.
    fn apply_override(
        &mut self,
        node: &ResolvedNode,
        path: &PathExpression,
    ) -> Result<(), GenerateError> {
        if let Some(over) = self.keys.overrides.get(path) {
            let value = over.evaluate(&self.context(path, node))?;
            self.builder.set(path, value);
        }
        Ok(())
    }

    fn choose_branch(
        &mut self,
        node: &ResolvedNode,
        candidates: &[ResolvedNode],
        path: &PathExpression,
    ) -> Result<usize, GenerateError> {
        let Some(selector) = self.keys.selectors.get(path) else {
            return Ok(0);
        };
        let schemas: Vec<Value> = candidates.iter().map(|c| c.schema.clone()).collect();
        let invalid = |message: String| GenerateError::InvalidSelection {
            path: path.to_string(),
            message,
        };

        let chosen = match selector.select(&self.context(path, node), &schemas)? {
            Selection::Index(i) if i < candidates.len() => i,
            Selection::Index(i) => {
                return Err(invalid(format!(
                    "index {i} out of range for {} candidates",
                    candidates.len()
                )))
            }
            Selection::Schema(schema) => schemas
                .iter()
                .position(|candidate| *candidate == schema)
                .ok_or_else(|| invalid("returned schema is not one of the candidates".to_string()))?,
        };
        tracing::debug!(path = %path, branch = chosen, "oneOf branch selected");
        Ok(chosen)
    }

    fn expand(&mut self, target: &str) -> Result<Rc<ResolvedNode>, GenerateError> {
        if let Some(node) = self.deferred.get(target) {
            return Ok(Rc::clone(node));
        }
        let node = Rc::new(self.resolver.resolve_target(target)?);
        self.deferred.insert(target.to_string(), Rc::clone(&node));
        Ok(node)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::scenario::OneOfSelector;
    use serde_json::json;

    fn generator(schema: Value) -> SampleGenerator {
        SampleGenerator::new(Schema::with_base_uri(schema, "file://dummy.json").unwrap())
            .with_options(GenerateOptions {
                seed: Some(7),
                ..Default::default()
            })
    }

    #[test]
    fn test_const_and_enum() {
        let doc = generator(json!({
            "type": "object",
            "properties": {
                "kind": {"const": "fixed"},
                "color": {"enum": ["red", "green"]}
            }
        }))
        .generate(None)
        .unwrap();
        assert_eq!(doc["kind"], json!("fixed"));
        assert!(doc["color"] == json!("red") || doc["color"] == json!("green"));
    }

    #[test]
    fn test_override_replaces_subtree() {
        let scenario = Scenario::new("s").with_override("tags", json!(["a", "b"]));
        let doc = generator(json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"type": "string"}}}
        }))
        .generate(Some(&scenario))
        .unwrap();
        assert_eq!(doc, json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn test_array_length_rules() {
        let doc = generator(json!({
            "type": "object",
            "properties": {
                "plain": {"type": "array", "items": {"type": "integer"}},
                "min": {"type": "array", "items": {"type": "integer"}, "minItems": 3},
                "capped": {"type": "array", "items": {"type": "integer"}, "maxItems": 0},
                "untyped": {"type": "array"}
            }
        }))
        .generate(None)
        .unwrap();
        assert_eq!(doc["plain"].as_array().unwrap().len(), 1);
        assert_eq!(doc["min"].as_array().unwrap().len(), 3);
        assert_eq!(doc["capped"], json!([]));
        assert_eq!(doc["untyped"], json!([]));
    }

    #[test]
    fn test_array_extended_by_override_index() {
        let scenario = Scenario::new("s").with_override("people[2].name", json!("Cy"));
        let doc = generator(json!({
            "type": "object",
            "properties": {
                "people": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"name": {"type": "string"}}}
                }
            }
        }))
        .generate(Some(&scenario))
        .unwrap();
        let people = doc["people"].as_array().unwrap();
        assert_eq!(people.len(), 3);
        assert_eq!(people[2]["name"], json!("Cy"));
        assert!(people[0]["name"].is_string());
    }

    #[test]
    fn test_scalar_root() {
        let doc = generator(json!({"type": "integer", "minimum": 5, "maximum": 5}))
            .generate(None)
            .unwrap();
        assert_eq!(doc, json!(5));
    }

    #[test]
    fn test_selector_out_of_range() {
        let scenario =
            Scenario::new("s").with_oneof_selector("pet", OneOfSelector::index(9));
        let err = generator(json!({
            "type": "object",
            "properties": {"pet": {"oneOf": [{"const": "dog"}, {"const": "cat"}]}}
        }))
        .generate(Some(&scenario))
        .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidSelection);
        assert_eq!(err.path(), Some("pet"));
    }

    #[test]
    fn test_selector_returning_schema() {
        let scenario = Scenario::new("s").with_oneof_selector(
            "pet",
            OneOfSelector::new(|_, candidates| Ok(Selection::Schema(candidates[2].clone()))),
        );
        let doc = generator(json!({
            "type": "object",
            "properties": {"pet": {"oneOf": [{"const": "dog"}, {"const": "cat"}, {"const": "bird"}]}}
        }))
        .generate(Some(&scenario))
        .unwrap();
        assert_eq!(doc["pet"], json!("bird"));
    }

    #[test]
    fn test_recursion_depth_option() {
        let schema = json!({
            "type": "object",
            "properties": {
                "value": {"const": 1},
                "next": {"$ref": "#"}
            }
        });
        let shallow = generator(schema.clone()).generate(None).unwrap();
        assert_eq!(
            shallow,
            json!({"value": 1, "next": {"value": 1, "next": null}})
        );

        let deep = generator(schema)
            .with_options(GenerateOptions {
                recursion_depth: 2,
                ..Default::default()
            })
            .generate(None)
            .unwrap();
        assert_eq!(
            deep,
            json!({"value": 1, "next": {"value": 1, "next": {"value": 1, "next": null}}})
        );
    }

    #[test]
    fn test_seed_is_reproducible() {
        let schema = json!({
            "type": "object",
            "properties": {"n": {"type": "integer"}, "s": {"type": "string"}}
        });
        let a = generator(schema.clone()).generate(None).unwrap();
        let b = generator(schema).generate(None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_many() {
        let docs = generator(json!({"type": "object", "properties": {"id": {"const": 1}}}))
            .generate_many(3, None)
            .unwrap();
        assert_eq!(docs, vec![json!({"id": 1}); 3]);
    }
}
