//! Scenarios: named bundles of overrides, oneOf selectors and default data.
//!
//! A [`Scenario`] is immutable once built and cheap to clone (callables are
//! reference counted), so one instance can drive any number of concurrent
//! generation runs.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::builder::set_value_at_path;
use crate::context::GenerationContext;
use crate::error::{BoxError, GenerateError};
use crate::path::PathExpression;

/// Signature of a computed override.
pub type ComputeFn = dyn Fn(&GenerationContext) -> Result<Value, BoxError> + Send + Sync;

/// Signature of a oneOf selector. Receives the candidate schemas in
/// declaration order.
pub type SelectFn =
    dyn Fn(&GenerationContext, &[Value]) -> Result<Selection, BoxError> + Send + Sync;

/// Value for one overridden location: a literal, or a callable evaluated
/// against the generation context.
///
/// `Literal(Value::Null)` is a real override that writes `null`; absence of
/// an override is represented by the key not being present at all.
#[derive(Clone)]
pub enum Override {
    Literal(Value),
    Computed(Arc<ComputeFn>),
}

impl Override {
    pub fn literal(value: impl Into<Value>) -> Self {
        Override::Literal(value.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&GenerationContext) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Override::Computed(Arc::new(f))
    }

    /// Produce the override value. Callable failures pass through unchanged.
    pub(crate) fn evaluate(&self, ctx: &GenerationContext) -> Result<Value, GenerateError> {
        match self {
            Override::Literal(value) => Ok(value.clone()),
            Override::Computed(f) => f(ctx).map_err(GenerateError::Callback),
        }
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Override::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<Value> for Override {
    fn from(value: Value) -> Self {
        Override::Literal(value)
    }
}

/// What a oneOf selector picked.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Branch position among the candidates.
    Index(usize),
    /// One of the candidate schemas, returned as-is.
    Schema(Value),
}

impl From<usize> for Selection {
    fn from(index: usize) -> Self {
        Selection::Index(index)
    }
}

/// Chooses a oneOf/anyOf branch for one output path.
#[derive(Clone)]
pub struct OneOfSelector(Arc<SelectFn>);

impl OneOfSelector {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&GenerationContext, &[Value]) -> Result<Selection, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Always pick the branch at `index`.
    pub fn index(index: usize) -> Self {
        Self::new(move |_, _| Ok(Selection::Index(index)))
    }

    pub(crate) fn select(
        &self,
        ctx: &GenerationContext,
        candidates: &[Value],
    ) -> Result<Selection, GenerateError> {
        (self.0)(ctx, candidates).map_err(GenerateError::Callback)
    }
}

impl fmt::Debug for OneOfSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneOfSelector(..)")
    }
}

/// Override and selector keys parsed into [`PathExpression`]s.
#[derive(Debug, Default)]
pub(crate) struct ParsedKeys {
    pub(crate) overrides: HashMap<PathExpression, Override>,
    pub(crate) selectors: HashMap<PathExpression, OneOfSelector>,
    /// Highest element index any override addresses under each array path.
    pub(crate) array_demands: HashMap<PathExpression, usize>,
}

impl ParsedKeys {
    fn build(scenario: &Scenario) -> Result<Self, GenerateError> {
        let mut keys = ParsedKeys::default();
        for (raw, value) in &scenario.overrides {
            let path = PathExpression::parse(raw)?;
            for (prefix, index) in path.array_prefixes() {
                let demand = keys.array_demands.entry(prefix).or_insert(index);
                *demand = (*demand).max(index);
            }
            keys.overrides.insert(path, value.clone());
        }
        for (raw, selector) in &scenario.oneof_selectors {
            keys.selectors
                .insert(PathExpression::parse(raw)?, selector.clone());
        }
        Ok(keys)
    }
}

/// A named generation variant.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    overrides: BTreeMap<String, Override>,
    oneof_selectors: BTreeMap<String, OneOfSelector>,
    default_data: Value,
    parsed: Option<Arc<ParsedKeys>>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new("default")
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: BTreeMap::new(),
            oneof_selectors: BTreeMap::new(),
            default_data: Value::Object(Map::new()),
            parsed: None,
        }
    }

    /// Override the value at `path` (a literal, or anything convertible into [`Override`]).
    pub fn with_override(mut self, path: impl Into<String>, value: impl Into<Override>) -> Self {
        self.overrides.insert(path.into(), value.into());
        self.parsed = None;
        self
    }

    /// Compute the value at `path` from the generation context.
    pub fn with_computed<F>(self, path: impl Into<String>, f: F) -> Self
    where
        F: Fn(&GenerationContext) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.with_override(path, Override::computed(f))
    }

    pub fn with_oneof_selector(mut self, path: impl Into<String>, selector: OneOfSelector) -> Self {
        self.oneof_selectors.insert(path.into(), selector);
        self.parsed = None;
        self
    }

    /// Replace the default data seeded into every result before generation.
    pub fn with_default_data(mut self, data: Value) -> Self {
        self.default_data = data;
        self
    }

    /// Seed one value at `path` inside the default data.
    pub fn with_default_at(mut self, path: &str, value: Value) -> Result<Self, GenerateError> {
        set_value_at_path(path, &mut self.default_data, value)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn overrides(&self) -> &BTreeMap<String, Override> {
        &self.overrides
    }

    pub fn oneof_selectors(&self) -> &BTreeMap<String, OneOfSelector> {
        &self.oneof_selectors
    }

    pub fn default_data(&self) -> &Value {
        &self.default_data
    }

    pub fn is_normalized(&self) -> bool {
        self.parsed.is_some()
    }

    /// Return an equivalent scenario with every path key parsed up front.
    ///
    /// Fails on the first malformed key. Generation accepts normalized and
    /// un-normalized scenarios alike; normalizing only moves the parse cost
    /// (and any error) to this call.
    pub fn normalize(&self) -> Result<Scenario, GenerateError> {
        let parsed = ParsedKeys::build(self)?;
        Ok(Scenario {
            parsed: Some(Arc::new(parsed)),
            ..self.clone()
        })
    }

    /// Parsed keys for one generation run.
    pub(crate) fn parsed_keys(&self) -> Result<Arc<ParsedKeys>, GenerateError> {
        match &self.parsed {
            Some(parsed) => Ok(Arc::clone(parsed)),
            None => ParsedKeys::build(self).map(Arc::new),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
