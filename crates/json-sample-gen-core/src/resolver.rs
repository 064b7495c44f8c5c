//! Schema reference resolution.
//!
//! [`SchemaResolver`] turns a [`Schema`] into a tree of [`ResolvedNode`]s:
//! - every reachable `$ref` is dereferenced (same-document pointers,
//!   `$anchor` names, and refs into registered extra documents)
//! - `allOf` branches are expanded and merged into one node
//! - every node carries its `schema_path`: the ref target when it was reached
//!   through a `$ref`, otherwise the schema path of its parent
//!
//! Self-referential schemas are handled with an explicit stack of ref targets
//! currently being expanded. A ref whose target is already on the stack
//! becomes a [`NodeKind::Deferred`] node; the generator expands it on demand
//! through [`SchemaResolver::resolve_target`] under its own recursion budget.
//!
//! Source documents are only read. Resolved trees are owned values.

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::composition::merge_all;
use crate::error::GenerateError;
use crate::path::PathExpression;
use crate::pointer::{build_anchor_map, build_path, is_pointer_fragment, lookup, split_ref};
use crate::schema::Schema;

// ---------------------------------------------------------------------------
// Resolved tree
// ---------------------------------------------------------------------------

/// Scalar leaf types handed to the value provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl ScalarKind {
    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ScalarKind::String),
            "integer" => Some(ScalarKind::Integer),
            "number" => Some(ScalarKind::Number),
            "boolean" => Some(ScalarKind::Boolean),
            "null" => Some(ScalarKind::Null),
            _ => None,
        }
    }
}

/// How the generator treats a node, in classification precedence order.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Const(Value),
    Enum(Vec<Value>),
    /// `oneOf` (or `anyOf`) candidates in declaration order.
    OneOf(Vec<ResolvedNode>),
    Object {
        properties: Vec<(String, ResolvedNode)>,
        required: Vec<String>,
        /// Source of each merged `allOf` branch: its ref target, or the
        /// schema path of the enclosing node for inline branches.
        composed_from: Vec<String>,
    },
    Array {
        /// Positional schemas (`prefixItems`, or array-form `items`).
        prefix: Vec<ResolvedNode>,
        items: Option<Box<ResolvedNode>>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Scalar(ScalarKind),
    /// A ref back into a target that is already being expanded.
    Deferred { target: String },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Const(_) => "const",
            NodeKind::Enum(_) => "enum",
            NodeKind::OneOf(_) => "oneOf",
            NodeKind::Object { .. } => "object",
            NodeKind::Array { .. } => "array",
            NodeKind::Scalar(ScalarKind::String) => "string",
            NodeKind::Scalar(ScalarKind::Integer) => "integer",
            NodeKind::Scalar(ScalarKind::Number) => "number",
            NodeKind::Scalar(ScalarKind::Boolean) => "boolean",
            NodeKind::Scalar(ScalarKind::Null) => "null",
            NodeKind::Deferred { .. } => "recursive",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode {
    /// `<document>#<pointer>` of the schema that defines this node.
    pub schema_path: String,
    /// Effective schema fragment (refs followed, `allOf` merged).
    pub schema: Value,
    pub kind: NodeKind,
}

/// One row of [`ResolvedNode::describe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathInfo {
    pub prop_path: String,
    pub schema_path: String,
    pub kind: &'static str,
}

impl ResolvedNode {
    /// List every reachable output location with the schema path that
    /// defines it, without generating anything. Arrays are described
    /// through their first element after any positional ones.
    pub fn describe(&self) -> Vec<PathInfo> {
        let mut out = Vec::new();
        describe_into(self, &PathExpression::root(), &mut out);
        out
    }
}

fn describe_into(node: &ResolvedNode, path: &PathExpression, out: &mut Vec<PathInfo>) {
    out.push(PathInfo {
        prop_path: path.to_string(),
        schema_path: node.schema_path.clone(),
        kind: node.kind.label(),
    });
    match &node.kind {
        NodeKind::Object { properties, .. } => {
            for (key, child) in properties {
                describe_into(child, &path.child(key), out);
            }
        }
        NodeKind::Array { prefix, items, .. } => {
            for (i, child) in prefix.iter().enumerate() {
                describe_into(child, &path.index(i), out);
            }
            if let Some(items) = items {
                describe_into(items, &path.index(prefix.len()), out);
            }
        }
        NodeKind::OneOf(candidates) => {
            for candidate in candidates {
                describe_into(candidate, path, out);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Default hard limit on resolution nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// The document a node lives in and how that document is named in schema paths.
#[derive(Debug, Clone)]
struct Scope<'s> {
    url: Url,
    name: String,
    document: &'s Value,
}

/// Per-descent bookkeeping.
struct Walk {
    expanding: Vec<String>,
}

/// Resolves one [`Schema`]. Cheap to build; holds no caches of its own.
pub struct SchemaResolver<'s> {
    schema: &'s Schema,
    max_depth: usize,
}

impl<'s> SchemaResolver<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve the effective root: the base URI fragment, or the whole document.
    pub fn resolve(&self) -> Result<ResolvedNode, GenerateError> {
        let scope = self.base_scope();
        let fragment = self.schema.root_fragment();
        let key = format!("{}#{}", scope.name, fragment);
        let node = lookup(scope.document, fragment).ok_or_else(|| {
            GenerateError::UnresolvableRef {
                path: scope.name.clone(),
                reference: format!("#{fragment}"),
            }
        })?;

        tracing::debug!(root = %key, "resolving schema");
        let mut walk = Walk {
            expanding: vec![key.clone()],
        };
        self.resolve_node(node, &scope, &key, &key, &mut walk, 0)
    }

    /// Resolve a deferred target (`<document>#<pointer>`) as a fresh root.
    ///
    /// The target itself counts as expanding, so any ref back into it comes
    /// out deferred again.
    pub fn resolve_target(&self, target: &str) -> Result<ResolvedNode, GenerateError> {
        let unresolvable = || GenerateError::UnresolvableRef {
            path: target.to_string(),
            reference: target.to_string(),
        };
        let (doc, fragment) = split_ref(target);
        let scope = if doc == self.schema.base_uri() {
            self.base_scope()
        } else {
            let url = Url::parse(doc).map_err(|_| unresolvable())?;
            self.scope_for(&url).ok_or_else(unresolvable)?
        };
        let node = lookup(scope.document, fragment.unwrap_or_default()).ok_or_else(unresolvable)?;

        let mut walk = Walk {
            expanding: vec![target.to_string()],
        };
        self.resolve_node(node, &scope, target, target, &mut walk, 0)
    }

    fn base_scope(&self) -> Scope<'s> {
        Scope {
            url: self.schema.base_url().clone(),
            name: self.schema.base_uri().to_string(),
            document: self.schema.data(),
        }
    }

    fn scope_for(&self, url: &Url) -> Option<Scope<'s>> {
        self.schema.document(url).map(|(name, document)| Scope {
            url: url.clone(),
            name,
            document,
        })
    }

    fn check_depth(&self, depth: usize, location: &str) -> Result<(), GenerateError> {
        if depth > self.max_depth {
            return Err(GenerateError::RecursionDepthExceeded {
                path: location.to_string(),
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    /// Follow a `$ref` to its target. Returns the canonical target key
    /// (`<document>#<pointer>`), the target's scope, and the target node.
    fn follow_ref(
        &self,
        reference: &str,
        scope: &Scope<'s>,
        location: &str,
    ) -> Result<(String, Scope<'s>, &'s Value), GenerateError> {
        let unresolvable = || GenerateError::UnresolvableRef {
            path: location.to_string(),
            reference: reference.to_string(),
        };

        let (doc_part, fragment) = split_ref(reference);
        let target_scope = if doc_part.is_empty() {
            scope.clone()
        } else {
            let url = scope.url.join(doc_part).map_err(|_| unresolvable())?;
            self.scope_for(&url).ok_or_else(unresolvable)?
        };

        let fragment = fragment.unwrap_or_default();
        let pointer = if is_pointer_fragment(fragment) {
            fragment.to_string()
        } else {
            build_anchor_map(target_scope.document)
                .remove(fragment)
                .ok_or_else(unresolvable)?
        };

        let node = lookup(target_scope.document, &pointer).ok_or_else(unresolvable)?;
        let key = format!("{}#{}", target_scope.name, pointer);
        Ok((key, target_scope, node))
    }

    fn resolve_node(
        &self,
        node: &Value,
        scope: &Scope<'s>,
        schema_path: &str,
        location: &str,
        walk: &mut Walk,
        depth: usize,
    ) -> Result<ResolvedNode, GenerateError> {
        self.check_depth(depth, location)?;

        let Value::Object(obj) = node else {
            return Err(GenerateError::unsupported(
                location,
                format!("expected a schema object, found {node}"),
            ));
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            let (key, target_scope, target) = self.follow_ref(reference, scope, location)?;
            if walk.expanding.contains(&key) {
                tracing::debug!(target = %key, at = location, "deferring recursive $ref");
                return Ok(ResolvedNode {
                    schema_path: key.clone(),
                    schema: node.clone(),
                    kind: NodeKind::Deferred { target: key },
                });
            }
            walk.expanding.push(key.clone());
            let resolved = self.resolve_node(target, &target_scope, &key, &key, walk, depth + 1);
            walk.expanding.pop();
            return resolved;
        }

        let (effective, composed_from) = if obj.contains_key("allOf") {
            self.flatten_all_of(obj, scope, schema_path, location, walk, depth)?
        } else {
            (obj.clone(), Vec::new())
        };

        let kind = self.classify(
            &effective,
            composed_from,
            scope,
            schema_path,
            location,
            walk,
            depth,
        )?;
        Ok(ResolvedNode {
            schema_path: schema_path.to_string(),
            schema: Value::Object(effective),
            kind,
        })
    }

    /// Expand every `allOf` branch and merge them, with the node's own
    /// keywords as the implicit first branch.
    fn flatten_all_of(
        &self,
        obj: &Map<String, Value>,
        scope: &Scope<'s>,
        schema_path: &str,
        location: &str,
        walk: &mut Walk,
        depth: usize,
    ) -> Result<(Map<String, Value>, Vec<String>), GenerateError> {
        let branches = obj
            .get("allOf")
            .and_then(Value::as_array)
            .ok_or_else(|| GenerateError::unsupported(location, "allOf must be an array"))?;

        let mut own = obj.clone();
        own.remove("allOf");
        let mut parts = vec![own];
        let mut sources = Vec::with_capacity(branches.len());

        for (i, branch) in branches.iter().enumerate() {
            let branch_location = build_path(location, &["allOf", &i.to_string()]);
            match self.expand_branch(branch, scope, schema_path, &branch_location, walk, depth + 1)? {
                Some((map, source)) => {
                    parts.push(map);
                    sources.push(source);
                }
                None => {
                    tracing::warn!(at = %branch_location, "skipping recursive allOf branch");
                }
            }
        }

        tracing::debug!(at = location, branches = sources.len(), "merged allOf");
        Ok((merge_all(parts, location), sources))
    }

    /// Flatten one `allOf` branch into a schema map, following its refs and
    /// its own `allOf`. `None` when the branch refers back into a target
    /// being expanded.
    fn expand_branch(
        &self,
        branch: &Value,
        scope: &Scope<'s>,
        schema_path: &str,
        location: &str,
        walk: &mut Walk,
        depth: usize,
    ) -> Result<Option<(Map<String, Value>, String)>, GenerateError> {
        self.check_depth(depth, location)?;

        let Value::Object(obj) = branch else {
            return Err(GenerateError::unsupported(
                location,
                format!("allOf branch must be a schema object, found {branch}"),
            ));
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            let (key, target_scope, target) = self.follow_ref(reference, scope, location)?;
            if walk.expanding.contains(&key) {
                return Ok(None);
            }
            walk.expanding.push(key.clone());
            let expanded = self.expand_branch(target, &target_scope, &key, &key, walk, depth + 1);
            walk.expanding.pop();

            return Ok(expanded?.map(|(mut map, source)| {
                if target_scope.name != scope.name {
                    rebase_refs(&mut map, &target_scope.url);
                }
                (map, source)
            }));
        }

        if obj.contains_key("allOf") {
            let (map, _) = self.flatten_all_of(obj, scope, schema_path, location, walk, depth)?;
            return Ok(Some((map, schema_path.to_string())));
        }

        Ok(Some((obj.clone(), schema_path.to_string())))
    }

    #[allow(clippy::too_many_arguments)]
    fn classify(
        &self,
        effective: &Map<String, Value>,
        composed_from: Vec<String>,
        scope: &Scope<'s>,
        schema_path: &str,
        location: &str,
        walk: &mut Walk,
        depth: usize,
    ) -> Result<NodeKind, GenerateError> {
        if let Some(value) = effective.get("const") {
            return Ok(NodeKind::Const(value.clone()));
        }

        if let Some(values) = effective.get("enum") {
            return match values {
                Value::Array(values) if !values.is_empty() => Ok(NodeKind::Enum(values.clone())),
                other => Err(GenerateError::unsupported(
                    location,
                    format!("enum must be a non-empty array, found {other}"),
                )),
            };
        }

        for keyword in ["oneOf", "anyOf"] {
            let Some(branches) = effective.get(keyword) else {
                continue;
            };
            let Some(branches) = branches.as_array().filter(|b| !b.is_empty()) else {
                return Err(GenerateError::unsupported(
                    location,
                    format!("{keyword} must be a non-empty array"),
                ));
            };
            let mut candidates = Vec::with_capacity(branches.len());
            for (i, branch) in branches.iter().enumerate() {
                let branch_location = build_path(location, &[keyword, &i.to_string()]);
                candidates.push(self.resolve_node(
                    branch,
                    scope,
                    schema_path,
                    &branch_location,
                    walk,
                    depth + 1,
                )?);
            }
            return Ok(NodeKind::OneOf(candidates));
        }

        match effective_type(effective) {
            Some("object") => {
                let mut properties = Vec::new();
                if let Some(props) = effective.get("properties").and_then(Value::as_object) {
                    for (key, child) in props {
                        let child_location = build_path(location, &["properties", key]);
                        let resolved = self.resolve_node(
                            child,
                            scope,
                            schema_path,
                            &child_location,
                            walk,
                            depth + 1,
                        )?;
                        properties.push((key.clone(), resolved));
                    }
                }
                let required = effective
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|r| r.iter().filter_map(Value::as_str).map(String::from).collect())
                    .unwrap_or_default();
                Ok(NodeKind::Object {
                    properties,
                    required,
                    composed_from,
                })
            }
            Some("array") => self.classify_array(effective, scope, schema_path, location, walk, depth),
            Some(name) => ScalarKind::from_type_name(name)
                .map(NodeKind::Scalar)
                .ok_or_else(|| GenerateError::unsupported(location, format!("unknown type '{name}'"))),
            None => Err(GenerateError::unsupported(
                location,
                "schema has no type, const, enum, allOf or oneOf",
            )),
        }
    }

    fn classify_array(
        &self,
        effective: &Map<String, Value>,
        scope: &Scope<'s>,
        schema_path: &str,
        location: &str,
        walk: &mut Walk,
        depth: usize,
    ) -> Result<NodeKind, GenerateError> {
        // Draft 4-7 tuples use array-form `items` with `additionalItems`;
        // 2020-12 uses `prefixItems` with `items`.
        let (tuple_keyword, rest_keyword) = match effective.get("items") {
            Some(Value::Array(_)) => ("items", "additionalItems"),
            _ => ("prefixItems", "items"),
        };

        let mut prefix = Vec::new();
        if let Some(tuple) = effective.get(tuple_keyword).and_then(Value::as_array) {
            for (i, item) in tuple.iter().enumerate() {
                let item_location = build_path(location, &[tuple_keyword, &i.to_string()]);
                prefix.push(self.resolve_node(
                    item,
                    scope,
                    schema_path,
                    &item_location,
                    walk,
                    depth + 1,
                )?);
            }
        }

        let items = match effective.get(rest_keyword) {
            Some(item @ Value::Object(_)) => {
                let item_location = build_path(location, &[rest_keyword]);
                Some(Box::new(self.resolve_node(
                    item,
                    scope,
                    schema_path,
                    &item_location,
                    walk,
                    depth + 1,
                )?))
            }
            _ => None,
        };

        let bound = |key: &str| {
            effective
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };

        Ok(NodeKind::Array {
            prefix,
            items,
            min_items: bound("minItems"),
            max_items: bound("maxItems"),
        })
    }
}

/// `type` as a single name. A type list picks its first non-null entry;
/// a missing type is inferred from `properties` or `items`.
fn effective_type(schema: &Map<String, Value>) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(name)) => Some(name.as_str()),
        Some(Value::Array(names)) => {
            let mut names = names.iter().filter_map(Value::as_str);
            let first = names.clone().next();
            names.find(|n| *n != "null").or(first)
        }
        _ if schema.contains_key("properties") => Some("object"),
        _ if schema.contains_key("items") || schema.contains_key("prefixItems") => Some("array"),
        _ => None,
    }
}

/// Rewrite every `$ref` under `map` to an absolute URI against `base`, so a
/// branch lifted out of another document keeps pointing into it.
fn rebase_refs(map: &mut Map<String, Value>, base: &Url) {
    for (key, value) in map.iter_mut() {
        match value {
            Value::String(reference) if key == "$ref" => {
                if let Ok(absolute) = base.join(reference) {
                    *reference = absolute.to_string();
                }
            }
            Value::Object(child) => rebase_refs(child, base),
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if let Value::Object(child) = item {
                        rebase_refs(child, base);
                    }
                }
            }
            _ => {}
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
