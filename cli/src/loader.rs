//! Reads a schema file and every local file its `$ref`s reach.

use std::collections::{HashSet, VecDeque};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use json_sample_gen_core::Schema;
use serde_json::Value;
use url::Url;

/// Load `path` as the base document, optionally rooted at a JSON Pointer.
///
/// Documents referenced through relative or `file://` refs are loaded
/// breadth-first and registered on the schema. Remote refs are left alone;
/// they fail at resolution time if the generator reaches them.
pub fn load_schema(path: &Path, pointer: Option<&str>) -> Result<Schema> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let base_url = Url::from_file_path(&canonical)
        .map_err(|()| anyhow!("Cannot express {} as a file URL", canonical.display()))?;

    let data = read_json(&canonical)?;
    let mut base_uri = base_url.to_string();
    if let Some(pointer) = pointer.filter(|p| !p.is_empty()) {
        base_uri.push('#');
        base_uri.push_str(pointer);
    }

    let mut pending: VecDeque<Url> = referenced_files(&data, &base_url).into();
    let mut schema = Schema::with_base_uri(data, &base_uri)
        .map_err(|e| anyhow::Error::from(e).context("Invalid schema location"))?;

    let mut seen: HashSet<Url> = HashSet::from([base_url]);
    while let Some(url) = pending.pop_front() {
        if !seen.insert(url.clone()) {
            continue;
        }
        let Ok(file) = url.to_file_path() else {
            continue;
        };
        let document = read_json(&file)?;
        tracing::debug!(document = %url, "loaded referenced document");
        pending.extend(referenced_files(&document, &url));
        schema = schema
            .with_document(url.as_str(), document)
            .map_err(|e| anyhow::Error::from(e).context("Invalid referenced document"))?;
    }
    Ok(schema)
}

fn read_json(path: &Path) -> Result<Value> {
    let file =
        File::open(path).with_context(|| format!("Failed to open input file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse schema from: {}", path.display()))
}

/// Local files named by the document part of each `$ref` in `document`.
fn referenced_files(document: &Value, base: &Url) -> Vec<Url> {
    let mut out = Vec::new();
    collect_refs(document, base, &mut out);
    out
}

fn collect_refs(node: &Value, base: &Url, out: &mut Vec<Url>) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                let target = reference.split('#').next().unwrap_or_default();
                if !target.is_empty() {
                    match base.join(target) {
                        Ok(mut url) if url.scheme() == "file" => {
                            url.set_fragment(None);
                            out.push(url);
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(reference = %reference, error = %e, "unparseable $ref"),
                    }
                }
            }
            for value in map.values() {
                collect_refs(value, base, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, base, out);
            }
        }
        _ => {}
    }
}

// ===========================================================================
// Tests
// ===========================================================================
