//! Source schema documents.
//!
//! A [`Schema`] owns the raw document the caller supplied, the base URI used
//! to resolve relative `$ref`s, and any additional documents that
//! cross-document refs may point into. It is never mutated after
//! construction, so one instance can back any number of concurrent
//! generation runs.

use std::collections::HashMap;

use serde_json::Value;
use url::Url;

use crate::error::GenerateError;
use crate::pointer::split_ref;

/// Base URI used when the caller does not supply one.
pub const DEFAULT_BASE_URI: &str = "file:///schema.json";

pub(crate) fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URI).expect("DEFAULT_BASE_URI is a valid URL")
}

/// Parse `uri` as an absolute URL, or as a reference relative to
/// [`DEFAULT_BASE_URI`].
pub(crate) fn parse_uri(uri: &str) -> Result<Url, GenerateError> {
    match Url::parse(uri) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            default_base_url()
                .join(uri)
                .map_err(|source| GenerateError::InvalidBaseUri {
                    uri: uri.to_string(),
                    source,
                })
        }
        Err(source) => Err(GenerateError::InvalidBaseUri {
            uri: uri.to_string(),
            source,
        }),
    }
}

/// Document key: the URL without its fragment.
pub(crate) fn document_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// A JSON Schema document plus everything needed to resolve its refs.
#[derive(Debug, Clone)]
pub struct Schema {
    data: Value,
    base_uri: String,
    base_url: Url,
    root_fragment: String,
    documents: HashMap<String, Value>,
}

impl Schema {
    /// Wrap `data` with the default base URI.
    pub fn new(data: Value) -> Self {
        Self {
            data,
            base_uri: DEFAULT_BASE_URI.to_string(),
            base_url: default_base_url(),
            root_fragment: String::new(),
            documents: HashMap::new(),
        }
    }

    /// Wrap `data` with an explicit base URI.
    ///
    /// A pointer fragment on the URI (`file://x.json#/definitions/Person`)
    /// selects that node as the effective root.
    pub fn with_base_uri(data: Value, base_uri: &str) -> Result<Self, GenerateError> {
        let (document, fragment) = split_ref(base_uri);
        let base_url = parse_uri(document)?;
        Ok(Self {
            data,
            base_uri: document.to_string(),
            base_url,
            root_fragment: fragment.unwrap_or_default().to_string(),
            documents: HashMap::new(),
        })
    }

    /// Register another document that `$ref`s may point into.
    ///
    /// `uri` is resolved against this schema's base URI.
    pub fn with_document(mut self, uri: &str, data: Value) -> Result<Self, GenerateError> {
        let (document, _) = split_ref(uri);
        let url = self
            .base_url
            .join(document)
            .map_err(|source| GenerateError::InvalidBaseUri {
                uri: uri.to_string(),
                source,
            })?;
        self.documents.insert(document_key(&url), data);
        Ok(self)
    }

    /// The raw document as supplied by the caller.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The base URI as supplied by the caller, without its fragment.
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Pointer fragment selecting the effective root (`""` for the whole document).
    pub fn root_fragment(&self) -> &str {
        &self.root_fragment
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Find a document by URL. The base document is reported under the
    /// caller's own spelling of the base URI so schema paths read naturally.
    pub(crate) fn document(&self, url: &Url) -> Option<(String, &Value)> {
        let key = document_key(url);
        if key == document_key(&self.base_url) {
            return Some((self.base_uri.clone(), &self.data));
        }
        self.documents.get(&key).map(|doc| (key, doc))
    }

    /// URIs of the registered extra documents.
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
