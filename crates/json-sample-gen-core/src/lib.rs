//! # json-sample-gen-core
//!
//! Generate sample documents from JSON Schemas, with scenario-driven
//! overrides for individual fields.
//!
//! ```
//! use json_sample_gen_core::{SampleGenerator, Scenario, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::new(json!({
//!     "type": "object",
//!     "properties": {
//!         "name": {"type": "string"},
//!         "age": {"type": "integer", "minimum": 0}
//!     }
//! }));
//! let scenario = Scenario::new("named").with_override("name", json!("Bob"));
//!
//! let doc = SampleGenerator::new(schema).generate(Some(&scenario)).unwrap();
//! assert_eq!(doc["name"], json!("Bob"));
//! assert!(doc["age"].is_i64());
//! ```

pub mod builder;
pub mod composition;
pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod path;
pub mod pointer;
pub mod provider;
pub mod resolver;
pub mod scenario;
pub mod schema;

pub use builder::{get_value_at_path, set_value_at_path, DocumentBuilder};
pub use config::{GenerateOptions, ScenarioConfig};
pub use context::GenerationContext;
pub use error::{BoxError, ErrorCode, GenerateError};
pub use generator::SampleGenerator;
pub use path::{PathExpression, PathStep, MAX_PATH_INDEX};
pub use provider::{DefaultValueProvider, ValueProvider};
pub use resolver::{NodeKind, PathInfo, ResolvedNode, ScalarKind, SchemaResolver};
pub use scenario::{OneOfSelector, Override, Scenario, Selection};
pub use schema::{Schema, DEFAULT_BASE_URI};
