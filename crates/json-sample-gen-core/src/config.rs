//! Configuration for sample generation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenerateError;
use crate::scenario::{OneOfSelector, Scenario};

/// Options for sample generation.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `recursion-depth`, `default-array-len`).
/// Missing fields take their defaults, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GenerateOptions {
    /// How many extra times a self-referential ref may be expanded on one
    /// descent path before that branch is written as `null`. Default: 1.
    pub recursion_depth: usize,
    /// Element count for arrays without `minItems` (clamped by `maxItems`). Default: 1.
    pub default_array_len: usize,
    /// Hard nesting limit for resolution and generation (stack overflow guard).
    pub max_depth: usize,
    /// Seed for a reproducible call-local RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            recursion_depth: 1,
            default_array_len: 1,
            max_depth: crate::resolver::DEFAULT_MAX_DEPTH,
            seed: None,
        }
    }
}

/// File-backed scenario: literal overrides, index selectors and default data.
///
/// Computed overrides and custom selectors only exist in code; this is the
/// subset a JSON file can express.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScenarioConfig {
    pub name: String,
    /// Output path → literal value.
    pub overrides: BTreeMap<String, Value>,
    /// Output path → oneOf branch index.
    pub oneof_selectors: BTreeMap<String, usize>,
    /// Nested document seeded into every result.
    pub default_data: Value,
}

impl ScenarioConfig {
    pub fn from_json(text: &str) -> Result<Self, GenerateError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the scenario and normalize it, so malformed paths fail here.
    pub fn into_scenario(self) -> Result<Scenario, GenerateError> {
        let name = if self.name.is_empty() {
            "default".to_string()
        } else {
            self.name
        };
        let mut scenario = Scenario::new(name);
        for (path, value) in self.overrides {
            scenario = scenario.with_override(path, value);
        }
        for (path, index) in self.oneof_selectors {
            scenario = scenario.with_oneof_selector(path, OneOfSelector::index(index));
        }
        if !self.default_data.is_null() {
            scenario = scenario.with_default_data(self.default_data);
        }
        scenario.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_generate_options_serde_round_trip() {
        let opts = GenerateOptions {
            recursion_depth: 2,
            default_array_len: 3,
            max_depth: 64,
            seed: Some(42),
        };

        let json = serde_json::to_string(&opts).unwrap();

        assert!(json.contains("\"recursion-depth\""));
        assert!(json.contains("\"default-array-len\""));
        assert!(json.contains("\"max-depth\""));

        let deserialized: GenerateOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, opts);
    }

    #[test]
    fn test_generate_options_partial_config() {
        let opts: GenerateOptions = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(opts.seed, Some(7));
        assert_eq!(opts.recursion_depth, 1);
        assert_eq!(opts.default_array_len, 1);
    }

    #[test]
    fn test_scenario_config_into_scenario() {
        let config = ScenarioConfig::from_json(
            r#"{
                "name": "pets",
                "overrides": {"owner.name": "Bob", "owner.age": null},
                "oneof-selectors": {"pet": 1},
                "default-data": {"meta": {"source": "file"}}
            }"#,
        )
        .unwrap();
        let scenario = config.into_scenario().unwrap();
        assert_eq!(scenario.name(), "pets");
        assert!(scenario.is_normalized());
        assert_eq!(scenario.overrides().len(), 2);
        assert_eq!(scenario.oneof_selectors().len(), 1);
        assert_eq!(scenario.default_data(), &json!({"meta": {"source": "file"}}));
    }

    #[test]
    fn test_scenario_config_rejects_bad_paths() {
        let config = ScenarioConfig {
            overrides: BTreeMap::from([("a[".to_string(), json!(1))]),
            ..Default::default()
        };
        let err = config.into_scenario().unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::MalformedPath);
    }

    #[test]
    fn test_scenario_config_bad_json() {
        let err = ScenarioConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::JsonParseError);
    }
}
