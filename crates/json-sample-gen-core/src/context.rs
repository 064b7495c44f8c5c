//! Per-node metadata handed to scenario callables.

use serde::Serialize;

/// Immutable snapshot of where the generator is when it consults a scenario
/// override or oneOf selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationContext {
    /// Output location in canonical path form (`people[0].name`, `""` at the root).
    pub prop_path: String,
    /// `<document>#<pointer>` of the schema node that defines this location.
    pub schema_path: Option<String>,
    /// Name of the active scenario, for diagnostics.
    pub scenario_name: String,
}

impl GenerationContext {
    pub fn new(
        prop_path: impl Into<String>,
        schema_path: Option<String>,
        scenario_name: impl Into<String>,
    ) -> Self {
        Self {
            prop_path: prop_path.into(),
            schema_path,
            scenario_name: scenario_name.into(),
        }
    }

    /// Last segment of the schema pointer (`Person` for `...#/definitions/Person`).
    pub fn schema_name(&self) -> Option<&str> {
        let path = self.schema_path.as_deref()?;
        let (_, fragment) = path.rsplit_once('#')?;
        fragment.rsplit('/').next().filter(|s| !s.is_empty())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
