//! Column test specifications and their YAML parsing

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Parameters of a parameterized test, keyed by parameter name
pub type TestParams = BTreeMap<String, serde_json::Value>;

/// Names every test template receives from the runner; parameters cannot use them
pub const RESERVED_TEST_PARAMS: &[&str] = &["relation", "model", "column", "start_field"];

/// A configured column test.
///
/// In a model's YAML file a bare test is written as a string
/// (`- not_null`) and a parameterized test as a single-key map
/// (`- accepted_values: {values: [open, closed]}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TestSpec {
    /// Test without parameters
    Bare(String),
    /// Test with named parameters
    Parameterized(String, TestParams),
}

impl TestSpec {
    /// Create a bare test spec
    pub fn bare(name: impl Into<String>) -> Self {
        TestSpec::Bare(name.into())
    }

    /// Create a parameterized test spec
    pub fn parameterized<K: Into<String>>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = (K, serde_json::Value)>,
    ) -> Self {
        TestSpec::Parameterized(
            name.into(),
            params.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    /// Test name, which selects the `tests/<name>` template
    pub fn name(&self) -> &str {
        match self {
            TestSpec::Bare(name) | TestSpec::Parameterized(name, _) => name,
        }
    }

    /// Test parameters (empty for bare tests)
    pub fn params(&self) -> Option<&TestParams> {
        match self {
            TestSpec::Bare(_) => None,
            TestSpec::Parameterized(_, params) => Some(params),
        }
    }

    /// Parse one YAML test entry
    pub fn from_yaml(value: &serde_yaml::Value) -> Result<Self, String> {
        match value {
            serde_yaml::Value::String(name) if !name.trim().is_empty() => {
                Ok(TestSpec::Bare(name.trim().to_string()))
            }
            serde_yaml::Value::Mapping(map) if map.len() == 1 => {
                let Some((key, params)) = map.iter().next() else {
                    return Err("empty test mapping".to_string());
                };
                let name = key
                    .as_str()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| "test name must be a non-empty string".to_string())?;
                let params = parse_params(name, params)?;
                Ok(TestSpec::Parameterized(name.trim().to_string(), params))
            }
            serde_yaml::Value::Mapping(map) => Err(format!(
                "a parameterized test must have exactly one key, found {}",
                map.len()
            )),
            other => Err(format!("unsupported test definition: {:?}", other)),
        }
    }
}

fn parse_params(name: &str, value: &serde_yaml::Value) -> Result<TestParams, String> {
    match value {
        serde_yaml::Value::Null => Ok(TestParams::new()),
        serde_yaml::Value::Mapping(map) => {
            let mut params = TestParams::new();
            for (k, v) in map {
                let key = k
                    .as_str()
                    .ok_or_else(|| format!("parameter names of test '{name}' must be strings"))?;
                if RESERVED_TEST_PARAMS.contains(&key) {
                    return Err(format!(
                        "parameter '{key}' of test '{name}' is reserved (reserved: {})",
                        RESERVED_TEST_PARAMS.join(", ")
                    ));
                }
                let json = serde_json::to_value(v)
                    .map_err(|e| format!("parameter '{key}' of test '{name}': {e}"))?;
                params.insert(key.to_string(), json);
            }
            Ok(params)
        }
        _ => Err(format!("parameters of test '{name}' must be a mapping")),
    }
}

impl fmt::Display for TestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered mapping of column name to its ordered test list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnTests(Vec<(String, Vec<TestSpec>)>);

impl ColumnTests {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a test to a column, keeping first-seen column order
    pub fn push(&mut self, column: impl Into<String>, spec: TestSpec) {
        let column = column.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some((_, tests)) => tests.push(spec),
            None => self.0.push((column, vec![spec])),
        }
    }

    /// Parse the `columns:` mapping of a model YAML file
    pub fn from_yaml(columns: &serde_yaml::Mapping) -> Result<Self, String> {
        let mut tests = Self::new();
        for (column, specs) in columns {
            let column = column
                .as_str()
                .ok_or_else(|| "column names must be strings".to_string())?;
            match specs {
                serde_yaml::Value::Null => {}
                serde_yaml::Value::Sequence(entries) => {
                    for entry in entries {
                        let spec = TestSpec::from_yaml(entry)
                            .map_err(|e| format!("column '{column}': {e}"))?;
                        tests.push(column, spec);
                    }
                }
                _ => {
                    return Err(format!(
                        "column '{column}': tests must be a list of test names or mappings"
                    ))
                }
            }
        }
        Ok(tests)
    }

    /// Iterate `(column, test)` pairs in declaration order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &TestSpec)> {
        self.0
            .iter()
            .flat_map(|(column, specs)| specs.iter().map(move |s| (column.as_str(), s)))
    }

    /// Columns that carry at least one test, in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    /// Total number of configured tests
    pub fn len(&self) -> usize {
        self.0.iter().map(|(_, specs)| specs.len()).sum()
    }

    /// Whether no tests are configured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "testing_test.rs"]
mod tests;
