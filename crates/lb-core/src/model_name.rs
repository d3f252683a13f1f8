//! Model identifiers

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Name of a model, taken from its file stem.
///
/// Relation names and column names stay plain strings; only model
/// identity gets its own type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    /// Wrap a name known to be non-empty (debug builds assert it)
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "model name must not be empty");
        Self(name)
    }

    /// Wrap a name from user input; `None` when empty
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        (!name.is_empty()).then_some(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ModelName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for ModelName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModelName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_rejected() {
        assert!(ModelName::try_new(String::new()).is_none());
        assert_eq!(ModelName::try_new("stg_orders").unwrap(), "stg_orders");
    }

    #[test]
    fn test_lookup_by_str() {
        let names: std::collections::BTreeSet<ModelName> =
            ["orders", "customers"].into_iter().map(ModelName::from).collect();
        assert!(names.contains("customers"));
        assert_eq!(names.iter().next().unwrap().as_str(), "customers");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_value(ModelName::new("orders")).unwrap();
        assert_eq!(json, serde_json::json!("orders"));
    }
}
