//! Test case records as delivered by the export parser
//!
//! This module provides:
//! - The wire shape of a parsed test case (`RawTestCase`)
//! - Fixed enumeration tables for the categorical fields
//!   (priority, testing level, core dependency), each with an unknown bucket

mod categories;

pub use categories::{parse_core_dependency, Priority, TestingLevel};

use serde::{Deserialize, Serialize};

/// A field that exporters emit either as a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    /// Flatten into an ordered list of non-empty entries
    pub fn into_items(self) -> Vec<String> {
        match self {
            Self::Text(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Self::List(items) => items,
        }
    }
}

/// Core dependency flag as it appears in exports: a boolean or a "Yes"/"No" string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

impl FlagValue {
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(text) => parse_core_dependency(text),
        }
    }
}

/// One parsed test case
///
/// Every field is optional so that a field missing entirely can be told apart
/// from one that is present but empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTestCase {
    #[serde(default, alias = "key", alias = "mph", alias = "identifier")]
    pub id: Option<String>,

    #[serde(default, alias = "name")]
    pub title: Option<String>,

    #[serde(default)]
    pub steps: Option<TextOrList>,

    #[serde(default, alias = "expected", alias = "expected_results")]
    pub expected_result: Option<String>,

    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default, alias = "core_dependent")]
    pub core_dependency: Option<FlagValue>,

    #[serde(default, alias = "testing level")]
    pub testing_level: Option<String>,

    #[serde(default)]
    pub labels: Option<TextOrList>,
}

impl RawTestCase {
    /// Create a test case with identifier and title set
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = Some(TextOrList::List(steps.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected_result = Some(expected.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_core_dependency(mut self, core: bool) -> Self {
        self.core_dependency = Some(FlagValue::Bool(core));
        self
    }

    pub fn with_testing_level(mut self, level: impl Into<String>) -> Self {
        self.testing_level = Some(level.into());
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(TextOrList::List(labels.into_iter().map(Into::into).collect()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_aliases() {
        let json = r#"{
            "key": "TC-1",
            "name": "Login works",
            "steps": "Open page\n\nEnter credentials",
            "expected": "Dashboard shown",
            "priority": "1 - Critical",
            "core_dependency": "Yes",
            "testing level": "System",
            "labels": ["auth", "smoke"]
        }"#;

        let case: RawTestCase = serde_json::from_str(json).unwrap();

        assert_eq!(case.id.as_deref(), Some("TC-1"));
        assert_eq!(case.title.as_deref(), Some("Login works"));
        assert_eq!(
            case.steps.clone().unwrap().into_items(),
            vec!["Open page".to_string(), "Enter credentials".to_string()]
        );
        assert_eq!(case.expected_result.as_deref(), Some("Dashboard shown"));
        assert!(case.core_dependency.as_ref().unwrap().as_bool());
        assert_eq!(case.testing_level.as_deref(), Some("System"));
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let case: RawTestCase = serde_json::from_str(r#"{"id": "TC-2"}"#).unwrap();

        assert_eq!(case.id.as_deref(), Some("TC-2"));
        assert!(case.title.is_none());
        assert!(case.steps.is_none());
        assert!(case.core_dependency.is_none());
    }

    #[test]
    fn test_boolean_flag() {
        let case: RawTestCase =
            serde_json::from_str(r#"{"id": "TC-3", "core_dependency": false}"#).unwrap();
        assert!(!case.core_dependency.unwrap().as_bool());
    }

    #[test]
    fn test_builder() {
        let case = RawTestCase::new("TC-4", "Checkout")
            .with_steps(["Add item", "Pay"])
            .with_priority("High")
            .with_core_dependency(true);

        assert_eq!(
            case.steps,
            Some(TextOrList::List(vec!["Add item".into(), "Pay".into()]))
        );
        assert_eq!(case.priority.as_deref(), Some("High"));
        assert_eq!(case.core_dependency, Some(FlagValue::Bool(true)));
    }
}
