use crate::models::Id;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TestCase {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "default_weight")]
    #[validate(range(min = 1))]
    pub weight: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_weight() -> i32 {
    1
}

impl TestCase {
    pub fn new(id: Id, input_data: Option<&str>, expected_output: Option<&str>, is_public: bool) -> Self {
        Self {
            id,
            input_data: input_data.map(str::to_string),
            expected_output: expected_output.map(str::to_string),
            is_public,
            weight: default_weight(),
            description: None,
        }
    }

    /// Compares program output against the expected output, ignoring surrounding whitespace.
    pub fn matches(&self, actual_output: Option<&str>) -> bool {
        match (self.expected_output.as_deref(), actual_output) {
            (None, None) => true,
            (Some(expected), Some(actual)) => expected.trim() == actual.trim(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_ignores_surrounding_whitespace() {
        let case = TestCase::new(1, Some("2 3"), Some("5\n"), true);
        assert!(case.matches(Some("  5")));
        assert!(!case.matches(Some("6")));
        assert!(!case.matches(None));
    }

    #[test]
    fn missing_expected_output_only_matches_missing_actual() {
        let case = TestCase::new(1, None, None, false);
        assert!(case.matches(None));
        assert!(!case.matches(Some("")));
    }

    #[test]
    fn weight_defaults_to_one_when_deserialized() {
        let case: TestCase = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(case.weight, 1);
        assert!(!case.is_public);
    }
}
