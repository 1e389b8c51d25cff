use crate::models::Id;
use crate::utils::validation::not_blank;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One selectable option of a choice assignment. Answers refer to options by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChoiceOption {
    pub id: Id,
    #[serde(default)]
    pub assignment_id: Id,
    #[validate(custom(function = "not_blank"))]
    pub option_text: String,
    #[serde(default)]
    pub correct: bool,
    #[validate(range(min = 1))]
    pub order_number: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ChoiceOption {
    pub fn new(id: Id, option_text: impl Into<String>, correct: bool, order_number: i32) -> Self {
        Self {
            id,
            assignment_id: 0,
            option_text: option_text.into(),
            correct,
            order_number,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn has_explanation(&self) -> bool {
        self.explanation
            .as_deref()
            .map_or(false, |e| !e.trim().is_empty())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
