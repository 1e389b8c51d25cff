use serde::{Deserialize, Serialize};

/// How a multiple-choice selection scored under partial scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringAnalysis {
    pub correct_selections: usize,
    pub wrong_selections: usize,
    pub missed_correct: usize,
    pub total_correct: usize,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
}

impl ScoringAnalysis {
    pub fn is_perfect(&self) -> bool {
        self.correct_selections == self.total_correct && self.wrong_selections == 0
    }

    pub fn has_errors(&self) -> bool {
        self.wrong_selections > 0 || self.missed_correct > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionAnalysis {
    pub total_selected: usize,
    pub correct_selected: usize,
    pub incorrect_selected: usize,
    pub total_correct_available: usize,
    pub missed_correct: usize,
    pub is_perfect: bool,
    pub has_errors: bool,
}

impl SelectionAnalysis {
    /// Share of the selection that is correct.
    pub fn selection_accuracy(&self) -> f64 {
        if self.total_selected == 0 {
            return 0.0;
        }
        self.correct_selected as f64 / self.total_selected as f64 * 100.0
    }

    /// Share of the correct options that were found.
    pub fn completeness(&self) -> f64 {
        if self.total_correct_available == 0 {
            return 100.0;
        }
        self.correct_selected as f64 / self.total_correct_available as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthStatus {
    pub valid: bool,
    pub message: String,
    pub current_length: usize,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub remaining_characters: usize,
    pub required_characters: usize,
}

impl LengthStatus {
    pub fn within_limits(current_length: usize) -> Self {
        Self {
            valid: true,
            message: "Within length limits".to_string(),
            current_length,
            min_length: None,
            max_length: None,
            remaining_characters: 0,
            required_characters: 0,
        }
    }

    pub fn too_short(current_length: usize, min_length: usize) -> Self {
        Self {
            valid: false,
            message: format!("Too short (minimum: {} characters)", min_length),
            current_length,
            min_length: Some(min_length),
            max_length: None,
            remaining_characters: 0,
            required_characters: min_length.saturating_sub(current_length),
        }
    }

    pub fn too_long(current_length: usize, max_length: usize) -> Self {
        Self {
            valid: false,
            message: format!("Too long (maximum: {} characters)", max_length),
            current_length,
            min_length: None,
            max_length: Some(max_length),
            remaining_characters: max_length.saturating_sub(current_length),
            required_characters: 0,
        }
    }

    pub fn no_answer() -> Self {
        Self {
            valid: false,
            message: "No answer provided".to_string(),
            current_length: 0,
            min_length: None,
            max_length: None,
            remaining_characters: 0,
            required_characters: 0,
        }
    }
}

/// Progress of an open answer towards its minimum length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionInfo {
    pub percentage: f64,
    pub is_complete: bool,
    pub current_length: usize,
    pub required_length: Option<usize>,
}

impl CompletionInfo {
    pub fn calculate(current_length: usize, min_length: Option<usize>) -> Self {
        match min_length.filter(|m| *m > 0) {
            None => {
                let complete = current_length > 0;
                Self {
                    percentage: if complete { 100.0 } else { 0.0 },
                    is_complete: complete,
                    current_length,
                    required_length: None,
                }
            }
            Some(min) => Self {
                percentage: (current_length as f64 / min as f64 * 100.0).min(100.0),
                is_complete: current_length >= min,
                current_length,
                required_length: Some(min),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLimitCheck {
    pub time_exceeded: bool,
    pub memory_exceeded: bool,
    pub within_limits: bool,
    pub execution_time_ms: u64,
    pub memory_used_mb: u64,
    pub time_limit_ms: Option<u64>,
    pub memory_limit_mb: Option<u64>,
}

impl ExecutionLimitCheck {
    pub fn status(&self) -> &'static str {
        match (self.time_exceeded, self.memory_exceeded) {
            (false, false) => "WITHIN_LIMITS",
            (true, true) => "TIME_AND_MEMORY_EXCEEDED",
            (true, false) => "TIME_LIMIT_EXCEEDED",
            (false, true) => "MEMORY_LIMIT_EXCEEDED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionValidation {
    Valid,
    Invalid(String),
    LimitExceeded(String),
}

impl ExecutionValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, ExecutionValidation::Valid)
    }
}
