use crate::dto::analysis_dto::ScoringAnalysis;
use crate::models::answer::AssignmentAnswer;
use crate::models::assignment::Assignment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error_message: None,
        }
    }

    pub fn invalid(error_message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_message: Some(error_message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn has_error(&self) -> bool {
        !self.valid
    }

    pub fn error_message(&self) -> &str {
        self.error_message.as_deref().unwrap_or("")
    }
}

/// Pass/fail tally of a coding submission against the assignment's configured test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringBreakdown {
    pub total_test_cases: usize,
    pub passed_test_cases: usize,
    pub failed_test_cases: usize,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub is_perfect: bool,
}

impl ScoringBreakdown {
    pub fn summary(&self) -> String {
        format!(
            "Passed {}/{} tests ({:.1}%) - Score: {:.1}/{:.1}",
            self.passed_test_cases, self.total_test_cases, self.percentage, self.score, self.max_score
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GradingDetails {
    Coding(ScoringBreakdown),
    MultipleChoice(ScoringAnalysis),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResultDto {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    pub perfect_score: bool,
    /// Set when the score is provisional and a teacher still has to confirm it.
    #[serde(default)]
    pub requires_manual_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<GradingDetails>,
}

impl GradingResultDto {
    pub fn invalid(error_message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_message: Some(error_message.into()),
            score: None,
            max_score: None,
            percentage: None,
            perfect_score: false,
            requires_manual_review: false,
            details: None,
        }
    }

    pub fn scored(score: f64, max_score: f64) -> Self {
        let percentage = if max_score > 0.0 {
            score / max_score * 100.0
        } else {
            0.0
        };
        Self {
            valid: true,
            error_message: None,
            score: Some(score),
            max_score: Some(max_score),
            percentage: Some(percentage),
            perfect_score: score == max_score,
            requires_manual_review: false,
            details: None,
        }
    }

    pub fn needing_review(mut self) -> Self {
        self.requires_manual_review = true;
        self
    }

    pub fn with_details(mut self, details: GradingDetails) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    NotAnswered,
    InvalidAnswer,
    PendingGrading,
    Completed,
}

/// One unit of batch work: an answer together with the assignment it was submitted against.
#[derive(Debug, Clone, Deserialize)]
pub struct GradingTask {
    pub assignment: Assignment,
    pub answer: AssignmentAnswer,
}

impl GradingTask {
    pub fn new(assignment: Assignment, answer: AssignmentAnswer) -> Self {
        Self { assignment, answer }
    }
}

/// Aggregate counters of one batch run. Per-item failures are only visible in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchGradingResultDto {
    pub total_answers: usize,
    pub graded_count: usize,
    pub error_count: usize,
    pub skipped_count: usize,
}

impl BatchGradingResultDto {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn is_fully_graded(&self) -> bool {
        self.graded_count == self.total_answers
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_answers == 0 {
            return 0.0;
        }
        self.graded_count as f64 / self.total_answers as f64 * 100.0
    }

    pub fn is_consistent(&self) -> bool {
        self.total_answers == self.graded_count + self.error_count + self.skipped_count
    }
}

/// What a batch run hands back to the host: the counters plus the answers to persist.
#[derive(Debug, Clone, Serialize)]
pub struct BatchGradingReport {
    pub summary: BatchGradingResultDto,
    pub success_rate: f64,
    #[serde(skip)]
    pub graded_answers: Vec<AssignmentAnswer>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scored_result_guards_zero_max() {
        let result = GradingResultDto::scored(0.0, 0.0);
        assert_eq!(result.percentage, Some(0.0));

        let result = GradingResultDto::scored(10.0, 10.0);
        assert_eq!(result.percentage, Some(100.0));
        assert!(result.perfect_score);
    }

    #[test]
    fn invalid_result_has_no_score() {
        let result = GradingResultDto::invalid("Answer cannot be empty");
        assert!(!result.valid);
        assert_eq!(result.score, None);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("score").is_none());
        assert_eq!(json["error_message"], "Answer cannot be empty");
    }

    #[test]
    fn batch_success_rate() {
        let summary = BatchGradingResultDto {
            total_answers: 5,
            graded_count: 2,
            error_count: 1,
            skipped_count: 2,
        };
        assert!((summary.success_rate() - 40.0).abs() < 1e-9);
        assert!(summary.is_consistent());
        assert!(summary.has_errors());
        assert_eq!(BatchGradingResultDto::default().success_rate(), 0.0);
    }

    #[test]
    fn breakdown_summary() {
        let breakdown = ScoringBreakdown {
            total_test_cases: 4,
            passed_test_cases: 3,
            failed_test_cases: 1,
            score: 15.0,
            max_score: 20.0,
            percentage: 75.0,
            is_perfect: false,
        };
        assert_eq!(breakdown.summary(), "Passed 3/4 tests (75.0%) - Score: 15.0/20.0");
    }
}
