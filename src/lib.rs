pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::dto::grading_dto::{BatchGradingReport, GradingResultDto, GradingTask, ValidationResult};
use crate::models::assignment::Assignment;
use crate::services::batch_service::BatchGradingService;
use crate::services::grading_service::GradingService;
use crate::services::scoring_service::ScoringService;
use crate::services::validation_service::ValidationService;

/// The four operations a host service calls. Assignments and answers arrive already loaded; the
/// engine never fetches or persists anything.
pub struct GradingEngine {
    batch: BatchGradingService,
}

impl GradingEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            batch: BatchGradingService::from_config(config),
        }
    }

    pub fn from_config() -> Self {
        Self::new(crate::config::get_config())
    }

    pub fn validate(&self, assignment: &Assignment, answer_payload: &str) -> ValidationResult {
        ValidationService::validate_payload(assignment, answer_payload)
    }

    pub fn score(&self, assignment: &Assignment, answer_payload: &str) -> f64 {
        ScoringService::score_payload(assignment, answer_payload)
    }

    pub fn grade_assignment(&self, assignment: &Assignment, answer_payload: &str) -> GradingResultDto {
        GradingService::grade_payload(assignment, answer_payload)
    }

    pub async fn batch_auto_grade(&self, tasks: Vec<GradingTask>) -> BatchGradingReport {
        self.batch.batch_auto_grade_concurrent(tasks).await
    }
}

impl Default for GradingEngine {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
