use crate::config::Config;
use crate::dto::grading_dto::{BatchGradingReport, BatchGradingResultDto, GradingTask};
use crate::error::Result;
use crate::models::answer::AssignmentAnswer;
use crate::models::assignment::Assignment;
use crate::services::grading_service::GradingService;
use crate::utils::time;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Grades one answer against its assignment. The batch coordinator only talks to this seam.
#[cfg_attr(test, mockall::automock)]
pub trait AutoGrader: Send + Sync {
    fn grade_answer(&self, assignment: &Assignment, answer: AssignmentAnswer) -> Result<AssignmentAnswer>;
}

enum ItemOutcome {
    Graded(AssignmentAnswer),
    Skipped,
    Failed,
}

/// Applies auto-grading to many answers. One item's failure (error or panic) never aborts the others.
pub struct BatchGradingService<G = GradingService> {
    grader: Arc<G>,
    concurrency: usize,
    deadline: Option<Duration>,
}

impl BatchGradingService<GradingService> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(GradingService, config.batch_concurrency).with_deadline(config.batch_deadline)
    }
}

impl<G: AutoGrader + 'static> BatchGradingService<G> {
    pub fn new(grader: G, concurrency: usize) -> Self {
        Self {
            grader: Arc::new(grader),
            concurrency: concurrency.max(1),
            deadline: None,
        }
    }

    /// Stops starting new items once `deadline` has elapsed; items not started count as skipped.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn batch_auto_grade(&self, tasks: Vec<GradingTask>) -> BatchGradingReport {
        let batch_id = Uuid::new_v4();
        let span = info_span!("batch_auto_grade", batch_id = %batch_id, mode = "sequential");
        let _enter = span.enter();
        info!(total = tasks.len(), "Starting batch auto-grading");

        let started = Instant::now();
        let mut summary = BatchGradingResultDto {
            total_answers: tasks.len(),
            ..Default::default()
        };
        let mut graded_answers = Vec::new();

        for task in tasks {
            if self.deadline_passed(started) {
                summary.skipped_count += 1;
                continue;
            }
            let answer_id = task.answer.id;
            match panic::catch_unwind(AssertUnwindSafe(|| grade_task(self.grader.as_ref(), task))) {
                Ok(outcome) => record(&mut summary, &mut graded_answers, outcome),
                Err(_) => {
                    warn!(answer_id, "Grading task panicked");
                    summary.error_count += 1;
                }
            }
        }

        finish(summary, graded_answers)
    }

    /// Same contract as [`Self::batch_auto_grade`] with up to `concurrency` items in flight.
    pub async fn batch_auto_grade_concurrent(&self, tasks: Vec<GradingTask>) -> BatchGradingReport {
        let batch_id = Uuid::new_v4();
        let span = info_span!("batch_auto_grade", batch_id = %batch_id, mode = "concurrent");
        self.run_concurrent(tasks).instrument(span).await
    }

    async fn run_concurrent(&self, tasks: Vec<GradingTask>) -> BatchGradingReport {
        info!(
            total = tasks.len(),
            concurrency = self.concurrency,
            "Starting batch auto-grading"
        );

        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut summary = BatchGradingResultDto {
            total_answers: tasks.len(),
            ..Default::default()
        };
        let mut graded_answers = Vec::new();
        let mut in_flight = JoinSet::new();

        for task in tasks {
            if self.deadline_passed(started) {
                summary.skipped_count += 1;
                continue;
            }
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!(answer_id = task.answer.id, error = %e, "Could not schedule answer");
                    summary.error_count += 1;
                    continue;
                }
            };
            // waiting for a permit may have used up the remaining time
            if self.deadline_passed(started) {
                summary.skipped_count += 1;
                continue;
            }

            let grader = Arc::clone(&self.grader);
            in_flight.spawn(
                async move {
                    let _permit = permit;
                    grade_task(grader.as_ref(), task)
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok(outcome) => record(&mut summary, &mut graded_answers, outcome),
                Err(e) => {
                    warn!(error = %e, "Grading task panicked");
                    summary.error_count += 1;
                }
            }
        }

        finish(summary, graded_answers)
    }

    fn deadline_passed(&self, started: Instant) -> bool {
        time::budget_exhausted(started, self.deadline)
    }
}

fn grade_task<G: AutoGrader + ?Sized>(grader: &G, task: GradingTask) -> ItemOutcome {
    let GradingTask { assignment, answer } = task;

    if !answer.has_answer() || answer.is_graded() || !assignment.kind().is_auto_gradeable() {
        debug!(answer_id = answer.id, assignment_id = assignment.id, "Skipping answer");
        return ItemOutcome::Skipped;
    }

    let answer_id = answer.id;
    match grader.grade_answer(&assignment, answer) {
        Ok(graded) => ItemOutcome::Graded(graded),
        Err(e) if e.is_answer_error() => {
            warn!(
                answer_id,
                assignment_id = assignment.id,
                error = %e,
                "Failed to auto-grade answer"
            );
            ItemOutcome::Failed
        }
        Err(e) => {
            error!(
                answer_id,
                assignment_id = assignment.id,
                error = %e,
                "Grader error while auto-grading answer"
            );
            ItemOutcome::Failed
        }
    }
}

fn record(summary: &mut BatchGradingResultDto, graded_answers: &mut Vec<AssignmentAnswer>, outcome: ItemOutcome) {
    match outcome {
        ItemOutcome::Graded(answer) => {
            summary.graded_count += 1;
            graded_answers.push(answer);
        }
        ItemOutcome::Skipped => summary.skipped_count += 1,
        ItemOutcome::Failed => summary.error_count += 1,
    }
}

fn finish(summary: BatchGradingResultDto, graded_answers: Vec<AssignmentAnswer>) -> BatchGradingReport {
    let finished_at = time::now();
    info!(
        total = summary.total_answers,
        graded = summary.graded_count,
        errors = summary.error_count,
        skipped = summary.skipped_count,
        finished_at = %time::log_timestamp(finished_at),
        "Batch auto-grading finished"
    );
    BatchGradingReport {
        success_rate: summary.success_rate(),
        summary,
        graded_answers,
        finished_at,
    }
}
