use crate::dto::grading_dto::{CompletionStatus, GradingDetails, GradingResultDto};
use crate::error::{Error, Result};
use crate::models::answer::{AnswerContent, AssignmentAnswer};
use crate::models::assignment::{Assignment, AssignmentDetails};
use crate::models::code_submission::TestCaseExecutionResult;
use crate::services::batch_service::AutoGrader;
use crate::services::scoring_service::ScoringService;
use crate::services::validation_service::{ParsedPayload, ValidationService, MSG_EMPTY_ANSWER, MSG_KIND_MISMATCH};

pub const MSG_NO_TEST_RESULTS: &str = "No test execution results provided";

/// Routes answers to the validator and scorer of their assignment kind and decides whether the
/// result is final or waits for a teacher. Never mutates or persists anything itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradingService;

impl GradingService {
    pub fn grade_assignment(assignment: &Assignment, content: &AnswerContent) -> GradingResultDto {
        let validation = ValidationService::validate(assignment, content);
        if validation.has_error() {
            return GradingResultDto::invalid(validation.error_message());
        }

        match (&assignment.details, content) {
            (AssignmentDetails::Coding(_), AnswerContent::Coding(submission)) => {
                Self::grade_coding_assignment(assignment, &submission.test_case_results)
            }
            (AssignmentDetails::MultipleChoice(details), AnswerContent::MultipleChoice { selected_option_ids }) => {
                let analysis =
                    ScoringService::analyze_multiple_choice(details, assignment.max_score(), selected_option_ids);
                GradingResultDto::scored(ScoringService::score(assignment, content), assignment.max_score())
                    .with_details(GradingDetails::MultipleChoice(analysis))
            }
            _ => {
                let result = GradingResultDto::scored(ScoringService::score(assignment, content), assignment.max_score());
                if Self::requires_manual_review(assignment) {
                    result.needing_review()
                } else {
                    result
                }
            }
        }
    }

    pub fn grade_payload(assignment: &Assignment, raw: &str) -> GradingResultDto {
        match ValidationService::parse_payload(assignment, raw) {
            ParsedPayload::Content(content) => Self::grade_assignment(assignment, &content),
            ParsedPayload::Empty => GradingResultDto::invalid(MSG_EMPTY_ANSWER),
            ParsedPayload::Malformed(message) => GradingResultDto::invalid(message),
        }
    }

    /// Scores a coding assignment from the execution service's per-test-case results.
    pub fn grade_coding_assignment(assignment: &Assignment, results: &[TestCaseExecutionResult]) -> GradingResultDto {
        if !matches!(assignment.details, AssignmentDetails::Coding(_)) {
            return GradingResultDto::invalid(MSG_KIND_MISMATCH);
        }
        if results.is_empty() {
            return GradingResultDto::invalid(MSG_NO_TEST_RESULTS);
        }
        match ScoringService::score_breakdown(assignment, results) {
            Ok(breakdown) => GradingResultDto::scored(breakdown.score, breakdown.max_score)
                .with_details(GradingDetails::Coding(breakdown)),
            Err(e) => GradingResultDto::invalid(e.to_string()),
        }
    }

    pub fn requires_manual_review(assignment: &Assignment) -> bool {
        assignment.kind().requires_manual_grading()
    }

    /// Grades `answer` and returns the updated record: AUTO_GRADED for auto-gradeable kinds,
    /// PENDING_MANUAL_REVIEW with a provisional score otherwise.
    pub fn auto_grade(assignment: &Assignment, answer: AssignmentAnswer) -> Result<AssignmentAnswer> {
        Self::check_ownership(assignment, &answer)?;
        if answer.is_graded() {
            return Err(Error::AlreadyGraded(answer.id));
        }

        let result = Self::grade_assignment(assignment, &answer.content);
        if !result.valid {
            return Err(Error::InvalidAnswer(result.error_message.unwrap_or_default()));
        }
        let score = result.score.unwrap_or(0.0);

        tracing::debug!(
            answer_id = answer.id,
            assignment_id = assignment.id,
            score,
            manual_review = result.requires_manual_review,
            "Answer graded"
        );

        if result.requires_manual_review {
            answer.mark_pending_review(Some(score))
        } else {
            answer.auto_graded(score)
        }
    }

    /// Applies a teacher's score and feedback. A graded answer has to be reset before it can be regraded.
    pub fn grade_manually(
        assignment: &Assignment,
        answer: AssignmentAnswer,
        score: f64,
        feedback: Option<String>,
    ) -> Result<AssignmentAnswer> {
        Self::check_ownership(assignment, &answer)?;
        let max = assignment.max_score();
        if !(0.0..=max).contains(&score) {
            return Err(Error::InvalidScore { score, max });
        }
        let feedback = feedback.filter(|f| !f.trim().is_empty());
        answer.grade(score, feedback)
    }

    pub fn completion_status(assignment: &Assignment, answer: &AssignmentAnswer) -> CompletionStatus {
        if !answer.has_answer() {
            CompletionStatus::NotAnswered
        } else if ValidationService::validate(assignment, &answer.content).has_error() {
            CompletionStatus::InvalidAnswer
        } else if !answer.is_graded() {
            CompletionStatus::PendingGrading
        } else {
            CompletionStatus::Completed
        }
    }

    fn check_ownership(assignment: &Assignment, answer: &AssignmentAnswer) -> Result<()> {
        if answer.assignment_id != assignment.id {
            return Err(Error::AssignmentMismatch {
                expected: assignment.id,
                found: answer.assignment_id,
            });
        }
        if answer.kind() != assignment.kind() {
            return Err(Error::KindMismatch {
                assignment: assignment.kind(),
                answer: answer.kind(),
            });
        }
        Ok(())
    }
}

impl AutoGrader for GradingService {
    fn grade_answer(&self, assignment: &Assignment, answer: AssignmentAnswer) -> Result<AssignmentAnswer> {
        Self::auto_grade(assignment, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::GradingState;
    use crate::models::assignment::{CodingDetails, OpenQuestionDetails, SingleChoiceDetails};
    use crate::models::choice_option::ChoiceOption;
    use crate::models::code_submission::CodeSubmission;
    use crate::models::test_case::TestCase;

    fn single_choice() -> Assignment {
        let options = (1..=4)
            .map(|i| ChoiceOption::new(i, format!("Option {}", i), i == 3, i as i32))
            .collect();
        Assignment::new(
            1,
            1,
            "Pick one",
            10,
            AssignmentDetails::SingleChoice(SingleChoiceDetails::new(options)),
        )
        .unwrap()
    }

    fn essay() -> Assignment {
        Assignment::new(
            2,
            1,
            "Essay",
            10,
            AssignmentDetails::OpenQuestion(OpenQuestionDetails::default()),
        )
        .unwrap()
    }

    fn coding() -> Assignment {
        let cases = (1..=4).map(|i| TestCase::new(i, None, None, i == 1)).collect();
        Assignment::new(3, 1, "Sum", 20, AssignmentDetails::Coding(CodingDetails::new(&["rust"], cases))).unwrap()
    }

    #[test]
    fn payload_grading() {
        let result = GradingService::grade_payload(&single_choice(), "3");
        assert!(result.valid);
        assert_eq!(result.score, Some(10.0));
        assert!(result.perfect_score);

        let result = GradingService::grade_payload(&single_choice(), "");
        assert_eq!(result.error_message.as_deref(), Some("Answer cannot be empty"));
    }

    #[test]
    fn coding_requires_results() {
        let result = GradingService::grade_coding_assignment(&coding(), &[]);
        assert_eq!(result.error_message.as_deref(), Some(MSG_NO_TEST_RESULTS));

        let result = GradingService::grade_coding_assignment(&single_choice(), &[TestCaseExecutionResult::passed(1)]);
        assert!(!result.valid);

        let content = AnswerContent::Coding(CodeSubmission::new("fn main() {}", "rust"));
        let result = GradingService::grade_assignment(&coding(), &content);
        assert_eq!(result.error_message.as_deref(), Some(MSG_NO_TEST_RESULTS));
    }

    #[test]
    fn open_question_goes_to_review() {
        let answer = AssignmentAnswer::new(1, 2, 1, 1, AnswerContent::text("My essay"));
        let pending = GradingService::auto_grade(&essay(), answer).unwrap();
        assert_eq!(pending.grading_state(), GradingState::PendingManualReview);
        assert_eq!(pending.score, Some(10.0));
        assert!(!pending.is_graded());

        let graded = GradingService::grade_manually(&essay(), pending, 6.5, Some("Fine".to_string())).unwrap();
        assert_eq!(graded.grading_state(), GradingState::Graded);
        assert_eq!(GradingService::completion_status(&essay(), &graded), CompletionStatus::Completed);
    }

    #[test]
    fn manual_score_is_bounded_by_points() {
        let answer = AssignmentAnswer::new(1, 2, 1, 1, AnswerContent::text("My essay"));
        let err = GradingService::grade_manually(&essay(), answer.clone(), 11.0, None).unwrap_err();
        assert!(matches!(err, Error::InvalidScore { .. }));
        assert!(GradingService::grade_manually(&essay(), answer, f64::NAN, None).is_err());
    }

    #[test]
    fn auto_grade_rejects_foreign_and_invalid_answers() {
        let foreign = AssignmentAnswer::new(1, 99, 1, 1, AnswerContent::single(3));
        assert!(matches!(
            GradingService::auto_grade(&single_choice(), foreign),
            Err(Error::AssignmentMismatch { expected: 1, found: 99 })
        ));

        let wrong_kind = AssignmentAnswer::new(1, 1, 1, 1, AnswerContent::text("3"));
        assert!(matches!(
            GradingService::auto_grade(&single_choice(), wrong_kind),
            Err(Error::KindMismatch { .. })
        ));

        let stale = AssignmentAnswer::new(1, 1, 1, 1, AnswerContent::single(42));
        assert_eq!(
            GradingService::completion_status(&single_choice(), &stale),
            CompletionStatus::InvalidAnswer
        );
        let err = GradingService::auto_grade(&single_choice(), stale).unwrap_err();
        assert_eq!(err.to_string(), "Invalid answer: Invalid option selected");
    }

    #[test]
    fn auto_grade_single_choice() {
        let answer = AssignmentAnswer::new(1, 1, 1, 1, AnswerContent::single(3));
        assert_eq!(
            GradingService::completion_status(&single_choice(), &answer),
            CompletionStatus::PendingGrading
        );
        let graded = GradingService.grade_answer(&single_choice(), answer).unwrap();
        assert_eq!(graded.grading_state(), GradingState::AutoGraded);
        assert_eq!(graded.score, Some(10.0));
    }
}
