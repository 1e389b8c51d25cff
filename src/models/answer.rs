use crate::error::{Error, Result};
use crate::models::assignment_kind::AssignmentKind;
use crate::models::code_submission::CodeSubmission;
use crate::models::Id;
use crate::utils::text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where an answer sits in the grading lifecycle.
///
/// `Ungraded -> AutoGraded | PendingManualReview`, `PendingManualReview -> Graded` on teacher action.
/// `Graded` only leaves through [`AssignmentAnswer::reset_grading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradingState {
    #[default]
    Ungraded,
    AutoGraded,
    PendingManualReview,
    Graded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerContent {
    SingleChoice {
        #[serde(default)]
        selected_option_id: Option<Id>,
    },
    MultipleChoice {
        #[serde(default)]
        selected_option_ids: BTreeSet<Id>,
    },
    OpenQuestion {
        #[serde(default)]
        answer_text: Option<String>,
    },
    Coding(CodeSubmission),
}

impl AnswerContent {
    pub fn single(option_id: Id) -> Self {
        AnswerContent::SingleChoice {
            selected_option_id: Some(option_id),
        }
    }

    pub fn multiple(option_ids: impl IntoIterator<Item = Id>) -> Self {
        AnswerContent::MultipleChoice {
            selected_option_ids: option_ids.into_iter().collect(),
        }
    }

    pub fn text(answer_text: impl Into<String>) -> Self {
        AnswerContent::OpenQuestion {
            answer_text: Some(answer_text.into()),
        }
    }

    pub fn kind(&self) -> AssignmentKind {
        match self {
            AnswerContent::SingleChoice { .. } => AssignmentKind::SingleChoice,
            AnswerContent::MultipleChoice { .. } => AssignmentKind::MultipleChoice,
            AnswerContent::OpenQuestion { .. } => AssignmentKind::OpenQuestion,
            AnswerContent::Coding(_) => AssignmentKind::Coding,
        }
    }

    pub fn has_answer(&self) -> bool {
        match self {
            AnswerContent::SingleChoice { selected_option_id } => selected_option_id.is_some(),
            AnswerContent::MultipleChoice { selected_option_ids } => !selected_option_ids.is_empty(),
            AnswerContent::OpenQuestion { answer_text } => answer_text
                .as_deref()
                .map_or(false, |t| !t.trim().is_empty()),
            AnswerContent::Coding(submission) => !submission.source_code.trim().is_empty(),
        }
    }

    /// Raw characters of an open answer, untrimmed. `None` for other kinds.
    pub fn character_count(&self) -> Option<usize> {
        match self {
            AnswerContent::OpenQuestion { answer_text } => {
                Some(answer_text.as_deref().map_or(0, |t| t.chars().count()))
            }
            _ => None,
        }
    }

    pub fn word_count(&self) -> Option<usize> {
        match self {
            AnswerContent::OpenQuestion { answer_text } => {
                Some(answer_text.as_deref().map_or(0, text::count_words))
            }
            _ => None,
        }
    }

    pub fn preview(&self, max_chars: usize) -> String {
        match self {
            AnswerContent::SingleChoice {
                selected_option_id: Some(id),
            } => format!("Option ID: {}", id),
            AnswerContent::SingleChoice { .. } => "No answer".to_string(),
            AnswerContent::MultipleChoice { selected_option_ids } if selected_option_ids.is_empty() => {
                "No options selected".to_string()
            }
            AnswerContent::MultipleChoice { selected_option_ids } => {
                let ids: Vec<String> = selected_option_ids.iter().map(Id::to_string).collect();
                format!("Selected option IDs: {}", ids.join(", "))
            }
            AnswerContent::OpenQuestion { answer_text } => {
                text::preview(answer_text.as_deref().unwrap_or(""), max_chars)
            }
            AnswerContent::Coding(submission) => text::preview(&submission.source_code, max_chars),
        }
    }
}

/// A student's submission against one assignment within one test attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentAnswer {
    pub id: Id,
    pub assignment_id: Id,
    pub test_attempt_id: Id,
    pub student_id: Id,
    #[serde(default)]
    pub answered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub graded: bool,
    #[serde(default)]
    pub teacher_feedback: Option<String>,
    #[serde(default)]
    pub state: GradingState,
    #[serde(flatten)]
    pub content: AnswerContent,
}

impl AssignmentAnswer {
    pub fn new(
        id: Id,
        assignment_id: Id,
        test_attempt_id: Id,
        student_id: Id,
        content: AnswerContent,
    ) -> Self {
        Self {
            id,
            assignment_id,
            test_attempt_id,
            student_id,
            answered_at: None,
            score: None,
            graded: false,
            teacher_feedback: None,
            state: GradingState::Ungraded,
            content,
        }
    }

    pub fn answered_at(mut self, at: DateTime<Utc>) -> Self {
        self.answered_at = Some(at);
        self
    }

    pub fn kind(&self) -> AssignmentKind {
        self.content.kind()
    }

    pub fn has_answer(&self) -> bool {
        self.content.has_answer()
    }

    pub fn is_graded(&self) -> bool {
        self.graded
    }

    pub fn needs_grading(&self) -> bool {
        self.has_answer() && !self.graded
    }

    pub fn has_score(&self) -> bool {
        self.score.is_some()
    }

    pub fn has_feedback(&self) -> bool {
        self.teacher_feedback
            .as_deref()
            .map_or(false, |f| !f.trim().is_empty())
    }

    pub fn score_percentage(&self, max_points: i32) -> f64 {
        match self.score {
            Some(score) if max_points != 0 => score / f64::from(max_points) * 100.0,
            _ => 0.0,
        }
    }

    pub fn is_perfect_score(&self, max_points: i32) -> bool {
        self.score == Some(f64::from(max_points))
    }

    pub fn is_zero_score(&self) -> bool {
        self.score == Some(0.0)
    }

    /// Lifecycle state, reconciled with the `graded` flag for records persisted without a state.
    pub fn grading_state(&self) -> GradingState {
        match (self.graded, self.state) {
            (true, GradingState::AutoGraded) => GradingState::AutoGraded,
            (true, _) => GradingState::Graded,
            (false, GradingState::PendingManualReview) => GradingState::PendingManualReview,
            (false, _) => GradingState::Ungraded,
        }
    }

    pub fn auto_graded(self, score: f64) -> Result<Self> {
        if self.graded {
            return Err(Error::AlreadyGraded(self.id));
        }
        Ok(Self {
            score: Some(score),
            graded: true,
            state: GradingState::AutoGraded,
            ..self
        })
    }

    /// Stores a provisional score and waits for a teacher; the answer stays ungraded.
    pub fn mark_pending_review(self, provisional_score: Option<f64>) -> Result<Self> {
        if self.graded {
            return Err(Error::AlreadyGraded(self.id));
        }
        Ok(Self {
            score: provisional_score,
            state: GradingState::PendingManualReview,
            ..self
        })
    }

    pub fn grade(self, score: f64, feedback: Option<String>) -> Result<Self> {
        if self.grading_state() == GradingState::Graded {
            return Err(Error::InvalidTransition(format!(
                "answer {} is already graded; reset grading before grading again",
                self.id
            )));
        }
        Ok(Self {
            score: Some(score),
            teacher_feedback: feedback,
            graded: true,
            state: GradingState::Graded,
            ..self
        })
    }

    pub fn reset_grading(self) -> Self {
        Self {
            score: None,
            teacher_feedback: None,
            graded: false,
            state: GradingState::Ungraded,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_answer(text: &str) -> AssignmentAnswer {
        AssignmentAnswer::new(1, 10, 100, 1000, AnswerContent::text(text))
    }

    #[test]
    fn derived_counts_for_open_answers() {
        let answer = open_answer("  the quick  brown fox ");
        assert_eq!(answer.content.word_count(), Some(4));
        assert_eq!(answer.content.character_count(), Some(23));
        assert_eq!(AnswerContent::single(3).word_count(), None);
    }

    #[test]
    fn blank_content_is_not_an_answer() {
        assert!(!open_answer("   ").has_answer());
        assert!(!AnswerContent::multiple(Vec::new()).has_answer());
        assert!(!AnswerContent::SingleChoice {
            selected_option_id: None
        }
        .has_answer());
        assert!(AnswerContent::multiple([2, 2, 3]).has_answer());
    }

    #[test]
    fn duplicate_selections_collapse() {
        match AnswerContent::multiple([3, 1, 3]) {
            AnswerContent::MultipleChoice { selected_option_ids } => {
                assert_eq!(selected_option_ids.into_iter().collect::<Vec<_>>(), vec![1, 3]);
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn grading_lifecycle() {
        let answer = open_answer("essay");
        assert_eq!(answer.grading_state(), GradingState::Ungraded);

        let pending = answer.mark_pending_review(Some(4.0)).unwrap();
        assert_eq!(pending.grading_state(), GradingState::PendingManualReview);
        assert!(!pending.is_graded());

        let graded = pending.grade(7.5, Some("Good".to_string())).unwrap();
        assert_eq!(graded.grading_state(), GradingState::Graded);
        assert!(graded.has_feedback());
        assert!(graded.clone().grade(8.0, None).is_err());

        let reset = graded.reset_grading();
        assert_eq!(reset.grading_state(), GradingState::Ungraded);
        assert_eq!(reset.score, None);
        assert_eq!(reset.teacher_feedback, None);
    }

    #[test]
    fn auto_grading_twice_is_rejected() {
        let answer = AssignmentAnswer::new(5, 1, 1, 1, AnswerContent::single(2));
        let graded = answer.auto_graded(10.0).unwrap();
        assert_eq!(graded.grading_state(), GradingState::AutoGraded);
        assert!(graded.is_perfect_score(10));
        assert!(matches!(graded.auto_graded(10.0), Err(Error::AlreadyGraded(5))));
    }

    #[test]
    fn deserializes_flattened_content() {
        let json = r#"{"id": 1, "assignment_id": 2, "test_attempt_id": 7, "student_id": 9, "kind": "MULTIPLE_CHOICE", "selected_option_ids": [1, 3, 1]}"#;
        let answer: AssignmentAnswer = serde_json::from_str(json).unwrap();
        assert_eq!(answer.kind(), AssignmentKind::MultipleChoice);
        assert_eq!(answer.grading_state(), GradingState::Ungraded);

        let legacy = r#"{"id": 1, "assignment_id": 2, "test_attempt_id": 7, "student_id": 9, "graded": true, "score": 3.0, "kind": "SINGLE_CHOICE", "selected_option_id": 1}"#;
        let answer: AssignmentAnswer = serde_json::from_str(legacy).unwrap();
        assert_eq!(answer.grading_state(), GradingState::Graded);
    }

    #[test]
    fn answer_without_test_attempt_is_rejected() {
        let json = r#"{"id": 1, "assignment_id": 2, "student_id": 9, "kind": "SINGLE_CHOICE", "selected_option_id": 1}"#;
        let err = serde_json::from_str::<AssignmentAnswer>(json).unwrap_err();
        assert!(err.to_string().contains("test_attempt_id"));
    }

    #[test]
    fn previews_per_kind() {
        assert_eq!(AnswerContent::single(4).preview(10), "Option ID: 4");
        assert_eq!(
            AnswerContent::SingleChoice {
                selected_option_id: None
            }
            .preview(10),
            "No answer"
        );
        assert_eq!(AnswerContent::multiple([3, 1]).preview(10), "Selected option IDs: 1, 3");
        assert_eq!(AnswerContent::multiple(Vec::new()).preview(10), "No options selected");
        assert_eq!(AnswerContent::text("ownership rules").preview(9), "ownership...");
    }
}
