use crate::dto::analysis_dto::{ScoringAnalysis, SelectionAnalysis};
use crate::dto::grading_dto::ScoringBreakdown;
use crate::error::{Error, Result};
use crate::models::answer::AnswerContent;
use crate::models::assignment::{
    Assignment, AssignmentDetails, ChoiceOptions, CodingDetails, MultipleChoiceDetails, OpenQuestionDetails,
    SingleChoiceDetails,
};
use crate::models::assignment_kind::AssignmentKind;
use crate::models::code_submission::TestCaseExecutionResult;
use crate::models::Id;
use crate::services::validation_service::{ParsedPayload, ValidationService};
use crate::utils::text;
use std::collections::{BTreeSet, HashSet};

/// Turns validated answers into points. Every function here is pure and returns a value in
/// `[0, points]`; invalid input scores `0`.
pub struct ScoringService;

impl ScoringService {
    pub fn score(assignment: &Assignment, content: &AnswerContent) -> f64 {
        if ValidationService::validate(assignment, content).has_error() {
            return 0.0;
        }
        let points = assignment.max_score();

        match (&assignment.details, content) {
            (AssignmentDetails::SingleChoice(details), AnswerContent::SingleChoice { selected_option_id }) => {
                selected_option_id.map_or(0.0, |id| Self::single_choice_score(details, id, points))
            }
            (AssignmentDetails::MultipleChoice(details), AnswerContent::MultipleChoice { selected_option_ids }) => {
                Self::multiple_choice_score(details, selected_option_ids, points)
            }
            (AssignmentDetails::OpenQuestion(details), AnswerContent::OpenQuestion { answer_text }) => {
                Self::open_question_score(details, answer_text.as_deref().unwrap_or(""), points)
            }
            (AssignmentDetails::Coding(details), AnswerContent::Coding(submission)) => {
                Self::coding_score(details, &submission.test_case_results, points)
            }
            _ => 0.0,
        }
    }

    pub fn score_payload(assignment: &Assignment, raw: &str) -> f64 {
        match ValidationService::parse_payload(assignment, raw) {
            ParsedPayload::Content(content) => Self::score(assignment, &content),
            ParsedPayload::Empty | ParsedPayload::Malformed(_) => 0.0,
        }
    }

    pub fn single_choice_score(details: &SingleChoiceDetails, selected: Id, points: f64) -> f64 {
        match details.find_option(selected) {
            Some(option) if option.correct => points,
            _ => 0.0,
        }
    }

    /// All-or-nothing unless partial scoring is on. Partial credit is `c / C`, reduced by `w / N` when
    /// wrong picks are penalised, and never below zero.
    pub fn multiple_choice_score(details: &MultipleChoiceDetails, selected: &BTreeSet<Id>, points: f64) -> f64 {
        let tally = SelectionTally::new(details, selected);
        if !details.partial_scoring {
            let exact = tally.wrong == 0 && tally.correct == tally.total_correct;
            return if exact { points } else { 0.0 };
        }
        tally.partial_fraction(details.penalty_for_wrong) * points
    }

    /// Breakdown of a selection under the partial-credit formula, whatever the assignment's own mode.
    pub fn analyze_multiple_choice(
        details: &MultipleChoiceDetails,
        points: f64,
        selected: &BTreeSet<Id>,
    ) -> ScoringAnalysis {
        let tally = SelectionTally::new(details, selected);
        let score = tally.partial_fraction(details.penalty_for_wrong) * points;
        ScoringAnalysis {
            correct_selections: tally.correct,
            wrong_selections: tally.wrong,
            missed_correct: tally.total_correct - tally.correct,
            total_correct: tally.total_correct,
            score,
            max_score: points,
            percentage: if points > 0.0 { score / points * 100.0 } else { 0.0 },
        }
    }

    pub fn analyze_selections(details: &MultipleChoiceDetails, selected: &BTreeSet<Id>) -> SelectionAnalysis {
        let tally = SelectionTally::new(details, selected);
        let missed = tally.total_correct - tally.correct;
        SelectionAnalysis {
            total_selected: tally.correct + tally.wrong,
            correct_selected: tally.correct,
            incorrect_selected: tally.wrong,
            total_correct_available: tally.total_correct,
            missed_correct: missed,
            is_perfect: tally.correct == tally.total_correct && tally.wrong == 0,
            has_errors: tally.wrong > 0 || missed > 0,
        }
    }

    /// Word-overlap heuristic against the sample answer; not a semantic judgement.
    ///
    /// Without a sample answer any valid text earns full points and the result is provisional.
    pub fn open_question_score(details: &OpenQuestionDetails, answer_text: &str, points: f64) -> f64 {
        let Some(sample) = details.sample_answer() else {
            return points;
        };

        let student = text::normalize(answer_text, details.case_sensitive);
        let sample = text::normalize(sample, details.case_sensitive);
        if student == sample {
            return points;
        }

        let sample_words: Vec<&str> = sample.split_whitespace().collect();
        let student_words: Vec<&str> = student.split_whitespace().collect();
        if sample_words.is_empty() {
            return 0.0;
        }

        let similarity = text::matching_words(&sample_words, &student_words) as f64 / sample_words.len() as f64;
        similarity * points
    }

    pub fn coding_score(details: &CodingDetails, results: &[TestCaseExecutionResult], points: f64) -> f64 {
        let total = details.test_case_count();
        if total == 0 {
            return 0.0;
        }
        Self::passed_test_cases(details, results) as f64 / total as f64 * points
    }

    /// Distinct configured test cases with a passing result. Unknown ids and repeats are ignored.
    pub fn passed_test_cases(details: &CodingDetails, results: &[TestCaseExecutionResult]) -> usize {
        results
            .iter()
            .filter(|r| r.passed && details.find_test_case(r.test_case_id).is_some())
            .map(|r| r.test_case_id)
            .collect::<HashSet<Id>>()
            .len()
    }

    pub fn score_breakdown(assignment: &Assignment, results: &[TestCaseExecutionResult]) -> Result<ScoringBreakdown> {
        let AssignmentDetails::Coding(details) = &assignment.details else {
            return Err(Error::KindMismatch {
                assignment: assignment.kind(),
                answer: AssignmentKind::Coding,
            });
        };

        let total = details.test_case_count();
        let passed = Self::passed_test_cases(details, results);
        let max_score = assignment.max_score();
        let percentage = if total > 0 {
            passed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Ok(ScoringBreakdown {
            total_test_cases: total,
            passed_test_cases: passed,
            failed_test_cases: total - passed,
            score: Self::coding_score(details, results, max_score),
            max_score,
            percentage,
            is_perfect: passed == total,
        })
    }
}

struct SelectionTally {
    correct: usize,
    wrong: usize,
    total_correct: usize,
    total_options: usize,
}

impl SelectionTally {
    fn new(details: &MultipleChoiceDetails, selected: &BTreeSet<Id>) -> Self {
        let (correct, wrong) = details
            .options
            .iter()
            .filter(|o| selected.contains(&o.id))
            .fold((0, 0), |(c, w), o| if o.correct { (c + 1, w) } else { (c, w + 1) });
        Self {
            correct,
            wrong,
            total_correct: details.correct_count(),
            total_options: details.options.len(),
        }
    }

    fn partial_fraction(&self, penalty_for_wrong: bool) -> f64 {
        if self.total_correct == 0 {
            return 0.0;
        }
        let raw = self.correct as f64 / self.total_correct as f64;
        if !penalty_for_wrong || self.total_options == 0 {
            return raw;
        }
        (raw - self.wrong as f64 / self.total_options as f64).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::choice_option::ChoiceOption;
    use crate::models::code_submission::CodeSubmission;
    use crate::models::test_case::TestCase;

    const EPS: f64 = 1e-9;

    fn mc(partial: bool, penalty: bool) -> MultipleChoiceDetails {
        let options = (1..=5)
            .map(|i| ChoiceOption::new(i, format!("Option {}", i), i <= 2, i as i32))
            .collect();
        MultipleChoiceDetails::new(options, partial, penalty)
    }

    fn ids(values: &[Id]) -> BTreeSet<Id> {
        values.iter().copied().collect()
    }

    #[test]
    fn all_or_nothing_multiple_choice() {
        let details = mc(false, false);
        assert_eq!(ScoringService::multiple_choice_score(&details, &ids(&[1, 2]), 10.0), 10.0);
        assert_eq!(ScoringService::multiple_choice_score(&details, &ids(&[1]), 10.0), 0.0);
        assert_eq!(ScoringService::multiple_choice_score(&details, &ids(&[1, 2, 3]), 10.0), 0.0);
    }

    #[test]
    fn partial_credit_with_and_without_penalty() {
        let score = ScoringService::multiple_choice_score(&mc(true, false), &ids(&[1, 3]), 10.0);
        assert!((score - 5.0).abs() < EPS);

        let score = ScoringService::multiple_choice_score(&mc(true, true), &ids(&[1, 3, 4]), 10.0);
        assert!((score - 1.0).abs() < EPS);
    }

    #[test]
    fn penalty_never_goes_negative() {
        let score = ScoringService::multiple_choice_score(&mc(true, true), &ids(&[3, 4, 5]), 10.0);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn scoring_analysis_counts() {
        let analysis = ScoringService::analyze_multiple_choice(&mc(false, true), 10.0, &ids(&[1, 3, 4]));
        assert_eq!(analysis.correct_selections, 1);
        assert_eq!(analysis.wrong_selections, 2);
        assert_eq!(analysis.missed_correct, 1);
        assert!((analysis.percentage - 10.0).abs() < EPS);
        assert!(analysis.has_errors());

        let selection = ScoringService::analyze_selections(&mc(false, false), &ids(&[1, 2]));
        assert!(selection.is_perfect);
        assert_eq!(selection.completeness(), 100.0);
    }

    #[test]
    fn open_question_similarity() {
        let details = OpenQuestionDetails {
            sample_answer: Some("Ownership moves the value".to_string()),
            ..Default::default()
        };
        assert_eq!(ScoringService::open_question_score(&details, "  ownership MOVES the value ", 8.0), 8.0);
        let partial = ScoringService::open_question_score(&details, "the value is copied", 8.0);
        assert!((partial - 4.0).abs() < EPS);

        let strict = OpenQuestionDetails {
            case_sensitive: true,
            ..details.clone()
        };
        let partial = ScoringService::open_question_score(&strict, "ownership moves the value", 8.0);
        assert!((partial - 6.0).abs() < EPS);

        assert_eq!(
            ScoringService::open_question_score(&OpenQuestionDetails::default(), "anything", 8.0),
            8.0
        );
    }

    #[test]
    fn coding_counts_each_configured_case_once() {
        let cases = (1..=4).map(|i| TestCase::new(i, None, None, false)).collect();
        let details = CodingDetails::new(&["rust"], cases);
        let results = vec![
            TestCaseExecutionResult::passed(1),
            TestCaseExecutionResult::passed(1),
            TestCaseExecutionResult::passed(99),
            TestCaseExecutionResult::failed(2),
        ];
        assert_eq!(ScoringService::passed_test_cases(&details, &results), 1);
        assert!((ScoringService::coding_score(&details, &results, 20.0) - 5.0).abs() < EPS);
    }

    #[test]
    fn invalid_answers_score_zero() {
        let options = vec![
            ChoiceOption::new(1, "A", true, 1),
            ChoiceOption::new(2, "B", false, 2),
        ];
        let assignment = Assignment::new(
            1,
            1,
            "Q",
            10,
            AssignmentDetails::SingleChoice(SingleChoiceDetails::new(options)),
        )
        .unwrap();
        assert_eq!(ScoringService::score(&assignment, &AnswerContent::single(7)), 0.0);
        assert_eq!(ScoringService::score_payload(&assignment, "abc"), 0.0);
        assert_eq!(ScoringService::score_payload(&assignment, "1"), 10.0);
        assert_eq!(
            ScoringService::score(&assignment, &AnswerContent::Coding(CodeSubmission::new("x", "rust"))),
            0.0
        );
        assert!(ScoringService::score_breakdown(&assignment, &[]).is_err());
    }
}
