use crate::dto::analysis_dto::{CompletionInfo, ExecutionValidation, LengthStatus};
use crate::dto::grading_dto::ValidationResult;
use crate::models::answer::AnswerContent;
use crate::models::assignment::{
    Assignment, AssignmentDetails, ChoiceOptions, CodingDetails, MultipleChoiceDetails, OpenQuestionDetails,
    SingleChoiceDetails,
};
use crate::models::code_submission::CodeSubmission;
use crate::models::Id;
use std::collections::BTreeSet;

/// Longest accepted source code, in characters.
pub const MAX_CODE_LENGTH: usize = 50_000;

pub const MSG_EMPTY_ANSWER: &str = "Answer cannot be empty";
pub const MSG_KIND_MISMATCH: &str = "Answer does not match assignment kind";

/// Outcome of reading a raw client payload for a given assignment kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    Content(AnswerContent),
    Empty,
    Malformed(String),
}

pub struct ValidationService;

impl ValidationService {
    /// Checks that `content` is a well-formed answer to `assignment`. Never fails; problems are
    /// reported through [`ValidationResult::invalid`].
    pub fn validate(assignment: &Assignment, content: &AnswerContent) -> ValidationResult {
        match (&assignment.details, content) {
            (AssignmentDetails::SingleChoice(details), AnswerContent::SingleChoice { selected_option_id }) => {
                Self::validate_single_choice(details, *selected_option_id)
            }
            (AssignmentDetails::MultipleChoice(details), AnswerContent::MultipleChoice { selected_option_ids }) => {
                Self::validate_multiple_choice(details, selected_option_ids)
            }
            (AssignmentDetails::OpenQuestion(details), AnswerContent::OpenQuestion { answer_text }) => {
                Self::validate_open_question(details, answer_text.as_deref())
            }
            (AssignmentDetails::Coding(_), AnswerContent::Coding(submission)) => {
                Self::validate_code(&submission.source_code)
            }
            _ => ValidationResult::invalid(MSG_KIND_MISMATCH),
        }
    }

    /// Parses and validates the raw string a client submitted.
    pub fn validate_payload(assignment: &Assignment, raw: &str) -> ValidationResult {
        match Self::parse_payload(assignment, raw) {
            ParsedPayload::Content(content) => Self::validate(assignment, &content),
            ParsedPayload::Empty => ValidationResult::invalid(MSG_EMPTY_ANSWER),
            ParsedPayload::Malformed(message) => ValidationResult::invalid(message),
        }
    }

    /// Single choice takes one integer id, multiple choice a comma-separated list of ids. Text kinds
    /// take the payload verbatim.
    pub fn parse_payload(assignment: &Assignment, raw: &str) -> ParsedPayload {
        match &assignment.details {
            AssignmentDetails::SingleChoice(_) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return ParsedPayload::Empty;
                }
                match trimmed.parse::<Id>() {
                    Ok(id) => ParsedPayload::Content(AnswerContent::single(id)),
                    Err(_) => ParsedPayload::Malformed("Answer must be a valid option ID".to_string()),
                }
            }
            AssignmentDetails::MultipleChoice(_) => {
                if raw.trim().is_empty() {
                    return ParsedPayload::Empty;
                }
                let ids: Result<BTreeSet<Id>, _> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|segment| !segment.is_empty())
                    .map(str::parse::<Id>)
                    .collect();
                match ids {
                    Ok(ids) => ParsedPayload::Content(AnswerContent::multiple(ids)),
                    Err(_) => ParsedPayload::Malformed(
                        "Invalid answer format. Use comma-separated option IDs".to_string(),
                    ),
                }
            }
            AssignmentDetails::OpenQuestion(_) => ParsedPayload::Content(AnswerContent::text(raw)),
            AssignmentDetails::Coding(_) => {
                ParsedPayload::Content(AnswerContent::Coding(CodeSubmission::new(raw, "")))
            }
        }
    }

    fn validate_single_choice(details: &SingleChoiceDetails, selected: Option<Id>) -> ValidationResult {
        match selected {
            None => ValidationResult::invalid("No option selected"),
            Some(id) if details.has_option(id) => ValidationResult::valid(),
            Some(_) => ValidationResult::invalid("Invalid option selected"),
        }
    }

    fn validate_multiple_choice(details: &MultipleChoiceDetails, selected: &BTreeSet<Id>) -> ValidationResult {
        if selected.is_empty() {
            return ValidationResult::invalid("At least one option must be selected");
        }
        if selected.iter().all(|id| details.has_option(*id)) {
            ValidationResult::valid()
        } else {
            ValidationResult::invalid("Invalid options selected")
        }
    }

    fn validate_open_question(details: &OpenQuestionDetails, text: Option<&str>) -> ValidationResult {
        let status = Self::length_status(details, text);
        if status.valid {
            return ValidationResult::valid();
        }
        if status.current_length == 0 {
            return ValidationResult::invalid(MSG_EMPTY_ANSWER);
        }
        ValidationResult::invalid(status.message)
    }

    pub fn validate_code(source_code: &str) -> ValidationResult {
        if source_code.trim().is_empty() {
            return ValidationResult::invalid("Code cannot be empty");
        }
        if source_code.chars().count() > MAX_CODE_LENGTH {
            return ValidationResult::invalid("Code is too long (max 50,000 characters)");
        }
        ValidationResult::valid()
    }

    /// Length verdict for an open answer, counted in characters after trimming.
    pub fn length_status(details: &OpenQuestionDetails, text: Option<&str>) -> LengthStatus {
        let trimmed = match text.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return LengthStatus::no_answer(),
        };
        let length = trimmed.chars().count();

        if let Some(min) = details.min_length.filter(|min| length < *min) {
            return LengthStatus::too_short(length, min);
        }
        if let Some(max) = details.max_length.filter(|max| length > *max) {
            return LengthStatus::too_long(length, max);
        }

        LengthStatus {
            min_length: details.min_length,
            max_length: details.max_length,
            remaining_characters: details.max_length.map_or(0, |max| max - length),
            ..LengthStatus::within_limits(length)
        }
    }

    pub fn completion_info(details: &OpenQuestionDetails, text: Option<&str>) -> CompletionInfo {
        let length = text.map_or(0, |t| t.trim().chars().count());
        CompletionInfo::calculate(length, details.min_length)
    }

    pub fn length_requirements(details: &OpenQuestionDetails) -> String {
        details.length_requirements()
    }

    /// Checks a submission's code plus the resources its run consumed against the assignment's limits.
    pub fn validate_execution(
        assignment: &Assignment,
        source_code: &str,
        execution_time_ms: u64,
        memory_used_mb: u64,
    ) -> ExecutionValidation {
        let AssignmentDetails::Coding(details) = &assignment.details else {
            return ExecutionValidation::Invalid(MSG_KIND_MISMATCH.to_string());
        };

        let code = Self::validate_code(source_code);
        if code.has_error() {
            return ExecutionValidation::Invalid(code.error_message().to_string());
        }

        let check = details.check_execution_limits(execution_time_ms, memory_used_mb);
        if check.within_limits {
            return ExecutionValidation::Valid;
        }
        ExecutionValidation::LimitExceeded(limit_exceeded_message(details, execution_time_ms, memory_used_mb))
    }
}

fn limit_exceeded_message(details: &CodingDetails, execution_time_ms: u64, memory_used_mb: u64) -> String {
    let mut parts = Vec::new();
    if let Some(limit) = details.time_limit_ms.filter(|limit| execution_time_ms > *limit) {
        parts.push(format!(
            "Time limit ({}ms) exceeded by {}ms.",
            limit,
            execution_time_ms - limit
        ));
    }
    if let Some(limit) = details.memory_limit_mb.filter(|limit| memory_used_mb > *limit) {
        parts.push(format!(
            "Memory limit ({}MB) exceeded by {}MB.",
            limit,
            memory_used_mb - limit
        ));
    }
    format!("Execution limits exceeded: {}", parts.join(" "))
}
