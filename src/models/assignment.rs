use crate::dto::analysis_dto::ExecutionLimitCheck;
use crate::error::{Error, Result};
use crate::models::assignment_kind::AssignmentKind;
use crate::models::choice_option::ChoiceOption;
use crate::models::test_case::TestCase;
use crate::models::Id;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use validator::Validate;

/// A gradable question unit within a test.
///
/// Build it through [`Assignment::new`] or deserialization; both run [`Assignment::check_configuration`]
/// so an impossible assignment (no correct option, zero points, ...) never reaches the grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssignmentRecord")]
pub struct Assignment {
    pub id: Id,
    pub test_id: Id,
    pub title: String,
    pub description: Option<String>,
    pub order_number: i32,
    pub points: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: AssignmentDetails,
}

/// Unchecked wire shape of [`Assignment`].
#[derive(Deserialize)]
struct AssignmentRecord {
    id: Id,
    #[serde(default)]
    test_id: Id,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_order_number")]
    order_number: i32,
    points: i32,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    details: AssignmentDetails,
}

fn default_order_number() -> i32 {
    1
}

impl TryFrom<AssignmentRecord> for Assignment {
    type Error = Error;

    fn try_from(record: AssignmentRecord) -> Result<Self> {
        let assignment = Assignment {
            id: record.id,
            test_id: record.test_id,
            title: record.title,
            description: record.description,
            order_number: record.order_number,
            points: record.points,
            created_at: record.created_at,
            updated_at: record.updated_at,
            details: record.details,
        };
        assignment.check_configuration()?;
        Ok(assignment)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentDetails {
    SingleChoice(SingleChoiceDetails),
    MultipleChoice(MultipleChoiceDetails),
    OpenQuestion(OpenQuestionDetails),
    Coding(CodingDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleChoiceDetails {
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub randomize_options: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceDetails {
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub partial_scoring: bool,
    #[serde(default)]
    pub penalty_for_wrong: bool,
    #[serde(default)]
    pub randomize_options: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpenQuestionDetails {
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub sample_answer: Option<String>,
    #[serde(default)]
    pub grading_rubric: Option<String>,
    #[serde(default)]
    pub allow_html: bool,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingDetails {
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
    #[serde(default)]
    pub memory_limit_mb: Option<u64>,
    #[serde(default)]
    pub allowed_languages: BTreeSet<String>,
    #[serde(default)]
    pub starter_code: Option<String>,
    #[serde(default)]
    pub solution_template: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub fn display_name(self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "Easy",
            DifficultyLevel::Medium => "Medium",
            DifficultyLevel::Hard => "Hard",
        }
    }
}

impl Assignment {
    pub fn new(
        id: Id,
        test_id: Id,
        title: impl Into<String>,
        points: i32,
        details: AssignmentDetails,
    ) -> Result<Self> {
        let assignment = Self {
            id,
            test_id,
            title: title.into(),
            description: None,
            order_number: default_order_number(),
            points,
            created_at: None,
            updated_at: None,
            details,
        };
        assignment.check_configuration()?;
        Ok(assignment)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> AssignmentKind {
        self.details.kind()
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn has_valid_points(&self) -> bool {
        self.points > 0
    }

    pub fn is_valid(&self) -> bool {
        self.has_title() && self.has_valid_points()
    }

    pub fn max_score(&self) -> f64 {
        f64::from(self.points)
    }

    pub fn score_percentage(&self, score: f64) -> f64 {
        if self.points <= 0 {
            return 0.0;
        }
        score / self.max_score() * 100.0
    }

    /// Fails with [`Error::Configuration`] when the assignment is in a state a teacher must not persist.
    pub fn check_configuration(&self) -> Result<()> {
        if !self.has_title() {
            return Err(Error::Configuration("Assignment title cannot be empty".to_string()));
        }
        if !self.has_valid_points() {
            return Err(Error::Configuration(format!(
                "Assignment points must be positive, got {}",
                self.points
            )));
        }
        self.details.check_configuration()
    }
}

impl AssignmentDetails {
    pub fn kind(&self) -> AssignmentKind {
        match self {
            AssignmentDetails::SingleChoice(_) => AssignmentKind::SingleChoice,
            AssignmentDetails::MultipleChoice(_) => AssignmentKind::MultipleChoice,
            AssignmentDetails::OpenQuestion(_) => AssignmentKind::OpenQuestion,
            AssignmentDetails::Coding(_) => AssignmentKind::Coding,
        }
    }

    pub fn check_configuration(&self) -> Result<()> {
        match self {
            AssignmentDetails::SingleChoice(d) => d.check_configuration(),
            AssignmentDetails::MultipleChoice(d) => d.check_configuration(),
            AssignmentDetails::OpenQuestion(d) => d.check_configuration(),
            AssignmentDetails::Coding(d) => d.check_configuration(),
        }
    }
}

/// Shared read access to the options of single- and multiple-choice assignments.
pub trait ChoiceOptions {
    fn options(&self) -> &[ChoiceOption];
    fn randomize_options(&self) -> bool;

    fn find_option(&self, option_id: Id) -> Option<&ChoiceOption> {
        self.options().iter().find(|o| o.id == option_id)
    }

    fn has_option(&self, option_id: Id) -> bool {
        self.find_option(option_id).is_some()
    }

    fn correct_options(&self) -> Vec<&ChoiceOption> {
        self.options().iter().filter(|o| o.correct).collect()
    }

    fn incorrect_options(&self) -> Vec<&ChoiceOption> {
        self.options().iter().filter(|o| !o.correct).collect()
    }

    fn correct_count(&self) -> usize {
        self.options().iter().filter(|o| o.correct).count()
    }

    /// Order in which options are shown to a student. Shuffled deterministically from `seed` when
    /// randomization is on, so the same attempt always sees the same order.
    fn delivery_order(&self, seed: u64) -> Vec<&ChoiceOption> {
        let mut ordered: Vec<&ChoiceOption> = self.options().iter().collect();
        ordered.sort_by_key(|o| o.order_number);
        if self.randomize_options() {
            let mut rng = StdRng::seed_from_u64(seed);
            ordered.shuffle(&mut rng);
        }
        ordered
    }
}

fn check_options(options: &[ChoiceOption]) -> Result<()> {
    let mut seen = HashSet::with_capacity(options.len());
    for option in options {
        option
            .validate()
            .map_err(|e| Error::Configuration(format!("Invalid option {}: {}", option.id, e)))?;
        if !seen.insert(option.id) {
            return Err(Error::Configuration(format!("Duplicate option id {}", option.id)));
        }
    }
    Ok(())
}

impl ChoiceOptions for SingleChoiceDetails {
    fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    fn randomize_options(&self) -> bool {
        self.randomize_options
    }
}

impl SingleChoiceDetails {
    pub fn new(options: Vec<ChoiceOption>) -> Self {
        Self {
            options,
            randomize_options: false,
        }
    }

    pub fn correct_option(&self) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.correct)
    }

    pub fn check_configuration(&self) -> Result<()> {
        if self.options.len() < 2 {
            return Err(Error::Configuration(
                "Single choice assignment must have at least 2 options".to_string(),
            ));
        }
        if self.correct_count() != 1 {
            return Err(Error::Configuration(format!(
                "Single choice assignment must have exactly one correct option, found {}",
                self.correct_count()
            )));
        }
        check_options(&self.options)
    }
}

impl ChoiceOptions for MultipleChoiceDetails {
    fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    fn randomize_options(&self) -> bool {
        self.randomize_options
    }
}

impl MultipleChoiceDetails {
    pub fn new(options: Vec<ChoiceOption>, partial_scoring: bool, penalty_for_wrong: bool) -> Self {
        Self {
            options,
            partial_scoring,
            penalty_for_wrong,
            randomize_options: false,
        }
    }

    pub fn check_configuration(&self) -> Result<()> {
        let correct = self.correct_count();
        if correct == 0 {
            return Err(Error::Configuration(
                "Multiple choice assignment must have at least one correct answer".to_string(),
            ));
        }
        if correct >= self.options.len() {
            return Err(Error::Configuration(
                "Multiple choice assignment cannot have all options as correct".to_string(),
            ));
        }
        if self.options.len() < 2 {
            return Err(Error::Configuration(
                "Multiple choice assignment must have at least 2 options".to_string(),
            ));
        }
        check_options(&self.options)
    }
}

impl OpenQuestionDetails {
    pub fn check_configuration(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(Error::Configuration(format!(
                    "Minimum length ({}) cannot exceed maximum length ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }

    /// The configured sample answer, ignoring one that is only whitespace.
    pub fn sample_answer(&self) -> Option<&str> {
        self.sample_answer
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn has_length_restrictions(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some()
    }

    pub fn length_requirements(&self) -> String {
        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) => format!("Between {} and {} characters", min, max),
            (Some(min), None) => format!("At least {} characters", min),
            (None, Some(max)) => format!("At most {} characters", max),
            (None, None) => "No length restrictions".to_string(),
        }
    }

    pub fn is_within_limits(&self, text: Option<&str>) -> bool {
        let Some(text) = text else {
            return self.min_length.unwrap_or(0) == 0;
        };
        let length = text.trim().chars().count();
        self.min_length.map_or(true, |min| length >= min)
            && self.max_length.map_or(true, |max| length <= max)
    }

    /// Characters left before `max_length`; `None` when there is no upper bound.
    pub fn remaining_characters(&self, text: Option<&str>) -> Option<usize> {
        let current = text.map_or(0, |t| t.chars().count());
        self.max_length.map(|max| max.saturating_sub(current))
    }

    pub fn required_characters(&self, text: Option<&str>) -> usize {
        let current = text.map_or(0, |t| t.trim().chars().count());
        self.min_length.map_or(0, |min| min.saturating_sub(current))
    }
}

impl CodingDetails {
    pub fn new(allowed_languages: &[&str], test_cases: Vec<TestCase>) -> Self {
        Self {
            time_limit_ms: None,
            memory_limit_mb: None,
            allowed_languages: allowed_languages.iter().map(|l| l.to_string()).collect(),
            starter_code: None,
            solution_template: None,
            test_cases,
        }
    }

    pub fn check_configuration(&self) -> Result<()> {
        if self.test_cases.is_empty() {
            return Err(Error::Configuration(
                "Coding assignment must have at least one test case".to_string(),
            ));
        }
        if self.allowed_languages.is_empty() {
            return Err(Error::Configuration(
                "At least one programming language must be allowed".to_string(),
            ));
        }
        if self.time_limit_ms == Some(0) {
            return Err(Error::Configuration("Time limit must be positive".to_string()));
        }
        if self.memory_limit_mb == Some(0) {
            return Err(Error::Configuration("Memory limit must be positive".to_string()));
        }
        let mut seen = HashSet::with_capacity(self.test_cases.len());
        for case in &self.test_cases {
            case.validate()
                .map_err(|e| Error::Configuration(format!("Invalid test case {}: {}", case.id, e)))?;
            if !seen.insert(case.id) {
                return Err(Error::Configuration(format!("Duplicate test case id {}", case.id)));
            }
        }
        Ok(())
    }

    pub fn is_language_allowed(&self, language: &str) -> bool {
        self.allowed_languages.contains(language)
    }

    pub fn test_case_count(&self) -> usize {
        self.test_cases.len()
    }

    pub fn find_test_case(&self, test_case_id: Id) -> Option<&TestCase> {
        self.test_cases.iter().find(|tc| tc.id == test_case_id)
    }

    pub fn public_test_cases(&self) -> Vec<&TestCase> {
        self.test_cases.iter().filter(|tc| tc.is_public).collect()
    }

    pub fn hidden_test_cases(&self) -> Vec<&TestCase> {
        self.test_cases.iter().filter(|tc| !tc.is_public).collect()
    }

    pub fn has_time_limit(&self) -> bool {
        self.time_limit_ms.map_or(false, |t| t > 0)
    }

    pub fn has_memory_limit(&self) -> bool {
        self.memory_limit_mb.map_or(false, |m| m > 0)
    }

    pub fn has_starter_code(&self) -> bool {
        self.starter_code
            .as_deref()
            .map_or(false, |c| !c.trim().is_empty())
    }

    pub fn check_execution_limits(&self, execution_time_ms: u64, memory_used_mb: u64) -> ExecutionLimitCheck {
        let time_exceeded = self
            .time_limit_ms
            .filter(|_| self.has_time_limit())
            .map_or(false, |limit| execution_time_ms > limit);
        let memory_exceeded = self
            .memory_limit_mb
            .filter(|_| self.has_memory_limit())
            .map_or(false, |limit| memory_used_mb > limit);

        ExecutionLimitCheck {
            time_exceeded,
            memory_exceeded,
            within_limits: !time_exceeded && !memory_exceeded,
            execution_time_ms,
            memory_used_mb,
            time_limit_ms: self.time_limit_ms,
            memory_limit_mb: self.memory_limit_mb,
        }
    }

    pub fn assess_difficulty(&self) -> DifficultyLevel {
        let factors = [
            self.time_limit_ms.map_or(false, |t| t > 0 && t < 5000),
            self.memory_limit_mb.map_or(false, |m| m > 0 && m < 64),
            self.test_cases.len() > 10,
            self.hidden_test_cases().len() > self.public_test_cases().len(),
        ]
        .iter()
        .filter(|f| **f)
        .count();

        match factors {
            0 | 1 => DifficultyLevel::Easy,
            2 => DifficultyLevel::Medium,
            _ => DifficultyLevel::Hard,
        }
    }
}
