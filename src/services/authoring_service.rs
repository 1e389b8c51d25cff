use crate::dto::authoring_dto::{AssignmentPatch, ScoringPatch};
use crate::error::{Error, Result};
use crate::models::assignment::{Assignment, AssignmentDetails};
use crate::models::choice_option::ChoiceOption;
use crate::models::test_case::TestCase;
use crate::models::Id;
use crate::utils::validation::validate;
use std::collections::BTreeSet;

/// Pure authoring updates. Each operation returns a new assignment and re-runs the configuration
/// checks; timestamps are left to the caller.
pub struct AuthoringService;

impl AuthoringService {
    pub fn apply_patch(assignment: &Assignment, patch: &AssignmentPatch) -> Result<Assignment> {
        validate(patch)?;

        let mut updated = assignment.clone();
        if let Some(title) = &patch.title {
            updated.title = title.clone();
        }
        if let Some(description) = &patch.description {
            updated.description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
        }
        if let Some(order_number) = patch.order_number {
            updated.order_number = order_number;
        }
        if let Some(points) = patch.points {
            updated.points = points;
        }
        checked(updated)
    }

    pub fn update_scoring(assignment: &Assignment, patch: ScoringPatch) -> Result<Assignment> {
        let mut updated = assignment.clone();
        match &mut updated.details {
            AssignmentDetails::MultipleChoice(details) => {
                if let Some(partial) = patch.partial_scoring {
                    details.partial_scoring = partial;
                }
                if let Some(penalty) = patch.penalty_for_wrong {
                    details.penalty_for_wrong = penalty;
                }
                if let Some(randomize) = patch.randomize_options {
                    details.randomize_options = randomize;
                }
            }
            AssignmentDetails::SingleChoice(details)
                if patch.partial_scoring.is_none() && patch.penalty_for_wrong.is_none() =>
            {
                if let Some(randomize) = patch.randomize_options {
                    details.randomize_options = randomize;
                }
            }
            _ => {
                return Err(Error::Configuration(format!(
                    "Scoring options do not apply to {} assignments",
                    assignment.kind().display_name()
                )))
            }
        }
        checked(updated)
    }

    pub fn add_option(assignment: &Assignment, option: ChoiceOption) -> Result<Assignment> {
        let mut updated = assignment.clone();
        let owner = updated.id;
        options_mut(&mut updated)?.push(ChoiceOption {
            assignment_id: owner,
            ..option
        });
        checked(updated)
    }

    pub fn remove_option(assignment: &Assignment, option_id: Id) -> Result<Assignment> {
        let mut updated = assignment.clone();
        let options = options_mut(&mut updated)?;
        let before = options.len();
        options.retain(|o| o.id != option_id);
        if options.len() == before {
            return Err(option_not_found(option_id));
        }
        checked(updated)
    }

    pub fn replace_option(assignment: &Assignment, option_id: Id, option: ChoiceOption) -> Result<Assignment> {
        let mut updated = assignment.clone();
        let owner = updated.id;
        let slot = options_mut(&mut updated)?
            .iter_mut()
            .find(|o| o.id == option_id)
            .ok_or_else(|| option_not_found(option_id))?;
        *slot = ChoiceOption {
            assignment_id: owner,
            ..option
        };
        checked(updated)
    }

    pub fn set_options(assignment: &Assignment, options: Vec<ChoiceOption>) -> Result<Assignment> {
        let mut updated = assignment.clone();
        let owner = updated.id;
        *options_mut(&mut updated)? = options
            .into_iter()
            .map(|o| ChoiceOption {
                assignment_id: owner,
                ..o
            })
            .collect();
        checked(updated)
    }

    pub fn add_test_case(assignment: &Assignment, test_case: TestCase) -> Result<Assignment> {
        let mut updated = assignment.clone();
        test_cases_mut(&mut updated)?.push(test_case);
        checked(updated)
    }

    pub fn remove_test_case(assignment: &Assignment, test_case_id: Id) -> Result<Assignment> {
        let mut updated = assignment.clone();
        let cases = test_cases_mut(&mut updated)?;
        let before = cases.len();
        cases.retain(|tc| tc.id != test_case_id);
        if cases.len() == before {
            return Err(test_case_not_found(test_case_id));
        }
        checked(updated)
    }

    pub fn replace_test_case(assignment: &Assignment, test_case_id: Id, test_case: TestCase) -> Result<Assignment> {
        let mut updated = assignment.clone();
        let slot = test_cases_mut(&mut updated)?
            .iter_mut()
            .find(|tc| tc.id == test_case_id)
            .ok_or_else(|| test_case_not_found(test_case_id))?;
        *slot = test_case;
        checked(updated)
    }

    pub fn add_language(assignment: &Assignment, language: &str) -> Result<Assignment> {
        let mut updated = assignment.clone();
        let language = language.trim();
        if !language.is_empty() {
            languages_mut(&mut updated)?.insert(language.to_string());
        }
        checked(updated)
    }

    pub fn remove_language(assignment: &Assignment, language: &str) -> Result<Assignment> {
        let mut updated = assignment.clone();
        languages_mut(&mut updated)?.remove(language.trim());
        checked(updated)
    }

    pub fn set_languages<'a>(
        assignment: &Assignment,
        languages: impl IntoIterator<Item = &'a str>,
    ) -> Result<Assignment> {
        let mut updated = assignment.clone();
        *languages_mut(&mut updated)? = languages
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        checked(updated)
    }
}

fn checked(assignment: Assignment) -> Result<Assignment> {
    assignment.check_configuration()?;
    Ok(assignment)
}

fn options_mut(assignment: &mut Assignment) -> Result<&mut Vec<ChoiceOption>> {
    let kind = assignment.kind();
    match &mut assignment.details {
        AssignmentDetails::SingleChoice(details) => Ok(&mut details.options),
        AssignmentDetails::MultipleChoice(details) => Ok(&mut details.options),
        _ => Err(Error::Configuration(format!(
            "{} assignments have no options",
            kind.display_name()
        ))),
    }
}

fn test_cases_mut(assignment: &mut Assignment) -> Result<&mut Vec<TestCase>> {
    let kind = assignment.kind();
    match &mut assignment.details {
        AssignmentDetails::Coding(details) => Ok(&mut details.test_cases),
        _ => Err(Error::Configuration(format!(
            "{} assignments have no test cases",
            kind.display_name()
        ))),
    }
}

fn languages_mut(assignment: &mut Assignment) -> Result<&mut BTreeSet<String>> {
    let kind = assignment.kind();
    match &mut assignment.details {
        AssignmentDetails::Coding(details) => Ok(&mut details.allowed_languages),
        _ => Err(Error::Configuration(format!(
            "{} assignments have no programming languages",
            kind.display_name()
        ))),
    }
}

fn option_not_found(option_id: Id) -> Error {
    Error::Configuration(format!("Option {} not found", option_id))
}

fn test_case_not_found(test_case_id: Id) -> Error {
    Error::Configuration(format!("Test case {} not found", test_case_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignment::{MultipleChoiceDetails, SingleChoiceDetails};

    fn multiple_choice() -> Assignment {
        let options = vec![
            ChoiceOption::new(1, "A", true, 1),
            ChoiceOption::new(2, "B", false, 2),
            ChoiceOption::new(3, "C", false, 3),
        ];
        Assignment::new(
            5,
            1,
            "Pick",
            10,
            AssignmentDetails::MultipleChoice(MultipleChoiceDetails::new(options, false, false)),
        )
        .unwrap()
    }

    #[test]
    fn patch_updates_base_fields_without_touching_the_original() {
        let original = multiple_choice();
        let patch = AssignmentPatch {
            title: Some("Pick wisely".to_string()),
            points: Some(20),
            description: Some("  ".to_string()),
            ..Default::default()
        };
        let updated = AuthoringService::apply_patch(&original, &patch).unwrap();
        assert_eq!(updated.title, "Pick wisely");
        assert_eq!(updated.points, 20);
        assert_eq!(updated.description, None);
        assert_eq!(original.points, 10);
    }

    #[test]
    fn patch_rejects_non_positive_points() {
        let patch = AssignmentPatch {
            points: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            AuthoringService::apply_patch(&multiple_choice(), &patch),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn option_updates_keep_invariants() {
        let assignment = multiple_choice();
        let added = AuthoringService::add_option(&assignment, ChoiceOption::new(4, "D", true, 4)).unwrap();
        assert_eq!(added.kind(), assignment.kind());
        match &added.details {
            AssignmentDetails::MultipleChoice(d) => assert_eq!(d.options[3].assignment_id, 5),
            other => panic!("unexpected details {:?}", other),
        }

        let err = AuthoringService::remove_option(&assignment, 1).unwrap_err();
        assert!(err.to_string().contains("at least one correct answer"));

        let err = AuthoringService::replace_option(&assignment, 9, ChoiceOption::new(9, "X", false, 1)).unwrap_err();
        assert!(err.to_string().contains("Option 9 not found"));

        let all_correct = vec![ChoiceOption::new(1, "A", true, 1), ChoiceOption::new(2, "B", true, 2)];
        assert!(AuthoringService::set_options(&assignment, all_correct).is_err());
    }

    #[test]
    fn scoring_flags_only_for_choice_kinds() {
        let updated = AuthoringService::update_scoring(
            &multiple_choice(),
            ScoringPatch {
                partial_scoring: Some(true),
                penalty_for_wrong: Some(true),
                randomize_options: None,
            },
        )
        .unwrap();
        match updated.details {
            AssignmentDetails::MultipleChoice(d) => assert!(d.partial_scoring && d.penalty_for_wrong),
            other => panic!("unexpected details {:?}", other),
        }

        let single = Assignment::new(
            6,
            1,
            "One",
            3,
            AssignmentDetails::SingleChoice(SingleChoiceDetails::new(vec![
                ChoiceOption::new(1, "A", true, 1),
                ChoiceOption::new(2, "B", false, 2),
            ])),
        )
        .unwrap();
        let partial = ScoringPatch {
            partial_scoring: Some(true),
            ..Default::default()
        };
        assert!(AuthoringService::update_scoring(&single, partial).is_err());
    }
}
