use grading_engine::dto::authoring_dto::AssignmentPatch;
use grading_engine::error::Error;
use grading_engine::models::assignment::{Assignment, AssignmentDetails, CodingDetails};
use grading_engine::models::test_case::TestCase;
use grading_engine::services::authoring_service::AuthoringService;

fn coding() -> Assignment {
    let cases = vec![
        TestCase::new(1, Some("1 2"), Some("3"), true),
        TestCase::new(2, Some("5 5"), Some("10"), false),
    ];
    Assignment::new(
        10,
        3,
        "Add two numbers",
        20,
        AssignmentDetails::Coding(CodingDetails::new(&["rust"], cases)),
    )
    .expect("valid coding assignment")
}

fn coding_details(assignment: &Assignment) -> &CodingDetails {
    match &assignment.details {
        AssignmentDetails::Coding(details) => details,
        other => panic!("expected coding details, got {:?}", other),
    }
}

#[test]
fn test_case_lifecycle() {
    let original = coding();

    let added = AuthoringService::add_test_case(&original, TestCase::new(3, Some("0 0"), Some("0"), false))
        .expect("add test case");
    assert_eq!(coding_details(&added).test_case_count(), 3);
    assert_eq!(coding_details(&original).test_case_count(), 2);

    let replaced = AuthoringService::replace_test_case(&added, 3, TestCase::new(3, Some("1 1"), Some("2"), true))
        .expect("replace test case");
    assert_eq!(coding_details(&replaced).public_test_cases().len(), 2);

    let removed = AuthoringService::remove_test_case(&replaced, 1).expect("remove test case");
    assert!(coding_details(&removed).find_test_case(1).is_none());

    let duplicate = AuthoringService::add_test_case(&original, TestCase::new(2, None, None, false));
    assert!(matches!(duplicate, Err(Error::Configuration(_))));
}

#[test]
fn removing_the_last_test_case_is_rejected() {
    let single = AuthoringService::remove_test_case(&coding(), 1).expect("one case left");
    let err = AuthoringService::remove_test_case(&single, 2).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Configuration error: Coding assignment must have at least one test case"
    );
}

#[test]
fn languages() {
    let assignment = AuthoringService::add_language(&coding(), " python ").expect("add language");
    assert!(coding_details(&assignment).is_language_allowed("python"));

    let assignment = AuthoringService::set_languages(&assignment, ["go", "", "java"]).expect("set languages");
    assert!(!coding_details(&assignment).is_language_allowed("rust"));
    assert_eq!(coding_details(&assignment).allowed_languages.len(), 2);

    let only_go = AuthoringService::remove_language(&assignment, "java").expect("remove language");
    assert!(AuthoringService::remove_language(&only_go, "go").is_err());
}

#[test]
fn patch_from_json() {
    let patch: AssignmentPatch = serde_json::from_str(r#"{"title": "  Sum  ", "order_number": 4}"#).expect("patch");
    let updated = AuthoringService::apply_patch(&coding(), &patch).expect("apply patch");
    assert_eq!(updated.title, "Sum");
    assert_eq!(updated.order_number, 4);
    assert_eq!(updated.points, 20);
}
