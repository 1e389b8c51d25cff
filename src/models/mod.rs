pub mod answer;
pub mod assignment;
pub mod assignment_kind;
pub mod choice_option;
pub mod code_submission;
pub mod test_case;

/// Identifier shared by every record the engine sees; client payloads carry ids as integers.
pub type Id = i64;
