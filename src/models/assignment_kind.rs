use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentKind {
    SingleChoice,
    MultipleChoice,
    OpenQuestion,
    Coding,
}

impl AssignmentKind {
    pub const ALL: [AssignmentKind; 4] = [
        AssignmentKind::SingleChoice,
        AssignmentKind::MultipleChoice,
        AssignmentKind::OpenQuestion,
        AssignmentKind::Coding,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            AssignmentKind::SingleChoice => "Single Choice",
            AssignmentKind::MultipleChoice => "Multiple Choice",
            AssignmentKind::OpenQuestion => "Open Question",
            AssignmentKind::Coding => "Coding Assignment",
        }
    }

    pub fn is_auto_gradeable(self) -> bool {
        !self.requires_manual_grading()
    }

    pub fn requires_manual_grading(self) -> bool {
        matches!(self, AssignmentKind::OpenQuestion)
    }

    pub fn supports_attachments(self) -> bool {
        !matches!(self, AssignmentKind::Coding)
    }
}

impl std::fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_flags() {
        let auto: Vec<_> = AssignmentKind::ALL
            .iter()
            .filter(|k| k.is_auto_gradeable())
            .copied()
            .collect();
        assert_eq!(
            auto,
            vec![
                AssignmentKind::SingleChoice,
                AssignmentKind::MultipleChoice,
                AssignmentKind::Coding
            ]
        );
        assert!(AssignmentKind::OpenQuestion.requires_manual_grading());
        assert!(!AssignmentKind::Coding.supports_attachments());
        assert!(AssignmentKind::OpenQuestion.supports_attachments());
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&AssignmentKind::OpenQuestion).unwrap();
        assert_eq!(json, "\"OPEN_QUESTION\"");
    }
}
