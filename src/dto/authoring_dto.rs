use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Partial update of the fields every assignment kind shares. Absent fields stay unchanged.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct AssignmentPatch {
    // trimmed; a blank title reads as absent
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,

    /// A blank description clears the current one.
    #[serde(default)]
    pub description: Option<String>,

    #[validate(range(min = 1, message = "Order number must be at least 1"))]
    pub order_number: Option<i32>,

    #[validate(range(min = 1, message = "Points must be positive"))]
    pub points: Option<i32>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct ScoringPatch {
    pub partial_scoring: Option<bool>,
    pub penalty_for_wrong: Option<bool>,
    pub randomize_options: Option<bool>,
}

fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
