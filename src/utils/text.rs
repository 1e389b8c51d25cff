//! Text helpers shared by open-question validation and scoring.

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Trims and, unless `case_sensitive`, lowercases `text` so two answers can be compared verbatim.
pub fn normalize(text: &str, case_sensitive: bool) -> String {
    let trimmed = text.trim();
    if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Number of `sample` words that occur anywhere in `student`.
///
/// Every sample word (repeats included) that appears at least once in the student's words scores one
/// match. Word order is ignored.
pub fn matching_words(sample: &[&str], student: &[&str]) -> usize {
    sample
        .iter()
        .filter(|sample_word| student.iter().any(|w| w == *sample_word))
        .count()
}

pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}
