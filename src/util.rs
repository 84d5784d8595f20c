//! Small text helpers shared by the source and channel adapters.

/// Cut `s` to at most `max` characters, appending `...` when shortened.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}
