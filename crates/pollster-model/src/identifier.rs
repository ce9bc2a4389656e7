//! Identifier grammar for shortnames, data names and option values.
//!
//! Shortnames and data names end up as table and column names, so they must
//! satisfy `^[a-zA-Z][a-zA-Z0-9_]*$`. Multiple-choice option values are
//! suffixed onto a data name and only need `^[a-zA-Z0-9_]*$`.

/// Returns true if `s` is a valid identifier (non-empty, ASCII letter first,
/// then letters, digits or underscores).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns true if `s` is a valid option value suffix (letters, digits or
/// underscores; the empty string passes the grammar, presence is checked
/// separately).
pub fn is_option_value(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_grammar() {
        assert!(is_identifier("weekly"));
        assert!(is_identifier("Q1_b"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("_abc"));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier("dash-ed"));
    }

    #[test]
    fn option_value_grammar() {
        assert!(is_option_value("0"));
        assert!(is_option_value("a_1"));
        assert!(is_option_value(""));
        assert!(!is_option_value("a-b"));
        assert!(!is_option_value("a b"));
    }
}
