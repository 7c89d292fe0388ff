//! Local token matching, the authoritative filter.

/// Returns true when every token occurs in `text`, case-insensitively.
///
/// An empty token list matches everything. Comparison is done on
/// Unicode-lowercased copies, so "credit card" matches "Credit Card".
#[must_use]
pub fn contains_all(text: &str, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return true;
    }
    let haystack = text.to_lowercase();
    tokens.iter().all(|token| haystack.contains(&token.to_lowercase()))
}
