//! Canonical identifier form for free-text diagram labels.

/// Convert a label into its canonical identifier form.
///
/// Lowercases, turns whitespace and `/` into `-`, and collapses runs of `-`
/// into one. Total: empty input yields an empty string.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.trim().chars().flat_map(char::to_lowercase) {
        let mapped = if ch.is_whitespace() || ch == '/' {
            '-'
        } else {
            ch
        };
        if mapped == '-' && out.ends_with('-') {
            continue;
        }
        out.push(mapped);
    }
    out
}
