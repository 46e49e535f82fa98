//! Shared utilities for the Causeway workspace.
//!
//! Intentionally small: centralised tracing initialisation plus a couple of
//! logging helpers, so every member crate can depend on it without pulling in
//! heavy transitive costs.

pub mod observability;

/// Truncate a string for logging, appending an ellipsis when shortened.
///
/// Useful for large JSON payloads that would otherwise swamp the log file.
/// Cuts on a char boundary so multi-byte text never produces invalid UTF-8.
///
/// ```
/// assert_eq!(causeway_common::to_short_string("hello", 10), "hello");
/// assert_eq!(causeway_common::to_short_string("hello world", 5), "hello...");
/// ```
pub fn to_short_string(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = s[..end].to_string();
    out.push_str("...");
    out
}
