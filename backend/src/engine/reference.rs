//! Resolving pasted references (typically URLs) to opaque identifiers.

use regex::Regex;
use std::sync::OnceLock;

fn id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[-A-Za-z0-9_]{25,}"))
        .as_ref()
        .ok()
}

/// First run of 25 or more URL-safe characters (`[-A-Za-z0-9_]`) in
/// `reference`, or `None` when there is no such run.
///
/// A bare identifier resolves to itself.
pub fn extract_id(reference: &str) -> Option<&str> {
    id_pattern()?.find(reference).map(|m| m.as_str())
}
