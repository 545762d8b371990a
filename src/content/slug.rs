//! Slug generation

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref SLUG_TAG: Regex = Regex::new(r"\[slug:(.*?)\]").unwrap();
}

/// Lowercase, collapse everything outside `[a-z0-9]` into `-`, trim dashes
pub fn slugify(value: &str) -> String {
    let lower = value.to_lowercase();
    NON_SLUG
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Split a `[slug:custom]` marker out of a card title.
///
/// Returns the custom slug (if any, and non-empty) and the cleaned title.
pub fn extract_slug_tag(title: &str) -> (Option<String>, String) {
    let custom = SLUG_TAG
        .captures(title)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty());
    let cleaned = SLUG_TAG.replace_all(title, "").trim().to_string();
    (custom, cleaned)
}
