//! Wikilink extraction from frontmatter property values.
//!
//! A relation property holds note references written as `[[Note Name]]`.
//! Values arrive either as structured YAML (from [`crate::frontmatter`]) or as
//! the raw text of a single property line, so both shapes are accepted here.
//!
//! # Examples
//!
//! ```
//! use reciprocal_core::wikilink::{extract_from_str, link_target};
//!
//! let names = extract_from_str(r#"["[[Summer]]", "plain", "[[Beach|The Beach]]"]"#);
//! assert_eq!(names, vec!["Summer", "Beach|The Beach"]);
//! assert_eq!(link_target("Beach|The Beach"), "Beach");
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

/// Two brackets, the shortest run of anything, two brackets.
static WIKILINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("wikilink pattern is valid"));

/// Extract note names from every `[[...]]` occurrence in `text`, left to right.
///
/// The captured text is returned as written: it may be empty, or contain
/// single brackets and alias pipes. Unterminated `[[` fragments are ignored.
pub fn extract_from_str(text: &str) -> Vec<String> {
    WIKILINK
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Extract note names from a frontmatter property value.
///
/// Strings are scanned directly; sequences are scanned element by element and
/// the results concatenated in order. Anything that is not text (numbers,
/// booleans, mappings, nested sequences, null) contributes nothing.
pub fn extract_wikilinks(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(text)) => extract_from_str(text),
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(extract_from_str)
            .collect(),
        _ => Vec::new(),
    }
}

/// Format a note name as a wikilink reference.
pub fn reference(name: &str) -> String {
    format!("[[{}]]", name)
}

/// The note a link points at, without alias or heading/block suffix.
///
/// `Note|Alias` and `Note#Heading` both resolve to `Note`.
pub fn link_target(name: &str) -> &str {
    let end = name.find(['|', '#']).unwrap_or(name.len());
    name[..end].trim()
}
