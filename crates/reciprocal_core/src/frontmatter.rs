//! Shared frontmatter parsing utilities.
//!
//! Two views of the same block are provided here:
//!
//! - a **raw** view ([`split_block`]) that hands back the exact text slices of
//!   the opening delimiter, the property lines, the closing delimiter and the
//!   body, so the patch engine can rebuild a note without touching anything it
//!   did not mean to change;
//! - a **structured** view ([`parse_or_empty`]) that parses the block with
//!   `serde_yaml` into an ordered map, used for diffing property values.

use indexmap::IndexMap;
use serde_yaml::Value;

use crate::error::Result;

/// The delimiter line that opens and closes a frontmatter block.
pub const DELIMITER: &str = "---";

/// Raw slices of a note that starts with a non-empty frontmatter block.
///
/// Concatenating `open`, `inner`, `"\n"`, `close` and `body` yields the
/// original content byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrontmatter<'a> {
    /// Opening delimiter line, including its line ending.
    pub open: &'a str,
    /// Property lines between the delimiters, without the final line ending.
    pub inner: &'a str,
    /// Closing delimiter line, including its line ending when present.
    pub close: &'a str,
    /// Everything after the closing delimiter.
    pub body: &'a str,
}

impl RawFrontmatter<'_> {
    /// Rebuild a full note around replacement property lines.
    pub fn rebuild(&self, inner: &str) -> String {
        let mut out = String::with_capacity(
            self.open.len() + inner.len() + 1 + self.close.len() + self.body.len(),
        );
        out.push_str(self.open);
        out.push_str(inner);
        out.push('\n');
        out.push_str(self.close);
        out.push_str(self.body);
        out
    }
}

/// Result of parsing a markdown file with frontmatter.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// The parsed frontmatter as an ordered map.
    pub frontmatter: IndexMap<String, Value>,
    /// The body content after the frontmatter.
    pub body: String,
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Split the first line off `text`, returning `(line_with_ending, rest)`.
fn next_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(idx) => text.split_at(idx + 1),
        None => (text, ""),
    }
}

/// Locate a frontmatter block anchored at the start of `content`.
///
/// The block opens with a `---` line and closes at the next `---` line
/// (trailing whitespace tolerated on both). A block with no lines at all
/// between its delimiters is reported as absent; see [`split_empty_block`].
pub fn split_block(content: &str) -> Option<RawFrontmatter<'_>> {
    let (open, rest) = next_line(content);
    if !open.ends_with('\n') || !is_delimiter(open) {
        return None;
    }

    // The block needs at least one line before its closing delimiter.
    let mut offset = 0;
    let mut remaining = rest;
    let mut first = true;
    while !remaining.is_empty() {
        let (line, tail) = next_line(remaining);
        if !first && is_delimiter(line) {
            // `offset` points just past the '\n' that ends the last inner line.
            let inner = &rest[..offset - 1];
            return Some(RawFrontmatter {
                open,
                inner,
                close: line,
                body: tail,
            });
        }
        if !line.ends_with('\n') {
            break;
        }
        first = false;
        offset += line.len();
        remaining = tail;
    }
    None
}

/// If `content` starts with a block that has no lines between its delimiters
/// (`---\n---\n`), return the body that follows it.
pub fn split_empty_block(content: &str) -> Option<&str> {
    let (open, rest) = next_line(content);
    if !open.ends_with('\n') || !is_delimiter(open) {
        return None;
    }
    let (close, body) = next_line(rest);
    is_delimiter(close).then_some(body)
}

/// Parse frontmatter and body, returning empty frontmatter if none exists.
///
/// Never fails for missing or empty frontmatter. Returns an error when the
/// block exists but is not a YAML mapping.
pub fn parse_or_empty(content: &str) -> Result<ParsedFile> {
    let Some(raw) = split_block(content) else {
        let body = split_empty_block(content).unwrap_or(content);
        return Ok(ParsedFile {
            frontmatter: IndexMap::new(),
            body: body.to_string(),
        });
    };

    let frontmatter = if raw.inner.trim().is_empty() {
        IndexMap::new()
    } else {
        // Parse YAML frontmatter into IndexMap to preserve order
        serde_yaml::from_str::<IndexMap<String, Value>>(raw.inner)?
    };

    Ok(ParsedFile {
        frontmatter,
        body: raw.body.to_string(),
    })
}

/// Extract only the body from markdown content, stripping frontmatter.
///
/// If no frontmatter exists, returns the content unchanged.
pub fn extract_body(content: &str) -> &str {
    match split_block(content) {
        Some(raw) => raw.body,
        None => split_empty_block(content).unwrap_or(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_block_slices_round_trip() {
        let content = "---\ntitle: Test\nrelated: \"[[B]]\"\n---\nBody\n";
        let raw = split_block(content).unwrap();
        assert_eq!(raw.open, "---\n");
        assert_eq!(raw.inner, "title: Test\nrelated: \"[[B]]\"");
        assert_eq!(raw.close, "---\n");
        assert_eq!(raw.body, "Body\n");
        assert_eq!(raw.rebuild(raw.inner), content);
    }

    #[test]
    fn test_split_block_closing_at_end_of_content() {
        let raw = split_block("---\ntitle: Test\n---").unwrap();
        assert_eq!(raw.inner, "title: Test");
        assert_eq!(raw.close, "---");
        assert_eq!(raw.body, "");
    }

    #[test]
    fn test_split_block_tolerates_trailing_whitespace_and_crlf() {
        let content = "--- \r\ntitle: Test\r\n---\r\nBody";
        let raw = split_block(content).unwrap();
        assert_eq!(raw.inner, "title: Test\r");
        assert_eq!(raw.body, "Body");
        assert_eq!(raw.rebuild(raw.inner), content);
    }

    #[test]
    fn test_split_block_absent() {
        assert!(split_block("Just body content").is_none());
        assert!(split_block("").is_none());
        assert!(split_block("---\ntitle: never closed\n").is_none());
        assert!(split_block("text\n---\nfoo\n---\n").is_none());
    }

    #[test]
    fn test_empty_block_is_not_a_block() {
        let content = "---\n---\nContent";
        assert!(split_block(content).is_none());
        assert_eq!(split_empty_block(content), Some("Content"));
        assert_eq!(split_empty_block("---\n---"), Some(""));
        assert_eq!(split_empty_block("---\ntitle: x\n---\n"), None);
    }

    #[test]
    fn test_blank_line_block_is_a_block() {
        let raw = split_block("---\n\n---\nBody").unwrap();
        assert_eq!(raw.inner, "");
        assert_eq!(raw.body, "Body");
    }

    #[test]
    fn test_parse_or_empty_valid_frontmatter() {
        let content = "---\ntitle: Test\nrelated: [\"[[A]]\", \"[[B]]\"]\n---\n\nBody content";
        let parsed = parse_or_empty(content).unwrap();
        assert_eq!(
            parsed.frontmatter.get("title").unwrap().as_str().unwrap(),
            "Test"
        );
        assert!(parsed.frontmatter.get("related").unwrap().is_sequence());
        assert_eq!(parsed.body.trim(), "Body content");
    }

    #[test]
    fn test_parse_or_empty_no_frontmatter() {
        let content = "Just body content";
        let parsed = parse_or_empty(content).unwrap();
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_parse_or_empty_empty_block() {
        let parsed = parse_or_empty("---\n---\nBody").unwrap();
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, "Body");
    }

    #[test]
    fn test_parse_or_empty_rejects_broken_yaml() {
        assert!(parse_or_empty("---\nrelated: [\"[[A]]\"\n---\nBody").is_err());
    }

    #[test]
    fn test_extract_body() {
        let content = "---\ntitle: Test\n---\n\nBody content";
        assert_eq!(extract_body(content).trim(), "Body content");
        assert_eq!(extract_body("Just body content"), "Just body content");
    }
}
