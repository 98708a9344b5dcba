//! Classification and item handling for a single property value.
//!
//! Values are resolved freshly from the text of one property line each time
//! they are needed; nothing here is retained between patches.

use crate::wikilink::link_target;

/// The shape of a property value as written on its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValue<'a> {
    /// Nothing after the colon.
    Empty,
    /// Any single value, quoted or not (including a bare `[[Note]]`).
    Scalar(&'a str),
    /// `[a, b, ...]`; holds the text between the outer brackets.
    InlineArray(&'a str),
}

impl<'a> PropertyValue<'a> {
    /// Classify the value text that follows `name:`.
    pub fn parse(raw: &'a str) -> Self {
        let value = raw.trim();
        if value.is_empty() {
            PropertyValue::Empty
        } else if is_inline_array(value) {
            PropertyValue::InlineArray(&value[1..value.len() - 1])
        } else {
            PropertyValue::Scalar(value)
        }
    }
}

/// `[...]` that is not itself a bare wikilink.
pub fn is_inline_array(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('[') && value.ends_with(']') && !value.starts_with("[[")
}

/// Strip one layer of matching surrounding quotes.
pub fn unquote(item: &str) -> &str {
    for quote in ['"', '\''] {
        if item.len() >= 2
            && let Some(inner) = item
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    item
}

/// Wrap an item in double quotes.
pub fn quote(item: &str) -> String {
    format!("\"{}\"", item)
}

/// If `item` is exactly one well-formed `[[...]]`, the note it points at.
pub fn single_link_target(item: &str) -> Option<&str> {
    let inner = item.strip_prefix("[[")?.strip_suffix("]]")?;
    if inner.contains("[[") || inner.contains("]]") {
        return None;
    }
    Some(link_target(inner))
}

/// Nothing but quotes, whitespace, dashes, brackets and commas.
pub fn is_junk(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '-' | '[' | ']' | ','))
}

/// Split the inside of an inline array into raw (untrimmed) items.
///
/// Commas inside quotes or inside a `[[...]]` do not split. When that strict
/// reading leaves stray quotes or unbalanced brackets in any item, the text
/// is split on every comma instead, which is what recovers entries whose
/// quoting broke in an earlier edit.
pub fn split_items(inner: &str) -> Vec<&str> {
    match split_strict(inner) {
        Some(items) if items.iter().all(|item| is_clean_item(item)) => items,
        _ => inner.split(',').collect(),
    }
}

fn split_strict(inner: &str) -> Option<Vec<&str>> {
    let bytes = inner.as_bytes();
    let mut items = Vec::new();
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' if inner[start..i].trim().is_empty() => quote = Some(b),
                b'[' if bytes.get(i + 1) == Some(&b'[') => {
                    depth += 1;
                    i += 1;
                }
                b']' if depth > 0 && bytes.get(i + 1) == Some(&b']') => {
                    depth -= 1;
                    i += 1;
                }
                b',' if depth == 0 => {
                    items.push(&inner[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }

    if quote.is_some() || depth != 0 {
        return None;
    }
    items.push(&inner[start..]);
    Some(items)
}

fn is_clean_item(raw: &str) -> bool {
    let item = unquote(raw.trim());
    !item.contains('"') && item.matches("[[").count() == item.matches("]]").count()
}

/// Light repair of a surviving array item.
///
/// Strips stray quotes at either end and closes or opens a half wikilink.
/// Returns `None` for items that end up empty.
pub fn repair_item(item: &str) -> Option<String> {
    let trimmed = item.trim().trim_matches(['"', '\'']).trim();
    if trimmed.is_empty() {
        return None;
    }

    let opens = trimmed.contains("[[");
    let closes = trimmed.contains("]]");
    let repaired = match (opens, closes) {
        (true, false) => format!("{}]]", trimmed),
        (false, true) => format!("[[{}", trimmed),
        _ => trimmed.to_string(),
    };
    Some(repaired)
}
