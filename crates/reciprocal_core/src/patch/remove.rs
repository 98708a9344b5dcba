use std::sync::LazyLock;

use regex::Regex;

use super::value::{
    PropertyValue, is_junk, quote, repair_item, single_link_target,
    split_items, unquote,
};
use super::{RemovalPolicy, line_ending, match_property, prepare_lines, property_line};
use crate::frontmatter::split_block;
use crate::wikilink::reference;

static COMMA_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,(?:\s*,)*\s*").expect("comma pattern is valid"));
static DASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s-(?:\s+-)+\s").expect("dash pattern is valid"));

/// What happens to one property line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Removal {
    /// The note is not referenced here.
    Untouched,
    /// Nothing is left; the policy decides between dropping the line and `[]`.
    Emptied,
    Scalar(String),
    Array(Vec<String>),
    /// Cleaned-up malformed text, written back as is.
    Verbatim(String),
}

impl Removal {
    fn from_items(items: Vec<String>) -> Self {
        match items.len() {
            0 => Removal::Emptied,
            1 => Removal::Scalar(items.into_iter().next().unwrap_or_default()),
            _ => Removal::Array(items),
        }
    }

    /// New value text, or `None` to omit the property line.
    fn into_value(self, policy: RemovalPolicy) -> Option<String> {
        match self {
            Removal::Untouched => None,
            Removal::Emptied => match policy {
                RemovalPolicy::RemoveProperty => None,
                RemovalPolicy::KeepEmptyArray => Some("[]".to_string()),
            },
            Removal::Scalar(item) => Some(quote(&item)),
            Removal::Array(items) => Some(format!(
                "[{}]",
                items.iter().map(|i| quote(i)).collect::<Vec<_>>().join(", ")
            )),
            Removal::Verbatim(text) => Some(text),
        }
    }
}

/// Remove `[[note]]` from every `property` line. Returns `None` when nothing
/// referenced the note.
pub(super) fn remove(
    content: &str,
    note: &str,
    property: &str,
    policy: RemovalPolicy,
) -> Option<String> {
    let raw = split_block(content)?;
    let lines = prepare_lines(raw.inner, property);

    let mut modified = false;
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in &lines {
        let Some((indent, value)) = match_property(line, property) else {
            out.push(line.clone());
            continue;
        };
        match remove_from_value(value, note) {
            Removal::Untouched => out.push(line.clone()),
            removal => {
                modified = true;
                if let Some(value) = removal.into_value(policy) {
                    let updated = property_line(indent, property, &value);
                    out.push(format!("{}{}", updated, line_ending(line)));
                }
            }
        }
    }

    if !modified {
        return None;
    }

    let inner = out.join("\n");
    if inner.trim().is_empty() {
        return Some(format!("---\n---\n{}", raw.body));
    }
    Some(raw.rebuild(&inner))
}

fn remove_from_value(value: &str, note: &str) -> Removal {
    // `[[note]]` contains `note`, so one check covers both spellings.
    if value.is_empty() || !value.contains(note) {
        return Removal::Untouched;
    }

    match PropertyValue::parse(value) {
        PropertyValue::Empty => Removal::Untouched,
        PropertyValue::InlineArray(inner) => remove_from_items(inner, note),
        PropertyValue::Scalar(scalar) if single_link_target(unquote(scalar)) == Some(note) => {
            Removal::Emptied
        }
        PropertyValue::Scalar(scalar) => remove_from_text(scalar, note),
    }
}

fn remove_from_items(inner: &str, note: &str) -> Removal {
    let mut dropped = false;
    let mut survivors = Vec::new();

    for raw in split_items(inner) {
        let item = unquote(raw.trim());
        // A well-formed link is matched by target, so `[[Summer Outfit]]`
        // survives removing `Summer`. Anything else (plain text or an item
        // whose quoting broke) goes as soon as it mentions the name.
        let matches = match single_link_target(item) {
            Some(target) => target == note,
            None => item.contains(note),
        };
        if matches {
            dropped = true;
            continue;
        }
        if let Some(repaired) = repair_item(item) {
            survivors.push(repaired);
        }
    }

    if !dropped {
        return Removal::Untouched;
    }
    Removal::from_items(survivors)
}

fn remove_from_text(text: &str, note: &str) -> Removal {
    let stripped = strip_reference(text, note);
    if stripped == text {
        return Removal::Untouched;
    }

    let residue = clean_residue(&stripped);
    if is_junk(&residue) {
        return Removal::Emptied;
    }

    // Still array-shaped once the reference is gone: re-split and re-quote.
    if residue.starts_with('[') && !residue.starts_with("[[") {
        let inner = residue[1..].strip_suffix(']').unwrap_or(&residue[1..]);
        let items = split_items(inner)
            .into_iter()
            .filter_map(|item| repair_item(unquote(item.trim())))
            .collect();
        return Removal::from_items(items);
    }

    Removal::Verbatim(residue)
}

/// Remove every spelling of `[[note]]` from `text`, including half-written
/// `[[note` and `note]]` fragments.
fn strip_reference(text: &str, note: &str) -> String {
    let reference = reference(note);
    let text = text
        .replace(&quote(&reference), "")
        .replace(&format!("'{}'", reference), "")
        .replace(&reference, "");
    let text = strip_dangling_open(&text, note);
    strip_dangling_close(&text, note)
}

/// Drop `[[note` occurrences that never close. `[[note and more]]` is a
/// different link and stays.
fn strip_dangling_open(text: &str, note: &str) -> String {
    let needle = format!("[[{}", note);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(&needle) {
        let after = &rest[pos + needle.len()..];
        let closes_later = match (after.find("]]"), after.find("[[")) {
            (Some(close), Some(open)) => close < open,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if closes_later {
            out.push_str(&rest[..pos + needle.len()]);
        } else {
            out.push_str(&rest[..pos]);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Drop `note]]` occurrences that were never opened. `[[more and note]]` is
/// a different link and stays.
fn strip_dangling_close(text: &str, note: &str) -> String {
    let needle = format!("{}]]", note);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(&needle) {
        let pos = cursor + found;
        let before = &text[..pos];
        let opened = match (before.rfind("[["), before.rfind("]]")) {
            (Some(open), Some(close)) => open > close,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if opened {
            out.push_str(&text[cursor..pos + needle.len()]);
        } else {
            out.push_str(&text[cursor..pos]);
        }
        cursor = pos + needle.len();
    }
    out.push_str(&text[cursor..]);
    out
}

/// Collapse the whitespace, comma and dash runs a removal leaves behind.
fn clean_residue(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = COMMA_RUN.replace_all(&text, ", ");
    let text = DASH_RUN.replace_all(&text, " - ");
    text.trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_from_value_exact_scalar() {
        assert_eq!(remove_from_value("\"[[Only]]\"", "Only"), Removal::Emptied);
        assert_eq!(remove_from_value("[[Only]]", "Only"), Removal::Emptied);
        assert_eq!(remove_from_value("'[[Only|Alias]]'", "Only"), Removal::Emptied);
    }

    #[test]
    fn test_remove_from_value_not_mentioned() {
        assert_eq!(remove_from_value("\"[[Other]]\"", "Only"), Removal::Untouched);
        assert_eq!(remove_from_value("", "Only"), Removal::Untouched);
    }

    #[test]
    fn test_substring_names_do_not_collide() {
        assert_eq!(
            remove_from_value("\"[[Summer Outfit]]\"", "Summer"),
            Removal::Untouched
        );
        assert_eq!(
            remove_from_value("[\"[[Summer Outfit]]\", \"[[Beach]]\"]", "Summer"),
            Removal::Untouched
        );
        assert_eq!(
            remove_from_value("[\"[[Summer]]\", \"[[Summer Outfit]]\"]", "Summer"),
            Removal::Scalar("[[Summer Outfit]]".to_string())
        );
    }

    #[test]
    fn test_array_shapes() {
        assert_eq!(
            remove_from_value("[\"[[A]]\", \"[[B]]\", \"[[C]]\"]", "B"),
            Removal::Array(vec!["[[A]]".to_string(), "[[C]]".to_string()])
        );
        assert_eq!(
            remove_from_value("[\"[[A]]\", \"[[B]]\"]", "B"),
            Removal::Scalar("[[A]]".to_string())
        );
        assert_eq!(remove_from_value("[\"[[B]]\"]", "B"), Removal::Emptied);
    }

    #[test]
    fn test_damaged_item_mentioning_note_is_dropped() {
        assert_eq!(
            remove_from_value(r#"["[[Summer]]", Winter Outfit", "[[Beach]]"]"#, "Winter Outfit"),
            Removal::Array(vec!["[[Summer]]".to_string(), "[[Beach]]".to_string()])
        );
        assert_eq!(
            remove_from_value(r#"[tag, "Winter Outfit (old)"]"#, "Winter Outfit"),
            Removal::Scalar("tag".to_string())
        );
    }

    #[test]
    fn test_broken_quoting_is_repaired() {
        assert_eq!(
            remove_from_value(
                r#"[""[[Bareen - Cloudy Grey", "Box Fit Light]]""]"#,
                "Bareen - Cloudy Grey"
            ),
            Removal::Scalar("[[Box Fit Light]]".to_string())
        );
    }

    #[test]
    fn test_malformed_text_all_removed() {
        assert_eq!(
            remove_from_value(r#""[[Note B]]" - "[[Note B]]""#, "Note B"),
            Removal::Emptied
        );
    }

    #[test]
    fn test_malformed_text_keeps_residue() {
        assert_eq!(
            remove_from_value(
                r#""[[Note A]]" and some text "[[Note B]]" more text"#,
                "Note B"
            ),
            Removal::Verbatim(r#""[[Note A]]" and some text more text"#.to_string())
        );
    }

    #[test]
    fn test_unclosed_array_is_resplit() {
        assert_eq!(
            remove_from_value(r#"["[[A]]", "[[B]]""#, "B"),
            Removal::Scalar("[[A]]".to_string())
        );
        assert_eq!(
            remove_from_value(r#"["[[A]]", "[[B]]", "[[C]]""#, "B"),
            Removal::Array(vec!["[[A]]".to_string(), "[[C]]".to_string()])
        );
    }

    #[test]
    fn test_dangling_fragments() {
        assert_eq!(strip_dangling_open("x [[Gone\", y", "Gone"), "x \", y");
        assert_eq!(strip_dangling_open("[[Gone Too]]", "Gone"), "[[Gone Too]]");
        assert_eq!(strip_dangling_close("\"Gone]] y", "Gone"), "\" y");
        assert_eq!(strip_dangling_close("[[Not Gone]]", "Gone"), "[[Not Gone]]");
    }

    #[test]
    fn test_clean_residue() {
        assert_eq!(clean_residue("  a ,  , b  "), "a, b");
        assert_eq!(clean_residue(" - - x - - "), "x");
        assert_eq!(clean_residue("a - - b"), "a - b");
    }
}
