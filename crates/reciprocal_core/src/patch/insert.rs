use super::value::{PropertyValue, quote};
use super::{line_ending, match_property, prepare_lines, property_line};
use crate::frontmatter::{split_block, split_empty_block};
use crate::wikilink::{extract_from_str, link_target, reference};

/// Insert `[[note]]` into `property`. Returns `None` when the reference is
/// already there.
pub(super) fn insert(content: &str, note: &str, property: &str) -> Option<String> {
    let reference = reference(note);
    let new_line = property_line("", property, &quote(&reference));

    let Some(raw) = split_block(content) else {
        let body = split_empty_block(content).unwrap_or(content);
        return Some(format!("---\n{}\n---\n{}", new_line, body));
    };

    let mut lines = prepare_lines(raw.inner, property);
    match lines
        .iter()
        .position(|line| match_property(line, property).is_some())
    {
        Some(idx) => {
            let line = &lines[idx];
            let (indent, value) = match_property(line, property)?;
            let value = insert_into_value(value, note, &reference)?;
            let updated = format!(
                "{}{}",
                property_line(indent, property, &value),
                line_ending(line)
            );
            lines[idx] = updated;
        }
        None if raw.open.ends_with("\r\n") => lines.push(format!("{}\r", new_line)),
        None => lines.push(new_line),
    }

    Some(raw.rebuild(&lines.join("\n")))
}

/// New value text for a property line, or `None` if `note` is already linked.
fn insert_into_value(value: &str, note: &str, reference: &str) -> Option<String> {
    let parsed = PropertyValue::parse(value);
    if parsed == PropertyValue::Empty {
        return Some(quote(reference));
    }

    let present = extract_from_str(value)
        .iter()
        .any(|name| name == note || link_target(name) == note);
    if present {
        return None;
    }

    let updated = match parsed {
        PropertyValue::InlineArray(inner) if inner.trim().is_empty() => {
            format!("[{}]", quote(reference))
        }
        PropertyValue::InlineArray(inner) => format!("[{}, {}]", inner.trim(), quote(reference)),
        // A bare `[[Note]]` is only valid YAML inside quotes.
        PropertyValue::Scalar(scalar) if scalar.starts_with("[[") => {
            format!("[{}, {}]", quote(scalar), quote(reference))
        }
        PropertyValue::Scalar(scalar) => format!("[{}, {}]", scalar, quote(reference)),
        PropertyValue::Empty => quote(reference),
    };
    Some(updated)
}
