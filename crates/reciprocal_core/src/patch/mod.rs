//! Front-matter patch engine.
//!
//! Inserts or removes a single `[[Note]]` reference in one property of a
//! note's raw text. Everything outside the targeted property line is kept as
//! written: other properties, their order and quoting, comments, line endings
//! and the body.
//!
//! The engine is line oriented rather than a YAML round-trip. Before editing,
//! block arrays are folded into inline arrays (see [`crate::normalize`]) so
//! every property occupies exactly one line, and the value on that line is
//! classified as empty, scalar or inline array.
//!
//! # Examples
//!
//! ```
//! use reciprocal_core::patch::{insert_reference, remove_reference};
//!
//! let note = "---\nrelated: \"[[B]]\"\n---\nBody";
//! let added = insert_reference(note, "C", "related");
//! assert_eq!(added, "---\nrelated: [\"[[B]]\", \"[[C]]\"]\n---\nBody");
//!
//! let removed = remove_reference(&added, "B", "related");
//! assert_eq!(removed, "---\nrelated: \"[[C]]\"\n---\nBody");
//! ```

mod insert;
mod remove;
pub mod value;

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ReciprocalError, Result};
use crate::frontmatter::extract_body;
use crate::normalize::{list_item, normalize_block_arrays};
use value::{PropertyValue, split_items, unquote};

/// What to do with a property once its last reference is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Drop the property line entirely.
    #[default]
    RemoveProperty,
    /// Keep the property as an empty inline array: `name: []`.
    KeepEmptyArray,
}

/// A single edit to apply to a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp<'a> {
    /// Add `[[note]]` to `property`.
    Insert {
        /// Name of the note to reference.
        note: &'a str,
        /// Property that should hold the reference.
        property: &'a str,
    },
    /// Remove `[[note]]` from `property`.
    Remove {
        /// Name of the note whose reference is removed.
        note: &'a str,
        /// Property holding the reference.
        property: &'a str,
        /// Behavior when the property ends up empty.
        policy: RemovalPolicy,
    },
}

impl<'a> PatchOp<'a> {
    /// The note and property this edit targets.
    pub fn target(&self) -> (&'a str, &'a str) {
        match *self {
            PatchOp::Insert { note, property } => (note, property),
            PatchOp::Remove { note, property, .. } => (note, property),
        }
    }
}

/// Outcome of a successful patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patched {
    /// The note already had the requested shape.
    Unchanged,
    /// The new note content.
    Changed(String),
}

impl Patched {
    /// Whether the content differs from the input.
    pub fn is_changed(&self) -> bool {
        matches!(self, Patched::Changed(_))
    }

    /// The resulting content, falling back to `original` when unchanged.
    pub fn into_content(self, original: &str) -> String {
        match self {
            Patched::Unchanged => original.to_string(),
            Patched::Changed(content) => content,
        }
    }
}

/// Apply `op` to `content`.
///
/// Any internal failure is reported as [`ReciprocalError::PatchFailed`]
/// instead of producing damaged output: a panic inside the engine, or a result
/// whose body no longer matches the original body.
pub fn apply(op: &PatchOp<'_>, content: &str) -> Result<Patched> {
    let (note, property) = op.target();
    let failed = |reason: String| ReciprocalError::PatchFailed {
        note: note.to_string(),
        property: property.to_string(),
        reason,
    };

    if note.trim().is_empty() || property.trim().is_empty() {
        return Err(failed("note name and property must not be empty".to_string()));
    }

    let patched = catch_unwind(AssertUnwindSafe(|| match *op {
        PatchOp::Insert { note, property } => insert::insert(content, note, property),
        PatchOp::Remove {
            note,
            property,
            policy,
        } => remove::remove(content, note, property, policy),
    }))
    .map_err(|panic| failed(panic_message(panic.as_ref())))?;

    match patched {
        Some(new_content) if new_content != content => {
            if extract_body(&new_content) != extract_body(content) {
                return Err(failed("patched note no longer has the same body".to_string()));
            }
            Ok(Patched::Changed(new_content))
        }
        _ => Ok(Patched::Unchanged),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "internal error".to_string())
}

/// Run `op`, returning the original content if the patch fails.
fn apply_or_keep(op: PatchOp<'_>, content: &str) -> String {
    match apply(&op, content) {
        Ok(patched) => patched.into_content(content),
        Err(e) => {
            log::warn!("{}; leaving note unchanged", e);
            content.to_string()
        }
    }
}

/// Add `[[note]]` to `property`, creating the frontmatter block or the
/// property as needed. Already-present references are left alone.
pub fn insert_reference(content: &str, note: &str, property: &str) -> String {
    apply_or_keep(PatchOp::Insert { note, property }, content)
}

/// Remove `[[note]]` from `property`, dropping the property if it becomes empty.
pub fn remove_reference(content: &str, note: &str, property: &str) -> String {
    remove_reference_with(content, note, property, RemovalPolicy::default())
}

/// Remove `[[note]]` from `property` with an explicit [`RemovalPolicy`].
pub fn remove_reference_with(
    content: &str,
    note: &str,
    property: &str,
    policy: RemovalPolicy,
) -> String {
    apply_or_keep(
        PatchOp::Remove {
            note,
            property,
            policy,
        },
        content,
    )
}

// ============================================================================
// Line helpers shared by insert and remove
// ============================================================================

/// If `line` is `property: value` (after leading whitespace), return the
/// indentation and the trimmed value. The colon is part of the match, so
/// `related` never matches `related-projects:`.
pub(crate) fn match_property<'a>(line: &'a str, property: &str) -> Option<(&'a str, &'a str)> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    let value = trimmed.strip_prefix(property)?.strip_prefix(':')?;
    Some((indent, value.trim()))
}

pub(crate) fn property_line(indent: &str, property: &str, value: &str) -> String {
    format!("{}{}: {}", indent, property, value)
}

/// The `\r` a CRLF line keeps after splitting on `\n`.
pub(crate) fn line_ending(line: &str) -> &'static str {
    if line.ends_with('\r') { "\r" } else { "" }
}

/// Normalize block arrays, then fold list lines left dangling under a
/// `property` line that already has a value.
pub(crate) fn prepare_lines(inner: &str, property: &str) -> Vec<String> {
    let normalized = normalize_block_arrays(inner);
    let lines: Vec<&str> = normalized.split('\n').collect();
    let mut out = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if let Some((indent, value)) = match_property(line, property)
            && !value.is_empty()
        {
            let stray: Vec<&str> = lines[i + 1..].iter().map_while(|l| list_item(l)).collect();
            if !stray.is_empty() {
                let folded = fold_stray_items(indent, property, value, &stray);
                out.push(format!("{}{}", folded, line_ending(line)));
                i += 1 + stray.len();
                continue;
            }
        }
        out.push(line.to_string());
        i += 1;
    }
    out
}

/// `name: value` followed by `- item` lines is not valid YAML; merge both
/// into one inline array, skipping duplicate items.
fn fold_stray_items(indent: &str, property: &str, value: &str, stray: &[&str]) -> String {
    let mut items: Vec<&str> = match PropertyValue::parse(value) {
        PropertyValue::InlineArray(inner) => split_items(inner)
            .into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect(),
        _ => vec![value],
    };
    for item in stray {
        if !items.iter().any(|existing| unquote(existing) == unquote(item)) {
            items.push(item);
        }
    }
    property_line(indent, property, &format!("[{}]", items.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_property_requires_colon() {
        assert_eq!(
            match_property("related: \"[[A]]\"", "related"),
            Some(("", "\"[[A]]\""))
        );
        assert_eq!(match_property("related-projects: x", "related"), None);
        assert_eq!(match_property("  related:", "related"), Some(("  ", "")));
        assert_eq!(match_property("title: related: x", "related"), None);
    }

    #[test]
    fn test_prepare_lines_folds_stray_items() {
        let lines = prepare_lines("Outfits: \"[[Note B]]\"\n  - \"[[Note B]]\"\n  - \"[[Note C]]\"", "Outfits");
        assert_eq!(lines, vec!["Outfits: [\"[[Note B]]\", \"[[Note C]]\"]"]);
    }

    #[test]
    fn test_prepare_lines_leaves_other_properties() {
        let lines = prepare_lines("tags: x\n  - y\nrelated: \"[[A]]\"", "related");
        assert_eq!(lines, vec!["tags: x", "  - y", "related: \"[[A]]\""]);
    }

    #[test]
    fn test_apply_reports_unchanged() {
        let content = "---\nrelated: \"[[A]]\"\n---\nBody";
        let op = PatchOp::Insert {
            note: "A",
            property: "related",
        };
        assert_eq!(apply(&op, content).unwrap(), Patched::Unchanged);
    }

    #[test]
    fn test_apply_rejects_empty_names() {
        let op = PatchOp::Insert {
            note: " ",
            property: "related",
        };
        assert!(matches!(
            apply(&op, "Body"),
            Err(ReciprocalError::PatchFailed { .. })
        ));
        assert_eq!(insert_reference("Body", "", "related"), "Body");
    }

    #[test]
    fn test_apply_reports_changed_content() {
        let op = PatchOp::Remove {
            note: "A",
            property: "related",
            policy: RemovalPolicy::KeepEmptyArray,
        };
        let patched = apply(&op, "---\nrelated: \"[[A]]\"\n---\nBody").unwrap();
        assert!(patched.is_changed());
        assert_eq!(
            patched.into_content(""),
            "---\nrelated: []\n---\nBody"
        );
    }
}
