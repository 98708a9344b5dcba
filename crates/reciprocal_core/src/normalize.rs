//! Block array normalization.
//!
//! Rewrites YAML block arrays inside frontmatter text into inline arrays so the
//! patch engine only ever has to reason about one property per line:
//!
//! ```text
//! outfits:                 outfits: ["[[A]]", "[[B]]"]
//!   - "[[A]]"       ==>
//!   - "[[B]]"
//! ```
//!
//! Items are copied verbatim, keeping whatever quoting they already had.

/// If `trimmed` is a property line with nothing after its colon, return the
/// property name.
fn bare_property_name(trimmed: &str) -> Option<&str> {
    let name = trimmed.strip_suffix(':')?;
    (!name.is_empty() && !name.contains(':')).then_some(name)
}

pub(crate) fn list_item(line: &str) -> Option<&str> {
    line.trim().strip_prefix("- ").map(str::trim)
}

/// Convert every block array in `frontmatter` into a single inline-array line.
///
/// Lines that are not part of a block array pass through unchanged and in
/// order, including property lines with an empty value. Normalizing text that
/// has no block arrays returns it unchanged.
pub fn normalize_block_arrays(frontmatter: &str) -> String {
    let lines: Vec<&str> = frontmatter.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let Some(name) = bare_property_name(line.trim()) else {
            out.push(line.to_string());
            i += 1;
            continue;
        };

        let items: Vec<&str> = lines[i + 1..].iter().map_while(|l| list_item(l)).collect();
        if items.is_empty() {
            out.push(line.to_string());
            i += 1;
        } else {
            let indent = &line[..line.len() - line.trim_start().len()];
            let eol = if line.ends_with('\r') { "\r" } else { "" };
            out.push(format!("{}{}: [{}]{}", indent, name, items.join(", "), eol));
            i += 1 + items.len();
        }
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_array_becomes_inline() {
        let input = "Outfits:\n  - \"[[A]]\"\n  - \"[[B]]\"";
        assert_eq!(normalize_block_arrays(input), "Outfits: [\"[[A]]\", \"[[B]]\"]");
    }

    #[test]
    fn test_surrounding_lines_keep_order() {
        let input = "title: Note\ntags:\n  - one\n  - 'two'\nauthor: Someone";
        assert_eq!(
            normalize_block_arrays(input),
            "title: Note\ntags: [one, 'two']\nauthor: Someone"
        );
    }

    #[test]
    fn test_empty_property_passes_through() {
        let input = "related: \ntitle: x\nother:";
        assert_eq!(normalize_block_arrays(input), input);
    }

    #[test]
    fn test_idempotent_on_inline_content() {
        let input = "related: [\"[[A]]\", \"[[B]]\"]\ntitle: x";
        assert_eq!(normalize_block_arrays(input), input);
        let once = normalize_block_arrays("a:\n  - x\n  - y\nb:\n  - z");
        assert_eq!(normalize_block_arrays(&once), once);
        assert_eq!(once, "a: [x, y]\nb: [z]");
    }

    #[test]
    fn test_scalar_followed_by_stray_items_is_left_alone() {
        let input = "Outfits: \"[[Note B]]\"\n  - \"[[Note B]]\"";
        assert_eq!(normalize_block_arrays(input), input);
    }

    #[test]
    fn test_crlf_line_ending_is_kept() {
        let input = "tags:\r\n  - a\r\n  - b\r\ntitle: x\r";
        assert_eq!(normalize_block_arrays(input), "tags: [a, b]\r\ntitle: x\r");
    }

    #[test]
    fn test_indentation_is_kept() {
        let input = "  nested:\n    - a";
        assert_eq!(normalize_block_arrays(input), "  nested: [a]");
    }

    #[test]
    fn test_dash_without_space_is_not_an_item() {
        let input = "rule:\n  ---";
        assert_eq!(normalize_block_arrays(input), input);
    }
}
