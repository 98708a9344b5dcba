//! Single-file commands: `insert`, `remove`, `links`.

use std::path::Path;

use indexmap::IndexSet;
use reciprocal_core::error::{ReciprocalError, Result};
use reciprocal_core::frontmatter;
use reciprocal_core::fs::{FileSystem, RealFileSystem};
use reciprocal_core::patch::{PatchOp, Patched, RemovalPolicy, apply};
use reciprocal_core::wikilink::extract_wikilinks;

use crate::cli::util::load_config;

/// Handle the insert command
/// Returns true on success, false on error
pub fn handle_insert(file: &Path, note: &str, property: &str, dry_run: bool) -> bool {
    let op = PatchOp::Insert { note, property };
    report_patch(run_patch(&RealFileSystem, file, &op, dry_run), file, &op)
}

/// Handle the remove command
/// Returns true on success, false on error
pub fn handle_remove(
    file: &Path,
    note: &str,
    property: &str,
    dry_run: bool,
    keep_empty: bool,
) -> bool {
    let policy = if keep_empty {
        RemovalPolicy::KeepEmptyArray
    } else {
        load_config().removal_policy
    };
    let op = PatchOp::Remove {
        note,
        property,
        policy,
    };
    report_patch(run_patch(&RealFileSystem, file, &op, dry_run), file, &op)
}

/// Apply `op` to `file`, writing the result unless `dry_run`.
fn run_patch<FS: FileSystem>(
    fs: &FS,
    file: &Path,
    op: &PatchOp<'_>,
    dry_run: bool,
) -> Result<Patched> {
    let content = fs
        .read_to_string(file)
        .map_err(|e| ReciprocalError::FileRead {
            path: file.to_path_buf(),
            source: e,
        })?;
    let patched = apply(op, &content)?;

    if let Patched::Changed(new_content) = &patched {
        if dry_run {
            print!("{}", new_content);
        } else {
            fs.write_file(file, new_content)
                .map_err(|e| ReciprocalError::FileWrite {
                    path: file.to_path_buf(),
                    source: e,
                })?;
        }
    }
    Ok(patched)
}

fn report_patch(result: Result<Patched>, file: &Path, op: &PatchOp<'_>) -> bool {
    let (note, property) = op.target();
    match result {
        Ok(Patched::Changed(_)) => {
            let verb = match op {
                PatchOp::Insert { .. } => "Added",
                PatchOp::Remove { .. } => "Removed",
            };
            // Keep stdout clean for --dry-run output.
            eprintln!("✓ {} [[{}]] in '{}' of {}", verb, note, property, file.display());
            true
        }
        Ok(Patched::Unchanged) => {
            eprintln!("✓ {} already up to date", file.display());
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

/// Handle the links command
/// Returns true on success, false on error
pub fn handle_links(file: &Path) -> bool {
    let content = match RealFileSystem.read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("✗ Error reading {}: {}", file.display(), e);
            return false;
        }
    };
    let parsed = match frontmatter::parse_or_empty(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("✗ Front matter of {} does not parse: {}", file.display(), e);
            return false;
        }
    };

    let config = load_config();
    let properties: IndexSet<&str> = config
        .property_pairs
        .iter()
        .flat_map(|pair| [pair.property_a.as_str(), pair.property_b.as_str()])
        .collect();

    for property in properties {
        if let Some(line) = links_line(&parsed, property) {
            println!("{}", line);
        }
    }
    true
}

/// `property: [[A]], [[B]]` for a property that links anywhere.
fn links_line(parsed: &frontmatter::ParsedFile, property: &str) -> Option<String> {
    let links = extract_wikilinks(parsed.frontmatter.get(property));
    if links.is_empty() {
        return None;
    }
    let links: Vec<String> = links.iter().map(|l| format!("[[{}]]", l)).collect();
    Some(format!("{}: {}", property, links.join(", ")))
}
