//! Patch-file discovery and deterministic ordering.
//!
//! Candidates live at `<pack-root>/DefPatch/<category>/**/*.patch.xml`;
//! authors may nest subfolders freely. The processing order is the composite
//! key (numeric file-name prefix, case-insensitive full path), which gives
//! authors an explicit load-order lever (`010_base.patch.xml` before
//! `020_overrides.patch.xml`) while staying stable for unprefixed files.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Fixed directory under each content-pack root that is scanned for patches.
pub const PACK_DATA_DIR: &str = "DefPatch";

/// File-name suffix a candidate must carry.
pub const PATCH_FILE_SUFFIX: &str = ".patch.xml";

const MAX_PREFIX_DIGITS: usize = 9;

/// Enumerate and sort every candidate patch file for `category` across all
/// pack roots. I/O errors below a single root are swallowed: that entry is
/// skipped and the rest of the pass continues.
pub fn patch_files(pack_roots: &[PathBuf], category: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in pack_roots {
        let dir = root.join(PACK_DATA_DIR).join(category);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir) {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    log::debug!("skipping unreadable entry under {}: {err}", dir.display());
                    continue;
                }
            };
            if entry.file_type().is_file() && is_patch_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    files
}

fn is_patch_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_ascii_lowercase().ends_with(PATCH_FILE_SUFFIX))
}

/// Composite processing-order key: leading-digit prefix of the file name
/// (files without one sort last), then the full path compared
/// case-insensitively.
pub fn sort_key(path: &Path) -> (u32, String) {
    let prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(u32::MAX, numeric_prefix);
    (prefix, path.to_string_lossy().to_lowercase())
}

/// Leading run of ASCII digits, capped to avoid overflow; `u32::MAX` when the
/// name has none.
fn numeric_prefix(name: &str) -> u32 {
    let mut value: u32 = 0;
    let mut digits = 0;
    for c in name.chars() {
        match c.to_digit(10) {
            Some(d) if digits < MAX_PREFIX_DIGITS => {
                value = value * 10 + d;
                digits += 1;
            }
            _ => break,
        }
    }
    if digits == 0 {
        u32::MAX
    } else {
        value
    }
}

/// `parent-dir/file-name`, the short form used in log lines.
pub(crate) fn short_display(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match path.parent().and_then(Path::file_name) {
        Some(dir) => format!("{}/{file}", dir.to_string_lossy()),
        None => file,
    }
}
