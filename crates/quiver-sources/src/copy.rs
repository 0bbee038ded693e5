//! Filtered copy of a scanned skill into the catalog.

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

/// Packaging files at the top of a skill directory that are not part of the skill.
const EXCLUDED_TOP_LEVEL_FILES: &[&str] = &["README.md", "readme.md", "metadata.json"];
const EXCLUDED_DIRS: &[&str] = &["agents", ".git"];
const EXCLUDED_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "tgz"];

fn is_excluded(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if entry.file_type().is_dir() {
        return EXCLUDED_DIRS.contains(&name.as_ref());
    }
    if entry.depth() == 1 && EXCLUDED_TOP_LEVEL_FILES.contains(&name.as_ref()) {
        return true;
    }
    entry.path().extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_ascii_lowercase();
        EXCLUDED_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Replace `dest` with a copy of `src`, minus the excluded files.
/// Symlinks are not followed or copied.
///
/// Returns the number of files copied.
///
/// # Errors
///
/// Returns an IO error if removing `dest` or any copy fails.
pub fn copy_skill(src: &Path, dest: &Path) -> std::io::Result<usize> {
    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::create_dir_all(dest)?;

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e));
    for entry in walker {
        let entry = entry.map_err(std::io::Error::other)?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
