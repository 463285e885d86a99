//! Mesh file discovery
//!
//! Directory listings come back in whatever order the platform returns them,
//! so discovery sorts by file name before anything is processed.

use log::debug;
use morphocrate_core::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List the regular files directly inside `dir` whose name ends with
/// `extension`, sorted lexicographically by file name.
///
/// The filter may be given with or without its leading dot (`"vtk"` and
/// `".vtk"` are equivalent) and is matched case-insensitively.
/// Subdirectories are not descended into.
pub fn discover_mesh_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let suffix = normalize_extension(extension)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.ends_with(&suffix) {
            files.push(entry.into_path());
        }
    }

    debug!(
        "Discovered {} '{}' files in {}",
        files.len(),
        suffix,
        dir.display()
    );
    Ok(files)
}

/// The identifier a mesh is reported under: its file name
pub fn mesh_identifier(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn normalize_extension(extension: &str) -> Result<String> {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(Error::Config("extension filter must not be empty".to_string()));
    }
    Ok(format!(".{}", trimmed.to_lowercase()))
}
