#[cfg(test)]
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
#[cfg(test)]
use std::path::PathBuf;

/// Creates `dir` and its parents; succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(test)]
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().map_or(false, |ext| ext == extension)
        })
        .collect();

    // Sort alphabetically (works for padded numbers like frame_000001.jpg)
    files.sort();

    Ok(files)
}
