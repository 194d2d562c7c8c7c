//! Chart directory discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::manifest::CHARTFILE_NAME;

/// Find every chart directory beneath `root`.
///
/// A chart directory holds a `Chart.yaml`. Charts nested inside another
/// chart (its `charts/` dependencies) and hidden directories are skipped.
/// Results are sorted.
pub fn discover_chart_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "chart root is not a directory"),
        ));
    }

    let mut chart_dirs = Vec::new();
    let mut walker = WalkDir::new(root).follow_links(false).into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, e.into())
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        if entry.depth() > 0 && is_hidden(entry.path()) {
            walker.skip_current_dir();
            continue;
        }

        if entry.path().join(CHARTFILE_NAME).is_file() {
            tracing::debug!("Found chart at {}", entry.path().display());
            chart_dirs.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    chart_dirs.sort();
    Ok(chart_dirs)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}
