//! Metric tree discovery.
//!
//! Finds every metric series file under a root directory (or in a prepared
//! file list) and returns its path relative to that root, segments joined by
//! `/` on every platform.

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Counters kept while discovering metric files.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// Files whose name carries the metric suffix.
    pub matched: u64,
    /// Files seen but ignored.
    pub skipped: u64,
}

/// Result of a completed discovery pass.
#[derive(Debug, Default)]
pub struct Walk {
    /// Metric paths relative to the scanned root, in discovery order.
    pub paths: Vec<String>,
    pub stats: WalkStats,
}

/// Errors that abort discovery. No partial results are returned.
#[derive(Debug)]
pub enum WalkError {
    /// The root could not be inspected.
    Root {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The root exists but is not a directory.
    NotADirectory { path: PathBuf },
    /// A directory below the root could not be read.
    Traverse { source: walkdir::Error },
    /// The file list could not be read.
    FileList {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for WalkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalkError::Root { path, source } => {
                write!(f, "cannot read metrics root {}: {}", path.display(), source)
            }
            WalkError::NotADirectory { path } => {
                write!(f, "metrics root {} is not a directory", path.display())
            }
            WalkError::Traverse { source } => write!(f, "error walking metrics tree: {}", source),
            WalkError::FileList { path, source } => {
                write!(f, "failed to read file list {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WalkError::Root { source, .. } => Some(source),
            WalkError::NotADirectory { .. } => None,
            WalkError::Traverse { source } => Some(source),
            WalkError::FileList { source, .. } => Some(source),
        }
    }
}

/// Walk `root` recursively and collect every file whose name ends with `suffix`.
///
/// Symlinked directories are not descended into. Any unreadable directory
/// fails the whole walk.
pub fn walk_metrics(root: &Path, suffix: &str) -> Result<Walk, WalkError> {
    let meta = std::fs::metadata(root).map_err(|source| WalkError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    tracing::info!(root = %root.display(), suffix, "discovering metric files");

    let mut walk = Walk::default();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|source| WalkError::Traverse { source })?;
        let file_type = entry.file_type();
        // A symlink to a directory is listed but never entered.
        if file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir()) {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(suffix) {
            tracing::debug!(file = %entry.path().display(), "skipping file");
            walk.stats.skipped += 1;
            continue;
        }

        match relative_metric_path(root, entry.path()) {
            Some(rel) => {
                walk.paths.push(rel);
                walk.stats.matched += 1;
            }
            None => {
                tracing::warn!(file = %entry.path().display(), "file outside metrics root");
                walk.stats.skipped += 1;
            }
        }
    }

    tracing::info!(
        matched = walk.stats.matched,
        skipped = walk.stats.skipped,
        "metric discovery finished"
    );
    Ok(walk)
}

/// Read metric paths from a newline-separated list instead of walking.
///
/// Each line is made relative to `root` when it starts with it; remaining
/// leading `/` characters are dropped. Blank lines are ignored.
pub fn read_file_list(list: &Path, root: &Path, suffix: &str) -> Result<Walk, WalkError> {
    tracing::info!(file = %list.display(), "reading target files from file");

    let content = std::fs::read_to_string(list).map_err(|source| WalkError::FileList {
        path: list.to_path_buf(),
        source,
    })?;

    let root = root.to_string_lossy();
    let root = root.trim_end_matches('/');
    let mut walk = Walk::default();
    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if !line.ends_with(suffix) {
            tracing::debug!(file = line, "skipping listed file");
            walk.stats.skipped += 1;
            continue;
        }

        let rel = match line.strip_prefix(root) {
            Some(rest) if root.is_empty() || rest.starts_with('/') => rest,
            _ => line,
        };
        let rel = rel.trim_start_matches('/');
        if rel.is_empty() {
            walk.stats.skipped += 1;
            continue;
        }
        walk.paths.push(rel.to_string());
        walk.stats.matched += 1;
    }

    tracing::info!(
        matched = walk.stats.matched,
        skipped = walk.stats.skipped,
        "file list loaded"
    );
    Ok(walk)
}

/// Path of `file` relative to `root`, with normal components joined by `/`.
fn relative_metric_path(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let segments: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
