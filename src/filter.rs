//! Matcher filter generation.
//!
//! Each metric path becomes one line of the form
//! ` - matchers: '{ __n000__="seg0", __n001__="seg1" }'`, asserting the value
//! of every path segment at its depth. Segment values are interpolated as-is;
//! a value containing `"` yields a broken matcher.

use std::collections::HashSet;
use std::io::Write;

const PREFIX: &str = " - matchers: '{ ";
const SUFFIX: &str = " }'";

/// How metric paths are turned into filters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Drop the leaf segment and describe only the containing directories.
    pub skip_leaves: bool,
    /// Keep filters with no clauses instead of dropping them.
    pub keep_empty: bool,
}

/// Convert one relative metric path into a filter line.
///
/// Returns `None` when no segments remain and `keep_empty` is off.
pub fn path_to_filter(path: &str, options: FilterOptions) -> Option<String> {
    let mut segments: Vec<&str> = path.split('/').collect();
    if options.skip_leaves {
        segments.pop();
    } else if let Some(leaf) = segments.pop() {
        // Only the part before the first '.' names the metric.
        segments.push(leaf.split('.').next().unwrap_or(leaf));
    }

    if segments.is_empty() && !options.keep_empty {
        return None;
    }

    let clauses: Vec<String> = segments
        .iter()
        .enumerate()
        .map(|(i, value)| format!("__n{i:03}__=\"{value}\""))
        .collect();
    Some(format!("{PREFIX}{}{SUFFIX}", clauses.join(", ")))
}

/// Build the deduplicated filter list for `paths`, in first-seen order.
pub fn accumulate_filters<I, S>(paths: I, options: FilterOptions) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut filters = Vec::new();
    let mut dropped = 0u64;

    for path in paths {
        let path = path.as_ref();
        let Some(filter) = path_to_filter(path, options) else {
            tracing::warn!(path, "metric path leaves no segments, dropping empty filter");
            dropped += 1;
            continue;
        };
        if seen.insert(filter.clone()) {
            filters.push(filter);
        }
    }

    tracing::debug!(unique = filters.len(), dropped, "filters accumulated");
    filters
}

/// Write each filter on its own line.
pub fn write_filters<W: Write>(mut out: W, filters: &[String]) -> std::io::Result<()> {
    for filter in filters {
        writeln!(out, "{filter}")?;
    }
    out.flush()
}
