//! Short, unique annotator names derived from directory paths.
//!
//! Annotators are known only by the directory their files live in, which is
//! usually far too long to show in a report. The shortest unique tail of
//! each path is used instead: `/data/alice/run1` and `/data/bob/run1` become
//! `alice_run1` and `bob_run1`.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::error::AnnocompareError;
use crate::ir::normalize_dir;

/// Map each directory to its shortest unique path tail.
///
/// For `i = 1, 2, ...` the last `i` segments of every directory are joined
/// with `_`; the first `i` that gives every distinct directory a distinct
/// name wins. Fails with [`AnnocompareError::Configuration`] when even the
/// full paths cannot be told apart (e.g. `a/b_c`, `a_b/c` and `q/c`).
pub fn name_annotators<I, S>(dirs: I) -> Result<BTreeMap<String, String>, AnnocompareError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let dirs: BTreeSet<String> = dirs
        .into_iter()
        .map(|dir| normalize_dir(dir.as_ref()))
        .collect();
    if dirs.is_empty() {
        return Ok(BTreeMap::new());
    }

    let segments: Vec<(&String, Vec<&str>)> = dirs
        .iter()
        .map(|dir| (dir, dir.split('/').collect()))
        .collect();
    let max_depth = segments
        .iter()
        .map(|(_, parts)| parts.len())
        .max()
        .unwrap_or(1);

    for depth in 1..=max_depth {
        let names: BTreeMap<String, String> = segments
            .iter()
            .map(|(dir, parts)| ((*dir).clone(), tail_name(parts, depth)))
            .collect();

        let distinct: BTreeSet<&String> = names.values().collect();
        if distinct.len() == dirs.len() {
            debug!("annotator names use the last {depth} path segment(s)");
            return Ok(names);
        }
    }

    Err(AnnocompareError::Configuration(format!(
        "cannot derive unique annotator names from directories: {}",
        dirs.iter().cloned().collect::<Vec<_>>().join(", ")
    )))
}

fn tail_name(parts: &[&str], depth: usize) -> String {
    let start = parts.len().saturating_sub(depth);
    parts[start..].join("_")
}
