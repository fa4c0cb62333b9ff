//! Directory scanning for the selection trees.

use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::{DirEntry, WalkBuilder};

use crate::app::filter;
use crate::domain::model::{FileEntry, SelectionKind};

/// Entries discovered under a root, sorted so parents precede children.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub root: PathBuf,
    pub entries: Vec<FileEntry>,
}

/// Walks `root` and collects the entries visible in a tree of the given kind.
///
/// Excluded directories are pruned rather than descended, so a dotted
/// directory hides its whole subtree. The walk is read-only; unreadable
/// entries are skipped with a warning.
pub fn scan(root: &Path, kind: SelectionKind) -> Result<ScanResult> {
    anyhow::ensure!(root.is_dir(), "scan root is not a directory: {}", root.display());

    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false).follow_links(false);
    builder.filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        filter::admits(&describe(entry), kind)
    });

    let mut entries = Vec::new();
    for result in builder.build() {
        match result {
            Ok(entry) => {
                if entry.depth() == 0 {
                    continue;
                }
                entries.push(describe(&entry));
            }
            Err(err) => tracing::warn!(error = %err, "scan error"),
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ScanResult { root: root.to_path_buf(), entries })
}

fn describe(entry: &DirEntry) -> FileEntry {
    FileEntry {
        path: entry.path().to_path_buf(),
        name: entry.file_name().to_string_lossy().into_owned(),
        is_dir: entry.file_type().is_some_and(|kind| kind.is_dir()),
    }
}
