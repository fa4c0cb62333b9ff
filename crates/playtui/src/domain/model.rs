//! Domain models for tree entries, selections, and execution outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

use super::errors::DispatchError;

/// A filesystem entry as seen by a selection tree. Rebuilt on every scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

/// Which of the two trees an entry or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionKind {
    Inventory,
    Playbook,
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKind::Inventory => f.write_str("inventory"),
            SelectionKind::Playbook => f.write_str("playbook"),
        }
    }
}

/// Emitted when the user activates a file row in a tree. Consumed once by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    pub path: PathBuf,
    pub kind: SelectionKind,
}

/// The pair of chosen files an execution request reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentSelection {
    pub inventory: Option<PathBuf>,
    pub playbook: Option<PathBuf>,
}

impl CurrentSelection {
    pub fn record(&mut self, event: &SelectionEvent) {
        match event.kind {
            SelectionKind::Inventory => self.inventory = Some(event.path.clone()),
            SelectionKind::Playbook => self.playbook = Some(event.path.clone()),
        }
    }

    pub fn chosen(&self, kind: SelectionKind) -> Option<&Path> {
        match kind {
            SelectionKind::Inventory => self.inventory.as_deref(),
            SelectionKind::Playbook => self.playbook.as_deref(),
        }
    }

    /// Both paths, checked to be existing regular files at the moment of the call.
    pub fn validated(&self) -> Result<(&Path, &Path), DispatchError> {
        let inventory = require_file(self.inventory.as_deref(), SelectionKind::Inventory)?;
        let playbook = require_file(self.playbook.as_deref(), SelectionKind::Playbook)?;
        Ok((inventory, playbook))
    }
}

fn require_file(path: Option<&Path>, kind: SelectionKind) -> Result<&Path, DispatchError> {
    let Some(path) = path else {
        return Err(DispatchError::SelectionIncomplete(format!("no {kind} selected")));
    };
    if !path.is_file() {
        return Err(DispatchError::SelectionIncomplete(format!(
            "{kind} is not a regular file: {}",
            path.display()
        )));
    }
    Ok(path)
}

/// Outcome of one engine run. Logged, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub message: String,
}

impl ExecutionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self { succeeded: true, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { succeeded: false, message: message.into() }
    }
}
