//! Visibility rules for the two selection trees.

use std::path::Path;

use crate::domain::model::{FileEntry, SelectionKind};

/// Decides whether a single entry is shown in a tree of the given kind.
///
/// Dotted names are rejected outright; directories are otherwise always kept
/// so the tree stays navigable. Files qualify per kind: inventories are
/// extensionless files or anything with `hosts` in the name, playbooks are
/// YAML files.
pub fn admits(entry: &FileEntry, kind: SelectionKind) -> bool {
    if entry.name.starts_with('.') {
        return false;
    }
    if entry.is_dir {
        return true;
    }
    match kind {
        SelectionKind::Inventory => {
            Path::new(&entry.name).extension().is_none() || entry.name.contains("hosts")
        }
        SelectionKind::Playbook => {
            let lower = entry.name.to_ascii_lowercase();
            lower.ends_with(".yml") || lower.ends_with(".yaml")
        }
    }
}

/// Filters a scanned entry sequence, preserving input order.
pub fn visible(entries: &[FileEntry], kind: SelectionKind) -> Vec<FileEntry> {
    entries.iter().filter(|entry| admits(entry, kind)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(name: &str) -> FileEntry {
        FileEntry { path: PathBuf::from(name), name: name.to_string(), is_dir: false }
    }

    fn dir(name: &str) -> FileEntry {
        FileEntry { path: PathBuf::from(name), name: name.to_string(), is_dir: true }
    }

    #[test]
    fn dotted_names_are_hidden_in_both_modes() {
        for kind in [SelectionKind::Inventory, SelectionKind::Playbook] {
            assert!(!admits(&file(".hidden"), kind));
            assert!(!admits(&dir(".git"), kind));
        }
    }

    #[test]
    fn directories_are_kept_regardless_of_name() {
        for kind in [SelectionKind::Inventory, SelectionKind::Playbook] {
            assert!(admits(&dir("group_vars"), kind));
            assert!(admits(&dir("roles.txt"), kind));
        }
    }

    #[test]
    fn inventory_mode_admits_hosts_like_files() {
        assert!(admits(&file("hosts.ini"), SelectionKind::Inventory));
        assert!(admits(&file("hosts"), SelectionKind::Inventory));
        assert!(admits(&file("production"), SelectionKind::Inventory));
        assert!(!admits(&file("notes.txt"), SelectionKind::Inventory));
    }

    #[test]
    fn playbook_mode_admits_yaml_files_case_insensitively() {
        assert!(admits(&file("site.yml"), SelectionKind::Playbook));
        assert!(admits(&file("SITE.YAML"), SelectionKind::Playbook));
        assert!(!admits(&file("site.txt"), SelectionKind::Playbook));
    }

    #[test]
    fn extension_only_checks_the_final_component() {
        assert!(admits(&file("hosts.production.ini"), SelectionKind::Inventory));
        assert!(!admits(&file("archive.tar.gz"), SelectionKind::Inventory));
        assert!(admits(&file("deploy.v2.yml"), SelectionKind::Playbook));
    }

    #[test]
    fn visible_keeps_admitted_entries_in_input_order() {
        let entries =
            vec![dir("playbooks"), file("notes.txt"), file("site.yml"), file(".lock")];
        let kept = visible(&entries, SelectionKind::Playbook);
        let names: Vec<&str> = kept.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, ["playbooks", "site.yml"]);
    }
}
