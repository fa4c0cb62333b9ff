//! The selection tree: one parametrized component backing both panes.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::app::filter;
use crate::app::scan::ScanResult;
use crate::domain::model::{FileEntry, SelectionEvent, SelectionKind};

/// Navigable state for one tree pane.
#[derive(Debug, Clone)]
pub struct SelectionTreeState {
    kind: SelectionKind,
    root_label: String,
    rows: Vec<TreeRow>,
    visible: Vec<usize>,
    cursor: usize,
    expanded: HashSet<String>,
}

#[derive(Debug, Clone)]
struct TreeRow {
    entry: FileEntry,
    rel: String,
    depth: usize,
    parent: Option<usize>,
    has_children: bool,
}

impl SelectionTreeState {
    /// Builds tree state from a scan, expanding top-level directories.
    pub fn from_scan(kind: SelectionKind, result: &ScanResult) -> Self {
        let mut state = Self {
            kind,
            root_label: root_label(&result.root),
            rows: Vec::new(),
            visible: Vec::new(),
            cursor: 0,
            expanded: HashSet::new(),
        };
        state.reload(result);
        state
    }

    /// Replaces the entries after a rescan, resetting cursor and expansion.
    /// Rows only ever hold entries the path filter admits for this kind.
    pub fn reload(&mut self, result: &ScanResult) {
        let entries = filter::visible(&result.entries, self.kind);
        let mut rows: Vec<TreeRow> = Vec::with_capacity(entries.len());
        let mut index_by_rel: HashMap<String, usize> = HashMap::new();

        for entry in entries {
            let rel = relative_label(&result.root, &entry.path);
            let depth = rel.matches('/').count();
            let parent = parent_label(&rel).and_then(|p| index_by_rel.get(&p).copied());

            let index = rows.len();
            rows.push(TreeRow { entry, rel: rel.clone(), depth, parent, has_children: false });
            index_by_rel.insert(rel, index);

            if let Some(parent_index) = parent
                && let Some(parent_row) = rows.get_mut(parent_index)
            {
                parent_row.has_children = true;
            }
        }

        self.expanded.clear();
        for row in &rows {
            if row.depth == 0 && row.entry.is_dir {
                self.expanded.insert(row.rel.clone());
            }
        }

        self.rows = rows;
        self.cursor = 0;
        self.refresh_visible();
    }

    pub fn kind(&self) -> SelectionKind {
        self.kind
    }

    pub fn root_label(&self) -> &str {
        &self.root_label
    }

    /// The entry under the cursor, if any row is visible.
    pub fn selected_entry(&self) -> Option<&FileEntry> {
        self.cursor_index().and_then(|index| self.rows.get(index)).map(|row| &row.entry)
    }

    pub fn select_next(&mut self) {
        if self.cursor + 1 < self.visible.len() {
            self.cursor += 1;
        }
    }

    pub fn select_previous(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Activation: a file row yields the selection event; a directory row
    /// toggles its expansion and never emits.
    pub fn activate(&mut self) -> Option<SelectionEvent> {
        let index = self.cursor_index()?;
        if self.rows[index].entry.is_dir {
            let rel = self.rows[index].rel.clone();
            if !self.expanded.remove(&rel) {
                self.expanded.insert(rel);
            }
            self.refresh_visible();
            return None;
        }
        Some(SelectionEvent { path: self.rows[index].entry.path.clone(), kind: self.kind })
    }

    /// Expands the directory under the cursor, or steps into its first child.
    pub fn expand_or_descend(&mut self) {
        let Some(index) = self.cursor_index() else { return };
        if !self.rows[index].entry.is_dir {
            return;
        }
        let rel = self.rows[index].rel.clone();
        if self.expanded.insert(rel) {
            self.refresh_visible();
        } else if let Some(first_child) = self
            .visible
            .iter()
            .position(|idx| self.rows.get(*idx).and_then(|row| row.parent) == Some(index))
        {
            self.cursor = first_child;
        }
    }

    /// Collapses the directory under the cursor or jumps to its parent row.
    pub fn collapse_or_parent(&mut self) {
        let Some(index) = self.cursor_index() else { return };
        let rel = self.rows[index].rel.clone();
        let parent = self.rows[index].parent;
        if self.rows[index].entry.is_dir && self.expanded.remove(&rel) {
            self.refresh_visible();
        } else if let Some(parent_index) = parent
            && let Some(pos) = self.visible.iter().position(|idx| *idx == parent_index)
        {
            self.cursor = pos;
        }
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    fn cursor_index(&self) -> Option<usize> {
        self.visible.get(self.cursor).copied()
    }

    fn refresh_visible(&mut self) {
        self.visible.clear();
        for index in 0..self.rows.len() {
            if self.ancestors_expanded(index) {
                self.visible.push(index);
            }
        }
        if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len().saturating_sub(1);
        }
    }

    fn ancestors_expanded(&self, mut index: usize) -> bool {
        while let Some(parent_index) = self.rows[index].parent {
            if !self.expanded.contains(&self.rows[parent_index].rel) {
                return false;
            }
            index = parent_index;
        }
        true
    }

    fn iter_visible(&self) -> impl Iterator<Item = (usize, &TreeRow)> + '_ {
        self.visible
            .iter()
            .enumerate()
            .filter_map(|(display_index, row_index)| {
                self.rows.get(*row_index).map(|row| (display_index, row))
            })
    }

    fn selected_display_index(&self) -> Option<usize> {
        if self.visible.is_empty() { None } else { Some(self.cursor) }
    }

    fn is_expanded(&self, rel: &str) -> bool {
        self.expanded.contains(rel)
    }
}

/// Renders one tree pane.
#[derive(Debug, Default)]
pub struct SelectionTree;

impl SelectionTree {
    /// Renders the tree, marking `active` (the path currently chosen for this
    /// tree's kind) when it appears among the rows.
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        state: &SelectionTreeState,
        has_focus: bool,
        active: Option<&Path>,
    ) {
        let title = match state.kind() {
            SelectionKind::Inventory => format!("Inventories · {}", state.root_label()),
            SelectionKind::Playbook => format!("Playbooks · {}", state.root_label()),
        };
        let border_style = if has_focus {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.visible_len() == 0 {
            let placeholder = Paragraph::new("no matching files under this root").style(
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            );
            frame.render_widget(placeholder, inner);
            return;
        }

        let mut items = Vec::with_capacity(state.visible_len());
        for (display_index, row) in state.iter_visible() {
            let mut spans = Vec::new();
            spans.push(Span::raw("  ".repeat(row.depth)));

            if row.entry.is_dir {
                let symbol = if state.is_expanded(&row.rel) {
                    "▾"
                } else if row.has_children {
                    "▸"
                } else {
                    "·"
                };
                spans.push(Span::styled(format!("{symbol} "), Style::default().fg(Color::Yellow)));
            } else {
                spans.push(Span::styled("• ", Style::default().fg(Color::Gray)));
            }

            let mut name_style = Style::default();
            if active.is_some_and(|path| path == row.entry.path.as_path()) {
                name_style = name_style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(row.entry.name.clone(), name_style));

            let mut item = ListItem::new(Line::from(spans));
            if display_index % 2 == 1 {
                item = item.style(Style::default().bg(Color::Rgb(24, 24, 24)));
            }
            items.push(item);
        }

        let mut list_state = ListState::default();
        list_state.select(state.selected_display_index());

        let highlight_style = if has_focus {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Black).bg(Color::Gray).add_modifier(Modifier::BOLD)
        };

        let list = List::new(items).highlight_style(highlight_style).highlight_symbol("▸ ");
        frame.render_stateful_widget(list, inner, &mut list_state);
    }
}

fn root_label(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string())
}

fn relative_label(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn parent_label(rel: &str) -> Option<String> {
    Path::new(rel).parent().and_then(|parent| {
        if parent.as_os_str().is_empty() {
            None
        } else {
            Some(parent.to_string_lossy().to_string())
        }
    })
}
