//! Application loop for the TUI.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};

use crate::app::dispatch::{ExecutionDispatcher, RunHandle};
use crate::app::preview::PreviewService;
use crate::app::scan;
use crate::domain::model::{CurrentSelection, SelectionEvent, SelectionKind};
use crate::infra::console::ConsoleBuffer;
use crate::ui::components::console::Console;
use crate::ui::components::preview::{Preview, PreviewContent};
use crate::ui::components::selection_tree::{SelectionTree, SelectionTreeState};

const TICK_RATE: Duration = Duration::from_millis(120);
const CONSOLE_PAGE: usize = 5;

/// Primary entry point for running the interactive TUI.
pub struct UiApp {
    root: PathBuf,
    inventory_tree: SelectionTreeState,
    playbook_tree: SelectionTreeState,
    tree_component: SelectionTree,
    preview_service: PreviewService,
    preview_component: Preview,
    inventory_preview: PreviewContent,
    playbook_preview: PreviewContent,
    console: ConsoleBuffer,
    console_component: Console,
    console_scroll: usize,
    selection: CurrentSelection,
    dispatcher: ExecutionDispatcher,
    active_run: Option<RunHandle>,
    focus: FocusColumn,
    show_trees: bool,
    should_quit: bool,
}

impl UiApp {
    /// Scans the workspace once and assembles the initial state.
    pub fn new(root: PathBuf, console: ConsoleBuffer) -> Result<Self> {
        let inventory_scan = scan::scan(&root, SelectionKind::Inventory)
            .context("failed to scan for inventories")?;
        let playbook_scan =
            scan::scan(&root, SelectionKind::Playbook).context("failed to scan for playbooks")?;

        Ok(Self {
            root,
            inventory_tree: SelectionTreeState::from_scan(
                SelectionKind::Inventory,
                &inventory_scan,
            ),
            playbook_tree: SelectionTreeState::from_scan(SelectionKind::Playbook, &playbook_scan),
            tree_component: SelectionTree,
            preview_service: PreviewService::new(),
            preview_component: Preview,
            inventory_preview: PreviewContent::Empty,
            playbook_preview: PreviewContent::Empty,
            console,
            console_component: Console,
            console_scroll: 0,
            selection: CurrentSelection::default(),
            dispatcher: ExecutionDispatcher::default(),
            active_run: None,
            focus: FocusColumn::Inventories,
            show_trees: true,
            should_quit: false,
        })
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        if let Some(handle) = self.active_run.take() {
            handle.cancel();
        }

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;
            self.tick();

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)? {
                let ev = event::read()?;
                self.handle_event(ev);
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(10), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[0]);

        self.render_column(frame, columns[0], SelectionKind::Inventory);
        self.render_column(frame, columns[1], SelectionKind::Playbook);

        let records = self.console.records();
        self.console_component.render(frame, layout[1], &records, self.console_scroll);

        self.render_status(frame, layout[2]);
    }

    fn render_column(&self, frame: &mut Frame<'_>, area: Rect, kind: SelectionKind) {
        let (tree, preview, focused) = match kind {
            SelectionKind::Inventory => (
                &self.inventory_tree,
                &self.inventory_preview,
                self.focus == FocusColumn::Inventories,
            ),
            SelectionKind::Playbook => (
                &self.playbook_tree,
                &self.playbook_preview,
                self.focus == FocusColumn::Playbooks,
            ),
        };
        let active = self.selection.chosen(kind);

        if self.show_trees {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area);
            self.tree_component.render(frame, rows[0], tree, focused, active);
            self.preview_component.render(frame, rows[1], preview, focused);
        } else {
            self.preview_component.render(frame, area, preview, focused);
        }
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let accent = Style::default().fg(Color::Cyan);
        let mut spans = vec![
            Span::styled("↵", accent),
            Span::raw(" select · "),
            Span::styled("x", accent),
            Span::raw(" execute · "),
            Span::styled("c", accent),
            Span::raw(" cancel · "),
            Span::styled("f", accent),
            Span::raw(" files · "),
            Span::styled("r", accent),
            Span::raw(" rescan · "),
            Span::styled("tab", accent),
            Span::raw(" focus · "),
            Span::styled("q", accent),
            Span::raw(" quit"),
        ];

        if let Some(handle) = &self.active_run {
            spans.push(Span::raw(" · "));
            spans.push(Span::styled(
                format!("engine running {:.0}s", handle.elapsed().as_secs_f64()),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
        }

        let hints = Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::Gray));
        frame.render_widget(hints, area);
    }

    /// Reaps a finished run between input events.
    fn tick(&mut self) {
        let finished = self.active_run.as_ref().and_then(|handle| handle.try_finish());
        if let Some(result) = finished {
            if result.succeeded {
                tracing::info!("{}", result.message);
            } else {
                tracing::error!("{}", result.message);
            }
            self.active_run = None;
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Resize(..) => {}
            Event::Mouse(_) => {}
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('f') => {
                self.show_trees = !self.show_trees;
            }
            KeyCode::Char('x') => {
                self.execute();
            }
            KeyCode::Char('c') => {
                self.cancel_run();
            }
            KeyCode::Char('r') => {
                self.rescan();
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.focused_tree_mut().select_next();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.focused_tree_mut().select_previous();
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.focused_tree_mut().collapse_or_parent();
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.expand_or_activate();
            }
            KeyCode::Enter => {
                self.activate_focused();
            }
            KeyCode::PageUp => {
                let max_back = self.console.len().saturating_sub(1);
                self.console_scroll = (self.console_scroll + CONSOLE_PAGE).min(max_back);
            }
            KeyCode::PageDown => {
                self.console_scroll = self.console_scroll.saturating_sub(CONSOLE_PAGE);
            }
            _ => {}
        }
    }

    fn focused_tree(&self) -> &SelectionTreeState {
        match self.focus {
            FocusColumn::Inventories => &self.inventory_tree,
            FocusColumn::Playbooks => &self.playbook_tree,
        }
    }

    fn focused_tree_mut(&mut self) -> &mut SelectionTreeState {
        match self.focus {
            FocusColumn::Inventories => &mut self.inventory_tree,
            FocusColumn::Playbooks => &mut self.playbook_tree,
        }
    }

    fn expand_or_activate(&mut self) {
        let is_dir = self.focused_tree().selected_entry().map(|entry| entry.is_dir);
        match is_dir {
            Some(true) => self.focused_tree_mut().expand_or_descend(),
            Some(false) => self.activate_focused(),
            None => {}
        }
    }

    fn activate_focused(&mut self) {
        if let Some(event) = self.focused_tree_mut().activate() {
            self.apply_selection(event);
        }
    }

    /// Records the selection and refreshes the matching preview pane. A
    /// preview failure is logged and shown in the pane; the selection itself
    /// always sticks.
    fn apply_selection(&mut self, event: SelectionEvent) {
        tracing::info!(path = %event.path.display(), "selected {}", event.kind);
        self.selection.record(&event);

        let content = match self.preview_service.render(&event.path) {
            Ok(segment) => PreviewContent::Ready(segment),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    path = %event.path.display(),
                    "preview failed"
                );
                PreviewContent::Failed { path: event.path.clone(), detail: format!("{err:#}") }
            }
        };

        match event.kind {
            SelectionKind::Inventory => self.inventory_preview = content,
            SelectionKind::Playbook => self.playbook_preview = content,
        }
    }

    fn execute(&mut self) {
        if self.active_run.is_some() {
            tracing::warn!("an execution is already running");
            return;
        }

        match self.dispatcher.dispatch(&self.selection) {
            Ok(handle) => {
                if let (Some(inventory), Some(playbook)) = (
                    self.selection.chosen(SelectionKind::Inventory),
                    self.selection.chosen(SelectionKind::Playbook),
                ) {
                    tracing::info!(
                        inventory = %inventory.display(),
                        playbook = %playbook.display(),
                        "engine run started"
                    );
                }
                self.active_run = Some(handle);
            }
            Err(err) => {
                tracing::error!(error = %err, "execution rejected");
            }
        }
    }

    fn cancel_run(&mut self) {
        match &self.active_run {
            Some(handle) => {
                handle.cancel();
                tracing::warn!("cancel requested");
            }
            None => {
                tracing::debug!("no run to cancel");
            }
        }
    }

    fn rescan(&mut self) {
        match scan::scan(&self.root, SelectionKind::Inventory) {
            Ok(result) => self.inventory_tree.reload(&result),
            Err(err) => tracing::error!(error = %err, "inventory rescan failed"),
        }
        match scan::scan(&self.root, SelectionKind::Playbook) {
            Ok(result) => self.playbook_tree.reload(&result),
            Err(err) => tracing::error!(error = %err, "playbook rescan failed"),
        }
        tracing::info!(root = %self.root.display(), "workspace rescanned");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusColumn {
    Inventories,
    Playbooks,
}

impl FocusColumn {
    fn next(self) -> Self {
        match self {
            FocusColumn::Inventories => FocusColumn::Playbooks,
            FocusColumn::Playbooks => FocusColumn::Inventories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("inventories")).expect("mkdir");
        fs::write(dir.path().join("inventories/hosts"), "[web]\nlocalhost\n").expect("hosts");
        fs::write(dir.path().join("site.yml"), "- hosts: all\n  become: true\n").expect("site");
        dir
    }

    fn app_for(dir: &tempfile::TempDir) -> UiApp {
        UiApp::new(dir.path().to_path_buf(), ConsoleBuffer::new()).expect("app")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn enter_on_a_file_records_the_selection_and_loads_a_preview() {
        let dir = workspace();
        let mut app = app_for(&dir);

        app.handle_key_event(key(KeyCode::Char('j')));
        app.handle_key_event(key(KeyCode::Enter));

        let chosen =
            app.selection.chosen(SelectionKind::Inventory).expect("inventory recorded");
        assert!(chosen.ends_with("inventories/hosts"));
        assert!(matches!(app.inventory_preview, PreviewContent::Ready(_)));
    }

    #[test]
    fn tab_routes_keys_to_the_playbook_column() {
        let dir = workspace();
        let mut app = app_for(&dir);

        app.handle_key_event(key(KeyCode::Tab));
        app.handle_key_event(key(KeyCode::Char('j')));
        app.handle_key_event(key(KeyCode::Enter));

        let chosen = app.selection.chosen(SelectionKind::Playbook).expect("playbook recorded");
        assert!(chosen.ends_with("site.yml"));
        assert!(app.selection.chosen(SelectionKind::Inventory).is_none());
    }

    #[test]
    fn enter_on_a_directory_never_records_a_selection() {
        let dir = workspace();
        let mut app = app_for(&dir);

        app.handle_key_event(key(KeyCode::Enter));

        assert!(app.selection.chosen(SelectionKind::Inventory).is_none());
        assert!(matches!(app.inventory_preview, PreviewContent::Empty));
    }

    #[test]
    fn execute_without_a_complete_selection_starts_nothing() {
        let dir = workspace();
        let mut app = app_for(&dir);

        app.handle_key_event(key(KeyCode::Char('x')));

        assert!(app.active_run.is_none());
    }

    #[test]
    fn f_toggles_trees_and_q_quits() {
        let dir = workspace();
        let mut app = app_for(&dir);

        assert!(app.show_trees);
        app.handle_key_event(key(KeyCode::Char('f')));
        assert!(!app.show_trees);

        app.handle_key_event(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[cfg(unix)]
    #[test]
    fn execute_with_a_stub_engine_reaps_the_run_on_tick() {
        use std::os::unix::fs::PermissionsExt;

        use crate::app::dispatch::EngineOptions;

        let dir = workspace();
        let stub = dir.path().join("engine.sh");
        fs::write(&stub, "#!/bin/sh\nexit 0\n").expect("stub");
        let mut perms = fs::metadata(&stub).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&stub, perms).expect("chmod");

        let mut app = app_for(&dir);
        let options = EngineOptions {
            program: stub.to_string_lossy().to_string(),
            ..EngineOptions::default()
        };
        app.dispatcher = ExecutionDispatcher::new(options);

        app.handle_key_event(key(KeyCode::Char('j')));
        app.handle_key_event(key(KeyCode::Enter));
        app.handle_key_event(key(KeyCode::Tab));
        app.handle_key_event(key(KeyCode::Char('j')));
        app.handle_key_event(key(KeyCode::Enter));
        app.handle_key_event(key(KeyCode::Char('x')));
        assert!(app.active_run.is_some());

        for _ in 0..100 {
            app.tick();
            if app.active_run.is_none() {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(app.active_run.is_none());
    }

    #[test]
    fn renders_the_full_layout() {
        use ratatui::Terminal;
        use ratatui::backend::TestBackend;

        let dir = workspace();
        let mut app = app_for(&dir);

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|frame| app.render(frame)).expect("draw");
    }
}
