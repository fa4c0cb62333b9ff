//! Console pane showing captured log records, newest at the bottom.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use time::macros::format_description;
use tracing::Level;

use crate::infra::console::LogRecord;

/// Ratatui component responsible for the console pane.
#[derive(Debug, Default)]
pub struct Console;

impl Console {
    /// Renders the record tail. `scroll_back` counts records away from the
    /// newest one.
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        records: &[LogRecord],
        scroll_back: usize,
    ) {
        let mut title = format!("Console · {} records", records.len());
        if scroll_back > 0 {
            title.push_str(" · scrolled");
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if records.is_empty() {
            let placeholder = Paragraph::new("no log records yet").style(
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            );
            frame.render_widget(placeholder, inner);
            return;
        }

        let offset = scroll_back.min(records.len().saturating_sub(1));
        let end = records.len() - offset;
        let start = end.saturating_sub(inner.height as usize);

        let lines: Vec<Line<'static>> = records[start..end].iter().map(record_line).collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn record_line(record: &LogRecord) -> Line<'static> {
    let timestamp = record
        .timestamp
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "--:--:--".to_string());

    Line::from(vec![
        Span::styled(timestamp, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(format!("{:>5}", record.level), level_style(record.level)),
        Span::raw(" "),
        Span::styled(record.target.clone(), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::raw(record.message.clone()),
    ])
}

fn level_style(level: Level) -> Style {
    if level == Level::ERROR {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if level == Level::WARN {
        Style::default().fg(Color::Yellow)
    } else if level == Level::INFO {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Magenta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use time::OffsetDateTime;

    fn record(message: &str) -> LogRecord {
        LogRecord {
            timestamp: OffsetDateTime::UNIX_EPOCH,
            level: Level::INFO,
            target: "app".to_string(),
            message: message.to_string(),
        }
    }

    fn render_to_text(records: &[LogRecord], scroll_back: usize) -> String {
        let backend = TestBackend::new(70, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                Console.render(frame, area, records, scroll_back);
            })
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn records_are_formatted_with_time_level_and_target() {
        let mut warning = record("engine exited with status 2");
        warning.level = Level::WARN;
        warning.target = "engine".to_string();

        let text = render_to_text(&[warning], 0);
        assert!(text.contains("00:00:00"));
        assert!(text.contains("WARN engine engine exited with status 2"));
    }

    #[test]
    fn tail_shows_the_newest_records() {
        let records: Vec<LogRecord> =
            (0..30).map(|i| record(&format!("record {i}"))).collect();

        let text = render_to_text(&records, 0);
        assert!(text.contains("record 29"));
        assert!(!text.contains("record 5 "));
    }

    #[test]
    fn scroll_back_moves_the_window_away_from_the_tail() {
        let records: Vec<LogRecord> =
            (0..30).map(|i| record(&format!("record {i}"))).collect();

        let text = render_to_text(&records, 5);
        assert!(text.contains("record 24"));
        assert!(!text.contains("record 29"));
        assert!(text.contains("scrolled"));
    }

    #[test]
    fn empty_console_shows_the_placeholder() {
        let text = render_to_text(&[], 0);
        assert!(text.contains("no log records yet"));
    }
}
