//! Preview pane rendering highlighted file content with line numbers.

use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::preview::PreviewSegment;

/// What the pane currently shows. Render failures stay on screen until the
/// next selection replaces them.
#[derive(Debug, Default)]
pub enum PreviewContent {
    #[default]
    Empty,
    Ready(PreviewSegment),
    Failed {
        path: PathBuf,
        detail: String,
    },
}

/// Ratatui component responsible for the preview pane.
#[derive(Debug, Default)]
pub struct Preview;

impl Preview {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        content: &PreviewContent,
        has_focus: bool,
    ) {
        let border_color = if has_focus { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .title(self.title(content))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = match content {
            PreviewContent::Empty => vec![Line::styled(
                "select a file to preview",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )],
            PreviewContent::Ready(segment) => self.segment_lines(segment),
            PreviewContent::Failed { detail, .. } => vec![Line::styled(
                detail.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )],
        };

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn title(&self, content: &PreviewContent) -> String {
        match content {
            PreviewContent::Empty => "Preview".to_string(),
            PreviewContent::Ready(segment) => {
                let language = segment
                    .language
                    .as_deref()
                    .map(|name| format!(", {name}"))
                    .unwrap_or_default();
                format!("{} ({} lines{language})", segment.path.display(), segment.line_count)
            }
            PreviewContent::Failed { path, .. } => format!("{} (preview failed)", path.display()),
        }
    }

    fn segment_lines(&self, segment: &PreviewSegment) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(segment.lines.len() + 2);
        for (idx, line) in segment.lines.iter().enumerate() {
            let prefix = format!("{:>4} │ ", idx + 1);
            let mut spans = vec![Span::styled(prefix, Style::default().fg(Color::DarkGray))];
            spans.extend(line.spans.iter().cloned());
            lines.push(Line::from(spans));
        }

        if let Some(notice) = &segment.notice {
            lines.insert(
                0,
                Line::styled(
                    notice.clone(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
            );
        }

        if segment.truncated {
            lines.push(Line::styled(
                format!("… first {} lines shown", segment.lines.len()),
                Style::default().fg(Color::Yellow),
            ));
        }

        if lines.is_empty() {
            lines.push(Line::styled("(empty file)", Style::default().fg(Color::DarkGray)));
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::infra::highlight::StyledText;

    fn sample_segment() -> PreviewSegment {
        let text = StyledText::plain(&["- hosts: all".to_string(), "  become: true".to_string()]);
        PreviewSegment {
            path: PathBuf::from("/tmp/site/site.yml"),
            lines: text.lines,
            language: Some("YAML".to_string()),
            line_count: 2,
            truncated: false,
            notice: None,
        }
    }

    fn render_to_text(content: &PreviewContent) -> String {
        let backend = TestBackend::new(60, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                Preview.render(frame, area, content, true);
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
    fn ready_segment_shows_numbered_lines_and_language() {
        let text = render_to_text(&PreviewContent::Ready(sample_segment()));
        assert!(text.contains("site.yml (2 lines, YAML)"));
        assert!(text.contains("1 │ - hosts: all"));
        assert!(text.contains("2 │   become: true"));
    }

    #[test]
    fn truncated_segment_carries_a_footer() {
        let mut segment = sample_segment();
        segment.truncated = true;
        let text = render_to_text(&PreviewContent::Ready(segment));
        assert!(text.contains("first 2 lines shown"));
    }

    #[test]
    fn failed_preview_shows_the_detail() {
        let content = PreviewContent::Failed {
            path: PathBuf::from("/tmp/site/does-not-exist.yml"),
            detail: "not a previewable file: /tmp/site/does-not-exist.yml".to_string(),
        };
        let text = render_to_text(&content);
        assert!(text.contains("preview failed"));
        assert!(text.contains("not a previewable file"));
    }

    #[test]
    fn empty_pane_shows_the_placeholder() {
        let text = render_to_text(&PreviewContent::Empty);
        assert!(text.contains("select a file to preview"));
    }
}
