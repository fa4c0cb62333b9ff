//! Syntax highlighting built on syntect, rendered straight to ratatui lines.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style as SyntectStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

const THEME: &str = "base16-ocean.dark";

static ASSETS: Lazy<(Arc<SyntaxSet>, Arc<ThemeSet>)> = Lazy::new(|| {
    (
        Arc::new(SyntaxSet::load_defaults_newlines()),
        Arc::new(ThemeSet::load_defaults()),
    )
});

/// Styled text for one previewed file.
#[derive(Debug, Clone)]
pub struct StyledText {
    pub lines: Vec<Line<'static>>,
    pub language: Option<String>,
}

impl StyledText {
    pub fn plain(lines: &[String]) -> Self {
        Self {
            lines: lines.iter().map(|line| Line::from(line.clone())).collect(),
            language: None,
        }
    }
}

/// Highlighter over the bundled syntax and theme sets.
#[derive(Debug, Clone)]
pub struct Highlighter {
    syntax_set: Arc<SyntaxSet>,
    theme_set: Arc<ThemeSet>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        let assets = &*ASSETS;
        Self {
            syntax_set: Arc::clone(&assets.0),
            theme_set: Arc::clone(&assets.1),
        }
    }

    /// Highlights `lines` using the syntax matched from `path`.
    ///
    /// Falls back to unstyled text when no syntax matches or highlighting
    /// fails; the preview never loses content over styling.
    pub fn style_lines(&self, path: &Path, lines: &[String]) -> StyledText {
        let Some(theme) = self.theme_set.themes.get(THEME) else {
            return StyledText::plain(lines);
        };
        let Some(syntax) = self.syntax_for_path(path) else {
            return StyledText::plain(lines);
        };
        let language = syntax.name.clone();

        match self.run_highlight(lines, theme, syntax) {
            Ok(styled) => StyledText {
                lines: styled,
                language: Some(language),
            },
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "highlight failed");
                StyledText::plain(lines)
            }
        }
    }

    fn run_highlight(
        &self,
        lines: &[String],
        theme: &Theme,
        syntax: &SyntaxReference,
    ) -> Result<Vec<Line<'static>>> {
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut styled = Vec::with_capacity(lines.len());
        for line in lines {
            let segments = highlighter.highlight_line(line, &self.syntax_set)?;
            let spans: Vec<Span<'static>> = segments
                .into_iter()
                .map(|(style, text)| Span::styled(text.to_string(), convert_style(style)))
                .collect();
            styled.push(Line::from(spans));
        }
        Ok(styled)
    }

    fn syntax_for_path(&self, path: &Path) -> Option<&SyntaxReference> {
        match self.syntax_set.find_syntax_for_file(path) {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "syntax lookup failed");
                None
            }
        }
    }
}

fn convert_style(style: SyntectStyle) -> Style {
    let mut converted = Style::default();
    let fg = style.foreground;
    if fg.a != 0 {
        converted = converted.fg(Color::Rgb(fg.r, fg.g, fg.b));
    }
    if style.font_style.contains(FontStyle::BOLD) {
        converted = converted.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        converted = converted.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        converted = converted.add_modifier(Modifier::UNDERLINED);
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn bundled_theme_is_present() {
        let highlighter = Highlighter::new();
        assert!(highlighter.theme_set.themes.contains_key(THEME));
    }

    #[test]
    fn yaml_playbook_is_highlighted() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("site.yml");
        fs::write(&file, "---\n- hosts: web\n")?;

        let lines = vec!["---".to_string(), "- hosts: web".to_string()];
        let styled = Highlighter::new().style_lines(&file, &lines);

        assert_eq!(styled.lines.len(), 2);
        assert_eq!(styled.language.as_deref(), Some("YAML"));
        assert!(!styled.lines[1].spans.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_extension_falls_back_to_plain() {
        let lines = vec!["plain".to_string()];
        let styled = Highlighter::new().style_lines(Path::new("README.xyz123"), &lines);
        assert!(styled.language.is_none());
        assert_eq!(styled.lines.len(), 1);
    }
}
