//! Preview service producing highlighted views of selected files.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use ratatui::text::Line;

use crate::infra::highlight::{Highlighter, StyledText};

/// Upper bound on lines rendered into a preview pane.
const MAX_LINES: usize = 400;

/// Displayable preview output including metadata for the UI layer.
#[derive(Debug, Clone)]
pub struct PreviewSegment {
    pub path: PathBuf,
    pub lines: Vec<Line<'static>>,
    pub language: Option<String>,
    pub line_count: usize,
    pub truncated: bool,
    pub notice: Option<String>,
}

/// Prepares preview data for the two file panes.
#[derive(Debug, Default)]
pub struct PreviewService {
    highlighter: Highlighter,
}

impl PreviewService {
    pub fn new() -> Self {
        Self { highlighter: Highlighter::new() }
    }

    /// Renders up to [`MAX_LINES`] lines of `path`.
    ///
    /// Binary files produce a notice instead of content; invalid UTF-8 falls
    /// back to unstyled text. A missing or unreadable file is an error the
    /// caller surfaces as a diagnostic pane.
    pub fn render(&self, path: &Path) -> Result<PreviewSegment> {
        if !path.is_file() {
            return Err(anyhow!("not a previewable file: {}", path.display()));
        }

        if is_binary(path)? {
            return Ok(PreviewSegment {
                path: path.to_path_buf(),
                lines: Vec::new(),
                language: None,
                line_count: 0,
                truncated: false,
                notice: Some(format!("binary content not rendered: {}", path.display())),
            });
        }

        let (raw, lossy, truncated) = read_lines(path, MAX_LINES)?;
        let line_count = raw.len();

        let (styled, notice) = if lossy {
            (
                StyledText::plain(&raw),
                Some("rendered without highlighting: invalid UTF-8".to_string()),
            )
        } else {
            (self.highlighter.style_lines(path, &raw), None)
        };

        Ok(PreviewSegment {
            path: path.to_path_buf(),
            lines: styled.lines,
            language: styled.language,
            line_count,
            truncated,
            notice,
        })
    }
}

fn is_binary(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut buf = [0u8; 1024];
    let read = file.read(&mut buf)?;
    Ok(buf[..read].contains(&0))
}

fn read_lines(path: &Path, max_lines: usize) -> Result<(Vec<String>, bool, bool)> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut raw = Vec::new();
    let mut lines = Vec::new();
    let mut lossy = false;

    loop {
        raw.clear();
        let bytes = reader.read_until(b'\n', &mut raw)?;
        if bytes == 0 {
            return Ok((lines, lossy, false));
        }
        if raw.ends_with(b"\n") {
            raw.pop();
            if raw.ends_with(b"\r") {
                raw.pop();
            }
        }
        let text = String::from_utf8_lossy(&raw);
        if matches!(text, Cow::Owned(_)) {
            lossy = true;
        }
        lines.push(text.into_owned());
        if lines.len() == max_lines {
            let mut peek = [0u8; 1];
            let truncated = reader.read(&mut peek)? > 0;
            return Ok((lines, lossy, truncated));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn renders_playbook_with_highlighting() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("site.yml");
        std::fs::write(&file, "---\n- hosts: web\n  become: true\n")?;

        let segment = PreviewService::new().render(&file)?;

        assert_eq!(segment.line_count, 3);
        assert_eq!(segment.language.as_deref(), Some("YAML"));
        assert!(!segment.truncated);
        assert!(segment.notice.is_none());
        Ok(())
    }

    #[test]
    fn long_files_are_truncated_at_the_cap() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("tasks.yml");
        let content = (0..MAX_LINES + 50)
            .map(|i| format!("- task{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&file, content)?;

        let segment = PreviewService::new().render(&file)?;
        assert_eq!(segment.line_count, MAX_LINES);
        assert!(segment.truncated);
        Ok(())
    }

    #[test]
    fn binary_file_yields_notice_without_content() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("blob.yml");
        std::fs::write(&file, [0u8, 159, 146, 150])?;

        let segment = PreviewService::new().render(&file)?;
        assert!(segment.lines.is_empty());
        assert!(segment.notice.as_ref().is_some_and(|n| n.contains("binary")));
        Ok(())
    }

    #[test]
    fn lossy_content_falls_back_to_plain() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("hosts");
        let mut handle = File::create(&file)?;
        handle.write_all(b"web1\xffweb2\n")?;
        drop(handle);

        let segment = PreviewService::new().render(&file)?;
        assert!(segment.language.is_none());
        assert!(segment.notice.as_ref().is_some_and(|n| n.contains("invalid UTF-8")));
        assert_eq!(segment.line_count, 1);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = PreviewService::new().render(Path::new("/nonexistent/site.yml"));
        assert!(result.is_err());
    }
}
