//! In-memory text buffer the Ex commands operate on.

use std::path::{Path, PathBuf};

use crate::script::error::ExError;

/// A line buffer with a cursor, a modified flag, and an optional file path.
#[derive(Debug, Default, Clone)]
pub struct Editor {
    path: Option<PathBuf>,
    lines: Vec<String>,
    /// 0-based cursor line.
    cursor: usize,
    modified: bool,
    quit_requested: bool,
}

impl Editor {
    /// Load `path`.  A missing file gives an empty buffer bound to `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ExError> {
        let path = path.into();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let mut editor = Self::from_text(&text);
        editor.path = Some(path);
        Ok(editor)
    }

    /// A buffer holding `text`, not bound to any file.
    pub fn from_text(text: &str) -> Self {
        Editor {
            lines: text.lines().map(str::to_owned).collect(),
            ..Self::default()
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bind the buffer to `path` without touching its contents.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 1-based cursor line.
    pub fn cursor_line(&self) -> usize {
        self.cursor + 1
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    /// Delete 1-based lines `first..=last`, clamped to the buffer.  Returns
    /// how many lines were removed.  The cursor moves to the line after the
    /// deletion (or the new last line).
    pub fn delete_lines(&mut self, first: usize, last: usize) -> usize {
        let start = first.saturating_sub(1).min(self.lines.len());
        let end = last.min(self.lines.len());
        if start >= end {
            return 0;
        }
        self.lines.drain(start..end);
        self.modified = true;
        self.cursor = start.min(self.lines.len().saturating_sub(1));
        end - start
    }

    /// Write the buffer to `path`, or to the buffer's own file.  Writing to
    /// the buffer's file clears the modified flag.  Returns the path written.
    pub fn write(&mut self, path: Option<&Path>) -> Result<PathBuf, ExError> {
        let target = match (path, &self.path) {
            (Some(p), _) => p.to_path_buf(),
            (None, Some(own)) => own.clone(),
            (None, None) => return Err(ExError::NoFileName),
        };
        let mut text = self.lines.join("\n");
        if !self.lines.is_empty() {
            text.push('\n');
        }
        std::fs::write(&target, text)?;
        if self.path.is_none() {
            self.path = Some(target.clone());
        }
        if self.path.as_deref() == Some(target.as_path()) {
            self.modified = false;
        }
        Ok(target)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
