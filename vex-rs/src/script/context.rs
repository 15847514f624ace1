//! The session handle threaded through every `execute` call, and the
//! diagnostics sink commands report to.

use crate::editor::Editor;
use crate::var::VarStore;

use super::alias::AliasRegistry;
use super::error::ExError;
use super::parser::ScriptParser;

// ── MessageSink ───────────────────────────────────────────────────────────────

/// Destination for user-visible messages (`:echo` output, alias listings,
/// error strings).
pub trait MessageSink {
    /// Show an informational line.
    fn report(&mut self, message: &str);

    /// Show an error line.  Defaults to [`report`](Self::report).
    fn report_error(&mut self, message: &str) {
        self.report(message);
    }

    /// Signal an error to the user without a message (bell / flash).
    fn indicate_error(&mut self) {}
}

/// In-memory message buffer.
#[derive(Debug, Default)]
pub struct ExOutput {
    /// Every reported line, errors included, in order.
    pub lines: Vec<String>,
    /// Only the error lines.
    pub errors: Vec<String>,
    /// Number of times [`MessageSink::indicate_error`] was called.
    pub bells: usize,
}

impl ExOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all buffered lines.
    pub fn take_lines(&mut self) -> Vec<String> {
        self.errors.clear();
        std::mem::take(&mut self.lines)
    }
}

impl MessageSink for ExOutput {
    fn report(&mut self, message: &str) {
        self.lines.extend(message.lines().map(str::to_owned));
    }

    fn report_error(&mut self, message: &str) {
        self.errors.push(message.to_owned());
        self.report(message);
    }

    fn indicate_error(&mut self) {
        self.bells += 1;
    }
}

// ── ExContext ─────────────────────────────────────────────────────────────────

/// Mutable session state available to a running statement.
///
/// The core never inspects the editor; it only forwards the context to the
/// commands that need it.
pub struct ExContext<'a> {
    pub editor: &'a mut Editor,
    pub aliases: &'a mut AliasRegistry,
    pub vars: &'a mut VarStore,
    pub sink: &'a mut dyn MessageSink,
    pub parser: &'a dyn ScriptParser,
    /// Alias expansions still allowed for the statement running now.
    pub alias_budget: usize,
}

impl ExContext<'_> {
    pub fn report(&mut self, message: &str) {
        self.sink.report(message);
    }

    /// Report an error that will not reach the interpreter boundary.
    pub fn report_error(&mut self, error: &ExError) {
        self.sink.report_error(&error.to_string());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_splits_multiline_reports() {
        let mut out = ExOutput::new();
        out.report("a\nb");
        assert_eq!(out.lines, vec!["a", "b"]);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn output_tracks_errors_and_bells() {
        let mut out = ExOutput::new();
        out.report_error("E492: Not an editor command: x");
        out.indicate_error();
        assert_eq!(out.lines.len(), 1);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.bells, 1);
        assert_eq!(out.take_lines().len(), 1);
        assert!(out.lines.is_empty() && out.errors.is_empty());
    }
}
