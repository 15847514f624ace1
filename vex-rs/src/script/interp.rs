//! Ex script interpreter.
//!
//! The [`Interpreter`] owns the editing session (buffer, aliases, variables,
//! message sink) and runs parsed statement trees against it.  It is the one
//! place errors are reported: every `Error` that reaches the top of a run is
//! shown once on the sink, then returned to the caller.

use tracing::{debug, warn};

use crate::editor::Editor;
use crate::var::VarStore;

use super::alias::{AliasRegistry, CommandAlias};
use super::context::{ExContext, ExOutput, MessageSink};
use super::error::ExError;
use super::executable::{execute_body, Executable, Scope};
use super::parser::{ExParser, ScriptParser};
use super::result::ExecutionResult;
use super::unknown::MAX_ALIAS_DEPTH;

// ── Interpreter ───────────────────────────────────────────────────────────────

/// The Ex script interpreter.
pub struct Interpreter<S: MessageSink = ExOutput> {
    /// The buffer commands edit.
    pub editor: Editor,
    /// User-defined commands.
    pub aliases: AliasRegistry,
    /// Script variables.
    pub vars: VarStore,
    /// Where messages and errors go.
    pub output: S,
    parser: ExParser,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with an empty buffer that collects output in memory.
    pub fn new() -> Self {
        Self::with_sink(ExOutput::new())
    }
}

impl<S: MessageSink> Interpreter<S> {
    pub fn with_sink(output: S) -> Self {
        Interpreter {
            editor: Editor::default(),
            aliases: AliasRegistry::new(),
            vars: VarStore::new(),
            output,
            parser: ExParser,
        }
    }

    /// Borrow the session as an [`ExContext`] for the duration of `f`.
    pub fn with_context<R>(&mut self, f: impl FnOnce(&mut ExContext<'_>) -> R) -> R {
        let mut ctx = ExContext {
            editor: &mut self.editor,
            aliases: &mut self.aliases,
            vars: &mut self.vars,
            sink: &mut self.output,
            parser: &self.parser,
            alias_budget: MAX_ALIAS_DEPTH,
        };
        f(&mut ctx)
    }

    /// Register an `Ex` alias directly, bypassing `:command` validation.
    pub fn define_alias(
        &mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        command: impl Into<String>,
    ) {
        let name = name.into();
        self.aliases.set_alias(
            name.clone(),
            CommandAlias::Ex {
                min_args,
                max_args,
                name,
                command: command.into(),
            },
        );
    }

    /// Register a `Call` alias backed by native code.
    pub fn define_native_alias<F>(
        &mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        handler: F,
    ) where
        F: Fn(&mut ExContext<'_>, &str) + Send + Sync + 'static,
    {
        let name = name.into();
        self.aliases.set_alias(
            name.clone(),
            CommandAlias::Call {
                min_args,
                max_args,
                name,
                handler: std::sync::Arc::new(handler),
            },
        );
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Parse and execute an Ex script.
    pub fn exec_script(&mut self, src: &str) -> Result<(), ExError> {
        let body = match self.parser.parse_script(src) {
            Ok(body) => body,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };
        self.exec_body(&body)
    }

    /// Execute pre-parsed statements as a top-level script.
    pub fn exec_body(&mut self, body: &[Box<dyn Executable>]) -> Result<(), ExError> {
        let result = self.with_context(|ctx| execute_body(body, ctx, &Scope::script()));
        if matches!(result, ExecutionResult::Break | ExecutionResult::Continue) {
            // Nothing above the script can absorb these.
            warn!(signal = ?result, "loop signal reached top level; ignored");
        }
        let outcome = result.into_result();
        if let Err(e) = &outcome {
            self.fail(e);
        }
        outcome
    }

    /// `true` once `:quit` (or a variant) has succeeded.
    pub fn quit_requested(&self) -> bool {
        self.editor.quit_requested()
    }

    fn fail(&mut self, error: &ExError) {
        debug!(%error, "script failed");
        self.output.report_error(&error.to_string());
        self.output.indicate_error();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
