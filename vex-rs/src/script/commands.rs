//! Built-in Ex commands the parser knows by name.

use tracing::debug;

use super::command::{flags, Access, ArgumentFlag, Command, CommandFlags, RangeFlag};
use super::context::ExContext;
use super::error::ExError;
use super::executable::Scope;
use super::expr::Expression;
use super::ranges::Ranges;
use super::result::ExecutionResult;
use super::value::Value;

/// Split a leading `!` off a command argument.
fn bang(argument: &str) -> (bool, &str) {
    match argument.trim_start().strip_prefix('!') {
        Some(rest) => (true, rest.trim()),
        None => (false, argument.trim()),
    }
}

fn only_bang(argument: &str) -> Result<bool, ExError> {
    match bang(argument) {
        (force, "") => Ok(force),
        (_, rest) => Err(ExError::TrailingCharacters(rest.to_owned())),
    }
}

// ── :echo ─────────────────────────────────────────────────────────────────────

/// `:echo {expr}..` reports the values separated by spaces.
#[derive(Debug, Clone)]
pub struct EchoCommand {
    pub argument: String,
}

impl EchoCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Optional, Access::ReadOnly);
}

impl Command for EchoCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        let line = Expression::parse_sequence(&self.argument).and_then(|exprs| {
            exprs
                .iter()
                .map(|e| e.evaluate(ctx.vars).map(|v| v.to_string()))
                .collect::<Result<Vec<_>, _>>()
        });
        match line {
            Ok(parts) => {
                ctx.report(&parts.join(" "));
                ExecutionResult::Success
            }
            Err(e) => ExecutionResult::Error(e),
        }
    }
}

// ── :let / :unlet ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assign {
    Set,
    Add,
    Sub,
    Concat,
}

/// `:let {var} = {expr}` and the `+=`, `-=`, `.=` forms.
#[derive(Debug, Clone)]
pub struct LetCommand {
    pub argument: String,
}

impl LetCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Required, Access::ReadOnly);

    fn split(&self) -> Result<(&str, Assign, &str), ExError> {
        let text = self.argument.trim();
        let end = text
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
            .unwrap_or(text.len());
        let name = &text[..end];
        if !is_variable_name(name) {
            return Err(ExError::IllegalVariableName(text.to_owned()));
        }
        let rest = text[end..].trim_start();
        let (op, expr) = if let Some(e) = rest.strip_prefix("+=") {
            (Assign::Add, e)
        } else if let Some(e) = rest.strip_prefix("-=") {
            (Assign::Sub, e)
        } else if let Some(e) = rest.strip_prefix(".=").or_else(|| rest.strip_prefix("..=")) {
            (Assign::Concat, e)
        } else if let Some(e) = rest.strip_prefix('=') {
            (Assign::Set, e)
        } else {
            return Err(ExError::InvalidExpression(text.to_owned()));
        };
        Ok((name, op, expr))
    }

    fn run(&self, ctx: &mut ExContext<'_>) -> Result<(), ExError> {
        let (name, op, src) = self.split()?;
        let rhs = Expression::parse(src)?.evaluate(ctx.vars)?;
        let value = if op == Assign::Set {
            rhs
        } else {
            let lhs = ctx
                .vars
                .get(name)
                .ok_or_else(|| ExError::UndefinedVariable(name.to_owned()))?;
            match op {
                Assign::Add => lhs.arith_add(&rhs),
                Assign::Sub => lhs.arith_sub(&rhs),
                _ => lhs.concat(&rhs),
            }
        };
        ctx.vars.set(name, value);
        Ok(())
    }
}

fn is_variable_name(name: &str) -> bool {
    let bare = name.strip_prefix("g:").unwrap_or(name);
    let mut chars = bare.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Command for LetCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "let"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        self.run(ctx).into()
    }
}

/// `:unlet[!] {var}..`; `!` ignores missing variables.
#[derive(Debug, Clone)]
pub struct UnletCommand {
    pub argument: String,
}

impl UnletCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Required, Access::ReadOnly);

    fn run(&self, ctx: &mut ExContext<'_>) -> Result<(), ExError> {
        let (force, names) = bang(&self.argument);
        if names.is_empty() {
            return Err(ExError::ArgumentRequired);
        }
        for name in names.split_whitespace() {
            if !is_variable_name(name) {
                return Err(ExError::IllegalVariableName(name.to_owned()));
            }
            if ctx.vars.remove(name).is_none() && !force {
                return Err(ExError::NoSuchVariable(name.to_owned()));
            }
        }
        Ok(())
    }
}

impl Command for UnletCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "unlet"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        self.run(ctx).into()
    }
}

// ── :delete ───────────────────────────────────────────────────────────────────

/// `[range]delete`
#[derive(Debug, Clone)]
pub struct DeleteCommand {
    pub ranges: Ranges,
}

impl DeleteCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Optional, ArgumentFlag::Forbidden, Access::WriteLock);

    fn run(&self, ctx: &mut ExContext<'_>) -> Result<(), ExError> {
        if ctx.editor.line_count() == 0 {
            return Ok(());
        }
        let (first, last) = self.ranges.line_range(ctx.editor)?;
        if first == 0 {
            return Err(ExError::InvalidRange);
        }
        let removed = ctx.editor.delete_lines(first, last);
        debug!(first, last, removed, "delete");
        Ok(())
    }
}

impl Command for DeleteCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "delete"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        self.run(ctx).into()
    }
}

// ── :write / :quit / :wq / :xit ───────────────────────────────────────────────

/// `:write [file]`
#[derive(Debug, Clone)]
pub struct WriteCommand {
    pub argument: String,
}

impl WriteCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Optional, Access::ReadOnly);
}

fn write_buffer(ctx: &mut ExContext<'_>, argument: &str) -> Result<(), ExError> {
    let (_, path) = bang(argument);
    let path = (!path.is_empty()).then(|| std::path::Path::new(path));
    let written = ctx.editor.write(path)?;
    debug!(path = %written.display(), "buffer written");
    Ok(())
}

impl Command for WriteCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "write"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        write_buffer(ctx, &self.argument).into()
    }
}

/// `:quit[!]`
#[derive(Debug, Clone)]
pub struct QuitCommand {
    pub argument: String,
}

impl QuitCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Optional, Access::ReadOnly);

    fn run(&self, ctx: &mut ExContext<'_>) -> Result<(), ExError> {
        let force = only_bang(&self.argument)?;
        if ctx.editor.is_modified() && !force {
            return Err(ExError::UnsavedChanges);
        }
        ctx.editor.request_quit();
        Ok(())
    }
}

impl Command for QuitCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "quit"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        self.run(ctx).into()
    }
}

/// `:wq [file]` writes unconditionally, then quits.
#[derive(Debug, Clone)]
pub struct WqCommand {
    pub argument: String,
}

impl WqCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Optional, Access::ReadOnly);
}

impl Command for WqCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "wq"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        let result = write_buffer(ctx, &self.argument).map(|()| ctx.editor.request_quit());
        result.into()
    }
}

/// `:xit [file]` writes only when modified, then quits.
#[derive(Debug, Clone)]
pub struct XitCommand {
    pub argument: String,
}

impl XitCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Optional, Access::ReadOnly);
}

impl Command for XitCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "xit"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        if ctx.editor.is_modified() {
            if let Err(e) = write_buffer(ctx, &self.argument) {
                return ExecutionResult::Error(e);
            }
        }
        ctx.editor.request_quit();
        ExecutionResult::Success
    }
}

// ── :break / :continue ────────────────────────────────────────────────────────

/// `:break`
#[derive(Debug, Clone, Default)]
pub struct BreakCommand;

impl BreakCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Forbidden, Access::ReadOnly);
}

impl Command for BreakCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "break"
    }

    fn process_command(&self, _ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult {
        if scope.within_loop() {
            ExecutionResult::Break
        } else {
            ExecutionResult::Error(ExError::BreakOutsideLoop)
        }
    }
}

/// `:continue`
#[derive(Debug, Clone, Default)]
pub struct ContinueCommand;

impl ContinueCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Forbidden, Access::ReadOnly);
}

impl Command for ContinueCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "continue"
    }

    fn process_command(&self, _ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult {
        if scope.within_loop() {
            ExecutionResult::Continue
        } else {
            ExecutionResult::Error(ExError::ContinueOutsideLoop)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Editor;
    use crate::script::executable::{Executable, ScopeKind};
    use crate::script::Interpreter;

    fn run(interp: &mut Interpreter, cmd: &dyn Executable) -> ExecutionResult {
        interp.with_context(|ctx| cmd.execute(ctx, &Scope::script()))
    }

    #[test]
    fn echo_joins_values() {
        let mut interp = Interpreter::new();
        let cmd = EchoCommand {
            argument: "'a' 1 + 2 [1, 'x']".into(),
        };
        assert!(run(&mut interp, &cmd).is_success());
        assert_eq!(interp.output.lines, vec!["a 3 [1, 'x']"]);
    }

    #[test]
    fn let_forms() {
        let mut interp = Interpreter::new();
        for arg in ["n = 2", "n += 3", "n -= 1", "s = 'a'", "s .= 'b'", "g:t = n * 10"] {
            let cmd = LetCommand { argument: arg.into() };
            assert!(run(&mut interp, &cmd).is_success(), "{arg}");
        }
        assert_eq!(interp.vars.get("n"), Some(&Value::Int(4)));
        assert_eq!(interp.vars.get("s"), Some(&Value::Str("ab".into())));
        assert_eq!(interp.vars.get("t"), Some(&Value::Int(40)));
    }

    #[test]
    fn let_errors() {
        let mut interp = Interpreter::new();
        let cases = [("1x = 2", "E461"), ("x 2", "E15"), ("y += 1", "E121"), ("z = (", "E15")];
        for (arg, code) in cases {
            let cmd = LetCommand { argument: arg.into() };
            match run(&mut interp, &cmd) {
                ExecutionResult::Error(e) => assert!(e.to_string().starts_with(code), "{arg}: {e}"),
                other => panic!("{arg}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn unlet_with_and_without_bang() {
        let mut interp = Interpreter::new();
        interp.vars.set("a", Value::Int(1));
        let cmd = UnletCommand { argument: "a".into() };
        assert!(run(&mut interp, &cmd).is_success());
        assert!(matches!(run(&mut interp, &cmd), ExecutionResult::Error(ExError::NoSuchVariable(_))));
        let cmd = UnletCommand { argument: "! a".into() };
        assert!(run(&mut interp, &cmd).is_success());
    }

    #[test]
    fn delete_range() {
        let mut interp = Interpreter::new();
        interp.editor = Editor::from_text("one\ntwo\nthree\nfour");
        let (ranges, _) = Ranges::parse("2,3");
        assert!(run(&mut interp, &DeleteCommand { ranges }).is_success());
        assert_eq!(interp.editor.lines(), ["one", "four"]);
        assert!(interp.editor.is_modified());

        let (ranges, _) = Ranges::parse("7");
        assert!(matches!(
            run(&mut interp, &DeleteCommand { ranges }),
            ExecutionResult::Error(ExError::InvalidRange)
        ));
    }

    #[test]
    fn quit_checks_modified() {
        let mut interp = Interpreter::new();
        interp.editor = Editor::from_text("x");
        let (ranges, _) = Ranges::parse("1");
        assert!(run(&mut interp, &DeleteCommand { ranges }).is_success());

        let quit = QuitCommand { argument: String::new() };
        assert!(matches!(run(&mut interp, &quit), ExecutionResult::Error(ExError::UnsavedChanges)));
        assert!(!interp.editor.quit_requested());

        let quit = QuitCommand { argument: "!".into() };
        assert!(run(&mut interp, &quit).is_success());
        assert!(interp.editor.quit_requested());

        let quit = QuitCommand { argument: "junk".into() };
        assert!(matches!(run(&mut interp, &quit), ExecutionResult::Error(ExError::TrailingCharacters(_))));
    }

    #[test]
    fn write_and_wq() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut interp = Interpreter::new();
        interp.editor = Editor::from_text("alpha\nbeta");

        let w = WriteCommand {
            argument: String::new(),
        };
        assert!(matches!(run(&mut interp, &w), ExecutionResult::Error(ExError::NoFileName)));

        let wq = WqCommand {
            argument: path.display().to_string(),
        };
        assert!(run(&mut interp, &wq).is_success());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "alpha\nbeta\n");
        assert!(interp.editor.quit_requested());
        assert!(!interp.editor.is_modified());
    }

    #[test]
    fn xit_skips_write_when_clean() {
        let mut interp = Interpreter::new();
        interp.editor = Editor::from_text("clean");
        // No file name, but nothing to write either.
        assert!(run(&mut interp, &XitCommand { argument: String::new() }).is_success());
        assert!(interp.editor.quit_requested());
    }

    #[test]
    fn break_and_continue_need_a_loop() {
        let mut interp = Interpreter::new();
        assert!(matches!(run(&mut interp, &BreakCommand), ExecutionResult::Error(ExError::BreakOutsideLoop)));
        assert!(matches!(
            run(&mut interp, &ContinueCommand),
            ExecutionResult::Error(ExError::ContinueOutsideLoop)
        ));

        let r = interp.with_context(|ctx| {
            let root = Scope::script();
            let lp = root.child(ScopeKind::Loop);
            let cond = lp.child(ScopeKind::Conditional);
            (BreakCommand.execute(ctx, &cond), ContinueCommand.execute(ctx, &cond))
        });
        assert!(matches!(r, (ExecutionResult::Break, ExecutionResult::Continue)));
    }
}
