//! Dispatch for command names no parser rule recognises.
//!
//! Such a name is assumed to be a user-defined alias.  Expansion is bounded
//! by an explicit budget so alias cycles terminate with an error instead of
//! exhausting the stack.

use tracing::{debug, trace, warn};

use super::alias::GoalCommand;
use super::command::{flags, Access, ArgumentFlag, Command, CommandFlags, RangeFlag};
use super::context::ExContext;
use super::error::ExError;
use super::executable::Scope;
use super::ranges::Ranges;
use super::result::ExecutionResult;

/// How many nested alias expansions one command may go through, whether an
/// alias names another alias directly or runs a body that calls one.
pub const MAX_ALIAS_DEPTH: usize = 100;

/// A command the parser could not match to any built-in.
#[derive(Debug, Clone)]
pub struct UnknownCommand {
    pub ranges: Ranges,
    pub name: String,
    pub argument: String,
}

impl UnknownCommand {
    pub const FLAGS: CommandFlags = flags(
        RangeFlag::Optional,
        ArgumentFlag::Optional,
        Access::SelfSynchronized,
    );

    pub fn new(ranges: Ranges, name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            ranges,
            name: name.into(),
            argument: argument.into(),
        }
    }
}

impl Command for UnknownCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult {
        resolve(&self.name, &self.argument, ctx, scope, ctx.alias_budget)
    }

    fn as_unknown_command(&self) -> Option<&UnknownCommand> {
        Some(self)
    }
}

fn command_line(name: &str, argument: &str) -> String {
    let argument = argument.trim();
    if argument.is_empty() {
        name.to_owned()
    } else {
        format!("{name} {argument}")
    }
}

/// Resolve `name argument` as an alias with `budget` expansions left.
///
/// An `Ex` alias whose text parses to another unknown command recurses with
/// one less budget.  Any other node runs in `scope` with one less budget in
/// `ctx`, and the alias reports `Success` whatever that node returned; an
/// error from it is still shown.  Exhausting the budget is the exception: it
/// is passed up unchanged so the whole expansion stops.
pub fn resolve(
    name: &str,
    argument: &str,
    ctx: &mut ExContext<'_>,
    scope: &Scope<'_>,
    budget: usize,
) -> ExecutionResult {
    if !ctx.aliases.is_alias(name) {
        return ExecutionResult::Error(ExError::NotAnEditorCommand(command_line(name, argument)));
    }
    if budget == 0 {
        warn!(alias = name, "alias expansion depth exhausted");
        ctx.sink.indicate_error();
        return ExecutionResult::Error(ExError::AliasDepthExceeded);
    }

    let goal = match ctx.aliases.alias_command(name, argument) {
        Ok(goal) => goal,
        Err(e) => return ExecutionResult::Error(e),
    };
    trace!(alias = name, budget, depth = scope.depth(), ?goal, "alias expanded");

    match goal {
        GoalCommand::Call(handler, arguments) => {
            with_budget(ctx, budget - 1, |ctx| handler.execute(ctx, &arguments));
            ExecutionResult::Success
        }
        GoalCommand::Ex(text) if text.trim().is_empty() => {
            ExecutionResult::Error(ExError::NotAnEditorCommand(name.to_owned()))
        }
        GoalCommand::Ex(text) => {
            let parser = ctx.parser;
            let Some(node) = parser.parse_command(&text) else {
                return ExecutionResult::Error(ExError::NotAnEditorCommand(text));
            };
            if let Some(next) = node.as_unknown_command() {
                return resolve(&next.name, &next.argument, ctx, scope, budget - 1);
            }
            match with_budget(ctx, budget - 1, |ctx| node.execute(ctx, scope)) {
                ExecutionResult::Error(e) if e.is_recursion_limit() => ExecutionResult::Error(e),
                ExecutionResult::Error(e) => {
                    debug!(alias = name, error = %e, "alias body failed");
                    ctx.report_error(&e);
                    ExecutionResult::Success
                }
                _ => ExecutionResult::Success,
            }
        }
    }
}

/// Run `f` with `ctx.alias_budget` lowered to `budget`, restoring it after.
fn with_budget<R>(
    ctx: &mut ExContext<'_>,
    budget: usize,
    f: impl FnOnce(&mut ExContext<'_>) -> R,
) -> R {
    let saved = std::mem::replace(&mut ctx.alias_budget, budget);
    let result = f(ctx);
    ctx.alias_budget = saved;
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::script::alias::CommandAlias;
    use crate::script::executable::ScopeKind;
    use crate::script::Interpreter;

    fn ex(interp: &mut Interpreter, name: &str, text: &str) {
        interp.aliases.set_alias(
            name,
            CommandAlias::Ex {
                min_args: 0,
                max_args: None,
                name: name.into(),
                command: text.into(),
            },
        );
    }

    fn run(interp: &mut Interpreter, name: &str, argument: &str) -> ExecutionResult {
        let cmd = UnknownCommand::new(Ranges::new(), name, argument);
        interp.with_context(|ctx| cmd.process_command(ctx, &Scope::script()))
    }

    #[test]
    fn missing_alias_is_not_an_editor_command() {
        let mut interp = Interpreter::new();
        match run(&mut interp, "Nope", "a b") {
            ExecutionResult::Error(e) => assert_eq!(e.to_string(), "E492: Not an editor command: Nope a b"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lowercase_registered_name_is_not_an_alias() {
        let mut interp = Interpreter::new();
        ex(&mut interp, "lower", "echo 1");
        assert!(matches!(
            run(&mut interp, "lower", ""),
            ExecutionResult::Error(ExError::NotAnEditorCommand(_))
        ));
    }

    #[test]
    fn mutual_recursion_hits_depth_limit() {
        let mut interp = Interpreter::new();
        ex(&mut interp, "Foo", "Bar");
        ex(&mut interp, "Bar", "Foo");
        let r = run(&mut interp, "Foo", "");
        assert!(matches!(r, ExecutionResult::Error(ExError::AliasDepthExceeded)));
        assert!(interp.output.bells >= 1);
    }

    fn chain(interp: &mut Interpreter, links: usize) {
        for i in 1..links {
            ex(interp, &format!("A{i}"), &format!("A{}", i + 1));
        }
        ex(interp, &format!("A{links}"), "let reached = 1");
    }

    #[test]
    fn chain_at_the_limit_resolves() {
        let mut interp = Interpreter::new();
        chain(&mut interp, MAX_ALIAS_DEPTH);
        assert!(run(&mut interp, "A1", "").is_success());
        assert!(interp.vars.contains("reached"));
    }

    #[test]
    fn chain_past_the_limit_fails() {
        let mut interp = Interpreter::new();
        chain(&mut interp, MAX_ALIAS_DEPTH + 1);
        assert!(matches!(
            run(&mut interp, "A1", ""),
            ExecutionResult::Error(ExError::AliasDepthExceeded)
        ));
        assert!(!interp.vars.contains("reached"));
    }

    #[test]
    fn self_calling_block_is_bounded() {
        let mut interp = Interpreter::new();
        interp.exec_script("let n = 0").unwrap();
        interp.define_alias("Rec", 0, None, "let n += 1 | Rec");
        assert!(matches!(interp.exec_script("Rec"), Err(ExError::AliasDepthExceeded)));
        assert_eq!(
            interp.vars.get("n").map(|v| v.as_int()),
            Some(MAX_ALIAS_DEPTH as i64)
        );
        // Reported once, at the top.
        assert_eq!(interp.output.errors.len(), 1);
    }

    #[test]
    fn self_calling_loop_is_bounded() {
        let mut interp = Interpreter::new();
        interp.define_alias("W", 0, None, "while 1 | W | endwhile");
        assert!(matches!(interp.exec_script("W"), Err(ExError::AliasDepthExceeded)));
    }

    #[test]
    fn self_calling_conditional_is_bounded() {
        let mut interp = Interpreter::new();
        interp.define_alias("I", 0, None, "if 1 | I | endif");
        assert!(matches!(interp.exec_script("I"), Err(ExError::AliasDepthExceeded)));
    }

    #[test]
    fn budget_is_restored_after_expansion() {
        let mut interp = Interpreter::new();
        ex(&mut interp, "Once", "let a = 1 | let b = 2");
        let left = interp.with_context(|ctx| {
            let cmd = UnknownCommand::new(Ranges::new(), "Once", "");
            assert!(cmd.process_command(ctx, &Scope::script()).is_success());
            ctx.alias_budget
        });
        assert_eq!(left, MAX_ALIAS_DEPTH);
    }

    #[test]
    fn call_alias_runs_handler() {
        let mut interp = Interpreter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        interp.define_native_alias("Hit", 1, None, move |ctx: &mut ExContext<'_>, args: &str| {
            seen.fetch_add(1, Ordering::SeqCst);
            ctx.report(&format!("hit {args}"));
        });
        assert!(run(&mut interp, "Hit", "me").is_success());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(interp.output.lines, vec!["hit me"]);
        assert!(matches!(
            run(&mut interp, "Hit", ""),
            ExecutionResult::Error(ExError::ArgumentRequired)
        ));
    }

    #[test]
    fn empty_alias_text_is_not_an_editor_command() {
        let mut interp = Interpreter::new();
        ex(&mut interp, "Empty", "  ");
        match run(&mut interp, "Empty", "") {
            ExecutionResult::Error(ExError::NotAnEditorCommand(n)) => assert_eq!(n, "Empty"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unparseable_alias_text() {
        let mut interp = Interpreter::new();
        ex(&mut interp, "Bad", "endwhile");
        match run(&mut interp, "Bad", "") {
            ExecutionResult::Error(e) => {
                assert_eq!(e.to_string(), "E492: Not an editor command: endwhile")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inner_failure_still_reports_success() {
        let mut interp = Interpreter::new();
        ex(&mut interp, "Fail", "echo undefined_var");
        assert!(run(&mut interp, "Fail", "").is_success());
        assert_eq!(interp.output.errors.len(), 1);
        assert!(interp.output.errors[0].starts_with("E121"));
    }

    #[test]
    fn expands_arguments() {
        let mut interp = Interpreter::new();
        ex(&mut interp, "Set", "let <args>");
        assert!(run(&mut interp, "Set", "x = 5").is_success());
        assert_eq!(interp.vars.get("x").map(|v| v.as_int()), Some(5));
    }

    #[test]
    fn expansion_runs_in_callers_scope() {
        let mut interp = Interpreter::new();
        ex(&mut interp, "Brk", "break");

        // Outside any loop `:break` fails; the error is swallowed but shown.
        assert!(run(&mut interp, "Brk", "").is_success());
        assert_eq!(interp.output.errors.len(), 1);
        assert!(interp.output.errors[0].starts_with("E587"));
        interp.output.take_lines();

        // Inside a loop scope the same expansion is legal.
        let cmd = UnknownCommand::new(Ranges::new(), "Brk", "");
        let r = interp.with_context(|ctx| {
            let root = Scope::script();
            let body = root.child(ScopeKind::Loop);
            cmd.process_command(ctx, &body)
        });
        assert!(r.is_success());
        assert!(interp.output.errors.is_empty());
    }

    #[test]
    fn flags_are_permissive() {
        let cmd = UnknownCommand::new(Ranges::new(), "X", "");
        assert_eq!(cmd.flags().range, RangeFlag::Optional);
        assert_eq!(cmd.flags().argument, ArgumentFlag::Optional);
        assert_eq!(cmd.flags().access, Access::SelfSynchronized);
        assert!(Command::as_unknown_command(&cmd).is_some());
    }
}
