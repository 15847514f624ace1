//! `:command`, `:delcommand` and `:comclear`.
//!
//! ```text
//! :command[!] [-nargs={0|1|*|?|+}] {Name} {replacement}
//! :command [{Name-prefix}]
//! ```

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::alias::{is_blacklisted, AliasRegistry, CommandAlias};
use super::command::{flags, Access, ArgumentFlag, Command, CommandFlags, RangeFlag};
use super::context::ExContext;
use super::error::ExError;
use super::executable::Scope;
use super::result::ExecutionResult;

const LIST_HEADER: &str = "Name        Args       Definition";

fn nargs_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-nargs=(-?\d+|[?+*])$").expect("nargs pattern"))
}

/// Parse the value of a `-nargs=` token into `(min, max)`.
fn parse_nargs(token: &str) -> Result<(usize, Option<usize>), ExError> {
    let caps = nargs_regex()
        .captures(token)
        .ok_or(ExError::InvalidArgumentCount)?;
    match &caps[1] {
        "*" => Ok((0, None)),
        "?" => Ok((0, Some(1))),
        "+" => Ok((1, None)),
        n => match n.parse::<i64>() {
            Ok(n @ 0..=1) => Ok((n as usize, Some(n as usize))),
            _ => Err(ExError::InvalidArgumentCount),
        },
    }
}

/// Render the `:command` listing for aliases whose name starts with `prefix`.
pub fn render_alias_list(registry: &AliasRegistry, prefix: &str) -> Vec<String> {
    let mut rows: Vec<String> = registry
        .list_aliases()
        .iter()
        .filter(|(name, _)| name.starts_with(prefix))
        .map(|(name, alias)| {
            format!(
                "{:<12}{:<11}{}",
                name,
                alias.number_of_arguments(),
                alias.print_value()
            )
        })
        .collect();
    rows.sort_by_cached_key(|row| row.to_lowercase());
    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(LIST_HEADER.to_owned());
    out.extend(rows);
    out
}

// ── :command ──────────────────────────────────────────────────────────────────

/// `:command`.  `argument` holds everything after the command name,
/// including a leading `!`.
#[derive(Debug, Clone)]
pub struct CmdCommand {
    pub argument: String,
}

impl CmdCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Optional, Access::ReadOnly);

    pub fn new(argument: impl Into<String>) -> Self {
        Self {
            argument: argument.into(),
        }
    }

    fn list(&self, ctx: &mut ExContext<'_>, prefix: &str) {
        for line in render_alias_list(ctx.aliases, prefix) {
            ctx.report(&line);
        }
    }

    fn add_alias(&self, ctx: &mut ExContext<'_>) -> Result<(), ExError> {
        let mut rest = self.argument.trim();

        let force = match rest.strip_prefix('!') {
            Some(r) => {
                rest = r.trim_start();
                true
            }
            None => false,
        };

        let (mut min_args, mut max_args) = (0, Some(0));
        if rest.starts_with("-nargs") {
            let (token, r) = split_token(rest);
            (min_args, max_args) = parse_nargs(token)?;
            rest = r;
        }

        let (name, replacement) = split_token(rest);
        if name.is_empty() {
            return Err(ExError::MissingAliasName);
        }
        if !name.chars().next().is_some_and(char::is_uppercase) {
            return Err(ExError::AliasMustStartUppercase);
        }
        if is_blacklisted(name) {
            return Err(ExError::ReservedAliasName);
        }

        if replacement.is_empty() {
            self.list(ctx, name);
            return Ok(());
        }

        if !force && ctx.aliases.has_alias(name) {
            return Err(ExError::AliasAlreadyExists);
        }

        ctx.aliases.set_alias(
            name,
            CommandAlias::Ex {
                min_args,
                max_args,
                name: name.to_owned(),
                command: replacement.to_owned(),
            },
        );
        Ok(())
    }
}

/// Split off the first whitespace-delimited token; the rest is trimmed.
fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim()),
        None => (text, ""),
    }
}

impl Command for CmdCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "command"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        if self.argument.trim().is_empty() {
            self.list(ctx, "");
            return ExecutionResult::Success;
        }
        self.add_alias(ctx).into()
    }
}

// ── :delcommand ───────────────────────────────────────────────────────────────

/// `:delcommand {Name}`
#[derive(Debug, Clone)]
pub struct DelCmdCommand {
    pub argument: String,
}

impl DelCmdCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Required, Access::ReadOnly);
}

impl Command for DelCmdCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "delcommand"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        let name = self.argument.trim();
        match ctx.aliases.remove_alias(name) {
            Ok(_) => {
                debug!(alias = name, "alias removed");
                ExecutionResult::Success
            }
            Err(e) => ExecutionResult::Error(e),
        }
    }
}

// ── :comclear ─────────────────────────────────────────────────────────────────

/// `:comclear` removes every user-defined command.
#[derive(Debug, Clone, Default)]
pub struct CmdClearCommand;

impl CmdClearCommand {
    pub const FLAGS: CommandFlags = flags(RangeFlag::Forbidden, ArgumentFlag::Forbidden, Access::ReadOnly);
}

impl Command for CmdClearCommand {
    fn flags(&self) -> CommandFlags {
        Self::FLAGS
    }

    fn name(&self) -> &str {
        "comclear"
    }

    fn process_command(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        debug!(count = ctx.aliases.len(), "aliases cleared");
        ctx.aliases.reset_aliases();
        ExecutionResult::Success
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::executable::Executable;
    use crate::script::Interpreter;

    fn define(interp: &mut Interpreter, argument: &str) -> ExecutionResult {
        let cmd = CmdCommand::new(argument);
        interp.with_context(|ctx| cmd.execute(ctx, &Scope::script()))
    }

    #[test]
    fn nargs_values() {
        assert_eq!(parse_nargs("-nargs=0").unwrap(), (0, Some(0)));
        assert_eq!(parse_nargs("-nargs=1").unwrap(), (1, Some(1)));
        assert_eq!(parse_nargs("-nargs=*").unwrap(), (0, None));
        assert_eq!(parse_nargs("-nargs=?").unwrap(), (0, Some(1)));
        assert_eq!(parse_nargs("-nargs=+").unwrap(), (1, None));
        for bad in ["-nargs=2", "-nargs=-1", "-nargs=x", "-nargs", "-nargs=", "-nargs=**"] {
            assert!(
                matches!(parse_nargs(bad), Err(ExError::InvalidArgumentCount)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn defines_with_nargs() {
        let mut interp = Interpreter::new();
        assert!(define(&mut interp, "-nargs=* Wq wq").is_success());
        let alias = interp.aliases.get_alias("Wq").unwrap();
        assert_eq!(alias.arity(), (0, None));
        assert_eq!(alias.print_value(), "wq");
    }

    #[test]
    fn redefinition_needs_bang() {
        let mut interp = Interpreter::new();
        assert!(define(&mut interp, "-nargs=* Wq wq").is_success());
        assert!(matches!(
            define(&mut interp, "-nargs=* Wq echo 1"),
            ExecutionResult::Error(ExError::AliasAlreadyExists)
        ));
        assert!(define(&mut interp, "! -nargs=* Wq echo 2").is_success());
        assert_eq!(
            interp.aliases.list_aliases()["Wq"].print_value(),
            "echo 2"
        );
    }

    #[test]
    fn replacement_keeps_its_own_nargs_text() {
        let mut interp = Interpreter::new();
        assert!(define(&mut interp, "-nargs=1 Cmd command -nargs=* Inner echo").is_success());
        assert_eq!(
            interp.aliases.get_alias("Cmd").unwrap().print_value(),
            "command -nargs=* Inner echo"
        );
    }

    #[test]
    fn rejects_bad_names() {
        let mut interp = Interpreter::new();
        assert!(matches!(
            define(&mut interp, "lower echo"),
            ExecutionResult::Error(ExError::AliasMustStartUppercase)
        ));
        for reserved in ["X echo", "Next echo", "Print echo", "PRINT echo", "NEXT echo"] {
            assert!(
                matches!(
                    define(&mut interp, reserved),
                    ExecutionResult::Error(ExError::ReservedAliasName)
                ),
                "{reserved}"
            );
        }
        assert!(matches!(
            define(&mut interp, "-nargs=2 Two echo"),
            ExecutionResult::Error(ExError::InvalidArgumentCount)
        ));
        assert!(matches!(
            define(&mut interp, "-nargs=-1 Neg echo"),
            ExecutionResult::Error(ExError::InvalidArgumentCount)
        ));
        assert!(matches!(
            define(&mut interp, "!"),
            ExecutionResult::Error(ExError::MissingAliasName)
        ));
        assert!(matches!(
            define(&mut interp, "-nargs=1"),
            ExecutionResult::Error(ExError::MissingAliasName)
        ));
        assert!(interp.aliases.is_empty());
    }

    #[test]
    fn listing_format() {
        let mut interp = Interpreter::new();
        assert!(define(&mut interp, "-nargs=* Wq wq").is_success());
        assert!(define(&mut interp, "apple echo").is_error());
        assert!(define(&mut interp, "Apple echo 'a'").is_success());
        interp.output.take_lines();

        assert!(define(&mut interp, "").is_success());
        assert_eq!(
            interp.output.take_lines(),
            vec![
                "Name        Args       Definition".to_owned(),
                "Apple       0          echo 'a'".to_owned(),
                "Wq          *          wq".to_owned(),
            ]
        );

        // A name without replacement lists by prefix and defines nothing.
        assert!(define(&mut interp, "W").is_success());
        let lines = interp.output.take_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Wq"));
        assert_eq!(interp.aliases.len(), 2);
    }

    #[test]
    fn delcommand_and_comclear() {
        let mut interp = Interpreter::new();
        assert!(define(&mut interp, "Foo echo 1").is_success());
        assert!(define(&mut interp, "Bar echo 2").is_success());

        let del = DelCmdCommand {
            argument: "Foo".into(),
        };
        let r = interp.with_context(|ctx| del.execute(ctx, &Scope::script()));
        assert!(r.is_success());
        let r = interp.with_context(|ctx| del.execute(ctx, &Scope::script()));
        assert!(matches!(r, ExecutionResult::Error(ExError::NoSuchAlias(n)) if n == "Foo"));

        let r = interp.with_context(|ctx| CmdClearCommand.execute(ctx, &Scope::script()));
        assert!(r.is_success());
        assert!(interp.aliases.is_empty());
    }
}
