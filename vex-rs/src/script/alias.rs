//! User-defined command aliases and their registry.
//!
//! An alias is either an `Ex` alias (replacement script text, re-parsed on
//! every use) or a `Call` alias (a native handler invoked directly).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};
use tracing::debug;

use super::context::ExContext;
use super::error::ExError;

/// Names that can never be used for a user-defined command.
pub const BLACKLISTED_ALIASES: &[&str] = &["X", "Next", "Print"];

/// `true` if `name` is reserved (case-insensitive).
pub fn is_blacklisted(name: &str) -> bool {
    BLACKLISTED_ALIASES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

// ── AliasHandler ──────────────────────────────────────────────────────────────

/// Native code behind a `Call` alias.
pub trait AliasHandler: Send + Sync {
    fn execute(&self, ctx: &mut ExContext<'_>, arguments: &str);
}

impl<F> AliasHandler for F
where
    F: Fn(&mut ExContext<'_>, &str) + Send + Sync,
{
    fn execute(&self, ctx: &mut ExContext<'_>, arguments: &str) {
        self(ctx, arguments)
    }
}

// ── CommandAlias ──────────────────────────────────────────────────────────────

/// A named, registered command expansion.
#[derive(Clone)]
pub enum CommandAlias {
    Ex {
        min_args: usize,
        /// `None` means unbounded.
        max_args: Option<usize>,
        name: String,
        command: String,
    },
    Call {
        min_args: usize,
        max_args: Option<usize>,
        name: String,
        handler: Arc<dyn AliasHandler>,
    },
}

impl fmt::Debug for CommandAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandAlias::Ex {
                min_args,
                max_args,
                name,
                command,
            } => f
                .debug_struct("Ex")
                .field("min_args", min_args)
                .field("max_args", max_args)
                .field("name", name)
                .field("command", command)
                .finish(),
            CommandAlias::Call {
                min_args,
                max_args,
                name,
                ..
            } => f
                .debug_struct("Call")
                .field("min_args", min_args)
                .field("max_args", max_args)
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

/// What a resolved alias asks the resolver to do.
pub enum GoalCommand {
    /// Parse and run this text.
    Ex(String),
    /// Invoke the handler with these arguments.
    Call(Arc<dyn AliasHandler>, String),
}

impl fmt::Debug for GoalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalCommand::Ex(text) => f.debug_tuple("Ex").field(text).finish(),
            GoalCommand::Call(_, args) => f.debug_tuple("Call").field(args).finish(),
        }
    }
}

impl CommandAlias {
    pub fn name(&self) -> &str {
        match self {
            CommandAlias::Ex { name, .. } | CommandAlias::Call { name, .. } => name,
        }
    }

    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            CommandAlias::Ex {
                min_args, max_args, ..
            }
            | CommandAlias::Call {
                min_args, max_args, ..
            } => (*min_args, *max_args),
        }
    }

    /// The `-nargs` token this alias was (or could have been) defined with.
    pub fn number_of_arguments(&self) -> String {
        match self.arity() {
            (0, Some(0)) => "0".into(),
            (1, Some(1)) => "1".into(),
            (0, None) => "*".into(),
            (0, Some(1)) => "?".into(),
            (1, None) => "+".into(),
            (min, Some(max)) => format!("{min}..{max}"),
            (min, None) => format!("{min}.."),
        }
    }

    /// Definition column of `:command` listings.
    pub fn print_value(&self) -> String {
        match self {
            CommandAlias::Ex { command, .. } => command.clone(),
            CommandAlias::Call { name, .. } => format!("<native {name}>"),
        }
    }

    /// Check `arguments` against the arity and build the goal command.
    pub fn goal_command(&self, arguments: &str) -> Result<GoalCommand, ExError> {
        let arguments = arguments.trim();
        let (min, max) = self.arity();
        if arguments.is_empty() && min > 0 {
            return Err(ExError::ArgumentRequired);
        }
        if !arguments.is_empty() && max == Some(0) {
            return Err(ExError::TrailingCharacters(arguments.to_owned()));
        }
        Ok(match self {
            CommandAlias::Ex { command, .. } => {
                GoalCommand::Ex(substitute_placeholders(command, arguments))
            }
            CommandAlias::Call { handler, .. } => {
                GoalCommand::Call(Arc::clone(handler), arguments.to_owned())
            }
        })
    }
}

// ── Placeholders ──────────────────────────────────────────────────────────────

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<(args|q-args|f-args|lt)>").expect("placeholder pattern"))
}

/// Expand `<args>`, `<q-args>`, `<f-args>` and `<lt>` in `text`.
pub fn substitute_placeholders(text: &str, arguments: &str) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            match caps[1].to_ascii_lowercase().as_str() {
                "args" => arguments.to_owned(),
                "q-args" => quote(arguments),
                "f-args" => split_f_args(arguments)
                    .iter()
                    .map(|a| quote(a))
                    .collect::<Vec<_>>()
                    .join(","),
                _ => "<".to_owned(),
            }
        })
        .into_owned()
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Split on unescaped whitespace; `\ ` keeps a literal space.
fn split_f_args(arguments: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = arguments.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek().is_some_and(|n| n.is_whitespace() || *n == '\\') => {
                if let Some(n) = chars.next() {
                    current.push(n);
                }
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

// ── AliasRegistry ─────────────────────────────────────────────────────────────

/// Name → alias map.  Names are case-sensitive.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    aliases: HashMap<String, CommandAlias>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace.  No validation happens here.
    pub fn set_alias(&mut self, name: impl Into<String>, alias: CommandAlias) {
        let name = name.into();
        debug!(alias = %name, nargs = %alias.number_of_arguments(), "alias defined");
        self.aliases.insert(name, alias);
    }

    pub fn has_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    pub fn get_alias(&self, name: &str) -> Option<&CommandAlias> {
        self.aliases.get(name)
    }

    /// `true` if `name` could name a user command and one is registered.
    pub fn is_alias(&self, name: &str) -> bool {
        name.chars().next().is_some_and(char::is_uppercase) && self.has_alias(name)
    }

    pub fn list_aliases(&self) -> &HashMap<String, CommandAlias> {
        &self.aliases
    }

    pub fn remove_alias(&mut self, name: &str) -> Result<CommandAlias, ExError> {
        self.aliases
            .remove(name)
            .ok_or_else(|| ExError::NoSuchAlias(name.to_owned()))
    }

    pub fn reset_aliases(&mut self) {
        self.aliases.clear();
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Look up `name` and build its goal command for `arguments`.
    pub fn alias_command(&self, name: &str, arguments: &str) -> Result<GoalCommand, ExError> {
        self.get_alias(name)
            .ok_or_else(|| ExError::NotAnEditorCommand(name.to_owned()))?
            .goal_command(arguments)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
