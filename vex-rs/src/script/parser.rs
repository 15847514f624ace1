//! Ex script parser.
//!
//! A script is a sequence of lines.  Lines whose first non-blank character
//! is `\` continue the previous line.  Statements on one line are separated
//! by `|`.  Lines starting with `"` are comments.  Each statement is
//! `[:][range]{name}[!] [argument]`; names may be abbreviated down to the
//! minimum Vim accepts.
//!
//! The parser builds the executable tree directly.  Unrecognised names
//! become [`UnknownCommand`] nodes and are resolved as aliases at run time.

use tracing::trace;

use super::cmd::{CmdClearCommand, CmdCommand, DelCmdCommand};
use super::command::CommandFlags;
use super::commands::{
    BreakCommand, ContinueCommand, DeleteCommand, EchoCommand, LetCommand, QuitCommand,
    UnletCommand, WqCommand, WriteCommand, XitCommand,
};
use super::conditional::{Branch, IfStatement};
use super::error::ExError;
use super::executable::{Block, Executable};
use super::expr::Expression;
use super::loops::{ForLoop, WhileLoop};
use super::ranges::Ranges;
use super::unknown::UnknownCommand;

// ── ScriptParser ──────────────────────────────────────────────────────────────

/// Turns script text into executable nodes.
pub trait ScriptParser {
    /// Parse one command line.  Several `|`-separated statements come back
    /// as a single [`Block`].  `None` when the text does not parse or holds
    /// no statement.
    fn parse_command(&self, text: &str) -> Option<Box<dyn Executable>>;

    /// Parse a whole script.
    fn parse_script(&self, text: &str) -> Result<Vec<Box<dyn Executable>>, ExError>;
}

/// The default parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExParser;

impl ScriptParser for ExParser {
    fn parse_command(&self, text: &str) -> Option<Box<dyn Executable>> {
        let mut stmts = match self.parse_script(text) {
            Ok(stmts) => stmts,
            Err(e) => {
                trace!(%text, error = %e, "parse_command failed");
                return None;
            }
        };
        match stmts.len() {
            0 => None,
            1 => stmts.pop(),
            _ => Some(Box::new(Block::new(stmts))),
        }
    }

    fn parse_script(&self, text: &str) -> Result<Vec<Box<dyn Executable>>, ExError> {
        let stmts: Vec<String> = join_continuations(text)
            .iter()
            .flat_map(|line| split_by_bar(line))
            .map(|s| strip_colons(&s).to_owned())
            .filter(|s| !s.is_empty() && !s.starts_with('"'))
            .collect();

        let mut parser = StmtParser { stmts, pos: 0 };
        parser.parse_block_until(&[])
    }
}

// ── Line handling ─────────────────────────────────────────────────────────────

/// Join `\`-continued lines into logical lines.  `"\ ` lines inside a
/// continuation are comments.
fn join_continuations(src: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in src.lines() {
        let trimmed = line.trim_start();
        if let Some(cont) = trimmed.strip_prefix('\\') {
            match lines.last_mut() {
                Some(prev) => prev.push_str(cont),
                None => lines.push(cont.to_owned()),
            }
        } else if trimmed.starts_with("\"\\ ") && !lines.is_empty() {
            continue;
        } else {
            lines.push(line.to_owned());
        }
    }
    lines
}

fn strip_colons(s: &str) -> &str {
    s.trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .trim_end()
}

/// Split a logical line on `|`, except inside quotes, at `||`, after `\`,
/// and for commands that take `|` as part of their argument.
fn split_by_bar(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = line;
    loop {
        if keeps_bar(rest) || strip_colons(rest).starts_with('"') {
            parts.push(rest.to_owned());
            return parts;
        }
        match next_bar(rest) {
            (stmt, Some(after)) => {
                parts.push(stmt);
                rest = after;
            }
            (stmt, None) => {
                parts.push(stmt);
                return parts;
            }
        }
    }
}

/// Scan to the first top-level `|`.  Returns the statement before it (with
/// `\|` unescaped) and the text after it, if any.
fn next_bar(text: &str) -> (String, Option<&str>) {
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\'' | '"' if quote.is_none() => {
                quote = Some(ch);
                current.push(ch);
            }
            c if quote == Some(c) => {
                quote = None;
                current.push(c);
            }
            '\\' if quote == Some('"') => {
                current.push(ch);
                if let Some((_, next)) = chars.next() {
                    current.push(next);
                }
            }
            '\\' if quote.is_none() && chars.peek().map(|&(_, c)| c) == Some('|') => {
                chars.next();
                current.push('|');
            }
            '|' if quote.is_none() => {
                if chars.peek().map(|&(_, c)| c) == Some('|') {
                    chars.next();
                    current.push_str("||");
                } else {
                    return (current, Some(&text[i + 1..]));
                }
            }
            _ => current.push(ch),
        }
    }
    (current, None)
}

/// `true` if the statement's command treats `|` as ordinary text.
fn keeps_bar(stmt: &str) -> bool {
    let stmt = strip_colons(stmt);
    let (_, rest) = Ranges::parse(stmt);
    let (name, _) = split_name(rest);
    matches!(lookup(name), Some(Builtin::Command))
}

// ── Names ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Break,
    Continue,
    Command,
    ComClear,
    DelCommand,
    Delete,
    Echo,
    Else,
    Elseif,
    EndWhile,
    EndFor,
    EndIf,
    For,
    If,
    Let,
    Unlet,
    Quit,
    Write,
    Wq,
    Xit,
    While,
}

/// `(full name, shortest accepted abbreviation, builtin)`.  First match wins.
const BUILTINS: &[(&str, &str, Builtin)] = &[
    ("break", "brea", Builtin::Break),
    ("continue", "con", Builtin::Continue),
    ("command", "com", Builtin::Command),
    ("comclear", "comc", Builtin::ComClear),
    ("delcommand", "delc", Builtin::DelCommand),
    ("delete", "d", Builtin::Delete),
    ("echo", "ec", Builtin::Echo),
    ("else", "el", Builtin::Else),
    ("elseif", "elsei", Builtin::Elseif),
    ("endwhile", "endw", Builtin::EndWhile),
    ("endfor", "endfo", Builtin::EndFor),
    ("endif", "en", Builtin::EndIf),
    ("for", "for", Builtin::For),
    ("if", "if", Builtin::If),
    ("let", "let", Builtin::Let),
    ("unlet", "unl", Builtin::Unlet),
    ("quit", "q", Builtin::Quit),
    ("write", "w", Builtin::Write),
    ("wq", "wq", Builtin::Wq),
    ("xit", "x", Builtin::Xit),
    ("while", "wh", Builtin::While),
];

fn lookup(name: &str) -> Option<Builtin> {
    if name.is_empty() || name.starts_with(|c: char| c.is_uppercase()) {
        return None;
    }
    BUILTINS
        .iter()
        .find(|(full, min, _)| full.starts_with(name) && name.starts_with(min))
        .map(|&(_, _, b)| b)
}

/// Split `{name}{rest}`.  User command names are alphanumeric and start
/// uppercase; built-in names are alphabetic.
fn split_name(text: &str) -> (&str, &str) {
    let user = text.starts_with(|c: char| c.is_uppercase());
    let end = text
        .find(|c: char| !(c.is_ascii_alphabetic() || (user && c.is_ascii_digit())))
        .unwrap_or(text.len());
    (&text[..end], text[end..].trim())
}

// ── Statement-level parser ────────────────────────────────────────────────────

type Body = Vec<Box<dyn Executable>>;

struct StmtParser {
    stmts: Vec<String>,
    pos: usize,
}

impl StmtParser {
    fn peek_builtin(&self) -> Option<Builtin> {
        let line = self.stmts.get(self.pos)?;
        let (ranges, rest) = Ranges::parse(line);
        if !ranges.is_empty() {
            return None;
        }
        lookup(split_name(rest).0)
    }

    /// Take the next statement's argument text (for `else`/`elseif` lines).
    fn advance_argument(&mut self) -> String {
        let line = self.stmts.get(self.pos).cloned().unwrap_or_default();
        self.pos += 1;
        let (_, rest) = Ranges::parse(&line);
        split_name(rest).1.to_owned()
    }

    /// Parse until one of `stop_at` (not consumed) or end of input.
    fn parse_block_until(&mut self, stop_at: &[Builtin]) -> Result<Body, ExError> {
        let mut stmts = Vec::new();
        while let Some(line) = self.stmts.get(self.pos).cloned() {
            if self.peek_builtin().is_some_and(|b| stop_at.contains(&b)) {
                break;
            }
            self.pos += 1;
            stmts.push(self.parse_one(&line)?);
        }
        Ok(stmts)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.stmts.len()
    }

    fn parse_one(&mut self, line: &str) -> Result<Box<dyn Executable>, ExError> {
        let (ranges, rest) = Ranges::parse(line);
        let (name, argument) = split_name(rest);
        if name.is_empty() {
            return Err(ExError::NotAnEditorCommand(line.to_owned()));
        }

        let Some(builtin) = lookup(name) else {
            return Ok(Box::new(UnknownCommand::new(ranges, name, argument)));
        };

        let check = |flags: CommandFlags| flags.validate(&ranges, argument);
        let block_start = || {
            if ranges.is_empty() {
                Ok(())
            } else {
                Err(ExError::NoRangeAllowed)
            }
        };
        let arg = argument.to_owned();

        let node: Box<dyn Executable> = match builtin {
            Builtin::Break => {
                check(BreakCommand::FLAGS)?;
                Box::new(BreakCommand)
            }
            Builtin::Continue => {
                check(ContinueCommand::FLAGS)?;
                Box::new(ContinueCommand)
            }
            Builtin::Command => {
                check(CmdCommand::FLAGS)?;
                Box::new(CmdCommand::new(arg))
            }
            Builtin::ComClear => {
                check(CmdClearCommand::FLAGS)?;
                Box::new(CmdClearCommand)
            }
            Builtin::DelCommand => {
                check(DelCmdCommand::FLAGS)?;
                Box::new(DelCmdCommand { argument: arg })
            }
            Builtin::Delete => {
                check(DeleteCommand::FLAGS)?;
                Box::new(DeleteCommand { ranges })
            }
            Builtin::Echo => {
                check(EchoCommand::FLAGS)?;
                Box::new(EchoCommand { argument: arg })
            }
            Builtin::Let => {
                check(LetCommand::FLAGS)?;
                Box::new(LetCommand { argument: arg })
            }
            Builtin::Unlet => {
                check(UnletCommand::FLAGS)?;
                Box::new(UnletCommand { argument: arg })
            }
            Builtin::Quit => {
                check(QuitCommand::FLAGS)?;
                Box::new(QuitCommand { argument: arg })
            }
            Builtin::Write => {
                check(WriteCommand::FLAGS)?;
                Box::new(WriteCommand { argument: arg })
            }
            Builtin::Wq => {
                check(WqCommand::FLAGS)?;
                Box::new(WqCommand { argument: arg })
            }
            Builtin::Xit => {
                check(XitCommand::FLAGS)?;
                Box::new(XitCommand { argument: arg })
            }
            Builtin::While => {
                block_start()?;
                Box::new(self.parse_while(argument)?)
            }
            Builtin::For => {
                block_start()?;
                Box::new(self.parse_for(argument)?)
            }
            Builtin::If => {
                block_start()?;
                Box::new(self.parse_if(argument)?)
            }
            Builtin::EndWhile => return Err(ExError::EndWithoutStart("endwhile", "while")),
            Builtin::EndFor => return Err(ExError::EndWithoutStart("endfor", "for")),
            Builtin::EndIf => return Err(ExError::EndifWithoutIf),
            Builtin::Else => return Err(ExError::ElseWithoutIf),
            Builtin::Elseif => return Err(ExError::ElseifWithoutIf),
        };
        Ok(node)
    }

    fn parse_while(&mut self, argument: &str) -> Result<WhileLoop, ExError> {
        let condition = Expression::parse(argument)?;
        let body = self.parse_block_until(&[Builtin::EndWhile])?;
        if self.at_end() {
            return Err(ExError::MissingEnd("endwhile"));
        }
        self.pos += 1;
        Ok(WhileLoop::new(Box::new(condition), body))
    }

    fn parse_for(&mut self, argument: &str) -> Result<ForLoop, ExError> {
        let (variable, rest) = match argument.split_once(char::is_whitespace) {
            Some((v, rest)) => (v, rest.trim_start()),
            None => (argument, ""),
        };
        let items = match rest.strip_prefix("in") {
            Some(expr) if expr.starts_with(char::is_whitespace) => expr,
            _ => return Err(ExError::MissingIn),
        };
        if variable.is_empty() {
            return Err(ExError::MissingIn);
        }
        let items = Expression::parse(items)?;
        let body = self.parse_block_until(&[Builtin::EndFor])?;
        if self.at_end() {
            return Err(ExError::MissingEnd("endfor"));
        }
        self.pos += 1;
        Ok(ForLoop::new(variable, items, body))
    }

    fn parse_if(&mut self, argument: &str) -> Result<IfStatement, ExError> {
        const STOPS: &[Builtin] = &[Builtin::Elseif, Builtin::Else, Builtin::EndIf];

        let mut stmt = IfStatement::default();
        let mut condition = Expression::parse(argument)?;
        loop {
            let body = self.parse_block_until(STOPS)?;
            stmt.branches.push(Branch {
                condition: Box::new(condition),
                body,
            });
            match self.peek_builtin() {
                Some(Builtin::Elseif) => {
                    condition = Expression::parse(&self.advance_argument())?;
                }
                Some(Builtin::Else) => {
                    self.pos += 1;
                    let body = self.parse_block_until(STOPS)?;
                    stmt.else_body = Some(body);
                    match self.peek_builtin() {
                        Some(Builtin::EndIf) => break,
                        Some(Builtin::Else) => return Err(ExError::MultipleElse),
                        Some(_) => return Err(ExError::ElseifAfterElse),
                        None => return Err(ExError::MissingEndif),
                    }
                }
                Some(_) => break,
                None => return Err(ExError::MissingEndif),
            }
        }
        // Consume `endif`.
        self.pos += 1;
        Ok(stmt)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
