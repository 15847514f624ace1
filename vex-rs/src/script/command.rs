//! Ex commands: declared range/argument/access policy and the single
//! polymorphic `process_command` operation.

use tracing::trace;

use super::context::ExContext;
use super::error::ExError;
use super::executable::{Executable, Scope};
use super::ranges::Ranges;
use super::result::ExecutionResult;
use super::unknown::UnknownCommand;

// ── Flags ─────────────────────────────────────────────────────────────────────

/// Whether a command accepts a line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFlag {
    Forbidden,
    Optional,
    Required,
}

/// Whether a command accepts an argument string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentFlag {
    Forbidden,
    Optional,
    Required,
}

/// How a command touches the editor.  Declared and logged; not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    SelfSynchronized,
    WriteLock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFlags {
    pub range: RangeFlag,
    pub argument: ArgumentFlag,
    pub access: Access,
}

pub const fn flags(range: RangeFlag, argument: ArgumentFlag, access: Access) -> CommandFlags {
    CommandFlags {
        range,
        argument,
        access,
    }
}

impl CommandFlags {
    /// Check a parsed range and argument against the declared policy.
    pub fn validate(&self, ranges: &Ranges, argument: &str) -> Result<(), ExError> {
        match self.range {
            RangeFlag::Forbidden if !ranges.is_empty() => return Err(ExError::NoRangeAllowed),
            RangeFlag::Required if ranges.is_empty() => return Err(ExError::InvalidRange),
            _ => {}
        }
        match self.argument {
            ArgumentFlag::Forbidden if !argument.is_empty() => {
                Err(ExError::TrailingCharacters(argument.to_owned()))
            }
            ArgumentFlag::Required if argument.is_empty() => Err(ExError::ArgumentRequired),
            _ => Ok(()),
        }
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

/// An Ex command node.  Every `Command` is an [`Executable`].
pub trait Command: std::fmt::Debug {
    fn flags(&self) -> CommandFlags;

    /// Name used in trace output.
    fn name(&self) -> &str;

    /// Run the command.  Range and argument were validated at parse time.
    fn process_command(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult;

    fn as_unknown_command(&self) -> Option<&UnknownCommand> {
        None
    }
}

impl<C: Command> Executable for C {
    fn execute(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult {
        trace!(
            command = self.name(),
            access = ?self.flags().access,
            depth = scope.depth(),
            "dispatch"
        );
        self.process_command(ctx, scope)
    }

    fn as_unknown_command(&self) -> Option<&UnknownCommand> {
        Command::as_unknown_command(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
