//! Ex scripting: parser, control flow, and user-defined commands.
//!
//! This module implements a tree-walking interpreter for the Ex command
//! language of vi-like editors, covering:
//!
//! - Control flow: `:while` … `:endwhile`, `:for` … `:endfor`,
//!   `:if` … `:elseif` … `:else` … `:endif`, `:break`, `:continue`
//! - User-defined commands: `:command`, `:delcommand`, `:comclear`, and
//!   bounded alias expansion of unknown command names
//! - `:let`, `:unlet`, `:echo`, `[range]:delete`, `:write`, `:quit`, `:wq`,
//!   `:xit`
//!
//! # Quick start
//!
//! ```rust
//! use vex::script::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! interp.exec_script("command -nargs=1 Twice echo <args> * 2\nTwice 21").unwrap();
//! assert_eq!(interp.output.lines, vec!["42"]);
//! ```

pub mod alias;
pub mod cmd;
pub mod command;
pub mod commands;
pub mod conditional;
pub mod context;
pub mod error;
pub mod executable;
pub mod expr;
pub mod interp;
pub mod loops;
pub mod parser;
pub mod ranges;
pub mod result;
pub mod unknown;
pub mod value;

#[cfg(test)]
mod testing;

// Re-exports for convenience.
pub use alias::{AliasHandler, AliasRegistry, CommandAlias, GoalCommand};
pub use command::{Access, ArgumentFlag, Command, CommandFlags, RangeFlag};
pub use context::{ExContext, ExOutput, MessageSink};
pub use error::ExError;
pub use executable::{Executable, Scope, ScopeKind};
pub use interp::Interpreter;
pub use parser::{ExParser, ScriptParser};
pub use result::ExecutionResult;
pub use unknown::{UnknownCommand, MAX_ALIAS_DEPTH};
pub use value::Value;
