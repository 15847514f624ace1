//! The uniform interface every statement node implements.
//!
//! Nodes never hold a pointer to their parent.  Instead the enclosing
//! statement passes a [`Scope`] describing the lexical chain down to each
//! child at execution time; the chain is only ever used for lookups.

use std::fmt;

use super::context::ExContext;
use super::result::ExecutionResult;
use super::unknown::UnknownCommand;

// ── Scope ─────────────────────────────────────────────────────────────────────

/// What kind of statement opened a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Top level of a script run.
    Script,
    /// Body of a `:while` or `:for`.
    Loop,
    /// Branch of an `:if`.
    Conditional,
}

/// One link of the lexical scope chain.
#[derive(Debug)]
pub struct Scope<'p> {
    kind: ScopeKind,
    parent: Option<&'p Scope<'p>>,
}

impl Scope<'static> {
    /// The root scope of a script run.
    pub fn script() -> Self {
        Scope {
            kind: ScopeKind::Script,
            parent: None,
        }
    }
}

impl<'p> Scope<'p> {
    /// Open a nested scope whose parent is `self`.
    pub fn child(&'p self, kind: ScopeKind) -> Scope<'p> {
        Scope {
            kind,
            parent: Some(self),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&Scope<'p>> {
        self.parent
    }

    /// Iterate from this scope outwards to the root.
    pub fn chain(&self) -> impl Iterator<Item = &Scope<'p>> {
        std::iter::successors(Some(self), |s| s.parent())
    }

    /// `true` if any enclosing scope is a loop body.
    pub fn within_loop(&self) -> bool {
        self.chain().any(|s| s.kind() == ScopeKind::Loop)
    }

    /// Number of links above this scope.
    pub fn depth(&self) -> usize {
        self.chain().count() - 1
    }
}

// ── Executable ────────────────────────────────────────────────────────────────

/// Any script-tree node that can run against an editing session.
pub trait Executable: fmt::Debug {
    /// Run the node.  `scope` is the scope the node appears in.
    fn execute(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult;

    /// `Some` if this node is a command nobody recognised (a possible alias).
    fn as_unknown_command(&self) -> Option<&UnknownCommand> {
        None
    }
}

/// Run `body` in order, stopping at the first result that is not `Success`.
///
/// Every sequence of sibling statements goes through here, so a non-loop
/// parent forwards `Error`, `Break`, and `Continue` to its caller unchanged.
pub fn execute_body(
    body: &[Box<dyn Executable>],
    ctx: &mut ExContext<'_>,
    scope: &Scope<'_>,
) -> ExecutionResult {
    for stmt in body {
        match stmt.execute(ctx, scope) {
            ExecutionResult::Success => {}
            other => return other,
        }
    }
    ExecutionResult::Success
}

/// A plain statement sequence with no scope of its own (`a | b` expanded
/// from a single alias).
#[derive(Debug, Default)]
pub struct Block {
    pub body: Vec<Box<dyn Executable>>,
}

impl Block {
    pub fn new(body: Vec<Box<dyn Executable>>) -> Self {
        Self { body }
    }
}

impl Executable for Block {
    fn execute(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult {
        execute_body(&self.body, ctx, scope)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
