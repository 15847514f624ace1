//! `:while` and `:for` loops.
//!
//! Both fold body results through [`ExecutionResult::absorb_in_loop`], so
//! `Break` and `Continue` never escape a loop and `Error` always does.
//! Neither loop imposes an iteration or nesting limit.

use std::fmt;

use tracing::trace;

use super::context::ExContext;
use super::error::ExError;
use super::executable::{execute_body, Executable, Scope, ScopeKind};
use super::expr::Expression;
use super::result::{ExecutionResult, LoopStep};
use super::value::Value;

// ── Condition ─────────────────────────────────────────────────────────────────

/// A loop or branch condition, re-evaluated on every check.
pub trait Condition: fmt::Debug {
    fn evaluate(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> Result<bool, ExError>;
}

impl Condition for Expression {
    fn evaluate(&self, ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> Result<bool, ExError> {
        Expression::evaluate(self, ctx.vars).map(|v| v.as_bool())
    }
}

// ── WhileLoop ─────────────────────────────────────────────────────────────────

/// `:while {cond}` ... `:endwhile`
#[derive(Debug)]
pub struct WhileLoop {
    pub condition: Box<dyn Condition>,
    pub body: Vec<Box<dyn Executable>>,
}

impl WhileLoop {
    pub fn new(condition: Box<dyn Condition>, body: Vec<Box<dyn Executable>>) -> Self {
        Self { condition, body }
    }
}

impl Executable for WhileLoop {
    fn execute(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult {
        let body_scope = scope.child(ScopeKind::Loop);
        let mut passes = 0usize;
        loop {
            match self.condition.evaluate(ctx, scope) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => return ExecutionResult::Error(e),
            }
            passes += 1;
            if let LoopStep::Exit(result) = execute_body(&self.body, ctx, &body_scope).absorb_in_loop() {
                trace!(passes, "while: left loop");
                return result;
            }
        }
        trace!(passes, "while: condition false");
        ExecutionResult::Success
    }
}

// ── ForLoop ───────────────────────────────────────────────────────────────────

/// `:for {var} in {list}` ... `:endfor`
///
/// The list is evaluated once, before the first pass.
#[derive(Debug)]
pub struct ForLoop {
    pub variable: String,
    pub items: Expression,
    pub body: Vec<Box<dyn Executable>>,
}

impl ForLoop {
    pub fn new(variable: impl Into<String>, items: Expression, body: Vec<Box<dyn Executable>>) -> Self {
        Self {
            variable: variable.into(),
            items,
            body,
        }
    }

    fn items(&self, ctx: &ExContext<'_>) -> Result<Vec<Value>, ExError> {
        match self.items.evaluate(ctx.vars)? {
            Value::List(items) => Ok(items),
            _ => Err(ExError::ListRequired),
        }
    }
}

impl Executable for ForLoop {
    fn execute(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult {
        let items = match self.items(ctx) {
            Ok(items) => items,
            Err(e) => return ExecutionResult::Error(e),
        };
        let body_scope = scope.child(ScopeKind::Loop);
        trace!(var = %self.variable, count = items.len(), "for: start");
        for item in items {
            ctx.vars.set(&self.variable, item);
            if let LoopStep::Exit(result) = execute_body(&self.body, ctx, &body_scope).absorb_in_loop() {
                return result;
            }
        }
        ExecutionResult::Success
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
