//! `:if` / `:elseif` / `:else` / `:endif`

use tracing::trace;

use super::context::ExContext;
use super::executable::{execute_body, Executable, Scope, ScopeKind};
use super::loops::Condition;
use super::result::ExecutionResult;

/// One guarded branch of an [`IfStatement`].
#[derive(Debug)]
pub struct Branch {
    pub condition: Box<dyn Condition>,
    pub body: Vec<Box<dyn Executable>>,
}

/// Runs the first branch whose condition holds, or the `else` body.
///
/// Signals from the chosen body are forwarded unchanged; a `:break` inside
/// an `:if` inside a loop still reaches the loop.
#[derive(Debug, Default)]
pub struct IfStatement {
    pub branches: Vec<Branch>,
    pub else_body: Option<Vec<Box<dyn Executable>>>,
}

impl Executable for IfStatement {
    fn execute(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult {
        let body_scope = scope.child(ScopeKind::Conditional);
        for (i, branch) in self.branches.iter().enumerate() {
            match branch.condition.evaluate(ctx, scope) {
                Ok(true) => {
                    trace!(branch = i, "if: taken");
                    return execute_body(&branch.body, ctx, &body_scope);
                }
                Ok(false) => {}
                Err(e) => return ExecutionResult::Error(e),
            }
        }
        match &self.else_body {
            Some(body) => execute_body(body, ctx, &body_scope),
            None => ExecutionResult::Success,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::expr::Expression;
    use crate::script::testing::{Probe, Signal};
    use crate::script::Interpreter;

    fn branch(cond: &str, body: Vec<Box<dyn Executable>>) -> Branch {
        Branch {
            condition: Box::new(Expression::parse(cond).unwrap()),
            body,
        }
    }

    fn run(node: &dyn Executable) -> ExecutionResult {
        let mut interp = Interpreter::new();
        interp.with_context(|ctx| node.execute(ctx, &Scope::script()))
    }

    #[test]
    fn first_true_branch_wins() {
        let (a, log) = Probe::new("a");
        let (b, _) = Probe::sharing("b", &log);
        let (c, _) = Probe::sharing("c", &log);
        let stmt = IfStatement {
            branches: vec![
                branch("0", vec![Box::new(a)]),
                branch("1", vec![Box::new(b)]),
            ],
            else_body: Some(vec![Box::new(c)]),
        };
        assert!(run(&stmt).is_success());
        assert_eq!(*log.borrow(), vec!["b"]);
    }

    #[test]
    fn else_runs_when_nothing_matches() {
        let (c, log) = Probe::new("c");
        let stmt = IfStatement {
            branches: vec![branch("1 > 2", Vec::new())],
            else_body: Some(vec![Box::new(c)]),
        };
        assert!(run(&stmt).is_success());
        assert_eq!(*log.borrow(), vec!["c"]);
    }

    #[test]
    fn signals_pass_through() {
        let stmt = IfStatement {
            branches: vec![branch("1", vec![Box::new(Signal::Break)])],
            else_body: None,
        };
        assert!(matches!(run(&stmt), ExecutionResult::Break));
    }

    #[test]
    fn condition_error_propagates() {
        let stmt = IfStatement {
            branches: vec![branch("undefined_thing", Vec::new())],
            else_body: None,
        };
        assert!(run(&stmt).is_error());
    }
}
