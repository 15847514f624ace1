//! Control-flow signal threaded through every statement execution.

use super::error::ExError;

/// Outcome of executing one statement (or one sequence of statements).
#[derive(Debug)]
#[must_use]
pub enum ExecutionResult {
    /// Completed normally; the next sibling runs.
    Success,
    /// Fatal failure; stops every enclosing sequence up to the interpreter.
    Error(ExError),
    /// Leave the nearest enclosing loop.
    Break,
    /// Start the next iteration of the nearest enclosing loop.
    Continue,
}

/// What a loop does with the result of one body pass.
#[derive(Debug)]
pub enum LoopStep {
    /// Re-evaluate the loop condition and keep iterating.
    Next,
    /// Leave the loop with this result.
    Exit(ExecutionResult),
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExecutionResult::Error(_))
    }

    /// Fold a body result into the enclosing loop.
    ///
    /// `Break` and `Continue` are absorbed here and never seen by the loop's
    /// caller.  `Error` leaves the loop unchanged.
    pub fn absorb_in_loop(self) -> LoopStep {
        match self {
            ExecutionResult::Success | ExecutionResult::Continue => LoopStep::Next,
            ExecutionResult::Break => LoopStep::Exit(ExecutionResult::Success),
            err @ ExecutionResult::Error(_) => LoopStep::Exit(err),
        }
    }

    /// Convert into a `Result`, treating every non-error signal as `Ok`.
    pub fn into_result(self) -> Result<(), ExError> {
        match self {
            ExecutionResult::Error(e) => Err(e),
            _ => Ok(()),
        }
    }
}

impl From<Result<(), ExError>> for ExecutionResult {
    fn from(r: Result<(), ExError>) -> Self {
        match r {
            Ok(()) => ExecutionResult::Success,
            Err(e) => ExecutionResult::Error(e),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_is_absorbed_as_success() {
        assert!(matches!(
            ExecutionResult::Break.absorb_in_loop(),
            LoopStep::Exit(ExecutionResult::Success)
        ));
    }

    #[test]
    fn continue_and_success_keep_iterating() {
        assert!(matches!(ExecutionResult::Continue.absorb_in_loop(), LoopStep::Next));
        assert!(matches!(ExecutionResult::Success.absorb_in_loop(), LoopStep::Next));
    }

    #[test]
    fn error_exits_unchanged() {
        let step = ExecutionResult::Error(ExError::ArgumentRequired).absorb_in_loop();
        assert!(matches!(
            step,
            LoopStep::Exit(ExecutionResult::Error(ExError::ArgumentRequired))
        ));
    }

    #[test]
    fn from_result() {
        assert!(ExecutionResult::from(Ok(())).is_success());
        assert!(ExecutionResult::from(Err(ExError::InvalidRange)).is_error());
    }

    #[test]
    fn into_result_only_fails_on_error() {
        assert!(ExecutionResult::Break.into_result().is_ok());
        assert!(ExecutionResult::Error(ExError::InvalidRange).into_result().is_err());
    }
}
