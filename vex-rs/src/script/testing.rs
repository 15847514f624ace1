//! Stub nodes shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::context::ExContext;
use super::error::ExError;
use super::executable::{Executable, Scope};
use super::loops::Condition;
use super::result::ExecutionResult;

pub type Log = Rc<RefCell<Vec<String>>>;

/// Records its label every time it runs, then succeeds.
#[derive(Debug)]
pub struct Probe {
    label: String,
    log: Log,
}

impl Probe {
    pub fn new(label: &str) -> (Self, Log) {
        let log: Log = Rc::default();
        (Self::sharing(label, &log).0, log)
    }

    pub fn sharing(label: &str, log: &Log) -> (Self, Log) {
        let probe = Probe {
            label: label.to_owned(),
            log: Rc::clone(log),
        };
        (probe, Rc::clone(log))
    }
}

impl Executable for Probe {
    fn execute(&self, _ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        self.log.borrow_mut().push(self.label.clone());
        ExecutionResult::Success
    }
}

/// Always produces the same control-flow signal.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Break,
    Continue,
    Error,
}

impl Executable for Signal {
    fn execute(&self, _ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> ExecutionResult {
        match self {
            Signal::Break => ExecutionResult::Break,
            Signal::Continue => ExecutionResult::Continue,
            Signal::Error => ExecutionResult::Error(ExError::InvalidRange),
        }
    }
}

/// Produces `signal` only on the given (1-based) pass, `Success` otherwise.
#[derive(Debug)]
pub struct SignalOnPass {
    pub pass: usize,
    pub signal: Signal,
    seen: Cell<usize>,
}

impl SignalOnPass {
    pub fn new(pass: usize, signal: Signal) -> Self {
        Self {
            pass,
            signal,
            seen: Cell::new(0),
        }
    }
}

impl Executable for SignalOnPass {
    fn execute(&self, ctx: &mut ExContext<'_>, scope: &Scope<'_>) -> ExecutionResult {
        self.seen.set(self.seen.get() + 1);
        if self.seen.get() == self.pass {
            self.signal.execute(ctx, scope)
        } else {
            ExecutionResult::Success
        }
    }
}

/// True for the first `limit` evaluations, then false.  Counts evaluations.
#[derive(Debug)]
pub struct Countdown {
    limit: usize,
    pub evaluations: Rc<Cell<usize>>,
}

impl Countdown {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            evaluations: Rc::default(),
        }
    }
}

impl Condition for Countdown {
    fn evaluate(&self, _ctx: &mut ExContext<'_>, _scope: &Scope<'_>) -> Result<bool, ExError> {
        let n = self.evaluations.get();
        self.evaluations.set(n + 1);
        Ok(n < self.limit)
    }
}
