//! vex: an Ex-script execution engine.
//!
//! The interpreter core lives in [`script`]; [`editor`] and [`var`] hold the
//! session state it operates on, and [`cli`] / [`config`] serve the `vex`
//! binary.

pub mod cli;
pub mod config;
pub mod editor;
pub mod script;
pub mod var;
