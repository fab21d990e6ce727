//! # racket-stepper
//!
//! A small-step interpreter for a Racket student-language subset.
//!
//! Source text is parsed lazily into expressions that are reduced one step at
//! a time, so every intermediate program can be shown:
//!
//! ```
//! use racket_stepper::Interpreter;
//!
//! let interp = Interpreter::new();
//! let trace = interp.eval_steps("(+ (* 2 3) 4)");
//! let steps: Vec<String> = trace.steps.iter().map(|s| s.to_string()).collect();
//! assert_eq!(steps.last().map(String::as_str), Some("10"));
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod interp;
/// Command-line interface and argument parsing
pub mod cli;
/// Read-Eval-Print Loop implementation
pub mod repl;
/// Command execution
pub mod commands;

pub use config::ReplConfig;
pub use error::{AppError, AppResult, EvalError, EvalResult};
pub use interp::{
    interpret, interpret_save_steps, CheckReport, EvalContext, Expression, Interpreter, Registry,
    Scope, ScopeRef, StepTrace,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
