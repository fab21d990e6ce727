//! Error types for the interpreter


use thiserror::Error;

/// Errors raised while parsing or reducing a top-level form.
///
/// Every variant is terminal for the form being reduced; the REPL reports it
/// and moves on to the next input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Text that cannot be tokenized or turned into an expression
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Identifier missing from the scope chain and both registries
    #[error("Unbound name: {0}")]
    UnboundName(String),

    /// An operation received the wrong kind of value
    #[error("Type error: {context}: expected {expected}, found {found}")]
    Type {
        context: String,
        expected: String,
        found: String,
    },

    /// Wrong number of arguments
    #[error("Arity error: {callee}: expected {expected} argument(s), found {found}")]
    Arity {
        callee: String,
        expected: String,
        found: usize,
    },

    /// Name already bound in the target scope
    #[error("Duplicate binding: {0} is already defined")]
    DuplicateBinding(String),

    /// Operation undefined for the given values
    #[error("Domain error: {0}")]
    Domain(String),
}

impl EvalError {
    /// Build a type error for `context` expecting `expected`
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl ToString,
    ) -> Self {
        EvalError::Type {
            context: context.into(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Build an arity error for an exact argument count
    pub fn arity(callee: impl Into<String>, expected: usize, found: usize) -> Self {
        EvalError::Arity {
            callee: callee.into(),
            expected: expected.to_string(),
            found,
        }
    }

    /// Build an arity error for a lower bound (`at least n`)
    pub fn arity_at_least(callee: impl Into<String>, minimum: usize, found: usize) -> Self {
        EvalError::Arity {
            callee: callee.into(),
            expected: format!("at least {}", minimum),
            found,
        }
    }
}

/// Errors surfaced by the command-line front end
#[derive(Error, Debug)]
pub enum AppError {
    /// Evaluation errors
    #[error("{0}")]
    Eval(#[from] EvalError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Line editor failure
    #[error("Readline error: {0}")]
    Readline(String),

    /// A batch run finished with failing forms
    #[error("{failed} form(s) in {file} failed")]
    RunFailed { file: String, failed: usize },
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for AppError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        AppError::Readline(err.to_string())
    }
}

/// Result type for parsing and reduction
pub type EvalResult<T> = Result<T, EvalError>;

/// Result type for front-end operations
pub type AppResult<T> = Result<T, AppError>;
