//! Output and sequencing

use std::io::{self, Write};

use tracing::warn;

use super::{expect_arity, expect_at_least, single};
use crate::error::EvalResult;
use crate::interp::expression::Expression;
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::ScopeRef;

pub fn register(registry: &mut Registry) {
    registry.register_procedure("display", display);
    registry.register_procedure("newline", newline);
    registry.register_procedure("begin", begin);
}

/// Text `display` writes: strings and characters without their quoting
pub fn display_text(value: &Expression) -> String {
    match value {
        Expression::Str(text) => text.clone(),
        Expression::Character(ch) => ch.to_string(),
        other => other.to_string(),
    }
}

/// Write to stdout. Output is best effort: a closed or failing stdout is
/// logged and never turns into an evaluation error.
fn emit(callee: &str, text: &str) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
        warn!(procedure = callee, error = %e, "stdout write failed");
    }
}

fn display(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("display", args)?;
    emit("display", &display_text(&arg));
    Ok(Expression::Void)
}

fn newline(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    expect_arity("newline", &args, 0)?;
    emit("newline", "\n");
    Ok(Expression::Void)
}

/// Arguments arrive already reduced left to right; the last one is the result
fn begin(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    expect_at_least("begin", &args, 1)?;
    Ok(args.into_iter().last().unwrap_or(Expression::Void))
}
