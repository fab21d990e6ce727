//! Reduction driver and the embedding API

use tracing::{debug, trace};

use crate::error::{EvalError, EvalResult};
use crate::interp::expression::Expression;
use crate::interp::parser::parse;
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::{Scope, ScopeRef};
use crate::interp::stdlib::testing::{run_checks, CheckReport};
use crate::interp::tuple::split_forms;

/// Reduce until the expression is a value
pub fn interpret(expr: Expression, ctx: &EvalContext) -> EvalResult<Expression> {
    let mut expr = expr;
    while !expr.is_value() {
        trace!(step = %expr, "reduce");
        expr = expr.reduce_one_step(ctx)?;
    }
    Ok(expr)
}

/// Every intermediate expression of a reduction, in order.
///
/// On success the last step is the value. On failure the steps up to the
/// failing one are kept and the error is reported alongside them.
#[derive(Debug, Clone, PartialEq)]
pub struct StepTrace {
    pub steps: Vec<Expression>,
    pub error: Option<EvalError>,
}

impl StepTrace {
    /// Final value, if the reduction finished
    pub fn value(&self) -> Option<&Expression> {
        match self.error {
            Some(_) => None,
            None => self.steps.last(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Reduce until a value, recording every step
pub fn interpret_save_steps(expr: Expression, ctx: &EvalContext) -> StepTrace {
    let mut steps = Vec::new();
    let mut expr = expr;

    while !expr.is_value() {
        steps.push(expr.clone());
        expr = match expr.reduce_one_step(ctx) {
            Ok(next) => next,
            Err(error) => {
                return StepTrace {
                    steps,
                    error: Some(error),
                }
            }
        };
    }

    steps.push(expr);
    StepTrace { steps, error: None }
}

/// Evaluate an operand handed to a special form.
///
/// A `Deferred` is parsed in its own scope; whatever comes out is then
/// reduced to a value, repeating if the result is itself deferred.
pub fn force(expr: Expression, ctx: &EvalContext) -> EvalResult<Expression> {
    let mut expr = expr;
    loop {
        expr = match expr {
            deferred @ Expression::Deferred(_) => deferred.reduce_one_step(ctx)?,
            pending if !pending.is_value() => interpret(pending, ctx)?,
            value => return Ok(value),
        };
    }
}

/// Parse `text` in `scope` and reduce it to a value
pub fn evaluate_text(text: &str, scope: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    force(parse(text, scope, ctx)?, ctx)
}

/// An interpreter session: one program scope plus the built-in tables
pub struct Interpreter {
    context: EvalContext,
    global: ScopeRef,
}

impl Interpreter {
    /// Interpreter with the standard library
    pub fn new() -> Self {
        Self::with_registry(Registry::standard())
    }

    pub fn with_registry(registry: Registry) -> Self {
        Interpreter {
            context: EvalContext::new(registry),
            global: Scope::root(),
        }
    }

    /// Evaluate one top-level form
    pub fn eval(&self, text: &str) -> EvalResult<Expression> {
        debug!(input = text, "eval");
        evaluate_text(text, &self.global, &self.context)
    }

    /// Evaluate one top-level form, keeping every step
    pub fn eval_steps(&self, text: &str) -> StepTrace {
        match parse(text, &self.global, &self.context) {
            Ok(expr) => interpret_save_steps(expr, &self.context),
            Err(error) => StepTrace {
                steps: Vec::new(),
                error: Some(error),
            },
        }
    }

    /// Evaluate every top-level form in `source`, returning the last value.
    ///
    /// Stops at the first error.
    pub fn eval_all(&self, source: &str) -> EvalResult<Expression> {
        let mut last = Expression::Void;
        for form in split_forms(source)? {
            last = self.eval(&form)?;
        }
        Ok(last)
    }

    /// Run every pending `check-expect` without printing
    pub fn run_checks(&self) -> CheckReport {
        run_checks(&self.context)
    }

    pub fn global_scope(&self) -> &ScopeRef {
        &self.global
    }

    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    /// Forget every global definition and pending check
    pub fn clear(&self) {
        self.context.checks.borrow_mut().clear();
        self.global.clear();
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Closures bound at the top level hold the global scope alive
        self.clear();
    }
}
