//! Special forms that control evaluation: definitions, conditionals,
//! short-circuit logic, `local` and `quote`.
//!
//! Operands arrive as `Deferred` text (or as a special-form procedure when
//! the operand is itself a special-form name) and are forced only when the
//! form needs them.

use std::rc::Rc;

use tracing::debug;

use super::{expect_arity, pair};
use crate::error::{EvalError, EvalResult};
use crate::interp::evaluator::{evaluate_text, force};
use crate::interp::expression::{Deferred, Expression, Lambda};
use crate::interp::numeric::looks_numeric;
use crate::interp::parser::parse_datum;
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::{Scope, ScopeRef};
use crate::interp::tuple::parse_tuple;

pub fn register(registry: &mut Registry) {
    registry.register_special_form("define", define);
    registry.register_special_form("if", if_form);
    registry.register_special_form("cond", cond);
    registry.register_special_form("and", and);
    registry.register_special_form("or", or);
    registry.register_special_form("local", local);
    registry.register_special_form("quote", quote);
}

/// Raw text of an operand, failing if it was already parsed
pub(crate) fn operand_text<'a>(form: &str, operand: &'a Expression) -> EvalResult<&'a Deferred> {
    match operand {
        Expression::Deferred(deferred) => Ok(deferred),
        other => Err(EvalError::Syntax(format!(
            "{}: expected an expression, found the special form {}",
            form, other
        ))),
    }
}

fn is_tuple_text(text: &str) -> bool {
    text.starts_with(['(', '['])
}

/// Reject literals and anything else that cannot name a binding
pub(crate) fn check_identifier(form: &str, name: &str) -> EvalResult<()> {
    let literal = name.is_empty()
        || looks_numeric(name)
        || name.starts_with(['"', '#', '\'', '(', '[', ')', ']'])
        || matches!(name, "true" | "false" | "empty" | "lambda" | "else");
    if literal {
        return Err(EvalError::Syntax(format!(
            "{}: expected a variable name, found {}",
            form, name
        )));
    }
    Ok(())
}

/// A name may be bound once per program scope and never over a built-in
pub(crate) fn ensure_unbound(name: &str, target: &ScopeRef, ctx: &EvalContext) -> EvalResult<()> {
    if target.has_local(name) || ctx.registry.contains(name) {
        return Err(EvalError::DuplicateBinding(name.to_string()));
    }
    Ok(())
}

fn define(args: Vec<Expression>, scope: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    let (name, body) = pair("define", args)?;
    let name = operand_text("define", &name)?;
    let target = scope.global();

    if is_tuple_text(&name.text) {
        return define_function(&name.text, body, scope, &target, ctx);
    }

    check_identifier("define", &name.text)?;
    ensure_unbound(&name.text, &target, ctx)?;

    let value = force(body, ctx)?;
    let value = match value {
        Expression::Lambda(lambda) if lambda.name.is_none() => Expression::Lambda(Lambda {
            name: Some(name.text.clone()),
            ..lambda
        }),
        other => other,
    };

    target.define(&name.text, value)?;
    Ok(Expression::Void)
}

/// `(define (name params...) body)`
fn define_function(
    signature: &str,
    body: Expression,
    scope: &ScopeRef,
    target: &ScopeRef,
    ctx: &EvalContext,
) -> EvalResult<Expression> {
    let mut parts = parse_tuple(signature)?.into_iter();
    let name = parts
        .next()
        .ok_or_else(|| EvalError::Syntax("define: expected a function name".to_string()))?;
    let params: Vec<String> = parts.collect();

    check_identifier("define", &name)?;
    for param in &params {
        check_identifier("define", param)?;
    }
    ensure_unbound(&name, target, ctx)?;

    debug!(name = %name, params = ?params, "define function");
    let lambda = Lambda {
        name: Some(name.clone()),
        params,
        body: body.to_string(),
        scope: Rc::clone(scope),
    };
    target.define(&name, Expression::Lambda(lambda))?;
    Ok(Expression::Void)
}

fn boolean_test(form: &str, value: Expression) -> EvalResult<bool> {
    match value {
        Expression::Boolean(result) => Ok(result),
        other => Err(EvalError::type_mismatch(
            form,
            "boolean",
            format!("{} ({})", other, other.kind_name()),
        )),
    }
}

fn if_form(args: Vec<Expression>, _: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    expect_arity("if", &args, 3)?;
    let mut args = args.into_iter();
    let (test, then_branch, else_branch) = match (args.next(), args.next(), args.next()) {
        (Some(test), Some(then_branch), Some(else_branch)) => (test, then_branch, else_branch),
        _ => return Err(EvalError::arity("if", 3, 0)),
    };

    if boolean_test("if", force(test, ctx)?)? {
        force(then_branch, ctx)
    } else {
        force(else_branch, ctx)
    }
}

/// Clauses are tried in order; `else` only as the last one
fn cond(args: Vec<Expression>, _: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    let count = args.len();
    for (index, clause) in args.iter().enumerate() {
        let clause = operand_text("cond", clause)?;
        if !is_tuple_text(&clause.text) {
            return Err(EvalError::Syntax(format!(
                "cond: expected a clause with a question and an answer, found {}",
                clause.text
            )));
        }

        let parts = parse_tuple(&clause.text)?;
        if parts.len() != 2 {
            return Err(EvalError::Syntax(format!(
                "cond: expected a clause with a question and an answer, found {}",
                clause.text
            )));
        }

        let matched = if parts[0] == "else" {
            if index + 1 != count {
                return Err(EvalError::Syntax(
                    "cond: found an else clause that isn't the last clause".to_string(),
                ));
            }
            true
        } else {
            boolean_test("cond", evaluate_text(&parts[0], &clause.scope, ctx)?)?
        };

        if matched {
            return evaluate_text(&parts[1], &clause.scope, ctx);
        }
    }

    Err(EvalError::Domain(
        "cond: Reached end without finding true condition".to_string(),
    ))
}

fn and(args: Vec<Expression>, _: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    for arg in args {
        if !boolean_test("and", force(arg, ctx)?)? {
            return Ok(Expression::Boolean(false));
        }
    }
    Ok(Expression::Boolean(true))
}

fn or(args: Vec<Expression>, _: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    for arg in args {
        if boolean_test("or", force(arg, ctx)?)? {
            return Ok(Expression::Boolean(true));
        }
    }
    Ok(Expression::Boolean(false))
}

/// `(local [definitions...] body)`: the definitions live only in the block
fn local(args: Vec<Expression>, scope: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    let (definitions, body) = pair("local", args)?;
    let definitions = operand_text("local", &definitions)?;
    if !is_tuple_text(&definitions.text) {
        return Err(EvalError::Syntax(format!(
            "local: expected a sequence of definitions, found {}",
            definitions.text
        )));
    }

    let block = Scope::program(scope);
    for definition in parse_tuple(&definitions.text)? {
        let is_definition = is_tuple_text(&definition)
            && parse_tuple(&definition)?
                .first()
                .map_or(false, |head| head == "define" || head == "define-struct");
        if !is_definition {
            return Err(EvalError::Syntax(format!(
                "local: expected a definition, found {}",
                definition
            )));
        }
        evaluate_text(&definition, &block, ctx)?;
    }

    debug!(names = ?block.local_names(), "local block");
    evaluate_text(&body.to_string(), &block, ctx)
}

fn quote(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = super::single("quote", args)?;
    parse_datum(&arg.to_string())
}
