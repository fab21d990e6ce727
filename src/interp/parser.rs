//! Turns one token of source text into an expression
//!
//! Tuples become [`Partial`] expressions and are classified later by the
//! reduction step; everything else is resolved here.

use crate::error::{EvalError, EvalResult};
use crate::interp::expression::{Deferred, Expression, Partial};
use crate::interp::numeric::{looks_numeric, parse_number};
use crate::interp::registry::EvalContext;
use crate::interp::scope::{Scope, ScopeRef};
use crate::interp::tuple::{parse_string, parse_symbol, parse_tuple};

/// Parse a single form in `scope`.
///
/// Literals are recognised first. Bare names resolve against the scope
/// chain, then the procedure table, then the special-form table.
pub fn parse(text: &str, scope: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    let text = text.trim();
    let first = text
        .chars()
        .next()
        .ok_or_else(|| EvalError::Syntax("Empty expression".to_string()))?;

    match first {
        '(' | '[' => {
            return Ok(Expression::Partial(Partial {
                tokens: parse_tuple(text)?,
                scope: Scope::child(scope),
            }))
        }
        '"' => return parse_string(text).map(Expression::Str),
        '#' => return parse_hash_literal(text),
        '\'' => return parse_quoted(text),
        _ => {}
    }

    if let Some(literal) = parse_keyword_literal(text) {
        return Ok(literal);
    }

    if looks_numeric(text) {
        return parse_number(text).map(|number| number.into_expression());
    }

    if scope.contains(text) {
        return scope.get_definition(text);
    }

    ctx.registry
        .lookup_procedure(text)
        .or_else(|| ctx.registry.lookup_special_form(text))
        .map(Expression::Procedure)
        .ok_or_else(|| EvalError::UnboundName(text.to_string()))
}

/// Operand of a special form: its own name becomes the procedure, every
/// other token is kept as unparsed text.
pub fn parse_special_form(text: &str, scope: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    if let Some(form) = ctx.registry.lookup_special_form(text) {
        return Ok(Expression::Procedure(form));
    }

    Ok(Expression::Deferred(Deferred {
        text: text.to_string(),
        scope: Scope::child(scope),
    }))
}

/// Read `text` as data, the way `quote` sees it
pub fn parse_datum(text: &str) -> EvalResult<Expression> {
    let text = text.trim();
    let first = text
        .chars()
        .next()
        .ok_or_else(|| EvalError::Syntax("quote: expected a datum".to_string()))?;

    match first {
        '(' | '[' => {
            let items = parse_tuple(text)?
                .iter()
                .map(|item| parse_datum(item))
                .collect::<EvalResult<im::Vector<_>>>()?;
            Ok(Expression::List(items))
        }
        '"' => parse_string(text).map(Expression::Str),
        '\'' => parse_datum(&text[1..]),
        '#' => parse_hash_literal(text),
        _ if looks_numeric(text) => parse_number(text).map(|number| number.into_expression()),
        _ => Ok(match text {
            "true" => Expression::Boolean(true),
            "false" => Expression::Boolean(false),
            name => Expression::Symbol(name.to_string()),
        }),
    }
}

fn parse_keyword_literal(text: &str) -> Option<Expression> {
    match text {
        "true" => Some(Expression::Boolean(true)),
        "false" => Some(Expression::Boolean(false)),
        "empty" => Some(Expression::empty()),
        _ => None,
    }
}

fn parse_quoted(text: &str) -> EvalResult<Expression> {
    match text[1..].chars().next() {
        Some('(') | Some('[') => parse_datum(&text[1..]),
        Some('"') => parse_datum(&text[1..]),
        _ if looks_numeric(&text[1..]) => parse_datum(&text[1..]),
        _ => parse_symbol(text).map(Expression::Symbol),
    }
}

fn parse_hash_literal(text: &str) -> EvalResult<Expression> {
    match text {
        "#t" | "#true" => Ok(Expression::Boolean(true)),
        "#f" | "#false" => Ok(Expression::Boolean(false)),
        "#<void>" | "#void" => Ok(Expression::Void),
        _ => match text.strip_prefix("#\\") {
            Some(name) => parse_character(name).map(Expression::Character),
            None => Err(EvalError::Syntax(format!("Invalid literal: {}", text))),
        },
    }
}

fn parse_character(name: &str) -> EvalResult<char> {
    match name {
        "space" => return Ok(' '),
        "newline" => return Ok('\n'),
        "tab" => return Ok('\t'),
        _ => {}
    }

    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(EvalError::Syntax(format!("Invalid character: #\\{}", name))),
    }
}
