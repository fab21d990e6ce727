//! Built-in procedures and special forms

pub mod boolean;
pub mod control;
pub mod io;
pub mod lists;
pub mod math;
pub mod strings;
pub mod structs;
pub mod symbols;
pub mod testing;

use num_bigint::BigInt;

use crate::error::{EvalError, EvalResult};
use crate::interp::expression::Expression;
use crate::interp::numeric::Numeric;
use crate::interp::registry::Registry;

/// Install the whole library
pub fn register_all(registry: &mut Registry) {
    math::register(registry);
    boolean::register(registry);
    lists::register(registry);
    strings::register(registry);
    symbols::register(registry);
    io::register(registry);
    control::register(registry);
    structs::register(registry);
    testing::register(registry);
}

pub(crate) fn expect_arity(callee: &str, args: &[Expression], expected: usize) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::arity(callee, expected, args.len()))
    }
}

pub(crate) fn expect_at_least(callee: &str, args: &[Expression], minimum: usize) -> EvalResult<()> {
    if args.len() >= minimum {
        Ok(())
    } else {
        Err(EvalError::arity_at_least(callee, minimum, args.len()))
    }
}

/// Take the only argument of a one-argument procedure
pub(crate) fn single(callee: &str, args: Vec<Expression>) -> EvalResult<Expression> {
    expect_arity(callee, &args, 1)?;
    args.into_iter()
        .next()
        .ok_or_else(|| EvalError::arity(callee, 1, 0))
}

/// Take both arguments of a two-argument procedure
pub(crate) fn pair(callee: &str, args: Vec<Expression>) -> EvalResult<(Expression, Expression)> {
    expect_arity(callee, &args, 2)?;
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(first), Some(second)) => Ok((first, second)),
        _ => Err(EvalError::arity(callee, 2, 0)),
    }
}

pub(crate) fn number_arg(callee: &str, arg: &Expression) -> EvalResult<Numeric> {
    Numeric::from_expression(arg, callee)
}

pub(crate) fn integer_arg(callee: &str, arg: &Expression) -> EvalResult<BigInt> {
    number_arg(callee, arg)?
        .as_integer()
        .ok_or_else(|| EvalError::type_mismatch(callee, "exact integer", arg))
}

/// Non-negative index small enough for host-side indexing
pub(crate) fn index_arg(callee: &str, arg: &Expression) -> EvalResult<usize> {
    use num_traits::ToPrimitive;
    integer_arg(callee, arg)?
        .to_usize()
        .ok_or_else(|| EvalError::type_mismatch(callee, "natural number", arg))
}

pub(crate) fn string_arg<'a>(callee: &str, arg: &'a Expression) -> EvalResult<&'a str> {
    match arg {
        Expression::Str(text) => Ok(text),
        other => Err(EvalError::type_mismatch(callee, "string", other)),
    }
}

pub(crate) fn bool_arg(callee: &str, arg: &Expression) -> EvalResult<bool> {
    match arg {
        Expression::Boolean(value) => Ok(*value),
        other => Err(EvalError::type_mismatch(callee, "boolean", other)),
    }
}

pub(crate) fn char_arg(callee: &str, arg: &Expression) -> EvalResult<char> {
    match arg {
        Expression::Character(ch) => Ok(*ch),
        other => Err(EvalError::type_mismatch(callee, "character", other)),
    }
}

pub(crate) fn symbol_arg<'a>(callee: &str, arg: &'a Expression) -> EvalResult<&'a str> {
    match arg {
        Expression::Symbol(name) => Ok(name),
        other => Err(EvalError::type_mismatch(callee, "symbol", other)),
    }
}

pub(crate) fn list_arg<'a>(callee: &str, arg: &'a Expression) -> EvalResult<&'a im::Vector<Expression>> {
    match arg {
        Expression::List(items) => Ok(items),
        other => Err(EvalError::type_mismatch(callee, "list", other)),
    }
}
