//! Symbol procedures

use super::{pair, single, symbol_arg};
use crate::error::EvalResult;
use crate::interp::expression::Expression;
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::ScopeRef;

pub fn register(registry: &mut Registry) {
    registry.register_procedure("symbol?", is_symbol);
    registry.register_procedure("symbol=?", symbol_eq);
    registry.register_procedure("symbol->string", symbol_to_string);
}

fn is_symbol(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("symbol?", args)?;
    Ok(Expression::Boolean(matches!(arg, Expression::Symbol(_))))
}

fn symbol_eq(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (a, b) = pair("symbol=?", args)?;
    Ok(Expression::Boolean(
        symbol_arg("symbol=?", &a)? == symbol_arg("symbol=?", &b)?,
    ))
}

fn symbol_to_string(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("symbol->string", args)?;
    Ok(Expression::Str(symbol_arg("symbol->string", &arg)?.to_string()))
}
