//! List construction and access over persistent vectors

use super::{list_arg, pair, single};
use crate::error::{EvalError, EvalResult};
use crate::interp::expression::Expression;
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::ScopeRef;

pub fn register(registry: &mut Registry) {
    registry.register_procedure("cons", cons);
    registry.register_procedure("list", list);
    registry.register_procedure("first", first);
    registry.register_procedure("second", second);
    registry.register_procedure("third", third);
    registry.register_procedure("rest", rest);
    registry.register_procedure("empty?", is_empty);
    registry.register_procedure("cons?", is_cons);
    registry.register_procedure("list?", is_list);
    registry.register_procedure("member?", member);
    registry.register_procedure("length", length);
    registry.register_procedure("append", append);
    registry.register_procedure("reverse", reverse);
}

fn cons(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (head, tail) = pair("cons", args)?;
    let mut items = list_arg("cons", &tail)?.clone();
    items.push_front(head);
    Ok(Expression::List(items))
}

fn list(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    Ok(Expression::List(args.into_iter().collect()))
}

fn nth(callee: &str, args: Vec<Expression>, index: usize) -> EvalResult<Expression> {
    let arg = single(callee, args)?;
    let items = list_arg(callee, &arg)?;
    items.get(index).cloned().ok_or_else(|| {
        let expected = match index {
            0 => "non-empty list".to_string(),
            n => format!("list with at least {} elements", n + 1),
        };
        EvalError::type_mismatch(callee, expected, &arg)
    })
}

fn first(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    nth("first", args, 0)
}

fn second(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    nth("second", args, 1)
}

fn third(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    nth("third", args, 2)
}

fn rest(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("rest", args)?;
    let items = list_arg("rest", &arg)?;
    if items.is_empty() {
        return Err(EvalError::type_mismatch("rest", "non-empty list", &arg));
    }
    Ok(Expression::List(items.skip(1)))
}

fn is_empty(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("empty?", args)?;
    Ok(Expression::Boolean(
        matches!(&arg, Expression::List(items) if items.is_empty()),
    ))
}

fn is_cons(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("cons?", args)?;
    Ok(Expression::Boolean(
        matches!(&arg, Expression::List(items) if !items.is_empty()),
    ))
}

fn is_list(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("list?", args)?;
    Ok(Expression::Boolean(matches!(arg, Expression::List(_))))
}

fn member(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (needle, haystack) = pair("member?", args)?;
    let items = list_arg("member?", &haystack)?;
    Ok(Expression::Boolean(
        items.iter().any(|item| item.structurally_equal(&needle)),
    ))
}

fn length(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("length", args)?;
    Ok(Expression::integer(list_arg("length", &arg)?.len()))
}

fn append(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let mut joined = im::Vector::new();
    for arg in &args {
        joined.append(list_arg("append", arg)?.clone());
    }
    Ok(Expression::List(joined))
}

fn reverse(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("reverse", args)?;
    let items = list_arg("reverse", &arg)?;
    Ok(Expression::List(items.iter().rev().cloned().collect()))
}
