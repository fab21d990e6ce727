//! Boolean procedures and structural equality

use super::{bool_arg, pair, single};
use crate::error::EvalResult;
use crate::interp::expression::Expression;
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::ScopeRef;

pub fn register(registry: &mut Registry) {
    registry.register_procedure("not", not);
    registry.register_procedure("boolean?", is_boolean);
    registry.register_procedure("boolean=?", boolean_eq);
    registry.register_procedure("equal?", equal);
}

fn not(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("not", args)?;
    Ok(Expression::Boolean(!bool_arg("not", &arg)?))
}

fn is_boolean(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("boolean?", args)?;
    Ok(Expression::Boolean(matches!(arg, Expression::Boolean(_))))
}

fn boolean_eq(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (a, b) = pair("boolean=?", args)?;
    Ok(Expression::Boolean(
        bool_arg("boolean=?", &a)? == bool_arg("boolean=?", &b)?,
    ))
}

fn equal(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (a, b) = pair("equal?", args)?;
    Ok(Expression::Boolean(a.structurally_equal(&b)))
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::interp::stdlib::test_support::{eval, show};

    #[test]
    fn test_not() {
        assert_eq!(show("(not true)"), "false");
        assert_eq!(show("(not #f)"), "true");
        assert!(matches!(eval("(not 0)"), Err(EvalError::Type { .. })));
    }

    #[test]
    fn test_boolean_predicates() {
        assert_eq!(show("(boolean? false)"), "true");
        assert_eq!(show("(boolean? 'false)"), "false");
        assert_eq!(show("(boolean=? true #t)"), "true");
        assert!(matches!(eval("(boolean=? 1 true)"), Err(EvalError::Type { .. })));
    }

    #[test]
    fn test_equal_is_structural() {
        assert_eq!(show("(equal? (list 1 2) (cons 1 (cons 2 empty)))"), "true");
        assert_eq!(show("(equal? \"a\" \"a\")"), "true");
        assert_eq!(show("(equal? 1 1.0)"), "false");
        assert_eq!(show("(equal? 'a \"a\")"), "false");
    }
}
