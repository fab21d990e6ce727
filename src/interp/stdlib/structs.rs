//! `define-struct` and the procedures it generates

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use super::control::{check_identifier, ensure_unbound, operand_text};
use super::{pair, single};
use crate::error::{EvalError, EvalResult};
use crate::interp::expression::{Expression, Procedure, StructValue};
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::ScopeRef;
use crate::interp::tuple::parse_tuple;

pub fn register(registry: &mut Registry) {
    registry.register_special_form("define-struct", define_struct);
}

/// `(define-struct name (field ...))` binds `make-name`, `name?` and one
/// `name-field` accessor per field in the program scope.
fn define_struct(args: Vec<Expression>, scope: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    let (name, fields) = pair("define-struct", args)?;
    let type_name = operand_text("define-struct", &name)?.text.clone();
    let fields_text = &operand_text("define-struct", &fields)?.text;

    check_identifier("define-struct", &type_name)?;
    if !fields_text.starts_with(['(', '[']) {
        return Err(EvalError::Syntax(format!(
            "define-struct: expected a list of field names, found {}",
            fields_text
        )));
    }

    let fields = parse_tuple(fields_text)?;
    let mut seen_fields = HashSet::new();
    for field in &fields {
        check_identifier("define-struct", field)?;
        if !seen_fields.insert(field.as_str()) {
            return Err(EvalError::Syntax(format!(
                "define-struct: found a field name that is used more than once: {}",
                field
            )));
        }
    }

    let target = scope.global();
    let constructor_name = format!("make-{}", type_name);
    let predicate_name = format!("{}?", type_name);
    let accessor_names: Vec<String> = fields
        .iter()
        .map(|field| format!("{}-{}", type_name, field))
        .collect();

    // Every derived name is checked before the first binding is made
    let mut derived = HashSet::new();
    for name in [&constructor_name, &predicate_name].into_iter().chain(&accessor_names) {
        if !derived.insert(name.as_str()) {
            return Err(EvalError::DuplicateBinding(name.clone()));
        }
        ensure_unbound(name, &target, ctx)?;
    }

    debug!(type_name = %type_name, fields = ?fields, "define-struct");

    target.define(
        &constructor_name,
        Expression::Procedure(constructor(&constructor_name, &type_name, &fields)),
    )?;
    target.define(
        &predicate_name,
        Expression::Procedure(predicate(&predicate_name, &type_name)),
    )?;
    for (field, accessor_name) in fields.iter().zip(&accessor_names) {
        target.define(
            accessor_name,
            Expression::Procedure(accessor(accessor_name, &type_name, field)),
        )?;
    }

    Ok(Expression::Void)
}

fn constructor(name: &str, type_name: &str, fields: &[String]) -> Procedure {
    let callee = name.to_string();
    let type_name = type_name.to_string();
    let fields = fields.to_vec();

    Procedure::native(
        name,
        Rc::new(move |args: Vec<Expression>, _: &ScopeRef, _: &EvalContext| {
            if args.len() != fields.len() {
                return Err(EvalError::arity(callee.as_str(), fields.len(), args.len()));
            }
            Ok(Expression::Struct(StructValue {
                type_name: type_name.clone(),
                fields: fields.iter().cloned().zip(args).collect(),
            }))
        }),
    )
}

fn predicate(name: &str, type_name: &str) -> Procedure {
    let callee = name.to_string();
    let type_name = type_name.to_string();

    Procedure::native(
        name,
        Rc::new(move |args: Vec<Expression>, _: &ScopeRef, _: &EvalContext| {
            let arg = single(&callee, args)?;
            Ok(Expression::Boolean(
                matches!(&arg, Expression::Struct(value) if value.type_name == type_name),
            ))
        }),
    )
}

fn accessor(name: &str, type_name: &str, field: &str) -> Procedure {
    let callee = name.to_string();
    let type_name = type_name.to_string();
    let field = field.to_string();

    Procedure::native(
        name,
        Rc::new(move |args: Vec<Expression>, _: &ScopeRef, _: &EvalContext| {
            let arg = single(&callee, args)?;
            match &arg {
                Expression::Struct(value) if value.type_name == type_name => value
                    .field(&field)
                    .cloned()
                    .ok_or_else(|| EvalError::type_mismatch(callee.as_str(), type_name.as_str(), &arg)),
                other => Err(EvalError::type_mismatch(callee.as_str(), type_name.as_str(), other)),
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::interp::evaluator::Interpreter;
    use crate::interp::expression::Expression;

    fn with_posn() -> Interpreter {
        let interp = Interpreter::new();
        interp.eval("(define-struct posn (x y))").unwrap();
        interp
    }

    #[test]
    fn test_constructor_and_accessors() {
        let interp = with_posn();
        interp.eval("(define p (make-posn 3 4))").unwrap();
        assert_eq!(interp.eval("p").unwrap().to_string(), "(make-posn 3 4)");
        assert_eq!(interp.eval("(posn-x p)").unwrap(), Expression::integer(3));
        assert_eq!(interp.eval("(posn-y p)").unwrap(), Expression::integer(4));
    }

    #[test]
    fn test_predicate() {
        let interp = with_posn();
        interp.eval("(define-struct point (a))").unwrap();
        assert_eq!(interp.eval("(posn? (make-posn 1 2))").unwrap(), Expression::Boolean(true));
        assert_eq!(interp.eval("(posn? (make-point 1))").unwrap(), Expression::Boolean(false));
        assert_eq!(interp.eval("(posn? 5)").unwrap(), Expression::Boolean(false));
    }

    #[test]
    fn test_accessor_type_errors() {
        let interp = with_posn();
        interp.eval("(define-struct point (x))").unwrap();
        assert!(matches!(
            interp.eval("(posn-x (make-point 1))"),
            Err(EvalError::Type { .. })
        ));
        assert!(matches!(interp.eval("(posn-x 1)"), Err(EvalError::Type { .. })));
    }

    #[test]
    fn test_constructor_arity() {
        let interp = with_posn();
        assert_eq!(
            interp.eval("(make-posn 1)"),
            Err(EvalError::arity("make-posn", 2, 1))
        );
    }

    #[test]
    fn test_duplicate_fields_bind_nothing() {
        let interp = Interpreter::new();
        assert!(matches!(
            interp.eval("(define-struct p (x x))"),
            Err(EvalError::Syntax(msg)) if msg.contains("more than once")
        ));
        for name in ["make-p", "p?", "p-x"] {
            assert_eq!(interp.eval(name), Err(EvalError::UnboundName(name.to_string())));
        }
        interp.eval("(define-struct p (x y))").unwrap();
        assert_eq!(interp.eval("(p-y (make-p 1 2))").unwrap(), Expression::integer(2));
    }

    #[test]
    fn test_derived_name_collision_binds_nothing() {
        let interp = Interpreter::new();
        interp.eval("(define p-y 0)").unwrap();
        assert_eq!(
            interp.eval("(define-struct p (x y))"),
            Err(EvalError::DuplicateBinding("p-y".to_string()))
        );
        assert_eq!(interp.eval("make-p"), Err(EvalError::UnboundName("make-p".to_string())));
        assert_eq!(interp.eval("p-x"), Err(EvalError::UnboundName("p-x".to_string())));
    }

    #[test]
    fn test_struct_equality_and_redefinition() {
        let interp = with_posn();
        assert_eq!(
            interp.eval("(equal? (make-posn 1 (list 2)) (make-posn 1 (list 2)))").unwrap(),
            Expression::Boolean(true)
        );
        assert_eq!(
            interp.eval("(define-struct posn (x y))"),
            Err(EvalError::DuplicateBinding("make-posn".to_string()))
        );
    }
}
