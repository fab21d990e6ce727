//! String and character procedures

use super::{char_arg, expect_arity, index_arg, integer_arg, list_arg, pair, single, string_arg};
use crate::error::{EvalError, EvalResult};
use crate::interp::expression::Expression;
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::ScopeRef;

use num_traits::ToPrimitive;

pub fn register(registry: &mut Registry) {
    registry.register_procedure("string?", is_string);
    registry.register_procedure("string=?", string_eq);
    registry.register_procedure("string<?", string_lt);
    registry.register_procedure("string->symbol", string_to_symbol);
    registry.register_procedure("string->int", string_to_int);
    registry.register_procedure("int->string", int_to_string);
    registry.register_procedure("string->list", string_to_list);
    registry.register_procedure("list->string", list_to_string);
    registry.register_procedure("string-append", string_append);
    registry.register_procedure("string-length", string_length);
    registry.register_procedure("substring", substring);
    registry.register_procedure("replicate", replicate);
    registry.register_procedure("char?", is_char);
    registry.register_procedure("char=?", char_eq);
    registry.register_procedure("char->integer", char_to_integer);
}

fn is_string(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("string?", args)?;
    Ok(Expression::Boolean(matches!(arg, Expression::Str(_))))
}

fn string_eq(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (a, b) = pair("string=?", args)?;
    Ok(Expression::Boolean(
        string_arg("string=?", &a)? == string_arg("string=?", &b)?,
    ))
}

fn string_lt(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (a, b) = pair("string<?", args)?;
    Ok(Expression::Boolean(
        string_arg("string<?", &a)? < string_arg("string<?", &b)?,
    ))
}

fn string_to_symbol(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("string->symbol", args)?;
    Ok(Expression::Symbol(string_arg("string->symbol", &arg)?.to_string()))
}

/// Code point of a one-character string
fn string_to_int(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("string->int", args)?;
    let text = string_arg("string->int", &arg)?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(Expression::integer(u32::from(ch))),
        _ => Err(EvalError::type_mismatch("string->int", "1-letter string", &arg)),
    }
}

fn code_point(callee: &str, arg: &Expression) -> EvalResult<char> {
    integer_arg(callee, arg)?
        .to_u32()
        .and_then(char::from_u32)
        .ok_or_else(|| EvalError::Domain(format!("{}: {} is not a valid character code", callee, arg)))
}

fn int_to_string(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("int->string", args)?;
    Ok(Expression::Str(code_point("int->string", &arg)?.to_string()))
}

fn string_to_list(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("string->list", args)?;
    let text = string_arg("string->list", &arg)?;
    Ok(Expression::List(text.chars().map(Expression::Character).collect()))
}

fn list_to_string(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("list->string", args)?;
    let text = list_arg("list->string", &arg)?
        .iter()
        .map(|item| char_arg("list->string", item))
        .collect::<EvalResult<String>>()?;
    Ok(Expression::Str(text))
}

fn string_append(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let mut joined = String::new();
    for arg in &args {
        joined.push_str(string_arg("string-append", arg)?);
    }
    Ok(Expression::Str(joined))
}

fn string_length(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("string-length", args)?;
    Ok(Expression::integer(string_arg("string-length", &arg)?.chars().count()))
}

/// `(substring s start)` or `(substring s start end)`, by character index
fn substring(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    if args.len() != 2 && args.len() != 3 {
        return Err(EvalError::Arity {
            callee: "substring".to_string(),
            expected: "2 or 3".to_string(),
            found: args.len(),
        });
    }

    let chars: Vec<char> = string_arg("substring", &args[0])?.chars().collect();
    let start = index_arg("substring", &args[1])?;
    let end = match args.get(2) {
        Some(end) => index_arg("substring", end)?,
        None => chars.len(),
    };

    if start > end || end > chars.len() {
        return Err(EvalError::Domain(format!(
            "substring: range [{}, {}) is out of bounds for {}",
            start, end, args[0]
        )));
    }
    Ok(Expression::Str(chars[start..end].iter().collect()))
}

fn replicate(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    expect_arity("replicate", &args, 2)?;
    let times = index_arg("replicate", &args[0])?;
    let text = string_arg("replicate", &args[1])?;
    Ok(Expression::Str(text.repeat(times)))
}

fn is_char(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("char?", args)?;
    Ok(Expression::Boolean(matches!(arg, Expression::Character(_))))
}

fn char_eq(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (a, b) = pair("char=?", args)?;
    Ok(Expression::Boolean(
        char_arg("char=?", &a)? == char_arg("char=?", &b)?,
    ))
}

fn char_to_integer(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("char->integer", args)?;
    Ok(Expression::integer(u32::from(char_arg("char->integer", &arg)?)))
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::interp::stdlib::test_support::{eval, show};

    #[test]
    fn test_comparisons() {
        assert_eq!(show("(string=? \"abc\" \"abc\")"), "true");
        assert_eq!(show("(string<? \"abc\" \"abd\")"), "true");
        assert_eq!(show("(string? \"x\")"), "true");
        assert_eq!(show("(string? #\\x)"), "false");
        assert!(matches!(eval("(string=? \"a\" 'a)"), Err(EvalError::Type { .. })));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(show("(string->symbol \"hello world\")"), "'|hello world|");
        assert_eq!(show("(string->int \"a\")"), "97");
        assert_eq!(show("(int->string 65)"), "\"A\"");
        assert_eq!(show("(string->list \"ab\")"), "(list #\\a #\\b)");
        assert_eq!(show("(list->string (list #\\h #\\i))"), "\"hi\"");
        assert_eq!(show("(char->integer #\\space)"), "32");
        assert!(matches!(eval("(string->int \"ab\")"), Err(EvalError::Type { .. })));
    }

    #[test]
    fn test_building_strings() {
        assert_eq!(show("(string-append \"foo\" \"\" \"bar\")"), "\"foobar\"");
        assert_eq!(show("(string-length \"héllo\")"), "5");
        assert_eq!(show("(replicate 3 \"ab\")"), "\"ababab\"");
        assert_eq!(show("(substring \"hello\" 1 3)"), "\"el\"");
        assert_eq!(show("(substring \"hello\" 2)"), "\"llo\"");
        assert!(matches!(eval("(substring \"hello\" 3 9)"), Err(EvalError::Domain(_))));
        assert!(matches!(eval("(substring \"hello\")"), Err(EvalError::Arity { .. })));
    }

    #[test]
    fn test_characters() {
        assert_eq!(show("(char=? #\\a #\\a)"), "true");
        assert_eq!(show("(char? #\\a)"), "true");
        assert!(matches!(eval("(char=? #\\a \"a\")"), Err(EvalError::Type { .. })));
    }
}
