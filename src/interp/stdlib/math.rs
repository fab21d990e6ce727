//! Arithmetic, comparison and numeric predicates

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::{expect_at_least, integer_arg, number_arg, pair, single};
use crate::error::{EvalError, EvalResult};
use crate::interp::expression::Expression;
use crate::interp::numeric::Numeric;
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::ScopeRef;

pub fn register(registry: &mut Registry) {
    registry.register_procedure("+", add);
    registry.register_procedure("-", subtract);
    registry.register_procedure("*", multiply);
    registry.register_procedure("/", divide);

    registry.register_procedure("=", num_eq);
    registry.register_procedure("<", num_lt);
    registry.register_procedure(">", num_gt);
    registry.register_procedure("<=", num_le);
    registry.register_procedure(">=", num_ge);

    registry.register_procedure("quotient", quotient);
    registry.register_procedure("remainder", remainder);
    registry.register_procedure("modulo", modulo);

    registry.register_procedure("abs", abs);
    registry.register_procedure("min", min);
    registry.register_procedure("max", max);
    registry.register_procedure("add1", add1);
    registry.register_procedure("sub1", sub1);
    registry.register_procedure("sqrt", sqrt);
    registry.register_procedure("expt", expt);
    registry.register_procedure("floor", floor);
    registry.register_procedure("ceiling", ceiling);
    registry.register_procedure("round", round);
    registry.register_procedure("exact->inexact", exact_to_inexact);
    registry.register_procedure("inexact->exact", inexact_to_exact);

    registry.register_procedure("number?", is_number);
    registry.register_procedure("integer?", is_integer);
    registry.register_procedure("rational?", is_rational);
    registry.register_procedure("exact?", is_exact);
    registry.register_procedure("inexact?", is_inexact);
    registry.register_procedure("zero?", is_zero);
    registry.register_procedure("positive?", is_positive);
    registry.register_procedure("negative?", is_negative);
    registry.register_procedure("even?", is_even);
    registry.register_procedure("odd?", is_odd);

    registry.register_procedure("number->string", number_to_string);
}

fn numbers(callee: &str, args: &[Expression]) -> EvalResult<Vec<Numeric>> {
    args.iter().map(|arg| number_arg(callee, arg)).collect()
}

fn exact_int(value: impl Into<BigInt>) -> Numeric {
    Numeric::Exact(BigRational::from_integer(value.into()))
}

fn add(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let sum = numbers("+", &args)?
        .into_iter()
        .fold(exact_int(0), Numeric::add);
    Ok(sum.into_expression())
}

fn subtract(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    expect_at_least("-", &args, 1)?;
    let mut values = numbers("-", &args)?.into_iter();
    let first = values.next().unwrap_or_else(|| exact_int(0));

    let result = if args.len() == 1 {
        first.negate()
    } else {
        values.fold(first, Numeric::sub)
    };
    Ok(result.into_expression())
}

fn multiply(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let product = numbers("*", &args)?
        .into_iter()
        .fold(exact_int(1), Numeric::mul);
    Ok(product.into_expression())
}

fn divide(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    expect_at_least("/", &args, 1)?;
    let mut values = numbers("/", &args)?.into_iter();
    let first = values.next().unwrap_or_else(|| exact_int(1));

    if args.len() == 1 {
        return exact_int(1).div(first).map(Numeric::into_expression);
    }

    let mut result = first;
    for value in values {
        result = result.div(value)?;
    }
    Ok(result.into_expression())
}

/// Chained comparison: true when every adjacent pair satisfies `accept`
fn compare_chain(
    callee: &str,
    args: &[Expression],
    accept: fn(Ordering) -> bool,
) -> EvalResult<Expression> {
    expect_at_least(callee, args, 2)?;
    let values = numbers(callee, args)?;
    let holds = values
        .windows(2)
        .all(|window| window[0].compare(&window[1]).map_or(false, accept));
    Ok(Expression::Boolean(holds))
}

fn num_eq(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    compare_chain("=", &args, |ord| ord == Ordering::Equal)
}

fn num_lt(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    compare_chain("<", &args, |ord| ord == Ordering::Less)
}

fn num_gt(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    compare_chain(">", &args, |ord| ord == Ordering::Greater)
}

fn num_le(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    compare_chain("<=", &args, |ord| ord != Ordering::Greater)
}

fn num_ge(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    compare_chain(">=", &args, |ord| ord != Ordering::Less)
}

fn integer_pair(callee: &str, args: Vec<Expression>) -> EvalResult<(BigInt, BigInt)> {
    let (a, b) = pair(callee, args)?;
    let dividend = integer_arg(callee, &a)?;
    let divisor = integer_arg(callee, &b)?;
    if divisor.is_zero() {
        return Err(EvalError::Domain(format!("{}: undefined for 0", callee)));
    }
    Ok((dividend, divisor))
}

fn quotient(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (a, b) = integer_pair("quotient", args)?;
    Ok(Expression::integer(a / b))
}

fn remainder(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (a, b) = integer_pair("remainder", args)?;
    Ok(Expression::integer(a % b))
}

/// Result takes the sign of the divisor
fn modulo(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (a, b) = integer_pair("modulo", args)?;
    let mut result = &a % &b;
    if !result.is_zero() && result.is_negative() != b.is_negative() {
        result += &b;
    }
    Ok(Expression::integer(result))
}

fn abs(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("abs", args)?;
    Ok(number_arg("abs", &arg)?.abs().into_expression())
}

/// Pick the extreme value; any inexact argument makes the result inexact
fn extreme(callee: &str, args: &[Expression], wanted: Ordering) -> EvalResult<Expression> {
    expect_at_least(callee, args, 1)?;
    let values = numbers(callee, args)?;
    let any_inexact = values.iter().any(|value| !value.is_exact());

    let mut best: Option<Numeric> = None;
    for value in values {
        best = match best {
            Some(current) if value.compare(&current) != Some(wanted) => Some(current),
            _ => Some(value),
        };
    }

    let best = best.ok_or_else(|| EvalError::arity_at_least(callee, 1, 0))?;
    let best = if any_inexact { best.to_inexact() } else { best };
    Ok(best.into_expression())
}

fn min(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    extreme("min", &args, Ordering::Less)
}

fn max(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    extreme("max", &args, Ordering::Greater)
}

fn add1(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("add1", args)?;
    Ok(number_arg("add1", &arg)?.add(exact_int(1)).into_expression())
}

fn sub1(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("sub1", args)?;
    Ok(number_arg("sub1", &arg)?.sub(exact_int(1)).into_expression())
}

fn exact_sqrt(value: &BigRational) -> Option<BigRational> {
    let numer = value.numer().sqrt();
    let denom = value.denom().sqrt();
    if &(&numer * &numer) == value.numer() && &(&denom * &denom) == value.denom() {
        Some(BigRational::new(numer, denom))
    } else {
        None
    }
}

/// Exact for perfect squares, inexact otherwise
fn sqrt(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("sqrt", args)?;
    let value = number_arg("sqrt", &arg)?;
    if value.compare(&exact_int(0)) == Some(Ordering::Less) {
        return Err(EvalError::Domain(format!(
            "sqrt: expected a non-negative number, found {}",
            arg
        )));
    }

    let root = match &value {
        Numeric::Exact(exact) => exact_sqrt(exact)
            .map(Numeric::Exact)
            .unwrap_or_else(|| Numeric::Inexact(value.to_f64().sqrt())),
        Numeric::Inexact(inexact) => Numeric::Inexact(inexact.sqrt()),
    };
    Ok(root.into_expression())
}

fn expt(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let (base, power) = pair("expt", args)?;
    let base = number_arg("expt", &base)?;
    let power = number_arg("expt", &power)?;

    if let (Numeric::Exact(base), Some(exponent)) = (&base, power.as_integer()) {
        let magnitude = exponent.abs().to_usize().ok_or_else(|| {
            EvalError::Domain(format!("expt: exponent {} is too large", exponent))
        })?;
        let raised = num_traits::pow(base.clone(), magnitude);
        if !exponent.is_negative() {
            return Ok(Expression::Number(raised));
        }
        if raised.is_zero() {
            return Err(EvalError::Domain("expt: division by zero".to_string()));
        }
        return Ok(Expression::Number(raised.recip()));
    }

    Ok(Expression::Inexact(base.to_f64().powf(power.to_f64())))
}

fn floor(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("floor", args)?;
    Ok(match number_arg("floor", &arg)? {
        Numeric::Exact(value) => Expression::Number(value.floor()),
        Numeric::Inexact(value) => Expression::Inexact(value.floor()),
    })
}

fn ceiling(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("ceiling", args)?;
    Ok(match number_arg("ceiling", &arg)? {
        Numeric::Exact(value) => Expression::Number(value.ceil()),
        Numeric::Inexact(value) => Expression::Inexact(value.ceil()),
    })
}

fn round_half_even_exact(value: &BigRational) -> BigRational {
    let floor = value.floor();
    let half = BigRational::new(BigInt::one(), BigInt::from(2));
    match (value - &floor).cmp(&half) {
        Ordering::Less => floor,
        Ordering::Greater => floor + BigRational::one(),
        Ordering::Equal if (floor.to_integer() % BigInt::from(2)).is_zero() => floor,
        Ordering::Equal => floor + BigRational::one(),
    }
}

fn round_half_even_inexact(value: f64) -> f64 {
    let floor = value.floor();
    let diff = value - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 || floor % 2.0 != 0.0 {
        floor + 1.0
    } else {
        floor
    }
}

/// Ties round to even
fn round(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("round", args)?;
    Ok(match number_arg("round", &arg)? {
        Numeric::Exact(value) => Expression::Number(round_half_even_exact(&value)),
        Numeric::Inexact(value) => Expression::Inexact(round_half_even_inexact(value)),
    })
}

fn exact_to_inexact(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("exact->inexact", args)?;
    Ok(number_arg("exact->inexact", &arg)?.to_inexact().into_expression())
}

fn inexact_to_exact(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("inexact->exact", args)?;
    Ok(number_arg("inexact->exact", &arg)?.to_exact()?.into_expression())
}

fn is_number(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("number?", args)?;
    Ok(Expression::Boolean(matches!(
        arg,
        Expression::Number(_) | Expression::Inexact(_)
    )))
}

fn is_integer(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("integer?", args)?;
    let result = Numeric::from_expression(&arg, "integer?").map_or(false, |n| n.is_integer());
    Ok(Expression::Boolean(result))
}

fn is_rational(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("rational?", args)?;
    Ok(Expression::Boolean(match arg {
        Expression::Number(_) => true,
        Expression::Inexact(value) => value.is_finite(),
        _ => false,
    }))
}

fn is_exact(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("exact?", args)?;
    Ok(Expression::Boolean(number_arg("exact?", &arg)?.is_exact()))
}

fn is_inexact(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("inexact?", args)?;
    Ok(Expression::Boolean(!number_arg("inexact?", &arg)?.is_exact()))
}

fn is_zero(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("zero?", args)?;
    Ok(Expression::Boolean(number_arg("zero?", &arg)?.is_zero()))
}

fn sign_is(callee: &str, args: Vec<Expression>, wanted: Ordering) -> EvalResult<Expression> {
    let arg = single(callee, args)?;
    let value = number_arg(callee, &arg)?;
    Ok(Expression::Boolean(value.compare(&exact_int(0)) == Some(wanted)))
}

fn is_positive(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    sign_is("positive?", args, Ordering::Greater)
}

fn is_negative(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    sign_is("negative?", args, Ordering::Less)
}

fn parity(callee: &str, args: Vec<Expression>) -> EvalResult<bool> {
    let arg = single(callee, args)?;
    let value = integer_arg(callee, &arg)?;
    Ok((value % BigInt::from(2)).is_zero())
}

fn is_even(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    parity("even?", args).map(Expression::Boolean)
}

fn is_odd(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    parity("odd?", args).map(|even| Expression::Boolean(!even))
}

fn number_to_string(args: Vec<Expression>, _: &ScopeRef, _: &EvalContext) -> EvalResult<Expression> {
    let arg = single("number->string", args)?;
    number_arg("number->string", &arg)?;
    Ok(Expression::Str(arg.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::interp::stdlib::test_support::{eval, show};

    #[test]
    fn test_variadic_arithmetic() {
        assert_eq!(show("(+)"), "0");
        assert_eq!(show("(+ 1 2 3 4)"), "10");
        assert_eq!(show("(- 5)"), "-5");
        assert_eq!(show("(- 10 1 2)"), "7");
        assert_eq!(show("(* 2 3 4)"), "24");
        assert_eq!(show("(/ 1 3)"), "1/3");
        assert_eq!(show("(/ 2)"), "1/2");
        assert_eq!(show("(/ 12 2 3)"), "2");
    }

    #[test]
    fn test_exactness_promotion() {
        assert_eq!(show("(+ 1/2 1/2)"), "1");
        assert_eq!(show("(+ 1/2 0.5)"), "1.0");
        assert_eq!(show("(* 2 0.25)"), "0.5");
        assert_eq!(show("(/ 1.0 0)"), "error: Domain error: /: division by zero");
        assert_eq!(show("(/ 1 0.0)"), "+inf.0");
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(eval("(/ 5 0)"), Err(EvalError::Domain(_))));
        assert!(matches!(eval("(quotient 5 0)"), Err(EvalError::Domain(_))));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(show("(< 1 2 3)"), "true");
        assert_eq!(show("(< 1 3 2)"), "false");
        assert_eq!(show("(= 1/2 0.5)"), "true");
        assert_eq!(show("(>= 3 3 2)"), "true");
        assert!(matches!(eval("(< 1)"), Err(EvalError::Arity { .. })));
        assert!(matches!(eval("(< 1 \"a\")"), Err(EvalError::Type { .. })));
    }

    #[test]
    fn test_integer_division() {
        assert_eq!(show("(quotient 17 5)"), "3");
        assert_eq!(show("(remainder -17 5)"), "-2");
        assert_eq!(show("(modulo -17 5)"), "3");
        assert_eq!(show("(modulo 17 -5)"), "-3");
        assert!(matches!(eval("(quotient 1/2 1)"), Err(EvalError::Type { .. })));
    }

    #[test]
    fn test_unary_helpers() {
        assert_eq!(show("(abs -7/2)"), "7/2");
        assert_eq!(show("(add1 41)"), "42");
        assert_eq!(show("(sub1 0.5)"), "-0.5");
        assert_eq!(show("(min 3 1 2)"), "1");
        assert_eq!(show("(max 1 2.0)"), "2.0");
        assert_eq!(show("(floor 7/2)"), "3");
        assert_eq!(show("(ceiling 7/2)"), "4");
        assert_eq!(show("(round 5/2)"), "2");
        assert_eq!(show("(round 7/2)"), "4");
        assert_eq!(show("(round 2.5)"), "2.0");
    }

    #[test]
    fn test_sqrt_and_expt() {
        assert_eq!(show("(sqrt 16)"), "4");
        assert_eq!(show("(sqrt 1/4)"), "1/2");
        assert_eq!(show("(sqrt 2.25)"), "1.5");
        assert!(matches!(eval("(sqrt -1)"), Err(EvalError::Domain(_))));
        assert_eq!(show("(expt 2 10)"), "1024");
        assert_eq!(show("(expt 2 -2)"), "1/4");
        assert_eq!(show("(expt 4 0.5)"), "2.0");
        assert!(matches!(eval("(expt 0 -1)"), Err(EvalError::Domain(_))));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(show("(exact->inexact 1/4)"), "0.25");
        assert_eq!(show("(inexact->exact 0.5)"), "1/2");
        assert_eq!(show("(number->string 3/4)"), "\"3/4\"");
    }

    #[test]
    fn test_predicates() {
        assert_eq!(show("(number? 1)"), "true");
        assert_eq!(show("(number? \"1\")"), "false");
        assert_eq!(show("(integer? 2.0)"), "true");
        assert_eq!(show("(integer? 1/2)"), "false");
        assert_eq!(show("(integer? 'a)"), "false");
        assert_eq!(show("(rational? 0.5)"), "true");
        assert_eq!(show("(exact? 1/2)"), "true");
        assert_eq!(show("(inexact? 1/2)"), "false");
        assert_eq!(show("(zero? 0.0)"), "true");
        assert_eq!(show("(positive? -1)"), "false");
        assert_eq!(show("(negative? -1)"), "true");
        assert_eq!(show("(even? 10)"), "true");
        assert_eq!(show("(odd? 10)"), "false");
        assert!(matches!(eval("(even? 1.5)"), Err(EvalError::Type { .. })));
    }
}
