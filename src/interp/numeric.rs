//! Numeric tower: exact rationals and inexact floats
//!
//! Arithmetic promotes to inexact as soon as one operand is inexact and
//! never converts back on its own.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::error::{EvalError, EvalResult};
use crate::interp::Expression;

/// A number pulled out of an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Exact(BigRational),
    Inexact(f64),
}

impl Numeric {
    /// Extract a number, failing with a type error naming `context`
    pub fn from_expression(expr: &Expression, context: &str) -> EvalResult<Numeric> {
        match expr {
            Expression::Number(value) => Ok(Numeric::Exact(value.clone())),
            Expression::Inexact(value) => Ok(Numeric::Inexact(*value)),
            other => Err(EvalError::type_mismatch(context, "number", other)),
        }
    }

    /// Wrap back into an expression
    pub fn into_expression(self) -> Expression {
        match self {
            Numeric::Exact(value) => Expression::Number(value),
            Numeric::Inexact(value) => Expression::Inexact(value),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Numeric::Exact(_))
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Numeric::Exact(value) => value.to_f64().unwrap_or(f64::NAN),
            Numeric::Inexact(value) => *value,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Numeric::Exact(value) => value.is_zero(),
            Numeric::Inexact(value) => *value == 0.0,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Numeric::Exact(value) => value.is_integer(),
            Numeric::Inexact(value) => value.is_finite() && value.fract() == 0.0,
        }
    }

    pub fn add(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Exact(a), Numeric::Exact(b)) => Numeric::Exact(a + b),
            (a, b) => Numeric::Inexact(a.to_f64() + b.to_f64()),
        }
    }

    pub fn sub(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Exact(a), Numeric::Exact(b)) => Numeric::Exact(a - b),
            (a, b) => Numeric::Inexact(a.to_f64() - b.to_f64()),
        }
    }

    pub fn mul(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Exact(a), Numeric::Exact(b)) => Numeric::Exact(a * b),
            (a, b) => Numeric::Inexact(a.to_f64() * b.to_f64()),
        }
    }

    /// Division; an exact zero divisor is a domain error
    pub fn div(self, other: Numeric) -> EvalResult<Numeric> {
        match (self, other) {
            (_, Numeric::Exact(b)) if b.is_zero() => {
                Err(EvalError::Domain("/: division by zero".to_string()))
            }
            (Numeric::Exact(a), Numeric::Exact(b)) => Ok(Numeric::Exact(a / b)),
            (a, b) => Ok(Numeric::Inexact(a.to_f64() / b.to_f64())),
        }
    }

    pub fn negate(self) -> Numeric {
        match self {
            Numeric::Exact(value) => Numeric::Exact(-value),
            Numeric::Inexact(value) => Numeric::Inexact(-value),
        }
    }

    pub fn abs(self) -> Numeric {
        match self {
            Numeric::Exact(value) => Numeric::Exact(value.abs()),
            Numeric::Inexact(value) => Numeric::Inexact(value.abs()),
        }
    }

    /// Ordering across exactness; `None` only when a NaN is involved
    pub fn compare(&self, other: &Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Exact(a), Numeric::Exact(b)) => Some(a.cmp(b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }

    /// Exact integer payload, if this is one
    pub fn as_integer(&self) -> Option<BigInt> {
        match self {
            Numeric::Exact(value) if value.is_integer() => Some(value.to_integer()),
            _ => None,
        }
    }

    /// Convert to inexact
    pub fn to_inexact(self) -> Numeric {
        Numeric::Inexact(self.to_f64())
    }

    /// Convert to exact; infinities and NaN have no exact form
    pub fn to_exact(self) -> EvalResult<Numeric> {
        match self {
            Numeric::Exact(value) => Ok(Numeric::Exact(value)),
            Numeric::Inexact(value) => BigRational::from_float(value)
                .map(Numeric::Exact)
                .ok_or_else(|| {
                    EvalError::Domain(format!(
                        "inexact->exact: no exact representation for {}",
                        format_inexact(value)
                    ))
                }),
        }
    }
}

/// True if `text` should be read as a number rather than a name
pub fn looks_numeric(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_digit() => true,
        Some('-') | Some('+') | Some('.') => chars.next().map_or(false, |ch| ch.is_ascii_digit() || ch == '.'),
        _ => false,
    }
}

/// Read a numeric literal. Integers and `n/d` are exact, decimals and
/// exponents are inexact.
pub fn parse_number(text: &str) -> EvalResult<Numeric> {
    let invalid = || EvalError::Syntax(format!("Invalid number: {}", text));
    let unsigned = text.strip_prefix('+').unwrap_or(text);

    if unsigned.contains('/') {
        let (numer, denom) = unsigned.split_once('/').ok_or_else(invalid)?;
        let numer: BigInt = numer.parse().map_err(|_| invalid())?;
        let denom: BigInt = denom.parse().map_err(|_| invalid())?;
        if denom.is_zero() {
            return Err(EvalError::Syntax(format!(
                "Division by zero in literal: {}",
                text
            )));
        }
        return Ok(Numeric::Exact(BigRational::new(numer, denom)));
    }

    if unsigned.contains(['.', 'e', 'E']) {
        return unsigned
            .parse::<f64>()
            .map(Numeric::Inexact)
            .map_err(|_| invalid());
    }

    unsigned
        .parse::<BigInt>()
        .map(|value| Numeric::Exact(BigRational::from_integer(value)))
        .map_err(|_| invalid())
}

/// Render an exact number: integers bare, everything else as `n/d`
pub fn format_exact(value: &BigRational) -> String {
    if value.is_integer() {
        value.numer().to_string()
    } else {
        format!("{}/{}", value.numer(), value.denom())
    }
}

/// Render an inexact number, always with a decimal point
pub fn format_inexact(value: f64) -> String {
    if value.is_nan() {
        return "+nan.0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+inf.0" } else { "-inf.0" }.to_string();
    }

    let rendered = value.to_string();
    if rendered.contains(['.', 'e']) {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}
