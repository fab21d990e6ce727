//! `check-expect`, `check-within` and `run-tests`
//!
//! Checks are queued when they are read and only evaluated by `run-tests`,
//! so a check may refer to functions defined further down the file.

use std::fmt;

use super::{expect_arity, number_arg};
use crate::error::{EvalError, EvalResult};
use crate::interp::evaluator::force;
use crate::interp::expression::Expression;
use crate::interp::numeric::Numeric;
use crate::interp::registry::{EvalContext, Registry};
use crate::interp::scope::ScopeRef;

pub fn register(registry: &mut Registry) {
    registry.register_special_form("check-expect", check_expect);
    registry.register_special_form("check-within", check_within);
    registry.register_procedure("run-tests", run_tests);
}

/// A queued check: both sides are still unevaluated
#[derive(Debug, Clone)]
pub struct PendingCheck {
    pub actual: Expression,
    pub expected: Expression,
    /// Allowed numeric distance for `check-within`
    pub tolerance: Option<f64>,
}

impl PendingCheck {
    /// Source rendering used in reports
    pub fn label(&self) -> String {
        format!("{} == {}", self.actual, self.expected)
    }

    fn evaluate(self, ctx: &EvalContext) -> Result<(), String> {
        let actual = force(self.actual, ctx).map_err(|err| err.to_string())?;
        let expected = force(self.expected, ctx).map_err(|err| err.to_string())?;

        let passed = match self.tolerance {
            Some(tolerance) => within(&actual, &expected, tolerance)?,
            None => actual.structurally_equal(&expected),
        };

        if passed {
            Ok(())
        } else {
            Err(format!("Expected: {}, got: {}", expected, actual))
        }
    }
}

fn within(actual: &Expression, expected: &Expression, tolerance: f64) -> Result<bool, String> {
    let actual = Numeric::from_expression(actual, "check-within").map_err(|err| err.to_string())?;
    let expected = Numeric::from_expression(expected, "check-within").map_err(|err| err.to_string())?;
    Ok((actual.to_f64() - expected.to_f64()).abs() <= tolerance)
}

/// One failed check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckFailure {
    /// Position of the case in queue order
    pub index: usize,
    pub case: String,
    pub message: String,
}

/// Outcome of running every queued check
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub cases: Vec<String>,
    pub passed: usize,
    pub failures: Vec<CheckFailure>,
}

impl CheckReport {
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut failures = self.failures.iter().peekable();
        for (index, case) in self.cases.iter().enumerate() {
            writeln!(f, "Test case: {}", case)?;
            if let Some(failure) = failures.next_if(|failure| failure.index == index) {
                writeln!(f, "Test failed- {}", failure.message)?;
            }
        }
        write!(f, "Passed {} of {} test(s).", self.passed, self.total())
    }
}

/// Evaluate and clear every queued check
pub fn run_checks(ctx: &EvalContext) -> CheckReport {
    // Checks may enqueue more checks while running, so the queue is released first
    let pending = std::mem::take(&mut *ctx.checks.borrow_mut());
    let mut report = CheckReport::default();

    for (index, check) in pending.into_iter().enumerate() {
        let case = check.label();
        report.cases.push(case.clone());
        match check.evaluate(ctx) {
            Ok(()) => report.passed += 1,
            Err(message) => report.failures.push(CheckFailure {
                index,
                case,
                message,
            }),
        }
    }

    report
}

fn check_expect(args: Vec<Expression>, _: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    expect_arity("check-expect", &args, 2)?;
    let mut args = args.into_iter();
    if let (Some(actual), Some(expected)) = (args.next(), args.next()) {
        ctx.checks.borrow_mut().push(PendingCheck {
            actual,
            expected,
            tolerance: None,
        });
    }
    Ok(Expression::Void)
}

/// The tolerance is evaluated immediately; the two sides wait for `run-tests`
fn check_within(args: Vec<Expression>, _: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    expect_arity("check-within", &args, 3)?;
    let mut args = args.into_iter();
    let (actual, expected, tolerance) = match (args.next(), args.next(), args.next()) {
        (Some(actual), Some(expected), Some(tolerance)) => (actual, expected, tolerance),
        _ => return Err(EvalError::arity("check-within", 3, 0)),
    };

    let tolerance = force(tolerance, ctx)?;
    let tolerance = number_arg("check-within", &tolerance)?.to_f64();

    ctx.checks.borrow_mut().push(PendingCheck {
        actual,
        expected,
        tolerance: Some(tolerance),
    });
    Ok(Expression::Void)
}

fn run_tests(args: Vec<Expression>, _: &ScopeRef, ctx: &EvalContext) -> EvalResult<Expression> {
    expect_arity("run-tests", &args, 0)?;
    println!("{}", run_checks(ctx));
    Ok(Expression::Void)
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::interp::evaluator::Interpreter;

    #[test]
    fn test_checks_are_deferred_until_run() {
        let interp = Interpreter::new();
        interp.eval("(check-expect (double 2) 4)").unwrap();
        interp.eval("(define (double n) (* 2 n))").unwrap();
        assert_eq!(interp.context().pending_checks(), 1);

        let report = interp.run_checks();
        assert_eq!(report.total(), 1);
        assert_eq!(report.passed, 1);
        assert!(report.all_passed());
        assert_eq!(interp.context().pending_checks(), 0);
    }

    #[test]
    fn test_failure_report() {
        let interp = Interpreter::new();
        interp.eval("(check-expect (+ 1 1) 3)").unwrap();
        interp.eval("(check-expect (list 1 2) (list 1 2))").unwrap();
        interp.eval("(check-expect (/ 1 0) 0)").unwrap();

        let report = interp.run_checks();
        assert_eq!(report.passed, 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].case, "(+ 1 1) == 3");
        assert_eq!(report.failures[0].message, "Expected: 3, got: 2");
        assert!(report.failures[1].message.contains("division by zero"));

        let rendered = report.to_string();
        assert!(rendered.contains("Test case: (+ 1 1) == 3\nTest failed- Expected: 3, got: 2"));
        assert!(rendered.ends_with("Passed 1 of 3 test(s)."));
    }

    #[test]
    fn test_check_within() {
        let interp = Interpreter::new();
        interp.eval("(check-within (sqrt 2) 1.414 0.001)").unwrap();
        interp.eval("(check-within 1/3 0.3 0.01)").unwrap();
        let report = interp.run_checks();
        assert_eq!(report.passed, 1);
        assert_eq!(report.failures.len(), 1);

        assert!(matches!(
            interp.eval("(check-within 1 1 \"close\")"),
            Err(EvalError::Type { .. })
        ));
    }

    #[test]
    fn test_run_tests_clears_queue() {
        let interp = Interpreter::new();
        interp.eval("(check-expect 1 1)").unwrap();
        interp.eval("(run-tests)").unwrap();
        assert_eq!(interp.context().pending_checks(), 0);
        assert!(interp.run_checks().cases.is_empty());
    }

    #[test]
    fn test_arity() {
        let interp = Interpreter::new();
        assert!(matches!(interp.eval("(check-expect 1)"), Err(EvalError::Arity { .. })));
        assert!(matches!(interp.eval("(run-tests 1)"), Err(EvalError::Arity { .. })));
    }
}
