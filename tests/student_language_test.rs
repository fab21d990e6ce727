//! End-to-end programs through the public `Interpreter` API

use racket_stepper::{EvalError, Expression, Interpreter};

fn show(interp: &Interpreter, code: &str) -> String {
    match interp.eval(code) {
        Ok(value) => value.to_string(),
        Err(e) => panic!("{} failed: {}", code, e),
    }
}

fn load(source: &str) -> Interpreter {
    let interp = Interpreter::new();
    interp.eval_all(source).unwrap();
    interp
}

#[test]
fn test_recursive_factorial_is_exact() {
    let interp = load(
        "(define (fact n)
           (if (= n 0)
               1
               (* n (fact (- n 1)))))",
    );
    assert_eq!(show(&interp, "(fact 5)"), "120");
    assert_eq!(show(&interp, "(fact 25)"), "15511210043330985984000000");
}

#[test]
fn test_list_recursion() {
    let interp = load(
        "; sum of a list of numbers
         (define (sum l)
           (cond [(empty? l) 0]
                 [else (+ (first l) (sum (rest l)))]))
         (define (squares l)
           (if (empty? l)
               empty
               (cons (* (first l) (first l)) (squares (rest l)))))",
    );
    assert_eq!(show(&interp, "(sum (list 1 2 3 4))"), "10");
    assert_eq!(show(&interp, "(squares (list 1 2 3))"), "(list 1 4 9)");
    assert_eq!(show(&interp, "(squares empty)"), "empty");
}

#[test]
fn test_closures_capture_their_scope() {
    let interp = load(
        "(define (make-adder n) (lambda (x) (+ x n)))
         (define add3 (make-adder 3))
         (define add10 (make-adder 10))",
    );
    assert_eq!(show(&interp, "(add3 4)"), "7");
    assert_eq!(show(&interp, "(add10 4)"), "14");
    assert_eq!(show(&interp, "((make-adder 1) 1)"), "2");
    assert_eq!(
        interp.eval("n"),
        Err(EvalError::UnboundName("n".to_string()))
    );
}

#[test]
fn test_numeric_tower() {
    let interp = Interpreter::new();
    assert_eq!(show(&interp, "(/ 1 3)"), "1/3");
    assert_eq!(show(&interp, "(+ 1/3 2/3)"), "1");
    assert_eq!(show(&interp, "(+ 1 2.5)"), "3.5");
    assert_eq!(show(&interp, "(* 1.0 2)"), "2.0");
    assert_eq!(show(&interp, "(exact->inexact 1/4)"), "0.25");
    assert_eq!(show(&interp, "(+ 1/2 0.5)"), "1.0");
    assert_eq!(show(&interp, "(+ 1/2 1/2)"), "1");
    assert!(matches!(interp.eval("(/ 5 0)"), Err(EvalError::Domain(_))));
}

#[test]
fn test_large_inexact_values() {
    let interp = Interpreter::new();
    let printed = show(&interp, "(* 1.0 100000000000000000000)");
    assert_eq!(printed, "100000000000000000000.0");
    assert_eq!(show(&interp, &format!("(inexact? {})", printed)), "true");

    interp
        .eval("(define big (exact->inexact (/ (+ (expt 10 400) 1) (expt 10 399))))")
        .unwrap();
    assert_eq!(show(&interp, "(inexact? big)"), "true");
    assert_eq!(show(&interp, "(< (abs (- big 10.0)) 1e-9)"), "true");
    assert_eq!(show(&interp, "(< big 11.0)"), "true");
    assert_eq!(show(&interp, "(< (/ (+ (expt 10 400) 1) (expt 10 399)) 11.0)"), "true");
}

#[test]
fn test_short_circuit_skips_errors() {
    let interp = Interpreter::new();
    assert_eq!(show(&interp, "(and false (car 1))"), "false");
    assert_eq!(show(&interp, "(or true (/ 1 0))"), "true");
    assert_eq!(show(&interp, "(if true 1 (undefined))"), "1");
    assert_eq!(show(&interp, "(and false undefined-name)"), "false");
    assert_eq!(show(&interp, "(or true undefined-name)"), "true");
}

#[test]
fn test_structs_round_trip() {
    let interp = load(
        "(define-struct posn (x y))
         (define (distance p)
           (sqrt (+ (* (posn-x p) (posn-x p)) (* (posn-y p) (posn-y p)))))",
    );
    assert_eq!(show(&interp, "(distance (make-posn 3 4))"), "5");
    assert_eq!(show(&interp, "(make-posn 1 (list 2))"), "(make-posn 1 (list 2))");
    assert_eq!(show(&interp, "(posn? (make-posn 1 2))"), "true");
    assert_eq!(
        interp.eval("(equal? (make-posn 1 2) (make-posn 1 2))").unwrap(),
        Expression::Boolean(true)
    );
}

#[test]
fn test_errors_leave_session_usable() {
    let interp = Interpreter::new();
    assert_eq!(
        interp.eval("(cond [false 1])"),
        Err(EvalError::Domain(
            "cond: Reached end without finding true condition".to_string()
        ))
    );
    assert!(matches!(interp.eval("(+ 1 \"2\")"), Err(EvalError::Type { .. })));
    assert!(matches!(interp.eval("(+ 1"), Err(EvalError::Syntax(_))));

    interp.eval("(define x 1)").unwrap();
    assert_eq!(
        interp.eval("(define x 2)"),
        Err(EvalError::DuplicateBinding("x".to_string()))
    );
    assert_eq!(show(&interp, "x"), "1");
}

#[test]
fn test_checks_run_after_whole_program() {
    let interp = load(
        "(check-expect (area 2) 4)
         (check-expect (area 3) 10)
         (check-within (/ (area 1) 3) 0.33 0.01)
         (define (area s) (* s s))",
    );

    let report = interp.run_checks();
    assert_eq!(report.total(), 3);
    assert_eq!(report.passed, 2);
    assert_eq!(report.failures[0].message, "Expected: 10, got: 9");
    assert!(report.to_string().ends_with("Passed 2 of 3 test(s)."));
}

#[test]
fn test_strings_symbols_and_quote() {
    let interp = Interpreter::new();
    assert_eq!(show(&interp, "(string-append \"step\" \"per\")"), "\"stepper\"");
    assert_eq!(show(&interp, "(string->symbol \"abc\")"), "'abc");
    assert_eq!(show(&interp, "(symbol=? 'a 'a)"), "true");
    assert_eq!(show(&interp, "'(1 (2 x) \"s\")"), "(list 1 (list 2 'x) \"s\")");
}

#[test]
fn test_strings_ending_in_escaped_backslash() {
    let interp = Interpreter::new();
    assert_eq!(show(&interp, r#"(string-length "a\\")"#), "2");
    assert_eq!(show(&interp, r#"(string-length "\\\"")"#), "2");
    assert_eq!(show(&interp, r#"(string-append "a\\" "b")"#), r#""a\\b""#);
}
