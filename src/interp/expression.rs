//! Expression model and the single-step reduction protocol
//!
//! Every runtime object is an [`Expression`]. Values (numbers, strings,
//! lists, procedures...) reduce to themselves; the three intermediate forms
//! move one step closer to a value each time they are reduced:
//!
//! - [`Deferred`] holds source text that has not been parsed yet. Special
//!   forms receive their operands this way and choose when to evaluate them.
//! - [`Partial`] holds the tokens of a tuple that has not been classified as
//!   a lambda, a special form or an application.
//! - [`Tuple`] is an application whose members are reduced left to right, one
//!   redex per step, before the head is called.

use std::fmt;
use std::rc::Rc;

use num_rational::BigRational;
use tracing::debug;

use crate::error::{EvalError, EvalResult};
use crate::interp::numeric::{format_exact, format_inexact};
use crate::interp::parser;
use crate::interp::registry::EvalContext;
use crate::interp::scope::{Scope, ScopeRef};

/// Host function backing a built-in procedure or special form
pub type NativeFn = Rc<dyn Fn(Vec<Expression>, &ScopeRef, &EvalContext) -> EvalResult<Expression>>;

/// Runtime expression
#[derive(Debug, Clone)]
pub enum Expression {
    /// Unparsed source text bound to the scope it must be read in
    Deferred(Deferred),
    /// Tokens of a tuple awaiting classification
    Partial(Partial),
    /// Application under reduction
    Tuple(Tuple),
    /// Built-in procedure or special form
    Procedure(Procedure),
    /// User-defined closure
    Lambda(Lambda),
    /// Exact rational
    Number(BigRational),
    /// Inexact real
    Inexact(f64),
    Boolean(bool),
    Void,
    /// Symbol name, without the leading quote
    Symbol(String),
    Str(String),
    Character(char),
    Struct(StructValue),
    /// Proper list; `empty` is the empty vector
    List(im::Vector<Expression>),
}

/// Source text plus the scope it will be parsed in
#[derive(Debug, Clone)]
pub struct Deferred {
    pub text: String,
    pub scope: ScopeRef,
}

/// Raw tuple tokens plus the scope they will be parsed in
#[derive(Debug, Clone)]
pub struct Partial {
    pub tokens: Vec<String>,
    pub scope: ScopeRef,
}

/// Application: head followed by arguments
#[derive(Debug, Clone)]
pub struct Tuple {
    pub members: Vec<Expression>,
    pub scope: ScopeRef,
}

/// Named native procedure
#[derive(Clone)]
pub struct Procedure {
    name: String,
    native: NativeFn,
    special: bool,
}

/// Closure over the scope it was created in
#[derive(Debug, Clone)]
pub struct Lambda {
    /// Name given by `define`, if any
    pub name: Option<String>,
    pub params: Vec<String>,
    /// Body source, parsed afresh on every call
    pub body: String,
    pub scope: ScopeRef,
}

/// Instance of a `define-struct` type
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub type_name: String,
    pub fields: Vec<(String, Expression)>,
}

impl StructValue {
    /// Field value by name
    pub fn field(&self, name: &str) -> Option<&Expression> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

impl Expression {
    /// Exact integer literal
    pub fn integer(value: impl Into<num_bigint::BigInt>) -> Self {
        Expression::Number(BigRational::from_integer(value.into()))
    }

    /// The empty list
    pub fn empty() -> Self {
        Expression::List(im::Vector::new())
    }

    /// False only for the forms that still have work to do.
    ///
    /// A `Deferred` counts as a value: it is inert until a special form
    /// forces it.
    pub fn is_value(&self) -> bool {
        !matches!(self, Expression::Partial(_) | Expression::Tuple(_))
    }

    /// Human-readable kind, used in type errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Deferred(_) => "unevaluated expression",
            Expression::Partial(_) | Expression::Tuple(_) => "application",
            Expression::Procedure(_) | Expression::Lambda(_) => "procedure",
            Expression::Number(_) | Expression::Inexact(_) => "number",
            Expression::Boolean(_) => "boolean",
            Expression::Void => "void",
            Expression::Symbol(_) => "symbol",
            Expression::Str(_) => "string",
            Expression::Character(_) => "character",
            Expression::Struct(_) => "struct",
            Expression::List(_) => "list",
        }
    }

    /// Perform exactly one reduction step
    pub fn reduce_one_step(self, ctx: &EvalContext) -> EvalResult<Expression> {
        match self {
            Expression::Deferred(deferred) => parser::parse(&deferred.text, &deferred.scope, ctx),
            Expression::Partial(partial) => partial.reduce(ctx),
            Expression::Tuple(tuple) => tuple.reduce(ctx),
            value => Ok(value),
        }
    }

    /// Structural equality as seen by `equal?` and `check-expect`
    pub fn structurally_equal(&self, other: &Expression) -> bool {
        self == other
    }
}

impl Partial {
    fn reduce(self, ctx: &EvalContext) -> EvalResult<Expression> {
        let head = self
            .tokens
            .first()
            .ok_or_else(|| EvalError::Syntax("Empty application: ()".to_string()))?;

        if head == "lambda" {
            return Lambda::from_tokens(&self.tokens, self.scope).map(Expression::Lambda);
        }

        let members = if ctx.registry.is_special_form(head) {
            self.tokens
                .iter()
                .map(|token| parser::parse_special_form(token, &self.scope, ctx))
                .collect::<EvalResult<Vec<_>>>()?
        } else {
            self.tokens
                .iter()
                .map(|token| match parser::parse(token, &self.scope, ctx)? {
                    partial @ Expression::Partial(_) => partial.reduce_one_step(ctx),
                    other => Ok(other),
                })
                .collect::<EvalResult<Vec<_>>>()?
        };

        Ok(Expression::Tuple(Tuple {
            members,
            scope: self.scope,
        }))
    }
}

impl Tuple {
    fn reduce(mut self, ctx: &EvalContext) -> EvalResult<Expression> {
        if let Some(index) = self.members.iter().position(|member| !member.is_value()) {
            let pending = std::mem::replace(&mut self.members[index], Expression::Void);
            self.members[index] = pending.reduce_one_step(ctx)?;
            return Ok(Expression::Tuple(self));
        }

        if self.members.is_empty() {
            return Err(EvalError::Syntax("Empty application: ()".to_string()));
        }

        let head = self.members.remove(0);
        match head {
            Expression::Procedure(procedure) => procedure.call(self.members, &self.scope, ctx),
            Expression::Lambda(lambda) => lambda.call(self.members, ctx),
            other => Err(EvalError::type_mismatch(
                "application",
                "procedure",
                other,
            )),
        }
    }
}

impl Procedure {
    /// Ordinary procedure: receives fully reduced arguments
    pub fn native(name: impl Into<String>, native: NativeFn) -> Self {
        Procedure {
            name: name.into(),
            native,
            special: false,
        }
    }

    /// Special form: receives its operands unevaluated
    pub fn special(name: impl Into<String>, native: NativeFn) -> Self {
        Procedure {
            name: name.into(),
            native,
            special: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_special(&self) -> bool {
        self.special
    }

    pub fn call(
        &self,
        args: Vec<Expression>,
        scope: &ScopeRef,
        ctx: &EvalContext,
    ) -> EvalResult<Expression> {
        (self.native)(args, scope, ctx)
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name)
            .field("special", &self.special)
            .finish()
    }
}

impl Lambda {
    /// Build a closure from `lambda (params...) body` tokens
    pub fn from_tokens(tokens: &[String], scope: ScopeRef) -> EvalResult<Lambda> {
        if tokens.len() != 3 {
            return Err(EvalError::Syntax(format!(
                "lambda: expected parameters and exactly one body expression in ({})",
                tokens.join(" ")
            )));
        }

        let params_text = &tokens[1];
        if !params_text.starts_with(['(', '[']) {
            return Err(EvalError::Syntax(format!(
                "lambda: expected a parameter list, found {}",
                params_text
            )));
        }

        Ok(Lambda {
            name: None,
            params: crate::interp::tuple::parse_tuple(params_text)?,
            body: tokens[2].clone(),
            scope,
        })
    }

    /// Bind the arguments in a fresh frame and start reducing the body
    pub fn call(self, args: Vec<Expression>, ctx: &EvalContext) -> EvalResult<Expression> {
        let callee = self.name.as_deref().unwrap_or("lambda");
        if args.len() != self.params.len() {
            return Err(EvalError::arity(callee, self.params.len(), args.len()));
        }

        let frame = Scope::child(&self.scope);
        for (param, arg) in self.params.iter().zip(args) {
            frame.define(param, arg)?;
        }
        debug!(callee, params = ?self.params, "lambda frame");

        match parser::parse(&self.body, &frame, ctx)? {
            partial @ Expression::Partial(_) => partial.reduce_one_step(ctx),
            other => Ok(other),
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        use Expression::*;
        match (self, other) {
            (Number(a), Number(b)) => a == b,
            (Inexact(a), Inexact(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Void, Void) => true,
            (Symbol(a), Symbol(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Character(a), Character(b)) => a == b,
            (Struct(a), Struct(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Procedure(a), Procedure(b)) => a.name == b.name && a.special == b.special,
            (Lambda(a), Lambda(b)) => a.params == b.params && a.body == b.body,
            (Deferred(a), Deferred(b)) => a.text == b.text,
            (Partial(a), Partial(b)) => a.tokens == b.tokens,
            (Tuple(a), Tuple(b)) => a.members == b.members,
            _ => false,
        }
    }
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = &'a Expression>,
) -> fmt::Result {
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_char_literal(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    match ch {
        ' ' => write!(f, "#\\space"),
        '\n' => write!(f, "#\\newline"),
        '\t' => write!(f, "#\\tab"),
        other => write!(f, "#\\{}", other),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Deferred(deferred) => write!(f, "{}", deferred.text),
            Expression::Partial(partial) => write!(f, "({})", partial.tokens.join(" ")),
            Expression::Tuple(tuple) => {
                write!(f, "(")?;
                write_joined(f, &tuple.members)?;
                write!(f, ")")
            }
            Expression::Procedure(procedure) => write!(f, "{}", procedure.name),
            Expression::Lambda(lambda) => match &lambda.name {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "(lambda ({}) {})", lambda.params.join(" "), lambda.body),
            },
            Expression::Number(value) => write!(f, "{}", format_exact(value)),
            Expression::Inexact(value) => write!(f, "{}", format_inexact(*value)),
            Expression::Boolean(value) => write!(f, "{}", value),
            Expression::Void => write!(f, "#<void>"),
            Expression::Symbol(name) if name.is_empty() || name.contains(char::is_whitespace) => {
                write!(f, "'|{}|", name)
            }
            Expression::Symbol(name) => write!(f, "'{}", name),
            Expression::Str(text) => write!(f, "{:?}", text),
            Expression::Character(ch) => write_char_literal(f, *ch),
            Expression::Struct(value) => {
                write!(f, "(make-{}", value.type_name)?;
                for (_, field) in &value.fields {
                    write!(f, " {}", field)?;
                }
                write!(f, ")")
            }
            Expression::List(items) if items.is_empty() => write!(f, "empty"),
            Expression::List(items) => {
                write!(f, "(list ")?;
                write_joined(f, items)?;
                write!(f, ")")
            }
        }
    }
}
