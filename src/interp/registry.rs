//! Tables of built-in procedures and special forms

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::EvalResult;
use crate::interp::expression::{Expression, NativeFn, Procedure};
use crate::interp::scope::ScopeRef;
use crate::interp::stdlib::{self, testing::PendingCheck};

/// Signature of a built-in implemented as a plain function
pub type Builtin = fn(Vec<Expression>, &ScopeRef, &EvalContext) -> EvalResult<Expression>;

/// Name -> native function tables.
///
/// Filled once at startup and read-only afterwards. Special forms receive
/// their operands as `Deferred` text; ordinary procedures receive values.
#[derive(Default)]
pub struct Registry {
    procedures: HashMap<String, NativeFn>,
    special_forms: HashMap<String, NativeFn>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the full built-in library
    pub fn standard() -> Self {
        let mut registry = Self::new();
        stdlib::register_all(&mut registry);
        registry
    }

    pub fn register_procedure(&mut self, name: &str, builtin: Builtin) {
        self.procedures.insert(name.to_string(), Rc::new(builtin));
    }

    pub fn register_special_form(&mut self, name: &str, builtin: Builtin) {
        self.special_forms.insert(name.to_string(), Rc::new(builtin));
    }

    pub fn lookup_procedure(&self, name: &str) -> Option<Procedure> {
        self.procedures
            .get(name)
            .map(|native| Procedure::native(name, Rc::clone(native)))
    }

    pub fn lookup_special_form(&self, name: &str) -> Option<Procedure> {
        self.special_forms
            .get(name)
            .map(|native| Procedure::special(name, Rc::clone(native)))
    }

    pub fn is_special_form(&self, name: &str) -> bool {
        self.special_forms.contains_key(name)
    }

    /// True if either table has `name`
    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name) || self.special_forms.contains_key(name)
    }

    /// Every registered name, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .procedures
            .keys()
            .chain(self.special_forms.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// State shared by every reduction step of one interpreter
pub struct EvalContext {
    pub registry: Registry,
    /// `check-expect` cases waiting for `run-tests`
    pub checks: RefCell<Vec<PendingCheck>>,
}

impl EvalContext {
    pub fn new(registry: Registry) -> Self {
        EvalContext {
            registry,
            checks: RefCell::new(Vec::new()),
        }
    }

    pub fn pending_checks(&self) -> usize {
        self.checks.borrow().len()
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(Registry::standard())
    }
}
