//! Scope chain for name resolution

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::error::{EvalError, EvalResult};
use crate::interp::Expression;

/// Shared handle to a scope node
pub type ScopeRef = Rc<Scope>;

/// One node in a parent-linked environment chain.
///
/// Bindings are owned by the node. The parent link is shared so closures
/// can keep their defining scope alive after the call that built them has
/// returned. `global` points at the program scope that `define` writes to;
/// it is resolved once when the node is built.
pub struct Scope {
    /// Local bindings
    bindings: RefCell<HashMap<String, Expression>>,
    /// Enclosing scope
    parent: Option<ScopeRef>,
    /// Program scope for this chain
    global: Weak<Scope>,
}

impl Scope {
    /// Create a root scope. It is its own program scope.
    pub fn root() -> ScopeRef {
        Rc::new_cyclic(|this| Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
            global: this.clone(),
        })
    }

    /// Create a child scope sharing the parent's program scope
    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
            global: parent.global.clone(),
        })
    }

    /// Create a child scope that acts as the program scope for everything
    /// nested inside it. Used by `local` blocks.
    pub fn program(parent: &ScopeRef) -> ScopeRef {
        Rc::new_cyclic(|this| Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
            global: this.clone(),
        })
    }

    /// True if `name` resolves here or in any ancestor
    pub fn contains(&self, name: &str) -> bool {
        self.has_local(name) || self.parent.as_ref().map_or(false, |p| p.contains(name))
    }

    /// True if `name` is bound in this node
    pub fn has_local(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Bind `name` in this node
    pub fn define(&self, name: &str, value: Expression) -> EvalResult<()> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return Err(EvalError::DuplicateBinding(name.to_string()));
        }

        debug!(name, value = %value, "define");
        bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Bind `name` in the program scope of this chain
    pub fn define_global(&self, name: &str, value: Expression) -> EvalResult<()> {
        match self.global.upgrade() {
            Some(global) => global.define(name, value),
            None => self.define(name, value),
        }
    }

    /// The program scope of this chain
    pub fn global(self: &Rc<Self>) -> ScopeRef {
        self.global.upgrade().unwrap_or_else(|| Rc::clone(self))
    }

    /// Look up `name`, returning a copy of the bound expression
    pub fn get_definition(&self, name: &str) -> EvalResult<Expression> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Ok(value.clone());
        }

        match &self.parent {
            Some(parent) => parent.get_definition(name),
            None => Err(EvalError::UnboundName(name.to_string())),
        }
    }

    /// Drop every local binding
    pub fn clear(&self) {
        // Take the map out first so dropped expressions never observe a live borrow
        let bindings = std::mem::take(&mut *self.bindings.borrow_mut());
        drop(bindings);
    }

    /// Enclosing scope, if any
    pub fn parent(&self) -> Option<&ScopeRef> {
        self.parent.as_ref()
    }

    /// Names bound in this node, sorted
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Local bindings rendered as `(name, value)` pairs, sorted by name
    pub fn local_bindings(&self) -> Vec<(String, String)> {
        let bindings = self.bindings.borrow();
        let mut pairs: Vec<(String, String)> = bindings
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        pairs.sort();
        pairs
    }

    /// Number of local bindings
    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    /// True if there are no local bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }

    /// Number of ancestors above this node
    pub fn depth(&self) -> usize {
        self.parent.as_ref().map_or(0, |p| p.depth() + 1)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bindings can hold closures over this very chain, so only names are shown
        f.debug_struct("Scope")
            .field("names", &self.local_names())
            .field("depth", &self.depth())
            .finish()
    }
}
