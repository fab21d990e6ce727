//! Small-step interpreter core
//!
//! Source text is parsed lazily: a tuple becomes a [`Partial`] that is only
//! classified when reduced, and special-form operands stay [`Deferred`] until
//! the form decides to evaluate them. [`interpret_save_steps`] exposes every
//! intermediate expression so a front end can show the reduction.

pub mod evaluator;
pub mod expression;
pub mod numeric;
pub mod parser;
pub mod registry;
pub mod scope;
pub mod stdlib;
pub mod tuple;

pub use evaluator::{force, interpret, interpret_save_steps, Interpreter, StepTrace};
pub use expression::{Deferred, Expression, Lambda, NativeFn, Partial, Procedure, StructValue, Tuple};
pub use numeric::Numeric;
pub use parser::{parse, parse_special_form};
pub use registry::{EvalContext, Registry};
pub use scope::{Scope, ScopeRef};
pub use stdlib::testing::{CheckFailure, CheckReport};
pub use tuple::{find_tuple_end, parse_tuple, split_forms};
