//! Errors that abort evaluation.
//!
//! Almost everything that goes wrong during instantiation is a warning that
//! lands in the diagnostic queue while evaluation carries on. These are the
//! two exceptions.

use std::fmt;

use scad_diagnostic::Diagnostic;
use thiserror::Error;

/// Whether a callable is a module or a function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallableKind {
    Module,
    Function,
}

impl fmt::Display for CallableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallableKind::Module => f.write_str("module"),
            CallableKind::Function => f.write_str("function"),
        }
    }
}

/// A user-defined module or function, identified by kind and name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Callee {
    pub kind: CallableKind,
    pub name: String,
}

impl Callee {
    pub fn module(name: impl Into<String>) -> Self {
        Callee {
            kind: CallableKind::Module,
            name: name.into(),
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Callee {
            kind: CallableKind::Function,
            name: name.into(),
        }
    }
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// The recursion guard tripped.
///
/// Carried up the Rust stack until the outermost active invocation of
/// `target` turns it into a single diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecursionTrip {
    /// Callable whose outermost invocation absorbs the trip.
    pub target: Callee,
    /// Active call chain at the trip, outermost first, with repeats collapsed.
    pub chain: Vec<String>,
}

impl fmt::Display for RecursionTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recursion detected calling {}", self.target)
    }
}

/// Evaluation aborted.
#[derive(Clone, Debug, Error)]
pub enum EvalError {
    /// Strict mode escalated a warning. Reaches the top-level caller.
    #[error("{0}")]
    HardWarning(Diagnostic),
    /// Recursion guard tripped. Never escapes `Evaluator::instantiate`.
    #[error("{0}")]
    Recursion(RecursionTrip),
}

impl EvalError {
    /// The escalated diagnostic, for strict-mode aborts.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            EvalError::HardWarning(diag) => Some(diag),
            EvalError::Recursion(_) => None,
        }
    }
}
