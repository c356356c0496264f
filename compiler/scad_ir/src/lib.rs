//! Scad IR - syntax tree and scope data model.
//!
//! This crate contains the data structures the external parser produces and
//! the evaluator consumes:
//! - `Location` for source positions
//! - `Expr` trees for expressions
//! - `Scope`, `InstantiationRequest`, `ModuleDef`, `FunctionDef` for
//!   statements and definitions
//!
//! # Ownership
//!
//! A `Scope` exclusively owns its assignments and child requests (plain
//! vectors). Definitions and request bodies are shared as `Arc`: the
//! evaluator pairs a definition with the frame it was found in, and a module
//! invocation keeps its caller's children block for `children()`, both for
//! the duration of a call.

mod ast;
mod location;
mod scope;

pub use ast::{Argument, Assignment, BinaryOp, Expr, ExprKind, Literal, Parameter, UnaryOp};
pub use location::Location;
pub use scope::{FunctionDef, InstantiationRequest, ModuleDef, Scope, Tags};

/// Arguments of an instantiation request. Short in practice; kept inline.
pub type ArgumentList = smallvec::SmallVec<[Argument; 4]>;
