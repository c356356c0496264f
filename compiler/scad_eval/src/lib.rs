//! Scad Eval - scope resolution and module instantiation.
//!
//! This crate turns parsed scopes into node trees. It knows nothing about
//! geometry: builtin shapes and transforms come out as opaque `Builtin` nodes
//! carrying their bound arguments.
//!
//! # Architecture
//!
//! The evaluator uses:
//! - `Frame` / `FrameRef`: lexical binding environment, one frame per file,
//!   invocation or block
//! - `Evaluator`: the session, holding the dynamic stack through which `$`
//!   variables resolve, the call stack and the recursion guard
//! - `operators::binary` / `operators::unary`: direct enum-based operator
//!   dispatch on `Value`
//! - `builtins`: the library bound in the root frame
//!
//! Compiled units come from `scad_units` through its `UnitSource` trait;
//! diagnostics are `scad_diagnostic` values collected in the session's queue.

mod config;
pub mod builtins;
pub mod diagnostics;
mod errors;
mod evaluator;
mod frame;
mod node;
pub mod operators;
mod print_handler;
mod value;

pub use config::EvalConfig;
pub use diagnostics::{CallFrame, CallStack, EvalCounters};
pub use errors::{Callee, CallableKind, EvalError, RecursionTrip};
pub use evaluator::{Evaluator, EvaluatorBuilder};
pub use frame::{
    is_special, Children, Found, Frame, FrameKind, FrameRef, FunctionBinding, ModuleBinding,
    SPECIAL_DEFAULTS,
};
pub use node::{Node, NodeKind};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler,
};
pub use value::{format_number, RangeValue, Value, MAX_CHILDREN_ELEMENTS, MAX_FOR_ELEMENTS};
