//! Diagnostic system for evaluator warnings and errors.
//!
//! Every user-visible problem found while loading units or instantiating
//! modules becomes a [`Diagnostic`]:
//! - an error code for searchability
//! - a severity
//! - a message saying what went wrong
//! - the file and line it went wrong in, when known
//!
//! Diagnostics are collected in a [`DiagnosticQueue`] and handed back to the
//! host. They are never written to a log on their own; rendering is the
//! host's choice (see [`emitter`]).

mod diagnostic;
pub mod emitter;
mod error_code;
pub mod queue;

pub use diagnostic::{Diagnostic, Severity};
pub use emitter::{render, DiagnosticEmitter, TextEmitter};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticQueue, QueueConfig};
