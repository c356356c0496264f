//! Scadc - driver facade for the scad evaluator.
//!
//! Wires the unit cache and the evaluator together in the order a host
//! needs them:
//!
//! ```text
//! Driver::load             parse the root file, resolve everything it uses
//! Driver::instantiate_root evaluate the root unit into a node tree
//! Driver::take_diagnostics cache and evaluator diagnostics, in report order
//! ```
//!
//! The parser is supplied by the host as a [`scad_units::SourceParser`].
//!
//! # Debugging
//!
//! - `RUST_LOG=scad_units=debug`: cache hits, re-parses and promotions
//! - `RUST_LOG=scad_eval=trace`: every instantiation and frame
//! - `SCAD_LOG_TREE=1`: indent log lines by span nesting

mod config;
mod driver;
mod errors;
mod logging;

pub use config::{parse_flag, DriverConfig, HARD_WARNINGS_VAR};
pub use driver::Driver;
pub use errors::DriverError;
pub use logging::{init_tracing, LOG_TREE_VAR};

pub use scad_eval::{EvalConfig, Node, NodeKind, Value};
pub use scad_units::{SearchPath, LIBRARY_PATH_VAR};
