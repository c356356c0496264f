//! The builtin library that lives in the root frame.
//!
//! Three kinds of builtin:
//! - functions: pure `fn(&[Value]) -> Value`
//! - primitive modules: geometry and transforms the evaluator does not
//!   interpret; it only binds their parameters into a `Builtin` node
//! - control modules: `if`, `for`, `children` and friends, implemented by
//!   the evaluator itself because they need frames

mod functions;
mod modules;

pub use functions::FUNCTIONS;
pub use modules::PRIMITIVES;

use crate::Value;

/// A builtin function.
pub struct BuiltinFunction {
    pub name: &'static str,
    /// Arguments are passed positionally; names are ignored.
    pub call: fn(&[Value]) -> Value,
}

impl std::fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BuiltinFunction({})", self.name)
    }
}

/// A builtin geometry or transform module.
#[derive(Debug)]
pub struct PrimitiveSpec {
    pub name: &'static str,
    pub parameters: &'static [&'static str],
    /// Record the resolved `$fn`, `$fa`, `$fs` on the node.
    pub resolution: bool,
    /// Instantiate the request body as the node's children.
    pub takes_children: bool,
}

/// Modules the evaluator implements directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ControlModule {
    Group,
    If,
    For,
    IntersectionFor,
    Let,
    Echo,
    Assert,
    Children,
}

impl ControlModule {
    pub const ALL: [ControlModule; 8] = [
        ControlModule::Group,
        ControlModule::If,
        ControlModule::For,
        ControlModule::IntersectionFor,
        ControlModule::Let,
        ControlModule::Echo,
        ControlModule::Assert,
        ControlModule::Children,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ControlModule::Group => "group",
            ControlModule::If => "if",
            ControlModule::For => "for",
            ControlModule::IntersectionFor => "intersection_for",
            ControlModule::Let => "let",
            ControlModule::Echo => "echo",
            ControlModule::Assert => "assert",
            ControlModule::Children => "children",
        }
    }
}

/// A builtin module binding.
#[derive(Copy, Clone, Debug)]
pub enum BuiltinModule {
    Control(ControlModule),
    Primitive(&'static PrimitiveSpec),
}

impl BuiltinModule {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinModule::Control(control) => control.name(),
            BuiltinModule::Primitive(spec) => spec.name,
        }
    }
}

/// Every builtin module, controls first.
pub fn modules() -> impl Iterator<Item = BuiltinModule> {
    ControlModule::ALL
        .into_iter()
        .map(BuiltinModule::Control)
        .chain(PRIMITIVES.iter().map(BuiltinModule::Primitive))
}
