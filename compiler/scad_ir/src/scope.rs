//! Scopes, instantiation requests and definitions.
//!
//! A `Scope` is what the parser hands over for a file body, a module body,
//! or the children block of a call site. Insertion order of `children` is
//! execution order; definition maps are keyed by name.

use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::{ArgumentList, Argument, Assignment, Expr, Location, Parameter};

bitflags! {
    /// Call-site modifier characters (`!`, `#`, `%`).
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Tags: u8 {
        /// `!` - render only this subtree.
        const ROOT = 1;
        /// `#` - highlight this subtree.
        const HIGHLIGHT = 1 << 1;
        /// `%` - show this subtree as transparent background.
        const BACKGROUND = 1 << 2;
    }
}

/// Ordered assignments, child requests, and nested definitions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {
    pub assignments: Vec<Assignment>,
    pub children: Vec<InstantiationRequest>,
    pub functions: FxHashMap<String, Arc<FunctionDef>>,
    pub modules: FxHashMap<String, Arc<ModuleDef>>,
}

impl Scope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the scope has nothing to evaluate or define.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
            && self.children.is_empty()
            && self.functions.is_empty()
            && self.modules.is_empty()
    }

    pub fn push_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    pub fn push_child(&mut self, request: InstantiationRequest) {
        self.children.push(request);
    }

    /// Register a module definition.
    ///
    /// A later definition with the same name silently replaces the earlier one.
    pub fn define_module(&mut self, module: ModuleDef) {
        self.modules.insert(module.name.clone(), Arc::new(module));
    }

    /// Register a function definition; same replacement rule as modules.
    pub fn define_function(&mut self, function: FunctionDef) {
        self.functions
            .insert(function.name.clone(), Arc::new(function));
    }

    /// Builder form of [`Scope::push_assignment`].
    #[must_use]
    pub fn with_assignment(mut self, name: impl Into<String>, expr: Expr) -> Self {
        self.push_assignment(Assignment::new(name, expr));
        self
    }

    /// Builder form of [`Scope::push_child`].
    #[must_use]
    pub fn with_child(mut self, request: InstantiationRequest) -> Self {
        self.push_child(request);
        self
    }

    /// Builder form of [`Scope::define_module`].
    #[must_use]
    pub fn with_module(mut self, module: ModuleDef) -> Self {
        self.define_module(module);
        self
    }

    /// Builder form of [`Scope::define_function`].
    #[must_use]
    pub fn with_function(mut self, function: FunctionDef) -> Self {
        self.define_function(function);
        self
    }

    pub fn lookup_module(&self, name: &str) -> Option<&Arc<ModuleDef>> {
        self.modules.get(name)
    }

    pub fn lookup_function(&self, name: &str) -> Option<&Arc<FunctionDef>> {
        self.functions.get(name)
    }

    /// Splice `other` into this scope as if its text appeared at the given
    /// positions.
    ///
    /// Assignments land before `self.assignments[assignment_at]` and children
    /// before `self.children[child_at]` (indices are clamped). Definitions
    /// from `other` never replace definitions already present here.
    pub fn splice(&mut self, other: Scope, assignment_at: usize, child_at: usize) {
        let assignment_at = assignment_at.min(self.assignments.len());
        let child_at = child_at.min(self.children.len());
        self.assignments
            .splice(assignment_at..assignment_at, other.assignments);
        self.children.splice(child_at..child_at, other.children);
        for (name, def) in other.functions {
            self.functions.entry(name).or_insert(def);
        }
        for (name, def) in other.modules {
            self.modules.entry(name).or_insert(def);
        }
    }
}

/// A module or control call site: `name(args) { body } else { alternate }`.
#[derive(Clone, Debug, PartialEq)]
pub struct InstantiationRequest {
    pub name: String,
    pub arguments: ArgumentList,
    /// Children block. For `if` requests this is the then-branch.
    ///
    /// Shared so a module invocation can hold on to its caller's children
    /// block for `children()` without copying it.
    pub body: Arc<Scope>,
    pub tags: Tags,
    /// Else-branch of an `if` request.
    pub alternate: Option<Scope>,
    pub location: Location,
}

impl InstantiationRequest {
    /// Create a request with no arguments and an empty body.
    pub fn new(name: impl Into<String>) -> Self {
        InstantiationRequest {
            name: name.into(),
            arguments: ArgumentList::new(),
            body: Arc::new(Scope::new()),
            tags: Tags::empty(),
            alternate: None,
            location: Location::NONE,
        }
    }

    /// Create an `if` request: the condition is the single argument.
    pub fn if_else(condition: Expr, then_branch: Scope, else_branch: Option<Scope>) -> Self {
        let mut request = InstantiationRequest::new("if").with_body(then_branch);
        request.arguments.push(Argument::positional(condition));
        request.alternate = else_branch;
        request
    }

    /// True for `if` requests.
    pub fn is_if(&self) -> bool {
        self.name == "if"
    }

    #[must_use]
    pub fn with_arg(mut self, value: Expr) -> Self {
        self.arguments.push(Argument::positional(value));
        self
    }

    #[must_use]
    pub fn with_named_arg(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.arguments.push(Argument::named(name, value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Scope) -> Self {
        self.body = Arc::new(body);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: InstantiationRequest) -> Self {
        Arc::make_mut(&mut self.body).push_child(child);
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// `module name(params) { body }`
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleDef {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: Scope,
    pub location: Location,
}

impl ModuleDef {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>, body: Scope) -> Self {
        ModuleDef {
            name: name.into(),
            parameters,
            body,
            location: Location::NONE,
        }
    }
}

/// `function name(params) = body;`
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: Expr,
    pub location: Location,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>, body: Expr) -> Self {
        FunctionDef {
            name: name.into(),
            parameters,
            body,
            location: Location::NONE,
        }
    }
}
