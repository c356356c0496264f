//! Binding environment.
//!
//! A `Frame` is one level of lexical scope: the root frame with the builtin
//! library, a file frame, a module or function invocation, or a block such as
//! a loop iteration. Frames form a parent chain that name lookup walks from
//! the innermost frame outwards; the first hit wins.
//!
//! Special variables (`$fn`, `$t`, ...) are stored per frame but are *not*
//! found through the parent chain. The evaluator resolves them through its
//! dynamic stack of frames currently being evaluated, so a `$fn` set by a
//! caller reaches everything it instantiates.
//!
//! Frames are shared through [`FrameRef`]: an invocation frame keeps its
//! defining frame alive, and a captured children block keeps its caller
//! alive, for as long as either is needed.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use scad_ir::{FunctionDef, ModuleDef, Scope};
use scad_units::CompiledUnit;

use crate::builtins::{BuiltinFunction, BuiltinModule};
use crate::Value;

/// Defaults for the special variables, held by the root frame.
pub const SPECIAL_DEFAULTS: [(&str, Value); 5] = [
    ("$fn", Value::Number(0.0)),
    ("$fa", Value::Number(12.0)),
    ("$fs", Value::Number(2.0)),
    ("$t", Value::Number(0.0)),
    ("$preview", Value::Bool(false)),
];

/// True for names that live in the special-variable side channel.
///
/// `$children` is the exception: it is an ordinary lexical local.
pub fn is_special(name: &str) -> bool {
    name.starts_with('$') && name != "$children"
}

/// What a frame was created for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Root,
    File(PathBuf),
    Module(String),
    Function(String),
    Block,
}

/// A function bound in a frame.
#[derive(Clone, Debug)]
pub enum FunctionBinding {
    User(Arc<FunctionDef>),
    Builtin(&'static BuiltinFunction),
}

/// A module bound in a frame.
#[derive(Clone, Debug)]
pub enum ModuleBinding {
    User(Arc<ModuleDef>),
    Builtin(BuiltinModule),
}

/// Children block captured by a user-module invocation.
#[derive(Clone, Debug)]
pub struct Children {
    /// The body of the call site.
    pub body: Arc<Scope>,
    /// Frame the call site was evaluated in.
    pub caller: FrameRef,
}

/// Result of a function or module lookup.
#[derive(Clone, Debug)]
pub enum Found<B> {
    /// Bound in a frame; the frame becomes the invocation's parent.
    Frame(B, FrameRef),
    /// Defined in a unit brought in with `use`; the evaluator builds the
    /// unit's file frame to act as parent.
    Unit(B, Arc<CompiledUnit>),
}

/// One level of scope.
pub struct Frame {
    kind: FrameKind,
    parent: Option<FrameRef>,
    locals: FxHashMap<String, Value>,
    specials: FxHashMap<String, Value>,
    functions: FxHashMap<String, FunctionBinding>,
    modules: FxHashMap<String, ModuleBinding>,
    /// Units named by `use`, latest first. Only file frames have any.
    uses: Vec<Arc<CompiledUnit>>,
    children: Option<Children>,
}

impl Frame {
    pub fn new(kind: FrameKind, parent: Option<FrameRef>) -> Self {
        Frame {
            kind,
            parent,
            locals: FxHashMap::default(),
            specials: FxHashMap::default(),
            functions: FxHashMap::default(),
            modules: FxHashMap::default(),
            uses: Vec::new(),
            children: None,
        }
    }

    /// The root frame: builtins, constants and special-variable defaults.
    pub fn root() -> Self {
        let mut frame = Frame::new(FrameKind::Root, None);
        for function in &crate::builtins::FUNCTIONS {
            frame
                .functions
                .insert(function.name.to_string(), FunctionBinding::Builtin(function));
        }
        for module in crate::builtins::modules() {
            frame
                .modules
                .insert(module.name().to_string(), ModuleBinding::Builtin(module));
        }
        frame.set_variable("PI", Value::Number(std::f64::consts::PI));
        frame.set_variable("undef", Value::Undefined);
        for (name, value) in SPECIAL_DEFAULTS {
            frame.set_variable(name, value);
        }
        frame
    }

    pub fn kind(&self) -> &FrameKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<&FrameRef> {
        self.parent.as_ref()
    }

    /// Bind a variable in this frame. `$` names go to the specials map.
    ///
    /// Rebinding a name replaces the earlier value.
    pub fn set_variable(&mut self, name: &str, value: Value) {
        if is_special(name) {
            self.specials.insert(name.to_string(), value);
        } else {
            self.locals.insert(name.to_string(), value);
        }
    }

    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    pub fn special(&self, name: &str) -> Option<&Value> {
        self.specials.get(name)
    }

    /// Bind the function and module definitions of `scope` in this frame.
    pub fn define_scope(&mut self, scope: &Scope) {
        for (name, def) in &scope.functions {
            self.functions
                .insert(name.clone(), FunctionBinding::User(Arc::clone(def)));
        }
        for (name, def) in &scope.modules {
            self.modules
                .insert(name.clone(), ModuleBinding::User(Arc::clone(def)));
        }
    }

    pub fn set_uses(&mut self, uses: Vec<Arc<CompiledUnit>>) {
        self.uses = uses;
    }

    pub fn uses(&self) -> &[Arc<CompiledUnit>] {
        &self.uses
    }

    pub fn set_children(&mut self, children: Children) {
        self.children = Some(children);
    }
}

/// Shared, single-threaded handle to a [`Frame`].
#[repr(transparent)]
pub struct FrameRef(Rc<RefCell<Frame>>);

impl FrameRef {
    pub fn new(frame: Frame) -> Self {
        FrameRef(Rc::new(RefCell::new(frame)))
    }

    /// A fresh frame of `kind` whose parent is `self`.
    pub fn child(&self, kind: FrameKind) -> Self {
        FrameRef::new(Frame::new(kind, Some(self.clone())))
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, Frame> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, Frame> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &FrameRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn parent(&self) -> Option<FrameRef> {
        self.borrow().parent.clone()
    }

    /// Look an ordinary variable up along the lexical chain.
    pub fn lookup_local(&self, name: &str) -> Option<Value> {
        let mut frame = self.clone();
        loop {
            let next = {
                let f = frame.borrow();
                if let Some(value) = f.locals.get(name) {
                    return Some(value.clone());
                }
                f.parent.clone()
            };
            frame = next?;
        }
    }

    /// Look a function up along the lexical chain.
    ///
    /// File frames consult their used units after their own definitions.
    pub fn lookup_function(&self, name: &str) -> Option<Found<FunctionBinding>> {
        self.lookup(
            |f| f.functions.get(name).cloned(),
            |unit| {
                unit.scope()
                    .lookup_function(name)
                    .map(|def| FunctionBinding::User(Arc::clone(def)))
            },
        )
    }

    /// Look a module up along the lexical chain; same rules as functions.
    pub fn lookup_module(&self, name: &str) -> Option<Found<ModuleBinding>> {
        self.lookup(
            |f| f.modules.get(name).cloned(),
            |unit| {
                unit.scope()
                    .lookup_module(name)
                    .map(|def| ModuleBinding::User(Arc::clone(def)))
            },
        )
    }

    fn lookup<B>(
        &self,
        in_frame: impl Fn(&Frame) -> Option<B>,
        in_unit: impl Fn(&CompiledUnit) -> Option<B>,
    ) -> Option<Found<B>> {
        let mut frame = self.clone();
        loop {
            let next = {
                let f = frame.borrow();
                if let Some(binding) = in_frame(&f) {
                    return Some(Found::Frame(binding, frame.clone()));
                }
                for unit in &f.uses {
                    if let Some(binding) = in_unit(unit) {
                        return Some(Found::Unit(binding, Arc::clone(unit)));
                    }
                }
                f.parent.clone()
            };
            frame = next?;
        }
    }

    /// Path of the nearest enclosing file frame.
    pub fn file(&self) -> Option<PathBuf> {
        let mut frame = self.clone();
        loop {
            let next = {
                let f = frame.borrow();
                if let FrameKind::File(path) = f.kind() {
                    return Some(path.clone());
                }
                f.parent.clone()
            };
            frame = next?;
        }
    }

    /// Children block of the nearest lexically enclosing module invocation.
    pub fn nearest_children(&self) -> Option<Children> {
        let mut frame = self.clone();
        loop {
            let next = {
                let f = frame.borrow();
                if let Some(children) = &f.children {
                    return Some(children.clone());
                }
                f.parent.clone()
            };
            frame = next?;
        }
    }
}

impl Clone for FrameRef {
    #[inline]
    fn clone(&self) -> Self {
        FrameRef(Rc::clone(&self.0))
    }
}

/// Prints the kind only; the parent chain and captured callers would make
/// the output unbounded in practice.
impl fmt::Debug for FrameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(frame) => f.debug_tuple("FrameRef").field(frame.kind()).finish(),
            Err(_) => f.write_str("FrameRef(<borrowed>)"),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("kind", self.kind())
            .field("locals", &self.locals)
            .field("specials", &self.specials)
            .field("functions", &self.functions.len())
            .field("modules", &self.modules.len())
            .field("uses", &self.uses.len())
            .finish_non_exhaustive()
    }
}
