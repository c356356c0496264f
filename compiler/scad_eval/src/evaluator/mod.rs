//! The evaluation session.
//!
//! An [`Evaluator`] turns instantiation requests into [`Node`] trees. It owns
//! everything that lives for one pass over a design:
//!
//! - the root frame with the builtin library
//! - the recursion guard and the call stack it is consulted with
//! - the dynamic stack through which special variables resolve
//! - the diagnostic queue and statistics
//!
//! Evaluation is single-threaded and depth-first. Children are instantiated
//! in declaration order, so the same inputs always produce the same tree and
//! the same diagnostics in the same order.
//!
//! # Recursion
//!
//! Before a user module or function is invoked, the guard is asked whether
//! another level fits. When it does not, the call fails with
//! [`EvalError::Recursion`], which unwinds to the outermost active invocation
//! of the offending callable. That invocation reports one diagnostic and
//! yields nothing; its siblings carry on.

mod builder;
mod call;
mod control;
mod expr;

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use scad_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use scad_ir::{InstantiationRequest, Location, Scope};
use scad_stack::StackGuard;
use scad_units::{CompiledUnit, UnitSource};
use tracing::{debug, trace, warn};

use crate::builtins::BuiltinModule;
use crate::diagnostics::{CallStack, EvalCounters};
use crate::frame::{is_special, Found, FrameKind, FrameRef, ModuleBinding};
use crate::{EvalConfig, EvalError, Node, Value};

pub use builder::EvaluatorBuilder;

/// One evaluation session.
///
/// `'u` is the lifetime of the unit source that `use`d libraries are read
/// from.
pub struct Evaluator<'u> {
    config: EvalConfig,
    root: FrameRef,
    guard: StackGuard,
    units: &'u dyn UnitSource,
    diagnostics: DiagnosticQueue,
    /// Frames being evaluated, outermost first.
    dynamic: Vec<FrameRef>,
    call_stack: CallStack,
    counters: EvalCounters,
    /// File frames of used units, built on first lookup.
    unit_frames: FxHashMap<PathBuf, (Arc<CompiledUnit>, FrameRef)>,
}

impl Evaluator<'static> {
    /// Start configuring an evaluator.
    pub fn builder(config: EvalConfig) -> EvaluatorBuilder<'static> {
        EvaluatorBuilder::new(config)
    }
}

impl<'u> Evaluator<'u> {
    /// The root frame. Top-level requests with no file context are
    /// instantiated against it.
    pub fn root_frame(&self) -> FrameRef {
        self.root.clone()
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn counters(&self) -> &EvalCounters {
        &self.counters
    }

    /// Diagnostics reported so far, in report order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.peek()
    }

    /// Take every diagnostic reported so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.flush()
    }

    /// Bytes of native stack used since the guard was initialized.
    pub fn stack_used(&self) -> Option<usize> {
        self.guard.used()
    }

    /// Instantiate one request against `frame`.
    ///
    /// Always returns a `Root` node; it is empty when the request produced
    /// nothing or was aborted by the recursion guard. Only strict mode makes
    /// this fail.
    #[tracing::instrument(level = "debug", skip_all, fields(module = %request.name))]
    pub fn instantiate(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
    ) -> Result<Node, EvalError> {
        let result = self.in_frame(frame, |ev| ev.instantiate_request(frame, request));
        let node = self.settle(result, request.location)?;
        Ok(Node::root().with_children(node.into_iter().collect()))
    }

    /// Instantiate a whole unit: its assignments, then its top-level
    /// children, in a file frame that sees the unit's used libraries.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %unit.path().display()))]
    pub fn instantiate_unit(&mut self, unit: &Arc<CompiledUnit>) -> Result<Node, EvalError> {
        let result = self.file_frame(unit).and_then(|frame| {
            self.in_frame(&frame, |ev| ev.instantiate_all(&frame, &unit.scope().children))
        });
        let children = self.settle(result, Location::NONE)?;
        Ok(Node::root().with_children(children))
    }

    /// The file frame for `unit`, with its definitions bound and its
    /// assignments evaluated.
    ///
    /// Built once per unit and session. Hosts can use the result as the
    /// `frame` argument of [`Evaluator::instantiate`].
    pub fn file_frame(&mut self, unit: &Arc<CompiledUnit>) -> Result<FrameRef, EvalError> {
        if let Some((cached, frame)) = self.unit_frames.get(unit.path()) {
            if Arc::ptr_eq(cached, unit) {
                return Ok(frame.clone());
            }
        }
        let root = self.root.clone();
        let frame = self.new_frame(&root, FrameKind::File(unit.path().to_path_buf()));
        frame
            .borrow_mut()
            .set_uses(self.units.used_units(unit.path()));
        // Registered before the assignments run so that units using each
        // other see the frame instead of building it again.
        self.unit_frames
            .insert(unit.path().to_path_buf(), (Arc::clone(unit), frame.clone()));
        debug!(path = %unit.path().display(), "file frame");
        self.in_frame(&frame, |ev| ev.bind_scope(&frame, unit.scope()))?;
        Ok(frame)
    }

    /// Look up a special variable through the dynamic stack.
    pub fn lookup_special(&self, name: &str) -> Option<Value> {
        for frame in self.dynamic.iter().rev() {
            if let Some(value) = frame.borrow().special(name) {
                return Some(value.clone());
            }
        }
        self.root.borrow().special(name).cloned()
    }

    /// Resolve a variable reference made from `frame`.
    ///
    /// Unknown names are `Undefined`, with a warning unless `silent`.
    pub(crate) fn lookup_variable(
        &mut self,
        frame: &FrameRef,
        name: &str,
        location: Location,
        silent: bool,
    ) -> Result<Value, EvalError> {
        let found = if is_special(name) {
            self.lookup_special(name)
        } else {
            frame.lookup_local(name)
        };
        match found {
            Some(value) => Ok(value),
            None => {
                if !silent {
                    self.report(
                        frame,
                        Diagnostic::warning(ErrorCode::E6001)
                            .with_message(format!("Ignoring unknown variable '{name}'"))
                            .at(location),
                    )?;
                }
                Ok(Value::Undefined)
            }
        }
    }

    /// Queue a diagnostic, attributing it to the file of `frame`.
    ///
    /// In strict mode an escalatable warning is also returned as an error.
    pub(crate) fn report(&mut self, frame: &FrameRef, diag: Diagnostic) -> Result<(), EvalError> {
        let diag = if diag.file.is_none() {
            let file = frame.file();
            diag.with_file_opt(file.as_deref())
        } else {
            diag
        };
        warn!(code = %diag.code, location = ?diag.location, "{}", diag.message);
        let escalate = self.config.hard_warnings && diag.is_hard_warning();
        if escalate {
            self.diagnostics.push(diag.clone());
            return Err(EvalError::HardWarning(diag));
        }
        self.diagnostics.push(diag);
        Ok(())
    }

    /// Run `f` with `frame` pushed on the dynamic stack.
    pub(crate) fn in_frame<R>(&mut self, frame: &FrameRef, f: impl FnOnce(&mut Self) -> R) -> R {
        self.dynamic.push(frame.clone());
        let result = f(self);
        self.dynamic.pop();
        result
    }

    pub(crate) fn new_frame(&mut self, parent: &FrameRef, kind: FrameKind) -> FrameRef {
        self.counters.count_frame();
        trace!(?kind, "new frame");
        parent.child(kind)
    }

    /// Bind the definitions of `scope` in `frame` and evaluate its
    /// assignments in order.
    pub(crate) fn bind_scope(&mut self, frame: &FrameRef, scope: &Scope) -> Result<(), EvalError> {
        frame.borrow_mut().define_scope(scope);
        for assignment in &scope.assignments {
            let value = match &assignment.expr {
                Some(expr) => self.eval_expr(frame, expr)?,
                None => Value::Undefined,
            };
            frame.borrow_mut().set_variable(&assignment.name, value);
        }
        Ok(())
    }

    /// Bind `scope` in `frame`, then instantiate its children in order.
    pub(crate) fn eval_scope(&mut self, frame: &FrameRef, scope: &Scope) -> Result<Vec<Node>, EvalError> {
        self.bind_scope(frame, scope)?;
        self.instantiate_all(frame, &scope.children)
    }

    fn instantiate_all(
        &mut self,
        frame: &FrameRef,
        requests: &[InstantiationRequest],
    ) -> Result<Vec<Node>, EvalError> {
        let mut nodes = Vec::with_capacity(requests.len());
        for request in requests {
            if let Some(node) = self.instantiate_request(frame, request)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    /// Instantiate one request: zero or one node.
    pub(crate) fn instantiate_request(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
    ) -> Result<Option<Node>, EvalError> {
        self.counters.count_instantiation();
        trace!(name = %request.name, "instantiate");
        let Some(found) = frame.lookup_module(&request.name) else {
            self.report(
                frame,
                Diagnostic::warning(ErrorCode::E6003)
                    .with_message(format!("Ignoring unknown module '{}'", request.name))
                    .at(request.location),
            )?;
            return Ok(None);
        };
        let (binding, defining) = self.resolve(found)?;
        let node = match binding {
            ModuleBinding::User(def) => self.call_user_module(frame, request, &def, &defining)?,
            ModuleBinding::Builtin(BuiltinModule::Control(control)) => {
                self.instantiate_control(frame, request, control)?
            }
            ModuleBinding::Builtin(BuiltinModule::Primitive(spec)) => {
                self.instantiate_primitive(frame, request, spec)?
            }
        };
        Ok(node.map(|node| node.with_tags(request.tags)))
    }

    /// Pair a lookup result with the frame its definition lives in.
    fn resolve<B>(&mut self, found: Found<B>) -> Result<(B, FrameRef), EvalError> {
        match found {
            Found::Frame(binding, frame) => Ok((binding, frame)),
            Found::Unit(binding, unit) => {
                let frame = self.file_frame(&unit)?;
                Ok((binding, frame))
            }
        }
    }

    /// Absorb a recursion trip that no invocation claimed.
    fn settle<T: Default>(
        &mut self,
        result: Result<T, EvalError>,
        location: Location,
    ) -> Result<T, EvalError> {
        match result {
            Err(EvalError::Recursion(trip)) => {
                let root = self.root.clone();
                self.report(
                    &root,
                    Diagnostic::warning(ErrorCode::E6004)
                        .with_message(trip.to_string())
                        .with_note(format!("call chain: {}", trip.chain.join(" -> ")))
                        .at(location),
                )?;
                Ok(T::default())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests;
