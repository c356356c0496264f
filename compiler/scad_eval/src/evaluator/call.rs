//! Argument binding and invocation of modules and functions.

use std::sync::Arc;

use scad_diagnostic::{Diagnostic, ErrorCode};
use scad_ir::{Argument, Expr, ExprKind, FunctionDef, InstantiationRequest, Location, ModuleDef, Parameter};
use smallvec::SmallVec;
use tracing::debug;

use super::Evaluator;
use crate::builtins::PrimitiveSpec;
use crate::diagnostics::{collapse, CallFrame};
use crate::frame::{is_special, Children, FrameKind, FrameRef, FunctionBinding};
use crate::{Callee, EvalError, Node, RecursionTrip, Value};

/// Evaluated call-site arguments: optional name, value.
pub(super) type Arguments = SmallVec<[(Option<String>, Value); 4]>;

/// A parameter as seen by the binder.
#[derive(Copy, Clone)]
struct Slot<'p> {
    name: &'p str,
    default: Option<&'p Expr>,
}

fn slots(parameters: &[Parameter]) -> SmallVec<[Slot<'_>; 4]> {
    parameters
        .iter()
        .map(|p| Slot {
            name: &p.name,
            default: p.default.as_ref(),
        })
        .collect()
}

/// Result of binding arguments to parameters.
#[derive(Default)]
struct Bound {
    /// Every parameter in declaration order.
    params: Vec<(String, Value)>,
    /// Named `$` arguments that matched no parameter.
    specials: Vec<(String, Value)>,
}

impl Bound {
    fn apply(&self, frame: &FrameRef) {
        let mut f = frame.borrow_mut();
        for (name, value) in &self.params {
            f.set_variable(name, value.clone());
        }
        drop(f);
        self.apply_specials(frame);
    }

    fn apply_specials(&self, frame: &FrameRef) {
        let mut f = frame.borrow_mut();
        for (name, value) in &self.specials {
            f.set_variable(name, value.clone());
        }
    }
}

impl Evaluator<'_> {
    /// Evaluate call-site arguments left to right in the caller's frame.
    pub(super) fn eval_arguments(
        &mut self,
        frame: &FrameRef,
        arguments: &[Argument],
    ) -> Result<Arguments, EvalError> {
        let mut values = Arguments::with_capacity(arguments.len());
        for argument in arguments {
            let value = self.eval_expr(frame, &argument.value)?;
            values.push((argument.name.clone(), value));
        }
        Ok(values)
    }

    /// Match arguments to parameters.
    ///
    /// Positional arguments fill parameters in order. Named arguments then
    /// override by name. Parameters still unset take their default,
    /// evaluated in `defining`, or `undef`.
    fn bind(
        &mut self,
        caller: &FrameRef,
        target: &str,
        slots: &[Slot<'_>],
        defining: Option<&FrameRef>,
        arguments: Arguments,
        location: Location,
    ) -> Result<Bound, EvalError> {
        let mut values: SmallVec<[Option<Value>; 4]> = SmallVec::from_elem(None, slots.len());
        let mut named = Arguments::new();
        let mut position = 0;
        let mut surplus = false;
        for (name, value) in arguments {
            match name {
                Some(name) => named.push((Some(name), value)),
                None if position < slots.len() => {
                    values[position] = Some(value);
                    position += 1;
                }
                None => surplus = true,
            }
        }
        if surplus {
            self.report(
                caller,
                Diagnostic::warning(ErrorCode::E6005)
                    .with_message(format!("Too many unnamed arguments supplied to '{target}'"))
                    .at(location),
            )?;
        }

        let mut bound = Bound::default();
        for (name, value) in named {
            let Some(name) = name else { continue };
            if let Some(index) = slots.iter().position(|slot| slot.name == name) {
                values[index] = Some(value);
            } else if is_special(&name) {
                bound.specials.push((name, value));
            } else {
                self.report(
                    caller,
                    Diagnostic::warning(ErrorCode::E6006)
                        .with_message(format!(
                            "Variable '{name}' not specified as parameter of '{target}'"
                        ))
                        .at(location),
                )?;
            }
        }

        for (slot, value) in slots.iter().zip(values) {
            let value = match (value, slot.default, defining) {
                (Some(value), _, _) => value,
                (None, Some(default), Some(defining)) => self.eval_expr(defining, default)?,
                (None, _, _) => Value::Undefined,
            };
            bound.params.push((slot.name.to_string(), value));
        }
        Ok(bound)
    }

    /// Ask the guard whether `callee` may be invoked one level deeper.
    fn check_guard(&mut self, callee: &Callee) -> Result<(), EvalError> {
        if !self.guard.check(self.call_stack.depth()) {
            return Ok(());
        }
        let target = if self.call_stack.contains(callee) {
            callee.clone()
        } else {
            match self.call_stack.current_frame() {
                Some(frame) => frame.callee.clone(),
                None => callee.clone(),
            }
        };
        let chain = collapse(
            self.call_stack
                .names()
                .chain(std::iter::once(callee.name.as_str())),
        );
        debug!(%target, depth = self.call_stack.depth(), "recursion guard tripped");
        Err(EvalError::Recursion(RecursionTrip { target, chain }))
    }

    /// Turn a recursion trip aimed at `callee` into a diagnostic once the
    /// outermost invocation of `callee` has unwound.
    fn absorb<T: Default>(
        &mut self,
        callee: &Callee,
        caller: &FrameRef,
        location: Location,
        result: Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        match result {
            Err(EvalError::Recursion(trip))
                if trip.target == *callee && !self.call_stack.contains(callee) =>
            {
                self.report(
                    caller,
                    Diagnostic::warning(ErrorCode::E6004)
                        .with_message(format!("Recursion detected calling {callee}"))
                        .with_note(format!("call chain: {}", trip.chain.join(" -> ")))
                        .at(location),
                )?;
                Ok(T::default())
            }
            other => other,
        }
    }

    /// Instantiate a user-defined module.
    pub(super) fn call_user_module(
        &mut self,
        caller: &FrameRef,
        request: &InstantiationRequest,
        def: &Arc<ModuleDef>,
        defining: &FrameRef,
    ) -> Result<Option<Node>, EvalError> {
        let callee = Callee::module(&def.name);
        let result = self.invoke_module(caller, request, def, defining, &callee);
        self.absorb(&callee, caller, request.location, result)
    }

    fn invoke_module(
        &mut self,
        caller: &FrameRef,
        request: &InstantiationRequest,
        def: &Arc<ModuleDef>,
        defining: &FrameRef,
        callee: &Callee,
    ) -> Result<Option<Node>, EvalError> {
        let arguments = self.eval_arguments(caller, &request.arguments)?;
        let bound = self.bind(
            caller,
            &def.name,
            &slots(&def.parameters),
            Some(defining),
            arguments,
            request.location,
        )?;
        self.check_guard(callee)?;

        let frame = self.new_frame(defining, FrameKind::Module(def.name.clone()));
        bound.apply(&frame);
        {
            let mut f = frame.borrow_mut();
            f.set_variable("$children", Value::Number(request.body.children.len() as f64));
            f.set_children(Children {
                body: Arc::clone(&request.body),
                caller: caller.clone(),
            });
        }

        self.call_stack.push(CallFrame {
            callee: callee.clone(),
            location: request.location,
        });
        self.counters.observe_depth(self.call_stack.depth());
        let children = self.in_frame(&frame, |ev| ev.eval_scope(&frame, &def.body));
        self.call_stack.pop();

        Ok(Some(
            Node::group(def.name.clone())
                .with_attributes(bound.params)
                .with_children(children?),
        ))
    }

    /// Call a function by name from `frame`.
    pub(super) fn call_function(
        &mut self,
        frame: &FrameRef,
        name: &str,
        arguments: &[Argument],
        location: Location,
    ) -> Result<Value, EvalError> {
        self.counters.count_function_call();
        let Some(found) = frame.lookup_function(name) else {
            self.report(
                frame,
                Diagnostic::warning(ErrorCode::E6002)
                    .with_message(format!("Ignoring unknown function '{name}'"))
                    .at(location),
            )?;
            return Ok(Value::Undefined);
        };
        let (binding, defining) = self.resolve(found)?;
        match binding {
            FunctionBinding::Builtin(builtin) => {
                // `is_undef(x)` must not warn when `x` is unknown.
                if let [Argument { value: Expr { kind: ExprKind::Identifier(id), location }, .. }] =
                    arguments
                {
                    if builtin.name == "is_undef" {
                        let value = self.lookup_variable(frame, id, *location, true)?;
                        return Ok(Value::Bool(value.is_undefined()));
                    }
                }
                let values: SmallVec<[Value; 4]> = self
                    .eval_arguments(frame, arguments)?
                    .into_iter()
                    .map(|(_, value)| value)
                    .collect();
                Ok((builtin.call)(&values))
            }
            FunctionBinding::User(def) => {
                let callee = Callee::function(&def.name);
                let result = self.invoke_function(frame, &def, &defining, arguments, location, &callee);
                self.absorb(&callee, frame, location, result)
            }
        }
    }

    fn invoke_function(
        &mut self,
        caller: &FrameRef,
        def: &Arc<FunctionDef>,
        defining: &FrameRef,
        arguments: &[Argument],
        location: Location,
        callee: &Callee,
    ) -> Result<Value, EvalError> {
        let arguments = self.eval_arguments(caller, arguments)?;
        let bound = self.bind(
            caller,
            &def.name,
            &slots(&def.parameters),
            Some(defining),
            arguments,
            location,
        )?;
        self.check_guard(callee)?;

        let frame = self.new_frame(defining, FrameKind::Function(def.name.clone()));
        bound.apply(&frame);

        self.call_stack.push(CallFrame {
            callee: callee.clone(),
            location,
        });
        self.counters.observe_depth(self.call_stack.depth());
        let value = self.in_frame(&frame, |ev| ev.eval_expr(&frame, &def.body));
        self.call_stack.pop();
        value
    }

    /// Instantiate a geometry or transform builtin.
    ///
    /// Supplied arguments become node attributes. Parameters are not bound
    /// for the body; only `$` arguments reach it.
    pub(super) fn instantiate_primitive(
        &mut self,
        caller: &FrameRef,
        request: &InstantiationRequest,
        spec: &'static PrimitiveSpec,
    ) -> Result<Option<Node>, EvalError> {
        let arguments = self.eval_arguments(caller, &request.arguments)?;
        let slots: SmallVec<[Slot<'static>; 4]> = spec
            .parameters
            .iter()
            .map(|&name| Slot { name, default: None })
            .collect();
        let bound = self.bind(caller, spec.name, &slots, None, arguments, request.location)?;

        let frame = self.new_frame(caller, FrameKind::Block);
        bound.apply_specials(&frame);

        let (resolution, children) = self.in_frame(&frame, |ev| -> Result<_, EvalError> {
            let mut resolution = Vec::new();
            if spec.resolution {
                for name in ["$fn", "$fa", "$fs"] {
                    let value = ev.lookup_special(name).unwrap_or_default();
                    resolution.push((name.to_string(), value));
                }
            }
            let children = if spec.takes_children {
                ev.eval_scope(&frame, &request.body)?
            } else {
                Vec::new()
            };
            Ok((resolution, children))
        })?;

        let mut attributes: Vec<(String, Value)> = bound
            .params
            .into_iter()
            .filter(|(_, value)| !value.is_undefined())
            .collect();
        attributes.extend(resolution);
        Ok(Some(
            Node::builtin(spec.name)
                .with_attributes(attributes)
                .with_children(children),
        ))
    }
}
