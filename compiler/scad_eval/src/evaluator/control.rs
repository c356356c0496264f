//! Control modules: `group`, `if`, `for`, `intersection_for`, `let`, `echo`,
//! `assert` and `children`.
//!
//! Each body runs in a fresh block frame whose parent is the caller's frame.

use scad_diagnostic::{Diagnostic, ErrorCode};
use scad_ir::{InstantiationRequest, Location, Scope};

use super::Evaluator;
use crate::builtins::ControlModule;
use crate::frame::{FrameKind, FrameRef};
use crate::value::{MAX_CHILDREN_ELEMENTS, MAX_FOR_ELEMENTS};
use crate::{EvalError, Node, Value};

impl Evaluator<'_> {
    pub(super) fn instantiate_control(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
        control: ControlModule,
    ) -> Result<Option<Node>, EvalError> {
        match control {
            ControlModule::Group => {
                let children = self.eval_block(frame, &request.body)?;
                Ok(Some(Node::group("group").with_children(children)))
            }
            ControlModule::If => self.control_if(frame, request),
            ControlModule::For => self.control_for(frame, request, false),
            ControlModule::IntersectionFor => self.control_for(frame, request, true),
            ControlModule::Let => self.control_let(frame, request),
            ControlModule::Echo => self.control_echo(frame, request),
            ControlModule::Assert => self.control_assert(frame, request),
            ControlModule::Children => self.control_children(frame, request),
        }
    }

    /// Evaluate `scope` in a new block frame under `parent`.
    fn eval_block(&mut self, parent: &FrameRef, scope: &Scope) -> Result<Vec<Node>, EvalError> {
        let block = self.new_frame(parent, FrameKind::Block);
        self.in_frame(&block, |ev| ev.eval_scope(&block, scope))
    }

    fn control_if(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
    ) -> Result<Option<Node>, EvalError> {
        let condition = match request.arguments.first() {
            Some(argument) => self.eval_expr(frame, &argument.value)?,
            None => Value::Undefined,
        };
        let branch = if condition.is_truthy() {
            Some(&*request.body)
        } else {
            request.alternate.as_ref()
        };
        let Some(branch) = branch else {
            return Ok(None);
        };
        let children = self.eval_block(frame, branch)?;
        Ok(Some(Node::group("if").with_children(children)))
    }

    fn control_for(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
        intersection: bool,
    ) -> Result<Option<Node>, EvalError> {
        let mut iterations = Vec::new();
        if !request.arguments.is_empty() {
            self.for_each(frame, request, 0, &mut iterations)?;
        }
        let node = if intersection {
            Node::builtin("intersection_for").with_children(
                iterations
                    .into_iter()
                    .map(|children| Node::group("group").with_children(children))
                    .collect(),
            )
        } else {
            Node::group("for").with_children(iterations.into_iter().flatten().collect())
        };
        Ok(Some(node))
    }

    /// Bind loop variable `index` and recurse into the next one; the body
    /// runs once all variables are bound.
    fn for_each(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
        index: usize,
        out: &mut Vec<Vec<Node>>,
    ) -> Result<(), EvalError> {
        let Some(argument) = request.arguments.get(index) else {
            out.push(self.eval_scope(frame, &request.body)?);
            return Ok(());
        };
        let value = self.eval_expr(frame, &argument.value)?;
        for item in self.iteration_values(frame, value, argument.value.location)? {
            let iteration = self.new_frame(frame, FrameKind::Block);
            if let Some(name) = &argument.name {
                iteration.borrow_mut().set_variable(name, item);
            }
            self.in_frame(&iteration, |ev| ev.for_each(&iteration, request, index + 1, out))?;
        }
        Ok(())
    }

    /// The values a loop variable takes.
    ///
    /// Vectors iterate their elements, ranges their steps, strings their
    /// characters. `undef` never iterates; any other value iterates once.
    fn iteration_values(
        &mut self,
        frame: &FrameRef,
        value: Value,
        location: Location,
    ) -> Result<Vec<Value>, EvalError> {
        match value {
            Value::Undefined => Ok(Vec::new()),
            Value::Vector(items) => Ok(items),
            Value::String(text) => Ok(text.chars().map(|c| Value::String(c.to_string())).collect()),
            Value::Range(range) => {
                let count = range.num_values();
                if count >= MAX_FOR_ELEMENTS {
                    self.report(
                        frame,
                        Diagnostic::warning(ErrorCode::E6009)
                            .with_message(format!(
                                "Bad range parameter in for statement: too many elements ({count})"
                            ))
                            .at(location),
                    )?;
                    return Ok(Vec::new());
                }
                Ok(range.iter().map(Value::Number).collect())
            }
            other => Ok(vec![other]),
        }
    }

    fn control_let(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
    ) -> Result<Option<Node>, EvalError> {
        let block = self.new_frame(frame, FrameKind::Block);
        let children = self.in_frame(&block, |ev| -> Result<_, EvalError> {
            for argument in &request.arguments {
                // Each binding sees the ones before it.
                let value = ev.eval_expr(&block, &argument.value)?;
                if let Some(name) = &argument.name {
                    block.borrow_mut().set_variable(name, value);
                }
            }
            ev.eval_scope(&block, &request.body)
        })?;
        Ok(Some(Node::group("let").with_children(children)))
    }

    fn control_echo(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
    ) -> Result<Option<Node>, EvalError> {
        let arguments = self.eval_arguments(frame, &request.arguments)?;
        let message = arguments
            .iter()
            .map(|(name, value)| match name {
                Some(name) => format!("{name} = {value}"),
                None => value.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        self.config.print_handler.println(&format!("ECHO: {message}"));
        self.body_node(frame, request, "echo")
    }

    fn control_assert(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
    ) -> Result<Option<Node>, EvalError> {
        let arguments = self.eval_arguments(frame, &request.arguments)?;
        let mut positional = arguments.iter().filter(|(name, _)| name.is_none()).map(|(_, v)| v);
        let named = |key: &str| {
            arguments
                .iter()
                .find(|(name, _)| name.as_deref() == Some(key))
                .map(|(_, value)| value)
        };
        let condition = named("condition").or_else(|| positional.next());
        let message = named("message").or_else(|| positional.next());

        if !condition.is_some_and(Value::is_truthy) {
            let text = match message {
                Some(message) if !message.is_undefined() => {
                    format!("Assertion failed: {}", message.to_display_string())
                }
                _ => "Assertion failed".to_string(),
            };
            self.report(
                frame,
                Diagnostic::warning(ErrorCode::E6007)
                    .with_message(text)
                    .at(request.location),
            )?;
            return Ok(None);
        }
        self.body_node(frame, request, "assert")
    }

    /// Group of the request body's children, or nothing for an empty body.
    fn body_node(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
        name: &str,
    ) -> Result<Option<Node>, EvalError> {
        let children = self.eval_block(frame, &request.body)?;
        if request.body.children.is_empty() {
            return Ok(None);
        }
        Ok(Some(Node::group(name).with_children(children)))
    }

    fn control_children(
        &mut self,
        frame: &FrameRef,
        request: &InstantiationRequest,
    ) -> Result<Option<Node>, EvalError> {
        let Some(captured) = frame.nearest_children() else {
            return Ok(None);
        };
        let count = captured.body.children.len();
        let selection = match request.arguments.first() {
            None => (0..count).collect(),
            Some(argument) => {
                let value = self.eval_expr(frame, &argument.value)?;
                let Some(selection) = self.select_children(frame, &value, count, request.location)? else {
                    return Ok(None);
                };
                selection
            }
        };

        let block = self.new_frame(&captured.caller, FrameKind::Block);
        let children = self.in_frame(&block, |ev| -> Result<_, EvalError> {
            ev.bind_scope(&block, &captured.body)?;
            let mut nodes = Vec::with_capacity(selection.len());
            for index in selection {
                if let Some(node) = ev.instantiate_request(&block, &captured.body.children[index])? {
                    nodes.push(node);
                }
            }
            Ok(nodes)
        })?;
        Ok(Some(Node::group("children").with_children(children)))
    }

    /// Indices picked by a `children(...)` argument, in the order given.
    ///
    /// `None` when the argument rules out producing a node at all.
    fn select_children(
        &mut self,
        frame: &FrameRef,
        value: &Value,
        count: usize,
        location: Location,
    ) -> Result<Option<Vec<usize>>, EvalError> {
        let candidates = match value {
            Value::Undefined => return Ok(Some((0..count).collect())),
            Value::Number(_) => vec![value.clone()],
            Value::Vector(items) => items.clone(),
            Value::Range(range) => {
                let elements = range.num_values();
                if elements >= MAX_CHILDREN_ELEMENTS {
                    self.report(
                        frame,
                        Diagnostic::warning(ErrorCode::E6009)
                            .with_message(format!(
                                "Bad range parameter for children: too many elements ({elements})"
                            ))
                            .at(location),
                    )?;
                    return Ok(None);
                }
                range.iter().map(Value::Number).collect()
            }
            other => {
                self.report(
                    frame,
                    Diagnostic::warning(ErrorCode::E6009)
                        .with_message(format!(
                            "Bad parameter type ({other}) for children, only accept: empty, number, vector, range"
                        ))
                        .at(location),
                )?;
                return Ok(None);
            }
        };

        let mut selection = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let Some(number) = candidate.as_number() else {
                self.report(
                    frame,
                    Diagnostic::warning(ErrorCode::E6009)
                        .with_message(format!(
                            "Bad parameter type ({candidate}) for children, only accept: empty, number, vector, range"
                        ))
                        .at(location),
                )?;
                continue;
            };
            let index = number.floor();
            if index < 0.0 || index >= count as f64 {
                self.report(
                    frame,
                    Diagnostic::warning(ErrorCode::E6008)
                        .with_message(format!(
                            "Children index ({candidate}) out of bounds ({count} children)"
                        ))
                        .at(location),
                )?;
                continue;
            }
            selection.push(index as usize);
        }
        Ok(Some(selection))
    }
}
