//! Call tracking for the evaluator.
//!
//! This module provides:
//! - `CallStack`: the chain of active user module and function invocations
//! - `CallFrame`: per-call metadata (callee, call-site location)
//! - `EvalCounters`: statistics for a single evaluation session
//!
//! The call stack feeds the recursion guard (its depth), decides which
//! invocation absorbs a recursion trip, and supplies the call chain shown
//! in the recursion diagnostic.

use scad_ir::Location;

use crate::errors::Callee;

/// A single frame in the live call stack.
#[derive(Clone, Debug)]
pub struct CallFrame {
    pub callee: Callee,
    /// Where the call was made, not where the callee was defined.
    pub location: Location,
}

/// Active user invocations, outermost first.
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: CallFrame) {
        self.frames.push(frame);
    }

    /// Pop the most recent call frame.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if the stack is empty. In release mode,
    /// this is a no-op on an empty stack.
    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    /// Current call depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The most recent call frame, if any.
    #[inline]
    pub fn current_frame(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// True if `callee` has an active invocation anywhere on the stack.
    pub fn contains(&self, callee: &Callee) -> bool {
        self.frames.iter().any(|frame| &frame.callee == callee)
    }

    /// Callee names, outermost first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|frame| frame.callee.name.as_str())
    }

    /// Callee names, outermost first, with consecutive repeats collapsed to
    /// `name (xN)`.
    pub fn collapsed_chain(&self) -> Vec<String> {
        collapse(self.names())
    }
}

/// Run-length collapse of a name sequence.
pub fn collapse<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut runs: Vec<(&str, usize)> = Vec::new();
    for name in names {
        match runs.last_mut() {
            Some((last, count)) if *last == name => *count += 1,
            _ => runs.push((name, 1)),
        }
    }
    runs.into_iter()
        .map(|(name, count)| {
            if count == 1 {
                name.to_string()
            } else {
                format!("{name} (x{count})")
            }
        })
        .collect()
}

/// Statistics for one evaluation session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalCounters {
    pub expressions_evaluated: u64,
    pub module_instantiations: u64,
    pub function_calls: u64,
    pub frames_created: u64,
    /// Deepest user call chain observed.
    pub max_call_depth: usize,
}

impl EvalCounters {
    #[inline]
    pub fn count_expression(&mut self) {
        self.expressions_evaluated = self.expressions_evaluated.wrapping_add(1);
    }

    #[inline]
    pub fn count_instantiation(&mut self) {
        self.module_instantiations = self.module_instantiations.wrapping_add(1);
    }

    #[inline]
    pub fn count_function_call(&mut self) {
        self.function_calls = self.function_calls.wrapping_add(1);
    }

    #[inline]
    pub fn count_frame(&mut self) {
        self.frames_created = self.frames_created.wrapping_add(1);
    }

    #[inline]
    pub fn observe_depth(&mut self, depth: usize) {
        self.max_call_depth = self.max_call_depth.max(depth);
    }

    /// Merge counters from another session into this one.
    pub fn merge(&mut self, other: &EvalCounters) {
        self.expressions_evaluated = self
            .expressions_evaluated
            .wrapping_add(other.expressions_evaluated);
        self.module_instantiations = self
            .module_instantiations
            .wrapping_add(other.module_instantiations);
        self.function_calls = self.function_calls.wrapping_add(other.function_calls);
        self.frames_created = self.frames_created.wrapping_add(other.frames_created);
        self.max_call_depth = self.max_call_depth.max(other.max_call_depth);
    }
}
