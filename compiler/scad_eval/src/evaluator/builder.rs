//! Builder for `Evaluator` instances.

use rustc_hash::FxHashMap;
use scad_diagnostic::DiagnosticQueue;
use scad_stack::StackGuard;
use scad_units::{NoUnits, UnitSource};

use super::Evaluator;
use crate::diagnostics::{CallStack, EvalCounters};
use crate::frame::{Frame, FrameRef};
use crate::{EvalConfig, SharedPrintHandler};

/// Builder for creating `Evaluator` instances with various configurations.
pub struct EvaluatorBuilder<'u> {
    config: EvalConfig,
    units: &'u dyn UnitSource,
    guard: Option<StackGuard>,
}

impl EvaluatorBuilder<'static> {
    pub fn new(config: EvalConfig) -> Self {
        Self {
            config,
            units: &NoUnits,
            guard: None,
        }
    }
}

impl<'u> EvaluatorBuilder<'u> {
    /// Read `use`d libraries from `units`.
    #[must_use]
    pub fn units<'v>(self, units: &'v dyn UnitSource) -> EvaluatorBuilder<'v> {
        EvaluatorBuilder {
            config: self.config,
            units,
            guard: self.guard,
        }
    }

    /// Set the print handler for `echo` output.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.config.print_handler = handler;
        self
    }

    /// Use an already initialized guard instead of initializing one at
    /// `build` time. The guard measures stack use relative to the point it
    /// was initialized at.
    #[must_use]
    pub fn stack_guard(mut self, guard: StackGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn build(self) -> Evaluator<'u> {
        let guard = self.guard.unwrap_or_else(|| {
            StackGuard::init(self.config.stack_margin).with_max_depth(self.config.max_recursion_depth)
        });
        let diagnostics = DiagnosticQueue::with_config(self.config.queue.clone());
        Evaluator {
            config: self.config,
            root: FrameRef::new(Frame::root()),
            guard,
            units: self.units,
            diagnostics,
            dynamic: Vec::new(),
            call_stack: CallStack::new(),
            counters: EvalCounters::default(),
            unit_frames: FxHashMap::default(),
        }
    }
}
