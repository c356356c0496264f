//! Evaluator configuration.

use scad_diagnostic::QueueConfig;
use scad_stack::DEFAULT_MARGIN;

use crate::{stdout_handler, SharedPrintHandler};

/// Settings for one evaluation session.
#[derive(Clone, Debug)]
pub struct EvalConfig {
    /// Strict mode: the first escalatable warning aborts the top-level call.
    pub hard_warnings: bool,
    /// Hard cap on nested user invocations, on top of the stack check.
    pub max_recursion_depth: Option<usize>,
    /// Stack bytes the recursion guard keeps free.
    pub stack_margin: usize,
    /// Diagnostic collection settings.
    pub queue: QueueConfig,
    /// Destination for `echo` output.
    pub print_handler: SharedPrintHandler,
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_hard_warnings(mut self, hard_warnings: bool) -> Self {
        self.hard_warnings = hard_warnings;
        self
    }

    #[must_use]
    pub fn with_max_recursion_depth(mut self, depth: Option<usize>) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    #[must_use]
    pub fn with_stack_margin(mut self, margin: usize) -> Self {
        self.stack_margin = margin;
        self
    }

    #[must_use]
    pub fn with_queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    #[must_use]
    pub fn with_print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = handler;
        self
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            hard_warnings: false,
            max_recursion_depth: None,
            stack_margin: DEFAULT_MARGIN,
            queue: QueueConfig::default(),
            print_handler: stdout_handler(),
        }
    }
}
