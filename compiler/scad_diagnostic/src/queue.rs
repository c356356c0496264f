//! Diagnostic queue.
//!
//! Collects diagnostics in the order they were reported. Evaluation is
//! depth-first and deterministic, so report order is meaningful and the
//! queue never re-sorts.
//!
//! Every report is kept by default, so a loop that trips the same warning
//! on every iteration reports it once per iteration. Collapsing identical
//! consecutive diagnostics is opt-in through [`QueueConfig::deduplicate`].

use crate::{Diagnostic, Severity};

/// Configuration for diagnostic collection.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Maximum diagnostics to keep (0 = unlimited).
    pub limit: usize,
    /// Collapse a diagnostic equal to the one just before it.
    pub deduplicate: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            limit: 0,
            deduplicate: false,
        }
    }
}

/// Ordered collection of diagnostics with per-severity counts.
#[derive(Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    config: QueueConfig,
}

impl DiagnosticQueue {
    /// Create a new diagnostic queue with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a diagnostic queue with custom configuration.
    pub fn with_config(config: QueueConfig) -> Self {
        DiagnosticQueue {
            config,
            ..Self::default()
        }
    }

    /// Add a diagnostic to the queue.
    ///
    /// Returns `true` if the diagnostic was added, `false` if it was filtered.
    pub fn push(&mut self, diag: Diagnostic) -> bool {
        if self.limit_reached() {
            return false;
        }
        if self.config.deduplicate && self.diagnostics.last() == Some(&diag) {
            return false;
        }
        match diag.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diag);
        true
    }

    /// Add every diagnostic from an iterator, in order.
    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.push(diag);
        }
    }

    /// Check if the configured limit has been reached.
    pub fn limit_reached(&self) -> bool {
        self.config.limit > 0 && self.diagnostics.len() >= self.config.limit
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Get diagnostics without clearing the queue.
    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Return all diagnostics in report order and reset the queue.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        self.warning_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}
