//! Stack headroom guard for deep recursion.
//!
//! User-defined modules and functions can call each other without bound.
//! Instead of letting such a chain exhaust the native stack, the evaluator
//! asks [`StackGuard::check`] before every invocation and turns a `true`
//! answer into a recoverable recursion diagnostic.
//!
//! # Platform Support
//!
//! - **Native targets**: Uses `stacker::remaining_stack` to measure headroom.
//! - **WASM targets**: No stack introspection; only the depth limit applies.
//!
//! # Configuration
//!
//! - **Margin**: 256KB by default. If less than this remains, the guard trips.
//! - **Depth limit**: optional hard cap on invocation depth. When the platform
//!   cannot report stack usage the cap defaults to [`FALLBACK_MAX_DEPTH`].

use tracing::debug;

/// Minimum stack space to keep available (256KB).
///
/// Leaves room for diagnostic construction and unwinding after a trip.
pub const DEFAULT_MARGIN: usize = 256 * 1024;

/// Depth cap used when stack usage cannot be measured.
pub const FALLBACK_MAX_DEPTH: usize = 1000;

/// Recursion guard bound to the thread that performs evaluation.
#[derive(Clone, Debug)]
pub struct StackGuard {
    /// Remaining stack observed at `init`, if measurable.
    baseline: Option<usize>,
    margin: usize,
    max_depth: Option<usize>,
}

impl StackGuard {
    /// Capture the current stack headroom.
    ///
    /// Call this once, near start-up, on the thread that will evaluate.
    pub fn init(margin: usize) -> Self {
        let baseline = remaining_stack();
        debug!(?baseline, margin, "stack guard initialized");
        StackGuard {
            baseline,
            margin,
            max_depth: None,
        }
    }

    /// Add a hard cap on invocation depth in addition to the stack check.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns `true` when the caller must not recurse further.
    ///
    /// `depth` is the number of user invocations currently active.
    #[inline]
    pub fn check(&self, depth: usize) -> bool {
        if let Some(max) = self.max_depth {
            if depth >= max {
                return true;
            }
        }
        match remaining_stack() {
            Some(remaining) => remaining < self.margin,
            None => self.max_depth.is_none() && depth >= FALLBACK_MAX_DEPTH,
        }
    }

    /// Bytes of stack consumed since `init`, if measurable.
    pub fn used(&self) -> Option<usize> {
        let baseline = self.baseline?;
        let remaining = remaining_stack()?;
        Some(baseline.saturating_sub(remaining))
    }

    /// Configured safety margin in bytes.
    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Configured depth cap, if any.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}

impl Default for StackGuard {
    fn default() -> Self {
        Self::init(DEFAULT_MARGIN)
    }
}

#[inline]
#[cfg(not(target_arch = "wasm32"))]
fn remaining_stack() -> Option<usize> {
    stacker::remaining_stack()
}

/// WASM version - the stack cannot be inspected.
#[inline]
#[cfg(target_arch = "wasm32")]
fn remaining_stack() -> Option<usize> {
    None
}
