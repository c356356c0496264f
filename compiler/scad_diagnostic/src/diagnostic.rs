//! Core diagnostic types.
//!
//! Defines [`Diagnostic`] and [`Severity`], the building blocks every phase
//! uses to report problems.

use std::fmt;
use std::path::{Path, PathBuf};

use scad_ir::Location;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    /// Upper-case label used by the text emitter.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A user-visible problem.
///
/// Built with a fluent API:
///
/// ```text
/// Diagnostic::warning(ErrorCode::E6001)
///     .with_message("Ignoring unknown variable 'x'")
///     .with_file("/lib/a.scad")
///     .at(Location::new(3, 1))
/// ```
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    /// File the problem was found in, if known.
    pub file: Option<PathBuf>,
    /// Position inside `file`; `Location::NONE` when unknown.
    pub location: Location,
    /// Additional context lines, e.g. the call chain of a recursion.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            file: None,
            location: Location::NONE,
            notes: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(code: ErrorCode) -> Self {
        Self::new(code, Severity::Error)
    }

    /// Create a warning diagnostic.
    pub fn warning(code: ErrorCode) -> Self {
        Self::new(code, Severity::Warning)
    }

    /// Create an informational note.
    pub fn note(code: ErrorCode) -> Self {
        Self::new(code, Severity::Note)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach the file only when one is known.
    #[must_use]
    pub fn with_file_opt(mut self, file: Option<&Path>) -> Self {
        self.file = file.map(Path::to_path_buf);
        self
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// True for warnings that strict mode turns into an abort.
    pub fn is_hard_warning(&self) -> bool {
        self.is_warning() && self.code.is_hard_warning()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::render(self))
    }
}
