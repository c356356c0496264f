//! Text emitter.
//!
//! Renders diagnostics in the classic one-line console form:
//!
//! ```text
//! WARNING: Ignoring unknown module 'cub' in file /models/a.scad, line 3
//! ```
//!
//! Notes follow on indented lines.

use std::io::{self, Write};

use crate::{Diagnostic, Severity};

/// Trait for emitting diagnostics to some output.
pub trait DiagnosticEmitter {
    /// Emit a single diagnostic.
    fn emit(&mut self, diagnostic: &Diagnostic);

    /// Emit multiple diagnostics.
    fn emit_all(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            self.emit(diag);
        }
    }

    /// Flush any buffered output.
    fn flush(&mut self);

    /// Emit a summary of errors/warnings.
    fn emit_summary(&mut self, error_count: usize, warning_count: usize);
}

/// Render one diagnostic, including notes, without a trailing newline.
pub fn render(diagnostic: &Diagnostic) -> String {
    let mut out = format!("{}: {}", diagnostic.severity.label(), diagnostic.message);
    match (&diagnostic.file, diagnostic.location.is_none()) {
        (Some(file), true) => out.push_str(&format!(" in file {}", file.display())),
        (Some(file), false) => out.push_str(&format!(
            " in file {}, line {}",
            file.display(),
            diagnostic.location.line
        )),
        (None, false) => out.push_str(&format!(", line {}", diagnostic.location.line)),
        (None, true) => {}
    }
    for note in &diagnostic.notes {
        out.push_str("\n    ");
        out.push_str(note);
    }
    out
}

/// Writes rendered diagnostics to any `io::Write`.
pub struct TextEmitter<W: Write> {
    writer: W,
}

impl<W: Write> TextEmitter<W> {
    pub fn new(writer: W) -> Self {
        TextEmitter { writer }
    }

    /// Consume the emitter and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl TextEmitter<io::Stderr> {
    /// Emitter writing to standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> DiagnosticEmitter for TextEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        // Errors writing diagnostics have nowhere to go.
        let _ = writeln!(self.writer, "{}", render(diagnostic));
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count == 0 && warning_count == 0 {
            return;
        }
        let _ = writeln!(
            self.writer,
            "{}: {error_count} error{}, {warning_count} warning{}",
            if error_count > 0 {
                Severity::Error.label()
            } else {
                Severity::Warning.label()
            },
            plural_s(error_count),
            plural_s(warning_count),
        );
    }
}

/// Returns "s" for plural counts, "" for singular.
#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests;
