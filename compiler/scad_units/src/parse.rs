//! Contract with the external parser.

use std::path::Path;

use scad_ir::{Location, Scope};
use thiserror::Error;

/// Turns source text into a scope plus its file-level directives.
pub trait SourceParser {
    fn parse(&self, text: &str, path: &Path) -> Result<ParsedSource, ParseError>;
}

/// Parser output for one file, before includes are spliced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedSource {
    pub scope: Scope,
    /// `use <...>` spellings in source order.
    pub uses: Vec<String>,
    /// `include <...>` directives in source order.
    pub includes: Vec<IncludeDirective>,
}

/// An `include <path>` directive and where its text belongs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Spelling as written.
    pub path: String,
    /// Number of assignments that precede the directive.
    pub assignment_at: usize,
    /// Number of child requests that precede the directive.
    pub child_at: usize,
    pub location: Location,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub location: Location,
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        ParseError {
            message: message.into(),
            location,
        }
    }
}
