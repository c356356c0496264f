//! Source locations.
//!
//! The parser is external, so locations are plain line/column pairs rather
//! than byte spans into a source buffer this crate never sees.

use std::fmt;

/// A 1-based line/column position in a source file.
///
/// `Location::NONE` marks synthesized nodes that have no source text.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Location for generated code.
    pub const NONE: Location = Location { line: 0, column: 0 };

    /// Create a new location.
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }

    /// Check whether this is the synthesized location.
    #[inline]
    pub const fn is_none(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "<generated>")
        } else {
            write!(f, "line {}", self.line)
        }
    }
}

#[cfg(test)]
mod tests;
