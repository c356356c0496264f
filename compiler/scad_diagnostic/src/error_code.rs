//! Error codes for all evaluator diagnostics.
//!
//! Each code is a unique identifier (e.g. `E6001`) whose first digit names
//! the phase that reported it.

use std::fmt;

/// Error codes for all evaluator diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E1xxx: Unit loading (files, includes, parsing)
/// - E6xxx: Instantiation and expression evaluation
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Unit Errors (E1xxx)
    /// Referenced file does not exist
    E1001,
    /// Referenced file exists but could not be read
    E1002,
    /// Parser rejected a file
    E1003,
    /// File includes itself, directly or indirectly
    E1004,

    // Evaluation Errors (E6xxx)
    /// Unknown variable
    E6001,
    /// Unknown function
    E6002,
    /// Unknown module
    E6003,
    /// Recursion limit reached
    E6004,
    /// More positional arguments than parameters
    E6005,
    /// Named argument matches no parameter
    E6006,
    /// `assert` condition was false
    E6007,
    /// `children()` index out of range
    E6008,
    /// Argument has the wrong type for this call
    E6009,
}

impl ErrorCode {
    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E6001 => "E6001",
            ErrorCode::E6002 => "E6002",
            ErrorCode::E6003 => "E6003",
            ErrorCode::E6004 => "E6004",
            ErrorCode::E6005 => "E6005",
            ErrorCode::E6006 => "E6006",
            ErrorCode::E6007 => "E6007",
            ErrorCode::E6008 => "E6008",
            ErrorCode::E6009 => "E6009",
        }
    }

    /// One-line description used by `--explain` style lookups.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "file not found",
            ErrorCode::E1002 => "file could not be read",
            ErrorCode::E1003 => "file could not be parsed",
            ErrorCode::E1004 => "include cycle",
            ErrorCode::E6001 => "unknown variable",
            ErrorCode::E6002 => "unknown function",
            ErrorCode::E6003 => "unknown module",
            ErrorCode::E6004 => "recursion detected",
            ErrorCode::E6005 => "too many arguments",
            ErrorCode::E6006 => "unknown parameter",
            ErrorCode::E6007 => "assertion failed",
            ErrorCode::E6008 => "children index out of range",
            ErrorCode::E6009 => "invalid argument",
        }
    }

    /// Check if this is a unit-loading error (E1xxx).
    pub fn is_unit_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E1001 | ErrorCode::E1002 | ErrorCode::E1003 | ErrorCode::E1004
        )
    }

    /// Check if this is an evaluation error (E6xxx).
    pub fn is_eval_error(&self) -> bool {
        !self.is_unit_error()
    }

    /// Warnings with this code abort evaluation when hard warnings are on.
    pub fn is_hard_warning(&self) -> bool {
        matches!(
            self,
            ErrorCode::E1001
                | ErrorCode::E6001
                | ErrorCode::E6002
                | ErrorCode::E6003
                | ErrorCode::E6005
                | ErrorCode::E6006
                | ErrorCode::E6007
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E1001" => Ok(ErrorCode::E1001),
            "E1002" => Ok(ErrorCode::E1002),
            "E1003" => Ok(ErrorCode::E1003),
            "E1004" => Ok(ErrorCode::E1004),
            "E6001" => Ok(ErrorCode::E6001),
            "E6002" => Ok(ErrorCode::E6002),
            "E6003" => Ok(ErrorCode::E6003),
            "E6004" => Ok(ErrorCode::E6004),
            "E6005" => Ok(ErrorCode::E6005),
            "E6006" => Ok(ErrorCode::E6006),
            "E6007" => Ok(ErrorCode::E6007),
            "E6008" => Ok(ErrorCode::E6008),
            "E6009" => Ok(ErrorCode::E6009),
            _ => Err(()),
        }
    }
}
