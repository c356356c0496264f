//! Errors for single-unit operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ParseError;

/// Why a unit could not be produced.
///
/// Only returned when there is no previously compiled unit to fall back on;
/// otherwise the cache keeps the stale unit and reports a diagnostic instead.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl UnitError {
    /// Path of the unit the error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            UnitError::NotFound { path }
            | UnitError::Read { path, .. }
            | UnitError::Parse { path, .. } => path,
        }
    }
}
