//! Driver configuration.

use std::path::PathBuf;

use scad_eval::EvalConfig;
use scad_units::SearchPath;

/// Environment variable that turns on strict mode.
pub const HARD_WARNINGS_VAR: &str = "SCAD_HARD_WARNINGS";

/// Everything a [`Driver`](crate::Driver) needs besides its collaborators.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// The file being evaluated.
    pub root: PathBuf,
    /// Library directories searched after the referencing file's directory.
    pub search_path: SearchPath,
    pub eval: EvalConfig,
}

impl DriverConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DriverConfig {
            root: root.into(),
            search_path: SearchPath::default(),
            eval: EvalConfig::default(),
        }
    }

    /// Configuration from `SCAD_LIBRARY_PATH` and `SCAD_HARD_WARNINGS`.
    pub fn from_env(root: impl Into<PathBuf>) -> Self {
        let hard_warnings = std::env::var(HARD_WARNINGS_VAR).is_ok_and(|value| parse_flag(&value));
        DriverConfig {
            root: root.into(),
            search_path: SearchPath::from_env(),
            eval: EvalConfig::default().with_hard_warnings(hard_warnings),
        }
    }

    #[must_use]
    pub fn with_search_path(mut self, search_path: SearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    #[must_use]
    pub fn with_eval(mut self, eval: EvalConfig) -> Self {
        self.eval = eval;
        self
    }
}

/// Read a boolean environment flag. `1`, `true`, `yes` and `on` are set,
/// in any case; anything else is unset.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
