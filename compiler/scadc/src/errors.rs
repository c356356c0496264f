use scad_eval::EvalError;
use scad_units::UnitError;
use thiserror::Error;

/// Why the driver produced no tree.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The root file could not be compiled and nothing is cached for it.
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// Strict mode aborted evaluation.
    #[error(transparent)]
    Eval(#[from] EvalError),
}
