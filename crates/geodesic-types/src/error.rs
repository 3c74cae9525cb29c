// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all geodesic kernel failures.
///
/// Numeric degeneracy (near-singular pivots) and shooting-method
/// convergence shortfall are recovered inside the engine and never
/// surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeodesicError {
    /// Invalid engine configuration (bad parameter or JSON).
    #[error("config error: {0}")]
    Config(String),

    /// `strict` mode was requested but the shooting backend is compiled
    /// out or disabled for this engine.
    #[error("strict geometry backend not available")]
    StrictUnavailable,

    /// Invalid input (unknown mode label, malformed point).
    #[error("validation error: {0}")]
    Validation(String),

    /// A backend produced a non-finite length.
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type GeodesicResult<T> = Result<T, GeodesicError>;
