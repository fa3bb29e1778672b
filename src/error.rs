use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the layout engine.
///
/// Degenerate arithmetic (zero-length normalization, negative discriminant in
/// the contact-time quadratic) is a normal outcome inside the simulation and
/// never surfaces here; these variants cover parameter validation and the
/// bounded-retry guards only.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// The convergence loop hit its iteration cap before the system came to rest.
    #[error("simulation did not converge within {iterations} iterations")]
    NonConvergent { iterations: u64 },

    /// Every simulation attempt produced a layout the validator rejected.
    #[error("no valid layout found after {attempts} attempts")]
    RetriesExhausted { attempts: usize },
}
