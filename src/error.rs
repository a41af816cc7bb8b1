use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation core.
///
/// Only construction can fail recoverably. A broken invariant inside a
/// running engine (out-of-range grid access, double occupancy) is a
/// programming defect and panics instead of surfacing here.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
}
