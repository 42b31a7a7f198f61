//! The concrete error types the solver can return.

use std::fmt::{self, Display, Formatter};

use pkgsolver_types::ParseMatchSpecError;
use thiserror::Error;

/// A spec string failed to parse.
#[derive(Debug, Clone, Error)]
#[error("invalid spec {text:?}: {source}")]
pub struct InvalidSpec {
    /// The offending spec text.
    pub text: String,
    /// Why it failed to parse.
    #[source]
    pub source: ParseMatchSpecError,
}

/// No record in the index could satisfy every required spec, even after
/// exhausting the history-relaxation retry loop.
#[derive(Debug, Clone, Error)]
pub struct UnsatisfiableError {
    /// The specs that remained unsatisfied in the final, most-relaxed
    /// attempt.
    pub specs: Vec<String>,
    /// History specs that were dropped by the relaxation loop before
    /// giving up.
    pub dropped_history: Vec<String>,
}

impl Display for UnsatisfiableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "could not satisfy: {}", self.specs.join(", "))?;
        if !self.dropped_history.is_empty() {
            write!(
                f,
                " (after dropping history specs: {})",
                self.dropped_history.join(", ")
            )?;
        }
        Ok(())
    }
}

/// A user-requested (or history) spec names a package with no record in
/// the index at all, in any namespace. No amount of history relaxation can
/// fix this, so it is reported separately from [`UnsatisfiableError`].
#[derive(Debug, Clone, Error)]
#[error("packages not found: {}", names.join(", "))]
pub struct PackagesNotFoundError {
    /// The names that have zero records in the index.
    pub names: Vec<String>,
}

/// The outermost error type returned by the orchestrator.
#[derive(Debug, Error)]
pub enum SolveError {
    /// A spec given to the orchestrator failed to parse.
    #[error(transparent)]
    InvalidSpec(#[from] InvalidSpec),
    /// The request set has no satisfying assignment.
    #[error(transparent)]
    Unsatisfiable(#[from] UnsatisfiableError),
    /// A requested name is entirely absent from the index.
    #[error(transparent)]
    PackagesNotFound(#[from] PackagesNotFoundError),
}
