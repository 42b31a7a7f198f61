//! The solver proper: an in-memory package index, the clause model that
//! translates specs into a boolean problem, a branch-and-bound search over
//! that problem, and the orchestrator that drives a whole invocation
//! end-to-end (history composition, relaxation retries, the resulting
//! unlink/link diff).

#![deny(missing_docs)]
#![deny(unsafe_code)]

mod clause;
mod diff;
mod error;
mod index;
mod orchestrator;
mod sat;

pub use clause::{build_problem, ConstrainClause, DependencyClause, Group, Problem, RecordId, RequiredClause, RequiredKind};
pub use diff::{compute as compute_diff, Diff};
pub use error::{InvalidSpec, PackagesNotFoundError, SolveError, UnsatisfiableError};
pub use index::PackageIndex;
pub use orchestrator::{DepsModifier, Orchestrator, Outcome, PrefixState, SolveRequest, SolverConfig, UpdateModifier};
pub use sat::{solve, SearchOptions, Solution};
