//! The logical history of requests made against an environment.
//!
//! This is the in-memory model only: nothing here reads or writes an
//! on-disk history file. A revision is whatever the caller chooses to
//! record after a successful solve; this module just gives the orchestrator
//! a stable, ordered place to look for prior requests to relax.

use chrono::{DateTime, Utc};

/// A structured record of what a user asked for in a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRequest {
    /// A human-readable description of the command that produced this
    /// revision, e.g. `"install numpy"`.
    pub cmd: Option<String>,
    /// Specs added or updated by this request, in their textual form.
    pub update_specs: Vec<String>,
    /// Specs removed by this request, in their textual form.
    pub remove_specs: Vec<String>,
    /// Specs whose version constraint was stripped by a later
    /// `UPDATE_ALL`/`UPDATE_DEPS` request (the name is kept, the bound is
    /// dropped, so the name still participates in future solves without
    /// pinning it to the version it happened to resolve to at the time).
    pub neutered_specs: Vec<String>,
}

/// A single revision in an environment's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRevision {
    /// When this revision was recorded.
    pub timestamp: DateTime<Utc>,
    /// The request that produced this revision.
    pub request: UserRequest,
}

/// The ordered sequence of requests made against an environment, oldest
/// first.
///
/// [`History::relax_oldest`] is what the solve retry loop calls on an
/// unsatisfiable set of composed specs: it drops the oldest revision's
/// contribution to the composed spec set before retrying, on the theory
/// that the most recently requested constraints are the ones the caller
/// cares about keeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    revisions: Vec<HistoryRevision>,
}

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a revision. Revisions must be pushed in non-decreasing
    /// timestamp order; this is the caller's responsibility.
    pub fn push(&mut self, revision: HistoryRevision) {
        self.revisions.push(revision);
    }

    /// All revisions, oldest first.
    pub fn revisions(&self) -> &[HistoryRevision] {
        &self.revisions
    }

    /// The most recently recorded revision, if any.
    pub fn latest(&self) -> Option<&HistoryRevision> {
        self.revisions.last()
    }

    /// Whether any revision has been recorded.
    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Composes the effective set of requested specs by replaying every
    /// revision's `update_specs` and `remove_specs` in order: a later
    /// revision's spec for a given package name supersedes an earlier one,
    /// and a `remove_specs` entry drops the name entirely until it
    /// reappears in a later `update_specs`.
    ///
    /// The composed set is what gets handed to the solver as the pinned
    /// "must still satisfy everything the user ever asked for" constraint
    /// set, before any history relaxation.
    pub fn composed_specs(&self) -> Vec<String> {
        let mut by_name: Vec<(String, String)> = Vec::new();

        for revision in &self.revisions {
            for spec in &revision.request.remove_specs {
                let key = spec_key(spec);
                by_name.retain(|(name, _)| name != &key);
            }
            for spec in &revision.request.update_specs {
                let key = spec_key(spec);
                by_name.retain(|(name, _)| name != &key);
                by_name.push((key, spec.clone()));
            }
        }

        by_name.into_iter().map(|(_, spec)| spec).collect()
    }

    /// Drops the oldest revision that still contributes at least one spec
    /// to [`composed_specs`], returning `true` if a revision was dropped.
    /// Returns `false` once the history is exhausted, at which point the
    /// solve has no more history to relax and should report the remaining
    /// specs as unsatisfiable.
    pub fn relax_oldest(&mut self) -> bool {
        if self.revisions.is_empty() {
            return false;
        }
        self.revisions.remove(0);
        true
    }
}

/// The package name a textual spec constrains, used as the dedup key when
/// composing history into an effective spec set. This is a light heuristic
/// (the part before the first operator/whitespace/bracket character) rather
/// than a full [`crate::MatchSpec`] parse, since a spec that fails to parse
/// should still be supersede-able by name.
fn spec_key(spec: &str) -> String {
    spec.trim()
        .split(|c: char| c.is_whitespace() || matches!(c, '=' | '<' | '>' | '!' | '[' | '*'))
        .next()
        .unwrap_or(spec)
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revision(cmd: &str, update: &[&str], remove: &[&str]) -> HistoryRevision {
        HistoryRevision {
            timestamp: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            request: UserRequest {
                cmd: Some(cmd.to_string()),
                update_specs: update.iter().map(|s| s.to_string()).collect(),
                remove_specs: remove.iter().map(|s| s.to_string()).collect(),
                neutered_specs: Vec::new(),
            },
        }
    }

    #[test]
    fn composes_specs_across_revisions() {
        let mut history = History::new();
        history.push(revision("install numpy", &["numpy"], &[]));
        history.push(revision("install numpy==1.8", &["numpy==1.8"], &[]));
        let composed = history.composed_specs();
        assert_eq!(composed, vec!["numpy==1.8".to_string()]);
    }

    #[test]
    fn remove_drops_name_until_reinstalled() {
        let mut history = History::new();
        history.push(revision("install numpy", &["numpy"], &[]));
        history.push(revision("remove numpy", &[], &["numpy"]));
        assert!(history.composed_specs().is_empty());

        history.push(revision("install numpy again", &["numpy>=2"], &[]));
        assert_eq!(history.composed_specs(), vec!["numpy>=2".to_string()]);
    }

    #[test]
    fn relax_oldest_drains_in_order() {
        let mut history = History::new();
        history.push(revision("a", &["numpy"], &[]));
        history.push(revision("b", &["scipy"], &[]));
        assert!(history.relax_oldest());
        assert_eq!(history.composed_specs(), vec!["scipy".to_string()]);
        assert!(history.relax_oldest());
        assert!(!history.relax_oldest());
    }
}
