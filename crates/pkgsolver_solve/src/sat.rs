//! C5: finds a satisfying assignment for a [`Problem`] and picks the one
//! that is best under the strict lexicographic criteria of spec §4.4.
//!
//! The search only ever considers groups reachable from a required clause
//! (directly, or transitively through a `depends` clause of some candidate
//! already under consideration) — every other group defaults to "not
//! selected", which is always a feasible choice for a group nothing
//! requires. This keeps the search space proportional to the part of the
//! catalog the request actually touches rather than the whole catalog.

use std::collections::{HashSet, VecDeque};

use crate::clause::{Problem, RecordId, RequiredKind};
use crate::error::UnsatisfiableError;

/// Inputs to the optimization criteria that are not catalog facts but
/// depend on what the caller asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions<'a> {
    /// Whether criterion 3 (channel priority) is enforced.
    pub channel_priority: bool,
    /// Feature tokens the user explicitly requested, for criterion 1.
    pub requested_features: &'a HashSet<String>,
}

/// A satisfying, optimal assignment: one candidate per decided group.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    /// The selected candidates, in no particular order — the orchestrator
    /// imposes the reverse-topological link/unlink order separately.
    pub selected: Vec<RecordId>,
}

/// The search gives up exploring fresh branches after this many
/// assignment attempts, returning the best solution found among those
/// already discovered. Exists so a pathological catalog cannot hang the
/// caller; ordinary requests settle long before this is reached.
const MAX_SEARCH_NODES: usize = 200_000;
/// A second cap on top of the node budget: once this many feasible
/// solutions have been collected there is no value exploring further, the
/// lexicographic comparison below has plenty to choose from.
const MAX_SOLUTIONS: usize = 4_096;

#[derive(Debug, Clone, Eq, PartialEq, PartialOrd, Ord)]
struct Score {
    orphaned_track_features: usize,
    frozen_removals: usize,
    worse_channel_priority: usize,
    requested_version_rank_sum: usize,
    neg_build_number_sum: i64,
    total_selected: usize,
    neg_timestamp_sum: i64,
    tie_break: Vec<(String, String)>,
}

/// Finds the optimal satisfying assignment, or reports which required
/// specs could not be jointly satisfied.
pub fn solve(problem: &Problem<'_>, options: &SearchOptions<'_>) -> Result<Solution, UnsatisfiableError> {
    for clause in &problem.required {
        if clause.satisfied_by.is_empty() {
            return Err(UnsatisfiableError {
                specs: vec![clause.spec_text.clone()],
                dropped_history: Vec::new(),
            });
        }
    }

    let active = active_groups(problem);
    let mut assignment: Vec<Option<RecordId>> = vec![None; problem.groups.len()];
    let mut solutions: Vec<Vec<Option<RecordId>>> = Vec::new();
    let mut nodes = 0usize;
    search(problem, &active, 0, &mut assignment, &mut solutions, &mut nodes);

    let best = solutions
        .into_iter()
        .map(|assignment| {
            let score = score_assignment(problem, &assignment, options);
            (score, assignment)
        })
        .min_by(|a, b| a.0.cmp(&b.0));

    match best {
        Some((_, assignment)) => Ok(Solution {
            selected: assignment.into_iter().flatten().collect(),
        }),
        None => Err(UnsatisfiableError {
            specs: problem.required.iter().map(|c| c.spec_text.clone()).collect(),
            dropped_history: Vec::new(),
        }),
    }
}

/// Every group reachable from a required clause, directly or transitively
/// through a `depends` clause of a candidate in a group already reached.
fn active_groups(problem: &Problem<'_>) -> Vec<usize> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    for clause in &problem.required {
        for &id in &clause.satisfied_by {
            let group = problem.group_of[id];
            if visited.insert(group) {
                queue.push_back(group);
            }
        }
    }

    while let Some(group) = queue.pop_front() {
        for &id in &problem.groups[group].candidates {
            for dep in &problem.depends[id] {
                for &target in &dep.satisfied_by {
                    let target_group = problem.group_of[target];
                    if visited.insert(target_group) {
                        queue.push_back(target_group);
                    }
                }
            }
        }
    }

    let mut groups: Vec<usize> = visited.into_iter().collect();
    groups.sort_unstable();
    groups
}

fn search(
    problem: &Problem<'_>,
    active: &[usize],
    pos: usize,
    assignment: &mut Vec<Option<RecordId>>,
    solutions: &mut Vec<Vec<Option<RecordId>>>,
    nodes: &mut usize,
) {
    if solutions.len() >= MAX_SOLUTIONS || *nodes >= MAX_SEARCH_NODES {
        return;
    }
    *nodes += 1;

    if pos == active.len() {
        if is_feasible(problem, assignment) {
            solutions.push(assignment.clone());
        }
        return;
    }

    let group = active[pos];
    for &candidate in &problem.groups[group].candidates {
        assignment[group] = Some(candidate);
        if !conflicts_with_decided(problem, assignment, group) {
            search(problem, active, pos + 1, assignment, solutions, nodes);
        }
        if solutions.len() >= MAX_SOLUTIONS || *nodes >= MAX_SEARCH_NODES {
            assignment[group] = None;
            return;
        }
    }
    assignment[group] = None;
    search(problem, active, pos + 1, assignment, solutions, nodes);
    assignment[group] = None;
}

/// A cheap, partial feasibility check run right after a group is tentatively
/// decided: does the candidate just chosen conflict, via `constrains`, with
/// anything already decided (in either direction)? Full `depends`/
/// track-feature feasibility is only checked once the whole assignment is
/// complete, in [`is_feasible`].
fn conflicts_with_decided(problem: &Problem<'_>, assignment: &[Option<RecordId>], just_decided: usize) -> bool {
    let Some(id) = assignment[just_decided] else {
        return false;
    };
    for &other in assignment.iter().flatten() {
        if other == id {
            continue;
        }
        if problem.constrains[id].iter().any(|c| c.forbidden.contains(&other)) {
            return true;
        }
        if problem.constrains[other].iter().any(|c| c.forbidden.contains(&id)) {
            return true;
        }
    }
    false
}

fn is_feasible(problem: &Problem<'_>, assignment: &[Option<RecordId>]) -> bool {
    let selected: HashSet<RecordId> = assignment.iter().flatten().copied().collect();

    for clause in &problem.required {
        if !clause.satisfied_by.iter().any(|id| selected.contains(id)) {
            return false;
        }
    }

    for &id in &selected {
        for dep in &problem.depends[id] {
            if !dep.satisfied_by.iter().any(|d| selected.contains(d)) {
                return false;
            }
        }
        for constrain in &problem.constrains[id] {
            if constrain.forbidden.iter().any(|f| selected.contains(f)) {
                return false;
            }
        }
    }

    let active_features: HashSet<&str> = selected
        .iter()
        .flat_map(|&id| problem.candidates[id].track_features.iter().map(String::as_str))
        .collect();
    for feature in active_features {
        let Some(groups) = problem.groups_with_feature.get(feature) else {
            continue;
        };
        for &group in groups {
            if let Some(id) = assignment[group] {
                if !problem.candidates[id].features.iter().any(|f| f == feature) {
                    return false;
                }
            }
        }
    }

    true
}

fn score_assignment(problem: &Problem<'_>, assignment: &[Option<RecordId>], options: &SearchOptions<'_>) -> Score {
    let selected: Vec<RecordId> = assignment.iter().flatten().copied().collect();
    let selected_set: HashSet<RecordId> = selected.iter().copied().collect();

    let orphaned_track_features = selected
        .iter()
        .filter(|&&id| {
            let record = problem.candidates[id];
            !record.track_features.is_empty()
                && !record
                    .track_features
                    .iter()
                    .any(|f| options.requested_features.contains(f))
        })
        .count();

    let frozen_removals = problem
        .installed
        .iter()
        .filter(|id| !selected_set.contains(id))
        .filter(|id| {
            problem
                .required
                .iter()
                .any(|c| c.kind == RequiredKind::History && c.satisfied_by.contains(id))
        })
        .count();

    let worse_channel_priority = if options.channel_priority {
        problem
            .groups
            .iter()
            .enumerate()
            .filter_map(|(group_idx, group)| assignment[group_idx].map(|id| (group, id)))
            .filter(|(group, id)| {
                let rank_of = |candidate: RecordId| {
                    problem
                        .channel_rank
                        .get(&problem.candidates[candidate].channel)
                        .copied()
                        .unwrap_or(i64::MAX)
                };
                let best = group.candidates.iter().map(|&c| rank_of(c)).min().unwrap_or(i64::MAX);
                rank_of(*id) > best
            })
            .count()
    } else {
        0
    };

    // Covers every required clause, not only `UserRequested` ones: a bare
    // history or pin spec with several satisfying candidates still has no
    // other criterion pushing it toward the newest match, so without this
    // the choice among them would be an accident of build number/timestamp.
    let requested_version_rank_sum: usize = problem
        .required
        .iter()
        .map(|c| {
            c.satisfied_by
                .iter()
                .filter(|id| selected_set.contains(id))
                .map(|&id| version_rank(problem, id))
                .sum::<usize>()
        })
        .sum();

    let build_number_sum: i64 = selected.iter().map(|&id| problem.candidates[id].build_number as i64).sum();
    let timestamp_sum: i64 = selected
        .iter()
        .filter_map(|&id| problem.candidates[id].timestamp)
        .map(|ts| ts.timestamp())
        .sum();

    let mut tie_break: Vec<(String, String)> = selected
        .iter()
        .map(|&id| {
            let record = problem.candidates[id];
            (record.name.as_normalized().to_string(), record.build_string.clone())
        })
        .collect();
    tie_break.sort();

    Score {
        orphaned_track_features,
        frozen_removals,
        worse_channel_priority,
        requested_version_rank_sum,
        neg_build_number_sum: -build_number_sum,
        total_selected: selected.len(),
        neg_timestamp_sum: -timestamp_sum,
        tie_break,
    }
}

/// The position of `id` within its group's candidate list, which is
/// already sorted best-version-first by the index — position `0` is the
/// highest version.
fn version_rank(problem: &Problem<'_>, id: RecordId) -> usize {
    let group = &problem.groups[problem.group_of[id]];
    group.candidates.iter().position(|&c| c == id).unwrap_or(group.candidates.len())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use pkgsolver_types::{Namespace, PackageName, PackageRecord, Version};

    use super::*;
    use crate::clause::build_problem;
    use crate::index::PackageIndex;

    fn record(name: &str, version: &str, depends: &[&str]) -> PackageRecord {
        PackageRecord {
            name: PackageName::new_unchecked(name),
            version: Version::parse(version).unwrap(),
            build_string: "0".to_string(),
            build_number: 0,
            channel: "main".to_string(),
            subdir: "linux-64".to_string(),
            namespace: Namespace::Global,
            depends: depends.iter().map(|s| s.to_string()).collect(),
            constrains: Vec::new(),
            features: Vec::new(),
            track_features: Vec::new(),
            timestamp: Some(Utc::now()),
        }
    }

    #[test]
    fn picks_highest_version_satisfying_the_request() {
        let index = PackageIndex::new(vec![record("numpy", "1.7.0", &[]), record("numpy", "1.8.0", &[])]);
        let problem = build_problem(
            &index,
            &[("numpy".to_string(), RequiredKind::UserRequested)],
            &[],
            &HashMap::new(),
        )
        .unwrap();
        let options = SearchOptions::default();
        let solution = solve(&problem, &options).unwrap();
        assert_eq!(solution.selected.len(), 1);
        assert_eq!(problem.candidates[solution.selected[0]].version.as_str(), "1.8.0");
    }

    #[test]
    fn pulls_in_transitive_dependency() {
        let index = PackageIndex::new(vec![
            record("numpy", "1.7.0", &["python>=3"]),
            record("python", "2.7.0", &[]),
            record("python", "3.9.0", &[]),
        ]);
        let problem = build_problem(
            &index,
            &[("numpy".to_string(), RequiredKind::UserRequested)],
            &[],
            &HashMap::new(),
        )
        .unwrap();
        let options = SearchOptions::default();
        let solution = solve(&problem, &options).unwrap();
        let names: Vec<&str> = solution
            .selected
            .iter()
            .map(|&id| problem.candidates[id].name.as_normalized())
            .collect();
        assert!(names.contains(&"numpy"));
        assert!(names.contains(&"python"));
        let python_id = solution
            .selected
            .iter()
            .copied()
            .find(|&id| problem.candidates[id].name.as_normalized() == "python")
            .unwrap();
        assert_eq!(problem.candidates[python_id].version.as_str(), "3.9.0");
    }

    #[test]
    fn unsatisfiable_dependency_is_reported() {
        let index = PackageIndex::new(vec![record("numpy", "1.7.0", &["missing-thing"])]);
        let problem = build_problem(
            &index,
            &[("numpy".to_string(), RequiredKind::UserRequested)],
            &[],
            &HashMap::new(),
        )
        .unwrap();
        let options = SearchOptions::default();
        assert!(solve(&problem, &options).is_err());
    }

    #[test]
    fn name_absent_entirely_is_reported() {
        let index = PackageIndex::new(Vec::new());
        let problem = build_problem(
            &index,
            &[("numpy".to_string(), RequiredKind::UserRequested)],
            &[],
            &HashMap::new(),
        )
        .unwrap();
        let options = SearchOptions::default();
        let err = solve(&problem, &options).unwrap_err();
        assert_eq!(err.specs, vec!["numpy".to_string()]);
    }
}
