//! Translates specs and an index into a boolean problem: one variable per
//! candidate record, plus the clauses spec.md §4.4 enumerates.

use std::collections::HashMap;

use itertools::Itertools;
use pkgsolver_types::{MatchSpec, Namespace, PackageRecord, RecordKey};

use crate::error::InvalidSpec;
use crate::index::PackageIndex;

/// Why a [`RequiredClause`] was added — the SAT engine's optimization
/// criteria (§4.4) treat user-requested, history, and pin specs
/// differently, so the clause carries its provenance rather than leaving
/// the engine to rediscover it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RequiredKind {
    /// From `specs_to_add` in the current invocation.
    UserRequested,
    /// From the composed history spec set.
    History,
    /// From `pinned_specs`.
    Pin,
}

/// A boolean variable: "the record at this id is linked".
pub type RecordId = usize;

/// One `(namespace, name)` bucket of mutually exclusive candidates — the
/// "at-most-one-per-name" clause (§4.4 item 1) is enforced by construction:
/// a solution picks at most one [`RecordId`] per group.
#[derive(Debug, Clone)]
pub struct Group {
    /// The namespace this group belongs to.
    pub namespace: Namespace,
    /// The bare package name this group belongs to.
    pub name: String,
    /// Candidates, in the index's deterministic preference order.
    pub candidates: Vec<RecordId>,
}

/// A dependency implication clause (§4.4 item 2): `x_r ⇒ ⋁ satisfied_by`.
#[derive(Debug, Clone)]
pub struct DependencyClause {
    /// The original `depends` spec text, kept for diagnostics.
    pub spec_text: String,
    /// Every candidate, in any group, that satisfies the spec.
    pub satisfied_by: Vec<RecordId>,
}

/// A constrains clause (§4.4 item 4): if the owning record and some
/// candidate of `target_name` are both selected, the candidate must match
/// the spec. Represented as the forbidden set directly, since that is what
/// the search needs: candidates of `target_name` that do NOT match.
#[derive(Debug, Clone)]
pub struct ConstrainClause {
    /// The original `constrains` spec text, kept for diagnostics.
    pub spec_text: String,
    /// The name the spec constrains.
    pub target_name: String,
    /// Candidates of `target_name` that violate the spec and therefore
    /// cannot be co-selected with the owning record.
    pub forbidden: Vec<RecordId>,
}

/// A required-spec clause (§4.4 item 3): at least one of these candidates
/// must be selected. Pins contribute the same clause shape (§4.4 item 6),
/// distinguished only by when the orchestrator decides to add them.
#[derive(Debug, Clone)]
pub struct RequiredClause {
    /// The spec text, for `UnsatisfiableError` diagnostics.
    pub spec_text: String,
    /// Why this clause exists, for the optimization criteria that treat
    /// requested/history/pin specs differently.
    pub kind: RequiredKind,
    /// Candidates that satisfy the spec.
    pub satisfied_by: Vec<RecordId>,
}

/// The boolean problem handed to the SAT engine (C5).
#[derive(Debug)]
pub struct Problem<'a> {
    /// Every candidate under consideration, indexed by [`RecordId`].
    pub candidates: Vec<&'a PackageRecord>,
    /// At-most-one-per-name groups.
    pub groups: Vec<Group>,
    /// `RecordId -> owning group index`, for quick lookup during search.
    pub group_of: Vec<usize>,
    /// Per-candidate dependency clauses, indexed by [`RecordId`].
    pub depends: Vec<Vec<DependencyClause>>,
    /// Per-candidate constrains clauses, indexed by [`RecordId`].
    pub constrains: Vec<Vec<ConstrainClause>>,
    /// Required-spec clauses (requested specs, history specs, pins).
    pub required: Vec<RequiredClause>,
    /// Groups that have at least one candidate supplying a given feature
    /// token, used by the track-features clause (§4.4 item 5).
    pub groups_with_feature: HashMap<String, Vec<usize>>,
    /// Candidates that match a currently installed record's exact key,
    /// used by optimization criterion 2 (freeze installed dependencies).
    pub installed: Vec<RecordId>,
    /// Priority rank per channel name, lower is better. Only consulted
    /// when channel priority is enabled (criterion 3).
    pub channel_rank: HashMap<String, i64>,
}

impl<'a> Problem<'a> {
    /// The namespace/name a candidate belongs to.
    pub fn namespace_name(&self, id: RecordId) -> (&Namespace, &str) {
        let group = &self.groups[self.group_of[id]];
        (&group.namespace, &group.name)
    }
}

/// Builds a [`Problem`] from every record currently in `index`, plus the
/// given required specs.
///
/// `required_specs` are parsed and turned into [`RequiredClause`]s; a spec
/// that fails to parse is reported immediately as [`InvalidSpec`] (§7 point
/// 1: input errors are raised without consulting the index).
pub fn build_problem<'a>(
    index: &'a PackageIndex,
    required_specs: &[(String, RequiredKind)],
    installed_keys: &[RecordKey],
    channel_rank: &HashMap<String, i64>,
) -> Result<Problem<'a>, InvalidSpec> {
    let mut candidates = Vec::new();
    let mut groups = Vec::new();
    let mut group_of = Vec::new();

    for (namespace, name) in index.names() {
        let group_idx = groups.len();
        let mut group_candidates = Vec::new();
        for record in index.records_by_name(namespace, name) {
            let id = candidates.len();
            candidates.push(record);
            group_of.push(group_idx);
            group_candidates.push(id);
        }
        groups.push(Group {
            namespace: namespace.clone(),
            name: name.to_string(),
            candidates: group_candidates,
        });
    }

    let mut groups_with_feature: HashMap<String, Vec<usize>> = HashMap::new();
    for (group_idx, group) in groups.iter().enumerate() {
        for &id in &group.candidates {
            for feature in &candidates[id].features {
                groups_with_feature.entry(feature.clone()).or_default().push(group_idx);
            }
        }
    }
    for providers in groups_with_feature.values_mut() {
        *providers = providers.iter().copied().sorted().dedup().collect();
    }

    let resolve = |spec: &MatchSpec| -> Vec<RecordId> {
        let mut matches: Vec<RecordId> = Vec::new();
        for group in &groups {
            if let Some(name) = spec.name() {
                if group.name != name.as_normalized() {
                    continue;
                }
            }
            if let Some(namespace) = &spec.namespace {
                if &group.namespace != namespace {
                    continue;
                }
            }
            for &id in &group.candidates {
                if spec.matches(candidates[id]) {
                    matches.push(id);
                }
            }
        }
        matches
    };

    let mut depends: Vec<Vec<DependencyClause>> = vec![Vec::new(); candidates.len()];
    let mut constrains: Vec<Vec<ConstrainClause>> = vec![Vec::new(); candidates.len()];

    for (id, record) in candidates.iter().enumerate() {
        for spec_text in &record.depends {
            let spec = MatchSpec::parse(spec_text).map_err(|source| InvalidSpec {
                text: spec_text.clone(),
                source,
            })?;
            depends[id].push(DependencyClause {
                spec_text: spec_text.clone(),
                satisfied_by: resolve(&spec),
            });
        }
        for spec_text in &record.constrains {
            let spec = MatchSpec::parse(spec_text).map_err(|source| InvalidSpec {
                text: spec_text.clone(),
                source,
            })?;
            let Some(target_name) = spec.name().map(|n| n.as_normalized().to_string()) else {
                continue;
            };
            let forbidden = groups
                .iter()
                .filter(|g| g.name == target_name)
                .flat_map(|g| g.candidates.iter().copied())
                .filter(|&candidate_id| !spec.matches(candidates[candidate_id]))
                .collect();
            constrains[id].push(ConstrainClause {
                spec_text: spec_text.clone(),
                target_name,
                forbidden,
            });
        }
    }

    let mut required = Vec::with_capacity(required_specs.len());
    for (spec_text, kind) in required_specs {
        let spec = MatchSpec::parse(spec_text).map_err(|source| InvalidSpec {
            text: spec_text.clone(),
            source,
        })?;
        required.push(RequiredClause {
            spec_text: spec_text.clone(),
            kind: *kind,
            satisfied_by: resolve(&spec),
        });
    }

    let installed = candidates
        .iter()
        .enumerate()
        .filter(|(_, record)| installed_keys.contains(&record.key()))
        .map(|(id, _)| id)
        .collect();

    Ok(Problem {
        candidates,
        groups,
        group_of,
        depends,
        constrains,
        required,
        groups_with_feature,
        installed,
        channel_rank: channel_rank.clone(),
    })
}
