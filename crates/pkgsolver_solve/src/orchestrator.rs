//! C6: composes the effective target spec set, drives C4/C5, retries with
//! progressively relaxed history on failure, and turns the result into an
//! unlink/link diff.

use std::collections::{HashMap, HashSet};

use pkgsolver_types::{History, MatchSpec, Namespace, PackageRecord, RecordKey};
use tracing::debug;

use crate::clause::{build_problem, RequiredKind};
use crate::diff;
use crate::error::{InvalidSpec, PackagesNotFoundError, SolveError, UnsatisfiableError};
use crate::index::PackageIndex;
use crate::sat::{self, SearchOptions};

/// Governs how this solve relates to the environment's recorded history.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum UpdateModifier {
    /// No extra constraint beyond history.
    #[default]
    None,
    /// Pin every currently installed name not in `specs_to_add` to its
    /// exact installed version and build.
    FreezeInstalled,
    /// Solve once, then re-solve with the direct dependencies of the
    /// requested specs re-specified as bare names.
    UpdateDeps,
    /// Drop the version/build constraint from every history spec.
    UpdateAll,
    /// Re-specify requested names as bare names (constraint dropped, name
    /// kept), same as [`UpdateModifier::UpdateAll`] but scoped to the
    /// specs in this request rather than the whole history.
    UpdateSpecs,
    /// If every requested spec is already satisfied by the installed set,
    /// return it unchanged without solving.
    SpecsSatisfiedSkipSolve,
}

/// Governs whether dependencies of the requested specs are linked.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum DepsModifier {
    /// No change to the computed link set.
    #[default]
    None,
    /// Drop from `link` every record not matching a user-requested spec.
    NoDeps,
    /// Drop from `link` every record that matches a user-requested spec.
    OnlyDeps,
}

/// Context flags that hold for every solve this orchestrator runs.
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    /// Whether C4 criterion 3 (channel priority) is enforced.
    pub channel_priority: bool,
    /// Feature tokens that should be injected as synthetic requirements.
    pub track_features: Vec<String>,
    /// Whether an unpinned `conda` spec is injected for the root prefix.
    pub auto_update_conda: bool,
    /// Reserved for parity with the ambient configuration surface; this
    /// solver has no dev-channel-specific behavior of its own.
    pub dev: bool,
    /// Whether `pinned_specs` are skipped entirely.
    pub ignore_pinned: bool,
    /// Priority rank per channel name, lower is better.
    pub channel_rank: HashMap<String, i64>,
}

/// The installed set plus the history of requests that produced it.
#[derive(Debug, Clone, Default)]
pub struct PrefixState {
    /// Currently installed records.
    pub installed: Vec<PackageRecord>,
    /// The ordered history of requests made against this prefix.
    pub history: History,
}

impl PrefixState {
    fn installed_keys(&self) -> Vec<RecordKey> {
        self.installed.iter().map(PackageRecord::key).collect()
    }
}

/// One invocation's request-specific inputs.
#[derive(Debug, Clone, Default)]
pub struct SolveRequest {
    /// Specs to add or upgrade, in textual form.
    pub specs_to_add: Vec<String>,
    /// Names to drop from the target set entirely.
    pub specs_to_remove: Vec<String>,
    /// Specs the solver must not violate, unless `ignore_pinned`.
    pub pinned_specs: Vec<String>,
    /// Names that should be refreshed to their best available version
    /// regardless of any history pin.
    pub aggressive_update_names: Vec<String>,
    /// How this solve relates to the environment's recorded history.
    pub update_modifier: UpdateModifier,
    /// Whether dependencies of the requested specs get linked.
    pub deps_modifier: DepsModifier,
    /// Whether step 3 (prune unreachable records) runs after solving.
    pub prune: bool,
    /// Whether an unchanged final state still produces a full unlink/link
    /// pair, so a caller rebuilds every record regardless.
    pub force_reinstall: bool,
    /// Whether `auto_update_conda` applies to this invocation.
    pub is_root_prefix: bool,
}

/// The resolved environment plus the transaction needed to reach it.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Every record that should be linked once the transaction completes.
    pub final_state: Vec<PackageRecord>,
    /// Records to remove, in dependency-safe order.
    pub unlink: Vec<PackageRecord>,
    /// Records to add, in dependency-safe order.
    pub link: Vec<PackageRecord>,
}

/// Drives a single package index through the full solve algorithm.
pub struct Orchestrator<'a> {
    index: &'a PackageIndex,
    config: SolverConfig,
}

impl<'a> Orchestrator<'a> {
    /// Builds an orchestrator over a loaded index and fixed context flags.
    pub fn new(index: &'a PackageIndex, config: SolverConfig) -> Self {
        Self { index, config }
    }

    /// Runs the full algorithm and returns only the resulting environment.
    pub fn solve_final_state(
        &self,
        prefix: &PrefixState,
        request: &SolveRequest,
    ) -> Result<Vec<PackageRecord>, SolveError> {
        Ok(self.solve_for_diff(prefix, request)?.final_state)
    }

    /// Runs the full algorithm and returns the resulting environment along
    /// with the unlink/link diff against `prefix`.
    pub fn solve_for_diff(&self, prefix: &PrefixState, request: &SolveRequest) -> Result<Outcome, SolveError> {
        self.check_names_present(request)?;

        if request.update_modifier == UpdateModifier::SpecsSatisfiedSkipSolve
            && self.already_satisfied(prefix, request)
        {
            debug!("requested specs already satisfied by the installed set, skipping solve");
            let final_state = diff::topological_order(&prefix.installed, false);
            return Ok(self.finish(prefix, final_state, request));
        }

        let mut history = prefix.history.clone();
        let mut required = self.expand_namespaces(self.compose_required_specs(prefix, &history, request)?)?;
        let mut dropped_history = Vec::new();

        let mut final_state = loop {
            match self.solve_once(prefix, &required) {
                Ok(state) => break state,
                Err(SolveError::Unsatisfiable(e)) => {
                    if history.relax_oldest() {
                        debug!(dropped = ?e.specs, "history unsatisfiable, relaxing oldest revision");
                        dropped_history.extend(e.specs);
                        required = self.expand_namespaces(self.compose_required_specs(prefix, &history, request)?)?;
                        continue;
                    }
                    return Err(SolveError::Unsatisfiable(UnsatisfiableError {
                        specs: e.specs,
                        dropped_history,
                    }));
                }
                Err(other) => return Err(other),
            }
        };

        if request.update_modifier == UpdateModifier::UpdateDeps {
            let extra_names = self.direct_dependency_names_of_requested(&final_state, request);
            if !extra_names.is_empty() {
                let mut required2 = required.clone();
                for name in extra_names {
                    merge_by_name(&mut required2, [(name, RequiredKind::UserRequested)]);
                }
                if let Ok(state) = self.solve_once(prefix, &required2) {
                    final_state = state;
                }
            }
        }

        let final_state = self.apply_prune(final_state, request);
        let final_state = diff::topological_order(&final_state, false);
        Ok(self.finish(prefix, final_state, request))
    }

    fn solve_once(&self, prefix: &PrefixState, required: &[(String, RequiredKind)]) -> Result<Vec<PackageRecord>, SolveError> {
        let installed_keys = prefix.installed_keys();
        let problem = build_problem(self.index, required, &installed_keys, &self.config.channel_rank)?;
        let requested_features: HashSet<String> = self.config.track_features.iter().cloned().collect();
        let options = SearchOptions {
            channel_priority: self.config.channel_priority,
            requested_features: &requested_features,
        };
        let solution = sat::solve(&problem, &options)?;
        Ok(solution
            .selected
            .into_iter()
            .map(|id| problem.candidates[id].clone())
            .collect())
    }

    /// Step 1: builds the effective `(spec, provenance)` list history,
    /// removals, additions, aggressive updates, pins, track-features, and
    /// `auto_update_conda` all contribute to, per §4.6.
    fn compose_required_specs(
        &self,
        prefix: &PrefixState,
        history: &History,
        request: &SolveRequest,
    ) -> Result<Vec<(String, RequiredKind)>, SolveError> {
        let mut composed: Vec<(String, RequiredKind)> = history
            .composed_specs()
            .into_iter()
            .map(|s| (s, RequiredKind::History))
            .collect();

        composed.retain(|(text, _)| {
            !request
                .specs_to_remove
                .iter()
                .any(|removed| spec_name_key(removed) == spec_name_key(text))
        });

        if matches!(
            request.update_modifier,
            UpdateModifier::UpdateAll | UpdateModifier::UpdateSpecs
        ) {
            for (text, kind) in composed.iter_mut() {
                if *kind != RequiredKind::History {
                    continue;
                }
                if request.update_modifier == UpdateModifier::UpdateSpecs
                    && !request
                        .specs_to_add
                        .iter()
                        .any(|added| spec_name_key(added) == spec_name_key(text))
                {
                    continue;
                }
                if let Some(name) = MatchSpec::parse(text).ok().and_then(|s| s.name().cloned()) {
                    *text = name.as_normalized().to_string();
                }
            }
        }

        merge_by_name(
            &mut composed,
            request
                .specs_to_add
                .iter()
                .cloned()
                .map(|s| (s, RequiredKind::UserRequested)),
        );

        merge_by_name(
            &mut composed,
            request
                .aggressive_update_names
                .iter()
                .cloned()
                .map(|name| (name, RequiredKind::UserRequested)),
        );

        if !self.config.ignore_pinned {
            merge_by_name(
                &mut composed,
                request.pinned_specs.iter().cloned().map(|s| (s, RequiredKind::Pin)),
            );
        }

        for feature in &self.config.track_features {
            composed.push((format!("*[features={feature}]"), RequiredKind::UserRequested));
        }

        if self.config.auto_update_conda && request.is_root_prefix {
            merge_by_name(&mut composed, [("conda".to_string(), RequiredKind::UserRequested)]);
        }

        if request.update_modifier == UpdateModifier::FreezeInstalled {
            let add_names: HashSet<String> = request.specs_to_add.iter().map(|s| spec_name_key(s)).collect();
            for record in &prefix.installed {
                let name = record.name.as_normalized().to_string();
                if add_names.contains(&name) {
                    continue;
                }
                let frozen = format!("{name}=={}[build={}]", record.version, record.build_string);
                merge_by_name(&mut composed, [(frozen, RequiredKind::History)]);
            }
        }

        Ok(composed)
    }

    /// A bare-name spec that resolves to candidates in more than one
    /// namespace is split into one independent spec per namespace, the
    /// `global` variant required unconditionally and language-specific
    /// variants left to be pulled in transitively (§4.6 "Namespaces").
    fn expand_namespaces(
        &self,
        composed: Vec<(String, RequiredKind)>,
    ) -> Result<Vec<(String, RequiredKind)>, SolveError> {
        let mut expanded = Vec::with_capacity(composed.len());
        for (text, kind) in composed {
            let spec = MatchSpec::parse(&text).map_err(|source| InvalidSpec {
                text: text.clone(),
                source,
            })?;
            let Some(name) = spec.name() else {
                expanded.push((text, kind));
                continue;
            };
            if spec.namespace.is_some() {
                expanded.push((text, kind));
                continue;
            }
            let namespaces = self.index.namespaces_for(name.as_normalized());
            if namespaces.len() <= 1 {
                expanded.push((text, kind));
                continue;
            }
            if namespaces.contains(&Namespace::Global) {
                expanded.push((format!("{}:{text}", Namespace::Global), kind));
            } else {
                expanded.push((text, kind));
            }
        }
        Ok(expanded)
    }

    fn check_names_present(&self, request: &SolveRequest) -> Result<(), SolveError> {
        let mut missing: Vec<String> = request
            .specs_to_add
            .iter()
            .chain(request.pinned_specs.iter())
            .filter_map(|text| MatchSpec::parse(text).ok())
            .filter_map(|spec| spec.name().map(|n| n.as_normalized().to_string()))
            .filter(|name| !self.index.has_name(name))
            .collect();
        missing.sort();
        missing.dedup();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PackagesNotFoundError { names: missing }.into())
        }
    }

    fn already_satisfied(&self, prefix: &PrefixState, request: &SolveRequest) -> bool {
        request.specs_to_add.iter().all(|text| {
            MatchSpec::parse(text)
                .map(|spec| prefix.installed.iter().any(|record| spec.matches(record)))
                .unwrap_or(false)
        })
    }

    fn direct_dependency_names_of_requested(&self, final_state: &[PackageRecord], request: &SolveRequest) -> Vec<String> {
        let names: HashSet<String> = final_state
            .iter()
            .filter(|record| self.matches_any_requested(record, request))
            .flat_map(diff::dependency_names)
            .collect();
        names.into_iter().collect()
    }

    fn matches_any_requested(&self, record: &PackageRecord, request: &SolveRequest) -> bool {
        request.specs_to_add.iter().any(|text| {
            MatchSpec::parse(text)
                .map(|spec| spec.matches(record))
                .unwrap_or(false)
        })
    }

    /// Step 3: when `request.prune`, drops any record not reachable from
    /// the post-remove requested specs via the dependency graph.
    fn apply_prune(&self, final_state: Vec<PackageRecord>, request: &SolveRequest) -> Vec<PackageRecord> {
        if !request.prune {
            return final_state;
        }
        let by_name: HashMap<String, &PackageRecord> = final_state
            .iter()
            .map(|r| (r.name.as_normalized().to_string(), r))
            .collect();

        let mut reachable: HashSet<String> = HashSet::new();
        let mut queue: Vec<String> = request
            .specs_to_add
            .iter()
            .filter_map(|s| MatchSpec::parse(s).ok())
            .filter_map(|spec| spec.name().map(|n| n.as_normalized().to_string()))
            .collect();

        while let Some(name) = queue.pop() {
            if !reachable.insert(name.clone()) {
                continue;
            }
            if let Some(record) = by_name.get(&name) {
                for dep in diff::dependency_names(record) {
                    if !reachable.contains(&dep) {
                        queue.push(dep);
                    }
                }
            }
        }

        final_state
            .into_iter()
            .filter(|r| reachable.contains(r.name.as_normalized()))
            .collect()
    }

    /// Steps 5 and 6: computes the unlink/link diff and applies the deps
    /// modifier to the `link` side only.
    fn finish(&self, prefix: &PrefixState, final_state: Vec<PackageRecord>, request: &SolveRequest) -> Outcome {
        let mut d = diff::compute(&prefix.installed, &final_state, request.force_reinstall);
        match request.deps_modifier {
            DepsModifier::None => {}
            DepsModifier::NoDeps => d.link.retain(|r| self.matches_any_requested(r, request)),
            DepsModifier::OnlyDeps => d.link.retain(|r| !self.matches_any_requested(r, request)),
        }
        Outcome {
            final_state,
            unlink: d.unlink,
            link: d.link,
        }
    }
}

fn merge_by_name(base: &mut Vec<(String, RequiredKind)>, additions: impl IntoIterator<Item = (String, RequiredKind)>) {
    for (text, kind) in additions {
        let key = spec_name_key(&text);
        base.retain(|(existing, _)| spec_name_key(existing) != key);
        base.push((text, kind));
    }
}

fn spec_name_key(text: &str) -> String {
    MatchSpec::parse(text)
        .ok()
        .and_then(|spec| spec.name().map(|n| n.as_normalized().to_string()))
        .unwrap_or_else(|| text.trim().to_ascii_lowercase())
}
