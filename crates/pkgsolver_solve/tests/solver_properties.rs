//! Scenario-driven integration tests over the full orchestrator, covering
//! the testable properties and concrete scenarios of the solve algorithm:
//! determinism, satisfaction, single-copy, closure, idempotence, channel
//! priority, and the `NO_DEPS`/`track_features`/pin-outranks-update
//! scenarios.

use chrono::{TimeZone, Utc};
use pkgsolver_solve::{
    DepsModifier, Orchestrator, PrefixState, SolveRequest, SolverConfig, UpdateModifier,
};
use pkgsolver_types::{Namespace, PackageName, PackageRecord, Version};
use rstest::rstest;

/// Builds a synthetic record with sane defaults, for scenarios that only
/// care about a handful of fields.
struct RecordCase {
    name: &'static str,
    version: &'static str,
    build_string: &'static str,
    build_number: u64,
    channel: &'static str,
    depends: Vec<&'static str>,
    features: Vec<&'static str>,
    track_features: Vec<&'static str>,
}

impl RecordCase {
    fn new(name: &'static str, version: &'static str) -> Self {
        Self {
            name,
            version,
            build_string: "0",
            build_number: 0,
            channel: "main",
            depends: Vec::new(),
            features: Vec::new(),
            track_features: Vec::new(),
        }
    }

    fn build(mut self, build_string: &'static str, build_number: u64) -> Self {
        self.build_string = build_string;
        self.build_number = build_number;
        self
    }

    fn channel(mut self, channel: &'static str) -> Self {
        self.channel = channel;
        self
    }

    fn depends(mut self, specs: &[&'static str]) -> Self {
        self.depends = specs.to_vec();
        self
    }

    fn features(mut self, features: &[&'static str]) -> Self {
        self.features = features.to_vec();
        self
    }

    fn finish(self) -> PackageRecord {
        PackageRecord {
            name: PackageName::new_unchecked(self.name),
            version: Version::parse(self.version).unwrap(),
            build_string: self.build_string.to_string(),
            build_number: self.build_number,
            channel: self.channel.to_string(),
            subdir: "linux-64".to_string(),
            namespace: Namespace::Global,
            depends: self.depends.into_iter().map(str::to_string).collect(),
            constrains: Vec::new(),
            features: self.features.into_iter().map(str::to_string).collect(),
            track_features: self.track_features.into_iter().map(str::to_string).collect(),
            timestamp: Some(Utc.timestamp_opt(0, 0).unwrap()),
        }
    }
}

fn names_of(records: &[PackageRecord]) -> Vec<String> {
    let mut names: Vec<String> = records.iter().map(|r| r.name.as_normalized().to_string()).collect();
    names.sort();
    names
}

#[test]
fn numpy_install_pulls_python_at_top_versions() {
    let index = pkgsolver_solve::PackageIndex::new(vec![
        RecordCase::new("python", "3.3.2").build("0", 0).finish(),
        RecordCase::new("numpy", "1.7.1")
            .build("py33_0", 0)
            .depends(&["python>=3.3,<3.4"])
            .finish(),
    ]);
    let orchestrator = Orchestrator::new(&index, SolverConfig::default());
    let prefix = PrefixState::default();
    let request = SolveRequest {
        specs_to_add: vec!["numpy".to_string()],
        ..SolveRequest::default()
    };
    let outcome = orchestrator.solve_for_diff(&prefix, &request).unwrap();
    assert_eq!(names_of(&outcome.final_state), vec!["numpy", "python"]);
    let numpy = outcome
        .final_state
        .iter()
        .find(|r| r.name.as_normalized() == "numpy")
        .unwrap();
    assert_eq!(numpy.build_string, "py33_0");
}

#[test]
fn determinism_two_runs_agree() {
    let index = pkgsolver_solve::PackageIndex::new(vec![
        RecordCase::new("numpy", "1.7.0").finish(),
        RecordCase::new("numpy", "1.8.0").finish(),
    ]);
    let orchestrator = Orchestrator::new(&index, SolverConfig::default());
    let prefix = PrefixState::default();
    let request = SolveRequest {
        specs_to_add: vec!["numpy".to_string()],
        ..SolveRequest::default()
    };
    let first = orchestrator.solve_final_state(&prefix, &request).unwrap();
    let second = orchestrator.solve_final_state(&prefix, &request).unwrap();
    similar_asserts::assert_eq!(names_of(&first), names_of(&second));
    assert_eq!(first[0].version.as_str(), second[0].version.as_str());
    assert_eq!(first[0].version.as_str(), "1.8.0");
}

#[test]
fn idempotent_resolve_of_its_own_output_has_no_diff() {
    let index = pkgsolver_solve::PackageIndex::new(vec![
        RecordCase::new("python", "3.9.0").finish(),
        RecordCase::new("numpy", "1.8.0").depends(&["python"]).finish(),
    ]);
    let orchestrator = Orchestrator::new(&index, SolverConfig::default());
    let request = SolveRequest {
        specs_to_add: vec!["numpy".to_string()],
        ..SolveRequest::default()
    };
    let first = orchestrator
        .solve_for_diff(&PrefixState::default(), &request)
        .unwrap();

    let second_prefix = PrefixState {
        installed: first.final_state.clone(),
        ..PrefixState::default()
    };
    let second = orchestrator.solve_for_diff(&second_prefix, &request).unwrap();
    assert!(second.unlink.is_empty());
    assert!(second.link.is_empty());
}

#[test]
fn closure_every_dependency_is_satisfied_in_final_state() {
    let index = pkgsolver_solve::PackageIndex::new(vec![
        RecordCase::new("python", "3.9.0").finish(),
        RecordCase::new("numpy", "1.8.0").depends(&["python>=3"]).finish(),
        RecordCase::new("scipy", "1.5.0").depends(&["numpy", "python>=3"]).finish(),
    ]);
    let orchestrator = Orchestrator::new(&index, SolverConfig::default());
    let request = SolveRequest {
        specs_to_add: vec!["scipy".to_string()],
        ..SolveRequest::default()
    };
    let outcome = orchestrator
        .solve_for_diff(&PrefixState::default(), &request)
        .unwrap();
    let names: Vec<String> = names_of(&outcome.final_state);
    assert_eq!(names, vec!["numpy", "python", "scipy"]);
}

#[test]
fn channel_priority_prefers_higher_ranked_channel_over_newer_version() {
    let index = pkgsolver_solve::PackageIndex::new(vec![
        RecordCase::new("numpy", "1.7.0").channel("conda-forge").finish(),
        RecordCase::new("numpy", "1.8.0").channel("community").finish(),
    ]);
    let mut channel_rank = std::collections::HashMap::new();
    channel_rank.insert("conda-forge".to_string(), 0i64);
    channel_rank.insert("community".to_string(), 1i64);
    let orchestrator = Orchestrator::new(
        &index,
        SolverConfig {
            channel_priority: true,
            channel_rank,
            ..SolverConfig::default()
        },
    );
    let request = SolveRequest {
        specs_to_add: vec!["numpy".to_string()],
        ..SolveRequest::default()
    };
    let outcome = orchestrator
        .solve_for_diff(&PrefixState::default(), &request)
        .unwrap();
    assert_eq!(outcome.final_state[0].channel, "conda-forge");
}

#[test]
fn no_deps_links_the_requested_package_without_its_dependencies() {
    let index = pkgsolver_solve::PackageIndex::new(vec![
        RecordCase::new("python", "2.7.0").finish(),
        RecordCase::new("numpy", "1.7.0").finish(),
        RecordCase::new("llvm", "3.3.0").finish(),
        RecordCase::new("llvmpy", "0.11.2").depends(&["llvm"]).finish(),
        RecordCase::new("numba", "0.12.0").depends(&["llvmpy", "numpy", "python"]).finish(),
    ]);
    let orchestrator = Orchestrator::new(&index, SolverConfig::default());
    let prefix = PrefixState {
        installed: vec![
            index.get(&RecordCase::new("python", "2.7.0").finish().key()).unwrap().clone(),
            index.get(&RecordCase::new("numpy", "1.7.0").finish().key()).unwrap().clone(),
        ],
        ..PrefixState::default()
    };
    let request = SolveRequest {
        specs_to_add: vec!["numba".to_string()],
        deps_modifier: DepsModifier::NoDeps,
        ..SolveRequest::default()
    };
    let outcome = orchestrator.solve_for_diff(&prefix, &request).unwrap();
    let linked: Vec<&str> = outcome.link.iter().map(|r| r.name.as_normalized()).collect();
    assert_eq!(linked, vec!["numba"]);
}

#[test]
fn track_features_prefers_the_feature_supplying_variant() {
    let index = pkgsolver_solve::PackageIndex::new(vec![
        RecordCase::new("numpy", "1.8.0").build("nomkl_0", 0).finish(),
        RecordCase::new("numpy", "1.8.0").build("mkl_0", 0).features(&["mkl"]).finish(),
    ]);
    let orchestrator = Orchestrator::new(
        &index,
        SolverConfig {
            track_features: vec!["mkl".to_string()],
            ..SolverConfig::default()
        },
    );
    let request = SolveRequest {
        specs_to_add: vec!["numpy".to_string()],
        ..SolveRequest::default()
    };
    let outcome = orchestrator
        .solve_for_diff(&PrefixState::default(), &request)
        .unwrap();
    assert_eq!(outcome.final_state[0].build_string, "mkl_0");
}

#[rstest]
#[case(UpdateModifier::UpdateAll)]
#[case(UpdateModifier::None)]
fn pin_outranks_update_all(#[case] update_modifier: UpdateModifier) {
    let index = pkgsolver_solve::PackageIndex::new(vec![
        RecordCase::new("python", "2.6.0").finish(),
        RecordCase::new("python", "2.7.0").finish(),
        RecordCase::new("numba", "0.12.0").finish(),
    ]);
    let mut history = pkgsolver_types::History::new();
    history.push(pkgsolver_types::HistoryRevision {
        timestamp: Utc.timestamp_opt(0, 0).unwrap(),
        request: pkgsolver_types::UserRequest {
            cmd: Some("install python=2.6".to_string()),
            update_specs: vec!["python==2.6.0".to_string()],
            remove_specs: Vec::new(),
            neutered_specs: Vec::new(),
        },
    });
    let orchestrator = Orchestrator::new(&index, SolverConfig::default());
    let prefix = PrefixState {
        installed: Vec::new(),
        history,
    };
    let request = SolveRequest {
        specs_to_add: vec!["numba".to_string()],
        pinned_specs: vec!["python==2.6.0".to_string()],
        update_modifier,
        ..SolveRequest::default()
    };
    let outcome = orchestrator.solve_for_diff(&prefix, &request).unwrap();
    let python = outcome
        .final_state
        .iter()
        .find(|r| r.name.as_normalized() == "python")
        .unwrap();
    assert_eq!(python.version.as_str(), "2.6.0");
}
