//! Turns "what's installed" and "what the solve decided" into an ordered
//! unlink/link transaction.

use std::collections::{HashMap, HashSet};

use pkgsolver_types::{PackageRecord, RecordKey};

/// The unlink/link operations a caller must apply to move from `installed`
/// to `final_state`.
#[derive(Debug, Clone, Default)]
pub struct Diff {
    /// Records to remove, leaves of the dependency graph first.
    pub unlink: Vec<PackageRecord>,
    /// Records to add, roots of the dependency graph first.
    pub link: Vec<PackageRecord>,
}

/// Computes `unlink = installed \ final_state`, `link = final_state \
/// installed`, each ordered so that a record's dependencies are unlinked
/// after it and linked before it (reverse-topological for unlink, ordinary
/// topological for link).
///
/// When `force_reinstall` is set and the two sets are identical, both
/// `unlink` and `link` are populated with the full set so a caller rebuilds
/// every record regardless.
pub fn compute(installed: &[PackageRecord], final_state: &[PackageRecord], force_reinstall: bool) -> Diff {
    let installed_keys: HashSet<RecordKey> = installed.iter().map(PackageRecord::key).collect();
    let final_keys: HashSet<RecordKey> = final_state.iter().map(PackageRecord::key).collect();

    if force_reinstall && installed_keys == final_keys {
        return Diff {
            unlink: topological_order(installed, false),
            link: topological_order(final_state, true),
        };
    }

    let to_unlink: Vec<PackageRecord> = installed
        .iter()
        .filter(|r| !final_keys.contains(&r.key()))
        .cloned()
        .collect();
    let to_link: Vec<PackageRecord> = final_state
        .iter()
        .filter(|r| !installed_keys.contains(&r.key()))
        .cloned()
        .collect();

    Diff {
        unlink: topological_order(&to_unlink, false),
        link: topological_order(&to_link, true),
    }
}

/// Orders `records` so that, within the set, a record appears before
/// (`roots_first = true`) or after (`roots_first = false`) anything it
/// `depends` on by name. Ties (no edge between two records, or a
/// dependency outside the set) keep the input's relative order, so the
/// result is deterministic.
pub(crate) fn topological_order(records: &[PackageRecord], roots_first: bool) -> Vec<PackageRecord> {
    let index_of: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.name.as_normalized(), i))
        .collect();

    let mut visited = vec![false; records.len()];
    let mut order = Vec::with_capacity(records.len());

    fn visit(
        i: usize,
        records: &[PackageRecord],
        index_of: &HashMap<&str, usize>,
        visited: &mut [bool],
        order: &mut Vec<usize>,
    ) {
        if visited[i] {
            return;
        }
        visited[i] = true;
        for dep_name in dependency_names(&records[i]) {
            if let Some(&dep_idx) = index_of.get(dep_name.as_str()) {
                visit(dep_idx, records, index_of, visited, order);
            }
        }
        order.push(i);
    }

    for i in 0..records.len() {
        visit(i, records, &index_of, &mut visited, &mut order);
    }

    // `visit` yields a dependency-before-dependent order, i.e. roots last.
    if roots_first {
        order.reverse();
    }
    order.into_iter().map(|i| records[i].clone()).collect()
}

pub(crate) fn dependency_names(record: &PackageRecord) -> Vec<String> {
    record
        .depends
        .iter()
        .filter_map(|spec_text| spec_text.split(|c: char| c.is_whitespace() || c == '[' || "=<>!,*".contains(c)).next())
        .map(str::to_ascii_lowercase)
        .collect()
}
