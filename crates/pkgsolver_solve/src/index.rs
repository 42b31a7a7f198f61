//! The in-memory, read-only catalog the solver searches over.

use indexmap::IndexMap;
use pkgsolver_types::{MatchSpec, Namespace, PackageRecord, RecordKey};

/// A loaded, immutable catalog of candidate records.
///
/// Records are grouped by `(namespace, name)` and kept in the deterministic
/// order `records_by_name` promises: descending version, then descending
/// build number, then descending timestamp, then ascending build string.
#[derive(Debug, Default)]
pub struct PackageIndex {
    by_name: IndexMap<(Namespace, String), Vec<PackageRecord>>,
}

impl PackageIndex {
    /// Builds an index from an unordered collection of records, sorting
    /// each name's candidates into the order the rest of the solver relies
    /// on.
    pub fn new(records: impl IntoIterator<Item = PackageRecord>) -> Self {
        let mut by_name: IndexMap<(Namespace, String), Vec<PackageRecord>> = IndexMap::new();
        for record in records {
            let key = (record.namespace.clone(), record.name.as_normalized().to_string());
            by_name.entry(key).or_default().push(record);
        }
        for records in by_name.values_mut() {
            records.sort_by(|a, b| {
                b.version
                    .cmp(&a.version)
                    .then_with(|| b.build_number.cmp(&a.build_number))
                    .then_with(|| b.timestamp.cmp(&a.timestamp))
                    .then_with(|| a.build_string.cmp(&b.build_string))
            });
        }
        Self { by_name }
    }

    /// Returns the number of distinct records in the index.
    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    /// Returns whether the index holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Every namespace that has at least one record under `name`.
    pub fn namespaces_for(&self, name: &str) -> Vec<Namespace> {
        self.by_name
            .keys()
            .filter(|(_, n)| n == name)
            .map(|(ns, _)| ns.clone())
            .collect()
    }

    /// The candidate records for a `(namespace, name)` pair, in
    /// deterministic preference order (best candidate first).
    pub fn records_by_name(&self, namespace: &Namespace, name: &str) -> &[PackageRecord] {
        self.by_name
            .get(&(namespace.clone(), name.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every record in the index, across every `(namespace, name)` bucket,
    /// in each bucket's internal order.
    pub fn all_records(&self) -> impl Iterator<Item = &PackageRecord> {
        self.by_name.values().flatten()
    }

    /// Every distinct `(namespace, name)` pair present in the index.
    pub fn names(&self) -> impl Iterator<Item = (&Namespace, &str)> {
        self.by_name.keys().map(|(ns, name)| (ns, name.as_str()))
    }

    /// Whether the index has any record under `name`, in any namespace.
    pub fn has_name(&self, name: &str) -> bool {
        self.by_name.keys().any(|(_, n)| n == name)
    }

    /// Records matching `spec`, across every `(namespace, name)` bucket
    /// whose name (and namespace, if the spec constrains one) could
    /// possibly match, in each bucket's internal order.
    pub fn matching(&self, spec: &MatchSpec) -> Vec<&PackageRecord> {
        let buckets: Box<dyn Iterator<Item = &Vec<PackageRecord>>> = match spec.name() {
            Some(name) => Box::new(
                self.by_name
                    .iter()
                    .filter(move |((_, n), _)| n.as_str() == name.as_normalized())
                    .map(|(_, records)| records),
            ),
            None => Box::new(self.by_name.values()),
        };
        buckets
            .flat_map(|records| records.iter())
            .filter(|record| spec.matches(record))
            .collect()
    }

    /// Looks up a single record by its exact key, if present.
    pub fn get(&self, key: &RecordKey) -> Option<&PackageRecord> {
        self.by_name
            .get(&(key.namespace.clone(), key.name.clone()))?
            .iter()
            .find(|record| &record.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pkgsolver_types::{PackageName, Version};

    use super::*;

    fn record(name: &str, version: &str, build_number: u64, timestamp_secs: i64) -> PackageRecord {
        PackageRecord {
            name: PackageName::new_unchecked(name),
            version: Version::parse(version).unwrap(),
            build_string: "0".to_string(),
            build_number,
            channel: "main".to_string(),
            subdir: "linux-64".to_string(),
            namespace: Namespace::Global,
            depends: Vec::new(),
            constrains: Vec::new(),
            features: Vec::new(),
            track_features: Vec::new(),
            timestamp: Some(Utc.timestamp_opt(timestamp_secs, 0).unwrap()),
        }
    }

    #[test]
    fn orders_by_descending_version_then_build_number() {
        let index = PackageIndex::new(vec![
            record("numpy", "1.7.0", 0, 0),
            record("numpy", "1.8.0", 1, 0),
            record("numpy", "1.8.0", 0, 0),
        ]);
        let records = index.records_by_name(&Namespace::Global, "numpy");
        assert_eq!(records[0].version.as_str(), "1.8.0");
        assert_eq!(records[0].build_number, 1);
        assert_eq!(records[1].build_number, 0);
        assert_eq!(records[2].version.as_str(), "1.7.0");
    }

    #[test]
    fn matching_filters_by_spec() {
        let index = PackageIndex::new(vec![record("numpy", "1.7.0", 0, 0), record("numpy", "1.8.0", 0, 0)]);
        let spec = MatchSpec::parse("numpy>=1.8").unwrap();
        let matches = index.matching(&spec);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].version.as_str(), "1.8.0");
    }

    #[test]
    fn unknown_name_has_no_candidates() {
        let index = PackageIndex::new(vec![record("numpy", "1.7.0", 0, 0)]);
        assert!(index.records_by_name(&Namespace::Global, "scipy").is_empty());
        assert!(!index.has_name("scipy"));
    }
}
