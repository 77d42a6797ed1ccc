//! Immutable store of ground-truth entries for one dataset.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::entry::{EntryKey, GroundTruthEntry, TestKind};

/// Version of the on-disk store layout.
pub const STORE_FORMAT_VERSION: u32 = 1;

/// Identity of the dataset a store was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub dataset: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dataset_hash: Option<String>,
    pub row_count: usize,
    pub column_count: usize,
    /// Significance level used for every `significant` flag.
    pub alpha: f64,
    pub format_version: u32,
}

/// Every ground-truth entry computed for a dataset.
///
/// Built once by the engine (or loaded from a cache) and only read
/// afterwards. Entries keep the engine's task order: descriptive entries in
/// column order, then pairs in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoreFile", into = "StoreFile")]
pub struct GroundTruthStore {
    metadata: StoreMetadata,
    entries: Vec<GroundTruthEntry>,
    index: HashMap<EntryKey, usize>,
}

/// Serialized form of a store; the key index is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct StoreFile {
    metadata: StoreMetadata,
    entries: Vec<GroundTruthEntry>,
}

impl TryFrom<StoreFile> for GroundTruthStore {
    type Error = String;

    fn try_from(file: StoreFile) -> Result<Self, Self::Error> {
        let mut index = HashMap::with_capacity(file.entries.len());
        for (position, entry) in file.entries.iter().enumerate() {
            if index.insert(entry.key.clone(), position).is_some() {
                return Err(format!("duplicate ground-truth entry {}", entry.key));
            }
        }
        Ok(Self {
            metadata: file.metadata,
            entries: file.entries,
            index,
        })
    }
}

impl From<GroundTruthStore> for StoreFile {
    fn from(store: GroundTruthStore) -> Self {
        StoreFile {
            metadata: store.metadata,
            entries: store.entries,
        }
    }
}

impl GroundTruthStore {
    /// Build a store; a later entry replaces an earlier one with the same key.
    pub fn new(metadata: StoreMetadata, entries: Vec<GroundTruthEntry>) -> Self {
        let mut deduped: Vec<GroundTruthEntry> = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for entry in entries {
            match index.get(&entry.key) {
                Some(&position) => deduped[position] = entry,
                None => {
                    index.insert(entry.key.clone(), deduped.len());
                    deduped.push(entry);
                }
            }
        }
        Self {
            metadata,
            entries: deduped,
            index,
        }
    }

    pub fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    pub fn alpha(&self) -> f64 {
        self.metadata.alpha
    }

    pub fn entries(&self) -> &[GroundTruthEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &EntryKey) -> Option<&GroundTruthEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Entry for a variable pair and test, in either variable order.
    pub fn pair(&self, a: &str, b: &str, test: TestKind) -> Option<&GroundTruthEntry> {
        self.get(&EntryKey::pair(a, b, test))
    }

    /// All pair entries for two variables, in [`TestKind::ALL`] order.
    pub fn pair_entries<'s>(
        &'s self,
        a: &str,
        b: &str,
    ) -> impl Iterator<Item = &'s GroundTruthEntry> + use<'s> {
        let keys: Vec<EntryKey> = TestKind::ALL
            .into_iter()
            .map(|test| EntryKey::pair(a, b, test))
            .collect();
        keys.into_iter().filter_map(move |key| self.get(&key))
    }

    pub fn descriptive(&self, variable: &str) -> Option<&GroundTruthEntry> {
        self.get(&EntryKey::descriptive(variable))
    }

    pub fn undefined_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_undefined()).count()
    }

    pub fn significant_count(&self) -> usize {
        self.entries
            .iter()
            .filter_map(GroundTruthEntry::test_result)
            .filter(|r| r.significant)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground_truth::entry::{EntryOutcome, TestResult};

    fn metadata() -> StoreMetadata {
        StoreMetadata {
            dataset: "test".to_string(),
            dataset_hash: None,
            row_count: 10,
            column_count: 2,
            alpha: 0.05,
            format_version: STORE_FORMAT_VERSION,
        }
    }

    fn result(p_value: f64) -> EntryOutcome {
        EntryOutcome::Test(TestResult {
            statistic: 1.0,
            p_value,
            significant: p_value < 0.05,
            n: 10,
            direction: None,
            degrees_of_freedom: None,
            effect_size: None,
            strength: None,
            group_means: None,
        })
    }

    #[test]
    fn test_lookup_in_either_order() {
        let store = GroundTruthStore::new(
            metadata(),
            vec![GroundTruthEntry::new(
                EntryKey::pair("b", "a", TestKind::Pearson),
                result(0.01),
            )],
        );
        assert!(store.pair("a", "b", TestKind::Pearson).is_some());
        assert!(store.pair("b", "a", TestKind::Pearson).is_some());
        assert!(store.pair("a", "b", TestKind::Spearman).is_none());
        assert_eq!(store.significant_count(), 1);
    }

    #[test]
    fn test_later_entry_replaces_duplicate() {
        let key = EntryKey::pair("a", "b", TestKind::Pearson);
        let store = GroundTruthStore::new(
            metadata(),
            vec![
                GroundTruthEntry::new(key.clone(), result(0.01)),
                GroundTruthEntry::undefined(key.clone(), "gone"),
            ],
        );
        assert_eq!(store.len(), 1);
        assert!(store.get(&key).unwrap().is_undefined());
    }

    #[test]
    fn test_pair_entries_follow_test_order() {
        let store = GroundTruthStore::new(
            metadata(),
            vec![
                GroundTruthEntry::new(EntryKey::pair("a", "b", TestKind::Spearman), result(0.2)),
                GroundTruthEntry::new(EntryKey::pair("a", "b", TestKind::Pearson), result(0.3)),
            ],
        );
        let tests: Vec<_> = store
            .pair_entries("b", "a")
            .filter_map(|e| e.key.test())
            .collect();
        assert_eq!(tests, vec![TestKind::Pearson, TestKind::Spearman]);
    }

    #[test]
    fn test_pair_entries_outlive_the_names() {
        let store = GroundTruthStore::new(
            metadata(),
            vec![GroundTruthEntry::new(
                EntryKey::pair("age", "bmi", TestKind::Pearson),
                result(0.04),
            )],
        );
        let entries: Vec<&GroundTruthEntry> = {
            let a = String::from("bmi");
            let b = String::from("age");
            store.pair_entries(&a, &b).collect()
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key.test(), Some(TestKind::Pearson));
    }

    #[test]
    fn test_deserialize_rejects_duplicate_keys() {
        let entry = GroundTruthEntry::undefined(EntryKey::descriptive("x"), "empty");
        let file = StoreFile {
            metadata: metadata(),
            entries: vec![entry.clone(), entry],
        };
        let json = serde_json::to_string(&file).unwrap();
        let err = serde_json::from_str::<GroundTruthStore>(&json).unwrap_err();
        assert!(err.to_string().contains("duplicate ground-truth entry"));
    }
}
