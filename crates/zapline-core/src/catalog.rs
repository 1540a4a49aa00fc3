use std::collections::HashMap;

use rayon::prelude::*;

use crate::models::{CatalogEntry, CatalogRecord};
use crate::normalize::{NormalizedKey, Normalizer};

/// Shortest compact key (and query) considered for containment matching.
pub const DEFAULT_MIN_SUBSTRING_LEN: usize = 3;

/// A registered key together with its space-free form.
#[derive(Debug, Clone)]
struct IndexedKey {
    key: NormalizedKey,
    compact: String,
    entry: usize,
}

/// Read-only lookup index over one reference catalog.
///
/// Built once from an ordered record list. Exact lookup is many-to-one: when
/// two records share a key, the record registered first keeps it.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    name: String,
    entries: Vec<CatalogEntry>,
    by_key: HashMap<NormalizedKey, usize>,
    keys: Vec<IndexedKey>,
    by_id: HashMap<String, usize>,
    min_substring_len: usize,
    duplicates: usize,
}

impl CatalogIndex {
    /// Normalize every record and index its keys.
    ///
    /// Normalization runs in parallel; registration is a sequential pass in
    /// record order so first-registration-wins holds regardless of
    /// scheduling.
    pub fn build(
        name: impl Into<String>,
        records: Vec<CatalogRecord>,
        normalizer: &Normalizer,
        min_substring_len: usize,
    ) -> Self {
        let name = name.into();
        let entries: Vec<CatalogEntry> = records
            .into_par_iter()
            .map(|record| CatalogEntry::from_record(record, normalizer))
            .collect();

        let mut index = Self {
            name,
            entries: Vec::with_capacity(entries.len()),
            by_key: HashMap::new(),
            keys: Vec::new(),
            by_id: HashMap::new(),
            min_substring_len: min_substring_len.max(1),
            duplicates: 0,
        };
        for entry in entries {
            index.register(entry);
        }

        tracing::info!(
            catalog = %index.name,
            entries = index.entries.len(),
            keys = index.keys.len(),
            duplicates = index.duplicates,
            "Catalog indexed"
        );
        index
    }

    fn register(&mut self, entry: CatalogEntry) {
        let idx = self.entries.len();
        self.by_id
            .entry(entry.canonical_id.clone())
            .or_insert(idx);

        for key in &entry.normalized_keys {
            if let Some(&owner) = self.by_key.get(key) {
                self.duplicates += 1;
                tracing::debug!(
                    catalog = %self.name,
                    key = %key,
                    kept = %self.entries[owner].canonical_id,
                    ignored = %entry.canonical_id,
                    "Duplicate catalog key ignored"
                );
                continue;
            }
            self.by_key.insert(key.clone(), idx);
            self.keys.push(IndexedKey {
                compact: key.compact(),
                key: key.clone(),
                entry: idx,
            });
        }
        self.entries.push(entry);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exact_lookup(&self, key: &NormalizedKey) -> Option<&CatalogEntry> {
        if key.is_empty() {
            return None;
        }
        self.by_key.get(key).map(|&idx| &self.entries[idx])
    }

    /// Find a key that contains the query or is contained by it.
    ///
    /// Containment is checked on the compact forms, so "sky main event"
    /// matches "skymainevent uk". Among all hits the longest indexed key
    /// wins; equal lengths keep catalog order. Keys and queries shorter
    /// than the configured minimum never take part.
    pub fn substring_lookup(&self, key: &NormalizedKey) -> Option<(&CatalogEntry, &NormalizedKey)> {
        let query = key.compact();
        if query.len() < self.min_substring_len {
            return None;
        }

        let mut best: Option<&IndexedKey> = None;
        for candidate in &self.keys {
            if candidate.compact.len() < self.min_substring_len {
                continue;
            }
            if !candidate.compact.contains(&query) && !query.contains(&candidate.compact) {
                continue;
            }
            if best.map_or(true, |b| candidate.compact.len() > b.compact.len()) {
                best = Some(candidate);
            }
        }
        best.map(|b| (&self.entries[b.entry], &b.key))
    }

    pub fn all_entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Every (entry, key) pair in catalog order, for similarity scans.
    pub fn keyed_entries(&self) -> impl Iterator<Item = (&CatalogEntry, &NormalizedKey)> {
        self.entries
            .iter()
            .flat_map(|e| e.normalized_keys.iter().map(move |k| (e, k)))
    }

    pub fn get_by_id(&self, canonical_id: &str) -> Option<&CatalogEntry> {
        self.by_id.get(canonical_id).map(|&idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys dropped because an earlier record already owned them.
    pub fn duplicate_keys(&self) -> usize {
        self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn index(records: Vec<CatalogRecord>) -> CatalogIndex {
        CatalogIndex::build("test", records, &Normalizer::default(), DEFAULT_MIN_SUBSTRING_LEN)
    }

    fn sample() -> CatalogIndex {
        index(vec![
            CatalogRecord::new("SkySpMainEvHD.uk", ["Sky Sports Main Event"]),
            CatalogRecord::new("SkySpPL.uk", ["Sky Sports Premier League", "Sky PL"]),
            CatalogRecord::new("BBCOne.uk", ["BBC One", "BBC 1"]),
            CatalogRecord::new("ESPN.us", ["ESPN"]),
            CatalogRecord::new("ESPN2.us", ["ESPN 2"]),
        ])
    }

    #[test]
    fn exact_lookup_by_normalized_key() {
        let idx = sample();
        let hit = idx.exact_lookup(&normalize("Sky Sports Main Event HD")).unwrap();
        assert_eq!(hit.canonical_id, "SkySpMainEvHD.uk");
        assert!(idx.exact_lookup(&normalize("Sky Cinema")).is_none());
        assert!(idx.exact_lookup(&normalize("")).is_none());
    }

    #[test]
    fn first_registration_wins() {
        let idx = index(vec![
            CatalogRecord::new("first", ["Fox Sports 1"]),
            CatalogRecord::new("second", ["FOX SPORTS 1 HD"]),
        ]);
        assert_eq!(idx.exact_lookup(&normalize("fox 1")).unwrap().canonical_id, "first");
        assert_eq!(idx.duplicate_keys(), 1);
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn build_preserves_record_order() {
        let records: Vec<CatalogRecord> = (0..500)
            .map(|i| CatalogRecord::new(format!("id{i}"), [format!("Channel {i}")]))
            .collect();
        let idx = index(records);
        for (i, entry) in idx.all_entries().iter().enumerate() {
            assert_eq!(entry.canonical_id, format!("id{i}"));
        }
    }

    #[test]
    fn substring_prefers_longest_key() {
        let idx = sample();
        // "espn 2 usa" contains both "espn" and "espn2".
        let (entry, key) = idx.substring_lookup(&normalize("ESPN 2 USA")).unwrap();
        assert_eq!(entry.canonical_id, "ESPN2.us");
        assert_eq!(key.as_str(), "espn 2");
    }

    #[test]
    fn substring_both_directions() {
        let idx = sample();
        // Query contained in a key.
        let (entry, _) = idx.substring_lookup(&normalize("Sky Main")).unwrap();
        assert_eq!(entry.canonical_id, "SkySpMainEvHD.uk");
        // Key contained in the query.
        let (entry, _) = idx.substring_lookup(&normalize("UK: Sky Sports Main Event 4K")).unwrap();
        assert_eq!(entry.canonical_id, "SkySpMainEvHD.uk");
    }

    #[test]
    fn substring_ties_fall_to_catalog_order() {
        let idx = index(vec![
            CatalogRecord::new("a", ["Alpha TV"]),
            CatalogRecord::new("b", ["Alpha FM"]),
        ]);
        let (entry, _) = idx.substring_lookup(&normalize("alpha")).unwrap();
        assert_eq!(entry.canonical_id, "a");
    }

    #[test]
    fn short_queries_skip_substring() {
        let idx = sample();
        assert!(idx.substring_lookup(&normalize("bb")).is_none());
        assert!(idx.substring_lookup(&normalize("")).is_none());
    }

    #[test]
    fn lookup_by_id() {
        let idx = sample();
        assert_eq!(idx.get_by_id("BBCOne.uk").unwrap().preferred_name(), "BBC One");
        assert!(idx.get_by_id("bbcone.uk").is_none());
    }

    #[test]
    fn empty_catalog() {
        let idx = index(Vec::new());
        assert!(idx.is_empty());
        assert!(idx.exact_lookup(&normalize("bbc")).is_none());
        assert!(idx.substring_lookup(&normalize("bbc")).is_none());
        assert_eq!(idx.keyed_entries().count(), 0);
    }
}
