use serde::{Deserialize, Serialize};

use crate::normalize::{NormalizedKey, Normalizer};

/// A reference-dataset record as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    #[serde(alias = "canonical_id", alias = "id")]
    pub canonical_id: String,
    #[serde(default, alias = "display_names")]
    pub display_names: Vec<String>,
}

impl CatalogRecord {
    pub fn new<I, S>(canonical_id: impl Into<String>, display_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical_id: canonical_id.into(),
            display_names: display_names.into_iter().map(Into::into).collect(),
        }
    }
}

/// An indexed catalog record: display names plus their distinct keys, in
/// display-name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub canonical_id: String,
    pub display_names: Vec<String>,
    pub normalized_keys: Vec<NormalizedKey>,
    /// Compact stopword-preserving forms of each display name, then of the
    /// canonical id. Override targets are matched against these.
    #[serde(skip)]
    pub literal_forms: Vec<String>,
}

impl CatalogEntry {
    pub fn from_record(record: CatalogRecord, normalizer: &Normalizer) -> Self {
        let mut normalized_keys: Vec<NormalizedKey> = Vec::with_capacity(record.display_names.len());
        for name in &record.display_names {
            let key = normalizer.normalize(name);
            if !key.is_empty() && !normalized_keys.contains(&key) {
                normalized_keys.push(key);
            }
        }
        let mut literal_forms: Vec<String> = Vec::with_capacity(record.display_names.len() + 1);
        let literal_sources = record.display_names.iter().chain(std::iter::once(&record.canonical_id));
        for raw in literal_sources {
            let form = normalizer.normalize_literal(raw).compact();
            if !form.is_empty() && !literal_forms.contains(&form) {
                literal_forms.push(form);
            }
        }
        Self {
            canonical_id: record.canonical_id,
            display_names: record.display_names,
            normalized_keys,
            literal_forms,
        }
    }

    /// First display name, or the canonical id when the record has none.
    pub fn preferred_name(&self) -> &str {
        self.display_names
            .first()
            .map(String::as_str)
            .unwrap_or(&self.canonical_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deduplicated_in_order() {
        let record = CatalogRecord::new(
            "SkySpMainEvHD.uk",
            ["Sky Sports Main Event", "Sky Sports Main Event HD", "SS Main Event"],
        );
        let entry = CatalogEntry::from_record(record, &Normalizer::default());
        let keys: Vec<&str> = entry.normalized_keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["sky main event", "ss main event"]);
        assert_eq!(entry.preferred_name(), "Sky Sports Main Event");
    }

    #[test]
    fn literal_forms_keep_stopwords_and_include_the_id() {
        let record = CatalogRecord::new("TNTSports1.uk", ["TNT Sports 1 UK", "TNT Sports 1"]);
        let entry = CatalogEntry::from_record(record, &Normalizer::default());
        assert_eq!(entry.literal_forms, vec!["tntsports1uk", "tntsports1"]);

        let record = CatalogRecord::new("sky_sports_plus", ["Sky Sports+"]);
        let entry = CatalogEntry::from_record(record, &Normalizer::default());
        assert_eq!(entry.literal_forms, vec!["skysportsplus"]);
    }

    #[test]
    fn record_accepts_snake_case_and_id() {
        let a: CatalogRecord =
            serde_json::from_str(r#"{"id": "bbc1.uk", "display_names": ["BBC One"]}"#).unwrap();
        let b: CatalogRecord =
            serde_json::from_str(r#"{"canonicalId": "bbc1.uk", "displayNames": ["BBC One"]}"#)
                .unwrap();
        assert_eq!(a, b);
    }
}
