use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Attribute keys that carry an explicit country.
pub const COUNTRY_ATTRIBUTES: &[&str] = &["country", "tvg-country"];

/// Attribute keys that carry an explicit guide channel id.
pub const EPG_ID_ATTRIBUTES: &[&str] = &["tvg-id"];

/// Duplicate counter appended by playlist generators: "Sky Sport (2)".
static RE_DUP_COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d{1,3}\)\s*$").unwrap());

/// Single-letter mirror suffix: "Rai 1 .b".
static RE_MIRROR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\.[a-z]\s*$").unwrap());

/// A channel label as extracted by an upstream parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLabel {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
}

impl RawLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach a structured hint. Keys are case-insensitive.
    pub fn with_attribute(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.as_ref().to_lowercase(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Value of the first non-blank attribute among `keys`.
    pub fn attribute(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| {
            self.attributes
                .get(*key)
                .or_else(|| {
                    self.attributes
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case(key))
                        .map(|(_, v)| v)
                })
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        })
    }

    /// The name with generator artifacts removed.
    pub fn display_name(&self) -> Cow<'_, str> {
        clean_display_name(&self.name)
    }
}

/// Remove trailing duplicate counters, then mirror suffixes.
fn clean_display_name(name: &str) -> Cow<'_, str> {
    let trimmed = name.trim();
    if !RE_DUP_COUNTER.is_match(trimmed) && !RE_MIRROR_SUFFIX.is_match(trimmed) {
        return Cow::Borrowed(trimmed);
    }
    let without_counter = RE_DUP_COUNTER.replace(trimmed, "");
    Cow::Owned(RE_MIRROR_SUFFIX.replace(&without_counter, "").into_owned())
}
