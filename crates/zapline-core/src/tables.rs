//! Declarative heuristic tables: country aliases and codes, priority
//! overrides, broadcaster brands, guide-id overrides, and script hints.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ZaplineError;
use crate::normalize::{NormalizedKey, Normalizer};
use crate::script::Script;

/// Embedded table set.
const EMBEDDED_TABLES: &str = include_str!("../data/tables.toml");

/// A country and the names it is known by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAliasDef {
    /// Canonical country value returned on a match.
    pub country: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// An uppercase country code ("GB", "KSA") and the country it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCodeDef {
    pub code: String,
    pub country: String,
}

/// An explicit country keyword checked ahead of brand heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityDef {
    pub keyword: String,
    pub country: String,
}

/// A broadcaster brand and its home country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandDef {
    pub brand: String,
    pub country: String,
}

/// A guide-id override: labels containing `alias` resolve to the first
/// catalog channel whose name or id contains `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpgAliasDef {
    pub alias: String,
    pub target: String,
}

/// A pinned guide id for one channel name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownIdDef {
    pub name: String,
    pub id: String,
}

/// A writing system and the region it implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDef {
    pub script: Script,
    pub region: String,
}

/// The full, versioned table set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverTables {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub stopwords: Vec<String>,
    #[serde(default)]
    pub delimiter_ignore: Vec<String>,
    #[serde(default, rename = "country_alias")]
    pub country_aliases: Vec<CountryAliasDef>,
    #[serde(default, rename = "country_code")]
    pub country_codes: Vec<CountryCodeDef>,
    #[serde(default, rename = "priority")]
    pub priorities: Vec<PriorityDef>,
    #[serde(default, rename = "brand")]
    pub brands: Vec<BrandDef>,
    #[serde(default, rename = "epg_alias")]
    pub epg_aliases: Vec<EpgAliasDef>,
    #[serde(default, rename = "known_id")]
    pub known_ids: Vec<KnownIdDef>,
    #[serde(default, rename = "script")]
    pub scripts: Vec<ScriptDef>,
}

impl ResolverTables {
    /// Load the embedded table set.
    pub fn embedded() -> Self {
        Self::from_toml(EMBEDDED_TABLES).expect("embedded tables.toml should be valid")
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Embedded tables, with the user file at `path` merged over them.
    pub fn load(path: Option<&Path>) -> Result<Self, ZaplineError> {
        let mut tables = Self::embedded();
        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ZaplineError::Tables(format!("{}: {e}", path.display())))?;
            let user = Self::from_toml(&content)
                .map_err(|e| ZaplineError::Tables(format!("{}: {e}", path.display())))?;
            tables.merge_user(&user);
            tracing::info!(path = %path.display(), version = tables.version, "User tables merged");
        }
        Ok(tables)
    }

    /// Merge a user table set into this one.
    ///
    /// Rows whose key matches an existing row replace it in place; new rows
    /// are appended. Non-empty word lists replace the built-in lists.
    pub fn merge_user(&mut self, user: &ResolverTables) {
        self.version = self.version.max(user.version);
        if !user.stopwords.is_empty() {
            self.stopwords = user.stopwords.clone();
        }
        if !user.delimiter_ignore.is_empty() {
            self.delimiter_ignore = user.delimiter_ignore.clone();
        }
        merge_rows(&mut self.country_aliases, &user.country_aliases, |r| &r.country);
        merge_rows(&mut self.country_codes, &user.country_codes, |r| &r.code);
        merge_rows(&mut self.priorities, &user.priorities, |r| &r.keyword);
        merge_rows(&mut self.brands, &user.brands, |r| &r.brand);
        merge_rows(&mut self.epg_aliases, &user.epg_aliases, |r| &r.alias);
        merge_rows(&mut self.known_ids, &user.known_ids, |r| &r.name);
        for row in &user.scripts {
            if let Some(existing) = self.scripts.iter_mut().find(|s| s.script == row.script) {
                *existing = row.clone();
            } else {
                self.scripts.push(row.clone());
            }
        }
    }

    /// Normalizer using this table set's stopwords.
    pub fn normalizer(&self) -> Normalizer {
        if self.stopwords.is_empty() {
            Normalizer::default()
        } else {
            Normalizer::new(&self.stopwords)
        }
    }

    pub fn alias_table(&self, normalizer: &Normalizer) -> AliasTable {
        AliasTable::build(&self.country_aliases, normalizer)
    }

    /// Uppercase code → country. The first row declaring a code keeps it.
    pub fn country_code_table(&self) -> HashMap<String, String> {
        let mut codes = HashMap::with_capacity(self.country_codes.len());
        for def in &self.country_codes {
            let code = def.code.trim().to_uppercase();
            if code.is_empty() {
                continue;
            }
            codes.entry(code).or_insert_with(|| def.country.clone());
        }
        codes
    }

    /// Priority rules in declared order.
    pub fn priority_rules(&self, normalizer: &Normalizer) -> Vec<PriorityRule> {
        self.priorities
            .iter()
            .filter_map(|p| {
                let keyword = normalizer.normalize(&p.keyword);
                (!keyword.is_empty()).then(|| PriorityRule {
                    keyword,
                    country: p.country.clone(),
                })
            })
            .collect()
    }

    /// Brand rules, most specific first; equally specific brands keep their
    /// declared order.
    pub fn brand_rules(&self, normalizer: &Normalizer) -> Vec<BrandRule> {
        let mut rules: Vec<BrandRule> = self
            .brands
            .iter()
            .filter_map(|b| {
                let brand = normalizer.normalize(&b.brand);
                (!brand.is_empty()).then(|| BrandRule {
                    brand,
                    country: b.country.clone(),
                })
            })
            .collect();
        rules.sort_by_key(|r| std::cmp::Reverse(specificity(&r.brand)));
        rules
    }

    /// Guide-id aliases, most specific first.
    ///
    /// Both sides keep their stopwords, so "tnt sports" never shrinks to
    /// "tnt".
    pub fn epg_alias_rules(&self, normalizer: &Normalizer) -> Vec<EpgAlias> {
        let mut rules: Vec<EpgAlias> = self
            .epg_aliases
            .iter()
            .filter_map(|a| {
                let alias = normalizer.normalize_literal(&a.alias);
                let target_key = normalizer.normalize_literal(&a.target);
                if alias.is_empty() || target_key.is_empty() {
                    return None;
                }
                let numbers = target_key
                    .tokens()
                    .filter(|t| is_number(t))
                    .map(str::to_string)
                    .collect();
                Some(EpgAlias {
                    alias,
                    target: target_key.compact(),
                    numbers,
                })
            })
            .collect();
        rules.sort_by_key(|r| std::cmp::Reverse(specificity(&r.alias)));
        rules
    }

    /// Normalized channel name → pinned guide id. The first row for a name
    /// keeps it.
    pub fn known_id_table(&self, normalizer: &Normalizer) -> HashMap<NormalizedKey, String> {
        let mut known = HashMap::with_capacity(self.known_ids.len());
        for def in &self.known_ids {
            let key = normalizer.normalize(&def.name);
            if key.is_empty() || def.id.trim().is_empty() {
                continue;
            }
            known.entry(key).or_insert_with(|| def.id.trim().to_string());
        }
        known
    }

    pub fn delimiter_ignore_set(&self, normalizer: &Normalizer) -> HashSet<NormalizedKey> {
        self.delimiter_ignore
            .iter()
            .map(|w| normalizer.normalize(w))
            .filter(|k| !k.is_empty())
            .collect()
    }
}

impl Default for ResolverTables {
    fn default() -> Self {
        Self::embedded()
    }
}

fn merge_rows<T: Clone>(base: &mut Vec<T>, user: &[T], key: impl Fn(&T) -> &String) {
    for row in user {
        if let Some(existing) = base.iter_mut().find(|r| key(r) == key(row)) {
            *existing = row.clone();
        } else {
            base.push(row.clone());
        }
    }
}

pub(crate) fn is_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Token count, then compact length.
fn specificity(key: &NormalizedKey) -> (usize, usize) {
    (key.tokens().count(), key.compact().len())
}

// ── Compiled forms ────────────────────────────────────────────────────

/// Normalized alias phrase → canonical country.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    map: HashMap<String, (String, usize)>,
    max_tokens: usize,
}

impl AliasTable {
    /// Every country name is an alias of itself. When two rows claim the same
    /// phrase the earlier row keeps it.
    pub fn build(defs: &[CountryAliasDef], normalizer: &Normalizer) -> Self {
        let mut table = Self::default();
        for (order, def) in defs.iter().enumerate() {
            let phrases = std::iter::once(&def.country).chain(def.aliases.iter());
            for phrase in phrases {
                let key = normalizer.normalize(phrase);
                if key.is_empty() {
                    continue;
                }
                table.max_tokens = table.max_tokens.max(key.tokens().count());
                table
                    .map
                    .entry(key.as_str().to_string())
                    .or_insert_with(|| (def.country.clone(), order));
            }
        }
        table
    }

    /// Country for a whole key.
    pub fn get(&self, key: &NormalizedKey) -> Option<&str> {
        self.map.get(key.as_str()).map(|(c, _)| c.as_str())
    }

    /// Find an alias phrase anywhere in `key`.
    ///
    /// Longer phrases are tried first. Among phrases of the same length the
    /// one declared earliest wins, then the leftmost. Returns the country and
    /// the matched phrase.
    pub fn scan(&self, key: &NormalizedKey) -> Option<(&str, String)> {
        let tokens: Vec<&str> = key.tokens().collect();
        let longest = self.max_tokens.min(tokens.len());
        for n in (1..=longest).rev() {
            let best = tokens
                .windows(n)
                .filter_map(|w| {
                    let phrase = w.join(" ");
                    self.map
                        .get(&phrase)
                        .map(|(country, order)| (*order, country.as_str(), phrase))
                })
                .min_by_key(|(order, _, _)| *order);
            if let Some((_, country, phrase)) = best {
                return Some((country, phrase));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityRule {
    pub keyword: NormalizedKey,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandRule {
    pub brand: NormalizedKey,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpgAlias {
    /// Stopword-preserving alias phrase.
    pub alias: NormalizedKey,
    /// Compact stopword-preserving target.
    pub target: String,
    /// Channel numbers named by the target ("1" for "tnt_sports_1_uk").
    pub numbers: Vec<String>,
}

impl EpgAlias {
    /// Whether the alias applies to a label in literal key form.
    ///
    /// A label that names a channel number the target does not carry is a
    /// different channel ("TNT Sports 3" is not "tnt_sports_1_uk").
    pub fn applies_to(&self, literal: &NormalizedKey) -> bool {
        literal.contains_phrase(&self.alias)
            && literal
                .tokens()
                .filter(|t| is_number(t))
                .all(|n| self.numbers.iter().any(|m| m == n))
    }
}
