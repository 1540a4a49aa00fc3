//! Guide channel id resolution against an EPG catalog.

use std::collections::HashMap;

use crate::cascade::{Cascade, Hit, Strategy, Task};
use crate::catalog::CatalogIndex;
use crate::models::{CatalogEntry, MatchResult, RawLabel, Tier, EPG_ID_ATTRIBUTES};
use crate::normalize::{NormalizedKey, Normalizer};
use crate::similarity;
use crate::tables::{EpgAlias, ResolverTables};

/// Minimum similarity for a fuzzy guide-id match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.72;

#[derive(Debug, Clone)]
struct EpgTables {
    normalizer: Normalizer,
    catalog: CatalogIndex,
    known: HashMap<NormalizedKey, String>,
    aliases: Vec<EpgAlias>,
    fuzzy_threshold: f64,
}

impl EpgTables {
    /// First entry in catalog order whose name or id contains `target`.
    fn find_alias_target(&self, target: &str) -> Option<&CatalogEntry> {
        self.catalog
            .all_entries()
            .iter()
            .find(|entry| entry.literal_forms.iter().any(|form| form.contains(target)))
    }
}

pub struct EpgContext<'a> {
    tables: &'a EpgTables,
    label: &'a RawLabel,
    key: NormalizedKey,
    /// The label with its stopwords kept, for alias phrases.
    literal: NormalizedKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpgStage {
    ExplicitId,
    KnownId,
    AliasOverride,
    Exact,
    Substring,
    Fuzzy,
}

impl EpgStage {
    pub const ORDER: &[EpgStage] = &[
        Self::ExplicitId,
        Self::KnownId,
        Self::AliasOverride,
        Self::Exact,
        Self::Substring,
        Self::Fuzzy,
    ];
}

impl<'a> Strategy<EpgContext<'a>> for EpgStage {
    fn name(&self) -> &'static str {
        match self {
            Self::ExplicitId => "attribute",
            Self::KnownId => "known",
            Self::AliasOverride => "alias",
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::Fuzzy => "fuzzy",
        }
    }

    fn attempt(&self, ctx: &EpgContext<'a>) -> Option<Hit> {
        let catalog = &ctx.tables.catalog;
        match self {
            Self::ExplicitId => {
                let id = ctx.label.attribute(EPG_ID_ATTRIBUTES)?;
                let entry = catalog.get_by_id(id);
                if entry.is_none() {
                    tracing::debug!(tvg_id = id, "Explicit guide id not in catalog");
                }
                entry.map(|e| Hit::certain(&e.canonical_id, Tier::Exact))
            }
            Self::KnownId => ctx
                .tables
                .known
                .get(&ctx.key)
                .map(|id| Hit::certain(id, Tier::Exact)),
            Self::AliasOverride => {
                // A label that already names a catalog channel keeps it.
                if catalog.exact_lookup(&ctx.key).is_some() {
                    return None;
                }
                ctx.tables
                    .aliases
                    .iter()
                    .filter(|a| a.applies_to(&ctx.literal))
                    .find_map(|a| ctx.tables.find_alias_target(&a.target))
                    .map(|e| Hit::certain(&e.canonical_id, Tier::Alias))
            }
            Self::Exact => catalog
                .exact_lookup(&ctx.key)
                .map(|e| Hit::certain(&e.canonical_id, Tier::Exact)),
            Self::Substring => catalog.substring_lookup(&ctx.key).map(|(e, matched)| {
                Hit::new(
                    &e.canonical_id,
                    Tier::Substring,
                    similarity::score(&ctx.key, matched),
                )
            }),
            Self::Fuzzy => {
                if ctx.key.is_empty() {
                    return None;
                }
                let (entry, score) = similarity::best_match(&ctx.key, catalog.keyed_entries())?;
                if score >= ctx.tables.fuzzy_threshold {
                    Some(Hit::new(&entry.canonical_id, Tier::Fuzzy, score))
                } else {
                    tracing::debug!(
                        best = %entry.canonical_id,
                        score,
                        threshold = ctx.tables.fuzzy_threshold,
                        "Fuzzy guide match below threshold"
                    );
                    None
                }
            }
        }
    }
}

/// Resolves a label to a canonical guide channel id.
///
/// The fallback carries no value: an unknown channel gets no id rather
/// than a guessed one.
#[derive(Debug, Clone)]
pub struct EpgResolver {
    tables: EpgTables,
    cascade: Cascade<EpgStage>,
}

impl EpgResolver {
    pub fn new(catalog: CatalogIndex, tables: &ResolverTables, fuzzy_threshold: f64) -> Self {
        let normalizer = tables.normalizer();
        if catalog.is_empty() {
            tracing::warn!(catalog = catalog.name(), "Guide catalog is empty, only pinned ids will be assigned");
        }
        Self {
            tables: EpgTables {
                known: tables.known_id_table(&normalizer),
                aliases: tables.epg_alias_rules(&normalizer),
                normalizer,
                catalog,
                fuzzy_threshold,
            },
            cascade: Cascade::new(Task::Epg, EpgStage::ORDER.to_vec(), None),
        }
    }

    pub fn resolve(&self, label: &RawLabel) -> MatchResult {
        let display = label.display_name();
        let ctx = EpgContext {
            tables: &self.tables,
            label,
            key: self.tables.normalizer.normalize(&display),
            literal: self.tables.normalizer.normalize_literal(&display),
        };
        self.cascade.run(&ctx)
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.tables.catalog
    }
}
