//! Logo asset resolution against an inventory of image files.

use crate::cascade::{Cascade, Hit, Strategy, Task};
use crate::catalog::CatalogIndex;
use crate::logo_cache::{CachedLogo, LogoCache};
use crate::models::{MatchResult, RawLabel, Tier};
use crate::normalize::{NormalizedKey, Normalizer};
use crate::similarity;

/// Minimum similarity for a fuzzy logo match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.70;

/// Asset used when no logo matches.
pub const DEFAULT_FALLBACK_PATH: &str = "./tv/logos/misc/24-7/circle1-247.png";

#[derive(Debug, Clone)]
struct LogoTables {
    normalizer: Normalizer,
    catalog: CatalogIndex,
    fuzzy_threshold: f64,
}

pub struct LogoContext<'a> {
    tables: &'a LogoTables,
    name_key: NormalizedKey,
    epg_id: Option<&'a str>,
    epg_key: Option<NormalizedKey>,
    cache: Option<&'a LogoCache>,
}

impl LogoContext<'_> {
    /// Lookup keys in preference order: guide id first, then the name.
    fn keys(&self) -> impl Iterator<Item = &NormalizedKey> {
        self.epg_key
            .iter()
            .chain(std::iter::once(&self.name_key))
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoStage {
    Cached,
    Exact,
    Substring,
    Fuzzy,
}

impl LogoStage {
    pub const ORDER: &[LogoStage] = &[Self::Cached, Self::Exact, Self::Substring, Self::Fuzzy];
}

impl<'a> Strategy<LogoContext<'a>> for LogoStage {
    fn name(&self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::Fuzzy => "fuzzy",
        }
    }

    fn attempt(&self, ctx: &LogoContext<'a>) -> Option<Hit> {
        let catalog = &ctx.tables.catalog;
        match self {
            Self::Cached => {
                let cached = ctx.cache?.get(ctx.epg_id?)?;
                let live = catalog.get_by_id(&cached.resolved_path).is_some();
                let same_name = ctx.tables.normalizer.normalize(&cached.display_name) == ctx.name_key;
                if live && same_name {
                    Some(Hit::certain(&cached.resolved_path, Tier::Alias))
                } else {
                    tracing::debug!(
                        epg_id = ctx.epg_id,
                        path = %cached.resolved_path,
                        "Stale logo cache entry"
                    );
                    None
                }
            }
            Self::Exact => ctx
                .keys()
                .find_map(|k| catalog.exact_lookup(k))
                .map(|e| Hit::certain(&e.canonical_id, Tier::Exact)),
            Self::Substring => ctx.keys().find_map(|k| {
                catalog.substring_lookup(k).map(|(e, matched)| {
                    Hit::new(&e.canonical_id, Tier::Substring, similarity::score(k, matched))
                })
            }),
            Self::Fuzzy => {
                let mut best: Option<(&str, f64)> = None;
                for key in ctx.keys() {
                    if let Some((entry, score)) = similarity::best_match(key, catalog.keyed_entries()) {
                        if best.map_or(true, |(_, b)| score > b) {
                            best = Some((entry.canonical_id.as_str(), score));
                        }
                    }
                }
                let (path, score) = best?;
                if score >= ctx.tables.fuzzy_threshold {
                    Some(Hit::new(path, Tier::Fuzzy, score))
                } else {
                    tracing::debug!(
                        best = path,
                        score,
                        threshold = ctx.tables.fuzzy_threshold,
                        "Fuzzy logo match below threshold"
                    );
                    None
                }
            }
        }
    }
}

/// Resolves a label (and optionally its guide id) to a logo path.
#[derive(Debug, Clone)]
pub struct LogoResolver {
    tables: LogoTables,
    cascade: Cascade<LogoStage>,
}

impl LogoResolver {
    pub fn new(
        catalog: CatalogIndex,
        normalizer: Normalizer,
        fuzzy_threshold: f64,
        fallback_path: impl Into<String>,
    ) -> Self {
        if catalog.is_empty() {
            tracing::warn!(catalog = catalog.name(), "Logo catalog is empty, every label gets the default logo");
        }
        Self {
            tables: LogoTables {
                normalizer,
                catalog,
                fuzzy_threshold,
            },
            cascade: Cascade::new(
                Task::Logo,
                LogoStage::ORDER.to_vec(),
                Some(fallback_path.into()),
            ),
        }
    }

    /// Resolve a logo.
    ///
    /// With both a guide id and a cache, a still-valid cached path is
    /// returned directly, and live matches are written back. A label that
    /// falls back drops any stale entry for its id.
    pub fn resolve(
        &self,
        label: &RawLabel,
        epg_id: Option<&str>,
        mut cache: Option<&mut LogoCache>,
    ) -> MatchResult {
        if self.tables.catalog.is_empty() {
            return MatchResult::fallback(self.cascade.fallback().map(str::to_string));
        }

        let display = label.display_name();
        let result = {
            let ctx = LogoContext {
                tables: &self.tables,
                name_key: self.tables.normalizer.normalize(&display),
                epg_id,
                epg_key: epg_id.map(|id| self.tables.normalizer.normalize(id)),
                cache: cache.as_deref(),
            };
            self.cascade.run(&ctx)
        };

        if let (Some(id), Some(cache)) = (epg_id, cache.as_deref_mut()) {
            match result.value() {
                Some(path) if !result.is_fallback() && result.stage != "cached" => {
                    cache.insert(
                        id,
                        CachedLogo {
                            display_name: display.into_owned(),
                            resolved_path: path.to_string(),
                        },
                    );
                }
                _ if result.is_fallback() => {
                    cache.remove(id);
                }
                _ => {}
            }
        }
        result
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.tables.catalog
    }
}
