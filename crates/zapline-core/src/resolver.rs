use rayon::prelude::*;
use serde::Serialize;

use crate::cascade::Task;
use crate::catalog::CatalogIndex;
use crate::config::AppConfig;
use crate::country::CountryResolver;
use crate::epg::EpgResolver;
use crate::logo::LogoResolver;
use crate::logo_cache::LogoCache;
use crate::models::{CatalogRecord, MatchResult, RawLabel, EPG_ID_ATTRIBUTES};
use crate::stats::ResolveStats;
use crate::tables::ResolverTables;

/// Which tasks to run for each label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tasks {
    pub country: bool,
    pub epg: bool,
    pub logo: bool,
}

impl Tasks {
    pub fn all() -> Self {
        Self {
            country: true,
            epg: true,
            logo: true,
        }
    }

    pub fn from_list(tasks: &[Task]) -> Self {
        Self {
            country: tasks.contains(&Task::Country),
            epg: tasks.contains(&Task::Epg),
            logo: tasks.contains(&Task::Logo),
        }
    }
}

impl Default for Tasks {
    fn default() -> Self {
        Self::all()
    }
}

/// All requested annotations for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedChannel {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epg: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<MatchResult>,
}

/// Entry point over the three resolution tasks.
///
/// Holds only read-only state, so one resolver can serve any number of
/// labels in parallel. The logo cache is passed in by the caller.
#[derive(Debug, Clone)]
pub struct Resolver {
    country: CountryResolver,
    epg: EpgResolver,
    logo: LogoResolver,
}

impl Resolver {
    pub fn new(
        config: &AppConfig,
        tables: &ResolverTables,
        epg_records: Vec<CatalogRecord>,
        logo_records: Vec<CatalogRecord>,
    ) -> Self {
        let normalizer = tables.normalizer();
        let epg_catalog =
            CatalogIndex::build("epg", epg_records, &normalizer, config.epg.min_substring_len);
        let logo_catalog =
            CatalogIndex::build("logo", logo_records, &normalizer, config.logo.min_substring_len);

        Self {
            country: CountryResolver::new(tables, config.country.fallback.clone()),
            epg: EpgResolver::new(epg_catalog, tables, config.epg.fuzzy_threshold),
            logo: LogoResolver::new(
                logo_catalog,
                normalizer,
                config.logo.fuzzy_threshold,
                config.logo.fallback_path.clone(),
            ),
        }
    }

    pub fn resolve_country(&self, label: &RawLabel) -> MatchResult {
        self.country.resolve(label)
    }

    pub fn resolve_epg(&self, label: &RawLabel) -> MatchResult {
        self.epg.resolve(label)
    }

    pub fn resolve_logo(
        &self,
        label: &RawLabel,
        epg_id: Option<&str>,
        cache: Option<&mut LogoCache>,
    ) -> MatchResult {
        self.logo.resolve(label, epg_id, cache)
    }

    /// Run the requested tasks for one label.
    ///
    /// The logo lookup uses the resolved guide id when there is one, else
    /// the label's own `tvg-id`.
    #[tracing::instrument(name = "resolve", skip(self, label, cache), fields(label = %label.name()))]
    pub fn resolve(
        &self,
        label: &RawLabel,
        tasks: Tasks,
        cache: Option<&mut LogoCache>,
    ) -> ResolvedChannel {
        let mut channel = self.resolve_textual(label, tasks);
        if tasks.logo {
            channel.logo = Some(self.logo_for(label, channel.epg.as_ref(), cache));
        }
        channel
    }

    /// Resolve a batch, preserving input order.
    ///
    /// Country and guide-id resolution run in parallel. Logo resolution joins
    /// the parallel phase when there is no cache; with a cache it runs as a
    /// sequential pass afterwards.
    pub fn resolve_all(
        &self,
        labels: &[RawLabel],
        tasks: Tasks,
        mut cache: Option<&mut LogoCache>,
    ) -> (Vec<ResolvedChannel>, ResolveStats) {
        let parallel_logo = tasks.logo && cache.is_none();
        let mut channels: Vec<ResolvedChannel> = labels
            .par_iter()
            .map(|label| {
                let mut channel = self.resolve_textual(label, tasks);
                if parallel_logo {
                    channel.logo = Some(self.logo_for(label, channel.epg.as_ref(), None));
                }
                channel
            })
            .collect();

        if tasks.logo && !parallel_logo {
            for (label, channel) in labels.iter().zip(channels.iter_mut()) {
                channel.logo = Some(self.logo_for(label, channel.epg.as_ref(), cache.as_deref_mut()));
            }
        }

        let mut stats = ResolveStats {
            labels: channels.len() as u64,
            ..ResolveStats::default()
        };
        for channel in &channels {
            let results = [
                (Task::Country, &channel.country),
                (Task::Epg, &channel.epg),
                (Task::Logo, &channel.logo),
            ];
            for (task, result) in results {
                if let Some(result) = result {
                    stats.record(task, result);
                }
            }
        }
        (channels, stats)
    }

    pub fn epg_catalog(&self) -> &CatalogIndex {
        self.epg.catalog()
    }

    pub fn logo_catalog(&self) -> &CatalogIndex {
        self.logo.catalog()
    }

    fn resolve_textual(&self, label: &RawLabel, tasks: Tasks) -> ResolvedChannel {
        ResolvedChannel {
            name: label.name().to_string(),
            country: tasks.country.then(|| self.country.resolve(label)),
            epg: tasks.epg.then(|| self.epg.resolve(label)),
            logo: None,
        }
    }

    fn logo_for(
        &self,
        label: &RawLabel,
        epg: Option<&MatchResult>,
        cache: Option<&mut LogoCache>,
    ) -> MatchResult {
        let epg_id = epg
            .filter(|r| !r.is_fallback())
            .and_then(|r| r.value())
            .or_else(|| label.attribute(EPG_ID_ATTRIBUTES));
        self.logo.resolve(label, epg_id, cache)
    }
}
