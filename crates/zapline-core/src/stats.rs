use serde::Serialize;

use crate::cascade::Task;
use crate::models::{MatchResult, Tier};

/// Per-tier result counters for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub exact: u64,
    pub alias: u64,
    pub substring: u64,
    pub fuzzy: u64,
    pub fallback: u64,
}

impl TierCounts {
    pub fn record(&mut self, tier: Tier) {
        match tier {
            Tier::Exact => self.exact += 1,
            Tier::Alias => self.alias += 1,
            Tier::Substring => self.substring += 1,
            Tier::Fuzzy => self.fuzzy += 1,
            Tier::Fallback => self.fallback += 1,
        }
    }

    pub fn matched(&self) -> u64 {
        self.exact + self.alias + self.substring + self.fuzzy
    }

    pub fn total(&self) -> u64 {
        self.matched() + self.fallback
    }
}

/// Resolution counters for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub labels: u64,
    pub country: TierCounts,
    pub epg: TierCounts,
    pub logo: TierCounts,
    pub logo_cache_hits: u64,
}

impl ResolveStats {
    pub fn record(&mut self, task: Task, result: &MatchResult) {
        match task {
            Task::Country => self.country.record(result.tier),
            Task::Epg => self.epg.record(result.tier),
            Task::Logo => {
                self.logo.record(result.tier);
                if result.stage == "cached" {
                    self.logo_cache_hits += 1;
                }
            }
        }
    }

    pub fn for_task(&self, task: Task) -> &TierCounts {
        match task {
            Task::Country => &self.country,
            Task::Epg => &self.epg,
            Task::Logo => &self.logo,
        }
    }

    /// Emit one summary line per task that saw any labels.
    pub fn log_summary(&self) {
        for &task in Task::ALL {
            let counts = self.for_task(task);
            if counts.total() == 0 {
                continue;
            }
            tracing::info!(
                task = %task,
                matched = counts.matched(),
                exact = counts.exact,
                alias = counts.alias,
                substring = counts.substring,
                fuzzy = counts.fuzzy,
                fallback = counts.fallback,
                "Resolution summary"
            );
        }
    }
}
