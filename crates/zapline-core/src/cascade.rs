//! Generic ordered-strategy runner shared by the country, guide-id and logo
//! resolvers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{MatchResult, Tier};

/// The three resolution tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Country,
    Epg,
    Logo,
}

impl Task {
    pub const ALL: &[Task] = &[Self::Country, Self::Epg, Self::Logo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Epg => "epg",
            Self::Logo => "logo",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "country" => Ok(Self::Country),
            "epg" => Ok(Self::Epg),
            "logo" => Ok(Self::Logo),
            other => Err(format!("unknown task '{other}' (expected country, epg or logo)")),
        }
    }
}

/// A successful stage outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub value: String,
    pub tier: Tier,
    pub score: f64,
}

impl Hit {
    pub fn new(value: impl Into<String>, tier: Tier, score: f64) -> Self {
        Self {
            value: value.into(),
            tier,
            score,
        }
    }

    /// A deterministic hit with full confidence.
    pub fn certain(value: impl Into<String>, tier: Tier) -> Self {
        Self::new(value, tier, 1.0)
    }
}

/// One step of a cascade, evaluated against a per-label context `C`.
pub trait Strategy<C: ?Sized> {
    fn name(&self) -> &'static str;

    /// `None` hands the label to the next stage.
    fn attempt(&self, ctx: &C) -> Option<Hit>;
}

/// Runs stages in order and stops at the first hit.
///
/// When every stage passes, the result is the configured fallback. The run is
/// total: every label gets a result.
#[derive(Debug, Clone)]
pub struct Cascade<S> {
    task: Task,
    stages: Vec<S>,
    fallback: Option<String>,
}

impl<S> Cascade<S> {
    pub fn new(task: Task, stages: Vec<S>, fallback: Option<String>) -> Self {
        Self {
            task,
            stages,
            fallback,
        }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn stages(&self) -> &[S] {
        &self.stages
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    pub fn run<C: ?Sized>(&self, ctx: &C) -> MatchResult
    where
        S: Strategy<C>,
    {
        for stage in &self.stages {
            if let Some(hit) = stage.attempt(ctx) {
                tracing::debug!(
                    task = %self.task,
                    stage = stage.name(),
                    value = %hit.value,
                    tier = %hit.tier,
                    score = hit.score,
                    "Resolved"
                );
                return MatchResult::resolved(hit.value, hit.tier, hit.score, stage.name());
            }
        }
        tracing::debug!(task = %self.task, fallback = ?self.fallback, "No match");
        MatchResult::fallback(self.fallback.clone())
    }
}
