use std::fmt;

use serde::Serialize;

/// Qualitative strength of a match. Ordered weakest to strongest, so
/// `Tier::Exact > Tier::Fuzzy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Fallback,
    Fuzzy,
    Substring,
    Alias,
    Exact,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Fuzzy => "fuzzy",
            Self::Substring => "substring",
            Self::Alias => "alias",
            Self::Exact => "exact",
        }
    }

    pub const ALL: &[Tier] = &[
        Self::Exact,
        Self::Alias,
        Self::Substring,
        Self::Fuzzy,
        Self::Fallback,
    ];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one resolution call.
///
/// `value` is `None` only for a fallback whose task has no default (the
/// guide id is omitted rather than guessed).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub value: Option<String>,
    pub tier: Tier,
    pub score: f64,
    /// Name of the cascade stage that produced the result.
    pub stage: &'static str,
}

impl MatchResult {
    pub fn resolved(value: impl Into<String>, tier: Tier, score: f64, stage: &'static str) -> Self {
        Self {
            value: Some(value.into()),
            tier,
            score: score.clamp(0.0, 1.0),
            stage,
        }
    }

    pub fn fallback(value: Option<String>) -> Self {
        Self {
            value,
            tier: Tier::Fallback,
            score: 0.0,
            stage: "fallback",
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.tier == Tier::Fallback
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}
