//! Country classification for channel labels.
//!
//! Stage order: explicit attribute → delimiter prefix → priority keyword →
//! alias phrase → uppercase country code → broadcaster brand → writing
//! script → fallback.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::cascade::{Cascade, Hit, Strategy, Task};
use crate::models::{MatchResult, RawLabel, Tier, COUNTRY_ATTRIBUTES};
use crate::normalize::{NormalizedKey, Normalizer};
use crate::tables::{AliasTable, BrandRule, PriorityRule, ResolverTables, ScriptDef};

/// Default value when nothing identifies a country.
pub const DEFAULT_FALLBACK: &str = "Unknown";

/// Text between a `|` separator and the next `-` or `:`.
static RE_DELIMITER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|\s*([^|:\-]+?)\s*[-:]").unwrap());

static RE_COUNTRY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2,3})\b").unwrap());

/// A code that leads into a separator, follows one, or ends the label.
static RE_ANCHORED_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Z]{2,3})\s*[|:\-]|[|:\-\[(]\s*([A-Z]{2,3})\b|\b([A-Z]{2,3})[\s)\]]*$").unwrap()
});

/// Compiled tables used by the country stages.
#[derive(Debug, Clone)]
struct CountryTables {
    normalizer: Normalizer,
    aliases: AliasTable,
    codes: HashMap<String, String>,
    priorities: Vec<PriorityRule>,
    brands: Vec<BrandRule>,
    scripts: Vec<ScriptDef>,
    delimiter_ignore: HashSet<NormalizedKey>,
}

/// Per-label state shared by all country stages.
pub struct CountryContext<'a> {
    tables: &'a CountryTables,
    label: &'a RawLabel,
    display: Cow<'a, str>,
    key: NormalizedKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryStage {
    ExplicitAttribute,
    DelimiterPrefix,
    PriorityOverride,
    AliasTokens,
    CountryCode,
    Brand,
    Script,
}

impl CountryStage {
    pub const ORDER: &[CountryStage] = &[
        Self::ExplicitAttribute,
        Self::DelimiterPrefix,
        Self::PriorityOverride,
        Self::AliasTokens,
        Self::CountryCode,
        Self::Brand,
        Self::Script,
    ];
}

impl<'a> Strategy<CountryContext<'a>> for CountryStage {
    fn name(&self) -> &'static str {
        match self {
            Self::ExplicitAttribute => "attribute",
            Self::DelimiterPrefix => "delimiter",
            Self::PriorityOverride => "priority",
            Self::AliasTokens => "alias",
            Self::CountryCode => "code",
            Self::Brand => "brand",
            Self::Script => "script",
        }
    }

    fn attempt(&self, ctx: &CountryContext<'a>) -> Option<Hit> {
        match self {
            Self::ExplicitAttribute => explicit_attribute(ctx),
            Self::DelimiterPrefix => delimiter_prefix(ctx),
            Self::PriorityOverride => ctx
                .tables
                .priorities
                .iter()
                .find(|rule| ctx.key.contains_phrase(&rule.keyword))
                .map(|rule| Hit::certain(&rule.country, Tier::Alias)),
            Self::AliasTokens => ctx
                .tables
                .aliases
                .scan(&ctx.key)
                .map(|(country, _)| Hit::certain(country, Tier::Alias)),
            Self::CountryCode => country_code(ctx),
            Self::Brand => ctx
                .tables
                .brands
                .iter()
                .find(|rule| ctx.key.contains_numbered_phrase(&rule.brand))
                .map(|rule| Hit::certain(&rule.country, Tier::Substring)),
            Self::Script => ctx
                .tables
                .scripts
                .iter()
                .find(|rule| rule.script.appears_in(ctx.label.name()))
                .map(|rule| Hit::new(&rule.region, Tier::Fuzzy, 0.5)),
        }
    }
}

// ── Stage helpers ─────────────────────────────────────────────────────

/// A known explicit attribute is authoritative. A value that is neither a
/// known country name, alias nor code is not trusted and the label text
/// decides.
fn explicit_attribute(ctx: &CountryContext<'_>) -> Option<Hit> {
    let value = ctx.label.attribute(COUNTRY_ATTRIBUTES)?;
    let key = ctx.tables.normalizer.normalize(value);
    if key.is_empty() {
        return None;
    }
    let country = ctx
        .tables
        .aliases
        .get(&key)
        .or_else(|| ctx.tables.codes.get(&value.trim().to_uppercase()).map(String::as_str));
    if country.is_none() {
        tracing::debug!(attribute = value, "Unrecognized country attribute");
    }
    country.map(|c| Hit::certain(c, Tier::Exact))
}

fn delimiter_prefix(ctx: &CountryContext<'_>) -> Option<Hit> {
    for caps in RE_DELIMITER_PREFIX.captures_iter(&ctx.display) {
        let Some(prefix) = caps.get(1) else { continue };
        let key = ctx.tables.normalizer.normalize(prefix.as_str());
        if key.is_empty() || ctx.tables.delimiter_ignore.contains(&key) {
            continue;
        }
        let country = ctx
            .tables
            .aliases
            .get(&key)
            .or_else(|| ctx.tables.aliases.scan(&key).map(|(c, _)| c));
        if let Some(country) = country {
            return Some(Hit::certain(country, Tier::Alias));
        }
    }
    None
}

/// In mixed-case labels any uppercase word may be a code. In all-caps
/// labels every short word looks like one, so only a code at the end of the
/// label or next to a separator counts ("FOX SPORTS MX", "UK: SKY").
fn country_code(ctx: &CountryContext<'_>) -> Option<Hit> {
    let display: &str = &ctx.display;
    let codes = &ctx.tables.codes;
    let mixed_case = display.chars().any(|c| c.is_lowercase());
    let re = if mixed_case {
        &*RE_COUNTRY_CODE
    } else {
        &*RE_ANCHORED_CODE
    };
    re.captures_iter(display)
        .filter_map(|caps| caps.iter().skip(1).flatten().next())
        .find_map(|m| codes.get(m.as_str()))
        .map(|country| Hit::certain(country, Tier::Alias))
}

/// Resolves a label to a country.
#[derive(Debug, Clone)]
pub struct CountryResolver {
    tables: CountryTables,
    cascade: Cascade<CountryStage>,
}

impl CountryResolver {
    pub fn new(tables: &ResolverTables, fallback: impl Into<String>) -> Self {
        let normalizer = tables.normalizer();
        let compiled = CountryTables {
            aliases: tables.alias_table(&normalizer),
            codes: tables.country_code_table(),
            priorities: tables.priority_rules(&normalizer),
            brands: tables.brand_rules(&normalizer),
            scripts: tables.scripts.clone(),
            delimiter_ignore: tables.delimiter_ignore_set(&normalizer),
            normalizer,
        };
        Self {
            tables: compiled,
            cascade: Cascade::new(
                Task::Country,
                CountryStage::ORDER.to_vec(),
                Some(fallback.into()),
            ),
        }
    }

    pub fn resolve(&self, label: &RawLabel) -> MatchResult {
        let display = label.display_name();
        let key = self.tables.normalizer.normalize(&display);
        let ctx = CountryContext {
            tables: &self.tables,
            label,
            display,
            key,
        };
        self.cascade.run(&ctx)
    }

    pub fn fallback(&self) -> &str {
        self.cascade.fallback().unwrap_or(DEFAULT_FALLBACK)
    }
}

impl Default for CountryResolver {
    fn default() -> Self {
        Self::new(&ResolverTables::embedded(), DEFAULT_FALLBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str) -> MatchResult {
        CountryResolver::default().resolve(&RawLabel::new(name))
    }

    fn country(name: &str) -> String {
        resolve(name).value.unwrap()
    }

    #[test]
    fn explicit_attribute_always_wins() {
        let resolver = CountryResolver::default();
        let label = RawLabel::new("ESPN Argentina").with_attribute("tvg-country", "Japan");
        let r = resolver.resolve(&label);
        assert_eq!(r.value(), Some("Japan"));
        assert_eq!(r.tier, Tier::Exact);
        assert_eq!(r.stage, "attribute");
    }

    #[test]
    fn explicit_attribute_maps_codes_and_aliases() {
        let resolver = CountryResolver::default();
        let by_code = RawLabel::new("x").with_attribute("country", "gb");
        assert_eq!(resolver.resolve(&by_code).value(), Some("UK"));
        let by_alias = RawLabel::new("x").with_attribute("country", "España");
        assert_eq!(resolver.resolve(&by_alias).value(), Some("Spain"));
    }

    #[test]
    fn unusable_attribute_falls_through() {
        let resolver = CountryResolver::default();
        let garbage = RawLabel::new("ESPN").with_attribute("country", "---");
        let r = resolver.resolve(&garbage);
        assert_eq!(r.value(), Some("USA"));
        assert_eq!(r.stage, "brand");

        let unknown = RawLabel::new("Fuji TV").with_attribute("country", "Atlantis");
        let r = resolver.resolve(&unknown);
        assert_eq!(r.value(), Some("Japan"));
        assert_ne!(r.stage, "attribute");

        let empty = RawLabel::new("???").with_attribute("tvg-country", "");
        assert!(resolver.resolve(&empty).is_fallback());
    }

    #[test]
    fn delimiter_prefix() {
        let r = resolve("DLHD | Japan - Fuji TV");
        assert_eq!(r.value(), Some("Japan"));
        assert_eq!(r.stage, "delimiter");
    }

    #[test]
    fn delimiter_prefix_ignores_source_names() {
        // "Live Events" is skipped, the brand decides.
        let r = resolve("24/7 | Live Events - Sky Calcio 1");
        assert_eq!(r.value(), Some("Italy"));
        assert_eq!(r.stage, "brand");
    }

    #[test]
    fn priority_beats_brand() {
        let r = resolve("ESPN Argentina");
        assert_eq!(r.value(), Some("Argentina"));
        assert_eq!(r.stage, "priority");
        assert_eq!(country("Fox Sports Mexico HD"), "Mexico");
    }

    #[test]
    fn priority_requires_whole_words() {
        // "uk" must not fire inside "ukraine".
        assert_eq!(country("Ukraine 24"), "Ukraine");
    }

    #[test]
    fn alias_phrase() {
        let r = resolve("Canal Deportes Espana");
        assert_eq!(r.value(), Some("Spain"));
        assert_eq!(r.stage, "alias");
        assert_eq!(country("Sky Sport United States"), "USA");
    }

    #[test]
    fn country_code_in_mixed_case() {
        let r = resolve("Sportitalia ES");
        assert_eq!(r.value(), Some("Spain"));
        assert_eq!(r.stage, "code");
    }

    #[test]
    fn country_code_in_all_caps_needs_an_anchor() {
        let r = resolve("FOX SPORTS MX");
        assert_eq!(r.value(), Some("Mexico"));
        assert_eq!(r.stage, "code");
        assert_eq!(country("SPORTITALIA ES"), "Spain");
        assert_eq!(country("ARENA | RS: SPORT 1"), "Serbia");
        // A short word in the middle of an all-caps label is not a code.
        assert_eq!(resolve("SPORTITALIA ES LIVE").value(), Some("Unknown"));
    }

    #[test]
    fn user_codes_extend_the_table() {
        let mut tables = ResolverTables::embedded();
        let user = ResolverTables::from_toml("[[country_code]]\ncode = \"LU\"\ncountry = \"Luxembourg\"\n")
            .unwrap();
        tables.merge_user(&user);
        let resolver = CountryResolver::new(&tables, DEFAULT_FALLBACK);
        let r = resolver.resolve(&RawLabel::new("Sportitalia LU"));
        assert_eq!(r.value(), Some("Luxembourg"));
        assert_eq!(r.stage, "code");
    }

    #[test]
    fn brand() {
        let r = resolve("ESPN2");
        assert_eq!(r.value(), Some("USA"));
        assert_eq!(r.tier, Tier::Substring);
        assert_eq!(country("Foxtel Footy"), "Australia");
        assert_eq!(country("Sky Sports Main Event HD"), "UK");
        assert_eq!(country("Sky Calcio 251"), "Italy");
        assert_eq!(country("TF1 Series Films"), "France");
    }

    #[test]
    fn brand_does_not_fire_inside_words() {
        for name in ["Rainbow TV", "Being Human", "Starhub Sports", "Cnnect Live", "Espnx"] {
            let r = resolve(name);
            assert!(r.is_fallback(), "{name:?} resolved to {:?} via {}", r.value(), r.stage);
        }
    }

    #[test]
    fn script_heuristic() {
        let r = resolve("フジテレビ");
        assert_eq!(r.value(), Some("Japan"));
        assert_eq!(r.tier, Tier::Fuzzy);
        assert_eq!(country("Матч ТВ"), "Russia");
        assert_eq!(country("KBS 스포츠"), "South Korea");
    }

    #[test]
    fn fallback_sentinel() {
        let r = resolve("Random Stream 7");
        assert!(r.is_fallback());
        assert_eq!(r.value(), Some("Unknown"));
        assert!(resolve("").is_fallback());
    }

    #[test]
    fn custom_fallback() {
        let resolver = CountryResolver::new(&ResolverTables::embedded(), "Other");
        assert_eq!(resolver.resolve(&RawLabel::new("???")).value(), Some("Other"));
        assert_eq!(resolver.fallback(), "Other");
    }

    #[test]
    fn deterministic() {
        let resolver = CountryResolver::default();
        let label = RawLabel::new("beIN Sports MENA 1");
        let first = resolver.resolve(&label);
        for _ in 0..10 {
            assert_eq!(resolver.resolve(&label), first);
        }
    }
}
