//! Six-level label normalization for channel matching.
//!
//! Turns a free-text channel label into a [`NormalizedKey`]: lowercase ASCII
//! tokens separated by single spaces, with generic broadcast words removed.
//! Two labels are treated as the same channel name exactly when their keys
//! are equal.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Generic broadcast-industry words removed as whole tokens.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "hd",
    "channel",
    "network",
    "sports",
    "the",
    "international",
    "premium",
    "extra",
    "fhd",
    "uhd",
];

static DEFAULT_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::default);

/// A comparison-ready channel name.
///
/// Only produced by [`Normalizer::normalize`], so every key upholds the
/// normalization invariants: lowercase ASCII alphanumeric tokens joined by
/// single spaces, no leading or trailing whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|t| !t.is_empty())
    }

    /// The key with token boundaries removed ("bbc one" → "bbcone").
    pub fn compact(&self) -> String {
        self.0.replace(' ', "")
    }

    /// Whether `phrase` occurs as a whole run of tokens.
    ///
    /// "espn argentina" contains "argentina" but "ukraine" does not contain "uk".
    pub fn contains_phrase(&self, phrase: &NormalizedKey) -> bool {
        if phrase.is_empty() || self.is_empty() {
            return false;
        }
        format!(" {} ", self.0).contains(&format!(" {} ", phrase.0))
    }

    /// Whether `phrase` occurs as whole tokens, except that its last token
    /// may carry a channel number.
    ///
    /// "espn2 usa" contains "espn"; "starhub" does not contain "star".
    pub fn contains_numbered_phrase(&self, phrase: &NormalizedKey) -> bool {
        let wanted: Vec<&str> = phrase.tokens().collect();
        let Some((last, head)) = wanted.split_last() else {
            return false;
        };
        let tokens: Vec<&str> = self.tokens().collect();
        tokens.windows(wanted.len()).any(|window| {
            let n = window.len() - 1;
            window[..n] == *head
                && window[n]
                    .strip_prefix(*last)
                    .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
        })
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizer with a configurable stopword set.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: HashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS.iter().copied())
    }
}

impl Normalizer {
    /// Build a normalizer from stopwords. Each stopword is itself folded and
    /// lowercased; entries that are not a single alphanumeric token are dropped
    /// since they could never match a token.
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stopwords = stopwords
            .into_iter()
            .map(|w| fold_diacritics(w.as_ref()).to_lowercase())
            .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_alphanumeric()))
            .collect();
        Self { stopwords }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Apply the full pipeline.
    ///
    /// Levels applied in order:
    /// 1. Unicode decomposition + combining-mark removal
    /// 2. Lowercase
    /// 3. Symbol synonyms (`&` → and, `+` → plus)
    /// 4. Whole-token stopword removal
    /// 5. Punctuation erasure
    /// 6. Whitespace collapse
    pub fn normalize(&self, raw: &str) -> NormalizedKey {
        let s = fold_diacritics(raw);
        let s = s.to_lowercase();
        let s = substitute_symbols(&s);
        let tokens = split_tokens(&s);
        let kept = self.remove_stopwords(tokens);
        NormalizedKey(collapse_tokens(&kept))
    }

    /// The pipeline without stopword removal.
    ///
    /// Override phrases are matched on this form so that a stopword such as
    /// "sports" still tells "tnt sports" apart from "tnt".
    pub fn normalize_literal(&self, raw: &str) -> NormalizedKey {
        let s = fold_diacritics(raw);
        let s = s.to_lowercase();
        let s = substitute_symbols(&s);
        NormalizedKey(collapse_tokens(&split_tokens(&s)))
    }

    // ── Level 4: Stop word removal ────────────────────────────────────

    /// Drop stopword tokens, unless that would leave nothing: a label made of
    /// stopwords only ("HD") keeps its tokens.
    fn remove_stopwords<'a>(&self, tokens: Vec<&'a str>) -> Vec<&'a str> {
        let kept: Vec<&str> = tokens
            .iter()
            .copied()
            .filter(|t| !self.stopwords.contains(*t))
            .collect();
        if kept.is_empty() {
            tokens
        } else {
            kept
        }
    }
}

/// Normalize with the built-in stopword set.
pub fn normalize(raw: &str) -> NormalizedKey {
    DEFAULT_NORMALIZER.normalize(raw)
}

// ── Level 1: Diacritic folding ────────────────────────────────────────

/// NFKD-decompose, drop combining marks, and transliterate the Latin letters
/// that have no decomposition ("ø", "ß", "æ").
fn fold_diacritics(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.nfkd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ß' => result.push_str("ss"),
            'æ' => result.push_str("ae"),
            'Æ' => result.push_str("AE"),
            'œ' => result.push_str("oe"),
            'Œ' => result.push_str("OE"),
            'ø' => result.push('o'),
            'Ø' => result.push('O'),
            'đ' | 'ð' => result.push('d'),
            'Đ' | 'Ð' => result.push('D'),
            'ł' => result.push('l'),
            'Ł' => result.push('L'),
            'þ' => result.push_str("th"),
            'Þ' => result.push_str("TH"),
            'ı' => result.push('i'),
            c => result.push(c),
        }
    }
    result
}

// ── Level 3: Symbol synonyms ──────────────────────────────────────────

/// Spell out `&` and `+`, and elide apostrophes so "fox's" stays one token.
fn substitute_symbols(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => result.push_str(" and "),
            '+' => result.push_str(" plus "),
            '\'' | '\u{2019}' | '\u{2018}' | '\u{02BC}' => {}
            c => result.push(c),
        }
    }
    result
}

// ── Level 5: Punctuation erasure ──────────────────────────────────────

/// Split on everything that is not an ASCII letter or digit. Punctuation and
/// any non-Latin residue act as separators and disappear here.
fn split_tokens(s: &str) -> Vec<&str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

// ── Level 6: Whitespace collapse ──────────────────────────────────────

fn collapse_tokens(tokens: &[&str]) -> String {
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Level 1 ───────────────────────────────────────────────────────

    #[test]
    fn strips_accents() {
        assert_eq!(fold_diacritics("Télé Québec"), "Tele Quebec");
        assert_eq!(fold_diacritics("España"), "Espana");
    }

    #[test]
    fn transliterates_undecomposable_letters() {
        assert_eq!(fold_diacritics("Øresund"), "Oresund");
        assert_eq!(fold_diacritics("Straße"), "Strasse");
        assert_eq!(fold_diacritics("Łódź"), "Lodz");
    }

    #[test]
    fn fullwidth_folds_to_ascii() {
        assert_eq!(normalize("ＥＳＰＮ"), normalize("ESPN"));
    }

    // ── Level 3 ───────────────────────────────────────────────────────

    #[test]
    fn ampersand_and_plus() {
        assert_eq!(normalize("AT&T SportsNet").as_str(), "at and t sportsnet");
        assert_eq!(normalize("Canal+").as_str(), "canal plus");
        assert_eq!(normalize("Sky Sports+").as_str(), "sky plus");
    }

    #[test]
    fn apostrophe_elided() {
        assert_eq!(normalize("Fox's Choice").as_str(), "foxs choice");
    }

    // ── Level 4 ───────────────────────────────────────────────────────

    #[test]
    fn stopwords_removed_as_whole_tokens() {
        assert_eq!(normalize("Sky Sports Main Event HD").as_str(), "sky main event");
        assert_eq!(normalize("The History Channel").as_str(), "history");
    }

    #[test]
    fn stopwords_not_removed_inside_words() {
        // "hd" inside "hdnet", "the" inside "theater", "sports" inside "sportsnet".
        assert_eq!(normalize("HDNet Theater").as_str(), "hdnet theater");
        assert_eq!(normalize("Sportsnet One").as_str(), "sportsnet one");
        assert_eq!(normalize("Sat 1").as_str(), "sat 1");
    }

    #[test]
    fn label_of_only_stopwords_survives() {
        assert_eq!(normalize("HD").as_str(), "hd");
        assert_eq!(normalize("The Network").as_str(), "the network");
    }

    #[test]
    fn custom_stopwords() {
        let normalizer = Normalizer::new(["tv", "Télé"]);
        assert_eq!(normalizer.normalize("Fuji TV").as_str(), "fuji");
        assert_eq!(normalizer.normalize("Télé Québec").as_str(), "quebec");
        // "hd" is no longer a stopword for this normalizer.
        assert_eq!(normalizer.normalize("Fuji HD").as_str(), "fuji hd");
    }

    // ── Level 5/6 ─────────────────────────────────────────────────────

    #[test]
    fn punctuation_separates_tokens() {
        assert_eq!(
            normalize("sky-sports-main-event-uk").as_str(),
            "sky main event uk"
        );
        assert_eq!(normalize("DLHD | Japan - Fuji TV").as_str(), "dlhd japan fuji tv");
    }

    #[test]
    fn collapse_spaces() {
        assert_eq!(normalize("  BBC    One  ").as_str(), "bbc one");
    }

    // ── Full pipeline ─────────────────────────────────────────────────

    #[test]
    fn empty_and_garbage_yield_empty_key() {
        assert!(normalize("").is_empty());
        assert!(normalize("---").is_empty());
        assert!(normalize("قناة").is_empty());
    }

    #[test]
    fn idempotent() {
        let samples = [
            "Sky Sports Main Event HD",
            "ESPN Argentina",
            "DLHD | Japan - Fuji TV",
            "Canal+ Sport",
            "HD",
            "The Network",
            "Télé-Québec (2)",
            "AT&T SportsNet",
            "ＦＯＸ ＳＰＯＲＴＳ",
            "",
            "   ",
            "beIN.Sports MENA 1",
        ];
        for s in samples {
            let once = normalize(s);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn phrase_containment_respects_tokens() {
        let key = normalize("ESPN Argentina");
        assert!(key.contains_phrase(&normalize("argentina")));
        assert!(!key.contains_phrase(&normalize("arg")));
        assert!(!normalize("Ukraine 24").contains_phrase(&normalize("uk")));
    }

    #[test]
    fn numbered_phrase_allows_only_a_digit_suffix() {
        let key = normalize("ESPN2 USA");
        assert!(key.contains_numbered_phrase(&normalize("espn")));
        assert!(key.contains_numbered_phrase(&normalize("usa")));
        assert!(!key.contains_numbered_phrase(&normalize("spn")));
        assert!(normalize("Sky Calcio 251").contains_numbered_phrase(&normalize("sky calcio")));
        assert!(normalize("TF1 Series").contains_numbered_phrase(&normalize("tf")));
        assert!(!normalize("Starhub Sports").contains_numbered_phrase(&normalize("star")));
        assert!(!normalize("Rainbow TV").contains_numbered_phrase(&normalize("rai")));
        assert!(!normalize("Being Human").contains_numbered_phrase(&normalize("bein")));
        assert!(!normalize("Sky").contains_numbered_phrase(&normalize("sky calcio")));
    }

    #[test]
    fn literal_keeps_stopwords() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.normalize_literal("TNT Sports 2 UK").as_str(), "tnt sports 2 uk");
        assert_eq!(normalizer.normalize_literal("Sky Sports+").as_str(), "sky sports plus");
        assert_eq!(normalizer.normalize_literal("tnt_sports_1_uk").as_str(), "tnt sports 1 uk");
        assert!(normalizer.normalize_literal("---").is_empty());
    }

    #[test]
    fn compact_drops_boundaries() {
        assert_eq!(normalize("BBC One").compact(), "bbcone");
    }
}
