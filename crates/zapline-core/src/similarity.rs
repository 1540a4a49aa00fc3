//! Bounded string similarity for the last-resort fuzzy stage.

use phf::{phf_map, phf_set};

use crate::normalize::NormalizedKey;

/// Number words folded to digits when they are a whole token.
static NUMBER_WORDS: phf::Map<&'static str, &'static str> = phf_map! {
    "one" => "1",
    "two" => "2",
    "three" => "3",
    "four" => "4",
    "five" => "5",
    "six" => "6",
    "seven" => "7",
    "eight" => "8",
    "nine" => "9",
    "ten" => "10",
};

/// Number words that channel brands glue onto their name ("bbcone",
/// "foxsportsone").
const GLUED_NUMBER_WORDS: &[(&str, &str)] = &[("one", "1"), ("two", "2")];

/// Ordinary words ending in a glued number word.
static GLUED_EXCEPTIONS: phf::Set<&'static str> = phf_set! {
    "anyone", "everyone", "someone", "noone",
    "iphone", "phone", "cellphone", "smartphone", "telephone", "headphone",
    "earphone", "microphone", "megaphone", "saxophone", "xylophone",
    "backbone", "trombone", "cyclone", "hormone", "silicone", "throne",
    "milestone", "keystone", "capstone", "limestone", "sandstone",
    "cornerstone", "ringtone", "overtone", "undertone",
    "condone", "postpone", "undone", "outdone",
};

/// A glued number word only folds when at least this much remains before
/// it ("bbcone" folds, "ozone" does not).
const MIN_GLUED_PREFIX: usize = 3;

/// Similarity of two keys in `[0, 1]`.
///
/// Symmetric, with `score(a, a) == 1`. Two empty keys are identical; an
/// empty key shares nothing with a non-empty one.
pub fn score(a: &NormalizedKey, b: &NormalizedKey) -> f64 {
    score_str(a.as_str(), b.as_str())
}

/// [`score`] over raw strings already in key form.
pub fn score_str(a: &str, b: &str) -> f64 {
    let a = comparable(a);
    let b = comparable(b);
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        _ if a == b => 1.0,
        _ => strsim::normalized_levenshtein(&a, &b),
    }
}

/// Fold number words and drop token boundaries.
fn comparable(s: &str) -> String {
    s.split_whitespace().map(fold_numbers).collect()
}

/// Replace a number word that is a whole token with its digits. "one" and
/// "two" also fold when glued to the end of a brand.
pub fn fold_numbers(token: &str) -> String {
    if let Some(digits) = NUMBER_WORDS.get(token) {
        return (*digits).to_string();
    }
    if GLUED_EXCEPTIONS.contains(token) {
        return token.to_string();
    }
    for (word, digits) in GLUED_NUMBER_WORDS {
        if let Some(prefix) = token.strip_suffix(word) {
            if prefix.len() >= MIN_GLUED_PREFIX {
                return format!("{prefix}{digits}");
            }
        }
    }
    token.to_string()
}

/// Highest-scoring candidate for `query`, with its score.
///
/// Candidates are scanned in the given order and only a strictly higher
/// score replaces the current best, so ties go to the earliest candidate.
pub fn best_match<'a, T, I>(query: &NormalizedKey, candidates: I) -> Option<(&'a T, f64)>
where
    T: ?Sized,
    I: IntoIterator<Item = (&'a T, &'a NormalizedKey)>,
{
    let mut best: Option<(&'a T, f64)> = None;
    for (item, key) in candidates {
        let s = score(query, key);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((item, s));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn identity_and_empty() {
        assert_eq!(score_str("sky main event", "sky main event"), 1.0);
        assert_eq!(score_str("", ""), 1.0);
        assert_eq!(score_str("", "bbc"), 0.0);
        assert_eq!(score_str("bbc", ""), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            ("fox 1", "foxsports1"),
            ("bbc one", "hbo"),
            ("sky main event", "sky premier league"),
            ("espn", "espn 2"),
        ];
        for (a, b) in pairs {
            assert_eq!(score_str(a, b), score_str(b, a), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn number_words_bring_variants_together() {
        assert!(score_str("foxsportsone", "foxsports1") > 0.85);
        assert_eq!(score(&normalize("BBC One"), &normalize("BBC1")), 1.0);
    }

    #[test]
    fn unrelated_names_score_low() {
        assert!(score_str("bbcone", "hbo") < 0.5);
    }

    #[test]
    fn bounded() {
        for (a, b) in [("a", "zzzzzzzz"), ("abc", "abd"), ("x", "x")] {
            let s = score_str(a, b);
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn fold_numbers_only_at_token_end() {
        assert_eq!(fold_numbers("one"), "1");
        assert_eq!(fold_numbers("bbcone"), "bbc1");
        assert_eq!(fold_numbers("tvtwo"), "tv2");
        assert_eq!(fold_numbers("phone"), "phone");
        assert_eq!(fold_numbers("onetime"), "onetime");
        assert_eq!(fold_numbers("ten"), "10");
    }

    #[test]
    fn ordinary_words_are_not_folded() {
        for word in ["listen", "iphone", "someone", "eleven", "often", "seventy", "throne"] {
            assert_eq!(fold_numbers(word), word);
        }
        assert!(score_str("iphone", "iph1") < 1.0);
        assert!(score_str("listen", "lis10") < 1.0);
    }

    #[test]
    fn best_match_first_wins_ties() {
        let a = normalize("Alpha TV");
        let b = normalize("Alpha FM");
        let query = normalize("Alpha XY");
        let candidates = [("a", &a), ("b", &b)];
        let (hit, s) = best_match(&query, candidates.iter().map(|(n, k)| (*n, *k))).unwrap();
        assert_eq!(hit, "a");
        assert!(s > 0.5);
    }

    #[test]
    fn best_match_empty() {
        let query = normalize("anything");
        let none: Vec<(&str, &NormalizedKey)> = Vec::new();
        assert!(best_match(&query, none).is_none());
    }
}
