use serde::{Deserialize, Serialize};

/// Writing systems recognised by the country script heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Hangul,
    Kana,
    Han,
    Arabic,
    Hebrew,
    Cyrillic,
    Greek,
    Thai,
    Devanagari,
}

impl Script {
    fn ranges(self) -> &'static [(char, char)] {
        match self {
            Self::Hangul => &[
                ('\u{1100}', '\u{11FF}'),
                ('\u{3130}', '\u{318F}'),
                ('\u{AC00}', '\u{D7AF}'),
            ],
            Self::Kana => &[
                ('\u{3040}', '\u{309F}'),
                ('\u{30A0}', '\u{30FF}'),
                ('\u{31F0}', '\u{31FF}'),
                ('\u{FF66}', '\u{FF9F}'),
            ],
            Self::Han => &[
                ('\u{3400}', '\u{4DBF}'),
                ('\u{4E00}', '\u{9FFF}'),
                ('\u{F900}', '\u{FAFF}'),
            ],
            Self::Arabic => &[
                ('\u{0600}', '\u{06FF}'),
                ('\u{0750}', '\u{077F}'),
                ('\u{08A0}', '\u{08FF}'),
                ('\u{FB50}', '\u{FDFF}'),
                ('\u{FE70}', '\u{FEFF}'),
            ],
            Self::Hebrew => &[('\u{0590}', '\u{05FF}')],
            Self::Cyrillic => &[('\u{0400}', '\u{052F}')],
            Self::Greek => &[('\u{0370}', '\u{03FF}'), ('\u{1F00}', '\u{1FFF}')],
            Self::Thai => &[('\u{0E00}', '\u{0E7F}')],
            Self::Devanagari => &[('\u{0900}', '\u{097F}')],
        }
    }

    pub fn contains(self, c: char) -> bool {
        self.ranges().iter().any(|&(lo, hi)| (lo..=hi).contains(&c))
    }

    /// Whether any character of `text` belongs to this script.
    pub fn appears_in(self, text: &str) -> bool {
        text.chars().any(|c| self.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_scripts() {
        assert!(Script::Hangul.appears_in("KBS 스포츠"));
        assert!(Script::Kana.appears_in("フジテレビ"));
        assert!(Script::Han.appears_in("中央电视台"));
        assert!(Script::Arabic.appears_in("قناة"));
        assert!(Script::Cyrillic.appears_in("Матч ТВ"));
        assert!(Script::Greek.appears_in("ΕΡΤ"));
        assert!(!Script::Cyrillic.appears_in("Match TV"));
    }

    #[test]
    fn deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Row {
            script: Script,
        }
        let row: Row = toml::from_str(r#"script = "devanagari""#).unwrap();
        assert_eq!(row.script, Script::Devanagari);
    }
}
