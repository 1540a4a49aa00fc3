use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ZaplineError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub country: CountryConfig,
    pub epg: EpgConfig,
    pub logo: LogoConfig,
    pub tables: TablesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryConfig {
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpgConfig {
    pub fuzzy_threshold: f64,
    pub min_substring_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoConfig {
    pub fuzzy_threshold: f64,
    pub min_substring_len: usize,
    pub fallback_path: String,
    pub extensions: Vec<String>,
    pub cache_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablesConfig {
    /// User table file merged over the built-in tables.
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, ZaplineError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load an explicit config file merged over built-in defaults.
    pub fn load_from(path: &Path) -> Result<Self, ZaplineError> {
        let user_str = std::fs::read_to_string(path)
            .map_err(|e| ZaplineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_over_defaults(&user_str)
    }

    /// Parse a (possibly partial) TOML document over the defaults.
    pub fn from_toml_over_defaults(user_str: &str) -> Result<Self, ZaplineError> {
        let mut merged: toml::Value =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| ZaplineError::Config(e.to_string()))?;
        let user: toml::Value =
            toml::from_str(user_str).map_err(|e| ZaplineError::Config(e.to_string()))?;
        merge_values(&mut merged, user);
        let config: AppConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ZaplineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the resolvers cannot work with.
    pub fn validate(&self) -> Result<(), ZaplineError> {
        for (name, value) in [
            ("epg.fuzzy_threshold", self.epg.fuzzy_threshold),
            ("logo.fuzzy_threshold", self.logo.fuzzy_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ZaplineError::Config(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if self.country.fallback.trim().is_empty() {
            return Err(ZaplineError::Config("country.fallback must not be empty".into()));
        }
        if self.logo.extensions.is_empty() {
            return Err(ZaplineError::Config("logo.extensions must not be empty".into()));
        }
        Ok(())
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), ZaplineError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ZaplineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ZaplineError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Logo cache file: the configured one, else inside the data directory.
    pub fn cache_path(&self) -> PathBuf {
        if let Some(path) = &self.logo.cache_file {
            return path.clone();
        }
        Self::project_dirs()
            .map(|d| d.data_dir().join("logo_cache.json"))
            .unwrap_or_else(|| PathBuf::from("logo_cache.json"))
    }

    /// Whether `path` has one of the configured logo extensions.
    pub fn is_logo_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.logo
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "zapline")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.country.fallback, "Unknown");
        assert_eq!(config.epg.fuzzy_threshold, 0.72);
        assert_eq!(config.logo.fuzzy_threshold, 0.70);
        assert_eq!(config.logo.fallback_path, "./tv/logos/misc/24-7/circle1-247.png");
        assert!(config.tables.path.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_user_file_keeps_defaults() {
        let config = AppConfig::from_toml_over_defaults(
            r#"
            [epg]
            fuzzy_threshold = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(config.epg.fuzzy_threshold, 0.8);
        assert_eq!(config.epg.min_substring_len, 3);
        assert_eq!(config.country.fallback, "Unknown");
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = AppConfig::from_toml_over_defaults("[logo]\nfuzzy_threshold = 1.5\n").unwrap_err();
        assert!(matches!(err, ZaplineError::Config(_)));
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.country.fallback = "Elsewhere".into();
        config.logo.cache_file = Some(dir.path().join("cache.json"));
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.cache_path(), dir.path().join("cache.json"));
    }

    #[test]
    fn test_logo_extensions() {
        let config = AppConfig::default();
        assert!(config.is_logo_file(Path::new("tv/uk/bbc-one-uk.PNG")));
        assert!(config.is_logo_file(Path::new("espn.webp")));
        assert!(!config.is_logo_file(Path::new("notes.txt")));
        assert!(!config.is_logo_file(Path::new("README")));
    }
}
