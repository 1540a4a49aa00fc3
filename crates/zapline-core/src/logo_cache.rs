use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ZaplineError;

/// A logo previously resolved for a guide channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLogo {
    pub display_name: String,
    pub resolved_path: String,
}

/// Guide id → previously resolved logo.
///
/// Never authoritative: the logo resolver re-checks every hit against the
/// live logo catalog. Persisted as a flat JSON object.
#[derive(Debug, Clone, Default)]
pub struct LogoCache {
    entries: BTreeMap<String, CachedLogo>,
    dirty: bool,
}

impl LogoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cache file. A missing file gives an empty cache; an unreadable
    /// or corrupt one is discarded with a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }
        match std::fs::read_to_string(path)
            .map_err(ZaplineError::from)
            .and_then(|content| Self::from_json(&content))
        {
            Ok(cache) => {
                tracing::debug!(path = %path.display(), entries = cache.len(), "Logo cache loaded");
                cache
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable logo cache");
                Self::new()
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ZaplineError> {
        let entries: BTreeMap<String, CachedLogo> = serde_json::from_str(json)?;
        Ok(Self {
            entries,
            dirty: false,
        })
    }

    pub fn to_json(&self) -> Result<String, ZaplineError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Write the cache to `path`, creating parent directories.
    pub fn save(&mut self, path: &Path) -> Result<(), ZaplineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = self.to_json()?;
        std::fs::write(path, content)
            .map_err(|e| ZaplineError::Cache(format!("{}: {e}", path.display())))?;
        self.dirty = false;
        Ok(())
    }

    pub fn get(&self, canonical_id: &str) -> Option<&CachedLogo> {
        self.entries.get(canonical_id)
    }

    pub fn insert(&mut self, canonical_id: impl Into<String>, logo: CachedLogo) {
        let canonical_id = canonical_id.into();
        if self.entries.get(&canonical_id) != Some(&logo) {
            self.entries.insert(canonical_id, logo);
            self.dirty = true;
        }
    }

    pub fn remove(&mut self, canonical_id: &str) -> Option<CachedLogo> {
        let removed = self.entries.remove(canonical_id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.dirty = true;
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether there are changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
