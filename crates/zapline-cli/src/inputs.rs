//! Reading labels, guide catalogs and logo inventories from disk.

use std::io::Read;
use std::path::Path;

use walkdir::WalkDir;
use zapline_core::config::AppConfig;
use zapline_core::error::ZaplineError;
use zapline_core::models::{CatalogRecord, RawLabel};

/// Read labels from a file, or stdin when `path` is `-`.
///
/// Lines starting with `{` are JSON label records; any other non-blank line
/// is a plain channel name. Lines starting with `#` are skipped.
pub fn read_labels(path: &Path) -> Result<Vec<RawLabel>, ZaplineError> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    parse_labels(&content)
}

pub fn parse_labels(content: &str) -> Result<Vec<RawLabel>, ZaplineError> {
    let mut labels = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('{') {
            let label: RawLabel = serde_json::from_str(line).map_err(|e| {
                tracing::error!(line = n + 1, "Malformed label record");
                e
            })?;
            labels.push(label);
        } else {
            labels.push(RawLabel::new(line));
        }
    }
    tracing::debug!(count = labels.len(), "Labels read");
    Ok(labels)
}

/// Read a guide catalog: a JSON array of `{"id", "displayNames"}` records.
pub fn read_catalog(path: &Path) -> Result<Vec<CatalogRecord>, ZaplineError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ZaplineError::Catalog(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| ZaplineError::Catalog(format!("{}: {e}", path.display())))
}

/// Walk a logo directory and build one record per image file.
///
/// The record id is the file path and its only display name is the
/// lowercased file stem. Files are visited in name order so repeated runs
/// register duplicates the same way.
pub fn scan_logos(dir: &Path, config: &AppConfig) -> Result<Vec<CatalogRecord>, ZaplineError> {
    if !dir.is_dir() {
        return Err(ZaplineError::Catalog(format!(
            "logo directory {} does not exist",
            dir.display()
        )));
    }

    let mut records = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !config.is_logo_file(path) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!(path = %path.display(), "Skipping logo with non-UTF-8 name");
            continue;
        };
        records.push(CatalogRecord::new(
            path.display().to_string(),
            [stem.to_lowercase()],
        ));
    }

    tracing::info!(path = %dir.display(), logos = records.len(), "Logo directory indexed");
    Ok(records)
}
