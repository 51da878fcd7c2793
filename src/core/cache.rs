//! Checksum cache.
//!
//! Records, per source unit, the SHA-256 of its content and the entities the
//! last extraction produced from it. A unit that is unchanged and produced
//! nothing last time can be skipped; every other unit is extracted again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `content`.
pub fn checksum(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub checksum: String,
    #[serde(default)]
    pub type_names: Vec<String>,
    #[serde(default)]
    pub operation_names: Vec<String>,
}

impl CacheEntry {
    pub fn has_entities(&self) -> bool {
        !self.type_names.is_empty() || !self.operation_names.is_empty()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChecksumCache {
    #[serde(skip)]
    file_path: PathBuf,
    #[serde(default)]
    units: BTreeMap<String, CacheEntry>,
}

impl ChecksumCache {
    /// Open the cache at `path`; a missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        let mut cache = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
            serde_json::from_str::<ChecksumCache>(&content)
                .with_context(|| format!("Failed to parse cache file: {}", path.display()))?
        } else {
            ChecksumCache::default()
        };
        cache.file_path = path.to_path_buf();
        Ok(cache)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize cache")?;
        fs::write(&self.file_path, format!("{}\n", content))
            .with_context(|| format!("Failed to write cache file: {}", self.file_path.display()))
    }

    /// Whether the unit at `path` changed since it was last recorded.
    pub fn needs_update(&self, path: &str, checksum: &str) -> bool {
        self.units
            .get(path)
            .is_none_or(|entry| entry.checksum != checksum)
    }

    /// Unchanged, and the last extraction found nothing in it.
    pub fn can_skip(&self, path: &str, checksum: &str) -> bool {
        !self.needs_update(path, checksum)
            && self.units.get(path).is_some_and(|e| !e.has_entities())
    }

    pub fn record_entities(
        &mut self,
        path: &str,
        checksum: &str,
        type_names: Vec<String>,
        operation_names: Vec<String>,
    ) {
        self.units.insert(
            path.to_string(),
            CacheEntry {
                checksum: checksum.to_string(),
                type_names,
                operation_names,
            },
        );
    }

    /// Forget units that no longer exist.
    pub fn retain_units(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.units.retain(|path, _| keep(path));
    }

    pub fn entry(&self, path: &str) -> Option<&CacheEntry> {
        self.units.get(path)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
