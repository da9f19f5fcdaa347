use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::ClassificationConfig;
use crate::types::FileRecord;

/// Cache entry for a single file's analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedFile {
    pub hash: String,
    pub record: FileRecord,
}

/// Analysis cache stored in `.unimap/cache.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisCache {
    /// Tool version that wrote the cache; entries from other versions are dropped.
    pub version: String,
    /// Fingerprint of the classification tables the records were built with.
    #[serde(default)]
    pub settings: String,
    pub files: HashMap<String, CachedFile>,
}

const CACHE_DIR: &str = ".unimap";
const CACHE_FILE: &str = "cache.json";
const CACHE_VERSION: &str = env!("CARGO_PKG_VERSION");

impl AnalysisCache {
    pub fn new(settings: impl Into<String>) -> Self {
        Self {
            version: CACHE_VERSION.to_string(),
            settings: settings.into(),
            files: HashMap::new(),
        }
    }

    /// Load cache from `.unimap/cache.json` relative to the analysis root.
    ///
    /// A cache written by another version or with other classification
    /// settings comes back empty.
    pub fn load(root: &Path, settings: &str) -> Result<Self> {
        let cache_path = root.join(CACHE_DIR).join(CACHE_FILE);
        if !cache_path.exists() {
            return Ok(Self::new(settings));
        }
        let content =
            std::fs::read_to_string(&cache_path).context("failed to read analysis cache")?;
        let cache: Self =
            serde_json::from_str(&content).context("failed to parse analysis cache")?;
        if cache.version != CACHE_VERSION {
            tracing::debug!(
                found = %cache.version,
                expected = CACHE_VERSION,
                "discarding cache written by another version"
            );
            return Ok(Self::new(settings));
        }
        if cache.settings != settings {
            tracing::debug!("discarding cache built with other classification settings");
            return Ok(Self::new(settings));
        }
        Ok(cache)
    }

    /// Save cache to `.unimap/cache.json` relative to the analysis root.
    pub fn save(&self, root: &Path) -> Result<()> {
        let cache_dir = root.join(CACHE_DIR);
        std::fs::create_dir_all(&cache_dir).context("failed to create .unimap directory")?;
        let cache_path = cache_dir.join(CACHE_FILE);
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize analysis cache")?;
        std::fs::write(&cache_path, content).context("failed to write analysis cache")?;
        Ok(())
    }

    /// Get the cached record for a file if it exists and its content hash matches.
    pub fn get(&self, rel_path: &str, hash: &str) -> Option<&FileRecord> {
        let cached = self.files.get(rel_path)?;
        if cached.hash == hash {
            Some(&cached.record)
        } else {
            None
        }
    }

    /// Insert or update a file's cache entry.
    pub fn insert(&mut self, rel_path: String, hash: String, record: FileRecord) {
        self.files.insert(rel_path, CachedFile { hash, record });
    }

    /// Remove entries for files that no longer exist.
    pub fn prune(&mut self, existing_files: &[String]) {
        let existing_set: std::collections::HashSet<&str> =
            existing_files.iter().map(|s| s.as_str()).collect();
        self.files
            .retain(|path, _| existing_set.contains(path.as_str()));
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// Compute SHA-256 hash of file content.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fingerprint of everything that feeds type classification.
pub fn settings_fingerprint(classification: &ClassificationConfig) -> String {
    let serialized = serde_json::to_string(classification).unwrap_or_default();
    compute_hash(&serialized)
}
