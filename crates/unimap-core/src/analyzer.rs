use std::path::Path;

use anyhow::Result;

use crate::syntax::SourceUnit;

/// Trait that each source language front end must implement.
pub trait SourceAnalyzer: Send + Sync {
    /// Language name (e.g., "csharp")
    fn language(&self) -> &'static str;

    /// File extensions this analyzer handles (e.g., &["cs"])
    fn file_extensions(&self) -> &[&str];

    /// Parse source text into its declaration tree.
    fn parse_source(&self, path: &Path, content: &str) -> Result<SourceUnit>;

    /// Whether the analyzer wants to see this file.
    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.file_extensions().iter().any(|e| ext == *e))
    }
}
