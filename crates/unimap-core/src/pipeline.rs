use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::analyzer::SourceAnalyzer;
use crate::cache::{compute_hash, settings_fingerprint, AnalysisCache};
use crate::classify::TypeClassifier;
use crate::config::Config;
use crate::directory::{aggregate_directory, read_module_identity};
use crate::error::AnalysisError;
use crate::file::aggregate_file;
use crate::resolver::{resolve_dependencies, ExternalNamespaces};
use crate::types::{FileRecord, ProjectModel};

/// Name of the folder holding a Unity project's sources.
const ASSETS_DIR: &str = "Assets";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A directory with the candidate source files found directly inside it.
#[derive(Debug, Clone)]
pub struct SourceDirectory {
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Per-file outcome carried from the parallel stage to the merge.
struct AnalyzedFile {
    rel_path: String,
    record: FileRecord,
    /// Content hash, only computed for incremental runs.
    hash: Option<String>,
}

/// Runs discovery, per-file analysis, aggregation and resolution.
pub struct AnalysisPipeline {
    analyzer: Box<dyn SourceAnalyzer>,
    config: Config,
    classifier: TypeClassifier,
    external: ExternalNamespaces,
    exclude: GlobSet,
    settings: String,
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!(pattern = %pattern, "ignoring invalid exclude pattern: {e}"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

impl AnalysisPipeline {
    pub fn new(analyzer: Box<dyn SourceAnalyzer>, config: Config) -> Self {
        let classifier = TypeClassifier::new(&config.classification);
        let external = ExternalNamespaces::new(&config.dependencies);
        let exclude = build_globset(&config.project.exclude_patterns);
        let settings = settings_fingerprint(&config.classification);
        Self {
            analyzer,
            config,
            classifier,
            external,
            exclude,
            settings,
        }
    }

    /// Run a full analysis on the given project path.
    pub fn analyze(&self, project_path: &Path) -> Result<ProjectModel> {
        self.analyze_inner(project_path, false)
    }

    /// Run an incremental analysis, reusing cached records for unchanged files.
    pub fn analyze_incremental(&self, project_path: &Path) -> Result<ProjectModel> {
        self.analyze_inner(project_path, true)
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn analyze_inner(&self, project_path: &Path, incremental: bool) -> Result<ProjectModel> {
        if !project_path.is_dir() {
            return Err(AnalysisError::RootNotFound(project_path.to_path_buf()).into());
        }
        let root = find_source_root(project_path);
        tracing::debug!(root = %root.display(), "resolved analysis root");

        let directories = self.discover(&root)?;

        let mut cache = if incremental {
            AnalysisCache::load(&root, &self.settings).unwrap_or_else(|e| {
                tracing::warn!("ignoring unreadable analysis cache: {e:#}");
                AnalysisCache::new(self.settings.as_str())
            })
        } else {
            AnalysisCache::new(self.settings.as_str())
        };

        // Flatten so files from all directories share one parallel pass.
        let jobs: Vec<(usize, &Path)> = directories
            .iter()
            .enumerate()
            .flat_map(|(idx, dir)| dir.files.iter().map(move |f| (idx, f.as_path())))
            .collect();

        let cache_ref = incremental.then_some(&cache);
        let results: Vec<(usize, Option<AnalyzedFile>)> = jobs
            .par_iter()
            .map(|&(idx, file_path)| {
                match self.analyze_file(&root, file_path, cache_ref) {
                    Ok(analyzed) => Ok((idx, Some(analyzed))),
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!("skipping file: {e}");
                        Ok((idx, None))
                    }
                    Err(e) => Err(e),
                }
            })
            .collect::<Result<_, AnalysisError>>()?;

        // Merge in traversal order, independent of completion order.
        let mut per_directory: Vec<Vec<FileRecord>> = vec![Vec::new(); directories.len()];
        let mut current_files = Vec::new();
        for (idx, analyzed) in results {
            let Some(analyzed) = analyzed else {
                continue;
            };
            if let Some(hash) = analyzed.hash {
                current_files.push(analyzed.rel_path.clone());
                cache.insert(analyzed.rel_path, hash, analyzed.record.clone());
            }
            per_directory[idx].push(analyzed.record);
        }

        if incremental {
            cache.prune(&current_files);
            if let Err(e) = cache.save(&root) {
                tracing::warn!("failed to save analysis cache: {e:#}");
            }
        }

        let analyzed_at = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let mut project = ProjectModel::new(root.display().to_string(), analyzed_at);

        for (dir, files) in directories.iter().zip(per_directory) {
            let rel = relative_path(&root, &dir.path);
            let module_name = read_module_identity(&dir.path);
            match aggregate_directory(&rel, module_name, files) {
                Some(record) => project.directories.push(record),
                None => tracing::debug!(dir = %rel, "no analyzable files, omitting directory"),
            }
        }

        resolve_dependencies(&mut project, &self.external);
        project.update_totals();
        Ok(project)
    }

    /// Read, parse and aggregate one file.
    fn analyze_file(
        &self,
        root: &Path,
        file_path: &Path,
        cache: Option<&AnalysisCache>,
    ) -> Result<AnalyzedFile, AnalysisError> {
        let content = std::fs::read_to_string(file_path).map_err(|source| AnalysisError::Read {
            path: file_path.to_path_buf(),
            source,
        })?;
        let rel_path = relative_path(root, file_path);
        let hash = cache.map(|_| compute_hash(&content));

        if let (Some(cache), Some(hash)) = (cache, hash.as_deref()) {
            if let Some(record) = cache.get(&rel_path, hash) {
                return Ok(AnalyzedFile {
                    rel_path,
                    record: record.clone(),
                    hash: Some(hash.to_string()),
                });
            }
        }

        let unit = self
            .analyzer
            .parse_source(file_path, &content)
            .map_err(|e| AnalysisError::Parse {
                path: file_path.to_path_buf(),
                reason: format!("{e:#}"),
            })?;
        let record = aggregate_file(&rel_path, &unit, &self.classifier);

        Ok(AnalyzedFile {
            rel_path,
            record,
            hash,
        })
    }

    /// Walk the tree below `root` and collect candidate files per directory.
    ///
    /// Entries are visited sorted by name, and a directory always comes
    /// before its subdirectories.
    pub fn discover(&self, root: &Path) -> Result<Vec<SourceDirectory>> {
        let mut groups: IndexMap<PathBuf, Vec<PathBuf>> = IndexMap::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded_dir(root, e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(e).with_context(|| {
                        format!("failed to read analysis root '{}'", root.display())
                    });
                }
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() {
                groups.entry(path.to_path_buf()).or_default();
                continue;
            }
            if !self.is_candidate_file(root, path) {
                continue;
            }
            if let Some(parent) = path.parent() {
                groups
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push(path.to_path_buf());
            }
        }

        Ok(groups
            .into_iter()
            .filter(|(_, files)| !files.is_empty())
            .map(|(path, files)| SourceDirectory { path, files })
            .collect())
    }

    fn is_excluded_dir(&self, root: &Path, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if self.config.project.is_excluded_dir(&name) {
            tracing::debug!(dir = %entry.path().display(), "skipping excluded directory");
            return true;
        }
        self.exclude.is_match(relative_path(root, entry.path()))
    }

    fn is_candidate_file(&self, root: &Path, path: &Path) -> bool {
        self.analyzer.handles(path)
            && !self.config.project.is_excluded_extension(path)
            && !self.exclude.is_match(relative_path(root, path))
    }
}

/// The directory to analyze for a user-supplied path.
///
/// A path that already names the `Assets` folder is used as is; a project
/// root with an `Assets` child resolves to that child; anything else is
/// analyzed directly.
pub fn find_source_root(project_path: &Path) -> PathBuf {
    let is_assets = project_path
        .file_name()
        .is_some_and(|n| n.to_string_lossy().eq_ignore_ascii_case(ASSETS_DIR));
    if is_assets {
        return project_path.to_path_buf();
    }
    let assets = project_path.join(ASSETS_DIR);
    if assets.is_dir() {
        return assets;
    }
    project_path.to_path_buf()
}

/// `path` relative to `root` with forward slashes; `.` for the root itself.
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    if rel.is_empty() {
        ".".to_string()
    } else {
        rel
    }
}
