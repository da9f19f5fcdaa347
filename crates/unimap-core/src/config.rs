use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = ".unimap.toml";

/// Top-level configuration from `.unimap.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub dependencies: DependenciesConfig,
}

/// Traversal filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Directory names that are never descended into (case-insensitive).
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    /// File extensions that are never analyzed, with leading dot (case-insensitive).
    #[serde(default = "default_exclude_extensions")]
    pub exclude_extensions: Vec<String>,
    /// Globs matched against root-relative paths.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_exclude_dirs() -> Vec<String> {
    [
        "Library",
        "Temp",
        "Logs",
        "obj",
        "Build",
        "Builds",
        "MemoryCaptures",
        "Recordings",
        "UserSettings",
        ".git",
        ".vs",
        ".idea",
        ".vscode",
        "TextMesh Pro",
        "TextMeshPro",
        "node_modules",
        "bin",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_exclude_extensions() -> Vec<String> {
    [
        ".meta",
        ".png",
        ".jpg",
        ".jpeg",
        ".tga",
        ".psd",
        ".exr",
        ".gif",
        ".bmp",
        ".fbx",
        ".obj",
        ".blend",
        ".3ds",
        ".dae",
        ".wav",
        ".mp3",
        ".ogg",
        ".aiff",
        ".flac",
        ".mat",
        ".physicMaterial",
        ".physicsMaterial2D",
        ".dll",
        ".so",
        ".a",
        ".aar",
        ".jar",
        ".bundle",
        ".ttf",
        ".otf",
        ".fontsettings",
        ".lighting",
        ".giparams",
        ".unity",
        ".prefab",
        ".asset",
        ".preset",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            exclude_extensions: default_exclude_extensions(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Base type names added on top of the built-in classification tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default)]
    pub extra_lifecycle_types: Vec<String>,
    #[serde(default)]
    pub extra_asset_types: Vec<String>,
    #[serde(default)]
    pub extra_tooling_types: Vec<String>,
}

/// Dependency resolution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependenciesConfig {
    /// Namespace prefixes treated as external in addition to the built-in ones.
    #[serde(default)]
    pub external_prefixes: Vec<String>,
}

impl ProjectConfig {
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        name.starts_with('.') || self.exclude_dirs.iter().any(|d| d.eq_ignore_ascii_case(name))
    }

    pub fn is_excluded_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
            return false;
        };
        self.exclude_extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext))
    }
}

impl Config {
    /// Load configuration from a `.unimap.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `unimap init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.unimap.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            "failed to load config: {e:#}. Using defaults."
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Generate default TOML content for `unimap init`.
    pub fn default_toml() -> String {
        r#"# unimap - Unity project structure analysis

[project]
# Directory names skipped during traversal (hidden directories are always skipped)
exclude_dirs = [
  "Library", "Temp", "Logs", "obj", "Build", "Builds",
  "MemoryCaptures", "Recordings", "UserSettings",
  ".git", ".vs", ".idea", ".vscode",
  "TextMesh Pro", "TextMeshPro", "node_modules", "bin",
]
# Additional globs matched against paths relative to the analysis root
exclude_patterns = []

[classification]
# Project base classes to treat like the built-in engine types
# extra_lifecycle_types = ["GameBehaviour"]
# extra_asset_types = ["ConfigAsset"]
# extra_tooling_types = ["OdinEditor"]

[dependencies]
# Namespace prefixes that never produce directory dependencies
# external_prefixes = ["Cysharp", "Zenject"]
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.project.exclude_dirs.iter().any(|d| d == "Library"));
        assert!(config.project.exclude_patterns.is_empty());
        assert!(config.classification.extra_lifecycle_types.is_empty());
        assert!(config.dependencies.external_prefixes.is_empty());
    }

    #[test]
    fn test_default_toml_parses() {
        let config: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(config.project.exclude_dirs.len(), 17);
        // Omitted in the template, so serde defaults kick in
        assert!(config
            .project
            .exclude_extensions
            .iter()
            .any(|e| e == ".meta"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml_str = r#"
[classification]
extra_lifecycle_types = ["GameBehaviour"]

[dependencies]
external_prefixes = ["Zenject"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.classification.extra_lifecycle_types,
            vec!["GameBehaviour"]
        );
        assert_eq!(config.dependencies.external_prefixes, vec!["Zenject"]);
        assert!(config.project.exclude_dirs.iter().any(|d| d == "Temp"));
    }

    #[test]
    fn test_excluded_dirs_case_insensitive_and_hidden() {
        let project = ProjectConfig::default();
        assert!(project.is_excluded_dir("library"));
        assert!(project.is_excluded_dir("TextMesh Pro"));
        assert!(project.is_excluded_dir(".cache"));
        assert!(!project.is_excluded_dir("Scripts"));
    }

    #[test]
    fn test_excluded_extensions() {
        let project = ProjectConfig::default();
        assert!(project.is_excluded_extension(&PathBuf::from("Player.cs.meta")));
        assert!(project.is_excluded_extension(&PathBuf::from("Hero.PNG")));
        assert!(!project.is_excluded_extension(&PathBuf::from("Player.cs")));
        assert!(!project.is_excluded_extension(&PathBuf::from("README")));
    }

    #[test]
    fn test_load_or_default_finds_ancestor_config() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            "[dependencies]\nexternal_prefixes = [\"Zenject\"]\n",
        )
        .unwrap();
        let nested = tmp.path().join("Assets/Scripts");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load_or_default(&nested);
        assert_eq!(config.dependencies.external_prefixes, vec!["Zenject"]);
    }

    #[test]
    fn test_load_reports_invalid_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, "[project\nbroken").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unimap init"));
    }
}
