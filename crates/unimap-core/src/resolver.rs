//! Cross-directory dependency resolution.
//!
//! Imports are mapped back to the directory that declares the imported
//! namespace. Namespaces and directories are only heuristically related, so
//! the rules are fixed and deterministic:
//!
//! 1. The first directory (in traversal order) declaring a namespace owns it.
//! 2. An import resolves to its exact owner if there is one.
//! 3. Otherwise the longest registered namespace that is an ancestor or a
//!    descendant of the import wins; ties go to the earliest registered.
//! 4. Imports of well-known external namespaces never produce edges.

use indexmap::IndexMap;

use crate::config::DependenciesConfig;
use crate::types::{DirectoryRecord, ProjectModel};

/// Namespace prefixes that belong to the engine, the runtime or common
/// third-party packages.
pub const EXTERNAL_NAMESPACE_PREFIXES: &[&str] = &[
    "System",
    "UnityEngine",
    "UnityEditor",
    "Unity.",
    "TMPro",
    "Microsoft",
    "Newtonsoft",
    "DG.Tweening",
];

/// Matches imports against the external prefix list.
#[derive(Debug, Clone)]
pub struct ExternalNamespaces {
    prefixes: Vec<String>,
}

impl ExternalNamespaces {
    pub fn new(config: &DependenciesConfig) -> Self {
        let prefixes = EXTERNAL_NAMESPACE_PREFIXES
            .iter()
            .map(|s| s.to_string())
            .chain(config.external_prefixes.iter().cloned())
            .collect();
        Self { prefixes }
    }

    /// Plain string prefix test, so `System` also covers `SystemsCore`.
    pub fn is_external(&self, namespace: &str) -> bool {
        self.prefixes.iter().any(|p| namespace.starts_with(p.as_str()))
    }
}

impl Default for ExternalNamespaces {
    fn default() -> Self {
        Self::new(&DependenciesConfig::default())
    }
}

/// Namespace -> owning directory path. First writer wins.
///
/// Insertion order is retained so prefix ties resolve to the earliest
/// registered namespace.
#[derive(Debug, Clone, Default)]
pub struct NamespaceOwnership {
    owners: IndexMap<String, String>,
}

impl NamespaceOwnership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from directories in traversal order.
    pub fn build(directories: &[DirectoryRecord]) -> Self {
        let mut map = Self::new();
        for dir in directories {
            for ns in dir.files.iter().filter_map(|f| f.namespace.as_deref()) {
                map.register(ns, &dir.path);
            }
        }
        map
    }

    /// Record `namespace` as owned by `directory` unless it already has an owner.
    /// Returns whether the registration took effect.
    pub fn register(&mut self, namespace: &str, directory: &str) -> bool {
        if self.owners.contains_key(namespace) {
            return false;
        }
        self.owners
            .insert(namespace.to_string(), directory.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// The directory owning `import`, by exact match first and then by the
    /// longest related namespace.
    pub fn owner_of(&self, import: &str) -> Option<&str> {
        if let Some(dir) = self.owners.get(import) {
            return Some(dir.as_str());
        }

        let mut best: Option<(&str, &str)> = None;
        for (ns, dir) in &self.owners {
            if !is_related(ns, import) {
                continue;
            }
            // Strictly longer only, so the earliest registered keeps a tie
            match best {
                Some((current, _)) if ns.len() <= current.len() => {}
                _ => best = Some((ns.as_str(), dir.as_str())),
            }
        }
        best.map(|(_, dir)| dir)
    }
}

/// `a` and `b` are on the same namespace path, one strictly below the other.
fn is_related(a: &str, b: &str) -> bool {
    is_child_of(a, b) || is_child_of(b, a)
}

fn is_child_of(child: &str, parent: &str) -> bool {
    child
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('.'))
}

/// Directories that `dir` depends on, sorted, excluding `dir` itself.
pub fn resolve_directory(
    dir: &DirectoryRecord,
    ownership: &NamespaceOwnership,
    external: &ExternalNamespaces,
) -> Vec<String> {
    let local = dir.declared_namespaces();
    let mut referenced: Vec<String> = Vec::new();
    let mut seen_imports: Vec<&str> = Vec::new();

    for import in dir.files.iter().flat_map(|f| f.usings.iter()) {
        let import = import.as_str();
        if seen_imports.contains(&import) {
            continue;
        }
        seen_imports.push(import);

        if local.contains(&import) || external.is_external(import) {
            continue;
        }
        let Some(owner) = ownership.owner_of(import) else {
            continue;
        };
        if owner != dir.path && !referenced.iter().any(|r| r == owner) {
            referenced.push(owner.to_string());
        }
    }

    referenced.sort();
    referenced
}

/// Recompute every directory's referenced directories in place.
///
/// Only `referenced_directories` is written. The ownership map is rebuilt
/// from the current directories on every call, so running this twice on an
/// unchanged model yields identical output.
pub fn resolve_dependencies(project: &mut ProjectModel, external: &ExternalNamespaces) {
    let ownership = NamespaceOwnership::build(&project.directories);
    tracing::debug!(namespaces = ownership.len(), "built namespace ownership map");

    let resolved: Vec<Vec<String>> = project
        .directories
        .iter()
        .map(|dir| resolve_directory(dir, &ownership, external))
        .collect();

    for (dir, referenced) in project.directories.iter_mut().zip(resolved) {
        dir.dependencies.referenced_directories = referenced;
    }
}
