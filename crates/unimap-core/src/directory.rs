use std::path::Path;

use crate::types::{
    DeclKind, DirectoryDependencies, DirectoryRecord, DirectoryStats, FileRecord, TypeCategory,
};

const MODULE_DEFINITION_EXTENSION: &str = "asmdef";

/// Build the record for one directory from its analyzed files.
///
/// Returns `None` when no file survived analysis; such directories are left
/// out of the project model entirely. Referenced directories stay empty
/// until the resolver runs.
pub fn aggregate_directory(
    path: &str,
    module_name: Option<String>,
    files: Vec<FileRecord>,
) -> Option<DirectoryRecord> {
    if files.is_empty() {
        return None;
    }

    let stats = compute_stats(&files);
    let uses_namespaces = collect_namespaces(&files);

    Some(DirectoryRecord {
        path: path.to_string(),
        module_name,
        files,
        stats,
        dependencies: DirectoryDependencies {
            uses_namespaces,
            referenced_directories: Vec::new(),
        },
    })
}

/// Count files and bucket every type, nested ones included.
///
/// Enums go to the enum bucket whatever their category; everything else is
/// bucketed by category.
pub fn compute_stats(files: &[FileRecord]) -> DirectoryStats {
    let mut stats = DirectoryStats {
        total_scripts: files.len(),
        ..DirectoryStats::default()
    };

    for ty in files.iter().flat_map(FileRecord::all_types) {
        if ty.kind == DeclKind::Enum {
            stats.enums += 1;
            continue;
        }
        match ty.category {
            TypeCategory::MonoBehaviourLike => stats.mono_behaviours += 1,
            TypeCategory::DataAssetLike => stats.scriptable_objects += 1,
            TypeCategory::InterfaceKind => stats.interfaces += 1,
            TypeCategory::EditorTooling => stats.editor_scripts += 1,
            TypeCategory::PlainType => stats.pure_c_sharp += 1,
        }
    }

    stats
}

/// Union of all imports in the directory, sorted and deduplicated.
pub fn collect_namespaces(files: &[FileRecord]) -> Vec<String> {
    let mut namespaces: Vec<String> = files.iter().flat_map(|f| f.usings.clone()).collect();
    namespaces.sort();
    namespaces.dedup();
    namespaces
}

/// Read the module identity of a directory from its assembly definition.
///
/// The first `*.asmdef` by file name is used. Its JSON `name` property is the
/// identity; an unreadable or malformed file falls back to the file stem,
/// while well-formed JSON without a `name` yields no identity.
pub fn read_module_identity(dir: &Path) -> Option<String> {
    let mut definitions: Vec<_> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(MODULE_DEFINITION_EXTENSION))
        })
        .collect();
    definitions.sort();
    let definition = definitions.into_iter().next()?;

    let parsed = std::fs::read_to_string(&definition)
        .ok()
        .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok());

    match parsed {
        Some(value) => value
            .get("name")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        None => {
            tracing::debug!(
                path = %definition.display(),
                "unreadable assembly definition, using file stem"
            );
            definition
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeInfo;

    fn ty(name: &str, kind: DeclKind, category: TypeCategory) -> TypeInfo {
        TypeInfo {
            name: name.to_string(),
            kind,
            modifiers: vec![],
            base_type: None,
            interfaces: vec![],
            category,
            attributes: vec![],
            methods: vec![],
            fields: vec![],
            properties: vec![],
            events: vec![],
            nested_types: vec![],
            enum_values: vec![],
        }
    }

    fn file(name: &str, usings: &[&str], types: Vec<TypeInfo>) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            relative_path: format!("Core/{name}"),
            namespace: Some("Game.Core".to_string()),
            usings: usings.iter().map(|s| s.to_string()).collect(),
            types,
        }
    }

    fn sample_files() -> Vec<FileRecord> {
        let mut player = ty("Player", DeclKind::Class, TypeCategory::MonoBehaviourLike);
        player
            .nested_types
            .push(ty("State", DeclKind::Enum, TypeCategory::PlainType));
        player
            .nested_types
            .push(ty("Memento", DeclKind::Struct, TypeCategory::PlainType));
        vec![
            file("Player.cs", &["UnityEngine", "Game.Data"], vec![player]),
            file(
                "Config.cs",
                &["Game.Data", "System"],
                vec![
                    ty("Config", DeclKind::Class, TypeCategory::DataAssetLike),
                    ty("IConfig", DeclKind::Interface, TypeCategory::InterfaceKind),
                ],
            ),
            file(
                "Inspector.cs",
                &["UnityEditor"],
                vec![
                    ty("Inspector", DeclKind::Class, TypeCategory::EditorTooling),
                    ty("Util", DeclKind::Class, TypeCategory::PlainType),
                    ty("Kind", DeclKind::Enum, TypeCategory::PlainType),
                ],
            ),
        ]
    }

    #[test]
    fn test_empty_directory_is_omitted() {
        assert!(aggregate_directory("Empty", None, vec![]).is_none());
    }

    #[test]
    fn test_stats_bucket_each_type_once() {
        let stats = compute_stats(&sample_files());
        assert_eq!(stats.total_scripts, 3);
        assert_eq!(stats.mono_behaviours, 1);
        assert_eq!(stats.scriptable_objects, 1);
        assert_eq!(stats.interfaces, 1);
        assert_eq!(stats.editor_scripts, 1);
        // Util plus the nested Memento struct
        assert_eq!(stats.pure_c_sharp, 2);
        assert_eq!(stats.enums, 2);
        assert_eq!(stats.type_count(), 8);
    }

    #[test]
    fn test_enum_kind_wins_over_category() {
        let files = vec![file(
            "Odd.cs",
            &[],
            vec![ty("Odd", DeclKind::Enum, TypeCategory::EditorTooling)],
        )];
        let stats = compute_stats(&files);
        assert_eq!(stats.enums, 1);
        assert_eq!(stats.editor_scripts, 0);
    }

    #[test]
    fn test_uses_namespaces_sorted_distinct() {
        let dir = aggregate_directory("Core", None, sample_files()).unwrap();
        assert_eq!(
            dir.dependencies.uses_namespaces,
            vec!["Game.Data", "System", "UnityEditor", "UnityEngine"]
        );
        assert!(dir.dependencies.referenced_directories.is_empty());
    }

    #[test]
    fn test_file_order_does_not_change_aggregates() {
        let forward = aggregate_directory("Core", None, sample_files()).unwrap();
        let mut reversed_files = sample_files();
        reversed_files.reverse();
        let reversed = aggregate_directory("Core", None, reversed_files).unwrap();
        assert_eq!(forward.stats, reversed.stats);
        assert_eq!(forward.dependencies, reversed.dependencies);
    }

    #[test]
    fn test_module_identity_from_asmdef_name() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("Game.Core.asmdef"),
            r#"{ "name": "Game.Core.Runtime", "references": [] }"#,
        )
        .unwrap();
        assert_eq!(
            read_module_identity(tmp.path()).as_deref(),
            Some("Game.Core.Runtime")
        );
    }

    #[test]
    fn test_module_identity_falls_back_to_file_stem() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Broken.asmdef"), "{ not json").unwrap();
        assert_eq!(read_module_identity(tmp.path()).as_deref(), Some("Broken"));

    }

    #[test]
    fn test_module_identity_absent_when_name_missing() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Unnamed.asmdef"), r#"{ "references": [] }"#).unwrap();
        assert!(read_module_identity(tmp.path()).is_none());
    }

    #[test]
    fn test_module_identity_absent() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Player.cs"), "class Player {}").unwrap();
        assert!(read_module_identity(tmp.path()).is_none());
    }
}
