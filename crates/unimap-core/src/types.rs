use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic category of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeCategory {
    /// Attached to scene objects and driven by the engine's lifecycle.
    #[serde(rename = "MonoBehaviour")]
    MonoBehaviourLike,
    /// Persisted as a standalone data asset.
    #[serde(rename = "ScriptableObject")]
    DataAssetLike,
    #[serde(rename = "Interface")]
    InterfaceKind,
    /// Editor-only tooling (inspectors, windows, drawers, importers).
    #[serde(rename = "Editor")]
    EditorTooling,
    #[default]
    #[serde(rename = "PureCSharp")]
    PlainType,
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeCategory::MonoBehaviourLike => write!(f, "MonoBehaviour"),
            TypeCategory::DataAssetLike => write!(f, "ScriptableObject"),
            TypeCategory::InterfaceKind => write!(f, "Interface"),
            TypeCategory::EditorTooling => write!(f, "Editor"),
            TypeCategory::PlainType => write!(f, "PureCSharp"),
        }
    }
}

/// Declaration kind as it appears in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Class,
    Interface,
    Struct,
    Enum,
    Record,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Class => write!(f, "class"),
            DeclKind::Interface => write!(f, "interface"),
            DeclKind::Struct => write!(f, "struct"),
            DeclKind::Enum => write!(f, "enum"),
            DeclKind::Record => write!(f, "record"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub modifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub name: String,
    pub return_type: String,
    pub modifiers: Vec<String>,
    pub type_parameters: Vec<String>,
    pub parameters: Vec<ParameterInfo>,
    pub attributes: Vec<AttributeInfo>,
    pub is_coroutine: bool,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub modifiers: Vec<String>,
    pub attributes: Vec<AttributeInfo>,
    /// Whether the engine serializes this field.
    #[serde(rename = "isSerializable")]
    pub is_exposed_state: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub modifiers: Vec<String>,
    pub has_getter: bool,
    pub has_setter: bool,
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub modifiers: Vec<String>,
}

/// A declared type together with its computed category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    pub name: String,
    pub kind: DeclKind,
    pub modifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_type: Option<String>,
    pub interfaces: Vec<String>,
    #[serde(rename = "unityType")]
    pub category: TypeCategory,
    pub attributes: Vec<AttributeInfo>,
    pub methods: Vec<MethodInfo>,
    pub fields: Vec<FieldInfo>,
    pub properties: Vec<PropertyInfo>,
    pub events: Vec<EventInfo>,
    pub nested_types: Vec<TypeInfo>,
    /// Member names, only populated for enums.
    pub enum_values: Vec<String>,
}

impl TypeInfo {
    /// This type followed by all nested types, depth-first.
    pub fn walk(&self) -> Vec<&TypeInfo> {
        let mut out = vec![self];
        for nested in &self.nested_types {
            out.extend(nested.walk());
        }
        out
    }
}

/// Analysis result for a single source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub name: String,
    pub relative_path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub namespace: Option<String>,
    /// Imported namespaces, deduplicated, in order of first occurrence.
    pub usings: Vec<String>,
    pub types: Vec<TypeInfo>,
}

impl FileRecord {
    /// Every type declared in the file, nested ones included.
    pub fn all_types(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.iter().flat_map(TypeInfo::walk)
    }
}

/// Per-directory counts. A type lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    /// Number of analyzed files in the directory.
    pub total_scripts: usize,
    pub mono_behaviours: usize,
    pub scriptable_objects: usize,
    pub interfaces: usize,
    pub editor_scripts: usize,
    pub pure_c_sharp: usize,
    pub enums: usize,
}

impl DirectoryStats {
    pub fn type_count(&self) -> usize {
        self.mono_behaviours
            + self.scriptable_objects
            + self.interfaces
            + self.editor_scripts
            + self.pure_c_sharp
            + self.enums
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryDependencies {
    /// Every namespace imported anywhere in the directory, sorted.
    pub uses_namespaces: Vec<String>,
    /// Other directories this one depends on, sorted, never itself.
    pub referenced_directories: Vec<String>,
}

/// Aggregated view of one source-bearing directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRecord {
    /// Path relative to the analysis root; `.` for the root itself.
    pub path: String,
    /// Assembly definition name, when the directory has one.
    #[serde(rename = "asmdef", skip_serializing_if = "Option::is_none", default)]
    pub module_name: Option<String>,
    pub files: Vec<FileRecord>,
    pub stats: DirectoryStats,
    pub dependencies: DirectoryDependencies,
}

impl DirectoryRecord {
    /// Distinct namespaces declared by this directory's files.
    pub fn declared_namespaces(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for ns in self.files.iter().filter_map(|f| f.namespace.as_deref()) {
            if !out.contains(&ns) {
                out.push(ns);
            }
        }
        out
    }
}

/// Top-level output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectModel {
    pub project_path: String,
    pub analyzed_at: String,
    pub total_files: usize,
    pub total_types: usize,
    /// In traversal order.
    pub directories: Vec<DirectoryRecord>,
}

impl ProjectModel {
    pub fn new(project_path: impl Into<String>, analyzed_at: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            analyzed_at: analyzed_at.into(),
            total_files: 0,
            total_types: 0,
            directories: Vec::new(),
        }
    }

    /// Recompute the global totals from the directory records.
    pub fn update_totals(&mut self) {
        self.total_files = self.directories.iter().map(|d| d.files.len()).sum();
        self.total_types = self.directories.iter().map(|d| d.stats.type_count()).sum();
    }

    pub fn directory(&self, path: &str) -> Option<&DirectoryRecord> {
        self.directories.iter().find(|d| d.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_type(name: &str, kind: DeclKind) -> TypeInfo {
        TypeInfo {
            name: name.to_string(),
            kind,
            modifiers: vec![],
            base_type: None,
            interfaces: vec![],
            category: TypeCategory::PlainType,
            attributes: vec![],
            methods: vec![],
            fields: vec![],
            properties: vec![],
            events: vec![],
            nested_types: vec![],
            enum_values: vec![],
        }
    }

    #[test]
    fn test_category_serializes_to_engine_names() {
        let json = serde_json::to_string(&TypeCategory::MonoBehaviourLike).unwrap();
        assert_eq!(json, "\"MonoBehaviour\"");
        let json = serde_json::to_string(&TypeCategory::PlainType).unwrap();
        assert_eq!(json, "\"PureCSharp\"");
        assert_eq!(TypeCategory::EditorTooling.to_string(), "Editor");
    }

    #[test]
    fn test_walk_visits_nested_depth_first() {
        let mut inner = bare_type("Inner", DeclKind::Class);
        inner.nested_types.push(bare_type("Deepest", DeclKind::Enum));
        let mut outer = bare_type("Outer", DeclKind::Class);
        outer.nested_types.push(inner);
        outer.nested_types.push(bare_type("Sibling", DeclKind::Struct));

        let names: Vec<_> = outer.walk().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Outer", "Inner", "Deepest", "Sibling"]);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let file = FileRecord {
            name: "A.cs".to_string(),
            relative_path: "A.cs".to_string(),
            namespace: None,
            usings: vec![],
            types: vec![bare_type("A", DeclKind::Class)],
        };
        let value = serde_json::to_value(&file).unwrap();
        assert!(value.get("namespace").is_none());
        assert!(value["types"][0].get("baseType").is_none());
        assert_eq!(value["types"][0]["kind"], "class");
        assert_eq!(value["relativePath"], "A.cs");
    }

    #[test]
    fn test_declared_namespaces_distinct_in_order() {
        let file = |ns: Option<&str>| FileRecord {
            name: String::new(),
            relative_path: String::new(),
            namespace: ns.map(str::to_string),
            usings: vec![],
            types: vec![],
        };
        let dir = DirectoryRecord {
            path: "Core".to_string(),
            module_name: None,
            files: vec![file(Some("B")), file(None), file(Some("A")), file(Some("B"))],
            stats: DirectoryStats::default(),
            dependencies: DirectoryDependencies::default(),
        };
        assert_eq!(dir.declared_namespaces(), ["B", "A"]);
    }
}
