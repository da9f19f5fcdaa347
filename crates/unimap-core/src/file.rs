use crate::classify::{is_exposed_state, TypeClassifier};
use crate::syntax::{
    AttributeDecl, Declaration, EnumDeclaration, MethodDecl, SourceUnit, TypeDeclaration,
    TypeKind,
};
use crate::types::{
    AttributeInfo, DeclKind, EventInfo, FieldInfo, FileRecord, MethodInfo, ParameterInfo,
    PropertyInfo, TypeCategory, TypeInfo,
};

/// Return types that mark a method as a coroutine.
const COROUTINE_RETURN_TYPES: &[&str] = &["IEnumerator", "IEnumerable"];

/// Build the record for one parsed file.
///
/// `rel_path` is relative to the analysis root and uses forward slashes.
pub fn aggregate_file(rel_path: &str, unit: &SourceUnit, classifier: &TypeClassifier) -> FileRecord {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path).to_string();

    FileRecord {
        name,
        relative_path: rel_path.to_string(),
        namespace: file_namespace(&unit.members).map(str::to_string),
        usings: dedup_imports(&unit.imports),
        types: classify_members(&unit.members, None, classifier),
    }
}

/// The namespace a file declares.
///
/// A file-scoped declaration wins over block declarations; otherwise the
/// first top-level block is used.
pub fn file_namespace(members: &[Declaration]) -> Option<&str> {
    let namespaces = || {
        members.iter().filter_map(|m| match m {
            Declaration::Namespace(ns) => Some(ns),
            _ => None,
        })
    };
    namespaces()
        .find(|ns| ns.file_scoped)
        .or_else(|| namespaces().next())
        .map(|ns| ns.name.as_str())
}

/// Drop repeated imports, keeping the first occurrence of each.
pub fn dedup_imports(imports: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(imports.len());
    for import in imports {
        if !import.is_empty() && !out.contains(import) {
            out.push(import.clone());
        }
    }
    out
}

/// Walk a list of declarations, flattening namespace groups and classifying
/// every type found. Nested types end up under their parent.
fn classify_members(
    members: &[Declaration],
    enclosing_namespace: Option<&str>,
    classifier: &TypeClassifier,
) -> Vec<TypeInfo> {
    let mut out = Vec::new();
    for member in members {
        match member {
            Declaration::Namespace(ns) => {
                out.extend(classify_members(&ns.members, Some(ns.name.as_str()), classifier));
            }
            Declaration::Type(decl) => {
                out.push(classify_type(decl, enclosing_namespace, classifier));
            }
            Declaration::Enum(decl) => out.push(enum_info(decl)),
        }
    }
    out
}

fn classify_type(
    decl: &TypeDeclaration,
    enclosing_namespace: Option<&str>,
    classifier: &TypeClassifier,
) -> TypeInfo {
    let kind = match decl.kind {
        TypeKind::Class => DeclKind::Class,
        TypeKind::Interface => DeclKind::Interface,
        TypeKind::Struct => DeclKind::Struct,
        TypeKind::Record => DeclKind::Record,
    };

    TypeInfo {
        name: decl.name.clone(),
        kind,
        modifiers: decl.modifiers.clone(),
        base_type: decl.base_type().map(str::to_string),
        interfaces: decl.interfaces().to_vec(),
        category: classifier.classify(decl, enclosing_namespace),
        attributes: attribute_infos(&decl.attributes),
        methods: decl.methods.iter().map(method_info).collect(),
        fields: decl
            .fields
            .iter()
            .map(|f| FieldInfo {
                name: f.name.clone(),
                ty: f.ty.clone(),
                modifiers: f.modifiers.clone(),
                attributes: attribute_infos(&f.attributes),
                is_exposed_state: is_exposed_state(f),
            })
            .collect(),
        properties: decl
            .properties
            .iter()
            .map(|p| PropertyInfo {
                name: p.name.clone(),
                ty: p.ty.clone(),
                modifiers: p.modifiers.clone(),
                has_getter: p.has_getter,
                has_setter: p.has_setter,
                attributes: attribute_infos(&p.attributes),
            })
            .collect(),
        events: decl
            .events
            .iter()
            .map(|e| EventInfo {
                name: e.name.clone(),
                ty: e.ty.clone(),
                modifiers: e.modifiers.clone(),
            })
            .collect(),
        nested_types: classify_members(&decl.nested, enclosing_namespace, classifier),
        enum_values: Vec::new(),
    }
}

fn enum_info(decl: &EnumDeclaration) -> TypeInfo {
    TypeInfo {
        name: decl.name.clone(),
        kind: DeclKind::Enum,
        modifiers: decl.modifiers.clone(),
        base_type: None,
        interfaces: Vec::new(),
        category: TypeCategory::PlainType,
        attributes: attribute_infos(&decl.attributes),
        methods: Vec::new(),
        fields: Vec::new(),
        properties: Vec::new(),
        events: Vec::new(),
        nested_types: Vec::new(),
        enum_values: decl.members.clone(),
    }
}

fn method_info(method: &MethodDecl) -> MethodInfo {
    MethodInfo {
        name: method.name.clone(),
        return_type: method.return_type.clone(),
        modifiers: method.modifiers.clone(),
        type_parameters: method.type_parameters.clone(),
        parameters: method
            .parameters
            .iter()
            .map(|p| ParameterInfo {
                name: p.name.clone(),
                ty: p.ty.clone(),
                default_value: p.default_value.clone(),
                modifier: p.modifier.clone(),
            })
            .collect(),
        attributes: attribute_infos(&method.attributes),
        is_coroutine: COROUTINE_RETURN_TYPES.contains(&method.return_type.as_str()),
        is_async: method.modifiers.iter().any(|m| m == "async"),
    }
}

fn attribute_infos(attrs: &[AttributeDecl]) -> Vec<AttributeInfo> {
    attrs
        .iter()
        .map(|a| AttributeInfo {
            name: a.name.clone(),
            arguments: a.arguments.clone(),
        })
        .collect()
}
