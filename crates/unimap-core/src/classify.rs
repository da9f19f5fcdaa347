use std::collections::HashSet;

use crate::config::ClassificationConfig;
use crate::syntax::{AttributeDecl, FieldDecl, TypeDeclaration, TypeKind};
use crate::types::TypeCategory;

/// Base types whose subclasses live on scene objects.
pub const LIFECYCLE_BASE_TYPES: &[&str] = &[
    "MonoBehaviour",
    "NetworkBehaviour",
    "StateMachineBehaviour",
    "UIBehaviour",
    "Graphic",
    "MaskableGraphic",
    "Selectable",
    "Button",
    "Toggle",
    "Slider",
    "Scrollbar",
    "InputField",
    "Image",
    "RawImage",
    "Text",
];

/// Base types whose subclasses are persisted as assets.
pub const ASSET_BASE_TYPES: &[&str] = &["ScriptableObject", "ScriptableSingleton"];

/// Base types for editor extensions.
pub const TOOLING_BASE_TYPES: &[&str] = &[
    "Editor",
    "EditorWindow",
    "PropertyDrawer",
    "DecoratorDrawer",
    "ScriptableWizard",
    "AssetPostprocessor",
    "AssetModificationProcessor",
];

/// Attributes that force a field to be serialized.
pub const SERIALIZATION_MARKERS: &[&str] = &["SerializeField", "SerializeReference"];

/// Attribute that keeps an otherwise serializable field out.
pub const NON_SERIALIZED_MARKER: &str = "NonSerialized";

/// Namespace fragment that marks editor-only code.
const EDITOR_NAMESPACE_HINT: &str = "Editor";

/// Assigns categories to type declarations and decides field exposure.
///
/// Built once per run from the static tables plus any extra base type names
/// from configuration.
pub struct TypeClassifier {
    lifecycle: HashSet<String>,
    asset: HashSet<String>,
    tooling: HashSet<String>,
}

fn build_set(defaults: &[&str], extra: &[String]) -> HashSet<String> {
    defaults
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().cloned())
        .collect()
}

impl TypeClassifier {
    pub fn new(config: &ClassificationConfig) -> Self {
        Self {
            lifecycle: build_set(LIFECYCLE_BASE_TYPES, &config.extra_lifecycle_types),
            asset: build_set(ASSET_BASE_TYPES, &config.extra_asset_types),
            tooling: build_set(TOOLING_BASE_TYPES, &config.extra_tooling_types),
        }
    }

    /// Category of a class-like declaration.
    ///
    /// Lifecycle beats asset beats tooling; the namespace hint is only
    /// consulted when no base type table matches.
    pub fn classify(
        &self,
        decl: &TypeDeclaration,
        enclosing_namespace: Option<&str>,
    ) -> TypeCategory {
        if decl.kind == TypeKind::Interface {
            return TypeCategory::InterfaceKind;
        }
        let Some(base) = decl.base_type() else {
            return TypeCategory::PlainType;
        };
        self.classify_base(base, enclosing_namespace)
    }

    fn classify_base(&self, base: &str, enclosing_namespace: Option<&str>) -> TypeCategory {
        let simple = simple_type_name(base);
        if self.lifecycle.contains(simple) {
            TypeCategory::MonoBehaviourLike
        } else if self.asset.contains(simple) {
            TypeCategory::DataAssetLike
        } else if self.tooling.contains(simple) {
            TypeCategory::EditorTooling
        } else if enclosing_namespace.is_some_and(|ns| ns.contains(EDITOR_NAMESPACE_HINT)) {
            TypeCategory::EditorTooling
        } else {
            TypeCategory::PlainType
        }
    }
}

impl Default for TypeClassifier {
    fn default() -> Self {
        Self::new(&ClassificationConfig::default())
    }
}

/// Whether the engine serializes a field.
///
/// A marker attribute always wins, even on private or static fields.
/// Otherwise only public instance fields that are neither readonly nor
/// const qualify, unless they opt out with `[NonSerialized]`.
pub fn is_exposed_state(field: &FieldDecl) -> bool {
    if field
        .attributes
        .iter()
        .any(|a| SERIALIZATION_MARKERS.contains(&simple_attribute_name(a)))
    {
        return true;
    }

    field.has_modifier("public")
        && !field.has_modifier("static")
        && !field.has_modifier("readonly")
        && !field.has_modifier("const")
        && !field
            .attributes
            .iter()
            .any(|a| simple_attribute_name(a) == NON_SERIALIZED_MARKER)
}

/// Reduce a type reference to its bare identifier.
///
/// Only qualifiers outside generic arguments count, so
/// `global::UnityEngine.MonoBehaviour` -> `MonoBehaviour`,
/// `Singleton<Game.Core.Manager>` -> `Singleton` and
/// `Outer<T>.Inner` -> `Inner`.
pub fn simple_type_name(name: &str) -> &str {
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in name.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            '.' | ':' if depth == 0 => start = i + 1,
            _ => {}
        }
    }
    let segment = &name[start..];
    segment.split('<').next().unwrap_or(segment).trim()
}

/// `[UnityEngine.SerializeFieldAttribute]` -> `SerializeField`
fn simple_attribute_name(attr: &AttributeDecl) -> &str {
    let name = simple_type_name(&attr.name);
    match name.strip_suffix("Attribute") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}
