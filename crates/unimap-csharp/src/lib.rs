use std::path::Path;

use anyhow::{Context, Result};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator};

use unimap_core::analyzer::SourceAnalyzer;
use unimap_core::syntax::*;

/// Node kinds that can name a namespace in a using-directive.
const NAME_KINDS: &[&str] = &[
    "identifier",
    "qualified_name",
    "generic_name",
    "alias_qualified_name",
];

const PARAMETER_MODIFIERS: &[&str] = &["ref", "out", "in", "params", "this", "scoped"];

/// C# language analyzer using tree-sitter.
pub struct CSharpAnalyzer {
    language: Language,
    using_query: Query,
}

impl CSharpAnalyzer {
    pub fn new() -> Result<Self> {
        let language: Language = tree_sitter_c_sharp::LANGUAGE.into();

        // Matches at any depth, so usings inside namespace blocks are included.
        let using_query = Query::new(&language, "(using_directive) @using")
            .context("failed to compile using query")?;

        Ok(Self {
            language,
            using_query,
        })
    }

    fn extract_imports(&self, root: Node, source: &str) -> Vec<String> {
        let mut cursor = QueryCursor::new();
        let mut imports = Vec::new();
        let mut matches = cursor.matches(&self.using_query, root, source.as_bytes());

        while let Some(m) = matches.next() {
            for capture in m.captures {
                if let Some(target) = using_target(capture.node, source) {
                    imports.push(target);
                }
            }
        }

        imports
    }
}

impl SourceAnalyzer for CSharpAnalyzer {
    fn language(&self) -> &'static str {
        "csharp"
    }

    fn file_extensions(&self) -> &[&str] {
        &["cs"]
    }

    fn parse_source(&self, path: &Path, content: &str) -> Result<SourceUnit> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .context("failed to set C# language")?;
        let tree = parser
            .parse(content, None)
            .context("failed to parse C# file")?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(path = %path.display(), "syntax errors, keeping recoverable declarations");
        }

        let children = named_children(root);
        Ok(SourceUnit {
            imports: self.extract_imports(root, content),
            members: declarations(&children, content),
        })
    }
}

/// The namespace a using-directive brings in.
///
/// For `using Alias = Some.Namespace;` this is the aliased target, not the
/// alias itself.
fn using_target(node: Node, source: &str) -> Option<String> {
    let names: Vec<Node> = named_children(node)
        .into_iter()
        .filter(|n| NAME_KINDS.contains(&n.kind()))
        .collect();
    let mut cursor = node.walk();
    let is_alias = node.children(&mut cursor).any(|c| c.kind() == "=");
    // `using Alias = int;` names no namespace.
    if is_alias && names.len() < 2 {
        return None;
    }
    names
        .last()
        .map(|n| node_text(*n, source))
        .filter(|t| !t.is_empty())
}

/// Walk a sequence of sibling nodes and collect namespace and type declarations.
fn declarations(nodes: &[Node], source: &str) -> Vec<Declaration> {
    let mut out = Vec::new();

    for (i, node) in nodes.iter().enumerate() {
        match node.kind() {
            "namespace_declaration" => {
                let members = node
                    .child_by_field_name("body")
                    .or_else(|| first_child_of_kind(*node, "declaration_list"))
                    .map(|body| declarations(&named_children(body), source))
                    .unwrap_or_default();
                out.push(Declaration::Namespace(NamespaceDecl {
                    name: field_text(*node, "name", source).unwrap_or_default(),
                    file_scoped: false,
                    members,
                }));
            }
            "file_scoped_namespace_declaration" => {
                // Depending on the grammar version the namespace either owns
                // its declarations or they follow it as siblings.
                let mut members = declarations(&named_children(*node), source);
                members.extend(declarations(&nodes[i + 1..], source));
                out.push(Declaration::Namespace(NamespaceDecl {
                    name: field_text(*node, "name", source).unwrap_or_default(),
                    file_scoped: true,
                    members,
                }));
                break;
            }
            kind if kind.starts_with("preproc_") => {
                out.extend(declarations(&named_children(*node), source));
            }
            _ => out.extend(type_declaration(*node, source)),
        }
    }

    out
}

fn type_declaration(node: Node, source: &str) -> Option<Declaration> {
    let kind = match node.kind() {
        "class_declaration" => TypeKind::Class,
        "struct_declaration" => TypeKind::Struct,
        "interface_declaration" => TypeKind::Interface,
        "record_declaration" | "record_struct_declaration" => TypeKind::Record,
        "enum_declaration" => return enum_declaration(node, source).map(Declaration::Enum),
        _ => return None,
    };

    let identifier = field_text(node, "name", source)?;
    let type_params = first_child_of_kind(node, "type_parameter_list")
        .map(|list| type_parameter_names(list, source))
        .unwrap_or_default();
    let name = if type_params.is_empty() {
        identifier
    } else {
        format!("{identifier}<{}>", type_params.join(", "))
    };

    let mut decl = TypeDeclaration::new(name, kind);
    decl.modifiers = modifiers(node, source);
    decl.attributes = attributes(node, source);
    decl.bases = first_child_of_kind(node, "base_list")
        .map(|list| base_entries(list, source))
        .unwrap_or_default();

    if let Some(body) = node
        .child_by_field_name("body")
        .or_else(|| first_child_of_kind(node, "declaration_list"))
    {
        let mut constructors = Vec::new();
        collect_members(&named_children(body), source, &mut decl, &mut constructors);
        decl.methods.extend(constructors);
    }

    Some(Declaration::Type(decl))
}

/// Fill in a type's members from the nodes of its body.
///
/// Constructors are gathered separately so they follow the ordinary methods.
fn collect_members(
    nodes: &[Node],
    source: &str,
    decl: &mut TypeDeclaration,
    constructors: &mut Vec<MethodDecl>,
) {
    for node in nodes {
        match node.kind() {
            "field_declaration" => decl.fields.extend(field_declarations(*node, source)),
            "method_declaration" => decl.methods.push(method_declaration(*node, source)),
            "constructor_declaration" => {
                constructors.push(constructor_declaration(*node, source));
            }
            "property_declaration" => decl.properties.push(property_declaration(*node, source)),
            "event_field_declaration" => {
                let mods = modifiers(*node, source);
                if let Some(var_decl) = first_child_of_kind(*node, "variable_declaration") {
                    let ty = declared_type(var_decl, source);
                    for name in declarator_names(var_decl, source) {
                        decl.events.push(EventDecl {
                            name,
                            ty: ty.clone(),
                            modifiers: mods.clone(),
                        });
                    }
                }
            }
            "event_declaration" => decl.events.push(EventDecl {
                name: field_text(*node, "name", source).unwrap_or_default(),
                ty: field_text(*node, "type", source).unwrap_or_default(),
                modifiers: modifiers(*node, source),
            }),
            kind if kind.starts_with("preproc_") => {
                collect_members(&named_children(*node), source, decl, constructors);
            }
            _ => decl.nested.extend(type_declaration(*node, source)),
        }
    }
}

fn enum_declaration(node: Node, source: &str) -> Option<EnumDeclaration> {
    let name = field_text(node, "name", source)?;
    let members = node
        .child_by_field_name("body")
        .or_else(|| first_child_of_kind(node, "enum_member_declaration_list"))
        .map(|body| {
            named_children(body)
                .into_iter()
                .filter(|n| n.kind() == "enum_member_declaration")
                .filter_map(|n| {
                    field_text(n, "name", source)
                        .or_else(|| first_child_of_kind(n, "identifier").map(|id| node_text(id, source)))
                })
                .collect()
        })
        .unwrap_or_default();

    Some(EnumDeclaration {
        name,
        modifiers: modifiers(node, source),
        attributes: attributes(node, source),
        members,
    })
}

/// One field per declarator: `int a, b;` yields two fields.
fn field_declarations(node: Node, source: &str) -> Vec<FieldDecl> {
    let Some(var_decl) = first_child_of_kind(node, "variable_declaration") else {
        return Vec::new();
    };
    let ty = declared_type(var_decl, source);
    let mods = modifiers(node, source);
    let attrs = attributes(node, source);

    declarator_names(var_decl, source)
        .into_iter()
        .map(|name| FieldDecl {
            name,
            ty: ty.clone(),
            modifiers: mods.clone(),
            attributes: attrs.clone(),
        })
        .collect()
}

fn method_declaration(node: Node, source: &str) -> MethodDecl {
    MethodDecl {
        name: field_text(node, "name", source).unwrap_or_default(),
        return_type: field_text(node, "returns", source)
            .or_else(|| field_text(node, "type", source))
            .unwrap_or_default(),
        modifiers: modifiers(node, source),
        type_parameters: first_child_of_kind(node, "type_parameter_list")
            .map(|list| type_parameter_names(list, source))
            .unwrap_or_default(),
        parameters: parameters(node, source),
        attributes: attributes(node, source),
    }
}

fn constructor_declaration(node: Node, source: &str) -> MethodDecl {
    MethodDecl {
        name: ".ctor".to_string(),
        return_type: "void".to_string(),
        modifiers: modifiers(node, source),
        type_parameters: Vec::new(),
        parameters: parameters(node, source),
        attributes: attributes(node, source),
    }
}

fn property_declaration(node: Node, source: &str) -> PropertyDecl {
    let (has_getter, has_setter) = match first_child_of_kind(node, "accessor_list") {
        Some(list) => {
            let keywords: Vec<&str> = named_children(list)
                .into_iter()
                .filter(|n| n.kind() == "accessor_declaration")
                .filter_map(accessor_keyword)
                .collect();
            (
                keywords.contains(&"get"),
                keywords.iter().any(|k| *k == "set" || *k == "init"),
            )
        }
        // Expression-bodied: `public int Count => items.Count;`
        None => (first_child_of_kind(node, "arrow_expression_clause").is_some(), false),
    };

    PropertyDecl {
        name: field_text(node, "name", source).unwrap_or_default(),
        ty: field_text(node, "type", source).unwrap_or_default(),
        modifiers: modifiers(node, source),
        attributes: attributes(node, source),
        has_getter,
        has_setter,
    }
}

fn accessor_keyword(accessor: Node) -> Option<&'static str> {
    let mut cursor = accessor.walk();
    let keyword = accessor
        .children(&mut cursor)
        .find_map(|c| match c.kind() {
            "get" => Some("get"),
            "set" => Some("set"),
            "init" => Some("init"),
            _ => None,
        });
    keyword
}

fn parameters(node: Node, source: &str) -> Vec<ParameterDecl> {
    let Some(list) = node
        .child_by_field_name("parameters")
        .or_else(|| first_child_of_kind(node, "parameter_list"))
    else {
        return Vec::new();
    };

    named_children(list)
        .into_iter()
        .filter(|n| n.kind() == "parameter")
        .map(|param| ParameterDecl {
            name: field_text(param, "name", source).unwrap_or_default(),
            ty: field_text(param, "type", source).unwrap_or_else(|| "var".to_string()),
            default_value: first_child_of_kind(param, "equals_value_clause")
                .and_then(|clause| named_children(clause).into_iter().next())
                .map(|value| node_text(value, source)),
            modifier: parameter_modifier(param, source),
        })
        .collect()
}

fn parameter_modifier(param: Node, source: &str) -> Option<String> {
    let mut cursor = param.walk();
    let modifier = param.children(&mut cursor).find_map(|c| {
        if PARAMETER_MODIFIERS.contains(&c.kind()) {
            Some(c.kind().to_string())
        } else if c.kind() == "modifier" || c.kind() == "parameter_modifier" {
            Some(node_text(c, source))
        } else {
            None
        }
    });
    modifier
}

/// Base list entries as written, in source order.
fn base_entries(list: Node, source: &str) -> Vec<String> {
    named_children(list)
        .into_iter()
        .filter(|n| n.kind() != "comment")
        .map(|n| {
            if n.kind() == "primary_constructor_base_type" {
                // `Base(args)` in a record or class with a primary constructor
                n.child_by_field_name("type")
                    .or_else(|| named_children(n).into_iter().next())
                    .map(|t| node_text(t, source))
                    .unwrap_or_default()
            } else {
                node_text(n, source)
            }
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn type_parameter_names(list: Node, source: &str) -> Vec<String> {
    named_children(list)
        .into_iter()
        .filter(|n| n.kind() == "type_parameter")
        .filter_map(|p| {
            field_text(p, "name", source).or_else(|| {
                named_children(p)
                    .into_iter()
                    .rev()
                    .find(|c| c.kind() == "identifier")
                    .map(|c| node_text(c, source))
            })
        })
        .collect()
}

fn declared_type(var_decl: Node, source: &str) -> String {
    field_text(var_decl, "type", source)
        .or_else(|| named_children(var_decl).into_iter().next().map(|n| node_text(n, source)))
        .unwrap_or_default()
}

fn declarator_names(var_decl: Node, source: &str) -> Vec<String> {
    named_children(var_decl)
        .into_iter()
        .filter(|n| n.kind() == "variable_declarator")
        .filter_map(|d| {
            field_text(d, "name", source)
                .or_else(|| first_child_of_kind(d, "identifier").map(|id| node_text(id, source)))
        })
        .collect()
}

fn modifiers(node: Node, source: &str) -> Vec<String> {
    named_children(node)
        .into_iter()
        .filter(|n| n.kind() == "modifier")
        .map(|n| node_text(n, source))
        .collect()
}

fn attributes(node: Node, source: &str) -> Vec<AttributeDecl> {
    named_children(node)
        .into_iter()
        .filter(|n| n.kind() == "attribute_list")
        .flat_map(named_children)
        .filter(|n| n.kind() == "attribute")
        .map(|attr| AttributeDecl {
            name: field_text(attr, "name", source)
                .or_else(|| named_children(attr).into_iter().next().map(|n| node_text(n, source)))
                .unwrap_or_default(),
            arguments: first_child_of_kind(attr, "attribute_argument_list")
                .map(|args| {
                    named_children(args)
                        .into_iter()
                        .filter(|a| a.kind() == "attribute_argument")
                        .map(|a| node_text(a, source))
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn first_child_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    named_children(node).into_iter().find(|n| n.kind() == kind)
}

fn field_text(node: Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field).map(|n| node_text(n, source))
}

/// Extract text from a tree-sitter node, with runs of whitespace collapsed.
fn node_text(node: Node, source: &str) -> String {
    source[node.byte_range()]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(content: &str) -> SourceUnit {
        let analyzer = CSharpAnalyzer::new().unwrap();
        analyzer
            .parse_source(&PathBuf::from("Assets/Scripts/Test.cs"), content)
            .unwrap()
    }

    fn types_in(unit: &SourceUnit) -> Vec<&TypeDeclaration> {
        fn walk<'a>(decls: &'a [Declaration], out: &mut Vec<&'a TypeDeclaration>) {
            for decl in decls {
                if let Declaration::Type(ty) = decl {
                    out.push(ty);
                }
                walk(decl.children(), out);
            }
        }
        let mut out = Vec::new();
        walk(&unit.members, &mut out);
        out
    }

    fn find<'a>(unit: &'a SourceUnit, name: &str) -> &'a TypeDeclaration {
        types_in(unit)
            .into_iter()
            .find(|t| t.name == name)
            .unwrap_or_else(|| panic!("should find type {name}"))
    }

    #[test]
    fn test_analyzer_metadata() {
        let analyzer = CSharpAnalyzer::new().unwrap();
        assert_eq!(analyzer.language(), "csharp");
        assert!(analyzer.handles(Path::new("Assets/Player.cs")));
        assert!(!analyzer.handles(Path::new("Assets/Player.cs.meta")));
    }

    #[test]
    fn test_block_namespace_and_usings() {
        let unit = parse(
            r#"
using System.Collections;
using UnityEngine;

namespace Game.Core
{
    public class Player : MonoBehaviour
    {
    }
}
"#,
        );
        assert_eq!(unit.imports, vec!["System.Collections", "UnityEngine"]);
        match &unit.members[0] {
            Declaration::Namespace(ns) => {
                assert_eq!(ns.name, "Game.Core");
                assert!(!ns.file_scoped);
                assert_eq!(ns.members.len(), 1);
            }
            other => panic!("expected namespace, got {other:?}"),
        }
        let player = find(&unit, "Player");
        assert_eq!(player.kind, TypeKind::Class);
        assert_eq!(player.base_type(), Some("MonoBehaviour"));
        assert!(player.modifiers.contains(&"public".to_string()));
    }

    #[test]
    fn test_file_scoped_namespace_owns_following_types() {
        let unit = parse(
            r#"
using UnityEngine;

namespace Game.Data;

public class Settings : ScriptableObject { }

public enum Difficulty { Easy, Normal, Hard }
"#,
        );
        assert_eq!(unit.members.len(), 1);
        let Declaration::Namespace(ns) = &unit.members[0] else {
            panic!("expected namespace");
        };
        assert_eq!(ns.name, "Game.Data");
        assert!(ns.file_scoped);
        assert_eq!(ns.members.len(), 2);
        assert!(matches!(&ns.members[1], Declaration::Enum(e) if e.members == ["Easy", "Normal", "Hard"]));
    }

    #[test]
    fn test_usings_inside_namespace_and_aliases() {
        let unit = parse(
            r#"
using Random = UnityEngine.Random;

namespace Game.Play
{
    using Game.Core;

    public class Spawner { }
}
"#,
        );
        assert_eq!(unit.imports, vec!["UnityEngine.Random", "Game.Core"]);
    }

    #[test]
    fn test_members_are_extracted() {
        let unit = parse(
            r#"
using System.Collections;
using System.Threading.Tasks;
using UnityEngine;

public class Enemy : MonoBehaviour, IDamageable
{
    [SerializeField] private float speed = 2f;
    public int health, armor;
    private static int count;

    public event System.Action Died;

    public int Health { get; private set; }
    public bool IsAlive => health > 0;

    public Enemy(int health) { this.health = health; }

    private void Update() { }

    private IEnumerator Blink(float duration) { yield return null; }

    public async Task<bool> LoadAsync<T>(string key) { return true; }
}
"#,
        );
        let enemy = find(&unit, "Enemy");
        assert_eq!(enemy.base_type(), Some("MonoBehaviour"));
        assert_eq!(enemy.interfaces(), ["IDamageable"]);

        let fields: Vec<&str> = enemy.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["speed", "health", "armor", "count"]);
        assert_eq!(enemy.fields[0].ty, "float");
        assert_eq!(enemy.fields[0].attributes[0].name, "SerializeField");
        assert!(enemy.fields[3].has_modifier("static"));

        let methods: Vec<&str> = enemy.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, ["Update", "Blink", "LoadAsync", ".ctor"]);
        let blink = &enemy.methods[1];
        assert_eq!(blink.return_type, "IEnumerator");
        assert_eq!(blink.parameters[0].name, "duration");
        assert_eq!(blink.parameters[0].ty, "float");
        let load = &enemy.methods[2];
        assert!(load.modifiers.contains(&"async".to_string()));
        assert_eq!(load.type_parameters, ["T"]);
        assert_eq!(enemy.methods[3].return_type, "void");

        let health = enemy.properties.iter().find(|p| p.name == "Health").unwrap();
        assert!(health.has_getter && health.has_setter);
        let alive = enemy.properties.iter().find(|p| p.name == "IsAlive").unwrap();
        assert!(alive.has_getter && !alive.has_setter);

        assert_eq!(enemy.events.len(), 1);
        assert_eq!(enemy.events[0].name, "Died");
    }

    #[test]
    fn test_nested_and_generic_types() {
        let unit = parse(
            r#"
public class Pool<T, U> where T : class
{
    private class Slot { }
    public struct Handle { }
    public enum State { Idle, Busy }
}
"#,
        );
        let pool = find(&unit, "Pool<T, U>");
        assert_eq!(pool.nested.len(), 3);
        assert_eq!(find(&unit, "Handle").kind, TypeKind::Struct);
        assert!(matches!(&pool.nested[2], Declaration::Enum(e) if e.name == "State"));
    }

    #[test]
    fn test_interface_bases() {
        let unit = parse("public interface IRepository : IDisposable, IEnumerable { void Save(); }");
        let repo = find(&unit, "IRepository");
        assert_eq!(repo.kind, TypeKind::Interface);
        assert_eq!(repo.base_type(), None);
        assert_eq!(repo.interfaces(), ["IDisposable", "IEnumerable"]);
        assert_eq!(repo.methods[0].name, "Save");
    }

    #[test]
    fn test_class_attributes_with_arguments() {
        let unit = parse(
            r#"
[CreateAssetMenu(fileName = "Weapon", menuName = "Game/Weapon")]
public class WeaponData : ScriptableObject { }
"#,
        );
        let weapon = find(&unit, "WeaponData");
        assert_eq!(weapon.attributes.len(), 1);
        assert_eq!(weapon.attributes[0].name, "CreateAssetMenu");
        assert_eq!(weapon.attributes[0].arguments.len(), 2);
    }

    #[test]
    fn test_empty_file() {
        let unit = parse("");
        assert!(unit.imports.is_empty());
        assert!(unit.members.is_empty());
    }

    #[test]
    fn test_classified_through_core() {
        let unit = parse(
            r#"
using UnityEditor;

namespace Game.Tools
{
    [CustomEditor(typeof(Player))]
    public class PlayerInspector : Editor { }
}
"#,
        );
        let classifier = unimap_core::TypeClassifier::default();
        let record = unimap_core::file::aggregate_file("Editor/PlayerInspector.cs", &unit, &classifier);
        assert_eq!(record.namespace.as_deref(), Some("Game.Tools"));
        assert_eq!(
            record.types[0].category,
            unimap_core::TypeCategory::EditorTooling
        );
    }
}
