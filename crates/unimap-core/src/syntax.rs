//! Syntactic shape of a parsed source file, as handed over by a
//! [`SourceAnalyzer`](crate::analyzer::SourceAnalyzer).
//!
//! Nothing here is classified or deduplicated yet; the file aggregator turns
//! a [`SourceUnit`] into a [`FileRecord`](crate::types::FileRecord).

/// Everything a source file declares at its top level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceUnit {
    /// Targets of using-directives in source order, duplicates included.
    pub imports: Vec<String>,
    pub members: Vec<Declaration>,
}

/// A node of the declaration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Namespace(NamespaceDecl),
    Type(TypeDeclaration),
    Enum(EnumDeclaration),
}

impl Declaration {
    /// Direct children of this node in the declaration tree.
    pub fn children(&self) -> &[Declaration] {
        match self {
            Declaration::Namespace(ns) => &ns.members,
            Declaration::Type(decl) => &decl.nested,
            Declaration::Enum(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: String,
    /// `namespace Foo;` rather than `namespace Foo { ... }`
    pub file_scoped: bool,
    pub members: Vec<Declaration>,
}

/// Kind of a class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Record,
}

/// A class, interface, struct or record declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    /// Identifier plus type parameter list, e.g. `Pool<T>`.
    pub name: String,
    pub kind: TypeKind,
    pub modifiers: Vec<String>,
    /// Base list entries in source order.
    pub bases: Vec<String>,
    pub attributes: Vec<AttributeDecl>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub properties: Vec<PropertyDecl>,
    pub events: Vec<EventDecl>,
    pub nested: Vec<Declaration>,
}

impl TypeDeclaration {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: Vec::new(),
            bases: Vec::new(),
            attributes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// The base class, if the base list names one.
    ///
    /// Interfaces only list other interfaces, so they never have a base type.
    /// For everything else the first base list entry is taken as the base.
    pub fn base_type(&self) -> Option<&str> {
        match self.kind {
            TypeKind::Interface => None,
            _ => self.bases.first().map(String::as_str),
        }
    }

    /// Implemented (or, for interfaces, extended) interfaces.
    pub fn interfaces(&self) -> &[String] {
        match self.kind {
            TypeKind::Interface => &self.bases,
            _ => self.bases.get(1..).unwrap_or(&[]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDeclaration {
    pub name: String,
    pub modifiers: Vec<String>,
    pub attributes: Vec<AttributeDecl>,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: String,
    pub arguments: Vec<String>,
}

impl AttributeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: String,
    pub modifiers: Vec<String>,
    pub attributes: Vec<AttributeDecl>,
}

impl FieldDecl {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub return_type: String,
    pub modifiers: Vec<String>,
    pub type_parameters: Vec<String>,
    pub parameters: Vec<ParameterDecl>,
    pub attributes: Vec<AttributeDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    pub name: String,
    pub ty: String,
    pub default_value: Option<String>,
    /// `ref`, `out`, `in`, `params` or `this`
    pub modifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: String,
    pub modifiers: Vec<String>,
    pub attributes: Vec<AttributeDecl>,
    pub has_getter: bool,
    pub has_setter: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDecl {
    pub name: String,
    pub ty: String,
    pub modifiers: Vec<String>,
}
