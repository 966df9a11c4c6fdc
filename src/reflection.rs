//! Reflected program elements and the store they are looked up in.
//!
//! Acquiring reflection data (parsing source files) happens elsewhere; the
//! engine only reads [`Element`]s through a [`ReflectionStore`].

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::annotations::AnnotationMap;

pub mod memory;

pub use memory::MemoryStore;

/// Namespace separator.
pub const NS_SEPARATOR: char = '\\';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    #[default]
    Class,
    Interface,
    Method,
    Property,
    ClassConstant,
    Function,
    Constant,
    Namespace,
}

impl ElementKind {
    pub fn is_class_like(self) -> bool {
        matches!(self, Self::Class | Self::Interface)
    }

    pub fn is_member(self) -> bool {
        matches!(self, Self::Method | Self::Property | Self::ClassConstant)
    }
}

/// A reflected class, member, function, constant or namespace.
///
/// Top-level elements carry their fully qualified name in `name`; members
/// carry their bare name and point at their class through `declaring_class`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Element {
    pub kind: ElementKind,
    pub name: String,
    pub namespace: String,
    pub declaring_class: Option<String>,
    /// Parent class, for member inheritance
    pub parent: Option<String>,
    /// `use` aliases in effect where the element is declared: alias => FQN
    pub aliases: BTreeMap<String, String>,
    pub documented: bool,
    pub start_line: usize,
    pub doc_comment: Option<String>,
    /// Source file path relative to the project root
    pub file: Option<String>,
    pub annotations: AnnotationMap,
    pub members: Vec<Element>,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            kind: ElementKind::Class,
            name: String::new(),
            namespace: String::new(),
            declaring_class: None,
            parent: None,
            aliases: BTreeMap::new(),
            documented: true,
            start_line: 0,
            doc_comment: None,
            file: None,
            annotations: AnnotationMap::new(),
            members: Vec::new(),
        }
    }
}

impl Element {
    pub fn new(kind: ElementKind, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.trim_start_matches(NS_SEPARATOR).to_string();
        let namespace = match kind {
            ElementKind::Namespace => name.clone(),
            k if k.is_member() => String::new(),
            _ => namespace_of(&name).to_string(),
        };
        Self {
            kind,
            name,
            namespace,
            ..Self::default()
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Class, name)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Interface, name)
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Function, name)
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Constant, name)
    }

    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Namespace, name)
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Method, name)
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Property, name)
    }

    pub fn class_constant(name: impl Into<String>) -> Self {
        Self::new(ElementKind::ClassConstant, name)
    }

    pub fn with_annotation(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.push(tag, value);
        self
    }

    pub fn with_member(mut self, member: Element) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    pub fn with_doc_comment(mut self, doc_comment: impl Into<String>) -> Self {
        self.doc_comment = Some(doc_comment.into());
        self
    }

    pub fn at(mut self, file: impl Into<String>, start_line: usize) -> Self {
        self.file = Some(file.into());
        self.start_line = start_line;
        self
    }

    pub fn undocumented(mut self) -> Self {
        self.documented = false;
        self
    }

    /// Name without its namespace.
    pub fn short_name(&self) -> &str {
        match self.name.rfind(NS_SEPARATOR) {
            Some(pos) => &self.name[pos + 1..],
            None => &self.name,
        }
    }

    /// Number of source lines taken by the attached doc comment.
    pub fn doc_comment_lines(&self) -> usize {
        self.doc_comment
            .as_deref()
            .map_or(0, |doc| doc.matches('\n').count() + 1)
    }

    /// Package from the `@package` annotation, without its description.
    pub fn package(&self) -> Option<&str> {
        self.annotations
            .first("package")
            .and_then(|value| value.split_whitespace().next())
    }

    /// Look up an alias of this element's file.
    pub fn alias(&self, alias: &str) -> Option<&str> {
        lookup_alias(&self.aliases, alias)
    }
}

/// Target of `alias` in a `use` table; alias names are case-insensitive.
pub fn lookup_alias<'t>(aliases: &'t BTreeMap<String, String>, alias: &str) -> Option<&'t str> {
    aliases
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(alias))
        .map(|(_, target)| target.as_str())
}

/// Namespace part of a qualified name, "" for the global namespace.
pub fn namespace_of(name: &str) -> &str {
    let name = name.trim_start_matches(NS_SEPARATOR);
    match name.rfind(NS_SEPARATOR) {
        Some(pos) => &name[..pos],
        None => "",
    }
}

/// Read access to reflected elements.
///
/// Class and function names are matched case-insensitively, constant names
/// exactly. Names may carry a leading namespace separator.
pub trait ReflectionStore: Send + Sync {
    fn class(&self, name: &str) -> Option<&Element>;

    fn function(&self, name: &str) -> Option<&Element>;

    fn constant(&self, name: &str) -> Option<&Element>;

    /// Member of a class or one of its ancestors.
    fn member(&self, class: &str, kind: ElementKind, name: &str) -> Option<&Element> {
        let mut current = self.class(class);
        // Parent chains in reflection data can be cyclic when broken
        let mut hops = 0;
        while let Some(owner) = current {
            let found = owner.members.iter().find(|m| {
                m.kind == kind
                    && match kind {
                        ElementKind::Method => m.name.eq_ignore_ascii_case(name),
                        _ => m.name == name,
                    }
            });
            if found.is_some() {
                return found;
            }
            hops += 1;
            if hops > 64 {
                log::warn!("Parent chain of {} is too deep, stopping lookup", owner.name);
                return None;
            }
            current = owner.parent.as_deref().and_then(|p| self.class(p));
        }
        None
    }

    fn property(&self, class: &str, name: &str) -> Option<&Element> {
        self.member(class, ElementKind::Property, name)
    }

    fn method(&self, class: &str, name: &str) -> Option<&Element> {
        self.member(class, ElementKind::Method, name)
    }

    fn class_constant(&self, class: &str, name: &str) -> Option<&Element> {
        self.member(class, ElementKind::ClassConstant, name)
    }
}
