//! Cross-reference resolution.
//!
//! Turns references written in documentation (`Foo`, `\Vendor\Foo`,
//! `Foo::bar()`, `Foo->$baz`, `strlen`, `PHP_EOL`, `$prop`, `method()`) into
//! links, relative to the element being documented.

use std::collections::BTreeMap;

use crate::links::{LinkBuilder, anchor};
use crate::reflection::{Element, ElementKind, NS_SEPARATOR, ReflectionStore, lookup_alias};

/// Expand a class name to its fully qualified form using `use` aliases and
/// the current namespace.
pub fn resolve_class_fqn(
    name: &str,
    aliases: &BTreeMap<String, String>,
    namespace: &str,
) -> String {
    if let Some(absolute) = name.strip_prefix(NS_SEPARATOR) {
        return absolute.to_string();
    }

    let (first, rest) = match name.find(NS_SEPARATOR) {
        Some(pos) => (&name[..pos], &name[pos..]),
        None => (name, ""),
    };
    if let Some(target) = lookup_alias(aliases, first) {
        return format!("{}{rest}", target.trim_start_matches(NS_SEPARATOR));
    }

    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}{NS_SEPARATOR}{name}")
    }
}

/// What a reference resolved to.
#[derive(Debug, Clone, Copy)]
pub enum Target<'s> {
    Class(&'s Element),
    Function(&'s Element),
    Constant(&'s Element),
    /// Property, method or class constant; always carries its declaring class
    Member(&'s Element),
}

impl<'s> Target<'s> {
    pub fn element(&self) -> &'s Element {
        match *self {
            Target::Class(e) | Target::Function(e) | Target::Constant(e) | Target::Member(e) => e,
        }
    }

    /// Visible link text.
    pub fn display_name(&self) -> String {
        let element = self.element();
        match self {
            Target::Member(member) => {
                let class = member.declaring_class.as_deref().unwrap_or_default();
                match member.kind {
                    ElementKind::Property => format!("{class}::${}", member.name),
                    ElementKind::Method => format!("{class}::{}()", member.name),
                    _ => format!("{class}::{}", member.name),
                }
            }
            _ => element.name.clone(),
        }
    }

    pub fn url(&self, links: &LinkBuilder) -> Option<String> {
        links.element_url(self.element())
    }
}

static NO_ALIASES: BTreeMap<String, String> = BTreeMap::new();

/// Namespace, aliases and class scope derived from a context element.
struct Scope<'c> {
    namespace: &'c str,
    aliases: &'c BTreeMap<String, String>,
    class: Option<&'c str>,
}

pub struct CrossReferenceResolver<'a> {
    store: &'a dyn ReflectionStore,
    links: &'a LinkBuilder,
}

impl<'a> CrossReferenceResolver<'a> {
    pub fn new(store: &'a dyn ReflectionStore, links: &'a LinkBuilder) -> Self {
        Self { store, links }
    }

    /// Documented class `namespace\name`, else documented class `name`.
    ///
    /// A leading separator forces the global namespace.
    pub fn resolve_class(&self, name: &str, namespace: &str) -> Option<&'a Element> {
        let (name, namespace) = match name.strip_prefix(NS_SEPARATOR) {
            Some(absolute) => (absolute, ""),
            None => (name, namespace),
        };
        if name.is_empty() {
            return None;
        }
        let qualified = format!("{namespace}{NS_SEPARATOR}{name}");
        self.store
            .class(&qualified)
            .or_else(|| self.store.class(name))
            .filter(|class| class.documented)
    }

    pub fn resolve_function(&self, name: &str, namespace: &str) -> Option<&'a Element> {
        let (name, namespace) = match name.strip_prefix(NS_SEPARATOR) {
            Some(absolute) => (absolute, ""),
            None => (name, namespace),
        };
        let qualified = format!("{namespace}{NS_SEPARATOR}{name}");
        self.store
            .function(&qualified)
            .or_else(|| self.store.function(name))
    }

    pub fn resolve_constant(&self, name: &str, namespace: &str) -> Option<&'a Element> {
        let (name, namespace) = match name.strip_prefix(NS_SEPARATOR) {
            Some(absolute) => (absolute, ""),
            None => (name, namespace),
        };
        let qualified = format!("{namespace}{NS_SEPARATOR}{name}");
        self.store
            .constant(&qualified)
            .or_else(|| self.store.constant(name))
    }

    fn scope<'c>(&self, context: Option<&'c Element>) -> Scope<'c>
    where
        'a: 'c,
    {
        let Some(context) = context else {
            return Scope {
                namespace: "",
                aliases: &NO_ALIASES,
                class: None,
            };
        };

        let class = match context.kind {
            ElementKind::Class | ElementKind::Interface => Some(context.name.as_str()),
            ElementKind::Method | ElementKind::Property | ElementKind::ClassConstant => {
                context.declaring_class.as_deref()
            }
            _ => None,
        };
        // Members resolve names the way their class does
        let source = match (context.kind.is_member(), class) {
            (true, Some(name)) => self.store.class(name).unwrap_or(context),
            _ => context,
        };

        Scope {
            namespace: &source.namespace,
            aliases: &source.aliases,
            class,
        }
    }

    fn class_in_scope(&self, name: &str, scope: &Scope<'_>) -> Option<&'a Element> {
        let fqn = resolve_class_fqn(name, scope.aliases, scope.namespace);
        self.resolve_class(&fqn, scope.namespace)
            .or_else(|| self.resolve_class(name, scope.namespace))
    }

    /// Documented class named relative to `context`: the alias-expanded name
    /// first, then the name as written.
    pub fn resolve_class_ref(
        &self,
        name: &str,
        context: Option<&Element>,
    ) -> Option<&'a Element> {
        let scope = self.scope(context);
        self.class_in_scope(name, &scope)
    }

    /// Resolve a reference relative to `context`. `None` is a miss.
    pub fn resolve(&self, reference: &str, context: Option<&Element>) -> Option<Target<'a>> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        let scope = self.scope(context);

        let member_split = reference
            .find("::")
            .filter(|&pos| pos > 0)
            .or_else(|| reference.find("->").filter(|&pos| pos > 0));
        if let Some(pos) = member_split {
            let class_part = &reference[..pos];
            let member_part = &reference[pos + 2..];
            let class = self
                .resolve_class(class_part, scope.namespace)
                .or_else(|| {
                    let fqn = resolve_class_fqn(class_part, scope.aliases, scope.namespace);
                    self.resolve_class(&fqn, "")
                });
            let Some(class) = class else {
                log::trace!("No documented class for {}", reference);
                return None;
            };
            return self.resolve_member(&class.name, member_part);
        }

        if let Some(class) = self.class_in_scope(reference, &scope) {
            return Some(Target::Class(class));
        }

        if let Some(function) = self.resolve_function(reference, scope.namespace) {
            return Some(Target::Function(function));
        }

        if let Some(constant) = self.resolve_constant(reference, scope.namespace) {
            return Some(Target::Constant(constant));
        }

        let class = scope.class?;
        if !self.store.class(class).is_some_and(|c| c.documented) {
            return None;
        }
        self.resolve_member(class, reference)
    }

    fn resolve_member(&self, class: &str, member: &str) -> Option<Target<'a>> {
        let store = self.store;
        let found = store
            .property(class, member)
            .or_else(|| {
                member
                    .strip_prefix('$')
                    .and_then(|name| store.property(class, name))
            })
            .or_else(|| store.method(class, member))
            .or_else(|| {
                member
                    .strip_suffix("()")
                    .and_then(|name| store.method(class, name))
            })
            .or_else(|| store.class_constant(class, member));

        if found.is_none() {
            log::trace!("No member {} in {}", member, class);
        }
        found.map(Target::Member)
    }

    /// Rendered link for a reference, `None` on a miss.
    pub fn link(&self, reference: &str, context: Option<&Element>) -> Option<String> {
        let target = self.resolve(reference, context)?;
        let url = target.url(self.links)?;
        Some(anchor(&url, &target.display_name()))
    }
}
