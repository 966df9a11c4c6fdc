use std::collections::HashMap;

use super::{Element, ElementKind, NS_SEPARATOR, ReflectionStore, namespace_of};

/// Reflection store backed by in-memory elements.
///
/// Used by tests and by callers that already hold reflection data, e.g. a
/// JSON dump produced by a separate parser.
#[derive(Debug, Default)]
pub struct MemoryStore {
    elements: Vec<Element>,
    classes: HashMap<String, usize>,
    functions: HashMap<String, usize>,
    constants: HashMap<String, usize>,
}

fn class_key(name: &str) -> String {
    name.trim_start_matches(NS_SEPARATOR).to_lowercase()
}

fn constant_key(name: &str) -> String {
    name.trim_start_matches(NS_SEPARATOR).to_string()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of elements.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let elements: Vec<Element> = serde_json::from_str(json)?;
        let mut store = Self::new();
        for element in elements {
            store.add(element);
        }
        log::debug!("Loaded {} elements from JSON", store.elements.len());
        Ok(store)
    }

    /// Add an element, filling in the derived fields of its members.
    ///
    /// A later element with the same name replaces the earlier one in lookups.
    pub fn add(&mut self, mut element: Element) {
        element.name = element.name.trim_start_matches(NS_SEPARATOR).to_string();
        if element.namespace.is_empty() && element.kind != ElementKind::Namespace {
            element.namespace = namespace_of(&element.name).to_string();
        }
        for member in &mut element.members {
            member.declaring_class = Some(element.name.clone());
            member.namespace = element.namespace.clone();
            if member.aliases.is_empty() {
                member.aliases = element.aliases.clone();
            }
            if member.file.is_none() {
                member.file = element.file.clone();
            }
        }

        let index = self.elements.len();
        let table = match element.kind {
            ElementKind::Class | ElementKind::Interface => {
                Some((&mut self.classes, class_key(&element.name)))
            }
            ElementKind::Function => Some((&mut self.functions, class_key(&element.name))),
            ElementKind::Constant => Some((&mut self.constants, constant_key(&element.name))),
            _ => None,
        };
        if let Some((table, key)) = table {
            log::trace!("Indexed {:?} {}", element.kind, element.name);
            table.insert(key, index);
        }
        self.elements.push(element);
    }

    pub fn with(mut self, element: Element) -> Self {
        self.add(element);
        self
    }

    /// All elements in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
}

impl ReflectionStore for MemoryStore {
    fn class(&self, name: &str) -> Option<&Element> {
        self.classes.get(&class_key(name)).map(|&i| &self.elements[i])
    }

    fn function(&self, name: &str) -> Option<&Element> {
        self.functions.get(&class_key(name)).map(|&i| &self.elements[i])
    }

    fn constant(&self, name: &str) -> Option<&Element> {
        self.constants
            .get(&constant_key(name))
            .map(|&i| &self.elements[i])
    }
}
