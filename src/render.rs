//! The explicit rendering context handed to tag processors.
//!
//! Plugins never look up "the element being documented" from shared state;
//! they receive a [`RenderContext`] naming it, together with the helpers they
//! need to produce links and render nested documentation.

use std::ops::Range;

use crate::config::Config;
use crate::engine::AnnotationEngine;
use crate::error::AnnotationError;
use crate::inline_tags::find_inline_tags;
use crate::links::{LinkBuilder, anchor, escape_html};
use crate::markup::InlineHandler;
use crate::reflection::Element;
use crate::resolver::{CrossReferenceResolver, Target};

/// Scalar type aliases and their display names.
const TYPE_NAMES: &[(&str, &str)] = &[
    ("int", "integer"),
    ("bool", "boolean"),
    ("double", "float"),
    ("void", ""),
    ("FALSE", "false"),
    ("TRUE", "true"),
    ("NULL", "null"),
];

/// Display name of a type: scalar aliases normalized, leading `\` dropped.
pub fn type_name(name: &str) -> &str {
    let name = name.trim_start_matches('\\');
    TYPE_NAMES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(name, |(_, display)| display)
}

/// Split a tag value into its first word and the trimmed rest.
pub fn split(value: &str) -> (&str, &str) {
    let value = value.trim_start();
    match value.find(char::is_whitespace) {
        Some(pos) => (&value[..pos], value[pos..].trim()),
        None => (value, ""),
    }
}

#[derive(Clone, Copy)]
pub struct RenderContext<'e> {
    engine: &'e AnnotationEngine<'e>,
    element: Option<&'e Element>,
}

impl<'e> RenderContext<'e> {
    pub fn new(engine: &'e AnnotationEngine<'e>, element: Option<&'e Element>) -> Self {
        Self { engine, element }
    }

    /// The element being documented, if any.
    pub fn element(&self) -> Option<&'e Element> {
        self.element
    }

    pub fn engine(&self) -> &'e AnnotationEngine<'e> {
        self.engine
    }

    pub fn config(&self) -> &'e Config {
        self.engine.config()
    }

    pub fn links(&self) -> &'e LinkBuilder {
        self.engine.links()
    }

    pub fn resolver(&self) -> CrossReferenceResolver<'e> {
        self.engine.resolver()
    }

    pub fn escape(&self, text: &str) -> String {
        escape_html(text)
    }

    pub fn split<'v>(&self, value: &'v str) -> (&'v str, &'v str) {
        split(value)
    }

    pub fn link(&self, href: &str, text: &str) -> String {
        anchor(href, text)
    }

    pub fn resolve(&self, reference: &str) -> Option<Target<'e>> {
        self.resolver().resolve(reference, self.element)
    }

    /// Link for a cross-reference, `None` when nothing matches.
    pub fn resolve_link(&self, reference: &str) -> Option<String> {
        self.resolver().link(reference, self.element)
    }

    /// Render the type list at the start of a tag value (`int|Foo[] $x ...`),
    /// linking documented classes and normalizing scalar names.
    pub fn type_links(&self, value: &str) -> String {
        let (types, _) = split(value);
        if types.is_empty() || types.starts_with('$') {
            return "mixed".to_string();
        }

        let resolver = self.resolver();
        types
            .split('|')
            .filter_map(|part| {
                let base = part.trim_end_matches("[]");
                let suffix = &part[base.len()..];
                let rendered = match resolver.resolve_class_ref(base, self.element) {
                    Some(class) => {
                        let url = self.links().class_url(&class.name);
                        format!("{}{}", anchor(&url, &class.name), suffix)
                    }
                    None => escape_html(type_name(part)),
                };
                (!rendered.is_empty()).then_some(rendered)
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Description part of a typed tag value, without the type and a leading
    /// `$variable`, rendered as a documentation line.
    pub fn description(&self, value: &str) -> Result<String, AnnotationError> {
        let (_, rest) = split(value);
        let rest = match rest.strip_prefix('$') {
            Some(variable) => {
                let end = variable
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(variable.len());
                variable[end..].trim_start()
            }
            None => rest,
        };
        if rest.is_empty() {
            return Ok(String::new());
        }
        self.doc_line(rest)
    }

    /// Render one line of documentation; the markup engine expands inline
    /// tags through this context.
    pub fn doc_line(&self, text: &str) -> Result<String, AnnotationError> {
        self.engine.markup().render_line(text, self)
    }

    /// Render a documentation block, expanding inline tags as in
    /// [`doc_line`](Self::doc_line).
    pub fn doc_block(&self, text: &str) -> Result<String, AnnotationError> {
        self.engine.markup().render_block(text, self)
    }
}

impl InlineHandler for RenderContext<'_> {
    fn find(&self, text: &str) -> Vec<Range<usize>> {
        find_inline_tags(text).into_iter().map(|m| m.range).collect()
    }

    fn expand(&self, token: &str) -> Result<String, AnnotationError> {
        self.engine.inline_expander().expand_token(token, self)
    }
}
