//! The built-in plugin, registered before any configured plugin.

use std::sync::Arc;

use indexmap::IndexMap;

use super::registry::{tag_lookup_key, wildcard_matches};
use super::{PluginDescriptor, SourceLinkProvider, TagKind, TagKinds, TagProcessor};
use crate::config::Config;
use crate::error::AnnotationError;
use crate::links::{LinkBuilder, sanitize_name};
use crate::reflection::{Element, ElementKind};
use crate::render::RenderContext;

/// Block tags that are understood but never shown.
const IGNORED_TAGS: &[&str] = &[
    "method",
    "abstract",
    "access",
    "final",
    "filesource",
    "global",
    "name",
    "static",
    "staticvar",
];

/// `@property`, `@property-read`, `@property-write`
const IGNORED_WILDCARD: &str = "property";

/// Source page name of an element without the template around it:
/// `function-` / `constant-` prefixed for free functions and constants,
/// the declaring class for members.
pub(crate) fn source_file_base(element: &Element) -> Option<String> {
    let (prefix, name) = match element.kind {
        ElementKind::Class | ElementKind::Interface => ("", element.name.as_str()),
        ElementKind::Function => ("function-", element.name.as_str()),
        ElementKind::Constant => ("constant-", element.name.as_str()),
        ElementKind::Method | ElementKind::Property | ElementKind::ClassConstant => {
            ("", element.declaring_class.as_deref()?)
        }
        ElementKind::Namespace => return None,
    };
    Some(format!("{prefix}{}", sanitize_name(name)))
}

/// Line the source link points at: the start of the doc comment when there
/// is one, the declaration otherwise.
pub(crate) fn declaration_line(element: &Element) -> usize {
    element
        .start_line
        .saturating_sub(element.doc_comment_lines())
}

pub struct DefaultPlugin {
    links: LinkBuilder,
}

impl DefaultPlugin {
    pub fn new(config: &Config) -> Self {
        Self {
            links: LinkBuilder::new(config.templates.clone()),
        }
    }

    pub fn into_descriptor(self) -> PluginDescriptor {
        let plugin = Arc::new(self);
        PluginDescriptor::new("default")
            .with_source_link(plugin.clone())
            .with_tags(plugin)
    }

    fn uses(&self, value: &str, ctx: &RenderContext<'_>) -> String {
        let (reference, description) = ctx.split(value);
        let Some(link) = ctx.resolve_link(reference) else {
            return ctx.escape(value);
        };
        if description.is_empty() {
            return format!("<code>{link}</code>");
        }
        let separator = match ctx.element() {
            Some(element) if element.kind.is_class_like() => " ",
            _ => "<br />",
        };
        format!("<code>{link}</code>{separator}{}", ctx.escape(description))
    }

    fn with_description(
        &self,
        link: String,
        description: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<String, AnnotationError> {
        if description.is_empty() {
            return Ok(link);
        }
        Ok(format!("{link} {}", ctx.doc_line(description)?))
    }
}

impl SourceLinkProvider for DefaultPlugin {
    fn source_file_name(&self, element: &Element) -> Option<String> {
        source_file_base(element).map(|base| self.links.source_file(&base))
    }

    fn source_url(&self, element: &Element) -> Option<String> {
        let file = self.source_file_name(element)?;
        Some(format!("{file}#{}", declaration_line(element)))
    }
}

impl TagProcessor for DefaultPlugin {
    fn processed_tags(&self) -> IndexMap<String, TagKinds> {
        let mut tags = IndexMap::new();
        for tag in ["package", "subpackage", "var", "param", "return", "throws", "throw"] {
            tags.insert(tag.to_string(), TagKinds::BLOCK);
        }
        for tag in ["see", "uses", "link"] {
            tags.insert(tag.to_string(), TagKinds::BLOCK | TagKinds::INLINE_SIMPLE);
        }
        tags.insert(
            "internal".to_string(),
            TagKinds::BLOCK | TagKinds::INLINE_WITH_CHILDREN,
        );
        tags.insert(format!("{IGNORED_WILDCARD}*"), TagKinds::BLOCK);
        for tag in IGNORED_TAGS {
            tags.insert(tag.to_string(), TagKinds::BLOCK);
        }
        tags
    }

    fn tag_name(&self, tag: &str, _kind: TagKind, _ctx: &RenderContext<'_>) -> String {
        let key = tag_lookup_key(tag);
        if wildcard_matches(IGNORED_WILDCARD, &key) || IGNORED_TAGS.contains(&key.as_str()) {
            return String::new();
        }
        tag.to_string()
    }

    fn tag_value(
        &self,
        tag: &str,
        kind: TagKind,
        value: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<String, AnnotationError> {
        let key = tag_lookup_key(tag);
        match key.as_str() {
            "package" => {
                if !ctx.config().packages {
                    return Ok(ctx.escape(value));
                }
                let (package, description) = ctx.split(value);
                let link = ctx.link(&ctx.links().package_url(package), package);
                self.with_description(link, description, ctx)
            }
            "subpackage" => {
                let package = ctx.element().and_then(Element::package).unwrap_or_default();
                if !ctx.config().packages || package.is_empty() {
                    return Ok(ctx.escape(value));
                }
                let (subpackage, description) = ctx.split(value);
                let url = ctx.links().package_url(&format!("{package}\\{subpackage}"));
                self.with_description(ctx.link(&url, subpackage), description, ctx)
            }
            "param" | "return" | "throws" | "throw" | "var" => {
                let description = ctx.description(value)?;
                let types = ctx.type_links(value);
                if description.is_empty() {
                    Ok(format!("<code>{types}</code>"))
                } else {
                    Ok(format!("<code>{types}</code><br />{description}"))
                }
            }
            "internal" => {
                if !ctx.config().internal {
                    Ok(String::new())
                } else if kind == TagKind::InlineWithChildren {
                    // Nested tags are already rendered
                    Ok(value.to_string())
                } else {
                    Ok(ctx.escape(value))
                }
            }
            "link" | "see" if value.contains("://") => Ok(ctx.link(value, value)),
            "link" | "see" if value.contains('@') => {
                Ok(ctx.link(&format!("mailto:{value}"), value))
            }
            "link" | "see" | "uses" => Ok(self.uses(value, ctx)),
            _ => Err(AnnotationError::UnsupportedTag(tag.to_string())),
        }
    }
}
