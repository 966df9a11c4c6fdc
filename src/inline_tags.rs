//! Expansion of `{@tag value}` inline tags inside documentation text.

use crate::error::AnnotationError;
use crate::markup::MarkupEngine;
use crate::plugin::{PluginRegistry, TagKind, TagProcessor};
use crate::render::RenderContext;

pub mod scanner;

pub use scanner::{InlineTagMatch, find_inline_tags, try_parse_inline_tag};

/// Owned copy of a match so the text it came from can be rewritten.
struct PendingTag {
    range: std::ops::Range<usize>,
    name: String,
    value: Option<String>,
}

fn pending(text: &str) -> Vec<PendingTag> {
    find_inline_tags(text)
        .into_iter()
        .map(|m| PendingTag {
            range: m.range,
            name: m.name.to_string(),
            value: m.value.map(str::to_string),
        })
        .collect()
}

pub struct InlineTagExpander<'r> {
    registry: &'r PluginRegistry,
    markup: &'r dyn MarkupEngine,
    max_depth: usize,
}

impl<'r> InlineTagExpander<'r> {
    pub fn new(
        registry: &'r PluginRegistry,
        markup: &'r dyn MarkupEngine,
        max_depth: usize,
    ) -> Self {
        Self {
            registry,
            markup,
            max_depth,
        }
    }

    /// Expand every inline tag in `text`.
    ///
    /// Each top-level result is passed through [`MarkupEngine::protect`], so
    /// the returned text contains no `{@...}` tokens and expanding it again
    /// changes nothing.
    pub fn expand_text(
        &self,
        text: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<String, AnnotationError> {
        self.expand_children(text.to_string(), ctx, 1)
    }

    /// Expand one whole `{@tag value}` token at nesting level 1.
    ///
    /// This is the entry point the markup engine calls for each token it
    /// accepts. Text that is not exactly one tag is returned as is.
    pub fn expand_token(
        &self,
        token: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<String, AnnotationError> {
        match try_parse_inline_tag(token, 0) {
            Some(tag) if tag.range.end == token.len() => {
                self.expand_tag(tag.name, tag.value, ctx, 1)
            }
            _ => Ok(token.to_string()),
        }
    }

    /// Replace the tags of `text` in place, rightmost first so that the
    /// offsets of the remaining matches stay valid.
    fn expand_children(
        &self,
        mut text: String,
        ctx: &RenderContext<'_>,
        level: usize,
    ) -> Result<String, AnnotationError> {
        for tag in pending(&text).into_iter().rev() {
            let expanded = self.expand_tag(&tag.name, tag.value.as_deref(), ctx, level)?;
            text.replace_range(tag.range, &expanded);
        }
        Ok(text)
    }

    fn expand_tag(
        &self,
        tag: &str,
        value: Option<&str>,
        ctx: &RenderContext<'_>,
        level: usize,
    ) -> Result<String, AnnotationError> {
        if level > self.max_depth {
            return Err(AnnotationError::InlineNestingTooDeep {
                limit: self.max_depth,
            });
        }

        let (kind, processor): (TagKind, Option<&dyn TagProcessor>) =
            match self.registry.processor(tag, TagKind::InlineSimple) {
                Some(p) => (TagKind::InlineSimple, Some(p)),
                None => (
                    TagKind::InlineWithChildren,
                    self.registry.processor(tag, TagKind::InlineWithChildren),
                ),
            };
        log::trace!("Inline tag {} at level {} as {:?}", tag, level, kind);

        if let Some(processor) = processor
            && processor.tag_name(tag, kind, ctx).is_empty()
        {
            return Ok(String::new());
        }

        let mut value = value.unwrap_or_default().to_string();
        if kind == TagKind::InlineWithChildren {
            value = self.expand_children(value, ctx, level + 1)?;
        }

        let rendered = match processor {
            Some(processor) => processor.tag_value(tag, kind, &value, ctx)?,
            None if value.is_empty() => format!("{{@{tag}}}"),
            None => format!("{{@{tag} {value}}}"),
        };

        Ok(if level == 1 {
            self.markup.protect(rendered)
        } else {
            rendered
        })
    }
}
