//! Rendering of the block tags (`@param`, `@see`, ...) of one element.

use indexmap::IndexMap;

use crate::annotations::{AnnotationMap, LONG_DESCRIPTION, SHORT_DESCRIPTION};
use crate::error::AnnotationError;
use crate::links::escape_html;
use crate::plugin::{PluginRegistry, TagKind};
use crate::render::RenderContext;

/// Display order of well-known tags; anything else follows, in source order.
pub const TAG_ORDER: &[&str] = &[
    "deprecated",
    "category",
    "package",
    "subpackage",
    "copyright",
    "license",
    "author",
    "version",
    "since",
    "see",
    "uses",
    "link",
    "example",
    "tutorial",
    "todo",
];

const UNLISTED: usize = 99;

/// Final tag name => rendered values, ready for templates.
pub type RenderedTags = IndexMap<String, Vec<String>>;

fn priority(name: &str) -> usize {
    let name = name.to_lowercase();
    TAG_ORDER
        .iter()
        .position(|tag| *tag == name)
        .unwrap_or(UNLISTED)
}

pub struct BlockTagProcessor<'r> {
    registry: &'r PluginRegistry,
    keep_todo: bool,
}

impl<'r> BlockTagProcessor<'r> {
    pub fn new(registry: &'r PluginRegistry, keep_todo: bool) -> Self {
        Self {
            registry,
            keep_todo,
        }
    }

    /// Filter, order, rename and render `annotations`.
    ///
    /// Tags listed in `ignore` (case-insensitive) are dropped, as are the
    /// descriptions and, unless enabled, `@todo`.
    pub fn process(
        &self,
        annotations: AnnotationMap,
        ignore: &[&str],
        ctx: &RenderContext<'_>,
    ) -> Result<RenderedTags, AnnotationError> {
        let mut tags = annotations.into_inner();
        tags.shift_remove(SHORT_DESCRIPTION);
        tags.shift_remove(LONG_DESCRIPTION);
        tags.retain(|name, _| {
            !ignore.iter().any(|ignored| ignored.eq_ignore_ascii_case(name))
                && (self.keep_todo || !name.eq_ignore_ascii_case("todo"))
        });

        // IndexMap::sort_by is stable
        tags.sort_by(|a, _, b, _| priority(a).cmp(&priority(b)));

        let mut rendered = RenderedTags::with_capacity(tags.len());
        for (name, values) in tags {
            let Some(processor) = self.registry.block_processor(&name) else {
                rendered.insert(name, values.iter().map(|v| escape_html(v)).collect());
                continue;
            };

            let display = processor.tag_name(&name, TagKind::Block, ctx);
            if display.is_empty() {
                log::trace!("Tag {} suppressed", name);
                continue;
            }

            let values = values
                .iter()
                .map(|value| processor.tag_value(&name, TagKind::Block, value, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            if display != name {
                log::trace!("Tag {} renamed to {}", name, display);
            }
            // Replaces an earlier entry under the same name in place
            rendered.insert(display, values);
        }

        Ok(rendered)
    }
}
