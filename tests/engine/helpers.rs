//! Fixture project and small plugins used across the engine tests.

use std::ops::Range;
use std::sync::{Arc, Mutex};

use apidoc::plugin::{
    AnnotationGenerator, MenuItem, MenuPlacement, MenuPosition, MenuSection, MenuSide, Page,
    PagePlugin, SourceLinkProvider, TagProcessor,
};
use apidoc::{
    AnnotationEngine, AnnotationError, AnnotationMap, Config, Element, InlineHandler, MarkupEngine,
    MemoryStore, PlainMarkup, PluginDescriptor, ReflectionStore, RenderContext, TagKind, TagKinds,
};
use indexmap::IndexMap;

const PROJECT: &str = include_str!("../fixtures/project.json");

/// Reflection data and markup engine that outlive the engines built on them.
pub struct Fixture {
    pub store: MemoryStore,
    pub markup: PlainMarkup,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::from_json(PROJECT).expect("fixture project must parse"),
            markup: PlainMarkup::new(),
        }
    }

    /// Engine with the default plugin, configured plugin sources and `extra`.
    pub fn engine(&self, config: Config, extra: Vec<PluginDescriptor>) -> AnnotationEngine<'_> {
        AnnotationEngine::with_plugins(config, extra, &self.store, &self.markup)
            .expect("engine must build")
    }

    pub fn default_engine(&self) -> AnnotationEngine<'_> {
        self.engine(Config::default(), Vec::new())
    }

    pub fn class(&self, name: &str) -> &Element {
        self.store.class(name).expect("class must exist in fixture")
    }

    pub fn method(&self, class: &str, name: &str) -> &Element {
        self.store.method(class, name).expect("method must exist in fixture")
    }
}

/// Renders every tag it declares as `[tag:value]` and records the calls.
pub struct RecordingPlugin {
    tags: Vec<(String, TagKinds)>,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingPlugin {
    pub fn new(tags: &[(&str, TagKinds)]) -> Arc<Self> {
        Arc::new(Self {
            tags: tags
                .iter()
                .map(|(tag, kinds)| (tag.to_string(), *kinds))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl TagProcessor for RecordingPlugin {
    fn processed_tags(&self) -> IndexMap<String, TagKinds> {
        self.tags.iter().cloned().collect()
    }

    fn tag_value(
        &self,
        tag: &str,
        _kind: TagKind,
        value: &str,
        _ctx: &RenderContext<'_>,
    ) -> Result<String, AnnotationError> {
        self.calls.lock().unwrap().push(format!("{tag}:{value}"));
        Ok(format!("[{tag}:{value}]"))
    }
}

/// Links every element to a fixed repository browser.
pub struct RepositoryLinks;

impl SourceLinkProvider for RepositoryLinks {
    fn source_file_name(&self, element: &Element) -> Option<String> {
        element.file.clone()
    }

    fn source_url(&self, element: &Element) -> Option<String> {
        let file = element.file.as_deref()?;
        Some(format!("https://git.example.org/app/{file}#L{}", element.start_line))
    }
}

/// Adds a fixed `@since` tag and a generated short description.
pub struct SinceGenerator;

impl AnnotationGenerator for SinceGenerator {
    fn annotations(&self, element: &Element) -> AnnotationMap {
        let mut annotations = AnnotationMap::new().with("since", "2.0");
        if element.kind.is_class_like() {
            annotations.push(apidoc::annotations::SHORT_DESCRIPTION, "Generated summary.");
        }
        annotations
    }
}

pub struct ChangelogPage;

impl PagePlugin for ChangelogPage {
    fn render_pages(&self) -> Result<Vec<Page>, AnnotationError> {
        Ok(vec![Page {
            file_name: "changelog.html".to_string(),
            content: "<h1>Changelog</h1>".to_string(),
        }])
    }

    fn menu_items(&self, position: MenuPosition) -> Vec<MenuItem> {
        match position {
            MenuPosition::Main => vec![MenuItem {
                label: "Changelog".to_string(),
                url: "changelog.html".to_string(),
            }],
            _ => Vec::new(),
        }
    }

    fn menu(&self, placement: MenuPlacement) -> Vec<MenuItem> {
        if placement == MenuPlacement::new(MenuSection::Classes, MenuSide::Below) {
            vec![MenuItem {
                label: "Release notes".to_string(),
                url: "changelog.html".to_string(),
            }]
        } else {
            Vec::new()
        }
    }
}

/// Plain text markup that leaves `` `code` `` spans alone, inline tags included.
#[derive(Default)]
pub struct CodeSpanMarkup {
    plain: PlainMarkup,
}

/// Forwards to the engine's handler, hiding tags that start inside a code span.
struct OutsideCode<'h> {
    inline: &'h dyn InlineHandler,
}

impl InlineHandler for OutsideCode<'_> {
    fn find(&self, text: &str) -> Vec<Range<usize>> {
        self.inline
            .find(text)
            .into_iter()
            .filter(|range| text[..range.start].matches('`').count() % 2 == 0)
            .collect()
    }

    fn expand(&self, token: &str) -> Result<String, AnnotationError> {
        self.inline.expand(token)
    }
}

impl MarkupEngine for CodeSpanMarkup {
    fn protect(&self, html: String) -> String {
        self.plain.protect(html)
    }

    fn render_line(
        &self,
        text: &str,
        inline: &dyn InlineHandler,
    ) -> Result<String, AnnotationError> {
        self.plain.render_line(text, &OutsideCode { inline })
    }

    fn render_block(
        &self,
        text: &str,
        inline: &dyn InlineHandler,
    ) -> Result<String, AnnotationError> {
        self.plain.render_block(text, &OutsideCode { inline })
    }
}
