use indexmap::IndexMap;
use rayon::prelude::*;

use crate::annotations::AnnotationMap;
use crate::block_tags::{BlockTagProcessor, RenderedTags};
use crate::config::Config;
use crate::error::AnnotationError;
use crate::inline_tags::InlineTagExpander;
use crate::links::LinkBuilder;
use crate::markup::MarkupEngine;
use crate::plugin::{
    MenuItem, MenuPlacement, MenuPosition, Page, PluginDescriptor, PluginRegistry,
};
use crate::reflection::{Element, ReflectionStore};
use crate::render::RenderContext;
use crate::resolver::CrossReferenceResolver;

/// Wires configuration, plugins, reflection data and the markup engine
/// together for one generation run.
pub struct AnnotationEngine<'a> {
    config: Config,
    registry: PluginRegistry,
    store: &'a dyn ReflectionStore,
    markup: &'a dyn MarkupEngine,
    links: LinkBuilder,
}

impl<'a> AnnotationEngine<'a> {
    pub fn new(
        config: Config,
        registry: PluginRegistry,
        store: &'a dyn ReflectionStore,
        markup: &'a dyn MarkupEngine,
    ) -> Self {
        #[cfg(debug_assertions)]
        {
            crate::init_logger();
        }

        let links = LinkBuilder::new(config.templates.clone());
        Self {
            config,
            registry,
            store,
            markup,
            links,
        }
    }

    /// Load the plugins named by `config` (plus `extra`) and build an engine.
    pub fn with_plugins(
        config: Config,
        extra: impl IntoIterator<Item = PluginDescriptor>,
        store: &'a dyn ReflectionStore,
        markup: &'a dyn MarkupEngine,
    ) -> Result<Self, AnnotationError> {
        let registry = PluginRegistry::load(&config, extra)?;
        Ok(Self::new(config, registry, store, markup))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn store(&self) -> &'a dyn ReflectionStore {
        self.store
    }

    pub fn markup(&self) -> &'a dyn MarkupEngine {
        self.markup
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    pub fn resolver(&self) -> CrossReferenceResolver<'_> {
        CrossReferenceResolver::new(self.store, &self.links)
    }

    pub fn inline_expander(&self) -> InlineTagExpander<'_> {
        InlineTagExpander::new(&self.registry, self.markup, self.config.max_inline_depth)
    }

    pub fn context<'e>(&'e self, element: Option<&'e Element>) -> RenderContext<'e> {
        RenderContext::new(self, element)
    }

    /// Raw annotations of an element merged with every generator's output.
    pub fn annotations(&self, element: &Element) -> AnnotationMap {
        let mut annotations = element.annotations.clone();
        for generator in self.registry.generators() {
            annotations.merge_generated(generator.annotations(element));
        }
        annotations
    }

    /// Rendered block tags of an element, see [`BlockTagProcessor::process`].
    pub fn process_block_tags(
        &self,
        element: &Element,
        ignore: &[&str],
    ) -> Result<RenderedTags, AnnotationError> {
        let ctx = self.context(Some(element));
        BlockTagProcessor::new(&self.registry, self.config.todo).process(
            self.annotations(element),
            ignore,
            &ctx,
        )
    }

    /// Block tags of many elements, rendered in parallel. Results keep the
    /// order of `elements`.
    pub fn process_all(&self, elements: &[Element]) -> Vec<Result<RenderedTags, AnnotationError>> {
        log::debug!("Processing block tags of {} elements", elements.len());
        elements
            .par_iter()
            .map(|element| self.process_block_tags(element, &[]))
            .collect()
    }

    pub fn doc_line(
        &self,
        text: &str,
        element: Option<&Element>,
    ) -> Result<String, AnnotationError> {
        self.context(element).doc_line(text)
    }

    pub fn doc_block(
        &self,
        text: &str,
        element: Option<&Element>,
    ) -> Result<String, AnnotationError> {
        self.context(element).doc_block(text)
    }

    /// Rendered short description, including generated text.
    pub fn short_description(&self, element: &Element) -> Result<String, AnnotationError> {
        let annotations = self.annotations(element);
        match annotations.short_description() {
            Some(text) => self.doc_line(text, Some(element)),
            None => Ok(String::new()),
        }
    }

    /// Rendered long description, including generated text.
    pub fn long_description(&self, element: &Element) -> Result<String, AnnotationError> {
        let annotations = self.annotations(element);
        match annotations.long_description() {
            Some(text) => self.doc_block(text, Some(element)),
            None => Ok(String::new()),
        }
    }

    pub fn resolve_link(&self, reference: &str, element: Option<&Element>) -> Option<String> {
        self.resolver().link(reference, element)
    }

    pub fn source_file_name(&self, element: &Element) -> Option<String> {
        self.registry.source_link().source_file_name(element)
    }

    pub fn source_url(&self, element: &Element) -> Option<String> {
        self.registry.source_link().source_url(element)
    }

    /// Pages of every page plugin, in registration order.
    pub fn render_custom_pages(&self) -> Result<Vec<Page>, AnnotationError> {
        let mut pages = Vec::new();
        for plugin in self.registry.pages() {
            pages.extend(plugin.render_pages()?);
        }
        Ok(pages)
    }

    pub fn custom_menu_items(&self, position: MenuPosition) -> Vec<MenuItem> {
        self.registry
            .pages()
            .flat_map(|plugin| plugin.menu_items(position))
            .collect()
    }

    /// Custom sidebar menus of every page plugin. Each placement is present,
    /// in [`MenuPlacement::ALL`] order, even when no plugin fills it.
    pub fn custom_menus(&self) -> IndexMap<MenuPlacement, Vec<MenuItem>> {
        MenuPlacement::ALL
            .into_iter()
            .map(|placement| {
                let items = self
                    .registry
                    .pages()
                    .flat_map(|plugin| plugin.menu(placement))
                    .collect();
                (placement, items)
            })
            .collect()
    }
}
