//! Plugin capabilities and descriptors.
//!
//! A plugin is a [`PluginDescriptor`]: a name plus whichever capabilities it
//! provides. One object may back several capabilities (the built-in default
//! plugin is both a source-link provider and a tag processor).

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::annotations::AnnotationMap;
use crate::error::AnnotationError;
use crate::reflection::Element;
use crate::render::RenderContext;

pub mod default;
pub mod manifest;
pub mod registry;

pub use default::DefaultPlugin;
pub use manifest::{ManifestPlugin, PluginManifest};
pub use registry::{PluginRegistry, PluginRegistryBuilder};

bitflags! {
    /// Kinds a tag is processed as.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TagKinds: u8 {
        /// `{@tag value}` whose value is used as-is
        const INLINE_SIMPLE = 1;
        /// `{@tag value}` whose value may contain further inline tags
        const INLINE_WITH_CHILDREN = 2;
        /// `@tag value` line in a docblock
        const BLOCK = 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagKind {
    InlineSimple,
    InlineWithChildren,
    Block,
}

impl TagKind {
    pub const ALL: [TagKind; 3] = [
        TagKind::InlineSimple,
        TagKind::InlineWithChildren,
        TagKind::Block,
    ];

    pub fn flag(self) -> TagKinds {
        match self {
            TagKind::InlineSimple => TagKinds::INLINE_SIMPLE,
            TagKind::InlineWithChildren => TagKinds::INLINE_WITH_CHILDREN,
            TagKind::Block => TagKinds::BLOCK,
        }
    }

    pub fn is_inline(self) -> bool {
        self != TagKind::Block
    }
}

/// Computes where highlighted source for an element lives.
pub trait SourceLinkProvider: Send + Sync {
    /// File name of the highlighted source page, `None` to skip generating it.
    fn source_file_name(&self, element: &Element) -> Option<String>;

    /// URL of the element's declaration, including the line fragment.
    fn source_url(&self, element: &Element) -> Option<String>;
}

/// Renders block and inline tags.
pub trait TagProcessor: Send + Sync {
    /// Tag names handled by this processor and the kinds each is handled as.
    ///
    /// A name ending in `*` also matches `name-<suffix>` block tags.
    fn processed_tags(&self) -> IndexMap<String, TagKinds>;

    /// Display name of a tag. An empty string suppresses the tag.
    fn tag_name(&self, tag: &str, _kind: TagKind, _ctx: &RenderContext<'_>) -> String {
        tag.to_string()
    }

    /// Render a single value of a tag.
    fn tag_value(
        &self,
        tag: &str,
        kind: TagKind,
        value: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<String, AnnotationError>;
}

/// Contributes extra annotations to elements.
pub trait AnnotationGenerator: Send + Sync {
    fn annotations(&self, element: &Element) -> AnnotationMap;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPosition {
    Top,
    Main,
    Footer,
}

/// Sidebar list a custom menu is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuSection {
    NamespacesPackages,
    Classes,
    Interfaces,
    Exceptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuSide {
    Above,
    Below,
}

/// Where a custom menu goes: above or below one of the sidebar lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuPlacement {
    pub section: MenuSection,
    pub side: MenuSide,
}

impl MenuPlacement {
    pub const ALL: [MenuPlacement; 8] = [
        Self::new(MenuSection::NamespacesPackages, MenuSide::Above),
        Self::new(MenuSection::NamespacesPackages, MenuSide::Below),
        Self::new(MenuSection::Classes, MenuSide::Above),
        Self::new(MenuSection::Classes, MenuSide::Below),
        Self::new(MenuSection::Interfaces, MenuSide::Above),
        Self::new(MenuSection::Interfaces, MenuSide::Below),
        Self::new(MenuSection::Exceptions, MenuSide::Above),
        Self::new(MenuSection::Exceptions, MenuSide::Below),
    ];

    pub const fn new(section: MenuSection, side: MenuSide) -> Self {
        Self { section, side }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub url: String,
}

/// A page produced by a page plugin; writing it out is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub file_name: String,
    pub content: String,
}

/// Adds custom pages and menu entries to the generated documentation.
pub trait PagePlugin: Send + Sync {
    fn render_pages(&self) -> Result<Vec<Page>, AnnotationError>;

    /// Entries for the page-level menus.
    fn menu_items(&self, _position: MenuPosition) -> Vec<MenuItem> {
        Vec::new()
    }

    /// A custom menu shown next to one of the sidebar lists.
    fn menu(&self, _placement: MenuPlacement) -> Vec<MenuItem> {
        Vec::new()
    }
}

#[derive(Clone)]
pub enum Capability {
    SourceLink(Arc<dyn SourceLinkProvider>),
    Tags(Arc<dyn TagProcessor>),
    Generator(Arc<dyn AnnotationGenerator>),
    Page(Arc<dyn PagePlugin>),
}

impl Capability {
    fn label(&self) -> &'static str {
        match self {
            Capability::SourceLink(_) => "source-link",
            Capability::Tags(_) => "tags",
            Capability::Generator(_) => "generator",
            Capability::Page(_) => "page",
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub capabilities: Vec<Capability>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_source_link(mut self, provider: Arc<dyn SourceLinkProvider>) -> Self {
        self.capabilities.push(Capability::SourceLink(provider));
        self
    }

    pub fn with_tags(mut self, processor: Arc<dyn TagProcessor>) -> Self {
        self.capabilities.push(Capability::Tags(processor));
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn AnnotationGenerator>) -> Self {
        self.capabilities.push(Capability::Generator(generator));
        self
    }

    pub fn with_page(mut self, page: Arc<dyn PagePlugin>) -> Self {
        self.capabilities.push(Capability::Page(page));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
