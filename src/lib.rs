pub mod annotations;
pub mod block_tags;
pub mod config;
pub mod engine;
pub mod error;
pub mod inline_tags;
pub mod links;
pub mod markup;
pub mod plugin;
pub mod reflection;
pub mod render;
pub mod resolver;

pub use annotations::AnnotationMap;
pub use block_tags::RenderedTags;
pub use config::Config;
pub use config::ConfigBuilder;
pub use engine::AnnotationEngine;
pub use error::AnnotationError;
pub use markup::{InlineHandler, MarkupEngine, PlainMarkup};
pub use plugin::{PluginDescriptor, PluginRegistry, TagKind, TagKinds};
pub use reflection::{Element, ElementKind, MemoryStore, ReflectionStore};
pub use render::RenderContext;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Renders the block tags of a single element with the default plugin only.
///
/// # Examples
///
/// ```rust
/// use apidoc::{Config, Element, MemoryStore};
///
/// let class = Element::class("App\\Mailer").with_annotation("author", "Jane <jane@example.com>");
/// let store = MemoryStore::new().with(class.clone());
/// let tags = apidoc::process_block_tags(&class, &store, Config::default()).unwrap();
/// assert_eq!(tags["author"], vec!["Jane &lt;jane@example.com&gt;"]);
/// ```
///
/// # Arguments
///
/// * `element` - The element whose annotations are rendered
/// * `store` - Reflection data used to resolve cross-references
/// * `config` - Generation settings
pub fn process_block_tags(
    element: &Element,
    store: &dyn ReflectionStore,
    config: Config,
) -> Result<RenderedTags, AnnotationError> {
    let markup = PlainMarkup::new();
    let engine = AnnotationEngine::with_plugins(config, Vec::new(), store, &markup)?;
    engine.process_block_tags(element, &[])
}
