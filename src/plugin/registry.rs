use std::collections::HashMap;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use super::default::DefaultPlugin;
use super::manifest::load_plugin_sources;
use super::{
    AnnotationGenerator, Capability, PagePlugin, PluginDescriptor, SourceLinkProvider, TagKind,
    TagKinds, TagProcessor,
};
use crate::config::Config;
use crate::error::AnnotationError;

/// Lookup key of a block tag: its leading `[\w-]+` run, lowercased.
///
/// `"property-read $x"` and `"Property-Read"` both give `"property-read"`.
pub fn tag_lookup_key(name: &str) -> String {
    let end = name
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .map_or(name.len(), |(i, _)| i);
    name[..end].to_ascii_lowercase()
}

/// Whether a wildcard base name (`"property"` for `property*`) covers a key.
pub fn wildcard_matches(base: &str, key: &str) -> bool {
    key == base
        || key
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('-'))
}

struct Registered<T: ?Sized> {
    plugin: String,
    handler: Arc<T>,
}

/// Collects plugin registrations in configuration order.
#[derive(Default)]
pub struct PluginRegistryBuilder {
    source_link: Option<Registered<dyn SourceLinkProvider>>,
    processors: HashMap<(String, TagKind), Registered<dyn TagProcessor>>,
    wildcards: IndexMap<String, Registered<dyn TagProcessor>>,
    generators: Vec<Registered<dyn AnnotationGenerator>>,
    pages: Vec<Registered<dyn PagePlugin>>,
}

impl PluginRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every capability of a plugin. Later registrations replace
    /// earlier ones for the same source link or `(tag, kind)` pair.
    ///
    /// Returns `false` when the plugin contributed nothing.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> bool {
        let mut registered = false;
        let name = descriptor.name;

        for capability in descriptor.capabilities {
            match capability {
                Capability::SourceLink(provider) => {
                    if let Some(previous) = &self.source_link {
                        log::debug!(
                            "Source link plugin {} replaces {}",
                            name,
                            previous.plugin
                        );
                    }
                    self.source_link = Some(Registered {
                        plugin: name.clone(),
                        handler: provider,
                    });
                    registered = true;
                }
                Capability::Tags(processor) => {
                    registered |= self.register_tags(&name, processor);
                }
                Capability::Generator(generator) => {
                    self.generators.push(Registered {
                        plugin: name.clone(),
                        handler: generator,
                    });
                    registered = true;
                }
                Capability::Page(page) => {
                    self.pages.push(Registered {
                        plugin: name.clone(),
                        handler: page,
                    });
                    registered = true;
                }
            }
        }

        if !registered {
            log::debug!("Plugin {} provides nothing, skipping", name);
        }
        registered
    }

    fn register_tags(&mut self, plugin: &str, processor: Arc<dyn TagProcessor>) -> bool {
        let mut registered = false;

        for (tag, kinds) in processor.processed_tags() {
            let tag = tag.to_lowercase();

            if let Some(base) = tag.strip_suffix('*') {
                if kinds.intersects(TagKinds::INLINE_SIMPLE | TagKinds::INLINE_WITH_CHILDREN) {
                    log::warn!(
                        "Plugin {}: wildcard tag {} only applies to block tags",
                        plugin,
                        tag
                    );
                }
                if kinds.contains(TagKinds::BLOCK) {
                    log::trace!("Registering {} for block tags {}-*", plugin, base);
                    self.wildcards.insert(
                        base.to_string(),
                        Registered {
                            plugin: plugin.to_string(),
                            handler: processor.clone(),
                        },
                    );
                    registered = true;
                }
                continue;
            }

            for kind in TagKind::ALL {
                if kinds.contains(kind.flag()) {
                    log::trace!("Registering {} for {:?} tag {}", plugin, kind, tag);
                    self.processors.insert(
                        (tag.clone(), kind),
                        Registered {
                            plugin: plugin.to_string(),
                            handler: processor.clone(),
                        },
                    );
                    registered = true;
                }
            }
        }

        registered
    }

    /// Freeze the tables. Fails if no source-link plugin was registered.
    pub fn build(self) -> Result<PluginRegistry, AnnotationError> {
        let Some(source_link) = self.source_link else {
            return Err(AnnotationError::Configuration(
                "no source link plugin was registered".to_string(),
            ));
        };

        let registry = PluginRegistry {
            source_link,
            processors: self.processors,
            wildcards: self.wildcards,
            generators: self.generators,
            pages: self.pages,
        };
        log::info!(
            "Using plugins\n {}",
            registry
                .plugin_names()
                .into_iter()
                .collect::<Vec<_>>()
                .join("\n ")
        );
        Ok(registry)
    }
}

/// Immutable plugin lookup tables for one generation run.
pub struct PluginRegistry {
    source_link: Registered<dyn SourceLinkProvider>,
    processors: HashMap<(String, TagKind), Registered<dyn TagProcessor>>,
    wildcards: IndexMap<String, Registered<dyn TagProcessor>>,
    generators: Vec<Registered<dyn AnnotationGenerator>>,
    pages: Vec<Registered<dyn PagePlugin>>,
}

impl PluginRegistry {
    /// Register the default plugin, then every configured plugin source,
    /// then `extra` plugins supplied by the caller.
    pub fn load(
        config: &Config,
        extra: impl IntoIterator<Item = PluginDescriptor>,
    ) -> Result<Self, AnnotationError> {
        let mut builder = PluginRegistryBuilder::new();
        builder.register(DefaultPlugin::new(config).into_descriptor());

        for descriptor in load_plugin_sources(&config.plugins)? {
            builder.register(descriptor);
        }
        for descriptor in extra {
            builder.register(descriptor);
        }

        builder.build()
    }

    pub fn source_link(&self) -> &dyn SourceLinkProvider {
        self.source_link.handler.as_ref()
    }

    /// Processor registered for an exact `(tag, kind)` pair.
    pub fn processor(&self, tag: &str, kind: TagKind) -> Option<&dyn TagProcessor> {
        self.processors
            .get(&(tag.to_lowercase(), kind))
            .map(|r| r.handler.as_ref())
    }

    /// Block processor for an annotation name, falling back to wildcard
    /// registrations (the longest matching base name wins).
    pub fn block_processor(&self, name: &str) -> Option<&dyn TagProcessor> {
        let key = tag_lookup_key(name);
        if let Some(found) = self.processors.get(&(key.clone(), TagKind::Block)) {
            return Some(found.handler.as_ref());
        }
        self.wildcards
            .iter()
            .filter(|(base, _)| wildcard_matches(base, &key))
            .max_by_key(|(base, _)| base.len())
            .map(|(_, r)| r.handler.as_ref())
    }

    pub fn generators(&self) -> impl Iterator<Item = &dyn AnnotationGenerator> {
        self.generators.iter().map(|r| r.handler.as_ref())
    }

    pub fn pages(&self) -> impl Iterator<Item = &dyn PagePlugin> {
        self.pages.iter().map(|r| r.handler.as_ref())
    }

    /// Name of the plugin handling a `(tag, kind)` pair.
    pub fn processor_plugin(&self, tag: &str, kind: TagKind) -> Option<&str> {
        self.processors
            .get(&(tag.to_lowercase(), kind))
            .map(|r| r.plugin.as_str())
    }

    /// Names of all plugins that are still active after overrides.
    pub fn plugin_names(&self) -> IndexSet<&str> {
        let mut names = IndexSet::new();
        names.insert(self.source_link.plugin.as_str());
        let mut tag_plugins: Vec<&str> = self
            .processors
            .values()
            .chain(self.wildcards.values())
            .map(|r| r.plugin.as_str())
            .collect();
        tag_plugins.sort_unstable();
        names.extend(tag_plugins);
        names.extend(self.generators.iter().map(|r| r.plugin.as_str()));
        names.extend(self.pages.iter().map(|r| r.plugin.as_str()));
        names
    }
}
