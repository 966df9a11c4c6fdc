//! Declarative plugins read from TOML manifests.
//!
//! ```toml
//! name = "acme"
//!
//! [tags.internal]
//! kinds = ["block", "inline-with-children"]
//! rename = "Internal note"
//! template = "<em>{value}</em>"
//!
//! [source-link]
//! file-name = "source-{name}.html"
//! url = "https://example.org/{path}#L{line}"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use super::default::{declaration_line, source_file_base};
use super::registry::{tag_lookup_key, wildcard_matches};
use super::{PluginDescriptor, SourceLinkProvider, TagKind, TagKinds, TagProcessor};
use crate::error::AnnotationError;
use crate::reflection::Element;
use crate::render::RenderContext;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TagSpec {
    pub kinds: Vec<TagKind>,
    /// Display name; an empty string suppresses the tag
    pub rename: Option<String>,
    /// Output with `{tag}`, `{value}` and `{escaped}` placeholders
    pub template: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct SourceLinkSpec {
    /// File name template with a `{name}` placeholder
    pub file_name: String,
    /// URL template: `{file}`, `{path}`, `{line}`, `{name}`
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct PluginManifest {
    pub name: Option<String>,
    pub tags: IndexMap<String, TagSpec>,
    pub source_link: Option<SourceLinkSpec>,
}

impl PluginManifest {
    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.source_link.is_none()
    }
}

/// A tag processor and/or source-link provider described by a manifest.
#[derive(Debug)]
pub struct ManifestPlugin {
    name: String,
    tags: IndexMap<String, TagSpec>,
    source_link: Option<SourceLinkSpec>,
}

impl ManifestPlugin {
    pub fn new(manifest: PluginManifest, fallback_name: &str) -> Self {
        let tags = manifest
            .tags
            .into_iter()
            .map(|(tag, spec)| (tag.to_lowercase(), spec))
            .collect();
        Self {
            name: manifest.name.unwrap_or_else(|| fallback_name.to_string()),
            tags,
            source_link: manifest.source_link,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_descriptor(self) -> PluginDescriptor {
        let has_tags = !self.tags.is_empty();
        let has_source_link = self.source_link.is_some();
        let plugin = Arc::new(self);

        let mut descriptor = PluginDescriptor::new(plugin.name.clone());
        if has_source_link {
            descriptor = descriptor.with_source_link(plugin.clone());
        }
        if has_tags {
            descriptor = descriptor.with_tags(plugin);
        }
        descriptor
    }

    fn spec(&self, tag: &str, kind: TagKind) -> Option<&TagSpec> {
        let key = tag_lookup_key(tag);
        if let Some(spec) = self.tags.get(&key) {
            return Some(spec);
        }
        if kind != TagKind::Block {
            return None;
        }
        self.tags
            .iter()
            .filter_map(|(name, spec)| Some((name.strip_suffix('*')?, spec)))
            .filter(|(base, _)| wildcard_matches(base, &key))
            .max_by_key(|(base, _)| base.len())
            .map(|(_, spec)| spec)
    }
}

/// Substitute `{key}` placeholders in one pass; unknown keys stay as written.
fn fill(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let placeholder = after.find('}').and_then(|close| {
            let key = &after[..close];
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (close, *value))
        });
        match placeholder {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

impl TagProcessor for ManifestPlugin {
    fn processed_tags(&self) -> IndexMap<String, TagKinds> {
        self.tags
            .iter()
            .map(|(tag, spec)| {
                let kinds = spec
                    .kinds
                    .iter()
                    .fold(TagKinds::empty(), |acc, kind| acc | kind.flag());
                (tag.clone(), kinds)
            })
            .collect()
    }

    fn tag_name(&self, tag: &str, kind: TagKind, _ctx: &RenderContext<'_>) -> String {
        match self.spec(tag, kind).and_then(|spec| spec.rename.as_ref()) {
            Some(rename) => rename.clone(),
            None => tag.to_string(),
        }
    }

    fn tag_value(
        &self,
        tag: &str,
        kind: TagKind,
        value: &str,
        ctx: &RenderContext<'_>,
    ) -> Result<String, AnnotationError> {
        let spec = self
            .spec(tag, kind)
            .ok_or_else(|| AnnotationError::UnsupportedTag(tag.to_string()))?;
        let template = match (&spec.template, kind) {
            (Some(template), _) => template.as_str(),
            (None, TagKind::InlineWithChildren) => "{value}",
            (None, _) => "{escaped}",
        };
        let escaped = ctx.escape(value);
        Ok(fill(
            template,
            &[("tag", tag), ("value", value), ("escaped", escaped.as_str())],
        ))
    }
}

impl SourceLinkProvider for ManifestPlugin {
    fn source_file_name(&self, element: &Element) -> Option<String> {
        let spec = self.source_link.as_ref()?;
        let base = source_file_base(element)?;
        Some(fill(&spec.file_name, &[("name", base.as_str())]))
    }

    fn source_url(&self, element: &Element) -> Option<String> {
        let spec = self.source_link.as_ref()?;
        let base = source_file_base(element)?;
        let file = fill(&spec.file_name, &[("name", base.as_str())]);
        let line = declaration_line(element).to_string();
        Some(fill(
            &spec.url,
            &[
                ("file", file.as_str()),
                ("path", element.file.as_deref().unwrap_or_default()),
                ("line", line.as_str()),
                ("name", base.as_str()),
            ],
        ))
    }
}

fn load_manifest(path: &Path) -> Result<PluginDescriptor, AnnotationError> {
    log::debug!("Loading plugin manifest: {}", path.display());
    let load_error = |reason: String| AnnotationError::PluginLoad {
        path: path.to_path_buf(),
        reason,
    };
    let s = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    let manifest = PluginManifest::parse(&s).map_err(|e| load_error(e.to_string()))?;
    if manifest.is_empty() {
        log::warn!("Plugin manifest {} declares nothing", path.display());
    }
    let fallback = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ManifestPlugin::new(manifest, &fallback).into_descriptor())
}

/// Manifest files of a directory source, sorted by file name.
fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>, AnnotationError> {
    let entries = fs::read_dir(dir).map_err(|e| AnnotationError::PluginLoad {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();
    Ok(files)
}

/// Read every configured plugin source, in order.
pub fn load_plugin_sources(sources: &[PathBuf]) -> Result<Vec<PluginDescriptor>, AnnotationError> {
    let mut descriptors = Vec::new();
    for source in sources {
        if source.is_dir() {
            for file in manifest_files(source)? {
                descriptors.push(load_manifest(&file)?);
            }
        } else {
            descriptors.push(load_manifest(source)?);
        }
    }
    Ok(descriptors)
}
