//! Raw annotation storage.
//!
//! An [`AnnotationMap`] keeps the tags of one documented element in source
//! order. Repeated tags such as `@param` share one entry holding every value.

use indexmap::IndexMap;
use serde::Deserialize;

/// Reserved key for the short (summary) description.
pub const SHORT_DESCRIPTION: &str = " short_description";

/// Reserved key for the long description.
pub const LONG_DESCRIPTION: &str = " long_description";

/// Whether a key is one of the two reserved description keys.
pub fn is_description(name: &str) -> bool {
    name == SHORT_DESCRIPTION || name == LONG_DESCRIPTION
}

/// Ordered mapping from tag name to raw values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AnnotationMap {
    tags: IndexMap<String, Vec<String>>,
}

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a tag, creating the tag at the end if needed.
    pub fn push(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.tags.entry(tag.into()).or_default().push(value.into());
    }

    /// Builder-style variant of [`AnnotationMap::push`].
    pub fn with(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(tag, value);
        self
    }

    /// Values of a tag. Exact names are preferred; otherwise the lookup is
    /// case-insensitive.
    pub fn get(&self, tag: &str) -> Option<&[String]> {
        if let Some(values) = self.tags.get(tag) {
            return Some(values);
        }
        self.tags
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(tag))
            .map(|(_, values)| values.as_slice())
    }

    /// First value of a tag.
    pub fn first(&self, tag: &str) -> Option<&str> {
        self.get(tag).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    pub fn short_description(&self) -> Option<&str> {
        self.first(SHORT_DESCRIPTION)
    }

    pub fn long_description(&self) -> Option<&str> {
        self.first(LONG_DESCRIPTION)
    }

    /// Remove a tag (case-insensitive), keeping the order of the others.
    pub fn remove(&mut self, tag: &str) -> Option<Vec<String>> {
        let index = self
            .tags
            .keys()
            .position(|name| name == tag)
            .or_else(|| self.tags.keys().position(|n| n.eq_ignore_ascii_case(tag)))?;
        self.tags.shift_remove_index(index).map(|(_, values)| values)
    }

    /// Iterate tags in order, descriptions included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterate block tags only, skipping the reserved description keys.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.iter().filter(|(name, _)| !is_description(name))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Merge annotations produced by a generator plugin.
    ///
    /// Descriptions are appended to the existing text separated by a blank
    /// line; any other tag gets its values appended after the existing ones.
    pub fn merge_generated(&mut self, generated: AnnotationMap) {
        for (name, values) in generated.tags {
            if is_description(&name) {
                let addition = values.join("\n\n");
                match self.tags.get_mut(&name) {
                    Some(existing) if !existing.is_empty() => {
                        let text = &mut existing[0];
                        text.push_str("\n\n");
                        text.push_str(&addition);
                    }
                    _ => {
                        self.tags.insert(name, vec![addition]);
                    }
                }
            } else {
                self.tags.entry(name).or_default().extend(values);
            }
        }
    }

    pub(crate) fn into_inner(self) -> IndexMap<String, Vec<String>> {
        self.tags
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnnotationMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AnnotationMap::new();
        for (tag, value) in iter {
            map.push(tag, value);
        }
        map
    }
}
