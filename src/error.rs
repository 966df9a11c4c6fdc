use std::path::PathBuf;

/// Errors that can occur while configuring plugins or rendering annotations.
///
/// Resolution misses and malformed inline tags are not errors: they degrade to
/// escaped plain text and never reach this type.
#[derive(Debug)]
pub enum AnnotationError {
    /// Invalid generator setup, e.g. no source-link plugin registered
    Configuration(String),
    /// A configured plugin source could not be read or parsed
    PluginLoad { path: PathBuf, reason: String },
    /// A tag processor was asked to render a tag it does not handle
    UnsupportedTag(String),
    /// Inline tags nested deeper than the configured limit
    InlineNestingTooDeep { limit: usize },
}

impl std::fmt::Display for AnnotationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {}", msg),
            Self::PluginLoad { path, reason } => {
                write!(f, "could not load plugin {}: {}", path.display(), reason)
            }
            Self::UnsupportedTag(tag) => write!(f, "unsupported tag: {}", tag),
            Self::InlineNestingTooDeep { limit } => {
                write!(f, "inline tags nested deeper than {} levels", limit)
            }
        }
    }
}

impl std::error::Error for AnnotationError {}

impl AnnotationError {
    /// Whether the error must abort the whole generation run.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::PluginLoad { .. })
    }
}
