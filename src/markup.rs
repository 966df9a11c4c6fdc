//! The markup engine collaborator.
//!
//! Free-text documentation goes to a [`MarkupEngine`] together with an
//! [`InlineHandler`]. The markup engine decides where inline tags may occur
//! (a real engine skips code spans, for instance) and asks the handler to
//! expand each token it accepts. Expanded tags are already HTML: the expander
//! passes them through [`MarkupEngine::protect`] and the engine must emit
//! protected text unchanged.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::{LazyLock, Mutex};

use regex::Regex;

use crate::error::AnnotationError;
use crate::links::escape_html;

/// The inline pattern a markup engine runs while rendering.
pub trait InlineHandler {
    /// Byte ranges of the top-level inline tags in `text`, left to right.
    fn find(&self, text: &str) -> Vec<Range<usize>>;

    /// Final, protected HTML for one token returned by [`find`](Self::find).
    fn expand(&self, token: &str) -> Result<String, AnnotationError>;
}

pub trait MarkupEngine: Send + Sync {
    /// Mark final HTML so that rendering does not reinterpret it.
    fn protect(&self, html: String) -> String;

    /// Render a single line of documentation (short descriptions, tag values).
    fn render_line(
        &self,
        text: &str,
        inline: &dyn InlineHandler,
    ) -> Result<String, AnnotationError>;

    /// Render a multi-paragraph block (long descriptions).
    fn render_block(
        &self,
        text: &str,
        inline: &dyn InlineHandler,
    ) -> Result<String, AnnotationError>;
}

const PLACEHOLDER_MARK: char = '\u{1A}';

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{1A}(\\d+)\u{1A}").expect("valid placeholder regex"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("valid paragraph regex"));

#[derive(Debug, Default)]
struct Fragments {
    next: usize,
    stored: HashMap<usize, String>,
}

/// Markup engine that treats documentation as plain text.
///
/// Text is HTML-escaped; protected fragments are swapped for placeholders and
/// restored verbatim after escaping. A fragment is released once the render
/// call that restores it returns, and placeholder marks in the input are
/// stripped before expansion, so documentation cannot name a fragment.
#[derive(Debug, Default)]
pub struct PlainMarkup {
    fragments: Mutex<Fragments>,
}

impl PlainMarkup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of protected fragments not yet restored.
    pub fn pending_fragments(&self) -> usize {
        let fragments = self.fragments.lock().unwrap_or_else(|e| e.into_inner());
        fragments.stored.len()
    }

    /// Swap placeholders for their fragments, releasing each one.
    fn restore(&self, escaped: &str) -> String {
        let mut fragments = self.fragments.lock().unwrap_or_else(|e| e.into_inner());
        PLACEHOLDER
            .replace_all(escaped, |caps: &regex::Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| fragments.stored.remove(&i))
                    .unwrap_or_default()
            })
            .into_owned()
    }

    /// Replace every token the handler finds, rightmost first.
    fn expand_inline(
        &self,
        text: &str,
        inline: &dyn InlineHandler,
    ) -> Result<String, AnnotationError> {
        let mut text = text.replace(PLACEHOLDER_MARK, "");
        for range in inline.find(&text).into_iter().rev() {
            match inline.expand(&text[range.clone()]) {
                Ok(html) => text.replace_range(range, &html),
                Err(err) => {
                    // Release what the tokens on the right already protected
                    self.restore(&text);
                    return Err(err);
                }
            }
        }
        Ok(text)
    }
}

impl MarkupEngine for PlainMarkup {
    fn protect(&self, html: String) -> String {
        let mut fragments = self.fragments.lock().unwrap_or_else(|e| e.into_inner());
        let index = fragments.next;
        fragments.next += 1;
        fragments.stored.insert(index, html);
        format!("{PLACEHOLDER_MARK}{index}{PLACEHOLDER_MARK}")
    }

    fn render_line(
        &self,
        text: &str,
        inline: &dyn InlineHandler,
    ) -> Result<String, AnnotationError> {
        let expanded = self.expand_inline(text.trim(), inline)?;
        Ok(self.restore(&escape_html(&expanded)))
    }

    fn render_block(
        &self,
        text: &str,
        inline: &dyn InlineHandler,
    ) -> Result<String, AnnotationError> {
        let expanded = self.expand_inline(text.trim(), inline)?;
        let escaped = PARAGRAPH_BREAK
            .split(&expanded)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("<p>{}</p>", escape_html(p)))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(self.restore(&escaped))
    }
}
