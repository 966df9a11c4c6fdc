//! Balanced-brace scanner for `{@tag value}` tokens.

use std::collections::HashMap;
use std::ops::Range;

/// One inline tag found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineTagMatch<'t> {
    /// Byte range of the whole token, braces included
    pub range: Range<usize>,
    pub name: &'t str,
    /// Text between the whitespace after the name and the closing brace
    pub value: Option<&'t str>,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Offset of the `}` that closes each `{`, keyed by the offset of the `{`.
///
/// One stack pass; unclosed braces have no entry.
fn closing_braces(bytes: &[u8]) -> HashMap<usize, usize> {
    let mut closers = HashMap::new();
    let mut open = Vec::new();
    for (pos, b) in bytes.iter().enumerate() {
        match b {
            b'{' => open.push(pos),
            b'}' => {
                if let Some(start) = open.pop() {
                    closers.insert(start, pos);
                }
            }
            _ => {}
        }
    }
    closers
}

/// Closing brace of the `{` at `start`, scanning forward.
fn closing_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, b) in bytes[start..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse an inline tag starting exactly at `start`.
///
/// The value may contain balanced `{...}` groups; a token whose closing brace
/// is missing does not match.
pub fn try_parse_inline_tag(text: &str, start: usize) -> Option<InlineTagMatch<'_>> {
    if !text[start..].starts_with("{@") {
        return None;
    }
    parse_tag(text, start, closing_brace(text.as_bytes(), start))
}

/// Parse the tag at `start` given the offset of its closing brace.
fn parse_tag(text: &str, start: usize, close: Option<usize>) -> Option<InlineTagMatch<'_>> {
    let bytes = text.as_bytes();
    if !text[start..].starts_with("{@") {
        return None;
    }

    let name_start = start + 2;
    let mut pos = name_start;
    while pos < bytes.len() && is_word_byte(bytes[pos]) {
        pos += 1;
    }
    if pos == name_start {
        return None;
    }
    let name = &text[name_start..pos];

    match bytes.get(pos) {
        Some(b'}') => {
            return Some(InlineTagMatch {
                range: start..pos + 1,
                name,
                value: None,
            });
        }
        Some(b) if b.is_ascii_whitespace() => {}
        _ => return None,
    }

    // Name and whitespace hold no braces, so the value ends at the closer
    let close = close?;
    while pos < close && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    Some(InlineTagMatch {
        range: start..close + 1,
        name,
        value: Some(&text[pos..close]),
    })
}

/// All non-overlapping inline tags in `text`, left to right.
///
/// Linear in the length of `text`, however many tags are left unclosed.
pub fn find_inline_tags(text: &str) -> Vec<InlineTagMatch<'_>> {
    let closers = closing_braces(text.as_bytes());
    let mut matches = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find("{@") {
        let start = pos + offset;
        match parse_tag(text, start, closers.get(&start).copied()) {
            Some(m) => {
                pos = m.range.end;
                matches.push(m);
            }
            None => pos = start + 1,
        }
    }
    matches
}
