//! Line tokenization of configuration text using `nom`.
//!
//! Each non-blank line becomes a [`Line`]. `#` starts a comment that runs to
//! the end of the line; base64 keys never contain `#`, so no quoting exists.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_till1, take_while1},
    character::complete::char,
    combinator::{all_consuming, rest},
    sequence::delimited,
};
use wgns_common::error::{Result, WgnsError};

/// A meaningful line of a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// `[Name]` section header.
    Section(String),
    /// `Key = Value` entry. The value may itself contain `=`.
    Entry {
        /// Key as written.
        key: String,
        /// Value with surrounding whitespace removed.
        value: String,
    },
}

/// A [`Line`] with its 1-based position in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    /// Line number, starting at 1.
    pub line: usize,
    /// The parsed line.
    pub item: Line,
}

fn section_header(input: &str) -> IResult<&str, Line> {
    delimited(
        char('['),
        take_while1(|c: char| c != ']' && c != '['),
        char(']'),
    )
    .map(|name: &str| Line::Section(name.trim().to_string()))
    .parse(input)
}

fn entry(input: &str) -> IResult<&str, Line> {
    (take_till1(|c: char| c == '=' || c == '['), char('='), rest)
        .map(|(key, _, value): (&str, char, &str)| Line::Entry {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        })
        .parse(input)
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(content, _)| content).trim()
}

/// Splits configuration text into section headers and entries.
///
/// # Errors
///
/// Returns [`WgnsError::InvalidInput`] naming the first line that is neither
/// a `[Section]` header nor a `Key = Value` entry.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let mut lines = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let content = strip_comment(raw);
        if content.is_empty() {
            continue;
        }
        let (_, item) = all_consuming(alt((section_header, entry)))
            .parse(content)
            .map_err(|_| {
                WgnsError::invalid(format!("line {}: cannot parse {content:?}", idx + 1))
            })?;
        lines.push(Spanned { line: idx + 1, item });
    }
    Ok(lines)
}
