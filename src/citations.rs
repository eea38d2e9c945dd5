//! Internal citation extraction.
//!
//! Finds references to paragraphs and sections of the same document, such as
//! `paragraphs (c)(3), (d)(2), and (f) of this section` or
//! `§§ 1005.6(b)(3) and 1005.11(b)(1)(i)`, and turns each referenced node into
//! a [`Citation`]: a hierarchical label plus the character span that expressed it.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grammar::{Grammar, MarkerChain, Phrase, Positioned, SectionRef};
use crate::label::Label;

/// Every citation phrase begins with one of these literals.
static PHRASE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new("§|paragraph").expect("phrase start pattern is valid"));

/// Errors that can occur when parsing a section context.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContextError {
    #[error("Malformed section context '{0}': expected PART.SECTION (e.g. 1005.6)")]
    Malformed(String),
}

/// The part and section that paragraph phrases ("paragraph (b)") refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContext {
    pub part: String,
    pub section: String,
}

impl SectionContext {
    pub fn new(part: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            section: section.into(),
        }
    }
}

impl FromStr for SectionContext {
    type Err = ContextError;

    /// Parses `1005.6` or `1005-6`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ContextError::Malformed(s.to_string());
        let (part, section) = s
            .trim()
            .split_once(|c: char| c == '.' || c == '-')
            .ok_or_else(malformed)?;

        let is_number = |value: &str| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
        if !is_number(part) || !is_number(section) {
            return Err(malformed());
        }

        Ok(Self::new(part, section))
    }
}

impl fmt::Display for SectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.part, self.section)
    }
}

/// One cited node of the regulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// `[start, end)` character offsets of the text expressing the citation
    pub offsets: Vec<(usize, usize)>,
    /// `[part, section, level1..level4]` with absent levels omitted
    pub citation: Vec<String>,
}

impl Citation {
    fn new(span: (usize, usize), label: &Label) -> Self {
        Self {
            offsets: vec![span],
            citation: label.to_vec(),
        }
    }

    /// The label joined with `-`, e.g. `1005-6-c-3`.
    pub fn anchor(&self) -> String {
        self.citation.join("-")
    }
}

/// Extracts internal citations using the grammar it owns.
///
/// The grammar is built once in [`InternalCitationParser::new`] and reused
/// for every call to [`InternalCitationParser::parse`].
///
/// The parser is neither `Send` nor `Sync`, so it cannot be shared between
/// threads. Build one per thread, or call [`extract_internal_citations`],
/// which keeps a parser per thread.
#[derive(Debug, Clone, Default)]
pub struct InternalCitationParser {
    grammar: Grammar,
}

impl InternalCitationParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `text`, pulling out every internal citation.
    ///
    /// Paragraph phrases take their part and section from `context`; section
    /// phrases carry their own. Records come back left to right, each list
    /// head before its tail items. Matches never overlap: scanning resumes
    /// after the end of each match. Offsets count characters, not bytes; use
    /// [`byte_range`] to slice `text` with them.
    ///
    /// # Examples
    ///
    /// ```
    /// use reg_citations::{InternalCitationParser, SectionContext};
    ///
    /// let parser = InternalCitationParser::new();
    /// let text = "set forth in paragraphs (b)(1) or (b)(2)";
    /// let citations = parser.parse(text, &SectionContext::new("1005", "6"));
    /// assert_eq!(citations.len(), 2);
    /// assert_eq!(citations[1].citation, vec!["1005", "6", "b", "2"]);
    /// ```
    pub fn parse(&self, text: &str, context: &SectionContext) -> Vec<Citation> {
        let mut citations = Vec::new();
        let mut resume = 0;

        for candidate in PHRASE_START.find_iter(text) {
            let offset = candidate.start();
            if offset < resume {
                continue;
            }

            match self.grammar.match_at(text, offset) {
                Some(matched) => {
                    tracing::debug!(
                        kind = matched.node.kind(),
                        start = matched.span.0,
                        end = matched.span.1,
                        "Matched citation phrase"
                    );
                    resume = matched.span.1;
                    citations.extend(expand(matched.node, context));
                }
                None => tracing::trace!(offset, "No citation phrase at candidate"),
            }
        }

        strip_whitespace(text, &mut citations);
        to_char_offsets(text, &mut citations);
        tracing::debug!(%context, count = citations.len(), "Extracted internal citations");
        citations
    }
}

/// Converts a character-offset span of `text` into a byte range.
///
/// Returns `None` when the span is inverted or reaches past the end of `text`.
///
/// # Examples
///
/// ```
/// use reg_citations::byte_range;
///
/// let text = "§ 1005.6";
/// assert_eq!(byte_range(text, (2, 8)), Some(3..9));
/// assert_eq!(&text[3..9], "1005.6");
/// ```
pub fn byte_range(text: &str, (start, end): (usize, usize)) -> Option<Range<usize>> {
    if start > end {
        return None;
    }
    let mut boundaries = text
        .char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(text.len()));
    let byte_start = boundaries.nth(start)?;
    let byte_end = match end - start {
        0 => byte_start,
        width => boundaries.nth(width - 1)?,
    };
    Some(byte_start..byte_end)
}

/// Extracts all internal citations from `text`.
///
/// Uses a per-thread [`InternalCitationParser`], so the grammar is built at
/// most once per thread.
pub fn extract_internal_citations(text: &str, context: &SectionContext) -> Vec<Citation> {
    thread_local! {
        static PARSER: InternalCitationParser = InternalCitationParser::new();
    }
    PARSER.with(|parser| parser.parse(text, context))
}

fn expand(phrase: Phrase, context: &SectionContext) -> Vec<Citation> {
    let current_section = || Label::new(context.part.as_str(), context.section.as_str());

    match phrase {
        // No label inheritance across sections
        Phrase::MultipleSections(sections) => {
            sections.iter().flat_map(section_citations).collect()
        }
        Phrase::SingleSection(section) => section_citations(&section),
        Phrase::SingleParagraph(head) => {
            paragraph_list(current_section(), Some(&head), &[], head.span)
        }
        Phrase::MultipleParagraphs { head, tail } => {
            paragraph_list(current_section(), Some(&head), &tail, head.span)
        }
    }
}

fn section_citations(section: &Positioned<SectionRef>) -> Vec<Citation> {
    let SectionRef {
        part,
        section: number,
        head,
        tail,
    } = &section.node;
    paragraph_list(
        Label::new(part.as_str(), number.as_str()),
        head.as_ref(),
        tail,
        section.span,
    )
}

/// Builds the records for a head and its tail list.
///
/// The head record starts at `span.0` and ends with the head chain, or covers
/// all of `span` when there is no head. Each tail item is spliced into the
/// running label and keeps its own span.
fn paragraph_list(
    label: Label,
    head: Option<&Positioned<MarkerChain>>,
    tail: &[Positioned<MarkerChain>],
    span: (usize, usize),
) -> Vec<Citation> {
    let (mut label, head_span) = match head {
        Some(head) => (label.with_head(&head.node), (span.0, head.span.1)),
        None => (label, span),
    };

    let mut citations = Vec::with_capacity(tail.len() + 1);
    citations.push(Citation::new(head_span, &label));
    for item in tail {
        label.splice(&item.node);
        citations.push(Citation::new(item.span, &label));
    }
    citations
}

/// Shrinks every offset pair so it excludes leading and trailing whitespace.
///
/// A span made only of whitespace collapses to an empty span at its end.
fn strip_whitespace(text: &str, citations: &mut [Citation]) {
    for citation in citations.iter_mut() {
        for (start, end) in citation.offsets.iter_mut() {
            let Some(slice) = text.get(*start..*end) else {
                continue;
            };
            let trimmed_start = slice.trim_start();
            let leading = slice.len() - trimmed_start.len();
            let trailing = trimmed_start.len() - trimmed_start.trim_end().len();
            *start += leading;
            *end -= trailing;
        }
    }
}

/// Rewrites the byte offsets produced by the grammar as character offsets.
fn to_char_offsets(text: &str, citations: &mut [Citation]) {
    if text.is_ascii() {
        return;
    }

    let mut char_index = vec![0; text.len() + 1];
    let mut count = 0;
    for (byte, _) in text.char_indices() {
        char_index[byte] = count;
        count += 1;
    }
    char_index[text.len()] = count;

    for citation in citations.iter_mut() {
        for (start, end) in citation.offsets.iter_mut() {
            *start = char_index[*start];
            *end = char_index[*end];
        }
    }
}
