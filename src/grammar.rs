//! Internal citation grammar.
//!
//! chumsky combinators recognizing the four phrase shapes an internal
//! citation can take:
//!
//! - `§§ 1005.6(b)(3) and 1005.11(b)(1)(i)` (multiple sections)
//! - `§ 1005.20(h)(1)` or `§ 1005.10(a) and (d)` (single section)
//! - `paragraph (a)(4)(iii)` (single paragraph)
//! - `paragraphs (c)(3), (d)(2), and (f)` (multiple paragraphs)
//!
//! Paragraph markers nest up to four levels deep, each level with its own
//! character class:
//!
//! | depth | class                    | example |
//! |-------|--------------------------|---------|
//! | 1     | lowercase letters        | `(b)`   |
//! | 2     | digits                   | `(3)`   |
//! | 3     | letters from `ivxlcdm`   | `(iv)`  |
//! | 4     | uppercase letters        | `(A)`   |
//!
//! Whitespace may precede any token. Every node the extraction step needs
//! offsets for is wrapped in [`Positioned`], whose span starts at the node's
//! first non-whitespace character.

use std::fmt;
use std::ops::Range;

use chumsky::{prelude::*, BoxedParser, Stream};

type GrammarError = Simple<char>;

/// A parsed node together with its `[start, end)` byte offsets in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positioned<T> {
    pub node: T,
    pub span: (usize, usize),
}

/// The per-depth values of a marker chain such as `(b)(1)(i)`.
///
/// A chain may start at any depth, but once started each further marker is
/// exactly one level deeper than the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerChain {
    /// Lowercase letters, e.g. `b`
    pub level1: Option<String>,
    /// Digits, e.g. `1`
    pub level2: Option<String>,
    /// Roman-numeral letters, e.g. `iv` (not validated as a numeral)
    pub level3: Option<String>,
    /// Uppercase letters, e.g. `A`
    pub level4: Option<String>,
}

impl MarkerChain {
    /// The four levels in depth order, absent levels as `None`.
    pub fn to_levels(&self) -> [Option<String>; 4] {
        [
            self.level1.clone(),
            self.level2.clone(),
            self.level3.clone(),
            self.level4.clone(),
        ]
    }

    /// Depth (1-4) of the shallowest marker present.
    pub fn depth(&self) -> Option<usize> {
        [&self.level1, &self.level2, &self.level3, &self.level4]
            .iter()
            .position(|level| level.is_some())
            .map(|index| index + 1)
    }
}

/// A `part.section` reference with an optional paragraph list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRef {
    pub part: String,
    pub section: String,
    /// Depth-1-rooted chain directly after the section number
    pub head: Option<Positioned<MarkerChain>>,
    /// Further chains joined to the head by `,`, `and` or `or`
    pub tail: Vec<Positioned<MarkerChain>>,
}

/// The phrase shape that matched at a scan position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phrase {
    /// `§§ A and B`: every section carries its own part and section.
    MultipleSections(Vec<Positioned<SectionRef>>),
    /// `§ A`, possibly followed by a paragraph tail list.
    SingleSection(Positioned<SectionRef>),
    /// `paragraph (x)` within the current section.
    SingleParagraph(Positioned<MarkerChain>),
    /// `paragraphs (x), (y) and (z)` within the current section.
    MultipleParagraphs {
        head: Positioned<MarkerChain>,
        tail: Vec<Positioned<MarkerChain>>,
    },
}

impl Phrase {
    /// Short name of the phrase shape, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Phrase::MultipleSections(_) => "multiple_sections",
            Phrase::SingleSection(_) => "single_section",
            Phrase::SingleParagraph(_) => "single_paragraph",
            Phrase::MultipleParagraphs { .. } => "multiple_paragraphs",
        }
    }
}

/// The composed citation grammar.
///
/// Holds no per-scan state and is reused across scans. The boxed parser is
/// reference-counted, so a `Grammar` is not `Sync`: each thread builds its own.
#[derive(Clone)]
pub struct Grammar {
    parser: BoxedParser<'static, char, Positioned<Phrase>, GrammarError>,
}

impl Grammar {
    pub fn new() -> Self {
        Self {
            parser: citation_phrase().boxed(),
        }
    }

    /// Attempts to match one citation phrase starting exactly at byte `offset`.
    ///
    /// Returns `None` when no phrase matches there or when `offset` is not a
    /// char boundary of `text`. Spans in the result are absolute offsets into
    /// `text`.
    pub fn match_at(&self, text: &str, offset: usize) -> Option<Positioned<Phrase>> {
        let rest = text.get(offset..)?;
        let eoi = text.len()..text.len();
        let stream = Stream::from_iter(
            eoi,
            rest.char_indices().map(move |(index, c)| {
                let start = offset + index;
                (c, start..start + c.len_utf8())
            }),
        );
        self.parser.parse(stream).ok()
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar").finish_non_exhaustive()
    }
}

fn whitespace() -> impl Parser<char, (), Error = GrammarError> + Clone {
    filter(|c: &char| c.is_whitespace()).repeated().ignored()
}

/// A token that may be preceded by whitespace.
fn token<T>(
    parser: impl Parser<char, T, Error = GrammarError> + Clone,
) -> impl Parser<char, T, Error = GrammarError> + Clone {
    whitespace().ignore_then(parser)
}

/// Wraps a node with its byte span, excluding leading whitespace.
fn positioned<T>(
    parser: impl Parser<char, T, Error = GrammarError> + Clone,
) -> impl Parser<char, Positioned<T>, Error = GrammarError> + Clone {
    whitespace().ignore_then(parser.map_with_span(|node, span: Range<usize>| Positioned {
        node,
        span: (span.start, span.end),
    }))
}

fn is_roman(c: &char) -> bool {
    matches!(*c, 'i' | 'v' | 'x' | 'l' | 'c' | 'd' | 'm')
}

fn number() -> impl Parser<char, String, Error = GrammarError> + Clone {
    token(
        filter(char::is_ascii_digit)
            .repeated()
            .at_least(1)
            .collect::<String>(),
    )
}

/// A single parenthesized marker whose content is a run of `class` characters.
fn marker(class: fn(&char) -> bool) -> impl Parser<char, String, Error = GrammarError> + Clone {
    token(just('('))
        .ignore_then(token(filter(class).repeated().at_least(1).collect::<String>()))
        .then_ignore(token(just(')')))
}

fn depth4_chain() -> impl Parser<char, MarkerChain, Error = GrammarError> + Clone {
    marker(char::is_ascii_uppercase).map(|level4| MarkerChain {
        level4: Some(level4),
        ..MarkerChain::default()
    })
}

fn depth3_chain() -> impl Parser<char, MarkerChain, Error = GrammarError> + Clone {
    marker(is_roman)
        .then(marker(char::is_ascii_uppercase).or_not())
        .map(|(level3, level4)| MarkerChain {
            level3: Some(level3),
            level4,
            ..MarkerChain::default()
        })
}

fn depth2_chain() -> impl Parser<char, MarkerChain, Error = GrammarError> + Clone {
    marker(char::is_ascii_digit)
        .then(depth3_chain().or_not())
        .map(|(level2, deeper)| MarkerChain {
            level2: Some(level2),
            ..deeper.unwrap_or_default()
        })
}

fn depth1_chain() -> impl Parser<char, MarkerChain, Error = GrammarError> + Clone {
    marker(char::is_ascii_lowercase)
        .then(depth2_chain().or_not())
        .map(|(level1, deeper)| MarkerChain {
            level1: Some(level1),
            ..deeper.unwrap_or_default()
        })
}

/// Longest chain first: a shallower start is only tried when the deeper one fails.
fn any_depth_chain() -> impl Parser<char, MarkerChain, Error = GrammarError> + Clone {
    choice((depth1_chain(), depth2_chain(), depth3_chain(), depth4_chain()))
}

/// `,`, `and` or `or`, optionally followed by `and` (", and").
fn connector() -> impl Parser<char, (), Error = GrammarError> + Clone {
    token(choice((just(","), just("and"), just("or"))))
        .then(token(just("and")).or_not())
        .ignored()
}

fn tail_list() -> impl Parser<char, Vec<Positioned<MarkerChain>>, Error = GrammarError> + Clone {
    connector()
        .ignore_then(positioned(any_depth_chain()))
        .repeated()
        .at_least(1)
}

fn single_section() -> impl Parser<char, Positioned<SectionRef>, Error = GrammarError> + Clone {
    positioned(
        number()
            .then_ignore(token(just('.')))
            .then(number())
            .then(
                positioned(depth1_chain())
                    .then(tail_list().or_not())
                    .or_not(),
            )
            .map(|((part, section), paragraphs)| {
                let (head, tail) = match paragraphs {
                    Some((head, tail)) => (Some(head), tail.unwrap_or_default()),
                    None => (None, Vec::new()),
                };
                SectionRef {
                    part,
                    section,
                    head,
                    tail,
                }
            }),
    )
}

fn single_section_with_marker(
) -> impl Parser<char, Positioned<SectionRef>, Error = GrammarError> + Clone {
    token(just('§')).ignore_then(single_section())
}

fn multiple_sections(
) -> impl Parser<char, Vec<Positioned<SectionRef>>, Error = GrammarError> + Clone {
    token(just("§§"))
        .ignore_then(single_section())
        .then(connector().ignore_then(single_section()).repeated().at_least(1))
        .map(|(head, tail)| {
            let mut sections = Vec::with_capacity(tail.len() + 1);
            sections.push(head);
            sections.extend(tail);
            sections
        })
}

fn single_paragraph() -> impl Parser<char, Positioned<MarkerChain>, Error = GrammarError> + Clone
{
    token(just("paragraph")).ignore_then(positioned(any_depth_chain()))
}

fn multiple_paragraphs() -> impl Parser<
    char,
    (Positioned<MarkerChain>, Vec<Positioned<MarkerChain>>),
    Error = GrammarError,
> + Clone {
    token(just("paragraphs"))
        .ignore_then(positioned(any_depth_chain()))
        .then(tail_list())
}

/// The top-level alternation, tried strictly in this order at each position.
///
/// `multiple_sections` must come before the single-section shape, otherwise
/// `§§ A and B` would never reach it.
fn citation_phrase() -> impl Parser<char, Positioned<Phrase>, Error = GrammarError> + Clone {
    positioned(choice((
        multiple_sections().map(Phrase::MultipleSections),
        single_section_with_marker().map(Phrase::SingleSection),
        single_paragraph().map(Phrase::SingleParagraph),
        multiple_paragraphs().map(|(head, tail)| Phrase::MultipleParagraphs { head, tail }),
    )))
}
