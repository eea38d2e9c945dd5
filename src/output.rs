//! Output generation for extracted citations.
//!
//! This module builds the citation layer for a set of regulation nodes and
//! renders cross-reference links into cited text.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::citations::{byte_range, Citation, InternalCitationParser};
use crate::nodes::Node;

/// Citations keyed by the label (joined with `-`) of the node they occur in.
pub type Layer = BTreeMap<String, Vec<Citation>>;

/// Builds the citation layer for `nodes`.
///
/// Nodes without any citation are left out. A node whose label has no part
/// and section cannot be scanned and is skipped with a warning.
pub fn build_layer(nodes: &[Node], parser: &InternalCitationParser) -> Layer {
    let mut layer = Layer::new();

    for node in nodes {
        let Some(context) = node.context() else {
            tracing::warn!(label = ?node.label, "Skipping node without part and section");
            continue;
        };

        let citations = parser.parse(&node.text, &context);
        if !citations.is_empty() {
            layer.insert(node.label_id(), citations);
        }
    }

    layer
}

/// Wraps every cited span of `text` in a link to the cited node.
///
/// # Implementation Note
///
/// Character offsets are mapped to byte ranges first. Replacements are then
/// performed from the end of the text towards the beginning to preserve the
/// validity of earlier ranges. A span overlapping one that was already linked,
/// or one that does not fall inside `text`, is left as is.
pub fn link_citations(text: &str, citations: &[Citation]) -> String {
    let mut spans: Vec<(Range<usize>, String)> = citations
        .iter()
        .flat_map(|citation| {
            let anchor = citation.anchor();
            citation.offsets.iter().filter_map(move |&span| {
                let range = byte_range(text, span);
                if range.is_none() {
                    tracing::debug!(start = span.0, end = span.1, "Skipping span outside the text");
                }
                range.map(|range| (range, anchor.clone()))
            })
        })
        .collect();
    spans.sort_by(|a, b| b.0.start.cmp(&a.0.start).then(b.0.end.cmp(&a.0.end)));

    let mut result = text.to_string();
    let mut limit = text.len();

    for (range, anchor) in spans {
        if range.is_empty() || range.end > limit {
            tracing::debug!(start = range.start, end = range.end, "Skipping span that cannot be linked");
            continue;
        }
        let link = format!(
            "<a href=\"#{}\" class=\"citation internal\">{}</a>",
            anchor,
            &text[range.clone()]
        );
        limit = range.start;
        result.replace_range(range, &link);
    }

    result
}
