//! Shared test constants and helpers for integration tests.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

/// A small regulation section in JSONL form: a heading node and three paragraphs.
///
/// Paragraph `(a)` cites two paragraphs of its own section, `(b)` cites nothing,
/// and `(c)` cites paragraphs of two other sections.
pub const NODES_JSONL: &str = r#"{"label": ["1005", "6"], "text": "Liability of consumer for unauthorized transfers."}
{"label": ["1005", "6", "a"], "text": "Except as provided in paragraphs (b)(1) or (b)(2) of this section"}
{"label": ["1005", "6", "b"], "text": "Timely notice given."}
{"label": ["1005", "6", "c"], "text": "set forth in §§ 1005.7(a) and 1005.11(b)(1)(i)"}"#;

/// Helper to create a temporary file with content
pub fn create_temp_file(content: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// The text each citation's first offset pair covers, counting offsets in characters.
pub fn cited_texts<'a>(text: &'a str, citations: &[reg_citations::Citation]) -> Vec<&'a str> {
    citations
        .iter()
        .map(|c| {
            let range = reg_citations::byte_range(text, c.offsets[0]).unwrap();
            &text[range]
        })
        .collect()
}
