//! Integration tests using TOML fixtures.
//!
//! This test harness loads test cases from TOML files in the `fixtures/` directory
//! and runs them against the reg-citations library.

mod common;

use std::fs;
use std::path::Path;

use serde::Deserialize;

use reg_citations::{
    build_layer, extract_internal_citations, link_citations, parse_nodes,
    InternalCitationParser, SectionContext,
};

/// A test fixture loaded from a TOML file.
#[derive(Debug, Deserialize)]
struct Fixture {
    /// Name of the test case
    name: String,
    /// Input regulation text
    text: String,
    /// Part and section of the text, e.g. "1005.6"
    context: String,
    /// Expected citations, in order
    #[serde(default)]
    expected: Vec<ExpectedCitation>,
}

#[derive(Debug, Deserialize)]
struct ExpectedCitation {
    /// Expected label
    citation: Vec<String>,
    /// Expected text covered by the citation's offsets
    text: String,
}

/// Load all fixtures from a directory.
fn load_fixtures(dir: &Path) -> Vec<(String, Fixture)> {
    let mut fixtures = Vec::new();

    if !dir.exists() {
        return fixtures;
    }

    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();

        if path.extension().map_or(false, |e| e == "toml") {
            let content = fs::read_to_string(&path).unwrap();
            let fixture: Fixture = toml::from_str(&content).unwrap();
            let name = path.file_stem().unwrap().to_string_lossy().to_string();
            fixtures.push((name, fixture));
        }
    }

    fixtures.sort_by(|a, b| a.0.cmp(&b.0));
    fixtures
}

/// Run extraction tests - verify labels and spans, in order.
fn run_extraction_test(name: &str, fixture: &Fixture) {
    let context: SectionContext = fixture.context.parse().unwrap();
    let citations = extract_internal_citations(&fixture.text, &context);

    println!(
        "Extraction test '{}': {} citations found",
        name,
        citations.len()
    );

    assert_eq!(
        citations.len(),
        fixture.expected.len(),
        "Test '{}' failed: expected {} citations, got {:?}",
        name,
        fixture.expected.len(),
        citations
    );

    let texts = common::cited_texts(&fixture.text, &citations);
    for (i, (citation, expected)) in citations.iter().zip(&fixture.expected).enumerate() {
        assert_eq!(
            citation.citation, expected.citation,
            "Test '{}' failed: label mismatch at citation {}",
            name, i
        );
        assert_eq!(
            texts[i], expected.text,
            "Test '{}' failed: span mismatch at citation {}",
            name, i
        );
    }
}

#[test]
fn test_extraction_fixtures() {
    let fixtures_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/extraction");
    let fixtures = load_fixtures(&fixtures_dir);
    assert!(!fixtures.is_empty(), "No extraction fixtures found");

    for (name, fixture) in fixtures {
        println!("Running extraction test: {}", fixture.name);
        run_extraction_test(&name, &fixture);
    }
}

#[test]
fn test_spans_are_trimmed_and_labels_prefixed() {
    // Given: every fixture text
    let fixtures_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/extraction");

    for (name, fixture) in load_fixtures(&fixtures_dir) {
        let context: SectionContext = fixture.context.parse().unwrap();

        // When: we extract citations
        let citations = extract_internal_citations(&fixture.text, &context);

        // Then: spans carry no surrounding blanks and labels start with a part
        for text in common::cited_texts(&fixture.text, &citations) {
            assert_eq!(text, text.trim(), "Test '{}': untrimmed span", name);
        }
        for citation in &citations {
            assert!(
                citation.citation.len() >= 2 && citation.citation.len() <= 6,
                "Test '{}': bad label length {:?}",
                name,
                citation.citation
            );
            assert_eq!(citation.citation[0], context.part, "Test '{}'", name);
        }
    }
}

#[test]
fn test_layer_from_nodes() {
    // Given: a small section as JSONL
    let nodes = parse_nodes(common::NODES_JSONL).unwrap();

    // When: we build its citation layer
    let layer = build_layer(&nodes, &InternalCitationParser::new());

    // Then: only paragraphs (a) and (c) carry citations
    let keys: Vec<&str> = layer.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["1005-6-a", "1005-6-c"]);
    assert_eq!(layer["1005-6-a"][1].citation, vec!["1005", "6", "b", "2"]);
    assert_eq!(
        layer["1005-6-c"][1].citation,
        vec!["1005", "11", "b", "1", "i"]
    );
}

#[test]
fn test_link_extracted_citations() {
    let text = "Except as provided in paragraphs (b)(1) or (b)(2) of this section";
    let citations = extract_internal_citations(text, &SectionContext::new("1005", "6"));

    let linked = link_citations(text, &citations);

    assert_eq!(
        linked,
        "Except as provided in paragraphs \
         <a href=\"#1005-6-b-1\" class=\"citation internal\">(b)(1)</a> or \
         <a href=\"#1005-6-b-2\" class=\"citation internal\">(b)(2)</a> of this section"
    );
}

#[test]
fn test_link_citations_after_multibyte_characters() {
    // Given: a passage where '§' and accented letters precede the citations
    let text = "Ménage — see § 1005.6(a) and paragraph (b)";
    let citations = extract_internal_citations(text, &SectionContext::new("1005", "6"));
    assert_eq!(citations[0].offsets, vec![(15, 24)]);

    // When: we link the citations
    let linked = link_citations(text, &citations);

    // Then: each link wraps exactly the cited characters
    assert_eq!(
        linked,
        "Ménage — see § \
         <a href=\"#1005-6-a\" class=\"citation internal\">1005.6(a)</a> and paragraph \
         <a href=\"#1005-6-b\" class=\"citation internal\">(b)</a>"
    );
}

#[test]
fn test_section_offsets_count_characters() {
    let text = "set forth in §§ 1005.6(b)(3) and 1005.11 (b)(1)(i) from 60 days";
    let citations = extract_internal_citations(text, &SectionContext::new("1005", "6"));

    assert_eq!(citations[0].offsets, vec![(16, 28)]);
    assert_eq!(citations[1].offsets, vec![(33, 50)]);
    assert_eq!(
        common::cited_texts(text, &citations),
        vec!["1005.6(b)(3)", "1005.11 (b)(1)(i)"]
    );
}
