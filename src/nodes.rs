//! Regulation node loading.
//!
//! Handles loading the regulation nodes whose text is scanned for citations,
//! supporting both standard JSON arrays and JSONL format (one node per line).
//! A node's label starts with its part and section, which become the
//! context for paragraph phrases found in its text.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::citations::SectionContext;

/// Errors that can occur when loading nodes.
#[derive(Error, Debug)]
pub enum NodesError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid JSONL at line {line}: {message}")]
    Jsonl { line: usize, message: String },

    #[error("Nodes must be a JSON array")]
    NotAnArray,

    #[error("Node label {label:?} needs at least a part and a section")]
    ShortLabel { label: Vec<String> },
}

/// One node of a regulation tree, e.g. paragraph `1005.6(a)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Hierarchical label, e.g. `["1005", "6", "a"]`
    pub label: Vec<String>,
    /// The node's own text
    pub text: String,
}

impl Node {
    /// The part and section this node belongs to.
    pub fn context(&self) -> Option<SectionContext> {
        match self.label.as_slice() {
            [part, section, ..] => Some(SectionContext::new(part.as_str(), section.as_str())),
            _ => None,
        }
    }

    /// The label joined with `-`, e.g. `1005-6-a`.
    pub fn label_id(&self) -> String {
        self.label.join("-")
    }
}

/// Loads nodes from a JSON array or JSONL file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, contains invalid JSON, or
/// holds a node whose label lacks a part and section.
pub fn load_nodes(path: &Path) -> Result<Vec<Node>, NodesError> {
    let content = fs::read_to_string(path)?;
    parse_nodes(&content)
}

/// Parses nodes from already-read content.
///
/// Supports two input formats:
/// - JSON array: `[{"label": ["1005", "6"], "text": "..."}, ...]`
/// - JSONL: `{"label": ["1005", "6"], "text": "..."}\n{...}`
///
/// Empty content yields no nodes.
pub fn parse_nodes(content: &str) -> Result<Vec<Node>, NodesError> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let nodes: Vec<Node> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        // A lone scalar or string is neither an array nor JSONL
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if !value.is_object() {
                return Err(NodesError::NotAnArray);
            }
        }
        parse_jsonl(content)?
    };

    if let Some(node) = nodes.iter().find(|node| node.context().is_none()) {
        return Err(NodesError::ShortLabel {
            label: node.label.clone(),
        });
    }

    Ok(nodes)
}

fn parse_jsonl(content: &str) -> Result<Vec<Node>, NodesError> {
    let mut nodes = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let node = serde_json::from_str::<Node>(line).map_err(|e| NodesError::Jsonl {
            line: line_num + 1,
            message: e.to_string(),
        })?;
        nodes.push(node);
    }

    Ok(nodes)
}
