//! reg-citations: extraction of internal citations from regulation text.
//!
//! This library provides functionality to:
//! - Recognize citation phrases ("paragraphs (c)(3) and (d)", "§ 1005.10(a)")
//! - Expand them into labeled citation records with exact character offsets
//! - Load regulation nodes and build a citation layer for them
//! - Render cross-reference links into cited text

pub mod citations;
pub mod grammar;
pub mod label;
pub mod nodes;
pub mod output;

pub use citations::{
    byte_range, extract_internal_citations, Citation, ContextError, InternalCitationParser,
    SectionContext,
};
pub use nodes::{load_nodes, parse_nodes, Node, NodesError};
pub use output::{build_layer, link_citations, Layer};
