//! Outline reconciliation: parse an outline, anchor it into the fragment stream, and
//! partition the stream over the resulting tree.

pub mod anchors;
pub mod coverage;
pub mod fallback;
pub mod normalize;
pub mod object_index;
pub mod parser;
pub mod spans;

use crate::core::types::{Fragment, SectionNode};

use self::{anchors::resolve_anchors, object_index::ObjectIndex, parser::parse_outline};

#[derive(Debug, Clone)]
pub struct DiscoveredTree {
    pub root: SectionNode,
    pub used_fallback_outline: bool,
    pub anchored: usize,
    pub unresolved: Vec<String>,
}

/// Outline text + fragments -> positioned section tree. Deterministic; a fresh tree is
/// built on every call.
pub fn discover_tree(document_id: &str, outline_text: &str, fragments: &[Fragment]) -> DiscoveredTree {
    let parsed = parse_outline(document_id, outline_text);
    let index = ObjectIndex::build(fragments);
    let mut root = parsed.root;
    let outcome = resolve_anchors(&mut root, &index);
    DiscoveredTree {
        root,
        used_fallback_outline: parsed.used_fallback,
        anchored: outcome.anchored,
        unresolved: outcome.unresolved,
    }
}
