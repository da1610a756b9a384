use std::collections::HashMap;

use tracing::debug;

use crate::{
    core::types::{ChunkMap, Fragment, SectionNode},
    outline::object_index::ObjectIndex,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateRange {
    pub low: usize,
    pub high: usize,
}

impl CandidateRange {
    fn contains(&self, position: usize) -> bool {
        self.low <= position && position <= self.high
    }
}

#[derive(Debug, Clone)]
struct LeafRange<'t> {
    leaf: &'t SectionNode,
    range: CandidateRange,
}

pub fn candidate_range(leaf: &SectionNode, index: &ObjectIndex<'_>) -> Option<CandidateRange> {
    let span = leaf.span.as_ref()?;
    let start = index.position(&span.start_fragment_id)?;
    let end = index.position(&span.end_fragment_id)?;
    Some(CandidateRange {
        low: start.min(end),
        high: start.max(end),
    })
}

// Winner per position is the smallest `(position - range start, depth, id)`.
pub fn assign_chunks(root: &SectionNode, fragments: &[Fragment]) -> ChunkMap {
    let index = ObjectIndex::build(fragments);
    assign_chunks_indexed(root, &index)
}

pub fn assign_chunks_indexed(root: &SectionNode, index: &ObjectIndex<'_>) -> ChunkMap {
    let leaves = root.leaves();
    let ranges: Vec<LeafRange<'_>> = leaves
        .iter()
        .copied()
        .filter_map(|leaf| candidate_range(leaf, index).map(|range| LeafRange { leaf, range }))
        .collect();

    let mut leaf_chunks: HashMap<&str, Vec<String>> = HashMap::new();
    let mut unassigned = 0usize;
    for (position, fragment) in index.fragments().iter().enumerate() {
        let winner = ranges
            .iter()
            .filter(|candidate| candidate.range.contains(position))
            .min_by(|a, b| {
                let key_a = (position - a.range.low, a.leaf.depth, a.leaf.id.as_str());
                let key_b = (position - b.range.low, b.leaf.depth, b.leaf.id.as_str());
                key_a.cmp(&key_b)
            });
        match winner {
            Some(candidate) => leaf_chunks
                .entry(candidate.leaf.id.as_str())
                .or_default()
                .push(fragment.id.clone()),
            None => unassigned += 1,
        }
    }
    debug!(
        leaves = leaves.len(),
        ranged_leaves = ranges.len(),
        unassigned,
        "assigned fragments to leaves"
    );

    let mut chunks = ChunkMap::new();
    aggregate(root, &mut leaf_chunks, &mut chunks);
    chunks
}

fn aggregate(
    node: &SectionNode,
    leaf_chunks: &mut HashMap<&str, Vec<String>>,
    out: &mut ChunkMap,
) -> Vec<String> {
    let chunk = if node.is_leaf() {
        leaf_chunks.remove(node.id.as_str()).unwrap_or_default()
    } else {
        // Declaration order, not document order: a parent whose children are listed out
        // of document order gets an out-of-order chunk.
        node.children
            .iter()
            .flat_map(|child| aggregate(child, leaf_chunks, out))
            .collect()
    };
    out.insert(node.id.clone(), chunk.clone());
    chunk
}
