use tracing::{debug, warn};

use crate::{
    core::types::{ChunkMap, SectionNode},
    outline::{anchors::prepare_lines, normalize::normalize_for_match, object_index::ObjectIndex},
};

#[derive(Debug, Clone, Copy)]
struct LeafStart<'t> {
    leaf_id: &'t str,
    position: usize,
    has_chunk: bool,
}

/// Fragment lists for leaves with an empty chunk. Never written back to the stored chunk map.
pub fn fallback_assignments(
    root: &SectionNode,
    chunks: &ChunkMap,
    index: &ObjectIndex<'_>,
) -> ChunkMap {
    let leaves = root.leaves();
    let mut out = ChunkMap::new();
    if leaves.is_empty() || index.is_empty() {
        return out;
    }

    let lines = prepare_lines(index);
    let mut starts: Vec<LeafStart<'_>> = Vec::new();
    for leaf in &leaves {
        let existing = chunks
            .get(&leaf.id)
            .and_then(|ids| ids.iter().find_map(|id| index.position(id)));
        if let Some(position) = existing {
            starts.push(LeafStart {
                leaf_id: leaf.id.as_str(),
                position,
                has_chunk: true,
            });
        } else if let Some(position) = find_heading(&leaf.title, &lines) {
            starts.push(LeafStart {
                leaf_id: leaf.id.as_str(),
                position,
                has_chunk: false,
            });
        }
    }

    if starts.is_empty() {
        warn!(
            section_id = %leaves[0].id,
            fragments = index.len(),
            "no leaf resolved; assigning whole document to first leaf"
        );
        out.insert(leaves[0].id.clone(), index.ids().map(str::to_string).collect());
        return out;
    }

    starts.sort_by_key(|start| start.position);
    for (idx, start) in starts.iter().enumerate() {
        if start.has_chunk {
            continue;
        }
        let end = starts[idx + 1..]
            .iter()
            .map(|next| next.position)
            .find(|next| *next > start.position)
            .unwrap_or(index.len());
        let ids: Vec<String> = (start.position..end)
            .filter_map(|position| index.id_at(position))
            .map(str::to_string)
            .collect();
        debug!(section_id = start.leaf_id, fragments = ids.len(), "fallback chunk");
        out.insert(start.leaf_id.to_string(), ids);
    }
    out
}

pub fn effective_leaf_chunks(
    root: &SectionNode,
    chunks: &ChunkMap,
    index: &ObjectIndex<'_>,
) -> ChunkMap {
    let needs_fallback = root
        .leaves()
        .iter()
        .any(|leaf| chunks.get(&leaf.id).map_or(true, Vec::is_empty));
    let fallback = if needs_fallback {
        fallback_assignments(root, chunks, index)
    } else {
        ChunkMap::new()
    };

    root.leaves()
        .into_iter()
        .filter_map(|leaf| {
            let ids = chunks
                .get(&leaf.id)
                .filter(|ids| !ids.is_empty())
                .or_else(|| fallback.get(&leaf.id))?;
            Some((leaf.id.clone(), ids.clone()))
        })
        .collect()
}

fn find_heading(title: &str, lines: &[Vec<String>]) -> Option<usize> {
    let target = normalize_for_match(title);
    if target.is_empty() {
        return None;
    }
    lines
        .iter()
        .position(|entries| entries.iter().any(|line| *line == target))
}
