use std::collections::HashMap;

use tracing::debug;

use crate::{
    core::types::{SectionNode, SectionSpan},
    outline::{normalize::normalize_for_match, object_index::ObjectIndex, parser::split_marker},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorOutcome {
    pub anchored: usize,
    pub unresolved: Vec<String>,
}

pub(crate) fn prepare_lines(index: &ObjectIndex<'_>) -> Vec<Vec<String>> {
    index
        .fragments()
        .iter()
        .map(|fragment| {
            fragment
                .text_or_empty()
                .lines()
                .map(|line| normalize_for_match(split_marker(line).title))
                .filter(|line| !line.is_empty())
                .collect()
        })
        .collect()
}

pub(crate) fn find_anchor(title: &str, from: usize, lines: &[Vec<String>]) -> Option<usize> {
    let target = normalize_for_match(title);
    if target.is_empty() {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, entries)| {
            entries.iter().any(|line| {
                line == &target || line.starts_with(target.as_str()) || target.starts_with(line.as_str())
            })
        })
        .map(|(position, _)| position)
}

// Pre-order with a forward-only cursor: after a node anchors at `p`, later nodes only
// look at `p + 1..`.
pub fn resolve_anchors(root: &mut SectionNode, index: &ObjectIndex<'_>) -> AnchorOutcome {
    let lines = prepare_lines(index);
    let mut starts: HashMap<String, usize> = HashMap::new();
    let mut outcome = AnchorOutcome::default();
    let mut cursor = 0usize;

    for node in root.preorder().into_iter().skip(1) {
        match find_anchor(&node.title, cursor, &lines) {
            Some(position) => {
                starts.insert(node.id.clone(), position);
                cursor = position + 1;
                outcome.anchored += 1;
            }
            None => {
                debug!(section_id = %node.id, title = %node.title, "section title not anchored");
                outcome.unresolved.push(node.id.clone());
            }
        }
    }

    root.span = None;
    assign_spans(root, index.len(), &starts, index);
    outcome
}

fn assign_spans(
    node: &mut SectionNode,
    boundary: usize,
    starts: &HashMap<String, usize>,
    index: &ObjectIndex<'_>,
) {
    let child_starts: Vec<Option<usize>> = node
        .children
        .iter()
        .map(|child| starts.get(&child.id).copied())
        .collect();

    for (idx, child) in node.children.iter_mut().enumerate() {
        let next_boundary = child_starts[idx + 1..]
            .iter()
            .flatten()
            .next()
            .copied()
            .unwrap_or(boundary);
        assign_spans(child, next_boundary, starts, index);

        child.span = child_starts[idx].and_then(|start| {
            let end = next_boundary
                .saturating_sub(1)
                .max(start)
                .min(index.len().saturating_sub(1));
            Some(SectionSpan {
                start_fragment_id: index.id_at(start)?.to_string(),
                end_fragment_id: index.id_at(end)?.to_string(),
            })
        });
    }
}
