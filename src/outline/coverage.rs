use std::collections::HashSet;

use crate::{
    core::types::{ChunkMap, PartitionReport, SectionNode},
    outline::object_index::ObjectIndex,
};

pub fn summarize(root: &SectionNode, chunks: &ChunkMap, index: &ObjectIndex<'_>) -> PartitionReport {
    let leaves = root.leaves();
    let assigned: HashSet<&str> = leaves
        .iter()
        .filter_map(|leaf| chunks.get(&leaf.id))
        .flatten()
        .map(String::as_str)
        .collect();

    let unassigned_fragment_ids: Vec<String> = index
        .ids()
        .filter(|id| !assigned.contains(id))
        .map(str::to_string)
        .collect();
    let empty_leaf_ids: Vec<String> = leaves
        .iter()
        .filter(|leaf| chunks.get(&leaf.id).map_or(true, Vec::is_empty))
        .map(|leaf| leaf.id.clone())
        .collect();

    let total_fragments = index.len();
    let assigned_fragments = total_fragments - unassigned_fragment_ids.len();
    let coverage = if total_fragments == 0 {
        0.0
    } else {
        assigned_fragments as f64 / total_fragments as f64
    };

    PartitionReport {
        total_fragments,
        assigned_fragments,
        unassigned_fragment_ids,
        empty_leaf_ids,
        coverage,
    }
}

#[cfg(test)]
mod tests {
    use super::summarize;
    use crate::{
        core::types::{ChunkMap, Fragment, SectionNode},
        outline::object_index::ObjectIndex,
    };

    #[test]
    fn reports_gaps_and_empty_leaves() {
        let fragments: Vec<Fragment> = (0..4)
            .map(|i| Fragment::text(format!("o{i}"), "doc", None, i, "x"))
            .collect();
        let index = ObjectIndex::build(&fragments);
        let mut root = SectionNode::new("root", "doc", None, "Document", 0);
        root.children.push(SectionNode::new("a", "doc", None, "A", 0));
        root.children.push(SectionNode::new("b", "doc", None, "B", 0));
        let mut chunks = ChunkMap::new();
        chunks.insert("a".to_string(), vec!["o1".to_string(), "o2".to_string()]);
        chunks.insert("b".to_string(), vec![]);

        let report = summarize(&root, &chunks, &index);

        assert_eq!(report.total_fragments, 4);
        assert_eq!(report.assigned_fragments, 2);
        assert_eq!(report.unassigned_fragment_ids, vec!["o0", "o3"]);
        assert_eq!(report.empty_leaf_ids, vec!["b"]);
        assert!((report.coverage - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_document_has_zero_coverage() {
        let root = SectionNode::new("root", "doc", None, "Document", 0);
        let report = summarize(&root, &ChunkMap::new(), &ObjectIndex::build(&[]));
        assert_eq!(report.total_fragments, 0);
        assert_eq!(report.coverage, 0.0);
        assert_eq!(report.empty_leaf_ids, vec!["root"]);
    }
}
