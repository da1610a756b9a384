use std::{collections::HashSet, sync::Arc};

use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::{
    core::types::{
        CandidateSource, ChunkMap, ExtractedItem, Fragment, FragmentKind, LeafExtractionSummary,
        SectionNode,
    },
    extraction::{
        candidates::{dedup_key, heuristic_candidates, parse_model_response},
        prompts::requirements_prompt,
    },
    outline::{fallback::effective_leaf_chunks, object_index::ObjectIndex},
    providers::LanguageModel,
};

#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub items: Vec<ExtractedItem>,
    pub leaves: Vec<LeafExtractionSummary>,
}

/// Runs one model call per leaf, strictly in leaf order.
#[derive(Clone)]
pub struct RequirementExtractor {
    model: Arc<dyn LanguageModel>,
}

impl RequirementExtractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Builds the full item list for a document. Model failures are absorbed per leaf;
    /// nothing is persisted here.
    pub async fn run(
        &self,
        document_id: &str,
        root: &SectionNode,
        fragments: &[Fragment],
        chunks: &ChunkMap,
    ) -> ExtractionOutcome {
        let index = ObjectIndex::build(fragments);
        let leaf_chunks = effective_leaf_chunks(root, chunks, &index);
        let mut outcome = ExtractionOutcome::default();

        for leaf in root.leaves() {
            let Some(assigned) = leaf_chunks.get(&leaf.id) else {
                continue;
            };
            let mut positioned: Vec<(usize, &str)> = assigned
                .iter()
                .filter_map(|id| index.position(id).map(|position| (position, id.as_str())))
                .collect();
            positioned.sort_unstable();
            let source_ids: Vec<String> = positioned.iter().map(|(_, id)| id.to_string()).collect();
            if source_ids.is_empty() {
                continue;
            }

            let section_text = positioned
                .iter()
                .filter_map(|(position, _)| index.get(*position))
                .filter(|fragment| fragment.kind == FragmentKind::Text)
                .map(|fragment| fragment.text_or_empty().trim())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            if section_text.is_empty() {
                debug!(section_id = %leaf.id, "leaf has no text fragments; skipped");
                continue;
            }

            let (candidates, source) = self.candidates_for(leaf, &section_text).await;
            let mut summary = LeafExtractionSummary {
                section_id: leaf.id.clone(),
                fragment_count: source_ids.len(),
                source,
                item_count: 0,
                duplicates_dropped: 0,
            };

            // Dedup is scoped to the leaf; two leaves may share a fallback fragment list.
            let mut seen: HashSet<(Vec<String>, String)> = HashSet::new();
            for (candidate_index, text) in candidates.into_iter().enumerate() {
                if !seen.insert((source_ids.clone(), dedup_key(&text))) {
                    summary.duplicates_dropped += 1;
                    continue;
                }
                outcome.items.push(ExtractedItem {
                    id: item_id(document_id, &leaf.id, candidate_index, &text),
                    document_id: document_id.to_string(),
                    section_id: leaf.id.clone(),
                    section_number: leaf.number.clone(),
                    section_title: leaf.title.clone(),
                    text,
                    confidence: None,
                    source_fragment_ids: source_ids.clone(),
                });
                summary.item_count += 1;
            }
            outcome.leaves.push(summary);
        }

        info!(
            document_id,
            items = outcome.items.len(),
            leaves = outcome.leaves.len(),
            "requirement extraction finished"
        );
        outcome
    }

    async fn candidates_for(
        &self,
        leaf: &SectionNode,
        section_text: &str,
    ) -> (Vec<String>, CandidateSource) {
        let prompt = requirements_prompt(leaf, section_text);
        let parsed = match self.model.generate(&prompt).await {
            Ok(response) => parse_model_response(&response),
            Err(err) if err.is_model_failure() => {
                warn!(
                    section_id = %leaf.id,
                    provider = self.model.name(),
                    code = err.code(),
                    error = %err,
                    "model call failed; using heuristic candidates"
                );
                Vec::new()
            }
            Err(err) => {
                error!(
                    section_id = %leaf.id,
                    provider = self.model.name(),
                    code = err.code(),
                    error = %err,
                    "model collaborator raised a non-transport error; using heuristic candidates"
                );
                Vec::new()
            }
        };
        if !parsed.is_empty() {
            return (parsed, CandidateSource::Model);
        }
        debug!(section_id = %leaf.id, "no model candidates; scanning section text");
        (heuristic_candidates(section_text), CandidateSource::Heuristic)
    }
}

/// Hex SHA-256 over `document|section|index|text`.
pub fn item_id(document_id: &str, section_id: &str, index: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{document_id}|{section_id}|{index}|{text}").as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{item_id, RequirementExtractor};
    use crate::{
        core::types::{CandidateSource, ChunkMap, Fragment, FragmentKind, SectionNode},
        providers::fixed::FixedResponseModel,
    };

    fn tree() -> SectionNode {
        let mut root = SectionNode::new("doc-root", "doc", None, "Document", 0);
        root.children.push(SectionNode::new("doc-sec-0001", "doc", Some("1".into()), "Loads", 1));
        root.children.push(SectionNode::new("doc-sec-0002", "doc", Some("2".into()), "Materials", 1));
        root
    }

    #[test]
    fn item_ids_are_stable_hex() {
        let first = item_id("doc", "doc-sec-0001", 0, "Max load 5 kN");
        assert_eq!(first, item_id("doc", "doc-sec-0001", 0, "Max load 5 kN"));
        assert_eq!(first.len(), 64);
        assert_ne!(first, item_id("doc", "doc-sec-0001", 1, "Max load 5 kN"));
    }

    #[tokio::test]
    async fn tables_are_left_out_of_section_text() {
        let mut table = Fragment::text("o1", "doc", Some(1), 1, "Table 3 100 mm");
        table.kind = FragmentKind::Table;
        let fragments = vec![
            Fragment::text("o0", "doc", Some(1), 0, "plain intro"),
            table,
            Fragment::text("o2", "doc", Some(1), 2, "steel grade S355"),
        ];
        let mut chunks = ChunkMap::new();
        chunks.insert("doc-sec-0001".into(), vec!["o1".into(), "o0".into()]);
        chunks.insert("doc-sec-0002".into(), vec!["o2".into()]);

        let extractor = RequirementExtractor::new(Arc::new(FixedResponseModel::new("  \n")));
        let outcome = extractor.run("doc", &tree(), &fragments, &chunks).await;

        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.items[0].text, "plain intro");
        assert_eq!(outcome.items[0].source_fragment_ids, vec!["o0".to_string(), "o1".to_string()]);
        assert!(outcome.leaves.iter().all(|leaf| leaf.source == CandidateSource::Heuristic));
    }

    #[tokio::test]
    async fn same_titled_fallback_leaves_each_keep_their_items() {
        let mut root = SectionNode::new("doc-root", "doc", None, "Document", 0);
        let mut pump = SectionNode::new("doc-sec-0001", "doc", Some("1".into()), "Pump", 1);
        pump.children.push(SectionNode::new("doc-sec-0002", "doc", Some("1.1".into()), "General", 2));
        let mut motor = SectionNode::new("doc-sec-0003", "doc", Some("2".into()), "Motor", 1);
        motor.children.push(SectionNode::new("doc-sec-0004", "doc", Some("2.1".into()), "General", 2));
        root.children.push(pump);
        root.children.push(motor);
        let fragments = vec![
            Fragment::text("o0", "doc", Some(1), 0, "Pump"),
            Fragment::text("o1", "doc", Some(1), 1, "General"),
            Fragment::text("o2", "doc", Some(1), 2, "Keep clear of moving parts"),
        ];

        let extractor = RequirementExtractor::new(Arc::new(FixedResponseModel::new(
            "- Keep clear of moving parts",
        )));
        let outcome = extractor.run("doc", &root, &fragments, &ChunkMap::new()).await;

        let sections: Vec<&str> = outcome.items.iter().map(|item| item.section_id.as_str()).collect();
        assert_eq!(sections, vec!["doc-sec-0002", "doc-sec-0004"]);
        assert_eq!(outcome.items[0].source_fragment_ids, outcome.items[1].source_fragment_ids);
        assert_ne!(outcome.items[0].id, outcome.items[1].id);
        assert!(outcome.leaves.iter().all(|leaf| leaf.duplicates_dropped == 0));
    }

    #[tokio::test]
    async fn marker_only_reply_falls_back_to_heuristic() {
        let fragments = vec![
            Fragment::text("o0", "doc", Some(1), 0, "Max load 5 kN"),
            Fragment::text("o1", "doc", Some(1), 1, "steel grade S355"),
        ];
        let mut chunks = ChunkMap::new();
        chunks.insert("doc-sec-0001".into(), vec!["o0".into()]);
        chunks.insert("doc-sec-0002".into(), vec!["o1".into()]);

        let extractor = RequirementExtractor::new(Arc::new(FixedResponseModel::new("-\n---\n*")));
        let outcome = extractor.run("doc", &tree(), &fragments, &chunks).await;

        let texts: Vec<&str> = outcome.items.iter().map(|item| item.text.as_str()).collect();
        assert_eq!(texts, vec!["Max load 5 kN", "steel grade S355"]);
        assert!(outcome.leaves.iter().all(|leaf| leaf.source == CandidateSource::Heuristic));
    }
}
