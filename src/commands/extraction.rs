use std::sync::Arc;

use tracing::info;

use crate::{
    commands::{chunks::compute_chunks, load_fragments, load_tree},
    core::{
        errors::AppResult,
        types::{ExtractRequirementsResponse, ExtractedItem},
    },
    db::{
        repositories::{extractions, sections},
        Database,
    },
    extraction::executor::RequirementExtractor,
    providers::LanguageModel,
};

/// Runs extraction over every leaf and swaps in the new item list only once all leaves
/// are done.
pub async fn extract_requirements(
    db: &Database,
    model: Arc<dyn LanguageModel>,
    document_id: &str,
) -> AppResult<ExtractRequirementsResponse> {
    let tree = load_tree(db, document_id).await?;
    let fragments = load_fragments(db, document_id).await?;
    let chunks = match sections::get_chunk_map(db.pool(), document_id).await? {
        Some(chunks) => chunks,
        None => compute_chunks(db, document_id).await?.chunks,
    };

    let outcome = RequirementExtractor::new(model)
        .run(document_id, &tree, &fragments, &chunks)
        .await;
    extractions::replace_items(db.pool(), document_id, &outcome.items).await?;

    info!(document_id, items = outcome.items.len(), "requirements stored");
    Ok(ExtractRequirementsResponse {
        document_id: document_id.to_string(),
        items: outcome.items,
        leaves: outcome.leaves,
    })
}

pub async fn list_requirements(db: &Database, document_id: &str) -> AppResult<Vec<ExtractedItem>> {
    extractions::list_items(db.pool(), document_id).await
}
