use tracing::info;

use crate::{
    commands::{load_fragments, load_tree},
    core::{errors::AppResult, types::ComputeChunksResponse},
    db::{repositories::sections, Database},
    outline::{coverage::summarize, object_index::ObjectIndex, spans::assign_chunks_indexed},
};

/// Partitions the fragment stream over the stored tree and replaces the stored chunk map.
pub async fn compute_chunks(db: &Database, document_id: &str) -> AppResult<ComputeChunksResponse> {
    let tree = load_tree(db, document_id).await?;
    let fragments = load_fragments(db, document_id).await?;
    let index = ObjectIndex::build(&fragments);

    let chunks = assign_chunks_indexed(&tree, &index);
    let report = summarize(&tree, &chunks, &index);
    sections::replace_chunk_map(db.pool(), document_id, &chunks).await?;

    info!(
        document_id,
        assigned = report.assigned_fragments,
        total = report.total_fragments,
        empty_leaves = report.empty_leaf_ids.len(),
        "chunks computed"
    );
    Ok(ComputeChunksResponse {
        document_id: document_id.to_string(),
        chunks,
        report,
    })
}
