use tracing::{info, warn};

use crate::{
    commands::{load_fragments, load_tree},
    core::{
        errors::AppResult,
        types::{DiscoverOutlineResponse, SectionNode},
    },
    db::{repositories::sections, Database},
    extraction::prompts::outline_prompt,
    outline::{discover_tree, object_index::ObjectIndex},
    providers::LanguageModel,
};

/// Asks the model for the document's headings, anchors them into the fragment stream, and
/// replaces the stored tree. A failed or blank model answer yields the fallback outline.
pub async fn discover_outline(
    db: &Database,
    model: &dyn LanguageModel,
    document_id: &str,
) -> AppResult<DiscoverOutlineResponse> {
    let fragments = load_fragments(db, document_id).await?;
    let prompt = outline_prompt(ObjectIndex::build(&fragments).fragments());
    let outline_text = match model.generate(&prompt).await {
        Ok(text) => text,
        Err(err) => {
            warn!(
                document_id,
                provider = model.name(),
                code = err.code(),
                error = %err,
                "outline request failed; using fallback outline"
            );
            String::new()
        }
    };

    let discovered = discover_tree(document_id, &outline_text, &fragments);
    sections::replace_tree(db.pool(), document_id, &discovered.root).await?;

    let section_count = discovered.root.node_count().saturating_sub(1);
    info!(
        document_id,
        sections = section_count,
        anchored = discovered.anchored,
        fallback = discovered.used_fallback_outline,
        "outline discovered"
    );
    Ok(DiscoverOutlineResponse {
        document_id: document_id.to_string(),
        tree: discovered.root,
        section_count,
        anchored_count: discovered.anchored,
        used_fallback_outline: discovered.used_fallback_outline,
    })
}

pub async fn get_outline(db: &Database, document_id: &str) -> AppResult<SectionNode> {
    load_tree(db, document_id).await
}
