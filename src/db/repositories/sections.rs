use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::core::{
    errors::{AppError, AppResult},
    types::{ChunkMap, SectionNode},
};

/// Replaces the document's section tree. The chunk map and extracted items were derived
/// from the previous tree, so they are cleared in the same transaction.
pub async fn replace_tree(pool: &SqlitePool, document_id: &str, tree: &SectionNode) -> AppResult<()> {
    let tree_json = serde_json::to_string(tree).map_err(AppError::persistence)?;
    let mut tx = pool.begin().await.map_err(AppError::persistence)?;
    for statement in [
        "DELETE FROM extracted_items WHERE document_id = ?1",
        "DELETE FROM chunk_maps WHERE document_id = ?1",
        "DELETE FROM section_trees WHERE document_id = ?1",
    ] {
        sqlx::query(statement)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::persistence)?;
    }
    sqlx::query("INSERT INTO section_trees (document_id, tree_json, updated_at) VALUES (?1, ?2, ?3)")
        .bind(document_id)
        .bind(tree_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(AppError::persistence)?;
    tx.commit().await.map_err(AppError::persistence)?;
    Ok(())
}

pub async fn get_tree(pool: &SqlitePool, document_id: &str) -> AppResult<Option<SectionNode>> {
    let row = sqlx::query("SELECT tree_json FROM section_trees WHERE document_id = ?1")
        .bind(document_id)
        .fetch_optional(pool)
        .await?;
    row.map(|row| -> AppResult<SectionNode> {
        let raw: String = row.try_get("tree_json")?;
        serde_json::from_str(&raw)
            .map_err(|err| AppError::corrupt_artifact("section tree", err))
    })
    .transpose()
}

pub async fn replace_chunk_map(pool: &SqlitePool, document_id: &str, chunks: &ChunkMap) -> AppResult<()> {
    let chunks_json = serde_json::to_string(chunks).map_err(AppError::persistence)?;
    let mut tx = pool.begin().await.map_err(AppError::persistence)?;
    sqlx::query("DELETE FROM chunk_maps WHERE document_id = ?1")
        .bind(document_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::persistence)?;
    sqlx::query("INSERT INTO chunk_maps (document_id, chunks_json, updated_at) VALUES (?1, ?2, ?3)")
        .bind(document_id)
        .bind(chunks_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(AppError::persistence)?;
    tx.commit().await.map_err(AppError::persistence)?;
    Ok(())
}

pub async fn get_chunk_map(pool: &SqlitePool, document_id: &str) -> AppResult<Option<ChunkMap>> {
    let row = sqlx::query("SELECT chunks_json FROM chunk_maps WHERE document_id = ?1")
        .bind(document_id)
        .fetch_optional(pool)
        .await?;
    row.map(|row| -> AppResult<ChunkMap> {
        let raw: String = row.try_get("chunks_json")?;
        serde_json::from_str(&raw).map_err(|err| AppError::corrupt_artifact("chunk map", err))
    })
    .transpose()
}
