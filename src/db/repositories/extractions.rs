use sqlx::{Row, SqlitePool};

use crate::core::{
    errors::{AppError, AppResult},
    types::ExtractedItem,
};

/// Swaps the document's full item list. Readers see either the old list or the new one.
pub async fn replace_items(pool: &SqlitePool, document_id: &str, items: &[ExtractedItem]) -> AppResult<()> {
    let mut tx = pool.begin().await.map_err(AppError::persistence)?;
    sqlx::query("DELETE FROM extracted_items WHERE document_id = ?1")
        .bind(document_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::persistence)?;

    for (ordinal, item) in items.iter().enumerate() {
        let sources = serde_json::to_string(&item.source_fragment_ids).map_err(AppError::persistence)?;
        sqlx::query(
            r#"
            INSERT INTO extracted_items (
              id, document_id, ordinal, section_id, section_number, section_title, text,
              confidence, source_fragment_ids_json
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(document_id)
        .bind(ordinal as i64)
        .bind(&item.section_id)
        .bind(&item.section_number)
        .bind(&item.section_title)
        .bind(&item.text)
        .bind(item.confidence)
        .bind(sources)
        .execute(&mut *tx)
        .await
        .map_err(AppError::persistence)?;
    }
    tx.commit().await.map_err(AppError::persistence)?;
    Ok(())
}

pub async fn list_items(pool: &SqlitePool, document_id: &str) -> AppResult<Vec<ExtractedItem>> {
    let rows = sqlx::query(
        r#"
        SELECT id, document_id, section_id, section_number, section_title, text, confidence,
               source_fragment_ids_json
        FROM extracted_items
        WHERE document_id = ?1
        ORDER BY ordinal
        "#,
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(map_item).collect()
}

fn map_item(row: sqlx::sqlite::SqliteRow) -> AppResult<ExtractedItem> {
    let sources: String = row.try_get("source_fragment_ids_json")?;
    Ok(ExtractedItem {
        id: row.try_get("id")?,
        document_id: row.try_get("document_id")?,
        section_id: row.try_get("section_id")?,
        section_number: row.try_get("section_number")?,
        section_title: row.try_get("section_title")?,
        text: row.try_get("text")?,
        confidence: row.try_get("confidence")?,
        source_fragment_ids: serde_json::from_str(&sources)
            .map_err(|err| AppError::corrupt_artifact("source fragment ids", err))?,
    })
}
