use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    commands::load_tree,
    core::{
        config::PipelineConfig,
        errors::{AppError, AppResult},
        types::{ExportFormat, ExportResponse, ExtractedItem, SectionNode},
    },
    db::{repositories::extractions, Database},
};

const CSV_HEADER: [&str; 8] = [
    "id",
    "document_id",
    "section_id",
    "section_number",
    "section_title",
    "text",
    "confidence",
    "source_fragment_ids",
];

/// Writes the stored items to `exports/{document_id}-requirements.{csv|json}`.
pub async fn export_items(
    db: &Database,
    config: &PipelineConfig,
    document_id: &str,
    format: ExportFormat,
) -> AppResult<ExportResponse> {
    let items = extractions::list_items(db.pool(), document_id).await?;
    if items.is_empty() {
        return Err(AppError::NotFound(format!(
            "extracted items for document {document_id}"
        )));
    }

    let content = match format {
        ExportFormat::Csv => render_csv(&items)?,
        ExportFormat::Json => {
            let tree = load_tree(db, document_id).await?;
            render_json(document_id, &tree, &items)?
        }
    };

    let dir = config.exports_dir();
    std::fs::create_dir_all(&dir)?;
    let path: PathBuf = dir.join(format!("{document_id}-requirements.{}", format.extension()));
    write_replacing(&path, content.as_bytes())?;

    info!(document_id, path = %path.display(), items = items.len(), "items exported");
    Ok(ExportResponse {
        file_path: path.to_string_lossy().to_string(),
        format,
        item_count: items.len(),
    })
}

pub fn render_csv(items: &[ExtractedItem]) -> AppResult<String> {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|cell| cell.to_string()));
    for item in items {
        let sources = serde_json::to_string(&item.source_fragment_ids)?;
        push_row(
            &mut out,
            [
                item.id.clone(),
                item.document_id.clone(),
                item.section_id.clone(),
                item.section_number.clone().unwrap_or_default(),
                item.section_title.clone(),
                item.text.clone(),
                item.confidence.map(|value| value.to_string()).unwrap_or_default(),
                sources,
            ],
        );
    }
    Ok(out)
}

pub fn render_json(document_id: &str, tree: &SectionNode, items: &[ExtractedItem]) -> AppResult<String> {
    let payload = serde_json::json!({
        "documentId": document_id,
        "sections": [tree],
        "items": items,
    });
    Ok(serde_json::to_string(&payload)?)
}

fn write_replacing(path: &Path, content: &[u8]) -> AppResult<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    if let Err(err) = std::fs::write(&staging, content).and_then(|_| std::fs::rename(&staging, path)) {
        let _ = std::fs::remove_file(&staging);
        return Err(err.into());
    }
    Ok(())
}

fn push_row(out: &mut String, cells: impl IntoIterator<Item = String>) {
    let row: Vec<String> = cells.into_iter().map(|cell| csv_cell(&cell)).collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

fn csv_cell(value: &str) -> String {
    let flat = value.replace("\r\n", " ").replace(['\r', '\n'], " ");
    if flat.contains([',', '"']) {
        format!("\"{}\"", flat.replace('"', "\"\""))
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::{csv_cell, render_csv, write_replacing};
    use crate::core::types::ExtractedItem;

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(csv_cell("plain"), "plain");
        assert_eq!(csv_cell("a, b"), "\"a, b\"");
        assert_eq!(csv_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_cell("two\nlines"), "two lines");
    }

    #[test]
    fn replacing_write_leaves_no_staging_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc-requirements.csv");
        write_replacing(&path, b"old contents that are longer").expect("first write");
        write_replacing(&path, b"new").expect("second write");

        assert_eq!(std::fs::read_to_string(&path).expect("read export"), "new");
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .expect("list dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["doc-requirements.csv".to_string()]);
    }

    #[test]
    fn renders_header_and_rows() {
        let item = ExtractedItem {
            id: "abc".into(),
            document_id: "doc".into(),
            section_id: "doc-sec-0001".into(),
            section_number: Some("1".into()),
            section_title: "Loads".into(),
            text: "Max load 5 kN".into(),
            confidence: None,
            source_fragment_ids: vec!["o0".into(), "o1".into()],
        };
        let csv = render_csv(&[item]).expect("csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "id,document_id,section_id,section_number,section_title,text,confidence,source_fragment_ids"
        );
        assert_eq!(lines[1], "abc,doc,doc-sec-0001,1,Loads,Max load 5 kN,,\"[\"\"o0\"\",\"\"o1\"\"]\"");
    }
}
