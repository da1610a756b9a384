use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Section id -> ordered fragment ids. Ordered keys keep serialized output byte-stable.
pub type ChunkMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Text,
    Table,
    Image,
}

impl FragmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table => "table",
            Self::Image => "image",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "table" => Some(Self::Table),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// One extracted unit of document content, produced upstream and never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub id: String,
    pub document_id: String,
    pub kind: FragmentKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    pub sequence: u32,
}

impl Fragment {
    pub fn text(
        id: impl Into<String>,
        document_id: impl Into<String>,
        page: Option<u32>,
        sequence: u32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            document_id: document_id.into(),
            kind: FragmentKind::Text,
            text: Some(text.into()),
            page,
            bbox: None,
            sequence,
        }
    }

    pub fn ordering_key(&self) -> (u32, u32) {
        (self.page.unwrap_or(0), self.sequence)
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpan {
    pub start_fragment_id: String,
    pub end_fragment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionNode {
    pub id: String,
    pub document_id: String,
    #[serde(default)]
    pub number: Option<String>,
    pub title: String,
    pub depth: usize,
    #[serde(default)]
    pub children: Vec<SectionNode>,
    #[serde(default)]
    pub span: Option<SectionSpan>,
}

impl SectionNode {
    pub fn new(
        id: impl Into<String>,
        document_id: impl Into<String>,
        number: Option<String>,
        title: impl Into<String>,
        depth: usize,
    ) -> Self {
        Self {
            id: id.into(),
            document_id: document_id.into(),
            number,
            title: title.into(),
            depth,
            children: Vec::new(),
            span: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Every node including `self`, parents before children, siblings in declaration order.
    pub fn preorder(&self) -> Vec<&SectionNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Leaves in declaration order. A childless tree is its own single leaf.
    pub fn leaves(&self) -> Vec<&SectionNode> {
        self.preorder().into_iter().filter(|node| node.is_leaf()).collect()
    }

    pub fn find(&self, id: &str) -> Option<&SectionNode> {
        self.preorder().into_iter().find(|node| node.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.preorder().len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedItem {
    pub id: String,
    pub document_id: String,
    pub section_id: String,
    pub section_number: Option<String>,
    pub section_title: String,
    pub text: String,
    pub confidence: Option<f64>,
    /// Fragments that justified this item, frozen at extraction time.
    pub source_fragment_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Model,
    Heuristic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeafExtractionSummary {
    pub section_id: String,
    pub fragment_count: usize,
    pub source: CandidateSource,
    pub item_count: usize,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartitionReport {
    pub total_fragments: usize,
    pub assigned_fragments: usize,
    pub unassigned_fragment_ids: Vec<String>,
    pub empty_leaf_ids: Vec<String>,
    pub coverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    pub fragment_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDocumentResponse {
    pub document_id: String,
    pub fragment_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverOutlineResponse {
    pub document_id: String,
    pub tree: SectionNode,
    pub section_count: usize,
    pub anchored_count: usize,
    pub used_fallback_outline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeChunksResponse {
    pub document_id: String,
    pub chunks: ChunkMap,
    pub report: PartitionReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequirementsResponse {
    pub document_id: String,
    pub items: Vec<ExtractedItem>,
    pub leaves: Vec<LeafExtractionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub file_path: String,
    pub format: ExportFormat,
    pub item_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}
