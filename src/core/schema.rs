use schemars::{schema_for, Schema};

use crate::core::types::{ChunkMap, ExtractedItem, Fragment, PartitionReport, SectionNode};

pub fn fragment_schema() -> Schema {
    schema_for!(Fragment)
}

pub fn section_tree_schema() -> Schema {
    schema_for!(SectionNode)
}

pub fn chunk_map_schema() -> Schema {
    schema_for!(ChunkMap)
}

pub fn extracted_items_schema() -> Schema {
    schema_for!(Vec<ExtractedItem>)
}

pub fn partition_report_schema() -> Schema {
    schema_for!(PartitionReport)
}
