use super::{export_records, load_export, natural_key, SharedState};
use crate::models::{strip_quotes, MigrationBatch, RelationshipRecord};
use crate::Result;
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::{info, warn};

pub const RELATIONSHIPS_FILE: &str = "vdb_relationships.json";

const DEFAULT_WEIGHT: f64 = 1.0;
const SOURCE_FIELDS: [&str; 2] = ["src_id", "source"];
const TARGET_FIELDS: [&str; 2] = ["tgt_id", "target"];

pub fn migrate_relationships(
    index_dir: &Path,
    state: &SharedState,
    vector_size: usize,
) -> Result<MigrationBatch> {
    let mut export = load_export(index_dir, RELATIONSHIPS_FILE)?;
    let records = export_records(&mut export, RELATIONSHIPS_FILE)?;
    info!(count = records.len(), "found relationships to migrate");
    Ok(build_relationship_points(&records, state, vector_size))
}

/// Records that are not mappings containing both endpoint keys are counted in `skipped`.
pub fn build_relationship_points(
    records: &[Value],
    state: &SharedState,
    vector_size: usize,
) -> MigrationBatch {
    let mut batch = MigrationBatch::default();

    for value in records {
        match relationship_record(value, state) {
            Some(record) => batch.points.push(record.into_point(vector_size)),
            None => batch.skipped += 1,
        }
    }

    if batch.skipped > 0 {
        warn!(
            skipped = batch.skipped,
            kept = batch.points.len(),
            "relationships missing a source or target were skipped"
        );
    }
    batch
}

fn relationship_record(value: &Value, state: &SharedState) -> Option<RelationshipRecord> {
    let relationship = value.as_object()?;
    let source = endpoint(relationship, &SOURCE_FIELDS)?;
    let target = endpoint(relationship, &TARGET_FIELDS)?;

    let metadata = state.graph.relationship(&source, &target);
    let id = natural_key(relationship).unwrap_or_else(|| format!("{source}-{target}"));

    Some(RelationshipRecord {
        id,
        description: metadata
            .map(|metadata| metadata.description.clone())
            .unwrap_or_default(),
        weight: metadata
            .and_then(|metadata| metadata.weight)
            .unwrap_or(DEFAULT_WEIGHT),
        keywords: metadata
            .map(|metadata| metadata.keywords.clone())
            .unwrap_or_default(),
        source_id: metadata
            .map(|metadata| metadata.source_id.clone())
            .unwrap_or_default(),
        raw_metadata: json!({
            "export": value,
            "graph": metadata,
        }),
        source,
        target,
    })
}

/// `None` only when no endpoint key is present; present values of any type are kept.
fn endpoint(record: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    let value = fields.iter().find_map(|field| record.get(*field))?;
    Some(match value {
        Value::String(node) => strip_quotes(node),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
