use super::{export_records, load_export, natural_key, SharedState};
use crate::kv_store::str_field;
use crate::models::{strip_quotes, EntityRecord, MigrationBatch};
use crate::Result;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info, warn};

pub const ENTITIES_FILE: &str = "vdb_entities.json";
pub const SOURCE_SEPARATOR: &str = "<SEP>";

pub fn migrate_entities(
    index_dir: &Path,
    state: &SharedState,
    vector_size: usize,
) -> Result<MigrationBatch> {
    let mut export = load_export(index_dir, ENTITIES_FILE)?;
    let records = export_records(&mut export, ENTITIES_FILE)?;
    info!(count = records.len(), "found entities to migrate");
    Ok(build_entity_points(&records, state, vector_size))
}

pub fn build_entity_points(
    records: &[Value],
    state: &SharedState,
    vector_size: usize,
) -> MigrationBatch {
    let mut batch = MigrationBatch::default();

    for value in records {
        match entity_record(value, state) {
            Some(record) => batch.points.push(record.into_point(vector_size)),
            None => batch.skipped += 1,
        }
    }

    if batch.skipped > 0 {
        warn!(skipped = batch.skipped, "entities without a name or id were skipped");
    }
    batch
}

fn entity_record(value: &Value, state: &SharedState) -> Option<EntityRecord> {
    let entity = value.as_object()?;
    let name = strip_quotes(&str_field(entity, "entity_name"));
    let id = natural_key(entity).or_else(|| (!name.is_empty()).then(|| name.clone()))?;

    let metadata = state.graph.entity(&name);
    if metadata.is_none() {
        debug!(entity = %name, "entity absent from graph export");
    }

    let source_chunk_ids: Vec<String> = metadata
        .map(|metadata| split_source_ids(&metadata.source_id))
        .unwrap_or_default();

    let chunks_content = source_chunk_ids
        .iter()
        .filter_map(|chunk_id| state.kv.text_chunk(chunk_id))
        .map(|chunk| str_field(chunk, "content"))
        .collect();

    Some(EntityRecord {
        id,
        name,
        entity_type: metadata
            .map(|metadata| metadata.entity_type.clone())
            .unwrap_or_default(),
        description: metadata
            .map(|metadata| metadata.description.clone())
            .unwrap_or_default(),
        source_chunk_ids,
        chunks_content,
        raw_metadata: json!({
            "export": value,
            "graph": metadata,
        }),
    })
}

/// Splits a `<SEP>`-joined chunk reference list, dropping empty pieces.
pub fn split_source_ids(source_id: &str) -> Vec<String> {
    source_id
        .split(SOURCE_SEPARATOR)
        .map(str::trim)
        .filter(|chunk_id| !chunk_id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_export::EntityMetadata;

    fn state_with_alice() -> SharedState {
        let mut state = SharedState::default();
        state.graph.entities.insert(
            "Alice".to_string(),
            EntityMetadata {
                entity_type: "PERSON".to_string(),
                description: "An engineer".to_string(),
                source_id: "c1<SEP>c2".to_string(),
            },
        );
        state
            .kv
            .text_chunks
            .insert("c1".to_string(), json!({"content": "Alice wrote c1."}));
        state
    }

    #[test]
    fn joins_graph_metadata_and_chunk_content() {
        let state = state_with_alice();
        let records = vec![
            json!({"__id__": "ent-alice", "entity_name": "\"Alice\""}),
            json!({"__id__": "ent-bob", "entity_name": "Bob"}),
        ];

        let batch = build_entity_points(&records, &state, 4);
        assert_eq!(batch.points.len(), 2);
        assert_eq!(batch.skipped, 0);

        let alice = &batch.points[0].payload;
        assert_eq!(alice["entity_name"], json!("Alice"));
        assert_eq!(alice["entity_type"], json!("PERSON"));
        assert_eq!(alice["source_chunks"], json!(["c1", "c2"]));
        assert_eq!(alice["chunks_content"], json!(["Alice wrote c1."]));

        let bob = &batch.points[1].payload;
        assert_eq!(bob["entity_type"], json!(""));
        assert_eq!(bob["description"], json!(""));
        assert_eq!(bob["source_chunks"], json!([]));
        assert_eq!(bob["chunks_content"], json!([]));
        assert_eq!(batch.points[1].vector, vec![0.0; 4]);
    }

    #[test]
    fn name_is_the_fallback_natural_key() {
        let batch = build_entity_points(
            &[json!({"entity_name": "Carol"}), json!({}), json!("bare")],
            &SharedState::default(),
            2,
        );
        assert_eq!(batch.points.len(), 1);
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.points[0].id, crate::identifier::point_id("Carol"));
    }

    #[test]
    fn separator_split_drops_empty_ids() {
        assert_eq!(split_source_ids("c1<SEP><SEP>c2<SEP>"), vec!["c1", "c2"]);
        assert!(split_source_ids("").is_empty());
    }
}
