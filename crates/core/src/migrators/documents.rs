use super::SharedState;
use crate::kv_store::str_field;
use crate::models::{DocumentRecord, MigrationBatch};
use tracing::info;

/// Documents come from the full-document KV store; no primary export is read.
pub fn migrate_documents(state: &SharedState, vector_size: usize) -> MigrationBatch {
    if state.kv.full_docs.is_empty() {
        info!("no full documents loaded, skipping document migration");
        return MigrationBatch::default();
    }

    info!(count = state.kv.full_docs.len(), "found documents to migrate");
    build_document_points(state, vector_size)
}

pub fn build_document_points(state: &SharedState, vector_size: usize) -> MigrationBatch {
    let points = state
        .kv
        .full_docs
        .iter()
        .map(|(doc_id, entry)| {
            let content = entry
                .as_object()
                .map(|document| str_field(document, "content"))
                .unwrap_or_default();
            DocumentRecord {
                id: doc_id.clone(),
                content,
                metadata: entry.clone(),
            }
            .into_point(vector_size)
        })
        .collect();

    MigrationBatch {
        points,
        ..MigrationBatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::point_id;
    use serde_json::{json, Value};

    #[test]
    fn empty_store_emits_no_points() {
        let batch = migrate_documents(&SharedState::default(), 8);
        assert!(batch.points.is_empty());
        assert_eq!(batch.skipped, 0);
    }

    #[test]
    fn raw_entry_becomes_payload_metadata() {
        let mut state = SharedState::default();
        state.kv.full_docs.insert(
            "doc-1".to_string(),
            json!({"content": "Full text.", "source": "upload"}),
        );
        state.kv.full_docs.insert("doc-2".to_string(), Value::String("odd".to_string()));

        let batch = migrate_documents(&state, 2);
        assert_eq!(batch.points.len(), 2);

        let first = batch
            .points
            .iter()
            .find(|point| point.id == point_id("doc-1"))
            .expect("doc-1 point");
        assert_eq!(first.payload["content"], json!("Full text."));
        assert_eq!(first.payload["metadata"]["source"], json!("upload"));
        assert_eq!(first.vector, vec![0.0, 0.0]);

        let second = batch
            .points
            .iter()
            .find(|point| point.id == point_id("doc-2"))
            .expect("doc-2 point");
        assert_eq!(second.payload["content"], json!(""));
        assert_eq!(second.payload["metadata"], json!("odd"));
    }
}
