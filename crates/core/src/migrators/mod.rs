pub mod chunks;
pub mod documents;
pub mod entities;
pub mod relationships;

pub use chunks::{build_chunk_points, migrate_chunks, CHUNKS_FILE};
pub use documents::{build_document_points, migrate_documents};
pub use entities::{build_entity_points, migrate_entities, ENTITIES_FILE, SOURCE_SEPARATOR};
pub use relationships::{build_relationship_points, migrate_relationships, RELATIONSHIPS_FILE};

use crate::graph_export::{load_graph_export, GraphExport};
use crate::kv_store::{json_kind, KvStores};
use crate::{MigrateError, MigrationConfig, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Graph and KV data loaded once before any migrator runs; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    pub graph: GraphExport,
    pub kv: KvStores,
}

impl SharedState {
    pub fn load(config: &MigrationConfig) -> Result<Self> {
        Ok(Self {
            graph: load_graph_export(&config.graph_path())?,
            kv: KvStores::load(&config.index_dir)?,
        })
    }
}

/// Reads a required `{"data": [...], ...}` export as a JSON object.
pub(crate) fn load_export(index_dir: &Path, file: &str) -> Result<Map<String, Value>> {
    let path = index_dir.join(file);
    if !path.exists() {
        return Err(MigrateError::MissingExport(path.display().to_string()));
    }

    let raw = fs::read_to_string(&path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(map),
        other => Err(MigrateError::ExportShape {
            file: file.to_string(),
            details: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

pub(crate) fn export_records(export: &mut Map<String, Value>, file: &str) -> Result<Vec<Value>> {
    match export.remove("data") {
        Some(Value::Array(records)) => Ok(records),
        Some(other) => Err(MigrateError::ExportShape {
            file: file.to_string(),
            details: format!("`data` should be an array, found {}", json_kind(&other)),
        }),
        None => Err(MigrateError::ExportShape {
            file: file.to_string(),
            details: "`data` field is missing".to_string(),
        }),
    }
}

pub(crate) fn natural_key(record: &Map<String, Value>) -> Option<String> {
    record
        .get("__id__")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn missing_primary_export_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let result = load_export(dir.path(), ENTITIES_FILE);
        assert!(matches!(result, Err(MigrateError::MissingExport(_))));
        Ok(())
    }

    #[test]
    fn data_must_be_an_array() -> Result<(), Box<dyn std::error::Error>> {
        let mut export = json!({"data": {"a": 1}})
            .as_object()
            .cloned()
            .ok_or("not an object")?;
        let result = export_records(&mut export, ENTITIES_FILE);
        assert!(matches!(result, Err(MigrateError::ExportShape { .. })));
        Ok(())
    }
}
