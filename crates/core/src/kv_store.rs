use crate::{MigrateError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const FULL_DOCS_FILE: &str = "kv_store_full_docs.json";
pub const LLM_RESPONSE_CACHE_FILE: &str = "kv_store_llm_response_cache.json";
pub const TEXT_CHUNKS_FILE: &str = "kv_store_text_chunks.json";

pub type KvMap = Map<String, Value>;

/// Auxiliary dictionaries keyed by opaque record id.
#[derive(Debug, Clone, Default)]
pub struct KvStores {
    pub full_docs: KvMap,
    pub llm_response_cache: KvMap,
    pub text_chunks: KvMap,
}

impl KvStores {
    pub fn load(index_dir: &Path) -> Result<Self> {
        Ok(Self {
            full_docs: load_optional_map(&index_dir.join(FULL_DOCS_FILE))?,
            llm_response_cache: load_optional_map(&index_dir.join(LLM_RESPONSE_CACHE_FILE))?,
            text_chunks: load_optional_map(&index_dir.join(TEXT_CHUNKS_FILE))?,
        })
    }

    /// Chunk entry by id, if present and shaped as a mapping.
    pub fn text_chunk(&self, chunk_id: &str) -> Option<&Map<String, Value>> {
        self.text_chunks.get(chunk_id).and_then(Value::as_object)
    }
}

/// Reads a JSON dictionary file. A missing file yields an empty map.
pub fn load_optional_map(path: &Path) -> Result<KvMap> {
    if !path.exists() {
        warn!(path = %path.display(), "kv store not found, continuing with empty map");
        return Ok(KvMap::new());
    }

    let raw = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => {
            info!(path = %path.display(), entries = map.len(), "loaded kv store");
            Ok(map)
        }
        other => Err(MigrateError::ExportShape {
            file: path.display().to_string(),
            details: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Lenient field readers: wrong or missing types fall back to empty/zero.
pub(crate) fn str_field(record: &Map<String, Value>, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn u64_field(record: &Map<String, Value>, key: &str) -> u64 {
    record.get(key).and_then(Value::as_u64).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn absent_files_leave_maps_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(TEXT_CHUNKS_FILE),
            json!({"c1": {"content": "hello", "tokens": 3}}).to_string(),
        )?;

        let stores = KvStores::load(dir.path())?;
        assert!(stores.full_docs.is_empty());
        assert!(stores.llm_response_cache.is_empty());
        assert_eq!(stores.text_chunks.len(), 1);
        let chunk = stores.text_chunk("c1").ok_or("missing c1")?;
        assert_eq!(str_field(chunk, "content"), "hello");
        assert_eq!(u64_field(chunk, "tokens"), 3);
        assert_eq!(u64_field(chunk, "chunk_order_index"), 0);
        Ok(())
    }

    #[test]
    fn non_object_store_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join(FULL_DOCS_FILE);
        fs::write(&path, "[1, 2, 3]")?;
        let result = load_optional_map(&path);
        assert!(matches!(result, Err(MigrateError::ExportShape { .. })));
        Ok(())
    }
}
