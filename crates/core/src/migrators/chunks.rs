use super::{export_records, load_export, natural_key, SharedState};
use crate::kv_store::{str_field, u64_field};
use crate::matrix::{decode_matrix, EmbeddingMatrix};
use crate::models::{zero_vector, ChunkRecord, MigrationBatch};
use crate::{MatrixError, MigrateError, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{error, info, warn};

pub const CHUNKS_FILE: &str = "vdb_chunks.json";

pub fn migrate_chunks(
    index_dir: &Path,
    state: &SharedState,
    vector_size: usize,
) -> Result<MigrationBatch> {
    let mut export = load_export(index_dir, CHUNKS_FILE)?;
    let records = export_records(&mut export, CHUNKS_FILE)?;
    info!(count = records.len(), "found chunks to migrate");
    build_chunk_points(&records, &export, state, vector_size)
}

/// Pairs record `i` with matrix row `i`.
///
/// `export` is the chunk export minus its `data` array; it carries `matrix`
/// and, optionally, `embedding_dim`.
pub fn build_chunk_points(
    records: &[Value],
    export: &Map<String, Value>,
    state: &SharedState,
    vector_size: usize,
) -> Result<MigrationBatch> {
    let mut batch = MigrationBatch::default();
    if records.is_empty() {
        return Ok(batch);
    }

    let matrix = match load_matrix(export, records.len(), vector_size) {
        Ok(matrix) => Some(matrix),
        Err(MigrateError::Matrix(failure)) if failure.is_recoverable() => {
            error!(
                error = %failure,
                chunks = records.len(),
                "embedding matrix unusable, falling back to zero vectors"
            );
            batch.matrix_fallback = true;
            None
        }
        Err(other) => return Err(other),
    };

    for (position, value) in records.iter().enumerate() {
        let Some(id) = value.as_object().and_then(natural_key) else {
            batch.skipped += 1;
            continue;
        };

        let embedding = matrix
            .as_ref()
            .and_then(|matrix| matrix.row(position))
            .map(<[f32]>::to_vec)
            .unwrap_or_else(|| zero_vector(vector_size));

        let record = match state.kv.text_chunk(&id) {
            Some(chunk) => ChunkRecord {
                content: str_field(chunk, "content"),
                tokens: u64_field(chunk, "tokens"),
                chunk_order_index: u64_field(chunk, "chunk_order_index"),
                full_doc_id: str_field(chunk, "full_doc_id"),
                id,
                embedding,
            },
            None => ChunkRecord {
                content: String::new(),
                tokens: 0,
                chunk_order_index: 0,
                full_doc_id: String::new(),
                id,
                embedding,
            },
        };
        batch.points.push(record.into_point());
    }

    if batch.skipped > 0 {
        warn!(skipped = batch.skipped, "chunk records without an id were skipped");
    }
    Ok(batch)
}

fn load_matrix(
    export: &Map<String, Value>,
    records: usize,
    vector_size: usize,
) -> Result<EmbeddingMatrix> {
    let encoded = export
        .get("matrix")
        .and_then(Value::as_str)
        .ok_or(MatrixError::Missing)?;
    let declared_dim = export
        .get("embedding_dim")
        .and_then(Value::as_u64)
        .map(|dim| dim as usize);

    let matrix = decode_matrix(encoded, records, declared_dim)?;
    if matrix.rows() > 0 && matrix.dim() != vector_size {
        return Err(MatrixError::DimensionMismatch {
            actual: matrix.dim(),
            expected: vector_size,
        }
        .into());
    }
    Ok(matrix)
}
