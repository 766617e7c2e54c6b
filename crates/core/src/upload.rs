use crate::traits::VectorStore;
use crate::{MigrateError, Point, Result};
use tracing::{debug, info};

/// Upserts `points` in consecutive batches of `batch_size`, one at a time.
///
/// Returns the number of batches written. The first failing batch aborts the
/// upload; batches before it stay committed.
pub async fn upload<S>(
    store: &S,
    points: &[Point],
    collection: &str,
    batch_size: usize,
) -> Result<usize>
where
    S: VectorStore + Send + Sync + ?Sized,
{
    if batch_size == 0 {
        return Err(MigrateError::InvalidConfig(
            "batch size must be at least 1".to_string(),
        ));
    }

    let mut written = 0usize;
    for (batch, chunk) in points.chunks(batch_size).enumerate() {
        store
            .upsert(collection, chunk)
            .await
            .map_err(|source| MigrateError::Upload {
                collection: collection.to_string(),
                batch,
                source,
            })?;
        written += 1;
        debug!(collection, batch, size = chunk.len(), "upserted batch");
    }

    info!(collection, points = points.len(), batches = written, "upload complete");
    Ok(written)
}
