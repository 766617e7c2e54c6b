use crate::traits::VectorStore;
use crate::{Collection, CollectionStats, ScrolledPoint};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CollectionSample {
    pub collection: Collection,
    pub stats: Option<CollectionStats>,
    pub sample: Vec<ScrolledPoint>,
    pub error: Option<String>,
}

impl CollectionSample {
    /// Human-readable summary printed after a run.
    pub fn render(&self) -> String {
        let mut out = format!("collection: {}\n", self.collection);
        match &self.stats {
            Some(stats) => out.push_str(&format!(
                "  points={} status={}\n",
                stats.points_count, stats.status
            )),
            None => out.push_str("  points=unknown\n"),
        }
        if let Some(error) = &self.error {
            out.push_str(&format!("  error: {error}\n"));
        }
        for point in &self.sample {
            let keys = point
                .payload
                .as_ref()
                .map(|payload| payload.keys().cloned().collect::<Vec<_>>().join(","))
                .unwrap_or_default();
            let dims = point.vector.as_ref().map(Vec::len).unwrap_or_default();
            out.push_str(&format!("  id={} dims={dims} payload_keys=[{keys}]\n", point.id));
        }
        out
    }
}

/// Samples each collection read-only. Store errors are recorded, never returned.
pub async fn verify<S>(store: &S, sample_size: usize) -> Vec<CollectionSample>
where
    S: VectorStore + Send + Sync,
{
    let mut samples = Vec::with_capacity(Collection::ALL.len());

    for collection in Collection::ALL {
        let name = collection.name();
        let mut errors = Vec::new();

        let stats = match store.get_collection(name).await {
            Ok(stats) => Some(stats),
            Err(error) => {
                warn!(collection = name, error = %error, "could not read collection stats");
                errors.push(error.to_string());
                None
            }
        };

        let sample = match store.scroll(name, sample_size, true, true).await {
            Ok(points) => points,
            Err(error) => {
                warn!(collection = name, error = %error, "could not sample collection");
                errors.push(error.to_string());
                Vec::new()
            }
        };

        samples.push(CollectionSample {
            collection,
            stats,
            sample,
            error: (!errors.is_empty()).then(|| errors.join("; ")),
        });
    }

    samples
}
