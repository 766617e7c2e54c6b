use crate::{CollectionStats, Distance, Point, ScrolledPoint, StoreError};
use async_trait::async_trait;

/// Collection lifecycle and point I/O the migration needs from a vector store.
#[async_trait]
pub trait VectorStore {
    /// Succeeds when the collection was already absent.
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    async fn create_collection(
        &self,
        name: &str,
        vector_size: usize,
        distance: Distance,
    ) -> Result<(), StoreError>;

    /// Returns once the store has applied the write.
    async fn upsert(&self, name: &str, points: &[Point]) -> Result<(), StoreError>;

    async fn scroll(
        &self,
        name: &str,
        limit: usize,
        with_payload: bool,
        with_vectors: bool,
    ) -> Result<Vec<ScrolledPoint>, StoreError>;

    async fn get_collection(&self, name: &str) -> Result<CollectionStats, StoreError>;
}
