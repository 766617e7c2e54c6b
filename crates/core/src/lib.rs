pub mod error;
pub mod graph_export;
pub mod identifier;
pub mod kv_store;
pub mod matrix;
pub mod migrators;
pub mod models;
pub mod pipeline;
pub mod stores;
pub mod traits;
pub mod upload;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{MatrixError, MigrateError, Result, StoreError};
pub use graph_export::{load_graph_export, parse_graph_export, GraphExport, KeySchema};
pub use identifier::{edge_id, point_id};
pub use kv_store::KvStores;
pub use matrix::{decode_matrix, EmbeddingMatrix};
pub use migrators::SharedState;
pub use models::{
    ChunkRecord, Collection, CollectionReport, CollectionStats, Distance, DocumentRecord,
    EntityRecord, MigrationBatch, MigrationConfig, MigrationReport, Point, RelationshipRecord,
    ScrolledPoint, DEFAULT_BATCH_SIZE, DEFAULT_GRAPH_FILE, DEFAULT_VECTOR_SIZE,
    DEFAULT_VERIFY_SAMPLE,
};
pub use pipeline::{plan, Migrator};
pub use stores::QdrantStore;
pub use traits::VectorStore;
pub use upload::upload;
pub use verify::{verify, CollectionSample};
