use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_VECTOR_SIZE: usize = 3072;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_VERIFY_SAMPLE: usize = 3;
pub const DEFAULT_GRAPH_FILE: &str = "graph_chunk_entity_relation.graphml";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Collection {
    Entities,
    Relationships,
    Chunks,
    Documents,
}

impl Collection {
    /// Migration order.
    pub const ALL: [Collection; 4] = [
        Collection::Entities,
        Collection::Relationships,
        Collection::Chunks,
        Collection::Documents,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Entities => "entities",
            Collection::Relationships => "relationships",
            Collection::Chunks => "chunks",
            Collection::Documents => "documents",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

impl Distance {
    pub fn as_qdrant(&self) -> &'static str {
        match self {
            Distance::Cosine => "Cosine",
            Distance::Dot => "Dot",
            Distance::Euclid => "Euclid",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub entity_type: String,
    pub description: String,
    pub source_chunk_ids: Vec<String>,
    pub chunks_content: Vec<String>,
    pub raw_metadata: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    pub description: String,
    pub weight: f64,
    pub keywords: String,
    pub source_id: String,
    pub raw_metadata: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub id: String,
    pub content: String,
    pub tokens: u64,
    pub chunk_order_index: u64,
    pub full_doc_id: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: String,
    pub content: String,
    pub metadata: Value,
}

/// Unit written to a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

impl Point {
    pub fn new(id: u64, vector: Vec<f32>, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            id,
            vector,
            payload,
        }
    }
}

impl EntityRecord {
    pub fn into_point(self, vector_size: usize) -> Point {
        Point::new(
            crate::identifier::point_id(&self.id),
            zero_vector(vector_size),
            json!({
                "entity_id": self.id,
                "entity_name": self.name,
                "entity_type": self.entity_type,
                "description": self.description,
                "source_chunks": self.source_chunk_ids,
                "chunks_content": self.chunks_content,
                "metadata": self.raw_metadata,
            }),
        )
    }
}

impl RelationshipRecord {
    pub fn into_point(self, vector_size: usize) -> Point {
        Point::new(
            crate::identifier::point_id(&self.id),
            zero_vector(vector_size),
            json!({
                "relationship_id": self.id,
                "source": self.source,
                "target": self.target,
                "description": self.description,
                "weight": self.weight,
                "keywords": self.keywords,
                "source_id": self.source_id,
                "metadata": self.raw_metadata,
            }),
        )
    }
}

impl ChunkRecord {
    pub fn into_point(self) -> Point {
        Point::new(
            crate::identifier::point_id(&self.id),
            self.embedding,
            json!({
                "chunk_id": self.id,
                "content": self.content,
                "tokens": self.tokens,
                "chunk_order_index": self.chunk_order_index,
                "full_doc_id": self.full_doc_id,
            }),
        )
    }
}

impl DocumentRecord {
    pub fn into_point(self, vector_size: usize) -> Point {
        Point::new(
            crate::identifier::point_id(&self.id),
            zero_vector(vector_size),
            json!({
                "doc_id": self.id,
                "content": self.content,
                "metadata": self.metadata,
            }),
        )
    }
}

pub fn zero_vector(vector_size: usize) -> Vec<f32> {
    vec![0f32; vector_size]
}

/// Points built by one migrator, plus what it had to leave behind.
#[derive(Debug, Clone, Default)]
pub struct MigrationBatch {
    pub points: Vec<Point>,
    pub skipped: usize,
    pub matrix_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionReport {
    pub collection: Collection,
    pub migrated: usize,
    pub skipped: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub collections: Vec<CollectionReport>,
    pub matrix_fallback: bool,
    pub finished_at: DateTime<Utc>,
}

impl MigrationReport {
    pub fn collection(&self, collection: Collection) -> Option<&CollectionReport> {
        self.collections
            .iter()
            .find(|report| report.collection == collection)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectionStats {
    pub points_count: u64,
    pub vectors_count: Option<u64>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrolledPoint {
    pub id: u64,
    pub payload: Option<Map<String, Value>>,
    pub vector: Option<Vec<f32>>,
}

#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub index_dir: PathBuf,
    pub graph_file: String,
    pub vector_size: usize,
    pub batch_size: usize,
    pub verify_sample: usize,
    pub distance: Distance,
}

impl MigrationConfig {
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.batch_size == 0 {
            return Err(crate::MigrateError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.vector_size == 0 {
            return Err(crate::MigrateError::InvalidConfig(
                "vector size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn graph_path(&self) -> PathBuf {
        self.index_dir.join(&self.graph_file)
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("."),
            graph_file: DEFAULT_GRAPH_FILE.to_string(),
            vector_size: DEFAULT_VECTOR_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            verify_sample: DEFAULT_VERIFY_SAMPLE,
            distance: Distance::Cosine,
        }
    }
}

/// Strips surrounding double quotes, as graph tools export `"ALICE"`.
pub fn strip_quotes(value: &str) -> String {
    value.trim().trim_matches('"').to_string()
}
